//! Help rendering.
//!
//! Options are grouped by their group name (ungrouped options land in
//! `basic`), groups are ordered by priority then name and rows within a
//! group by long name. Each row has two columns, the switches and the
//! annotations, aligned with [`columnize`].

use std::collections::BTreeMap;

use declopt_core::{BASIC_GROUP, OptionGroup, ResolvedOption, ResolvedOptions};

/// Aligns rows of cells into columns three spaces apart, indented by four.
///
/// Each column is as wide as its widest cell, capped at `max_width`; longer
/// cells are truncated. Trailing whitespace is trimmed.
///
/// ```
/// use declopt_driver::columnize;
///
/// let rows = vec![
///     vec!["--a".to_string(), "first".to_string()],
///     vec!["--long-one".to_string(), "second".to_string()],
/// ];
/// assert_eq!(
///     columnize(&rows, None),
///     vec!["    --a          first", "    --long-one   second"]
/// );
/// ```
pub fn columnize(rows: &[Vec<String>], max_width: Option<usize>) -> Vec<String> {
    let mut widths: Vec<usize> = Vec::new();
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            let len = cell.chars().count();
            match widths.get_mut(i) {
                Some(width) => *width = (*width).max(len),
                None => widths.push(len),
            }
        }
    }
    if let Some(max) = max_width {
        for width in &mut widths {
            *width = (*width).min(max);
        }
    }

    rows.iter()
        .map(|row| {
            let cells: Vec<String> = row
                .iter()
                .zip(&widths)
                .map(|(cell, &width)| {
                    let cell: String = cell
                        .chars()
                        .filter(|c| *c != '\n' && *c != '\r')
                        .take(width)
                        .collect();
                    format!("{cell:<width$}")
                })
                .collect();
            format!("    {}", cells.join("   ")).trim_end().to_string()
        })
        .collect()
}

/// Switches column of an option.
pub fn switches_cell(option: &ResolvedOption) -> String {
    let mut cell = option.long_name().to_string();
    if let Some(short) = option.short_name() {
        cell.push_str(&format!(" | -{short}"));
    }
    if option.takes_argument() {
        if let Some(note) = option.argument_note() {
            cell.push(' ');
            cell.push_str(note);
        }
    }
    cell
}

/// Annotations column of an option.
pub fn notes_cell(option: &ResolvedOption) -> String {
    let mut notes = Vec::new();
    if option.takes_argument() {
        if let Some(default) = option.default_value().filter(|v| v.is_present()) {
            notes.push(format!("(default: {default})"));
        }
    }
    if let Some(note) = option.note() {
        notes.push(note.to_string());
    }
    if !option.choices().is_empty() {
        notes.push(format!("(choices: {})", option.choices().join(", ")));
    }
    if let Some(variable) = option.environment_variable() {
        notes.push(format!("[env: {variable}]"));
    }
    notes.join(" ")
}

/// Renders the full help text, one line per element.
pub fn render_help(
    usage: &str,
    resolved: &ResolvedOptions,
    show_hidden: bool,
    max_width: Option<usize>,
) -> Vec<String> {
    let mut by_group: BTreeMap<&str, Vec<&ResolvedOption>> = BTreeMap::new();
    for option in resolved.parse_view() {
        if option.is_hidden() && !show_hidden {
            continue;
        }
        by_group
            .entry(option.group().unwrap_or(BASIC_GROUP))
            .or_default()
            .push(option);
    }

    let mut groups: Vec<OptionGroup> = by_group
        .keys()
        .map(|name| {
            resolved
                .group(name)
                .cloned()
                .unwrap_or_else(|| OptionGroup::synthesized(*name))
        })
        .filter(|group| show_hidden || !group.hidden)
        .collect();
    groups.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));

    let mut lines = vec![usage.to_string()];
    for group in &groups {
        lines.push(
            format!("{}: {}", group.name, group.title.as_deref().unwrap_or(""))
                .trim_end()
                .to_string(),
        );
        lines.extend(group.description_lines().iter().map(|line| format!(" {line}")));
        let rows: Vec<Vec<String>> = by_group[group.name.as_str()]
            .iter()
            .map(|option| vec![switches_cell(option), notes_cell(option)])
            .collect();
        lines.extend(columnize(&rows, max_width));
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use declopt_core::{GroupDecl, OptionDecl, OptionFinder, OptionRegistry, Value};

    fn resolved() -> ResolvedOptions {
        let mut registry = OptionRegistry::new();
        let mut d = registry.declarer("app");
        d.opt_group(GroupDecl::new("late").title("late options").priority(50))
            .unwrap();
        d.opt_group(
            GroupDecl::new("early")
                .title("early options")
                .priority(10)
                .description("  First things.\n  Then more.  "),
        )
        .unwrap();
        d.opt_group(GroupDecl::new("secret").title("secret options").hidden(true))
            .unwrap();
        d.opt(OptionDecl::new("zeta").group("late").note("last")).unwrap();
        d.opt(
            OptionDecl::new("color")
                .short('c')
                .group("early")
                .choices(["red", "blue"])
                .default(Value::choice("red"))
                .env("COLOR"),
        )
        .unwrap();
        d.opt(OptionDecl::new("alpha").group("early").default(3)).unwrap();
        d.opt(OptionDecl::new("shh").group("secret")).unwrap();
        d.opt(OptionDecl::new("tiny").hidden(true).note("hidden option"))
            .unwrap();
        d.opt(OptionDecl::new("orphan").group("undeclared")).unwrap();
        d.opt(OptionDecl::new("off").group("late").disabled(true)).unwrap();
        OptionFinder::new(&registry, ["app"]).resolve().unwrap()
    }

    #[test]
    fn test_groups_sorted_by_priority_and_rows_by_long_name() {
        let lines = render_help("USAGE: app [OPTIONS]", &resolved(), false, None);
        assert_eq!(
            lines,
            vec![
                "USAGE: app [OPTIONS]",
                "early: early options",
                " First things.",
                " Then more.",
                "    --alpha INTEGER       (default: 3)",
                "    --color | -c CHOICE   (default: red) (choices: red, blue) [env: COLOR]",
                "late: late options",
                "    --zeta   last",
                "undeclared:",
                "    --orphan",
            ]
        );
    }

    #[test]
    fn test_hidden_content_shown_on_request() {
        let lines = render_help("usage", &resolved(), true, None);
        assert!(lines.contains(&"secret: secret options".to_string()));
        assert!(lines.iter().any(|line| line.contains("--tiny")));
        assert!(lines.iter().any(|line| line.starts_with("basic:")));
        assert!(!lines.iter().any(|line| line.contains("--off")));
    }

    #[test]
    fn test_max_width_truncates_cells() {
        let rows = vec![vec!["--abcdefgh".to_string(), "note".to_string()]];
        assert_eq!(columnize(&rows, Some(4)), vec!["    --ab   note"]);
    }

    #[test]
    fn test_switch_without_argument_has_no_note_or_default() {
        let resolved = resolved();
        let orphan = resolved.option("--orphan").unwrap();
        assert_eq!(switches_cell(orphan), "--orphan");
        assert_eq!(notes_cell(orphan), "");
    }
}
