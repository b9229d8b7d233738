//! Option groups: help-display metadata and whole-context enable/disable.

use serde::Serialize;

/// Priority of groups that do not declare one.
pub const DEFAULT_GROUP_PRIORITY: i64 = 50;

/// Name of the group for options that do not name one.
pub const BASIC_GROUP: &str = "basic";

/// One declaration of a group. `None` fields were not assigned.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GroupSpec {
    pub name: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub priority: Option<i64>,
    pub hidden: Option<bool>,
    pub disabled: Option<bool>,
}

impl GroupSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Overwrites every field that `later` explicitly set.
    pub fn merge_from(&mut self, later: &GroupSpec) {
        if later.title.is_some() {
            self.title.clone_from(&later.title);
        }
        if later.description.is_some() {
            self.description.clone_from(&later.description);
        }
        if later.priority.is_some() {
            self.priority = later.priority;
        }
        if later.hidden.is_some() {
            self.hidden = later.hidden;
        }
        if later.disabled.is_some() {
            self.disabled = later.disabled;
        }
    }
}

/// A merged group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OptionGroup {
    pub name: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub priority: i64,
    pub hidden: bool,
    pub disabled: bool,
}

impl OptionGroup {
    pub fn resolve(spec: &GroupSpec) -> Self {
        Self {
            name: spec.name.clone(),
            title: spec.title.clone(),
            description: spec.description.clone(),
            priority: spec.priority.unwrap_or(DEFAULT_GROUP_PRIORITY),
            hidden: spec.hidden.unwrap_or(false),
            disabled: spec.disabled.unwrap_or(false),
        }
    }

    /// Stand-in for a group named by options but never declared.
    pub fn synthesized(name: impl Into<String>) -> Self {
        Self::resolve(&GroupSpec::new(name))
    }

    /// Description lines, stripped, without blank lines.
    pub fn description_lines(&self) -> Vec<&str> {
        self.description
            .as_deref()
            .map(|text| {
                text.lines()
                    .map(str::trim)
                    .filter(|line| !line.is_empty())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Help ordering: priority, then name.
    pub fn sort_key(&self) -> (i64, &str) {
        (self.priority, &self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_keeps_unset_fields() {
        let mut base = GroupSpec {
            title: Some("database options".into()),
            priority: Some(10),
            ..GroupSpec::new("db")
        };
        let derived = GroupSpec {
            hidden: Some(true),
            ..GroupSpec::new("db")
        };
        base.merge_from(&derived);
        let group = OptionGroup::resolve(&base);
        assert_eq!(group.title.as_deref(), Some("database options"));
        assert_eq!(group.priority, 10);
        assert!(group.hidden);
        assert!(!group.disabled);
    }

    #[test]
    fn test_synthesized_group_uses_default_priority() {
        let group = OptionGroup::synthesized("misc");
        assert_eq!(group.priority, DEFAULT_GROUP_PRIORITY);
        assert!(group.title.is_none());
    }

    #[test]
    fn test_description_lines_are_stripped() {
        let group = OptionGroup::resolve(&GroupSpec {
            description: Some("\n    first line\n\n    second line\n  ".into()),
            ..GroupSpec::new("x")
        });
        assert_eq!(group.description_lines(), vec!["first line", "second line"]);
    }

    #[test]
    fn test_sort_key_breaks_ties_by_name() {
        let mut groups = [
            OptionGroup::synthesized("zeta"),
            OptionGroup::resolve(&GroupSpec {
                priority: Some(10),
                ..GroupSpec::new("omega")
            }),
            OptionGroup::synthesized("alpha"),
        ];
        groups.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
        let names: Vec<_> = groups.iter().map(|g| g.name.as_str()).collect();
        assert_eq!(names, ["omega", "alpha", "zeta"]);
    }
}
