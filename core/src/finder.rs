//! Merging stores along a declaration chain.
//!
//! [`OptionFinder`] walks a chain of unit names from most-base to
//! most-derived. For every option, group, select and check key it folds the
//! declarations found in the chain's stores with field-level overwrite, then
//! resolves the merged declarations into an immutable [`ResolvedOptions`]
//! view. The stores are only read, so each resolution sees their current
//! contents.
//!
//! # Examples
//!
//! ```
//! use declopt_core::{OptionDecl, OptionFinder, OptionRegistry, Value};
//!
//! let mut registry = OptionRegistry::new();
//! registry.declarer("base").opt(OptionDecl::new("level").note("base")).unwrap();
//! registry.declarer("derived").opt(OptionDecl::new("level").default(5)).unwrap();
//!
//! let resolved = OptionFinder::new(&registry, ["base", "derived"]).resolve().unwrap();
//! let level = resolved.option("--level").unwrap();
//! assert_eq!(level.note(), Some("base"));
//! assert_eq!(level.default_value(), Some(&Value::Int(5)));
//! ```

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::debug;

use crate::check::{CheckSpec, OptionCheck, OptionSelect, SelectSpec};
use crate::error::DeclarationError;
use crate::group::{GroupSpec, OptionGroup};
use crate::option::{OptionSpec, ResolvedOption};
use crate::store::{OptionRegistry, OptionStore};

/// Merges the stores of a declaration chain.
#[derive(Debug, Clone)]
pub struct OptionFinder<'a> {
    registry: &'a OptionRegistry,
    chain: Vec<String>,
}

impl<'a> OptionFinder<'a> {
    /// `chain` is ordered from most-base to most-derived. Units without a
    /// store are skipped.
    pub fn new<I, S>(registry: &'a OptionRegistry, chain: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            registry,
            chain: chain.into_iter().map(Into::into).collect(),
        }
    }

    pub fn chain(&self) -> &[String] {
        &self.chain
    }

    fn stores(&self) -> impl Iterator<Item = &'a OptionStore> + '_ {
        self.chain
            .iter()
            .filter_map(|unit| self.registry.store(unit))
    }

    /// Merged option declarations, before inference.
    pub fn merged_options(&self) -> BTreeMap<String, OptionSpec> {
        let mut merged: BTreeMap<String, OptionSpec> = BTreeMap::new();
        for store in self.stores() {
            for spec in store.options() {
                let key = spec.key();
                match merged.get_mut(&key) {
                    Some(existing) => {
                        debug!(option = %key, unit = store.unit(), "merging option declaration");
                        existing.merge_from(spec);
                    }
                    None => {
                        merged.insert(key, spec.clone());
                    }
                }
            }
        }
        merged
    }

    /// Merged group declarations.
    pub fn merged_groups(&self) -> BTreeMap<String, GroupSpec> {
        let mut merged: BTreeMap<String, GroupSpec> = BTreeMap::new();
        for spec in self.stores().flat_map(OptionStore::groups) {
            merged
                .entry(spec.name.clone())
                .and_modify(|existing| existing.merge_from(spec))
                .or_insert_with(|| spec.clone());
        }
        merged
    }

    fn merged_selects(&self) -> BTreeMap<String, SelectSpec> {
        let mut merged: BTreeMap<String, SelectSpec> = BTreeMap::new();
        for spec in self.stores().flat_map(OptionStore::selects) {
            merged
                .entry(spec.name.clone())
                .and_modify(|existing| existing.merge_from(spec))
                .or_insert_with(|| spec.clone());
        }
        merged
    }

    fn merged_checks(&self) -> BTreeMap<String, CheckSpec> {
        let mut merged: BTreeMap<String, CheckSpec> = BTreeMap::new();
        for spec in self.stores().flat_map(OptionStore::checks) {
            merged
                .entry(spec.name.clone())
                .and_modify(|existing| existing.merge_from(spec))
                .or_insert_with(|| spec.clone());
        }
        merged
    }

    /// Merges and resolves the chain.
    ///
    /// # Errors
    ///
    /// Any [`DeclarationError`] of option, select or check resolution, and
    /// [`DeclarationError::DuplicateShortName`] when two enabled options
    /// share a short switch.
    pub fn resolve(&self) -> Result<ResolvedOptions, DeclarationError> {
        let types = self.registry.types();
        let options = self
            .merged_options()
            .into_iter()
            .map(|(key, spec)| ResolvedOption::resolve(&spec, types).map(|option| (key, option)))
            .collect::<Result<BTreeMap<_, _>, DeclarationError>>()?;
        let groups = self
            .merged_groups()
            .into_iter()
            .map(|(name, spec)| (name, OptionGroup::resolve(&spec)))
            .collect();
        let selects = self
            .merged_selects()
            .values()
            .map(OptionSelect::resolve)
            .collect::<Result<Vec<_>, _>>()?;
        let checks = self
            .merged_checks()
            .values()
            .map(OptionCheck::resolve)
            .collect::<Result<Vec<_>, _>>()?;

        let resolved = ResolvedOptions {
            options,
            groups,
            selects,
            checks,
        };
        resolved.check_short_names()?;
        debug!(
            chain = ?self.chain,
            options = resolved.options.len(),
            groups = resolved.groups.len(),
            "resolved option chain"
        );
        Ok(resolved)
    }
}

/// The merged, immutable view of a declaration chain.
#[derive(Debug, Clone, Default)]
pub struct ResolvedOptions {
    options: BTreeMap<String, ResolvedOption>,
    groups: BTreeMap<String, OptionGroup>,
    selects: Vec<OptionSelect>,
    checks: Vec<OptionCheck>,
}

/// Row of [`ResolvedOptions::summary`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OptionSummary {
    pub long_name: String,
    pub short_name: Option<char>,
    pub option_type: Option<String>,
    pub requirement: String,
    pub group: Option<String>,
    pub target_variable: String,
    pub enabled: bool,
}

impl ResolvedOptions {
    pub fn option(&self, long_name: &str) -> Option<&ResolvedOption> {
        self.options.get(long_name)
    }

    /// All options in long-name order, disabled ones included.
    pub fn options(&self) -> impl Iterator<Item = &ResolvedOption> {
        self.options.values()
    }

    pub fn group(&self, name: &str) -> Option<&OptionGroup> {
        self.groups.get(name)
    }

    pub fn groups(&self) -> impl Iterator<Item = &OptionGroup> {
        self.groups.values()
    }

    pub fn selects(&self) -> &[OptionSelect] {
        &self.selects
    }

    pub fn checks(&self) -> &[OptionCheck] {
        &self.checks
    }

    /// Whether the option takes part in parsing: neither it nor its group
    /// is disabled.
    pub fn is_enabled(&self, option: &ResolvedOption) -> bool {
        !option.is_disabled()
            && option
                .group()
                .and_then(|name| self.groups.get(name))
                .is_none_or(|group| !group.disabled)
    }

    /// Enabled options in long-name order.
    pub fn parse_view(&self) -> impl Iterator<Item = &ResolvedOption> {
        self.options.values().filter(|option| self.is_enabled(option))
    }

    /// Enabled option with the given short switch.
    pub fn find_by_short(&self, short: char) -> Option<&ResolvedOption> {
        self.parse_view()
            .find(|option| option.short_name() == Some(short))
    }

    fn check_short_names(&self) -> Result<(), DeclarationError> {
        let mut seen: BTreeMap<char, &str> = BTreeMap::new();
        for option in self.parse_view() {
            let Some(short) = option.short_name() else {
                continue;
            };
            if let Some(first) = seen.insert(short, option.long_name()) {
                return Err(DeclarationError::DuplicateShortName {
                    short,
                    first: first.to_string(),
                    second: option.long_name().to_string(),
                });
            }
        }
        Ok(())
    }

    /// One serializable row per option, for diagnostics.
    pub fn summary(&self) -> Vec<OptionSummary> {
        self.options
            .values()
            .map(|option| OptionSummary {
                long_name: option.long_name().to_string(),
                short_name: option.short_name(),
                option_type: option.option_type().map(|t| t.short_name().to_string()),
                requirement: option.requirement().to_string(),
                group: option.group().map(String::from),
                target_variable: option.target_variable().to_string(),
                enabled: self.is_enabled(option),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::declare::{CheckDecl, GroupDecl, OptionDecl, SelectDecl};
    use crate::value::Value;

    fn registry() -> OptionRegistry {
        let mut registry = OptionRegistry::new();
        let mut base = registry.declarer("base");
        base.opt_group(GroupDecl::new("io").title("input/output").priority(10))
            .unwrap();
        base.opt(OptionDecl::new("level").note("base").short('l'))
            .unwrap();
        base.opt(OptionDecl::new("input").default("in.txt").group("io"))
            .unwrap();
        base.opt_select(SelectDecl::one_of("source", ["input", "url"]));

        let mut derived = registry.declarer("derived");
        derived.opt(OptionDecl::new("level").default(5)).unwrap();
        derived
            .opt_group(GroupDecl::new("io").description("where data flows"))
            .unwrap();
        derived.opt(OptionDecl::new("url").typed("uri")).unwrap();
        derived.opt_select(SelectDecl::new("source").error_message("one source please"));
        registry
    }

    #[test]
    fn test_field_level_merge_along_chain() {
        let registry = registry();
        let resolved = OptionFinder::new(&registry, ["base", "derived"])
            .resolve()
            .unwrap();
        let level = resolved.option("--level").unwrap();
        assert_eq!(level.note(), Some("base"));
        assert_eq!(level.short_name(), Some('l'));
        assert_eq!(level.default_value(), Some(&Value::Int(5)));

        let io = resolved.group("io").unwrap();
        assert_eq!(io.title.as_deref(), Some("input/output"));
        assert_eq!(io.description.as_deref(), Some("where data flows"));
        assert_eq!(io.priority, 10);

        let source = &resolved.selects()[0];
        assert_eq!(source.targets, vec!["input", "url"]);
        assert_eq!(source.error_message.as_deref(), Some("one source please"));
    }

    #[test]
    fn test_chain_order_decides_precedence() {
        let mut registry = registry();
        registry
            .declarer("base")
            .opt(OptionDecl::new("level").default(1))
            .unwrap();
        let forward = OptionFinder::new(&registry, ["base", "derived"]).resolve().unwrap();
        let reverse = OptionFinder::new(&registry, ["derived", "base"]).resolve().unwrap();
        assert_eq!(forward.option("--level").unwrap().default_value(), Some(&Value::Int(5)));
        assert_eq!(reverse.option("--level").unwrap().default_value(), Some(&Value::Int(1)));
    }

    #[test]
    fn test_inference_runs_after_merge() {
        let mut registry = OptionRegistry::new();
        registry
            .declarer("base")
            .opt(OptionDecl::new("when").typed("date"))
            .unwrap();
        registry
            .declarer("derived")
            .opt(OptionDecl::new("when").default("2024-01-01"))
            .unwrap();
        let resolved = OptionFinder::new(&registry, ["base", "derived"]).resolve().unwrap();
        let when = resolved.option("--when").unwrap();
        assert_eq!(when.option_type().unwrap().short_name(), "date");
    }

    #[test]
    fn test_missing_units_are_skipped() {
        let registry = registry();
        let resolved = OptionFinder::new(&registry, ["nowhere", "base"]).resolve().unwrap();
        assert!(resolved.option("--url").is_none());
        assert!(resolved.option("--level").is_some());
    }

    #[test]
    fn test_disabled_group_removes_options_from_parse_view() {
        let mut registry = registry();
        registry
            .declarer("derived")
            .opt_group(GroupDecl::new("io").disabled(true))
            .unwrap();
        let resolved = OptionFinder::new(&registry, ["base", "derived"]).resolve().unwrap();
        let names: Vec<_> = resolved.parse_view().map(|o| o.long_name()).collect();
        assert_eq!(names, ["--level", "--url"]);
        assert!(resolved.option("--input").is_some());
    }

    #[test]
    fn test_duplicate_short_name_is_rejected() {
        let mut registry = registry();
        registry
            .declarer("derived")
            .opt(OptionDecl::new("loud").short('l'))
            .unwrap();
        let err = OptionFinder::new(&registry, ["base", "derived"])
            .resolve()
            .unwrap_err();
        assert_eq!(
            err,
            DeclarationError::DuplicateShortName {
                short: 'l',
                first: "--level".into(),
                second: "--loud".into()
            }
        );
    }

    #[test]
    fn test_check_without_action_fails_resolution() {
        let mut registry = registry();
        registry
            .declarer("derived")
            .opt_check(CheckDecl::new("url").targets(["input"]));
        assert!(matches!(
            OptionFinder::new(&registry, ["base", "derived"]).resolve(),
            Err(DeclarationError::MissingAction { .. })
        ));
    }

    #[test]
    fn test_summary_serializes() {
        let registry = registry();
        let resolved = OptionFinder::new(&registry, ["base", "derived"]).resolve().unwrap();
        let json = serde_json::to_value(resolved.summary()).unwrap();
        assert_eq!(json[0]["long_name"], "--input");
        assert_eq!(json[0]["requirement"], "required");
        assert_eq!(json[2]["option_type"], "uri");
    }
}
