//! Per-unit declaration stores and the registry that owns them.
//!
//! Every declaring unit (typically one Rust type implementing
//! [`DeclaringUnit`]) gets its own [`OptionStore`], created the first time
//! the unit declares something. Repeated declarations of the same key
//! within one store refine the stored spec field by field.
//!
//! # Examples
//!
//! ```
//! use declopt_core::{GroupDecl, OptionDecl, OptionRegistry};
//!
//! let mut registry = OptionRegistry::new();
//! let mut declarer = registry.declarer("tool");
//! declarer
//!     .opt_group_with(GroupDecl::new("db").title("database options"), |d| {
//!         d.opt(OptionDecl::new("db_host").default("localhost"))?;
//!         d.opt(OptionDecl::new("db_port").default(5432))
//!     })
//!     .unwrap();
//! declarer.opt(OptionDecl::new("db_port").note("server port")).unwrap();
//!
//! let store = registry.store("tool").unwrap();
//! let port = store.option("--db-port").unwrap();
//! assert_eq!(port.group.as_deref(), Some("db"));
//! assert_eq!(port.note.as_deref(), Some("server port"));
//! ```

use std::any::type_name;
use std::collections::BTreeMap;

use tracing::debug;

use crate::check::{CheckSpec, SelectSpec};
use crate::declare::{CheckDecl, GroupDecl, OptionDecl, SelectDecl};
use crate::error::DeclarationError;
use crate::group::GroupSpec;
use crate::option::OptionSpec;
use crate::types::TypeRegistry;

/// Declarations of one unit.
#[derive(Debug, Clone, Default)]
pub struct OptionStore {
    unit: String,
    options: BTreeMap<String, OptionSpec>,
    groups: BTreeMap<String, GroupSpec>,
    selects: BTreeMap<String, SelectSpec>,
    checks: BTreeMap<String, CheckSpec>,
}

impl OptionStore {
    pub fn new(unit: impl Into<String>) -> Self {
        Self {
            unit: unit.into(),
            ..Self::default()
        }
    }

    pub fn unit(&self) -> &str {
        &self.unit
    }

    /// The stored spec for `long_name`, created empty on first access.
    pub fn get_option(&mut self, long_name: &str) -> &mut OptionSpec {
        self.options
            .entry(long_name.to_string())
            .or_insert_with(|| OptionSpec {
                long_name: Some(long_name.to_string()),
                ..OptionSpec::new(long_name.trim_start_matches("--"))
            })
    }

    pub fn add_option(&mut self, spec: OptionSpec) {
        let key = spec.key();
        match self.options.get_mut(&key) {
            Some(existing) => existing.merge_from(&spec),
            None => {
                self.options.insert(key, spec);
            }
        }
    }

    pub fn add_group(&mut self, spec: GroupSpec) {
        match self.groups.get_mut(&spec.name) {
            Some(existing) => existing.merge_from(&spec),
            None => {
                self.groups.insert(spec.name.clone(), spec);
            }
        }
    }

    pub fn add_select(&mut self, spec: SelectSpec) {
        match self.selects.get_mut(&spec.name) {
            Some(existing) => existing.merge_from(&spec),
            None => {
                self.selects.insert(spec.name.clone(), spec);
            }
        }
    }

    pub fn add_check(&mut self, spec: CheckSpec) {
        match self.checks.get_mut(&spec.name) {
            Some(existing) => existing.merge_from(&spec),
            None => {
                self.checks.insert(spec.name.clone(), spec);
            }
        }
    }

    pub fn option(&self, long_name: &str) -> Option<&OptionSpec> {
        self.options.get(long_name)
    }

    pub fn options(&self) -> impl Iterator<Item = &OptionSpec> {
        self.options.values()
    }

    pub fn group(&self, name: &str) -> Option<&GroupSpec> {
        self.groups.get(name)
    }

    pub fn groups(&self) -> impl Iterator<Item = &GroupSpec> {
        self.groups.values()
    }

    pub fn selects(&self) -> impl Iterator<Item = &SelectSpec> {
        self.selects.values()
    }

    pub fn checks(&self) -> impl Iterator<Item = &CheckSpec> {
        self.checks.values()
    }
}

/// Owner of the type registry and of every unit's store.
#[derive(Debug, Clone, Default)]
pub struct OptionRegistry {
    types: TypeRegistry,
    stores: BTreeMap<String, OptionStore>,
}

impl OptionRegistry {
    /// A registry with the built-in types and no stores.
    pub fn new() -> Self {
        Self::with_types(TypeRegistry::builtin())
    }

    pub fn with_types(types: TypeRegistry) -> Self {
        Self {
            types,
            stores: BTreeMap::new(),
        }
    }

    pub fn types(&self) -> &TypeRegistry {
        &self.types
    }

    pub fn types_mut(&mut self) -> &mut TypeRegistry {
        &mut self.types
    }

    pub fn store(&self, unit: &str) -> Option<&OptionStore> {
        self.stores.get(unit)
    }

    /// The store for `unit`, created on first use.
    pub fn store_mut(&mut self, unit: &str) -> &mut OptionStore {
        self.stores.entry(unit.to_string()).or_insert_with(|| {
            debug!(unit, "creating option store");
            OptionStore::new(unit)
        })
    }

    pub fn units(&self) -> impl Iterator<Item = &str> {
        self.stores.keys().map(String::as_str)
    }

    pub fn declarer(&mut self, unit: impl Into<String>) -> Declarer<'_> {
        Declarer {
            registry: self,
            unit: unit.into(),
            current_group: None,
        }
    }

    /// Runs the declarations of `U` into its own store.
    pub fn declare<U: DeclaringUnit + ?Sized>(&mut self) -> Result<(), DeclarationError> {
        let mut declarer = self.declarer(U::unit_name());
        U::declare(&mut declarer)
    }
}

/// Records declarations into one unit's store.
#[derive(Debug)]
pub struct Declarer<'a> {
    registry: &'a mut OptionRegistry,
    unit: String,
    current_group: Option<String>,
}

impl Declarer<'_> {
    pub fn unit(&self) -> &str {
        &self.unit
    }

    pub fn opt(&mut self, decl: OptionDecl) -> Result<(), DeclarationError> {
        let decl = match &self.current_group {
            Some(group) if !decl.has_group() => decl.group(group.clone()),
            _ => decl,
        };
        let spec = decl.into_spec(&self.registry.types)?;
        debug!(unit = %self.unit, option = %spec.key(), "declared option");
        self.registry.store_mut(&self.unit).add_option(spec);
        Ok(())
    }

    pub fn opt_group(&mut self, decl: GroupDecl) -> Result<(), DeclarationError> {
        let spec = decl.into_spec()?;
        self.registry.store_mut(&self.unit).add_group(spec);
        Ok(())
    }

    /// Declares a group and assigns it to options declared in `body` that
    /// do not name a group themselves.
    pub fn opt_group_with<F>(&mut self, decl: GroupDecl, body: F) -> Result<(), DeclarationError>
    where
        F: FnOnce(&mut Self) -> Result<(), DeclarationError>,
    {
        let name = decl.name().to_string();
        self.opt_group(decl)?;
        let previous = self.current_group.replace(name);
        let result = body(self);
        self.current_group = previous;
        result
    }

    pub fn opt_select(&mut self, decl: SelectDecl) {
        self.registry
            .store_mut(&self.unit)
            .add_select(decl.into_spec());
    }

    pub fn opt_check(&mut self, decl: CheckDecl) {
        self.registry.store_mut(&self.unit).add_check(decl.into_spec());
    }
}

/// A unit that declares its own options.
pub trait DeclaringUnit {
    /// Store key of the unit; the type name unless overridden.
    fn unit_name() -> String {
        type_name::<Self>().to_string()
    }

    fn declare(declarer: &mut Declarer<'_>) -> Result<(), DeclarationError>;
}
