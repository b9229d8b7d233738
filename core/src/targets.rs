//! Binding targets for evaluated option values.
//!
//! [`Targets`] is the context object options bind into. Each binding lives
//! in a [`TargetContainer`] under a variable name and remembers whether it
//! is reachable through the accessor API ([`Targets::get`],
//! [`Targets::set`], [`Targets::value`]).
//!
//! # Examples
//!
//! ```
//! use declopt_core::{TargetContainer, Targets, Value};
//!
//! let mut targets = Targets::new();
//! let app = TargetContainer::Application;
//! targets.bind(&app, "retries", Some(Value::Int(3)), true);
//! targets.bind(&app, "secret", Some(Value::from("s3cr3t")), false);
//!
//! assert_eq!(targets.value::<i64>(&app, "retries").unwrap(), Some(3));
//! assert!(targets.get(&app, "secret").is_err());
//! assert_eq!(targets.raw(&app, "secret"), Some(&Value::from("s3cr3t")));
//! ```

use std::any::type_name;
use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::error::BindError;
use crate::value::{FromValue, Value};

/// Receiver of a binding.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(tag = "kind", content = "name", rename_all = "snake_case")]
pub enum TargetContainer {
    /// The running application.
    #[default]
    Application,
    /// Shared by every user of a type.
    Class(String),
    /// A named instance.
    Instance(String),
}

/// Class-scoped container for `T`.
pub fn class_of<T: ?Sized>() -> TargetContainer {
    TargetContainer::Class(type_name::<T>().to_string())
}

impl fmt::Display for TargetContainer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Application => f.write_str("application"),
            Self::Class(name) => write!(f, "class {name}"),
            Self::Instance(name) => write!(f, "instance {name}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Slot {
    value: Option<Value>,
    accessor: bool,
}

/// Bound option values, per container.
#[derive(Debug, Clone, Default)]
pub struct Targets {
    containers: BTreeMap<TargetContainer, BTreeMap<String, Slot>>,
}

impl Targets {
    pub fn new() -> Self {
        Self::default()
    }

    /// Writes a binding, creating the variable when needed.
    pub fn bind(
        &mut self,
        container: &TargetContainer,
        variable: &str,
        value: Option<Value>,
        accessor: bool,
    ) {
        self.containers
            .entry(container.clone())
            .or_default()
            .insert(variable.to_string(), Slot { value, accessor });
    }

    fn slot(&self, container: &TargetContainer, variable: &str) -> Result<&Slot, BindError> {
        let slot = self
            .containers
            .get(container)
            .and_then(|vars| vars.get(variable))
            .ok_or_else(|| BindError::UnknownVariable {
                container: container.clone(),
                variable: variable.to_string(),
            })?;
        if !slot.accessor {
            return Err(BindError::NoAccessor {
                container: container.clone(),
                variable: variable.to_string(),
            });
        }
        Ok(slot)
    }

    /// Reads a variable through its accessor.
    ///
    /// # Errors
    ///
    /// [`BindError::UnknownVariable`] for undeclared variables and
    /// [`BindError::NoAccessor`] for variables declared without accessor.
    pub fn get(
        &self,
        container: &TargetContainer,
        variable: &str,
    ) -> Result<Option<&Value>, BindError> {
        Ok(self.slot(container, variable)?.value.as_ref())
    }

    /// Typed read through the accessor; `None` when unbound or of another
    /// kind.
    pub fn value<T: FromValue>(
        &self,
        container: &TargetContainer,
        variable: &str,
    ) -> Result<Option<T>, BindError> {
        Ok(self.get(container, variable)?.and_then(T::from_value))
    }

    /// Writes a variable through its accessor.
    pub fn set(
        &mut self,
        container: &TargetContainer,
        variable: &str,
        value: Value,
    ) -> Result<(), BindError> {
        self.slot(container, variable)?;
        self.bind(container, variable, Some(value), true);
        Ok(())
    }

    /// Reads a variable regardless of its accessor.
    pub fn raw(&self, container: &TargetContainer, variable: &str) -> Option<&Value> {
        self.containers.get(container)?.get(variable)?.value.as_ref()
    }

    /// Whether a variable holds a present value (see [`Value::is_present`]).
    pub fn is_present(&self, container: &TargetContainer, variable: &str) -> bool {
        self.raw(container, variable).is_some_and(Value::is_present)
    }

    pub fn variables(&self, container: &TargetContainer) -> Vec<&str> {
        self.containers
            .get(container)
            .map(|vars| vars.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }

    pub fn containers(&self) -> impl Iterator<Item = &TargetContainer> {
        self.containers.keys()
    }

    /// Accessor-visible values of a container as a JSON object.
    pub fn snapshot(&self, container: &TargetContainer) -> serde_json::Result<serde_json::Value> {
        let visible: BTreeMap<&str, Option<&Value>> = self
            .containers
            .get(container)
            .into_iter()
            .flatten()
            .filter(|(_, slot)| slot.accessor)
            .map(|(name, slot)| (name.as_str(), slot.value.as_ref()))
            .collect();
        serde_json::to_value(visible)
    }
}
