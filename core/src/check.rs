//! Cross-option validation run after the argument stream is consumed.
//!
//! A select counts how many of its target variables are present; a check
//! ties one variable to a set of others (`requires` / `excludes`). Both are
//! declared per unit and merged along the chain by name, exactly like
//! options.

use serde::Serialize;

use crate::error::{CheckError, DeclarationError};
use crate::option::long_name_for;
use crate::targets::{TargetContainer, Targets};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectAction {
    /// Exactly one target present.
    OneOf,
    /// At most one target present.
    NoneOrOneOf,
    /// At least one target present.
    OneOrMoreOf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckAction {
    Requires,
    Excludes,
}

/// One declaration of a select. `None` fields were not assigned.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SelectSpec {
    pub name: String,
    pub action: Option<SelectAction>,
    pub targets: Option<Vec<String>>,
    pub error_message: Option<String>,
    pub target_container: Option<TargetContainer>,
}

/// One declaration of a check; `name` is the checked variable.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CheckSpec {
    pub name: String,
    pub action: Option<CheckAction>,
    pub targets: Option<Vec<String>>,
    pub error_message: Option<String>,
    pub target_container: Option<TargetContainer>,
}

macro_rules! merge_rule_fields {
    ($ty:ty) => {
        impl $ty {
            pub fn new(name: impl Into<String>) -> Self {
                Self {
                    name: name.into(),
                    ..Self::default()
                }
            }

            /// Overwrites every field that `later` explicitly set.
            pub fn merge_from(&mut self, later: &Self) {
                if later.action.is_some() {
                    self.action = later.action;
                }
                if later.targets.is_some() {
                    self.targets.clone_from(&later.targets);
                }
                if later.error_message.is_some() {
                    self.error_message.clone_from(&later.error_message);
                }
                if later.target_container.is_some() {
                    self.target_container.clone_from(&later.target_container);
                }
            }
        }
    };
}

merge_rule_fields!(SelectSpec);
merge_rule_fields!(CheckSpec);

fn required_targets(
    name: &str,
    targets: &Option<Vec<String>>,
) -> Result<Vec<String>, DeclarationError> {
    match targets {
        Some(targets) if !targets.is_empty() => Ok(targets.clone()),
        _ => Err(DeclarationError::EmptyTargets {
            name: name.to_string(),
        }),
    }
}

fn switches(names: &[String]) -> Vec<String> {
    names.iter().map(|name| long_name_for(name)).collect()
}

/// A merged select.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OptionSelect {
    pub name: String,
    pub action: SelectAction,
    pub targets: Vec<String>,
    pub error_message: Option<String>,
    pub target_container: TargetContainer,
}

impl OptionSelect {
    pub fn resolve(spec: &SelectSpec) -> Result<Self, DeclarationError> {
        let action = spec.action.ok_or_else(|| DeclarationError::MissingAction {
            name: spec.name.clone(),
        })?;
        Ok(Self {
            name: spec.name.clone(),
            action,
            targets: required_targets(&spec.name, &spec.targets)?,
            error_message: spec.error_message.clone(),
            target_container: spec.target_container.clone().unwrap_or_default(),
        })
    }

    pub fn validate(&self, targets: &Targets) -> Result<(), CheckError> {
        let present = self
            .targets
            .iter()
            .filter(|variable| targets.is_present(&self.target_container, variable))
            .count();
        let failure = match self.action {
            SelectAction::OneOf if present != 1 => CheckError::OnlyOneOf(switches(&self.targets)),
            SelectAction::NoneOrOneOf if present > 1 => {
                CheckError::NoMoreThanOneOf(switches(&self.targets))
            }
            SelectAction::OneOrMoreOf if present < 1 => {
                CheckError::AtLeastOneOf(switches(&self.targets))
            }
            _ => return Ok(()),
        };
        Err(self.error_message.clone().map_or(failure, CheckError::Custom))
    }
}

/// A merged check.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OptionCheck {
    pub name: String,
    pub action: CheckAction,
    pub targets: Vec<String>,
    pub error_message: Option<String>,
    pub target_container: TargetContainer,
}

impl OptionCheck {
    pub fn resolve(spec: &CheckSpec) -> Result<Self, DeclarationError> {
        let action = spec.action.ok_or_else(|| DeclarationError::MissingAction {
            name: spec.name.clone(),
        })?;
        Ok(Self {
            name: spec.name.clone(),
            action,
            targets: required_targets(&spec.name, &spec.targets)?,
            error_message: spec.error_message.clone(),
            target_container: spec.target_container.clone().unwrap_or_default(),
        })
    }

    pub fn validate(&self, targets: &Targets) -> Result<(), CheckError> {
        let container = &self.target_container;
        let failure = if !targets.is_present(container, &self.name) {
            CheckError::NotSpecified(long_name_for(&self.name))
        } else {
            let offending: Vec<String> = match self.action {
                CheckAction::Requires => self
                    .targets
                    .iter()
                    .filter(|variable| !targets.is_present(container, variable))
                    .cloned()
                    .collect(),
                CheckAction::Excludes => self
                    .targets
                    .iter()
                    .filter(|variable| targets.is_present(container, variable))
                    .cloned()
                    .collect(),
            };
            if offending.is_empty() {
                return Ok(());
            }
            match self.action {
                CheckAction::Requires => CheckError::Requires(switches(&offending)),
                CheckAction::Excludes => CheckError::Excludes(switches(&offending)),
            }
        };
        Err(self.error_message.clone().map_or(failure, CheckError::Custom))
    }
}
