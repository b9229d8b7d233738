//! Declaration builders.
//!
//! [`OptionDecl`], [`GroupDecl`], [`SelectDecl`] and [`CheckDecl`] record
//! what an application declares. Only the setters actually called end up
//! set on the resulting spec, which is what makes field-level merging
//! along a declaration chain work.
//!
//! # Examples
//!
//! ```
//! use declopt_core::{OptionDecl, Requirement, TypeRegistry, Value};
//!
//! let types = TypeRegistry::builtin();
//! let spec = OptionDecl::new("batch_size")
//!     .short('b')
//!     .note("rows per batch")
//!     .default(500)
//!     .env("BATCH_SIZE")
//!     .into_spec(&types)
//!     .unwrap();
//!
//! assert_eq!(spec.key(), "--batch-size");
//! assert_eq!(spec.default_value, Some(Value::Int(500)));
//! assert!(spec.requirement.is_none());
//!
//! let spec = OptionDecl::new("when").token("date").token("optional").into_spec(&types).unwrap();
//! assert_eq!(spec.requirement, Some(Requirement::OptionalArgument));
//! ```

use crate::check::{CheckAction, CheckSpec, SelectAction, SelectSpec};
use crate::error::{DeclarationError, EvaluationError};
use crate::group::GroupSpec;
use crate::option::{Argument, Evaluator, OptionSpec, Requirement, ResolvedOption};
use crate::targets::TargetContainer;
use crate::types::TypeRegistry;
use crate::value::Value;

/// Builder for one option declaration.
#[derive(Debug, Clone)]
pub struct OptionDecl {
    spec: OptionSpec,
    short: Option<char>,
    type_name: Option<String>,
    tokens: Vec<String>,
}

impl OptionDecl {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            spec: OptionSpec::new(name),
            short: None,
            type_name: None,
            tokens: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.spec.name
    }

    /// Overrides the derived `--long-name`.
    pub fn long(mut self, long_name: impl Into<String>) -> Self {
        self.spec.long_name = Some(long_name.into());
        self
    }

    pub fn short(mut self, short: char) -> Self {
        self.short = Some(short);
        self
    }

    pub fn note(mut self, note: impl Into<String>) -> Self {
        self.spec.note = Some(note.into());
        self
    }

    /// Sets the type by registry short name.
    pub fn typed(mut self, type_name: impl Into<String>) -> Self {
        self.type_name = Some(type_name.into());
        self
    }

    pub fn requirement(mut self, requirement: Requirement) -> Self {
        self.spec.requirement = Some(requirement);
        self
    }

    pub fn required(self) -> Self {
        self.requirement(Requirement::RequiredArgument)
    }

    pub fn optional(self) -> Self {
        self.requirement(Requirement::OptionalArgument)
    }

    pub fn no_argument(self) -> Self {
        self.requirement(Requirement::NoArgument)
    }

    /// A free token: a requirement (`none`, `optional`, `required`) or a
    /// type short name. Checked by [`OptionDecl::into_spec`].
    pub fn token(mut self, token: impl Into<String>) -> Self {
        self.tokens.push(token.into());
        self
    }

    pub fn argument_note(mut self, note: impl Into<String>) -> Self {
        self.spec.argument_note = Some(note.into());
        self
    }

    pub fn env(mut self, variable: impl Into<String>) -> Self {
        self.spec.environment_variable = Some(variable.into());
        self
    }

    pub fn default(mut self, value: impl Into<Value>) -> Self {
        self.spec.default_value = Some(value.into());
        self
    }

    pub fn choices<I, S>(mut self, choices: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.spec.choices = Some(choices.into_iter().map(Into::into).collect());
        self
    }

    pub fn target_variable(mut self, variable: impl Into<String>) -> Self {
        self.spec.target_variable = Some(variable.into());
        self
    }

    pub fn container(mut self, container: TargetContainer) -> Self {
        self.spec.target_container = Some(container);
        self
    }

    /// Fixed value bound when the switch is given; the switch then takes
    /// no argument.
    pub fn set(mut self, value: impl Into<Value>) -> Self {
        self.spec.set_value = Some(value.into());
        self
    }

    pub fn evaluate_with<F>(mut self, f: F) -> Self
    where
        F: Fn(&Argument, &ResolvedOption) -> Result<Value, EvaluationError> + Send + Sync + 'static,
    {
        self.spec.evaluator = Some(Evaluator::custom(f));
        self
    }

    pub fn hidden(mut self, hidden: bool) -> Self {
        self.spec.hidden = Some(hidden);
        self
    }

    pub fn disabled(mut self, disabled: bool) -> Self {
        self.spec.disabled = Some(disabled);
        self
    }

    pub fn group(mut self, group: impl Into<String>) -> Self {
        self.spec.group = Some(group.into());
        self
    }

    pub fn no_accessor(mut self) -> Self {
        self.spec.no_accessor = Some(true);
        self
    }

    pub(crate) fn has_group(&self) -> bool {
        self.spec.group.is_some()
    }

    /// Validates the declaration and produces its spec.
    ///
    /// # Errors
    ///
    /// - [`DeclarationError::MissingName`] for an empty name
    /// - [`DeclarationError::InvalidShortName`] for a dash, whitespace or
    ///   control character short switch
    /// - [`DeclarationError::UnknownType`] for a type name not registered
    /// - [`DeclarationError::UnrecognizedToken`] for any other free token
    pub fn into_spec(self, types: &TypeRegistry) -> Result<OptionSpec, DeclarationError> {
        let Self {
            mut spec,
            short,
            type_name,
            tokens,
        } = self;
        if spec.name.trim().is_empty() {
            return Err(DeclarationError::MissingName);
        }
        let option = spec.key();

        if let Some(short) = short {
            if short == '-' || short.is_whitespace() || short.is_control() {
                return Err(DeclarationError::InvalidShortName {
                    option,
                    short: short.to_string(),
                });
            }
            spec.short_name = Some(short);
        }

        for token in tokens {
            if let Some(requirement) = Requirement::from_token(&token) {
                spec.requirement = Some(requirement);
            } else if let Some(option_type) = types.find_by_short_name(&token) {
                spec.option_type = Some(option_type);
            } else {
                return Err(DeclarationError::UnrecognizedToken {
                    option,
                    token,
                });
            }
        }

        if let Some(type_name) = type_name {
            let option_type = types.find_by_short_name(&type_name).ok_or_else(|| {
                DeclarationError::UnknownType {
                    option: option.clone(),
                    type_name,
                    valid: types.short_names().join(", "),
                }
            })?;
            spec.option_type = Some(option_type);
        }
        Ok(spec)
    }
}

/// Builder for one group declaration.
#[derive(Debug, Clone)]
pub struct GroupDecl {
    spec: GroupSpec,
}

impl GroupDecl {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            spec: GroupSpec::new(name),
        }
    }

    pub fn name(&self) -> &str {
        &self.spec.name
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.spec.title = Some(title.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.spec.description = Some(description.into());
        self
    }

    pub fn priority(mut self, priority: i64) -> Self {
        self.spec.priority = Some(priority);
        self
    }

    pub fn hidden(mut self, hidden: bool) -> Self {
        self.spec.hidden = Some(hidden);
        self
    }

    pub fn disabled(mut self, disabled: bool) -> Self {
        self.spec.disabled = Some(disabled);
        self
    }

    pub fn into_spec(self) -> Result<GroupSpec, DeclarationError> {
        if self.spec.name.trim().is_empty() {
            return Err(DeclarationError::MissingGroupName);
        }
        Ok(self.spec)
    }
}

/// Builder for a select over several target variables.
#[derive(Debug, Clone)]
pub struct SelectDecl {
    spec: SelectSpec,
}

impl SelectDecl {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            spec: SelectSpec::new(name),
        }
    }

    pub fn one_of<I, S>(name: impl Into<String>, targets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(name).action(SelectAction::OneOf).targets(targets)
    }

    pub fn none_or_one_of<I, S>(name: impl Into<String>, targets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(name).action(SelectAction::NoneOrOneOf).targets(targets)
    }

    pub fn one_or_more_of<I, S>(name: impl Into<String>, targets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(name).action(SelectAction::OneOrMoreOf).targets(targets)
    }

    pub fn action(mut self, action: SelectAction) -> Self {
        self.spec.action = Some(action);
        self
    }

    pub fn targets<I, S>(mut self, targets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.spec.targets = Some(targets.into_iter().map(Into::into).collect());
        self
    }

    pub fn error_message(mut self, message: impl Into<String>) -> Self {
        self.spec.error_message = Some(message.into());
        self
    }

    pub fn container(mut self, container: TargetContainer) -> Self {
        self.spec.target_container = Some(container);
        self
    }

    pub fn into_spec(self) -> SelectSpec {
        self.spec
    }
}

/// Builder for a requires/excludes check on one variable.
#[derive(Debug, Clone)]
pub struct CheckDecl {
    spec: CheckSpec,
}

impl CheckDecl {
    pub fn new(variable: impl Into<String>) -> Self {
        Self {
            spec: CheckSpec::new(variable),
        }
    }

    pub fn requires<I, S>(variable: impl Into<String>, targets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(variable).action(CheckAction::Requires).targets(targets)
    }

    pub fn excludes<I, S>(variable: impl Into<String>, targets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(variable).action(CheckAction::Excludes).targets(targets)
    }

    pub fn action(mut self, action: CheckAction) -> Self {
        self.spec.action = Some(action);
        self
    }

    pub fn targets<I, S>(mut self, targets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.spec.targets = Some(targets.into_iter().map(Into::into).collect());
        self
    }

    pub fn error_message(mut self, message: impl Into<String>) -> Self {
        self.spec.error_message = Some(message.into());
        self
    }

    pub fn container(mut self, container: TargetContainer) -> Self {
        self.spec.target_container = Some(container);
        self
    }

    pub fn into_spec(self) -> CheckSpec {
        self.spec
    }
}
