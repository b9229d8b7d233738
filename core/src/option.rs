//! Option descriptors: the mergeable declaration and its resolved form.
//!
//! An [`OptionSpec`] records only what a declaration explicitly assigned;
//! every field is an `Option` and `None` means "not set here". Declarations
//! of the same long name along a chain are merged field by field with
//! [`OptionSpec::merge_from`], and only the merged spec is turned into a
//! [`ResolvedOption`], so inferred fields (type, requirement, target) never
//! shadow an explicit assignment made by another unit.
//!
//! # Examples
//!
//! ```
//! use declopt_core::{OptionDecl, ResolvedOption, TypeRegistry, Value};
//!
//! let types = TypeRegistry::builtin();
//! let mut base = OptionDecl::new("level").note("base").into_spec(&types).unwrap();
//! let derived = OptionDecl::new("level").default(5).into_spec(&types).unwrap();
//! base.merge_from(&derived);
//!
//! let level = ResolvedOption::resolve(&base, &types).unwrap();
//! assert_eq!(level.note(), Some("base"));
//! assert_eq!(level.default_value(), Some(&Value::Int(5)));
//! assert_eq!(level.option_type().unwrap().short_name(), "int");
//! ```

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use crate::error::{DeclarationError, EvaluationError};
use crate::targets::{TargetContainer, Targets};
use crate::types::{OptionType, TypeRegistry};
use crate::value::Value;

/// Whether a switch takes an argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Requirement {
    NoArgument,
    OptionalArgument,
    RequiredArgument,
}

impl Requirement {
    /// Parses a declaration token (`none`, `optional`, `required`).
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "none" => Some(Self::NoArgument),
            "optional" => Some(Self::OptionalArgument),
            "required" => Some(Self::RequiredArgument),
            _ => None,
        }
    }

    pub fn takes_argument(self) -> bool {
        self != Self::NoArgument
    }
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::NoArgument => "none",
            Self::OptionalArgument => "optional",
            Self::RequiredArgument => "required",
        })
    }
}

/// Input to an evaluation.
#[derive(Debug, Clone, PartialEq)]
pub enum Argument {
    /// The switch appeared without an argument.
    Missing,
    /// Raw text from the command line or the environment.
    Text(String),
    /// A typed value: a declared fixed value or presence `true`.
    Fixed(Value),
}

impl Argument {
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }
}

/// Signature of custom evaluators.
pub type CustomEvaluateFn =
    dyn Fn(&Argument, &ResolvedOption) -> Result<Value, EvaluationError> + Send + Sync;

/// How an option turns an [`Argument`] into a [`Value`], fixed at
/// resolution time.
#[derive(Clone)]
pub enum Evaluator {
    Type(Arc<OptionType>),
    Custom(Arc<CustomEvaluateFn>),
}

impl Evaluator {
    pub fn custom<F>(f: F) -> Self
    where
        F: Fn(&Argument, &ResolvedOption) -> Result<Value, EvaluationError> + Send + Sync + 'static,
    {
        Self::Custom(Arc::new(f))
    }

    pub fn is_custom(&self) -> bool {
        matches!(self, Self::Custom(_))
    }

    fn evaluate(
        &self,
        argument: &Argument,
        option: &ResolvedOption,
    ) -> Result<Value, EvaluationError> {
        match self {
            Self::Type(option_type) => option_type.evaluate(argument, option),
            Self::Custom(f) => f(argument, option),
        }
    }
}

impl fmt::Debug for Evaluator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Type(option_type) => f.debug_tuple("Type").field(&option_type.short_name()).finish(),
            Self::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

/// Canonical `--dash-case` long name for a declared name.
///
/// ```
/// assert_eq!(declopt_core::long_name_for("dry_run"), "--dry-run");
/// assert_eq!(declopt_core::long_name_for("--?"), "--?");
/// ```
pub fn long_name_for(name: &str) -> String {
    if name.starts_with("--") {
        name.to_string()
    } else {
        format!("--{}", name.replace('_', "-"))
    }
}

/// Default target variable for a long name: the name without the leading
/// dashes, every non-alphanumeric character replaced by `_`.
pub fn target_variable_for(long_name: &str) -> String {
    long_name
        .trim_start_matches("--")
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '_' })
        .collect()
}

macro_rules! overwrite_set_fields {
    ($into:expr, $from:expr, $($field:ident),+ $(,)?) => {
        $(
            if let Some(value) = &$from.$field {
                $into.$field = Some(value.clone());
            }
        )+
    };
}

/// One declaration of an option. `None` fields were not assigned.
#[derive(Debug, Clone, Default)]
pub struct OptionSpec {
    pub name: String,
    pub long_name: Option<String>,
    pub short_name: Option<char>,
    pub option_type: Option<Arc<OptionType>>,
    pub requirement: Option<Requirement>,
    pub argument_note: Option<String>,
    pub note: Option<String>,
    pub environment_variable: Option<String>,
    pub default_value: Option<Value>,
    pub choices: Option<Vec<String>>,
    pub target_variable: Option<String>,
    pub target_container: Option<TargetContainer>,
    pub set_value: Option<Value>,
    pub evaluator: Option<Evaluator>,
    pub hidden: Option<bool>,
    pub disabled: Option<bool>,
    pub group: Option<String>,
    pub no_accessor: Option<bool>,
}

impl OptionSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Key of the option in stores and resolved views.
    pub fn key(&self) -> String {
        self.long_name
            .clone()
            .unwrap_or_else(|| long_name_for(&self.name))
    }

    /// Overwrites every field that `later` explicitly set.
    pub fn merge_from(&mut self, later: &OptionSpec) {
        overwrite_set_fields!(
            self,
            later,
            long_name,
            short_name,
            option_type,
            requirement,
            argument_note,
            note,
            environment_variable,
            default_value,
            choices,
            target_variable,
            target_container,
            set_value,
            evaluator,
            hidden,
            disabled,
            group,
            no_accessor,
        );
    }
}

/// A merged option with every inferred field filled in.
#[derive(Debug, Clone)]
pub struct ResolvedOption {
    name: String,
    long_name: String,
    short_name: Option<char>,
    option_type: Option<Arc<OptionType>>,
    requirement: Requirement,
    argument_note: Option<String>,
    note: Option<String>,
    environment_variable: Option<String>,
    default_value: Option<Value>,
    choices: Vec<String>,
    target_variable: String,
    target_container: TargetContainer,
    set_value: Option<Value>,
    evaluator: Option<Evaluator>,
    hidden: bool,
    disabled: bool,
    group: Option<String>,
    no_accessor: bool,
}

impl ResolvedOption {
    /// Infers the missing fields of a (merged) declaration.
    ///
    /// # Errors
    ///
    /// Returns [`DeclarationError::ChoicesRequireChoiceType`] when `choices`
    /// are combined with an explicit type that cannot validate them.
    pub fn resolve(spec: &OptionSpec, types: &TypeRegistry) -> Result<Self, DeclarationError> {
        let long_name = spec.key();
        let choices = spec.choices.clone();

        let option_type = match (&spec.option_type, &choices) {
            (Some(explicit), _) => Some(explicit.clone()),
            (None, Some(_)) => {
                let listed = [&spec.default_value, &spec.set_value]
                    .into_iter()
                    .flatten()
                    .any(|v| matches!(v, Value::List(_)));
                types.find_by_short_name(if listed { "choices" } else { "choice" })
            }
            (None, None) => spec
                .default_value
                .as_ref()
                .and_then(|v| types.find_by_value(v))
                .or_else(|| spec.set_value.as_ref().and_then(|v| types.find_by_value(v))),
        };

        if let (Some(option_type), Some(_)) = (&option_type, &choices) {
            if !option_type.validates_choices() {
                return Err(DeclarationError::ChoicesRequireChoiceType {
                    option: long_name,
                    type_name: option_type.short_name().to_string(),
                });
            }
        }

        let requirement = spec.requirement.unwrap_or_else(|| {
            if spec.set_value.is_some() {
                Requirement::NoArgument
            } else {
                match &option_type {
                    Some(t) if t.short_name() == "switch" => Requirement::OptionalArgument,
                    Some(_) => Requirement::RequiredArgument,
                    None => Requirement::NoArgument,
                }
            }
        });

        let evaluator = match (&spec.evaluator, &option_type) {
            (Some(Evaluator::Custom(f)), _) => Some(Evaluator::Custom(f.clone())),
            (Some(Evaluator::Type(t)), _) | (None, Some(t)) => Some(Evaluator::Type(t.clone())),
            (None, None) => {
                let sample = match (&spec.set_value, requirement) {
                    (Some(value), _) => value.clone(),
                    (None, Requirement::NoArgument) => Value::Bool(true),
                    (None, _) => Value::Str(String::new()),
                };
                types
                    .find_by_value(&sample)
                    .or_else(|| types.find_by_short_name("switch"))
                    .map(Evaluator::Type)
            }
        };

        let argument_note = spec.argument_note.clone().or_else(|| {
            let note_type = match (&option_type, &evaluator) {
                (Some(t), _) | (None, Some(Evaluator::Type(t))) => Some(t),
                _ => None,
            };
            note_type.and_then(|t| t.argument_note().map(String::from))
        });

        let target_variable = spec
            .target_variable
            .clone()
            .unwrap_or_else(|| target_variable_for(&long_name));

        let resolved = Self {
            name: spec.name.clone(),
            short_name: spec.short_name,
            option_type,
            requirement,
            argument_note,
            note: spec.note.clone(),
            environment_variable: spec.environment_variable.clone(),
            default_value: spec.default_value.clone(),
            choices: choices.unwrap_or_default(),
            target_variable,
            target_container: spec.target_container.clone().unwrap_or_default(),
            set_value: spec.set_value.clone(),
            evaluator,
            hidden: spec.hidden.unwrap_or(false),
            disabled: spec.disabled.unwrap_or(false),
            group: spec.group.clone(),
            no_accessor: spec.no_accessor.unwrap_or(false),
            long_name,
        };
        debug!(
            option = %resolved.long_name,
            option_type = ?resolved.option_type.as_ref().map(|t| t.short_name()),
            requirement = %resolved.requirement,
            evaluator = ?resolved.evaluator,
            "resolved option"
        );
        Ok(resolved)
    }

    /// Evaluates an argument for this option.
    ///
    /// A declared fixed value replaces the argument; an option taking no
    /// argument (and without custom evaluator) evaluates presence `true`.
    ///
    /// # Errors
    ///
    /// Any [`EvaluationError`] of the evaluator, or
    /// [`EvaluationError::UndeterminedArgumentType`] when no evaluator
    /// could be resolved.
    pub fn evaluate(&self, argument: Argument) -> Result<Value, EvaluationError> {
        let argument = match (&self.set_value, &self.evaluator) {
            (Some(value), _) => Argument::Fixed(value.clone()),
            (None, Some(evaluator))
                if self.requirement == Requirement::NoArgument && !evaluator.is_custom() =>
            {
                Argument::Fixed(Value::Bool(true))
            }
            _ => argument,
        };
        let evaluator =
            self.evaluator
                .as_ref()
                .ok_or_else(|| EvaluationError::UndeterminedArgumentType {
                    option: self.long_name.clone(),
                })?;
        evaluator.evaluate(&argument, self)
    }

    /// Writes `value` into the option's target.
    pub fn bind(&self, targets: &mut Targets, value: Value) {
        debug!(option = %self.long_name, variable = %self.target_variable, %value, "bind");
        targets.bind(
            &self.target_container,
            &self.target_variable,
            Some(value),
            !self.no_accessor,
        );
    }

    /// Writes the default value (or "no value") into the option's target.
    pub fn instantiate_default(&self, targets: &mut Targets) {
        targets.bind(
            &self.target_container,
            &self.target_variable,
            self.default_value.clone(),
            !self.no_accessor,
        );
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn long_name(&self) -> &str {
        &self.long_name
    }

    pub fn short_name(&self) -> Option<char> {
        self.short_name
    }

    pub fn option_type(&self) -> Option<&Arc<OptionType>> {
        self.option_type.as_ref()
    }

    pub fn requirement(&self) -> Requirement {
        self.requirement
    }

    pub fn takes_argument(&self) -> bool {
        self.requirement.takes_argument()
    }

    pub fn argument_note(&self) -> Option<&str> {
        self.argument_note.as_deref()
    }

    pub fn note(&self) -> Option<&str> {
        self.note.as_deref()
    }

    pub fn environment_variable(&self) -> Option<&str> {
        self.environment_variable.as_deref()
    }

    pub fn default_value(&self) -> Option<&Value> {
        self.default_value.as_ref()
    }

    pub fn choices(&self) -> &[String] {
        &self.choices
    }

    pub fn target_variable(&self) -> &str {
        &self.target_variable
    }

    pub fn target_container(&self) -> &TargetContainer {
        &self.target_container
    }

    pub fn set_value(&self) -> Option<&Value> {
        self.set_value.as_ref()
    }

    pub fn evaluator(&self) -> Option<&Evaluator> {
        self.evaluator.as_ref()
    }

    pub fn is_hidden(&self) -> bool {
        self.hidden
    }

    pub fn is_disabled(&self) -> bool {
        self.disabled
    }

    pub fn group(&self) -> Option<&str> {
        self.group.as_deref()
    }

    pub fn creates_accessor(&self) -> bool {
        !self.no_accessor
    }
}
