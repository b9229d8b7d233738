//! Error taxonomy for option declaration, evaluation, checks and bindings.
//!
//! - [`DeclarationError`]: the application author made a mistake while
//!   declaring options. These surface at declaration or resolution time.
//! - [`EvaluationError`]: a command-line or environment argument could not
//!   be turned into a value for its option.
//! - [`CheckError`]: a cross-option select/check rejected the bound values.
//! - [`BindError`]: an accessor read or write was refused.

use thiserror::Error;

use crate::targets::TargetContainer;

/// Configuration errors raised while declaring or resolving options.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeclarationError {
    /// `opt` was called without a name.
    #[error("no name given for option")]
    MissingName,
    /// `opt_group` was called without a name.
    #[error("no name given for option group")]
    MissingGroupName,
    /// A free declaration token is neither a requirement nor a type name.
    #[error("{option}: extra option {token:?} is not understood")]
    UnrecognizedToken { option: String, token: String },
    /// A type short name does not exist in the registry.
    #[error("{option}: option type {type_name:?} is not recognized (valid option types: {valid})")]
    UnknownType {
        option: String,
        type_name: String,
        valid: String,
    },
    /// Two option types were registered under the same short name.
    #[error("option type {0:?} is already registered")]
    DuplicateType(String),
    /// A short switch is not a single printable, non-dash character.
    #[error("{option}: invalid short switch {short:?}")]
    InvalidShortName { option: String, short: String },
    /// Two different options claim the same short switch.
    #[error("short switch -{short} is declared by both {first} and {second}")]
    DuplicateShortName {
        short: char,
        first: String,
        second: String,
    },
    /// `choices` were declared on an option whose type cannot validate them.
    #[error("{option}: choices require a choice type, found {type_name}")]
    ChoicesRequireChoiceType { option: String, type_name: String },
    /// A check or select was declared without targets.
    #[error("{name}: an array of options must be specified")]
    EmptyTargets { name: String },
    /// A check or select was declared without an action.
    #[error("{name}: no action given")]
    MissingAction { name: String },
}

/// Errors raised while evaluating an argument through an option.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EvaluationError {
    /// The argument is not one of the declared choices.
    #[error("{option}: invalid choice '{value}' not in list of choices: {}", .choices.join(", "))]
    BadChoice {
        option: String,
        value: String,
        choices: Vec<String>,
    },
    /// No evaluator could be resolved for the option.
    #[error("{option}: undetermined argument type")]
    UndeterminedArgumentType { option: String },
    /// A numeric argument did not parse.
    #[error("{option}: '{value}' is not a valid {kind}")]
    InvalidNumber {
        option: String,
        value: String,
        kind: &'static str,
    },
    /// A switch argument was not one of true/false/yes/no/on/off.
    #[error("{option}: '{value}' is not a valid switch value (use true/false, yes/no or on/off)")]
    InvalidSwitch { option: String, value: String },
    /// A date argument did not parse.
    #[error("{option}: '{value}' is not a valid date")]
    InvalidDate { option: String, value: String },
    /// A time argument did not parse.
    #[error("{option}: '{value}' is not a valid time")]
    InvalidTime { option: String, value: String },
    /// A URI argument did not parse.
    #[error("{option}: '{value}' is not a valid URL: {reason}")]
    InvalidUri {
        option: String,
        value: String,
        reason: String,
    },
    /// A fixed value has a different kind than the option's type.
    #[error("{option}: expected {expected} value, found '{value}'")]
    TypeMismatch {
        option: String,
        expected: &'static str,
        value: String,
    },
    /// An optional-argument option without default was given no argument.
    #[error("{option}: argument required")]
    MissingArgument { option: String },
    /// A custom evaluator refused the argument.
    #[error("{option}: {message}")]
    Rejected { option: String, message: String },
}

/// Failures of cross-option selects and checks.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CheckError {
    #[error("You must specify only one of these options: {}", .0.join(", "))]
    OnlyOneOf(Vec<String>),
    #[error("You must specify no more than one of these options: {}", .0.join(", "))]
    NoMoreThanOneOf(Vec<String>),
    #[error("You must specify at least one of these options: {}", .0.join(", "))]
    AtLeastOneOf(Vec<String>),
    #[error("Option {0} must be specified")]
    NotSpecified(String),
    #[error("You must specify these options: {}", .0.join(", "))]
    Requires(Vec<String>),
    #[error("You cannot specify these options: {}", .0.join(", "))]
    Excludes(Vec<String>),
    /// A declared `error_message` replacing the default text.
    #[error("{0}")]
    Custom(String),
}

/// Errors from the accessor API of [`Targets`](crate::Targets).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BindError {
    #[error("{container} has no target variable '{variable}'")]
    UnknownVariable {
        container: TargetContainer,
        variable: String,
    },
    #[error("{container}: no accessor for '{variable}'")]
    NoAccessor {
        container: TargetContainer,
        variable: String,
    },
}
