//! Option type registry.
//!
//! Every option value kind is an [`OptionType`]: a short name, a help note
//! for its argument, an evaluation function and a recognizer predicate used
//! to infer the type of an option from a sample value. The registry is an
//! ordered list and recognition is first-match, so the registration order
//! is part of the inference contract; the built-in order is
//! [`BUILTIN_TYPE_ORDER`].
//!
//! # Examples
//!
//! ```
//! use declopt_core::{TypeRegistry, Value};
//!
//! let types = TypeRegistry::builtin();
//! assert_eq!(types.find_by_value(&Value::Int(3)).unwrap().short_name(), "int");
//! assert_eq!(types.find_by_value(&Value::from(vec!["a", "b"])).unwrap().short_name(), "strings");
//! assert_eq!(types.find_by_short_name("uri").unwrap().argument_note(), Some("URL"));
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, TimeZone, Utc};

use crate::error::{DeclarationError, EvaluationError};
use crate::option::{Argument, ResolvedOption};
use crate::value::{Uri, Value};

/// Evaluates an argument for an option.
pub type EvaluateFn = fn(&Argument, &ResolvedOption) -> Result<Value, EvaluationError>;

/// Decides whether a sample value belongs to a type.
pub type RecognizeFn = fn(&Value) -> bool;

/// Built-in types, most specific first.
pub const BUILTIN_TYPE_ORDER: [&str; 16] = [
    "switch", "int", "float", "string", "uri", "date", "time", "choice", "hash", "ints", "floats",
    "strings", "uris", "dates", "times", "choices",
];

/// A registered value kind.
#[derive(Clone)]
pub struct OptionType {
    name: String,
    short_name: String,
    argument_note: Option<String>,
    evaluate: EvaluateFn,
    recognizes: RecognizeFn,
}

impl OptionType {
    pub fn new(
        name: impl Into<String>,
        short_name: impl Into<String>,
        argument_note: Option<&str>,
        evaluate: EvaluateFn,
        recognizes: RecognizeFn,
    ) -> Self {
        Self {
            name: name.into(),
            short_name: short_name.into(),
            argument_note: argument_note.map(String::from),
            evaluate,
            recognizes,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn short_name(&self) -> &str {
        &self.short_name
    }

    pub fn argument_note(&self) -> Option<&str> {
        self.argument_note.as_deref()
    }

    pub fn evaluate(
        &self,
        argument: &Argument,
        option: &ResolvedOption,
    ) -> Result<Value, EvaluationError> {
        (self.evaluate)(argument, option)
    }

    pub fn recognizes(&self, value: &Value) -> bool {
        (self.recognizes)(value)
    }

    /// Whether the type validates against an option's `choices`.
    pub fn validates_choices(&self) -> bool {
        matches!(self.short_name.as_str(), "choice" | "choices")
    }
}

impl fmt::Debug for OptionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OptionType")
            .field("name", &self.name)
            .field("short_name", &self.short_name)
            .field("argument_note", &self.argument_note)
            .finish()
    }
}

/// Ordered catalog of option types.
#[derive(Debug, Clone)]
pub struct TypeRegistry {
    types: Vec<Arc<OptionType>>,
}

impl TypeRegistry {
    /// Creates a registry without any types.
    pub fn empty() -> Self {
        Self { types: Vec::new() }
    }

    /// Creates a registry holding the built-in types in
    /// [`BUILTIN_TYPE_ORDER`].
    pub fn builtin() -> Self {
        let types = builtin_types().into_iter().map(Arc::new).collect();
        Self { types }
    }

    /// Appends a type.
    ///
    /// # Errors
    ///
    /// Returns [`DeclarationError::DuplicateType`] when the short name is
    /// already taken.
    pub fn register(&mut self, option_type: OptionType) -> Result<(), DeclarationError> {
        if self.find_by_short_name(option_type.short_name()).is_some() {
            return Err(DeclarationError::DuplicateType(option_type.short_name));
        }
        self.types.push(Arc::new(option_type));
        Ok(())
    }

    pub fn find_by_short_name(&self, short_name: &str) -> Option<Arc<OptionType>> {
        self.types
            .iter()
            .find(|t| t.short_name() == short_name)
            .cloned()
    }

    /// First registered type whose recognizer accepts `value`.
    pub fn find_by_value(&self, value: &Value) -> Option<Arc<OptionType>> {
        self.types.iter().find(|t| t.recognizes(value)).cloned()
    }

    /// Short names in registration order.
    pub fn short_names(&self) -> Vec<&str> {
        self.types.iter().map(|t| t.short_name()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<OptionType>> {
        self.types.iter()
    }
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

fn builtin_types() -> Vec<OptionType> {
    vec![
        OptionType::new("Switch", "switch", None, evaluate_switch, |v| {
            matches!(v, Value::Bool(_))
        }),
        OptionType::new("Int", "int", Some("INTEGER"), evaluate_int, |v| {
            matches!(v, Value::Int(_))
        }),
        OptionType::new("Float", "float", Some("NUMBER"), evaluate_float, |v| {
            matches!(v, Value::Float(_))
        }),
        OptionType::new("String", "string", Some("STRING"), evaluate_string, |v| {
            matches!(v, Value::Str(_))
        }),
        OptionType::new("Uri", "uri", Some("URL"), evaluate_uri, |v| {
            matches!(v, Value::Uri(_))
        }),
        OptionType::new("Date", "date", Some("DATE"), evaluate_date, |v| {
            matches!(v, Value::Date(_))
        }),
        OptionType::new("Time", "time", Some("TIME"), evaluate_time, |v| {
            matches!(v, Value::Time(_))
        }),
        OptionType::new("Choice", "choice", Some("CHOICE"), evaluate_choice, |v| {
            matches!(v, Value::Choice(_))
        }),
        OptionType::new("Hash", "hash", Some("K1=V1,K2=V2..."), evaluate_hash, |v| {
            matches!(v, Value::Hash(_))
        }),
        OptionType::new("Ints", "ints", Some("INT1,INT2,INT3..."), evaluate_ints, |v| {
            first_item_is(v, |i| matches!(i, Value::Int(_)))
        }),
        OptionType::new("Floats", "floats", Some("NUM1,NUM2,NUM3..."), evaluate_floats, |v| {
            first_item_is(v, |i| matches!(i, Value::Float(_)))
        }),
        OptionType::new("Strings", "strings", Some("STR1,STR2,STR3..."), evaluate_strings, |v| {
            first_item_is(v, |i| matches!(i, Value::Str(_)))
        }),
        OptionType::new("Uris", "uris", Some("URL1,URL2,URL3..."), evaluate_uris, |v| {
            first_item_is(v, |i| matches!(i, Value::Uri(_)))
        }),
        OptionType::new("Dates", "dates", Some("DATE1,DATE2,DATE3..."), evaluate_dates, |v| {
            first_item_is(v, |i| matches!(i, Value::Date(_)))
        }),
        OptionType::new("Times", "times", Some("TIME1,TIME2,TIME3..."), evaluate_times, |v| {
            first_item_is(v, |i| matches!(i, Value::Time(_)))
        }),
        OptionType::new(
            "Choices",
            "choices",
            Some("CHOICE1,CHOICE2,CHOICE3..."),
            evaluate_choices,
            |v| first_item_is(v, |i| matches!(i, Value::Choice(_))),
        ),
    ]
}

fn first_item_is(value: &Value, predicate: fn(&Value) -> bool) -> bool {
    value
        .as_list()
        .and_then(|items| items.first())
        .is_some_and(predicate)
}

type ParseFn = fn(&str, &ResolvedOption) -> Result<Value, EvaluationError>;

/// Splits a list argument. A literal `,` inside an element is not
/// supported: there is no escaping.
pub fn split_list(text: &str) -> Vec<&str> {
    if text.is_empty() {
        Vec::new()
    } else {
        text.split(',').collect()
    }
}

fn scalar(
    argument: &Argument,
    option: &ResolvedOption,
    expected: &'static str,
    parse: ParseFn,
    accepts: RecognizeFn,
) -> Result<Value, EvaluationError> {
    match argument {
        Argument::Text(text) => parse(text, option),
        Argument::Fixed(value) if accepts(value) => Ok(value.clone()),
        Argument::Fixed(Value::Str(text)) => parse(text, option),
        Argument::Fixed(value) => Err(EvaluationError::TypeMismatch {
            option: option.long_name().to_string(),
            expected,
            value: value.to_string(),
        }),
        Argument::Missing => missing(option),
    }
}

fn list(
    argument: &Argument,
    option: &ResolvedOption,
    expected: &'static str,
    parse: ParseFn,
    accepts: RecognizeFn,
) -> Result<Value, EvaluationError> {
    match argument {
        Argument::Text(text) => parse_items(text, option, parse),
        Argument::Fixed(Value::List(items)) if items.iter().all(accepts) => {
            Ok(Value::List(items.clone()))
        }
        Argument::Fixed(Value::Str(text)) => parse_items(text, option, parse),
        Argument::Fixed(value) => Err(EvaluationError::TypeMismatch {
            option: option.long_name().to_string(),
            expected,
            value: value.to_string(),
        }),
        Argument::Missing => missing(option),
    }
}

fn parse_items(
    text: &str,
    option: &ResolvedOption,
    parse: ParseFn,
) -> Result<Value, EvaluationError> {
    split_list(text)
        .into_iter()
        .map(|item| parse(item, option))
        .collect::<Result<Vec<_>, _>>()
        .map(Value::List)
}

fn missing(option: &ResolvedOption) -> Result<Value, EvaluationError> {
    option
        .default_value()
        .cloned()
        .ok_or_else(|| EvaluationError::MissingArgument {
            option: option.long_name().to_string(),
        })
}

fn evaluate_switch(argument: &Argument, option: &ResolvedOption) -> Result<Value, EvaluationError> {
    let toggled = || {
        let current = option.default_value().and_then(Value::as_bool).unwrap_or(false);
        Value::Bool(!current)
    };
    match argument {
        Argument::Missing => Ok(toggled()),
        Argument::Text(text) | Argument::Fixed(Value::Str(text)) if text.is_empty() => Ok(toggled()),
        Argument::Text(text) | Argument::Fixed(Value::Str(text)) => parse_switch(text, option),
        Argument::Fixed(Value::Bool(b)) => Ok(Value::Bool(*b)),
        Argument::Fixed(value) => Ok(Value::Bool(value.is_present())),
    }
}

fn parse_switch(text: &str, option: &ResolvedOption) -> Result<Value, EvaluationError> {
    match text.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" => Ok(Value::Bool(true)),
        "false" | "no" | "off" => Ok(Value::Bool(false)),
        _ => Err(EvaluationError::InvalidSwitch {
            option: option.long_name().to_string(),
            value: text.to_string(),
        }),
    }
}

fn parse_int(text: &str, option: &ResolvedOption) -> Result<Value, EvaluationError> {
    text.trim()
        .parse::<i64>()
        .map(Value::Int)
        .map_err(|_| EvaluationError::InvalidNumber {
            option: option.long_name().to_string(),
            value: text.to_string(),
            kind: "integer",
        })
}

fn parse_float(text: &str, option: &ResolvedOption) -> Result<Value, EvaluationError> {
    text.trim()
        .parse::<f64>()
        .map(Value::Float)
        .map_err(|_| EvaluationError::InvalidNumber {
            option: option.long_name().to_string(),
            value: text.to_string(),
            kind: "number",
        })
}

fn parse_string(text: &str, _option: &ResolvedOption) -> Result<Value, EvaluationError> {
    Ok(Value::Str(text.to_string()))
}

fn parse_uri(text: &str, option: &ResolvedOption) -> Result<Value, EvaluationError> {
    Uri::parse(text.trim())
        .map(Value::Uri)
        .map_err(|reason| EvaluationError::InvalidUri {
            option: option.long_name().to_string(),
            value: text.to_string(),
            reason,
        })
}

const DATE_FORMATS: [&str; 6] = ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%Y%m%d", "%B %d, %Y", "%d %b %Y"];

const NAIVE_TIME_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// Parses a date literal.
pub fn parse_date_text(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(text, format).ok())
        .or_else(|| parse_time_text(text).map(|time| time.date_naive()))
}

/// Parses a time literal. Times without an offset are taken as UTC; a bare
/// date is midnight.
pub fn parse_time_text(text: &str) -> Option<DateTime<FixedOffset>> {
    let text = text.trim();
    if let Ok(time) = DateTime::parse_from_rfc3339(text) {
        return Some(time);
    }
    if let Ok(time) = DateTime::parse_from_rfc2822(text) {
        return Some(time);
    }
    if let Ok(time) = DateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S %z") {
        return Some(time);
    }
    let naive = NAIVE_TIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|format| NaiveDate::parse_from_str(text, format).ok())
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })?;
    Some(Utc.from_utc_datetime(&naive).fixed_offset())
}

fn parse_date(text: &str, option: &ResolvedOption) -> Result<Value, EvaluationError> {
    parse_date_text(text)
        .map(Value::Date)
        .ok_or_else(|| EvaluationError::InvalidDate {
            option: option.long_name().to_string(),
            value: text.to_string(),
        })
}

fn parse_time(text: &str, option: &ResolvedOption) -> Result<Value, EvaluationError> {
    parse_time_text(text)
        .map(Value::Time)
        .ok_or_else(|| EvaluationError::InvalidTime {
            option: option.long_name().to_string(),
            value: text.to_string(),
        })
}

fn parse_choice(text: &str, option: &ResolvedOption) -> Result<Value, EvaluationError> {
    let choices = option.choices();
    if !choices.is_empty() && !choices.iter().any(|c| c == text) {
        return Err(EvaluationError::BadChoice {
            option: option.long_name().to_string(),
            value: text.to_string(),
            choices: choices.to_vec(),
        });
    }
    Ok(Value::Choice(text.to_string()))
}

fn evaluate_int(argument: &Argument, option: &ResolvedOption) -> Result<Value, EvaluationError> {
    scalar(argument, option, "int", parse_int, |v| matches!(v, Value::Int(_)))
}

fn evaluate_float(argument: &Argument, option: &ResolvedOption) -> Result<Value, EvaluationError> {
    match argument {
        Argument::Fixed(Value::Int(i)) => Ok(Value::Float(*i as f64)),
        _ => scalar(argument, option, "float", parse_float, |v| {
            matches!(v, Value::Float(_))
        }),
    }
}

fn evaluate_string(argument: &Argument, option: &ResolvedOption) -> Result<Value, EvaluationError> {
    scalar(argument, option, "string", parse_string, |v| {
        matches!(v, Value::Str(_))
    })
}

fn evaluate_uri(argument: &Argument, option: &ResolvedOption) -> Result<Value, EvaluationError> {
    scalar(argument, option, "uri", parse_uri, |v| matches!(v, Value::Uri(_)))
}

fn evaluate_date(argument: &Argument, option: &ResolvedOption) -> Result<Value, EvaluationError> {
    scalar(argument, option, "date", parse_date, |v| {
        matches!(v, Value::Date(_))
    })
}

fn evaluate_time(argument: &Argument, option: &ResolvedOption) -> Result<Value, EvaluationError> {
    scalar(argument, option, "time", parse_time, |v| {
        matches!(v, Value::Time(_))
    })
}

fn evaluate_choice(argument: &Argument, option: &ResolvedOption) -> Result<Value, EvaluationError> {
    match argument {
        // fixed symbols are validated like typed input
        Argument::Fixed(Value::Choice(name)) => parse_choice(name, option),
        _ => scalar(argument, option, "choice", parse_choice, |_| false),
    }
}

fn evaluate_hash(argument: &Argument, option: &ResolvedOption) -> Result<Value, EvaluationError> {
    scalar(argument, option, "hash", parse_hash, |v| matches!(v, Value::Hash(_)))
}

fn parse_hash(text: &str, _option: &ResolvedOption) -> Result<Value, EvaluationError> {
    let map: BTreeMap<String, String> = split_list(text)
        .into_iter()
        .map(|pair| match pair.split_once('=') {
            Some((key, value)) => (key.to_string(), value.to_string()),
            None => (pair.to_string(), String::new()),
        })
        .collect();
    Ok(Value::Hash(map))
}

fn evaluate_ints(argument: &Argument, option: &ResolvedOption) -> Result<Value, EvaluationError> {
    list(argument, option, "ints", parse_int, |v| matches!(v, Value::Int(_)))
}

fn evaluate_floats(argument: &Argument, option: &ResolvedOption) -> Result<Value, EvaluationError> {
    list(argument, option, "floats", parse_float, |v| {
        matches!(v, Value::Float(_))
    })
}

fn evaluate_strings(argument: &Argument, option: &ResolvedOption) -> Result<Value, EvaluationError> {
    list(argument, option, "strings", parse_string, |v| {
        matches!(v, Value::Str(_))
    })
}

fn evaluate_uris(argument: &Argument, option: &ResolvedOption) -> Result<Value, EvaluationError> {
    list(argument, option, "uris", parse_uri, |v| matches!(v, Value::Uri(_)))
}

fn evaluate_dates(argument: &Argument, option: &ResolvedOption) -> Result<Value, EvaluationError> {
    list(argument, option, "dates", parse_date, |v| {
        matches!(v, Value::Date(_))
    })
}

fn evaluate_times(argument: &Argument, option: &ResolvedOption) -> Result<Value, EvaluationError> {
    list(argument, option, "times", parse_time, |v| {
        matches!(v, Value::Time(_))
    })
}

fn evaluate_choices(argument: &Argument, option: &ResolvedOption) -> Result<Value, EvaluationError> {
    match argument {
        Argument::Fixed(Value::List(items)) => items
            .iter()
            .map(|item| match item {
                Value::Choice(name) | Value::Str(name) => parse_choice(name, option),
                other => Err(EvaluationError::TypeMismatch {
                    option: option.long_name().to_string(),
                    expected: "choices",
                    value: other.to_string(),
                }),
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Value::List),
        _ => list(argument, option, "choices", parse_choice, |_| false),
    }
}
