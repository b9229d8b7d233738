//! Typed option values.
//!
//! [`Value`] is what evaluation produces, what defaults and fixed values are
//! declared as, and what ends up bound into a target. Its `Display` form is
//! the command-line form: rendering a value and evaluating the text through
//! the matching option type gives the value back.
//!
//! # Examples
//!
//! ```
//! use declopt_core::Value;
//!
//! let numbers = Value::from(vec![1, 2, 3]);
//! assert_eq!(numbers.to_string(), "1,2,3");
//!
//! let color = Value::choice("red");
//! assert_eq!(color.to_string(), "red");
//! assert!(!Value::from("").is_present());
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use chrono::{DateTime, FixedOffset, NaiveDate};
use regex::Regex;
use serde::{Serialize, Serializer};

/// RFC 3986, appendix B.
static URI_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:([A-Za-z][A-Za-z0-9+.\-]*):)?(?://([^/?#]*))?([^?#]*)(?:\?([^#]*))?(?:#(.*))?$")
        .expect("static regex must compile")
});

/// A value produced by evaluating an option argument.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Uri(Uri),
    Date(NaiveDate),
    Time(DateTime<FixedOffset>),
    /// A symbolic value, validated against an option's choices.
    Choice(String),
    Hash(BTreeMap<String, String>),
    List(Vec<Value>),
}

impl Value {
    /// Creates a [`Value::Choice`].
    pub fn choice(name: impl Into<String>) -> Self {
        Self::Choice(name.into())
    }

    /// Creates a list of choices.
    ///
    /// ```
    /// use declopt_core::Value;
    ///
    /// let words = Value::choices(["foo", "bar"]);
    /// assert_eq!(words.to_string(), "foo,bar");
    /// ```
    pub fn choices<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::List(names.into_iter().map(|name| Self::Choice(name.into())).collect())
    }

    /// Short label of the value kind, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Bool(_) => "switch",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::Str(_) => "string",
            Self::Uri(_) => "uri",
            Self::Date(_) => "date",
            Self::Time(_) => "time",
            Self::Choice(_) => "choice",
            Self::Hash(_) => "hash",
            Self::List(_) => "list",
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) | Self::Choice(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    /// Whether the value counts as "given" for cross-option checks.
    ///
    /// `false`, empty strings, empty lists and empty hashes are absent.
    pub fn is_present(&self) -> bool {
        match self {
            Self::Bool(b) => *b,
            Self::Str(s) | Self::Choice(s) => !s.is_empty(),
            Self::Hash(map) => !map.is_empty(),
            Self::List(items) => !items.is_empty(),
            _ => true,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::Str(s) | Self::Choice(s) => f.write_str(s),
            Self::Uri(uri) => f.write_str(uri.as_str()),
            Self::Date(date) => write!(f, "{}", date.format("%Y-%m-%d")),
            Self::Time(time) => f.write_str(&time.to_rfc3339()),
            Self::Hash(map) => {
                let pairs: Vec<String> = map.iter().map(|(k, v)| format!("{k}={v}")).collect();
                f.write_str(&pairs.join(","))
            }
            Self::List(items) => {
                let items: Vec<String> = items.iter().map(ToString::to_string).collect();
                f.write_str(&items.join(","))
            }
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Self::Int(i64::from(i))
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Self::Float(x)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Str(s)
    }
}

impl From<Uri> for Value {
    fn from(uri: Uri) -> Self {
        Self::Uri(uri)
    }
}

impl From<NaiveDate> for Value {
    fn from(date: NaiveDate) -> Self {
        Self::Date(date)
    }
}

impl From<DateTime<FixedOffset>> for Value {
    fn from(time: DateTime<FixedOffset>) -> Self {
        Self::Time(time)
    }
}

impl From<BTreeMap<String, String>> for Value {
    fn from(map: BTreeMap<String, String>) -> Self {
        Self::Hash(map)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Self::List(items.into_iter().map(Into::into).collect())
    }
}

/// Typed read access to a bound [`Value`].
pub trait FromValue: Sized {
    fn from_value(value: &Value) -> Option<Self>;
}

impl FromValue for Value {
    fn from_value(value: &Value) -> Option<Self> {
        Some(value.clone())
    }
}

impl FromValue for bool {
    fn from_value(value: &Value) -> Option<Self> {
        value.as_bool()
    }
}

impl FromValue for i64 {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }
}

impl FromValue for f64 {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Float(x) => Some(*x),
            Value::Int(i) => Some(*i as f64),
            _ => None,
        }
    }
}

impl FromValue for String {
    fn from_value(value: &Value) -> Option<Self> {
        value.as_str().map(String::from)
    }
}

impl FromValue for Uri {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Uri(uri) => Some(uri.clone()),
            _ => None,
        }
    }
}

impl FromValue for NaiveDate {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Date(date) => Some(*date),
            _ => None,
        }
    }
}

impl FromValue for DateTime<FixedOffset> {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Time(time) => Some(*time),
            _ => None,
        }
    }
}

impl FromValue for BTreeMap<String, String> {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Hash(map) => Some(map.clone()),
            _ => None,
        }
    }
}

impl<T: FromValue> FromValue for Vec<T> {
    fn from_value(value: &Value) -> Option<Self> {
        value.as_list()?.iter().map(T::from_value).collect()
    }
}

/// A parsed URI reference.
///
/// # Examples
///
/// ```
/// use declopt_core::Uri;
///
/// let uri: Uri = "https://example.com/a/b?x=1#top".parse().unwrap();
/// assert_eq!(uri.scheme(), Some("https"));
/// assert_eq!(uri.authority(), Some("example.com"));
/// assert_eq!(uri.path(), "/a/b");
/// assert_eq!(uri.query(), Some("x=1"));
/// assert_eq!(uri.fragment(), Some("top"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Uri {
    raw: String,
    scheme: Option<String>,
    authority: Option<String>,
    path: String,
    query: Option<String>,
    fragment: Option<String>,
}

impl Uri {
    /// Parses `text` as a URI reference.
    ///
    /// # Errors
    ///
    /// Returns a description of the problem when `text` is empty or
    /// contains whitespace.
    pub fn parse(text: &str) -> Result<Self, String> {
        if text.is_empty() {
            return Err("empty URL".to_string());
        }
        if text.chars().any(char::is_whitespace) {
            return Err("URL contains whitespace".to_string());
        }
        let caps = URI_RE
            .captures(text)
            .ok_or_else(|| "malformed URL".to_string())?;
        let part = |i: usize| caps.get(i).map(|m| m.as_str().to_string());
        Ok(Self {
            raw: text.to_string(),
            scheme: part(1),
            authority: part(2),
            path: part(3).unwrap_or_default(),
            query: part(4),
            fragment: part(5),
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn scheme(&self) -> Option<&str> {
        self.scheme.as_deref()
    }

    pub fn authority(&self) -> Option<&str> {
        self.authority.as_deref()
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn query(&self) -> Option<&str> {
        self.query.as_deref()
    }

    pub fn fragment(&self) -> Option<&str> {
        self.fragment.as_deref()
    }
}

impl FromStr for Uri {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Uri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl Serialize for Uri {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.raw)
    }
}
