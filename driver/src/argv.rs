//! Argv/environment adapter.
//!
//! Builds the switch table from the resolved parse view, queues
//! environment-sourced switches in front of the real arguments and walks the
//! real arguments with `lexopt`, yielding one [`Token`] per switch
//! occurrence or positional argument.
//!
//! # Examples
//!
//! ```
//! use std::collections::BTreeMap;
//!
//! use declopt_core::{Argument, OptionDecl, OptionFinder, OptionRegistry};
//! use declopt_driver::{ArgvAdapter, SwitchTable, Token};
//!
//! let mut registry = OptionRegistry::new();
//! let mut d = registry.declarer("app");
//! d.opt(OptionDecl::new("count").default(1).env("COUNT")).unwrap();
//! d.opt(OptionDecl::new("verbose").short('v')).unwrap();
//! let resolved = OptionFinder::new(&registry, ["app"]).resolve().unwrap();
//!
//! let table = SwitchTable::from_resolved(&resolved);
//! let env = BTreeMap::from([("COUNT".to_string(), "4".to_string())]);
//! let tokens: Vec<Token> = ArgvAdapter::new(&table, &env, ["-v", "file.txt", "--count=9"])
//!     .collect::<Result<_, _>>()
//!     .unwrap();
//!
//! assert_eq!(tokens[0], Token::switch("--count", Argument::Text("4".into())));
//! assert_eq!(tokens[1], Token::switch("--verbose", Argument::Missing));
//! assert_eq!(tokens[2], Token::Positional("file.txt".into()));
//! assert_eq!(tokens[3], Token::switch("--count", Argument::Text("9".into())));
//! ```

use std::collections::{BTreeMap, HashMap};
use std::ffi::OsString;

use declopt_core::{Argument, Requirement, ResolvedOptions};
use lexopt::prelude::*;
use tracing::debug;

use crate::error::UsageError;

/// Source of environment variables.
pub trait Environment {
    fn var(&self, name: &str) -> Option<String>;
}

/// The process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnvironment;

impl Environment for ProcessEnvironment {
    fn var(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }
}

impl Environment for BTreeMap<String, String> {
    fn var(&self, name: &str) -> Option<String> {
        self.get(name).cloned()
    }
}

impl Environment for HashMap<String, String> {
    fn var(&self, name: &str) -> Option<String> {
        self.get(name).cloned()
    }
}

/// Tokenizer view of one option.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwitchSpec {
    pub long_name: String,
    pub short_name: Option<char>,
    pub requirement: Requirement,
    pub environment_variable: Option<String>,
}

/// Low-level switch table, in long-name order.
#[derive(Debug, Clone, Default)]
pub struct SwitchTable {
    switches: Vec<SwitchSpec>,
}

impl SwitchTable {
    /// Table of the enabled options.
    pub fn from_resolved(resolved: &ResolvedOptions) -> Self {
        let switches = resolved
            .parse_view()
            .map(|option| SwitchSpec {
                long_name: option.long_name().to_string(),
                short_name: option.short_name(),
                requirement: option.requirement(),
                environment_variable: option.environment_variable().map(String::from),
            })
            .collect();
        Self { switches }
    }

    pub fn switches(&self) -> &[SwitchSpec] {
        &self.switches
    }

    /// Finds a long switch by exact name or unique prefix. `name` is given
    /// without the leading dashes.
    pub fn lookup_long(&self, name: &str) -> Result<&SwitchSpec, UsageError> {
        let bare = |spec: &SwitchSpec| {
            spec.long_name
                .strip_prefix("--")
                .unwrap_or(&spec.long_name)
                .to_string()
        };
        if let Some(exact) = self.switches.iter().find(|spec| bare(spec) == name) {
            return Ok(exact);
        }
        let candidates: Vec<&SwitchSpec> = self
            .switches
            .iter()
            .filter(|spec| !name.is_empty() && bare(spec).starts_with(name))
            .collect();
        match candidates.as_slice() {
            [only] => Ok(*only),
            [] => Err(UsageError::UnknownOption(format!("--{name}"))),
            many => Err(UsageError::AmbiguousOption {
                option: format!("--{name}"),
                candidates: many.iter().map(|spec| spec.long_name.clone()).collect(),
            }),
        }
    }

    pub fn lookup_short(&self, short: char) -> Result<&SwitchSpec, UsageError> {
        self.switches
            .iter()
            .find(|spec| spec.short_name == Some(short))
            .ok_or_else(|| UsageError::UnknownOption(format!("-{short}")))
    }

    /// Switch tokens taken from the environment, in long-name order.
    ///
    /// A set variable supplies its value as the argument. An empty value, or
    /// any value for a switch taking no argument, is presence only.
    pub fn environment_tokens(&self, env: &dyn Environment) -> Vec<Token> {
        let mut tokens = Vec::new();
        for spec in &self.switches {
            let Some(variable) = &spec.environment_variable else {
                continue;
            };
            let Some(value) = env.var(variable) else {
                continue;
            };
            debug!(option = %spec.long_name, variable = %variable, "switch from environment");
            let argument = if value.is_empty() || !spec.requirement.takes_argument() {
                Argument::Missing
            } else {
                Argument::Text(value)
            };
            tokens.push(Token::switch(spec.long_name.clone(), argument));
        }
        tokens
    }
}

/// One item of the effective argument stream.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Switch {
        long_name: String,
        argument: Argument,
    },
    Positional(String),
}

impl Token {
    pub fn switch(long_name: impl Into<String>, argument: Argument) -> Self {
        Self::Switch {
            long_name: long_name.into(),
            argument,
        }
    }
}

/// Iterator over the tokens of the effective argument stream.
pub struct ArgvAdapter<'t> {
    table: &'t SwitchTable,
    from_env: std::vec::IntoIter<Token>,
    parser: lexopt::Parser,
    failed: bool,
}

impl<'t> ArgvAdapter<'t> {
    /// `args` excludes the program name. Environment switches come first
    /// and never consume items of `args`.
    pub fn new<I, S>(table: &'t SwitchTable, env: &dyn Environment, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        Self {
            table,
            from_env: table.environment_tokens(env).into_iter(),
            parser: lexopt::Parser::from_args(args),
            failed: false,
        }
    }

    fn next_token(&mut self) -> Result<Option<Token>, UsageError> {
        let spec = match self.parser.next()? {
            None => return Ok(None),
            Some(Value(value)) => return Ok(Some(Token::Positional(value.string()?))),
            Some(Long(name)) => {
                let name = name.to_string();
                self.table.lookup_long(&name)?
            }
            Some(Short(short)) => self.table.lookup_short(short)?,
        };
        let argument = match spec.requirement {
            Requirement::NoArgument => Argument::Missing,
            Requirement::RequiredArgument => Argument::Text(self.parser.value()?.string()?),
            Requirement::OptionalArgument => self.optional_argument()?,
        };
        Ok(Some(Token::switch(spec.long_name.clone(), argument)))
    }

    fn optional_argument(&mut self) -> Result<Argument, UsageError> {
        if let Some(attached) = self.parser.optional_value() {
            return Ok(Argument::Text(attached.string()?));
        }
        let next = self.parser.try_raw_args().and_then(|mut raw| {
            raw.next_if(|arg| !arg.to_string_lossy().starts_with('-'))
        });
        match next {
            Some(value) => Ok(Argument::Text(value.string()?)),
            None => Ok(Argument::Missing),
        }
    }
}

impl Iterator for ArgvAdapter<'_> {
    type Item = Result<Token, UsageError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        if let Some(token) = self.from_env.next() {
            return Some(Ok(token));
        }
        match self.next_token() {
            Ok(token) => token.map(Ok),
            Err(err) => {
                self.failed = true;
                Some(Err(err))
            }
        }
    }
}
