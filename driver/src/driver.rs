//! The command-line driver.
//!
//! [`CommandLine::parse`] is the state machine: install every default, walk
//! the argument stream, evaluate and bind each switch, run the cross-option
//! checks. It never prints and never exits. [`CommandLine::run`] is the one
//! place that turns outcomes and errors into output and an exit status.

use std::ffi::OsString;
use std::fmt;

use declopt_core::{
    Argument, DeclaringUnit, OptionFinder, OptionRegistry, ResolvedOptions, Targets,
};
use serde::Serialize;
use tracing::{debug, warn};

use crate::argv::{ArgvAdapter, Environment, ProcessEnvironment, SwitchTable, Token};
use crate::builtin::{BuiltinAction, Builtins, builtin_action};
use crate::config::DriverConfig;
use crate::error::{Result, UsageError};
use crate::help::render_help;

/// Where a parse run stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DriverState {
    Idle,
    DefaultsInstalled,
    Parsing,
    Done,
    Failed,
}

/// How a successful parse ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The stream was consumed; these are the non-switch arguments.
    Completed { arguments: Vec<String> },
    /// A help switch was given.
    Help { show_hidden: bool },
    /// The version switch was given.
    Version,
}

/// Output and status the process should end with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Exit {
    pub code: i32,
    pub output: String,
}

impl Exit {
    /// Prints the output (stdout on success, stderr otherwise) and exits.
    pub fn terminate(&self) -> ! {
        if self.code == 0 {
            println!("{}", self.output);
        } else {
            eprintln!("{}", self.output);
        }
        std::process::exit(self.code)
    }
}

impl fmt::Display for Exit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.output)
    }
}

/// A resolved option view plus the machinery to parse against it.
#[derive(Debug, Clone)]
pub struct CommandLine {
    config: DriverConfig,
    resolved: ResolvedOptions,
    table: SwitchTable,
    state: DriverState,
}

impl CommandLine {
    /// Declares the built-in unit if needed, puts it first in `chain` and
    /// resolves the chain.
    ///
    /// # Errors
    ///
    /// [`DriverError::Declaration`](crate::DriverError::Declaration) when the
    /// chain does not resolve.
    pub fn from_registry<I, S>(
        registry: &mut OptionRegistry,
        chain: I,
        config: DriverConfig,
    ) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let builtins = Builtins::unit_name();
        if registry.store(&builtins).is_none() {
            registry.declare::<Builtins>()?;
        }
        let full_chain: Vec<String> = std::iter::once(builtins)
            .chain(chain.into_iter().map(Into::into))
            .collect();
        let resolved = OptionFinder::new(registry, full_chain).resolve()?;
        Ok(Self::new(resolved, config))
    }

    pub fn new(resolved: ResolvedOptions, config: DriverConfig) -> Self {
        let table = SwitchTable::from_resolved(&resolved);
        Self {
            config,
            resolved,
            table,
            state: DriverState::Idle,
        }
    }

    pub fn state(&self) -> DriverState {
        self.state
    }

    pub fn resolved(&self) -> &ResolvedOptions {
        &self.resolved
    }

    pub fn config(&self) -> &DriverConfig {
        &self.config
    }

    /// Help text, hidden groups and options included on request.
    pub fn help(&self, show_hidden: bool) -> String {
        render_help(
            &self.config.usage_line(),
            &self.resolved,
            show_hidden,
            self.config.help_max_width,
        )
        .join("\n")
    }

    fn transition(&mut self, state: DriverState) {
        debug!(from = ?self.state, to = ?state, "driver state");
        self.state = state;
    }

    /// Binds the default of every enabled option.
    pub fn install_defaults(&mut self, targets: &mut Targets) {
        for option in self.resolved.parse_view() {
            option.instantiate_default(targets);
        }
        self.transition(DriverState::DefaultsInstalled);
    }

    /// Runs the parse state machine over `args` (program name excluded).
    ///
    /// # Errors
    ///
    /// Usage, evaluation and check errors; the state ends as
    /// [`DriverState::Failed`].
    pub fn parse<I, S>(
        &mut self,
        targets: &mut Targets,
        env: &dyn Environment,
        args: I,
    ) -> Result<Outcome>
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.install_defaults(targets);
        self.transition(DriverState::Parsing);
        match self.parse_stream(targets, env, args) {
            Ok(outcome) => {
                self.transition(DriverState::Done);
                Ok(outcome)
            }
            Err(err) => {
                warn!(error = %err, "command line rejected");
                self.transition(DriverState::Failed);
                Err(err)
            }
        }
    }

    fn parse_stream<I, S>(
        &self,
        targets: &mut Targets,
        env: &dyn Environment,
        args: I,
    ) -> Result<Outcome>
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        let mut arguments = Vec::new();
        for token in ArgvAdapter::new(&self.table, env, args) {
            let (long_name, argument) = match token? {
                Token::Positional(value) => {
                    arguments.push(value);
                    continue;
                }
                Token::Switch {
                    long_name,
                    argument,
                } => (long_name, argument),
            };
            if let Some(action) = builtin_action(&long_name) {
                return Ok(match action {
                    BuiltinAction::Help { show_hidden } => Outcome::Help { show_hidden },
                    BuiltinAction::Version => Outcome::Version,
                });
            }
            self.apply(targets, &long_name, argument)?;
        }

        for select in self.resolved.selects() {
            select.validate(targets)?;
        }
        for check in self.resolved.checks() {
            check.validate(targets)?;
        }
        Ok(Outcome::Completed { arguments })
    }

    fn apply(&self, targets: &mut Targets, long_name: &str, argument: Argument) -> Result<()> {
        let option = self
            .resolved
            .option(long_name)
            .ok_or_else(|| UsageError::UnknownOption(long_name.to_string()))?;
        let value = option.evaluate(argument)?;
        option.bind(targets, value);
        Ok(())
    }

    /// Parses and converts the outcome into either the remaining arguments
    /// or the exit the process should take.
    pub fn run<I, S>(
        &mut self,
        targets: &mut Targets,
        env: &dyn Environment,
        args: I,
    ) -> std::result::Result<Vec<String>, Exit>
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        match self.parse(targets, env, args) {
            Ok(Outcome::Completed { arguments }) => Ok(arguments),
            Ok(Outcome::Help { show_hidden }) => Err(Exit {
                code: 0,
                output: self.help(show_hidden),
            }),
            Ok(Outcome::Version) => Err(Exit {
                code: 0,
                output: self.config.version_line(),
            }),
            Err(err) if err.is_user_error() => Err(self.opt_error(err)),
            Err(err) => Err(Exit {
                code: 1,
                output: err.to_string(),
            }),
        }
    }

    /// [`CommandLine::run`] over the process arguments and environment,
    /// terminating the process on any exit.
    pub fn run_or_exit(&mut self, targets: &mut Targets) -> Vec<String> {
        let args: Vec<OsString> = std::env::args_os().skip(1).collect();
        match self.run(targets, &ProcessEnvironment, args) {
            Ok(arguments) => arguments,
            Err(exit) => exit.terminate(),
        }
    }

    /// The exit for an application-level validation failure: the message,
    /// then help, status 1.
    pub fn opt_error(&self, message: impl fmt::Display) -> Exit {
        Exit {
            code: 1,
            output: format!("{message}\n{}", self.help(false)),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::error::DriverError;
    use declopt_core::{
        CheckDecl, EvaluationError, OptionDecl, SelectDecl, TargetContainer, Value,
    };

    fn command_line() -> CommandLine {
        let mut registry = OptionRegistry::new();
        let mut d = registry.declarer("app");
        d.opt(OptionDecl::new("count").default(1).env("COUNT")).unwrap();
        d.opt(OptionDecl::new("color").choices(["red", "blue"])).unwrap();
        d.opt(OptionDecl::new("verbose").short('v')).unwrap();
        d.opt(OptionDecl::new("legacy").default(7).disabled(true)).unwrap();
        d.opt(OptionDecl::new("quiet")).unwrap();
        CommandLine::from_registry(&mut registry, ["app"], DriverConfig::new("app")).unwrap()
    }

    fn env(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    const APP: TargetContainer = TargetContainer::Application;

    #[test]
    fn test_defaults_bound_without_switches() {
        let mut cli = command_line();
        let mut targets = Targets::new();
        let outcome = cli.parse(&mut targets, &env(&[]), ["input.csv"]).unwrap();
        assert_eq!(
            outcome,
            Outcome::Completed {
                arguments: vec!["input.csv".into()]
            }
        );
        assert_eq!(cli.state(), DriverState::Done);
        assert_eq!(targets.value::<i64>(&APP, "count"), Ok(Some(1)));
        assert_eq!(targets.get(&APP, "color"), Ok(None));
        assert!(targets.raw(&APP, "legacy").is_none());
    }

    #[test]
    fn test_environment_then_cli_override() {
        let mut cli = command_line();
        let mut targets = Targets::new();
        cli.parse(&mut targets, &env(&[("COUNT", "5")]), Vec::<String>::new())
            .unwrap();
        assert_eq!(targets.value::<i64>(&APP, "count"), Ok(Some(5)));

        cli.parse(&mut targets, &env(&[("COUNT", "5")]), ["--count", "8"])
            .unwrap();
        assert_eq!(targets.value::<i64>(&APP, "count"), Ok(Some(8)));
    }

    #[test]
    fn test_empty_environment_value_keeps_cli_arguments_apart() {
        let mut cli = command_line();
        let mut targets = Targets::new();
        let empty = env(&[("COUNT", "")]);
        cli.parse(&mut targets, &empty, Vec::<String>::new()).unwrap();
        assert_eq!(targets.value::<i64>(&APP, "count"), Ok(Some(1)));

        let outcome = cli
            .parse(&mut targets, &empty, ["--color", "red", "input.csv"])
            .unwrap();
        assert_eq!(
            outcome,
            Outcome::Completed {
                arguments: vec!["input.csv".into()]
            }
        );
        assert_eq!(targets.value::<i64>(&APP, "count"), Ok(Some(1)));
        assert_eq!(targets.get(&APP, "color"), Ok(Some(&Value::choice("red"))));
    }

    #[test]
    fn test_last_occurrence_wins() {
        let mut cli = command_line();
        let mut targets = Targets::new();
        cli.parse(&mut targets, &env(&[]), ["--color", "red", "--color=blue"])
            .unwrap();
        assert_eq!(targets.get(&APP, "color"), Ok(Some(&Value::choice("blue"))));
    }

    #[test]
    fn test_help_and_version_short_circuit() {
        let mut cli = command_line();
        let mut targets = Targets::new();
        assert_eq!(
            cli.parse(&mut targets, &env(&[]), ["--?", "--bogus"]).unwrap(),
            Outcome::Help { show_hidden: false }
        );
        assert_eq!(
            cli.parse(&mut targets, &env(&[]), ["--??"]).unwrap(),
            Outcome::Help { show_hidden: true }
        );
        assert_eq!(
            cli.parse(&mut targets, &env(&[]), ["-V"]).unwrap(),
            Outcome::Version
        );
        let exit = cli.run(&mut targets, &env(&[]), ["-V"]).unwrap_err();
        assert_eq!(exit.code, 0);
        assert_eq!(exit.output, "app: unknown application version");
    }

    #[test]
    fn test_unknown_option_fails_with_help() {
        let mut cli = command_line();
        let mut targets = Targets::new();
        let err = cli
            .parse(&mut targets, &env(&[]), ["--does-not-exist"])
            .unwrap_err();
        assert_eq!(
            err,
            DriverError::Usage(UsageError::UnknownOption("--does-not-exist".into()))
        );
        assert_eq!(cli.state(), DriverState::Failed);

        let exit = cli
            .run(&mut targets, &env(&[]), ["--does-not-exist"])
            .unwrap_err();
        assert_eq!(exit.code, 1);
        assert!(exit.output.starts_with("unknown option: --does-not-exist\nUSAGE: app [OPTIONS]"));
    }

    #[test]
    fn test_disabled_option_is_not_accepted() {
        let mut cli = command_line();
        let mut targets = Targets::new();
        assert!(matches!(
            cli.parse(&mut targets, &env(&[]), ["--legacy", "3"]),
            Err(DriverError::Usage(UsageError::UnknownOption(_)))
        ));
    }

    #[test]
    fn test_bad_choice_is_evaluation_error() {
        let mut cli = command_line();
        let mut targets = Targets::new();
        let err = cli
            .parse(&mut targets, &env(&[]), ["--color", "green"])
            .unwrap_err();
        assert!(matches!(
            err,
            DriverError::Evaluation(EvaluationError::BadChoice { .. })
        ));
    }

    #[test]
    fn test_checks_run_after_stream() {
        let mut registry = OptionRegistry::new();
        let mut d = registry.declarer("app");
        d.opt(OptionDecl::new("verbose").short('v')).unwrap();
        d.opt(OptionDecl::new("quiet")).unwrap();
        d.opt_check(CheckDecl::excludes("verbose", ["quiet"]));
        let mut cli =
            CommandLine::from_registry(&mut registry, ["app"], DriverConfig::new("app")).unwrap();
        let mut targets = Targets::new();
        assert!(cli.parse(&mut targets, &env(&[]), ["-v"]).is_ok());
        let err = cli
            .parse(&mut targets, &env(&[]), ["-v", "--quiet"])
            .unwrap_err();
        assert_eq!(err.to_string(), "You cannot specify these options: --quiet");
        let err = cli.parse(&mut targets, &env(&[]), ["--quiet"]).unwrap_err();
        assert_eq!(err.to_string(), "Option --verbose must be specified");
    }

    #[test]
    fn test_select_declared_in_chain() {
        let mut registry = OptionRegistry::new();
        let mut d = registry.declarer("app");
        d.opt(OptionDecl::new("file").typed("string")).unwrap();
        d.opt(OptionDecl::new("url").typed("uri")).unwrap();
        d.opt_select(SelectDecl::one_of("source", ["file", "url"]));
        let mut cli =
            CommandLine::from_registry(&mut registry, ["app"], DriverConfig::new("app")).unwrap();
        let mut targets = Targets::new();
        assert!(cli.parse(&mut targets, &env(&[]), ["--file", "a"]).is_ok());
        let exit = cli.run(&mut targets, &env(&[]), Vec::<String>::new()).unwrap_err();
        assert!(exit
            .output
            .starts_with("You must specify only one of these options: --file, --url"));
    }

    #[test]
    fn test_opt_error_appends_help() {
        let cli = command_line();
        let exit = cli.opt_error("count must be even");
        assert_eq!(exit.code, 1);
        let mut lines = exit.output.lines();
        assert_eq!(lines.next(), Some("count must be even"));
        assert_eq!(lines.next(), Some("USAGE: app [OPTIONS]"));
    }

    #[test]
    fn test_builtins_are_part_of_help() {
        let cli = command_line();
        let help = cli.help(false);
        assert!(help.contains("basic: basic options"));
        assert!(help.contains("--? | -?"));
        assert!(!help.contains("show help for all commands"));
        assert!(cli.help(true).contains("show help for all commands"));
    }
}
