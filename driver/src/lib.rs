//! Command-line processing on top of `declopt-core`.
//!
//! - [`argv`]: the switch table, environment splicing and tokenizing
//!   (via `lexopt`).
//! - [`CommandLine`]: the driver. It installs defaults, evaluates and binds,
//!   handles the built-in help and version switches, runs cross-option checks
//!   and maps outcomes to exits.
//! - [`help`]: grouped, column-aligned help text.
//!
//! # Example
//!
//! ```
//! use std::collections::BTreeMap;
//!
//! use declopt_core::{OptionDecl, OptionRegistry, TargetContainer, Targets};
//! use declopt_driver::{CommandLine, DriverConfig};
//!
//! let mut registry = OptionRegistry::new();
//! let mut d = registry.declarer("loader");
//! d.opt(OptionDecl::new("batch_size").short('b').default(100).env("BATCH_SIZE"))
//!     .unwrap();
//! d.opt(OptionDecl::new("dry_run")).unwrap();
//!
//! let mut cli =
//!     CommandLine::from_registry(&mut registry, ["loader"], DriverConfig::new("loader")).unwrap();
//! let mut targets = Targets::new();
//! let env = BTreeMap::from([("BATCH_SIZE".to_string(), "50".to_string())]);
//! let rest = cli.run(&mut targets, &env, ["--dry-run", "data.csv"]).unwrap();
//!
//! let app = TargetContainer::Application;
//! assert_eq!(rest, vec!["data.csv"]);
//! assert_eq!(targets.value::<i64>(&app, "batch_size").unwrap(), Some(50));
//! assert_eq!(targets.value::<bool>(&app, "dry_run").unwrap(), Some(true));
//! ```

pub mod argv;
mod builtin;
mod config;
mod driver;
mod error;
pub mod help;

pub use argv::{ArgvAdapter, Environment, ProcessEnvironment, SwitchSpec, SwitchTable, Token};
pub use builtin::{BuiltinAction, Builtins, HELP, HELP_ALL, VERSION, builtin_action};
pub use config::DriverConfig;
pub use driver::{CommandLine, DriverState, Exit, Outcome};
pub use error::{DriverError, Result, UsageError};
pub use help::{columnize, render_help};
