//! Option metadata model and evaluation pipeline for declarative command
//! lines.
//!
//! This crate defines the pieces an application uses to declare its
//! switches and the resolution that turns those declarations into a typed,
//! merged view:
//!
//! - [`Value`]: typed results of evaluation, defaults and fixed values.
//! - [`TypeRegistry`] / [`OptionType`]: the ordered catalog of value kinds
//!   (switch, int, float, string, uri, date, time, choice, hash and the list
//!   forms) with their evaluation and type-recognition functions.
//! - [`OptionDecl`], [`GroupDecl`], [`SelectDecl`], [`CheckDecl`]: the
//!   declaration builders.
//! - [`OptionStore`] / [`OptionRegistry`]: declarations scoped per unit.
//! - [`OptionFinder`]: field-level merge along a declaration chain into
//!   [`ResolvedOptions`].
//! - [`ResolvedOption`]: evaluation of arguments and binding into
//!   [`Targets`].
//!
//! # Example
//!
//! ```
//! use declopt_core::*;
//!
//! let mut registry = OptionRegistry::new();
//! let mut declarer = registry.declarer("app");
//! declarer
//!     .opt(OptionDecl::new("color").choices(["red", "blue"]).default(Value::choice("red")))
//!     .unwrap();
//! declarer.opt(OptionDecl::new("ids").default(vec![1, 2, 3])).unwrap();
//!
//! let resolved = OptionFinder::new(&registry, ["app"]).resolve().unwrap();
//! let mut targets = Targets::new();
//! for option in resolved.parse_view() {
//!     option.instantiate_default(&mut targets);
//! }
//!
//! let ids = resolved.option("--ids").unwrap();
//! let value = ids.evaluate(Argument::Text("4,5".into())).unwrap();
//! ids.bind(&mut targets, value);
//!
//! let app = TargetContainer::Application;
//! assert_eq!(targets.value::<Vec<i64>>(&app, "ids").unwrap(), Some(vec![4, 5]));
//! assert_eq!(targets.value::<String>(&app, "color").unwrap().as_deref(), Some("red"));
//! ```

mod check;
mod declare;
mod error;
mod finder;
mod group;
mod option;
mod store;
mod targets;
mod types;
mod value;

pub use check::{CheckAction, CheckSpec, OptionCheck, OptionSelect, SelectAction, SelectSpec};
pub use declare::{CheckDecl, GroupDecl, OptionDecl, SelectDecl};
pub use error::{BindError, CheckError, DeclarationError, EvaluationError};
pub use finder::{OptionFinder, OptionSummary, ResolvedOptions};
pub use group::{BASIC_GROUP, DEFAULT_GROUP_PRIORITY, GroupSpec, OptionGroup};
pub use option::{
    Argument, CustomEvaluateFn, Evaluator, OptionSpec, Requirement, ResolvedOption,
    long_name_for, target_variable_for,
};
pub use store::{Declarer, DeclaringUnit, OptionRegistry, OptionStore};
pub use targets::{TargetContainer, Targets, class_of};
pub use types::{
    BUILTIN_TYPE_ORDER, EvaluateFn, OptionType, RecognizeFn, TypeRegistry, parse_date_text,
    parse_time_text, split_list,
};
pub use value::{FromValue, Uri, Value};
