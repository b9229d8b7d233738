//! Switches and groups every command line gets.

use declopt_core::{
    DeclarationError, Declarer, DeclaringUnit, GroupDecl, OptionDecl, TargetContainer, class_of,
};

pub const HELP: &str = "--?";
pub const HELP_ALL: &str = "--??";
pub const VERSION: &str = "--application-version";

/// Declaring unit of the built-in switches. It is always first in the
/// chain, so applications can refine its groups and options.
#[derive(Debug, Clone, Copy)]
pub struct Builtins;

impl Builtins {
    pub fn container() -> TargetContainer {
        class_of::<Self>()
    }
}

impl DeclaringUnit for Builtins {
    fn unit_name() -> String {
        "declopt::builtins".to_string()
    }

    fn declare(d: &mut Declarer<'_>) -> Result<(), DeclarationError> {
        d.opt_group(
            GroupDecl::new("basic")
                .title("basic options")
                .priority(0)
                .description("These are the standard options offered to all commands."),
        )?;
        d.opt_group(
            GroupDecl::new("advanced")
                .title("advanced options")
                .priority(100)
                .hidden(true),
        )?;

        let builtin = |name: &str| {
            OptionDecl::new(name)
                .group("basic")
                .container(Self::container())
                .no_accessor()
        };
        d.opt(builtin(HELP).short('?').note("show this help (--?? for all)"))?;
        d.opt(builtin(HELP_ALL).note("show help for all commands").hidden(true))?;
        d.opt(builtin(VERSION).short('V').note("application version"))
    }
}

/// What a built-in switch asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuiltinAction {
    Help { show_hidden: bool },
    Version,
}

pub fn builtin_action(long_name: &str) -> Option<BuiltinAction> {
    match long_name {
        HELP => Some(BuiltinAction::Help { show_hidden: false }),
        HELP_ALL => Some(BuiltinAction::Help { show_hidden: true }),
        VERSION => Some(BuiltinAction::Version),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use declopt_core::{OptionFinder, OptionRegistry, Requirement};

    #[test]
    fn test_builtin_declarations() {
        let mut registry = OptionRegistry::new();
        registry.declare::<Builtins>().unwrap();
        let resolved = OptionFinder::new(&registry, [Builtins::unit_name()])
            .resolve()
            .unwrap();

        let help = resolved.option(HELP).unwrap();
        assert_eq!(help.short_name(), Some('?'));
        assert_eq!(help.requirement(), Requirement::NoArgument);
        assert!(!help.creates_accessor());
        assert!(resolved.option(HELP_ALL).unwrap().is_hidden());
        assert_eq!(resolved.option(VERSION).unwrap().short_name(), Some('V'));

        let basic = resolved.group("basic").unwrap();
        assert_eq!(basic.priority, 0);
        assert!(resolved.group("advanced").unwrap().hidden);
    }

    #[test]
    fn test_builtin_action_lookup() {
        assert_eq!(
            builtin_action("--??"),
            Some(BuiltinAction::Help { show_hidden: true })
        );
        assert_eq!(builtin_action("--verbose"), None);
    }
}
