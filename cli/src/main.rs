use declopt_core::{
    Argument, DeclarationError, Declarer, DeclaringUnit, EvaluationError, GroupDecl, OptionDecl,
    OptionRegistry, ResolvedOption, SelectDecl, TargetContainer, Targets, Value, class_of,
};
use declopt_driver::{CommandLine, DriverConfig};
use tracing::debug;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

const PACKAGE_VERSION: &str = env!("CARGO_PKG_VERSION");
const BIN_NAME: &str = "declopt-demo";

/// Script-level options, one per built-in type plus the list forms.
struct ScriptWithOptions;

impl DeclaringUnit for ScriptWithOptions {
    fn declare(d: &mut Declarer<'_>) -> Result<(), DeclarationError> {
        d.opt_group_with(
            GroupDecl::new("singles")
                .title("options with a single value")
                .priority(10)
                .description("One value per switch."),
            |d| {
                d.opt(OptionDecl::new("a_switch").short('s').note("a plain switch"))?;
                d.opt(
                    OptionDecl::new("an_int")
                        .short('i')
                        .default(1)
                        .env("DEMO_AN_INT")
                        .note("must not be negative"),
                )?;
                d.opt(OptionDecl::new("a_float").default(2.5))?;
                d.opt(OptionDecl::new("a_string").typed("string"))?;
                d.opt(OptionDecl::new("a_uri").typed("uri"))?;
                d.opt(OptionDecl::new("a_date").typed("date"))?;
                d.opt(OptionDecl::new("a_time").typed("time"))?;
                d.opt(
                    OptionDecl::new("a_choice")
                        .choices(["red", "blue", "green"])
                        .argument_note("COLOR")
                        .env("DEMO_A_CHOICE"),
                )
            },
        )?;

        d.opt_group(GroupDecl::new("advanced").hidden(false))?;
        d.opt(
            OptionDecl::new("a_small_integer")
                .group("advanced")
                .default(10)
                .evaluate_with(small_integer)
                .note("between 1 and 10"),
        )?;

        d.opt_group_with(
            GroupDecl::new("collections")
                .title("options taking lists and maps")
                .priority(20),
            |d| {
                d.opt(OptionDecl::new("a_hash").typed("hash"))?;
                d.opt(OptionDecl::new("ints").typed("ints"))?;
                d.opt(OptionDecl::new("floats").typed("floats"))?;
                d.opt(OptionDecl::new("strings").typed("strings"))?;
                d.opt(OptionDecl::new("uris").typed("uris"))?;
                d.opt(OptionDecl::new("dates").typed("dates"))?;
                d.opt(OptionDecl::new("times").typed("times"))?;
                d.opt(OptionDecl::new("some_choices").choices(["low", "mid", "high"]).typed("choices"))
            },
        )?;

        d.opt(
            OptionDecl::new("word")
                .choices(["foo", "bar", "baz"])
                .default(Value::choice("foo")),
        )?;
        d.opt(OptionDecl::new("words").default(vec!["alpha", "beta"]))?;
        d.opt(OptionDecl::new("numbers").default(vec![1, 2, 3]))?;
        d.opt(OptionDecl::new("switcher").hidden(true).note("hidden switch"))?;

        d.opt_select(SelectDecl::none_or_one_of("text_source", ["a_string", "strings"]));
        Ok(())
    }
}

/// A reusable component whose options live in its own container.
struct SideComponent;

impl DeclaringUnit for SideComponent {
    fn declare(d: &mut Declarer<'_>) -> Result<(), DeclarationError> {
        d.opt_group_with(
            GroupDecl::new("side_component_stuff")
                .title("side component options")
                .priority(30),
            |d| {
                d.opt(
                    OptionDecl::new("a_side_component_option")
                        .default("foo")
                        .container(class_of::<SideComponent>()),
                )
            },
        )?;
        d.opt(
            OptionDecl::new("basic_option_from_component")
                .group("basic")
                .container(class_of::<SideComponent>())
                .note("lands in the basic group"),
        )
    }
}

fn small_integer(argument: &Argument, option: &ResolvedOption) -> Result<Value, EvaluationError> {
    let reject = |message: String| EvaluationError::Rejected {
        option: option.long_name().to_string(),
        message,
    };
    let text = argument
        .text()
        .ok_or_else(|| reject("argument required".to_string()))?;
    let n: i64 = text
        .trim()
        .parse()
        .map_err(|_| reject(format!("'{text}' is not a valid integer")))?;
    if !(1..=10).contains(&n) {
        return Err(reject(format!("{n} is not between 1 and 10")));
    }
    Ok(Value::Int(n))
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() {
    init_tracing();

    if let Err(err) = run() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let mut registry = OptionRegistry::new();
    registry
        .declare::<SideComponent>()
        .map_err(|e| e.to_string())?;
    registry
        .declare::<ScriptWithOptions>()
        .map_err(|e| e.to_string())?;

    let config = DriverConfig::new(BIN_NAME).with_version(format!("{BIN_NAME} {PACKAGE_VERSION}"));
    let mut cli = CommandLine::from_registry(
        &mut registry,
        [SideComponent::unit_name(), ScriptWithOptions::unit_name()],
        config,
    )
    .map_err(|e| e.to_string())?;

    let mut targets = Targets::new();
    let arguments = cli.run_or_exit(&mut targets);

    let app = TargetContainer::Application;
    let an_int = targets
        .value::<i64>(&app, "an_int")
        .map_err(|e| e.to_string())?
        .unwrap_or_default();
    if an_int < 0 {
        cli.opt_error(format!("--an-int must not be negative, got {an_int}"))
            .terminate();
    }
    debug!(arguments = arguments.len(), "command line accepted");

    let report = serde_json::json!({
        "application": targets.snapshot(&app).map_err(|e| e.to_string())?,
        "side_component": targets
            .snapshot(&class_of::<SideComponent>())
            .map_err(|e| e.to_string())?,
        "arguments": arguments,
    });
    let rendered = serde_json::to_string_pretty(&report).map_err(|e| e.to_string())?;
    println!("{rendered}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn evaluate(text: &str) -> Result<Value, EvaluationError> {
        let mut registry = OptionRegistry::new();
        registry.declare::<ScriptWithOptions>().unwrap();
        let resolved = declopt_core::OptionFinder::new(&registry, [ScriptWithOptions::unit_name()])
            .resolve()
            .unwrap();
        resolved
            .option("--a-small-integer")
            .unwrap()
            .evaluate(Argument::Text(text.to_string()))
    }

    #[test]
    fn test_small_integer_accepts_range() {
        assert_eq!(evaluate("1"), Ok(Value::Int(1)));
        assert_eq!(evaluate(" 10 "), Ok(Value::Int(10)));
    }

    #[test]
    fn test_small_integer_rejects_out_of_range() {
        let err = evaluate("11").unwrap_err();
        assert_eq!(err.to_string(), "--a-small-integer: 11 is not between 1 and 10");
        assert!(matches!(evaluate("ten"), Err(EvaluationError::Rejected { .. })));
    }
}
