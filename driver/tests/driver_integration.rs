use std::collections::BTreeMap;

use declopt_core::{
    DeclarationError, Declarer, DeclaringUnit, EvaluationError, GroupDecl, OptionDecl,
    OptionRegistry, TargetContainer, Targets, Value, class_of,
};
use declopt_driver::{CommandLine, DriverConfig, DriverError, DriverState, Outcome};

struct Job;

impl DeclaringUnit for Job {
    fn declare(d: &mut Declarer<'_>) -> Result<(), DeclarationError> {
        d.opt_group_with(
            GroupDecl::new("job").title("job options").priority(50),
            |d| {
                d.opt(OptionDecl::new("ids").default(vec![1, 2, 3]).note("ids to process"))?;
                d.opt(OptionDecl::new("level").note("base").default(1))?;
                d.opt(OptionDecl::new("since").typed("date").env("JOB_SINCE"))
            },
        )?;
        d.opt_group(GroupDecl::new("legacy").title("legacy options").disabled(true))?;
        d.opt(OptionDecl::new("old_mode").group("legacy"))
    }
}

struct NightlyJob;

impl DeclaringUnit for NightlyJob {
    fn declare(d: &mut Declarer<'_>) -> Result<(), DeclarationError> {
        d.opt(OptionDecl::new("level").default(5))?;
        d.opt_group(GroupDecl::new("worker").title("worker options").priority(10))?;
        d.opt(
            OptionDecl::new("workers")
                .group("worker")
                .default(4)
                .container(class_of::<NightlyJob>()),
        )
    }
}

fn command_line() -> CommandLine {
    let mut registry = OptionRegistry::new();
    registry.declare::<Job>().unwrap();
    registry.declare::<NightlyJob>().unwrap();
    CommandLine::from_registry(
        &mut registry,
        [Job::unit_name(), NightlyJob::unit_name()],
        DriverConfig::new("nightly").with_version("nightly 1.2.0"),
    )
    .unwrap()
}

fn no_env() -> BTreeMap<String, String> {
    BTreeMap::new()
}

#[test]
fn test_every_default_is_bound_after_parse() {
    let mut cli = command_line();
    let mut targets = Targets::new();
    cli.run(&mut targets, &no_env(), Vec::<String>::new()).unwrap();

    let app = TargetContainer::Application;
    assert_eq!(targets.value::<Vec<i64>>(&app, "ids").unwrap(), Some(vec![1, 2, 3]));
    assert_eq!(targets.value::<i64>(&app, "level").unwrap(), Some(5));
    assert_eq!(
        targets.value::<i64>(&class_of::<NightlyJob>(), "workers").unwrap(),
        Some(4)
    );
    assert!(targets.raw(&app, "old_mode").is_none());
    assert_eq!(cli.state(), DriverState::Done);
}

#[test]
fn test_list_default_round_trips_through_command_line() {
    let mut cli = command_line();
    let mut targets = Targets::new();
    let rendered = Value::from(vec![1, 2, 3]).to_string();
    cli.run(&mut targets, &no_env(), ["--ids", rendered.as_str()]).unwrap();
    assert_eq!(
        targets.raw(&TargetContainer::Application, "ids"),
        Some(&Value::from(vec![1, 2, 3]))
    );
}

#[test]
fn test_environment_value_is_evaluated_through_type() {
    let mut cli = command_line();
    let mut targets = Targets::new();
    let env = BTreeMap::from([("JOB_SINCE".to_string(), "2024-05-06".to_string())]);
    cli.run(&mut targets, &env, Vec::<String>::new()).unwrap();
    let since = targets.raw(&TargetContainer::Application, "since").unwrap();
    assert_eq!(since.to_string(), "2024-05-06");

    let err = cli
        .parse(
            &mut targets,
            &BTreeMap::from([("JOB_SINCE".to_string(), "someday".to_string())]),
            Vec::<String>::new(),
        )
        .unwrap_err();
    assert!(matches!(
        err,
        DriverError::Evaluation(EvaluationError::InvalidDate { .. })
    ));
}

#[test]
fn test_help_orders_groups_by_priority() {
    let cli = command_line();
    let help = cli.help(false);
    let position = |needle: &str| help.find(needle).unwrap_or_else(|| panic!("{needle} missing"));
    assert!(position("basic: basic options") < position("worker: worker options"));
    assert!(position("worker: worker options") < position("job: job options"));
    assert!(position("--ids INT1,INT2,INT3...") < position("--level INTEGER"));
    assert!(help.contains("(default: 1,2,3) ids to process"));
    assert!(help.contains("[env: JOB_SINCE]"));
    assert!(!help.contains("legacy options"));
    assert!(!help.contains("--old-mode"));
}

#[test]
fn test_merged_note_and_default_in_help() {
    let cli = command_line();
    let help = cli.help(false);
    assert!(help.contains("(default: 5) base"), "{help}");
}

#[test]
fn test_version_switch() {
    let mut cli = command_line();
    let mut targets = Targets::new();
    assert_eq!(
        cli.parse(&mut targets, &no_env(), ["--application-version"]).unwrap(),
        Outcome::Version
    );
    let exit = cli.run(&mut targets, &no_env(), ["--application-v"]).unwrap_err();
    assert_eq!(exit.code, 0);
    assert_eq!(exit.output, "nightly 1.2.0");
}

#[test]
fn test_failed_parse_reports_message_and_help() {
    let mut cli = command_line();
    let mut targets = Targets::new();
    let exit = cli.run(&mut targets, &no_env(), ["--level", "high"]).unwrap_err();
    assert_eq!(exit.code, 1);
    let first = exit.output.lines().next().unwrap();
    assert_eq!(first, "--level: 'high' is not a valid integer");
    assert!(exit.output.contains("USAGE: nightly [OPTIONS]"));
    assert_eq!(cli.state(), DriverState::Failed);
}
