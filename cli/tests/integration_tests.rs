use std::process::{Command, Output};

use serde_json::Value;

const ENV_VARS: [&str; 2] = ["DEMO_AN_INT", "DEMO_A_CHOICE"];

fn demo(args: &[&str], env: &[(&str, &str)]) -> Output {
    let mut command = Command::new(env!("CARGO_BIN_EXE_declopt-demo"));
    for var in ENV_VARS {
        command.env_remove(var);
    }
    command
        .env_remove("RUST_LOG")
        .args(args)
        .envs(env.iter().copied())
        .output()
        .expect("failed to run declopt-demo")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

fn report(output: &Output) -> Value {
    assert!(output.status.success(), "demo failed: {}", stderr(output));
    serde_json::from_slice(&output.stdout).expect("stdout should be JSON")
}

#[test]
fn test_defaults_are_reported() {
    let report = report(&demo(&[], &[]));
    let app = &report["application"];
    assert_eq!(app["an_int"], 1);
    assert_eq!(app["a_float"], 2.5);
    assert_eq!(app["a_small_integer"], 10);
    assert_eq!(app["word"], "foo");
    assert_eq!(app["words"], serde_json::json!(["alpha", "beta"]));
    assert_eq!(app["numbers"], serde_json::json!([1, 2, 3]));
    assert_eq!(report["side_component"]["a_side_component_option"], "foo");
    assert_eq!(report["arguments"], serde_json::json!([]));
}

#[test]
fn test_switches_and_positional_arguments() {
    let report = report(&demo(
        &[
            "-s",
            "-i",
            "7",
            "--a-fl=1.5",
            "--a-date",
            "2024-02-29",
            "--a-hash",
            "a=1,b=x=y",
            "--ints",
            "4,5",
            "--word",
            "baz",
            "--basic-option-from-component",
            "input.txt",
        ],
        &[],
    ));
    let app = &report["application"];
    assert_eq!(app["a_switch"], true);
    assert_eq!(app["an_int"], 7);
    assert_eq!(app["a_float"], 1.5);
    assert_eq!(app["a_date"], "2024-02-29");
    assert_eq!(app["a_hash"], serde_json::json!({"a": "1", "b": "x=y"}));
    assert_eq!(app["ints"], serde_json::json!([4, 5]));
    assert_eq!(app["word"], "baz");
    assert_eq!(report["side_component"]["basic_option_from_component"], true);
    assert_eq!(report["arguments"], serde_json::json!(["input.txt"]));
}

#[test]
fn test_environment_then_command_line() {
    let env = [("DEMO_AN_INT", "5"), ("DEMO_A_CHOICE", "blue")];
    let from_env = report(&demo(&[], &env));
    assert_eq!(from_env["application"]["an_int"], 5);
    assert_eq!(from_env["application"]["a_choice"], "blue");

    let overridden = report(&demo(&["--an-int", "9"], &env));
    assert_eq!(overridden["application"]["an_int"], 9);
}

#[test]
fn test_help_lists_groups_in_priority_order() {
    let output = demo(&["--?"], &[]);
    assert!(output.status.success());
    let help = stdout(&output);
    assert!(help.starts_with("USAGE: declopt-demo [OPTIONS]"), "{help}");

    let position = |needle: &str| help.find(needle).unwrap_or_else(|| panic!("{needle} missing"));
    assert!(position("basic: basic options") < position("singles: options with a single value"));
    assert!(position("singles:") < position("collections: options taking lists and maps"));
    assert!(position("collections:") < position("side_component_stuff: side component options"));
    assert!(position("side_component_stuff:") < position("advanced: advanced options"));
    assert!(help.contains("--a-choice COLOR"));
    assert!(help.contains("(choices: red, blue, green) [env: DEMO_A_CHOICE]"));
    assert!(!help.contains("--switcher"));
}

#[test]
fn test_help_all_shows_hidden_options() {
    let output = demo(&["--??"], &[]);
    assert!(output.status.success());
    let help = stdout(&output);
    assert!(help.contains("--switcher"));
    assert!(help.contains("show help for all commands"));
}

#[test]
fn test_version() {
    let output = demo(&["-V"], &[]);
    assert!(output.status.success());
    assert_eq!(
        stdout(&output).trim_end(),
        format!("declopt-demo {}", env!("CARGO_PKG_VERSION"))
    );
}

#[test]
fn test_unknown_option_prints_message_and_help() {
    let output = demo(&["--does-not-exist"], &[]);
    assert_eq!(output.status.code(), Some(1));
    let err = stderr(&output);
    assert!(err.contains("unknown option: --does-not-exist\nUSAGE: declopt-demo [OPTIONS]"), "{err}");
    assert!(stdout(&output).is_empty());
}

#[test]
fn test_bad_choice_names_value_and_choices() {
    let output = demo(&["--a-choice", "purple"], &[]);
    assert_eq!(output.status.code(), Some(1));
    let err = stderr(&output);
    assert!(err.contains("'purple'"), "{err}");
    assert!(err.contains("red, blue, green"), "{err}");
}

#[test]
fn test_custom_evaluator_rejects_out_of_range() {
    let output = demo(&["--a-small-integer", "11"], &[]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("--a-small-integer: 11 is not between 1 and 10"));
}

#[test]
fn test_select_rejects_both_text_sources() {
    let output = demo(&["--a-string", "x", "--strings", "a,b"], &[]);
    assert_eq!(output.status.code(), Some(1));
    assert!(
        stderr(&output)
            .contains("You must specify no more than one of these options: --a-string, --strings")
    );
}

#[test]
fn test_application_validation_uses_opt_error() {
    let output = demo(&["--an-int=-3"], &[]);
    assert_eq!(output.status.code(), Some(1));
    let err = stderr(&output);
    assert!(err.starts_with("--an-int must not be negative, got -3\nUSAGE: declopt-demo"), "{err}");
}
