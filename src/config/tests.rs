//! Integration tests for config module

use super::*;
use std::io::Write;
use tempfile::NamedTempFile;

fn tree() -> ArgumentTree {
    ArgumentTree::standard().unwrap()
}

fn parsed(tokens: &[&str]) -> ArgumentTree {
    let mut tree = tree();
    tree.parse(tokens.iter().copied()).unwrap();
    tree
}

#[test]
fn test_every_known_good_and_bad_value() {
    let tree = tree();
    let probe = Probe::new(&tree);
    let cases = probe.cases();
    assert!(cases.iter().any(|c| c.expect == Expectation::Bad));
    for case in &cases {
        if let Err(failure) = probe.verify(case) {
            panic!("{failure}\n{}", case.tokens().join(" "));
        }
    }
}

#[test]
fn test_untouched_leaves_keep_defaults() {
    let tree = parsed(&["sample", "num_samples=10"]);
    for case in Probe::new(&ArgumentTree::standard().unwrap()).cases() {
        let path = case.qualified_name();
        if path == "method.sample.num_samples" {
            continue;
        }
        if let Some(ConfigNode::Leaf(leaf)) = tree.lookup(&path) {
            assert!(leaf.is_default(), "{path} moved off its default");
            assert_eq!(leaf.value(), leaf.default_value());
        }
    }
}

#[test]
fn test_method_defaults_when_name_omitted() {
    let tree = parsed(&["num_warmup=10"]);
    assert_eq!(tree.method(), Some("sample"));
    assert_eq!(tree.get::<i32>("method.sample.num_warmup"), Some(10));
}

#[test]
fn test_terse_form_reaches_default_alternatives() {
    let tree = parsed(&["sample", "max_depth=12", "metric=dense_e"]);
    assert_eq!(tree.get::<i32>("method.sample.algorithm.hmc.engine.nuts.max_depth"), Some(12));
    assert_eq!(tree.active("method.sample.algorithm.hmc.metric"), Some("dense_e"));
}

#[test]
fn test_explicit_alternative_chain() {
    let tree = parsed(&["sample", "algorithm=hmc", "engine=static", "int_time=3.5", "stepsize=0.1"]);
    assert_eq!(tree.active("method.sample.algorithm.hmc.engine"), Some("static"));
    assert_eq!(tree.get::<f64>("method.sample.algorithm.hmc.engine.static.int_time"), Some(3.5));
    assert_eq!(tree.get::<f64>("method.sample.algorithm.hmc.stepsize"), Some(0.1));
}

#[test]
fn test_echo_round_trip() {
    let original = parsed(&[
        "optimize",
        "algorithm=bfgs",
        "tol_grad=1e-6",
        "iter=50",
        "data",
        "file=d.json",
        "random",
        "seed=42",
        "output",
        "sig_figs=9",
    ]);
    let echo = original.echo("");
    let mut reparsed = tree();
    reparsed.parse(echo_tokens(&echo)).unwrap();
    assert_eq!(reparsed.echo(""), echo);
    assert_eq!(reparsed.to_json(), original.to_json());
}

#[test]
fn test_echo_default_markers() {
    let echo = parsed(&["sample", "num_samples=10"]).echo("");
    assert_eq!(echo[0], "method = sample (Default)");
    assert_eq!(echo[1], "  sample");
    assert_eq!(echo[2], "    num_samples = 10");
    assert_eq!(echo[3], "    num_warmup = 1000 (Default)");
    assert!(echo.contains(&"        metric = diag_e (Default)".to_string()));
    assert!(!echo.iter().any(|l| l.trim() == "diag_e"));
}

#[test]
fn test_unknown_option_anywhere() {
    let mut tree = tree();
    let err = tree.parse(["foo=bar"]).unwrap_err();
    assert!(matches!(&err, UsageError::UnknownToken { token, .. } if token.contains("foo")));
}

#[test]
fn test_option_of_inactive_alternative_is_unknown() {
    let mut tree = tree();
    let err = tree.parse(["optimize", "algorithm=newton", "history_size=5"]).unwrap_err();
    match err {
        UsageError::UnknownToken { token, suggestions } => {
            assert_eq!(token, "history_size=5");
            assert!(suggestions.contains(&"method=optimize algorithm=lbfgs history_size=<int>".to_string()));
        }
        other => panic!("expected unknown token, got {other:?}"),
    }
}

#[test]
fn test_misplaced_option_suggests_paths() {
    let mut tree = tree();
    let err = tree.parse(["sample", "delta=0.9"]).unwrap_err();
    let lines = err.lines();
    assert_eq!(lines[0], "delta=0.9 is either mistyped or misplaced.");
    assert_eq!(lines[1], "Perhaps you meant one of the following valid configurations?");
    assert_eq!(lines[2], "  method=sample adapt delta=<double>");
}

#[test]
fn test_invalid_choice_value() {
    let mut tree = tree();
    let err = tree.parse(["sample", "metric=sparse_e"]).unwrap_err();
    match err {
        UsageError::InvalidValue(e) => {
            assert_eq!(e.qualified_name(), "method.sample.algorithm.hmc.metric");
            assert_eq!(e.validity, "unit_e, diag_e, dense_e");
        }
        other => panic!("expected invalid value, got {other:?}"),
    }
}

#[test]
fn test_type_conversion_failures_are_invalid() {
    for token in ["num_samples=abc", "num_samples=1.5", "save_warmup=yes", "adapt"] {
        let mut tree = tree();
        let tokens = if token == "adapt" {
            vec!["sample", "adapt", "delta=nan"]
        } else {
            vec!["sample", token]
        };
        assert!(
            matches!(tree.parse(tokens), Err(UsageError::InvalidValue(_))),
            "{token} should be rejected"
        );
    }
}

#[test]
fn test_variational_nested_iter_scoping() {
    let tree = parsed(&["variational", "adapt", "iter=20", "engaged=0"]);
    assert_eq!(tree.get::<i32>("method.variational.adapt.iter"), Some(20));
    assert_eq!(tree.get::<i32>("method.variational.iter"), Some(10000));
    assert_eq!(tree.get::<bool>("method.variational.adapt.engaged"), Some(false));
}

#[test]
fn test_parse_stops_after_help() {
    let mut tree = tree();
    assert_eq!(tree.parse(["optimize", "help", "foo=bar"]), Ok(ParseSummary::Help));
    assert_eq!(tree.help_text()[0], "optimize");
}

#[test]
fn test_args_file_then_command_line() {
    let yaml = r#"
method: optimize
optimize:
  algorithm: lbfgs
  lbfgs:
    history_size: 9
  iter: 300
"#;
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(yaml.as_bytes()).unwrap();

    let mut tokens = load_tokens(file.path()).unwrap();
    tokens.extend(["output".to_string(), "refresh=5".to_string()]);

    let mut tree = tree();
    assert_eq!(tree.parse(tokens), Ok(ParseSummary::Configured));
    assert_eq!(tree.get::<i32>("method.optimize.algorithm.lbfgs.history_size"), Some(9));
    assert_eq!(tree.get::<i32>("method.optimize.iter"), Some(300));
    assert_eq!(tree.get::<i32>("output.refresh"), Some(5));
}

#[test]
fn test_seed_range() {
    let tree = parsed(&["sample", "random", "seed=4294967295"]);
    assert_eq!(tree.get::<i64>("random.seed"), Some(4_294_967_295));

    let mut tree = ArgumentTree::standard().unwrap();
    assert!(tree.parse(["sample", "random", "seed=4294967296"]).is_err());
}

#[test]
fn test_echo_round_trip_keeps_marker_text_in_values() {
    let original = parsed(&["sample", "output", "file=x(Default)"]);
    let mut reparsed = tree();
    reparsed.parse(echo_tokens(&original.echo(""))).unwrap();
    assert_eq!(reparsed.get::<String>("output.file"), Some("x(Default)".to_string()));
}

#[test]
fn test_reselecting_metric_leaves_one_flag_present() {
    let tree = parsed(&["sample", "metric=dense_e", "metric=unit_e"]);
    let Some(ConfigNode::Choice(metric)) = tree.lookup("method.sample.algorithm.hmc.metric") else {
        panic!("metric must be a choice");
    };
    let present: Vec<&str> = metric
        .alternatives
        .iter()
        .filter_map(|alt| match alt {
            ConfigNode::Flag(flag) if flag.present => Some(flag.name.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(present, vec!["unit_e"]);
}
