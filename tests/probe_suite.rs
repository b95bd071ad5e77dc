//! Probe-driven good/bad value suite over the full option schema

use bayescmd::config::{ArgumentTree, ConfigNode, Expectation, Probe, ProbeFailure, UsageError};

fn pristine() -> ArgumentTree {
    ArgumentTree::standard().unwrap()
}

#[test]
fn test_probe_covers_every_leaf() {
    let tree = pristine();
    let probe = Probe::new(&tree);
    let cases = probe.cases();

    let good: Vec<String> = cases
        .iter()
        .filter(|c| c.expect == Expectation::Good)
        .map(|c| c.qualified_name())
        .collect();

    for path in ["method.sample.adapt.delta", "random.seed", "output.sig_figs", "num_threads", "init"] {
        assert!(good.contains(&path.to_string()), "no good probe for {path}");
    }
    for path in [
        "method.sample.algorithm.hmc.engine.static.int_time",
        "method.optimize.algorithm.lbfgs.history_size",
        "method.variational.adapt.iter",
        "method.pathfinder.num_paths",
    ] {
        assert!(good.contains(&path.to_string()), "inactive alternative {path} not probed");
    }
}

#[test]
fn test_every_known_good_value_is_accepted_and_stored() {
    let tree = pristine();
    let probe = Probe::new(&tree);
    for case in probe.cases().iter().filter(|c| c.expect == Expectation::Good) {
        assert_eq!(probe.verify(case), Ok(()), "{}", case.tokens().join(" "));
    }
}

#[test]
fn test_every_known_bad_value_names_the_option() {
    let tree = pristine();
    let probe = Probe::new(&tree);
    for case in probe.cases().iter().filter(|c| c.expect == Expectation::Bad) {
        let mut fresh = pristine();
        match fresh.parse(case.tokens()) {
            Err(UsageError::InvalidValue(e)) => assert_eq!(e.qualified_name(), case.qualified_name()),
            other => panic!("{} should be rejected, got {other:?}", case.tokens().join(" ")),
        }
    }
}

#[test]
fn test_bad_value_probe_detects_a_broken_expectation() {
    let tree = pristine();
    let probe = Probe::new(&tree);
    let mut case = probe
        .cases()
        .into_iter()
        .find(|c| c.expect == Expectation::Bad && c.qualified_name() == "method.sample.adapt.delta")
        .unwrap();
    for line in case.echo.iter_mut() {
        if line.trim_start().starts_with("delta = ") {
            *line = "delta = 0.5".to_string();
        }
    }
    assert!(matches!(probe.verify(&case), Err(ProbeFailure::BadAccepted { .. })));
}

#[test]
fn test_unparsed_tree_holds_defaults() {
    let tree = pristine();
    for case in Probe::new(&tree).cases() {
        if let Some(ConfigNode::Leaf(leaf)) = tree.lookup(&case.qualified_name()) {
            assert!(leaf.is_default(), "{} is not at its default", case.qualified_name());
        }
    }
}

#[test]
fn test_report_lists_good_and_bad_sections() {
    let report = Probe::new(&pristine()).report();
    assert!(report.iter().any(|l| l.starts_with("good")));
    assert!(report.iter().any(|l| l.starts_with("bad")));
    assert!(report.iter().any(|l| l.contains("delta = 0.5")));
}
