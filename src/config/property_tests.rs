//! Property tests for the configuration tree
//!
//! Arbitrary token streams, value ranges and echo round trips.

#[cfg(test)]
mod tests {
    use crate::config::*;
    use proptest::prelude::*;

    fn tree() -> ArgumentTree {
        ArgumentTree::standard().unwrap()
    }

    // ============================================================
    // Arbitrary Generators
    // ============================================================

    fn arb_name() -> impl Strategy<Value = String> {
        prop_oneof![
            Just("sample".to_string()),
            Just("optimize".to_string()),
            Just("adapt".to_string()),
            Just("algorithm".to_string()),
            Just("method".to_string()),
            Just("help".to_string()),
            Just("help-all".to_string()),
            Just("num_warmup".to_string()),
            Just("delta".to_string()),
            Just("data".to_string()),
            Just("file".to_string()),
            "[a-z_]{1,12}",
        ]
    }

    fn arb_token() -> impl Strategy<Value = String> {
        prop_oneof![
            arb_name(),
            (arb_name(), "[-a-z0-9.=]{0,8}").prop_map(|(n, v)| format!("{n}={v}")),
            any::<String>(),
        ]
    }

    fn arb_sample_config() -> impl Strategy<Value = (u32, u32, f64, i32, bool, &'static str)> {
        (
            0u32..5000,
            0u32..5000,
            0.01f64..0.99,
            1i32..20,
            any::<bool>(),
            prop_oneof![Just("unit_e"), Just("diag_e"), Just("dense_e")],
        )
    }

    // ============================================================
    // Robustness
    // ============================================================

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(300))]

        #[test]
        fn prop_parse_never_panics(tokens in proptest::collection::vec(arb_token(), 0..12)) {
            let mut tree = tree();
            let _ = tree.parse(tokens);
        }

        #[test]
        fn prop_failed_parse_diagnostic_ends_with_failure_line(
            tokens in proptest::collection::vec(arb_token(), 1..8)
        ) {
            let mut tree = tree();
            if let Err(err) = tree.parse(tokens) {
                let lines = err.lines();
                prop_assert_eq!(lines.last().map(String::as_str), Some(PARSE_FAILURE));
            }
        }

        #[test]
        fn prop_split_token_rejoins(name in "[a-z_]{1,10}", value in "[-a-z0-9.=]{0,10}") {
            let token = format!("{name}={value}");
            let (n, v) = split_token(&token);
            prop_assert_eq!(n, name.as_str());
            prop_assert_eq!(v, Some(value.as_str()));
        }
    }

    // ============================================================
    // Value Ranges
    // ============================================================

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        #[test]
        fn prop_non_negative_warmup_accepted(n in 0i32..i32::MAX) {
            let mut tree = tree();
            let token = format!("num_warmup={n}");
            prop_assert!(tree.parse(["sample", token.as_str()]).is_ok());
            prop_assert_eq!(tree.get::<i32>("method.sample.num_warmup"), Some(n));
        }

        #[test]
        fn prop_negative_warmup_rejected(n in i32::MIN..0) {
            let mut tree = tree();
            let token = format!("num_warmup={n}");
            let result = tree.parse(["sample", token.as_str()]);
            prop_assert!(matches!(result, Err(UsageError::InvalidValue(_))));
        }

        #[test]
        fn prop_delta_open_interval(delta in -2.0f64..3.0) {
            let mut tree = tree();
            let token = format!("delta={delta}");
            let result = tree.parse(["sample", "adapt", token.as_str()]);
            if delta > 0.0 && delta < 1.0 {
                prop_assert!(result.is_ok());
                let stored = tree.get::<f64>("method.sample.adapt.delta").unwrap();
                prop_assert!(approx::relative_eq!(stored, delta));
            } else {
                prop_assert!(matches!(result, Err(UsageError::InvalidValue(_))));
            }
        }

        #[test]
        fn prop_rejected_value_leaves_default(bad in 1.0f64..100.0) {
            let mut tree = tree();
            let token = format!("delta={bad}");
            let _ = tree.parse(["sample", "adapt", token.as_str()]);
            prop_assert_eq!(tree.get::<f64>("method.sample.adapt.delta"), Some(0.8));
        }
    }

    // ============================================================
    // Echo Round Trip
    // ============================================================

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn prop_echo_reparses_to_same_configuration(
            (samples, warmup, delta, depth, save_warmup, metric) in arb_sample_config()
        ) {
            let tokens = vec![
                "sample".to_string(),
                format!("num_samples={samples}"),
                format!("num_warmup={warmup}"),
                format!("save_warmup={save_warmup}"),
                "adapt".to_string(),
                format!("delta={delta}"),
                format!("max_depth={depth}"),
                format!("metric={metric}"),
            ];
            let mut original = tree();
            prop_assert!(original.parse(tokens).is_ok());

            let echo = original.echo("");
            let mut reparsed = tree();
            prop_assert!(reparsed.parse(echo_tokens(&echo)).is_ok());
            prop_assert_eq!(reparsed.echo(""), echo);
            prop_assert_eq!(reparsed.active("method.sample.algorithm.hmc.metric"), Some(metric));
        }
    }
}
