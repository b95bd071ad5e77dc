#![no_main]

use arbitrary::Arbitrary;
use bayescmd::config::{echo_tokens, ArgumentTree, ParseSummary, PARSE_FAILURE};
use bayescmd::dispatch::{resolve, PolicyError};
use bayescmd::Error;
use libfuzzer_sys::fuzz_target;

/// Fuzz target for the token parser
///
/// Mixes known option names with arbitrary text so the fuzzer reaches deep
/// into the tree instead of stopping at the first unknown token.

#[derive(Arbitrary, Debug)]
enum FuzzToken {
    Known(u8),
    Assign(u8, String),
    Raw(String),
}

const NAMES: &[&str] = &[
    "sample", "optimize", "variational", "diagnose", "pathfinder", "laplace", "log_prob",
    "generate_quantities", "method", "algorithm", "engine", "metric", "adapt", "engaged",
    "num_warmup", "num_samples", "delta", "max_depth", "int_time", "hmc", "nuts", "static",
    "fixed_param", "output", "data", "random", "seed", "file", "help", "help-all", "iter",
];

fn name(index: u8) -> &'static str {
    NAMES[index as usize % NAMES.len()]
}

fuzz_target!(|tokens: Vec<FuzzToken>| {
    let tokens: Vec<String> = tokens
        .into_iter()
        .map(|t| match t {
            FuzzToken::Known(i) => name(i).to_string(),
            FuzzToken::Assign(i, value) => format!("{}={}", name(i), value),
            FuzzToken::Raw(raw) => raw,
        })
        .collect();

    let Ok(mut tree) = ArgumentTree::standard() else {
        return;
    };

    match tree.parse(tokens) {
        // Invariant 1: every diagnostic ends with the failure line
        Err(err) => assert_eq!(err.lines().last().map(String::as_str), Some(PARSE_FAILURE)),
        Ok(ParseSummary::Help) => assert!(!tree.help_text().is_empty()),
        Ok(ParseSummary::Configured) => {
            // Invariant 2: the echo reparses to the same echo
            let echo = tree.echo("");
            if let Ok(mut reparsed) = ArgumentTree::standard() {
                if reparsed.parse(echo_tokens(&echo)).is_ok() {
                    assert_eq!(reparsed.echo(""), echo);
                }
            }

            // Invariant 3: resolution never panics; zero warmup with adaptation is always refused
            let adapt_without_warmup = tree.method() == Some("sample")
                && tree.get::<bool>("method.sample.adapt.engaged") == Some(true)
                && tree.get::<i32>("method.sample.num_warmup") == Some(0);
            let result = resolve(&tree, 1);
            if adapt_without_warmup {
                assert!(matches!(result, Err(Error::Policy(PolicyError::AdaptationWithoutWarmup))));
            }
        }
    }
});
