#![no_main]

use bayescmd::config::{tokens_from_yaml, ArgumentTree};
use libfuzzer_sys::fuzz_target;

/// Fuzz target for argument files
///
/// Arbitrary YAML must either fail to load or flatten into tokens the parser
/// handles without panicking.

fuzz_target!(|data: &[u8]| {
    let Ok(content) = std::str::from_utf8(data) else {
        return;
    };
    let Ok(tokens) = tokens_from_yaml(content) else {
        return;
    };
    if let Ok(mut tree) = ArgumentTree::standard() {
        let _ = tree.parse(tokens);
    }
});
