//! Pre-dispatch policy checks
//!
//! A tree can be structurally valid while its value combination makes no
//! sense for any routine. These checks run after parsing and before any
//! external call.

use crate::config::ArgumentTree;
use std::path::Path;

/// Post-parse semantic error
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PolicyError {
    #[error("Model has no parameters; use algorithm=fixed_param")]
    ZeroParamsRequireFixedParam,

    #[error("The number of warmup samples (num_warmup) must be greater than zero if adaptation is enabled.")]
    AdaptationWithoutWarmup,

    #[error("Option {option} must be specified")]
    MissingRequired { option: String },

    #[error("Only one of {first} and {second} may be specified")]
    Conflicting { first: String, second: String },

    #[error("Cannot find {option} file: {path}")]
    MissingFile { option: String, path: String },

    #[error("Argument 'num_chains' is unavailable for the 'static' HMC engine.")]
    StaticEngineMultiChain,

    #[error("Filename conflict, {option} file {path} and output file names are identical, must be different.")]
    FilenameConflict { option: String, path: String },

    #[error("Ill-formed output filename {path}")]
    IllFormedOutput { path: String },
}

/// Input-file options checked for existence, per method
const INPUT_FILES: &[(&str, &str)] = &[
    ("data.file", "data"),
    ("method.sample.algorithm.hmc.metric_file", "metric"),
    ("method.generate_quantities.fitted_params", "fitted_params"),
    ("method.log_prob.unconstrained_params", "unconstrained_params"),
    ("method.log_prob.constrained_params", "constrained_params"),
    ("method.laplace.mode", "mode"),
];

/// Input files in output CSV format that must not be the output file itself
const CSV_INPUTS: &[(&str, &str)] = &[
    ("method.generate_quantities.fitted_params", "fitted_params"),
    ("method.laplace.mode", "mode"),
    ("method.log_prob.constrained_params", "constrained_params"),
];

const OUTPUT_FILES: &[&str] = &["output.file", "output.diagnostic_file"];

/// Run every policy check for the selected method
pub fn check_policy(tree: &ArgumentTree, num_params: usize) -> Result<(), PolicyError> {
    match tree.method() {
        Some("sample") => check_sample(tree, num_params)?,
        Some("generate_quantities") => require(tree, "method.generate_quantities.fitted_params", "fitted_params")?,
        Some("laplace") => require(tree, "method.laplace.mode", "mode")?,
        Some("log_prob") => check_log_prob(tree)?,
        _ => {}
    }
    check_files(tree)?;
    check_outputs(tree)
}

fn check_sample(tree: &ArgumentTree, num_params: usize) -> Result<(), PolicyError> {
    let engaged = tree.get::<bool>("method.sample.adapt.engaged").unwrap_or(false);
    let num_warmup = tree.get::<i32>("method.sample.num_warmup").unwrap_or(0);
    if engaged && num_warmup == 0 {
        return Err(PolicyError::AdaptationWithoutWarmup);
    }

    let hmc = tree.active("method.sample.algorithm") != Some("fixed_param");
    if num_params == 0 && hmc {
        return Err(PolicyError::ZeroParamsRequireFixedParam);
    }

    let num_chains = tree.get::<i32>("method.sample.num_chains").unwrap_or(1);
    if hmc && num_chains > 1 && tree.active("method.sample.algorithm.hmc.engine") == Some("static") {
        return Err(PolicyError::StaticEngineMultiChain);
    }
    Ok(())
}

fn check_log_prob(tree: &ArgumentTree) -> Result<(), PolicyError> {
    let unconstrained = text(tree, "method.log_prob.unconstrained_params");
    let constrained = text(tree, "method.log_prob.constrained_params");
    match (unconstrained.is_empty(), constrained.is_empty()) {
        (true, true) => Err(PolicyError::MissingRequired {
            option: "unconstrained_params or constrained_params".to_string(),
        }),
        (false, false) => Err(PolicyError::Conflicting {
            first: "unconstrained_params".to_string(),
            second: "constrained_params".to_string(),
        }),
        _ => Ok(()),
    }
}

fn require(tree: &ArgumentTree, path: &str, option: &str) -> Result<(), PolicyError> {
    if text(tree, path).is_empty() {
        return Err(PolicyError::MissingRequired {
            option: option.to_string(),
        });
    }
    Ok(())
}

/// Every non-empty input file option must name an existing file. `init` is
/// either a number (the initialization radius) or a file.
pub fn check_files(tree: &ArgumentTree) -> Result<(), PolicyError> {
    for (path, option) in INPUT_FILES {
        let file = text(tree, path);
        if !file.is_empty() && !Path::new(&file).exists() {
            return Err(PolicyError::MissingFile {
                option: option.to_string(),
                path: file,
            });
        }
    }

    let init = text(tree, "init");
    if !init.is_empty() && init.parse::<f64>().is_err() && !Path::new(&init).exists() {
        return Err(PolicyError::MissingFile {
            option: "init".to_string(),
            path: init,
        });
    }
    Ok(())
}

/// Output names must name a file, and CSV inputs must not be the output file
pub fn check_outputs(tree: &ArgumentTree) -> Result<(), PolicyError> {
    for path in OUTPUT_FILES {
        let file = text(tree, path);
        if is_ill_formed(&file) {
            return Err(PolicyError::IllFormedOutput { path: file });
        }
    }

    let output = text(tree, "output.file");
    for (path, option) in CSV_INPUTS {
        let input = text(tree, path);
        if same_file(&input, &output) {
            return Err(PolicyError::FilenameConflict {
                option: option.to_string(),
                path: input,
            });
        }
    }
    Ok(())
}

fn is_ill_formed(file: &str) -> bool {
    let dot = format!("{}.", std::path::MAIN_SEPARATOR);
    file.ends_with(std::path::MAIN_SEPARATOR) || file.ends_with("..") || file.ends_with(&dot)
}

/// Identical names, or two names resolving to the same existing file
fn same_file(a: &str, b: &str) -> bool {
    if a.is_empty() || b.is_empty() {
        return false;
    }
    if a == b {
        return true;
    }
    match (Path::new(a).canonicalize(), Path::new(b).canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

/// String leaf value; inactive or missing paths read as empty
fn text(tree: &ArgumentTree, path: &str) -> String {
    tree.get::<String>(path).unwrap_or_default()
}
