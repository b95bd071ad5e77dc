//! Front-end flags
//!
//! The configuration tree has its own token grammar, so clap only handles the
//! handful of front-end flags and hands every remaining token to the tree.
//!
//! # Usage
//!
//! ```bash
//! bayescmd sample num_warmup=500 adapt delta=0.95 data file=bernoulli.json
//! bayescmd --config args.yaml output file=run1.csv
//! bayescmd --format json optimize algorithm=lbfgs
//! bayescmd --probe
//! bayescmd sample help-all
//! ```

use super::loader::load_tokens;
use crate::error::Result;
use clap::Parser;
use std::path::PathBuf;

/// Configuration parser and dispatcher for Bayesian inference engines
#[derive(Parser, Debug, Clone, PartialEq)]
#[command(name = "bayescmd")]
#[command(version)]
#[command(about = "Parse inference-engine arguments into a validated configuration and dispatch it")]
pub struct Cli {
    /// Argument file (YAML or JSON); its tokens come before the command line
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Parameter count reported by the dry-run engine
    #[arg(long, default_value = "1")]
    pub num_params: usize,

    /// Config echo format (text, json)
    #[arg(short, long, default_value = "text")]
    pub format: OutputFormat,

    /// Print the self-test probe report and exit
    #[arg(long)]
    pub probe: bool,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Suppress all output except errors
    #[arg(short, long)]
    pub quiet: bool,

    /// Configuration tokens, e.g. `sample num_warmup=10 adapt delta=0.9`
    #[arg(value_name = "TOKENS", trailing_var_arg = true, allow_hyphen_values = true)]
    pub tokens: Vec<String>,
}

/// Config echo format
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!("Unknown output format: {}. Valid formats: text, json", s)),
        }
    }
}

/// Parse CLI arguments from a string slice (for testing)
pub fn parse_args<I, T>(args: I) -> std::result::Result<Cli, clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    Cli::try_parse_from(args)
}

/// Argument-file tokens followed by command-line tokens
pub fn collect_tokens(cli: &Cli) -> Result<Vec<String>> {
    let mut tokens = match &cli.config {
        Some(path) => load_tokens(path)?,
        None => Vec::new(),
    };
    tokens.extend(cli.tokens.iter().cloned());
    Ok(tokens)
}
