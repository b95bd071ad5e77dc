//! Bayescmd CLI
//!
//! Parses inference-engine arguments, echoes the resulting configuration and
//! dispatches it to the dry-run engine.
//!
//! # Usage
//!
//! ```bash
//! # Sample with a tighter acceptance target
//! bayescmd sample num_warmup=500 adapt delta=0.95
//!
//! # Argument file first, command line after
//! bayescmd --config args.yaml output file=run1.csv
//!
//! # Echo as JSON
//! bayescmd --format json optimize algorithm=lbfgs
//!
//! # Self-test every option's known-good and known-bad values
//! bayescmd --probe
//! ```

use bayescmd::config::{collect_tokens, ArgumentTree, Cli, OutputFormat, ParseSummary, Probe};
use bayescmd::dispatch::{dispatch, DryRunEngine};
use bayescmd::{Error, ErrorCode, Result};
use clap::Parser;
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(&cli);

    let code = match run(&cli) {
        Ok(code) => code,
        Err(Error::Usage(e)) => {
            for line in e.lines() {
                eprintln!("{line}");
            }
            ErrorCode::Usage
        }
        Err(e) => {
            eprintln!("Error: {e}");
            e.code()
        }
    };
    code.into()
}

fn init_tracing(cli: &Cli) {
    let level = if cli.quiet {
        "error"
    } else if cli.verbose {
        "debug"
    } else {
        "warn"
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: &Cli) -> Result<ErrorCode> {
    let mut tree = ArgumentTree::standard().map_err(|e| Error::ConfigError(e.to_string()))?;

    if cli.probe {
        for line in Probe::new(&tree).report() {
            println!("{line}");
        }
        return Ok(ErrorCode::Ok);
    }

    let tokens = collect_tokens(cli)?;
    tracing::debug!(count = tokens.len(), "collected argument tokens");

    let parsed = tree.parse(tokens);
    for line in tree.help_text() {
        println!("{line}");
    }
    if parsed? == ParseSummary::Help {
        return Ok(ErrorCode::Ok);
    }

    if !cli.quiet {
        match cli.format {
            OutputFormat::Text => {
                for line in tree.echo("") {
                    println!("{line}");
                }
            }
            OutputFormat::Json => {
                let json = serde_json::to_string_pretty(&tree.to_json()).map_err(std::io::Error::from)?;
                println!("{json}");
            }
        }
    }

    if tree.get::<bool>("output.save_cmdstan_config").unwrap_or(false) {
        tree.save_config()?;
    }

    let mut engine = DryRunEngine::new(cli.num_params);
    dispatch(&tree, &mut engine)
}
