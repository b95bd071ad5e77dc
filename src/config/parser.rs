//! Top-level argument parsing
//!
//! [`ArgumentTree`] owns the top-level node list (the `method` choice first)
//! and drives a full parse: help pseudo-tokens, per-node matching, unknown
//! token diagnostics and the final method check. Help and usage text is
//! buffered in the tree; nothing is printed while parsing.

use super::builder::{build, SchemaError};
use super::matcher::{split_token, HelpRequest, InvalidValue, ParseOutcome, TokenStack};
use super::node::{split_path, Choice, ConfigNode};
use super::render::json_fields;
use super::scalar::{Scalar, ScalarValue};
use super::schema::{Decl, METHOD, TOP_LEVEL};
use serde_json::Value;
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

/// Last line of every usage diagnostic
pub const PARSE_FAILURE: &str = "Failed to parse arguments, terminating";

const DEFAULT_PROGRAM: &str = "bayescmd";

/// Why a command line could not be parsed
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UsageError {
    #[error("{token} is either mistyped or misplaced.")]
    UnknownToken { token: String, suggestions: Vec<String> },

    #[error(transparent)]
    InvalidValue(#[from] InvalidValue),

    #[error("A method must be specified!")]
    MissingMethod,
}

impl UsageError {
    /// Full diagnostic as printed to the user
    pub fn lines(&self) -> Vec<String> {
        let mut lines = vec![self.to_string()];
        match self {
            UsageError::UnknownToken { suggestions, .. } if !suggestions.is_empty() => {
                lines.push("Perhaps you meant one of the following valid configurations?".to_string());
                lines.extend(suggestions.iter().map(|s| format!("  {s}")));
            }
            UsageError::InvalidValue(e) => lines.push(format!("  Valid values: {}", e.validity)),
            _ => {}
        }
        lines.push(PARSE_FAILURE.to_string());
        lines
    }
}

/// Successful parse result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseSummary {
    /// The tree holds a complete configuration
    Configured,
    /// Help was requested; the text is in [`ArgumentTree::help_text`]
    Help,
}

/// A parsed (or parseable) configuration tree
#[derive(Debug, Clone, PartialEq)]
pub struct ArgumentTree {
    nodes: Vec<ConfigNode>,
    program: String,
    help: Vec<String>,
}

impl ArgumentTree {
    /// Tree for the compiled-in schema
    pub fn standard() -> Result<Self, SchemaError> {
        Self::from_decls(TOP_LEVEL)
    }

    pub fn from_decls(decls: &[Decl]) -> Result<Self, SchemaError> {
        Ok(Self {
            nodes: build(decls)?,
            program: DEFAULT_PROGRAM.to_string(),
            help: Vec::new(),
        })
    }

    /// Program name shown in usage text
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    pub fn nodes(&self) -> &[ConfigNode] {
        &self.nodes
    }

    /// Help or usage text produced by the last parse
    pub fn help_text(&self) -> &[String] {
        &self.help
    }

    /// Parse `tokens` into the tree, left to right, stopping at the first error
    pub fn parse<I, S>(&mut self, tokens: I) -> Result<ParseSummary, UsageError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut stack = TokenStack::new(tokens);
        self.help.clear();

        if stack.is_empty() {
            self.help = self.usage();
            return Err(UsageError::MissingMethod);
        }

        while let Some(top) = stack.peek() {
            if let Some(help) = HelpRequest::from_token(top) {
                self.help = match help {
                    HelpRequest::Brief => self.usage(),
                    HelpRequest::All => self.full_help(),
                };
                stack.clear();
                return Ok(ParseSummary::Help);
            }

            let mut claimed = false;
            for node in &mut self.nodes {
                match node.match_and_consume(&mut stack, &mut self.help) {
                    ParseOutcome::Consumed => {
                        claimed = true;
                        break;
                    }
                    ParseOutcome::NotMine => {}
                    ParseOutcome::Invalid(e) => return Err(e.into()),
                    ParseOutcome::HelpRequested => return Ok(ParseSummary::Help),
                }
            }

            if !claimed {
                let token = stack.pop().unwrap_or_default();
                let suggestions = self.find_paths(split_token(&token).0);
                return Err(UsageError::UnknownToken { token, suggestions });
            }
        }

        if !self.method_choice().is_some_and(Choice::was_selected) {
            return Err(UsageError::MissingMethod);
        }
        Ok(ParseSummary::Configured)
    }

    fn method_choice(&self) -> Option<&Choice> {
        self.nodes
            .iter()
            .filter_map(ConfigNode::as_choice)
            .find(|c| c.name == METHOD)
    }

    /// Name of the active method alternative
    pub fn method(&self) -> Option<&str> {
        self.method_choice().map(Choice::active_name)
    }

    pub fn lookup_path(&self, path: &[&str]) -> Option<&ConfigNode> {
        let (head, rest) = path.split_first()?;
        self.nodes.iter().find(|n| n.name() == *head)?.lookup(rest)
    }

    /// Resolve a dotted path such as `method.sample.adapt.delta`
    pub fn lookup(&self, path: &str) -> Option<&ConfigNode> {
        self.lookup_path(&split_path(path))
    }

    /// Like [`lookup`](Self::lookup) but selecting alternatives along the way
    pub(crate) fn route_mut(&mut self, path: &[&str]) -> Option<&mut ConfigNode> {
        let (head, rest) = path.split_first()?;
        self.nodes.iter_mut().find(|n| n.name() == *head)?.route_mut(rest)
    }

    /// Current value of the leaf at `path`
    pub fn value(&self, path: &str) -> Option<ScalarValue> {
        self.lookup(path)?.as_leaf().map(|leaf| leaf.value())
    }

    /// Typed value of the leaf at `path`; `None` on a missing path or type mismatch
    pub fn get<T: Scalar>(&self, path: &str) -> Option<T> {
        T::from_value(&self.value(path)?)
    }

    /// Active alternative of the choice at `path`
    pub fn active(&self, path: &str) -> Option<&str> {
        self.lookup(path)?.as_choice().map(Choice::active_name)
    }

    /// Config echo: indented `name = value` lines
    pub fn echo(&self, prefix: &str) -> Vec<String> {
        let mut out = Vec::new();
        for node in &self.nodes {
            node.print(0, prefix, &mut out);
        }
        out
    }

    /// Active configuration as nested JSON objects
    pub fn to_json(&self) -> Value {
        Value::Object(json_fields(&self.nodes))
    }

    /// Write the JSON echo next to `output.file`, as `<stem>_config.json`
    pub fn save_config(&self) -> crate::error::Result<PathBuf> {
        let path = config_path(&self.get::<String>("output.file").unwrap_or_default());
        let file = File::create(&path)?;
        serde_json::to_writer_pretty(file, &self.to_json()).map_err(io::Error::from)?;
        tracing::info!(path = %path.display(), "saved configuration");
        Ok(path)
    }

    /// Token sequences that would reach an option called `name`
    pub fn find_paths(&self, name: &str) -> Vec<String> {
        let mut found = Vec::new();
        for node in &self.nodes {
            node.find_paths(name, "", &mut found);
        }
        found
    }

    /// Usage overview printed for a bare `help`
    pub fn usage(&self) -> Vec<String> {
        let program = &self.program;
        let mut lines = vec![
            format!("Usage: {program} <arg1> <subarg1_1> ... <subarg1_m> ... <arg_n> <subarg_n_1> ... <subarg_n_m>"),
            String::new(),
        ];

        if let Some(method) = self.method_choice() {
            lines.push("Begin by selecting amongst the following inference methods and diagnostics,".to_string());
            lines.extend(
                method
                    .alternatives
                    .iter()
                    .map(|alt| overview_line(alt.name(), alt.description())),
            );
            lines.push(String::new());
        }

        lines.push("Or see help information with".to_string());
        lines.push(overview_line("help", "Prints help"));
        lines.push(overview_line("help-all", "Prints entire argument tree"));
        lines.push(String::new());

        lines.push("Additional configuration available by specifying".to_string());
        lines.extend(
            self.nodes
                .iter()
                .filter(|n| n.name() != METHOD)
                .map(|n| overview_line(n.name(), n.description())),
        );
        lines.push(String::new());

        lines.push(format!("See {program} <arg1> [ help | help-all ]"));
        lines.push("for details on individual arguments.".to_string());
        lines.push(String::new());
        lines
    }

    /// Help for the whole tree, printed for a bare `help-all`
    pub fn full_help(&self) -> Vec<String> {
        let mut lines = vec![format!("Usage: {} <arg1> <subarg1_1> ... <subarg1_m> ...", self.program), String::new()];
        for node in &self.nodes {
            node.print_help(1, true, &mut lines);
        }
        lines
    }
}

/// `output.csv` becomes `output_config.json` in the same directory
pub fn config_path(output_file: &str) -> PathBuf {
    let output = Path::new(output_file);
    let stem = output.file_stem().and_then(|s| s.to_str()).unwrap_or("output");
    output.with_file_name(format!("{stem}_config.json"))
}

fn overview_line(name: &str, description: &str) -> String {
    format!("  {name:<20}  {description}")
}
