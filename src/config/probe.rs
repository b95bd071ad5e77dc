//! Self-test probe harness
//!
//! For every leaf reachable under any alternative, the probe renders the
//! default configuration with that one leaf replaced by its known-good value,
//! and again with its known-bad value when the leaf has one. Parsing the good
//! rendering must succeed and store the value; parsing the bad rendering must
//! fail on exactly that option. The live tree is never touched: each case is
//! rendered from a private copy.

use super::node::{ConfigNode, KnownValue};
use super::parser::{ArgumentTree, UsageError};
use super::render::echo_tokens;
use super::scalar::ScalarValue;
use std::fmt;

/// What parsing a probe case is expected to do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expectation {
    Good,
    Bad,
}

impl fmt::Display for Expectation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expectation::Good => write!(f, "good"),
            Expectation::Bad => write!(f, "bad"),
        }
    }
}

/// One synthetic invocation
#[derive(Debug, Clone, PartialEq)]
pub struct ProbeCase {
    /// Path to the probed leaf, alternatives included
    pub path: Vec<String>,
    pub expect: Expectation,
    pub value: ScalarValue,
    /// Config echo of the default tree with the probed value installed
    pub echo: Vec<String>,
}

impl ProbeCase {
    pub fn qualified_name(&self) -> String {
        self.path.join(".")
    }

    /// Command-line tokens equivalent to [`echo`](Self::echo)
    pub fn tokens(&self) -> Vec<String> {
        echo_tokens(&self.echo)
    }
}

/// A probe case that did not behave as expected
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ProbeFailure {
    #[error("known-good value for {path} was rejected: {error}")]
    GoodRejected { path: String, error: UsageError },

    #[error("known-good value for {path} was not stored (found {found:?})")]
    GoodNotStored { path: String, found: Option<ScalarValue> },

    #[error("known-bad value for {path} was accepted")]
    BadAccepted { path: String },

    #[error("known-bad value for {path} failed with an unrelated error: {error}")]
    WrongError { path: String, error: UsageError },
}

/// Probe harness over a pristine tree
#[derive(Debug, Clone)]
pub struct Probe {
    pristine: ArgumentTree,
}

impl Probe {
    /// Probe the schema of `tree`; the tree itself is copied, never mutated
    pub fn new(tree: &ArgumentTree) -> Self {
        Self {
            pristine: tree.clone(),
        }
    }

    /// All good and bad cases, in schema order
    pub fn cases(&self) -> Vec<ProbeCase> {
        let mut cases = Vec::new();
        for node in self.pristine.nodes() {
            for mut path in node.leaf_paths() {
                path.insert(0, node.name().to_string());
                for expect in [Expectation::Good, Expectation::Bad] {
                    if let Some(case) = self.render_case(&path, expect) {
                        cases.push(case);
                    }
                }
            }
        }
        cases
    }

    fn render_case(&self, path: &[String], expect: Expectation) -> Option<ProbeCase> {
        let which = match expect {
            Expectation::Good => KnownValue::Good,
            Expectation::Bad => KnownValue::Bad,
        };
        let segments: Vec<&str> = path.iter().map(String::as_str).collect();

        let mut scratch = self.pristine.clone();
        let leaf = match scratch.route_mut(&segments)? {
            ConfigNode::Leaf(leaf) => leaf,
            _ => return None,
        };
        if !leaf.install(which) {
            return None;
        }
        let value = leaf.value();

        Some(ProbeCase {
            path: path.to_vec(),
            expect,
            value,
            echo: scratch.echo(""),
        })
    }

    /// Parse a case against a fresh copy of the tree and check the outcome
    pub fn verify(&self, case: &ProbeCase) -> Result<(), ProbeFailure> {
        let mut tree = self.pristine.clone();
        let path = case.qualified_name();
        match (case.expect, tree.parse(case.tokens())) {
            (Expectation::Good, Ok(_)) => {
                let found = tree.value(&path);
                if found.as_ref() == Some(&case.value) {
                    Ok(())
                } else {
                    Err(ProbeFailure::GoodNotStored { path, found })
                }
            }
            (Expectation::Good, Err(error)) => Err(ProbeFailure::GoodRejected { path, error }),
            (Expectation::Bad, Ok(_)) => Err(ProbeFailure::BadAccepted { path }),
            (Expectation::Bad, Err(UsageError::InvalidValue(e))) if e.path == case.path => Ok(()),
            (Expectation::Bad, Err(error)) => Err(ProbeFailure::WrongError { path, error }),
        }
    }

    /// Line-oriented report: a `good` or `bad` label, the echo, a blank line
    pub fn report(&self) -> Vec<String> {
        let mut lines = Vec::new();
        for case in self.cases() {
            lines.push(case.expect.to_string());
            lines.extend(case.echo);
            lines.push(String::new());
        }
        lines
    }
}
