//! Builds live configuration nodes from schema declarations
//!
//! Construction checks the structural preconditions the matcher relies on:
//! sibling names are unique, choices have at least one alternative and an
//! in-range default, alternatives are records or flags, and every leaf's
//! default, known-good and known-bad values agree with its rule.

use super::node::{AnyLeaf, Choice, ConfigNode, Flag, Leaf, Record};
use super::scalar::{Rule, Scalar};
use super::schema::Decl;
use std::collections::HashSet;

/// Schema table inconsistency
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchemaError {
    #[error("Duplicate option \"{name}\" under \"{parent}\"")]
    DuplicateName { parent: String, name: String },

    #[error("Choice \"{0}\" has no alternatives")]
    EmptyChoice(String),

    #[error("Choice \"{name}\" default index {default} is out of range")]
    DefaultOutOfRange { name: String, default: usize },

    #[error("Alternative \"{name}\" of choice \"{choice}\" must be a record or a flag")]
    InvalidAlternative { choice: String, name: String },

    #[error("Default value of \"{0}\" is rejected by its own rule")]
    InvalidDefault(String),

    #[error("Known-good value of \"{0}\" is rejected by its own rule")]
    KnownGoodRejected(String),

    #[error("Known-bad value of \"{0}\" is accepted by its own rule")]
    KnownBadAccepted(String),
}

/// Build the nodes declared by `decls` as the top level of a tree
pub fn build(decls: &[Decl]) -> Result<Vec<ConfigNode>, SchemaError> {
    build_siblings("<top>", decls)
}

fn build_siblings(parent: &str, decls: &[Decl]) -> Result<Vec<ConfigNode>, SchemaError> {
    let mut seen = HashSet::new();
    decls
        .iter()
        .map(|decl| {
            if !seen.insert(decl.name()) {
                return Err(SchemaError::DuplicateName {
                    parent: parent.to_string(),
                    name: decl.name().to_string(),
                });
            }
            build_node(decl)
        })
        .collect()
}

fn build_node(decl: &Decl) -> Result<ConfigNode, SchemaError> {
    let node = match *decl {
        Decl::Flag { name, description } => ConfigNode::Flag(Flag::new(name, description)),
        Decl::Bool { name, description, default } => {
            ConfigNode::Leaf(AnyLeaf::Bool(leaf(name, description, default, Rule::Any, !default, None)?))
        }
        Decl::Int { name, description, default, rule, good, bad } => {
            ConfigNode::Leaf(AnyLeaf::Int(leaf(name, description, default, rule, good, bad)?))
        }
        Decl::Long { name, description, default, rule, good, bad } => {
            ConfigNode::Leaf(AnyLeaf::Long(leaf(name, description, default, rule, good, bad)?))
        }
        Decl::UInt { name, description, default, good } => {
            ConfigNode::Leaf(AnyLeaf::UInt(leaf(name, description, default, Rule::Any, good, None)?))
        }
        Decl::Real { name, description, default, rule, good, bad } => {
            ConfigNode::Leaf(AnyLeaf::Real(leaf(name, description, default, rule, good, bad)?))
        }
        Decl::Text { name, description, default, good } => ConfigNode::Leaf(AnyLeaf::Text(leaf(
            name,
            description,
            default.to_string(),
            Rule::Any,
            good.to_string(),
            None,
        )?)),
        Decl::Record { name, description, children } => ConfigNode::Record(Record {
            name: name.to_string(),
            description: description.to_string(),
            children: build_siblings(name, children)?,
        }),
        Decl::Choice { name, description, alternatives, default } => {
            if alternatives.is_empty() {
                return Err(SchemaError::EmptyChoice(name.to_string()));
            }
            if default >= alternatives.len() {
                return Err(SchemaError::DefaultOutOfRange {
                    name: name.to_string(),
                    default,
                });
            }
            if let Some(bad) = alternatives
                .iter()
                .find(|a| !matches!(a, Decl::Record { .. } | Decl::Flag { .. }))
            {
                return Err(SchemaError::InvalidAlternative {
                    choice: name.to_string(),
                    name: bad.name().to_string(),
                });
            }
            ConfigNode::Choice(Choice::new(name, description, build_siblings(name, alternatives)?, default))
        }
    };
    Ok(node)
}

fn leaf<T: Scalar>(
    name: &str,
    description: &str,
    default: T,
    rule: Rule,
    good: T,
    bad: Option<T>,
) -> Result<Leaf<T>, SchemaError> {
    if !rule.check(&default) {
        return Err(SchemaError::InvalidDefault(name.to_string()));
    }
    if !rule.check(&good) {
        return Err(SchemaError::KnownGoodRejected(name.to_string()));
    }
    if bad.as_ref().is_some_and(|b| rule.check(b)) {
        return Err(SchemaError::KnownBadAccepted(name.to_string()));
    }
    Ok(Leaf::new(name, description, default, rule, good, bad))
}
