//! Token matching
//!
//! Each node decides whether the next unconsumed token belongs to it. Nodes
//! that have been entered (records and choice alternatives) keep offering
//! tokens to their children until none claims the top token, at which point
//! control returns to the enclosing node.

use super::node::{Choice, ConfigNode, Record};

/// Unconsumed command-line tokens; popping yields them left to right
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenStack {
    reversed: Vec<String>,
}

impl TokenStack {
    pub fn new<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut reversed: Vec<String> = tokens.into_iter().map(Into::into).collect();
        reversed.reverse();
        Self { reversed }
    }

    pub fn peek(&self) -> Option<&str> {
        self.reversed.last().map(String::as_str)
    }

    pub fn pop(&mut self) -> Option<String> {
        self.reversed.pop()
    }

    pub fn clear(&mut self) {
        self.reversed.clear();
    }

    pub fn len(&self) -> usize {
        self.reversed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reversed.is_empty()
    }
}

/// Split a token on its first `=` into `(name, value)`
pub fn split_token(token: &str) -> (&str, Option<&str>) {
    match token.split_once('=') {
        Some((name, value)) => (name, Some(value)),
        None => (token, None),
    }
}

/// A matched option whose value failed conversion or validation
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{value} is not a valid value for \"{}\"", .path.join("."))]
pub struct InvalidValue {
    pub value: String,
    /// Names from the outermost node down to the rejecting option
    pub path: Vec<String>,
    pub validity: String,
}

impl InvalidValue {
    fn new(value: impl Into<String>, name: &str, validity: String) -> Self {
        Self {
            value: value.into(),
            path: vec![name.to_string()],
            validity,
        }
    }

    /// Name of the option that rejected the value
    pub fn name(&self) -> &str {
        self.path.last().map(String::as_str).unwrap_or_default()
    }

    pub fn qualified_name(&self) -> String {
        self.path.join(".")
    }

    fn within(mut self, parent: &str) -> Self {
        self.path.insert(0, parent.to_string());
        self
    }
}

/// Result of offering the top token to a node
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseOutcome {
    Consumed,
    NotMine,
    Invalid(InvalidValue),
    /// Help text was written and the remaining tokens were discarded
    HelpRequested,
}

impl ParseOutcome {
    fn within(self, parent: &str) -> Self {
        match self {
            ParseOutcome::Invalid(e) => ParseOutcome::Invalid(e.within(parent)),
            other => other,
        }
    }
}

/// The `help` and `help-all` pseudo-tokens
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HelpRequest {
    Brief,
    All,
}

impl HelpRequest {
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "help" => Some(HelpRequest::Brief),
            "help-all" => Some(HelpRequest::All),
            _ => None,
        }
    }

    pub fn recursive(self) -> bool {
        matches!(self, HelpRequest::All)
    }
}

impl ConfigNode {
    /// Offer the top token to this node, consuming it and recursing on a match
    pub fn match_and_consume(&mut self, tokens: &mut TokenStack, out: &mut Vec<String>) -> ParseOutcome {
        let Some(top) = tokens.peek().map(str::to_string) else {
            return ParseOutcome::NotMine;
        };
        match self {
            ConfigNode::Flag(flag) => {
                if top != flag.name {
                    return ParseOutcome::NotMine;
                }
                tokens.pop();
                flag.present = true;
                ParseOutcome::Consumed
            }
            ConfigNode::Leaf(leaf) => {
                let (name, value) = split_token(&top);
                if name != leaf.name() {
                    return ParseOutcome::NotMine;
                }
                tokens.pop();
                let value = value.unwrap_or_default();
                if leaf.try_set(value) {
                    ParseOutcome::Consumed
                } else {
                    ParseOutcome::Invalid(InvalidValue::new(value, name, leaf.validity()))
                }
            }
            ConfigNode::Record(record) => {
                if top != record.name {
                    return ParseOutcome::NotMine;
                }
                tokens.pop();
                match record.consume_children(tokens, out) {
                    ParseOutcome::NotMine => ParseOutcome::Consumed,
                    other => other,
                }
            }
            ConfigNode::Choice(choice) => choice.match_and_consume(&top, tokens, out),
        }
    }
}

impl Record {
    /// Offer tokens to the children until the stack stalls
    ///
    /// Returns `Consumed` if at least one token was claimed and `NotMine` if
    /// none was. Invalid values come back qualified with this record's name.
    pub fn consume_children(&mut self, tokens: &mut TokenStack, out: &mut Vec<String>) -> ParseOutcome {
        let mut consumed_any = false;
        while let Some(top) = tokens.peek() {
            if let Some(help) = HelpRequest::from_token(top) {
                self.print_help(0, help.recursive(), out);
                tokens.clear();
                return ParseOutcome::HelpRequested;
            }

            let mut claimed = false;
            for child in &mut self.children {
                match child.match_and_consume(tokens, out) {
                    ParseOutcome::Consumed => {
                        claimed = true;
                        break;
                    }
                    ParseOutcome::NotMine => {}
                    other => return other.within(&self.name),
                }
            }
            if !claimed {
                break;
            }
            consumed_any = true;
        }

        if consumed_any {
            ParseOutcome::Consumed
        } else {
            ParseOutcome::NotMine
        }
    }
}

impl Choice {
    fn match_and_consume(&mut self, top: &str, tokens: &mut TokenStack, out: &mut Vec<String>) -> ParseOutcome {
        let (name, value) = split_token(top);

        // `algorithm=hmc`
        if name == self.name {
            tokens.pop();
            let value = value.unwrap_or_default();
            return match self.position(value) {
                Some(index) => {
                    self.select(index);
                    self.enter_active(tokens, out)
                }
                None => ParseOutcome::Invalid(InvalidValue::new(
                    value,
                    name,
                    self.alternative_names().join(", "),
                )),
            };
        }

        // bare `hmc`
        if value.is_none() {
            if let Some(index) = self.position(name) {
                tokens.pop();
                self.select(index);
                return self.enter_active(tokens, out);
            }
        }

        // terse form: options of the active alternative without naming it
        let outcome = match self.active_alternative_mut() {
            ConfigNode::Record(record) => record.consume_children(tokens, out),
            _ => ParseOutcome::NotMine,
        };
        if outcome == ParseOutcome::Consumed {
            self.mark_selected();
        }
        outcome.within(&self.name)
    }

    fn enter_active(&mut self, tokens: &mut TokenStack, out: &mut Vec<String>) -> ParseOutcome {
        let outcome = match self.active_alternative_mut() {
            ConfigNode::Record(record) => record.consume_children(tokens, out),
            _ => ParseOutcome::Consumed,
        };
        match outcome {
            ParseOutcome::NotMine => ParseOutcome::Consumed,
            other => other.within(&self.name),
        }
    }
}
