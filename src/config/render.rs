//! Text and JSON rendering of the configuration tree
//!
//! Three renderings share the tree walk:
//!
//! - config echo: indented `name = value` lines, `(Default)` on untouched values
//! - help text: per-option usage, valid values and defaults
//! - JSON echo: nested objects mirroring the active configuration

use super::node::{AnyLeaf, Choice, ConfigNode, Flag, Record};
use super::scalar::ScalarValue;
use serde_json::{Map, Value};

const INDENT: usize = 2;

fn indent(depth: usize) -> String {
    " ".repeat(INDENT * depth)
}

const DEFAULT_MARKER: &str = " (Default)";

fn default_marker(is_default: bool) -> &'static str {
    if is_default {
        DEFAULT_MARKER
    } else {
        ""
    }
}

impl ConfigNode {
    /// Append config-echo lines for this node and its active subtree
    pub fn print(&self, depth: usize, prefix: &str, out: &mut Vec<String>) {
        match self {
            ConfigNode::Flag(flag) => {
                if flag.present {
                    out.push(format!("{prefix}{}{}", indent(depth), flag.name));
                }
            }
            ConfigNode::Leaf(leaf) => leaf.print(depth, prefix, out),
            ConfigNode::Record(record) => record.print(depth, prefix, out),
            ConfigNode::Choice(choice) => choice.print(depth, prefix, out),
        }
    }

    /// Append help text for this node, descending into children on `recurse`
    pub fn print_help(&self, depth: usize, recurse: bool, out: &mut Vec<String>) {
        match self {
            ConfigNode::Flag(flag) => flag.print_help(depth, out),
            ConfigNode::Leaf(leaf) => leaf.print_help(depth, out),
            ConfigNode::Record(record) => record.print_help(depth, recurse, out),
            ConfigNode::Choice(choice) => choice.print_help(depth, recurse, out),
        }
    }

    /// Fully qualified token sequences that would reach an option called `name`
    ///
    /// Every alternative is searched, not only the active one, so suggestions
    /// cover options the user may have meant under a different selection.
    pub fn find_paths(&self, name: &str, prefix: &str, found: &mut Vec<String>) {
        match self {
            ConfigNode::Flag(flag) => {
                if flag.name == name {
                    found.push(format!("{prefix}{}", flag.name));
                }
            }
            ConfigNode::Leaf(leaf) => {
                if leaf.name() == name {
                    found.push(format!("{prefix}{}=<{}>", leaf.name(), leaf.type_name()));
                }
            }
            ConfigNode::Record(record) => {
                if record.name == name {
                    found.push(format!("{prefix}{}", record.name));
                }
                let nested = format!("{prefix}{} ", record.name);
                for child in &record.children {
                    child.find_paths(name, &nested, found);
                }
            }
            ConfigNode::Choice(choice) => {
                if choice.name == name {
                    found.push(format!("{prefix}{}=<list element>", choice.name));
                }
                let nested = format!("{prefix}{}=", choice.name);
                for alternative in &choice.alternatives {
                    alternative.find_paths(name, &nested, found);
                }
            }
        }
    }

    /// Add this node's JSON echo to `fields`
    pub fn write_json(&self, fields: &mut Map<String, Value>) {
        match self {
            ConfigNode::Flag(flag) => {
                if flag.present {
                    fields.insert(flag.name.clone(), Value::Bool(true));
                }
            }
            ConfigNode::Leaf(leaf) => {
                fields.insert(leaf.name().to_string(), scalar_json(&leaf.value()));
            }
            ConfigNode::Record(record) => {
                fields.insert(record.name.clone(), Value::Object(json_fields(&record.children)));
            }
            ConfigNode::Choice(choice) => {
                let mut body = Map::new();
                body.insert("value".to_string(), Value::String(choice.active_name().to_string()));
                if let ConfigNode::Record(alternative) = choice.active_alternative() {
                    body.insert(
                        alternative.name.clone(),
                        Value::Object(json_fields(&alternative.children)),
                    );
                }
                fields.insert(choice.name.clone(), Value::Object(body));
            }
        }
    }
}

/// JSON object holding the echo of every node in `nodes`
pub fn json_fields(nodes: &[ConfigNode]) -> Map<String, Value> {
    let mut fields = Map::new();
    for node in nodes {
        node.write_json(&mut fields);
    }
    fields
}

fn scalar_json(value: &ScalarValue) -> Value {
    match value {
        ScalarValue::Bool(v) => Value::Bool(*v),
        ScalarValue::Int(v) => Value::from(*v),
        ScalarValue::Long(v) => Value::from(*v),
        ScalarValue::UInt(v) => Value::from(*v),
        ScalarValue::Real(v) => Value::from(*v),
        ScalarValue::Text(v) => Value::String(v.clone()),
    }
}

impl AnyLeaf {
    fn print(&self, depth: usize, prefix: &str, out: &mut Vec<String>) {
        out.push(format!(
            "{prefix}{}{} = {}{}",
            indent(depth),
            self.name(),
            self.value(),
            default_marker(self.is_default())
        ));
    }

    fn print_help(&self, depth: usize, out: &mut Vec<String>) {
        let pad = indent(depth);
        let sub = indent(1);
        out.push(format!("{pad}{}=<{}>", self.name(), self.type_name()));
        out.push(format!("{pad}{sub}{}", self.description()));
        out.push(format!("{pad}{sub}Valid values: {}", self.validity()));
        out.push(format!("{pad}{sub}Defaults to {}", self.default_value()));
        out.push(String::new());
    }
}

impl Flag {
    fn print_help(&self, depth: usize, out: &mut Vec<String>) {
        let pad = indent(depth);
        out.push(format!("{pad}{}", self.name));
        out.push(format!("{pad}{}{}", indent(1), self.description));
        out.push(String::new());
    }
}

impl Record {
    fn print(&self, depth: usize, prefix: &str, out: &mut Vec<String>) {
        out.push(format!("{prefix}{}{}", indent(depth), self.name));
        for child in &self.children {
            child.print(depth + 1, prefix, out);
        }
    }

    pub fn print_help(&self, depth: usize, recurse: bool, out: &mut Vec<String>) {
        let pad = indent(depth);
        let sub = indent(1);
        out.push(format!("{pad}{}", self.name));
        out.push(format!("{pad}{sub}{}", self.description));
        if self.children.is_empty() {
            out.push(String::new());
            return;
        }
        let names: Vec<&str> = self.children.iter().map(ConfigNode::name).collect();
        out.push(format!("{pad}{sub}Valid subarguments: {}", names.join(", ")));
        out.push(String::new());
        if recurse {
            for child in &self.children {
                child.print_help(depth + 1, true, out);
            }
        }
    }
}

impl Choice {
    fn print(&self, depth: usize, prefix: &str, out: &mut Vec<String>) {
        out.push(format!(
            "{prefix}{}{} = {}{}",
            indent(depth),
            self.name,
            self.active_name(),
            default_marker(self.is_default())
        ));
        // alternatives without sub-options are fully described by the line above
        if let ConfigNode::Record(alternative) = self.active_alternative() {
            alternative.print(depth + 1, prefix, out);
        }
    }

    fn print_help(&self, depth: usize, recurse: bool, out: &mut Vec<String>) {
        let pad = indent(depth);
        let sub = indent(1);
        out.push(format!("{pad}{}=<list element>", self.name));
        out.push(format!("{pad}{sub}{}", self.description));
        out.push(format!("{pad}{sub}Valid values: {}", self.alternative_names().join(", ")));
        out.push(format!("{pad}{sub}Defaults to {}", self.default_name()));
        out.push(String::new());
        if recurse {
            for alternative in &self.alternatives {
                alternative.print_help(depth + 1, true, out);
            }
        }
    }
}

/// Turn config-echo lines back into command-line tokens
///
/// `name = value (Default)` becomes `name=value` and a bare `name` line stays
/// a bare token, so the echo of a parsed tree can be parsed again.
pub fn echo_tokens<S: AsRef<str>>(lines: &[S]) -> Vec<String> {
    lines
        .iter()
        .filter_map(|line| {
            let line = line.as_ref().trim();
            let line = line.strip_suffix(DEFAULT_MARKER).unwrap_or(line).trim_end();
            if line.is_empty() {
                return None;
            }
            Some(match line.split_once(" =") {
                Some((name, value)) => format!("{}={}", name.trim(), value.trim()),
                None => line.to_string(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::node::Leaf;
    use crate::config::scalar::Rule;

    fn adapt() -> ConfigNode {
        ConfigNode::Record(Record {
            name: "adapt".to_string(),
            description: "Warmup Adaptation".to_string(),
            children: vec![
                ConfigNode::Leaf(AnyLeaf::Bool(Leaf::new("engaged", "Adaptation engaged?", true, Rule::Any, true, None))),
                ConfigNode::Leaf(AnyLeaf::Real(Leaf::new(
                    "delta",
                    "Adaptation target acceptance statistic",
                    0.8,
                    Rule::Open(0.0, 1.0),
                    0.5,
                    Some(1.5),
                ))),
            ],
        })
    }

    fn metric() -> ConfigNode {
        ConfigNode::Choice(Choice::new(
            "metric",
            "Geometry of base manifold",
            vec![
                ConfigNode::Flag(Flag::new("unit_e", "Euclidean manifold with unit metric")),
                ConfigNode::Flag(Flag::new("diag_e", "Euclidean manifold with diag metric")),
            ],
            1,
        ))
    }

    #[test]
    fn test_echo_marks_defaults() {
        let mut node = adapt();
        if let Some(ConfigNode::Leaf(leaf)) = node.lookup_mut(&["delta"]) {
            assert!(leaf.try_set("0.95"));
        }
        let mut out = Vec::new();
        node.print(1, "", &mut out);
        assert_eq!(out, vec!["  adapt", "    engaged = true (Default)", "    delta = 0.95"]);
    }

    #[test]
    fn test_echo_prefix() {
        let mut out = Vec::new();
        metric().print(0, "# ", &mut out);
        assert_eq!(out, vec!["# metric = diag_e (Default)"]);
    }

    #[test]
    fn test_leaf_help() {
        let mut out = Vec::new();
        adapt().lookup(&["delta"]).into_iter().for_each(|n| n.print_help(0, false, &mut out));
        assert_eq!(
            out,
            vec![
                "delta=<double>",
                "  Adaptation target acceptance statistic",
                "  Valid values: 0 < delta < 1",
                "  Defaults to 0.8",
                "",
            ]
        );
    }

    #[test]
    fn test_record_help_recursion() {
        let mut brief = Vec::new();
        adapt().print_help(0, false, &mut brief);
        assert_eq!(brief[2], "  Valid subarguments: engaged, delta");
        assert_eq!(brief.len(), 4);

        let mut full = Vec::new();
        adapt().print_help(0, true, &mut full);
        assert!(full.iter().any(|l| l == "  engaged=<boolean>"));
        assert!(full.iter().any(|l| l == "    Valid values: [0, 1]"));
    }

    #[test]
    fn test_choice_help() {
        let mut out = Vec::new();
        metric().print_help(0, false, &mut out);
        assert_eq!(out[0], "metric=<list element>");
        assert_eq!(out[2], "  Valid values: unit_e, diag_e");
        assert_eq!(out[3], "  Defaults to diag_e");
    }

    #[test]
    fn test_find_paths_through_alternatives() {
        let hmc = ConfigNode::Record(Record {
            name: "hmc".to_string(),
            description: String::new(),
            children: vec![metric(), adapt()],
        });
        let algorithm = ConfigNode::Choice(Choice::new("algorithm", "", vec![hmc], 0));
        let mut found = Vec::new();
        algorithm.find_paths("delta", "method=sample ", &mut found);
        assert_eq!(found, vec!["method=sample algorithm=hmc adapt delta=<double>"]);
    }

    #[test]
    fn test_json_echo() {
        let hmc = ConfigNode::Record(Record {
            name: "hmc".to_string(),
            description: String::new(),
            children: vec![metric()],
        });
        let algorithm = ConfigNode::Choice(Choice::new("algorithm", "", vec![hmc], 0));
        let fields = json_fields(&[algorithm, adapt()]);
        let json = Value::Object(fields);
        assert_eq!(json["algorithm"]["value"], "hmc");
        assert_eq!(json["algorithm"]["hmc"]["metric"]["value"], "diag_e");
        assert_eq!(json["adapt"]["engaged"], true);
        assert_eq!(json["adapt"]["delta"], 0.8);
    }

    #[test]
    fn test_echo_tokens() {
        let lines = ["method = sample (Default)", "  sample", "    file = ", "    init = my init.json"];
        assert_eq!(echo_tokens(&lines), vec!["method=sample", "sample", "file=", "init=my init.json"]);
    }

    #[test]
    fn test_echo_tokens_keeps_marker_like_values() {
        let lines = ["    file = x(Default)", "    file = x(Default) (Default)", "    file =  (Default)"];
        assert_eq!(echo_tokens(&lines), vec!["file=x(Default)", "file=x(Default)", "file="]);
    }
}
