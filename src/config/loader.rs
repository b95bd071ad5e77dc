//! Argument files
//!
//! A YAML (or JSON, which YAML accepts) document is flattened into the same
//! token grammar the command line uses, so argument files go through the
//! ordinary parser:
//!
//! ```yaml
//! method: sample
//! sample:
//!   num_warmup: 200
//!   adapt:
//!     delta: 0.95
//! data:
//!   file: bernoulli.data.json
//! ```
//!
//! becomes `method=sample sample num_warmup=200 adapt delta=0.95 data
//! file=bernoulli.data.json`. Mapping order is preserved. A null value
//! yields a bare token and a sequence contributes each element in turn.

use crate::error::{Error, Result};
use serde_yaml::Value;
use std::fs;
use std::path::Path;

/// Read an argument file and flatten it into tokens
pub fn load_tokens<P: AsRef<Path>>(path: P) -> Result<Vec<String>> {
    let content = fs::read_to_string(path.as_ref()).map_err(|e| {
        Error::ConfigError(format!(
            "Failed to read argument file {}: {}",
            path.as_ref().display(),
            e
        ))
    })?;
    tokens_from_yaml(&content)
}

/// Flatten a YAML document into tokens
pub fn tokens_from_yaml(content: &str) -> Result<Vec<String>> {
    let document: Value = serde_yaml::from_str(content)
        .map_err(|e| Error::ConfigError(format!("Failed to parse argument file: {}", e)))?;
    let mut tokens = Vec::new();
    flatten(&document, &mut tokens)?;
    Ok(tokens)
}

fn flatten(value: &Value, tokens: &mut Vec<String>) -> Result<()> {
    match value {
        Value::Null => {}
        Value::Mapping(mapping) => {
            for (key, entry) in mapping {
                let key = scalar_text(key)
                    .ok_or_else(|| Error::ConfigError(format!("Argument names must be scalars, found {:?}", key)))?;
                match entry {
                    Value::Null => tokens.push(key),
                    Value::Mapping(_) | Value::Sequence(_) => {
                        tokens.push(key);
                        flatten(entry, tokens)?;
                    }
                    scalar => {
                        let text = scalar_text(scalar)
                            .ok_or_else(|| Error::ConfigError(format!("Unsupported value for {}", key)))?;
                        tokens.push(format!("{key}={text}"));
                    }
                }
            }
        }
        Value::Sequence(items) => {
            for item in items {
                flatten(item, tokens)?;
            }
        }
        Value::Tagged(tagged) => flatten(&tagged.value, tokens)?,
        scalar => {
            if let Some(text) = scalar_text(scalar) {
                tokens.push(text);
            }
        }
    }
    Ok(())
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) => Some(s.clone()),
        _ => None,
    }
}
