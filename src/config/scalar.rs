//! Typed scalar values and validation rules for leaf options

use serde::Serialize;
use std::fmt;

/// A value held by a leaf option, independent of its static type
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ScalarValue {
    Bool(bool),
    Int(i32),
    Long(i64),
    UInt(u32),
    Real(f64),
    Text(String),
}

impl ScalarValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ScalarValue::Int(v) => Some(f64::from(*v)),
            ScalarValue::Long(v) => Some(*v as f64),
            ScalarValue::UInt(v) => Some(f64::from(*v)),
            ScalarValue::Real(v) => Some(*v),
            ScalarValue::Bool(_) | ScalarValue::Text(_) => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ScalarValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for ScalarValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScalarValue::Bool(v) => write!(f, "{v}"),
            ScalarValue::Int(v) => write!(f, "{v}"),
            ScalarValue::Long(v) => write!(f, "{v}"),
            ScalarValue::UInt(v) => write!(f, "{v}"),
            ScalarValue::Real(v) => write!(f, "{v}"),
            ScalarValue::Text(v) => write!(f, "{v}"),
        }
    }
}

/// Static scalar types a leaf can hold: bool, i32, i64, u32, f64 and String
pub trait Scalar: Clone + PartialEq + fmt::Debug + 'static {
    /// Name shown in help text, e.g. `num_warmup=<int>`
    const TYPE_NAME: &'static str;

    /// Validity text used when the leaf accepts every value of the type
    const ANY_VALIDITY: &'static str = "All";

    /// Convert the value half of a `name=value` token
    fn parse_token(raw: &str) -> Option<Self>;

    fn to_value(&self) -> ScalarValue;

    fn from_value(value: &ScalarValue) -> Option<Self>;

    /// Numeric view used by [`Rule`] checks; `None` for non-numeric types
    fn as_f64(&self) -> Option<f64> {
        self.to_value().as_f64()
    }

    fn render(&self) -> String {
        self.to_value().to_string()
    }
}

impl Scalar for bool {
    const TYPE_NAME: &'static str = "boolean";
    const ANY_VALIDITY: &'static str = "[0, 1]";

    fn parse_token(raw: &str) -> Option<Self> {
        match raw {
            "true" | "1" => Some(true),
            "false" | "0" => Some(false),
            _ => None,
        }
    }

    fn to_value(&self) -> ScalarValue {
        ScalarValue::Bool(*self)
    }

    fn from_value(value: &ScalarValue) -> Option<Self> {
        match value {
            ScalarValue::Bool(v) => Some(*v),
            _ => None,
        }
    }
}

impl Scalar for i32 {
    const TYPE_NAME: &'static str = "int";

    fn parse_token(raw: &str) -> Option<Self> {
        raw.parse().ok()
    }

    fn to_value(&self) -> ScalarValue {
        ScalarValue::Int(*self)
    }

    fn from_value(value: &ScalarValue) -> Option<Self> {
        match value {
            ScalarValue::Int(v) => Some(*v),
            _ => None,
        }
    }
}

impl Scalar for i64 {
    const TYPE_NAME: &'static str = "long long";

    fn parse_token(raw: &str) -> Option<Self> {
        raw.parse().ok()
    }

    fn to_value(&self) -> ScalarValue {
        ScalarValue::Long(*self)
    }

    fn from_value(value: &ScalarValue) -> Option<Self> {
        match value {
            ScalarValue::Long(v) => Some(*v),
            _ => None,
        }
    }
}

impl Scalar for u32 {
    const TYPE_NAME: &'static str = "unsigned int";
    const ANY_VALIDITY: &'static str = "non-negative integer";

    fn parse_token(raw: &str) -> Option<Self> {
        raw.parse().ok()
    }

    fn to_value(&self) -> ScalarValue {
        ScalarValue::UInt(*self)
    }

    fn from_value(value: &ScalarValue) -> Option<Self> {
        match value {
            ScalarValue::UInt(v) => Some(*v),
            _ => None,
        }
    }
}

impl Scalar for f64 {
    const TYPE_NAME: &'static str = "double";

    fn parse_token(raw: &str) -> Option<Self> {
        raw.parse::<f64>().ok().filter(|v| v.is_finite())
    }

    fn to_value(&self) -> ScalarValue {
        ScalarValue::Real(*self)
    }

    fn from_value(value: &ScalarValue) -> Option<Self> {
        match value {
            ScalarValue::Real(v) => Some(*v),
            _ => None,
        }
    }
}

impl Scalar for String {
    const TYPE_NAME: &'static str = "string";

    fn parse_token(raw: &str) -> Option<Self> {
        Some(raw.to_string())
    }

    fn to_value(&self) -> ScalarValue {
        ScalarValue::Text(self.clone())
    }

    fn from_value(value: &ScalarValue) -> Option<Self> {
        value.as_str().map(str::to_string)
    }
}

/// Validation rule attached to a leaf
///
/// Rules are plain data so the schema table can carry them; numeric bounds are
/// compared in `f64`, which is exact for every integer type a leaf can hold.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Rule {
    /// Every value of the type is valid
    Any,
    /// `0 < x`
    Positive,
    /// `0 <= x`
    NonNegative,
    /// `lo < x`
    Above(f64),
    /// `lo < x < hi`
    Open(f64, f64),
    /// `lo <= x <= hi`
    Closed(f64, f64),
    /// `0 < x`, or exactly the sentinel
    PositiveOr(f64),
    /// `lo <= x <= hi`, or exactly the sentinel
    ClosedOr(f64, f64, f64),
}

impl Rule {
    pub fn accepts(&self, x: f64) -> bool {
        match *self {
            Rule::Any => true,
            Rule::Positive => x > 0.0,
            Rule::NonNegative => x >= 0.0,
            Rule::Above(lo) => x > lo,
            Rule::Open(lo, hi) => lo < x && x < hi,
            Rule::Closed(lo, hi) => lo <= x && x <= hi,
            Rule::PositiveOr(sentinel) => x > 0.0 || x == sentinel,
            Rule::ClosedOr(lo, hi, sentinel) => (lo <= x && x <= hi) || x == sentinel,
        }
    }

    /// Check a typed value; non-numeric values only pass [`Rule::Any`]
    pub fn check<T: Scalar>(&self, value: &T) -> bool {
        match value.as_f64() {
            Some(x) => self.accepts(x),
            None => matches!(self, Rule::Any),
        }
    }

    /// Human-readable validity text, e.g. `0 < delta < 1`
    pub fn describe(&self, name: &str) -> Option<String> {
        let text = match *self {
            Rule::Any => return None,
            Rule::Positive => format!("0 < {name}"),
            Rule::NonNegative => format!("0 <= {name}"),
            Rule::Above(lo) => format!("{lo} < {name}"),
            Rule::Open(lo, hi) => format!("{lo} < {name} < {hi}"),
            Rule::Closed(lo, hi) => format!("{lo} <= {name} <= {hi}"),
            Rule::PositiveOr(sentinel) => format!("0 < {name} or {sentinel} for the default"),
            Rule::ClosedOr(lo, hi, sentinel) => {
                format!("{lo} <= {name} <= {hi} or {sentinel} for the default")
            }
        };
        Some(text)
    }
}
