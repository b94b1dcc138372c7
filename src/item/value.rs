//! Attribute values
//!
//! The typed value model stored inside items.

use std::collections::BTreeMap;
use std::fmt;

/// An item's attributes, keyed by attribute name
pub type AttributeMap = BTreeMap<String, AttributeValue>;

/// A single attribute value
///
/// Every length-bearing part (string bytes, set cardinality, list and map
/// cardinality) is limited to 255 by the on-disk encoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttributeValue {
    /// UTF-8 string
    String(String),

    /// Set of strings
    StringSet(Vec<String>),

    /// Decimal number carried in its canonical string form
    Number(String),

    /// Set of numbers
    NumberSet(Vec<String>),

    /// Raw bytes
    Bytes(Vec<u8>),

    /// Set of byte strings
    BytesSet(Vec<Vec<u8>>),

    /// Boolean
    Bool(bool),

    /// Null marker
    Null,

    /// Ordered list of values
    List(Vec<AttributeValue>),

    /// Nested attribute map
    Map(AttributeMap),
}

impl AttributeValue {
    /// Short type name, used in error messages and the CLI
    pub fn type_name(&self) -> &'static str {
        match self {
            AttributeValue::String(_) => "S",
            AttributeValue::StringSet(_) => "SS",
            AttributeValue::Number(_) => "N",
            AttributeValue::NumberSet(_) => "NS",
            AttributeValue::Bytes(_) => "B",
            AttributeValue::BytesSet(_) => "BS",
            AttributeValue::Bool(_) => "BOOL",
            AttributeValue::Null => "NULL",
            AttributeValue::List(_) => "L",
            AttributeValue::Map(_) => "M",
        }
    }

    /// The string payload, if this is a String value
    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttributeValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Shorthand for a String value
    pub fn string(s: impl Into<String>) -> Self {
        AttributeValue::String(s.into())
    }

    /// Shorthand for a Number value
    pub fn number(n: impl ToString) -> Self {
        AttributeValue::Number(n.to_string())
    }
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttributeValue::String(s) => write!(f, "{:?}", s),
            AttributeValue::Number(n) => write!(f, "{}", n),
            AttributeValue::StringSet(set) => write!(f, "<<{}>>", quoted(set).join(", ")),
            AttributeValue::NumberSet(set) => write!(f, "<<{}>>", set.join(", ")),
            AttributeValue::Bytes(b) => write!(f, "0x{}", hex::encode(b)),
            AttributeValue::BytesSet(set) => {
                let parts: Vec<String> = set.iter().map(|b| format!("0x{}", hex::encode(b))).collect();
                write!(f, "<<{}>>", parts.join(", "))
            }
            AttributeValue::Bool(b) => write!(f, "{}", b),
            AttributeValue::Null => write!(f, "null"),
            AttributeValue::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            AttributeValue::Map(map) => {
                write!(f, "{{")?;
                for (i, (name, value)) in map.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", name, value)?;
                }
                write!(f, "}}")
            }
        }
    }
}

fn quoted(set: &[String]) -> Vec<String> {
    set.iter().map(|s| format!("{:?}", s)).collect()
}
