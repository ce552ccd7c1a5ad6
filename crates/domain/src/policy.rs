use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};

use nomadgate_core::PolicyPath;
use regex::Regex;
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};
use thiserror::Error;

/// First location at which a document failed a policy check.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("policy violation at {path}: {reason}")]
pub struct PolicyViolation {
    path: PolicyPath,
    reason: String,
}

impl PolicyViolation {
    /// Creates a violation for the given path.
    #[must_use]
    pub fn new(path: PolicyPath, reason: impl Into<String>) -> Self {
        Self {
            path,
            reason: reason.into(),
        }
    }

    /// Returns the offending dotted path.
    #[must_use]
    pub fn path(&self) -> &PolicyPath {
        &self.path
    }

    /// Returns a human-readable explanation.
    #[must_use]
    pub fn reason(&self) -> &str {
        self.reason.as_str()
    }
}

/// Variant tag of a policy node, compared by the template validator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PolicyKind {
    /// Nested key/value map.
    Map,
    /// Array holding at most one exemplar.
    Array,
    /// String leaf.
    String,
    /// Integer leaf.
    Integer,
}

impl PolicyKind {
    /// Returns the stable label for this kind.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Map => "map",
            Self::Array => "array",
            Self::String => "string",
            Self::Integer => "integer",
        }
    }
}

impl Display for PolicyKind {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// String policy leaf, compiled once as a regex anchored at the start of the value.
#[derive(Debug, Clone)]
pub struct PolicyPattern {
    source: String,
    regex: Regex,
}

impl PolicyPattern {
    /// Compiles `source` with an implicit `^` anchor.
    pub fn new(source: impl Into<String>) -> Result<Self, regex::Error> {
        let source = source.into();
        let regex = Regex::new(&format!("^(?:{source})"))?;
        Ok(Self { source, regex })
    }

    /// Returns the pattern as written.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.source.as_str()
    }

    /// Returns whether `text` starts with a match.
    #[must_use]
    pub fn is_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }
}

impl PartialEq for PolicyPattern {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

impl Eq for PolicyPattern {}

impl Serialize for PolicyPattern {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.source)
    }
}

/// Declarative policy tree.
///
/// String leaves are regular expressions when matched against a job descriptor
/// and integer leaves require exact equality. Map keys iterate in sorted order,
/// so the first reported violation is deterministic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum PolicyDoc {
    /// Nested key/value map.
    Map(BTreeMap<String, PolicyDoc>),
    /// Array of exemplars.
    Array(Vec<PolicyDoc>),
    /// Regex pattern leaf.
    Pattern(PolicyPattern),
    /// Exact integer leaf.
    Exact(i64),
}

impl PolicyDoc {
    /// Converts a JSON value into a policy tree.
    ///
    /// `null`, booleans, non-integer numbers and strings that are not valid
    /// regular expressions are rejected at their location.
    pub fn from_json(value: &Value) -> Result<Self, PolicyViolation> {
        Self::from_json_at(value, &PolicyPath::root())
    }

    fn from_json_at(value: &Value, path: &PolicyPath) -> Result<Self, PolicyViolation> {
        match value {
            Value::Object(fields) => fields
                .iter()
                .map(|(key, field)| {
                    Self::from_json_at(field, &path.key(key)).map(|doc| (key.clone(), doc))
                })
                .collect::<Result<BTreeMap<_, _>, _>>()
                .map(Self::Map),
            Value::Array(items) => items
                .iter()
                .enumerate()
                .map(|(index, item)| Self::from_json_at(item, &path.index(index)))
                .collect::<Result<Vec<_>, _>>()
                .map(Self::Array),
            Value::String(pattern) => PolicyPattern::new(pattern.as_str())
                .map(Self::Pattern)
                .map_err(|error| {
                    PolicyViolation::new(
                        path.clone(),
                        format!("invalid pattern '{pattern}': {error}"),
                    )
                }),
            Value::Number(number) => number.as_i64().map(Self::Exact).ok_or_else(|| {
                PolicyViolation::new(path.clone(), format!("number {number} is not an integer"))
            }),
            Value::Bool(_) => Err(PolicyViolation::new(
                path.clone(),
                "booleans are not valid policy values",
            )),
            Value::Null => Err(PolicyViolation::new(
                path.clone(),
                "null is not a valid policy value",
            )),
        }
    }

    /// Returns the variant tag.
    #[must_use]
    pub fn kind(&self) -> PolicyKind {
        match self {
            Self::Map(_) => PolicyKind::Map,
            Self::Array(_) => PolicyKind::Array,
            Self::Pattern(_) => PolicyKind::String,
            Self::Exact(_) => PolicyKind::Integer,
        }
    }

    /// Converts the tree back into JSON.
    #[must_use]
    pub fn to_json(&self) -> Value {
        match self {
            Self::Map(fields) => Value::Object(
                fields
                    .iter()
                    .map(|(key, field)| (key.clone(), field.to_json()))
                    .collect::<Map<_, _>>(),
            ),
            Self::Array(items) => Value::Array(items.iter().map(Self::to_json).collect()),
            Self::Pattern(pattern) => Value::String(pattern.as_str().to_owned()),
            Self::Exact(value) => Value::from(*value),
        }
    }
}
