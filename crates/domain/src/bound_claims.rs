use std::collections::BTreeMap;

use nomadgate_core::PolicyPath;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::policy::PolicyViolation;

/// Single required claim value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum BoundClaimValue {
    /// Exact string value.
    Text(String),
    /// Exact integer value.
    Integer(i64),
}

impl BoundClaimValue {
    fn to_json(&self) -> Value {
        match self {
            Self::Text(value) => Value::String(value.clone()),
            Self::Integer(value) => Value::from(*value),
        }
    }
}

/// Flat claim requirements a verified token must satisfy.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct BoundClaims(BTreeMap<String, BoundClaimValue>);

impl BoundClaims {
    /// Parses a bound-claims document: a one-level map of string or integer values.
    pub fn from_json(value: &Value) -> Result<Self, PolicyViolation> {
        let root = PolicyPath::root();
        let Value::Object(fields) = value else {
            return Err(PolicyViolation::new(root, "bound claims must be a map"));
        };

        fields
            .iter()
            .map(|(key, field)| {
                let claim = match field {
                    Value::String(text) => BoundClaimValue::Text(text.clone()),
                    Value::Number(number) => {
                        number.as_i64().map(BoundClaimValue::Integer).ok_or_else(|| {
                            PolicyViolation::new(root.key(key), "claim value must be an integer")
                        })?
                    }
                    _ => {
                        return Err(PolicyViolation::new(
                            root.key(key),
                            "claim value must be a string or an integer",
                        ));
                    }
                };
                Ok((key.clone(), claim))
            })
            .collect::<Result<BTreeMap<_, _>, _>>()
            .map(Self)
    }

    /// Validates the shape of a bound-claims document without keeping it.
    pub fn validate_shape(value: &Value) -> Result<(), PolicyViolation> {
        Self::from_json(value).map(|_| ())
    }

    /// Requires every bound key to be present in `claims` with an equal value.
    ///
    /// Comparison is exact JSON equality, so `"76"` does not match `76`.
    pub fn match_claims(&self, claims: &Map<String, Value>) -> Result<(), PolicyViolation> {
        let root = PolicyPath::root();
        for (key, expected) in &self.0 {
            match claims.get(key) {
                None | Some(Value::Null) => {
                    return Err(PolicyViolation::new(root.key(key), "claim is missing"));
                }
                Some(actual) if *actual != expected.to_json() => {
                    return Err(PolicyViolation::new(
                        root.key(key),
                        "claim value does not match",
                    ));
                }
                Some(_) => {}
            }
        }

        Ok(())
    }

    /// Returns the number of bound keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns whether no claims are bound.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Converts the requirements back into a JSON map.
    #[must_use]
    pub fn to_json(&self) -> Value {
        Value::Object(
            self.0
                .iter()
                .map(|(key, value)| (key.clone(), value.to_json()))
                .collect(),
        )
    }
}
