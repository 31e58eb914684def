use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use crate::error::{OptimisationError, Result};

/// Keys of the open-ended metadata attached to an individual.
///
/// The fixed fields of an individual (decision vector, state, legality,
/// solution, fitness) are not stored here.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PropertyKey {
    /// Time since the optimiser was created, taken when the candidate was accepted.
    CreationTime,
    /// Position of the candidate among all candidates handed out.
    CreationIndex,
    /// Time since the optimiser was created, taken when the candidate was told back.
    ReinsertionTime,
    /// Position of the candidate in the processing order of the reinsertion stage.
    ReinsertionIndex,
    /// Message of a failure raised by evaluation code.
    EvaluationError,
    /// A named component of the solution, written by the evaluation stage.
    Solution(String),
    /// Anything else an algorithm or evaluator wants to keep.
    Custom(String),
}

impl fmt::Display for PropertyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyKey::CreationTime => write!(f, "creation time"),
            PropertyKey::CreationIndex => write!(f, "creation index"),
            PropertyKey::ReinsertionTime => write!(f, "reinsertion time"),
            PropertyKey::ReinsertionIndex => write!(f, "reinsertion index"),
            PropertyKey::EvaluationError => write!(f, "evaluation error"),
            PropertyKey::Solution(name) => write!(f, "solution '{}'", name),
            PropertyKey::Custom(name) => write!(f, "'{}'", name),
        }
    }
}

/// A value stored in a [`PropertyBag`].
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    Index(usize),
    Elapsed(Duration),
    Real(f64),
    Vector(Vec<f64>),
    Text(String),
    Flag(bool),
}

impl PropertyValue {
    fn kind(&self) -> &'static str {
        match self {
            PropertyValue::Index(_) => "index",
            PropertyValue::Elapsed(_) => "duration",
            PropertyValue::Real(_) => "real",
            PropertyValue::Vector(_) => "vector",
            PropertyValue::Text(_) => "text",
            PropertyValue::Flag(_) => "flag",
        }
    }
}

/// Ordered side-table of metadata.
///
/// Reading a key that was never written fails with
/// [`OptimisationError::MissingProperty`]; reading it as the wrong kind of
/// value fails with [`OptimisationError::InvalidState`].
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PropertyBag {
    entries: BTreeMap<PropertyKey, PropertyValue>,
}

impl PropertyBag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `value` under `key`, returning the previous value if any.
    pub fn set(&mut self, key: PropertyKey, value: PropertyValue) -> Option<PropertyValue> {
        self.entries.insert(key, value)
    }

    pub fn get(&self, key: &PropertyKey) -> Result<&PropertyValue> {
        self.entries
            .get(key)
            .ok_or_else(|| OptimisationError::MissingProperty(key.to_string()))
    }

    pub fn contains(&self, key: &PropertyKey) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&PropertyKey, &PropertyValue)> {
        self.entries.iter()
    }

    pub fn index(&self, key: &PropertyKey) -> Result<usize> {
        match self.get(key)? {
            PropertyValue::Index(i) => Ok(*i),
            other => Err(wrong_kind(key, "index", other)),
        }
    }

    pub fn elapsed(&self, key: &PropertyKey) -> Result<Duration> {
        match self.get(key)? {
            PropertyValue::Elapsed(d) => Ok(*d),
            other => Err(wrong_kind(key, "duration", other)),
        }
    }

    pub fn real(&self, key: &PropertyKey) -> Result<f64> {
        match self.get(key)? {
            PropertyValue::Real(x) => Ok(*x),
            other => Err(wrong_kind(key, "real", other)),
        }
    }

    pub fn vector(&self, key: &PropertyKey) -> Result<&[f64]> {
        match self.get(key)? {
            PropertyValue::Vector(v) => Ok(v),
            other => Err(wrong_kind(key, "vector", other)),
        }
    }

    pub fn text(&self, key: &PropertyKey) -> Result<&str> {
        match self.get(key)? {
            PropertyValue::Text(s) => Ok(s),
            other => Err(wrong_kind(key, "text", other)),
        }
    }

    pub fn flag(&self, key: &PropertyKey) -> Result<bool> {
        match self.get(key)? {
            PropertyValue::Flag(b) => Ok(*b),
            other => Err(wrong_kind(key, "flag", other)),
        }
    }
}

fn wrong_kind(key: &PropertyKey, wanted: &str, found: &PropertyValue) -> OptimisationError {
    OptimisationError::InvalidState(format!(
        "property {} holds a {} value, not a {} value",
        key,
        found.kind(),
        wanted
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_is_distinct_from_wrong_kind() {
        let mut bag = PropertyBag::new();
        assert!(matches!(
            bag.index(&PropertyKey::CreationIndex),
            Err(OptimisationError::MissingProperty(_))
        ));

        bag.set(PropertyKey::CreationIndex, PropertyValue::Text("three".into()));
        assert!(matches!(
            bag.index(&PropertyKey::CreationIndex),
            Err(OptimisationError::InvalidState(_))
        ));
    }

    #[test]
    fn test_keys_are_ordered() {
        let mut bag = PropertyBag::new();
        bag.set(PropertyKey::Custom("b".into()), PropertyValue::Flag(true));
        bag.set(PropertyKey::CreationIndex, PropertyValue::Index(1));
        bag.set(PropertyKey::Custom("a".into()), PropertyValue::Flag(false));

        let keys: Vec<_> = bag.iter().map(|(k, _)| k.clone()).collect();
        assert_eq!(
            keys,
            vec![
                PropertyKey::CreationIndex,
                PropertyKey::Custom("a".into()),
                PropertyKey::Custom("b".into()),
            ]
        );
    }

    #[test]
    fn test_set_returns_previous() {
        let mut bag = PropertyBag::new();
        assert_eq!(bag.set(PropertyKey::CreationIndex, PropertyValue::Index(1)), None);
        assert_eq!(
            bag.set(PropertyKey::CreationIndex, PropertyValue::Index(2)),
            Some(PropertyValue::Index(1))
        );
        assert_eq!(bag.index(&PropertyKey::CreationIndex).unwrap(), 2);
    }
}
