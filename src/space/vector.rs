use std::fmt;
use std::sync::Arc;

use super::DecisionSpace;
use crate::error::{OptimisationError, Result};
use crate::rng::RandomNumberGenerator;

/// A point in a [`DecisionSpace`], one value per dimension.
///
/// The space is shared behind an `Arc` so that cloning a vector, or keeping
/// thousands of them in a population, does not copy the bounds.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "RawDecisionVector"))]
#[derive(Debug, Clone)]
pub struct DecisionVector {
    space: Arc<DecisionSpace>,
    values: Vec<f64>,
}

// Deserialised vectors go through the same bounds check as `new`.
#[cfg(feature = "serde")]
#[derive(serde::Deserialize)]
struct RawDecisionVector {
    space: Arc<DecisionSpace>,
    values: Vec<f64>,
}

#[cfg(feature = "serde")]
impl TryFrom<RawDecisionVector> for DecisionVector {
    type Error = OptimisationError;

    fn try_from(raw: RawDecisionVector) -> Result<Self> {
        Self::new(raw.space, raw.values)
    }
}

impl DecisionVector {
    /// Builds a vector, failing with `OutOfRange` if any value is illegal for
    /// its dimension and with `DomainMismatch` if the length is wrong.
    pub fn new(space: Arc<DecisionSpace>, values: Vec<f64>) -> Result<Self> {
        space.validate(&values)?;
        Ok(Self { space, values })
    }

    /// Draws a uniformly random vector from `space`.
    pub fn sample(space: &Arc<DecisionSpace>, rng: &mut RandomNumberGenerator) -> Self {
        let values = space.sample_values(rng);
        Self {
            space: Arc::clone(space),
            values,
        }
    }

    /// Builds a new vector in the same space.
    pub fn with_values(&self, values: Vec<f64>) -> Result<Self> {
        Self::new(Arc::clone(&self.space), values)
    }

    pub fn space(&self) -> &Arc<DecisionSpace> {
        &self.space
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn get(&self, index: usize) -> Option<f64> {
        self.values.get(index).copied()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Returns `true` if both vectors live in the same space.
    pub fn same_space(&self, other: &DecisionVector) -> bool {
        Arc::ptr_eq(&self.space, &other.space) || self.space == other.space
    }

    /// Elementwise sum. The result is a raw offset, not necessarily a legal vector.
    pub fn add(&self, other: &DecisionVector) -> Result<Vec<f64>> {
        self.zip_with(other, |a, b| a + b)
    }

    /// Elementwise difference `self - other`.
    pub fn subtract(&self, other: &DecisionVector) -> Result<Vec<f64>> {
        self.zip_with(other, |a, b| a - b)
    }

    fn zip_with(&self, other: &DecisionVector, op: impl Fn(f64, f64) -> f64) -> Result<Vec<f64>> {
        if !self.same_space(other) {
            return Err(OptimisationError::DomainMismatch(
                "vector arithmetic requires identical decision spaces".to_string(),
            ));
        }
        Ok(self
            .values
            .iter()
            .zip(&other.values)
            .map(|(a, b)| op(*a, *b))
            .collect())
    }
}

impl PartialEq for DecisionVector {
    fn eq(&self, other: &Self) -> bool {
        self.same_space(other) && self.values == other.values
    }
}

impl fmt::Display for DecisionVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, v) in self.values.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", v)?;
        }
        write!(f, "]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn space(dims: usize) -> Arc<DecisionSpace> {
        Arc::new(DecisionSpace::uniform(dims, -10.0, 10.0).unwrap())
    }

    #[test]
    fn test_arithmetic_in_same_space() {
        let s = space(2);
        let a = DecisionVector::new(Arc::clone(&s), vec![1.0, 2.0]).unwrap();
        let b = DecisionVector::new(s, vec![0.5, -1.0]).unwrap();
        assert_eq!(a.add(&b).unwrap(), vec![1.5, 1.0]);
        assert_eq!(a.subtract(&b).unwrap(), vec![0.5, 3.0]);
    }

    #[test]
    fn test_arithmetic_across_equal_spaces() {
        let a = DecisionVector::new(space(1), vec![1.0]).unwrap();
        let b = DecisionVector::new(space(1), vec![3.0]).unwrap();
        assert_eq!(b.subtract(&a).unwrap(), vec![2.0]);
    }

    #[test]
    fn test_arithmetic_domain_mismatch() {
        let a = DecisionVector::new(space(1), vec![1.0]).unwrap();
        let b = DecisionVector::new(space(2), vec![1.0, 1.0]).unwrap();
        assert!(matches!(
            a.add(&b),
            Err(OptimisationError::DomainMismatch(_))
        ));
        assert_ne!(a, b);
    }

    #[test]
    fn test_display() {
        let a = DecisionVector::new(space(2), vec![1.5, -2.0]).unwrap();
        assert_eq!(a.to_string(), "[1.5, -2]");
    }
}
