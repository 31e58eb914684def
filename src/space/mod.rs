//! # Decision Space
//!
//! A [`DecisionSpace`] is the ordered list of bounded dimensions a search runs
//! over. A [`DecisionVector`] is one point in such a space: its values are
//! checked against the space when it is built and never change afterwards.
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use optirun::space::{DecisionSpace, DecisionVector, Variable};
//!
//! let space = Arc::new(DecisionSpace::new(vec![
//!     Variable::continuous("x", -5.0, 5.0).unwrap(),
//!     Variable::discrete("n", 1, 10).unwrap(),
//! ]).unwrap());
//!
//! let v = DecisionVector::new(Arc::clone(&space), vec![0.5, 3.0]).unwrap();
//! assert_eq!(v.get(1), Some(3.0));
//!
//! // 12 is outside the discrete bounds.
//! assert!(DecisionVector::new(space, vec![0.5, 12.0]).is_err());
//! ```
pub mod variable;
pub mod vector;

use crate::error::{OptimisationError, Result};
use crate::rng::RandomNumberGenerator;

pub use variable::{Variable, VariableKind};
pub use vector::DecisionVector;

/// The ordered set of dimensions defining which decision vectors are legal.
///
/// Equality is structural: two spaces are equal when they hold the same
/// variables in the same order.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "RawDecisionSpace"))]
#[derive(Debug, Clone, PartialEq)]
pub struct DecisionSpace {
    variables: Vec<Variable>,
}

#[cfg(feature = "serde")]
#[derive(serde::Deserialize)]
struct RawDecisionSpace {
    variables: Vec<Variable>,
}

#[cfg(feature = "serde")]
impl TryFrom<RawDecisionSpace> for DecisionSpace {
    type Error = OptimisationError;

    fn try_from(raw: RawDecisionSpace) -> Result<Self> {
        Self::new(raw.variables)
    }
}

impl DecisionSpace {
    /// Creates a space from its dimensions. At least one dimension is required.
    pub fn new(variables: Vec<Variable>) -> Result<Self> {
        if variables.is_empty() {
            return Err(OptimisationError::OutOfRange(
                "a decision space needs at least one dimension".to_string(),
            ));
        }
        Ok(Self { variables })
    }

    /// Creates a space of `dimensions` continuous variables sharing the same bounds.
    pub fn uniform(dimensions: usize, lower: f64, upper: f64) -> Result<Self> {
        let variables = (0..dimensions)
            .map(|i| Variable::continuous(format!("x{}", i), lower, upper))
            .collect::<Result<Vec<_>>>()?;
        Self::new(variables)
    }

    pub fn dimensions(&self) -> usize {
        self.variables.len()
    }

    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }

    pub fn get(&self, index: usize) -> Option<&Variable> {
        self.variables.get(index)
    }

    /// Checks every value against its dimension.
    pub fn validate(&self, values: &[f64]) -> Result<()> {
        if values.len() != self.variables.len() {
            return Err(OptimisationError::DomainMismatch(format!(
                "expected {} values, got {}",
                self.variables.len(),
                values.len()
            )));
        }
        for (i, (variable, value)) in self.variables.iter().zip(values).enumerate() {
            if !variable.contains(*value) {
                return Err(OptimisationError::OutOfRange(format!(
                    "value {} at index {} is outside {}",
                    value, i, variable
                )));
            }
        }
        Ok(())
    }

    /// Maps every value onto the closest legal value of its dimension.
    pub fn nearest_legal(&self, values: &[f64]) -> Result<Vec<f64>> {
        if values.len() != self.variables.len() {
            return Err(OptimisationError::DomainMismatch(format!(
                "expected {} values, got {}",
                self.variables.len(),
                values.len()
            )));
        }
        Ok(self
            .variables
            .iter()
            .zip(values)
            .map(|(variable, value)| variable.nearest_legal(*value))
            .collect())
    }

    /// Draws one legal value per dimension.
    pub fn sample_values(&self, rng: &mut RandomNumberGenerator) -> Vec<f64> {
        self.variables.iter().map(|v| v.sample(rng)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_space_is_rejected() {
        assert!(DecisionSpace::new(vec![]).is_err());
        assert!(DecisionSpace::uniform(0, 0.0, 1.0).is_err());
    }

    #[test]
    fn test_structural_equality() {
        let a = DecisionSpace::uniform(2, 0.0, 1.0).unwrap();
        let b = DecisionSpace::uniform(2, 0.0, 1.0).unwrap();
        let c = DecisionSpace::uniform(2, 0.0, 2.0).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_validate_reports_length_and_range() {
        let space = DecisionSpace::uniform(2, 0.0, 1.0).unwrap();
        assert!(space.validate(&[0.1, 0.2]).is_ok());
        assert!(matches!(
            space.validate(&[0.1]),
            Err(OptimisationError::DomainMismatch(_))
        ));
        assert!(matches!(
            space.validate(&[0.1, 1.0]),
            Err(OptimisationError::OutOfRange(_))
        ));
    }

    #[test]
    fn test_nearest_legal_vector() {
        let space = DecisionSpace::uniform(3, 0.0, 1.0).unwrap();
        let legal = space.nearest_legal(&[-1.0, 0.5, 2.0]).unwrap();
        assert!(space.validate(&legal).is_ok());
        assert_eq!(legal[0], 0.0);
        assert_eq!(legal[1], 0.5);
    }
}
