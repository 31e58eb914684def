use std::fmt;

use crate::error::{OptimisationError, Result};
use crate::rng::RandomNumberGenerator;

/// The bounds of a single dimension.
///
/// Continuous dimensions include their lower bound and exclude their upper
/// bound. Discrete dimensions include both bounds.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub enum VariableKind {
    Continuous { lower: f64, upper: f64 },
    Discrete { lower: i64, upper: i64 },
}

/// One dimension of a [`DecisionSpace`](super::DecisionSpace).
///
/// A `Variable` can only be obtained through [`Variable::continuous`] or
/// [`Variable::discrete`], which reject bounds where the upper bound does not
/// strictly exceed the lower one.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "RawVariable"))]
#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    name: String,
    kind: VariableKind,
}

/// Unchecked wire form of a [`Variable`].
#[cfg(feature = "serde")]
#[derive(serde::Deserialize)]
struct RawVariable {
    name: String,
    kind: VariableKind,
}

#[cfg(feature = "serde")]
impl TryFrom<RawVariable> for Variable {
    type Error = OptimisationError;

    fn try_from(raw: RawVariable) -> Result<Self> {
        match raw.kind {
            VariableKind::Continuous { lower, upper } => Variable::continuous(raw.name, lower, upper),
            VariableKind::Discrete { lower, upper } => Variable::discrete(raw.name, lower, upper),
        }
    }
}

impl Variable {
    /// Creates a real-valued dimension over `[lower, upper)`.
    ///
    /// # Arguments
    ///
    /// * `name` - A label used in error messages and `Display` output.
    /// * `lower` - The inclusive lower bound.
    /// * `upper` - The exclusive upper bound.
    ///
    /// # Returns
    ///
    /// The variable, or `OutOfRange` if a bound is not finite, if `upper` does
    /// not exceed `lower`, or if the width of the range overflows `f64`.
    pub fn continuous(name: impl Into<String>, lower: f64, upper: f64) -> Result<Self> {
        if !lower.is_finite() || !upper.is_finite() {
            return Err(OptimisationError::OutOfRange(format!(
                "continuous bounds must be finite, got [{}, {})",
                lower, upper
            )));
        }
        if upper <= lower {
            return Err(OptimisationError::OutOfRange(format!(
                "upper bound {} must exceed lower bound {}",
                upper, lower
            )));
        }
        if !(upper - lower).is_finite() {
            return Err(OptimisationError::OutOfRange(format!(
                "the width of [{}, {}) is not representable",
                lower, upper
            )));
        }
        Ok(Self {
            name: name.into(),
            kind: VariableKind::Continuous { lower, upper },
        })
    }

    /// Creates an integer-valued dimension over `[lower, upper]`.
    pub fn discrete(name: impl Into<String>, lower: i64, upper: i64) -> Result<Self> {
        if upper <= lower {
            return Err(OptimisationError::OutOfRange(format!(
                "upper bound {} must exceed lower bound {}",
                upper, lower
            )));
        }
        if upper.checked_sub(lower).is_none() {
            return Err(OptimisationError::OutOfRange(format!(
                "the width of {{{}..={}}} overflows i64",
                lower, upper
            )));
        }
        Ok(Self {
            name: name.into(),
            kind: VariableKind::Discrete { lower, upper },
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &VariableKind {
        &self.kind
    }

    pub fn is_discrete(&self) -> bool {
        matches!(self.kind, VariableKind::Discrete { .. })
    }

    /// Returns `true` if `value` is a legal value for this dimension.
    pub fn contains(&self, value: f64) -> bool {
        match self.kind {
            VariableKind::Continuous { lower, upper } => value >= lower && value < upper,
            VariableKind::Discrete { lower, upper } => {
                value.fract() == 0.0 && value >= lower as f64 && value <= upper as f64
            }
        }
    }

    /// Maps `value` onto the closest legal value for this dimension.
    ///
    /// Continuous values at or above the exclusive upper bound map to the
    /// largest representable value below it. NaN maps to the lower bound.
    pub fn nearest_legal(&self, value: f64) -> f64 {
        if value.is_nan() {
            return match self.kind {
                VariableKind::Continuous { lower, .. } => lower,
                VariableKind::Discrete { lower, .. } => lower as f64,
            };
        }
        match self.kind {
            VariableKind::Continuous { lower, upper } => {
                if value < lower {
                    lower
                } else if value >= upper {
                    below(upper).max(lower)
                } else {
                    value
                }
            }
            VariableKind::Discrete { lower, upper } => {
                value.round().clamp(lower as f64, upper as f64)
            }
        }
    }

    /// Draws a uniformly distributed legal value.
    pub fn sample(&self, rng: &mut RandomNumberGenerator) -> f64 {
        match self.kind {
            VariableKind::Continuous { lower, upper } => rng.uniform(lower, upper),
            VariableKind::Discrete { lower, upper } => rng.uniform_int(lower, upper) as f64,
        }
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            VariableKind::Continuous { lower, upper } => {
                write!(f, "{}: [{}, {})", self.name, lower, upper)
            }
            VariableKind::Discrete { lower, upper } => {
                write!(f, "{}: {{{}..={}}}", self.name, lower, upper)
            }
        }
    }
}

/// Largest finite `f64` strictly below `x`.
fn below(x: f64) -> f64 {
    if x == 0.0 {
        -f64::from_bits(1)
    } else if x > 0.0 {
        f64::from_bits(x.to_bits() - 1)
    } else {
        f64::from_bits(x.to_bits() + 1)
    }
}
