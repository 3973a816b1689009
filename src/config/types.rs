//! Unit-carrying value types shared across the pipeline.

use serde::{Deserialize, Serialize};

/// Confidence gap required before the top sentiment class is trusted.
/// Always within [0, 1]; construct through [`Margin::try_new`] when the value comes from a user.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct Margin(f64);

impl Margin {
    pub const ZERO: Self = Self(0.0);
    pub const ONE: Self = Self(1.0);

    /// Clamping constructor for compile-time constants.
    pub const fn new(val: f64) -> Self {
        let v = if val < 0.0 {
            0.0
        } else if val > 1.0 {
            1.0
        } else {
            val
        };
        Self(v)
    }

    /// Strict constructor: rejects values outside [0, 1] and NaN instead of clamping.
    pub fn try_new(val: f64) -> Option<Self> {
        if val.is_finite() && (0.0..=1.0).contains(&val) {
            Some(Self(val))
        } else {
            None
        }
    }

    #[inline]
    pub fn value(self) -> f64 {
        self.0
    }
}

impl std::fmt::Display for Margin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.3}", self.0)
    }
}

/// Absolute return a price must exceed (either way) to count as a move, e.g. 0.02 = 2%.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct ReturnThreshold(f64);

impl ReturnThreshold {
    pub const fn new(val: f64) -> Self {
        let v = if val < 0.0 { 0.0 } else { val };
        Self(v)
    }

    pub fn try_new(val: f64) -> Option<Self> {
        if val.is_finite() && val >= 0.0 {
            Some(Self(val))
        } else {
            None
        }
    }

    #[inline]
    pub fn value(self) -> f64 {
        self.0
    }
}

impl std::fmt::Display for ReturnThreshold {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.2}%", self.0 * 100.0)
    }
}

/// A probability clamped to [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct Prob(f64);

impl Prob {
    pub const fn new(val: f64) -> Self {
        let v = if val < 0.0 {
            0.0
        } else if val > 1.0 {
            1.0
        } else {
            val
        };
        Self(v)
    }

    #[inline]
    pub fn value(self) -> f64 {
        self.0
    }
}

impl std::fmt::Display for Prob {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.1}%", self.0 * 100.0)
    }
}

/// A behavioral contract for anything that behaves like a price.
pub trait PriceLike {
    fn value(&self) -> f64;

    const MIN_EPSILON: f64 = 1e-12;

    fn is_positive(&self) -> bool {
        self.value() > Self::MIN_EPSILON
    }

    /// Simple return from `reference` to `self`. `None` when the reference cannot divide.
    fn return_from<R: PriceLike>(&self, reference: &R) -> Option<f64> {
        if !reference.is_positive() {
            return None;
        }
        Some((self.value() - reference.value()) / reference.value())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct ClosePrice(f64);

impl ClosePrice {
    pub const fn new(val: f64) -> Self {
        Self(val)
    }
}

impl PriceLike for ClosePrice {
    fn value(&self) -> f64 {
        self.0
    }
}

impl std::fmt::Display for ClosePrice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "${:.4}", self.0)
    }
}
