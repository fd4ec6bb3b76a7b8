use crate::{Error, Gene, Result};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// A real number kept within `[min, max]`.
///
/// Mutation draws a fresh value uniformly from the whole range; splicing
/// picks a uniformly weighted point between the two parents' values.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConstrainedFloat {
    value: f64,
    min: f64,
    max: f64,
}

impl ConstrainedFloat {
    pub fn new(start: f64, min: f64, max: f64) -> Result<Self> {
        if !(min <= max) {
            return Err(Error::BadConstraints);
        }
        if !(min..=max).contains(&start) {
            return Err(Error::StartOutOfBounds);
        }
        Ok(Self {
            value: start,
            min,
            max,
        })
    }

    /// A gene on the unit interval `[0, 1]`; `start` is clamped into it.
    pub fn unit(start: f64) -> Self {
        Self {
            value: start.clamp(0.0, 1.0),
            min: 0.0,
            max: 1.0,
        }
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    /// Set the value, clamped to the gene's constraints.
    pub fn set_value(&mut self, value: f64) {
        self.value = self.clamp(value);
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }

    fn clamp(&self, value: f64) -> f64 {
        value.max(self.min).min(self.max)
    }
}

impl Gene for ConstrainedFloat {
    fn mutate<R: Rng>(&mut self, rng: &mut R) {
        let r: f64 = rng.random();
        self.value = self.clamp(self.min + r * (self.max - self.min));
    }

    fn splice<R: Rng>(&mut self, rng: &mut R, other: &Self) {
        let r: f64 = rng.random();
        self.value = self.clamp(self.value * (1.0 - r) + other.value * r);
    }

    fn clone_from_gene(&mut self, other: &Self) {
        self.value = other.value;
    }
}

/// An integer kept within `[min, max]`, both ends inclusive.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstrainedInt {
    value: i64,
    min: i64,
    max: i64,
}

impl ConstrainedInt {
    /// Fails unless `min < max` and `start` lies within them.
    pub fn new(start: i64, min: i64, max: i64) -> Result<Self> {
        if min >= max {
            return Err(Error::BadConstraints);
        }
        if !(min..=max).contains(&start) {
            return Err(Error::StartOutOfBounds);
        }
        Ok(Self {
            value: start,
            min,
            max,
        })
    }

    pub fn value(&self) -> i64 {
        self.value
    }

    pub fn set_value(&mut self, value: i64) -> Result<()> {
        if !(self.min..=self.max).contains(&value) {
            return Err(Error::StartOutOfBounds);
        }
        self.value = value;
        Ok(())
    }
}

impl Gene for ConstrainedInt {
    fn mutate<R: Rng>(&mut self, rng: &mut R) {
        self.value = rng.random_range(self.min..=self.max);
    }

    fn splice<R: Rng>(&mut self, rng: &mut R, other: &Self) {
        if self.value == other.value {
            return;
        }
        let lo = self.value.min(other.value);
        let hi = self.value.max(other.value);
        self.value = rng.random_range(lo..=hi);
    }

    fn clone_from_gene(&mut self, other: &Self) {
        self.value = other.value;
    }
}
