use crate::{Error, Gene, Result};
use rand::Rng;
use rand_distr::{Distribution, StandardNormal};
use serde::{Deserialize, Serialize};

/// A real number whose mutations are drawn from a normal distribution
/// centred on the current value.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NormalDistribution {
    value: f64,
    std_dev: f64,
}

impl NormalDistribution {
    pub fn new(value: f64, std_dev: f64) -> Result<Self> {
        if !(std_dev > 0.0) {
            return Err(Error::BadStdDev(std_dev));
        }
        Ok(Self { value, std_dev })
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn set_value(&mut self, value: f64) {
        self.value = value;
    }

    /// Standard deviation of mutations.
    pub fn std_dev(&self) -> f64 {
        self.std_dev
    }

    fn noise<R: Rng>(&self, rng: &mut R) -> f64 {
        let z: f64 = StandardNormal.sample(rng);
        z * self.std_dev
    }
}

impl Gene for NormalDistribution {
    fn mutate<R: Rng>(&mut self, rng: &mut R) {
        self.value += self.noise(rng);
    }

    /// Normally distributed around the parents' midpoint.
    fn splice<R: Rng>(&mut self, rng: &mut R, other: &Self) {
        self.value = (self.value + other.value) / 2.0 + self.noise(rng);
    }

    fn clone_from_gene(&mut self, other: &Self) {
        self.value = other.value;
    }
}

/// A [`NormalDistribution`] gene clamped to `[min, max]` after every change.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConstrainedNormal {
    normal: NormalDistribution,
    min: f64,
    max: f64,
}

impl ConstrainedNormal {
    pub fn new(value: f64, std_dev: f64, min: f64, max: f64) -> Result<Self> {
        if !(min <= max) {
            return Err(Error::BadConstraints);
        }
        let mut gene = Self {
            normal: NormalDistribution::new(value, std_dev)?,
            min,
            max,
        };
        gene.clamp();
        Ok(gene)
    }

    pub fn value(&self) -> f64 {
        self.normal.value
    }

    pub fn set_value(&mut self, value: f64) {
        self.normal.value = value;
        self.clamp();
    }

    pub fn std_dev(&self) -> f64 {
        self.normal.std_dev
    }

    fn clamp(&mut self) {
        self.normal.value = self.normal.value.max(self.min).min(self.max);
    }
}

impl Gene for ConstrainedNormal {
    fn mutate<R: Rng>(&mut self, rng: &mut R) {
        self.normal.mutate(rng);
        self.clamp();
    }

    fn splice<R: Rng>(&mut self, rng: &mut R, other: &Self) {
        self.normal.splice(rng, &other.normal);
        self.clamp();
    }

    fn clone_from_gene(&mut self, other: &Self) {
        self.normal.value = other.normal.value;
    }
}
