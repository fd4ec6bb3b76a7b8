use super::{ConstrainedFloat, ConstrainedNormal};
use crate::{Error, Gene, GeneGrad, Result};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// A reasonable finite-difference step for genes of order unity.
pub const DEFAULT_STEP: f64 = 5e-7;

fn check_step(step: f64) -> Result<f64> {
    if step == 0.0 || !step.is_finite() {
        return Err(Error::BadStep(step));
    }
    Ok(step)
}

/// [`ConstrainedFloat`] with a configured gradient step.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConstrainedFloatGrad {
    gene: ConstrainedFloat,
    step: f64,
}

impl ConstrainedFloatGrad {
    pub fn new(start: f64, min: f64, max: f64, step: f64) -> Result<Self> {
        Ok(Self {
            gene: ConstrainedFloat::new(start, min, max)?,
            step: check_step(step)?,
        })
    }

    pub fn inner(&self) -> &ConstrainedFloat {
        &self.gene
    }
}

impl Gene for ConstrainedFloatGrad {
    fn mutate<R: Rng>(&mut self, rng: &mut R) {
        self.gene.mutate(rng);
    }

    fn splice<R: Rng>(&mut self, rng: &mut R, other: &Self) {
        self.gene.splice(rng, &other.gene);
    }

    fn clone_from_gene(&mut self, other: &Self) {
        self.gene.clone_from_gene(&other.gene);
    }
}

impl GeneGrad for ConstrainedFloatGrad {
    fn value(&self) -> f64 {
        self.gene.value()
    }

    fn set_value(&mut self, value: f64) {
        self.gene.set_value(value);
    }

    fn step(&self) -> f64 {
        self.step
    }
}

/// [`ConstrainedNormal`] with a configured gradient step.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConstrainedNormalGrad {
    gene: ConstrainedNormal,
    step: f64,
}

impl ConstrainedNormalGrad {
    pub fn new(start: f64, std_dev: f64, min: f64, max: f64, step: f64) -> Result<Self> {
        Ok(Self {
            gene: ConstrainedNormal::new(start, std_dev, min, max)?,
            step: check_step(step)?,
        })
    }

    pub fn inner(&self) -> &ConstrainedNormal {
        &self.gene
    }
}

impl Gene for ConstrainedNormalGrad {
    fn mutate<R: Rng>(&mut self, rng: &mut R) {
        self.gene.mutate(rng);
    }

    fn splice<R: Rng>(&mut self, rng: &mut R, other: &Self) {
        self.gene.splice(rng, &other.gene);
    }

    fn clone_from_gene(&mut self, other: &Self) {
        self.gene.clone_from_gene(&other.gene);
    }
}

impl GeneGrad for ConstrainedNormalGrad {
    fn value(&self) -> f64 {
        self.gene.value()
    }

    fn set_value(&mut self, value: f64) {
        self.gene.set_value(value);
    }

    fn step(&self) -> f64 {
        self.step
    }
}
