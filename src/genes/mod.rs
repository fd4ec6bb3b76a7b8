//! Reference [`Gene`](crate::Gene) implementations for numeric search spaces.
//!
//! - [`ConstrainedFloat`]: real value kept in `[min, max]`, uniform mutation.
//! - [`ConstrainedInt`]: integer value kept in `[min, max]`, uniform mutation.
//! - [`NormalDistribution`]: unbounded real value, normally distributed mutation.
//! - [`ConstrainedNormal`]: normally distributed mutation clamped to `[min, max]`.
//! - [`ConstrainedFloatGrad`] and [`ConstrainedNormalGrad`]: the above with a
//!   configured finite-difference step, for [`gradient`](crate::gradient()).

pub mod constrained;
pub mod grad;
pub mod normal;

pub use constrained::{ConstrainedFloat, ConstrainedInt};
pub use grad::{ConstrainedFloatGrad, ConstrainedNormalGrad, DEFAULT_STEP};
pub use normal::{ConstrainedNormal, NormalDistribution};
