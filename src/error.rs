//! Error taxonomy shared by every engine in the crate.

/// Errors produced while configuring or running an evolution.
///
/// Three families live here:
/// - parameter validation (caller misuse, always recoverable),
/// - fitness data problems surfaced by a simulation,
/// - the fatal [`Error::ChampionRegression`], see [`Error::is_fatal`].
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    #[error("population must hold at least one individual")]
    EmptyPopulation,
    #[error("individuals must have at least one gene")]
    EmptyGenome,
    #[error("bad mutation rate {0}: must be in range (0, 1]")]
    BadMutationRate(f64),
    #[error("bad polygamy {polygamy}: must be in range [0, {individuals}]")]
    BadPolygamy { polygamy: usize, individuals: usize },
    #[error("need at least 2 islands, got {0}")]
    TooFewIslands(usize),
    #[error("{individuals} individuals cannot populate {islands} islands")]
    TooFewIndividuals { individuals: usize, islands: usize },
    #[error("bad concurrency {concurrency}: must be in range [1, {islands}]")]
    BadConcurrency { concurrency: usize, islands: usize },
    #[error("number of generations per round must be at least 1")]
    BadGenerations,
    #[error("gene {index} has a zero gradient step")]
    ZeroStep { index: usize },
    #[error("gradient buffer holds {got} values, genome has {expected} genes")]
    GradientBufferLength { expected: usize, got: usize },
    #[error("destination genome has {dst} genes, source has {src}")]
    LengthMismatch { dst: usize, src: usize },
    #[error("bad gene constraints: min must be less than max")]
    BadConstraints,
    #[error("start value must lie within gene constraints")]
    StartOutOfBounds,
    #[error("bad standard deviation {0}: must be positive")]
    BadStdDev(f64),
    #[error("bad gradient step {0}: must be finite and non-zero")]
    BadStep(f64),
    #[error("gene {index} cannot move in either direction within its constraints")]
    PinnedGene { index: usize },

    #[error("negative fitness {0}: use zero instead")]
    NegativeFitness(f64),
    #[error("got infinite or NaN fitness {0}")]
    InvalidFitness(f64),
    #[error("zero fitness sum: cannot make decisions")]
    ZeroFitnessSum,
    #[error("infinite fitness sum: fitnesses returned by individuals are too large")]
    InfiniteFitnessSum,
    #[error(
        "zero fitness champion: initialize the population with non-zero fitness individuals"
    )]
    ZeroFitnessChampion,

    #[error("codependency between individuals: {}", describe_codependency(.indices))]
    Codependency { indices: Vec<usize> },
    #[error("cannot reliably determine codependency with zero fitness simulation results")]
    Inconclusive,

    #[error(
        "champion fitness decreased from {previous} to {observed}: individuals share state, run find_codependency on the individual factory"
    )]
    ChampionRegression { previous: f64, observed: f64 },

    #[error("evolution cancelled")]
    Cancelled,

    /// Champion requested before any island recorded one. This is caller
    /// misuse, not a broken run, so it counts as a validation error.
    #[error("no champion yet: every island still has zero champion fitness, call advance first")]
    NoChampion,
    #[error("failed to build worker pool: {0}")]
    WorkerPool(String),
}

impl Error {
    /// True for an invariant breach that invalidates the whole run.
    ///
    /// Champion data recorded before a fatal error may not represent the
    /// optimal genome and should be discarded.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::ChampionRegression { .. })
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Error::Cancelled)
    }

    /// True when the caller passed parameters outside their valid domain.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Error::EmptyPopulation
                | Error::EmptyGenome
                | Error::BadMutationRate(_)
                | Error::BadPolygamy { .. }
                | Error::TooFewIslands(_)
                | Error::TooFewIndividuals { .. }
                | Error::BadConcurrency { .. }
                | Error::BadGenerations
                | Error::ZeroStep { .. }
                | Error::GradientBufferLength { .. }
                | Error::LengthMismatch { .. }
                | Error::BadConstraints
                | Error::StartOutOfBounds
                | Error::BadStdDev(_)
                | Error::BadStep(_)
                | Error::PinnedGene { .. }
                | Error::NoChampion
        )
    }
}

fn describe_codependency(indices: &[usize]) -> String {
    if indices.is_empty() {
        "subsequent calls to the individual factory yield different fitnesses, check for captured or shared state".to_string()
    } else {
        format!("genes indices: {indices:?}")
    }
}

pub type Result<T> = std::result::Result<T, Error>;
