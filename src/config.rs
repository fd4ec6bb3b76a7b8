//! Run parameters for [`Population`](crate::algorithms::population::Population)
//! and [`Islands`](crate::algorithms::islands::Islands).

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

fn default_generations_per_round() -> usize {
    10
}

fn default_concurrency() -> usize {
    1
}

/// Tunable parameters of an evolution run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvolutionConfig {
    /// Probability of each gene of a child being mutated, in `(0, 1]`.
    pub mutation_rate: f64,
    /// Extra parents per child beyond the first. Zero means cloning.
    pub polygamy: usize,
    /// Generations each island runs between migrations.
    #[serde(default = "default_generations_per_round")]
    pub generations_per_round: usize,
    /// Islands allowed mid-generation at once.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    /// Master seed for every random stream of the run.
    #[serde(default)]
    pub seed: u64,
}

impl Default for EvolutionConfig {
    fn default() -> Self {
        Self {
            mutation_rate: 0.05,
            polygamy: 1,
            generations_per_round: default_generations_per_round(),
            concurrency: default_concurrency(),
            seed: 0,
        }
    }
}

impl EvolutionConfig {
    /// Check the breeding parameters against a population of `individuals`.
    pub fn validate_selection(&self, individuals: usize) -> Result<()> {
        validate_selection(self.mutation_rate, self.polygamy, individuals)
    }

    /// Check every parameter for an island run over `islands` islands
    /// whose smallest island holds `smallest_island` individuals.
    pub fn validate_islands(&self, islands: usize, smallest_island: usize) -> Result<()> {
        validate_round(self.generations_per_round, self.concurrency, islands)?;
        self.validate_selection(smallest_island)
    }
}

pub(crate) fn validate_selection(
    mutation_rate: f64,
    polygamy: usize,
    individuals: usize,
) -> Result<()> {
    if !(mutation_rate > 0.0 && mutation_rate <= 1.0) {
        return Err(Error::BadMutationRate(mutation_rate));
    }
    if polygamy > individuals {
        return Err(Error::BadPolygamy {
            polygamy,
            individuals,
        });
    }
    Ok(())
}

pub(crate) fn validate_round(generations: usize, concurrency: usize, islands: usize) -> Result<()> {
    if generations == 0 {
        return Err(Error::BadGenerations);
    }
    if concurrency == 0 || concurrency > islands {
        return Err(Error::BadConcurrency {
            concurrency,
            islands,
        });
    }
    Ok(())
}
