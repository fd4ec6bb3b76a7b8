//! Single-population genetic algorithm with fitness-proportionate breeding.
//!
//! # Overview
//!
//! Each generation is two calls:
//! 1. [`Population::advance`] simulates every individual, caches its fitness
//!    and records the best individual ever seen (the champion).
//! 2. [`Population::selection`] breeds the next generation. Parents are drawn
//!    by roulette wheel, so fitter individuals are proportionally more likely
//!    to reproduce. Children are mutated; slot 0 always receives an unmutated
//!    copy of the champion.
//!
//! # Example
//!
//! ```rust
//! use symbios_islands::{CancellationToken, Genome, algorithms::population::Population};
//! use symbios_islands::genes::ConstrainedFloat;
//!
//! struct Mean(Vec<ConstrainedFloat>);
//!
//! impl Genome for Mean {
//!     type Gene = ConstrainedFloat;
//!     fn simulate(&mut self, _token: &CancellationToken) -> f64 {
//!         self.0.iter().map(|g| g.value()).sum::<f64>() / self.0.len() as f64
//!     }
//!     fn gene_count(&self) -> usize { self.0.len() }
//!     fn gene(&self, i: usize) -> &ConstrainedFloat { &self.0[i] }
//!     fn gene_mut(&mut self, i: usize) -> &mut ConstrainedFloat { &mut self.0[i] }
//! }
//!
//! let blank = || Mean(vec![ConstrainedFloat::unit(0.5); 4]);
//! let mut pop = Population::new((0..20).map(|_| blank()).collect(), 42, blank).unwrap();
//! let token = CancellationToken::new();
//! for _ in 0..50 {
//!     pop.advance(&token).unwrap();
//!     pop.selection(0.1, 1).unwrap();
//! }
//! assert!(pop.champion_fitness() >= 0.5);
//! ```
//!
//! # Independence
//!
//! The algorithm assumes simulating an unchanged genome always yields the same
//! fitness. Individuals sharing mutable state break that assumption, which
//! shows up as the champion's fitness decreasing between generations. That
//! condition is reported as the fatal [`Error::ChampionRegression`]; use
//! [`find_codependency`](crate::find_codependency) to locate the culprit.

use crate::config::validate_selection;
use crate::{
    CancellationToken, Error, EvolutionConfig, Gene, Genome, Result, clone_genome, mutate,
};
use rand::Rng;
use rand::prelude::SeedableRng;
use rand_pcg::Pcg64;

/// A pool of individuals evolved one generation at a time.
///
/// # Type Parameters
///
/// * `G` - The individual type, must implement [`Genome`]
/// * `F` - Blank-slate factory. Every champion copy and every child is built
///   from a fresh `F()` so no generation aliases the previous one.
pub struct Population<G: Genome, F: Fn() -> G> {
    individuals: Vec<G>,
    new_individual: F,
    champ: G,
    champ_fitness: f64,
    /// Index-aligned with `individuals`.
    fitness: Vec<f64>,
    fitness_sum: f64,
    dubious: Option<(G, f64)>,
    generation: usize,
    rng: Pcg64,
}

impl<G: Genome, F: Fn() -> G> Population<G, F> {
    /// Create a population from the initial `individuals`.
    ///
    /// `new_individual` must return a genome of the same length whose state is
    /// not shared with any other genome. `seed` fixes the random stream so runs
    /// are reproducible.
    pub fn new(individuals: Vec<G>, seed: u64, new_individual: F) -> Result<Self> {
        let first = individuals.first().ok_or(Error::EmptyPopulation)?;
        if first.gene_count() == 0 {
            return Err(Error::EmptyGenome);
        }
        let champ = new_individual();
        if champ.gene_count() != first.gene_count() {
            return Err(Error::LengthMismatch {
                dst: champ.gene_count(),
                src: first.gene_count(),
            });
        }
        Ok(Self {
            fitness: vec![0.0; individuals.len()],
            individuals,
            new_individual,
            champ,
            champ_fitness: 0.0,
            fitness_sum: 0.0,
            dubious: None,
            generation: 0,
            rng: Pcg64::seed_from_u64(seed),
        })
    }

    /// Simulate the current generation and record fitness scores.
    ///
    /// The token is checked after every simulation; on cancellation the
    /// champion found so far is kept and [`Error::Cancelled`] is returned.
    /// Calling `advance` twice without [`selection`](Self::selection) in
    /// between re-simulates the same generation.
    pub fn advance(&mut self, token: &CancellationToken) -> Result<()> {
        self.fitness_sum = 0.0;
        let mut fitness_sum = 0.0;
        let mut max_fitness = f64::NEG_INFINITY;
        let mut champ_idx = 0;
        let mut champ_saved = false;
        for i in 0..self.individuals.len() {
            let fitness = self.individuals[i].simulate(token);
            if token.is_cancelled() {
                // The interrupted simulation's result is discarded.
                log::warn!(
                    "generation {} cancelled after {} of {} simulations",
                    self.generation,
                    i,
                    self.individuals.len()
                );
                return Err(Error::Cancelled);
            }
            if fitness < 0.0 {
                self.record_dubious(i, fitness);
                return Err(Error::NegativeFitness(fitness));
            } else if !fitness.is_finite() {
                self.record_dubious(i, fitness);
                return Err(Error::InvalidFitness(fitness));
            }
            fitness_sum += fitness;
            self.fitness[i] = fitness;
            if fitness > max_fitness {
                max_fitness = fitness;
                champ_idx = i;
                champ_saved = false;
                if fitness > self.champ_fitness {
                    // Greedy save so a cancelled generation keeps its best.
                    self.save_champion(i)?;
                    self.champ_fitness = fitness;
                    champ_saved = true;
                }
            }
        }

        if max_fitness < self.champ_fitness {
            log::error!(
                "champion fitness decreased from {} to {} at generation {}",
                self.champ_fitness,
                max_fitness,
                self.generation
            );
            return Err(Error::ChampionRegression {
                previous: self.champ_fitness,
                observed: max_fitness,
            });
        }
        if fitness_sum == 0.0 {
            return Err(Error::ZeroFitnessSum);
        }
        if fitness_sum.is_infinite() {
            return Err(Error::InfiniteFitnessSum);
        }
        if !champ_saved {
            self.save_champion(champ_idx)?;
        }
        self.champ_fitness = max_fitness;
        self.fitness_sum = fitness_sum;
        log::debug!(
            "generation {}: champion fitness {:.6}, fitness sum {:.6}",
            self.generation,
            self.champ_fitness,
            self.fitness_sum
        );
        Ok(())
    }

    /// Breed and mutate the next generation from the fitness recorded by the
    /// last [`advance`](Self::advance).
    ///
    /// * `mutation_rate` - per-gene mutation probability, in `(0, 1]`
    /// * `polygamy` - extra parents per child, in `[0, population size]`
    pub fn selection(&mut self, mutation_rate: f64, polygamy: usize) -> Result<()> {
        if self.champ_fitness == 0.0 && self.fitness_sum == 0.0 {
            return Err(Error::ZeroFitnessChampion);
        } else if self.fitness_sum == 0.0 {
            return Err(Error::ZeroFitnessSum);
        }
        validate_selection(mutation_rate, polygamy, self.individuals.len())?;

        let mut next_gen = Vec::with_capacity(self.individuals.len());
        // Slot 0 is reserved for the champion.
        let mut champ = (self.new_individual)();
        clone_genome(&mut champ, &self.champ)?;
        next_gen.push(champ);

        for _ in 1..self.individuals.len() {
            let parents = roulette(&self.fitness, self.fitness_sum, &mut self.rng, polygamy + 1);
            let mut child = breed(
                &self.individuals,
                &self.new_individual,
                &mut self.rng,
                &parents,
            )?;
            mutate(&mut child, &mut self.rng, mutation_rate)?;
            next_gen.push(child);
        }
        self.individuals = next_gen;
        self.generation += 1;
        Ok(())
    }

    /// One full generation: [`advance`](Self::advance) then
    /// [`selection`](Self::selection) with the configured parameters.
    pub fn step(&mut self, config: &EvolutionConfig, token: &CancellationToken) -> Result<()> {
        self.advance(token)?;
        self.selection(config.mutation_rate, config.polygamy)
    }

    /// The best individual observed so far. Before the first successful
    /// [`advance`](Self::advance) this is a blank individual.
    pub fn champion(&self) -> &G {
        &self.champ
    }

    pub fn champion_fitness(&self) -> f64 {
        self.champ_fitness
    }

    /// The last individual whose simulation returned a negative, NaN or
    /// infinite fitness, together with that fitness.
    ///
    /// Such a result means the fitness function is ill defined, either at an
    /// edge case or because it overflows `f64` for a very fit genome.
    pub fn dubious_individual(&self) -> Option<(&G, f64)> {
        self.dubious.as_ref().map(|(g, f)| (g, *f))
    }

    /// The current generation. Replaced wholesale by every
    /// [`selection`](Self::selection).
    pub fn individuals(&self) -> &[G] {
        &self.individuals
    }

    /// Fitness of each individual from the last [`advance`](Self::advance).
    pub fn fitness(&self) -> &[f64] {
        &self.fitness
    }

    pub fn fitness_sum(&self) -> f64 {
        self.fitness_sum
    }

    pub fn generation(&self) -> usize {
        self.generation
    }

    pub fn len(&self) -> usize {
        self.individuals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.individuals.is_empty()
    }

    /// A fresh non-aliased copy of `src` built from the blank-slate factory.
    pub(crate) fn duplicate(&self, src: &G) -> Result<G> {
        let mut dst = (self.new_individual)();
        clone_genome(&mut dst, src)?;
        Ok(dst)
    }

    pub(crate) fn individuals_mut(&mut self) -> &mut [G] {
        &mut self.individuals
    }

    pub(crate) fn fitness_mut(&mut self) -> &mut [f64] {
        &mut self.fitness
    }

    fn save_champion(&mut self, idx: usize) -> Result<()> {
        let mut champ = (self.new_individual)();
        clone_genome(&mut champ, &self.individuals[idx])?;
        self.champ = champ;
        Ok(())
    }

    fn record_dubious(&mut self, idx: usize, fitness: f64) {
        let mut dubious = (self.new_individual)();
        if clone_genome(&mut dubious, &self.individuals[idx]).is_ok() {
            self.dubious = Some((dubious, fitness));
        }
    }
}

/// Draw `sample` parent indices with probability proportional to fitness.
///
/// Each of the `sample` thresholds is uniform in `[0, fitness_sum)` and lands
/// on the first individual whose cumulative fitness exceeds it. Draws are
/// with replacement: the same parent may appear more than once.
pub(crate) fn roulette<R: Rng>(
    fitness: &[f64],
    fitness_sum: f64,
    rng: &mut R,
    sample: usize,
) -> Vec<usize> {
    let thresholds: Vec<f64> = (0..sample)
        .map(|_| fitness_sum * rng.random::<f64>())
        .collect();
    let mut parents: Vec<Option<usize>> = vec![None; sample];
    let mut remaining = sample;
    let mut running_sum = 0.0;
    for (i, f) in fitness.iter().enumerate() {
        if remaining == 0 {
            break;
        }
        running_sum += f;
        for (slot, threshold) in parents.iter_mut().zip(&thresholds) {
            if slot.is_none() && running_sum > *threshold {
                *slot = Some(i);
                remaining -= 1;
            }
        }
    }
    // Rounding can leave the cumulative sum just short of a threshold close
    // to fitness_sum; such draws belong to the last live individual.
    let last_live = fitness.iter().rposition(|&f| f > 0.0).unwrap_or(0);
    parents
        .into_iter()
        .map(|p| p.unwrap_or(last_live))
        .collect()
}

/// Build a child from `parents[0]` spliced with every other parent, gene by
/// gene. A single parent yields a plain non-aliased clone.
fn breed<G: Genome, F: Fn() -> G, R: Rng>(
    individuals: &[G],
    new_individual: &F,
    rng: &mut R,
    parents: &[usize],
) -> Result<G> {
    let mut child = new_individual();
    clone_genome(&mut child, &individuals[parents[0]])?;
    for i in 0..child.gene_count() {
        let gene = child.gene_mut(i);
        for &p in &parents[1..] {
            gene.splice(rng, individuals[p].gene(i));
        }
    }
    Ok(child)
}
