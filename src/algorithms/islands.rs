//! Island model: several populations evolving concurrently with migration.
//!
//! # Overview
//!
//! The individual pool is split evenly across islands. Each round:
//! 1. [`Islands::advance`] runs every island through a fixed number of
//!    generations on a worker pool no wider than the concurrency limit, then
//!    copies each successful island's champion into the migration window.
//! 2. [`Islands::crossover`] sends every migrant to a different, randomly
//!    chosen island, where it replaces the weakest individual.
//!
//! Islands share nothing while evolving except the [`CancellationToken`], so
//! one island failing or being cancelled leaves its siblings untouched.
//!
//! # Example
//!
//! ```rust
//! use symbios_islands::{CancellationToken, Genome, algorithms::islands::Islands};
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
//! let mut islands = Islands::new(3, (0..30).map(|_| blank()).collect(), 42, blank).unwrap();
//! let token = CancellationToken::new();
//! for _ in 0..5 {
//!     islands.advance(&token, 0.1, 1, 10, 2).unwrap();
//!     islands.crossover();
//! }
//! assert!(islands.champion_fitness().unwrap() >= 0.5);
//! ```

use super::population::Population;
use crate::config::{validate_round, validate_selection};
use crate::{CancellationToken, Error, EvolutionConfig, Genome, Result};
use rand::Rng;
use rand::prelude::SeedableRng;
use rand_pcg::Pcg64;
use rayon::prelude::*;

/// A champion copy in transit, tagged with the island it left.
struct Migrant<G> {
    individual: G,
    fitness: f64,
    origin: usize,
}

struct Island<G: Genome, F: Fn() -> G> {
    population: Population<G, F>,
    /// Fitness snapshot from the end of the previous round.
    prev_fitness: Vec<f64>,
    /// Mean fitness drop since the previous round. Not yet used to bias
    /// migration.
    attractiveness: f64,
}

impl<G: Genome, F: Fn() -> G> Island<G, F> {
    fn run(
        &mut self,
        token: &CancellationToken,
        mutation_rate: f64,
        polygamy: usize,
        generations: usize,
    ) -> Result<()> {
        for _ in 0..generations {
            if token.is_cancelled() {
                return Err(Error::Cancelled);
            }
            self.population.advance(token)?;
            self.population.selection(mutation_rate, polygamy)?;
        }
        Ok(())
    }

    fn update_attractiveness(&mut self) {
        let fitness = self.population.fitness();
        let drop: f64 = self
            .prev_fitness
            .iter()
            .zip(fitness)
            .map(|(prev, cur)| prev - cur)
            .sum();
        self.attractiveness = drop / self.prev_fitness.len() as f64;
        self.prev_fitness.copy_from_slice(fitness);
    }

    /// Replace the weakest non-champion individual with `migrant`.
    fn receive_migrant(&mut self, migrant: Migrant<G>) {
        let Some(idx) = weakest(self.population.fitness()) else {
            log::debug!("island too small to receive a migrant");
            return;
        };
        self.population.individuals_mut()[idx] = migrant.individual;
        // Marks the slot as taken for later migrants this round.
        self.population.fitness_mut()[idx] = migrant.fitness;
    }
}

/// Index of the first zero-fitness individual, else of the lowest fitness.
/// Slot 0 holds the champion and is never chosen.
fn weakest(fitness: &[f64]) -> Option<usize> {
    let mut min_idx = None;
    let mut min_fitness = f64::INFINITY;
    for (i, &f) in fitness.iter().enumerate().skip(1) {
        if f == 0.0 {
            return Some(i);
        } else if f < min_fitness {
            min_fitness = f;
            min_idx = Some(i);
        }
    }
    min_idx
}

/// Multi-population genetic algorithm (island model).
///
/// Maintaining several isolated populations preserves diversity and helps
/// escape local optima; migration of champions spreads good genetic
/// material between them.
pub struct Islands<G: Genome, F: Fn() -> G> {
    islands: Vec<Island<G, F>>,
    /// One slot per island, filled by `advance` and drained by `crossover`.
    migration_window: Vec<Option<Migrant<G>>>,
    round_errors: Vec<Option<Error>>,
    rng: Pcg64,
    /// Worker pool of the last round, reused while the width is unchanged.
    pool: Option<rayon::ThreadPool>,
}

impl<G, F> Islands<G, F>
where
    G: Genome + Send,
    F: Fn() -> G + Clone + Send,
{
    /// Split `individuals` evenly (±1) across `n_islands` populations.
    ///
    /// Each island draws its own seed from the master `seed` so concurrent
    /// islands do not follow correlated random streams.
    pub fn new(n_islands: usize, individuals: Vec<G>, seed: u64, new_individual: F) -> Result<Self> {
        if n_islands < 2 {
            return Err(Error::TooFewIslands(n_islands));
        } else if individuals.len() < n_islands {
            return Err(Error::TooFewIndividuals {
                individuals: individuals.len(),
                islands: n_islands,
            });
        }
        let mut rng = Pcg64::seed_from_u64(seed);
        let destinations = partition(&mut rng, individuals.len(), n_islands);
        let mut buckets: Vec<Vec<G>> = (0..n_islands).map(|_| Vec::new()).collect();
        for (individual, dest) in individuals.into_iter().zip(destinations) {
            buckets[dest].push(individual);
        }

        let mut islands = Vec::with_capacity(n_islands);
        for bucket in buckets {
            let island_seed = rng.random::<u64>();
            let size = bucket.len();
            islands.push(Island {
                population: Population::new(bucket, island_seed, new_individual.clone())?,
                prev_fitness: vec![0.0; size],
                attractiveness: 0.0,
            });
        }
        log::debug!(
            "partitioned into islands of sizes {:?}",
            islands.iter().map(|i| i.population.len()).collect::<Vec<_>>()
        );
        Ok(Self {
            migration_window: (0..n_islands).map(|_| None).collect(),
            round_errors: (0..n_islands).map(|_| None).collect(),
            islands,
            rng,
            pool: None,
        })
    }

    /// Run every island through `generations` (advance, selection) cycles
    /// with at most `concurrency` islands evolving at once, then load each
    /// successful island's champion into the migration window.
    ///
    /// Cancelling `token` stops every island after its current simulation;
    /// champions found so far are kept. A failing island does not stop its
    /// siblings. The first failure is returned (a fatal
    /// [`Error::ChampionRegression`] takes precedence), while per-island
    /// outcomes stay available from [`round_errors`](Self::round_errors).
    pub fn advance(
        &mut self,
        token: &CancellationToken,
        mutation_rate: f64,
        polygamy: usize,
        generations: usize,
        concurrency: usize,
    ) -> Result<()> {
        let n = self.islands.len();
        validate_round(generations, concurrency, n)?;
        let smallest = self
            .islands
            .iter()
            .map(|i| i.population.len())
            .min()
            .unwrap_or(0);
        validate_selection(mutation_rate, polygamy, smallest)?;
        if token.is_cancelled() {
            return Err(Error::Cancelled);
        }

        let pool = match self.pool.take() {
            Some(pool) if pool.current_num_threads() == concurrency => pool,
            _ => rayon::ThreadPoolBuilder::new()
                .num_threads(concurrency)
                .build()
                .map_err(|e| Error::WorkerPool(e.to_string()))?,
        };
        let outcomes: Vec<Result<()>> = pool.install(|| {
            self.islands
                .par_iter_mut()
                .map(|island| island.run(token, mutation_rate, polygamy, generations))
                .collect()
        });
        self.pool = Some(pool);

        let mut first_err: Option<Error> = None;
        for (i, outcome) in outcomes.into_iter().enumerate() {
            self.migration_window[i] = None;
            match outcome {
                Err(err) => {
                    log::warn!("island {i} failed: {err}");
                    let fatal = err.is_fatal();
                    self.round_errors[i] = Some(err.clone());
                    let replace = match &first_err {
                        None => true,
                        Some(prev) => fatal && !prev.is_fatal(),
                    };
                    if replace {
                        first_err = Some(err);
                    }
                }
                Ok(()) => {
                    self.round_errors[i] = None;
                    let island = &mut self.islands[i];
                    island.update_attractiveness();
                    let population = &island.population;
                    self.migration_window[i] = Some(Migrant {
                        individual: population.duplicate(population.champion())?,
                        fitness: population.champion_fitness(),
                        origin: i,
                    });
                }
            }
        }

        let succeeded = self.round_errors.iter().filter(|e| e.is_none()).count();
        log::info!(
            "round complete: {succeeded} of {n} islands succeeded, best champion fitness {:.6}",
            self.best_fitness()
        );
        first_err.map_or(Ok(()), Err)
    }

    /// Inject every migrant from the window into a different, randomly chosen
    /// island, replacing that island's weakest individual. Empties the window.
    pub fn crossover(&mut self) {
        let n = self.islands.len();
        for i in 0..n {
            let Some(migrant) = self.migration_window[i].take() else {
                continue;
            };
            let dest = pick_destination(&mut self.rng, n, migrant.origin);
            self.islands[dest].receive_migrant(migrant);
        }
    }

    /// One migration round with the configured parameters:
    /// [`advance`](Self::advance) then [`crossover`](Self::crossover).
    ///
    /// Migration still happens for the islands that succeeded when another
    /// island fails; the failure is returned afterwards.
    pub fn round(&mut self, config: &EvolutionConfig, token: &CancellationToken) -> Result<()> {
        let result = self.advance(
            token,
            config.mutation_rate,
            config.polygamy,
            config.generations_per_round,
            config.concurrency,
        );
        if matches!(&result, Err(e) if e.is_validation()) {
            return result;
        }
        self.crossover();
        result
    }

    /// The champion of the island with the best champion fitness.
    pub fn champion(&self) -> Result<&G> {
        let idx = self.champion_index()?;
        Ok(self.islands[idx].population.champion())
    }

    pub fn champion_fitness(&self) -> Result<f64> {
        let idx = self.champion_index()?;
        Ok(self.islands[idx].population.champion_fitness())
    }

    /// Outcome of each island in the last [`advance`](Self::advance).
    pub fn round_errors(&self) -> &[Option<Error>] {
        &self.round_errors
    }

    pub fn populations(&self) -> impl Iterator<Item = &Population<G, F>> {
        self.islands.iter().map(|i| &i.population)
    }

    pub fn island_count(&self) -> usize {
        self.islands.len()
    }

    /// Mean fitness drop of island `i` over its last successful round.
    pub fn attractiveness(&self, i: usize) -> f64 {
        self.islands[i].attractiveness
    }

    /// Number of migrants waiting for [`crossover`](Self::crossover).
    pub fn pending_migrants(&self) -> usize {
        self.migration_window.iter().flatten().count()
    }

    fn champion_index(&self) -> Result<usize> {
        let mut max_fitness = 0.0;
        let mut max_idx = None;
        for (i, island) in self.islands.iter().enumerate() {
            let fitness = island.population.champion_fitness();
            if fitness > max_fitness {
                max_fitness = fitness;
                max_idx = Some(i);
            }
        }
        max_idx.ok_or(Error::NoChampion)
    }

    /// Thread count of the cached worker pool, if a round has run.
    pub(crate) fn pool_width(&self) -> Option<usize> {
        self.pool.as_ref().map(|p| p.current_num_threads())
    }

    fn best_fitness(&self) -> f64 {
        self.islands
            .iter()
            .map(|i| i.population.champion_fitness())
            .fold(0.0, f64::max)
    }
}

/// Uniformly random island other than `origin`. Needs `n >= 2`.
fn pick_destination<R: Rng>(rng: &mut R, n: usize, origin: usize) -> usize {
    loop {
        let j = rng.random_range(0..n);
        if j != origin {
            return j;
        }
    }
}

/// Destination island of every individual, in pool order.
///
/// Individuals go to uniformly random islands while there is room. Sizes are
/// capped so that only `total % n` islands may hold one extra individual.
/// Once half the pool is placed, an individual whose random island is full
/// goes to the first island with room instead, which bounds the retries.
pub(crate) fn partition<R: Rng>(rng: &mut R, total: usize, n: usize) -> Vec<usize> {
    let base = total / n;
    let mut extra_left = total % n;
    let mut sizes = vec![0usize; n];
    let mut destinations = Vec::with_capacity(total);
    let has_room = |size: usize, extra_left: usize| size < base || (size == base && extra_left > 0);

    while destinations.len() < total {
        let placed = destinations.len();
        let candidate = rng.random_range(0..n);
        let dest = if has_room(sizes[candidate], extra_left) {
            Some(candidate)
        } else if total / (placed + 1) <= 2 {
            (0..n).find(|&j| has_room(sizes[j], extra_left))
        } else {
            None
        };
        if let Some(dest) = dest {
            if sizes[dest] == base {
                extra_left -= 1;
            }
            sizes[dest] += 1;
            destinations.push(dest);
        }
    }
    destinations
}
