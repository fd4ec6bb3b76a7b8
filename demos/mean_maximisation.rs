//! Evolve genomes whose fitness is the mean of their genes, on islands.
//!
//! Run with `RUST_LOG=debug` to follow every generation.

use log::{error, info};
use rand::SeedableRng;
use rand_pcg::Pcg64;
use symbios_islands::{
    CancellationToken, EvolutionConfig, Genome, algorithms::islands::Islands, find_codependency,
    genes::ConstrainedNormal, mutate,
};

const GENES: usize = 8;
const INDIVIDUALS: usize = 200;
const ISLANDS: usize = 4;
const ROUNDS: usize = 50;

#[derive(Clone, Debug)]
struct MeanDNA(Vec<ConstrainedNormal>);

impl Genome for MeanDNA {
    type Gene = ConstrainedNormal;

    fn simulate(&mut self, _token: &CancellationToken) -> f64 {
        self.0.iter().map(|g| g.value()).sum::<f64>() / self.0.len() as f64
    }

    fn gene_count(&self) -> usize {
        self.0.len()
    }

    fn gene(&self, i: usize) -> &ConstrainedNormal {
        &self.0[i]
    }

    fn gene_mut(&mut self, i: usize) -> &mut ConstrainedNormal {
        &mut self.0[i]
    }
}

fn new_individual() -> MeanDNA {
    let gene = ConstrainedNormal::new(0.5, 0.25, 0.0, 1.0).expect("valid gene constraints");
    MeanDNA(vec![gene; GENES])
}

fn main() {
    env_logger::init();

    let config = EvolutionConfig {
        mutation_rate: 0.05,
        polygamy: 1,
        generations_per_round: 20,
        concurrency: ISLANDS,
        seed: 42,
    };

    if let Err(e) = find_codependency(config.seed, new_individual) {
        error!("individual factory is unsuitable: {e}");
        return;
    }

    let mut rng = Pcg64::seed_from_u64(config.seed);
    let mut individuals: Vec<MeanDNA> = Vec::with_capacity(INDIVIDUALS);
    for _ in 0..INDIVIDUALS {
        let mut dna = new_individual();
        if let Err(e) = mutate(&mut dna, &mut rng, 1.0) {
            error!("seeding failed: {e}");
            return;
        }
        individuals.push(dna);
    }

    let mut islands = match Islands::new(ISLANDS, individuals, config.seed, new_individual) {
        Ok(islands) => islands,
        Err(e) => {
            error!("cannot build islands: {e}");
            return;
        }
    };

    let token = CancellationToken::new();
    for round in 0..ROUNDS {
        if let Err(e) = islands.round(&config, &token) {
            if e.is_fatal() {
                error!("round {round}: {e}");
                return;
            }
            error!("round {round}: {e}, continuing");
        }

        let Ok(fitness) = islands.champion_fitness() else {
            continue;
        };
        if round % 10 == 0 {
            info!("Round {round}: champion fitness {fitness:.6}");
        }
        if fitness > 0.999 {
            info!("Target reached at round {round}!");
            break;
        }
    }

    if let Ok(champion) = islands.champion() {
        let values: Vec<f64> = champion.0.iter().map(|g| g.value()).collect();
        println!("champion genes: {values:.4?}");
    }
}
