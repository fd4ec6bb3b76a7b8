//! Detection of hidden shared state between supposedly independent individuals.

use crate::{CancellationToken, Error, Gene, Genome, Result};
use rand::SeedableRng;
use rand_pcg::Pcg64;

/// Check that `new_individual` produces genuinely independent genomes.
///
/// Two fresh individuals must simulate to the same non-zero fitness. Then, for
/// every gene index, one fresh individual is simulated and has that gene
/// mutated, and a second fresh individual is simulated: its fitness must be
/// unaffected. Every gene index that fails is listed in the returned
/// [`Error::Codependency`].
///
/// Run this once before an optimization whenever a
/// [`Error::ChampionRegression`] shows up.
pub fn find_codependency<G, F>(seed: u64, new_individual: F) -> Result<()>
where
    G: Genome,
    F: Fn() -> G,
{
    let token = CancellationToken::new();
    let mut starter1 = new_individual();
    let mut starter2 = new_individual();
    let fit1 = starter1.simulate(&token);
    let fit2 = starter2.simulate(&token);
    check_finite(fit1, fit2)?;
    if fit1 != fit2 {
        return Err(Error::Codependency { indices: vec![] });
    } else if fit1 == 0.0 {
        return Err(Error::Inconclusive);
    }

    let mut rng = Pcg64::seed_from_u64(seed);
    let mut codependents = Vec::new();
    for i in 0..starter1.gene_count() {
        let mut parent1 = new_individual();
        let mut parent2 = new_individual();
        let fit1 = parent1.simulate(&token);
        // Must have no effect on parent2's simulation.
        parent1.gene_mut(i).mutate(&mut rng);
        let fit2 = parent2.simulate(&token);
        if let Err(err) = check_finite(fit1, fit2) {
            if codependents.is_empty() {
                return Err(err);
            }
            break;
        }
        if fit1 != fit2 {
            log::debug!("gene {i} codependent: fitness {fit1} became {fit2}");
            codependents.push(i);
        }
    }
    if codependents.is_empty() {
        Ok(())
    } else {
        Err(Error::Codependency {
            indices: codependents,
        })
    }
}

fn check_finite(fit1: f64, fit2: f64) -> Result<()> {
    for fitness in [fit1, fit2] {
        if !fitness.is_finite() {
            return Err(Error::InvalidFitness(fitness));
        } else if fitness < 0.0 {
            return Err(Error::NegativeFitness(fitness));
        }
    }
    Ok(())
}
