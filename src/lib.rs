use rand::Rng;

pub mod cancel;
pub mod codependency;
pub mod config;
pub mod error;
pub mod genes;
pub mod gradient;

pub use cancel::CancellationToken;
pub use codependency::find_codependency;
pub use config::EvolutionConfig;
pub use error::{Error, Result};
pub use gradient::gradient;

/// The basic unit of heredity.
/// Defined by how it changes, not what it encodes.
pub trait Gene: Send {
    /// Randomly alter the gene's value.
    fn mutate<R: Rng>(&mut self, rng: &mut R);

    /// Crossover: fold the attributes of `other` into the receiver.
    fn splice<R: Rng>(&mut self, rng: &mut R, other: &Self);

    /// Overwrite the receiver's heritable value with `other`'s.
    /// Must not leave the receiver referencing `other`.
    fn clone_from_gene(&mut self, other: &Self);
}

/// A gene that can be read, written and stepped for finite differences.
pub trait GeneGrad: Gene {
    fn value(&self) -> f64;
    fn set_value(&mut self, value: f64);
    /// Perturbation used when estimating the partial derivative.
    fn step(&self) -> f64;
}

/// An individual: a fixed-length, ordered collection of genes plus
/// the simulation being optimized.
pub trait Genome {
    type Gene: Gene;

    /// Run the simulation and quantify how well the genome did.
    /// Fitness must be finite and non-negative; higher is better.
    ///
    /// Long simulations should poll `token` and return early once it
    /// is cancelled.
    fn simulate(&mut self, token: &CancellationToken) -> f64;

    fn gene_count(&self) -> usize;
    fn gene(&self, i: usize) -> &Self::Gene;
    fn gene_mut(&mut self, i: usize) -> &mut Self::Gene;
}

/// Mutate the genes of `genome` in place. Each gene is mutated
/// independently with probability `mutation_rate`.
pub fn mutate<G: Genome, R: Rng>(
    genome: &mut G,
    rng: &mut R,
    mutation_rate: f64,
) -> Result<()> {
    if !(mutation_rate > 0.0 && mutation_rate <= 1.0) {
        return Err(Error::BadMutationRate(mutation_rate));
    }
    for i in 0..genome.gene_count() {
        if rng.random::<f64>() < mutation_rate {
            genome.gene_mut(i).mutate(rng);
        }
    }
    Ok(())
}

/// Copy the genes of `src` into `dst` one by one. `dst` should come
/// from the blank-slate factory so nothing is aliased.
pub fn clone_genome<G: Genome>(dst: &mut G, src: &G) -> Result<()> {
    if dst.gene_count() != src.gene_count() {
        return Err(Error::LengthMismatch {
            dst: dst.gene_count(),
            src: src.gene_count(),
        });
    }
    for i in 0..src.gene_count() {
        dst.gene_mut(i).clone_from_gene(src.gene(i));
    }
    Ok(())
}

pub mod algorithms {
    pub mod islands;
    pub mod population;
}
