//! Finite-difference fitness gradient for hybrid gradient-assisted search.

use crate::{CancellationToken, Error, GeneGrad, Genome, Result, clone_genome};

/// Estimate the partial derivative of fitness with respect to every gene
/// of `start` by forward differences, writing one value per gene into `out`.
///
/// Each gene is perturbed by its own [`GeneGrad::step`]. A gene clamped by
/// its constraints is divided by the shift actually applied, and a gene at
/// its upper bound is probed backwards instead. With
/// `new_individual` set, each probe runs on a fresh copy of `start`, which
/// suits simulations with state that lingers between runs. Without it the
/// probes run on `start` in place and every gene is restored afterwards.
pub fn gradient<G>(
    token: &CancellationToken,
    out: &mut [f64],
    start: &mut G,
    new_individual: Option<&dyn Fn() -> G>,
) -> Result<()>
where
    G: Genome,
    G::Gene: GeneGrad,
{
    let n = start.gene_count();
    if n == 0 {
        return Err(Error::EmptyGenome);
    }
    if out.len() != n {
        return Err(Error::GradientBufferLength {
            expected: n,
            got: out.len(),
        });
    }
    if let Some(index) = (0..n).find(|&i| start.gene(i).step() == 0.0) {
        return Err(Error::ZeroStep { index });
    }

    let baseline = check_fitness(start.simulate(token))?;
    for i in 0..n {
        if token.is_cancelled() {
            return Err(Error::Cancelled);
        }
        let step = start.gene(i).step();
        let (fitness, shift) = match new_individual {
            Some(factory) => {
                let mut probe = factory();
                clone_genome(&mut probe, start)?;
                let (_, shift) = perturb(&mut probe, i, step);
                if shift == 0.0 {
                    return Err(Error::PinnedGene { index: i });
                }
                (probe.simulate(token), shift)
            }
            None => {
                let (original, shift) = perturb(start, i, step);
                if shift == 0.0 {
                    start.gene_mut(i).set_value(original);
                    return Err(Error::PinnedGene { index: i });
                }
                let fitness = start.simulate(token);
                start.gene_mut(i).set_value(original);
                (fitness, shift)
            }
        };
        out[i] = (check_fitness(fitness)? - baseline) / shift;
    }
    Ok(())
}

/// Shift gene `i` by `step`, or by `-step` when the forward shift is
/// swallowed by clamping. Returns the value before the shift and the shift
/// actually applied, which is zero for a gene that cannot move.
fn perturb<G>(genome: &mut G, i: usize, step: f64) -> (f64, f64)
where
    G: Genome,
    G::Gene: GeneGrad,
{
    let gene = genome.gene_mut(i);
    let original = gene.value();
    gene.set_value(original + step);
    let mut shift = gene.value() - original;
    if shift == 0.0 {
        gene.set_value(original - step);
        shift = gene.value() - original;
    }
    (original, shift)
}

fn check_fitness(fitness: f64) -> Result<f64> {
    if !fitness.is_finite() {
        Err(Error::InvalidFitness(fitness))
    } else if fitness < 0.0 {
        Err(Error::NegativeFitness(fitness))
    } else {
        Ok(fitness)
    }
}
