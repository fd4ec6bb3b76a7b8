use rand::Rng;
use symbios_islands::genes::{ConstrainedFloatGrad, ConstrainedNormalGrad, DEFAULT_STEP};
use symbios_islands::{CancellationToken, Error, Gene, GeneGrad, Genome, gradient};

// --- Mock Infrastructure ---

const WEIGHTS: [f64; 3] = [1.0, 2.0, 0.5];

/// Linear fitness `10 + sum(w_i * x_i)`; `warm` is hidden state that
/// shifts every simulation after the first.
#[derive(Clone)]
struct Linear {
    genes: Vec<ConstrainedFloatGrad>,
    warm: bool,
    hysteresis: f64,
}

impl Genome for Linear {
    type Gene = ConstrainedFloatGrad;
    fn simulate(&mut self, _token: &CancellationToken) -> f64 {
        let bias = if self.warm { self.hysteresis } else { 0.0 };
        self.warm = true;
        10.0 + bias
            + self
                .genes
                .iter()
                .zip(WEIGHTS)
                .map(|(g, w)| g.value() * w)
                .sum::<f64>()
    }
    fn gene_count(&self) -> usize {
        self.genes.len()
    }
    fn gene(&self, i: usize) -> &ConstrainedFloatGrad {
        &self.genes[i]
    }
    fn gene_mut(&mut self, i: usize) -> &mut ConstrainedFloatGrad {
        &mut self.genes[i]
    }
}

fn linear(hysteresis: f64) -> Linear {
    Linear {
        genes: (0..3)
            .map(|_| ConstrainedFloatGrad::new(0.5, 0.0, 1.0, 1e-3).unwrap())
            .collect(),
        warm: false,
        hysteresis,
    }
}

fn values(genome: &Linear) -> Vec<f64> {
    genome.genes.iter().map(|g| g.value()).collect()
}

#[test]
fn test_linear_gradient_in_place() {
    let mut start = linear(0.0);
    let mut out = [0.0; 3];
    gradient(&CancellationToken::new(), &mut out, &mut start, None).unwrap();
    for (got, want) in out.iter().zip(WEIGHTS) {
        assert!((got - want).abs() < 1e-6, "got {got}, want {want}");
    }
    // Probed genes are restored.
    assert_eq!(values(&start), vec![0.5; 3]);
}

#[test]
fn test_fresh_individual_per_probe_avoids_hidden_state() {
    let factory: &dyn Fn() -> Linear = &|| linear(100.0);
    let mut start = linear(100.0);
    let mut out = [0.0; 3];
    gradient(&CancellationToken::new(), &mut out, &mut start, Some(factory)).unwrap();
    for (got, want) in out.iter().zip(WEIGHTS) {
        assert!((got - want).abs() < 1e-6, "got {got}, want {want}");
    }
    assert_eq!(values(&start), vec![0.5; 3]);

    // Reusing the warmed-up instance picks up the hysteresis.
    let mut reused = linear(100.0);
    gradient(&CancellationToken::new(), &mut out, &mut reused, None).unwrap();
    assert!(out.iter().all(|&d| d > 1e4));
}

#[test]
fn test_buffer_length_checked() {
    let mut start = linear(0.0);
    let mut out = [0.0; 2];
    assert_eq!(
        gradient(&CancellationToken::new(), &mut out, &mut start, None),
        Err(Error::GradientBufferLength {
            expected: 3,
            got: 2
        })
    );
}

#[test]
fn test_negative_fitness_rejected() {
    struct Negative(Vec<ConstrainedNormalGrad>);
    impl Genome for Negative {
        type Gene = ConstrainedNormalGrad;
        fn simulate(&mut self, _token: &CancellationToken) -> f64 {
            -self.0[0].value()
        }
        fn gene_count(&self) -> usize {
            self.0.len()
        }
        fn gene(&self, i: usize) -> &ConstrainedNormalGrad {
            &self.0[i]
        }
        fn gene_mut(&mut self, i: usize) -> &mut ConstrainedNormalGrad {
            &mut self.0[i]
        }
    }
    let gene = ConstrainedNormalGrad::new(0.5, 0.1, 0.0, 1.0, DEFAULT_STEP).unwrap();
    let mut start = Negative(vec![gene]);
    let mut out = [0.0; 1];
    assert_eq!(
        gradient(&CancellationToken::new(), &mut out, &mut start, None),
        Err(Error::NegativeFitness(-0.5))
    );
}

/// Gene with a configurable step, including the invalid zero step.
struct Stepped {
    value: f64,
    step: f64,
}

impl Gene for Stepped {
    fn mutate<R: Rng>(&mut self, rng: &mut R) {
        self.value = rng.random();
    }
    fn splice<R: Rng>(&mut self, _rng: &mut R, other: &Self) {
        self.value = (self.value + other.value) / 2.0;
    }
    fn clone_from_gene(&mut self, other: &Self) {
        self.value = other.value;
    }
}

impl GeneGrad for Stepped {
    fn value(&self) -> f64 {
        self.value
    }
    fn set_value(&mut self, value: f64) {
        self.value = value;
    }
    fn step(&self) -> f64 {
        self.step
    }
}

struct Quadratic(Vec<Stepped>);

impl Genome for Quadratic {
    type Gene = Stepped;
    fn simulate(&mut self, _token: &CancellationToken) -> f64 {
        self.0.iter().map(|g| g.value * g.value).sum()
    }
    fn gene_count(&self) -> usize {
        self.0.len()
    }
    fn gene(&self, i: usize) -> &Stepped {
        &self.0[i]
    }
    fn gene_mut(&mut self, i: usize) -> &mut Stepped {
        &mut self.0[i]
    }
}

#[test]
fn test_zero_step_names_gene() {
    let mut start = Quadratic(vec![
        Stepped { value: 1.0, step: 1e-4 },
        Stepped { value: 1.0, step: 0.0 },
    ]);
    let mut out = [0.0; 2];
    assert_eq!(
        gradient(&CancellationToken::new(), &mut out, &mut start, None),
        Err(Error::ZeroStep { index: 1 })
    );
}

#[test]
fn test_quadratic_forward_difference() {
    let h = 1e-4;
    let mut start = Quadratic(vec![
        Stepped { value: 1.0, step: h },
        Stepped { value: 3.0, step: h },
    ]);
    let mut out = [0.0; 2];
    gradient(&CancellationToken::new(), &mut out, &mut start, None).unwrap();
    // Forward difference of x^2 is 2x + h.
    assert!((out[0] - (2.0 + h)).abs() < 1e-6);
    assert!((out[1] - (6.0 + h)).abs() < 1e-6);
}

#[test]
fn test_cancelled_token_stops_probing() {
    let token = CancellationToken::new();
    token.cancel();
    let mut start = linear(0.0);
    let mut out = [0.0; 3];
    assert_eq!(
        gradient(&token, &mut out, &mut start, None),
        Err(Error::Cancelled)
    );
}

// ============================================================================
// Genes at their constraints
// ============================================================================

/// Fitness `3 * sum(x_i)`.
#[derive(Clone)]
struct Scaled(Vec<ConstrainedFloatGrad>);

impl Genome for Scaled {
    type Gene = ConstrainedFloatGrad;
    fn simulate(&mut self, _token: &CancellationToken) -> f64 {
        3.0 * self.0.iter().map(|g| g.value()).sum::<f64>()
    }
    fn gene_count(&self) -> usize {
        self.0.len()
    }
    fn gene(&self, i: usize) -> &ConstrainedFloatGrad {
        &self.0[i]
    }
    fn gene_mut(&mut self, i: usize) -> &mut ConstrainedFloatGrad {
        &mut self.0[i]
    }
}

fn scaled(starts: &[f64]) -> Scaled {
    Scaled(
        starts
            .iter()
            .map(|&s| ConstrainedFloatGrad::new(s, 0.0, 1.0, 1e-3).unwrap())
            .collect(),
    )
}

#[test]
fn test_gene_at_upper_bound_probes_backwards() {
    let starts = [1.0, 0.5, 0.9995];
    let factory: &dyn Fn() -> Scaled = &|| scaled(&[0.0; 3]);
    for factory in [None, Some(factory)] {
        let mut start = scaled(&starts);
        let mut out = [0.0; 3];
        gradient(&CancellationToken::new(), &mut out, &mut start, factory).unwrap();
        for d in out {
            assert!((d - 3.0).abs() < 1e-6, "gradient {out:?}");
        }
        let values: Vec<f64> = start.0.iter().map(|g| g.value()).collect();
        assert_eq!(values, starts.to_vec());
    }
}

#[test]
fn test_gene_that_cannot_move_is_reported() {
    let mut start = Scaled(vec![
        ConstrainedFloatGrad::new(0.5, 0.0, 1.0, 1e-3).unwrap(),
        ConstrainedFloatGrad::new(1.0, 1.0, 1.0, 1e-3).unwrap(),
    ]);
    let mut out = [0.0; 2];
    let err = gradient(&CancellationToken::new(), &mut out, &mut start, None).unwrap_err();
    assert_eq!(err, Error::PinnedGene { index: 1 });
    assert!(err.is_validation());
    assert_eq!(start.0[1].value(), 1.0);
}
