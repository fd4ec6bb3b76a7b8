use rand::Rng;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use symbios_islands::genes::ConstrainedFloat;
use symbios_islands::{CancellationToken, Error, Gene, Genome, find_codependency};

// --- Mock Infrastructure ---

struct Independent(Vec<ConstrainedFloat>);

impl Genome for Independent {
    type Gene = ConstrainedFloat;
    fn simulate(&mut self, _token: &CancellationToken) -> f64 {
        self.0.iter().map(|g| g.value()).sum()
    }
    fn gene_count(&self) -> usize {
        self.0.len()
    }
    fn gene(&self, i: usize) -> &ConstrainedFloat {
        &self.0[i]
    }
    fn gene_mut(&mut self, i: usize) -> &mut ConstrainedFloat {
        &mut self.0[i]
    }
}

/// Gene whose value lives in a slice shared across individuals.
struct Shared {
    store: Arc<Mutex<Vec<f64>>>,
    idx: usize,
}

impl Gene for Shared {
    fn mutate<R: Rng>(&mut self, rng: &mut R) {
        self.store.lock().unwrap()[self.idx] = rng.random_range(2.0..3.0);
    }
    fn splice<R: Rng>(&mut self, _rng: &mut R, _other: &Self) {}
    fn clone_from_gene(&mut self, _other: &Self) {}
}

/// Every gene is backed by the shared slice.
struct AllShared(Vec<Shared>);

impl Genome for AllShared {
    type Gene = Shared;
    fn simulate(&mut self, _token: &CancellationToken) -> f64 {
        self.0[0].store.lock().unwrap().iter().sum()
    }
    fn gene_count(&self) -> usize {
        self.0.len()
    }
    fn gene(&self, i: usize) -> &Shared {
        &self.0[i]
    }
    fn gene_mut(&mut self, i: usize) -> &mut Shared {
        &mut self.0[i]
    }
}

enum Either {
    Shared(Shared),
    Own(ConstrainedFloat),
}

impl Gene for Either {
    fn mutate<R: Rng>(&mut self, rng: &mut R) {
        match self {
            Either::Shared(g) => g.mutate(rng),
            Either::Own(g) => g.mutate(rng),
        }
    }
    fn splice<R: Rng>(&mut self, _rng: &mut R, _other: &Self) {}
    fn clone_from_gene(&mut self, _other: &Self) {}
}

struct Mixed(Vec<Either>);

impl Genome for Mixed {
    type Gene = Either;
    fn simulate(&mut self, _token: &CancellationToken) -> f64 {
        self.0
            .iter()
            .map(|g| match g {
                Either::Shared(s) => s.store.lock().unwrap()[s.idx],
                Either::Own(o) => o.value(),
            })
            .sum()
    }
    fn gene_count(&self) -> usize {
        self.0.len()
    }
    fn gene(&self, i: usize) -> &Either {
        &self.0[i]
    }
    fn gene_mut(&mut self, i: usize) -> &mut Either {
        &mut self.0[i]
    }
}

#[test]
fn test_independent_factory_passes() {
    let result = find_codependency(1, || Independent(vec![ConstrainedFloat::unit(0.5); 6]));
    assert_eq!(result, Ok(()));
}

#[test]
fn test_shared_slice_names_codependent_genes() {
    let store = Arc::new(Mutex::new(vec![1.0; 3]));
    let factory = || {
        Mixed(vec![
            Either::Shared(Shared {
                store: store.clone(),
                idx: 0,
            }),
            Either::Own(ConstrainedFloat::unit(0.5)),
            Either::Shared(Shared {
                store: store.clone(),
                idx: 2,
            }),
        ])
    };
    match find_codependency(2, factory) {
        Err(Error::Codependency { indices }) => assert_eq!(indices, vec![0, 2]),
        other => panic!("expected codependency, got {other:?}"),
    }
}

#[test]
fn test_all_shared_genes_flagged() {
    let store = Arc::new(Mutex::new(vec![1.0; 4]));
    let factory = || {
        AllShared(
            (0..4)
                .map(|idx| Shared {
                    store: store.clone(),
                    idx,
                })
                .collect(),
        )
    };
    let err = find_codependency(3, factory).unwrap_err();
    assert_eq!(
        err,
        Error::Codependency {
            indices: vec![0, 1, 2, 3]
        }
    );
    assert!(err.to_string().contains("[0, 1, 2, 3]"));
}

#[test]
fn test_factory_with_captured_counter_detected() {
    let counter = AtomicUsize::new(1);
    let factory = || {
        let n = counter.fetch_add(1, Ordering::SeqCst);
        Independent(vec![ConstrainedFloat::unit(1.0 / n as f64); 2])
    };
    assert_eq!(
        find_codependency(4, factory),
        Err(Error::Codependency { indices: vec![] })
    );
}

#[test]
fn test_zero_fitness_is_inconclusive() {
    let result = find_codependency(5, || Independent(vec![ConstrainedFloat::unit(0.0); 3]));
    assert_eq!(result, Err(Error::Inconclusive));
}

#[test]
fn test_invalid_fitness_reported() {
    struct NanGenome(Vec<ConstrainedFloat>);
    impl Genome for NanGenome {
        type Gene = ConstrainedFloat;
        fn simulate(&mut self, _token: &CancellationToken) -> f64 {
            f64::NAN
        }
        fn gene_count(&self) -> usize {
            self.0.len()
        }
        fn gene(&self, i: usize) -> &ConstrainedFloat {
            &self.0[i]
        }
        fn gene_mut(&mut self, i: usize) -> &mut ConstrainedFloat {
            &mut self.0[i]
        }
    }
    let result = find_codependency(6, || NanGenome(vec![ConstrainedFloat::unit(0.5)]));
    assert!(matches!(result, Err(Error::InvalidFitness(f)) if f.is_nan()));
}
