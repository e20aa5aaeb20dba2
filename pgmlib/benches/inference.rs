use std::sync::Arc;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use ndarray::Array1;
use ndarray_rand::rand_distr::Uniform;
use ndarray_rand::RandomExt;
use pgmlib::inference::{ShaferShenoy, VariableElimination};
use pgmlib::model::BayesNet;
use pgmlib::{Config, DiscreteVariable, NodeId};

/// Grid-shaped network: each node has its left and upper neighbours as parents.
fn grid(side: usize, domain_size: usize) -> BayesNet {
    let mut bn = BayesNet::new();
    let mut ids: Vec<NodeId> = Vec::with_capacity(side * side);
    for r in 0..side {
        for c in 0..side {
            let mut parents = Vec::new();
            if c > 0 {
                parents.push(ids[r * side + c - 1]);
            }
            if r > 0 {
                parents.push(ids[(r - 1) * side + c]);
            }
            let size = domain_size.pow(parents.len() as u32 + 1);
            let values = Array1::<f64>::random(size, Uniform::new(0.01, 1.0)).to_vec();
            let var = DiscreteVariable::with_domain_size(format!("x{}_{}", r, c), domain_size)
                .unwrap();
            let id = bn.add_node_with_cpt(var, &parents, values).unwrap();
            bn.cpt_mut(id).unwrap().normalize_as_cpt(id).unwrap();
            ids.push(id);
        }
    }
    bn
}

fn bench_inference(c: &mut Criterion) {
    let mut group = c.benchmark_group("inference");
    for side in [3, 5, 7] {
        let bn = Arc::new(grid(side, 3));
        // Bottom-right corner.
        let last: NodeId = side * side - 1;
        group.bench_with_input(BenchmarkId::new("shafer_shenoy", side), &side, |b, _| {
            b.iter(|| {
                let mut ss = ShaferShenoy::new(bn.clone(), &Config::no_progress());
                ss.posterior(last).unwrap()
            })
        });
        group.bench_with_input(
            BenchmarkId::new("shafer_shenoy_scheduled", side),
            &side,
            |b, _| {
                let config = Config::no_progress().with_scheduler(true);
                b.iter(|| {
                    let mut ss = ShaferShenoy::new(bn.clone(), &config);
                    ss.posterior(last).unwrap()
                })
            },
        );
        group.bench_with_input(
            BenchmarkId::new("variable_elimination", side),
            &side,
            |b, _| {
                let ve = VariableElimination::new(bn.clone());
                b.iter(|| ve.posterior(last).unwrap())
            },
        );
    }
    group.finish();
}

criterion_group!(benches, bench_inference);
criterion_main!(benches);
