use std::sync::Arc;

use pgmlib::inference::{InferenceState, ShaferShenoy, VariableElimination};
use pgmlib::model::{BayesNet, GraphicalModel};
use pgmlib::multidim::Aggregator;
use pgmlib::triangulation::{
    DefaultEliminationSequenceStrategy, DefaultJunctionTreeStrategy, EliminationHeuristic,
    Triangulation,
};
use pgmlib::{Config, DiscreteVariable, NodeSet, PgmError, TableAlgebra};

const NAMES: [&str; 8] = [
    "visit_to_asia",
    "smoking",
    "tuberculosis",
    "lung_cancer",
    "bronchitis",
    "tub_or_lung",
    "positive_xray",
    "dysp",
];

/// The classical chest clinic network. Every CPT lists the node values fastest, then its
/// parents in the given order.
fn asia(or_aggregator: bool) -> BayesNet {
    let mut bn = BayesNet::new();
    let v = |n: &str| DiscreteVariable::binary(n);
    let asia = bn.add_node_with_cpt(v("visit_to_asia"), &[], vec![0.99, 0.01]).unwrap();
    let smoking = bn.add_node_with_cpt(v("smoking"), &[], vec![0.5, 0.5]).unwrap();
    let tub = bn
        .add_node_with_cpt(v("tuberculosis"), &[asia], vec![0.99, 0.01, 0.95, 0.05])
        .unwrap();
    let lung = bn
        .add_node_with_cpt(v("lung_cancer"), &[smoking], vec![0.99, 0.01, 0.9, 0.1])
        .unwrap();
    let bronc = bn
        .add_node_with_cpt(v("bronchitis"), &[smoking], vec![0.7, 0.3, 0.4, 0.6])
        .unwrap();
    let either = if or_aggregator {
        let either = bn.add_variable(v("tub_or_lung")).unwrap();
        bn.set_aggregator(either, Aggregator::Or).unwrap();
        bn.add_arc(tub, either).unwrap();
        bn.add_arc(lung, either).unwrap();
        either
    } else {
        bn.add_node_with_cpt(
            v("tub_or_lung"),
            &[tub, lung],
            vec![1.0, 0.0, 0.0, 1.0, 0.0, 1.0, 0.0, 1.0],
        )
        .unwrap()
    };
    bn.add_node_with_cpt(v("positive_xray"), &[either], vec![0.95, 0.05, 0.02, 0.98])
        .unwrap();
    bn.add_node_with_cpt(
        v("dysp"),
        &[either, bronc],
        vec![0.9, 0.1, 0.3, 0.7, 0.2, 0.8, 0.1, 0.9],
    )
    .unwrap();
    bn.check_cpts().unwrap();
    bn
}

const P_DYSP: f64 = 0.43597;
const P_LUNG: f64 = 0.055;

fn p_true<M: GraphicalModel>(ss: &mut ShaferShenoy<M>, name: &str) -> f64 {
    ss.posterior_by_name(name).unwrap().to_vec()[1]
}

#[test]
fn reference_marginals() {
    let bn = Arc::new(asia(false));
    let mut ss = ShaferShenoy::new(bn.clone(), &Config::default());
    assert!((p_true(&mut ss, "dysp") - P_DYSP).abs() < 1e-4);
    assert!((p_true(&mut ss, "lung_cancer") - P_LUNG).abs() < 1e-9);
    assert!((p_true(&mut ss, "visit_to_asia") - 0.01).abs() < 1e-12);
    for name in NAMES {
        let post = ss.posterior_by_name(name).unwrap();
        assert!((post.sum() - 1.0).abs() < 1e-6, "{} does not sum to one", name);
    }
    assert!((ss.evidence_probability().unwrap() - 1.0).abs() < 1e-9);

    let ve = VariableElimination::new(bn);
    for name in NAMES {
        let a = ss.posterior_by_name(name).unwrap();
        let b = ve.posterior_by_name(name).unwrap();
        assert!(a.approx_eq(&b, 1e-9), "{} differs between engines", name);
    }
}

#[test]
fn smoking_raises_lung_cancer() {
    let bn = Arc::new(asia(false));
    let smoking = bn.id_from_name("smoking").unwrap();
    let mut ss = ShaferShenoy::new(bn.clone(), &Config::default());
    let baseline = p_true(&mut ss, "lung_cancer");
    ss.add_evidence_by_label(smoking, "true").unwrap();
    assert_eq!(ss.state(), InferenceState::Dirty);
    let given_smoking = p_true(&mut ss, "lung_cancer");
    assert!(given_smoking > baseline);
    assert!((given_smoking - 0.1).abs() < 1e-9);
    assert_eq!(ss.posterior(smoking).unwrap().to_vec(), vec![0.0, 1.0]);
    assert!((ss.evidence_probability().unwrap() - 0.5).abs() < 1e-12);

    let mut ve = VariableElimination::new(bn);
    ve.add_evidence(smoking, 1).unwrap();
    let lung = ve.posterior_by_name("lung_cancer").unwrap().to_vec()[1];
    assert!((lung - given_smoking).abs() < 1e-12);
}

#[test]
fn engines_agree_under_evidence() {
    let bn = Arc::new(asia(false));
    let id = |n: &str| bn.id_from_name(n).unwrap();
    let configs = [
        Config::default(),
        Config::default().with_scheduler(true).with_max_threads(1),
        Config::default().with_scheduler(true).with_max_threads(4),
    ];
    let mut ve = VariableElimination::new(bn.clone());
    ve.add_evidence(id("positive_xray"), 1).unwrap();
    ve.add_soft_evidence(id("dysp"), vec![0.2, 0.7]).unwrap();
    for config in configs.iter() {
        for binary in [false, true] {
            let mut ss = ShaferShenoy::new(bn.clone(), config);
            ss.use_binary_join_tree(binary);
            ss.add_evidence(id("positive_xray"), 1).unwrap();
            ss.add_soft_evidence(id("dysp"), vec![0.2, 0.7]).unwrap();
            for name in NAMES {
                let a = ss.posterior_by_name(name).unwrap();
                let b = ve.posterior_by_name(name).unwrap();
                assert!(a.approx_eq(&b, 1e-9), "{} differs", name);
            }
            let pe = ss.evidence_probability().unwrap();
            assert!((pe - ve.evidence_probability().unwrap()).abs() < 1e-12);
        }
    }
}

#[test]
fn triangulation_choice_does_not_change_results() {
    let bn = Arc::new(asia(false));
    let mut reference = ShaferShenoy::new(bn.clone(), &Config::default());
    for heuristic in [EliminationHeuristic::MinFill, EliminationHeuristic::MinDegree] {
        let triangulation = Triangulation::new(
            Box::new(DefaultEliminationSequenceStrategy::new(heuristic)),
            Box::new(DefaultJunctionTreeStrategy),
        )
        .with_minimality(true);
        let mut ss =
            ShaferShenoy::new(bn.clone(), &Config::default()).with_triangulation(triangulation);
        for name in NAMES {
            let a = ss.posterior_by_name(name).unwrap();
            let b = reference.posterior_by_name(name).unwrap();
            assert!(a.approx_eq(&b, 1e-12));
        }
        assert!(ss.junction_tree().unwrap().has_running_intersection());
    }
}

#[test]
fn or_aggregator_matches_explicit_cpt() {
    let explicit = Arc::new(asia(false));
    let aggregated = Arc::new(asia(true));
    let mut a = ShaferShenoy::new(explicit, &Config::default());
    let mut b = ShaferShenoy::new(aggregated, &Config::default());
    for name in NAMES {
        assert!(a
            .posterior_by_name(name)
            .unwrap()
            .approx_eq(&b.posterior_by_name(name).unwrap(), 1e-12));
    }
}

#[test]
fn joint_posterior_and_max_product() {
    let bn = Arc::new(asia(false));
    let id = |n: &str| bn.id_from_name(n).unwrap();
    let mut ss = ShaferShenoy::new(bn.clone(), &Config::default());
    let pair = NodeSet::from([id("lung_cancer"), id("bronchitis")]);
    ss.add_joint_target(pair.clone()).unwrap();
    let joint = ss.joint_posterior(&pair).unwrap();
    assert!((joint.sum() - 1.0).abs() < 1e-12);
    // Both only depend on smoking.
    let p = 0.5 * 0.01 * 0.3 + 0.5 * 0.1 * 0.6;
    assert!((joint.to_vec()[3] - p).abs() < 1e-12);

    ss.set_algebra(TableAlgebra::max_product());
    let mpe = ss.posterior_by_name("visit_to_asia").unwrap();
    assert!((mpe.sum() - 1.0).abs() < 1e-12);
    assert!(mpe.to_vec()[0] > mpe.to_vec()[1]);
    assert!(matches!(
        ss.evidence_probability(),
        Err(PgmError::OperationNotAllowed(_))
    ));
}

#[test]
fn impossible_evidence_is_reported() {
    let bn = Arc::new(asia(false));
    let id = |n: &str| bn.id_from_name(n).unwrap();
    let mut ss = ShaferShenoy::new(bn.clone(), &Config::default());
    ss.add_evidence(id("tuberculosis"), 1).unwrap();
    ss.add_evidence(id("tub_or_lung"), 0).unwrap();
    assert!(matches!(
        ss.posterior_by_name("dysp"),
        Err(PgmError::IncompatibleEvidence)
    ));
    assert_eq!(ss.evidence_probability().unwrap(), 0.0);
    assert!(matches!(
        ss.posterior_by_name("cough"),
        Err(PgmError::NotFound(_))
    ));
}

#[test]
fn min_sum_agrees_with_max_product() {
    let mut pair = BayesNet::new();
    let a = pair
        .add_node_with_cpt(DiscreteVariable::binary("a"), &[], vec![0.9, 0.1])
        .unwrap();
    let b = pair
        .add_node_with_cpt(DiscreteVariable::binary("b"), &[a], vec![0.8, 0.2, 0.3, 0.7])
        .unwrap();
    let mut ss = ShaferShenoy::new(Arc::new(pair), &Config::default());
    ss.set_algebra(TableAlgebra::max_product());
    let max_product = ss.posterior(b).unwrap();
    assert!(max_product.approx_eq(
        &pgmlib::Potential::from_values(vec![b], vec![2], vec![0.8, 0.2]).unwrap(),
        1e-12
    ));
    ss.set_algebra(TableAlgebra::min_sum());
    let min_sum = ss.posterior(b).unwrap();
    assert!(min_sum.approx_eq(&max_product, 1e-12));
    assert_eq!(min_sum.argmax().0.values(), &[0]);

    let bn = Arc::new(asia(false));
    let smoking = bn.id_from_name("smoking").unwrap();
    let mut mp = ShaferShenoy::new(bn.clone(), &Config::default());
    mp.set_algebra(TableAlgebra::max_product());
    let mut ms = ShaferShenoy::new(bn, &Config::default().with_scheduler(true));
    ms.set_algebra(TableAlgebra::min_sum());
    for ss in [&mut mp, &mut ms] {
        ss.add_evidence(smoking, 1).unwrap();
    }
    for name in NAMES {
        let x = mp.posterior_by_name(name).unwrap();
        let y = ms.posterior_by_name(name).unwrap();
        assert!(x.approx_eq(&y, 1e-9), "{} differs", name);
    }
}
