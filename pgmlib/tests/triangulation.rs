use pgmgraph::UndiGraph;
use pgmlib::triangulation::{
    component_roots, BinaryJoinTreeConverter, DefaultEliminationSequenceStrategy,
    DefaultJunctionTreeStrategy, EliminationHeuristic, OrderedEliminationSequenceStrategy,
    PartialOrderedEliminationSequenceStrategy, Triangulation,
};
use pgmlib::{DomainSizes, NodeSet};
use proptest::prelude::*;

const HEURISTICS: [EliminationHeuristic; 3] = [
    EliminationHeuristic::MinFill,
    EliminationHeuristic::MinDegree,
    EliminationHeuristic::WeightedMinFill,
];

fn problem_strategy() -> impl Strategy<Value = (UndiGraph, DomainSizes)> {
    (1usize..10).prop_flat_map(|n| {
        (
            proptest::collection::vec(any::<bool>(), n * (n - 1) / 2),
            proptest::collection::vec(2usize..5, n),
        )
            .prop_map(move |(mask, sizes)| {
                let mut g = UndiGraph::with_nodes(n);
                let pairs = (0..n).flat_map(|i| (i + 1..n).map(move |j| (i, j)));
                for ((i, j), keep) in pairs.zip(mask.iter()) {
                    if *keep {
                        g.add_edge(i, j).unwrap();
                    }
                }
                let ds = sizes.into_iter().enumerate().collect();
                (g, ds)
            })
    })
}

fn triangulation(heuristic: EliminationHeuristic) -> Triangulation {
    Triangulation::new(
        Box::new(DefaultEliminationSequenceStrategy::new(heuristic)),
        Box::new(DefaultJunctionTreeStrategy),
    )
}

#[test]
fn missing_domain_sizes_are_rejected_eagerly() {
    let g = UndiGraph::with_nodes(3);
    let mut t = Triangulation::default();
    assert!(t.set_graph(Some(&g), None).is_err());
    let partial: DomainSizes = [(0, 2), (1, 2)].into_iter().collect();
    assert!(t.set_graph(Some(&g), Some(&partial)).is_err());
    assert!(t.elimination_order().is_err());
}

#[test]
fn ordered_strategy_follows_its_order() {
    let mut g = UndiGraph::with_nodes(4);
    for (a, b) in [(0, 1), (1, 2), (2, 3), (3, 0)] {
        g.add_edge(a, b).unwrap();
    }
    let ds: DomainSizes = (0..4).map(|n| (n, 2)).collect();
    let mut t = Triangulation::new(
        Box::new(OrderedEliminationSequenceStrategy::new(vec![3, 1, 0, 2])),
        Box::new(DefaultJunctionTreeStrategy),
    );
    t.set_graph(Some(&g), Some(&ds)).unwrap();
    assert_eq!(t.elimination_order().unwrap(), &[3, 1, 0, 2]);
    // Eliminating 3 first links 0 and 2.
    assert!(t.fill_ins().unwrap().iter().any(|e| e.first() == 0 && e.second() == 2));
    assert_eq!(t.junction_tree().unwrap().size(), 2);
}

#[test]
fn partial_order_is_respected() {
    let mut g = UndiGraph::with_nodes(5);
    for (a, b) in [(0, 1), (1, 2), (2, 3), (3, 4)] {
        g.add_edge(a, b).unwrap();
    }
    let ds: DomainSizes = (0..5).map(|n| (n, 3)).collect();
    let strategy = PartialOrderedEliminationSequenceStrategy::new(
        EliminationHeuristic::MinFill,
        vec![NodeSet::from([2, 3]), NodeSet::from([0])],
    )
    .unwrap();
    let mut t = Triangulation::new(Box::new(strategy), Box::new(DefaultJunctionTreeStrategy));
    t.set_graph(Some(&g), Some(&ds)).unwrap();
    let order = t.elimination_order().unwrap().to_vec();
    let first: NodeSet = order[..2].iter().copied().collect();
    assert_eq!(first, NodeSet::from([2, 3]));
    assert_eq!(order[2], 0);
}

proptest! {
    #[test]
    fn triangulated_graphs_are_chordal((g, ds) in problem_strategy()) {
        for heuristic in HEURISTICS {
            let mut t = triangulation(heuristic);
            t.set_graph(Some(&g), Some(&ds)).unwrap();
            let tri = t.triangulated_graph().unwrap().clone();
            prop_assert!(tri.is_chordal());
            for e in g.edges() {
                prop_assert!(tri.exists_edge(e.first(), e.second()));
            }
            for e in t.fill_ins().unwrap().iter() {
                prop_assert!(!g.exists_edge(e.first(), e.second()));
            }
            prop_assert_eq!(t.elimination_order().unwrap().len(), g.size());
        }
    }

    #[test]
    fn junction_trees_have_running_intersection((g, ds) in problem_strategy()) {
        for heuristic in HEURISTICS {
            let mut t = triangulation(heuristic);
            t.set_graph(Some(&g), Some(&ds)).unwrap();
            let jt = t.junction_tree().unwrap().clone();
            prop_assert!(jt.is_join_tree());
            prop_assert!(jt.has_running_intersection());
            // Every edge of the graph lies in some clique.
            for e in g.edges() {
                prop_assert!(jt.container_clique(&NodeSet::from([e.first(), e.second()])).is_some());
            }
            for n in g.nodes() {
                let c = t.created_junction_tree_clique(n).unwrap();
                prop_assert!(jt.clique(c).unwrap().contains(&n));
            }
        }
    }

    #[test]
    fn elimination_is_deterministic((g, ds) in problem_strategy()) {
        for heuristic in HEURISTICS {
            let mut t1 = triangulation(heuristic);
            let mut t2 = t1.new_factory();
            t1.set_graph(Some(&g), Some(&ds)).unwrap();
            t2.set_graph(Some(&g), Some(&ds)).unwrap();
            prop_assert_eq!(t1.elimination_order().unwrap(), t2.elimination_order().unwrap());
        }
    }

    #[test]
    fn minimal_triangulations_are_chordal_subsets((g, ds) in problem_strategy()) {
        let mut plain = triangulation(EliminationHeuristic::MinDegree);
        let mut minimal = plain.new_factory().with_minimality(true);
        plain.set_graph(Some(&g), Some(&ds)).unwrap();
        minimal.set_graph(Some(&g), Some(&ds)).unwrap();
        prop_assert!(minimal.triangulated_graph().unwrap().is_chordal());
        let plain_fill = plain.fill_ins().unwrap().clone();
        prop_assert!(minimal.fill_ins().unwrap().is_subset(&plain_fill));
    }

    #[test]
    fn binarized_trees_keep_running_intersection((g, ds) in problem_strategy()) {
        let mut t = Triangulation::default();
        t.set_graph(Some(&g), Some(&ds)).unwrap();
        let jt = t.junction_tree().unwrap().clone();
        let roots = component_roots(&jt);
        let bin = BinaryJoinTreeConverter::new().convert(&jt, &ds, &roots).unwrap();
        prop_assert!(bin.is_join_tree());
        prop_assert!(bin.has_running_intersection());
        prop_assert!(BinaryJoinTreeConverter::is_binary(&bin, &roots).unwrap());
        for (id, clique) in jt.cliques() {
            prop_assert_eq!(bin.clique(id).unwrap(), clique);
        }
    }
}
