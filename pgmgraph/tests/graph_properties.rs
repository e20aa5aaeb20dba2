use pgmgraph::{CliqueGraph, DiGraph, Edge, EdgeSet, NodeSet, UndiGraph};
use proptest::prelude::*;

/// Undirected graph on `n` nodes with the edges selected by `mask`.
fn graph_from_mask(n: usize, mask: &[bool]) -> UndiGraph {
    let mut g = UndiGraph::with_nodes(n);
    let pairs = (0..n).flat_map(|i| (i + 1..n).map(move |j| (i, j)));
    for ((i, j), keep) in pairs.zip(mask.iter()) {
        if *keep {
            g.add_edge(i, j).unwrap();
        }
    }
    g
}

fn graph_strategy() -> impl Strategy<Value = UndiGraph> {
    (1usize..9).prop_flat_map(|n| {
        proptest::collection::vec(any::<bool>(), n * (n - 1) / 2)
            .prop_map(move |mask| graph_from_mask(n, &mask))
    })
}

/// Chordality by repeated removal of simplicial nodes.
fn chordal_by_simplicial_removal(g: &UndiGraph) -> bool {
    let mut g = g.clone();
    while !g.is_empty() {
        let simplicial = g
            .nodes()
            .find(|n| g.is_complete_set(g.neighbours(*n).unwrap()));
        match simplicial {
            Some(n) => g.erase_node(n).unwrap(),
            None => return false,
        }
    }
    true
}

/// `g` plus the fill-ins of eliminating its nodes in id order.
fn eliminated(g: &UndiGraph) -> UndiGraph {
    let mut work = g.clone();
    let mut result = g.clone();
    let order: Vec<_> = g.nodes().collect();
    for n in order {
        let nbrs = work.neighbours(n).unwrap().clone();
        for e in work.make_complete(&nbrs).unwrap() {
            result.add_edge(e.first(), e.second()).unwrap();
        }
        work.erase_node(n).unwrap();
    }
    result
}

#[test]
fn cycles() {
    let mut square = UndiGraph::with_nodes(4);
    for (a, b) in [(0, 1), (1, 2), (2, 3), (3, 0)] {
        square.add_edge(a, b).unwrap();
    }
    assert!(!square.is_chordal());
    square.add_edge(0, 2).unwrap();
    assert!(square.is_chordal());
    let triangle = graph_from_mask(3, &[true, true, true]);
    assert!(triangle.is_chordal());
}

#[test]
fn completing_a_set_reports_new_edges() {
    let mut g = UndiGraph::with_nodes(4);
    g.add_edge(1, 3).unwrap();
    let set = NodeSet::from([0, 1, 3]);
    assert!(!g.is_complete_set(&set));
    let added = g.make_complete(&set).unwrap();
    assert_eq!(added, EdgeSet::from([Edge::new(0, 1), Edge::new(0, 3)]));
    assert!(g.is_complete_set(&set));
    assert!(!g.is_complete_set(&NodeSet::from([0, 1, 2])));
    assert!(g.make_complete(&set).unwrap().is_empty());
    assert!(g.is_complete_set(&NodeSet::from([2])));
}

#[test]
fn moral_graph_marries_parents() {
    let mut dag = DiGraph::new();
    let a = dag.add_node();
    let b = dag.add_node();
    let c = dag.add_node();
    dag.add_arc(a, c).unwrap();
    dag.add_arc(b, c).unwrap();
    assert!(dag.moral_graph().exists_edge(a, b));
    dag.erase_arc(b, c);
    assert!(!dag.moral_graph().exists_edge(a, b));
    assert!(dag.add_arc_acyclic(c, a).is_err());
}

#[test]
fn broken_running_intersection() {
    let mut jt = CliqueGraph::new();
    let x = jt.add_clique(NodeSet::from([0, 1]));
    let y = jt.add_clique(NodeSet::from([1, 2]));
    let z = jt.add_clique(NodeSet::from([2, 0]));
    jt.add_edge(x, y).unwrap();
    jt.add_edge(y, z).unwrap();
    assert!(jt.is_join_tree());
    // Node 0 is in x and z but not in y.
    assert!(!jt.has_running_intersection());
    assert!(jt.check_junction_tree().is_err());
}

proptest! {
    #[test]
    fn chordality_matches_simplicial_removal(g in graph_strategy()) {
        prop_assert_eq!(g.is_chordal(), chordal_by_simplicial_removal(&g));
    }

    #[test]
    fn elimination_triangulates(g in graph_strategy()) {
        let t = eliminated(&g);
        prop_assert!(t.is_chordal());
        for e in g.edges() {
            prop_assert!(t.exists_edge(e.first(), e.second()));
        }
    }

    #[test]
    fn components_partition_nodes(g in graph_strategy()) {
        let components = g.connected_components();
        let total: usize = components.iter().map(|c| c.len()).sum();
        prop_assert_eq!(total, g.size());
        for c in components.iter() {
            let first = *c.first().unwrap();
            for n in c.iter() {
                prop_assert!(g.path(first, *n).is_some());
            }
        }
    }

    #[test]
    fn topological_order_respects_arcs(mask in proptest::collection::vec(any::<bool>(), 21)) {
        let mut dag = DiGraph::new();
        for _ in 0..7 {
            dag.add_node();
        }
        let pairs = (0..7).flat_map(|i| (i + 1..7).map(move |j| (i, j)));
        for ((i, j), keep) in pairs.zip(mask.iter()) {
            if *keep {
                // Arcs from high to low ids, so that the order is not the id order.
                dag.add_arc(j, i).unwrap();
            }
        }
        let order = dag.topological_order().unwrap().to_vec();
        let position = |n: usize| order.iter().position(|m| *m == n).unwrap();
        for arc in dag.arcs() {
            prop_assert!(position(arc.tail()) < position(arc.head()));
        }
    }
}
