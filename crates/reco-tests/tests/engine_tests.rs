//! Engine-level invariants checked against the shared fixture networks.

use std::sync::Arc;

use reco_bayes::{BayesNet, JunctionTree, JunctionTreeInference};
use reco_tests::fixtures;

fn assert_close(actual: f64, expected: f64, tolerance: f64, label: &str) {
    assert!(
        (actual - expected).abs() <= tolerance,
        "{label} mismatch: expected {expected:.15}, got {actual:.15}"
    );
}

#[test]
fn belief_vectors_sum_to_one_for_every_node() {
    let net = Arc::new(BayesNet::from_descriptor(&fixtures::string_network()).unwrap());
    let mut inference = JunctionTreeInference::compile(Arc::clone(&net)).unwrap();

    let context = net.require_node("context").unwrap();
    inference.add_evidence(context, "dummy").unwrap();

    for id in net.node_ids() {
        let beliefs = inference.beliefs(id);
        let mass: f64 = beliefs.iter().sum();
        assert_close(mass, 1.0, 1e-9, net.node(id).identifier());
    }
}

#[test]
fn evidence_outcomes_carry_full_belief() {
    let net = Arc::new(BayesNet::from_descriptor(&fixtures::string_network()).unwrap());
    let patterns = net.require_node("patterns").unwrap();
    let mut inference = JunctionTreeInference::compile(Arc::clone(&net)).unwrap();
    inference.add_evidence(patterns, "p2").unwrap();

    let beliefs = inference.beliefs(patterns);
    assert_eq!(beliefs, vec![0.0, 0.0, 1.0]);
}

#[test]
fn every_containing_clique_agrees_on_marginals() {
    let net = Arc::new(BayesNet::from_descriptor(&fixtures::string_network()).unwrap());
    let patterns = net.require_node("patterns").unwrap();
    let kind = net.require_node("kind").unwrap();
    let mut inference = JunctionTreeInference::compile(Arc::clone(&net)).unwrap();
    inference.add_evidence(kind, "NEW").unwrap();

    let members: Vec<usize> = inference.tree().membership(patterns).to_vec();
    assert!(members.len() > 1, "patterns should span several cliques");
    let reference = inference.clique_marginal(members[0], patterns).unwrap();
    for &clique in &members[1..] {
        let other = inference.clique_marginal(clique, patterns).unwrap();
        for (left, right) in reference.iter().zip(&other) {
            assert_close(*left, *right, 1e-9, "cross-clique marginal");
        }
    }
}

#[test]
fn junction_tree_construction_is_reproducible() {
    let net = BayesNet::from_descriptor(&fixtures::string_network()).unwrap();
    let first = JunctionTree::build(&net).unwrap();
    let second = JunctionTree::build(&net).unwrap();
    assert_eq!(first, second);

    let stats = first.stats();
    assert_eq!(stats.clique_count, first.cliques().len());
    assert!(stats.largest_clique >= 2);
    assert!(stats.largest_table >= 4);
}

#[test]
fn replaying_the_same_evidence_is_bit_identical() {
    let net = Arc::new(BayesNet::from_descriptor(&fixtures::string_network()).unwrap());
    let context = net.require_node("context").unwrap();
    let kind = net.require_node("kind").unwrap();
    let length = net.require_node("Ljava/lang/String.length()I").unwrap();
    let mut inference = JunctionTreeInference::compile(Arc::clone(&net)).unwrap();

    inference.add_evidence(context, "dummy").unwrap();
    inference.add_evidence(kind, "FIELD").unwrap();
    let first = inference.beliefs(length);

    inference.clear_evidence();
    inference.add_evidence(context, "dummy").unwrap();
    inference.add_evidence(kind, "FIELD").unwrap();
    let second = inference.beliefs(length);

    assert_eq!(first, second);
}
