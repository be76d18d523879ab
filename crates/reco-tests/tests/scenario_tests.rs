//! End-to-end recommendation scenarios against hand-built networks.

use std::collections::BTreeSet;

use reco_calls::constants::UNKNOWN_METHOD;
use reco_calls::{
    by_relevance, min_relevance, recommend_for_usage, CallRecommendationNet, DefinitionKind,
    MethodName, ObjectUsage, TypeName,
};
use reco_tests::fixtures;

fn assert_close(actual: f64, expected: f64, tolerance: f64, label: &str) {
    assert!(
        (actual - expected).abs() <= tolerance,
        "{label} mismatch: expected {expected:.15}, got {actual:.15}"
    );
}

fn string_net() -> CallRecommendationNet {
    CallRecommendationNet::new(fixtures::string_type(), &fixtures::string_network()).unwrap()
}

/// Pushes the "empty query" observation set: unknown enclosing method,
/// unknown kind, no definition, no observed calls.
fn observe_empty_query(net: &mut CallRecommendationNet) {
    net.reset();
    assert!(net.set_observed_enclosing_method(None));
    assert!(net.set_observed_kind(None));
    assert!(net.set_observed_calls(&BTreeSet::new()));
}

#[test]
fn empty_query_ranks_string_methods() {
    let mut net = string_net();
    observe_empty_query(&mut net);

    let recommendations = net.recommended_calls(min_relevance(0.1), by_relevance(), 5);
    assert!(recommendations.len() <= 5);
    for window in recommendations.windows(2) {
        assert!(window[0].relevance() >= window[1].relevance());
    }
    for recommendation in &recommendations {
        assert!((0.1..=1.0).contains(&recommendation.relevance()));
    }

    // With evidence {context=unknown, kind=UNKNOWN, none=false} the pattern
    // posterior is [0.04, 0.07125, 0.054] / 0.16525, which puts length()
    // first:
    //   P(length)      = 0.109075 / 0.16525
    //   P(toLowerCase) = 0.086925 / 0.16525
    //   P(charAt)      = 0.075275 / 0.16525
    let names: Vec<&str> = recommendations
        .iter()
        .map(|r| r.proposal().identifier())
        .collect();
    assert_eq!(
        names,
        [
            "Ljava/lang/String.length()I",
            "Ljava/lang/String.toLowerCase()Ljava/lang/String;",
            "Ljava/lang/String.charAt(I)C",
        ]
    );
    assert_close(
        recommendations[0].relevance(),
        0.109075 / 0.16525,
        1e-9,
        "P(length)",
    );
    assert_close(
        recommendations[1].relevance(),
        0.086925 / 0.16525,
        1e-9,
        "P(toLowerCase)",
    );
    assert_close(
        recommendations[2].relevance(),
        0.075275 / 0.16525,
        1e-9,
        "P(charAt)",
    );
}

#[test]
fn observed_calls_disappear_from_recommendations() {
    let mut net = string_net();
    observe_empty_query(&mut net);

    let to_lower = MethodName::new("Ljava/lang/String.toLowerCase()Ljava/lang/String;");
    assert!(net.set_observed_call(&to_lower));

    let recommendations = net.recommended_calls(min_relevance(0.1), by_relevance(), 5);
    assert!(recommendations
        .iter()
        .all(|r| *r.proposal() != to_lower));
    assert!(net.observed_calls().contains(&to_lower));
}

#[test]
fn unknown_pattern_leaves_the_session_untouched() {
    let mut net = string_net();
    let before = net.recommended_patterns(|_| true, by_relevance(), 10);

    assert!(!net.set_observed_pattern("does_not_exist"));

    let after = net.recommended_patterns(|_| true, by_relevance(), 10);
    assert_eq!(before, after);
    let labels: BTreeSet<String> = after
        .iter()
        .map(|r| r.proposal().clone())
        .collect();
    assert_eq!(labels, net.known_patterns());
}

#[test]
fn overwritten_call_evidence_stays_consistent() {
    use reco_calls::constants::{FALSE_STATE, TRUE_STATE};

    let mut net = string_net();
    let to_lower = MethodName::new("Ljava/lang/String.toLowerCase()Ljava/lang/String;");
    assert!(net.set_called(&to_lower, TRUE_STATE));
    // The second pin overwrites the first instead of contradicting it.
    assert!(net.set_called(&to_lower, FALSE_STATE));
    assert!(net.observed_calls().is_empty());
    assert!(net.is_consistent());
    let mass: f64 = net
        .recommended_patterns(|_| true, by_relevance(), 10)
        .iter()
        .map(|r| r.relevance())
        .sum();
    assert_close(mass, 1.0, 1e-9, "pattern mass");
}

#[test]
fn contradictory_evidence_zeroes_beliefs_without_crashing() {
    let mut net =
        CallRecommendationNet::new(TypeName::new("LT"), &fixtures::contradictory_network())
            .unwrap();
    // The observed outcome exists but has prior zero.
    assert!(net.set_observed_enclosing_method(Some(&MethodName::new("LGhost.run()V"))));
    assert!(!net.is_consistent());

    let calls = net.recommended_calls(|_| true, by_relevance(), 10);
    assert!(calls.iter().all(|r| r.relevance() == 0.0));
    let patterns = net.recommended_patterns(|_| true, by_relevance(), 10);
    assert!(patterns.iter().all(|r| r.relevance() == 0.0));

    // Lifting the contradiction restores the session.
    net.reset();
    assert!(net.is_consistent());
}

#[test]
fn definition_sentinels_are_filtered() {
    let mut net = CallRecommendationNet::new(
        TypeName::new("LX"),
        &fixtures::definition_sentinel_network(),
    )
    .unwrap();
    let recommendations = net.recommended_definitions(|_| true, by_relevance(), 10);
    // none (0.48) and unknown (0.08) are sentinels, bar (0.04) is below the
    // belief floor; only foo survives.
    assert_eq!(recommendations.len(), 1);
    assert_eq!(recommendations[0].proposal().identifier(), "LX.foo()V");
    assert_close(recommendations[0].relevance(), 0.4, 1e-9, "P(foo)");
}

#[test]
fn node_declaration_order_does_not_change_beliefs() {
    let mut first = string_net();
    let mut second =
        CallRecommendationNet::new(fixtures::string_type(), &fixtures::shuffled_string_network())
            .unwrap();

    for net in [&mut first, &mut second] {
        observe_empty_query(net);
        assert!(net.set_observed_pattern("p1"));
    }

    let left = first.recommended_calls(|_| true, by_relevance(), 10);
    let right = second.recommended_calls(|_| true, by_relevance(), 10);
    assert_eq!(left.len(), right.len());
    for (a, b) in left.iter().zip(&right) {
        assert_eq!(a.proposal(), b.proposal());
        assert_close(a.relevance(), b.relevance(), 1e-9, "declaration order");
    }
}

#[test]
fn usage_replay_matches_manual_observation() {
    let usage = ObjectUsage {
        enclosing_method: Some(MethodName::new("LApp.main([Ljava/lang/String;)V")),
        kind: Some(DefinitionKind::New),
        definition: Some(MethodName::new("Ljava/lang/String.<init>()V")),
        calls: BTreeSet::from([MethodName::new("Ljava/lang/String.charAt(I)C")]),
    };

    let mut replayed = string_net();
    let from_usage = recommend_for_usage(&mut replayed, &usage);

    let mut manual = string_net();
    manual.reset();
    assert!(manual.set_observed_enclosing_method(usage.enclosing_method.as_ref()));
    assert!(manual.set_observed_kind(usage.kind));
    assert!(manual.set_observed_definition(usage.definition.as_ref()));
    assert!(manual.set_observed_calls(&usage.calls));
    let by_hand = manual.recommended_calls(min_relevance(0.1), by_relevance(), 5);

    assert_eq!(from_usage, by_hand);
}

#[test]
fn unknown_definitions_are_treated_as_absent_in_usages() {
    let usage = ObjectUsage {
        definition: Some(MethodName::new(UNKNOWN_METHOD)),
        ..ObjectUsage::default()
    };
    let mut net = string_net();
    recommend_for_usage(&mut net, &usage);
    assert_eq!(net.observed_definition(), None);
}

#[test]
fn known_views_cover_the_model_space() {
    let net = string_net();
    assert_eq!(net.known_calls().len(), 4);
    assert_eq!(net.known_patterns().len(), 3);
    assert!(net
        .known_enclosing_methods()
        .contains(&MethodName::new(UNKNOWN_METHOD)));
}
