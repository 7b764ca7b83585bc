// Copyright 2026 The Simlin Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

use layout_eval::harness::fixtures::{self, Fixture, Scenario};
use layout_eval::instrument::{self, node_degrees};
use layout_eval::perception::keys::*;
use layout_eval::perception::{PerceptionMap, QualityValue};
use layout_eval::{
    Dimension, DimensionState, Intent, Node, SatisfactionResult, SatisfyOptions, SimulationConfig,
    Topology, perceive, run_simulation, satisfy, satisfy_all_intents,
};

fn settle(fixture: &Fixture) -> Topology {
    fixture.settle(&SimulationConfig::default())
}

/// Solve the fixture's own intent and check the solver reached a verdict on
/// its goal without tripping over its own rules.
fn judge(fixture: &Fixture, map: &PerceptionMap) -> SatisfactionResult {
    let result = satisfy(map, fixture.intent);
    assert!(
        result.contradictions.is_empty(),
        "{}: {:?}",
        fixture.name,
        result.contradictions
    );
    assert!(!result.fired_constraints.is_empty(), "{}", fixture.name);
    result
}

fn perceive_fixture(fixture: &Fixture) -> (Topology, PerceptionMap) {
    let settled = settle(fixture);
    let map = perceive(&settled.nodes, &settled.edges, &fixture.hints);
    (settled, map)
}

#[test]
fn pipeline_edges_stay_visible() {
    let fixture = fixtures::linear_pipeline(6);
    let (_, map) = perceive_fixture(&fixture);

    let invisible = map.score(INVISIBLE_EDGE_FRACTION).unwrap();
    assert!(invisible < 0.5, "invisible edge fraction {invisible}");
    assert!(map.is_present(PIPELINE_VISIBLE));
    assert!(map.is_present(PIPELINE_ELONGATION));

    let result = judge(&fixture, &map);
    assert_ne!(
        result.dimensions[&Dimension::GoalAchievable],
        DimensionState::Unknown
    );
    assert!(!result.fired_constraints.contains(&"trust.hidden_connectivity"));
}

#[test]
fn hub_is_dominant_and_legible() {
    let fixture = fixtures::hub_and_spoke(8);
    let (settled, map) = perceive_fixture(&fixture);

    let legibility = map.score(EDGE_LEGIBILITY_SCORE).unwrap();
    assert!(legibility > 0.5, "edge legibility {legibility}");
    assert!(map.is_true(HUB_DEGREE_DOMINANT));
    let degrees = node_degrees(&settled.nodes, &settled.edges);
    assert_eq!(degrees["hub"].total(), 8);

    let result = judge(&fixture, &map);
    assert_ne!(
        result.dimensions[&Dimension::GoalAchievable],
        DimensionState::Unknown
    );
    assert!(!result.fired_constraints.contains(&"goal.hub_not_dominant"));
}

#[test]
fn two_modules_report_cluster_and_boundary_metrics() {
    let fixture = fixtures::two_modules(6, 2);
    let (_, map) = perceive_fixture(&fixture);

    assert!(map.score(CROWDING_SCORE).unwrap() >= 0.0);
    assert!(map.score(BLOB_SEPARATION_RATIO).unwrap() >= 0.0);
    assert!(map.score(CROSS_BOUNDARY_COUNT).unwrap() > 0.0);
    assert!(map.is_present(CLUSTERS_DISTINCT));

    let result = judge(&fixture, &map);
    assert_ne!(
        result.dimensions[&Dimension::Trustworthy],
        DimensionState::Unknown
    );
}

#[test]
fn funnel_sink_collects_every_source() {
    let fixture = fixtures::funnel(6);
    let (settled, map) = perceive_fixture(&fixture);

    let degrees = node_degrees(&settled.nodes, &settled.edges);
    assert_eq!(degrees["sink"].in_degree, 6);
    assert!(map.is_present(FUNNEL_VISIBLE));

    let result = judge(&fixture, &map);
    assert_ne!(
        result.dimensions[&Dimension::GoalAchievable],
        DimensionState::Unknown
    );
}

#[test]
fn layered_stack_is_judged() {
    let fixture = fixtures::layered_stack(3);
    let (_, map) = perceive_fixture(&fixture);
    assert!(map.is_present(LAYERS_EVIDENT));
    assert_eq!(map.series(LAYER_MEAN_POSITIONS).map(<[f64]>::len), Some(3));
}

#[test]
fn every_scenario_answers_every_intent() {
    for scenario in Scenario::ALL {
        let fixture = scenario.build();
        let (_, map) = perceive_fixture(&fixture);
        let results = satisfy_all_intents(&map, &SatisfyOptions::default());

        assert_eq!(results.len(), Intent::ALL.len(), "{scenario}");
        for (intent, result) in &results {
            assert_eq!(result.intent, *intent);
            assert!(
                result.contradictions.is_empty(),
                "{scenario}/{intent}: {:?}",
                result.contradictions
            );
            assert_eq!(result.dimensions.len(), Dimension::ALL.len());
            assert!((0.0..=1.0).contains(&result.overall_score));
            assert!(!result.summary.is_empty());
            if result.satisfied {
                assert!(result.violations.is_empty());
            }
        }
    }
}

#[test]
fn pipeline_is_pure() {
    let fixture = fixtures::two_modules(6, 2);
    let before = fixture.topology.clone();

    let first = settle(&fixture);
    let second = settle(&fixture);
    assert_eq!(first, second, "settling is not deterministic");
    assert_eq!(fixture.topology, before, "settling mutated its input");

    let map_a = perceive(&first.nodes, &first.edges, &fixture.hints);
    let map_b = perceive(&first.nodes, &first.edges, &fixture.hints);
    assert_eq!(map_a, map_b);

    let a = satisfy(&map_a, fixture.intent);
    let b = satisfy(&map_a, fixture.intent);
    assert_eq!(a, b);
}

#[test]
fn unplaced_layout_is_unknown_not_failed() {
    // nothing settled: positions are absent everywhere
    let fixture = fixtures::hub_and_spoke(4);
    let map = perceive(
        &fixture.topology.nodes,
        &fixture.topology.edges,
        &fixture.hints,
    );
    assert_eq!(map.value(HUB_CENTRAL), &QualityValue::Absent);
    assert_eq!(map.value(HUB_CENTRALITY_ERROR), &QualityValue::Absent);
    // degrees do not need positions
    assert!(map.is_true(HUB_DEGREE_DOMINANT));
}

#[test]
fn too_small_a_layout_is_never_satisfying() {
    let config = SimulationConfig::default();
    let empty = run_simulation(&[], &[], &config);
    let lone = run_simulation(&[Node::new("only")], &[], &config);

    for settled in [empty, lone] {
        let map = perceive(&settled.nodes, &settled.edges, &Default::default());
        let results = satisfy_all_intents(&map, &SatisfyOptions::default());
        for (intent, result) in &results {
            assert!(!result.satisfied, "{intent}: {}", result.summary);
            assert!(result.fired_constraints.is_empty(), "{intent}");
            assert!(result.contradictions.is_empty());
            assert!(
                result
                    .dimensions
                    .values()
                    .all(|&state| state == DimensionState::Unknown)
            );
        }
    }
}

#[test]
fn topology_round_trips_through_json() {
    let fixture = Scenario::NestedModules.build();
    let settled = settle(&fixture);
    let json = serde_json::to_string(&settled).unwrap();
    let parsed = Topology::from_json(&json).unwrap();

    assert_eq!(parsed.edges, settled.edges);
    assert_eq!(parsed.nodes.len(), settled.nodes.len());
    for (a, b) in parsed.nodes.iter().zip(&settled.nodes) {
        assert_eq!(a.id, b.id);
        assert_eq!(a.group_path, b.group_path);
        let (pa, pb) = (a.position().unwrap(), b.position().unwrap());
        assert!(pa.distance(pb) < 1e-9, "{} moved in transit", a.id);
    }
}

/// Two-level nesting: each module's inner pipeline and hub should keep their
/// shapes and stay inside their own module. The harness flattens `m1/hub`,
/// `m1/pipeline` and the rest into peer groups and separates them as equals,
/// so the inner hub ends up far from the centre it is meant to anchor. This
/// goal is not met yet.
#[test]
#[ignore = "nested group containment is not modelled by the harness"]
fn nested_modules_keep_inner_shapes() {
    let fixture = fixtures::nested_modules();
    let (settled, map) = perceive_fixture(&fixture);

    assert!(map.is_true(PIPELINE_VISIBLE), "inner pipeline lost its line");
    assert!(
        map.is_true(HUB_CENTRAL),
        "inner hub is off centre: error {:?}",
        map.score(HUB_CENTRALITY_ERROR)
    );

    let outer = instrument::group_centroids_at_depth(&settled.nodes, 1);
    let inner = instrument::group_centroids_at_depth(&settled.nodes, 2);
    for (key, inner_group) in &inner {
        let parent = key.split('/').next().unwrap();
        let own = outer[parent].centroid;
        for (other_key, other) in &outer {
            if other_key != parent {
                assert!(
                    inner_group.centroid.distance(own) < inner_group.centroid.distance(other.centroid),
                    "{key} drifted toward {other_key}"
                );
            }
        }
    }
}
