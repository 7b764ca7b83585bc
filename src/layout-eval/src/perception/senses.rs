// Copyright 2026 The Simlin Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

//! The individual sub-perceptions. Each one writes only the keys it owns.

use std::collections::HashMap;

use tracing::debug;

use super::keys::{self, Sense};
use super::thresholds::*;
use super::{QualityValue, SenseInput, SenseWriter};
use crate::graph::Position;
use crate::instrument::{self, node_radius};

pub(super) fn run(sense: Sense, input: &SenseInput<'_>, out: &mut SenseWriter<'_>) {
    match sense {
        Sense::Crowding => crowding(input, out),
        Sense::EdgeLegibility => edge_legibility(input, out),
        Sense::Hairball => hairball(input, out),
        Sense::Balance => balance(input, out),
        Sense::Clusters => clusters(input, out),
        Sense::Pipeline => pipeline(input, out),
        Sense::Hub => hub(input, out),
        Sense::Funnel => funnel(input, out),
        Sense::Layers => layers(input, out),
        Sense::CrossBoundary => cross_boundary(input, out),
    }
}

fn placed_count(input: &SenseInput<'_>) -> usize {
    input.nodes.iter().filter(|n| n.position().is_some()).count()
}

fn group_count(input: &SenseInput<'_>) -> usize {
    instrument::group_centroids(input.nodes).len()
}

fn absent(out: &mut SenseWriter<'_>, sense: Sense) {
    for key in keys::keys_owned_by(sense) {
        out.put(key, QualityValue::Absent);
    }
}

fn crowding(input: &SenseInput<'_>, out: &mut SenseWriter<'_>) {
    if placed_count(input) < 2 {
        debug!("crowding needs at least two placed nodes");
        absent(out, Sense::Crowding);
        return;
    }
    let rate = instrument::overlap_rate(input.nodes);
    let count = instrument::overlap_count(input.nodes) as f64;
    out.put_calibrated(
        keys::GRAPH_READABLE,
        rate <= READABLE_MAX_OVERLAP_RATE,
        &[("overlap_count", count)],
    );
    out.put(keys::GRAPH_CROWDED, rate > CROWDED_MIN_OVERLAP_RATE);
    out.put(keys::CROWDING_SCORE, rate);
}

fn edge_legibility(input: &SenseInput<'_>, out: &mut SenseWriter<'_>) {
    let placed: HashMap<&str, (Position, f64)> = input
        .nodes
        .iter()
        .filter_map(|n| n.position().map(|p| (n.id.as_str(), (p, node_radius(n)))))
        .collect();

    let visible: Vec<f64> = input
        .edges
        .iter()
        .filter_map(|e| {
            let (p1, r1) = placed.get(e.source_id())?;
            let (p2, r2) = placed.get(e.target_id())?;
            Some((p1.distance(*p2) - r1 - r2).max(0.0))
        })
        .collect();

    if visible.is_empty() {
        debug!("no edge has both endpoints placed");
        absent(out, Sense::EdgeLegibility);
        return;
    }

    let n = visible.len() as f64;
    let invisible = visible
        .iter()
        .filter(|&&v| v < INVISIBLE_EDGE_MAX_VISIBLE_PX)
        .count() as f64;
    let invisible_fraction = invisible / n;
    let score = visible
        .iter()
        .map(|v| (v / LEGIBLE_EDGE_VISIBLE_PX).clamp(0.0, 1.0))
        .sum::<f64>()
        / n;
    let mean_visible = visible.iter().sum::<f64>() / n;

    out.put_calibrated(
        keys::EDGES_LEGIBLE,
        score >= EDGES_LEGIBLE_MIN_SCORE
            && invisible_fraction < EDGES_LEGIBLE_MAX_INVISIBLE_FRACTION,
        &[("resolved_edges", n), ("mean_visible_length", mean_visible)],
    );
    out.put(keys::EDGE_LEGIBILITY_SCORE, score);
    out.put(keys::INVISIBLE_EDGE_FRACTION, invisible_fraction);
}

fn hairball(input: &SenseInput<'_>, out: &mut SenseWriter<'_>) {
    let rate = instrument::edge_crossing_rate(input.nodes, input.edges);
    let count = instrument::edge_crossing_count(input.nodes, input.edges) as f64;
    out.put_calibrated(
        keys::EDGE_HAIRBALL,
        rate > HAIRBALL_MIN_CROSSING_RATE,
        &[("crossing_count", count)],
    );
    out.put(keys::HAIRBALL_SCORE, rate);
}

fn balance(input: &SenseInput<'_>, out: &mut SenseWriter<'_>) {
    let spread = instrument::layout_spread(input.nodes);
    out.put(keys::LAYOUT_SPREAD, spread);
    if placed_count(input) < 2 {
        out.put(keys::LAYOUT_BALANCED, QualityValue::Absent);
        return;
    }
    out.put(
        keys::LAYOUT_BALANCED,
        (BALANCED_MIN_SPREAD_PX..=BALANCED_MAX_SPREAD_PX).contains(&spread),
    );
}

fn clusters(input: &SenseInput<'_>, out: &mut SenseWriter<'_>) {
    let groups = group_count(input);
    if groups < 2 {
        debug!(groups, "cluster qualities need at least two groups");
        absent(out, Sense::Clusters);
        return;
    }
    let separation = instrument::blob_separation_ratio(input.nodes);
    let proximity = instrument::gestalt_proximity_ratio(input.nodes);
    let groups = groups as f64;

    out.put_calibrated(
        keys::CLUSTERS_DISTINCT,
        separation > CLUSTERS_DISTINCT_MIN_SEPARATION,
        &[("groups", groups)],
    );
    out.put(
        keys::CLUSTERS_MERGED,
        separation < CLUSTERS_MERGED_MAX_SEPARATION,
    );
    out.put(
        keys::INTRA_GROUP_COHESIVE,
        proximity < COHESIVE_MAX_PROXIMITY_RATIO,
    );
    out.put(keys::COHESION_RATIO, proximity);
    out.put(keys::BLOB_SEPARATION_RATIO, separation);
}

fn pipeline(input: &SenseInput<'_>, out: &mut SenseWriter<'_>) {
    let Some(ids) = &input.hints.pipeline_ids else {
        debug!("no pipeline hint");
        absent(out, Sense::Pipeline);
        return;
    };
    let points = instrument::positions_of(input.nodes, ids);
    let elongation = instrument::elongation_ratio(&points);
    let linearity = instrument::chain_linearity_score(input.nodes, ids);
    let resolved = points.len() >= 2;

    out.put_calibrated(
        keys::PIPELINE_VISIBLE,
        resolved && elongation > PIPELINE_MIN_ELONGATION && linearity >= PIPELINE_MIN_LINEARITY,
        &[("resolved_nodes", points.len() as f64)],
    );
    out.put(
        keys::PIPELINE_STRONG,
        resolved
            && elongation > PIPELINE_STRONG_ELONGATION
            && linearity >= PIPELINE_STRONG_LINEARITY,
    );
    out.put(keys::PIPELINE_ELONGATION, elongation);
    out.put(keys::PIPELINE_LINEARITY, linearity);
}

fn hub(input: &SenseInput<'_>, out: &mut SenseWriter<'_>) {
    let Some(hub_id) = input.hints.hub_id.as_deref() else {
        debug!("no hub hint");
        absent(out, Sense::Hub);
        return;
    };
    let degrees = instrument::node_degrees(input.nodes, input.edges);
    let Some(hub_degree) = degrees.get(hub_id).map(|d| d.total()) else {
        debug!(hub_id, "hub hint names an unknown node");
        out.put(keys::HUB_CENTRAL, false);
        out.put(keys::HUB_DEGREE_DOMINANT, false);
        out.put(keys::HUB_CENTRALITY_ERROR, QualityValue::Absent);
        return;
    };
    let max_other = degrees
        .iter()
        .filter(|(id, _)| id.as_str() != hub_id)
        .map(|(_, d)| d.total())
        .max()
        .unwrap_or(0);
    let error = instrument::hub_centrality_error(input.nodes, hub_id);

    match error {
        Some(e) => out.put(keys::HUB_CENTRAL, e < HUB_MAX_CENTRALITY_ERROR),
        // unplaced hub: centrality cannot be judged
        None => out.put(keys::HUB_CENTRAL, QualityValue::Absent),
    }
    out.put_calibrated(
        keys::HUB_DEGREE_DOMINANT,
        hub_degree >= HUB_MIN_DEGREE
            && hub_degree as f64 >= HUB_DEGREE_DOMINANCE * max_other as f64,
        &[
            ("hub_degree", hub_degree as f64),
            ("max_other_degree", max_other as f64),
        ],
    );
    out.put(keys::HUB_CENTRALITY_ERROR, error);
}

fn funnel(input: &SenseInput<'_>, out: &mut SenseWriter<'_>) {
    let Some(sink_id) = input.hints.funnel_sink_id.as_deref() else {
        debug!("no funnel hint");
        absent(out, Sense::Funnel);
        return;
    };
    let in_degree = instrument::node_degrees(input.nodes, input.edges)
        .get(sink_id)
        .map_or(0, |d| d.in_degree);
    let ratio = instrument::sink_convergence_ratio(input.nodes, input.edges, sink_id);

    out.put_calibrated(
        keys::FUNNEL_VISIBLE,
        in_degree >= FUNNEL_MIN_SOURCES && ratio.is_some_and(|r| r < FUNNEL_MAX_CONVERGENCE_RATIO),
        &[("sink_in_degree", in_degree as f64)],
    );
    out.put(keys::FUNNEL_SINK_CONVERGENCE, ratio);
}

fn layers(input: &SenseInput<'_>, out: &mut SenseWriter<'_>) {
    let Some(assignments) = &input.hints.layer_assignments else {
        debug!("no layer hint");
        absent(out, Sense::Layers);
        return;
    };
    let centroids: Vec<Position> = instrument::layer_centroids(input.nodes, assignments)
        .into_values()
        .collect();
    let projections = instrument::axis_projections(&centroids);

    if centroids.len() < 2 {
        out.put(keys::LAYERS_EVIDENT, false);
        out.put(keys::LAYER_MIN_SEPARATION, QualityValue::Absent);
        out.put(keys::LAYER_MEAN_POSITIONS, projections);
        return;
    }

    let ordered = projections.windows(2).all(|w| w[0] < w[1]);
    let min_separation = instrument::min_consecutive_distance(&centroids);
    out.put_calibrated(
        keys::LAYERS_EVIDENT,
        ordered && min_separation > LAYER_MIN_SEPARATION_PX,
        &[("layers", centroids.len() as f64)],
    );
    out.put(keys::LAYER_MIN_SEPARATION, min_separation);
    out.put(keys::LAYER_MEAN_POSITIONS, projections);
}

fn cross_boundary(input: &SenseInput<'_>, out: &mut SenseWriter<'_>) {
    if group_count(input) < 2 {
        debug!("cross-boundary qualities need at least two groups");
        absent(out, Sense::CrossBoundary);
        return;
    }
    let cross = instrument::cross_group_edges(input.nodes, input.edges);
    let resolved = instrument::edge_lengths(input.nodes, input.edges)
        .iter()
        .filter(|e| e.length.is_some())
        .count();
    let count = cross.len();
    let visible = cross
        .iter()
        .filter(|e| e.exposed >= CROSS_EDGE_MIN_EXPOSED_PX)
        .count();
    let rate = if resolved == 0 {
        0.0
    } else {
        count as f64 / resolved as f64
    };

    out.put_calibrated(
        keys::CROSS_BOUNDARY_EDGES_VISIBLE,
        count > 0 && visible as f64 / count as f64 >= CROSS_EDGES_VISIBLE_MIN_FRACTION,
        &[("visible_count", visible as f64)],
    );
    out.put(keys::CROSS_BOUNDARY_RATE, rate);
    out.put(keys::CROSS_BOUNDARY_COUNT, count as f64);
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::super::{PerceptionHints, PerceptionMap, perceive};
    use super::*;
    use crate::graph::{Edge, Node};

    fn chain(ids: &[&str], step: (f64, f64)) -> (Vec<Node>, Vec<Edge>) {
        let nodes = ids
            .iter()
            .enumerate()
            .map(|(i, id)| Node::new(*id).at(step.0 * i as f64, step.1 * i as f64))
            .collect();
        let edges = ids.windows(2).map(|w| Edge::new(w[0], w[1])).collect();
        (nodes, edges)
    }

    #[test]
    fn test_straight_pipeline_is_visible_and_strong() {
        let ids = ["a", "b", "c", "d", "e"];
        let (nodes, edges) = chain(&ids, (60.0, 0.0));
        let hints = PerceptionHints::default().with_pipeline(ids);
        let map = perceive(&nodes, &edges, &hints);

        assert!(map.is_true(keys::PIPELINE_VISIBLE));
        assert!(map.is_true(keys::PIPELINE_STRONG));
        assert_eq!(map.score(keys::PIPELINE_LINEARITY), Some(1.0));
        assert!(map.is_true(keys::EDGES_LEGIBLE));
        assert_eq!(map.score(keys::INVISIBLE_EDGE_FRACTION), Some(0.0));
        assert!(map.is_false(keys::EDGE_HAIRBALL));
    }

    #[test]
    fn test_folded_pipeline_is_not_visible() {
        let nodes = vec![
            Node::new("a").at(0.0, 0.0),
            Node::new("b").at(60.0, 0.0),
            Node::new("c").at(60.0, 60.0),
            Node::new("d").at(0.0, 60.0),
        ];
        let edges = vec![Edge::new("a", "b"), Edge::new("b", "c"), Edge::new("c", "d")];
        let hints = PerceptionHints::default().with_pipeline(["a", "b", "c", "d"]);
        let map = perceive(&nodes, &edges, &hints);
        assert!(map.is_false(keys::PIPELINE_VISIBLE));
        assert!(map.is_false(keys::PIPELINE_STRONG));
    }

    #[test]
    fn test_missing_hints_yield_absent_not_false() {
        let (nodes, edges) = chain(&["a", "b", "c"], (60.0, 0.0));
        let map = perceive(&nodes, &edges, &PerceptionHints::default());
        for key in [
            keys::PIPELINE_VISIBLE,
            keys::HUB_CENTRAL,
            keys::FUNNEL_VISIBLE,
            keys::LAYERS_EVIDENT,
            // single group
            keys::CLUSTERS_DISTINCT,
            keys::CROSS_BOUNDARY_COUNT,
        ] {
            assert!(!map.is_present(key), "{key} should be absent");
            assert!(!map.is_false(key));
        }
        assert!(map.is_present(keys::GRAPH_READABLE));
    }

    #[test]
    fn test_stacked_nodes_are_crowded_and_edges_invisible() {
        let nodes: Vec<Node> = (0..5)
            .map(|i| Node::new(format!("n{i}")).at(i as f64, 0.0))
            .collect();
        let edges = vec![Edge::new("n0", "n1"), Edge::new("n2", "n3")];
        let map = perceive(&nodes, &edges, &PerceptionHints::default());
        assert!(map.is_true(keys::GRAPH_CROWDED));
        assert!(map.is_false(keys::GRAPH_READABLE));
        assert_eq!(map.score(keys::INVISIBLE_EDGE_FRACTION), Some(1.0));
        assert!(map.is_false(keys::EDGES_LEGIBLE));
        assert!(map.is_false(keys::LAYOUT_BALANCED));
    }

    #[test]
    fn test_too_little_to_see_is_absent() {
        let lone = vec![Node::new("a").at(0.0, 0.0)];
        let map = perceive(&lone, &[], &PerceptionHints::default());
        for key in [
            keys::GRAPH_READABLE,
            keys::CROWDING_SCORE,
            keys::EDGES_LEGIBLE,
            keys::INVISIBLE_EDGE_FRACTION,
            keys::LAYOUT_BALANCED,
        ] {
            assert!(!map.is_present(key), "{key} should be absent");
        }

        // two placed nodes can crowd, but without edges legibility means nothing
        let pair = vec![Node::new("a").at(0.0, 0.0), Node::new("b").at(80.0, 0.0)];
        let map = perceive(&pair, &[], &PerceptionHints::default());
        assert!(map.is_true(keys::GRAPH_READABLE));
        assert!(!map.is_present(keys::EDGES_LEGIBLE));
        assert!(!map.is_present(keys::EDGE_LEGIBILITY_SCORE));

        // an edge to a node that was never placed resolves nothing either
        let edges = vec![Edge::new("a", "ghost")];
        let map = perceive(&pair, &edges, &PerceptionHints::default());
        assert!(!map.is_present(keys::INVISIBLE_EDGE_FRACTION));
    }

    #[test]
    fn test_central_hub_is_central_and_dominant() {
        let mut nodes = vec![Node::new("hub").at(0.0, 0.0)];
        let mut edges = Vec::new();
        for i in 0..6 {
            let angle = std::f64::consts::TAU * i as f64 / 6.0;
            let id = format!("s{i}");
            nodes.push(Node::new(id.as_str()).at(80.0 * angle.cos(), 80.0 * angle.sin()));
            edges.push(Edge::new("hub", id));
        }
        let hints = PerceptionHints::default().with_hub("hub");
        let map = perceive(&nodes, &edges, &hints);
        assert!(map.is_true(keys::HUB_CENTRAL));
        assert!(map.is_true(keys::HUB_DEGREE_DOMINANT));
        let calibration = &map.get(keys::HUB_DEGREE_DOMINANT).unwrap().calibration;
        assert_eq!(calibration["hub_degree"], 6.0);
        assert_eq!(calibration["max_other_degree"], 1.0);

        // hub hint naming a node that does not exist
        let map = perceive(&nodes, &edges, &PerceptionHints::default().with_hub("ghost"));
        assert!(map.is_false(keys::HUB_CENTRAL));
        assert!(!map.is_present(keys::HUB_CENTRALITY_ERROR));
    }

    #[test]
    fn test_funnel_converges_on_sink() {
        let mut nodes = vec![Node::new("sink").at(0.0, 0.0)];
        let mut edges = Vec::new();
        for i in 0..4 {
            let angle = std::f64::consts::TAU * i as f64 / 4.0;
            let id = format!("src{i}");
            nodes.push(Node::new(id.as_str()).at(70.0 * angle.cos(), 70.0 * angle.sin()));
            edges.push(Edge::new(id, "sink"));
        }
        let hints = PerceptionHints::default().with_funnel_sink("sink");
        let map = perceive(&nodes, &edges, &hints);
        assert!(map.is_true(keys::FUNNEL_VISIBLE));
        assert!(map.score(keys::FUNNEL_SINK_CONVERGENCE).unwrap() < 0.1);
    }

    #[test]
    fn test_layers_evident_only_when_ordered_and_separated() {
        let nodes = vec![
            Node::new("a").at(0.0, 0.0),
            Node::new("b").at(40.0, 0.0),
            Node::new("c").at(20.0, 100.0),
            Node::new("d").at(20.0, 200.0),
        ];
        let assignments: BTreeMap<String, usize> = [("a", 0), ("b", 0), ("c", 1), ("d", 2)]
            .into_iter()
            .map(|(id, layer)| (id.to_string(), layer))
            .collect();
        let hints = PerceptionHints::default().with_layers(assignments.clone());
        let map = perceive(&nodes, &[], &hints);
        assert!(map.is_true(keys::LAYERS_EVIDENT));
        assert_eq!(map.series(keys::LAYER_MEAN_POSITIONS).unwrap().len(), 3);

        // middle layer pushed beyond the last one
        let mut out_of_order = nodes.clone();
        out_of_order[2] = Node::new("c").at(20.0, 300.0);
        let map = perceive(&out_of_order, &[], &hints);
        assert!(map.is_false(keys::LAYERS_EVIDENT));
    }

    fn two_blobs(gap: f64) -> Vec<Node> {
        let mut nodes = Vec::new();
        for (group, cx) in [("left", 0.0), ("right", gap)] {
            for i in 0..4 {
                let angle = std::f64::consts::TAU * i as f64 / 4.0;
                nodes.push(
                    Node::new(format!("{group}{i}"))
                        .with_group(group)
                        .at(cx + 20.0 * angle.cos(), 20.0 * angle.sin()),
                );
            }
        }
        nodes
    }

    #[test]
    fn test_separated_groups_are_distinct() {
        let nodes = two_blobs(200.0);
        let edges = vec![Edge::new("left0", "right2")];
        let map = perceive(&nodes, &edges, &PerceptionHints::default());
        assert!(map.is_true(keys::CLUSTERS_DISTINCT));
        assert!(map.is_false(keys::CLUSTERS_MERGED));
        assert!(map.is_true(keys::INTRA_GROUP_COHESIVE));
        assert_eq!(map.score(keys::CROSS_BOUNDARY_COUNT), Some(1.0));
        assert!(map.is_true(keys::CROSS_BOUNDARY_EDGES_VISIBLE));
    }

    #[test]
    fn test_overlapping_groups_are_merged() {
        let nodes = two_blobs(5.0);
        let map = perceive(&nodes, &[], &PerceptionHints::default());
        assert!(map.is_true(keys::CLUSTERS_MERGED));
        assert!(map.is_false(keys::CLUSTERS_DISTINCT));
        assert_eq!(map.score(keys::CROSS_BOUNDARY_COUNT), Some(0.0));
        assert!(map.is_false(keys::CROSS_BOUNDARY_EDGES_VISIBLE));
    }

    #[test]
    fn test_every_present_quality_belongs_to_its_writer() {
        let nodes = two_blobs(200.0);
        let map = perceive(&nodes, &[], &PerceptionHints::default());
        let empty = PerceptionMap::empty();
        assert_eq!(map.iter().count(), empty.iter().count());
        for key in map.present_keys() {
            assert!(keys::owner_of(key).is_some());
        }
    }
}
