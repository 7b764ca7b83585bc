// Copyright 2026 The Simlin Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

//! Quality names and the table assigning each one to exactly one
//! sub-perception.

use std::collections::HashMap;

use lazy_static::lazy_static;
use serde::Serialize;

/// The sub-perceptions whose outputs are merged into a perception map.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Sense {
    Crowding,
    EdgeLegibility,
    Hairball,
    Balance,
    Clusters,
    Pipeline,
    Hub,
    Funnel,
    Layers,
    CrossBoundary,
}

impl Sense {
    pub const ALL: [Sense; 10] = [
        Sense::Crowding,
        Sense::EdgeLegibility,
        Sense::Hairball,
        Sense::Balance,
        Sense::Clusters,
        Sense::Pipeline,
        Sense::Hub,
        Sense::Funnel,
        Sense::Layers,
        Sense::CrossBoundary,
    ];
}

pub const GRAPH_READABLE: &str = "graph_readable";
pub const GRAPH_CROWDED: &str = "graph_crowded";
pub const CROWDING_SCORE: &str = "crowding_score";

pub const EDGES_LEGIBLE: &str = "edges_legible";
pub const EDGE_LEGIBILITY_SCORE: &str = "edge_legibility_score";
pub const INVISIBLE_EDGE_FRACTION: &str = "invisible_edge_fraction";

pub const EDGE_HAIRBALL: &str = "edge_hairball";
pub const HAIRBALL_SCORE: &str = "hairball_score";

pub const LAYOUT_BALANCED: &str = "layout_balanced";
pub const LAYOUT_SPREAD: &str = "layout_spread";

pub const CLUSTERS_DISTINCT: &str = "clusters_distinct";
pub const CLUSTERS_MERGED: &str = "clusters_merged";
pub const INTRA_GROUP_COHESIVE: &str = "intra_group_cohesive";
pub const COHESION_RATIO: &str = "cohesion_ratio";
pub const BLOB_SEPARATION_RATIO: &str = "blob_separation_ratio";

pub const PIPELINE_VISIBLE: &str = "pipeline_visible";
pub const PIPELINE_STRONG: &str = "pipeline_strong";
pub const PIPELINE_ELONGATION: &str = "pipeline_elongation";
pub const PIPELINE_LINEARITY: &str = "pipeline_linearity";

pub const HUB_CENTRAL: &str = "hub_central";
pub const HUB_DEGREE_DOMINANT: &str = "hub_degree_dominant";
pub const HUB_CENTRALITY_ERROR: &str = "hub_centrality_error";

pub const FUNNEL_VISIBLE: &str = "funnel_visible";
pub const FUNNEL_SINK_CONVERGENCE: &str = "funnel_sink_convergence";

pub const LAYERS_EVIDENT: &str = "layers_evident";
pub const LAYER_MIN_SEPARATION: &str = "layer_min_separation";
pub const LAYER_MEAN_POSITIONS: &str = "layer_mean_positions";

pub const CROSS_BOUNDARY_EDGES_VISIBLE: &str = "cross_boundary_edges_visible";
pub const CROSS_BOUNDARY_RATE: &str = "cross_boundary_rate";
pub const CROSS_BOUNDARY_COUNT: &str = "cross_boundary_count";

/// Every quality key and the one sub-perception allowed to write it.
pub const KEY_OWNERS: &[(&str, Sense)] = &[
    (GRAPH_READABLE, Sense::Crowding),
    (GRAPH_CROWDED, Sense::Crowding),
    (CROWDING_SCORE, Sense::Crowding),
    (EDGES_LEGIBLE, Sense::EdgeLegibility),
    (EDGE_LEGIBILITY_SCORE, Sense::EdgeLegibility),
    (INVISIBLE_EDGE_FRACTION, Sense::EdgeLegibility),
    (EDGE_HAIRBALL, Sense::Hairball),
    (HAIRBALL_SCORE, Sense::Hairball),
    (LAYOUT_BALANCED, Sense::Balance),
    (LAYOUT_SPREAD, Sense::Balance),
    (CLUSTERS_DISTINCT, Sense::Clusters),
    (CLUSTERS_MERGED, Sense::Clusters),
    (INTRA_GROUP_COHESIVE, Sense::Clusters),
    (COHESION_RATIO, Sense::Clusters),
    (BLOB_SEPARATION_RATIO, Sense::Clusters),
    (PIPELINE_VISIBLE, Sense::Pipeline),
    (PIPELINE_STRONG, Sense::Pipeline),
    (PIPELINE_ELONGATION, Sense::Pipeline),
    (PIPELINE_LINEARITY, Sense::Pipeline),
    (HUB_CENTRAL, Sense::Hub),
    (HUB_DEGREE_DOMINANT, Sense::Hub),
    (HUB_CENTRALITY_ERROR, Sense::Hub),
    (FUNNEL_VISIBLE, Sense::Funnel),
    (FUNNEL_SINK_CONVERGENCE, Sense::Funnel),
    (LAYERS_EVIDENT, Sense::Layers),
    (LAYER_MIN_SEPARATION, Sense::Layers),
    (LAYER_MEAN_POSITIONS, Sense::Layers),
    (CROSS_BOUNDARY_EDGES_VISIBLE, Sense::CrossBoundary),
    (CROSS_BOUNDARY_RATE, Sense::CrossBoundary),
    (CROSS_BOUNDARY_COUNT, Sense::CrossBoundary),
];

lazy_static! {
    static ref OWNER_BY_KEY: HashMap<&'static str, Sense> = KEY_OWNERS.iter().copied().collect();
}

/// The sub-perception owning `key`, if it is a known quality.
pub fn owner_of(key: &str) -> Option<Sense> {
    OWNER_BY_KEY.get(key).copied()
}

/// The interned `'static` spelling of a known quality key.
pub fn canonical_key(key: &str) -> Option<&'static str> {
    OWNER_BY_KEY.get_key_value(key).map(|(k, _)| *k)
}

pub fn keys_owned_by(sense: Sense) -> impl Iterator<Item = &'static str> {
    KEY_OWNERS
        .iter()
        .filter(move |(_, owner)| *owner == sense)
        .map(|(key, _)| *key)
}
