// Copyright 2026 The Simlin Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

//! Calibration constants for every qualitative verdict.
//!
//! These are given data, not derived quantities: changing one changes what
//! the pipeline claims a viewer perceives. Sub-perceptions must reference
//! them by name rather than inlining numbers.

// Crowding
/// Overlapping-pair fraction at or below which the graph reads cleanly.
pub const READABLE_MAX_OVERLAP_RATE: f64 = 0.05;
/// Overlapping-pair fraction above which the graph looks crowded.
pub const CROWDED_MIN_OVERLAP_RATE: f64 = 0.15;

// Edge legibility
/// An edge with less than this much length outside its endpoint nodes
/// cannot be seen at all.
pub const INVISIBLE_EDGE_MAX_VISIBLE_PX: f64 = 8.0;
/// Visible length at which an edge counts as fully legible.
pub const LEGIBLE_EDGE_VISIBLE_PX: f64 = 20.0;
pub const EDGES_LEGIBLE_MIN_SCORE: f64 = 0.7;
pub const EDGES_LEGIBLE_MAX_INVISIBLE_FRACTION: f64 = 0.2;

// Hairball
/// Crossing-pair fraction above which edges read as a hairball.
pub const HAIRBALL_MIN_CROSSING_RATE: f64 = 0.1;

// Balance
pub const BALANCED_MIN_SPREAD_PX: f64 = 30.0;
pub const BALANCED_MAX_SPREAD_PX: f64 = 1500.0;

// Clusters
/// Blob separation above which groups read as distinct.
pub const CLUSTERS_DISTINCT_MIN_SEPARATION: f64 = 1.0;
/// Blob separation below which groups read as one merged blob.
pub const CLUSTERS_MERGED_MAX_SEPARATION: f64 = 0.75;
/// Intra/inter proximity ratio below which members read as belonging
/// together.
pub const COHESIVE_MAX_PROXIMITY_RATIO: f64 = 0.6;

// Pipeline
pub const PIPELINE_MIN_ELONGATION: f64 = 1.5;
pub const PIPELINE_MIN_LINEARITY: f64 = 0.7;
pub const PIPELINE_STRONG_ELONGATION: f64 = 3.0;
pub const PIPELINE_STRONG_LINEARITY: f64 = 0.9;

// Hub
pub const HUB_MAX_CENTRALITY_ERROR: f64 = 0.5;
/// Hub degree must be at least this multiple of the next busiest node.
pub const HUB_DEGREE_DOMINANCE: f64 = 2.0;
pub const HUB_MIN_DEGREE: usize = 3;

// Funnel
pub const FUNNEL_MAX_CONVERGENCE_RATIO: f64 = 0.5;
pub const FUNNEL_MIN_SOURCES: usize = 2;

// Layers
pub const LAYER_MIN_SEPARATION_PX: f64 = 60.0;

// Cross-boundary edges
/// Length a cross-group edge must show outside both blobs to be seen.
pub const CROSS_EDGE_MIN_EXPOSED_PX: f64 = 15.0;
pub const CROSS_EDGES_VISIBLE_MIN_FRACTION: f64 = 0.5;
