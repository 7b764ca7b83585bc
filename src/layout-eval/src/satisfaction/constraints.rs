// Copyright 2026 The Simlin Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

//! The constraint table.
//!
//! Each constraint is a guard over the perception map and intent that, when
//! it fires, asserts one verdict on one dimension. Guards must be false on a
//! map where everything is absent, so they test `is_true`/`is_false`/`score`
//! rather than negating a flag. Guards asserting opposite verdicts on the
//! same dimension are written to be mutually exclusive; when they are not,
//! the solver reports a contradiction.

use serde::Serialize;

use super::intent::{Dimension, Intent};
use crate::perception::PerceptionMap;
use crate::perception::keys::*;

pub type Guard = fn(&PerceptionMap, Intent) -> bool;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "verdict", rename_all = "snake_case")]
pub enum Verdict {
    Satisfied,
    Unsatisfied {
        reason: &'static str,
        /// Perception keys to improve, most direct first.
        repair: &'static [&'static str],
    },
}

#[derive(Clone, Copy, Debug, Serialize)]
pub struct Constraint {
    pub id: &'static str,
    pub dimension: Dimension,
    #[serde(flatten)]
    pub verdict: Verdict,
    #[serde(skip)]
    pub guard: Guard,
}

impl Constraint {
    pub const fn satisfies(id: &'static str, dimension: Dimension, guard: Guard) -> Self {
        Self {
            id,
            dimension,
            verdict: Verdict::Satisfied,
            guard,
        }
    }

    pub const fn violates(
        id: &'static str,
        dimension: Dimension,
        reason: &'static str,
        repair: &'static [&'static str],
        guard: Guard,
    ) -> Self {
        Self {
            id,
            dimension,
            verdict: Verdict::Unsatisfied { reason, repair },
            guard,
        }
    }

    pub fn fires(&self, perceptions: &PerceptionMap, intent: Intent) -> bool {
        (self.guard)(perceptions, intent)
    }
}

fn cross_edges_ok(p: &PerceptionMap) -> bool {
    p.is_true(CROSS_BOUNDARY_EDGES_VISIBLE) || p.score(CROSS_BOUNDARY_COUNT) == Some(0.0)
}

fn cross_edges_hidden(p: &PerceptionMap) -> bool {
    p.score(CROSS_BOUNDARY_COUNT).is_some_and(|c| c > 0.0)
        && p.is_false(CROSS_BOUNDARY_EDGES_VISIBLE)
}

fn misplaced_hub(p: &PerceptionMap) -> bool {
    p.is_true(HUB_DEGREE_DOMINANT) && p.is_false(HUB_CENTRAL)
}

fn hidden_edges(p: &PerceptionMap) -> bool {
    p.score(INVISIBLE_EDGE_FRACTION).is_some_and(|f| f >= 0.5)
}

use Dimension::*;
use Intent::*;

pub static CONSTRAINTS: &[Constraint] = &[
    // readable
    Constraint::violates(
        "readable.nodes_crowded",
        Readable,
        "nodes overlap so much that shapes and labels collide",
        &[GRAPH_CROWDED, CROWDING_SCORE],
        |p, _| p.is_true(GRAPH_CROWDED),
    ),
    Constraint::violates(
        "readable.edge_hairball",
        Readable,
        "edge crossings form a hairball",
        &[EDGE_HAIRBALL, HAIRBALL_SCORE],
        |p, _| p.is_true(EDGE_HAIRBALL),
    ),
    Constraint::satisfies("readable.clear", Readable, |p, _| {
        p.is_true(GRAPH_READABLE) && p.is_false(EDGE_HAIRBALL)
    }),
    // visual_comfort
    Constraint::violates(
        "comfort.hidden_edges",
        VisualComfort,
        "most edges are hidden underneath their endpoint nodes",
        &[INVISIBLE_EDGE_FRACTION, EDGES_LEGIBLE],
        |p, _| hidden_edges(p),
    ),
    Constraint::violates(
        "comfort.unbalanced_spread",
        VisualComfort,
        "the layout is either cramped or scattered across the canvas",
        &[LAYOUT_BALANCED, LAYOUT_SPREAD],
        |p, _| p.is_false(LAYOUT_BALANCED),
    ),
    Constraint::satisfies("comfort.pleasant", VisualComfort, |p, _| {
        p.is_true(EDGES_LEGIBLE) && p.is_true(LAYOUT_BALANCED)
    }),
    // structural_fidelity
    Constraint::violates(
        "structure.groups_merged",
        StructuralFidelity,
        "distinct groups render as one merged blob",
        &[CLUSTERS_MERGED, BLOB_SEPARATION_RATIO],
        |p, _| p.is_true(CLUSTERS_MERGED),
    ),
    Constraint::violates(
        "structure.groups_scattered",
        StructuralFidelity,
        "group members are scattered instead of clustering together",
        &[INTRA_GROUP_COHESIVE, COHESION_RATIO],
        |p, intent| {
            matches!(intent, ExploreArchitecture | ReviewBoundaries)
                && p.is_false(INTRA_GROUP_COHESIVE)
        },
    ),
    Constraint::satisfies("structure.groups_evident", StructuralFidelity, |p, _| {
        p.is_true(CLUSTERS_DISTINCT) && p.is_true(INTRA_GROUP_COHESIVE)
    }),
    Constraint::satisfies("structure.single_group_shape", StructuralFidelity, |p, _| {
        !p.is_present(CLUSTERS_DISTINCT)
            && (p.is_true(PIPELINE_VISIBLE)
                || p.is_true(HUB_CENTRAL)
                || p.is_true(FUNNEL_VISIBLE)
                || p.is_true(LAYERS_EVIDENT))
    }),
    // goal_achievable: pipelines and flow
    Constraint::satisfies("goal.pipeline_traceable", GoalAchievable, |p, intent| {
        matches!(intent, TracePipeline | DebugFlow)
            && p.is_true(PIPELINE_VISIBLE)
            && !p.is_true(EDGE_HAIRBALL)
    }),
    Constraint::violates(
        "goal.pipeline_not_linear",
        GoalAchievable,
        "the pipeline does not read as a line",
        &[PIPELINE_VISIBLE, PIPELINE_ELONGATION, PIPELINE_LINEARITY],
        |p, intent| intent == TracePipeline && p.is_false(PIPELINE_VISIBLE),
    ),
    Constraint::violates(
        "goal.flow_tangled",
        GoalAchievable,
        "crossing edges make the flow impossible to follow",
        &[EDGE_HAIRBALL, HAIRBALL_SCORE],
        |p, intent| matches!(intent, TracePipeline | DebugFlow) && p.is_true(EDGE_HAIRBALL),
    ),
    Constraint::satisfies("goal.funnel_converges", GoalAchievable, |p, intent| {
        intent == DebugFlow && p.is_true(FUNNEL_VISIBLE) && !p.is_true(EDGE_HAIRBALL)
    }),
    Constraint::violates(
        "goal.funnel_diffuse",
        GoalAchievable,
        "sources do not visibly converge on the sink",
        &[FUNNEL_VISIBLE, FUNNEL_SINK_CONVERGENCE],
        |p, intent| {
            intent == DebugFlow && p.is_false(FUNNEL_VISIBLE) && !p.is_true(PIPELINE_VISIBLE)
        },
    ),
    // goal_achievable: hotspots
    Constraint::satisfies("goal.hub_spotted", GoalAchievable, |p, intent| {
        intent == SpotHotspots && p.is_true(HUB_CENTRAL) && p.is_true(HUB_DEGREE_DOMINANT)
    }),
    Constraint::violates(
        "goal.hub_peripheral",
        GoalAchievable,
        "the hub is pushed toward the periphery",
        &[HUB_CENTRAL, HUB_CENTRALITY_ERROR],
        |p, intent| intent == SpotHotspots && p.is_false(HUB_CENTRAL),
    ),
    Constraint::violates(
        "goal.hub_not_dominant",
        GoalAchievable,
        "no single node dominates the connectivity",
        &[HUB_DEGREE_DOMINANT],
        |p, intent| intent == SpotHotspots && p.is_false(HUB_DEGREE_DOMINANT),
    ),
    // goal_achievable: modules and boundaries
    Constraint::satisfies("goal.modules_explorable", GoalAchievable, |p, intent| {
        intent == ExploreArchitecture
            && p.is_true(CLUSTERS_DISTINCT)
            && cross_edges_ok(p)
            && !p.is_false(LAYERS_EVIDENT)
    }),
    Constraint::violates(
        "goal.modules_blurred",
        GoalAchievable,
        "modules blur together",
        &[CLUSTERS_MERGED, CLUSTERS_DISTINCT, BLOB_SEPARATION_RATIO],
        |p, intent| intent == ExploreArchitecture && p.is_true(CLUSTERS_MERGED),
    ),
    Constraint::violates(
        "goal.dependencies_hidden",
        GoalAchievable,
        "dependencies between modules disappear inside the blobs",
        &[CROSS_BOUNDARY_EDGES_VISIBLE, CROSS_BOUNDARY_RATE],
        |p, intent| matches!(intent, ExploreArchitecture | ReviewBoundaries) && cross_edges_hidden(p),
    ),
    Constraint::satisfies("goal.boundaries_reviewable", GoalAchievable, |p, intent| {
        intent == ReviewBoundaries
            && p.is_true(CLUSTERS_DISTINCT)
            && p.is_true(INTRA_GROUP_COHESIVE)
            && cross_edges_ok(p)
            && !p.is_false(LAYERS_EVIDENT)
    }),
    Constraint::violates(
        "goal.boundaries_unclear",
        GoalAchievable,
        "group boundaries cannot be told apart",
        &[CLUSTERS_DISTINCT, BLOB_SEPARATION_RATIO],
        |p, intent| intent == ReviewBoundaries && p.is_false(CLUSTERS_DISTINCT),
    ),
    Constraint::violates(
        "goal.layers_flattened",
        GoalAchievable,
        "architectural layers are not stacked in order",
        &[LAYERS_EVIDENT, LAYER_MIN_SEPARATION, LAYER_MEAN_POSITIONS],
        |p, intent| {
            matches!(intent, ExploreArchitecture | ReviewBoundaries) && p.is_false(LAYERS_EVIDENT)
        },
    ),
    // goal_achievable: whole-graph intents
    Constraint::satisfies("goal.overview_clear", GoalAchievable, |p, intent| {
        intent == Overview && p.is_true(GRAPH_READABLE) && p.is_true(LAYOUT_BALANCED)
    }),
    Constraint::violates(
        "goal.overview_cluttered",
        GoalAchievable,
        "the overall picture is cluttered",
        &[GRAPH_CROWDED, CROWDING_SCORE, LAYOUT_BALANCED],
        |p, intent| {
            intent == Overview && (p.is_true(GRAPH_CROWDED) || p.is_false(LAYOUT_BALANCED))
        },
    ),
    Constraint::satisfies("goal.versions_comparable", GoalAchievable, |p, intent| {
        intent == CompareVersions
            && p.is_true(GRAPH_READABLE)
            && p.is_true(LAYOUT_BALANCED)
            && p.is_false(EDGE_HAIRBALL)
    }),
    Constraint::violates(
        "goal.versions_obscured",
        GoalAchievable,
        "clutter hides the differences between versions",
        &[EDGE_HAIRBALL, GRAPH_CROWDED],
        |p, intent| {
            intent == CompareVersions && (p.is_true(EDGE_HAIRBALL) || p.is_true(GRAPH_CROWDED))
        },
    ),
    // trustworthy
    Constraint::violates(
        "trust.hidden_connectivity",
        Trustworthy,
        "hidden edges misrepresent how connected the graph is",
        &[INVISIBLE_EDGE_FRACTION],
        |p, _| hidden_edges(p),
    ),
    Constraint::violates(
        "trust.misplaced_hub",
        Trustworthy,
        "the busiest node looks peripheral",
        &[HUB_CENTRAL, HUB_CENTRALITY_ERROR],
        |p, _| misplaced_hub(p),
    ),
    Constraint::violates(
        "trust.false_merge",
        Trustworthy,
        "separate groups appear to be a single group",
        &[CLUSTERS_MERGED],
        |p, _| p.is_true(CLUSTERS_MERGED),
    ),
    Constraint::satisfies("trust.faithful", Trustworthy, |p, _| {
        p.score(INVISIBLE_EDGE_FRACTION).is_some_and(|f| f < 0.5)
            && !misplaced_hub(p)
            && !p.is_true(CLUSTERS_MERGED)
    }),
];

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;
    use crate::perception::keys;

    #[test]
    fn test_constraint_ids_are_unique() {
        let mut seen = BTreeSet::new();
        for c in CONSTRAINTS {
            assert!(seen.insert(c.id), "duplicate constraint id {}", c.id);
        }
    }

    #[test]
    fn test_repair_hints_name_known_qualities() {
        for c in CONSTRAINTS {
            if let Verdict::Unsatisfied { reason, repair } = c.verdict {
                assert!(!reason.is_empty(), "{} has no reason", c.id);
                assert!(!repair.is_empty(), "{} has no repair hints", c.id);
                for key in repair {
                    assert!(
                        keys::owner_of(key).is_some(),
                        "{} repairs unknown quality {key}",
                        c.id
                    );
                }
            }
        }
    }

    #[test]
    fn test_nothing_fires_on_an_empty_map() {
        let empty = PerceptionMap::empty();
        for intent in Intent::ALL {
            for c in CONSTRAINTS {
                assert!(!c.fires(&empty, intent), "{} fired for {intent}", c.id);
            }
        }
    }

    #[test]
    fn test_every_dimension_can_be_satisfied_and_violated() {
        for dim in Dimension::ALL {
            let verdicts: Vec<bool> = CONSTRAINTS
                .iter()
                .filter(|c| c.dimension == dim)
                .map(|c| c.verdict == Verdict::Satisfied)
                .collect();
            assert!(verdicts.contains(&true), "{dim} can never be satisfied");
            assert!(verdicts.contains(&false), "{dim} can never be violated");
        }
    }
}
