// Copyright 2026 The Simlin Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

//! Single-pass constraint solver deciding whether a perceived layout would
//! satisfy a viewer pursuing an [`Intent`].
//!
//! Every constraint is evaluated once against the same map, so the result
//! does not depend on table order. A dimension asserted both satisfied and
//! unsatisfied is a contradiction: it resolves to unsatisfied and is
//! reported with the constraint ids on both sides.

pub mod constraints;
mod intent;

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::{debug, warn};

pub use self::constraints::{CONSTRAINTS, Constraint, Guard, Verdict};
pub use self::intent::{Dimension, DimensionState, Intent};
use crate::perception::PerceptionMap;

/// One unsatisfied verdict that made it into the result.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Violation {
    pub constraint_id: &'static str,
    pub dimension: Dimension,
    pub reason: &'static str,
    pub repair: Vec<&'static str>,
    /// Set when the dimension was also asserted satisfied; lists the ids of
    /// the satisfying constraints.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contradicted_by: Option<Vec<&'static str>>,
}

impl Violation {
    pub fn is_contradiction(&self) -> bool {
        self.contradicted_by.is_some()
    }
}

/// A dimension both satisfied and unsatisfied by fired constraints.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Contradiction {
    pub dimension: Dimension,
    pub satisfied_by: Vec<&'static str>,
    pub unsatisfied_by: Vec<&'static str>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SatisfactionResult {
    pub intent: Intent,
    pub satisfied: bool,
    pub dimensions: BTreeMap<Dimension, DimensionState>,
    pub scores: BTreeMap<Dimension, f64>,
    pub overall_score: f64,
    pub violations: Vec<Violation>,
    pub contradictions: Vec<Contradiction>,
    pub unknown_dims: Vec<Dimension>,
    pub fired_constraints: Vec<&'static str>,
    pub summary: String,
    pub diagnosis: Vec<String>,
}

impl SatisfactionResult {
    /// Deduplicated repair hints across every violation.
    pub fn repair_plan(&self) -> Vec<&'static str> {
        repair_plan(&self.violations)
    }
}

/// Knobs for a single solve.
#[derive(Clone, Debug, Default)]
pub struct SatisfyOptions {
    /// Evaluated alongside the built-in table.
    pub extra_constraints: Vec<Constraint>,
    /// Dimensions that gate `satisfied`. Defaults to all of them.
    pub required_dims: Option<Vec<Dimension>>,
}

impl SatisfyOptions {
    pub fn with_constraint(mut self, constraint: Constraint) -> Self {
        self.extra_constraints.push(constraint);
        self
    }

    pub fn with_required_dims(mut self, dims: &[Dimension]) -> Self {
        self.required_dims = Some(dims.to_vec());
        self
    }
}

pub fn satisfy(perceptions: &PerceptionMap, intent: Intent) -> SatisfactionResult {
    satisfy_with(perceptions, intent, &SatisfyOptions::default())
}

pub fn satisfy_with(
    perceptions: &PerceptionMap,
    intent: Intent,
    options: &SatisfyOptions,
) -> SatisfactionResult {
    let constraints: Vec<&Constraint> = CONSTRAINTS
        .iter()
        .chain(options.extra_constraints.iter())
        .collect();
    let required = options
        .required_dims
        .as_deref()
        .unwrap_or(&Dimension::ALL);
    solve(perceptions, intent, &constraints, required)
}

/// Solve every intent against the same perception map.
pub fn satisfy_all_intents(
    perceptions: &PerceptionMap,
    options: &SatisfyOptions,
) -> BTreeMap<Intent, SatisfactionResult> {
    Intent::ALL
        .into_iter()
        .map(|intent| (intent, satisfy_with(perceptions, intent, options)))
        .collect()
}

/// Repair hints across `violations`, first occurrence wins.
pub fn repair_plan(violations: &[Violation]) -> Vec<&'static str> {
    let mut plan: Vec<&'static str> = Vec::new();
    for &hint in violations.iter().flat_map(|v| v.repair.iter()) {
        if !plan.contains(&hint) {
            plan.push(hint);
        }
    }
    plan
}

#[derive(Default)]
struct Assertions<'a> {
    satisfied_by: Vec<&'a Constraint>,
    unsatisfied_by: Vec<&'a Constraint>,
}

pub(crate) fn solve(
    perceptions: &PerceptionMap,
    intent: Intent,
    constraints: &[&Constraint],
    required: &[Dimension],
) -> SatisfactionResult {
    let fired: Vec<&Constraint> = constraints
        .iter()
        .copied()
        .filter(|c| c.fires(perceptions, intent))
        .collect();

    let mut by_dimension: BTreeMap<Dimension, Assertions> = BTreeMap::new();
    for &c in &fired {
        let entry = by_dimension.entry(c.dimension).or_default();
        match c.verdict {
            Verdict::Satisfied => entry.satisfied_by.push(c),
            Verdict::Unsatisfied { .. } => entry.unsatisfied_by.push(c),
        }
    }

    let mut dimensions = BTreeMap::new();
    let mut violations = Vec::new();
    let mut contradictions = Vec::new();
    for dim in Dimension::ALL {
        let Some(assertions) = by_dimension.get(&dim) else {
            dimensions.insert(dim, DimensionState::Unknown);
            continue;
        };
        let satisfied_ids: Vec<&'static str> =
            assertions.satisfied_by.iter().map(|c| c.id).collect();
        let contradicted = !assertions.satisfied_by.is_empty()
            && !assertions.unsatisfied_by.is_empty();

        if contradicted {
            let unsatisfied_ids: Vec<&'static str> =
                assertions.unsatisfied_by.iter().map(|c| c.id).collect();
            warn!(
                %intent,
                dimension = %dim,
                satisfied = ?satisfied_ids,
                unsatisfied = ?unsatisfied_ids,
                "contradictory constraints fired"
            );
            contradictions.push(Contradiction {
                dimension: dim,
                satisfied_by: satisfied_ids.clone(),
                unsatisfied_by: unsatisfied_ids,
            });
        }

        for c in &assertions.unsatisfied_by {
            if let Verdict::Unsatisfied { reason, repair } = c.verdict {
                violations.push(Violation {
                    constraint_id: c.id,
                    dimension: dim,
                    reason,
                    repair: repair.to_vec(),
                    contradicted_by: contradicted.then(|| satisfied_ids.clone()),
                });
            }
        }

        let state = if assertions.unsatisfied_by.is_empty() {
            DimensionState::Satisfied
        } else {
            DimensionState::Unsatisfied
        };
        dimensions.insert(dim, state);
    }

    let scores: BTreeMap<Dimension, f64> = dimensions
        .iter()
        .map(|(dim, state)| (*dim, state.score()))
        .collect();
    let overall_score = scores.values().sum::<f64>() / scores.len() as f64;
    let unknown_dims: Vec<Dimension> = dimensions
        .iter()
        .filter(|(_, state)| **state == DimensionState::Unknown)
        .map(|(dim, _)| *dim)
        .collect();

    let state_of = |dim: Dimension| {
        dimensions
            .get(&dim)
            .copied()
            .unwrap_or(DimensionState::Unknown)
    };
    let any_required_unsatisfied = required
        .iter()
        .any(|&d| state_of(d) == DimensionState::Unsatisfied);
    let required_satisfied = required
        .iter()
        .filter(|&&d| state_of(d) == DimensionState::Satisfied)
        .count();
    let satisfied = violations.is_empty() && !any_required_unsatisfied && required_satisfied > 0;

    let diagnosis: Vec<String> = violations.iter().map(describe).collect();
    let summary = if satisfied {
        format!(
            "{intent}: satisfied ({required_satisfied}/{} required dimensions, score {overall_score:.2})",
            required.len()
        )
    } else if fired.is_empty() {
        format!("{intent}: not satisfied; no constraint fired, nothing is known about this layout")
    } else if violations.is_empty() {
        format!("{intent}: not satisfied; no required dimension was confirmed (score {overall_score:.2})")
    } else {
        format!(
            "{intent}: not satisfied; {} violation(s), {} contradiction(s) (score {overall_score:.2})",
            violations.len(),
            contradictions.len()
        )
    };

    let fired_constraints: Vec<&'static str> = fired.iter().map(|c| c.id).collect();
    debug!(%intent, fired = fired_constraints.len(), satisfied, "solved");

    SatisfactionResult {
        intent,
        satisfied,
        dimensions,
        scores,
        overall_score,
        violations,
        contradictions,
        unknown_dims,
        fired_constraints,
        summary,
        diagnosis,
    }
}

fn describe(v: &Violation) -> String {
    match &v.contradicted_by {
        Some(others) => format!(
            "{}: contradiction, {} says '{}' but {} say satisfied",
            v.dimension,
            v.constraint_id,
            v.reason,
            others.join(", ")
        ),
        None => format!("{}: {} ({})", v.dimension, v.reason, v.constraint_id),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::perception::keys::*;

    fn clean_overview() -> PerceptionMap {
        PerceptionMap::empty()
            .with(GRAPH_READABLE, true)
            .with(GRAPH_CROWDED, false)
            .with(EDGE_HAIRBALL, false)
            .with(EDGES_LEGIBLE, true)
            .with(INVISIBLE_EDGE_FRACTION, 0.0)
            .with(LAYOUT_BALANCED, true)
    }

    #[test]
    fn test_empty_map_is_unsatisfied_and_unknown() {
        let result = satisfy(&PerceptionMap::empty(), Intent::Overview);
        assert!(!result.satisfied);
        assert!(result.fired_constraints.is_empty());
        assert!(result.violations.is_empty());
        assert_eq!(result.unknown_dims, Dimension::ALL.to_vec());
        assert!((result.overall_score - 0.5).abs() < f64::EPSILON);
        assert!(result.summary.contains("no constraint fired"));
    }

    #[test]
    fn test_clean_overview_is_satisfied() {
        let result = satisfy(&clean_overview(), Intent::Overview);
        assert!(result.satisfied, "{}", result.summary);
        assert_eq!(
            result.dimensions[&Dimension::GoalAchievable],
            DimensionState::Satisfied
        );
        assert_eq!(
            result.dimensions[&Dimension::StructuralFidelity],
            DimensionState::Unknown
        );
        assert!(result.contradictions.is_empty());
    }

    #[test]
    fn test_crowding_violates_readable_and_overview() {
        let map = clean_overview()
            .with(GRAPH_READABLE, false)
            .with(GRAPH_CROWDED, true);
        let result = satisfy(&map, Intent::Overview);
        assert!(!result.satisfied);
        assert_eq!(
            result.dimensions[&Dimension::Readable],
            DimensionState::Unsatisfied
        );
        let ids: Vec<_> = result.violations.iter().map(|v| v.constraint_id).collect();
        assert!(ids.contains(&"readable.nodes_crowded"));
        assert!(ids.contains(&"goal.overview_cluttered"));
        assert_eq!(result.diagnosis.len(), result.violations.len());
        assert!(result.repair_plan().contains(&GRAPH_CROWDED));
    }

    #[test]
    fn test_opposing_constraints_are_a_contradiction() {
        let options = SatisfyOptions::default()
            .with_constraint(Constraint::satisfies(
                "always.fine",
                Dimension::Trustworthy,
                |_, _| true,
            ))
            .with_constraint(Constraint::violates(
                "always.broken",
                Dimension::Trustworthy,
                "never trust anything",
                &[INVISIBLE_EDGE_FRACTION],
                |_, _| true,
            ));
        let result = satisfy_with(&PerceptionMap::empty(), Intent::Overview, &options);

        assert!(!result.satisfied);
        assert_eq!(
            result.dimensions[&Dimension::Trustworthy],
            DimensionState::Unsatisfied
        );
        assert_eq!(
            result.contradictions,
            vec![Contradiction {
                dimension: Dimension::Trustworthy,
                satisfied_by: vec!["always.fine"],
                unsatisfied_by: vec!["always.broken"],
            }]
        );
        assert_eq!(result.violations.len(), 1);
        assert!(result.violations[0].is_contradiction());
        assert!(result.diagnosis[0].contains("contradiction"));
    }

    #[test]
    fn test_result_is_independent_of_table_order() {
        let map = clean_overview()
            .with(HUB_CENTRAL, false)
            .with(HUB_DEGREE_DOMINANT, true)
            .with(CLUSTERS_MERGED, true);
        let forward: Vec<&Constraint> = CONSTRAINTS.iter().collect();
        let backward: Vec<&Constraint> = CONSTRAINTS.iter().rev().collect();
        for intent in Intent::ALL {
            let a = solve(&map, intent, &forward, &Dimension::ALL);
            let b = solve(&map, intent, &backward, &Dimension::ALL);
            assert_eq!(a.dimensions, b.dimensions);
            assert_eq!(a.satisfied, b.satisfied);
            let mut a_ids: Vec<_> = a.violations.iter().map(|v| v.constraint_id).collect();
            let mut b_ids: Vec<_> = b.violations.iter().map(|v| v.constraint_id).collect();
            a_ids.sort_unstable();
            b_ids.sort_unstable();
            assert_eq!(a_ids, b_ids);
        }
    }

    #[test]
    fn test_required_dims_narrow_the_gate() {
        // structural fidelity stays unknown for a single-group overview
        let options = SatisfyOptions::default().with_required_dims(&[Dimension::StructuralFidelity]);
        let result = satisfy_with(&clean_overview(), Intent::Overview, &options);
        assert!(!result.satisfied);
        assert!(result.violations.is_empty());
        assert!(result.summary.contains("no required dimension"));

        let options = SatisfyOptions::default().with_required_dims(&[Dimension::Readable]);
        assert!(satisfy_with(&clean_overview(), Intent::Overview, &options).satisfied);
    }

    #[test]
    fn test_repair_plan_deduplicates_in_order() {
        let violation = |id, repair: &[&'static str]| Violation {
            constraint_id: id,
            dimension: Dimension::Readable,
            reason: "r",
            repair: repair.to_vec(),
            contradicted_by: None,
        };
        let plan = repair_plan(&[
            violation("a", &[EDGE_HAIRBALL, HAIRBALL_SCORE]),
            violation("b", &[GRAPH_CROWDED, EDGE_HAIRBALL]),
        ]);
        assert_eq!(plan, vec![EDGE_HAIRBALL, HAIRBALL_SCORE, GRAPH_CROWDED]);
    }

    #[test]
    fn test_all_intents_share_one_map() {
        let results = satisfy_all_intents(&clean_overview(), &SatisfyOptions::default());
        assert_eq!(results.len(), Intent::ALL.len());
        for (intent, result) in &results {
            assert_eq!(result.intent, *intent);
            assert!(result.contradictions.is_empty());
        }
        assert!(results[&Intent::Overview].satisfied);
        // nothing in this map speaks to a hub
        assert_eq!(
            results[&Intent::SpotHotspots].dimensions[&Dimension::GoalAchievable],
            DimensionState::Unknown
        );
    }
}
