// Copyright 2026 The Simlin Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

//! Turns instrument measurements into named qualitative verdicts.
//!
//! A [`PerceptionMap`] is a fixed record: every key in
//! [`keys::KEY_OWNERS`] is always present, and qualities a sub-perception
//! could not judge (missing hint, too few groups) hold
//! [`QualityValue::Absent`]. Consumers must treat absent as "not known",
//! which is never the same as false.

pub mod keys;
mod senses;
pub mod thresholds;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::graph::{Edge, Node, Topology};

pub use self::keys::Sense;

/// Optional facts about the topology that some sub-perceptions need. A
/// missing hint yields absent qualities rather than an error.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PerceptionHints {
    /// Node ids of the pipeline, in flow order.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pipeline_ids: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hub_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub funnel_sink_id: Option<String>,
    /// Layer index per node id; layers are expected in increasing order
    /// along one axis.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub layer_assignments: Option<BTreeMap<String, usize>>,
}

impl PerceptionHints {
    pub fn with_pipeline<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.pipeline_ids = Some(ids.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_hub(mut self, id: impl Into<String>) -> Self {
        self.hub_id = Some(id.into());
        self
    }

    pub fn with_funnel_sink(mut self, id: impl Into<String>) -> Self {
        self.funnel_sink_id = Some(id.into());
        self
    }

    pub fn with_layers(mut self, assignments: BTreeMap<String, usize>) -> Self {
        self.layer_assignments = Some(assignments);
        self
    }
}

/// The value of a single named quality.
///
/// Serializes untagged: a flag as a JSON bool, a score as a number (non-finite
/// scores become `null`, as serde_json writes them), a series as an array
/// and absent as `null`.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(untagged)]
pub enum QualityValue {
    #[default]
    Absent,
    Flag(bool),
    Score(f64),
    Series(Vec<f64>),
}

impl QualityValue {
    pub fn is_absent(&self) -> bool {
        matches!(self, QualityValue::Absent)
    }
}

impl From<bool> for QualityValue {
    fn from(b: bool) -> Self {
        QualityValue::Flag(b)
    }
}

impl From<f64> for QualityValue {
    fn from(v: f64) -> Self {
        QualityValue::Score(v)
    }
}

impl From<Option<f64>> for QualityValue {
    fn from(v: Option<f64>) -> Self {
        v.map_or(QualityValue::Absent, QualityValue::Score)
    }
}

impl From<Vec<f64>> for QualityValue {
    fn from(v: Vec<f64>) -> Self {
        QualityValue::Series(v)
    }
}

/// A quality plus the raw sub-scores its verdict was derived from.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Quality {
    pub value: QualityValue,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub calibration: BTreeMap<&'static str, f64>,
}

/// Named qualities for one layout. See the module docs for the absent
/// convention.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(transparent)]
pub struct PerceptionMap {
    qualities: BTreeMap<&'static str, Quality>,
}

impl Default for PerceptionMap {
    fn default() -> Self {
        Self::empty()
    }
}

impl PerceptionMap {
    /// A map where every known quality is absent.
    pub fn empty() -> Self {
        Self {
            qualities: keys::KEY_OWNERS
                .iter()
                .map(|(key, _)| (*key, Quality::default()))
                .collect(),
        }
    }

    /// Builder for hand-made maps. Unknown keys are ignored with a warning.
    pub fn with(mut self, key: &str, value: impl Into<QualityValue>) -> Self {
        match keys::canonical_key(key) {
            Some(key) => {
                self.qualities.entry(key).or_default().value = value.into();
            }
            None => warn!(key, "ignoring unknown perception quality"),
        }
        self
    }

    pub fn get(&self, key: &str) -> Option<&Quality> {
        self.qualities.get(key)
    }

    /// Value of `key`; unknown keys read as absent.
    pub fn value(&self, key: &str) -> &QualityValue {
        static ABSENT: QualityValue = QualityValue::Absent;
        self.qualities.get(key).map_or(&ABSENT, |q| &q.value)
    }

    pub fn is_true(&self, key: &str) -> bool {
        matches!(self.value(key), QualityValue::Flag(true))
    }

    /// True only when the quality is present and false. An absent flag is
    /// neither true nor false.
    pub fn is_false(&self, key: &str) -> bool {
        matches!(self.value(key), QualityValue::Flag(false))
    }

    pub fn score(&self, key: &str) -> Option<f64> {
        match self.value(key) {
            QualityValue::Score(v) => Some(*v),
            _ => None,
        }
    }

    pub fn series(&self, key: &str) -> Option<&[f64]> {
        match self.value(key) {
            QualityValue::Series(v) => Some(v),
            _ => None,
        }
    }

    pub fn is_present(&self, key: &str) -> bool {
        !self.value(key).is_absent()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &Quality)> {
        self.qualities.iter().map(|(k, q)| (*k, q))
    }

    /// Names of every quality that is not absent.
    pub fn present_keys(&self) -> Vec<&'static str> {
        self.iter()
            .filter(|(_, q)| !q.value.is_absent())
            .map(|(k, _)| k)
            .collect()
    }
}

/// Collects one sense's qualities, enforcing key ownership.
pub(crate) struct SenseWriter<'a> {
    sense: Sense,
    map: &'a mut PerceptionMap,
}

impl SenseWriter<'_> {
    pub(crate) fn put(&mut self, key: &'static str, value: impl Into<QualityValue>) {
        self.put_calibrated(key, value, &[]);
    }

    pub(crate) fn put_calibrated(
        &mut self,
        key: &'static str,
        value: impl Into<QualityValue>,
        calibration: &[(&'static str, f64)],
    ) {
        let owner = keys::owner_of(key);
        if owner != Some(self.sense) {
            debug_assert!(false, "{:?} wrote '{key}' owned by {owner:?}", self.sense);
            warn!(sense = ?self.sense, key, ?owner, "dropping quality written by a non-owner");
            return;
        }
        let quality = self.map.qualities.entry(key).or_default();
        quality.value = value.into();
        quality.calibration = calibration.iter().copied().collect();
    }
}

/// Everything a sub-perception may look at.
pub(crate) struct SenseInput<'a> {
    pub nodes: &'a [Node],
    pub edges: &'a [Edge],
    pub hints: &'a PerceptionHints,
}

/// Run every sub-perception over a settled layout and merge the results.
pub fn perceive(nodes: &[Node], edges: &[Edge], hints: &PerceptionHints) -> PerceptionMap {
    let input = SenseInput {
        nodes,
        edges,
        hints,
    };
    let mut map = PerceptionMap::empty();
    for sense in Sense::ALL {
        let mut writer = SenseWriter {
            sense,
            map: &mut map,
        };
        senses::run(sense, &input, &mut writer);
    }
    debug!(
        nodes = nodes.len(),
        edges = edges.len(),
        present = map.present_keys().len(),
        "perceived layout"
    );
    map
}

pub fn perceive_topology(topology: &Topology, hints: &PerceptionHints) -> PerceptionMap {
    perceive(&topology.nodes, &topology.edges, hints)
}
