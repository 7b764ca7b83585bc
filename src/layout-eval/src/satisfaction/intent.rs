// Copyright 2026 The Simlin Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::common::Error;

/// The goal a viewer brings to a layout.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    ExploreArchitecture,
    TracePipeline,
    SpotHotspots,
    CompareVersions,
    Overview,
    DebugFlow,
    ReviewBoundaries,
}

impl Intent {
    pub const ALL: [Intent; 7] = [
        Intent::ExploreArchitecture,
        Intent::TracePipeline,
        Intent::SpotHotspots,
        Intent::CompareVersions,
        Intent::Overview,
        Intent::DebugFlow,
        Intent::ReviewBoundaries,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Intent::ExploreArchitecture => "explore_architecture",
            Intent::TracePipeline => "trace_pipeline",
            Intent::SpotHotspots => "spot_hotspots",
            Intent::CompareVersions => "compare_versions",
            Intent::Overview => "overview",
            Intent::DebugFlow => "debug_flow",
            Intent::ReviewBoundaries => "review_boundaries",
        }
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Intent {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().replace('-', "_");
        Intent::ALL
            .into_iter()
            .find(|i| i.name() == normalized)
            .ok_or_else(|| Error::UnknownIntent(s.to_string()))
    }
}

/// An independent axis of viewer satisfaction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    Readable,
    StructuralFidelity,
    VisualComfort,
    GoalAchievable,
    Trustworthy,
}

impl Dimension {
    pub const ALL: [Dimension; 5] = [
        Dimension::Readable,
        Dimension::StructuralFidelity,
        Dimension::VisualComfort,
        Dimension::GoalAchievable,
        Dimension::Trustworthy,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Dimension::Readable => "readable",
            Dimension::StructuralFidelity => "structural_fidelity",
            Dimension::VisualComfort => "visual_comfort",
            Dimension::GoalAchievable => "goal_achievable",
            Dimension::Trustworthy => "trustworthy",
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Dimension {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().replace('-', "_");
        Dimension::ALL
            .into_iter()
            .find(|d| d.name() == normalized)
            .ok_or_else(|| Error::UnknownDimension(s.to_string()))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DimensionState {
    Satisfied,
    Unsatisfied,
    /// No constraint fired for this dimension.
    Unknown,
}

impl DimensionState {
    /// Satisfied counts 1, unknown 0.5, unsatisfied 0.
    pub fn score(self) -> f64 {
        match self {
            DimensionState::Satisfied => 1.0,
            DimensionState::Unknown => 0.5,
            DimensionState::Unsatisfied => 0.0,
        }
    }
}
