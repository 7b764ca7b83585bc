// Copyright 2026 The Simlin Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

//! Evaluates whether a force-directed graph layout would satisfy a viewer
//! pursuing a specific goal.
//!
//! The pipeline has four stages, leaves first:
//!
//! 1. [`harness`] produces reproducible settled positions for fixture
//!    topologies.
//! 2. [`instrument`] extracts judgement-free geometric measures.
//! 3. [`perception`] turns those measures (plus optional hints) into named
//!    qualitative verdicts.
//! 4. [`satisfaction`] runs a single-pass constraint solver over the
//!    perception map and a viewer [`Intent`].
//!
//! Every stage is synchronous, deterministic and free of cross-call state.

#![forbid(unsafe_code)]

pub mod common;
pub mod config;
pub mod graph;
pub mod harness;
pub mod instrument;
pub mod perception;
pub mod satisfaction;

pub use self::common::{Error, Result};
pub use self::config::SimulationConfig;
pub use self::graph::{Edge, EdgeEndpoint, Node, Position, Topology};
pub use self::harness::run_simulation;
pub use self::perception::{PerceptionHints, PerceptionMap, perceive};
pub use self::satisfaction::{
    Dimension, DimensionState, Intent, SatisfactionResult, SatisfyOptions, repair_plan, satisfy,
    satisfy_all_intents, satisfy_with,
};
