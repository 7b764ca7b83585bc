// Copyright 2026 The Simlin Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

use std::borrow::Cow;
use std::collections::HashMap;
use std::ops::{Add, Mul, Sub};

use serde::{Deserialize, Serialize};

use crate::common::Result;

/// Group key assigned to nodes that carry neither a group nor a group path.
pub const DEFAULT_GROUP: &str = "default";

/// 2D position/vector used throughout the pipeline.
#[derive(Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl std::fmt::Debug for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.2}, {:.2})", self.x, self.y)
    }
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// 2D cross product: z-component of the 3D cross product.
    pub fn cross_2d(self, other: Self) -> f64 {
        self.x * other.y - self.y * other.x
    }

    pub fn dot(self, other: Self) -> f64 {
        self.x * other.x + self.y * other.y
    }

    pub fn length(self) -> f64 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    pub fn distance(self, other: Self) -> f64 {
        (other - self).length()
    }

    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl Add for Position {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self {
            x: self.x + rhs.x,
            y: self.y + rhs.y,
        }
    }
}

impl Sub for Position {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self {
            x: self.x - rhs.x,
            y: self.y - rhs.y,
        }
    }
}

impl Mul<f64> for Position {
    type Output = Self;
    fn mul(self, rhs: f64) -> Self {
        Self {
            x: self.x * rhs,
            y: self.y * rhs,
        }
    }
}

/// A graph node. Position is absent until the harness (or a production
/// renderer) has placed it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
    /// Size/weight hint; drives the drawn radius.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub val: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    /// Nested group membership, outermost first.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_path: Option<Vec<String>>,
}

impl Node {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            x: None,
            y: None,
            val: None,
            group: None,
            group_path: None,
        }
    }

    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    pub fn with_group_path(mut self, path: &[&str]) -> Self {
        self.group_path = Some(path.iter().map(|s| s.to_string()).collect());
        self
    }

    pub fn with_val(mut self, val: f64) -> Self {
        self.val = Some(val);
        self
    }

    pub fn at(mut self, x: f64, y: f64) -> Self {
        self.x = Some(x);
        self.y = Some(y);
        self
    }

    /// The node's settled position, if it has a finite one.
    pub fn position(&self) -> Option<Position> {
        match (self.x, self.y) {
            (Some(x), Some(y)) if x.is_finite() && y.is_finite() => Some(Position::new(x, y)),
            _ => None,
        }
    }

    pub fn set_position(&mut self, pos: Position) {
        self.x = Some(pos.x);
        self.y = Some(pos.y);
    }

    /// Single-level group key: the explicit group, else the nested path
    /// flattened with `/`, else [`DEFAULT_GROUP`].
    pub fn group_key(&self) -> Cow<'_, str> {
        if let Some(group) = &self.group {
            return Cow::Borrowed(group.as_str());
        }
        match &self.group_path {
            Some(path) if !path.is_empty() => Cow::Owned(path.join("/")),
            _ => Cow::Borrowed(DEFAULT_GROUP),
        }
    }

    /// Group key truncated to the first `depth` levels of the nested path.
    /// Nodes without a path fall back to [`Node::group_key`].
    pub fn group_key_at_depth(&self, depth: usize) -> Cow<'_, str> {
        match &self.group_path {
            Some(path) if !path.is_empty() && depth > 0 => {
                let end = depth.min(path.len());
                Cow::Owned(path[..end].join("/"))
            }
            _ => self.group_key(),
        }
    }
}

/// An edge endpoint: either a bare node id or an embedded node object (the
/// shape force-graph renderers rewrite edges into after binding them).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EdgeEndpoint {
    Id(String),
    Node(Box<Node>),
}

impl EdgeEndpoint {
    pub fn id(&self) -> &str {
        match self {
            EdgeEndpoint::Id(id) => id,
            EdgeEndpoint::Node(node) => &node.id,
        }
    }
}

impl From<&str> for EdgeEndpoint {
    fn from(id: &str) -> Self {
        EdgeEndpoint::Id(id.to_string())
    }
}

impl From<String> for EdgeEndpoint {
    fn from(id: String) -> Self {
        EdgeEndpoint::Id(id)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub source: EdgeEndpoint,
    pub target: EdgeEndpoint,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
}

impl Edge {
    pub fn new(source: impl Into<EdgeEndpoint>, target: impl Into<EdgeEndpoint>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            weight: None,
        }
    }

    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = Some(weight);
        self
    }

    pub fn source_id(&self) -> &str {
        self.source.id()
    }

    pub fn target_id(&self) -> &str {
        self.target.id()
    }
}

/// Caller-owned node/edge connectivity. Nothing in this crate mutates a
/// topology it is handed; the harness works on its own copy.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Topology {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
}

impl Topology {
    pub fn new(nodes: Vec<Node>, edges: Vec<Edge>) -> Self {
        Self { nodes, edges }
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }
}

/// Index of placed node positions by id. Nodes without a position are left
/// out, so every lookup doubles as a dangling-reference check.
pub(crate) fn position_index(nodes: &[Node]) -> HashMap<&str, Position> {
    nodes
        .iter()
        .filter_map(|n| n.position().map(|p| (n.id.as_str(), p)))
        .collect()
}
