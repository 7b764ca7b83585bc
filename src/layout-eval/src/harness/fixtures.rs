// Copyright 2026 The Simlin Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

//! Canonical topologies with known structure, plus the hints and intent
//! each one is meant to be judged against.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use rand::Rng;
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::Serialize;

use crate::common::Error;
use crate::config::SimulationConfig;
use crate::graph::{Edge, Node, Topology};
use crate::perception::PerceptionHints;
use crate::satisfaction::Intent;

/// A topology bundled with what a viewer is expected to find in it.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Fixture {
    pub name: String,
    pub topology: Topology,
    pub hints: PerceptionHints,
    pub intent: Intent,
}

impl Fixture {
    /// Settle a copy of the topology with `config`.
    pub fn settle(&self, config: &SimulationConfig) -> Topology {
        super::settle_topology(&self.topology, config)
    }
}

fn ids(prefix: &str, n: usize) -> Vec<String> {
    (0..n).map(|i| format!("{prefix}{i}")).collect()
}

fn chain_edges(ids: &[String]) -> impl Iterator<Item = Edge> + '_ {
    ids.windows(2)
        .map(|w| Edge::new(w[0].as_str(), w[1].as_str()))
}

fn ring_edges(ids: &[String]) -> Vec<Edge> {
    if ids.len() < 3 {
        return chain_edges(ids).collect();
    }
    (0..ids.len())
        .map(|i| Edge::new(ids[i].as_str(), ids[(i + 1) % ids.len()].as_str()))
        .collect()
}

/// `n` nodes in one chain, hinted as a pipeline.
pub fn linear_pipeline(n: usize) -> Fixture {
    let steps = ids("step", n);
    let nodes = steps
        .iter()
        .map(|id| Node::new(id.as_str()).with_group("pipeline"))
        .collect();
    let edges = chain_edges(&steps).collect();
    Fixture {
        name: format!("linear-pipeline-{n}"),
        topology: Topology::new(nodes, edges),
        hints: PerceptionHints::default().with_pipeline(steps),
        intent: Intent::TracePipeline,
    }
}

/// One weighted hub linked out to `n` spokes.
pub fn hub_and_spoke(n: usize) -> Fixture {
    let spokes = ids("spoke", n);
    let mut nodes = vec![Node::new("hub").with_group("star").with_val(n as f64)];
    nodes.extend(spokes.iter().map(|id| Node::new(id.as_str()).with_group("star")));
    let edges = spokes
        .iter()
        .map(|id| Edge::new("hub", id.as_str()))
        .collect();
    Fixture {
        name: format!("hub-and-spoke-{n}"),
        topology: Topology::new(nodes, edges),
        hints: PerceptionHints::default().with_hub("hub"),
        intent: Intent::SpotHotspots,
    }
}

/// Two ring-shaped modules of `size` nodes joined by `cross_edges` edges.
pub fn two_modules(size: usize, cross_edges: usize) -> Fixture {
    let a = ids("a", size);
    let b = ids("b", size);
    let mut nodes: Vec<Node> = a
        .iter()
        .map(|id| Node::new(id.as_str()).with_group("module_a"))
        .collect();
    nodes.extend(
        b.iter()
            .map(|id| Node::new(id.as_str()).with_group("module_b")),
    );
    let mut edges = ring_edges(&a);
    edges.extend(ring_edges(&b));
    edges.extend(
        a.iter()
            .zip(&b)
            .take(cross_edges)
            .map(|(x, y)| Edge::new(x.as_str(), y.as_str())),
    );
    Fixture {
        name: format!("two-modules-{size}x{cross_edges}"),
        topology: Topology::new(nodes, edges),
        hints: PerceptionHints::default(),
        intent: Intent::ExploreArchitecture,
    }
}

/// `n` sources all feeding one sink.
pub fn funnel(n: usize) -> Fixture {
    let sources = ids("source", n);
    let mut nodes: Vec<Node> = sources
        .iter()
        .map(|id| Node::new(id.as_str()).with_group("flow"))
        .collect();
    nodes.push(Node::new("sink").with_group("flow"));
    let edges = sources
        .iter()
        .map(|id| Edge::new(id.as_str(), "sink"))
        .collect();
    Fixture {
        name: format!("funnel-{n}"),
        topology: Topology::new(nodes, edges),
        hints: PerceptionHints::default().with_funnel_sink("sink"),
        intent: Intent::DebugFlow,
    }
}

/// Three architectural layers (api, service, data) of `per_layer` nodes,
/// wired top to bottom.
pub fn layered_stack(per_layer: usize) -> Fixture {
    let layers = [("api", 0usize), ("service", 1), ("data", 2)];
    let mut nodes = Vec::new();
    let mut assignments = BTreeMap::new();
    let mut layer_ids = Vec::new();
    for (name, layer) in layers {
        let members = ids(name, per_layer);
        for id in &members {
            nodes.push(Node::new(id.as_str()).with_group(name));
            assignments.insert(id.clone(), layer);
        }
        layer_ids.push(members);
    }

    let mut edges = Vec::new();
    for pair in layer_ids.windows(2) {
        let (upper, lower) = (&pair[0], &pair[1]);
        for (i, id) in upper.iter().enumerate() {
            edges.push(Edge::new(id.as_str(), lower[i].as_str()));
            if per_layer > 1 {
                edges.push(Edge::new(id.as_str(), lower[(i + 1) % per_layer].as_str()));
            }
        }
    }
    Fixture {
        name: format!("layered-stack-{per_layer}"),
        topology: Topology::new(nodes, edges),
        hints: PerceptionHints::default().with_layers(assignments),
        intent: Intent::ReviewBoundaries,
    }
}

/// `n` nodes spread round-robin over `groups` groups, each with up to
/// `out_degree` distinct random targets. Same seed, same graph.
pub fn dense_random(n: usize, out_degree: usize, groups: usize, seed: u64) -> Fixture {
    let mut rng = StdRng::seed_from_u64(seed);
    let groups = groups.max(1);
    let node_ids = ids("n", n);
    let nodes = node_ids
        .iter()
        .enumerate()
        .map(|(i, id)| Node::new(id.as_str()).with_group(format!("g{}", i % groups)))
        .collect();

    let mut edges = Vec::new();
    let per_node = out_degree.min(n.saturating_sub(1));
    for (i, source) in node_ids.iter().enumerate() {
        let mut targets: Vec<usize> = Vec::with_capacity(per_node);
        while targets.len() < per_node {
            let t = rng.random_range(0..n);
            if t != i && !targets.contains(&t) {
                targets.push(t);
            }
        }
        edges.extend(
            targets
                .into_iter()
                .map(|t| Edge::new(source.as_str(), node_ids[t].as_str())),
        );
    }
    Fixture {
        name: format!("dense-random-{n}-{out_degree}-{groups}-{seed}"),
        topology: Topology::new(nodes, edges),
        hints: PerceptionHints::default(),
        intent: Intent::Overview,
    }
}

/// Two parallel chains of `n` nodes in the same group: two versions of the
/// same pipeline side by side.
pub fn twin_chains(n: usize) -> Fixture {
    let left = ids("left", n);
    let right = ids("right", n);
    let nodes = left
        .iter()
        .chain(&right)
        .map(|id| Node::new(id.as_str()).with_group("versions"))
        .collect();
    let edges = chain_edges(&left).chain(chain_edges(&right)).collect();
    Fixture {
        name: format!("twin-chains-{n}"),
        topology: Topology::new(nodes, edges),
        hints: PerceptionHints::default().with_pipeline(left),
        intent: Intent::CompareVersions,
    }
}

/// Two outer modules, each holding a small pipeline and a small hub, with
/// the two pipelines joined end to start.
pub fn nested_modules() -> Fixture {
    let mut nodes = Vec::new();
    let mut edges = Vec::new();
    for outer in ["m1", "m2"] {
        let pipeline = ids(&format!("{outer}_step"), 4);
        for id in &pipeline {
            nodes.push(Node::new(id.as_str()).with_group_path(&[outer, "pipeline"]));
        }
        edges.extend(chain_edges(&pipeline));

        let hub = format!("{outer}_hub");
        nodes.push(
            Node::new(hub.as_str())
                .with_group_path(&[outer, "hub"])
                .with_val(4.0),
        );
        for id in ids(&format!("{outer}_spoke"), 4) {
            nodes.push(Node::new(id.as_str()).with_group_path(&[outer, "hub"]));
            edges.push(Edge::new(hub.as_str(), id));
        }
        // the pipeline feeds the module's hub
        edges.push(Edge::new(pipeline[pipeline.len() - 1].as_str(), hub.as_str()));
    }
    edges.push(Edge::new("m1_step3", "m2_step0"));

    Fixture {
        name: "nested-modules".to_string(),
        topology: Topology::new(nodes, edges),
        hints: PerceptionHints::default()
            .with_pipeline(ids("m1_step", 4))
            .with_hub("m1_hub"),
        intent: Intent::ExploreArchitecture,
    }
}

/// Named fixtures at their canonical sizes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Scenario {
    LinearPipeline,
    HubAndSpoke,
    TwoModules,
    Funnel,
    LayeredStack,
    DenseRandom,
    TwinChains,
    NestedModules,
}

impl Scenario {
    pub const ALL: [Scenario; 8] = [
        Scenario::LinearPipeline,
        Scenario::HubAndSpoke,
        Scenario::TwoModules,
        Scenario::Funnel,
        Scenario::LayeredStack,
        Scenario::DenseRandom,
        Scenario::TwinChains,
        Scenario::NestedModules,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Scenario::LinearPipeline => "linear-pipeline",
            Scenario::HubAndSpoke => "hub-and-spoke",
            Scenario::TwoModules => "two-modules",
            Scenario::Funnel => "funnel",
            Scenario::LayeredStack => "layered-stack",
            Scenario::DenseRandom => "dense-random",
            Scenario::TwinChains => "twin-chains",
            Scenario::NestedModules => "nested-modules",
        }
    }

    pub fn build(self) -> Fixture {
        match self {
            Scenario::LinearPipeline => linear_pipeline(6),
            Scenario::HubAndSpoke => hub_and_spoke(8),
            Scenario::TwoModules => two_modules(6, 2),
            Scenario::Funnel => funnel(6),
            Scenario::LayeredStack => layered_stack(3),
            Scenario::DenseRandom => dense_random(24, 2, 3, 7),
            Scenario::TwinChains => twin_chains(5),
            Scenario::NestedModules => nested_modules(),
        }
    }
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Scenario {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().replace('_', "-");
        Scenario::ALL
            .into_iter()
            .find(|sc| sc.name() == normalized)
            .ok_or_else(|| Error::UnknownScenario(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instrument::node_degrees;

    #[test]
    fn test_linear_pipeline_shape() {
        let f = linear_pipeline(6);
        assert_eq!(f.topology.nodes.len(), 6);
        assert_eq!(f.topology.edges.len(), 5);
        assert_eq!(f.hints.pipeline_ids.as_ref().map(Vec::len), Some(6));
        assert_eq!(f.topology.edges[0].source_id(), "step0");
        assert_eq!(f.topology.edges[4].target_id(), "step5");
    }

    #[test]
    fn test_hub_and_spoke_degrees() {
        let f = hub_and_spoke(8);
        let degrees = node_degrees(&f.topology.nodes, &f.topology.edges);
        assert_eq!(degrees["hub"].total(), 8);
        assert!(degrees.iter().filter(|(id, _)| *id != "hub").all(|(_, d)| d.total() == 1));
        assert_eq!(f.topology.node("hub").and_then(|n| n.val), Some(8.0));
    }

    #[test]
    fn test_two_modules_cross_edges() {
        let f = two_modules(6, 2);
        let cross = f
            .topology
            .edges
            .iter()
            .filter(|e| e.source_id().starts_with('a') && e.target_id().starts_with('b'))
            .count();
        assert_eq!(cross, 2);
        assert_eq!(f.topology.edges.len(), 6 + 6 + 2);
    }

    #[test]
    fn test_funnel_in_degree() {
        let f = funnel(6);
        let degrees = node_degrees(&f.topology.nodes, &f.topology.edges);
        assert_eq!(degrees["sink"].in_degree, 6);
        assert_eq!(degrees["sink"].out_degree, 0);
    }

    #[test]
    fn test_layered_stack_assignments() {
        let f = layered_stack(3);
        let assignments = f.hints.layer_assignments.as_ref().unwrap();
        assert_eq!(assignments.len(), 9);
        assert_eq!(assignments["api0"], 0);
        assert_eq!(assignments["data2"], 2);
        assert_eq!(f.topology.edges.len(), 12);
    }

    #[test]
    fn test_dense_random_is_seeded() {
        let a = dense_random(20, 3, 4, 99);
        let b = dense_random(20, 3, 4, 99);
        assert_eq!(a.topology, b.topology);
        assert_eq!(a.topology.edges.len(), 60);
        assert!(a.topology.edges.iter().all(|e| e.source_id() != e.target_id()));
        assert_ne!(a.topology, dense_random(20, 3, 4, 100).topology);

        // out-degree larger than the graph allows
        let tiny = dense_random(3, 10, 1, 1);
        assert_eq!(tiny.topology.edges.len(), 6);
    }

    #[test]
    fn test_nested_modules_carry_paths() {
        let f = nested_modules();
        let hub = f.topology.node("m1_hub").unwrap();
        assert_eq!(hub.group_key_at_depth(1), "m1");
        assert_eq!(hub.group_key(), "m1/hub");
        assert!(f.topology.edges.iter().any(|e| e.source_id() == "m1_step3"
            && e.target_id() == "m2_step0"));
    }

    #[test]
    fn test_scenario_registry() {
        for scenario in Scenario::ALL {
            assert_eq!(scenario.name().parse::<Scenario>().unwrap(), scenario);
            let fixture = scenario.build();
            assert!(!fixture.topology.nodes.is_empty());
        }
        assert_eq!(
            "hub_and_spoke".parse::<Scenario>().unwrap(),
            Scenario::HubAndSpoke
        );
        assert!(matches!(
            "spaghetti".parse::<Scenario>(),
            Err(Error::UnknownScenario(_))
        ));
    }
}
