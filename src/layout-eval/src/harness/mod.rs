// Copyright 2026 The Simlin Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

//! Deterministic force simulation standing in for a production renderer.
//!
//! Mirrors the usual link/charge/collision model with velocity and alpha
//! decay, run for a fixed number of ticks from a seeded, group-aware
//! pre-positioning. With two or more groups a separation post-pass pushes
//! overlapping groups apart, followed by a shorter relax phase.

pub mod fixtures;

use std::collections::HashMap;

use rand::Rng;
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{debug, trace};

use crate::config::SimulationConfig;
use crate::graph::{Edge, Node, Position, Topology};
use crate::instrument::node_radius;

/// Centroid distances at or below this are treated as coincident.
const COINCIDENT_EPSILON: f64 = 1e-9;

struct Body {
    pos: Position,
    vel: Position,
    /// Drawn radius plus padding.
    collision_radius: f64,
    group: usize,
}

struct Spring {
    source: usize,
    target: usize,
    strength: f64,
    /// Share of the correction applied to the target; the source takes the
    /// rest.
    bias: f64,
}

/// Simulation state for one run. Nothing outlives [`run_simulation`].
struct Simulation<'a> {
    config: &'a SimulationConfig,
    bodies: Vec<Body>,
    springs: Vec<Spring>,
    group_count: usize,
    alpha: f64,
    alpha_decay: f64,
    rng: StdRng,
}

impl<'a> Simulation<'a> {
    fn new(nodes: &[Node], edges: &[Edge], config: &'a SimulationConfig) -> Self {
        let mut group_index: HashMap<String, usize> = HashMap::new();
        let mut bodies = Vec::with_capacity(nodes.len());
        for node in nodes {
            let next = group_index.len();
            let group = *group_index
                .entry(node.group_key().into_owned())
                .or_insert(next);
            bodies.push(Body {
                pos: Position::default(),
                vel: Position::default(),
                collision_radius: node_radius(node) + config.collision_padding,
                group,
            });
        }

        // first occurrence wins for duplicate ids
        let mut by_id: HashMap<&str, usize> = HashMap::new();
        for (i, node) in nodes.iter().enumerate() {
            by_id.entry(node.id.as_str()).or_insert(i);
        }

        let mut springs = Vec::new();
        let mut degree = vec![0usize; nodes.len()];
        for edge in edges {
            let (Some(&source), Some(&target)) =
                (by_id.get(edge.source_id()), by_id.get(edge.target_id()))
            else {
                trace!(
                    source = edge.source_id(),
                    target = edge.target_id(),
                    "skipping dangling edge"
                );
                continue;
            };
            if source == target {
                continue;
            }
            let base = if bodies[source].group == bodies[target].group {
                config.intra_group_strength
            } else {
                config.inter_group_strength
            };
            let weight = edge.weight.filter(|w| w.is_finite()).unwrap_or(1.0);
            springs.push(Spring {
                source,
                target,
                strength: (base * weight).clamp(0.0, 1.0),
                bias: 0.0,
            });
            degree[source] += 1;
            degree[target] += 1;
        }
        for spring in &mut springs {
            let (s, t) = (degree[spring.source] as f64, degree[spring.target] as f64);
            spring.bias = s / (s + t);
        }

        Self {
            config,
            bodies,
            springs,
            group_count: group_index.len(),
            alpha: 1.0,
            alpha_decay: config.alpha_decay(),
            rng: StdRng::seed_from_u64(config.seed),
        }
    }

    /// Group centers on one ring, members on a smaller ring around each
    /// center, then a seeded jitter on every coordinate.
    fn pre_position(&mut self) {
        let link = self.config.link_distance;
        let mut members: Vec<Vec<usize>> = vec![Vec::new(); self.group_count];
        for (i, body) in self.bodies.iter().enumerate() {
            members[body.group].push(i);
        }

        let group_ring = if self.group_count > 1 {
            self.config.group_ring_scale * link * (self.group_count as f64).sqrt()
        } else {
            0.0
        };
        for (g, group) in members.iter().enumerate() {
            let center = ring_point(g, self.group_count, group_ring);
            let member_ring = self.config.member_ring_scale * link * (group.len() as f64).sqrt();
            for (k, &i) in group.iter().enumerate() {
                let offset = if group.len() > 1 {
                    ring_point(k, group.len(), member_ring)
                } else {
                    Position::default()
                };
                self.bodies[i].pos = center + offset;
            }
        }

        let jitter = self.config.jitter;
        for body in &mut self.bodies {
            let dx = (self.rng.random::<f64>() * 2.0 - 1.0) * jitter;
            let dy = (self.rng.random::<f64>() * 2.0 - 1.0) * jitter;
            body.pos = body.pos + Position::new(dx, dy);
        }
    }

    fn settle(&mut self, iterations: usize) {
        for _ in 0..iterations {
            self.alpha += (0.0 - self.alpha) * self.alpha_decay;
            self.apply_links();
            self.apply_charge();
            self.apply_collision();
            self.integrate();
        }
    }

    fn apply_links(&mut self) {
        let link = self.config.link_distance;
        for (i, spring) in self.springs.iter().enumerate() {
            let s = &self.bodies[spring.source];
            let t = &self.bodies[spring.target];
            let mut d = (t.pos + t.vel) - (s.pos + s.vel);
            if d.length() == 0.0 {
                d = jiggle(i);
            }
            let len = d.length();
            let k = (len - link) / len * self.alpha * spring.strength;
            let d = d * k;
            let target = &mut self.bodies[spring.target];
            target.vel = target.vel - d * spring.bias;
            let source = &mut self.bodies[spring.source];
            source.vel = source.vel + d * (1.0 - spring.bias);
        }
    }

    fn apply_charge(&mut self) {
        let min2 = self.config.charge_distance_min * self.config.charge_distance_min;
        let strength = self.config.charge_strength * self.alpha;
        let n = self.bodies.len();
        let mut deltas = vec![Position::default(); n];
        for i in 0..n {
            for j in 0..n {
                if i == j {
                    continue;
                }
                let mut d = self.bodies[j].pos - self.bodies[i].pos;
                let mut l2 = d.dot(d);
                if l2 == 0.0 {
                    d = jiggle(i * n + j);
                    l2 = d.dot(d);
                }
                if l2 < min2 {
                    l2 = (min2 * l2).sqrt();
                }
                deltas[i] = deltas[i] + d * (strength / l2);
            }
        }
        for (body, delta) in self.bodies.iter_mut().zip(deltas) {
            body.vel = body.vel + delta;
        }
    }

    fn apply_collision(&mut self) {
        let strength = self.config.collision_strength;
        let n = self.bodies.len();
        for i in 0..n {
            for j in (i + 1)..n {
                let (a, b) = (&self.bodies[i], &self.bodies[j]);
                let (ri, rj) = (a.collision_radius, b.collision_radius);
                let r = ri + rj;
                let mut d = (a.pos + a.vel) - (b.pos + b.vel);
                let mut l2 = d.dot(d);
                if l2 >= r * r {
                    continue;
                }
                if l2 == 0.0 {
                    d = jiggle(i * n + j);
                    l2 = d.dot(d);
                }
                let l = l2.sqrt();
                let push = d * ((r - l) / l * strength);
                let share = (rj * rj) / (ri * ri + rj * rj);
                self.bodies[i].vel = self.bodies[i].vel + push * share;
                self.bodies[j].vel = self.bodies[j].vel - push * (1.0 - share);
            }
        }
    }

    fn integrate(&mut self) {
        let keep = 1.0 - self.config.velocity_decay;
        for body in &mut self.bodies {
            body.vel = body.vel * keep;
            body.pos = body.pos + body.vel;
        }
    }

    fn group_centroids(&self) -> Vec<Position> {
        let mut sums = vec![(Position::default(), 0usize); self.group_count];
        for body in &self.bodies {
            let entry = &mut sums[body.group];
            entry.0 = entry.0 + body.pos;
            entry.1 += 1;
        }
        sums.into_iter()
            .map(|(sum, n)| {
                if n == 0 {
                    sum
                } else {
                    sum * (1.0 / n as f64)
                }
            })
            .collect()
    }

    /// Push every group pair whose centroids sit closer than the minimum
    /// separation apart along their centroid axis, half the deficit each.
    fn separate_groups(&mut self) -> usize {
        let min_distance = self.config.group_separation_factor * self.config.link_distance;
        let mut centroids = self.group_centroids();
        let mut pushes = 0;
        for a in 0..self.group_count {
            for b in (a + 1)..self.group_count {
                let delta = centroids[b] - centroids[a];
                let distance = delta.length();
                if distance >= min_distance {
                    continue;
                }
                let axis = if distance > COINCIDENT_EPSILON {
                    delta * (1.0 / distance)
                } else {
                    ring_point(a * self.group_count + b, self.group_count.pow(2), 1.0)
                };
                let shift = axis * ((min_distance - distance) / 2.0);
                trace!(a, b, distance, min_distance, "separating groups");
                for body in &mut self.bodies {
                    if body.group == a {
                        body.pos = body.pos - shift;
                    } else if body.group == b {
                        body.pos = body.pos + shift;
                    }
                }
                centroids[a] = centroids[a] - shift;
                centroids[b] = centroids[b] + shift;
                pushes += 1;
            }
        }
        for body in &mut self.bodies {
            body.vel = Position::default();
        }
        pushes
    }

    fn run(&mut self) {
        self.pre_position();
        self.settle(self.config.iterations);
        debug!(
            bodies = self.bodies.len(),
            springs = self.springs.len(),
            groups = self.group_count,
            alpha = self.alpha,
            "settled"
        );

        if self.group_count >= 2 {
            let pushes = self.separate_groups();
            self.alpha = self.config.relax_alpha;
            let relax = self.config.relax_iterations();
            self.settle(relax);
            debug!(pushes, relax, "separated groups and relaxed");
        }
    }
}

/// Point `k` of `n` evenly spaced on a circle of `radius` around the origin.
fn ring_point(k: usize, n: usize, radius: f64) -> Position {
    if n == 0 {
        return Position::default();
    }
    let angle = std::f64::consts::TAU * k as f64 / n as f64;
    Position::new(radius * angle.cos(), radius * angle.sin())
}

/// Tiny deterministic displacement used to break exact coincidence.
fn jiggle(seed: usize) -> Position {
    let angle = seed as f64 * 2.399_963_229_728_653; // golden angle
    Position::new(1e-6 * angle.cos(), 1e-6 * angle.sin())
}

/// Settle a copy of `nodes` and return it with finite `x`/`y` on every node.
///
/// The caller's nodes and edges are never touched. Identical inputs and
/// config always produce identical positions.
pub fn run_simulation(nodes: &[Node], edges: &[Edge], config: &SimulationConfig) -> Topology {
    let mut settled: Vec<Node> = nodes.to_vec();
    if settled.is_empty() {
        return Topology::new(settled, edges.to_vec());
    }

    let mut sim = Simulation::new(nodes, edges, config);
    sim.run();

    for (node, body) in settled.iter_mut().zip(&sim.bodies) {
        let pos = if body.pos.is_finite() {
            body.pos
        } else {
            Position::default()
        };
        node.set_position(pos);
    }
    Topology::new(settled, edges.to_vec())
}

/// [`run_simulation`] over a whole topology.
pub fn settle_topology(topology: &Topology, config: &SimulationConfig) -> Topology {
    run_simulation(&topology.nodes, &topology.edges, config)
}
