// Copyright 2026 The Simlin Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

//! Pure geometric measurements over a settled layout.
//!
//! Nothing in this module encodes a human-perception threshold: every
//! function reports a fact about positions and connectivity, and leaves the
//! judgement to [`crate::perception`]. Nodes without a position are omitted
//! from every aggregate, as are edges whose endpoints cannot be resolved.
//! Degenerate geometry resolves to the sentinel documented on each function
//! (0, 1 or infinity) so NaN never reaches a verdict.

use std::collections::{BTreeMap, HashSet};

use ordered_float::OrderedFloat;
use serde::Serialize;

use crate::graph::{Edge, Node, Position, position_index};

/// Radius of a node with no size hint is `NODE_BASE_RADIUS + NODE_RADIUS_SCALE`.
pub const NODE_BASE_RADIUS: f64 = 4.0;
pub const NODE_RADIUS_SCALE: f64 = 3.0;

/// Magnitudes below this are treated as zero.
const DEGENERATE_EPSILON: f64 = 1e-9;

/// Drawn radius for an optional size hint. Missing or non-finite hints count
/// as 1; negative hints count as 0.
pub fn radius_for_val(val: Option<f64>) -> f64 {
    let val = val.filter(|v| v.is_finite()).unwrap_or(1.0).max(0.0);
    NODE_BASE_RADIUS + NODE_RADIUS_SCALE * val.sqrt()
}

pub fn node_radius(node: &Node) -> f64 {
    radius_for_val(node.val)
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct GroupCentroid {
    pub centroid: Position,
    pub count: usize,
}

/// Axis-aligned bounding box.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Bounds {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
    pub width: f64,
    pub height: f64,
}

impl Bounds {
    fn of(points: &[Position]) -> Self {
        if points.is_empty() {
            return Self {
                min_x: 0.0,
                min_y: 0.0,
                max_x: 0.0,
                max_y: 0.0,
                width: 0.0,
                height: 0.0,
            };
        }
        let mut min_x = f64::INFINITY;
        let mut min_y = f64::INFINITY;
        let mut max_x = f64::NEG_INFINITY;
        let mut max_y = f64::NEG_INFINITY;
        for p in points {
            min_x = min_x.min(p.x);
            min_y = min_y.min(p.y);
            max_x = max_x.max(p.x);
            max_y = max_y.max(p.y);
        }
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
            width: max_x - min_x,
            height: max_y - min_y,
        }
    }
}

/// Everything the pipeline knows about one group.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct GroupAggregate {
    pub centroid: Position,
    pub count: usize,
    pub mean_radius: f64,
    pub bounds: Bounds,
}

/// Mean of `points`, or the origin when empty.
pub fn centroid(points: &[Position]) -> Position {
    if points.is_empty() {
        return Position::default();
    }
    let sum = points
        .iter()
        .fold(Position::default(), |acc, &p| acc + p);
    sum * (1.0 / points.len() as f64)
}

fn mean_distance_to(points: &[Position], center: Position) -> f64 {
    if points.is_empty() {
        return 0.0;
    }
    points.iter().map(|p| p.distance(center)).sum::<f64>() / points.len() as f64
}

fn group_members<'a, F>(nodes: &'a [Node], key: F) -> BTreeMap<String, Vec<Position>>
where
    F: Fn(&'a Node) -> String,
{
    let mut groups: BTreeMap<String, Vec<Position>> = BTreeMap::new();
    for node in nodes {
        if let Some(pos) = node.position() {
            groups.entry(key(node)).or_default().push(pos);
        }
    }
    groups
}

fn aggregate(points: &[Position]) -> GroupAggregate {
    let center = centroid(points);
    GroupAggregate {
        centroid: center,
        count: points.len(),
        mean_radius: mean_distance_to(points, center),
        bounds: Bounds::of(points),
    }
}

pub fn group_centroids(nodes: &[Node]) -> BTreeMap<String, GroupCentroid> {
    group_members(nodes, |n| n.group_key().into_owned())
        .into_iter()
        .map(|(key, points)| {
            let gc = GroupCentroid {
                centroid: centroid(&points),
                count: points.len(),
            };
            (key, gc)
        })
        .collect()
}

/// Like [`group_centroids`], but keyed by the first `depth` levels of each
/// node's nested group path.
pub fn group_centroids_at_depth(nodes: &[Node], depth: usize) -> BTreeMap<String, GroupCentroid> {
    group_members(nodes, |n| n.group_key_at_depth(depth).into_owned())
        .into_iter()
        .map(|(key, points)| {
            let gc = GroupCentroid {
                centroid: centroid(&points),
                count: points.len(),
            };
            (key, gc)
        })
        .collect()
}

/// Mean member distance to the group centroid.
pub fn group_radii(nodes: &[Node]) -> BTreeMap<String, f64> {
    group_members(nodes, |n| n.group_key().into_owned())
        .into_iter()
        .map(|(key, points)| {
            let r = mean_distance_to(&points, centroid(&points));
            (key, r)
        })
        .collect()
}

pub fn group_bounds(nodes: &[Node]) -> BTreeMap<String, Bounds> {
    group_members(nodes, |n| n.group_key().into_owned())
        .into_iter()
        .map(|(key, points)| (key, Bounds::of(&points)))
        .collect()
}

pub fn group_aggregates(nodes: &[Node]) -> BTreeMap<String, GroupAggregate> {
    group_members(nodes, |n| n.group_key().into_owned())
        .into_iter()
        .map(|(key, points)| (key, aggregate(&points)))
        .collect()
}

pub fn global_centroid(nodes: &[Node]) -> Position {
    let points: Vec<Position> = nodes.iter().filter_map(Node::position).collect();
    centroid(&points)
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PairDistance {
    pub a: String,
    pub b: String,
    pub distance: f64,
}

/// Distance between every unordered pair of placed nodes. O(n^2).
pub fn pairwise_distances(nodes: &[Node]) -> Vec<PairDistance> {
    let placed: Vec<(&Node, Position)> = nodes
        .iter()
        .filter_map(|n| n.position().map(|p| (n, p)))
        .collect();
    let mut out = Vec::with_capacity(placed.len() * placed.len().saturating_sub(1) / 2);
    for i in 0..placed.len() {
        for j in (i + 1)..placed.len() {
            out.push(PairDistance {
                a: placed[i].0.id.clone(),
                b: placed[j].0.id.clone(),
                distance: placed[i].1.distance(placed[j].1),
            });
        }
    }
    out
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct EdgeLength {
    pub source: String,
    pub target: String,
    /// `None` when either endpoint is missing or unplaced.
    pub length: Option<f64>,
}

pub fn edge_lengths(nodes: &[Node], edges: &[Edge]) -> Vec<EdgeLength> {
    let index = position_index(nodes);
    edges
        .iter()
        .map(|e| {
            let length = match (index.get(e.source_id()), index.get(e.target_id())) {
                (Some(a), Some(b)) => Some(a.distance(*b)),
                _ => None,
            };
            EdgeLength {
                source: e.source_id().to_string(),
                target: e.target_id().to_string(),
                length,
            }
        })
        .collect()
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Degree {
    pub in_degree: usize,
    pub out_degree: usize,
}

impl Degree {
    pub fn total(&self) -> usize {
        self.in_degree + self.out_degree
    }
}

/// In/out degree of every node. Edges referencing a node id that is not in
/// `nodes` are skipped entirely. Positions are irrelevant here.
pub fn node_degrees(nodes: &[Node], edges: &[Edge]) -> BTreeMap<String, Degree> {
    let mut degrees: BTreeMap<String, Degree> = nodes
        .iter()
        .map(|n| (n.id.clone(), Degree::default()))
        .collect();
    for edge in edges {
        let (source, target) = (edge.source_id(), edge.target_id());
        if !degrees.contains_key(source) || !degrees.contains_key(target) {
            continue;
        }
        if let Some(d) = degrees.get_mut(source) {
            d.out_degree += 1;
        }
        if let Some(d) = degrees.get_mut(target) {
            d.in_degree += 1;
        }
    }
    degrees
}

/// Number of placed node pairs whose separation is less than the sum of
/// their drawn radii.
pub fn overlap_count(nodes: &[Node]) -> usize {
    let placed: Vec<(Position, f64)> = nodes
        .iter()
        .filter_map(|n| n.position().map(|p| (p, node_radius(n))))
        .collect();
    let mut count = 0;
    for i in 0..placed.len() {
        for j in (i + 1)..placed.len() {
            let (pi, ri) = placed[i];
            let (pj, rj) = placed[j];
            if pi.distance(pj) < ri + rj {
                count += 1;
            }
        }
    }
    count
}

fn pair_count(n: usize) -> usize {
    n * n.saturating_sub(1) / 2
}

/// Fraction of placed node pairs that overlap. 0 for fewer than 2 nodes.
pub fn overlap_rate(nodes: &[Node]) -> f64 {
    let placed = nodes.iter().filter(|n| n.position().is_some()).count();
    if placed < 2 {
        return 0.0;
    }
    overlap_count(nodes) as f64 / pair_count(placed) as f64
}

/// Proper crossing test for segments p1-p2 and q1-q2: the orientation of
/// each segment's endpoints relative to the other segment must alternate
/// sign. Touching and collinear segments do not cross.
pub fn segments_cross(p1: Position, p2: Position, q1: Position, q2: Position) -> bool {
    let d1 = p2 - p1;
    let d2 = q2 - q1;
    let o1 = d1.cross_2d(q1 - p1);
    let o2 = d1.cross_2d(q2 - p1);
    let o3 = d2.cross_2d(p1 - q1);
    let o4 = d2.cross_2d(p2 - q1);
    o1 * o2 < 0.0 && o3 * o4 < 0.0
}

struct Segment<'a> {
    from: &'a str,
    to: &'a str,
    start: Position,
    end: Position,
}

fn resolved_segments<'a>(nodes: &'a [Node], edges: &'a [Edge]) -> Vec<Segment<'a>> {
    let index = position_index(nodes);
    edges
        .iter()
        .filter_map(|e| {
            let start = *index.get(e.source_id())?;
            let end = *index.get(e.target_id())?;
            Some(Segment {
                from: e.source_id(),
                to: e.target_id(),
                start,
                end,
            })
        })
        .collect()
}

fn shares_endpoint(a: &Segment, b: &Segment) -> bool {
    a.from == b.from || a.from == b.to || a.to == b.from || a.to == b.to
}

/// Number of distinct edge pairs that properly cross. Pairs sharing an
/// endpoint never count. O(e^2).
pub fn edge_crossing_count(nodes: &[Node], edges: &[Edge]) -> usize {
    let segments = resolved_segments(nodes, edges);
    let mut count = 0;
    for i in 0..segments.len() {
        for j in (i + 1)..segments.len() {
            let (a, b) = (&segments[i], &segments[j]);
            if !shares_endpoint(a, b) && segments_cross(a.start, a.end, b.start, b.end) {
                count += 1;
            }
        }
    }
    count
}

/// Crossing pairs over all resolvable edge pairs. 0 for fewer than 2 edges.
pub fn edge_crossing_rate(nodes: &[Node], edges: &[Edge]) -> f64 {
    let resolved = resolved_segments(nodes, edges).len();
    if resolved < 2 {
        return 0.0;
    }
    edge_crossing_count(nodes, edges) as f64 / pair_count(resolved) as f64
}

/// Positions of `ids` in the given order, skipping ids that are absent or
/// unplaced.
pub fn positions_of(nodes: &[Node], ids: &[String]) -> Vec<Position> {
    let index = position_index(nodes);
    ids.iter()
        .filter_map(|id| index.get(id.as_str()).copied())
        .collect()
}

/// Principal-axis aspect ratio, sqrt(major / minor eigenvalue) of the point
/// covariance. 1 for fewer than 2 points or when every point coincides;
/// infinity when the points are collinear.
pub fn elongation_ratio(points: &[Position]) -> f64 {
    if points.len() < 2 {
        return 1.0;
    }
    let c = centroid(points);
    let n = points.len() as f64;
    let (mut sxx, mut sxy, mut syy) = (0.0, 0.0, 0.0);
    for p in points {
        let d = *p - c;
        sxx += d.x * d.x;
        sxy += d.x * d.y;
        syy += d.y * d.y;
    }
    sxx /= n;
    sxy /= n;
    syy /= n;

    let half_trace = (sxx + syy) / 2.0;
    let det = sxx * syy - sxy * sxy;
    let disc = (half_trace * half_trace - det).max(0.0).sqrt();
    let major = half_trace + disc;
    let minor = half_trace - disc;

    if major <= DEGENERATE_EPSILON {
        return 1.0;
    }
    if minor <= DEGENERATE_EPSILON * major.max(1.0) {
        return f64::INFINITY;
    }
    (major / minor).sqrt()
}

/// Hub distance from the global centroid divided by the mean distance of
/// every other placed node from it. 0 means perfectly central. `None` when
/// the hub is absent or unplaced.
///
/// Measured against the whole layout, not the hub's group: a viewer spotting
/// hotspots scans the entire picture, and a hub that only anchors its own
/// corner of a multi-group layout does not read as the graph's hotspot.
pub fn hub_centrality_error(nodes: &[Node], hub_id: &str) -> Option<f64> {
    let hub = nodes.iter().find(|n| n.id == hub_id)?.position()?;
    let center = global_centroid(nodes);
    let members: Vec<Position> = nodes
        .iter()
        .filter(|n| n.id != hub_id)
        .filter_map(Node::position)
        .collect();
    if members.is_empty() {
        return Some(0.0);
    }
    Some(ratio_or_sentinel(
        hub.distance(center),
        mean_distance_to(&members, center),
    ))
}

/// `num / den`, with 0/0 reading as 0 and x/0 as infinity.
fn ratio_or_sentinel(num: f64, den: f64) -> f64 {
    if den <= DEGENERATE_EPSILON {
        if num <= DEGENERATE_EPSILON {
            0.0
        } else {
            f64::INFINITY
        }
    } else {
        num / den
    }
}

/// Straight-line span (first to last) divided by the summed hop distance
/// along `ids`. 1 is perfectly straight; 1 for fewer than 2 placed nodes.
pub fn chain_linearity_score(nodes: &[Node], ids: &[String]) -> f64 {
    let points = positions_of(nodes, ids);
    if points.len() < 2 {
        return 1.0;
    }
    let path: f64 = points.windows(2).map(|w| w[0].distance(w[1])).sum();
    if path <= DEGENERATE_EPSILON {
        return 1.0;
    }
    let span = points[0].distance(points[points.len() - 1]);
    (span / path).min(1.0)
}

/// Centroid distance over the sum of the two groups' mean radii.
pub fn group_pair_separation(a: &GroupAggregate, b: &GroupAggregate) -> f64 {
    ratio_or_sentinel(
        a.centroid.distance(b.centroid),
        a.mean_radius + b.mean_radius,
    )
}

/// Minimum [`group_pair_separation`] over all group pairs. Infinity for
/// fewer than 2 groups.
pub fn blob_separation_ratio(nodes: &[Node]) -> f64 {
    let groups: Vec<GroupAggregate> = group_aggregates(nodes).into_values().collect();
    let mut ratios = Vec::new();
    for i in 0..groups.len() {
        for j in (i + 1)..groups.len() {
            ratios.push(OrderedFloat(group_pair_separation(&groups[i], &groups[j])));
        }
    }
    ratios
        .into_iter()
        .min()
        .map_or(f64::INFINITY, |r| r.into_inner())
}

/// Mean intra-group pair distance over mean inter-group pair distance.
/// Lower means tighter groups. 1 when there are no inter-group pairs; 0 when
/// there are no intra-group pairs.
pub fn gestalt_proximity_ratio(nodes: &[Node]) -> f64 {
    let placed: Vec<(String, Position)> = nodes
        .iter()
        .filter_map(|n| n.position().map(|p| (n.group_key().into_owned(), p)))
        .collect();
    let (mut intra_sum, mut intra_n) = (0.0, 0usize);
    let (mut inter_sum, mut inter_n) = (0.0, 0usize);
    for i in 0..placed.len() {
        for j in (i + 1)..placed.len() {
            let d = placed[i].1.distance(placed[j].1);
            if placed[i].0 == placed[j].0 {
                intra_sum += d;
                intra_n += 1;
            } else {
                inter_sum += d;
                inter_n += 1;
            }
        }
    }
    if inter_n == 0 {
        return 1.0;
    }
    if intra_n == 0 {
        return 0.0;
    }
    let intra = intra_sum / intra_n as f64;
    let inter = inter_sum / inter_n as f64;
    if inter <= DEGENERATE_EPSILON {
        return if intra <= DEGENERATE_EPSILON {
            1.0
        } else {
            f64::INFINITY
        };
    }
    intra / inter
}

/// RMS distance of placed nodes from the global centroid. 0 when empty.
pub fn layout_spread(nodes: &[Node]) -> f64 {
    let points: Vec<Position> = nodes.iter().filter_map(Node::position).collect();
    if points.is_empty() {
        return 0.0;
    }
    let c = centroid(&points);
    let sq: f64 = points
        .iter()
        .map(|p| {
            let d = *p - c;
            d.dot(d)
        })
        .sum();
    (sq / points.len() as f64).sqrt()
}

/// Distance from `sink` to the centroid of its in-neighbors, over the mean
/// in-neighbor distance to that centroid. Small values mean the sink sits
/// where its sources converge. `None` if the sink is unplaced or has no
/// placed sources.
pub fn sink_convergence_ratio(nodes: &[Node], edges: &[Edge], sink_id: &str) -> Option<f64> {
    let index = position_index(nodes);
    let sink = *index.get(sink_id)?;
    let mut seen = HashSet::new();
    let sources: Vec<Position> = edges
        .iter()
        .filter(|e| e.target_id() == sink_id && e.source_id() != sink_id)
        .filter(|e| seen.insert(e.source_id()))
        .filter_map(|e| index.get(e.source_id()).copied())
        .collect();
    if sources.is_empty() {
        return None;
    }
    let c = centroid(&sources);
    Some(ratio_or_sentinel(
        sink.distance(c),
        mean_distance_to(&sources, c),
    ))
}

/// Centroid of each layer, keyed by layer index. Assignments naming absent
/// or unplaced nodes are ignored.
pub fn layer_centroids(
    nodes: &[Node],
    assignments: &BTreeMap<String, usize>,
) -> BTreeMap<usize, Position> {
    let index = position_index(nodes);
    let mut layers: BTreeMap<usize, Vec<Position>> = BTreeMap::new();
    for (id, layer) in assignments {
        if let Some(p) = index.get(id.as_str()) {
            layers.entry(*layer).or_default().push(*p);
        }
    }
    layers
        .into_iter()
        .map(|(layer, points)| (layer, centroid(&points)))
        .collect()
}

/// Projection of each point onto the axis running from the first point to
/// the last, measured from the first. All zeros when that axis is
/// degenerate.
pub fn axis_projections(points: &[Position]) -> Vec<f64> {
    let Some((&first, &last)) = points.first().zip(points.last()) else {
        return Vec::new();
    };
    let axis = last - first;
    let len = axis.length();
    if len <= DEGENERATE_EPSILON {
        return vec![0.0; points.len()];
    }
    let unit = axis * (1.0 / len);
    points.iter().map(|p| (*p - first).dot(unit)).collect()
}

/// Smallest distance between consecutive points. Infinity for fewer than 2.
pub fn min_consecutive_distance(points: &[Position]) -> f64 {
    points
        .windows(2)
        .map(|w| OrderedFloat(w[0].distance(w[1])))
        .min()
        .map_or(f64::INFINITY, |d| d.into_inner())
}

/// Parameter interval `[t0, t1]` (within `[0, 1]`) of segment p1-p2 lying
/// strictly inside the circle, if any.
pub fn segment_circle_span(
    p1: Position,
    p2: Position,
    center: Position,
    radius: f64,
) -> Option<(f64, f64)> {
    if radius <= 0.0 {
        return None;
    }
    let d = p2 - p1;
    let f = p1 - center;
    let a = d.dot(d);
    if a <= DEGENERATE_EPSILON {
        return (f.length() < radius).then_some((0.0, 1.0));
    }
    let b = 2.0 * f.dot(d);
    let c = f.dot(f) - radius * radius;
    let disc = b * b - 4.0 * a * c;
    if disc <= 0.0 {
        return None;
    }
    let s = disc.sqrt();
    let t0 = ((-b - s) / (2.0 * a)).max(0.0);
    let t1 = ((-b + s) / (2.0 * a)).min(1.0);
    (t0 < t1).then_some((t0, t1))
}

/// Length of segment p1-p2 that lies outside every circle in `circles`.
pub fn exposed_length(p1: Position, p2: Position, circles: &[(Position, f64)]) -> f64 {
    let length = p1.distance(p2);
    let mut spans: Vec<(f64, f64)> = circles
        .iter()
        .filter_map(|&(c, r)| segment_circle_span(p1, p2, c, r))
        .collect();
    spans.sort_by_key(|&(t0, _)| OrderedFloat(t0));

    let mut covered = 0.0;
    let mut current: Option<(f64, f64)> = None;
    for (t0, t1) in spans {
        current = match current {
            Some((s0, s1)) if t0 <= s1 => Some((s0, s1.max(t1))),
            Some((s0, s1)) => {
                covered += s1 - s0;
                Some((t0, t1))
            }
            None => Some((t0, t1)),
        };
    }
    if let Some((s0, s1)) = current {
        covered += s1 - s0;
    }
    length * (1.0 - covered).max(0.0)
}

/// A resolvable edge whose endpoints belong to different groups.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CrossGroupEdge {
    pub source: String,
    pub target: String,
    pub length: f64,
    /// Portion of the edge outside both groups' mean-radius blobs.
    pub exposed: f64,
}

pub fn cross_group_edges(nodes: &[Node], edges: &[Edge]) -> Vec<CrossGroupEdge> {
    let groups = group_aggregates(nodes);
    let placed: BTreeMap<&str, (Position, String)> = nodes
        .iter()
        .filter_map(|n| {
            n.position()
                .map(|p| (n.id.as_str(), (p, n.group_key().into_owned())))
        })
        .collect();
    edges
        .iter()
        .filter_map(|e| {
            let (p1, g1) = placed.get(e.source_id())?;
            let (p2, g2) = placed.get(e.target_id())?;
            if g1 == g2 {
                return None;
            }
            let circles: Vec<(Position, f64)> = [g1, g2]
                .iter()
                .filter_map(|g| groups.get(g.as_str()))
                .map(|agg| (agg.centroid, agg.mean_radius))
                .collect();
            Some(CrossGroupEdge {
                source: e.source_id().to_string(),
                target: e.target_id().to_string(),
                length: p1.distance(*p2),
                exposed: exposed_length(*p1, *p2, &circles),
            })
        })
        .collect()
}
