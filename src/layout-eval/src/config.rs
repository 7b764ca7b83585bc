// Copyright 2026 The Simlin Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

use serde::{Deserialize, Serialize};

use crate::common::{Error, Result};

/// Simulation harness configuration.
///
/// Distances are in layout pixels. Deserializing a partial JSON object
/// yields the defaults for every missing field, so a JSON document acts as a
/// set of overrides.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    // Link force
    /// Rest length of every spring.
    pub link_distance: f64,
    /// Spring strength for edges whose endpoints share a group.
    pub intra_group_strength: f64,
    /// Spring strength for edges crossing a group boundary.
    pub inter_group_strength: f64,

    // Many-body force
    /// Pairwise charge; negative values repel.
    pub charge_strength: f64,
    /// Distances below this are clamped when computing charge.
    pub charge_distance_min: f64,

    // Collision force
    /// Added to each node's drawn radius to get its collision radius.
    pub collision_padding: f64,
    pub collision_strength: f64,

    // Integration
    /// Fraction of velocity removed per tick.
    pub velocity_decay: f64,
    /// Alpha reached (approximately) at the end of the settling loop.
    pub alpha_min: f64,
    /// Fixed settling iteration count. There is no convergence check.
    pub iterations: usize,

    // Group separation post-pass
    /// Minimum centroid distance between groups, in link distances.
    pub group_separation_factor: f64,
    /// Relax iterations after the post-pass, as a fraction of `iterations`.
    pub relax_fraction: f64,
    /// Alpha the relax phase restarts at.
    pub relax_alpha: f64,

    // Pre-positioning
    /// Radius multiplier for the ring that group centers sit on.
    pub group_ring_scale: f64,
    /// Radius multiplier for the ring each group's members sit on.
    pub member_ring_scale: f64,
    /// Maximum absolute offset added to every pre-positioned coordinate.
    pub jitter: f64,
    /// Seed for the deterministic jitter.
    pub seed: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            link_distance: 60.0,
            intra_group_strength: 0.7,
            inter_group_strength: 0.05,
            charge_strength: -150.0,
            charge_distance_min: 1.0,
            collision_padding: 3.0,
            collision_strength: 0.7,
            velocity_decay: 0.4,
            alpha_min: 0.001,
            iterations: 300,
            group_separation_factor: 2.5,
            relax_fraction: 0.3,
            relax_alpha: 0.3,
            group_ring_scale: 1.5,
            member_ring_scale: 0.45,
            jitter: 1.0,
            seed: 42,
        }
    }
}

impl SimulationConfig {
    /// Per-tick alpha decay so that alpha reaches `alpha_min` after
    /// `iterations` ticks.
    pub fn alpha_decay(&self) -> f64 {
        if self.iterations == 0 {
            return 1.0;
        }
        1.0 - self.alpha_min.powf(1.0 / self.iterations as f64)
    }

    /// Number of relax iterations run after the group separation post-pass.
    pub fn relax_iterations(&self) -> usize {
        (self.iterations as f64 * self.relax_fraction).ceil() as usize
    }

    pub fn validate(&self) -> Result<()> {
        let positive = [
            ("link_distance", self.link_distance),
            ("charge_distance_min", self.charge_distance_min),
            ("group_ring_scale", self.group_ring_scale),
            ("member_ring_scale", self.member_ring_scale),
        ];
        for (name, value) in positive {
            if !value.is_finite() || value <= 0.0 {
                return Err(Error::Config(format!("{name} must be > 0, got {value}")));
            }
        }

        let unit = [
            ("intra_group_strength", self.intra_group_strength),
            ("inter_group_strength", self.inter_group_strength),
            ("collision_strength", self.collision_strength),
            ("velocity_decay", self.velocity_decay),
            ("relax_alpha", self.relax_alpha),
        ];
        for (name, value) in unit {
            if !(0.0..=1.0).contains(&value) {
                return Err(Error::Config(format!(
                    "{name} must be in [0, 1], got {value}"
                )));
            }
        }

        if !(self.alpha_min > 0.0 && self.alpha_min < 1.0) {
            return Err(Error::Config(format!(
                "alpha_min must be in (0, 1), got {}",
                self.alpha_min
            )));
        }
        let non_negative = [
            ("collision_padding", self.collision_padding),
            ("group_separation_factor", self.group_separation_factor),
            ("relax_fraction", self.relax_fraction),
            ("jitter", self.jitter),
        ];
        for (name, value) in non_negative {
            if !value.is_finite() || value < 0.0 {
                return Err(Error::Config(format!("{name} must be >= 0, got {value}")));
            }
        }
        if !self.charge_strength.is_finite() {
            return Err(Error::Config(format!(
                "charge_strength must be finite, got {}",
                self.charge_strength
            )));
        }
        if self.iterations == 0 {
            return Err(Error::Config("iterations must be > 0".to_string()));
        }
        Ok(())
    }

    /// Parse overrides from JSON and validate the merged result.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }
}
