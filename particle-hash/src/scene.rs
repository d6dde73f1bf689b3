// Copyright 2025 John Brosnihan
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//! Initial particle layouts
//!
//! Fills a world box with a regular lattice of particles and gives each a
//! random velocity. The generator is seeded so the same configuration always
//! produces the same scene.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::WorldBounds;
use crate::error::{Result, SimError};
use crate::particles::ParticleSystem;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Lattice scene parameters
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SceneConfig {
    /// Particle radius
    pub radius: f64,
    /// Lattice spacing as a multiple of the radius
    pub spacing_factor: f64,
    /// Each velocity component is drawn from `[-jitter, jitter]`
    pub velocity_jitter: f64,
    /// Seed for the velocity generator
    pub seed: u64,
}

impl Default for SceneConfig {
    fn default() -> Self {
        SceneConfig {
            radius: 0.025,
            spacing_factor: 3.0,
            velocity_jitter: 0.2,
            seed: 12345,
        }
    }
}

impl SceneConfig {
    /// Set the particle radius
    pub fn with_radius(mut self, radius: f64) -> Self {
        self.radius = radius;
        self
    }

    /// Set the velocity jitter
    pub fn with_velocity_jitter(mut self, jitter: f64) -> Self {
        self.velocity_jitter = jitter;
        self
    }

    /// Set the random seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Distance between neighboring lattice sites
    pub fn spacing(&self) -> f64 {
        self.spacing_factor * self.radius
    }

    /// Lattice sites along each axis for the given box
    ///
    /// Sites are inset one spacing from every wall.
    pub fn lattice_dims(&self, bounds: &WorldBounds) -> [usize; 3] {
        let s = self.spacing();
        let size = bounds.size();
        let mut dims = [0; 3];
        for k in 0..3 {
            let n = ((size[k] - 2.0 * s) / s).floor();
            dims[k] = if n > 0.0 { n as usize } else { 0 };
        }
        dims
    }
}

/// Build a particle system on a lattice filling `bounds`
///
/// Particles are numbered x-major, then y, then z. The system's capacity
/// equals the number of particles placed.
pub fn build_grid_scene(config: &SceneConfig, bounds: &WorldBounds) -> Result<ParticleSystem> {
    bounds.validate()?;
    if !(config.spacing_factor > 0.0 && config.spacing_factor.is_finite()) {
        return Err(SimError::InvalidScene(format!(
            "lattice spacing factor {} must be positive and finite",
            config.spacing_factor
        )));
    }
    if !(config.radius > 0.0 && config.radius.is_finite()) {
        return Err(SimError::InvalidRadius(config.radius));
    }
    if !config.velocity_jitter.is_finite() {
        return Err(SimError::InvalidScene(format!(
            "velocity jitter {} must be finite",
            config.velocity_jitter
        )));
    }

    let s = config.spacing();
    let [num_x, num_y, num_z] = config.lattice_dims(bounds);
    let count = num_x
        .checked_mul(num_y)
        .and_then(|n| n.checked_mul(num_z))
        .filter(|n| n.checked_mul(3).is_some())
        .ok_or_else(|| {
            SimError::InvalidScene(format!(
                "a {}x{}x{} lattice has too many sites",
                num_x, num_y, num_z
            ))
        })?;

    let mut positions = vec![0.0; 3 * count];
    let mut velocities = vec![0.0; 3 * count];
    let mut rng = StdRng::seed_from_u64(config.seed);
    let jitter = config.velocity_jitter.abs();

    for xi in 0..num_x {
        for yi in 0..num_y {
            for zi in 0..num_z {
                let o = 3 * ((xi * num_y + yi) * num_z + zi);
                positions[o] = bounds.min[0] + s + xi as f64 * s;
                positions[o + 1] = bounds.min[1] + s + yi as f64 * s;
                positions[o + 2] = bounds.min[2] + s + zi as f64 * s;

                for k in 0..3 {
                    velocities[o + k] = if jitter > 0.0 {
                        rng.gen_range(-jitter..jitter)
                    } else {
                        0.0
                    };
                }
            }
        }
    }

    log::info!(
        "Scene: {}x{}x{} lattice, {} particles of radius {}",
        num_x,
        num_y,
        num_z,
        count,
        config.radius
    );

    ParticleSystem::new(config.radius, positions, velocities, count)
}
