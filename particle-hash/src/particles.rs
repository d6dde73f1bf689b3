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
//! Equal-radius particle system with elastic collisions
//!
//! A [`ParticleSystem`] owns flat position, previous-position and velocity
//! buffers for a fixed number of equal spheres plus the [`SpatialHash`]
//! used to find contact candidates. One call to [`ParticleSystem::step`]
//! advances every particle by one fixed timestep.
//!
//! # Pipeline
//!
//! Each step runs four phases in this order:
//!
//! 1. **Integrate**: semi-implicit Euler, `v += g*dt` then `x += v*dt`
//! 2. **Rebuild hash** from the integrated positions
//! 3. **Walls**: clamp into the world box and reflect the normal velocity
//! 4. **Contacts**: separate overlapping pairs and exchange their normal
//!    velocity components (equal masses, perfectly elastic)
//!
//! # Ordering contract
//!
//! Contacts are resolved one pair at a time, particles in increasing index
//! order and candidates in hash order, and every correction is written
//! back immediately. A later pair sees the positions and velocities left
//! by earlier pairs in the same frame (Gauss-Seidel relaxation). Replacing
//! this with a batched, double-buffered solve changes trajectories.

use crate::config::{HashConfig, WorldBounds};
use crate::error::{Result, SimError};
use crate::hash::SpatialHash;
use crate::vector::{
    vec_add, vec_copy, vec_dot, vec_length_squared, vec_scale, vec_set_diff, TripleBuffer, Vec3,
};

/// Counters for one call to [`ParticleSystem::step`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StepStats {
    /// Wall contacts resolved (one per particle and axis)
    pub boundary_contacts: usize,
    /// Particle pairs found overlapping and separated
    pub pair_contacts: usize,
    /// Candidates returned by neighbor queries
    pub candidates: usize,
}

/// Fixed set of equal-radius spheres
///
/// # Examples
///
/// ```
/// use particle_hash::config::WorldBounds;
/// use particle_hash::particles::ParticleSystem;
///
/// let mut system = ParticleSystem::new(
///     0.1,
///     vec![0.0, 1.0, 0.0, 0.15, 1.0, 0.0],
///     vec![1.0, 0.0, 0.0, -1.0, 0.0, 0.0],
///     2,
/// ).unwrap();
///
/// let bounds = WorldBounds::new([-10.0; 3], [10.0; 3]);
/// let stats = system.step(1.0 / 60.0, [0.0; 3], &bounds).unwrap();
/// assert_eq!(stats.pair_contacts, 1);
/// ```
#[derive(Debug, Clone)]
pub struct ParticleSystem {
    radius: f64,
    num_particles: usize,
    positions: TripleBuffer,
    prev_positions: TripleBuffer,
    velocities: TripleBuffer,
    collided: Vec<bool>,
    hash: SpatialHash,
}

impl ParticleSystem {
    /// Create a system from flat initial buffers
    ///
    /// `positions` and `velocities` hold one triple per particle. The hash
    /// is sized for `max_count` particles with the default cell and table
    /// sizes (see [`HashConfig::for_particles`]).
    ///
    /// # Errors
    ///
    /// Fails if the radius is not positive and finite, a buffer length is
    /// not a multiple of 3, the two buffers differ in length, or there are
    /// more than `max_count` particles.
    pub fn new(
        radius: f64,
        positions: Vec<f64>,
        velocities: Vec<f64>,
        max_count: usize,
    ) -> Result<Self> {
        Self::with_hash_config(
            radius,
            positions,
            velocities,
            HashConfig::for_particles(radius, max_count),
        )
    }

    /// Create a system with explicit spatial hash sizing
    ///
    /// The hash's `max_objects` is the particle capacity.
    pub fn with_hash_config(
        radius: f64,
        positions: Vec<f64>,
        velocities: Vec<f64>,
        hash_config: HashConfig,
    ) -> Result<Self> {
        if !(radius > 0.0 && radius.is_finite()) {
            return Err(SimError::InvalidRadius(radius));
        }
        if positions.len() != velocities.len() {
            // Report misalignment first when it explains the mismatch
            for (name, buf) in [("positions", &positions), ("velocities", &velocities)] {
                if buf.len() % 3 != 0 {
                    return Err(SimError::MisalignedBuffer { name, len: buf.len() });
                }
            }
            return Err(SimError::LengthMismatch {
                positions: positions.len(),
                velocities: velocities.len(),
            });
        }

        let positions = TripleBuffer::from_flat("positions", positions)?;
        let velocities = TripleBuffer::from_flat("velocities", velocities)?;
        let num_particles = positions.count();
        if num_particles > hash_config.max_objects {
            return Err(SimError::TooManyParticles {
                count: num_particles,
                max: hash_config.max_objects,
            });
        }

        let hash = SpatialHash::with_config(hash_config)?;
        log::debug!(
            "ParticleSystem: {} particles of radius {:.4} (capacity {})",
            num_particles,
            radius,
            hash_config.max_objects
        );

        Ok(ParticleSystem {
            radius,
            num_particles,
            prev_positions: positions.clone(),
            positions,
            velocities,
            collided: vec![false; num_particles],
            hash,
        })
    }

    /// Shared particle radius
    pub fn radius(&self) -> f64 {
        self.radius
    }

    /// Number of particles
    pub fn len(&self) -> usize {
        self.num_particles
    }

    /// Check if the system has no particles
    pub fn is_empty(&self) -> bool {
        self.num_particles == 0
    }

    /// Flat position buffer, triple `i` at `3*i`
    ///
    /// Renderers read this after each step.
    pub fn positions(&self) -> &[f64] {
        self.positions.as_slice()
    }

    /// Flat positions from before the last integration
    pub fn prev_positions(&self) -> &[f64] {
        self.prev_positions.as_slice()
    }

    /// Flat velocity buffer
    pub fn velocities(&self) -> &[f64] {
        self.velocities.as_slice()
    }

    /// Position of particle `i`
    pub fn position(&self, i: usize) -> Vec3 {
        self.positions.get(i)
    }

    /// Velocity of particle `i`
    pub fn velocity(&self, i: usize) -> Vec3 {
        self.velocities.get(i)
    }

    /// Overwrite the position of particle `i`
    pub fn set_position(&mut self, i: usize, p: Vec3) {
        self.positions.set(i, p);
    }

    /// Overwrite the velocity of particle `i`
    pub fn set_velocity(&mut self, i: usize, v: Vec3) {
        self.velocities.set(i, v);
    }

    /// Per-particle flag: touched a wall or another particle in the last step
    pub fn collision_flags(&self) -> &[bool] {
        &self.collided
    }

    /// Check that every position and velocity is finite
    pub fn is_finite(&self) -> bool {
        self.positions.is_valid() && self.velocities.is_valid()
    }

    /// Spatial hash as left by the last step
    pub fn hash(&self) -> &SpatialHash {
        &self.hash
    }

    /// Kinetic energy assuming unit mass per particle
    pub fn kinetic_energy(&self) -> f64 {
        let v = self.velocities.as_slice();
        (0..self.num_particles)
            .map(|i| 0.5 * vec_length_squared(v, i))
            .sum()
    }

    /// Total linear momentum assuming unit mass per particle
    pub fn momentum(&self) -> Vec3 {
        let mut p = [0.0; 3];
        for i in 0..self.num_particles {
            vec_add(&mut p, 0, self.velocities.as_slice(), i, 1.0);
        }
        p
    }

    /// Advance the system by one timestep
    ///
    /// Runs integrate, hash rebuild, wall and contact phases in that order.
    /// See the module docs for the ordering contract of the contact phase.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::CapacityExceeded`] if a neighbor query overflows
    /// the hash's scratch buffer. Phases before the failing query have
    /// already been applied.
    pub fn step(&mut self, dt: f64, gravity: Vec3, bounds: &WorldBounds) -> Result<StepStats> {
        let mut stats = StepStats::default();
        self.collided.fill(false);

        self.integrate(dt, &gravity);
        self.hash.build(self.positions.as_slice(), self.num_particles);
        stats.boundary_contacts = self.resolve_boundaries(bounds);
        let (pair_contacts, candidates) = self.resolve_contacts()?;
        stats.pair_contacts = pair_contacts;
        stats.candidates = candidates;

        log::trace!(
            "step: {} wall contacts, {} pair contacts, {} candidates",
            stats.boundary_contacts,
            stats.pair_contacts,
            stats.candidates
        );
        Ok(stats)
    }

    fn integrate(&mut self, dt: f64, gravity: &Vec3) {
        let pos = self.positions.as_mut_slice();
        let prev = self.prev_positions.as_mut_slice();
        let vel = &mut self.velocities;

        for i in 0..self.num_particles {
            vel.add_scaled(i, *gravity, dt);
            vec_copy(prev, i, pos, i);
            vec_add(pos, i, vel.as_slice(), i, dt);
        }
    }

    fn resolve_boundaries(&mut self, bounds: &WorldBounds) -> usize {
        let r = self.radius;
        let pos = self.positions.as_mut_slice();
        let vel = self.velocities.as_mut_slice();
        let mut contacts = 0;

        for i in 0..self.num_particles {
            for dim in 0..3 {
                let nr = 3 * i + dim;
                if pos[nr] < bounds.min[dim] + r {
                    pos[nr] = bounds.min[dim] + r;
                    vel[nr] = -vel[nr];
                } else if pos[nr] > bounds.max[dim] - r {
                    pos[nr] = bounds.max[dim] - r;
                    vel[nr] = -vel[nr];
                } else {
                    continue;
                }
                self.collided[i] = true;
                contacts += 1;
            }
        }
        contacts
    }

    fn resolve_contacts(&mut self) -> Result<(usize, usize)> {
        let min_dist = 2.0 * self.radius;
        let min_dist_sq = min_dist * min_dist;
        let mut normal = [0.0; 3];
        let mut contacts = 0;
        let mut candidates = 0;

        let ParticleSystem {
            positions,
            velocities,
            collided,
            hash,
            num_particles,
            ..
        } = self;
        let pos = positions.as_mut_slice();
        let vel = velocities.as_mut_slice();

        for i in 0..*num_particles {
            let neighbors = hash.query(pos, i, min_dist)?;
            candidates += neighbors.len();

            for &j in neighbors {
                // Each unordered pair is handled from its lower index
                if j <= i {
                    continue;
                }

                vec_set_diff(&mut normal, 0, pos, i, pos, j, 1.0);
                let d2 = vec_length_squared(&normal, 0);

                // Coincident centers have no normal and are left alone
                if d2 > 0.0 && d2 < min_dist_sq {
                    let d = d2.sqrt();
                    vec_scale(&mut normal, 0, 1.0 / d);

                    let corr = (min_dist - d) * 0.5;
                    vec_add(pos, i, &normal, 0, corr);
                    vec_add(pos, j, &normal, 0, -corr);

                    let vi = vec_dot(vel, i, &normal, 0);
                    let vj = vec_dot(vel, j, &normal, 0);
                    vec_add(vel, i, &normal, 0, vj - vi);
                    vec_add(vel, j, &normal, 0, vi - vj);

                    collided[i] = true;
                    collided[j] = true;
                    contacts += 1;
                }
            }
        }
        Ok((contacts, candidates))
    }
}
