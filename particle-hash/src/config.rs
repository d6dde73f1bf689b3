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
//! Simulation configuration values
//!
//! Everything a step needs besides the particle buffers travels in these
//! values: timestep, gravity and the world box. Nothing here is global, so
//! several simulations can run side by side with different settings.

use crate::error::{Result, SimError};
use crate::vector::Vec3;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Axis-aligned box that particles are kept inside
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct WorldBounds {
    /// Lower corner
    pub min: Vec3,
    /// Upper corner
    pub max: Vec3,
}

impl WorldBounds {
    /// Create bounds from two corners
    pub fn new(min: Vec3, max: Vec3) -> Self {
        WorldBounds { min, max }
    }

    /// Check that every axis has finite corners with min < max
    pub fn validate(&self) -> Result<()> {
        for axis in 0..3 {
            let (min, max) = (self.min[axis], self.max[axis]);
            if !(min.is_finite() && max.is_finite() && min < max) {
                return Err(SimError::InvalidBounds { axis, min, max });
            }
        }
        Ok(())
    }

    /// Extent along each axis
    pub fn size(&self) -> Vec3 {
        [
            self.max[0] - self.min[0],
            self.max[1] - self.min[1],
            self.max[2] - self.min[2],
        ]
    }

    /// Check whether `point` lies inside the box shrunk by `margin` on every side
    ///
    /// A small tolerance absorbs rounding from clamping and contact correction.
    pub fn contains(&self, point: Vec3, margin: f64) -> bool {
        const EPS: f64 = 1e-9;
        (0..3).all(|k| {
            point[k] >= self.min[k] + margin - EPS && point[k] <= self.max[k] - margin + EPS
        })
    }
}

impl Default for WorldBounds {
    fn default() -> Self {
        WorldBounds::new([-1.0, 0.0, -1.0], [1.0, 2.0, 1.0])
    }
}

/// Timestep, gravity and world box for a running simulation
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SimulationConfig {
    /// Fixed timestep in seconds
    pub timestep: f64,
    /// Gravitational acceleration applied to every particle
    pub gravity: Vec3,
    /// Box the particles bounce inside
    pub bounds: WorldBounds,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        SimulationConfig {
            timestep: 1.0 / 60.0,
            gravity: [0.0, 0.0, 0.0],
            bounds: WorldBounds::default(),
        }
    }
}

impl SimulationConfig {
    /// Create a configuration with the given timestep and defaults otherwise
    ///
    /// # Panics
    ///
    /// Panics if timestep is non-positive, NaN, or infinite
    pub fn new(timestep: f64) -> Self {
        assert!(
            timestep > 0.0 && timestep.is_finite(),
            "Timestep must be positive and finite"
        );
        SimulationConfig {
            timestep,
            ..Default::default()
        }
    }

    /// Set the gravity vector
    pub fn with_gravity(mut self, gravity: Vec3) -> Self {
        self.gravity = gravity;
        self
    }

    /// Set the world bounds
    pub fn with_bounds(mut self, bounds: WorldBounds) -> Self {
        self.bounds = bounds;
        self
    }

    /// Check timestep, gravity and bounds
    pub fn validate(&self) -> Result<()> {
        if !(self.timestep > 0.0 && self.timestep.is_finite()) {
            return Err(SimError::InvalidTimestep(self.timestep));
        }
        if !self.gravity.iter().all(|g| g.is_finite()) {
            return Err(SimError::InvalidGravity(self.gravity));
        }
        self.bounds.validate()
    }

    /// Validate the timestep for stability
    ///
    /// Returns a warning message if the timestep might cause numerical
    /// issues: extremely small steps lose precision, large steps let
    /// particles tunnel through each other in a single frame.
    pub fn validate_timestep(&self) -> std::result::Result<(), String> {
        let dt = self.timestep;

        if dt <= 0.0 || !dt.is_finite() {
            return Err(format!("Invalid timestep: {}. Must be positive and finite.", dt));
        }

        if dt < 1e-9 {
            return Err(format!(
                "Warning: Timestep {} is extremely small and may cause precision loss with f64.",
                dt
            ));
        }

        if dt > 1.0 {
            return Err(format!(
                "Warning: Timestep {} is large and may cause instability. \
                Consider using smaller timesteps for better accuracy.",
                dt
            ));
        }

        Ok(())
    }
}

/// Sizing of the spatial hash
///
/// Cell size and table size only tune performance. Correctness needs the
/// cell size to be positive, the table to have at least one bucket, and
/// the query buffer to hold the largest neighborhood a query can return.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct HashConfig {
    /// Edge length of a grid cell
    pub cell_size: f64,
    /// Number of hash buckets
    pub table_size: usize,
    /// Maximum number of objects the hash indexes
    pub max_objects: usize,
    /// Capacity of the query scratch buffer
    pub query_capacity: usize,
}

impl HashConfig {
    /// Default sizing for `max_objects` particles of the given radius
    ///
    /// One diameter per cell, two buckets per object, and a query buffer
    /// large enough for every object.
    pub fn for_particles(radius: f64, max_objects: usize) -> Self {
        HashConfig {
            cell_size: 2.0 * radius,
            table_size: 2 * max_objects.max(1),
            max_objects,
            query_capacity: max_objects,
        }
    }

    /// Override the number of buckets
    pub fn with_table_size(mut self, table_size: usize) -> Self {
        self.table_size = table_size;
        self
    }

    /// Override the edge length of a cell
    pub fn with_cell_size(mut self, cell_size: f64) -> Self {
        self.cell_size = cell_size;
        self
    }

    /// Override the query scratch capacity
    pub fn with_query_capacity(mut self, query_capacity: usize) -> Self {
        self.query_capacity = query_capacity;
        self
    }

    /// Check the sizing
    pub fn validate(&self) -> Result<()> {
        if !(self.cell_size > 0.0 && self.cell_size.is_finite()) {
            return Err(SimError::InvalidHashConfig(format!(
                "cell size {} must be positive and finite",
                self.cell_size
            )));
        }
        if self.table_size == 0 {
            return Err(SimError::InvalidHashConfig(
                "table size must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
