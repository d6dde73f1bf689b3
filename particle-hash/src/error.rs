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
//! Error types for particle systems and the spatial hash

use thiserror::Error;

/// Errors reported by construction, configuration and neighbor queries
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimError {
    /// Particle radius was zero, negative, NaN or infinite
    #[error("Invalid particle radius: {0}. Must be positive and finite.")]
    InvalidRadius(f64),

    /// A flat triple buffer whose length is not a multiple of 3
    #[error("Buffer `{name}` has length {len}, which is not a multiple of 3")]
    MisalignedBuffer {
        /// Which buffer was rejected
        name: &'static str,
        /// Its length in scalars
        len: usize,
    },

    /// Position and velocity buffers describe different particle counts
    #[error("Position buffer has {positions} scalars but velocity buffer has {velocities}")]
    LengthMismatch {
        /// Length of the position buffer
        positions: usize,
        /// Length of the velocity buffer
        velocities: usize,
    },

    /// More initial particles than the system was sized for
    #[error("{count} particles exceed the maximum of {max}")]
    TooManyParticles {
        /// Number of particles supplied
        count: usize,
        /// Capacity the system was constructed with
        max: usize,
    },

    /// World bounds with min >= max on some axis, or non-finite corners
    #[error("Invalid world bounds on axis {axis}: min {min} must be below max {max}")]
    InvalidBounds {
        /// Offending axis (0 = x, 1 = y, 2 = z)
        axis: usize,
        /// Lower bound on that axis
        min: f64,
        /// Upper bound on that axis
        max: f64,
    },

    /// Timestep that is non-positive, NaN or infinite
    #[error("Invalid timestep: {0}. Must be positive and finite.")]
    InvalidTimestep(f64),

    /// Gravity vector with a NaN or infinite component
    #[error("Invalid gravity: {0:?}. Every component must be finite.")]
    InvalidGravity([f64; 3]),

    /// Scene parameters that cannot produce a usable layout
    #[error("Invalid scene: {0}")]
    InvalidScene(String),

    /// Spatial hash sizing that cannot work (zero table, bad cell size)
    #[error("Invalid hash configuration: {0}")]
    InvalidHashConfig(String),

    /// A neighbor query found more candidates than its scratch buffer holds
    #[error("Query capacity exceeded: {required} candidates for a buffer of {capacity}")]
    CapacityExceeded {
        /// Size of the query scratch buffer
        capacity: usize,
        /// Number of candidates the query produced
        required: usize,
    },
}

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, SimError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = SimError::CapacityExceeded { capacity: 4, required: 9 };
        assert_eq!(
            err.to_string(),
            "Query capacity exceeded: 9 candidates for a buffer of 4"
        );

        let err = SimError::MisalignedBuffer { name: "positions", len: 7 };
        assert!(err.to_string().contains("positions"));
        assert!(err.to_string().contains("multiple of 3"));
    }
}
