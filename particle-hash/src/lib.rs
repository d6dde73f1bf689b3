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
//! # Particle Hash
//!
//! Broad-phase spatial hashing and an elastic collision solver for
//! thousands of equal-radius particles moving inside a box.
//!
//! ## Features
//!
//! - **Spatial Hash**: Counting-sort hash grid rebuilt every frame with no allocation
//! - **Flat Storage**: Particle state kept in contiguous triple buffers
//! - **Elastic Contacts**: Symmetric separation and normal velocity exchange
//! - **Fixed Timestep**: A clock that steps once per tick, with pause and timing
//!
//! ## Example
//!
//! ```rust
//! use particle_hash::{SimulationClock, SimulationConfig};
//! use particle_hash::scene::{build_grid_scene, SceneConfig};
//!
//! let config = SimulationConfig::default().with_gravity([0.0, -9.81, 0.0]);
//! let scene = SceneConfig::default().with_radius(0.1);
//! let system = build_grid_scene(&scene, &config.bounds).unwrap();
//!
//! let mut clock = SimulationClock::new(system, config).unwrap();
//! clock.set_paused(false);
//! for _ in 0..10 {
//!     clock.tick().unwrap();
//! }
//! let positions = clock.system().positions();
//! assert_eq!(positions.len(), 3 * clock.particle_count());
//! ```

#![warn(missing_docs)]

/// Error types
pub mod error;

/// Configuration values
pub mod config;

/// Arithmetic over flat triple buffers
pub mod vector;

/// Uniform-grid spatial hash
pub mod hash;

/// Particle buffers and the per-frame collision pipeline
pub mod particles;

/// Fixed-timestep driver
pub mod clock;

/// Initial particle layouts
pub mod scene;

pub use clock::SimulationClock;
pub use config::{HashConfig, SimulationConfig, WorldBounds};
pub use error::{Result, SimError};
pub use hash::SpatialHash;
pub use particles::{ParticleSystem, StepStats};
