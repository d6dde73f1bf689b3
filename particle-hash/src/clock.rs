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
//! Fixed-timestep driver
//!
//! [`SimulationClock`] is the only place that knows about time. Each
//! [`tick`](SimulationClock::tick) advances its particle system by exactly
//! one fixed step unless the clock is paused. There is no sub-stepping and
//! no catch-up: a frame-driven caller ticks once per frame.

use std::time::{Duration, Instant};

use crate::config::SimulationConfig;
use crate::error::Result;
use crate::particles::{ParticleSystem, StepStats};

/// Default number of frames averaged by [`StepTimer`]
pub const DEFAULT_TIMING_WINDOW: usize = 10;

/// Rolling average of step wall-time
///
/// Durations accumulate until the window is full; the mean is then
/// published and accumulation starts over, so the displayed value updates
/// once per window rather than every frame.
#[derive(Debug, Clone)]
pub struct StepTimer {
    window: usize,
    frames: usize,
    sum: Duration,
    average: Option<Duration>,
}

impl StepTimer {
    /// Create a timer averaging over `window` frames
    ///
    /// # Panics
    ///
    /// Panics if window is zero
    pub fn new(window: usize) -> Self {
        assert!(window > 0, "Timing window must be at least one frame");
        StepTimer {
            window,
            frames: 0,
            sum: Duration::ZERO,
            average: None,
        }
    }

    /// Record the duration of one step
    pub fn record(&mut self, elapsed: Duration) {
        self.sum += elapsed;
        self.frames += 1;
        if self.frames >= self.window {
            self.average = Some(self.sum / self.frames as u32);
            self.frames = 0;
            self.sum = Duration::ZERO;
        }
    }

    /// Most recently published average, if a window has completed
    pub fn average(&self) -> Option<Duration> {
        self.average
    }

    /// Published average in milliseconds
    pub fn average_ms(&self) -> Option<f64> {
        self.average.map(|d| d.as_secs_f64() * 1000.0)
    }
}

impl Default for StepTimer {
    fn default() -> Self {
        StepTimer::new(DEFAULT_TIMING_WINDOW)
    }
}

/// Drives a [`ParticleSystem`] at a fixed timestep
///
/// The clock starts paused.
///
/// # Examples
///
/// ```
/// use particle_hash::clock::SimulationClock;
/// use particle_hash::config::SimulationConfig;
/// use particle_hash::particles::ParticleSystem;
///
/// let system = ParticleSystem::new(0.05, vec![0.0, 1.0, 0.0], vec![0.0; 3], 1).unwrap();
/// let config = SimulationConfig::new(1.0 / 60.0).with_gravity([0.0, -9.81, 0.0]);
/// let mut clock = SimulationClock::new(system, config).unwrap();
///
/// assert!(clock.tick().unwrap().is_none()); // paused
/// clock.set_paused(false);
/// assert!(clock.tick().unwrap().is_some());
/// assert_eq!(clock.steps(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct SimulationClock {
    system: ParticleSystem,
    config: SimulationConfig,
    paused: bool,
    steps: u64,
    timer: StepTimer,
}

impl SimulationClock {
    /// Create a paused clock for `system`
    ///
    /// # Errors
    ///
    /// Fails if the configuration does not validate.
    pub fn new(system: ParticleSystem, config: SimulationConfig) -> Result<Self> {
        config.validate()?;
        if let Err(warning) = config.validate_timestep() {
            log::warn!("{}", warning);
        }
        Ok(SimulationClock {
            system,
            config,
            paused: true,
            steps: 0,
            timer: StepTimer::default(),
        })
    }

    /// Replace the step timer, e.g. to change the averaging window
    pub fn with_timer(mut self, timer: StepTimer) -> Self {
        self.timer = timer;
        self
    }

    /// Advance one fixed step unless paused
    ///
    /// Returns the step's statistics, or `None` when paused.
    pub fn tick(&mut self) -> Result<Option<StepStats>> {
        if self.paused {
            return Ok(None);
        }

        let start = Instant::now();
        let stats = self.system.step(
            self.config.timestep,
            self.config.gravity,
            &self.config.bounds,
        )?;
        self.timer.record(start.elapsed());
        self.steps += 1;

        Ok(Some(stats))
    }

    /// Pause or resume
    pub fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
    }

    /// Check whether ticks are currently ignored
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Fixed timestep in seconds
    pub fn timestep(&self) -> f64 {
        self.config.timestep
    }

    /// Set the fixed timestep
    ///
    /// # Panics
    ///
    /// Panics if timestep is non-positive, NaN, or infinite
    pub fn set_timestep(&mut self, dt: f64) {
        assert!(
            dt > 0.0 && dt.is_finite(),
            "Timestep must be positive and finite"
        );
        self.config.timestep = dt;
    }

    /// Current configuration
    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Read-only access to the driven system
    pub fn system(&self) -> &ParticleSystem {
        &self.system
    }

    /// Mutable access to the driven system between ticks
    pub fn system_mut(&mut self) -> &mut ParticleSystem {
        &mut self.system
    }

    /// Number of particles, for display
    pub fn particle_count(&self) -> usize {
        self.system.len()
    }

    /// Steps taken since creation
    pub fn steps(&self) -> u64 {
        self.steps
    }

    /// Simulated time elapsed
    pub fn simulated_time(&self) -> f64 {
        self.steps as f64 * self.config.timestep
    }

    /// Rolling average of step duration, once a window has completed
    pub fn average_step_duration(&self) -> Option<Duration> {
        self.timer.average()
    }

    /// Consume the clock and return its system
    pub fn into_system(self) -> ParticleSystem {
        self.system
    }
}
