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
//! Many-Particle Hashing Demo
//!
//! Runs the default lattice scene headless: thousands of small balls in a
//! 2 x 2 x 2 box, colliding through the spatial hash. Prints the particle
//! count, the rolling average step time and contact statistics.
//!
//! # Running
//!
//! ```bash
//! cargo run --example hashing --release
//!
//! # Larger balls, gravity on, 600 frames
//! cargo run --example hashing --release -- --radius 0.05 --gravity -9.81 --frames 600
//!
//! # Show per-step trace output
//! RUST_LOG=particle_hash=trace cargo run --example hashing --release
//! ```

use particle_hash::scene::{build_grid_scene, SceneConfig};
use particle_hash::{SimulationClock, SimulationConfig, StepStats};

/// Command line options
struct DemoOptions {
    radius: f64,
    gravity: f64,
    frames: usize,
    seed: u64,
    report_interval: usize,
}

impl Default for DemoOptions {
    fn default() -> Self {
        DemoOptions {
            radius: 0.025,
            gravity: 0.0,
            frames: 300,
            seed: 12345,
            report_interval: 60,
        }
    }
}

fn parse_args() -> Result<DemoOptions, String> {
    let mut options = DemoOptions::default();
    let args: Vec<String> = std::env::args().skip(1).collect();
    let mut i = 0;

    while i < args.len() {
        let value = args
            .get(i + 1)
            .ok_or_else(|| format!("Missing value for {}", args[i]))?;
        match args[i].as_str() {
            "--radius" => options.radius = value.parse().map_err(|e| format!("--radius: {}", e))?,
            "--gravity" => options.gravity = value.parse().map_err(|e| format!("--gravity: {}", e))?,
            "--frames" => options.frames = value.parse().map_err(|e| format!("--frames: {}", e))?,
            "--seed" => options.seed = value.parse().map_err(|e| format!("--seed: {}", e))?,
            other => return Err(format!("Unknown option: {}", other)),
        }
        i += 2;
    }

    Ok(options)
}

fn main() {
    env_logger::init();

    let options = match parse_args() {
        Ok(options) => options,
        Err(message) => {
            eprintln!("{}", message);
            eprintln!("Usage: hashing [--radius R] [--gravity G] [--frames N] [--seed S]");
            std::process::exit(2);
        }
    };

    let config = SimulationConfig::default().with_gravity([0.0, options.gravity, 0.0]);
    let scene = SceneConfig::default()
        .with_radius(options.radius)
        .with_seed(options.seed);

    let system = match build_grid_scene(&scene, &config.bounds) {
        Ok(system) => system,
        Err(err) => {
            eprintln!("Failed to build scene: {}", err);
            std::process::exit(1);
        }
    };

    let mut clock = match SimulationClock::new(system, config) {
        Ok(clock) => clock,
        Err(err) => {
            eprintln!("Invalid configuration: {}", err);
            std::process::exit(1);
        }
    };

    println!("=== Many-Particle Hashing Demo ===");
    println!("Particles: {}", clock.particle_count());
    println!("Radius:    {} m", options.radius);
    println!("Gravity:   {} m/s²", options.gravity);
    println!("Timestep:  {:.4} s", clock.timestep());

    clock.set_paused(false);
    let mut totals = StepStats::default();
    let initial_energy = clock.system().kinetic_energy();

    for frame in 1..=options.frames {
        match clock.tick() {
            Ok(Some(stats)) => {
                totals.boundary_contacts += stats.boundary_contacts;
                totals.pair_contacts += stats.pair_contacts;
                totals.candidates += stats.candidates;
            }
            Ok(None) => {}
            Err(err) => {
                eprintln!("Step {} failed: {}", frame, err);
                std::process::exit(1);
            }
        }

        if !clock.system().is_finite() {
            log::warn!("Non-finite particle state after step {}", frame);
        }

        if frame % options.report_interval == 0 {
            let collided = clock
                .system()
                .collision_flags()
                .iter()
                .filter(|&&hit| hit)
                .count();
            let ms = clock
                .average_step_duration()
                .map(|d| format!("{:.3}", d.as_secs_f64() * 1000.0))
                .unwrap_or_else(|| "-".to_string());
            println!(
                "t = {:6.2} s | step {:>8} ms | colliding {:>6} | KE {:.4}",
                clock.simulated_time(),
                ms,
                collided,
                clock.system().kinetic_energy()
            );
        }
    }

    let frames = options.frames.max(1) as f64;
    let hash_stats = clock.system().hash().stats();
    println!("\n=== Summary ===");
    println!("Pair contacts per frame:  {:.1}", totals.pair_contacts as f64 / frames);
    println!("Wall contacts per frame:  {:.1}", totals.boundary_contacts as f64 / frames);
    println!("Candidates per query:     {:.2}", hash_stats.mean_candidates());
    println!("Peak candidates:          {}", hash_stats.peak_candidates);
    println!(
        "Kinetic energy:           {:.6} -> {:.6}",
        initial_energy,
        clock.system().kinetic_energy()
    );
}
