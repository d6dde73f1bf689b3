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
//! Contact and wall behaviour of the particle pipeline

use particle_hash::scene::{build_grid_scene, SceneConfig};
use particle_hash::{ParticleSystem, WorldBounds};

const EPSILON: f64 = 1e-12;

fn open_space() -> WorldBounds {
    WorldBounds::new([-50.0; 3], [50.0; 3])
}

fn distance(a: [f64; 3], b: [f64; 3]) -> f64 {
    ((a[0] - b[0]).powi(2) + (a[1] - b[1]).powi(2) + (a[2] - b[2]).powi(2)).sqrt()
}

#[test]
fn test_two_particle_scenario() {
    let mut system = ParticleSystem::new(
        0.1,
        vec![0.0, 1.0, 0.0, 0.15, 1.0, 0.0],
        vec![1.0, 0.0, 0.0, -1.0, 0.0, 0.0],
        2,
    )
    .unwrap();

    let stats = system.step(1.0 / 60.0, [0.0, 0.0, 0.0], &open_space()).unwrap();
    assert_eq!(stats.pair_contacts, 1);
    assert_eq!(stats.boundary_contacts, 0);

    let (a, b) = (system.position(0), system.position(1));
    assert!((b[0] - a[0] - 0.2).abs() < EPSILON, "separation should be one diameter");
    assert_eq!(a[1], 1.0);
    assert_eq!(b[1], 1.0);

    let (va, vb) = (system.velocity(0), system.velocity(1));
    assert!((va[0] + 1.0).abs() < EPSILON);
    assert!((vb[0] - 1.0).abs() < EPSILON);
    assert_eq!(&va[1..], &[0.0, 0.0]);
    assert_eq!(&vb[1..], &[0.0, 0.0]);

    // Midpoint stays where the integrated pair put it
    assert!(((a[0] + b[0]) * 0.5 - 0.075).abs() < EPSILON);
}

#[test]
fn test_head_on_exchange_along_each_axis() {
    for axis in 0..3 {
        let mut positions = vec![0.0; 6];
        let mut velocities = vec![0.0; 6];
        positions[3 + axis] = 0.3;
        velocities[axis] = 2.0;
        velocities[3 + axis] = -0.5;

        let mut system = ParticleSystem::new(0.2, positions, velocities, 2).unwrap();
        system.step(0.05, [0.0; 3], &open_space()).unwrap();

        let (va, vb) = (system.velocity(0), system.velocity(1));
        assert!((va[axis] + 0.5).abs() < EPSILON, "axis {}", axis);
        assert!((vb[axis] - 2.0).abs() < EPSILON, "axis {}", axis);
        assert!(distance(system.position(0), system.position(1)) >= 0.4 - EPSILON);
    }
}

#[test]
fn test_oblique_contact_conserves_momentum_and_energy() {
    let mut system = ParticleSystem::new(
        0.1,
        vec![0.0, 0.0, 0.0, 0.12, 0.1, 0.05],
        vec![0.7, 0.2, -0.1, -0.3, 0.0, 0.4],
        2,
    )
    .unwrap();
    let p0 = system.momentum();
    let e0 = system.kinetic_energy();

    let stats = system.step(1e-3, [0.0; 3], &open_space()).unwrap();
    assert_eq!(stats.pair_contacts, 1);

    let p1 = system.momentum();
    for k in 0..3 {
        assert!((p0[k] - p1[k]).abs() < EPSILON);
    }
    assert!((system.kinetic_energy() - e0).abs() < EPSILON);
    assert!(distance(system.position(0), system.position(1)) >= 0.2 - EPSILON);
}

#[test]
fn test_coincident_particles_left_alone() {
    let mut system = ParticleSystem::new(
        0.1,
        vec![0.3, 0.4, 0.5, 0.3, 0.4, 0.5],
        vec![0.0; 6],
        2,
    )
    .unwrap();
    let stats = system.step(0.01, [0.0; 3], &open_space()).unwrap();

    assert_eq!(stats.pair_contacts, 0);
    assert_eq!(system.position(0), [0.3, 0.4, 0.5]);
    assert_eq!(system.position(1), [0.3, 0.4, 0.5]);
    assert_eq!(system.velocity(0), [0.0; 3]);
    assert_eq!(system.velocity(1), [0.0; 3]);
}

#[test]
fn test_coincident_particles_still_feel_gravity_and_walls() {
    let bounds = WorldBounds::new([0.0; 3], [1.0; 3]);
    let mut system = ParticleSystem::new(
        0.1,
        vec![0.5, 0.1, 0.5, 0.5, 0.1, 0.5],
        vec![0.0; 6],
        2,
    )
    .unwrap();
    let stats = system.step(0.1, [0.0, -1.0, 0.0], &bounds).unwrap();

    assert_eq!(stats.boundary_contacts, 2);
    assert_eq!(stats.pair_contacts, 0);
    for i in 0..2 {
        assert_eq!(system.position(i)[1], 0.1);
        assert!((system.velocity(i)[1] - 0.1).abs() < EPSILON);
    }
}

#[test]
fn test_contacts_resolve_in_index_order() {
    // Newton's cradle: with immediate updates the impulse travels through
    // the whole chain in a single step.
    let mut system = ParticleSystem::new(
        0.1,
        vec![0.0, 0.0, 0.0, 0.19, 0.0, 0.0, 0.38, 0.0, 0.0],
        vec![1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
        3,
    )
    .unwrap();
    let stats = system.step(1e-9, [0.0; 3], &open_space()).unwrap();

    assert_eq!(stats.pair_contacts, 2);
    assert!(system.velocity(0)[0].abs() < 1e-9);
    assert!(system.velocity(1)[0].abs() < 1e-9);
    assert!((system.velocity(2)[0] - 1.0).abs() < 1e-9);
}

#[test]
fn test_boundary_containment_under_gravity() {
    // Particles in separate lanes never touch each other, only the walls
    let bounds = WorldBounds::new([0.0; 3], [1.0, 2.0, 1.0]);
    let radius = 0.05;
    let mut positions = Vec::new();
    let mut velocities = Vec::new();
    for lane in 0..3 {
        positions.extend_from_slice(&[0.2 + 0.3 * lane as f64, 1.0 + 0.2 * lane as f64, 0.5]);
        velocities.extend_from_slice(&[0.0, 3.0 - 2.0 * lane as f64, 0.0]);
    }
    let mut system = ParticleSystem::new(radius, positions, velocities, 3).unwrap();

    for _ in 0..600 {
        system.step(1.0 / 60.0, [0.0, -9.81, 0.0], &bounds).unwrap();
        for i in 0..system.len() {
            assert!(bounds.contains(system.position(i), radius));
        }
    }
}

#[test]
fn test_contact_after_wall_phase_can_push_past_margin() {
    // Walls resolve before contacts, so a neighbor can shove a particle
    // that sits exactly on the margin beyond it until the next step.
    let bounds = WorldBounds::new([0.0; 3], [1.0; 3]);
    let mut system = ParticleSystem::new(
        0.1,
        vec![0.9, 0.5, 0.5, 0.75, 0.5, 0.5],
        vec![0.0; 6],
        2,
    )
    .unwrap();
    let stats = system.step(1e-9, [0.0; 3], &bounds).unwrap();

    assert_eq!(stats.boundary_contacts, 0);
    assert_eq!(stats.pair_contacts, 1);
    assert!((system.position(0)[0] - 0.925).abs() < EPSILON);
    assert!((system.position(1)[0] - 0.725).abs() < EPSILON);
    assert!(!bounds.contains(system.position(0), 0.1));

    // The next wall phase pulls it back onto the margin
    let stats = system.step(1e-9, [0.0; 3], &bounds).unwrap();
    assert!(stats.boundary_contacts >= 1);
    assert!(system.collision_flags()[0]);
}

#[test]
fn test_lattice_gas_conserves_energy_without_gravity() {
    let scene = SceneConfig::default().with_radius(0.05).with_velocity_jitter(1.0);
    let bounds = WorldBounds::new([0.0; 3], [1.5; 3]);
    let mut system = build_grid_scene(&scene, &bounds).unwrap();
    assert!(system.len() > 100);

    let e0 = system.kinetic_energy();
    let mut contacts = 0;
    for _ in 0..200 {
        contacts += system.step(1.0 / 60.0, [0.0; 3], &bounds).unwrap().pair_contacts;
    }
    assert!(contacts > 0, "the gas should collide at least once");
    assert!(system.is_finite());
    assert!((system.kinetic_energy() - e0).abs() < 1e-9 * e0.max(1.0));
}

#[test]
fn test_prev_positions_track_last_integration() {
    let mut system = ParticleSystem::new(0.1, vec![0.0, 1.0, 0.0], vec![0.0, 0.0, 2.0], 1).unwrap();
    system.step(0.1, [0.0; 3], &open_space()).unwrap();
    let before = system.position(0);
    system.step(0.1, [0.0; 3], &open_space()).unwrap();
    assert_eq!(system.prev_positions(), &before[..]);
}
