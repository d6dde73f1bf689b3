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
//! Uniform-grid spatial hash for broad-phase neighbor queries
//!
//! Space is cut into cubic cells of edge `cell_size`. Each cell's integer
//! coordinates are hashed into a fixed table of `table_size` buckets, and
//! the table is rebuilt from scratch every frame with a two-pass counting
//! sort:
//!
//! ```text
//! cell_start: | 0 | 0 | 2 | 2 | 3 | ... | n |   (table_size + 1, last = guard)
//! entries:    | 4 | 1 | 0 | ...               (particle ids grouped by bucket)
//! bucket h holds entries[cell_start[h] .. cell_start[h + 1]]
//! ```
//!
//! Different cells may share a bucket. That costs extra candidates in a
//! query but never loses one, so callers always filter by true distance.
//!
//! All storage is sized at construction; `build` and `query` never allocate.

use crate::config::HashConfig;
use crate::error::{Result, SimError};
use crate::vector::Vec3;

/// Odd multipliers mixed into the bucket index, one per axis
const HASH_PRIMES: [i32; 3] = [92837111, 689287499, 283923481];

/// Counters describing query load, for sizing the scratch buffer
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryStats {
    /// Number of queries since the last reset
    pub queries: usize,
    /// Total candidates returned
    pub candidates: usize,
    /// Largest candidate count of a single query
    pub peak_candidates: usize,
    /// Queries rejected for exceeding the scratch capacity
    pub overflows: usize,
}

impl QueryStats {
    /// Average candidates per query
    pub fn mean_candidates(&self) -> f64 {
        if self.queries == 0 {
            0.0
        } else {
            self.candidates as f64 / self.queries as f64
        }
    }
}

/// Spatial hash over a flat position buffer
///
/// # Examples
///
/// ```
/// use particle_hash::hash::SpatialHash;
///
/// let positions = [0.0, 0.0, 0.0, 0.15, 0.0, 0.0, 5.0, 5.0, 5.0];
/// let mut hash = SpatialHash::new(0.2, 3);
/// hash.build(&positions, 3);
///
/// let found = hash.query(&positions, 0, 0.2).unwrap();
/// assert!(found.contains(&1));
/// ```
#[derive(Debug, Clone)]
pub struct SpatialHash {
    cell_size: f64,
    table_size: usize,
    cell_start: Vec<usize>,
    entries: Vec<usize>,
    num_objects: usize,
    query_ids: Vec<usize>,
    query_size: usize,
    // Marks which buckets the current query already visited, so a bucket
    // reached from two cells is reported once.
    bucket_marks: Vec<u32>,
    query_epoch: u32,
    stats: QueryStats,
}

impl SpatialHash {
    /// Create a hash with cells of edge `cell_size` for up to `max_objects` objects
    ///
    /// Uses two buckets per object and a query buffer of `max_objects`.
    ///
    /// # Panics
    ///
    /// Panics if cell_size is non-positive, NaN, or infinite
    pub fn new(cell_size: f64, max_objects: usize) -> Self {
        assert!(
            cell_size > 0.0 && cell_size.is_finite(),
            "Cell size must be positive and finite"
        );
        let config = HashConfig {
            cell_size,
            table_size: 2 * max_objects.max(1),
            max_objects,
            query_capacity: max_objects,
        };
        Self::allocate(config)
    }

    /// Create a hash from an explicit configuration
    pub fn with_config(config: HashConfig) -> Result<Self> {
        config.validate()?;
        log::debug!(
            "SpatialHash: cell size {:.4}, {} buckets, {} objects, query capacity {}",
            config.cell_size,
            config.table_size,
            config.max_objects,
            config.query_capacity
        );
        Ok(Self::allocate(config))
    }

    fn allocate(config: HashConfig) -> Self {
        SpatialHash {
            cell_size: config.cell_size,
            table_size: config.table_size,
            cell_start: vec![0; config.table_size + 1],
            entries: vec![0; config.max_objects],
            num_objects: 0,
            query_ids: vec![0; config.query_capacity],
            query_size: 0,
            bucket_marks: vec![0; config.table_size],
            query_epoch: 0,
            stats: QueryStats::default(),
        }
    }

    /// Edge length of a cell
    pub fn cell_size(&self) -> f64 {
        self.cell_size
    }

    /// Number of buckets
    pub fn table_size(&self) -> usize {
        self.table_size
    }

    /// Capacity of the query scratch buffer
    pub fn query_capacity(&self) -> usize {
        self.query_ids.len()
    }

    /// Number of objects indexed by the last `build`
    pub fn num_objects(&self) -> usize {
        self.num_objects
    }

    /// Map integer cell coordinates to a bucket
    #[inline]
    pub fn hash_coords(&self, xi: i32, yi: i32, zi: i32) -> usize {
        let h = xi.wrapping_mul(HASH_PRIMES[0])
            ^ yi.wrapping_mul(HASH_PRIMES[1])
            ^ zi.wrapping_mul(HASH_PRIMES[2]);
        h.unsigned_abs() as usize % self.table_size
    }

    /// Cell coordinate of a scalar position along one axis
    #[inline]
    pub fn int_coord(&self, coord: f64) -> i32 {
        (coord / self.cell_size).floor() as i32
    }

    /// Bucket of an arbitrary point
    #[inline]
    pub fn hash_point(&self, p: Vec3) -> usize {
        self.hash_coords(self.int_coord(p[0]), self.int_coord(p[1]), self.int_coord(p[2]))
    }

    /// Bucket of triple `nr` in a flat position buffer
    #[inline]
    pub fn hash_position(&self, positions: &[f64], nr: usize) -> usize {
        let o = 3 * nr;
        self.hash_point([positions[o], positions[o + 1], positions[o + 2]])
    }

    /// Rebuild the table from the first `count` triples of `positions`
    ///
    /// Objects beyond the capacity given at construction are not indexed;
    /// [`ParticleSystem`](crate::particles::ParticleSystem) never passes more.
    pub fn build(&mut self, positions: &[f64], count: usize) {
        let num_objects = count.min(self.entries.len()).min(positions.len() / 3);
        if num_objects < count {
            log::warn!(
                "SpatialHash: indexing {} of {} objects (capacity {})",
                num_objects,
                count,
                self.entries.len()
            );
        }
        self.num_objects = num_objects;

        // Count objects per bucket
        self.cell_start.fill(0);
        for i in 0..num_objects {
            let h = self.hash_position(positions, i);
            self.cell_start[h] += 1;
        }

        // Running totals, then the guard
        let mut start = 0;
        for h in 0..self.table_size {
            start += self.cell_start[h];
            self.cell_start[h] = start;
        }
        self.cell_start[self.table_size] = start;

        // Walk each bucket's end back to its start while scattering ids
        for i in 0..num_objects {
            let h = self.hash_position(positions, i);
            self.cell_start[h] -= 1;
            self.entries[self.cell_start[h]] = i;
        }
    }

    /// Collect every object whose cell lies within `max_dist` of object `nr`
    ///
    /// Scans every cell overlapping the box `[p - max_dist, p + max_dist]`.
    /// The result never misses an object within `max_dist`, but may include
    /// farther ones and `nr` itself.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::CapacityExceeded`] if the candidates do not fit in
    /// the scratch buffer. Nothing is truncated silently.
    pub fn query(&mut self, positions: &[f64], nr: usize, max_dist: f64) -> Result<&[usize]> {
        let o = 3 * nr;
        self.query_point([positions[o], positions[o + 1], positions[o + 2]], max_dist)
    }

    /// Collect every object whose cell lies within `max_dist` of `point`
    ///
    /// Same contract as [`SpatialHash::query`].
    pub fn query_point(&mut self, point: Vec3, max_dist: f64) -> Result<&[usize]> {
        let x0 = self.int_coord(point[0] - max_dist);
        let y0 = self.int_coord(point[1] - max_dist);
        let z0 = self.int_coord(point[2] - max_dist);

        let x1 = self.int_coord(point[0] + max_dist);
        let y1 = self.int_coord(point[1] + max_dist);
        let z1 = self.int_coord(point[2] + max_dist);

        self.next_epoch();
        self.query_size = 0;
        let capacity = self.query_ids.len();
        let mut required = 0;

        for xi in x0..=x1 {
            for yi in y0..=y1 {
                for zi in z0..=z1 {
                    let h = self.hash_coords(xi, yi, zi);
                    if self.bucket_marks[h] == self.query_epoch {
                        continue;
                    }
                    self.bucket_marks[h] = self.query_epoch;

                    let (start, end) = (self.cell_start[h], self.cell_start[h + 1]);
                    required += end - start;
                    if required <= capacity {
                        let dst = self.query_size;
                        self.query_ids[dst..dst + end - start]
                            .copy_from_slice(&self.entries[start..end]);
                        self.query_size = required;
                    }
                }
            }
        }

        self.stats.queries += 1;
        if required > capacity {
            self.stats.overflows += 1;
            self.query_size = 0;
            log::warn!(
                "SpatialHash: query produced {} candidates, capacity is {}",
                required,
                capacity
            );
            return Err(SimError::CapacityExceeded { capacity, required });
        }
        self.stats.candidates += required;
        self.stats.peak_candidates = self.stats.peak_candidates.max(required);

        Ok(&self.query_ids[..self.query_size])
    }

    /// Result of the most recent successful query
    pub fn last_query(&self) -> &[usize] {
        &self.query_ids[..self.query_size]
    }

    /// Objects in bucket `h` after the last `build`
    pub fn bucket(&self, h: usize) -> &[usize] {
        &self.entries[self.cell_start[h]..self.cell_start[h + 1]]
    }

    /// Bucket start offsets including the trailing guard
    pub fn cell_start(&self) -> &[usize] {
        &self.cell_start
    }

    /// Object ids grouped by bucket
    pub fn entries(&self) -> &[usize] {
        &self.entries[..self.num_objects]
    }

    /// Query counters accumulated since the last reset
    pub fn stats(&self) -> &QueryStats {
        &self.stats
    }

    /// Clear the query counters
    pub fn reset_stats(&mut self) {
        self.stats = QueryStats::default();
    }

    fn next_epoch(&mut self) {
        self.query_epoch = self.query_epoch.wrapping_add(1);
        if self.query_epoch == 0 {
            self.bucket_marks.fill(0);
            self.query_epoch = 1;
        }
    }
}
