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
//! Vector arithmetic over flat triple buffers
//!
//! Particle state is stored as contiguous `f64` buffers where triple `i`
//! lives at offsets `3*i .. 3*i + 3`. The free functions in this module
//! operate on a buffer plus a triple index, so hot loops never build
//! per-particle objects. [`TripleBuffer`] wraps such a buffer with a fixed
//! triple count and typed accessors for call sites that want safety over
//! raw offsets.

use crate::error::{Result, SimError};

/// A single 3D vector value
pub type Vec3 = [f64; 3];

/// Scale triple `a` in place: a\[anr\] *= scale
#[inline]
pub fn vec_scale(a: &mut [f64], anr: usize, scale: f64) {
    let o = 3 * anr;
    a[o] *= scale;
    a[o + 1] *= scale;
    a[o + 2] *= scale;
}

/// Copy triple `b[bnr]` into `a[anr]`
#[inline]
pub fn vec_copy(a: &mut [f64], anr: usize, b: &[f64], bnr: usize) {
    let (ao, bo) = (3 * anr, 3 * bnr);
    a[ao..ao + 3].copy_from_slice(&b[bo..bo + 3]);
}

/// Add a scaled triple: a\[anr\] += b\[bnr\] * scale
#[inline]
pub fn vec_add(a: &mut [f64], anr: usize, b: &[f64], bnr: usize, scale: f64) {
    let (ao, bo) = (3 * anr, 3 * bnr);
    a[ao] += b[bo] * scale;
    a[ao + 1] += b[bo + 1] * scale;
    a[ao + 2] += b[bo + 2] * scale;
}

/// Store a scaled difference: dst\[dnr\] = (a\[anr\] - b\[bnr\]) * scale
#[inline]
pub fn vec_set_diff(
    dst: &mut [f64],
    dnr: usize,
    a: &[f64],
    anr: usize,
    b: &[f64],
    bnr: usize,
    scale: f64,
) {
    let (d, ao, bo) = (3 * dnr, 3 * anr, 3 * bnr);
    dst[d] = (a[ao] - b[bo]) * scale;
    dst[d + 1] = (a[ao + 1] - b[bo + 1]) * scale;
    dst[d + 2] = (a[ao + 2] - b[bo + 2]) * scale;
}

/// Squared length of triple `a[anr]`
#[inline]
pub fn vec_length_squared(a: &[f64], anr: usize) -> f64 {
    let o = 3 * anr;
    a[o] * a[o] + a[o + 1] * a[o + 1] + a[o + 2] * a[o + 2]
}

/// Squared distance between `a[anr]` and `b[bnr]`
#[inline]
pub fn vec_dist_squared(a: &[f64], anr: usize, b: &[f64], bnr: usize) -> f64 {
    let (ao, bo) = (3 * anr, 3 * bnr);
    let dx = a[ao] - b[bo];
    let dy = a[ao + 1] - b[bo + 1];
    let dz = a[ao + 2] - b[bo + 2];
    dx * dx + dy * dy + dz * dz
}

/// Dot product of `a[anr]` and `b[bnr]`
#[inline]
pub fn vec_dot(a: &[f64], anr: usize, b: &[f64], bnr: usize) -> f64 {
    let (ao, bo) = (3 * anr, 3 * bnr);
    a[ao] * b[bo] + a[ao + 1] * b[bo + 1] + a[ao + 2] * b[bo + 2]
}

/// Fixed-length buffer of 3D triples backed by one contiguous `Vec<f64>`
///
/// The triple count is fixed at construction; no method grows or shrinks
/// the storage.
///
/// # Examples
///
/// ```
/// use particle_hash::vector::TripleBuffer;
///
/// let mut buf = TripleBuffer::from_flat("positions", vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0]).unwrap();
/// assert_eq!(buf.count(), 2);
/// buf.add_scaled(0, [1.0, 1.0, 1.0], 2.0);
/// assert_eq!(buf.get(0), [2.0, 3.0, 4.0]);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct TripleBuffer {
    data: Vec<f64>,
}

impl TripleBuffer {
    /// Wrap an existing flat buffer
    ///
    /// # Errors
    ///
    /// Returns [`SimError::MisalignedBuffer`] if the length is not a multiple of 3.
    pub fn from_flat(name: &'static str, data: Vec<f64>) -> Result<Self> {
        if data.len() % 3 != 0 {
            return Err(SimError::MisalignedBuffer {
                name,
                len: data.len(),
            });
        }
        Ok(TripleBuffer { data })
    }

    /// Number of triples
    pub fn count(&self) -> usize {
        self.data.len() / 3
    }

    /// Flat read-only view, triple `i` at `3*i`
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    /// Flat mutable view
    pub fn as_mut_slice(&mut self) -> &mut [f64] {
        &mut self.data
    }

    /// Read triple `i`
    #[inline]
    pub fn get(&self, i: usize) -> Vec3 {
        let o = 3 * i;
        [self.data[o], self.data[o + 1], self.data[o + 2]]
    }

    /// Overwrite triple `i`
    #[inline]
    pub fn set(&mut self, i: usize, v: Vec3) {
        let o = 3 * i;
        self.data[o..o + 3].copy_from_slice(&v);
    }

    /// Triple `i` += v * scale
    #[inline]
    pub fn add_scaled(&mut self, i: usize, v: Vec3, scale: f64) {
        vec_add(&mut self.data, i, &v, 0, scale);
    }

    /// Check if every scalar is finite
    pub fn is_valid(&self) -> bool {
        self.data.iter().all(|c| c.is_finite())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vec_add_scaled() {
        let mut a = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        let b = [1.0, 0.0, -1.0];
        vec_add(&mut a, 1, &b, 0, 0.5);
        assert_eq!(a, [1.0, 2.0, 3.0, 4.5, 5.0, 5.5]);
    }

    #[test]
    fn test_vec_copy_and_scale() {
        let mut a = [0.0; 6];
        let b = [7.0, 8.0, 9.0];
        vec_copy(&mut a, 1, &b, 0);
        vec_scale(&mut a, 1, 2.0);
        assert_eq!(a, [0.0, 0.0, 0.0, 14.0, 16.0, 18.0]);
    }

    #[test]
    fn test_diff_length_and_distance() {
        let pos = [0.0, 0.0, 0.0, 3.0, 4.0, 0.0];
        let mut normal = [0.0; 3];
        vec_set_diff(&mut normal, 0, &pos, 1, &pos, 0, 1.0);
        assert_eq!(normal, [3.0, 4.0, 0.0]);
        assert_eq!(vec_length_squared(&normal, 0), 25.0);
        assert_eq!(vec_dist_squared(&pos, 0, &pos, 1), 25.0);
    }

    #[test]
    fn test_vec_dot() {
        let a = [1.0, 2.0, 3.0];
        let b = [0.0, 0.0, 0.0, -1.0, 0.5, 2.0];
        assert_eq!(vec_dot(&a, 0, &b, 1), -1.0 + 1.0 + 6.0);
    }

    #[test]
    fn test_triple_buffer_rejects_misaligned() {
        let err = TripleBuffer::from_flat("velocities", vec![0.0; 4]).unwrap_err();
        assert_eq!(err, SimError::MisalignedBuffer { name: "velocities", len: 4 });
    }

    #[test]
    fn test_triple_buffer_accessors() {
        let mut buf = TripleBuffer::from_flat("positions", vec![0.0; 9]).unwrap();
        assert_eq!(buf.count(), 3);
        buf.set(2, [1.0, 2.0, 2.0]);
        assert_eq!(buf.get(2), [1.0, 2.0, 2.0]);
        buf.add_scaled(2, [1.0, 0.0, -1.0], 0.5);
        assert_eq!(buf.get(2), [1.5, 2.0, 1.5]);
        assert!(buf.is_valid());

        buf.set(1, [f64::NAN, 0.0, 0.0]);
        assert!(!buf.is_valid());
    }
}
