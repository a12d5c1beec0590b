//! Epsilon-scaled comparison of floats and positions.

use std::cmp::Ordering;

use glam::Vec3;

/// An absolute comparison threshold expressed as a multiple of `f32::EPSILON`.
///
/// `lhs` is less than `rhs` only when `rhs - lhs` exceeds the threshold, so
/// values closer than the threshold compare equal. The relation is not
/// transitive; it is only meant for values that are either nearly identical or
/// clearly apart, as vertex positions on a welded mesh are.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Tolerance {
    threshold: f32,
}

impl Tolerance {
    /// Three epsilons, for plain scalar comparisons.
    pub const SCALAR: Self = Self::epsilons(3);

    /// Five epsilons, for unit-sphere positions. Base icosahedron vertices
    /// computed from different wedges differ by up to about 3.6 epsilons.
    pub const POSITION: Self = Self::epsilons(5);

    /// Threshold of `n` machine epsilons.
    pub const fn epsilons(n: u32) -> Self {
        Self {
            threshold: f32::EPSILON * n as f32,
        }
    }

    pub fn threshold(self) -> f32 {
        self.threshold
    }

    /// `lhs < rhs` by more than the threshold.
    pub fn less(self, lhs: f32, rhs: f32) -> bool {
        self.threshold < rhs - lhs
    }

    /// Neither value is less than the other.
    pub fn equal(self, lhs: f32, rhs: f32) -> bool {
        !self.less(lhs, rhs) && !self.less(rhs, lhs)
    }

    pub fn compare(self, lhs: f32, rhs: f32) -> Ordering {
        if self.less(lhs, rhs) {
            Ordering::Less
        } else if self.less(rhs, lhs) {
            Ordering::Greater
        } else {
            Ordering::Equal
        }
    }

    /// Lexicographic comparison on x, then y, then z. The first component that
    /// differs by more than the threshold decides.
    pub fn compare_vec3(self, lhs: Vec3, rhs: Vec3) -> Ordering {
        self.compare(lhs.x, rhs.x)
            .then_with(|| self.compare(lhs.y, rhs.y))
            .then_with(|| self.compare(lhs.z, rhs.z))
    }

    pub fn less_vec3(self, lhs: Vec3, rhs: Vec3) -> bool {
        self.compare_vec3(lhs, rhs) == Ordering::Less
    }

    pub fn equal_vec3(self, lhs: Vec3, rhs: Vec3) -> bool {
        self.compare_vec3(lhs, rhs) == Ordering::Equal
    }
}
