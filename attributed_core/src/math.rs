//! Vector and matrix value types stored in datums.

use serde::{Deserialize, Serialize};

/// Four-component float vector.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec4 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub w: f32,
}

impl Vec4 {
    /// Zero vector
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0, 0.0);

    /// Creates a new Vec4
    #[must_use]
    pub const fn new(x: f32, y: f32, z: f32, w: f32) -> Self {
        Self { x, y, z, w }
    }

    /// Converts to array
    #[must_use]
    pub const fn to_array(self) -> [f32; 4] {
        [self.x, self.y, self.z, self.w]
    }

    /// Creates from array
    #[must_use]
    pub const fn from_array(arr: [f32; 4]) -> Self {
        Self::new(arr[0], arr[1], arr[2], arr[3])
    }
}

impl std::ops::Add for Vec4 {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self::new(
            self.x + rhs.x,
            self.y + rhs.y,
            self.z + rhs.z,
            self.w + rhs.w,
        )
    }
}

impl std::ops::Mul<f32> for Vec4 {
    type Output = Self;
    fn mul(self, rhs: f32) -> Self {
        Self::new(self.x * rhs, self.y * rhs, self.z * rhs, self.w * rhs)
    }
}

/// 4x4 float matrix stored as four row vectors.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Mat4 {
    pub rows: [Vec4; 4],
}

impl Default for Mat4 {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Mat4 {
    /// All-zero matrix
    pub const ZERO: Self = Self::from_rows([Vec4::ZERO; 4]);

    /// Identity matrix
    pub const IDENTITY: Self = Self::from_rows([
        Vec4::new(1.0, 0.0, 0.0, 0.0),
        Vec4::new(0.0, 1.0, 0.0, 0.0),
        Vec4::new(0.0, 0.0, 1.0, 0.0),
        Vec4::new(0.0, 0.0, 0.0, 1.0),
    ]);

    /// Creates a matrix from its rows
    #[must_use]
    pub const fn from_rows(rows: [Vec4; 4]) -> Self {
        Self { rows }
    }

    /// Translation matrix (translation in the last row).
    #[must_use]
    pub fn from_translation(x: f32, y: f32, z: f32) -> Self {
        let mut m = Self::IDENTITY;
        m.rows[3] = Vec4::new(x, y, z, 1.0);
        m
    }

    /// Row-vector times matrix.
    #[must_use]
    pub fn transform(&self, v: Vec4) -> Vec4 {
        self.rows[0] * v.x + self.rows[1] * v.y + self.rows[2] * v.z + self.rows[3] * v.w
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vec4_array_conversion() {
        let v = Vec4::from_array([1.0, 2.0, 3.0, 4.0]);
        assert_eq!(v.to_array(), [1.0, 2.0, 3.0, 4.0]);
        assert_eq!(v + Vec4::ZERO, v);
    }

    #[test]
    fn test_translation() {
        let m = Mat4::from_translation(5.0, -1.0, 2.0);
        let p = m.transform(Vec4::new(1.0, 1.0, 1.0, 1.0));
        assert_eq!(p, Vec4::new(6.0, 0.0, 3.0, 1.0));
    }

    #[test]
    fn test_default_is_identity() {
        assert_eq!(Mat4::default(), Mat4::IDENTITY);
        assert_ne!(Mat4::ZERO, Mat4::IDENTITY);
    }
}
