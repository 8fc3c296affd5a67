//! Small vector and matrix types used across layout and batching.
//!
//! Deliberately minimal: 2D points, RGBA-sized 4-vectors and the one 4x4
//! matrix the projection uniform needs. No general linear algebra.

/// A 2D point or extent.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn add(self, other: Vec2) -> Vec2 {
        Vec2::new(self.x + other.x, self.y + other.y)
    }

    pub fn scale(self, factor: f32) -> Vec2 {
        Vec2::new(self.x * factor, self.y * factor)
    }
}

/// A 4-component vector. Doubles as an atlas rectangle (x, y, w, h) and as a
/// per-side or per-corner group in the vertex stream.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Vec4 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub w: f32,
}

impl Vec4 {
    pub const fn new(x: f32, y: f32, z: f32, w: f32) -> Self {
        Self { x, y, z, w }
    }

    pub const fn splat(v: f32) -> Self {
        Self::new(v, v, v, v)
    }

    pub fn scale(self, factor: f32) -> Vec4 {
        Vec4::new(
            self.x * factor,
            self.y * factor,
            self.z * factor,
            self.w * factor,
        )
    }
}

/// A 4x4 matrix stored in row-major order.
///
/// Only the constructors the projection uniform needs: orthographic,
/// translation, and composition.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Mat4 {
    /// Matrix data in row-major order: [row0, row1, row2, row3]
    pub data: [f32; 16],
}

impl Mat4 {
    pub const IDENTITY: Self = Self {
        data: [
            1.0, 0.0, 0.0, 0.0, // row 0
            0.0, 1.0, 0.0, 0.0, // row 1
            0.0, 0.0, 1.0, 0.0, // row 2
            0.0, 0.0, 0.0, 1.0, // row 3
        ],
    };

    /// Orthographic projection. Maps x in [left, right] and y in
    /// [bottom, top] to [-1, 1], z in [near, far] to [0, 1] (the clip range
    /// the GPU backend expects).
    pub fn orthographic(left: f32, right: f32, bottom: f32, top: f32, near: f32, far: f32) -> Self {
        let rl = right - left;
        let tb = top - bottom;
        let fnr = far - near;
        Self {
            data: [
                2.0 / rl, 0.0, 0.0, -(right + left) / rl, // row 0
                0.0, 2.0 / tb, 0.0, -(top + bottom) / tb, // row 1
                0.0, 0.0, 1.0 / fnr, -near / fnr, // row 2
                0.0, 0.0, 0.0, 1.0, // row 3
            ],
        }
    }

    /// Translation matrix.
    pub fn translate(x: f32, y: f32, z: f32) -> Self {
        Self {
            data: [
                1.0, 0.0, 0.0, x, // row 0
                0.0, 1.0, 0.0, y, // row 1
                0.0, 0.0, 1.0, z, // row 2
                0.0, 0.0, 0.0, 1.0, // row 3
            ],
        }
    }

    /// Compose: self * other. Applies `other` first, then `self`.
    pub fn multiply(&self, other: &Mat4) -> Mat4 {
        let a = &self.data;
        let b = &other.data;

        let mut result = [0.0f32; 16];
        for i in 0..4 {
            for j in 0..4 {
                let mut sum = 0.0;
                for k in 0..4 {
                    sum += a[i * 4 + k] * b[k * 4 + j];
                }
                result[i * 4 + j] = sum;
            }
        }

        Mat4 { data: result }
    }

    /// Column-major copy for GPU upload (WGSL mat4x4 layout).
    pub fn to_column_major(&self) -> [f32; 16] {
        let d = &self.data;
        [
            d[0], d[4], d[8], d[12], // col 0
            d[1], d[5], d[9], d[13], // col 1
            d[2], d[6], d[10], d[14], // col 2
            d[3], d[7], d[11], d[15], // col 3
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transform(m: &Mat4, x: f32, y: f32, z: f32) -> (f32, f32, f32) {
        let d = &m.data;
        (
            d[0] * x + d[1] * y + d[2] * z + d[3],
            d[4] * x + d[5] * y + d[6] * z + d[7],
            d[8] * x + d[9] * y + d[10] * z + d[11],
        )
    }

    #[test]
    fn test_orthographic_maps_viewport_corners() {
        let m = Mat4::orthographic(0.0, 800.0, 600.0, 0.0, 0.0, 1.0);

        let (x, y, z) = transform(&m, 0.0, 0.0, 0.0);
        assert_eq!((x, y, z), (-1.0, 1.0, 0.0));

        let (x, y, _) = transform(&m, 800.0, 600.0, 0.0);
        assert_eq!((x, y), (1.0, -1.0));

        let (x, y, _) = transform(&m, 400.0, 300.0, 0.0);
        assert_eq!((x, y), (0.0, 0.0));
    }

    #[test]
    fn test_multiply_with_identity() {
        let m = Mat4::orthographic(0.0, 100.0, 100.0, 0.0, 0.0, 1.0);
        assert_eq!(m.multiply(&Mat4::IDENTITY), m);
        assert_eq!(Mat4::IDENTITY.multiply(&m), m);
    }

    #[test]
    fn test_ortho_translate_composition_offsets_origin() {
        let ortho = Mat4::orthographic(0.0, 200.0, 200.0, 0.0, 0.0, 1.0);
        let shifted = ortho.multiply(&Mat4::translate(50.0, 50.0, 0.0));

        // A point at the viewport origin lands where (50, 50) would have.
        let (x1, y1, _) = transform(&shifted, 0.0, 0.0, 0.0);
        let (x2, y2, _) = transform(&ortho, 50.0, 50.0, 0.0);
        assert_eq!((x1, y1), (x2, y2));
    }

    #[test]
    fn test_column_major_round_trips_rows() {
        let m = Mat4::translate(3.0, 5.0, 0.0);
        let cols = m.to_column_major();
        assert_eq!(cols[12], 3.0);
        assert_eq!(cols[13], 5.0);
        assert_eq!(cols[0], 1.0);
    }
}
