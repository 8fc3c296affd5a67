//! Triangulation collaborator interface.
//!
//! The batcher hands line strips and polygon outlines to an external
//! tessellator and packs whatever triangles come back. Winding of the
//! returned triangles is preserved, so the tessellator controls which faces
//! survive culling.

use crate::math::Vec2;

pub trait Tessellator {
    /// Triangulate a line strip of the given thickness. Returns a flat
    /// triangle-list vertex sequence.
    fn triangulate_line(&self, points: &[Vec2], thickness: f32) -> Vec<Vec2>;

    /// Triangulate a polygon outline. Returns a flat triangle-list vertex
    /// sequence.
    fn triangulate_polygon(&self, points: &[Vec2]) -> Vec<Vec2>;
}
