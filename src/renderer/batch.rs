//! Vertex batching: one growing buffer, one draw call.
//!
//! The [`VertexBatcher`] packs every primitive of a frame into a single
//! flat float buffer in the interleaved layout of
//! [`Vertex`](super::primitives::Vertex), then hands the whole thing to a
//! [`Rasterizer`] in one [`flush`](VertexBatcher::flush). Positions stay in
//! logical pixels (the projection uniform maps them); the physical-pixel
//! channels the fragment shader compares against the framebuffer — corner,
//! rectangle size, radius, border width — are scaled by the configured
//! scale factor at append time.

use crate::color::Color;
use crate::error::{Error, Result};
use crate::math::{Vec2, Vec4};
use crate::style::{Corners, Edges};
use crate::tessellate::Tessellator;

use super::draw_list::DrawPrimitive;
use super::primitives::{FLOATS_PER_VERTEX, NO_DATA_VEC2, NO_DATA_VEC4, Vertex};

/// Consumer of one batched vertex buffer per frame.
pub trait Rasterizer {
    /// Draw the interleaved triangle list. Called at most once per flush.
    fn draw(&mut self, vertices: &[Vertex]) -> Result<()>;
}

pub struct VertexBatcher {
    attributes: Vec<f32>,
    /// Logical viewport height, needed to flip rectangle corners into the
    /// y-up framebuffer space the fragment shader samples in.
    viewport_height: f32,
    scale_factor: f32,
}

impl VertexBatcher {
    pub fn new(viewport_height: f32, scale_factor: f32) -> Self {
        Self {
            attributes: Vec::new(),
            viewport_height,
            scale_factor,
        }
    }

    pub fn set_viewport_height(&mut self, height: f32) {
        self.viewport_height = height;
    }

    pub fn set_scale_factor(&mut self, scale_factor: f32) {
        self.scale_factor = scale_factor;
    }

    pub fn vertex_count(&self) -> usize {
        self.attributes.len() / FLOATS_PER_VERTEX
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    /// Packs a draw-list primitive.
    pub fn append(
        &mut self,
        primitive: &DrawPrimitive,
        tessellator: &dyn Tessellator,
    ) -> Result<()> {
        match primitive {
            DrawPrimitive::Rectangle {
                position,
                size,
                fill,
                radius,
                border_width,
                border_color,
            } => {
                self.rectangle(
                    *position,
                    *size,
                    *fill,
                    Some(*radius),
                    Some(*border_width),
                    *border_color,
                );
                Ok(())
            }
            DrawPrimitive::GlyphQuad {
                position,
                size,
                uv,
                color,
            } => {
                self.glyph(*position, *size, *uv, *color);
                Ok(())
            }
            DrawPrimitive::Line {
                points,
                thickness,
                color,
            } => self.line(points, *thickness, *color, tessellator),
            DrawPrimitive::Polygon { points, color } => {
                self.polygon(points, *color, tessellator)
            }
        }
    }

    /// Packs a rounded rectangle as the fixed 6-vertex, 2-triangle list:
    /// top-left, bottom-left, top-right, bottom-left, bottom-right,
    /// top-right.
    pub fn rectangle(
        &mut self,
        position: Vec2,
        size: Vec2,
        color: Color,
        radius: Option<Corners>,
        border_width: Option<Edges>,
        border_color: Option<Color>,
    ) {
        let scale = self.scale_factor;
        let corners = [
            position,
            Vec2::new(position.x, position.y + size.y),
            Vec2::new(position.x + size.x, position.y),
            Vec2::new(position.x, position.y + size.y),
            Vec2::new(position.x + size.x, position.y + size.y),
            Vec2::new(position.x + size.x, position.y),
        ];

        // Bottom-left of the rectangle in flipped physical pixels; this is
        // what the shader subtracts from the fragment coordinate.
        let corner = [
            position.x * scale,
            (self.viewport_height - position.y - size.y) * scale,
        ];
        let rect_size = [size.x * scale, size.y * scale];
        let radius = match radius {
            Some(r) => [
                r.top_left * scale,
                r.top_right * scale,
                r.bottom_right * scale,
                r.bottom_left * scale,
            ],
            None => NO_DATA_VEC4,
        };
        let width = match border_width {
            Some(w) => [
                w.top * scale,
                w.right * scale,
                w.bottom * scale,
                w.left * scale,
            ],
            None => NO_DATA_VEC4,
        };
        let border = match border_color {
            Some(c) => [c.r, c.g, c.b, c.a],
            None => NO_DATA_VEC4,
        };

        for vertex in corners {
            self.push_vertex(
                vertex,
                NO_DATA_VEC2,
                [color.r, color.g, color.b, color.a],
                corner,
                rect_size,
                radius,
                width,
                border,
            );
        }
    }

    /// Packs one glyph quad. Same 6-vertex order as rectangles, with the
    /// atlas sub-rectangle in the UV channel and every rectangle channel at
    /// the sentinel.
    pub fn glyph(&mut self, position: Vec2, size: Vec2, uv: Vec4, color: Color) {
        let quad = [
            (position, Vec2::new(uv.x, uv.y)),
            (
                Vec2::new(position.x, position.y + size.y),
                Vec2::new(uv.x, uv.y + uv.w),
            ),
            (
                Vec2::new(position.x + size.x, position.y),
                Vec2::new(uv.x + uv.z, uv.y),
            ),
            (
                Vec2::new(position.x, position.y + size.y),
                Vec2::new(uv.x, uv.y + uv.w),
            ),
            (
                Vec2::new(position.x + size.x, position.y + size.y),
                Vec2::new(uv.x + uv.z, uv.y + uv.w),
            ),
            (
                Vec2::new(position.x + size.x, position.y),
                Vec2::new(uv.x + uv.z, uv.y),
            ),
        ];

        for (vertex, uv) in quad {
            self.push_vertex(
                vertex,
                [uv.x, uv.y],
                [color.r, color.g, color.b, color.a],
                NO_DATA_VEC2,
                NO_DATA_VEC2,
                NO_DATA_VEC4,
                NO_DATA_VEC4,
                NO_DATA_VEC4,
            );
        }
    }

    /// Packs a triangulated line strip. The tessellator output is appended
    /// in reverse, flipping the winding so the triangles face the culled
    /// front.
    pub fn line(
        &mut self,
        points: &[Vec2],
        thickness: f32,
        color: Color,
        tessellator: &dyn Tessellator,
    ) -> Result<()> {
        if points.len() < 2 {
            return Err(Error::invariant(format!(
                "line must have at least 2 points, got {}",
                points.len()
            )));
        }

        let vertices = tessellator.triangulate_line(points, thickness);
        for vertex in vertices.iter().rev() {
            self.push_plain(*vertex, color);
        }
        Ok(())
    }

    /// Packs a filled polygon. Three points are batched directly; anything
    /// larger goes through the tessellator with winding preserved.
    pub fn polygon(
        &mut self,
        points: &[Vec2],
        color: Color,
        tessellator: &dyn Tessellator,
    ) -> Result<()> {
        if points.len() < 3 {
            return Err(Error::invariant(format!(
                "polygon must have at least 3 points, got {}",
                points.len()
            )));
        }

        let vertices = if points.len() == 3 {
            points.to_vec()
        } else {
            tessellator.triangulate_polygon(points)
        };
        if vertices.len() % 3 != 0 {
            return Err(Error::invariant(format!(
                "triangulation returned {} vertices, not a multiple of 3",
                vertices.len()
            )));
        }

        for vertex in vertices {
            self.push_plain(vertex, color);
        }
        Ok(())
    }

    /// Drains the buffer into one draw call. An empty buffer is a no-op;
    /// either way the batcher is ready for the next frame.
    pub fn flush(&mut self, rasterizer: &mut dyn Rasterizer) -> Result<()> {
        if self.attributes.len() % FLOATS_PER_VERTEX != 0 {
            return Err(Error::invariant(format!(
                "vertex buffer length {} is not divisible by the {FLOATS_PER_VERTEX}-float stride",
                self.attributes.len()
            )));
        }
        if self.attributes.is_empty() {
            return Ok(());
        }

        let vertices: &[Vertex] = bytemuck::cast_slice(&self.attributes);
        log::debug!("flushing {} vertices", vertices.len());
        rasterizer.draw(vertices)?;
        self.attributes.clear();
        Ok(())
    }

    /// A color-only vertex; everything but position and color is sentinel.
    fn push_plain(&mut self, position: Vec2, color: Color) {
        self.push_vertex(
            position,
            NO_DATA_VEC2,
            [color.r, color.g, color.b, color.a],
            NO_DATA_VEC2,
            NO_DATA_VEC2,
            NO_DATA_VEC4,
            NO_DATA_VEC4,
            NO_DATA_VEC4,
        );
    }

    #[allow(clippy::too_many_arguments)]
    fn push_vertex(
        &mut self,
        position: Vec2,
        uv: [f32; 2],
        color: [f32; 4],
        corner: [f32; 2],
        rect_size: [f32; 2],
        border_radius: [f32; 4],
        border_width: [f32; 4],
        border_color: [f32; 4],
    ) {
        self.attributes.extend_from_slice(&[position.x, position.y]);
        self.attributes.extend_from_slice(&uv);
        self.attributes.extend_from_slice(&color);
        self.attributes.extend_from_slice(&corner);
        self.attributes.extend_from_slice(&rect_size);
        self.attributes.extend_from_slice(&border_radius);
        self.attributes.extend_from_slice(&border_width);
        self.attributes.extend_from_slice(&border_color);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Records every draw call's vertex count.
    #[derive(Default)]
    struct RecordingRasterizer {
        draws: Vec<usize>,
    }

    impl Rasterizer for RecordingRasterizer {
        fn draw(&mut self, vertices: &[Vertex]) -> Result<()> {
            self.draws.push(vertices.len());
            Ok(())
        }
    }

    /// Turns a 2-point line into one triangle and echoes polygon points.
    struct EchoTessellator;

    impl Tessellator for EchoTessellator {
        fn triangulate_line(&self, points: &[Vec2], thickness: f32) -> Vec<Vec2> {
            vec![
                points[0],
                points[1],
                Vec2::new(points[0].x, points[0].y + thickness),
            ]
        }

        fn triangulate_polygon(&self, points: &[Vec2]) -> Vec<Vec2> {
            points.to_vec()
        }
    }

    #[test]
    fn test_rectangle_packs_six_vertices_in_fan_order() {
        let mut batcher = VertexBatcher::new(100.0, 1.0);
        batcher.rectangle(
            Vec2::new(10.0, 20.0),
            Vec2::new(30.0, 40.0),
            Color::WHITE,
            Some(Corners::all(4.0)),
            Some(Edges::all(2.0)),
            Some(Color::BLACK),
        );

        assert_eq!(batcher.vertex_count(), 6);
        let vertices: &[Vertex] = bytemuck::cast_slice(&batcher.attributes);
        let positions: Vec<[f32; 2]> = vertices.iter().map(|v| v.position).collect();
        assert_eq!(
            positions,
            vec![
                [10.0, 20.0],
                [10.0, 60.0],
                [40.0, 20.0],
                [10.0, 60.0],
                [40.0, 60.0],
                [40.0, 20.0],
            ]
        );
        // Corner is the flipped bottom-left: 100 - 20 - 40 = 40.
        assert_eq!(vertices[0].corner, [10.0, 40.0]);
        assert_eq!(vertices[0].rect_size, [30.0, 40.0]);
        assert_eq!(vertices[0].border_radius, [4.0; 4]);
        assert_eq!(vertices[0].border_width, [2.0; 4]);
        assert_eq!(vertices[0].uv, NO_DATA_VEC2);
    }

    #[test]
    fn test_scale_factor_applies_to_physical_channels_only() {
        let mut batcher = VertexBatcher::new(100.0, 2.0);
        batcher.rectangle(
            Vec2::new(10.0, 20.0),
            Vec2::new(30.0, 40.0),
            Color::WHITE,
            Some(Corners::all(4.0)),
            None,
            None,
        );

        let vertices: &[Vertex] = bytemuck::cast_slice(&batcher.attributes);
        // Positions stay logical; the projection handles them.
        assert_eq!(vertices[0].position, [10.0, 20.0]);
        assert_eq!(vertices[0].corner, [20.0, 80.0]);
        assert_eq!(vertices[0].rect_size, [60.0, 80.0]);
        assert_eq!(vertices[0].border_radius, [8.0; 4]);
        // Unset border channels stay at the sentinel, unscaled.
        assert_eq!(vertices[0].border_width, NO_DATA_VEC4);
        assert_eq!(vertices[0].border_color, NO_DATA_VEC4);
    }

    #[test]
    fn test_glyph_quad_uv_corners() {
        let mut batcher = VertexBatcher::new(100.0, 1.0);
        batcher.glyph(
            Vec2::new(0.0, 0.0),
            Vec2::new(8.0, 16.0),
            Vec4::new(0.5, 0.25, 0.0625, 0.125),
            Color::WHITE,
        );

        let vertices: &[Vertex] = bytemuck::cast_slice(&batcher.attributes);
        assert_eq!(vertices[0].uv, [0.5, 0.25]);
        assert_eq!(vertices[1].uv, [0.5, 0.375]);
        assert_eq!(vertices[2].uv, [0.5625, 0.25]);
        assert_eq!(vertices[4].uv, [0.5625, 0.375]);
        assert_eq!(vertices[0].corner, NO_DATA_VEC2);
        assert_eq!(vertices[0].rect_size, NO_DATA_VEC2);
    }

    #[test]
    fn test_line_reverses_tessellated_winding() {
        let mut batcher = VertexBatcher::new(100.0, 1.0);
        let points = [Vec2::new(0.0, 0.0), Vec2::new(10.0, 0.0)];
        batcher
            .line(&points, 2.0, Color::WHITE, &EchoTessellator)
            .unwrap();

        let vertices: &[Vertex] = bytemuck::cast_slice(&batcher.attributes);
        assert_eq!(vertices.len(), 3);
        assert_eq!(vertices[0].position, [0.0, 2.0]);
        assert_eq!(vertices[1].position, [10.0, 0.0]);
        assert_eq!(vertices[2].position, [0.0, 0.0]);
    }

    #[test]
    fn test_triangle_polygon_skips_the_tessellator() {
        struct PanickingTessellator;
        impl Tessellator for PanickingTessellator {
            fn triangulate_line(&self, _: &[Vec2], _: f32) -> Vec<Vec2> {
                panic!("not a line");
            }
            fn triangulate_polygon(&self, _: &[Vec2]) -> Vec<Vec2> {
                panic!("triangles do not need tessellation");
            }
        }

        let mut batcher = VertexBatcher::new(100.0, 1.0);
        let triangle = [
            Vec2::new(0.0, 0.0),
            Vec2::new(10.0, 0.0),
            Vec2::new(5.0, 8.0),
        ];
        batcher
            .polygon(&triangle, Color::WHITE, &PanickingTessellator)
            .unwrap();
        assert_eq!(batcher.vertex_count(), 3);
    }

    #[test]
    fn test_degenerate_inputs_are_rejected() {
        let mut batcher = VertexBatcher::new(100.0, 1.0);
        let err = batcher
            .line(&[Vec2::ZERO], 1.0, Color::WHITE, &EchoTessellator)
            .unwrap_err();
        assert!(err.to_string().contains("at least 2"));

        let err = batcher
            .polygon(&[Vec2::ZERO, Vec2::ZERO], Color::WHITE, &EchoTessellator)
            .unwrap_err();
        assert!(err.to_string().contains("at least 3"));
        assert!(batcher.is_empty());
    }

    #[test]
    fn test_empty_flush_issues_no_draw_call() {
        let mut batcher = VertexBatcher::new(100.0, 1.0);
        let mut rasterizer = RecordingRasterizer::default();
        batcher.flush(&mut rasterizer).unwrap();
        assert!(rasterizer.draws.is_empty());

        // Still usable afterwards.
        batcher.rectangle(
            Vec2::ZERO,
            Vec2::new(1.0, 1.0),
            Color::WHITE,
            None,
            None,
            None,
        );
        batcher.flush(&mut rasterizer).unwrap();
        assert_eq!(rasterizer.draws, vec![6]);
        assert!(batcher.is_empty());
    }

    #[test]
    fn test_flush_drains_everything() {
        let mut batcher = VertexBatcher::new(100.0, 1.0);
        let mut rasterizer = RecordingRasterizer::default();
        batcher.glyph(
            Vec2::ZERO,
            Vec2::new(8.0, 8.0),
            Vec4::new(0.0, 0.0, 0.1, 0.1),
            Color::WHITE,
        );
        batcher
            .polygon(
                &[Vec2::ZERO, Vec2::new(1.0, 0.0), Vec2::new(0.0, 1.0)],
                Color::BLACK,
                &EchoTessellator,
            )
            .unwrap();

        batcher.flush(&mut rasterizer).unwrap();
        assert_eq!(rasterizer.draws, vec![9]);
        assert!(batcher.is_empty());
        batcher.flush(&mut rasterizer).unwrap();
        assert_eq!(rasterizer.draws.len(), 1);
    }
}
