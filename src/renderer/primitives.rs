//! The interleaved vertex format consumed by the rasterizer.
//!
//! Every primitive — rounded rectangle, glyph quad, triangulated line or
//! polygon — packs into the same 24-float record. The rasterizer never sees
//! a type tag: channels that do not apply to a primitive carry the sentinel
//! value −1 and the fragment shader branches on that.
//!
//! Channel layout, in order:
//! - **position** — logical pixels, projected by the matrix uniform.
//! - **uv** — normalized atlas sample point, sentinel when the vertex is
//!   not a glyph.
//! - **color** — fill RGBA in 0..1.
//! - **corner** — framebuffer bottom-left of the rectangle in flipped
//!   (y-up) physical pixels, sentinel for non-rectangles.
//! - **rect_size** — physical pixels, sentinel for non-rectangles.
//! - **border_radius** — physical pixels, TL/TR/BR/BL, sentinel-able.
//! - **border_width** — physical pixels, T/R/B/L, sentinel-able.
//! - **border_color** — RGBA in 0..1, sentinel-able.

/// Sentinel marking a two-float channel as not applicable.
pub const NO_DATA_VEC2: [f32; 2] = [-1.0, -1.0];

/// Sentinel marking a four-float channel as not applicable.
pub const NO_DATA_VEC4: [f32; 4] = [-1.0, -1.0, -1.0, -1.0];

/// Number of floats per vertex record.
pub const FLOATS_PER_VERTEX: usize = 24;

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex {
    pub position: [f32; 2],
    pub uv: [f32; 2],
    pub color: [f32; 4],
    pub corner: [f32; 2],
    pub rect_size: [f32; 2],
    pub border_radius: [f32; 4],
    pub border_width: [f32; 4],
    pub border_color: [f32; 4],
}

impl Vertex {
    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                // position
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x2,
                },
                // uv
                wgpu::VertexAttribute {
                    offset: std::mem::size_of::<[f32; 2]>() as wgpu::BufferAddress,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x2,
                },
                // color
                wgpu::VertexAttribute {
                    offset: std::mem::size_of::<[f32; 4]>() as wgpu::BufferAddress,
                    shader_location: 2,
                    format: wgpu::VertexFormat::Float32x4,
                },
                // corner
                wgpu::VertexAttribute {
                    offset: std::mem::size_of::<[f32; 8]>() as wgpu::BufferAddress,
                    shader_location: 3,
                    format: wgpu::VertexFormat::Float32x2,
                },
                // rect_size
                wgpu::VertexAttribute {
                    offset: std::mem::size_of::<[f32; 10]>() as wgpu::BufferAddress,
                    shader_location: 4,
                    format: wgpu::VertexFormat::Float32x2,
                },
                // border_radius
                wgpu::VertexAttribute {
                    offset: std::mem::size_of::<[f32; 12]>() as wgpu::BufferAddress,
                    shader_location: 5,
                    format: wgpu::VertexFormat::Float32x4,
                },
                // border_width
                wgpu::VertexAttribute {
                    offset: std::mem::size_of::<[f32; 16]>() as wgpu::BufferAddress,
                    shader_location: 6,
                    format: wgpu::VertexFormat::Float32x4,
                },
                // border_color
                wgpu::VertexAttribute {
                    offset: std::mem::size_of::<[f32; 20]>() as wgpu::BufferAddress,
                    shader_location: 7,
                    format: wgpu::VertexFormat::Float32x4,
                },
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vertex_size() {
        assert_eq!(
            std::mem::size_of::<Vertex>(),
            FLOATS_PER_VERTEX * std::mem::size_of::<f32>()
        );
    }

    #[test]
    fn test_attribute_offsets_cover_the_stride() {
        let layout = Vertex::desc();
        assert_eq!(layout.array_stride, 96);
        assert_eq!(layout.attributes.len(), 8);

        let last = layout.attributes.last().unwrap();
        assert_eq!(last.offset, 80);
        assert_eq!(last.format, wgpu::VertexFormat::Float32x4);
    }
}
