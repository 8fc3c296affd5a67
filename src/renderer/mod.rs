//! The wgpu rasterizer backend.
//!
//! [`Renderer`] owns every GPU resource for one output target: the
//! offscreen color texture, the font-atlas texture and sampler, the growing
//! vertex buffer, the projection uniform and the single render pipeline. It
//! implements [`Rasterizer`], so a [`VertexBatcher`] flush turns into
//! exactly one render pass with one draw call. [`read_pixels`]
//! (Renderer::read_pixels) copies the target back for PNG capture or
//! golden-image tests.
//!
//! Resources are exclusive to one renderer instance; nothing is shared.

pub mod batch;
pub mod draw_list;
pub mod primitives;

pub use batch::{Rasterizer, VertexBatcher};
pub use draw_list::{DrawPrimitive, build_draw_list};
pub use primitives::Vertex;

use crate::color::Color;
use crate::error::{Error, Result};
use crate::math::Mat4;

/// Pre-rasterized signed-distance-field font atlas, RGBA8 with the field in
/// the alpha channel.
#[derive(Debug, Clone)]
pub struct FontAtlas {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

impl FontAtlas {
    /// A 1x1 transparent atlas for text-free scenes.
    pub fn blank() -> Self {
        Self {
            width: 1,
            height: 1,
            data: vec![0, 0, 0, 0],
        }
    }
}

/// Construction-time renderer settings. Width and height are logical
/// pixels; the render target is allocated at `scale_factor` times that.
#[derive(Debug, Clone)]
pub struct RendererConfig {
    pub width: u32,
    pub height: u32,
    pub scale_factor: f32,
    pub clear_color: Color,
    pub atlas: FontAtlas,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            width: 800,
            height: 600,
            scale_factor: 1.0,
            clear_color: Color::BLACK,
            atlas: FontAtlas::blank(),
        }
    }
}

/// Uniform block: projection matrix plus the physical viewport size the
/// fragment shader needs to flip framebuffer coordinates.
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
struct Uniforms {
    matrix: [f32; 16],
    viewport: [f32; 4],
}

const TARGET_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;
const INITIAL_VERTEX_CAPACITY: usize = 1024;

pub struct Renderer {
    device: wgpu::Device,
    queue: wgpu::Queue,
    pipeline: wgpu::RenderPipeline,
    bind_group: wgpu::BindGroup,
    uniform_buffer: wgpu::Buffer,

    vertex_buffer: wgpu::Buffer,
    vertex_capacity: usize,

    target: wgpu::Texture,
    target_view: wgpu::TextureView,

    width: u32,
    height: u32,
    scale_factor: f32,
    clear_color: Color,
}

impl Renderer {
    /// Brings up the GPU device and every resource the pipeline needs.
    /// Fails with a construction error when no adapter or device is
    /// available.
    pub fn new(config: RendererConfig) -> Result<Self> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor::default());

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::LowPower,
            compatible_surface: None,
            force_fallback_adapter: false,
        }))
        .map_err(|e| Error::construction(format!("no GPU adapter: {e}")))?;

        let (device, queue) = pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor {
            label: Some("Quilt Device"),
            required_features: wgpu::Features::empty(),
            required_limits: wgpu::Limits::default(),
            memory_hints: wgpu::MemoryHints::default(),
            experimental_features: wgpu::ExperimentalFeatures::default(),
            trace: wgpu::Trace::Off,
        }))
        .map_err(|e| Error::construction(format!("device creation failed: {e}")))?;

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Quilt Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shader.wgsl").into()),
        });

        let atlas_texture = Self::create_atlas_texture(&device, &queue, &config.atlas)?;
        let atlas_view = atlas_texture.create_view(&wgpu::TextureViewDescriptor::default());

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Quilt Atlas Sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::MipmapFilterMode::Nearest,
            ..Default::default()
        });

        let uniforms = projection_uniforms(
            0.0,
            0.0,
            config.width as f32,
            config.height as f32,
            config.scale_factor,
        );
        let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Quilt Uniform Buffer"),
            size: std::mem::size_of::<Uniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        queue.write_buffer(&uniform_buffer, 0, bytemuck::cast_slice(&[uniforms]));

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Quilt Bind Group Layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Quilt Bind Group"),
            layout: &bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: uniform_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(&atlas_view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(&sampler),
                },
            ],
        });

        let pipeline = Self::create_pipeline(&device, &shader, &bind_group_layout);

        let vertex_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Quilt Vertex Buffer"),
            size: (INITIAL_VERTEX_CAPACITY * std::mem::size_of::<Vertex>()) as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let (target, target_view) =
            Self::create_target(&device, config.width, config.height, config.scale_factor);

        log::info!(
            "renderer up: {}x{} logical, scale {}",
            config.width,
            config.height,
            config.scale_factor
        );

        Ok(Self {
            device,
            queue,
            pipeline,
            bind_group,
            uniform_buffer,
            vertex_buffer,
            vertex_capacity: INITIAL_VERTEX_CAPACITY,
            target,
            target_view,
            width: config.width,
            height: config.height,
            scale_factor: config.scale_factor,
            clear_color: config.clear_color,
        })
    }

    fn create_atlas_texture(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        atlas: &FontAtlas,
    ) -> Result<wgpu::Texture> {
        let expected = (atlas.width * atlas.height * 4) as usize;
        if atlas.data.len() != expected {
            return Err(Error::construction(format!(
                "font atlas data is {} bytes, expected {expected} for {}x{} RGBA",
                atlas.data.len(),
                atlas.width,
                atlas.height
            )));
        }

        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Quilt Font Atlas"),
            size: wgpu::Extent3d {
                width: atlas.width,
                height: atlas.height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: TARGET_FORMAT,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            &atlas.data,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(atlas.width * 4),
                rows_per_image: Some(atlas.height),
            },
            wgpu::Extent3d {
                width: atlas.width,
                height: atlas.height,
                depth_or_array_layers: 1,
            },
        );

        Ok(texture)
    }

    fn create_target(
        device: &wgpu::Device,
        width: u32,
        height: u32,
        scale_factor: f32,
    ) -> (wgpu::Texture, wgpu::TextureView) {
        let physical_width = ((width as f32 * scale_factor) as u32).max(1);
        let physical_height = ((height as f32 * scale_factor) as u32).max(1);

        let target = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Quilt Render Target"),
            size: wgpu::Extent3d {
                width: physical_width,
                height: physical_height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: TARGET_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        });
        let view = target.create_view(&wgpu::TextureViewDescriptor::default());
        (target, view)
    }

    fn create_pipeline(
        device: &wgpu::Device,
        shader: &wgpu::ShaderModule,
        bind_group_layout: &wgpu::BindGroupLayout,
    ) -> wgpu::RenderPipeline {
        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Quilt Pipeline Layout"),
            bind_group_layouts: &[bind_group_layout],
            immediate_size: 0,
        });

        device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Quilt Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: shader,
                entry_point: Some("vs_main"),
                buffers: &[Vertex::desc()],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: TARGET_FORMAT,
                    blend: Some(wgpu::BlendState {
                        color: wgpu::BlendComponent {
                            src_factor: wgpu::BlendFactor::SrcAlpha,
                            dst_factor: wgpu::BlendFactor::OneMinusSrcAlpha,
                            operation: wgpu::BlendOperation::Add,
                        },
                        alpha: wgpu::BlendComponent {
                            src_factor: wgpu::BlendFactor::One,
                            dst_factor: wgpu::BlendFactor::OneMinusSrcAlpha,
                            operation: wgpu::BlendOperation::Add,
                        },
                    }),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                // Line triangulation relies on winding, so culling stays on.
                cull_mode: Some(wgpu::Face::Back),
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn scale_factor(&self) -> f32 {
        self.scale_factor
    }

    /// Recomputes the projection uniform: orthographic over the given
    /// logical size, composed with a translation by the given offset.
    pub fn set_projection(&mut self, x: f32, y: f32, width: f32, height: f32) -> Result<()> {
        if width < 0.0 || height < 0.0 {
            return Err(Error::invariant(format!(
                "projection size must be non-negative, got {width}x{height}"
            )));
        }
        let uniforms = projection_uniforms(x, y, width, height, self.scale_factor);
        self.queue
            .write_buffer(&self.uniform_buffer, 0, bytemuck::cast_slice(&[uniforms]));
        Ok(())
    }

    /// Recreates the render target at a new logical size and resets the
    /// projection to cover it.
    pub fn resize(&mut self, width: u32, height: u32) -> Result<()> {
        log::info!("resizing render target to {width}x{height}");
        self.width = width;
        self.height = height;
        let (target, view) = Self::create_target(&self.device, width, height, self.scale_factor);
        self.target = target;
        self.target_view = view;
        self.set_projection(0.0, 0.0, width as f32, height as f32)
    }

    fn ensure_vertex_capacity(&mut self, count: usize) {
        if count > self.vertex_capacity {
            let new_capacity = (self.vertex_capacity * 2).max(count);
            log::debug!(
                "growing vertex buffer {} -> {new_capacity}",
                self.vertex_capacity
            );
            self.vertex_buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
                label: Some("Quilt Vertex Buffer"),
                size: (new_capacity * std::mem::size_of::<Vertex>()) as u64,
                usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            });
            self.vertex_capacity = new_capacity;
        }
    }

    /// Copies the render target back to the CPU as tightly packed RGBA
    /// bytes, physical resolution, row by row from the top.
    pub fn read_pixels(&self) -> Result<Vec<u8>> {
        let width = self.target.width();
        let height = self.target.height();
        let row_bytes = width * 4;
        // Buffer copies require 256-byte row alignment; rows are padded in
        // the staging buffer and repacked after mapping.
        let padded_bytes_per_row = row_bytes.div_ceil(256) * 256;

        let readback = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Quilt Readback Buffer"),
            size: u64::from(padded_bytes_per_row) * u64::from(height),
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Quilt Readback Encoder"),
            });
        encoder.copy_texture_to_buffer(
            wgpu::TexelCopyTextureInfo {
                texture: &self.target,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::TexelCopyBufferInfo {
                buffer: &readback,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(padded_bytes_per_row),
                    rows_per_image: Some(height),
                },
            },
            wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
        );
        self.queue.submit(std::iter::once(encoder.finish()));

        let slice = readback.slice(..);
        let (sender, receiver) = std::sync::mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            drop(sender.send(result));
        });
        loop {
            self.device
                .poll(wgpu::PollType::wait_indefinitely())
                .map_err(|e| Error::construction(format!("device poll failed: {e:?}")))?;
            match receiver.try_recv() {
                Ok(result) => {
                    result.map_err(|e| {
                        Error::construction(format!("readback mapping failed: {e}"))
                    })?;
                    break;
                }
                Err(std::sync::mpsc::TryRecvError::Empty) => continue,
                Err(std::sync::mpsc::TryRecvError::Disconnected) => {
                    return Err(Error::construction("readback mapping was abandoned"));
                }
            }
        }

        let mapped = slice.get_mapped_range();
        let mut pixels = vec![0u8; (row_bytes as usize) * (height as usize)];
        for row in 0..height as usize {
            let src = row * padded_bytes_per_row as usize;
            let dst = row * row_bytes as usize;
            pixels[dst..dst + row_bytes as usize]
                .copy_from_slice(&mapped[src..src + row_bytes as usize]);
        }
        drop(mapped);
        readback.unmap();
        Ok(pixels)
    }
}

impl Rasterizer for Renderer {
    /// One render pass, one draw call: clears the target, uploads the
    /// batched vertices and rasterizes them.
    fn draw(&mut self, vertices: &[Vertex]) -> Result<()> {
        self.ensure_vertex_capacity(vertices.len());
        self.queue
            .write_buffer(&self.vertex_buffer, 0, bytemuck::cast_slice(vertices));

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Quilt Encoder"),
            });
        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Quilt Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &self.target_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: self.clear_color.r as f64,
                            g: self.clear_color.g as f64,
                            b: self.clear_color.b as f64,
                            a: self.clear_color.a as f64,
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });

            render_pass.set_pipeline(&self.pipeline);
            render_pass.set_bind_group(0, &self.bind_group, &[]);
            render_pass.set_vertex_buffer(
                0,
                self.vertex_buffer
                    .slice(..(vertices.len() * std::mem::size_of::<Vertex>()) as u64),
            );
            render_pass.draw(0..vertices.len() as u32, 0..1);
        }
        self.queue.submit(std::iter::once(encoder.finish()));
        Ok(())
    }
}

fn projection_uniforms(x: f32, y: f32, width: f32, height: f32, scale_factor: f32) -> Uniforms {
    let matrix = Mat4::orthographic(0.0, width, height, 0.0, 0.0, 1.0)
        .multiply(&Mat4::translate(x, y, 0.0));
    Uniforms {
        matrix: matrix.to_column_major(),
        viewport: [width * scale_factor, height * scale_factor, 0.0, 0.0],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_atlas_is_one_transparent_texel() {
        let atlas = FontAtlas::blank();
        assert_eq!((atlas.width, atlas.height), (1, 1));
        assert_eq!(atlas.data, vec![0, 0, 0, 0]);
    }

    #[test]
    fn test_projection_uniform_layout() {
        let uniforms = projection_uniforms(0.0, 0.0, 200.0, 100.0, 2.0);
        assert_eq!(std::mem::size_of::<Uniforms>(), 80);
        assert_eq!(uniforms.viewport[0], 400.0);
        assert_eq!(uniforms.viewport[1], 200.0);
        // Column-major: scale terms sit at the top of the first columns.
        assert_eq!(uniforms.matrix[0], 2.0 / 200.0);
        assert_eq!(uniforms.matrix[5], -2.0 / 100.0);
    }

    #[test]
    fn test_projection_offset_lands_in_translation_column() {
        let flat = projection_uniforms(0.0, 0.0, 100.0, 100.0, 1.0);
        let shifted = projection_uniforms(10.0, 0.0, 100.0, 100.0, 1.0);
        assert_ne!(flat.matrix[12], shifted.matrix[12]);
    }
}
