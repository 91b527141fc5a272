//! Manages the wgpu render pipelines used to draw the active chunks.
//!
//! [`OffscreenRenderer`] renders a world into an offscreen colour target. It
//! owns two pipelines that share one shader and one pipeline layout:
//!
//! - opaque: depth test and depth write, back faces culled, no blending
//! - water: depth test without depth write, both faces, alpha blending
//!
//! Every frame draws the opaque stream of all active chunks before any water,
//! so water blends over the finished terrain.
//!
//! # Resource Management
//!
//! - Bind group 0: camera uniform
//! - Bind group 1: material atlas and its sampler
//! - Colour and depth targets sized to the output, recreated on resize

use log::trace;
use wgpu::util::DeviceExt;

use crate::engine_state::voxels::world::World;

use super::{
    camera::{Camera, CameraUniform, Projection},
    texture,
    vertex::Vertex,
    wgpu_backend::WgpuBackend,
    MeshStream,
};

const FOVY_DEGREES: f32 = 60.0;
const Z_NEAR: f32 = 0.1;
const Z_FAR: f32 = 2000.0;
const SKY: wgpu::Color = wgpu::Color {
    r: 0.53,
    g: 0.81,
    b: 0.92,
    a: 1.0,
};

/// Draw counts of one rendered frame.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub opaque_draws: usize,
    pub water_draws: usize,
}

/// Renders the active chunks of a world into an offscreen target.
pub struct OffscreenRenderer {
    backend: WgpuBackend,
    color_target: texture::Texture,
    depth_texture: texture::Texture,
    /// Kept alive for the atlas bind group.
    _atlas: texture::Texture,
    projection: Projection,
    camera_uniform: CameraUniform,
    camera_buffer: wgpu::Buffer,
    camera_bind_group: wgpu::BindGroup,
    atlas_bind_group: wgpu::BindGroup,
    opaque_pipeline: wgpu::RenderPipeline,
    water_pipeline: wgpu::RenderPipeline,
    width: u32,
    height: u32,
}

impl OffscreenRenderer {
    /// Creates the targets, bind groups and both pipelines.
    ///
    /// # Arguments
    /// * `backend` - The wgpu backend the world uploads its meshes to
    /// * `width`, `height` - Size of the offscreen target in pixels
    pub fn new(backend: &WgpuBackend, width: u32, height: u32) -> Self {
        let width = width.max(1);
        let height = height.max(1);
        let device = backend.device();

        let color_target =
            texture::Texture::create_render_target(device, width, height, "Offscreen Target");
        let depth_texture =
            texture::Texture::create_depth_texture(device, width, height, "Depth Texture");
        let atlas = texture::Texture::create_material_atlas(device, backend.queue());

        let projection = Projection::new(width, height, cgmath::Deg(FOVY_DEGREES), Z_NEAR, Z_FAR);
        let camera_uniform = CameraUniform::new();
        let camera_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Camera Buffer"),
            contents: bytemuck::cast_slice(&[camera_uniform]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let camera_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                }],
                label: Some("camera_bind_group_layout"),
            });
        let camera_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &camera_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: camera_buffer.as_entire_binding(),
            }],
            label: Some("camera_bind_group"),
        });

        let atlas_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                entries: &[
                    wgpu::BindGroupLayoutEntry {
                        binding: 0,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Texture {
                            multisampled: false,
                            view_dimension: wgpu::TextureViewDimension::D2,
                            sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        },
                        count: None,
                    },
                    wgpu::BindGroupLayoutEntry {
                        binding: 1,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                        count: None,
                    },
                ],
                label: Some("atlas_bind_group_layout"),
            });
        let atlas_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &atlas_bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&atlas.view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&atlas.sampler),
                },
            ],
            label: Some("atlas_bind_group"),
        });

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Chunk Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shader.wgsl").into()),
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Chunk Pipeline Layout"),
            bind_group_layouts: &[&camera_bind_group_layout, &atlas_bind_group_layout],
            push_constant_ranges: &[],
        });

        let opaque_pipeline = Self::create_pipeline(
            device,
            &pipeline_layout,
            &shader,
            MeshStream::Opaque,
        );
        let water_pipeline =
            Self::create_pipeline(device, &pipeline_layout, &shader, MeshStream::Water);

        Self {
            backend: backend.clone(),
            color_target,
            depth_texture,
            _atlas: atlas,
            projection,
            camera_uniform,
            camera_buffer,
            camera_bind_group,
            atlas_bind_group,
            opaque_pipeline,
            water_pipeline,
            width,
            height,
        }
    }

    fn create_pipeline(
        device: &wgpu::Device,
        layout: &wgpu::PipelineLayout,
        shader: &wgpu::ShaderModule,
        stream: MeshStream,
    ) -> wgpu::RenderPipeline {
        let (label, blend, cull_mode, depth_write_enabled) = match stream {
            MeshStream::Opaque => (
                "Opaque Render Pipeline",
                wgpu::BlendState::REPLACE,
                Some(wgpu::Face::Back),
                true,
            ),
            MeshStream::Water => (
                "Water Render Pipeline",
                wgpu::BlendState::ALPHA_BLENDING,
                None,
                false,
            ),
        };

        device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(label),
            layout: Some(layout),
            vertex: wgpu::VertexState {
                module: shader,
                entry_point: Some("vs_main"),
                compilation_options: Default::default(),
                buffers: &[Vertex::desc()],
            },
            fragment: Some(wgpu::FragmentState {
                module: shader,
                entry_point: Some("fs_main"),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: texture::Texture::COLOR_FORMAT,
                    blend: Some(blend),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: texture::Texture::DEPTH_FORMAT,
                depth_write_enabled,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: Default::default(),
            multiview: None,
            cache: None,
        })
    }

    /// Renders one frame of the world's active chunks as seen from `camera`.
    ///
    /// Pending chunks are skipped; empty meshes issue no draws.
    pub fn render(&mut self, world: &World<WgpuBackend>, camera: &Camera) -> FrameStats {
        self.camera_uniform
            .update_view_proj(camera, &self.projection);
        self.backend.queue().write_buffer(
            &self.camera_buffer,
            0,
            bytemuck::cast_slice(&[self.camera_uniform]),
        );

        let mut encoder = self
            .backend
            .device()
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Frame Encoder"),
            });

        let mut stats = FrameStats::default();
        {
            let depth_stencil_attachment = Some(wgpu::RenderPassDepthStencilAttachment {
                view: &self.depth_texture.view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            });
            let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Chunk Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &self.color_target.view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(SKY),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment,
                ..Default::default()
            });

            rpass.set_bind_group(0, &self.camera_bind_group, &[]);
            rpass.set_bind_group(1, &self.atlas_bind_group, &[]);

            rpass.set_pipeline(&self.opaque_pipeline);
            stats.opaque_draws = world.draw(&mut rpass, MeshStream::Opaque);

            rpass.set_pipeline(&self.water_pipeline);
            stats.water_draws = world.draw(&mut rpass, MeshStream::Water);
        }

        self.backend.queue().submit([encoder.finish()]);
        trace!(
            "Rendered {}x{} frame: {} opaque draws, {} water draws",
            self.width,
            self.height,
            stats.opaque_draws,
            stats.water_draws
        );
        stats
    }

    /// Recreates the targets for a new output size.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.width = width.max(1);
        self.height = height.max(1);
        let device = self.backend.device();
        self.color_target = texture::Texture::create_render_target(
            device,
            self.width,
            self.height,
            "Offscreen Target",
        );
        self.depth_texture =
            texture::Texture::create_depth_texture(device, self.width, self.height, "Depth Texture");
        self.projection.resize(self.width, self.height);
    }

    /// The texture frames are rendered into.
    pub fn color_target(&self) -> &wgpu::Texture {
        &self.color_target.texture
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}
