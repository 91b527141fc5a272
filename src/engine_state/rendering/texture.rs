//! Texture handling for the rendering pipeline.
//!
//! This module provides the GPU textures of the offscreen renderer: the
//! colour target, the depth buffer and the material atlas.

use wgpu::util::DeviceExt;

use crate::engine_state::voxels::block::{
    block_type::VoxelType, ATLAS_CELLS, VOXEL_TYPE_TO_ATLAS_CELL,
};

/// Edge length, in texels, of one atlas cell.
pub const ATLAS_CELL_TEXELS: u32 = 16;

/// Represents a GPU texture with associated view and sampler.
pub struct Texture {
    pub texture: wgpu::Texture,
    /// The texture view used for binding the texture to the pipeline.
    pub view: wgpu::TextureView,
    /// The sampler used for texture filtering and addressing.
    pub sampler: wgpu::Sampler,
}

impl Texture {
    /// The texture format used for depth buffers.
    pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;
    /// The texture format of the offscreen colour target.
    pub const COLOR_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8UnormSrgb;

    /// Creates a new depth texture of the given size.
    ///
    /// # Arguments
    /// * `device` - The WebGPU device
    /// * `width`, `height` - Size of the render target
    /// * `label` - Debug label for the texture
    pub fn create_depth_texture(
        device: &wgpu::Device,
        width: u32,
        height: u32,
        label: &str,
    ) -> Self {
        let size = wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        };
        let desc = wgpu::TextureDescriptor {
            label: Some(label),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: Self::DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        };

        let texture = device.create_texture(&desc);
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Nearest,
            min_filter: wgpu::FilterMode::Nearest,
            mipmap_filter: wgpu::FilterMode::Nearest,
            compare: Some(wgpu::CompareFunction::LessEqual),
            lod_min_clamp: 0.0,
            lod_max_clamp: 100.0,
            ..Default::default()
        });

        Self {
            texture,
            view,
            sampler,
        }
    }

    /// Creates the offscreen colour target frames are rendered into.
    pub fn create_render_target(
        device: &wgpu::Device,
        width: u32,
        height: u32,
        label: &str,
    ) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: Self::COLOR_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor::default());

        Self {
            texture,
            view,
            sampler,
        }
    }

    /// Uploads the material atlas built by [`material_atlas_rgba`].
    pub fn create_material_atlas(device: &wgpu::Device, queue: &wgpu::Queue) -> Self {
        let side = ATLAS_CELLS * ATLAS_CELL_TEXELS;
        let texture = device.create_texture_with_data(
            queue,
            &wgpu::TextureDescriptor {
                label: Some("Material Atlas"),
                size: wgpu::Extent3d {
                    width: side,
                    height: side,
                    depth_or_array_layers: 1,
                },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: wgpu::TextureFormat::Rgba8UnormSrgb,
                usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
                view_formats: &[],
            },
            wgpu::util::TextureDataOrder::LayerMajor,
            &material_atlas_rgba(),
        );
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Nearest,
            min_filter: wgpu::FilterMode::Nearest,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        Self {
            texture,
            view,
            sampler,
        }
    }
}

/// Flat colour of each material in the generated atlas.
pub fn material_color(voxel: VoxelType) -> [u8; 4] {
    match voxel {
        VoxelType::AIR => [0, 0, 0, 0],
        VoxelType::DIRT => [134, 96, 67, 255],
        VoxelType::ROCK => [125, 125, 125, 255],
        VoxelType::SAND => [219, 203, 140, 255],
        VoxelType::SNOW => [245, 246, 250, 255],
        VoxelType::WATER => [48, 92, 200, 160],
    }
}

/// RGBA texels of the material atlas, one flat-coloured cell per material at
/// the position given by the atlas table. Unassigned cells are transparent.
pub fn material_atlas_rgba() -> Vec<u8> {
    let side = (ATLAS_CELLS * ATLAS_CELL_TEXELS) as usize;
    let mut texels = vec![0u8; side * side * 4];

    for voxel in VoxelType::ALL.into_iter().filter(|v| !v.is_air()) {
        let (column, row) = VOXEL_TYPE_TO_ATLAS_CELL[voxel as usize];
        let color = material_color(voxel);
        let cell = ATLAS_CELL_TEXELS as usize;
        for y in row as usize * cell..(row as usize + 1) * cell {
            for x in column as usize * cell..(column as usize + 1) * cell {
                let offset = (x + y * side) * 4;
                texels[offset..offset + 4].copy_from_slice(&color);
            }
        }
    }

    texels
}
