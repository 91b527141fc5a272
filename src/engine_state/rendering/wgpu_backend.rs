//! wgpu implementation of the renderable handle protocol.
//!
//! Each uploaded chunk mesh owns one vertex buffer and one index buffer.
//! Dropping the [`WgpuMesh`] destroys both, so an evicted chunk frees its GPU
//! memory immediately instead of waiting for the last reference to go away.

use std::sync::Arc;

use log::{info, trace};
use wgpu::util::DeviceExt;

use crate::error::RenderError;

use super::{MeshData, RenderBackend};

/// Chunk mesh buffers on the GPU.
pub struct WgpuMesh {
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    index_count: u32,
}

impl WgpuMesh {
    pub fn index_count(&self) -> u32 {
        self.index_count
    }
}

impl Drop for WgpuMesh {
    fn drop(&mut self) {
        self.vertex_buffer.destroy();
        self.index_buffer.destroy();
    }
}

/// Render backend uploading chunk meshes to a wgpu device.
#[derive(Clone)]
pub struct WgpuBackend {
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
}

impl WgpuBackend {
    pub fn new(device: Arc<wgpu::Device>, queue: Arc<wgpu::Queue>) -> Self {
        WgpuBackend { device, queue }
    }

    /// Requests an adapter and device without any surface.
    ///
    /// # Returns
    /// A backend for offscreen rendering, or the adapter/device error when no
    /// usable GPU exists.
    pub async fn request_headless() -> Result<Self, RenderError> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            flags: wgpu::InstanceFlags::empty(),
            backend_options: wgpu::BackendOptions::from_env_or_default(),
        });

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await?;
        info!("Using adapter {}", adapter.get_info().name);

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::downlevel_defaults(),
                label: Some("Voxel World Device"),
                memory_hints: wgpu::MemoryHints::MemoryUsage,
                trace: wgpu::Trace::Off,
            })
            .await?;

        Ok(Self::new(Arc::new(device), Arc::new(queue)))
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }
}

impl RenderBackend for WgpuBackend {
    type Mesh = WgpuMesh;
    type Pass<'p> = wgpu::RenderPass<'p>;

    fn create_gpu_resources(&self, label: &str, mesh: &MeshData) -> WgpuMesh {
        let vertex_buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(&format!("{label} vertices")),
                contents: bytemuck::cast_slice(&mesh.vertices),
                usage: wgpu::BufferUsages::VERTEX,
            });
        let index_buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(&format!("{label} indices")),
                contents: bytemuck::cast_slice(&mesh.indices),
                usage: wgpu::BufferUsages::INDEX,
            });
        trace!(
            "Uploaded {label}: {} vertices, {} indices",
            mesh.vertices.len(),
            mesh.indices.len()
        );

        WgpuMesh {
            vertex_buffer,
            index_buffer,
            index_count: mesh.index_count(),
        }
    }

    fn issue_draw<'p>(&self, mesh: &WgpuMesh, pass: &mut Self::Pass<'p>) {
        pass.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
        pass.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        pass.draw_indexed(0..mesh.index_count, 0, 0..1);
    }
}
