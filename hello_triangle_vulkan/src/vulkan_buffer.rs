/// VertexBuffer - host-visible vertex buffer backed by gpu-allocator

use ash::vk;
use gpu_allocator::vulkan::{Allocation, AllocationCreateDesc, AllocationScheme};
use gpu_allocator::MemoryLocation;
use hello_triangle::triangle::{Error, Result, Vertex};
use hello_triangle::{app_debug, app_error, app_init_err};
use std::sync::Arc;

use crate::vulkan_context::GpuContext;

const SOURCE: &str = "triangle::vulkan";

/// Vertex buffer, filled once at creation
///
/// Only created during startup, so every failure is `InitializationFailed`
/// (or `OutOfMemory`).
pub struct VertexBuffer {
    /// Shared GPU context (device, allocator)
    ctx: Arc<GpuContext>,
    /// Vulkan buffer
    pub(crate) buffer: vk::Buffer,
    /// GPU memory allocation
    allocation: Option<Allocation>,
    vertex_count: u32,
}

impl VertexBuffer {
    /// Create a buffer holding `vertices`, mapped and written through CPU-visible memory
    pub fn new(ctx: Arc<GpuContext>, vertices: &[Vertex]) -> Result<Self> {
        let bytes: &[u8] = bytemuck::cast_slice(vertices);

        unsafe {
            let buffer_info = vk::BufferCreateInfo::default()
                .size(bytes.len() as u64)
                .usage(vk::BufferUsageFlags::VERTEX_BUFFER)
                .sharing_mode(vk::SharingMode::EXCLUSIVE);

            let buffer = ctx
                .device
                .create_buffer(&buffer_info, None)
                .map_err(|e| app_init_err!(SOURCE, "Failed to create vertex buffer: {:?}", e))?;

            // Owned from here on: Drop frees whatever was set up
            let mut this = Self {
                ctx,
                buffer,
                allocation: None,
                vertex_count: vertices.len() as u32,
            };

            let requirements = this.ctx.device.get_buffer_memory_requirements(buffer);
            let allocation = {
                let mut allocator = this
                    .ctx
                    .allocator
                    .lock()
                    .map_err(|_| app_init_err!(SOURCE, "GPU allocator lock poisoned"))?;
                allocator
                    .allocate(&AllocationCreateDesc {
                        name: "triangle_vertices",
                        requirements,
                        location: MemoryLocation::CpuToGpu,
                        linear: true,
                        allocation_scheme: AllocationScheme::GpuAllocatorManaged,
                    })
                    .map_err(|e| {
                        app_error!(SOURCE, "Failed to allocate vertex buffer memory: {:?}", e);
                        match e {
                            gpu_allocator::AllocationError::OutOfMemory => Error::OutOfMemory,
                            other => Error::InitializationFailed(format!("Failed to allocate memory: {:?}", other)),
                        }
                    })?
            };

            let allocation = this.allocation.insert(allocation);
            this.ctx
                .device
                .bind_buffer_memory(buffer, allocation.memory(), allocation.offset())
                .map_err(|e| app_init_err!(SOURCE, "Failed to bind vertex buffer memory: {:?}", e))?;

            let mapped = allocation
                .mapped_slice_mut()
                .ok_or_else(|| app_init_err!(SOURCE, "Vertex buffer memory is not CPU-accessible"))?;
            mapped[..bytes.len()].copy_from_slice(bytes);

            app_debug!(SOURCE, "Vertex buffer created ({} vertices, {} bytes)", vertices.len(), bytes.len());
            Ok(this)
        }
    }

    pub fn vertex_count(&self) -> u32 {
        self.vertex_count
    }
}

impl Drop for VertexBuffer {
    fn drop(&mut self) {
        unsafe {
            // Free GPU memory
            if let Some(allocation) = self.allocation.take() {
                // Don't panic if lock fails - we still need to destroy the buffer
                if let Ok(mut allocator) = self.ctx.allocator.lock() {
                    allocator.free(allocation).ok();
                }
            }

            self.ctx.device.destroy_buffer(self.buffer, None);
        }
    }
}
