/// Command pool and the pre-recorded per-image command buffers
///
/// Each swapchain image gets one primary command buffer that is recorded once
/// (clear, bind pipeline, bind vertex buffer, draw) and resubmitted every time
/// that image comes up. Buffers are freed and re-recorded on rebuild; the pool
/// lives as long as the frame device.

use ash::vk;
use hello_triangle::triangle::{Error, Result};
use hello_triangle::{app_err, app_error, app_trace};
use std::sync::Arc;

use crate::vulkan_context::GpuContext;

const SOURCE: &str = "triangle::vulkan";

/// Command pool on the graphics queue family
pub struct CommandPool {
    ctx: Arc<GpuContext>,
    pub(crate) pool: vk::CommandPool,
}

impl CommandPool {
    pub fn new(ctx: Arc<GpuContext>) -> Result<Self> {
        let create_info = vk::CommandPoolCreateInfo::default()
            .queue_family_index(ctx.queue_families.graphics);

        let pool = unsafe {
            ctx.device.create_command_pool(&create_info, None).map_err(|e| {
                app_error!(SOURCE, "Failed to create command pool: {:?}", e);
                Error::InitializationFailed(format!("Failed to create command pool: {:?}", e))
            })?
        };
        Ok(Self { ctx, pool })
    }
}

impl Drop for CommandPool {
    fn drop(&mut self) {
        unsafe {
            self.ctx.device.destroy_command_pool(self.pool, None);
        }
    }
}

/// Everything a per-image command buffer references
pub struct DrawRecording<'a> {
    pub render_pass: vk::RenderPass,
    pub framebuffers: &'a [vk::Framebuffer],
    pub extent: vk::Extent2D,
    pub pipeline: vk::Pipeline,
    pub vertex_buffer: vk::Buffer,
    pub vertex_count: u32,
    pub clear_color: [f32; 4],
}

/// One recorded command buffer per framebuffer
pub struct CommandBuffers {
    pool: Arc<CommandPool>,
    pub(crate) buffers: Vec<vk::CommandBuffer>,
}

impl CommandBuffers {
    /// Allocate and record one command buffer per framebuffer in `recording`
    pub fn record(pool: Arc<CommandPool>, recording: &DrawRecording<'_>) -> Result<Self> {
        let ctx = &pool.ctx;
        let allocate_info = vk::CommandBufferAllocateInfo::default()
            .command_pool(pool.pool)
            .level(vk::CommandBufferLevel::PRIMARY)
            .command_buffer_count(recording.framebuffers.len() as u32);

        let buffers = unsafe {
            ctx.device
                .allocate_command_buffers(&allocate_info)
                .map_err(|e| app_err!(SOURCE, "Failed to allocate command buffers: {:?}", e))?
        };
        let this = Self { pool, buffers };

        for (&command_buffer, &framebuffer) in this.buffers.iter().zip(recording.framebuffers) {
            unsafe {
                record_draw(&this.pool.ctx.device, command_buffer, framebuffer, recording)?;
            }
        }

        app_trace!(SOURCE, "Recorded {} command buffers", this.buffers.len());
        Ok(this)
    }

    pub fn get(&self, image_index: u32) -> Option<vk::CommandBuffer> {
        self.buffers.get(image_index as usize).copied()
    }

    pub fn len(&self) -> usize {
        self.buffers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffers.is_empty()
    }
}

impl Drop for CommandBuffers {
    fn drop(&mut self) {
        if self.buffers.is_empty() {
            return;
        }
        unsafe {
            self.pool.ctx.device.free_command_buffers(self.pool.pool, &self.buffers);
        }
    }
}

unsafe fn record_draw(
    device: &ash::Device,
    command_buffer: vk::CommandBuffer,
    framebuffer: vk::Framebuffer,
    recording: &DrawRecording<'_>,
) -> Result<()> {
    device
        .begin_command_buffer(command_buffer, &vk::CommandBufferBeginInfo::default())
        .map_err(|e| app_err!(SOURCE, "Failed to begin recording command buffer: {:?}", e))?;

    let clear_value = vk::ClearValue {
        color: vk::ClearColorValue {
            float32: recording.clear_color,
        },
    };
    let render_pass_begin = vk::RenderPassBeginInfo::default()
        .render_pass(recording.render_pass)
        .framebuffer(framebuffer)
        .render_area(vk::Rect2D {
            offset: vk::Offset2D { x: 0, y: 0 },
            extent: recording.extent,
        })
        .clear_values(std::slice::from_ref(&clear_value));

    device.cmd_begin_render_pass(command_buffer, &render_pass_begin, vk::SubpassContents::INLINE);
    device.cmd_bind_pipeline(command_buffer, vk::PipelineBindPoint::GRAPHICS, recording.pipeline);
    device.cmd_bind_vertex_buffers(command_buffer, 0, &[recording.vertex_buffer], &[0]);
    device.cmd_draw(command_buffer, recording.vertex_count, 1, 0, 0);
    device.cmd_end_render_pass(command_buffer);

    device
        .end_command_buffer(command_buffer)
        .map_err(|e| app_err!(SOURCE, "Failed to record command buffer: {:?}", e))
}
