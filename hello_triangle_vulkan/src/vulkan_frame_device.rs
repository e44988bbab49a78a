/// VulkanFrameDevice - Vulkan implementation of the FrameDevice trait
///
/// Owns everything the triangle needs: the GPU context, one `FrameSlot` per
/// frame in flight, the command pool, the vertex buffer, and the
/// swapchain-dependent resources that are dropped and recreated on rebuild.

use ash::vk;
use hello_triangle::frame::{AcquireOutcome, FrameDevice, PresentOutcome};
use hello_triangle::triangle::{
    load_spirv, Config, Error, Extent, Result, SurfaceSize, ValidationStats, TRIANGLE_VERTICES,
};
use hello_triangle::{app_bail, app_debug, app_err, app_error, app_info};
use raw_window_handle::{HasDisplayHandle, HasWindowHandle};
use std::sync::Arc;

use crate::debug;
use crate::vulkan_buffer::VertexBuffer;
use crate::vulkan_command_list::{CommandBuffers, CommandPool, DrawRecording};
use crate::vulkan_context::GpuContext;
use crate::vulkan_frame_buffer::Framebuffers;
use crate::vulkan_pipeline::Pipeline;
use crate::vulkan_render_pass::RenderPass;
use crate::vulkan_shader::ShaderModule;
use crate::vulkan_swapchain::{Swapchain, SwapchainSettings};
use crate::vulkan_sync::FrameSlot;

const SOURCE: &str = "triangle::vulkan";

/// Objects that depend on the swapchain
///
/// Field order is drop order: dependents first, swapchain last.
struct SwapchainResources {
    command_buffers: CommandBuffers,
    framebuffers: Framebuffers,
    pipeline: Pipeline,
    render_pass: RenderPass,
    swapchain: Swapchain,
}

/// Vulkan frame device
pub struct VulkanFrameDevice {
    // Field order is drop order
    resources: Option<SwapchainResources>,
    slots: Vec<FrameSlot>,
    vertex_buffer: VertexBuffer,
    command_pool: Arc<CommandPool>,
    ctx: Arc<GpuContext>,

    vertex_spirv: Vec<u32>,
    fragment_spirv: Vec<u32>,
    settings: SwapchainSettings,
    clear_color: [f32; 4],
}

impl VulkanFrameDevice {
    /// Create the device and the first swapchain for `window`
    ///
    /// `config` is validated first; shaders are read once and kept for rebuilds.
    pub fn new<W>(window: &W, config: &Config) -> Result<Self>
    where
        W: HasDisplayHandle + HasWindowHandle + SurfaceSize,
    {
        config.validate()?;

        let vertex_spirv = load_spirv(&config.vertex_shader_path)?;
        let fragment_spirv = load_spirv(&config.fragment_shader_path)?;

        let extent = window.framebuffer_extent();
        if extent.is_zero() {
            app_error!(SOURCE, "Cannot create a swapchain for a zero-sized window");
            return Err(Error::InitializationFailed(format!(
                "window framebuffer is {}x{}",
                extent.width, extent.height
            )));
        }

        let ctx = Arc::new(GpuContext::new(window, config)?);
        let slots = FrameSlot::create_slots(&ctx, config.frames_in_flight)?;
        let command_pool = Arc::new(CommandPool::new(Arc::clone(&ctx))?);
        let vertex_buffer = VertexBuffer::new(Arc::clone(&ctx), &TRIANGLE_VERTICES)?;

        let mut device = Self {
            resources: None,
            slots,
            vertex_buffer,
            command_pool,
            ctx,
            vertex_spirv,
            fragment_spirv,
            settings: SwapchainSettings {
                present_mode: config.present_mode,
                sharing_mode: config.sharing_mode,
            },
            clear_color: config.clear_color,
        };
        // Shared with rebuild, where the same failure is a frame-loop error
        device
            .create_swapchain_resources(extent)
            .map_err(Error::during_setup)?;

        app_info!(
            SOURCE,
            "Vulkan initialization finished ({} frames in flight, {} swapchain images)",
            device.slots.len(),
            device.image_count()
        );
        Ok(device)
    }

    /// Shared GPU context
    pub fn context(&self) -> &Arc<GpuContext> {
        &self.ctx
    }

    /// Number of frame slots
    pub fn frames_in_flight(&self) -> usize {
        self.slots.len()
    }

    /// Current swapchain extent, `None` while the swapchain is destroyed
    pub fn swapchain_extent(&self) -> Option<Extent> {
        self.resources.as_ref().map(|r| {
            let extent = r.swapchain.extent();
            Extent::new(extent.width, extent.height)
        })
    }

    /// Present mode of the current swapchain
    pub fn present_mode(&self) -> Option<vk::PresentModeKHR> {
        self.resources.as_ref().map(|r| r.swapchain.present_mode())
    }

    /// Validation messages counted so far
    pub fn validation_stats(&self) -> ValidationStats {
        debug::get_validation_stats()
    }

    fn slot(&self, slot: usize) -> Result<&FrameSlot> {
        match self.slots.get(slot) {
            Some(s) => Ok(s),
            None => app_bail!(SOURCE, "Frame slot {} out of range ({} slots)", slot, self.slots.len()),
        }
    }

    fn resources(&self) -> Result<&SwapchainResources> {
        match self.resources.as_ref() {
            Some(r) => Ok(r),
            None => app_bail!(SOURCE, "Swapchain resources are not available"),
        }
    }
}

impl FrameDevice for VulkanFrameDevice {
    fn image_count(&self) -> usize {
        self.resources
            .as_ref()
            .map(|r| r.swapchain.image_count())
            .unwrap_or(0)
    }

    fn wait_for_slot(&mut self, slot: usize, timeout_ns: u64) -> Result<()> {
        self.slot(slot)?.in_flight.wait(timeout_ns)
    }

    fn acquire_next_image(&mut self, slot: usize) -> Result<AcquireOutcome> {
        let image_available = self.slot(slot)?.image_available.handle;
        self.resources()?.swapchain.acquire_next_image(image_available)
    }

    fn reset_slot_fence(&mut self, slot: usize) -> Result<()> {
        self.slot(slot)?.in_flight.reset()
    }

    fn submit(&mut self, slot: usize, image_index: u32) -> Result<()> {
        let frame = self.slot(slot)?;
        let resources = self.resources()?;
        let Some(command_buffer) = resources.command_buffers.get(image_index) else {
            app_bail!(
                SOURCE,
                "Image index {} out of range ({} command buffers)",
                image_index,
                resources.command_buffers.len()
            );
        };

        let wait_semaphores = [frame.image_available.handle];
        let wait_stages = [vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT];
        let command_buffers = [command_buffer];
        let signal_semaphores = [frame.render_finished.handle];
        let submit_info = vk::SubmitInfo::default()
            .wait_semaphores(&wait_semaphores)
            .wait_dst_stage_mask(&wait_stages)
            .command_buffers(&command_buffers)
            .signal_semaphores(&signal_semaphores);

        unsafe {
            match self.ctx.device.queue_submit(
                self.ctx.graphics_queue,
                &[submit_info],
                frame.in_flight.handle,
            ) {
                Ok(()) => Ok(()),
                Err(vk::Result::ERROR_OUT_OF_HOST_MEMORY | vk::Result::ERROR_OUT_OF_DEVICE_MEMORY) => {
                    app_error!(SOURCE, "Out of memory while submitting draw commands");
                    Err(Error::OutOfMemory)
                }
                Err(e) => Err(app_err!(SOURCE, "Failed to submit draw command buffer: {:?}", e)),
            }
        }
    }

    fn present(&mut self, slot: usize, image_index: u32) -> Result<PresentOutcome> {
        let render_finished = self.slot(slot)?.render_finished.handle;
        self.resources()?
            .swapchain
            .present(self.ctx.present_queue, render_finished, image_index)
    }

    fn wait_idle(&mut self) -> Result<()> {
        self.ctx.wait_idle()
    }

    fn destroy_swapchain_resources(&mut self) {
        if self.resources.take().is_some() {
            app_debug!(SOURCE, "Swapchain resources destroyed");
        }
    }

    fn create_swapchain_resources(&mut self, extent: Extent) -> Result<()> {
        // Replacing live resources would destroy objects the GPU may still use
        if self.resources.is_some() {
            app_bail!(SOURCE, "Swapchain resources already exist; destroy them first");
        }

        let swapchain = Swapchain::new(Arc::clone(&self.ctx), extent, self.settings)?;
        let render_pass = RenderPass::new(Arc::clone(&self.ctx), swapchain.format())?;

        let pipeline = {
            let vertex_shader = ShaderModule::from_words(Arc::clone(&self.ctx), &self.vertex_spirv)?;
            let fragment_shader =
                ShaderModule::from_words(Arc::clone(&self.ctx), &self.fragment_spirv)?;
            Pipeline::new(
                Arc::clone(&self.ctx),
                &vertex_shader,
                &fragment_shader,
                render_pass.render_pass,
                swapchain.extent(),
            )?
        };

        let framebuffers = Framebuffers::new(
            Arc::clone(&self.ctx),
            render_pass.render_pass,
            &swapchain.image_views,
            swapchain.extent(),
        )?;

        let command_buffers = CommandBuffers::record(
            Arc::clone(&self.command_pool),
            &DrawRecording {
                render_pass: render_pass.render_pass,
                framebuffers: &framebuffers.framebuffers,
                extent: swapchain.extent(),
                pipeline: pipeline.pipeline,
                vertex_buffer: self.vertex_buffer.buffer,
                vertex_count: self.vertex_buffer.vertex_count(),
                clear_color: self.clear_color,
            },
        )?;

        self.resources = Some(SwapchainResources {
            command_buffers,
            framebuffers,
            pipeline,
            render_pass,
            swapchain,
        });
        Ok(())
    }
}

impl Drop for VulkanFrameDevice {
    fn drop(&mut self) {
        // No object below may be destroyed while the GPU still uses it
        if let Err(e) = self.ctx.wait_idle() {
            app_error!(SOURCE, "Device wait idle failed during shutdown: {}", e);
        }
    }
}
