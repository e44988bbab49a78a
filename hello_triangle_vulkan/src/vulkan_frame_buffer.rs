/// Framebuffers - one per swapchain image view
///
/// Recreated with the swapchain; index `i` wraps image view `i`.

use ash::vk;
use hello_triangle::triangle::Result;
use hello_triangle::app_err;
use std::sync::Arc;

use crate::vulkan_context::GpuContext;

const SOURCE: &str = "triangle::vulkan";

/// Vulkan framebuffers, destroyed when dropped
pub struct Framebuffers {
    ctx: Arc<GpuContext>,
    pub(crate) framebuffers: Vec<vk::Framebuffer>,
}

impl Framebuffers {
    pub fn new(
        ctx: Arc<GpuContext>,
        render_pass: vk::RenderPass,
        image_views: &[vk::ImageView],
        extent: vk::Extent2D,
    ) -> Result<Self> {
        let mut this = Self {
            ctx,
            framebuffers: Vec::with_capacity(image_views.len()),
        };

        for view in image_views {
            let create_info = vk::FramebufferCreateInfo::default()
                .render_pass(render_pass)
                .attachments(std::slice::from_ref(view))
                .width(extent.width)
                .height(extent.height)
                .layers(1);

            let framebuffer = unsafe {
                this.ctx
                    .device
                    .create_framebuffer(&create_info, None)
                    .map_err(|e| app_err!(SOURCE, "Failed to create framebuffer: {:?}", e))?
            };
            this.framebuffers.push(framebuffer);
        }

        Ok(this)
    }

    pub fn len(&self) -> usize {
        self.framebuffers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.framebuffers.is_empty()
    }
}

impl Drop for Framebuffers {
    fn drop(&mut self) {
        unsafe {
            for &framebuffer in &self.framebuffers {
                self.ctx.device.destroy_framebuffer(framebuffer, None);
            }
        }
    }
}
