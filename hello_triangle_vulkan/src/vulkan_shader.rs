/// ShaderModule - SPIR-V module wrapper

use ash::vk;
use hello_triangle::triangle::Result;
use hello_triangle::app_err;
use std::sync::Arc;

use crate::vulkan_context::GpuContext;

const SOURCE: &str = "triangle::vulkan";

/// Vulkan shader module
///
/// Only needed while the pipeline is being created.
pub struct ShaderModule {
    ctx: Arc<GpuContext>,
    pub(crate) module: vk::ShaderModule,
}

impl ShaderModule {
    /// Create a module from SPIR-V words
    pub fn from_words(ctx: Arc<GpuContext>, words: &[u32]) -> Result<Self> {
        let create_info = vk::ShaderModuleCreateInfo::default().code(words);
        let module = unsafe {
            ctx.device
                .create_shader_module(&create_info, None)
                .map_err(|e| app_err!(SOURCE, "Failed to create shader module: {:?}", e))?
        };
        Ok(Self { ctx, module })
    }
}

impl Drop for ShaderModule {
    fn drop(&mut self) {
        unsafe {
            self.ctx.device.destroy_shader_module(self.module, None);
        }
    }
}
