/// Fences, semaphores and frame slots

use ash::vk;
use hello_triangle::triangle::{Error, Result};
use hello_triangle::{app_err, app_error};
use std::sync::Arc;

use crate::vulkan_context::GpuContext;

const SOURCE: &str = "triangle::vulkan";

/// Binary semaphore, destroyed on drop
pub struct Semaphore {
    ctx: Arc<GpuContext>,
    pub(crate) handle: vk::Semaphore,
}

impl Semaphore {
    pub fn new(ctx: Arc<GpuContext>) -> Result<Self> {
        let handle = unsafe {
            ctx.device
                .create_semaphore(&vk::SemaphoreCreateInfo::default(), None)
                .map_err(|e| {
                    app_error!(SOURCE, "Failed to create semaphore: {:?}", e);
                    Error::InitializationFailed(format!("Failed to create semaphore: {:?}", e))
                })?
        };
        Ok(Self { ctx, handle })
    }
}

impl Drop for Semaphore {
    fn drop(&mut self) {
        unsafe {
            self.ctx.device.destroy_semaphore(self.handle, None);
        }
    }
}

/// Fence, created signaled so the first wait returns immediately
pub struct Fence {
    ctx: Arc<GpuContext>,
    pub(crate) handle: vk::Fence,
}

impl Fence {
    pub fn new_signaled(ctx: Arc<GpuContext>) -> Result<Self> {
        let create_info = vk::FenceCreateInfo::default().flags(vk::FenceCreateFlags::SIGNALED);
        let handle = unsafe {
            ctx.device.create_fence(&create_info, None).map_err(|e| {
                app_error!(SOURCE, "Failed to create fence: {:?}", e);
                Error::InitializationFailed(format!("Failed to create fence: {:?}", e))
            })?
        };
        Ok(Self { ctx, handle })
    }

    /// Wait until signaled; `Error::Timeout` if `timeout_ns` elapses first
    pub fn wait(&self, timeout_ns: u64) -> Result<()> {
        unsafe {
            match self.ctx.device.wait_for_fences(&[self.handle], true, timeout_ns) {
                Ok(()) => Ok(()),
                Err(vk::Result::TIMEOUT) => {
                    app_error!(SOURCE, "Fence wait timed out after {} ns", timeout_ns);
                    Err(Error::Timeout(format!("fence wait exceeded {} ns", timeout_ns)))
                }
                Err(vk::Result::ERROR_OUT_OF_HOST_MEMORY | vk::Result::ERROR_OUT_OF_DEVICE_MEMORY) => {
                    Err(Error::OutOfMemory)
                }
                Err(e) => Err(app_err!(SOURCE, "Failed to wait for fence: {:?}", e)),
            }
        }
    }

    pub fn reset(&self) -> Result<()> {
        unsafe {
            self.ctx
                .device
                .reset_fences(&[self.handle])
                .map_err(|e| app_err!(SOURCE, "Failed to reset fence: {:?}", e))
        }
    }
}

impl Drop for Fence {
    fn drop(&mut self) {
        unsafe {
            self.ctx.device.destroy_fence(self.handle, None);
        }
    }
}

/// Synchronization objects of one frame in flight
pub struct FrameSlot {
    /// Signaled by acquire, waited by submit
    pub image_available: Semaphore,
    /// Signaled by submit, waited by present
    pub render_finished: Semaphore,
    /// Signaled when the slot's submission completes
    pub in_flight: Fence,
}

impl FrameSlot {
    pub fn new(ctx: &Arc<GpuContext>) -> Result<Self> {
        Ok(Self {
            image_available: Semaphore::new(Arc::clone(ctx))?,
            render_finished: Semaphore::new(Arc::clone(ctx))?,
            in_flight: Fence::new_signaled(Arc::clone(ctx))?,
        })
    }

    /// `count` slots
    pub fn create_slots(ctx: &Arc<GpuContext>, count: usize) -> Result<Vec<Self>> {
        (0..count).map(|_| Self::new(ctx)).collect()
    }
}
