/// FrameDevice trait - the device operations the frame pacer sequences

use crate::error::Result;
use crate::window::Extent;

/// Result of asking the presentation engine for the next image
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcquireOutcome {
    /// An image was acquired; `suboptimal` means it can still be used
    Ready { image_index: u32, suboptimal: bool },
    /// The swapchain no longer matches the surface and must be rebuilt
    OutOfDate,
}

/// Result of handing an image back to the presentation engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresentOutcome {
    Presented,
    /// Presented, but the swapchain no longer matches the surface exactly
    Suboptimal,
    /// Not presented, the swapchain must be rebuilt
    OutOfDate,
}

/// Per-frame device operations, indexed by frame slot
///
/// A slot owns one image-available semaphore, one render-finished semaphore
/// and one in-flight fence. Fences start signaled.
///
/// Staleness of the swapchain is reported through `AcquireOutcome` and
/// `PresentOutcome`; the `Err` path is reserved for fatal failures.
pub trait FrameDevice {
    /// Number of presentable images in the current swapchain
    fn image_count(&self) -> usize;

    /// Block until the slot's fence is signaled
    ///
    /// Returns `Error::Timeout` if `timeout_ns` elapses first.
    fn wait_for_slot(&mut self, slot: usize, timeout_ns: u64) -> Result<()>;

    /// Acquire the next presentable image, signaling the slot's image-available semaphore
    fn acquire_next_image(&mut self, slot: usize) -> Result<AcquireOutcome>;

    /// Return the slot's fence to the unsignaled state
    fn reset_slot_fence(&mut self, slot: usize) -> Result<()>;

    /// Submit the pre-recorded commands of `image_index`
    ///
    /// Waits the slot's image-available semaphore at the color-attachment-output
    /// stage, signals its render-finished semaphore and its fence.
    fn submit(&mut self, slot: usize, image_index: u32) -> Result<()>;

    /// Queue `image_index` for presentation after the slot's render-finished semaphore
    fn present(&mut self, slot: usize, image_index: u32) -> Result<PresentOutcome>;

    /// Block until the device has no outstanding work
    fn wait_idle(&mut self) -> Result<()>;

    /// Destroy every object that depends on the swapchain
    fn destroy_swapchain_resources(&mut self);

    /// Create the swapchain and everything that depends on it for `extent`
    fn create_swapchain_resources(&mut self, extent: Extent) -> Result<()>;
}
