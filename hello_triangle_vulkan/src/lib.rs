/*!
# Hello Triangle - Vulkan backend

Vulkan implementation of `hello_triangle::frame::FrameDevice`.

Uses `ash` for the Vulkan bindings, `ash-window` for surface creation and
`gpu-allocator` for the vertex buffer memory. Every Vulkan object is an RAII
wrapper holding an `Arc<GpuContext>`, so the device is destroyed last.

```no_run
use hello_triangle::frame::{FramePacer, FrameDevice, ResizeSignal};
use hello_triangle::triangle::Config;
use hello_triangle_vulkan::VulkanFrameDevice;
# fn run(window: &winit::window::Window) -> hello_triangle::triangle::Result<()> {
let config = Config::default();
let mut device = VulkanFrameDevice::new(window, &config)?;
let mut pacer = FramePacer::from_config(&config, device.image_count(), ResizeSignal::new())?;
pacer.draw_frame(&mut device, window)?;
pacer.shutdown(&mut device)?;
# Ok(())
# }
```
*/

mod debug;
mod vulkan_buffer;
mod vulkan_command_list;
mod vulkan_context;
mod vulkan_frame_buffer;
mod vulkan_frame_device;
mod vulkan_pipeline;
mod vulkan_render_pass;
mod vulkan_selection;
mod vulkan_shader;
mod vulkan_swapchain;
mod vulkan_sync;

pub use vulkan_context::GpuContext;
pub use vulkan_frame_device::VulkanFrameDevice;
pub use vulkan_selection::QueueFamilyIndices;
pub use vulkan_swapchain::{Swapchain, SwapchainSettings};
pub use vulkan_sync::{Fence, FrameSlot, Semaphore};

// Re-export debug utilities
pub use debug::{get_validation_stats, print_validation_stats_report};
