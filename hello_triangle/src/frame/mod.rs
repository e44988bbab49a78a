/// Frame module - per-frame synchronization and swapchain rebuild

pub mod frame_device;
pub mod frame_pacer;
pub mod in_flight;
pub mod resize;

pub use frame_device::*;
pub use frame_pacer::*;
pub use in_flight::*;
pub use resize::*;

// Mock frame device for tests (no GPU required)
#[cfg(test)]
pub mod mock_frame_device;
