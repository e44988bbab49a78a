/*!
# Hello Triangle

Core types for a minimal Vulkan triangle renderer.

The interesting part is the frame loop: the acquire → submit → present cycle
over N frame slots (fences and semaphores), and the swapchain rebuild that
runs when the surface goes stale or the window is resized. That logic lives
here, generic over the `FrameDevice` trait; the Vulkan implementation lives in
`hello_triangle_vulkan`.

## Architecture

- **FramePacer**: per-frame synchronization state machine
- **FrameDevice**: device operations the pacer sequences
- **ImagesInFlight**: image → frame slot bookkeeping
- **ResizeSignal**: resize notification from the window event handler
- **Config**: window, frame loop and validation settings
*/

pub mod error;
pub mod log;
pub mod config;
pub mod frame;
pub mod shader;
pub mod vertex;
pub mod window;

// Main triangle namespace module
pub mod triangle {
    // Error types
    pub use crate::error::{Error, Result};

    // Configuration
    pub use crate::config::{
        Config, DebugMessageFilter, DebugOutput, DebugSeverity, PresentModePreference,
        QueueSharingMode, ValidationStats,
    };

    // Logging sub-module (types and global logger functions; macros live at the crate root)
    pub mod log {
        pub use crate::log::{
            enabled, log, log_detailed, min_severity, reset_logger, set_logger,
            set_min_severity, DefaultLogger, LogEntry, LogSeverity, Logger,
        };
    }

    // Frame loop
    pub mod frame {
        pub use crate::frame::*;
    }

    pub use crate::shader::load_spirv;
    pub use crate::vertex::{Vertex, VertexAttribute, VertexFormat, TRIANGLE_VERTICES};
    pub use crate::window::{Extent, SurfaceSize};
}

// Re-export math library at crate root
pub use glam;
