//! Application configuration
//!
//! Plain data with a `Default` and a `validate` pass. Everything the frame
//! loop and the Vulkan backend need to know up front lives here.

use crate::error::{Error, Result};
use crate::log::LogSeverity;
use std::path::PathBuf;

/// Queue sharing mode for swapchain images
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueSharingMode {
    /// Concurrent when graphics and present families differ, exclusive otherwise
    Auto,
    /// Always exclusive (ownership transfers are not performed)
    Exclusive,
    /// Always concurrent across the graphics and present families
    Concurrent,
}

/// Preferred presentation mode
///
/// FIFO is always available and is used whenever the preference is missing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresentModePreference {
    /// Low-latency triple buffering, fall back to FIFO
    Mailbox,
    /// V-synced queue
    Fifo,
}

/// Validation message severity filter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebugSeverity {
    /// Only errors
    ErrorsOnly,
    /// Errors and warnings
    ErrorsAndWarnings,
    /// Everything, including info and verbose
    All,
}

/// Where validation messages are written
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DebugOutput {
    /// stderr, colored
    Console,
    /// Append to a file, uncolored
    File(String),
    /// Both console and file
    Both(String),
}

/// Validation message category filter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DebugMessageFilter {
    pub show_general: bool,
    pub show_validation: bool,
    pub show_performance: bool,
}

impl Default for DebugMessageFilter {
    fn default() -> Self {
        Self {
            show_general: true,
            show_validation: true,
            show_performance: true,
        }
    }
}

/// Counters of validation messages seen by the debug messenger
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ValidationStats {
    pub errors: u32,
    pub warnings: u32,
    pub info: u32,
    pub verbose: u32,
}

impl ValidationStats {
    pub fn total(&self) -> u32 {
        self.errors + self.warnings + self.info + self.verbose
    }

    pub fn has_errors(&self) -> bool {
        self.errors > 0
    }
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Window title
    pub window_title: String,
    /// Initial window width (logical pixels)
    pub window_width: u32,
    /// Initial window height (logical pixels)
    pub window_height: u32,
    /// Application name reported to the driver
    pub app_name: String,

    /// Number of frame slots (N). Must be at least 1.
    pub frames_in_flight: usize,
    /// Sharing mode of swapchain images
    pub sharing_mode: QueueSharingMode,
    /// Preferred present mode
    pub present_mode: PresentModePreference,
    /// Timeout of each fence wait in nanoseconds (`u64::MAX` waits forever)
    pub fence_timeout_ns: u64,
    /// Clear color (RGBA)
    pub clear_color: [f32; 4],

    /// SPIR-V vertex shader
    pub vertex_shader_path: PathBuf,
    /// SPIR-V fragment shader
    pub fragment_shader_path: PathBuf,

    /// Minimum severity forwarded to the logger
    pub log_level: LogSeverity,

    /// Enable VK_LAYER_KHRONOS_validation and the debug messenger
    pub enable_validation: bool,
    pub debug_severity: DebugSeverity,
    pub debug_output: DebugOutput,
    pub debug_message_filter: DebugMessageFilter,
    /// Panic inside the messenger callback on a validation error
    ///
    /// The callback is `extern "system"`, so the panic cannot unwind into the
    /// driver and aborts the process instead.
    pub panic_on_validation_error: bool,
    /// Count validation messages (see `ValidationStats`)
    pub enable_validation_stats: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            window_title: "Vulkan".to_string(),
            window_width: 800,
            window_height: 600,
            app_name: "Hello Triangle".to_string(),
            frames_in_flight: 2,
            sharing_mode: QueueSharingMode::Auto,
            present_mode: PresentModePreference::Mailbox,
            fence_timeout_ns: u64::MAX,
            clear_color: [0.0, 0.0, 0.0, 1.0],
            vertex_shader_path: PathBuf::from("shaders/triangle.vert.spv"),
            fragment_shader_path: PathBuf::from("shaders/triangle.frag.spv"),
            log_level: if cfg!(debug_assertions) {
                LogSeverity::Debug
            } else {
                LogSeverity::Info
            },
            enable_validation: cfg!(debug_assertions),
            debug_severity: DebugSeverity::ErrorsAndWarnings,
            debug_output: DebugOutput::Console,
            debug_message_filter: DebugMessageFilter::default(),
            panic_on_validation_error: false,
            enable_validation_stats: true,
        }
    }
}

impl Config {
    /// Reject values the frame loop cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.frames_in_flight == 0 {
            return Err(Error::InvalidConfig(
                "frames_in_flight must be at least 1".to_string(),
            ));
        }
        if self.window_width == 0 || self.window_height == 0 {
            return Err(Error::InvalidConfig(format!(
                "initial window size must be non-zero (got {}x{})",
                self.window_width, self.window_height
            )));
        }
        if self.fence_timeout_ns == 0 {
            return Err(Error::InvalidConfig(
                "fence_timeout_ns must be non-zero".to_string(),
            ));
        }
        if self.clear_color.iter().any(|c| !c.is_finite()) {
            return Err(Error::InvalidConfig(
                "clear_color components must be finite".to_string(),
            ));
        }
        match &self.debug_output {
            DebugOutput::File(path) | DebugOutput::Both(path) if path.is_empty() => {
                return Err(Error::InvalidConfig(
                    "debug_output file path is empty".to_string(),
                ));
            }
            _ => {}
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
