//! Error types for Hello Triangle
//!
//! This module defines the error type shared by the frame pacer, the Vulkan
//! backend and the application. Presentation staleness (out-of-date or
//! suboptimal surface) is deliberately absent: it is an outcome handled by the
//! frame pacer, never an error.

use std::fmt;

/// Result type for Hello Triangle operations
pub type Result<T> = std::result::Result<T, Error>;

/// Hello Triangle errors
#[derive(Debug, Clone)]
pub enum Error {
    /// A one-time setup step failed (instance, device, swapchain, pipeline, ...)
    InitializationFailed(String),

    /// Configuration rejected by `Config::validate`
    InvalidConfig(String),

    /// Shader bytecode could not be read or is not SPIR-V
    ShaderLoad(String),

    /// Backend failure during the frame loop (acquire, submit, present, rebuild)
    BackendError(String),

    /// A fence wait exceeded its timeout
    Timeout(String),

    /// Out of host or device memory
    OutOfMemory,
}

impl Error {
    /// Whether this error belongs to the one-time setup phase
    ///
    /// Setup errors abort startup; every other variant aborts the frame loop.
    /// Both are fatal.
    pub fn is_setup_error(&self) -> bool {
        matches!(
            self,
            Error::InitializationFailed(_) | Error::InvalidConfig(_) | Error::ShaderLoad(_)
        )
    }

    /// Reclassify an error raised by a one-time setup step
    ///
    /// Helpers shared with the frame loop (swapchain resources, shader
    /// modules) report `BackendError`; during startup that failure is an
    /// `InitializationFailed`. Other variants keep their kind.
    pub fn during_setup(self) -> Self {
        match self {
            Error::BackendError(message) => Error::InitializationFailed(message),
            other => other,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InitializationFailed(msg) => write!(f, "Initialization failed: {}", msg),
            Error::InvalidConfig(msg) => write!(f, "Invalid configuration: {}", msg),
            Error::ShaderLoad(msg) => write!(f, "Shader load failed: {}", msg),
            Error::BackendError(msg) => write!(f, "Backend error: {}", msg),
            Error::Timeout(msg) => write!(f, "Timed out: {}", msg),
            Error::OutOfMemory => write!(f, "Out of memory"),
        }
    }
}

impl std::error::Error for Error {}

// ===== ERROR MACROS =====

/// Log an ERROR (with file:line) and build an `Error::BackendError` from the same message
///
/// # Example
///
/// ```ignore
/// device.queue_submit(queue, &[info], fence)
///     .map_err(|e| app_err!("triangle::vulkan", "Failed to submit draw commands: {:?}", e))?;
/// ```
#[macro_export]
macro_rules! app_err {
    ($source:expr, $($arg:tt)*) => {{
        let message = format!($($arg)*);
        $crate::log::log_detailed(
            $crate::log::LogSeverity::Error,
            $source,
            message.clone(),
            file!(),
            line!(),
        );
        $crate::error::Error::BackendError(message)
    }};
}

/// Log an ERROR and return early with `Err(Error::BackendError(..))`
#[macro_export]
macro_rules! app_bail {
    ($source:expr, $($arg:tt)*) => {
        return Err($crate::app_err!($source, $($arg)*))
    };
}

/// Log an ERROR and build an `Error::InitializationFailed` from the same message
#[macro_export]
macro_rules! app_init_err {
    ($source:expr, $($arg:tt)*) => {{
        let message = format!($($arg)*);
        $crate::log::log_detailed(
            $crate::log::LogSeverity::Error,
            $source,
            message.clone(),
            file!(),
            line!(),
        );
        $crate::error::Error::InitializationFailed(message)
    }};
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
