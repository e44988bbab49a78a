//! Unit tests for main.rs
//!
//! Only the error reporting is testable without a window.

use super::failure_phase;
use hello_triangle::triangle::Error;

#[test]
fn test_setup_errors_report_startup() {
    assert_eq!(failure_phase(&Error::InitializationFailed("no GPU".to_string())), "Startup failed");
    assert_eq!(failure_phase(&Error::ShaderLoad("missing".to_string())), "Startup failed");
    assert_eq!(failure_phase(&Error::InvalidConfig("frames".to_string())), "Startup failed");
}

#[test]
fn test_reclassified_backend_error_reports_startup() {
    let err = Error::BackendError("Failed to create pipeline".to_string()).during_setup();
    assert_eq!(failure_phase(&err), "Startup failed");
}

#[test]
fn test_runtime_errors_report_frame_loop() {
    assert_eq!(failure_phase(&Error::BackendError("submit".to_string())), "Frame loop failed");
    assert_eq!(failure_phase(&Error::Timeout("fence".to_string())), "Frame loop failed");
    assert_eq!(failure_phase(&Error::OutOfMemory), "Frame loop failed");
}
