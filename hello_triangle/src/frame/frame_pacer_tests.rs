//! Unit tests for frame_pacer.rs
//!
//! The mock device panics on synchronization mistakes (resetting a pending
//! fence, writing an image another slot is still writing, destroying the
//! swapchain with work outstanding), so every test that runs frames also
//! checks the protocol.

use crate::config::Config;
use crate::error::Error;
use crate::frame::frame_device::{AcquireOutcome, FrameDevice, PresentOutcome};
use crate::frame::frame_pacer::*;
use crate::frame::mock_frame_device::{DeviceCall, MockFrameDevice};
use crate::frame::resize::ResizeSignal;
use crate::log::{self, LogEntry, LogSeverity, Logger};
use crate::window::Extent;
use serial_test::serial;
use std::sync::{Arc, Mutex};

const WINDOW: Extent = Extent::new(800, 600);
const MINIMIZED: Extent = Extent::new(0, 0);

fn create_pacer(frames_in_flight: usize, image_count: usize) -> (FramePacer, MockFrameDevice) {
    let pacer = FramePacer::new(frames_in_flight, image_count, ResizeSignal::new(), u64::MAX).unwrap();
    (pacer, MockFrameDevice::new(frames_in_flight, image_count))
}

fn is_rebuild_call(call: &DeviceCall) -> bool {
    matches!(call, DeviceCall::WaitIdle | DeviceCall::Destroy | DeviceCall::Create(_))
}

// ============================================================================
// CREATION
// ============================================================================

#[test]
fn test_new_pacer_starts_idle_at_slot_zero() {
    let (pacer, _) = create_pacer(2, 3);
    assert_eq!(pacer.state(), FrameState::Idle);
    assert_eq!(pacer.frame_counter(), 0);
    assert_eq!(pacer.current_slot(), 0);
    assert_eq!(pacer.frames_in_flight(), 2);
    assert_eq!(pacer.images_in_flight().image_count(), 3);
    assert!(!pacer.is_rebuild_pending());
}

#[test]
fn test_zero_frames_in_flight_rejected() {
    let result = FramePacer::new(0, 3, ResizeSignal::new(), u64::MAX);
    assert!(matches!(result, Err(Error::InvalidConfig(_))));
}

#[test]
fn test_from_config() {
    let config = Config { frames_in_flight: 3, ..Config::default() };
    let pacer = FramePacer::from_config(&config, 4, ResizeSignal::new()).unwrap();
    assert_eq!(pacer.frames_in_flight(), 3);
    assert_eq!(pacer.images_in_flight().image_count(), 4);
}

// ============================================================================
// STEADY STATE
// ============================================================================

#[test]
fn test_single_frame_call_order() {
    let (mut pacer, mut device) = create_pacer(2, 3);

    let outcome = pacer.draw_frame(&mut device, &WINDOW).unwrap();

    assert_eq!(outcome, FrameOutcome::Presented);
    assert_eq!(
        device.calls,
        vec![
            DeviceCall::WaitForSlot(0),
            DeviceCall::Acquire(0),
            DeviceCall::ResetFence(0),
            DeviceCall::Submit { slot: 0, image: 0 },
            DeviceCall::Present { slot: 0, image: 0 },
        ]
    );
    assert_eq!(pacer.frame_counter(), 1);
    assert_eq!(pacer.current_slot(), 1);
    assert_eq!(pacer.state(), FrameState::Idle);
}

#[test]
fn test_slots_cycle_modulo_frames_in_flight() {
    let (mut pacer, mut device) = create_pacer(3, 3);

    for _ in 0..7 {
        pacer.draw_frame(&mut device, &WINDOW).unwrap();
    }

    let slots: Vec<usize> = device.submits().iter().map(|&(slot, _)| slot).collect();
    assert_eq!(slots, vec![0, 1, 2, 0, 1, 2, 0]);
    assert_eq!(pacer.frame_counter(), 7);
    assert_eq!(pacer.stats().frames_presented, 7);
}

#[test]
fn test_reset_immediately_precedes_submit() {
    let (mut pacer, mut device) = create_pacer(2, 3);
    for _ in 0..5 {
        pacer.draw_frame(&mut device, &WINDOW).unwrap();
    }
    for (i, call) in device.calls.iter().enumerate() {
        if let DeviceCall::Submit { slot, .. } = call {
            assert_eq!(device.calls[i - 1], DeviceCall::ResetFence(*slot));
        }
    }
}

#[test]
fn test_first_wait_per_slot_returns_immediately() {
    // Fences start signaled: the first N frames never find pending work
    let (mut pacer, mut device) = create_pacer(2, 3);
    pacer.draw_frame(&mut device, &WINDOW).unwrap();
    assert_eq!(device.pending_count(), 1);
    pacer.draw_frame(&mut device, &WINDOW).unwrap();
    assert_eq!(device.pending_count(), 2);
}

// ============================================================================
// THROTTLING
// ============================================================================

#[test]
fn test_never_more_than_n_frames_pending() {
    for frames_in_flight in 1..=4 {
        for image_count in 2..=5 {
            let (mut pacer, mut device) = create_pacer(frames_in_flight, image_count);
            for _ in 0..25 {
                pacer.draw_frame(&mut device, &WINDOW).unwrap();
                assert!(device.pending_count() <= frames_in_flight);
            }
            // Pending work is also bounded by the images it writes
            assert_eq!(device.max_pending, frames_in_flight.min(image_count));
        }
    }
}

#[test]
fn test_slot_reuse_waits_on_slot_fence() {
    let (mut pacer, mut device) = create_pacer(2, 3);
    for _ in 0..3 {
        pacer.draw_frame(&mut device, &WINDOW).unwrap();
    }
    // Third frame reuses slot 0: its wait happens after slot 0's first submit
    let first_submit = device
        .calls
        .iter()
        .position(|c| *c == DeviceCall::Submit { slot: 0, image: 0 })
        .unwrap();
    let second_wait = device
        .calls
        .iter()
        .enumerate()
        .filter(|(_, c)| **c == DeviceCall::WaitForSlot(0))
        .map(|(i, _)| i)
        .nth(1)
        .unwrap();
    assert!(second_wait > first_submit);
    assert!(!device.is_fence_signaled(0));
}

#[test]
fn test_fence_timeout_is_fatal() {
    let (mut pacer, mut device) = create_pacer(1, 2);
    device.hang_slot = Some(0);

    pacer.draw_frame(&mut device, &WINDOW).unwrap();
    let err = pacer.draw_frame(&mut device, &WINDOW).unwrap_err();

    assert!(matches!(err, Error::Timeout(_)));
    assert!(!err.is_setup_error());
    assert_eq!(pacer.state(), FrameState::Acquiring);
    assert_eq!(pacer.frame_counter(), 1);
}

// ============================================================================
// CROSS-FRAME HAZARD
// ============================================================================

#[test]
fn test_image_owned_by_other_slot_waits_that_slot() {
    let (mut pacer, mut device) = create_pacer(3, 3);
    device.acquire_script.extend([
        AcquireOutcome::Ready { image_index: 0, suboptimal: false },
        AcquireOutcome::Ready { image_index: 1, suboptimal: false },
        // Slot 2 gets image 0 while slot 0 is still writing it
        AcquireOutcome::Ready { image_index: 0, suboptimal: false },
    ]);

    for _ in 0..3 {
        pacer.draw_frame(&mut device, &WINDOW).unwrap();
    }

    let tail: Vec<DeviceCall> = device.calls[device.calls.len() - 5..].to_vec();
    assert_eq!(
        tail,
        vec![
            DeviceCall::Acquire(2),
            DeviceCall::WaitForSlot(0),
            DeviceCall::ResetFence(2),
            DeviceCall::Submit { slot: 2, image: 0 },
            DeviceCall::Present { slot: 2, image: 0 },
        ]
    );
    assert_eq!(pacer.images_in_flight().owner(0), Some(2));
}

#[test]
fn test_image_owned_by_same_slot_needs_no_extra_wait() {
    let (mut pacer, mut device) = create_pacer(1, 2);
    device.acquire_script.extend([
        AcquireOutcome::Ready { image_index: 1, suboptimal: false },
        AcquireOutcome::Ready { image_index: 1, suboptimal: false },
    ]);

    pacer.draw_frame(&mut device, &WINDOW).unwrap();
    pacer.draw_frame(&mut device, &WINDOW).unwrap();

    assert_eq!(device.count(|c| matches!(c, DeviceCall::WaitForSlot(_))), 2);
}

#[test]
fn test_out_of_range_image_index_is_fatal() {
    let (mut pacer, mut device) = create_pacer(2, 2);
    device.acquire_script.push_back(AcquireOutcome::Ready { image_index: 5, suboptimal: false });

    let err = pacer.draw_frame(&mut device, &WINDOW).unwrap_err();
    assert!(matches!(err, Error::BackendError(_)));
    assert_eq!(device.count(|c| matches!(c, DeviceCall::Submit { .. })), 0);
}

// ============================================================================
// STALENESS AT ACQUIRE
// ============================================================================

#[test]
fn test_out_of_date_acquire_rebuilds_without_submitting() {
    let (mut pacer, mut device) = create_pacer(2, 3);
    device.acquire_script.push_back(AcquireOutcome::OutOfDate);
    let window = Extent::new(1024, 768);

    let outcome = pacer.draw_frame(&mut device, &window).unwrap();

    assert_eq!(outcome, FrameOutcome::Rebuilt);
    assert_eq!(pacer.frame_counter(), 0);
    assert_eq!(device.count(|c| matches!(c, DeviceCall::Submit { .. })), 0);
    assert_eq!(device.count(|c| matches!(c, DeviceCall::Present { .. })), 0);
    assert_eq!(
        &device.calls[2..],
        &[DeviceCall::WaitIdle, DeviceCall::Destroy, DeviceCall::Create(window)]
    );
    assert_eq!(device.extent(), window);

    // The slot fence was never reset, so the retry does not deadlock
    assert_eq!(pacer.draw_frame(&mut device, &window).unwrap(), FrameOutcome::Presented);
    assert_eq!(device.submits(), vec![(0, 0)]);
}

#[test]
fn test_out_of_date_acquire_mid_run_keeps_counter_and_slot() {
    let (mut pacer, mut device) = create_pacer(2, 3);
    for _ in 0..5 {
        assert_eq!(pacer.draw_frame(&mut device, &WINDOW).unwrap(), FrameOutcome::Presented);
        assert!(pacer.images_in_flight().in_flight_count() <= 2);
    }

    device.acquire_script.push_back(AcquireOutcome::OutOfDate);
    assert_eq!(pacer.draw_frame(&mut device, &WINDOW).unwrap(), FrameOutcome::Rebuilt);
    assert_eq!(pacer.frame_counter(), 5);
    assert_eq!(pacer.current_slot(), 1);

    // The abandoned frame's slot is used by the retry
    assert_eq!(pacer.draw_frame(&mut device, &WINDOW).unwrap(), FrameOutcome::Presented);
    assert_eq!(device.submits().last().map(|s| s.0), Some(1));
    assert_eq!(pacer.frame_counter(), 6);
}

#[test]
fn test_suboptimal_acquire_proceeds() {
    let (mut pacer, mut device) = create_pacer(2, 3);
    device.acquire_script.push_back(AcquireOutcome::Ready { image_index: 2, suboptimal: true });

    let outcome = pacer.draw_frame(&mut device, &WINDOW).unwrap();

    assert_eq!(outcome, FrameOutcome::Presented);
    assert_eq!(device.submits(), vec![(0, 2)]);
    assert_eq!(device.count(is_rebuild_call), 0);
}

// ============================================================================
// STALENESS AT PRESENT
// ============================================================================

#[test]
fn test_suboptimal_present_rebuilds_after_frame() {
    let (mut pacer, mut device) = create_pacer(2, 3);
    device.present_script.push_back(PresentOutcome::Suboptimal);

    let outcome = pacer.draw_frame(&mut device, &WINDOW).unwrap();

    assert_eq!(outcome, FrameOutcome::PresentedAndRebuilt);
    assert_eq!(pacer.frame_counter(), 1);
    assert_eq!(pacer.stats().frames_presented, 1);
    assert_eq!(pacer.stats().rebuilds, 1);
    assert_eq!(device.calls.last(), Some(&DeviceCall::Create(WINDOW)));
}

#[test]
fn test_out_of_date_present_rebuilds_after_frame() {
    let (mut pacer, mut device) = create_pacer(2, 3);
    device.present_script.push_back(PresentOutcome::OutOfDate);

    let outcome = pacer.draw_frame(&mut device, &WINDOW).unwrap();

    assert_eq!(outcome, FrameOutcome::PresentedAndRebuilt);
    assert_eq!(pacer.frame_counter(), 1);
    assert_eq!(pacer.stats().frames_presented, 0);
    assert_eq!(pacer.stats().frames_submitted, 1);
}

#[test]
fn test_resize_signal_triggers_rebuild_and_is_cleared() {
    let resize = ResizeSignal::new();
    let mut pacer = FramePacer::new(2, 3, resize.clone(), u64::MAX).unwrap();
    let mut device = MockFrameDevice::new(2, 3);

    resize.signal();
    let outcome = pacer.draw_frame(&mut device, &WINDOW).unwrap();

    assert_eq!(outcome, FrameOutcome::PresentedAndRebuilt);
    assert!(!resize.is_set());

    let outcome = pacer.draw_frame(&mut device, &WINDOW).unwrap();
    assert_eq!(outcome, FrameOutcome::Presented);
    assert_eq!(pacer.stats().rebuilds, 1);
}

#[test]
fn test_rebuild_resets_images_in_flight_to_new_count() {
    let (mut pacer, mut device) = create_pacer(2, 3);
    device.image_count_script.push_back(4);
    device.present_script.push_back(PresentOutcome::Suboptimal);

    pacer.draw_frame(&mut device, &WINDOW).unwrap();

    assert_eq!(pacer.images_in_flight().image_count(), 4);
    assert_eq!(pacer.images_in_flight().in_flight_count(), 0);

    // Keeps working with the larger swapchain
    for _ in 0..10 {
        assert_eq!(pacer.draw_frame(&mut device, &WINDOW).unwrap(), FrameOutcome::Presented);
    }
    assert!(device.submits().iter().any(|&(_, image)| image == 3));
}

#[test]
fn test_rebuild_idles_before_destroying() {
    // The mock panics if resources are destroyed with work outstanding;
    // two frames leave both slots pending before the stale present.
    let (mut pacer, mut device) = create_pacer(2, 3);
    pacer.draw_frame(&mut device, &WINDOW).unwrap();
    device.present_script.push_back(PresentOutcome::OutOfDate);
    pacer.draw_frame(&mut device, &WINDOW).unwrap();

    let idle = device.calls.iter().position(|c| *c == DeviceCall::WaitIdle).unwrap();
    assert_eq!(device.calls[idle + 1], DeviceCall::Destroy);
    assert_eq!(device.pending_count(), 0);
}

// ============================================================================
// MINIMIZED WINDOW
// ============================================================================

#[test]
fn test_minimized_rebuild_is_deferred_without_touching_device() {
    let (mut pacer, mut device) = create_pacer(2, 3);
    device.present_script.push_back(PresentOutcome::Suboptimal);

    let outcome = pacer.draw_frame(&mut device, &MINIMIZED).unwrap();

    assert_eq!(outcome, FrameOutcome::Deferred);
    assert!(pacer.is_rebuild_pending());
    assert_eq!(device.count(is_rebuild_call), 0);
    assert_eq!(pacer.frame_counter(), 1);

    // Still minimized: nothing happens at all
    let calls_before = device.calls.len();
    assert_eq!(pacer.draw_frame(&mut device, &MINIMIZED).unwrap(), FrameOutcome::Deferred);
    assert_eq!(device.calls.len(), calls_before);
    assert_eq!(pacer.stats().deferred_rebuilds, 2);
}

#[test]
fn test_deferred_rebuild_runs_when_window_restored() {
    let (mut pacer, mut device) = create_pacer(2, 3);
    device.acquire_script.push_back(AcquireOutcome::OutOfDate);

    assert_eq!(pacer.draw_frame(&mut device, &MINIMIZED).unwrap(), FrameOutcome::Deferred);
    assert_eq!(pacer.state(), FrameState::Idle);

    let restored = Extent::new(640, 480);
    let outcome = pacer.draw_frame(&mut device, &restored).unwrap();

    assert_eq!(outcome, FrameOutcome::Presented);
    assert!(!pacer.is_rebuild_pending());
    assert_eq!(device.extent(), restored);
    assert_eq!(device.count(|c| *c == DeviceCall::Create(restored)), 1);
    assert_eq!(device.submits().len(), 1);
}

#[test]
fn test_request_rebuild_runs_at_next_frame() {
    let (mut pacer, mut device) = create_pacer(2, 3);
    pacer.request_rebuild();

    pacer.draw_frame(&mut device, &WINDOW).unwrap();

    assert_eq!(device.calls[0], DeviceCall::WaitIdle);
    assert_eq!(pacer.stats().rebuilds, 1);
}

#[test]
fn test_rebuild_with_explicit_extent() {
    let (mut pacer, mut device) = create_pacer(2, 3);
    let outcome = pacer.rebuild(&mut device, &Extent::new(300, 200)).unwrap();
    assert_eq!(outcome, RebuildOutcome::Rebuilt(Extent::new(300, 200)));

    let outcome = pacer.rebuild(&mut device, &Extent::new(300, 0)).unwrap();
    assert_eq!(outcome, RebuildOutcome::Deferred);
    assert!(pacer.is_rebuild_pending());
}

// ============================================================================
// FATAL ERRORS
// ============================================================================

#[test]
fn test_failed_recreate_is_fatal() {
    let (mut pacer, mut device) = create_pacer(2, 3);
    device.present_script.push_back(PresentOutcome::Suboptimal);
    device.fail_next_create = true;

    let err = pacer.draw_frame(&mut device, &WINDOW).unwrap_err();

    assert!(matches!(err, Error::BackendError(_)));
    assert_eq!(pacer.state(), FrameState::Rebuilding);
}

#[test]
fn test_failed_present_is_fatal() {
    let (mut pacer, mut device) = create_pacer(2, 3);
    device.fail_next_present = true;

    let err = pacer.draw_frame(&mut device, &WINDOW).unwrap_err();

    assert!(matches!(err, Error::BackendError(_)));
    assert_eq!(pacer.state(), FrameState::Presenting);
    assert_eq!(pacer.frame_counter(), 0);
}

// ============================================================================
// SHUTDOWN
// ============================================================================

#[test]
fn test_shutdown_idles_device() {
    let (mut pacer, mut device) = create_pacer(2, 3);
    for _ in 0..3 {
        pacer.draw_frame(&mut device, &WINDOW).unwrap();
    }
    assert!(device.pending_count() > 0);

    pacer.shutdown(&mut device).unwrap();

    assert_eq!(device.calls.last(), Some(&DeviceCall::WaitIdle));
    assert_eq!(device.pending_count(), 0);
    assert_eq!(pacer.state(), FrameState::Idle);
}

#[test]
fn test_draw_frame_through_trait_object() {
    let (mut pacer, mut device) = create_pacer(2, 3);
    let dyn_device: &mut dyn FrameDevice = &mut device;
    assert_eq!(pacer.draw_frame(dyn_device, &WINDOW).unwrap(), FrameOutcome::Presented);
}

// ============================================================================
// TRACE OUTPUT
// ============================================================================

/// Keeps every message logged while installed
struct CapturingLogger {
    messages: Arc<Mutex<Vec<String>>>,
}

impl Logger for CapturingLogger {
    fn log(&self, entry: &LogEntry) {
        self.messages.lock().unwrap().push(entry.message.clone());
    }
}

#[test]
#[serial]
fn test_frame_done_trace_reports_finished_frame_number() {
    let messages = Arc::new(Mutex::new(Vec::new()));
    let previous = log::min_severity();
    log::set_logger(CapturingLogger { messages: Arc::clone(&messages) });
    log::set_min_severity(LogSeverity::Trace);

    let (mut pacer, mut device) = create_pacer(2, 3);
    pacer.draw_frame(&mut device, &WINDOW).unwrap();

    log::set_min_severity(previous);
    log::reset_logger();

    let messages = messages.lock().unwrap();
    // Other tests may log concurrently, so only look for this frame's line
    assert!(messages.iter().any(|m| m.starts_with("Frame 0 done on slot 0 image 0")));
}
