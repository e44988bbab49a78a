//! Frame pacer: the acquire → submit → present cycle over N frame slots
//!
//! Each call to [`FramePacer::draw_frame`] runs one iteration:
//!
//! 1. wait for the current slot's fence (throttle to N frames in flight)
//! 2. acquire the next presentable image
//! 3. wait for whichever other slot is still writing that image
//! 4. reset the slot fence and submit the image's command buffer
//! 5. present, rebuilding the swapchain if it went stale or the window resized
//! 6. advance to the next slot
//!
//! Staleness never surfaces as an error. An out-of-date acquire abandons the
//! frame and rebuilds; a stale present rebuilds after the frame is handed off.
//! A rebuild against a minimized window (zero extent) is deferred until the
//! window has a non-zero size again.

use crate::config::Config;
use crate::error::{Error, Result};
use crate::frame::frame_device::{AcquireOutcome, FrameDevice, PresentOutcome};
use crate::frame::in_flight::ImagesInFlight;
use crate::frame::resize::ResizeSignal;
use crate::window::{Extent, SurfaceSize};

const SOURCE: &str = "triangle::frame";

/// Where the pacer is inside a frame iteration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameState {
    Idle,
    Acquiring,
    Submitting,
    Presenting,
    Rebuilding,
}

/// What one `draw_frame` call did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    /// A frame was submitted and presented
    Presented,
    /// A frame was submitted, then the swapchain was rebuilt
    PresentedAndRebuilt,
    /// The acquire was stale; no frame was submitted, the swapchain was rebuilt
    Rebuilt,
    /// A rebuild is needed but the window is minimized
    Deferred,
}

/// Result of a swapchain rebuild attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RebuildOutcome {
    /// Swapchain resources were recreated at this extent
    Rebuilt(Extent),
    /// The window reported a zero extent; nothing was touched
    Deferred,
}

/// Counters for diagnostics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub frames_submitted: u64,
    pub frames_presented: u64,
    pub rebuilds: u64,
    pub deferred_rebuilds: u64,
}

/// Drives a [`FrameDevice`] through the per-frame synchronization protocol
#[derive(Debug)]
pub struct FramePacer {
    frames_in_flight: usize,
    frame_counter: u64,
    images_in_flight: ImagesInFlight,
    resize: ResizeSignal,
    state: FrameState,
    rebuild_pending: bool,
    fence_timeout_ns: u64,
    stats: FrameStats,
}

impl FramePacer {
    /// Create a pacer for `frames_in_flight` slots over a swapchain of `image_count` images
    pub fn new(
        frames_in_flight: usize,
        image_count: usize,
        resize: ResizeSignal,
        fence_timeout_ns: u64,
    ) -> Result<Self> {
        if frames_in_flight == 0 {
            return Err(Error::InvalidConfig(
                "frames_in_flight must be at least 1".to_string(),
            ));
        }
        crate::app_debug!(
            SOURCE,
            "Frame pacer: {} frame slot(s), {} swapchain image(s)",
            frames_in_flight,
            image_count
        );
        Ok(Self {
            frames_in_flight,
            frame_counter: 0,
            images_in_flight: ImagesInFlight::new(image_count),
            resize,
            state: FrameState::Idle,
            rebuild_pending: false,
            fence_timeout_ns,
            stats: FrameStats::default(),
        })
    }

    /// Create a pacer from the frame settings of `config`
    pub fn from_config(config: &Config, image_count: usize, resize: ResizeSignal) -> Result<Self> {
        Self::new(
            config.frames_in_flight,
            image_count,
            resize,
            config.fence_timeout_ns,
        )
    }

    /// Run one frame iteration
    pub fn draw_frame<D, W>(&mut self, device: &mut D, window: &W) -> Result<FrameOutcome>
    where
        D: FrameDevice + ?Sized,
        W: SurfaceSize + ?Sized,
    {
        if self.rebuild_pending {
            if let RebuildOutcome::Deferred = self.rebuild(device, window)? {
                return Ok(FrameOutcome::Deferred);
            }
        }

        let slot = self.current_slot();

        // Throttle: at most N frames in flight
        self.state = FrameState::Acquiring;
        device.wait_for_slot(slot, self.fence_timeout_ns)?;

        let image_index = match device.acquire_next_image(slot)? {
            AcquireOutcome::Ready { image_index, suboptimal } => {
                if suboptimal {
                    crate::app_trace!(SOURCE, "Acquired suboptimal image {}", image_index);
                }
                image_index
            }
            AcquireOutcome::OutOfDate => {
                crate::app_debug!(SOURCE, "Swapchain out of date at acquire");
                return Ok(match self.rebuild(device, window)? {
                    RebuildOutcome::Rebuilt(_) => FrameOutcome::Rebuilt,
                    RebuildOutcome::Deferred => FrameOutcome::Deferred,
                });
            }
        };

        // Cross-frame hazard: another slot may still be writing this image
        if let Some(owner) = self.images_in_flight.hazard(image_index, slot) {
            crate::app_trace!(
                SOURCE,
                "Image {} still in flight on slot {}, waiting",
                image_index,
                owner
            );
            device.wait_for_slot(owner, self.fence_timeout_ns)?;
        }
        if !self.images_in_flight.mark(image_index, slot) {
            crate::app_bail!(
                SOURCE,
                "Acquired image index {} outside swapchain of {} images",
                image_index,
                self.images_in_flight.image_count()
            );
        }

        self.state = FrameState::Submitting;
        device.reset_slot_fence(slot)?;
        device.submit(slot, image_index)?;
        self.stats.frames_submitted += 1;

        self.state = FrameState::Presenting;
        let present = device.present(slot, image_index)?;
        if present != PresentOutcome::OutOfDate {
            self.stats.frames_presented += 1;
        }
        let resized = self.resize.take();
        let stale = matches!(present, PresentOutcome::Suboptimal | PresentOutcome::OutOfDate);

        let outcome = if stale || resized {
            crate::app_debug!(
                SOURCE,
                "Rebuild after present (outcome {:?}, resized {})",
                present,
                resized
            );
            match self.rebuild(device, window)? {
                RebuildOutcome::Rebuilt(_) => FrameOutcome::PresentedAndRebuilt,
                RebuildOutcome::Deferred => FrameOutcome::Deferred,
            }
        } else {
            FrameOutcome::Presented
        };

        crate::app_trace!(
            SOURCE,
            "Frame {} done on slot {} image {}: {:?}",
            self.frame_counter,
            slot,
            image_index,
            outcome
        );
        self.frame_counter += 1;
        self.state = FrameState::Idle;
        Ok(outcome)
    }

    /// Tear down and recreate every swapchain-dependent object
    ///
    /// Does nothing and returns `RebuildOutcome::Deferred` while the window
    /// has a zero extent; the rebuild stays pending for the next frame.
    pub fn rebuild<D, W>(&mut self, device: &mut D, window: &W) -> Result<RebuildOutcome>
    where
        D: FrameDevice + ?Sized,
        W: SurfaceSize + ?Sized,
    {
        self.state = FrameState::Rebuilding;

        let extent = window.framebuffer_extent();
        if extent.is_zero() {
            if !self.rebuild_pending {
                crate::app_debug!(SOURCE, "Window minimized, swapchain rebuild deferred");
            }
            self.rebuild_pending = true;
            self.stats.deferred_rebuilds += 1;
            self.state = FrameState::Idle;
            return Ok(RebuildOutcome::Deferred);
        }

        device.wait_idle()?;
        device.destroy_swapchain_resources();
        device.create_swapchain_resources(extent)?;

        // Every fence is signaled after the idle barrier
        self.resize.clear();
        self.images_in_flight.reset(device.image_count());
        self.rebuild_pending = false;
        self.stats.rebuilds += 1;
        self.state = FrameState::Idle;

        crate::app_info!(
            SOURCE,
            "Swapchain rebuilt: {}x{}, {} image(s)",
            extent.width,
            extent.height,
            self.images_in_flight.image_count()
        );
        Ok(RebuildOutcome::Rebuilt(extent))
    }

    /// Ask for a rebuild at the start of the next frame
    pub fn request_rebuild(&mut self) {
        self.rebuild_pending = true;
    }

    /// Final idle barrier before the device and its objects are dropped
    pub fn shutdown<D>(&mut self, device: &mut D) -> Result<()>
    where
        D: FrameDevice + ?Sized,
    {
        device.wait_idle()?;
        self.state = FrameState::Idle;
        crate::app_info!(
            SOURCE,
            "Frame loop stopped after {} frame(s), {} rebuild(s)",
            self.frame_counter,
            self.stats.rebuilds
        );
        Ok(())
    }

    // ===== ACCESSORS =====

    /// Slot used by the next frame (`frame_counter mod N`)
    pub fn current_slot(&self) -> usize {
        (self.frame_counter % self.frames_in_flight as u64) as usize
    }

    pub fn frame_counter(&self) -> u64 {
        self.frame_counter
    }

    pub fn frames_in_flight(&self) -> usize {
        self.frames_in_flight
    }

    pub fn state(&self) -> FrameState {
        self.state
    }

    pub fn is_rebuild_pending(&self) -> bool {
        self.rebuild_pending
    }

    pub fn images_in_flight(&self) -> &ImagesInFlight {
        &self.images_in_flight
    }

    pub fn resize_signal(&self) -> &ResizeSignal {
        &self.resize
    }

    pub fn stats(&self) -> FrameStats {
        self.stats
    }
}

#[cfg(test)]
#[path = "frame_pacer_tests.rs"]
mod tests;
