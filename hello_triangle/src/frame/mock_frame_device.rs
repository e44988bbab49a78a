/// Mock FrameDevice for unit tests (no GPU required)
///
/// Simulates the GPU side of the frame protocol closely enough to catch
/// synchronization mistakes:
/// - a submission keeps its slot fence pending until that fence is waited
///   (or the device is idled)
/// - resetting a pending fence panics
/// - submitting without resetting the slot fence panics
/// - submitting an image that another pending slot is still writing panics
/// - acquiring into a slot whose image-available semaphore is still unconsumed panics
/// - destroying swapchain resources while work is outstanding panics
///
/// Acquire and present results can be scripted; otherwise images are handed
/// out round-robin and every present succeeds.

use std::collections::VecDeque;

use crate::error::{Error, Result};
use crate::frame::frame_device::{AcquireOutcome, FrameDevice, PresentOutcome};
use crate::window::Extent;

/// One recorded call on the mock device
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceCall {
    WaitForSlot(usize),
    Acquire(usize),
    ResetFence(usize),
    Submit { slot: usize, image: u32 },
    Present { slot: usize, image: u32 },
    WaitIdle,
    Destroy,
    Create(Extent),
}

#[derive(Debug, Clone, Copy)]
struct MockSlot {
    fence_signaled: bool,
    fence_pending: bool,
    image_available: bool,
}

#[derive(Debug)]
pub struct MockFrameDevice {
    slots: Vec<MockSlot>,
    image_count: usize,
    next_image: u32,
    /// Slot whose pending submission is writing each image
    image_writers: Vec<Option<usize>>,
    resources_alive: bool,
    extent: Extent,

    pub acquire_script: VecDeque<AcquireOutcome>,
    pub present_script: VecDeque<PresentOutcome>,
    /// Image counts handed out by successive `create_swapchain_resources` calls
    pub image_count_script: VecDeque<usize>,
    /// Waiting on this slot while it is pending times out
    pub hang_slot: Option<usize>,
    /// Make the next `create_swapchain_resources` fail
    pub fail_next_create: bool,
    /// Make the next `present` fail fatally
    pub fail_next_present: bool,

    pub calls: Vec<DeviceCall>,
    pub max_pending: usize,
}

impl MockFrameDevice {
    pub fn new(frame_slots: usize, image_count: usize) -> Self {
        Self {
            slots: vec![
                MockSlot {
                    fence_signaled: true,
                    fence_pending: false,
                    image_available: false,
                };
                frame_slots
            ],
            image_count,
            next_image: 0,
            image_writers: vec![None; image_count],
            resources_alive: true,
            extent: Extent::new(800, 600),
            acquire_script: VecDeque::new(),
            present_script: VecDeque::new(),
            image_count_script: VecDeque::new(),
            hang_slot: None,
            fail_next_create: false,
            fail_next_present: false,
            calls: Vec::new(),
            max_pending: 0,
        }
    }

    pub fn extent(&self) -> Extent {
        self.extent
    }

    pub fn pending_count(&self) -> usize {
        self.slots.iter().filter(|s| s.fence_pending).count()
    }

    pub fn is_fence_signaled(&self, slot: usize) -> bool {
        self.slots[slot].fence_signaled
    }

    pub fn count(&self, pred: impl Fn(&DeviceCall) -> bool) -> usize {
        self.calls.iter().filter(|c| pred(c)).count()
    }

    pub fn submits(&self) -> Vec<(usize, u32)> {
        self.calls
            .iter()
            .filter_map(|c| match *c {
                DeviceCall::Submit { slot, image } => Some((slot, image)),
                _ => None,
            })
            .collect()
    }

    fn complete(&mut self, slot: usize) {
        let s = &mut self.slots[slot];
        s.fence_pending = false;
        s.fence_signaled = true;
        for writer in self.image_writers.iter_mut() {
            if *writer == Some(slot) {
                *writer = None;
            }
        }
    }
}

impl FrameDevice for MockFrameDevice {
    fn image_count(&self) -> usize {
        self.image_count
    }

    fn wait_for_slot(&mut self, slot: usize, _timeout_ns: u64) -> Result<()> {
        self.calls.push(DeviceCall::WaitForSlot(slot));
        if self.hang_slot == Some(slot) && self.slots[slot].fence_pending {
            return Err(Error::Timeout(format!("slot {} fence", slot)));
        }
        if self.slots[slot].fence_pending {
            self.complete(slot);
        }
        assert!(
            self.slots[slot].fence_signaled,
            "waited on unsignaled fence of slot {} with no work pending (deadlock)",
            slot
        );
        Ok(())
    }

    fn acquire_next_image(&mut self, slot: usize) -> Result<AcquireOutcome> {
        self.calls.push(DeviceCall::Acquire(slot));
        assert!(self.resources_alive, "acquire without swapchain");
        assert!(
            !self.slots[slot].image_available,
            "image-available semaphore of slot {} signaled twice",
            slot
        );
        let outcome = match self.acquire_script.pop_front() {
            Some(outcome) => outcome,
            None => {
                let image_index = self.next_image;
                self.next_image = (self.next_image + 1) % self.image_count as u32;
                AcquireOutcome::Ready { image_index, suboptimal: false }
            }
        };
        if let AcquireOutcome::Ready { .. } = outcome {
            self.slots[slot].image_available = true;
        }
        Ok(outcome)
    }

    fn reset_slot_fence(&mut self, slot: usize) -> Result<()> {
        self.calls.push(DeviceCall::ResetFence(slot));
        assert!(
            !self.slots[slot].fence_pending,
            "reset of slot {} fence while its work is pending",
            slot
        );
        self.slots[slot].fence_signaled = false;
        Ok(())
    }

    fn submit(&mut self, slot: usize, image_index: u32) -> Result<()> {
        self.calls.push(DeviceCall::Submit { slot, image: image_index });
        assert!(self.resources_alive, "submit without swapchain");
        let s = self.slots[slot];
        assert!(!s.fence_signaled, "submit on slot {} without fence reset", slot);
        assert!(!s.fence_pending, "submit on slot {} with work pending", slot);
        assert!(s.image_available, "submit on slot {} without acquired image", slot);
        if let Some(writer) = self.image_writers[image_index as usize] {
            panic!(
                "image {} submitted on slot {} while slot {} is still writing it",
                image_index, slot, writer
            );
        }
        self.slots[slot].image_available = false;
        self.slots[slot].fence_pending = true;
        self.image_writers[image_index as usize] = Some(slot);
        self.max_pending = self.max_pending.max(self.pending_count());
        Ok(())
    }

    fn present(&mut self, slot: usize, image_index: u32) -> Result<PresentOutcome> {
        self.calls.push(DeviceCall::Present { slot, image: image_index });
        assert!(self.resources_alive, "present without swapchain");
        if self.fail_next_present {
            self.fail_next_present = false;
            return Err(Error::BackendError("ERROR_DEVICE_LOST".to_string()));
        }
        Ok(self.present_script.pop_front().unwrap_or(PresentOutcome::Presented))
    }

    fn wait_idle(&mut self) -> Result<()> {
        self.calls.push(DeviceCall::WaitIdle);
        for slot in 0..self.slots.len() {
            if self.slots[slot].fence_pending {
                self.complete(slot);
            }
        }
        Ok(())
    }

    fn destroy_swapchain_resources(&mut self) {
        self.calls.push(DeviceCall::Destroy);
        assert_eq!(
            self.pending_count(),
            0,
            "swapchain resources destroyed while work is outstanding"
        );
        self.resources_alive = false;
    }

    fn create_swapchain_resources(&mut self, extent: Extent) -> Result<()> {
        self.calls.push(DeviceCall::Create(extent));
        assert!(!self.resources_alive, "swapchain created twice");
        if self.fail_next_create {
            self.fail_next_create = false;
            return Err(Error::BackendError("Failed to create swapchain".to_string()));
        }
        if let Some(count) = self.image_count_script.pop_front() {
            self.image_count = count;
        }
        self.image_writers = vec![None; self.image_count];
        self.next_image = 0;
        self.extent = extent;
        self.resources_alive = true;
        Ok(())
    }
}
