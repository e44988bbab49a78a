/// Image → frame slot bookkeeping for cross-frame hazards

/// Which frame slot last submitted work writing each presentable image
///
/// A slot is recorded against at most one image at a time, so at most N
/// entries are `Some` for N frame slots.
#[derive(Debug, Clone, Default)]
pub struct ImagesInFlight {
    owners: Vec<Option<usize>>,
}

impl ImagesInFlight {
    /// One empty entry per presentable image
    pub fn new(image_count: usize) -> Self {
        Self {
            owners: vec![None; image_count],
        }
    }

    /// Forget every entry and resize to `image_count`
    pub fn reset(&mut self, image_count: usize) {
        self.owners.clear();
        self.owners.resize(image_count, None);
    }

    pub fn image_count(&self) -> usize {
        self.owners.len()
    }

    /// Slot that last wrote `image_index`, if any
    pub fn owner(&self, image_index: u32) -> Option<usize> {
        self.owners.get(image_index as usize).copied().flatten()
    }

    /// Slot whose fence must be waited before `slot` may write `image_index`
    ///
    /// `None` when the image is free or already owned by `slot` (whose fence
    /// the throttle step has just waited).
    pub fn hazard(&self, image_index: u32, slot: usize) -> Option<usize> {
        self.owner(image_index).filter(|&owner| owner != slot)
    }

    /// Record `slot` as the writer of `image_index`
    ///
    /// Any other image still attributed to `slot` is released. Returns `false`
    /// if the index is outside the current image count.
    pub fn mark(&mut self, image_index: u32, slot: usize) -> bool {
        let index = image_index as usize;
        if index >= self.owners.len() {
            return false;
        }
        for owner in self.owners.iter_mut() {
            if *owner == Some(slot) {
                *owner = None;
            }
        }
        self.owners[index] = Some(slot);
        true
    }

    /// Number of images currently attributed to a slot
    pub fn in_flight_count(&self) -> usize {
        self.owners.iter().filter(|o| o.is_some()).count()
    }
}

#[cfg(test)]
#[path = "in_flight_tests.rs"]
mod tests;
