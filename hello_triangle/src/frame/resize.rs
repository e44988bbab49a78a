/// Resize notification shared between the window event handler and the frame pacer

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Single-slot "the framebuffer was resized" flag
///
/// Clones share the same flag. Setting it twice before it is taken counts once.
#[derive(Debug, Clone, Default)]
pub struct ResizeSignal {
    flag: Arc<AtomicBool>,
}

impl ResizeSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that the window was resized
    pub fn signal(&self) {
        self.flag.store(true, Ordering::Release);
    }

    /// Read and clear the flag
    pub fn take(&self) -> bool {
        self.flag.swap(false, Ordering::AcqRel)
    }

    /// Read without clearing
    pub fn is_set(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }

    pub fn clear(&self) {
        self.flag.store(false, Ordering::Release);
    }
}
