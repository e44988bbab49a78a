//! Window size query used by the swapchain rebuild

/// Framebuffer size in physical pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Extent {
    pub width: u32,
    pub height: u32,
}

impl Extent {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// A minimized window reports a zero dimension
    pub fn is_zero(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Anything that can report its current framebuffer size
pub trait SurfaceSize {
    fn framebuffer_extent(&self) -> Extent;
}

impl SurfaceSize for winit::window::Window {
    fn framebuffer_extent(&self) -> Extent {
        let size = self.inner_size();
        Extent::new(size.width, size.height)
    }
}

impl SurfaceSize for Extent {
    fn framebuffer_extent(&self) -> Extent {
        *self
    }
}
