//! Hello Triangle
//!
//! Opens one window and draws a colored triangle until the window is closed.
//! The frame pacer drives acquire/submit/present over the configured number
//! of frames in flight and rebuilds the swapchain on resize.

use hello_triangle::frame::{FrameDevice, FrameOutcome, FramePacer, ResizeSignal};
use hello_triangle::triangle::log;
use hello_triangle::triangle::{Config, Error, Result};
use hello_triangle::{app_debug, app_error, app_info};
use hello_triangle_vulkan::{print_validation_stats_report, VulkanFrameDevice};
use std::path::Path;
use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowId};

const SOURCE: &str = "triangle::app";

/// Application state
///
/// Field order is drop order: the device goes before the window it renders to.
struct App {
    pacer: Option<FramePacer>,
    device: Option<VulkanFrameDevice>,
    window: Option<Window>,

    config: Config,
    resize: ResizeSignal,
    /// First fatal error; the event loop exits when it is set
    error: Option<Error>,
}

impl App {
    fn new(config: Config) -> Self {
        Self {
            pacer: None,
            device: None,
            window: None,
            config,
            resize: ResizeSignal::new(),
            error: None,
        }
    }

    fn init(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let attributes = Window::default_attributes()
            .with_title(self.config.window_title.as_str())
            .with_inner_size(LogicalSize::new(self.config.window_width, self.config.window_height));
        let window = event_loop.create_window(attributes).map_err(|e| {
            app_error!(SOURCE, "Failed to create window: {}", e);
            Error::InitializationFailed(format!("Failed to create window: {}", e))
        })?;

        let device = VulkanFrameDevice::new(&window, &self.config)?;
        let pacer = FramePacer::from_config(&self.config, device.image_count(), self.resize.clone())?;

        window.request_redraw();
        self.window = Some(window);
        self.device = Some(device);
        self.pacer = Some(pacer);
        Ok(())
    }

    fn redraw(&mut self) -> Result<()> {
        let (Some(pacer), Some(device), Some(window)) =
            (self.pacer.as_mut(), self.device.as_mut(), self.window.as_ref())
        else {
            return Ok(());
        };

        match pacer.draw_frame(device, window)? {
            // Minimized: wait for a non-zero Resized event instead of spinning
            FrameOutcome::Deferred => {}
            _ => window.request_redraw(),
        }
        Ok(())
    }

    fn shutdown(&mut self) -> Result<()> {
        if let (Some(pacer), Some(device)) = (self.pacer.as_mut(), self.device.as_mut()) {
            pacer.shutdown(device)?;
            let stats = pacer.stats();
            app_info!(
                SOURCE,
                "Shutting down after {} frames ({} presented, {} swapchain rebuilds)",
                pacer.frame_counter(),
                stats.frames_presented,
                stats.rebuilds
            );
        }
        if self.config.enable_validation && self.config.enable_validation_stats {
            print_validation_stats_report();
        }
        Ok(())
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, error: Error) {
        if self.error.is_none() {
            self.error = Some(error);
        }
        event_loop.exit();
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        if let Err(e) = self.init(event_loop) {
            self.fail(event_loop, e);
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                if let Err(e) = self.shutdown() {
                    self.fail(event_loop, e);
                    return;
                }
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                app_debug!(SOURCE, "Window resized to {}x{}", size.width, size.height);
                self.resize.signal();
                if size.width > 0 && size.height > 0 {
                    if let Some(window) = self.window.as_ref() {
                        window.request_redraw();
                    }
                }
            }
            WindowEvent::RedrawRequested => {
                if let Err(e) = self.redraw() {
                    self.fail(event_loop, e);
                }
            }
            _ => {}
        }
    }
}

fn run(config: Config) -> Result<()> {
    let event_loop = EventLoop::new().map_err(|e| {
        app_error!(SOURCE, "Failed to create event loop: {}", e);
        Error::InitializationFailed(format!("Failed to create event loop: {}", e))
    })?;
    event_loop.set_control_flow(ControlFlow::Wait);

    let mut app = App::new(config);
    let result = event_loop
        .run_app(&mut app)
        .map_err(|e| Error::BackendError(format!("Event loop failed: {}", e)));

    let error = app.error.take();
    // Device before window, both before the event loop
    drop(app);

    match error {
        Some(e) => Err(e),
        None => result,
    }
}

fn main() {
    let shaders = Path::new(env!("CARGO_MANIFEST_DIR")).join("shaders");
    let config = Config {
        vertex_shader_path: shaders.join("triangle.vert.spv"),
        fragment_shader_path: shaders.join("triangle.frag.spv"),
        ..Config::default()
    };
    log::set_min_severity(config.log_level);

    if let Err(e) = run(config) {
        // The default logger writes errors to stderr
        app_error!(SOURCE, "{}: {}", failure_phase(&e), e);
        std::process::exit(1);
    }
}

/// Which phase a fatal error ended
fn failure_phase(error: &Error) -> &'static str {
    if error.is_setup_error() {
        "Startup failed"
    } else {
        "Frame loop failed"
    }
}

#[cfg(test)]
#[path = "main_tests.rs"]
mod tests;
