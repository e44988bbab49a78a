/// Swapchain - presentable images and their views
///
/// Replaced as a whole on rebuild: the frame device drops the old one (after
/// an idle barrier) and creates a new one for the current window extent.

use ash::vk;
use hello_triangle::frame::{AcquireOutcome, PresentOutcome};
use hello_triangle::triangle::{Error, Extent, PresentModePreference, QueueSharingMode, Result};
use hello_triangle::{app_debug, app_err, app_error, app_warn};
use std::sync::Arc;

use crate::vulkan_context::GpuContext;
use crate::vulkan_selection::{
    choose_extent, choose_image_count, choose_present_mode, choose_sharing_mode,
    choose_surface_format,
};

const SOURCE: &str = "triangle::vulkan";

/// Swapchain creation preferences
#[derive(Debug, Clone, Copy)]
pub struct SwapchainSettings {
    pub present_mode: PresentModePreference,
    pub sharing_mode: QueueSharingMode,
}

/// Vulkan swapchain with one image view per image
pub struct Swapchain {
    ctx: Arc<GpuContext>,
    pub(crate) swapchain: vk::SwapchainKHR,
    pub(crate) images: Vec<vk::Image>,
    pub(crate) image_views: Vec<vk::ImageView>,
    pub(crate) format: vk::Format,
    pub(crate) present_mode: vk::PresentModeKHR,
    pub(crate) extent: vk::Extent2D,
}

impl Swapchain {
    /// Create a swapchain sized for `window_extent`
    ///
    /// Surface capabilities, formats and present modes are queried fresh.
    pub fn new(ctx: Arc<GpuContext>, window_extent: Extent, settings: SwapchainSettings) -> Result<Self> {
        unsafe {
            let capabilities = ctx
                .surface_loader
                .get_physical_device_surface_capabilities(ctx.physical_device, ctx.surface)
                .map_err(|e| {
                    app_error!(SOURCE, "Failed to get surface capabilities: {:?}", e);
                    Error::InitializationFailed(format!("Failed to get surface capabilities: {:?}", e))
                })?;
            let formats = ctx
                .surface_loader
                .get_physical_device_surface_formats(ctx.physical_device, ctx.surface)
                .map_err(|e| {
                    app_error!(SOURCE, "Failed to query surface formats: {:?}", e);
                    Error::InitializationFailed(format!("Failed to get surface formats: {:?}", e))
                })?;
            let present_modes = ctx
                .surface_loader
                .get_physical_device_surface_present_modes(ctx.physical_device, ctx.surface)
                .map_err(|e| {
                    app_error!(SOURCE, "Failed to query present modes: {:?}", e);
                    Error::InitializationFailed(format!("Failed to get present modes: {:?}", e))
                })?;

            let surface_format = choose_surface_format(&formats).ok_or_else(|| {
                app_error!(SOURCE, "Surface offers no formats");
                Error::InitializationFailed("surface offers no formats".to_string())
            })?;
            let present_mode = choose_present_mode(&present_modes, settings.present_mode);
            let extent = choose_extent(&capabilities, window_extent);
            let min_image_count = choose_image_count(&capabilities);

            let (sharing_mode, family_indices) =
                choose_sharing_mode(settings.sharing_mode, ctx.queue_families);
            if sharing_mode == vk::SharingMode::EXCLUSIVE
                && ctx.queue_families.graphics != ctx.queue_families.present
            {
                app_warn!(
                    SOURCE,
                    "Exclusive sharing across distinct graphics/present families without ownership transfer"
                );
            }

            let create_info = vk::SwapchainCreateInfoKHR::default()
                .surface(ctx.surface)
                .min_image_count(min_image_count)
                .image_format(surface_format.format)
                .image_color_space(surface_format.color_space)
                .image_extent(extent)
                .image_array_layers(1)
                .image_usage(vk::ImageUsageFlags::COLOR_ATTACHMENT)
                .image_sharing_mode(sharing_mode)
                .queue_family_indices(&family_indices)
                .pre_transform(capabilities.current_transform)
                .composite_alpha(vk::CompositeAlphaFlagsKHR::OPAQUE)
                .present_mode(present_mode)
                .clipped(true);

            let swapchain = ctx
                .swapchain_loader
                .create_swapchain(&create_info, None)
                .map_err(|e| {
                    app_error!(SOURCE, "Failed to create swapchain: {:?}", e);
                    Error::InitializationFailed(format!("Failed to create swapchain: {:?}", e))
                })?;

            // Owned from here on: Drop cleans up whatever views were created
            let mut this = Self {
                ctx,
                swapchain,
                images: Vec::new(),
                image_views: Vec::new(),
                format: surface_format.format,
                present_mode,
                extent,
            };

            this.images = this
                .ctx
                .swapchain_loader
                .get_swapchain_images(swapchain)
                .map_err(|e| {
                    app_error!(SOURCE, "Failed to get swapchain images: {:?}", e);
                    Error::InitializationFailed(format!("Failed to get swapchain images: {:?}", e))
                })?;

            for &image in &this.images {
                let create_info = vk::ImageViewCreateInfo::default()
                    .image(image)
                    .view_type(vk::ImageViewType::TYPE_2D)
                    .format(this.format)
                    .components(vk::ComponentMapping {
                        r: vk::ComponentSwizzle::IDENTITY,
                        g: vk::ComponentSwizzle::IDENTITY,
                        b: vk::ComponentSwizzle::IDENTITY,
                        a: vk::ComponentSwizzle::IDENTITY,
                    })
                    .subresource_range(vk::ImageSubresourceRange {
                        aspect_mask: vk::ImageAspectFlags::COLOR,
                        base_mip_level: 0,
                        level_count: 1,
                        base_array_layer: 0,
                        layer_count: 1,
                    });
                let view = this
                    .ctx
                    .device
                    .create_image_view(&create_info, None)
                    .map_err(|e| {
                        app_error!(SOURCE, "Failed to create swapchain image view: {:?}", e);
                        Error::InitializationFailed(format!("Failed to create image view: {:?}", e))
                    })?;
                this.image_views.push(view);
            }

            app_debug!(
                SOURCE,
                "Swapchain created: {}x{}, {} images, {:?}, {:?}",
                extent.width,
                extent.height,
                this.images.len(),
                this.format,
                present_mode
            );
            Ok(this)
        }
    }

    pub fn image_count(&self) -> usize {
        self.images.len()
    }

    pub fn extent(&self) -> vk::Extent2D {
        self.extent
    }

    pub fn format(&self) -> vk::Format {
        self.format
    }

    pub fn present_mode(&self) -> vk::PresentModeKHR {
        self.present_mode
    }

    /// Acquire the next image, signaling `image_available`
    pub fn acquire_next_image(&self, image_available: vk::Semaphore) -> Result<AcquireOutcome> {
        unsafe {
            match self.ctx.swapchain_loader.acquire_next_image(
                self.swapchain,
                u64::MAX,
                image_available,
                vk::Fence::null(),
            ) {
                Ok((image_index, suboptimal)) => Ok(AcquireOutcome::Ready { image_index, suboptimal }),
                Err(vk::Result::ERROR_OUT_OF_DATE_KHR) => Ok(AcquireOutcome::OutOfDate),
                Err(vk::Result::ERROR_OUT_OF_HOST_MEMORY | vk::Result::ERROR_OUT_OF_DEVICE_MEMORY) => {
                    Err(Error::OutOfMemory)
                }
                Err(e) => Err(app_err!(SOURCE, "Failed to acquire swapchain image: {:?}", e)),
            }
        }
    }

    /// Queue `image_index` for presentation after `render_finished`
    pub fn present(
        &self,
        queue: vk::Queue,
        render_finished: vk::Semaphore,
        image_index: u32,
    ) -> Result<PresentOutcome> {
        let wait_semaphores = [render_finished];
        let swapchains = [self.swapchain];
        let image_indices = [image_index];
        let present_info = vk::PresentInfoKHR::default()
            .wait_semaphores(&wait_semaphores)
            .swapchains(&swapchains)
            .image_indices(&image_indices);

        unsafe {
            match self.ctx.swapchain_loader.queue_present(queue, &present_info) {
                Ok(false) => Ok(PresentOutcome::Presented),
                Ok(true) => Ok(PresentOutcome::Suboptimal),
                Err(vk::Result::ERROR_OUT_OF_DATE_KHR) => Ok(PresentOutcome::OutOfDate),
                Err(vk::Result::ERROR_OUT_OF_HOST_MEMORY | vk::Result::ERROR_OUT_OF_DEVICE_MEMORY) => {
                    Err(Error::OutOfMemory)
                }
                Err(e) => Err(app_err!(SOURCE, "Failed to present swapchain image: {:?}", e)),
            }
        }
    }
}

impl Drop for Swapchain {
    fn drop(&mut self) {
        unsafe {
            for &view in &self.image_views {
                self.ctx.device.destroy_image_view(view, None);
            }
            self.ctx.swapchain_loader.destroy_swapchain(self.swapchain, None);
        }
    }
}
