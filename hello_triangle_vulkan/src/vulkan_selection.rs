/// Pure selection helpers for device, queue family and swapchain parameters
///
/// Everything here works on plain property structs so it can be tested
/// without a GPU.

use ash::vk;
use hello_triangle::triangle::{Extent, PresentModePreference, QueueSharingMode, VertexFormat};

/// Queue family indices used by the device
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueFamilyIndices {
    pub graphics: u32,
    pub present: u32,
}

impl QueueFamilyIndices {
    /// Distinct family indices (one queue is created per entry)
    pub fn unique(&self) -> Vec<u32> {
        if self.graphics == self.present {
            vec![self.graphics]
        } else {
            vec![self.graphics, self.present]
        }
    }
}

/// Find a graphics family and a present family
///
/// Prefers a single family that supports both.
pub fn find_queue_families(
    families: &[vk::QueueFamilyProperties],
    supports_present: impl Fn(u32) -> bool,
) -> Option<QueueFamilyIndices> {
    let is_graphics = |props: &vk::QueueFamilyProperties| {
        props.queue_count > 0 && props.queue_flags.contains(vk::QueueFlags::GRAPHICS)
    };
    let present: Vec<bool> = (0..families.len() as u32).map(&supports_present).collect();

    if let Some(both) = (0..families.len()).find(|&i| is_graphics(&families[i]) && present[i]) {
        return Some(QueueFamilyIndices {
            graphics: both as u32,
            present: both as u32,
        });
    }

    let graphics = (0..families.len()).find(|&i| is_graphics(&families[i]))?;
    let present = present.iter().position(|&p| p)?;
    Some(QueueFamilyIndices {
        graphics: graphics as u32,
        present: present as u32,
    })
}

/// Whether the device exposes every extension in `required`
pub fn supports_extensions(available: &[vk::ExtensionProperties], required: &[&std::ffi::CStr]) -> bool {
    required.iter().all(|name| {
        available
            .iter()
            .any(|ext| ext.extension_name_as_c_str().map(|n| n == *name).unwrap_or(false))
    })
}

/// B8G8R8A8_SRGB with sRGB non-linear color space, else the first format offered
pub fn choose_surface_format(formats: &[vk::SurfaceFormatKHR]) -> Option<vk::SurfaceFormatKHR> {
    formats
        .iter()
        .find(|f| {
            f.format == vk::Format::B8G8R8A8_SRGB
                && f.color_space == vk::ColorSpaceKHR::SRGB_NONLINEAR
        })
        .or_else(|| formats.first())
        .copied()
}

/// Preferred present mode if offered, FIFO otherwise (always supported)
pub fn choose_present_mode(
    modes: &[vk::PresentModeKHR],
    preference: PresentModePreference,
) -> vk::PresentModeKHR {
    let wanted = match preference {
        PresentModePreference::Mailbox => vk::PresentModeKHR::MAILBOX,
        PresentModePreference::Fifo => vk::PresentModeKHR::FIFO,
    };
    if modes.contains(&wanted) {
        wanted
    } else {
        vk::PresentModeKHR::FIFO
    }
}

/// Surface extent, or the window size clamped to the surface limits when the
/// surface leaves it to the swapchain (`current_extent.width == u32::MAX`)
pub fn choose_extent(capabilities: &vk::SurfaceCapabilitiesKHR, window: Extent) -> vk::Extent2D {
    if capabilities.current_extent.width != u32::MAX {
        return capabilities.current_extent;
    }
    vk::Extent2D {
        width: window.width.clamp(
            capabilities.min_image_extent.width,
            capabilities.max_image_extent.width,
        ),
        height: window.height.clamp(
            capabilities.min_image_extent.height,
            capabilities.max_image_extent.height,
        ),
    }
}

/// One more than the minimum, capped by the maximum (0 means unbounded)
pub fn choose_image_count(capabilities: &vk::SurfaceCapabilitiesKHR) -> u32 {
    let count = capabilities.min_image_count + 1;
    if capabilities.max_image_count > 0 {
        count.min(capabilities.max_image_count)
    } else {
        count
    }
}

/// Sharing mode and the family indices to list with it
///
/// The index list is empty for exclusive sharing.
pub fn choose_sharing_mode(
    mode: QueueSharingMode,
    families: QueueFamilyIndices,
) -> (vk::SharingMode, Vec<u32>) {
    let distinct = families.graphics != families.present;
    let concurrent = match mode {
        QueueSharingMode::Auto => distinct,
        QueueSharingMode::Exclusive => false,
        // Concurrent sharing needs at least two distinct families
        QueueSharingMode::Concurrent => distinct,
    };
    if concurrent {
        (vk::SharingMode::CONCURRENT, families.unique())
    } else {
        (vk::SharingMode::EXCLUSIVE, Vec::new())
    }
}

/// Vulkan format of a vertex attribute
pub fn vertex_format_to_vk(format: VertexFormat) -> vk::Format {
    match format {
        VertexFormat::R32G32_SFLOAT => vk::Format::R32G32_SFLOAT,
        VertexFormat::R32G32B32_SFLOAT => vk::Format::R32G32B32_SFLOAT,
    }
}

#[cfg(test)]
#[path = "vulkan_selection_tests.rs"]
mod tests;
