/// GpuContext - instance, surface, device and allocator shared by every Vulkan object
///
/// Every RAII wrapper in this crate holds an `Arc<GpuContext>`, so the device
/// outlives all objects created from it. Dropping the last reference tears
/// down in reverse creation order: allocator, device, surface, debug
/// messenger, instance.

use ash::vk;
use gpu_allocator::vulkan::{Allocator, AllocatorCreateDesc};
use hello_triangle::triangle::{Config, Error, Result};
use hello_triangle::{app_debug, app_error, app_info, app_warn};
use raw_window_handle::{HasDisplayHandle, HasWindowHandle};
use std::ffi::CStr;
use std::mem::ManuallyDrop;
use std::sync::Mutex;

use crate::debug;
use crate::vulkan_selection::{find_queue_families, supports_extensions, QueueFamilyIndices};

const SOURCE: &str = "triangle::vulkan";

const VALIDATION_LAYER: &CStr = c"VK_LAYER_KHRONOS_validation";

/// Shared GPU context for all Vulkan resources
pub struct GpuContext {
    /// Vulkan loader entry (kept alive for the instance's lifetime)
    _entry: ash::Entry,
    pub instance: ash::Instance,

    debug_utils_loader: Option<ash::ext::debug_utils::Instance>,
    debug_messenger: Option<vk::DebugUtilsMessengerEXT>,

    pub surface_loader: ash::khr::surface::Instance,
    pub surface: vk::SurfaceKHR,

    pub physical_device: vk::PhysicalDevice,
    pub device: ash::Device,
    pub swapchain_loader: ash::khr::swapchain::Device,

    pub queue_families: QueueFamilyIndices,
    pub graphics_queue: vk::Queue,
    pub present_queue: vk::Queue,

    /// GPU memory allocator
    /// Wrapped in ManuallyDrop so it is dropped BEFORE the device is destroyed
    pub allocator: ManuallyDrop<Mutex<Allocator>>,
}

impl GpuContext {
    /// Create instance, surface, device and allocator for `window`
    pub fn new<W: HasDisplayHandle + HasWindowHandle>(window: &W, config: &Config) -> Result<Self> {
        unsafe {
            let entry = ash::Entry::load().map_err(|e| {
                app_error!(SOURCE, "Failed to load Vulkan library: {:?}", e);
                Error::InitializationFailed(format!("Failed to load Vulkan library: {:?}", e))
            })?;

            if config.enable_validation && !validation_layer_available(&entry)? {
                app_error!(SOURCE, "Validation layers requested, but not available");
                return Err(Error::InitializationFailed(
                    "validation layers requested, but not available".to_string(),
                ));
            }

            // Instance
            let app_name = std::ffi::CString::new(config.app_name.as_str()).map_err(|e| {
                Error::InvalidConfig(format!("app_name contains a NUL byte: {}", e))
            })?;
            let app_info = vk::ApplicationInfo::default()
                .application_name(&app_name)
                .application_version(vk::make_api_version(0, 1, 0, 0))
                .engine_name(c"No Engine")
                .engine_version(vk::make_api_version(0, 1, 0, 0))
                .api_version(vk::API_VERSION_1_0);

            let display_handle = window.display_handle().map_err(|e| {
                app_error!(SOURCE, "Failed to get display handle: {}", e);
                Error::InitializationFailed(format!("Failed to get display handle: {}", e))
            })?;
            let mut extension_names = ash_window::enumerate_required_extensions(display_handle.as_raw())
                .map_err(|e| {
                    app_error!(SOURCE, "Failed to get required extensions: {}", e);
                    Error::InitializationFailed(format!("Failed to get required extensions: {}", e))
                })?
                .to_vec();
            if config.enable_validation {
                extension_names.push(ash::ext::debug_utils::NAME.as_ptr());
            }

            let layer_names = if config.enable_validation {
                vec![VALIDATION_LAYER.as_ptr()]
            } else {
                vec![]
            };

            let create_info = vk::InstanceCreateInfo::default()
                .application_info(&app_info)
                .enabled_layer_names(&layer_names)
                .enabled_extension_names(&extension_names);

            let instance = entry.create_instance(&create_info, None).map_err(|e| {
                app_error!(SOURCE, "Failed to create Vulkan instance: {:?}", e);
                Error::InitializationFailed(format!("Failed to create instance: {:?}", e))
            })?;

            // From here on, every early return must release what was created.
            // `Partial` destroys the handles it holds unless disarmed.
            let mut partial = Partial::new(&instance);

            // Debug messenger
            let (debug_utils_loader, debug_messenger) = if config.enable_validation {
                let debug_utils = ash::ext::debug_utils::Instance::new(&entry, &instance);

                debug::init_debug_config(debug::DebugConfig {
                    severity: config.debug_severity,
                    output: config.debug_output.clone(),
                    message_filter: config.debug_message_filter,
                    panic_on_error: config.panic_on_validation_error,
                    enable_stats: config.enable_validation_stats,
                });

                let debug_info = vk::DebugUtilsMessengerCreateInfoEXT::default()
                    .message_severity(debug::severity_flags(config.debug_severity))
                    .message_type(debug::message_type_flags(&config.debug_message_filter))
                    .pfn_user_callback(Some(debug::vulkan_debug_callback));

                let messenger = debug_utils
                    .create_debug_utils_messenger(&debug_info, None)
                    .map_err(|e| {
                        app_error!(SOURCE, "Failed to create debug messenger: {:?}", e);
                        Error::InitializationFailed(format!("Failed to create debug messenger: {:?}", e))
                    })?;
                partial.messenger = Some((debug_utils.clone(), messenger));
                (Some(debug_utils), Some(messenger))
            } else {
                (None, None)
            };

            // Surface
            let window_handle = window.window_handle().map_err(|e| {
                app_error!(SOURCE, "Failed to get window handle: {}", e);
                Error::InitializationFailed(format!("Failed to get window handle: {}", e))
            })?;
            let surface = ash_window::create_surface(
                &entry,
                &instance,
                display_handle.as_raw(),
                window_handle.as_raw(),
                None,
            )
            .map_err(|e| {
                app_error!(SOURCE, "Failed to create surface: {:?}", e);
                Error::InitializationFailed(format!("Failed to create surface: {:?}", e))
            })?;
            let surface_loader = ash::khr::surface::Instance::new(&entry, &instance);
            partial.surface = Some((surface_loader.clone(), surface));

            // Physical device
            let (physical_device, queue_families) =
                pick_physical_device(&instance, &surface_loader, surface)?;

            let properties = instance.get_physical_device_properties(physical_device);
            let device_name = properties
                .device_name_as_c_str()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|_| "<unknown>".to_string());
            app_info!(
                SOURCE,
                "Using GPU '{}' (graphics family {}, present family {})",
                device_name,
                queue_families.graphics,
                queue_families.present
            );

            // Logical device, one queue per unique family
            let queue_priorities = [1.0];
            let queue_create_infos: Vec<vk::DeviceQueueCreateInfo> = queue_families
                .unique()
                .into_iter()
                .map(|family| {
                    vk::DeviceQueueCreateInfo::default()
                        .queue_family_index(family)
                        .queue_priorities(&queue_priorities)
                })
                .collect();

            let device_extension_names = [ash::khr::swapchain::NAME.as_ptr()];
            let device_features = vk::PhysicalDeviceFeatures::default();

            let device_create_info = vk::DeviceCreateInfo::default()
                .queue_create_infos(&queue_create_infos)
                .enabled_extension_names(&device_extension_names)
                .enabled_features(&device_features);

            let device = instance
                .create_device(physical_device, &device_create_info, None)
                .map_err(|e| {
                    app_error!(SOURCE, "Failed to create logical device: {:?}", e);
                    Error::InitializationFailed(format!("Failed to create device: {:?}", e))
                })?;
            partial.device = Some(device.clone());

            let graphics_queue = device.get_device_queue(queue_families.graphics, 0);
            let present_queue = device.get_device_queue(queue_families.present, 0);
            let swapchain_loader = ash::khr::swapchain::Device::new(&instance, &device);

            let allocator = Allocator::new(&AllocatorCreateDesc {
                instance: instance.clone(),
                device: device.clone(),
                physical_device,
                debug_settings: Default::default(),
                buffer_device_address: false,
                allocation_sizes: Default::default(),
            })
            .map_err(|e| {
                app_error!(SOURCE, "Failed to create GPU allocator: {:?}", e);
                Error::InitializationFailed(format!("Failed to create allocator: {:?}", e))
            })?;

            partial.disarm();
            drop(partial);
            app_debug!(SOURCE, "GPU context created");

            Ok(Self {
                _entry: entry,
                instance,
                debug_utils_loader,
                debug_messenger,
                surface_loader,
                surface,
                physical_device,
                device,
                swapchain_loader,
                queue_families,
                graphics_queue,
                present_queue,
                allocator: ManuallyDrop::new(Mutex::new(allocator)),
            })
        }
    }

    /// Block until the device has no outstanding work
    pub fn wait_idle(&self) -> Result<()> {
        unsafe {
            self.device
                .device_wait_idle()
                .map_err(|e| hello_triangle::app_err!(SOURCE, "Failed to wait for device idle: {:?}", e))
        }
    }
}

impl Drop for GpuContext {
    fn drop(&mut self) {
        unsafe {
            self.device.device_wait_idle().ok();

            // Free VkDeviceMemory pages BEFORE destroying the device
            ManuallyDrop::drop(&mut self.allocator);

            self.device.destroy_device(None);
            self.surface_loader.destroy_surface(self.surface, None);

            // Stop routing callbacks before the messenger goes away
            debug::cleanup_debug_config();
            if let (Some(debug_utils), Some(messenger)) =
                (&self.debug_utils_loader, self.debug_messenger)
            {
                debug_utils.destroy_debug_utils_messenger(messenger, None);
            }

            self.instance.destroy_instance(None);
        }
        app_debug!(SOURCE, "GPU context destroyed");
    }
}

/// Handles created so far during `GpuContext::new`, destroyed on early return
struct Partial<'a> {
    instance: &'a ash::Instance,
    messenger: Option<(ash::ext::debug_utils::Instance, vk::DebugUtilsMessengerEXT)>,
    surface: Option<(ash::khr::surface::Instance, vk::SurfaceKHR)>,
    device: Option<ash::Device>,
    armed: bool,
}

impl<'a> Partial<'a> {
    fn new(instance: &'a ash::Instance) -> Self {
        Self {
            instance,
            messenger: None,
            surface: None,
            device: None,
            armed: true,
        }
    }

    fn disarm(&mut self) {
        self.armed = false;
    }
}

impl Drop for Partial<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        unsafe {
            if let Some(device) = self.device.take() {
                device.destroy_device(None);
            }
            if let Some((loader, surface)) = self.surface.take() {
                loader.destroy_surface(surface, None);
            }
            if let Some((loader, messenger)) = self.messenger.take() {
                debug::cleanup_debug_config();
                loader.destroy_debug_utils_messenger(messenger, None);
            }
            self.instance.destroy_instance(None);
        }
    }
}

unsafe fn validation_layer_available(entry: &ash::Entry) -> Result<bool> {
    let layers = entry.enumerate_instance_layer_properties().map_err(|e| {
        app_error!(SOURCE, "Failed to enumerate instance layers: {:?}", e);
        Error::InitializationFailed(format!("Failed to enumerate instance layers: {:?}", e))
    })?;
    Ok(layers
        .iter()
        .any(|layer| layer.layer_name_as_c_str().map(|n| n == VALIDATION_LAYER).unwrap_or(false)))
}

/// First device with graphics + present queues, swapchain support and a usable surface
unsafe fn pick_physical_device(
    instance: &ash::Instance,
    surface_loader: &ash::khr::surface::Instance,
    surface: vk::SurfaceKHR,
) -> Result<(vk::PhysicalDevice, QueueFamilyIndices)> {
    let physical_devices = instance.enumerate_physical_devices().map_err(|e| {
        app_error!(SOURCE, "Failed to enumerate physical devices: {:?}", e);
        Error::InitializationFailed(format!("Failed to enumerate physical devices: {:?}", e))
    })?;

    if physical_devices.is_empty() {
        app_error!(SOURCE, "Failed to find GPUs with Vulkan support");
        return Err(Error::InitializationFailed(
            "failed to find GPUs with Vulkan support".to_string(),
        ));
    }

    for physical_device in physical_devices {
        let families = instance.get_physical_device_queue_family_properties(physical_device);
        let Some(indices) = find_queue_families(&families, |i| {
            surface_loader
                .get_physical_device_surface_support(physical_device, i, surface)
                .unwrap_or(false)
        }) else {
            continue;
        };

        let extensions = instance
            .enumerate_device_extension_properties(physical_device)
            .unwrap_or_default();
        if !supports_extensions(&extensions, &[ash::khr::swapchain::NAME]) {
            continue;
        }

        let formats = surface_loader
            .get_physical_device_surface_formats(physical_device, surface)
            .unwrap_or_default();
        let present_modes = surface_loader
            .get_physical_device_surface_present_modes(physical_device, surface)
            .unwrap_or_default();
        if formats.is_empty() || present_modes.is_empty() {
            app_warn!(SOURCE, "Skipping GPU without surface formats or present modes");
            continue;
        }

        return Ok((physical_device, indices));
    }

    app_error!(SOURCE, "Failed to find a suitable GPU");
    Err(Error::InitializationFailed("failed to find a suitable GPU".to_string()))
}
