// SPDX-License-Identifier: CEPL-1.0
use std::borrow::Cow;
use std::ffi::{c_void, CStr, CString};
use std::os::raw::c_char;

use ash::ext::debug_utils;
use ash::khr::{surface, swapchain};
use ash::prelude::VkResult;
use ash::{vk, Entry};
use raw_window_handle::{RawDisplayHandle, RawWindowHandle};

use crate::diagnostics::MessengerConfig;
use crate::driver::{
    DeviceDescriptor, DeviceDriver, DeviceProperties, Driver, InstanceDescriptor, InstanceDriver,
};
use crate::error::BootstrapError;
use crate::image_view::color_view_info;
use crate::swapchain::SwapchainConfig;

unsafe extern "system" fn vulkan_debug_callback(
    severity: vk::DebugUtilsMessageSeverityFlagsEXT,
    _types: vk::DebugUtilsMessageTypeFlagsEXT,
    data: *const vk::DebugUtilsMessengerCallbackDataEXT<'_>,
    user: *mut c_void,
) -> vk::Bool32 {
    // SAFETY: user data is always one of the 'static tags set in
    // `messenger_info`; the callback data is valid for this call.
    let tag = if user.is_null() {
        Cow::Borrowed("?")
    } else {
        unsafe { CStr::from_ptr(user as *const c_char) }.to_string_lossy()
    };
    let message = if data.is_null() || unsafe { (*data).p_message }.is_null() {
        Cow::Borrowed("")
    } else {
        unsafe { CStr::from_ptr((*data).p_message) }.to_string_lossy()
    };

    match severity {
        vk::DebugUtilsMessageSeverityFlagsEXT::ERROR => {
            tracing::error!(target: "vulkan", "validation layer ({tag}): {message}")
        }
        vk::DebugUtilsMessageSeverityFlagsEXT::WARNING => {
            tracing::warn!(target: "vulkan", "validation layer ({tag}): {message}")
        }
        vk::DebugUtilsMessageSeverityFlagsEXT::INFO => {
            tracing::info!(target: "vulkan", "validation layer ({tag}): {message}")
        }
        _ => tracing::debug!(target: "vulkan", "validation layer ({tag}): {message}"),
    }
    vk::FALSE
}

fn messenger_info(cfg: &MessengerConfig) -> vk::DebugUtilsMessengerCreateInfoEXT<'static> {
    let mut info = vk::DebugUtilsMessengerCreateInfoEXT::default()
        .message_severity(cfg.severity)
        .message_type(cfg.message_types)
        .pfn_user_callback(Some(vulkan_debug_callback));
    info.p_user_data = cfg.tag.as_ptr() as *mut c_void;
    info
}

fn extension_names(props: &[vk::ExtensionProperties]) -> Vec<CString> {
    props
        .iter()
        .filter_map(|p| p.extension_name_as_c_str().ok())
        .map(CStr::to_owned)
        .collect()
}

fn as_ptrs(names: &[CString]) -> Vec<*const c_char> {
    names.iter().map(|n| n.as_ptr()).collect()
}

/// The system Vulkan loader, opened at runtime.
pub struct AshDriver {
    entry: Entry,
}

impl AshDriver {
    pub fn load() -> Result<Self, BootstrapError> {
        // SAFETY: loading the system loader runs its initialisation code; we
        // only do this once, before any other Vulkan call.
        let entry = unsafe { Entry::load() }.map_err(BootstrapError::DriverLoad)?;
        Ok(Self { entry })
    }
}

impl Driver for AshDriver {
    type Instance = AshInstance;

    fn enumerate_instance_extensions(&self) -> VkResult<Vec<CString>> {
        let props = unsafe { self.entry.enumerate_instance_extension_properties(None)? };
        Ok(extension_names(&props))
    }

    fn enumerate_instance_layers(&self) -> VkResult<Vec<CString>> {
        let props = unsafe { self.entry.enumerate_instance_layer_properties()? };
        Ok(props
            .iter()
            .filter_map(|p| p.layer_name_as_c_str().ok())
            .map(CStr::to_owned)
            .collect())
    }

    fn create_instance(&self, desc: &InstanceDescriptor) -> VkResult<AshInstance> {
        let app_info = vk::ApplicationInfo::default()
            .application_name(&desc.application_name)
            .application_version(desc.application_version)
            .engine_name(&desc.engine_name)
            .engine_version(desc.engine_version)
            .api_version(desc.api_version);

        let ext_ptrs = as_ptrs(&desc.extensions);
        let layer_ptrs = as_ptrs(&desc.layers);
        let mut creation_messenger = desc.creation_messenger.as_ref().map(messenger_info);

        let mut create_info = vk::InstanceCreateInfo::default()
            .application_info(&app_info)
            .enabled_extension_names(&ext_ptrs)
            .enabled_layer_names(&layer_ptrs);
        if let Some(info) = creation_messenger.as_mut() {
            create_info = create_info.push_next(info);
        }

        // SAFETY: every pointer in create_info borrows locals that outlive
        // this call.
        let instance = unsafe { self.entry.create_instance(&create_info, None)? };

        // Resolved once here and carried with the instance.
        let debug_utils = desc
            .extensions
            .iter()
            .any(|e| e.as_c_str() == debug_utils::NAME)
            .then(|| debug_utils::Instance::new(&self.entry, &instance));

        Ok(AshInstance {
            surface: surface::Instance::new(&self.entry, &instance),
            entry: self.entry.clone(),
            instance,
            debug_utils,
        })
    }
}

pub struct AshInstance {
    entry: Entry,
    instance: ash::Instance,
    surface: surface::Instance,
    debug_utils: Option<debug_utils::Instance>,
}

impl InstanceDriver for AshInstance {
    type Device = AshDevice;

    fn create_debug_messenger(
        &self,
        config: &MessengerConfig,
    ) -> VkResult<vk::DebugUtilsMessengerEXT> {
        let loader = self
            .debug_utils
            .as_ref()
            .ok_or(vk::Result::ERROR_EXTENSION_NOT_PRESENT)?;
        unsafe { loader.create_debug_utils_messenger(&messenger_info(config), None) }
    }

    unsafe fn destroy_debug_messenger(&self, messenger: vk::DebugUtilsMessengerEXT) {
        if let Some(loader) = &self.debug_utils {
            unsafe { loader.destroy_debug_utils_messenger(messenger, None) };
        }
    }

    unsafe fn create_surface(
        &self,
        display: RawDisplayHandle,
        window: RawWindowHandle,
    ) -> VkResult<vk::SurfaceKHR> {
        unsafe { ash_window::create_surface(&self.entry, &self.instance, display, window, None) }
    }

    unsafe fn destroy_surface(&self, surface: vk::SurfaceKHR) {
        unsafe { self.surface.destroy_surface(surface, None) };
    }

    fn enumerate_physical_devices(&self) -> VkResult<Vec<vk::PhysicalDevice>> {
        unsafe { self.instance.enumerate_physical_devices() }
    }

    fn device_properties(&self, device: vk::PhysicalDevice) -> DeviceProperties {
        let props = unsafe { self.instance.get_physical_device_properties(device) };
        let name = props
            .device_name_as_c_str()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|_| String::from("<unnamed device>"));
        DeviceProperties {
            name,
            device_type: props.device_type,
        }
    }

    fn device_features(&self, device: vk::PhysicalDevice) -> vk::PhysicalDeviceFeatures {
        unsafe { self.instance.get_physical_device_features(device) }
    }

    fn queue_families(&self, device: vk::PhysicalDevice) -> Vec<vk::QueueFamilyProperties> {
        unsafe { self.instance.get_physical_device_queue_family_properties(device) }
    }

    fn device_extensions(&self, device: vk::PhysicalDevice) -> VkResult<Vec<CString>> {
        let props = unsafe { self.instance.enumerate_device_extension_properties(device)? };
        Ok(extension_names(&props))
    }

    fn surface_support(
        &self,
        device: vk::PhysicalDevice,
        family_index: u32,
        surface: vk::SurfaceKHR,
    ) -> VkResult<bool> {
        unsafe {
            self.surface
                .get_physical_device_surface_support(device, family_index, surface)
        }
    }

    fn surface_capabilities(
        &self,
        device: vk::PhysicalDevice,
        surface: vk::SurfaceKHR,
    ) -> VkResult<vk::SurfaceCapabilitiesKHR> {
        unsafe {
            self.surface
                .get_physical_device_surface_capabilities(device, surface)
        }
    }

    fn surface_formats(
        &self,
        device: vk::PhysicalDevice,
        surface: vk::SurfaceKHR,
    ) -> VkResult<Vec<vk::SurfaceFormatKHR>> {
        unsafe { self.surface.get_physical_device_surface_formats(device, surface) }
    }

    fn surface_present_modes(
        &self,
        device: vk::PhysicalDevice,
        surface: vk::SurfaceKHR,
    ) -> VkResult<Vec<vk::PresentModeKHR>> {
        unsafe {
            self.surface
                .get_physical_device_surface_present_modes(device, surface)
        }
    }

    fn create_device(
        &self,
        physical_device: vk::PhysicalDevice,
        desc: &DeviceDescriptor,
    ) -> VkResult<AshDevice> {
        let queue_infos: Vec<_> = desc
            .queues
            .iter()
            .map(|q| {
                vk::DeviceQueueCreateInfo::default()
                    .queue_family_index(q.family_index)
                    .queue_priorities(&q.priorities)
            })
            .collect();
        let ext_ptrs = as_ptrs(&desc.extensions);
        let layer_ptrs = as_ptrs(&desc.layers);
        let features = vk::PhysicalDeviceFeatures::default();

        #[allow(deprecated)]
        let create_info = vk::DeviceCreateInfo::default()
            .queue_create_infos(&queue_infos)
            .enabled_extension_names(&ext_ptrs)
            .enabled_layer_names(&layer_ptrs)
            .enabled_features(&features);

        let device = unsafe { self.instance.create_device(physical_device, &create_info, None)? };
        Ok(AshDevice {
            swapchain: swapchain::Device::new(&self.instance, &device),
            device,
        })
    }

    unsafe fn destroy_instance(&self) {
        unsafe { self.instance.destroy_instance(None) };
    }
}

pub struct AshDevice {
    device: ash::Device,
    swapchain: swapchain::Device,
}

impl DeviceDriver for AshDevice {
    fn queue(&self, family_index: u32, queue_index: u32) -> vk::Queue {
        unsafe { self.device.get_device_queue(family_index, queue_index) }
    }

    fn create_swapchain(
        &self,
        surface: vk::SurfaceKHR,
        config: &SwapchainConfig,
    ) -> VkResult<vk::SwapchainKHR> {
        let info = vk::SwapchainCreateInfoKHR::default()
            .surface(surface)
            .min_image_count(config.image_count)
            .image_format(config.format)
            .image_color_space(config.color_space)
            .image_extent(config.extent)
            .image_array_layers(1)
            .image_usage(vk::ImageUsageFlags::COLOR_ATTACHMENT)
            .image_sharing_mode(config.sharing.as_vk())
            .queue_family_indices(config.sharing.queue_family_indices())
            .pre_transform(config.pre_transform)
            .composite_alpha(vk::CompositeAlphaFlagsKHR::OPAQUE)
            .present_mode(config.present_mode)
            .clipped(true);
        unsafe { self.swapchain.create_swapchain(&info, None) }
    }

    fn swapchain_images(&self, swapchain: vk::SwapchainKHR) -> VkResult<Vec<vk::Image>> {
        unsafe { self.swapchain.get_swapchain_images(swapchain) }
    }

    unsafe fn destroy_swapchain(&self, swapchain: vk::SwapchainKHR) {
        unsafe { self.swapchain.destroy_swapchain(swapchain, None) };
    }

    fn create_image_view(&self, image: vk::Image, format: vk::Format) -> VkResult<vk::ImageView> {
        unsafe { self.device.create_image_view(&color_view_info(image, format), None) }
    }

    unsafe fn destroy_image_view(&self, view: vk::ImageView) {
        unsafe { self.device.destroy_image_view(view, None) };
    }

    unsafe fn destroy_device(&self) {
        unsafe { self.device.destroy_device(None) };
    }
}
