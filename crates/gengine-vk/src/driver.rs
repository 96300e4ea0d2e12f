// SPDX-License-Identifier: CEPL-1.0
//! The native API boundary.
//!
//! Everything the bootstrap asks of the driver goes through these three
//! traits, split by dispatch level the same way Vulkan splits its function
//! tables. [`crate::AshDriver`] is the real implementation; the pipeline
//! itself only ever sees the traits.
//!
//! Creation descriptors are plain owned values. Turning them into
//! pointer-carrying `vk::*CreateInfo` structs is the implementation's job.

use std::ffi::CString;

use ash::prelude::VkResult;
use ash::vk;
use raw_window_handle::{RawDisplayHandle, RawWindowHandle};

use crate::diagnostics::MessengerConfig;
use crate::swapchain::SwapchainConfig;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InstanceDescriptor {
    pub application_name: CString,
    pub application_version: u32,
    pub engine_name: CString,
    pub engine_version: u32,
    pub api_version: u32,
    pub extensions: Vec<CString>,
    pub layers: Vec<CString>,
    /// Messenger chained onto the create info so instance creation and
    /// destruction are covered by validation too.
    pub creation_messenger: Option<MessengerConfig>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct QueueRequest {
    pub family_index: u32,
    pub priorities: Vec<f32>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct DeviceDescriptor {
    pub queues: Vec<QueueRequest>,
    pub extensions: Vec<CString>,
    pub layers: Vec<CString>,
}

/// Driver-reported identity of a physical device.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeviceProperties {
    pub name: String,
    pub device_type: vk::PhysicalDeviceType,
}

/// Entry-level calls: usable before any instance exists.
pub trait Driver {
    type Instance: InstanceDriver;

    fn enumerate_instance_extensions(&self) -> VkResult<Vec<CString>>;
    fn enumerate_instance_layers(&self) -> VkResult<Vec<CString>>;
    fn create_instance(&self, desc: &InstanceDescriptor) -> VkResult<Self::Instance>;
}

pub trait InstanceDriver {
    type Device: DeviceDriver;

    fn create_debug_messenger(
        &self,
        config: &MessengerConfig,
    ) -> VkResult<vk::DebugUtilsMessengerEXT>;

    /// # Safety
    /// `messenger` must come from this instance and must not be used again.
    unsafe fn destroy_debug_messenger(&self, messenger: vk::DebugUtilsMessengerEXT);

    /// # Safety
    /// Both handles must be valid and outlive the returned surface.
    unsafe fn create_surface(
        &self,
        display: RawDisplayHandle,
        window: RawWindowHandle,
    ) -> VkResult<vk::SurfaceKHR>;

    /// # Safety
    /// `surface` must come from this instance, and nothing created against it
    /// (swapchains) may still be alive.
    unsafe fn destroy_surface(&self, surface: vk::SurfaceKHR);

    fn enumerate_physical_devices(&self) -> VkResult<Vec<vk::PhysicalDevice>>;
    fn device_properties(&self, device: vk::PhysicalDevice) -> DeviceProperties;
    fn device_features(&self, device: vk::PhysicalDevice) -> vk::PhysicalDeviceFeatures;
    fn queue_families(&self, device: vk::PhysicalDevice) -> Vec<vk::QueueFamilyProperties>;
    fn device_extensions(&self, device: vk::PhysicalDevice) -> VkResult<Vec<CString>>;

    fn surface_support(
        &self,
        device: vk::PhysicalDevice,
        family_index: u32,
        surface: vk::SurfaceKHR,
    ) -> VkResult<bool>;
    fn surface_capabilities(
        &self,
        device: vk::PhysicalDevice,
        surface: vk::SurfaceKHR,
    ) -> VkResult<vk::SurfaceCapabilitiesKHR>;
    fn surface_formats(
        &self,
        device: vk::PhysicalDevice,
        surface: vk::SurfaceKHR,
    ) -> VkResult<Vec<vk::SurfaceFormatKHR>>;
    fn surface_present_modes(
        &self,
        device: vk::PhysicalDevice,
        surface: vk::SurfaceKHR,
    ) -> VkResult<Vec<vk::PresentModeKHR>>;

    fn create_device(
        &self,
        physical_device: vk::PhysicalDevice,
        desc: &DeviceDescriptor,
    ) -> VkResult<Self::Device>;

    /// # Safety
    /// Every object created from this instance must already be destroyed.
    unsafe fn destroy_instance(&self);
}

pub trait DeviceDriver {
    fn queue(&self, family_index: u32, queue_index: u32) -> vk::Queue;

    fn create_swapchain(
        &self,
        surface: vk::SurfaceKHR,
        config: &SwapchainConfig,
    ) -> VkResult<vk::SwapchainKHR>;

    fn swapchain_images(&self, swapchain: vk::SwapchainKHR) -> VkResult<Vec<vk::Image>>;

    /// # Safety
    /// `swapchain` must come from this device and every view of its images
    /// must already be destroyed.
    unsafe fn destroy_swapchain(&self, swapchain: vk::SwapchainKHR);

    fn create_image_view(&self, image: vk::Image, format: vk::Format) -> VkResult<vk::ImageView>;

    /// # Safety
    /// `view` must come from this device and must not be used again.
    unsafe fn destroy_image_view(&self, view: vk::ImageView);

    /// # Safety
    /// Every object created from this device must already be destroyed.
    unsafe fn destroy_device(&self);
}
