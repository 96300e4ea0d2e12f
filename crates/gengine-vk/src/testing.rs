// SPDX-License-Identifier: CEPL-1.0
//! Recording fakes for the driver and window traits.

use std::cell::{Cell, RefCell};
use std::ffi::CString;
use std::rc::Rc;

use anyhow::{anyhow, bail};
use ash::ext::debug_utils;
use ash::khr::swapchain;
use ash::prelude::VkResult;
use ash::vk::{self, Handle};
use gengine_wsi::{FramebufferSize, WindowSystem};
use raw_window_handle::{
    RawDisplayHandle, RawWindowHandle, WebDisplayHandle, WebWindowHandle,
};

use crate::diagnostics::{MessengerConfig, VALIDATION_LAYER};
use crate::driver::{
    DeviceDescriptor, DeviceDriver, DeviceProperties, Driver, InstanceDescriptor, InstanceDriver,
};
use crate::swapchain::SwapchainConfig;

pub fn window_extensions() -> Vec<CString> {
    vec![c"VK_KHR_surface".to_owned(), c"VK_KHR_xcb_surface".to_owned()]
}

/// A fake physical device. Queue families are `(flags, can_present)`.
#[derive(Clone, Debug)]
pub struct MockGpu {
    pub name: String,
    pub device_type: vk::PhysicalDeviceType,
    pub geometry_shader: bool,
    pub queue_families: Vec<(vk::QueueFlags, bool)>,
    pub extensions: Vec<CString>,
    pub capabilities: vk::SurfaceCapabilitiesKHR,
    pub formats: Vec<vk::SurfaceFormatKHR>,
    pub present_modes: Vec<vk::PresentModeKHR>,
    /// Overrides how many images the swapchain really hands out.
    pub image_count: Option<u32>,
}

impl MockGpu {
    pub fn discrete(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            device_type: vk::PhysicalDeviceType::DISCRETE_GPU,
            geometry_shader: true,
            queue_families: vec![(vk::QueueFlags::GRAPHICS, true)],
            extensions: vec![swapchain::NAME.to_owned()],
            capabilities: vk::SurfaceCapabilitiesKHR {
                min_image_count: 2,
                max_image_count: 8,
                current_extent: vk::Extent2D {
                    width: 800,
                    height: 600,
                },
                min_image_extent: vk::Extent2D {
                    width: 1,
                    height: 1,
                },
                max_image_extent: vk::Extent2D {
                    width: 4096,
                    height: 4096,
                },
                max_image_array_layers: 1,
                current_transform: vk::SurfaceTransformFlagsKHR::IDENTITY,
                ..Default::default()
            },
            formats: vec![
                vk::SurfaceFormatKHR {
                    format: vk::Format::B8G8R8A8_SRGB,
                    color_space: vk::ColorSpaceKHR::SRGB_NONLINEAR,
                },
                vk::SurfaceFormatKHR {
                    format: vk::Format::B8G8R8_SRGB,
                    color_space: vk::ColorSpaceKHR::SRGB_NONLINEAR,
                },
            ],
            present_modes: vec![vk::PresentModeKHR::FIFO],
            image_count: None,
        }
    }

    fn has_swapchain(&self) -> bool {
        self.extensions.iter().any(|e| e.as_c_str() == swapchain::NAME)
    }

    fn surface_query(&self, what: &str) {
        assert!(
            self.has_swapchain(),
            "{what} queried on {} without {swapchain:?}",
            self.name,
            swapchain = swapchain::NAME
        );
    }
}

struct MockState {
    gpus: Vec<MockGpu>,
    instance_extensions: Vec<CString>,
    layers: Vec<CString>,
    instance_failure: Option<vk::Result>,
    messenger_failure: Option<vk::Result>,
    device_failure: Option<vk::Result>,
    swapchain_failure: Option<vk::Result>,
    image_view_failure: Option<usize>,

    calls: RefCell<Vec<String>>,
    instance_descriptor: RefCell<Option<InstanceDescriptor>>,
    device_descriptor: RefCell<Option<DeviceDescriptor>>,
    swapchain_config: RefCell<Option<SwapchainConfig>>,
    views_created: Cell<u64>,
}

impl MockState {
    fn record(&self, call: impl Into<String>) {
        self.calls.borrow_mut().push(call.into());
    }

    fn gpu(&self, device: vk::PhysicalDevice) -> &MockGpu {
        &self.gpus[(device.as_raw() - 1) as usize]
    }
}

/// Fake loader. Clones share one call log.
#[derive(Clone)]
pub struct MockDriver(Rc<MockState>);

impl MockDriver {
    pub fn new(gpus: Vec<MockGpu>) -> Self {
        Self(Rc::new(MockState {
            gpus,
            instance_extensions: vec![
                c"VK_KHR_surface".to_owned(),
                c"VK_KHR_xcb_surface".to_owned(),
                debug_utils::NAME.to_owned(),
            ],
            layers: vec![VALIDATION_LAYER.to_owned()],
            instance_failure: None,
            messenger_failure: None,
            device_failure: None,
            swapchain_failure: None,
            image_view_failure: None,
            calls: RefCell::new(Vec::new()),
            instance_descriptor: RefCell::new(None),
            device_descriptor: RefCell::new(None),
            swapchain_config: RefCell::new(None),
            views_created: Cell::new(0),
        }))
    }

    fn state_mut(&mut self) -> &mut MockState {
        Rc::get_mut(&mut self.0).expect("configure the mock before sharing it")
    }

    pub fn with_layers(mut self, layers: Vec<CString>) -> Self {
        self.state_mut().layers = layers;
        self
    }

    pub fn with_instance_extensions(mut self, extensions: Vec<CString>) -> Self {
        self.state_mut().instance_extensions = extensions;
        self
    }

    pub fn fail_instance(mut self, result: vk::Result) -> Self {
        self.state_mut().instance_failure = Some(result);
        self
    }

    pub fn fail_messenger(mut self, result: vk::Result) -> Self {
        self.state_mut().messenger_failure = Some(result);
        self
    }

    pub fn fail_device(mut self, result: vk::Result) -> Self {
        self.state_mut().device_failure = Some(result);
        self
    }

    pub fn fail_swapchain(mut self, result: vk::Result) -> Self {
        self.state_mut().swapchain_failure = Some(result);
        self
    }

    /// Makes the `index`-th image view creation fail.
    pub fn fail_image_view_at(mut self, index: usize) -> Self {
        self.state_mut().image_view_failure = Some(index);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.0.calls.borrow().clone()
    }

    pub fn count(&self, call: &str) -> usize {
        self.0.calls.borrow().iter().filter(|c| *c == call).count()
    }

    /// A descriptor with no extensions or layers, for tests that only need an
    /// instance to hang devices off.
    pub fn plain_descriptor(&self) -> InstanceDescriptor {
        InstanceDescriptor {
            application_name: c"test".to_owned(),
            application_version: 0,
            engine_name: c"test".to_owned(),
            engine_version: 0,
            api_version: vk::API_VERSION_1_0,
            extensions: Vec::new(),
            layers: Vec::new(),
            creation_messenger: None,
        }
    }

    pub fn instance_descriptor(&self) -> Option<InstanceDescriptor> {
        self.0.instance_descriptor.borrow().clone()
    }

    pub fn device_descriptor(&self) -> Option<DeviceDescriptor> {
        self.0.device_descriptor.borrow().clone()
    }

    pub fn swapchain_config(&self) -> Option<SwapchainConfig> {
        *self.0.swapchain_config.borrow()
    }
}

impl Driver for MockDriver {
    type Instance = MockInstance;

    fn enumerate_instance_extensions(&self) -> VkResult<Vec<CString>> {
        self.0.record("enumerate_instance_extensions");
        Ok(self.0.instance_extensions.clone())
    }

    fn enumerate_instance_layers(&self) -> VkResult<Vec<CString>> {
        self.0.record("enumerate_instance_layers");
        Ok(self.0.layers.clone())
    }

    fn create_instance(&self, desc: &InstanceDescriptor) -> VkResult<MockInstance> {
        self.0.record("create_instance");
        *self.0.instance_descriptor.borrow_mut() = Some(desc.clone());
        match self.0.instance_failure {
            Some(result) => Err(result),
            None => Ok(MockInstance(Rc::clone(&self.0))),
        }
    }
}

pub struct MockInstance(Rc<MockState>);

impl InstanceDriver for MockInstance {
    type Device = MockDevice;

    fn create_debug_messenger(
        &self,
        config: &MessengerConfig,
    ) -> VkResult<vk::DebugUtilsMessengerEXT> {
        self.0
            .record(format!("create_debug_messenger:{}", config.tag.to_string_lossy()));
        match self.0.messenger_failure {
            Some(result) => Err(result),
            None => Ok(vk::DebugUtilsMessengerEXT::from_raw(0xdeb)),
        }
    }

    unsafe fn destroy_debug_messenger(&self, _messenger: vk::DebugUtilsMessengerEXT) {
        self.0.record("destroy_debug_messenger");
    }

    unsafe fn create_surface(
        &self,
        _display: RawDisplayHandle,
        _window: RawWindowHandle,
    ) -> VkResult<vk::SurfaceKHR> {
        self.0.record("create_surface");
        Ok(vk::SurfaceKHR::from_raw(0x5))
    }

    unsafe fn destroy_surface(&self, _surface: vk::SurfaceKHR) {
        self.0.record("destroy_surface");
    }

    fn enumerate_physical_devices(&self) -> VkResult<Vec<vk::PhysicalDevice>> {
        Ok((1..=self.0.gpus.len() as u64)
            .map(vk::PhysicalDevice::from_raw)
            .collect())
    }

    fn device_properties(&self, device: vk::PhysicalDevice) -> DeviceProperties {
        let gpu = self.0.gpu(device);
        DeviceProperties {
            name: gpu.name.clone(),
            device_type: gpu.device_type,
        }
    }

    fn device_features(&self, device: vk::PhysicalDevice) -> vk::PhysicalDeviceFeatures {
        vk::PhysicalDeviceFeatures {
            geometry_shader: self.0.gpu(device).geometry_shader.into(),
            ..Default::default()
        }
    }

    fn queue_families(&self, device: vk::PhysicalDevice) -> Vec<vk::QueueFamilyProperties> {
        self.0
            .gpu(device)
            .queue_families
            .iter()
            .map(|&(queue_flags, _)| vk::QueueFamilyProperties {
                queue_flags,
                queue_count: 1,
                ..Default::default()
            })
            .collect()
    }

    fn device_extensions(&self, device: vk::PhysicalDevice) -> VkResult<Vec<CString>> {
        let gpu = self.0.gpu(device);
        self.0.record(format!("device_extensions:{}", gpu.name));
        Ok(gpu.extensions.clone())
    }

    fn surface_support(
        &self,
        device: vk::PhysicalDevice,
        family_index: u32,
        _surface: vk::SurfaceKHR,
    ) -> VkResult<bool> {
        Ok(self.0.gpu(device).queue_families[family_index as usize].1)
    }

    fn surface_capabilities(
        &self,
        device: vk::PhysicalDevice,
        _surface: vk::SurfaceKHR,
    ) -> VkResult<vk::SurfaceCapabilitiesKHR> {
        let gpu = self.0.gpu(device);
        self.0.record(format!("surface_capabilities:{}", gpu.name));
        gpu.surface_query("surface capabilities");
        Ok(gpu.capabilities)
    }

    fn surface_formats(
        &self,
        device: vk::PhysicalDevice,
        _surface: vk::SurfaceKHR,
    ) -> VkResult<Vec<vk::SurfaceFormatKHR>> {
        let gpu = self.0.gpu(device);
        self.0.record(format!("surface_formats:{}", gpu.name));
        gpu.surface_query("surface formats");
        Ok(gpu.formats.clone())
    }

    fn surface_present_modes(
        &self,
        device: vk::PhysicalDevice,
        _surface: vk::SurfaceKHR,
    ) -> VkResult<Vec<vk::PresentModeKHR>> {
        let gpu = self.0.gpu(device);
        self.0.record(format!("surface_present_modes:{}", gpu.name));
        gpu.surface_query("present modes");
        Ok(gpu.present_modes.clone())
    }

    fn create_device(
        &self,
        physical_device: vk::PhysicalDevice,
        desc: &DeviceDescriptor,
    ) -> VkResult<MockDevice> {
        let gpu = self.0.gpu(physical_device);
        self.0.record(format!("create_device:{}", gpu.name));
        *self.0.device_descriptor.borrow_mut() = Some(desc.clone());
        match self.0.device_failure {
            Some(result) => Err(result),
            None => Ok(MockDevice {
                state: Rc::clone(&self.0),
                image_count: gpu.image_count,
            }),
        }
    }

    unsafe fn destroy_instance(&self) {
        self.0.record("destroy_instance");
    }
}

pub struct MockDevice {
    state: Rc<MockState>,
    image_count: Option<u32>,
}

impl DeviceDriver for MockDevice {
    fn queue(&self, family_index: u32, queue_index: u32) -> vk::Queue {
        vk::Queue::from_raw(((u64::from(family_index) + 1) << 8) | u64::from(queue_index))
    }

    fn create_swapchain(
        &self,
        _surface: vk::SurfaceKHR,
        config: &SwapchainConfig,
    ) -> VkResult<vk::SwapchainKHR> {
        self.state.record("create_swapchain");
        *self.state.swapchain_config.borrow_mut() = Some(*config);
        match self.state.swapchain_failure {
            Some(result) => Err(result),
            None => Ok(vk::SwapchainKHR::from_raw(0x5c)),
        }
    }

    fn swapchain_images(&self, _swapchain: vk::SwapchainKHR) -> VkResult<Vec<vk::Image>> {
        self.state.record("swapchain_images");
        let requested = self
            .state
            .swapchain_config
            .borrow()
            .map_or(0, |c| c.image_count);
        let count = self.image_count.unwrap_or(requested);
        Ok((0..u64::from(count))
            .map(|i| vk::Image::from_raw(0x1000 + i))
            .collect())
    }

    unsafe fn destroy_swapchain(&self, _swapchain: vk::SwapchainKHR) {
        self.state.record("destroy_swapchain");
    }

    fn create_image_view(&self, image: vk::Image, _format: vk::Format) -> VkResult<vk::ImageView> {
        let index = self.state.views_created.get();
        self.state.record(format!("create_image_view:{index}"));
        if self.state.image_view_failure == Some(index as usize) {
            return Err(vk::Result::ERROR_OUT_OF_DEVICE_MEMORY);
        }
        self.state.views_created.set(index + 1);
        Ok(vk::ImageView::from_raw(image.as_raw() + 0x1000))
    }

    unsafe fn destroy_image_view(&self, _view: vk::ImageView) {
        self.state.record("destroy_image_view");
    }

    unsafe fn destroy_device(&self) {
        self.state.record("destroy_device");
    }
}

/// A window that closes itself after a set number of polls.
pub struct MockWindow {
    handles: bool,
    extensions: Option<Vec<String>>,
    pub size: FramebufferSize,
    close_after: usize,
    pub polls: usize,
}

impl MockWindow {
    pub fn new() -> Self {
        Self {
            handles: true,
            extensions: Some(vec!["VK_KHR_surface".into(), "VK_KHR_xcb_surface".into()]),
            size: FramebufferSize {
                width: 800,
                height: 600,
            },
            close_after: 0,
            polls: 0,
        }
    }

    pub fn without_handles(mut self) -> Self {
        self.handles = false;
        self
    }

    pub fn without_vulkan(mut self) -> Self {
        self.extensions = None;
        self
    }

    pub fn closing_after(mut self, polls: usize) -> Self {
        self.close_after = polls;
        self
    }
}

impl WindowSystem for MockWindow {
    fn required_instance_extensions(&self) -> anyhow::Result<Vec<String>> {
        self.extensions
            .clone()
            .ok_or_else(|| anyhow!("vulkan is not supported by this window system"))
    }

    fn raw_handles(&self) -> anyhow::Result<(RawDisplayHandle, RawWindowHandle)> {
        if !self.handles {
            bail!("window has no native handles");
        }
        Ok((
            RawDisplayHandle::Web(WebDisplayHandle::new()),
            RawWindowHandle::Web(WebWindowHandle::new(1)),
        ))
    }

    fn framebuffer_size(&self) -> FramebufferSize {
        self.size
    }

    fn should_close(&self) -> bool {
        self.polls >= self.close_after
    }

    fn poll_events(&mut self) {
        self.polls += 1;
    }
}
