// SPDX-License-Identifier: CEPL-1.0
//! The bootstrap pipeline.
//!
//! Each stage is a local whose wrapper borrows the one before it, so the
//! borrow checker enforces construction order and scope exit tears things
//! down in reverse. An error at any stage returns early and drops whatever
//! already exists.

use gengine_wsi::WindowSystem;
use tracing::info;

use crate::device::LogicalDeviceContext;
use crate::diagnostics::Diagnostics;
use crate::driver::{Driver, InstanceDriver};
use crate::error::{BootstrapError, Result};
use crate::instance::{AppInfo, InstanceContext};
use crate::probe::to_c_strings;
use crate::queue::QueueFamilyIndices;
use crate::selector::{DeviceSelector, PhysicalDeviceCandidate, Suitability};
use crate::surface::SurfaceContext;
use crate::swapchain::{SwapchainConfig, SwapchainContext, SwapchainPreferences};

#[derive(Clone, Debug, Default)]
pub struct EngineSettings {
    pub app: AppInfo,
    pub swapchain: SwapchainPreferences,
}

#[derive(Clone, Copy, Debug)]
pub struct SwapchainSummary {
    pub config: SwapchainConfig,
    pub image_count: usize,
    pub view_count: usize,
}

/// What a bootstrap produced, kept after everything has been torn down.
#[derive(Clone, Debug)]
pub struct BootstrapSummary {
    pub device_name: String,
    pub queue_families: QueueFamilyIndices,
    pub queue_create_count: usize,
    /// Graphics and present resolved to the same queue.
    pub queues_alias: bool,
    pub swapchain: Option<SwapchainSummary>,
}

impl BootstrapSummary {
    fn new<I: InstanceDriver>(
        physical: &PhysicalDeviceCandidate,
        device: &LogicalDeviceContext<'_, I>,
        swapchain: Option<&SwapchainContext<'_, I::Device>>,
    ) -> Self {
        Self {
            device_name: physical.name().to_owned(),
            queue_families: *device.families(),
            queue_create_count: device.queue_create_count(),
            queues_alias: device.present_queue() == Some(device.graphics_queue()),
            swapchain: swapchain.map(|s| SwapchainSummary {
                config: *s.config(),
                image_count: s.images().len(),
                view_count: s.image_views().len(),
            }),
        }
    }
}

pub struct Engine {
    settings: EngineSettings,
    diagnostics: Diagnostics,
}

impl Engine {
    /// Validation follows the build: on in debug, off in release.
    pub fn new(settings: EngineSettings) -> Self {
        Self::with_diagnostics(settings, Diagnostics::from_build())
    }

    pub fn with_diagnostics(settings: EngineSettings, diagnostics: Diagnostics) -> Self {
        Self {
            settings,
            diagnostics,
        }
    }

    pub fn diagnostics(&self) -> Diagnostics {
        self.diagnostics
    }

    /// Brings up everything needed to present to `window`, pumps its events
    /// until it asks to close, then tears it all down.
    pub fn run<D, W>(&self, driver: &D, window: &mut W) -> Result<BootstrapSummary>
    where
        D: Driver,
        W: WindowSystem + ?Sized,
    {
        let window_extensions = window
            .required_instance_extensions()
            .map_err(|e| BootstrapError::WindowSystem(format!("{e:#}")))
            .and_then(|names| to_c_strings(names).map_err(BootstrapError::WindowSystem))?;

        let instance = InstanceContext::create(
            driver,
            &self.settings.app,
            &self.diagnostics,
            &window_extensions,
        )?;
        let surface = SurfaceContext::create(&instance, &*window)?;
        let physical = DeviceSelector::new(Suitability::presentation())
            .pick(instance.driver(), Some(surface.handle()))?;
        let device = LogicalDeviceContext::create(&instance, &physical, &self.diagnostics)?;
        let swapchain = SwapchainContext::negotiate(
            &device,
            &surface,
            &physical,
            window.framebuffer_size(),
            &self.settings.swapchain,
        )?;

        let summary = BootstrapSummary::new(&physical, &device, Some(&swapchain));

        info!("bootstrap complete, entering event loop");
        while !window.should_close() {
            window.poll_events();
        }
        info!("window closed, tearing down");

        Ok(summary)
    }

    /// Instance and logical device only, with a single graphics queue. No
    /// window, surface or swapchain is involved.
    pub fn run_headless<D: Driver>(&self, driver: &D) -> Result<BootstrapSummary> {
        let instance = InstanceContext::create(driver, &self.settings.app, &self.diagnostics, &[])?;
        let physical =
            DeviceSelector::new(Suitability::headless()).pick(instance.driver(), None)?;
        let device = LogicalDeviceContext::create(&instance, &physical, &self.diagnostics)?;

        info!("headless bootstrap complete on {}", physical.name());
        Ok(BootstrapSummary::new(&physical, &device, None))
    }
}
