// SPDX-License-Identifier: CEPL-1.0
use ash::vk;
use gengine_wsi::FramebufferSize;
use tracing::info;

use crate::device::LogicalDeviceContext;
use crate::driver::{DeviceDriver, InstanceDriver};
use crate::error::{BootstrapError, Result};
use crate::image_view::create_image_views;
use crate::probe::{self, SwapchainSupport};
use crate::queue::QueueFamilyIndices;
use crate::selector::PhysicalDeviceCandidate;
use crate::surface::SurfaceContext;

/// What we would like the swapchain to look like, if the surface allows it.
#[derive(Clone, Copy, Debug)]
pub struct SwapchainPreferences {
    pub format: vk::Format,
    pub color_space: vk::ColorSpaceKHR,
    pub present_mode: vk::PresentModeKHR,
}

impl Default for SwapchainPreferences {
    fn default() -> Self {
        Self {
            format: vk::Format::B8G8R8_SRGB,
            color_space: vk::ColorSpaceKHR::SRGB_NONLINEAR,
            present_mode: vk::PresentModeKHR::FIFO,
        }
    }
}

/// How swapchain images are shared between queue families. Concurrent always
/// names exactly two distinct families, graphics first.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SharingMode {
    Exclusive,
    Concurrent([u32; 2]),
}

impl SharingMode {
    pub fn for_families(indices: &QueueFamilyIndices) -> Self {
        match (indices.graphics, indices.present) {
            (Some(g), Some(p)) if g != p => Self::Concurrent([g, p]),
            _ => Self::Exclusive,
        }
    }

    pub fn as_vk(&self) -> vk::SharingMode {
        match self {
            Self::Exclusive => vk::SharingMode::EXCLUSIVE,
            Self::Concurrent(_) => vk::SharingMode::CONCURRENT,
        }
    }

    pub fn queue_family_indices(&self) -> &[u32] {
        match self {
            Self::Exclusive => &[],
            Self::Concurrent(families) => families,
        }
    }
}

/// The concrete swapchain parameters handed to the driver.
#[derive(Clone, Copy, Debug)]
pub struct SwapchainConfig {
    pub format: vk::Format,
    pub color_space: vk::ColorSpaceKHR,
    pub present_mode: vk::PresentModeKHR,
    pub extent: vk::Extent2D,
    pub image_count: u32,
    pub sharing: SharingMode,
    pub pre_transform: vk::SurfaceTransformFlagsKHR,
}

impl SwapchainConfig {
    pub fn negotiate(
        support: &SwapchainSupport,
        families: &QueueFamilyIndices,
        framebuffer: FramebufferSize,
        prefs: &SwapchainPreferences,
    ) -> Result<Self> {
        let surface_format = choose_surface_format(&support.formats, prefs).ok_or(
            BootstrapError::SwapchainCreationFailed(vk::Result::ERROR_FORMAT_NOT_SUPPORTED),
        )?;
        let caps = &support.capabilities;

        Ok(Self {
            format: surface_format.format,
            color_space: surface_format.color_space,
            present_mode: choose_present_mode(&support.present_modes, prefs.present_mode),
            extent: choose_extent(caps, framebuffer),
            image_count: choose_image_count(caps),
            sharing: SharingMode::for_families(families),
            pre_transform: caps.current_transform,
        })
    }
}

/// Exact (format, colour space) match on the preference, else whatever the
/// driver listed first.
pub fn choose_surface_format(
    formats: &[vk::SurfaceFormatKHR],
    prefs: &SwapchainPreferences,
) -> Option<vk::SurfaceFormatKHR> {
    formats
        .iter()
        .copied()
        .find(|f| f.format == prefs.format && f.color_space == prefs.color_space)
        .or_else(|| formats.first().copied())
}

/// FIFO is guaranteed by every conformant driver, so it is the fallback.
pub fn choose_present_mode(
    modes: &[vk::PresentModeKHR],
    preferred: vk::PresentModeKHR,
) -> vk::PresentModeKHR {
    if modes.contains(&preferred) {
        preferred
    } else {
        vk::PresentModeKHR::FIFO
    }
}

/// A `current_extent` of `u32::MAX` means the surface lets us pick, in which
/// case the framebuffer size is clamped into the allowed range.
pub fn choose_extent(caps: &vk::SurfaceCapabilitiesKHR, framebuffer: FramebufferSize) -> vk::Extent2D {
    if caps.current_extent.width != u32::MAX {
        return caps.current_extent;
    }
    let (min, max) = (caps.min_image_extent, caps.max_image_extent);
    vk::Extent2D {
        width: framebuffer.width.max(min.width).min(max.width),
        height: framebuffer.height.max(min.height).min(max.height),
    }
}

/// One more than the minimum, capped when the driver advertises a maximum
/// (zero means unbounded).
pub fn choose_image_count(caps: &vk::SurfaceCapabilitiesKHR) -> u32 {
    let wanted = caps.min_image_count + 1;
    if caps.max_image_count > 0 {
        wanted.min(caps.max_image_count)
    } else {
        wanted
    }
}

/// A live swapchain, its images and one view per image.
///
/// Borrows both the device and the surface. Dropping it destroys every view
/// that was created, then the swapchain. Images belong to the swapchain and
/// are never destroyed individually.
pub struct SwapchainContext<'d, D: DeviceDriver> {
    device: &'d D,
    handle: vk::SwapchainKHR,
    config: SwapchainConfig,
    images: Vec<vk::Image>,
    views: Vec<vk::ImageView>,
}

impl<'d, D: DeviceDriver> SwapchainContext<'d, D> {
    pub fn negotiate<I>(
        device: &'d LogicalDeviceContext<'_, I>,
        surface: &'d SurfaceContext<'_, I>,
        physical: &PhysicalDeviceCandidate,
        framebuffer: FramebufferSize,
        prefs: &SwapchainPreferences,
    ) -> Result<Self>
    where
        I: InstanceDriver<Device = D>,
    {
        let support =
            probe::query_swapchain_support(device.instance().driver(), physical.handle, surface.handle())
                .map_err(BootstrapError::query("querying swapchain support"))?;
        let config = SwapchainConfig::negotiate(&support, device.families(), framebuffer, prefs)?;

        let driver = device.driver();
        let handle = driver
            .create_swapchain(surface.handle(), &config)
            .map_err(BootstrapError::SwapchainCreationFailed)?;
        let mut ctx = Self {
            device: driver,
            handle,
            config,
            images: Vec::new(),
            views: Vec::new(),
        };

        // The driver may hand back more images than requested.
        ctx.images = driver
            .swapchain_images(handle)
            .map_err(BootstrapError::SwapchainCreationFailed)?;
        create_image_views(driver, &ctx.images, config.format, &mut ctx.views)?;

        info!(
            "swapchain ready ({}x{}, {:?}/{:?}, {:?}, {} images, {:?})",
            config.extent.width,
            config.extent.height,
            config.format,
            config.color_space,
            config.present_mode,
            ctx.images.len(),
            config.sharing,
        );
        Ok(ctx)
    }

    pub fn handle(&self) -> vk::SwapchainKHR {
        self.handle
    }

    pub fn config(&self) -> &SwapchainConfig {
        &self.config
    }

    pub fn images(&self) -> &[vk::Image] {
        &self.images
    }

    pub fn image_views(&self) -> &[vk::ImageView] {
        &self.views
    }
}

impl<D: DeviceDriver> Drop for SwapchainContext<'_, D> {
    fn drop(&mut self) {
        // SAFETY: views were created from this swapchain's images on this
        // device; they go first, then the swapchain itself.
        unsafe {
            for view in self.views.drain(..) {
                self.device.destroy_image_view(view);
            }
            self.device.destroy_swapchain(self.handle);
        }
    }
}
