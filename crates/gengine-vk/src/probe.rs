// SPDX-License-Identifier: CEPL-1.0
//! Capability queries shared by instance, device and swapchain setup.

use std::collections::BTreeSet;
use std::ffi::{CStr, CString};

use ash::khr::swapchain;
use ash::prelude::VkResult;
use ash::vk;

use crate::driver::InstanceDriver;

/// Device extensions every presentation-capable device must expose.
pub const REQUIRED_DEVICE_EXTENSIONS: &[&CStr] = &[swapchain::NAME];

/// What a surface allows on a given physical device.
#[derive(Clone, Debug)]
pub struct SwapchainSupport {
    pub capabilities: vk::SurfaceCapabilitiesKHR,
    pub formats: Vec<vk::SurfaceFormatKHR>,
    pub present_modes: Vec<vk::PresentModeKHR>,
}

impl SwapchainSupport {
    /// A swapchain can only be built with at least one format and one mode.
    pub fn is_adequate(&self) -> bool {
        !self.formats.is_empty() && !self.present_modes.is_empty()
    }
}

pub fn query_swapchain_support<I: InstanceDriver>(
    instance: &I,
    device: vk::PhysicalDevice,
    surface: vk::SurfaceKHR,
) -> VkResult<SwapchainSupport> {
    Ok(SwapchainSupport {
        capabilities: instance.surface_capabilities(device, surface)?,
        formats: instance.surface_formats(device, surface)?,
        present_modes: instance.surface_present_modes(device, surface)?,
    })
}

/// First entry of `required` that `available` does not contain, in
/// `required` order.
pub fn first_missing<'a, A, R>(available: &[A], required: &'a [R]) -> Option<&'a CStr>
where
    A: AsRef<CStr>,
    R: AsRef<CStr>,
{
    required
        .iter()
        .map(AsRef::as_ref)
        .find(|want| !available.iter().any(|have| have.as_ref() == *want))
}

pub fn supports_device_extensions<I: InstanceDriver>(
    instance: &I,
    device: vk::PhysicalDevice,
    required: &[&CStr],
) -> VkResult<bool> {
    let available = instance.device_extensions(device)?;
    let mut outstanding: BTreeSet<&CStr> = required.iter().copied().collect();
    for ext in &available {
        outstanding.remove(ext.as_c_str());
    }
    Ok(outstanding.is_empty())
}

pub(crate) fn lossy(name: &CStr) -> String {
    name.to_string_lossy().into_owned()
}

pub(crate) fn to_c_strings(names: Vec<String>) -> Result<Vec<CString>, String> {
    names
        .into_iter()
        .map(|n| CString::new(n).map_err(|e| format!("bad extension name: {e}")))
        .collect()
}
