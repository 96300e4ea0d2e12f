// SPDX-License-Identifier: CEPL-1.0
//! Physical device selection.
//!
//! Devices are tried in the order the driver enumerates them and the first
//! one that passes every check in the [`Suitability`] chain is taken. There
//! is no scoring; a different policy can be dropped in by building a
//! different chain.

use std::ffi::CString;

use ash::prelude::VkResult;
use ash::vk;
use tracing::{debug, info};

use crate::driver::{DeviceProperties, InstanceDriver};
use crate::error::{BootstrapError, Result};
use crate::probe::{self, SwapchainSupport, REQUIRED_DEVICE_EXTENSIONS};
use crate::queue::{self, QueueFamilyIndices};

/// A physical device under evaluation.
pub struct Candidate<'a, I> {
    pub instance: &'a I,
    pub device: vk::PhysicalDevice,
    pub surface: Option<vk::SurfaceKHR>,
    pub properties: DeviceProperties,
    pub features: vk::PhysicalDeviceFeatures,
}

impl<'a, I: InstanceDriver> Candidate<'a, I> {
    pub fn new(instance: &'a I, device: vk::PhysicalDevice, surface: Option<vk::SurfaceKHR>) -> Self {
        Self {
            instance,
            device,
            surface,
            properties: instance.device_properties(device),
            features: instance.device_features(device),
        }
    }

    pub fn queue_families(&self) -> VkResult<QueueFamilyIndices> {
        queue::resolve(self.instance, self.device, self.surface)
    }
}

pub type Check<I> = fn(&Candidate<'_, I>) -> VkResult<bool>;

pub struct SuitabilityCheck<I> {
    pub name: &'static str,
    pub check: Check<I>,
}

/// Ordered chain of named checks, all of which must pass. Evaluation stops at
/// the first failure, so later checks may rely on earlier ones.
pub struct Suitability<I> {
    checks: Vec<SuitabilityCheck<I>>,
}

impl<I: InstanceDriver> Suitability<I> {
    pub fn empty() -> Self {
        Self { checks: Vec::new() }
    }

    /// The stock chain for a device that will present to a surface. Swapchain
    /// support is only probed after the swapchain extension is confirmed.
    pub fn presentation() -> Self {
        Self::empty()
            .with("discrete gpu", is_discrete_gpu)
            .with("geometry shader", has_geometry_shader)
            .with("complete queue families", has_complete_queue_families)
            .with("swapchain extension", has_required_extensions)
            .with("adequate swapchain support", has_adequate_swapchain_support)
    }

    /// Same as [`presentation`](Self::presentation) minus everything that
    /// needs a surface.
    pub fn headless() -> Self {
        Self::empty()
            .with("discrete gpu", is_discrete_gpu)
            .with("geometry shader", has_geometry_shader)
            .with("complete queue families", has_complete_queue_families)
    }

    pub fn with(mut self, name: &'static str, check: Check<I>) -> Self {
        self.checks.push(SuitabilityCheck { name, check });
        self
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.checks.iter().map(|c| c.name)
    }

    /// `None` if the candidate passes, otherwise the name of the first check
    /// that rejected it.
    pub fn first_failure(&self, candidate: &Candidate<'_, I>) -> VkResult<Option<&'static str>> {
        for c in &self.checks {
            if !(c.check)(candidate)? {
                return Ok(Some(c.name));
            }
        }
        Ok(None)
    }
}

fn is_discrete_gpu<I: InstanceDriver>(c: &Candidate<'_, I>) -> VkResult<bool> {
    Ok(c.properties.device_type == vk::PhysicalDeviceType::DISCRETE_GPU)
}

fn has_geometry_shader<I: InstanceDriver>(c: &Candidate<'_, I>) -> VkResult<bool> {
    Ok(c.features.geometry_shader == vk::TRUE)
}

fn has_complete_queue_families<I: InstanceDriver>(c: &Candidate<'_, I>) -> VkResult<bool> {
    Ok(c.queue_families()?.is_complete())
}

fn has_required_extensions<I: InstanceDriver>(c: &Candidate<'_, I>) -> VkResult<bool> {
    probe::supports_device_extensions(c.instance, c.device, REQUIRED_DEVICE_EXTENSIONS)
}

fn has_adequate_swapchain_support<I: InstanceDriver>(c: &Candidate<'_, I>) -> VkResult<bool> {
    match c.surface {
        Some(surface) => {
            Ok(probe::query_swapchain_support(c.instance, c.device, surface)?.is_adequate())
        }
        None => Ok(false),
    }
}

/// The device that won selection, with the facts derived while choosing it.
#[derive(Clone, Debug)]
pub struct PhysicalDeviceCandidate {
    pub handle: vk::PhysicalDevice,
    pub properties: DeviceProperties,
    pub features: vk::PhysicalDeviceFeatures,
    pub extensions: Vec<CString>,
    pub queue_families: QueueFamilyIndices,
    /// Only present when selection ran against a surface.
    pub swapchain_support: Option<SwapchainSupport>,
}

impl PhysicalDeviceCandidate {
    fn snapshot<I: InstanceDriver>(candidate: Candidate<'_, I>) -> VkResult<Self> {
        let queue_families = candidate.queue_families()?;
        let extensions = candidate.instance.device_extensions(candidate.device)?;
        let swapchain_support = candidate
            .surface
            .map(|s| probe::query_swapchain_support(candidate.instance, candidate.device, s))
            .transpose()?;

        Ok(Self {
            handle: candidate.device,
            properties: candidate.properties,
            features: candidate.features,
            extensions,
            queue_families,
            swapchain_support,
        })
    }

    pub fn name(&self) -> &str {
        &self.properties.name
    }
}

pub struct DeviceSelector<I> {
    suitability: Suitability<I>,
}

impl<I: InstanceDriver> DeviceSelector<I> {
    pub fn new(suitability: Suitability<I>) -> Self {
        Self { suitability }
    }

    pub fn pick(
        &self,
        instance: &I,
        surface: Option<vk::SurfaceKHR>,
    ) -> Result<PhysicalDeviceCandidate> {
        let devices = instance
            .enumerate_physical_devices()
            .map_err(BootstrapError::query("enumerating physical devices"))?;
        if devices.is_empty() {
            return Err(BootstrapError::NoVulkanCapableGpu);
        }

        for device in devices {
            let candidate = Candidate::new(instance, device, surface);
            let verdict = self
                .suitability
                .first_failure(&candidate)
                .map_err(BootstrapError::query("checking device suitability"))?;

            match verdict {
                None => {
                    let picked = PhysicalDeviceCandidate::snapshot(candidate)
                        .map_err(BootstrapError::query("querying the selected device"))?;
                    info!("picked suitable device: {}", picked.name());
                    return Ok(picked);
                }
                Some(check) => {
                    debug!("skipping {}: failed '{check}'", candidate.properties.name);
                }
            }
        }

        Err(BootstrapError::NoSuitableGpu)
    }
}
