// SPDX-License-Identifier: CEPL-1.0
use std::ffi::CString;

use ash::vk;
use tracing::info;

use crate::diagnostics::Diagnostics;
use crate::driver::{DeviceDescriptor, DeviceDriver, InstanceDriver, QueueRequest};
use crate::error::{BootstrapError, Result};
use crate::instance::InstanceContext;
use crate::probe::REQUIRED_DEVICE_EXTENSIONS;
use crate::queue::QueueFamilyIndices;
use crate::selector::PhysicalDeviceCandidate;

const QUEUE_PRIORITY: f32 = 1.0;

/// One queue request per distinct family, each with a single queue at full
/// priority.
pub fn queue_requests(indices: &QueueFamilyIndices) -> Vec<QueueRequest> {
    indices
        .unique_families()
        .into_iter()
        .map(|family_index| QueueRequest {
            family_index,
            priorities: vec![QUEUE_PRIORITY],
        })
        .collect()
}

/// Device descriptor for `indices`. Device-level layers are obsolete on
/// current loaders but still declared when validation is on.
pub fn device_descriptor(indices: &QueueFamilyIndices, diagnostics: &Diagnostics) -> DeviceDescriptor {
    let extensions = if indices.needs_present() {
        REQUIRED_DEVICE_EXTENSIONS.iter().map(|e| (*e).to_owned()).collect()
    } else {
        Vec::<CString>::new()
    };

    DeviceDescriptor {
        queues: queue_requests(indices),
        extensions,
        layers: diagnostics.enabled_layer_names(),
    }
}

/// The logical device and its queues.
///
/// When graphics and present share a family the two queue handles are the
/// same queue; do not treat them as separate submission timelines.
pub struct LogicalDeviceContext<'i, I: InstanceDriver> {
    instance: &'i InstanceContext<I>,
    device: I::Device,
    families: QueueFamilyIndices,
    queue_create_count: usize,
    graphics_queue: vk::Queue,
    present_queue: Option<vk::Queue>,
}

impl<'i, I: InstanceDriver> LogicalDeviceContext<'i, I> {
    pub fn create(
        instance: &'i InstanceContext<I>,
        physical: &PhysicalDeviceCandidate,
        diagnostics: &Diagnostics,
    ) -> Result<Self> {
        let families = physical.queue_families;
        let graphics_family = match families.graphics {
            Some(g) if families.is_complete() => g,
            _ => {
                return Err(BootstrapError::IncompleteQueueFamilies(
                    physical.name().to_owned(),
                ))
            }
        };

        let desc = device_descriptor(&families, diagnostics);
        let device = instance
            .driver()
            .create_device(physical.handle, &desc)
            .map_err(BootstrapError::LogicalDeviceCreationFailed)?;

        let graphics_queue = device.queue(graphics_family, 0);
        let present_queue = families.present.map(|p| device.queue(p, 0));

        info!(
            "created logical device on {} ({} queue family{})",
            physical.name(),
            desc.queues.len(),
            if desc.queues.len() == 1 { "" } else { "s" }
        );

        Ok(Self {
            instance,
            device,
            families,
            queue_create_count: desc.queues.len(),
            graphics_queue,
            present_queue,
        })
    }

    pub fn driver(&self) -> &I::Device {
        &self.device
    }

    pub fn instance(&self) -> &'i InstanceContext<I> {
        self.instance
    }

    pub fn families(&self) -> &QueueFamilyIndices {
        &self.families
    }

    pub fn queue_create_count(&self) -> usize {
        self.queue_create_count
    }

    pub fn graphics_queue(&self) -> vk::Queue {
        self.graphics_queue
    }

    pub fn present_queue(&self) -> Option<vk::Queue> {
        self.present_queue
    }
}

impl<I: InstanceDriver> Drop for LogicalDeviceContext<'_, I> {
    fn drop(&mut self) {
        // SAFETY: swapchains borrow this context, so nothing created from the
        // device is still alive.
        unsafe { self.device.destroy_device() };
    }
}
