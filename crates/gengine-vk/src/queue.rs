// SPDX-License-Identifier: CEPL-1.0
use std::collections::BTreeSet;

use ash::prelude::VkResult;
use ash::vk;

use crate::driver::InstanceDriver;

/// Queue family roles resolved for one physical device.
///
/// `None` means "not found yet", which is distinct from "found at index 0".
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct QueueFamilyIndices {
    pub graphics: Option<u32>,
    pub present: Option<u32>,
    needs_present: bool,
}

impl QueueFamilyIndices {
    /// Empty indices. Pass `false` for a headless device, where completeness
    /// only asks for a graphics family.
    pub fn new(needs_present: bool) -> Self {
        Self {
            graphics: None,
            present: None,
            needs_present,
        }
    }

    pub fn needs_present(&self) -> bool {
        self.needs_present
    }

    pub fn is_complete(&self) -> bool {
        self.graphics.is_some() && (!self.needs_present || self.present.is_some())
    }

    /// Resolved families with duplicates removed, ascending.
    pub fn unique_families(&self) -> BTreeSet<u32> {
        self.graphics.into_iter().chain(self.present).collect()
    }

    /// True when graphics and present were both resolved to one family.
    pub fn shares_family(&self) -> bool {
        matches!((self.graphics, self.present), (Some(g), Some(p)) if g == p)
    }
}

/// Walks `families` in index order, taking the first graphics-capable family
/// and, independently, the first family `supports_present` accepts. Stops as
/// soon as the indices are complete. `supports_present` is only consulted
/// while a present family is still wanted.
pub fn resolve_families<F>(
    families: &[vk::QueueFamilyProperties],
    needs_present: bool,
    mut supports_present: F,
) -> VkResult<QueueFamilyIndices>
where
    F: FnMut(u32) -> VkResult<bool>,
{
    let mut indices = QueueFamilyIndices::new(needs_present);

    for (i, family) in (0u32..).zip(families) {
        if indices.graphics.is_none() && family.queue_flags.contains(vk::QueueFlags::GRAPHICS) {
            indices.graphics = Some(i);
        }
        if needs_present && indices.present.is_none() && supports_present(i)? {
            indices.present = Some(i);
        }
        if indices.is_complete() {
            break;
        }
    }

    Ok(indices)
}

/// Resolves queue families of `device`. With no surface, present resolution
/// is skipped entirely.
pub fn resolve<I: InstanceDriver>(
    instance: &I,
    device: vk::PhysicalDevice,
    surface: Option<vk::SurfaceKHR>,
) -> VkResult<QueueFamilyIndices> {
    let families = instance.queue_families(device);
    match surface {
        Some(surface) => resolve_families(&families, true, |i| {
            instance.surface_support(device, i, surface)
        }),
        None => resolve_families(&families, false, |_| Ok(false)),
    }
}
