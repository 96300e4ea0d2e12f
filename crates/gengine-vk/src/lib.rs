// SPDX-License-Identifier: CEPL-1.0
//! Vulkan bootstrap: instance, validation messenger, surface, physical device
//! selection, logical device and swapchain with its image views.
#![deny(unsafe_op_in_unsafe_fn)]

mod ash_driver;
pub mod device;
pub mod diagnostics;
pub mod driver;
pub mod engine;
pub mod error;
pub mod image_view;
pub mod instance;
pub mod probe;
pub mod queue;
pub mod selector;
pub mod surface;
pub mod swapchain;

#[cfg(test)]
mod testing;

pub use ash::vk;

pub use ash_driver::{AshDevice, AshDriver, AshInstance};
pub use diagnostics::Diagnostics;
pub use driver::{DeviceDriver, Driver, InstanceDriver};
pub use engine::{BootstrapSummary, Engine, EngineSettings, SwapchainSummary};
pub use error::BootstrapError;
pub use instance::AppInfo;
pub use swapchain::{SharingMode, SwapchainConfig, SwapchainPreferences};
