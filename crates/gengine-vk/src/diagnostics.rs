// SPDX-License-Identifier: CEPL-1.0
use std::ffi::{CStr, CString};

use ash::ext::debug_utils;
use ash::vk;

pub const VALIDATION_LAYER: &CStr = c"VK_LAYER_KHRONOS_validation";

/// Tag on the messenger chained onto instance creation.
pub const INSTANCE_TAG: &CStr = c"instance";
/// Tag on the messenger that lives as long as the instance.
pub const DEBUG_TAG: &CStr = c"debug";

/// Whether driver-side validation is switched on. Decided by the build, never
/// changed at runtime.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Diagnostics {
    enabled: bool,
}

impl Diagnostics {
    pub fn from_build() -> Self {
        Self::new(cfg!(debug_assertions))
    }

    pub const fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn required_layer_names(&self) -> Vec<CString> {
        vec![VALIDATION_LAYER.to_owned()]
    }

    /// Layers to actually request: the validation layer when enabled, nothing
    /// otherwise.
    pub fn enabled_layer_names(&self) -> Vec<CString> {
        if self.enabled {
            self.required_layer_names()
        } else {
            Vec::new()
        }
    }

    /// The window system's list, untouched, with the debug-utils extension
    /// appended last when validation is on.
    pub fn required_extension_names(&self, window_extensions: &[CString]) -> Vec<CString> {
        let mut names = window_extensions.to_vec();
        if self.enabled {
            names.push(debug_utils::NAME.to_owned());
        }
        names
    }

    pub fn messenger(&self, tag: &'static CStr) -> Option<MessengerConfig> {
        self.enabled.then(|| MessengerConfig::warnings_and_errors(tag))
    }
}

/// Parameters for one debug-utils messenger registration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MessengerConfig {
    pub severity: vk::DebugUtilsMessageSeverityFlagsEXT,
    pub message_types: vk::DebugUtilsMessageTypeFlagsEXT,
    /// Provenance string handed back to the callback as user data.
    pub tag: &'static CStr,
}

impl MessengerConfig {
    pub fn warnings_and_errors(tag: &'static CStr) -> Self {
        Self {
            severity: vk::DebugUtilsMessageSeverityFlagsEXT::WARNING
                | vk::DebugUtilsMessageSeverityFlagsEXT::ERROR,
            message_types: vk::DebugUtilsMessageTypeFlagsEXT::GENERAL
                | vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION
                | vk::DebugUtilsMessageTypeFlagsEXT::PERFORMANCE,
            tag,
        }
    }
}
