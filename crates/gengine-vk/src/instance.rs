// SPDX-License-Identifier: CEPL-1.0
use std::ffi::CString;

use ash::vk;
use tracing::{debug, info};

use crate::diagnostics::{Diagnostics, DEBUG_TAG, INSTANCE_TAG};
use crate::driver::{Driver, InstanceDescriptor, InstanceDriver};
use crate::error::{BootstrapError, Result};
use crate::probe::{first_missing, lossy};

/// Application and engine metadata reported to the driver.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AppInfo {
    pub name: CString,
    pub version: (u32, u32, u32),
    pub engine_name: CString,
    pub engine_version: (u32, u32, u32),
    pub api_version: u32,
}

impl Default for AppInfo {
    fn default() -> Self {
        Self {
            name: c"hello triangle".to_owned(),
            version: (1, 0, 0),
            engine_name: c"No Engine".to_owned(),
            engine_version: (1, 0, 0),
            api_version: vk::API_VERSION_1_0,
        }
    }
}

fn pack_version((major, minor, patch): (u32, u32, u32)) -> u32 {
    vk::make_api_version(0, major, minor, patch)
}

/// The API context plus the persistent validation messenger, if any.
/// Dropping it unregisters the messenger and destroys the instance.
pub struct InstanceContext<I: InstanceDriver> {
    driver: I,
    messenger: Option<vk::DebugUtilsMessengerEXT>,
}

impl<I: InstanceDriver> InstanceContext<I> {
    /// Creates the instance.
    ///
    /// The window-system extension check runs after the instance exists,
    /// not before; a missing extension still destroys the fresh instance on
    /// the way out.
    pub fn create<D>(
        driver: &D,
        app: &AppInfo,
        diagnostics: &Diagnostics,
        window_extensions: &[CString],
    ) -> Result<Self>
    where
        D: Driver<Instance = I>,
    {
        if diagnostics.is_enabled() {
            let available = driver
                .enumerate_instance_layers()
                .map_err(BootstrapError::query("enumerating instance layers"))?;
            let required = diagnostics.required_layer_names();
            if let Some(missing) = first_missing(&available, &required) {
                return Err(BootstrapError::UnsupportedLayer(lossy(missing)));
            }
        }

        let desc = InstanceDescriptor {
            application_name: app.name.clone(),
            application_version: pack_version(app.version),
            engine_name: app.engine_name.clone(),
            engine_version: pack_version(app.engine_version),
            api_version: app.api_version,
            extensions: diagnostics.required_extension_names(window_extensions),
            layers: diagnostics.enabled_layer_names(),
            creation_messenger: diagnostics.messenger(INSTANCE_TAG),
        };

        let handle = driver
            .create_instance(&desc)
            .map_err(BootstrapError::InstanceCreationFailed)?;
        let mut ctx = Self {
            driver: handle,
            messenger: None,
        };

        let available = driver
            .enumerate_instance_extensions()
            .map_err(BootstrapError::query("enumerating instance extensions"))?;
        debug!(
            "available instance extensions: {:?}",
            available.iter().map(|e| e.to_string_lossy()).collect::<Vec<_>>()
        );
        if let Some(missing) = first_missing(&available, window_extensions) {
            return Err(BootstrapError::MissingRequiredExtension(lossy(missing)));
        }

        if let Some(cfg) = diagnostics.messenger(DEBUG_TAG) {
            let messenger = ctx
                .driver
                .create_debug_messenger(&cfg)
                .map_err(BootstrapError::DebugMessengerFailed)?;
            ctx.messenger = Some(messenger);
        }

        info!(
            "instance created ({} extensions, validation {})",
            desc.extensions.len(),
            if diagnostics.is_enabled() { "on" } else { "off" }
        );
        Ok(ctx)
    }

    pub fn driver(&self) -> &I {
        &self.driver
    }

    pub fn has_messenger(&self) -> bool {
        self.messenger.is_some()
    }
}

impl<I: InstanceDriver> Drop for InstanceContext<I> {
    fn drop(&mut self) {
        // SAFETY: surfaces and devices borrow this context, so they are gone.
        // The messenger was registered on this instance and is released once.
        unsafe {
            if let Some(messenger) = self.messenger.take() {
                self.driver.destroy_debug_messenger(messenger);
            }
            self.driver.destroy_instance();
        }
    }
}
