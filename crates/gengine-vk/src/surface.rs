// SPDX-License-Identifier: CEPL-1.0
use ash::vk;
use gengine_wsi::WindowSystem;

use crate::driver::InstanceDriver;
use crate::error::{BootstrapError, Result};
use crate::instance::InstanceContext;

/// A presentation surface bound to one instance. Borrowing the instance
/// keeps the surface from outliving it.
pub struct SurfaceContext<'i, I: InstanceDriver> {
    instance: &'i InstanceContext<I>,
    handle: vk::SurfaceKHR,
}

impl<'i, I: InstanceDriver> SurfaceContext<'i, I> {
    pub fn create<W>(instance: &'i InstanceContext<I>, window: &W) -> Result<Self>
    where
        W: WindowSystem + ?Sized,
    {
        let (display, win) = window
            .raw_handles()
            .map_err(|e| BootstrapError::SurfaceCreationFailed(format!("{e:#}")))?;

        // SAFETY: the window system guarantees its handles stay valid while it
        // is alive, and it outlives the whole bootstrap.
        let handle = unsafe { instance.driver().create_surface(display, win) }
            .map_err(|e| BootstrapError::SurfaceCreationFailed(e.to_string()))?;

        Ok(Self { instance, handle })
    }

    pub fn handle(&self) -> vk::SurfaceKHR {
        self.handle
    }
}

impl<I: InstanceDriver> Drop for SurfaceContext<'_, I> {
    fn drop(&mut self) {
        // SAFETY: swapchains borrow the surface, so none remain.
        unsafe { self.instance.driver().destroy_surface(self.handle) };
    }
}
