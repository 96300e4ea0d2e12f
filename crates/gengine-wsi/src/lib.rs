// SPDX-License-Identifier: CEPL-1.0
use anyhow::Result;
use raw_window_handle::{RawDisplayHandle, RawWindowHandle};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FramebufferSize {
    pub width: u32,
    pub height: u32,
}

/// What the graphics bootstrap needs from whatever owns the window.
///
/// The handles returned by [`raw_handles`](WindowSystem::raw_handles) must stay
/// valid for as long as the implementor is alive; surfaces created from them
/// rely on that.
pub trait WindowSystem {
    /// Instance extensions the window system needs to present.
    fn required_instance_extensions(&self) -> Result<Vec<String>>;

    fn raw_handles(&self) -> Result<(RawDisplayHandle, RawWindowHandle)>;

    /// Current size of the drawable area in pixels.
    fn framebuffer_size(&self) -> FramebufferSize;

    fn should_close(&self) -> bool;
    fn poll_events(&mut self);
}
