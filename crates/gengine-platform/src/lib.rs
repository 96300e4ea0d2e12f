// SPDX-License-Identifier: CEPL-1.0
#![deny(unsafe_op_in_unsafe_fn)]
use std::ffi::CStr;
use std::os::raw::c_char;
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use gengine_wsi::{FramebufferSize, WindowSystem};
use raw_window_handle::{HasDisplayHandle, HasWindowHandle, RawDisplayHandle, RawWindowHandle};
use tracing::{debug, info};
use winit::{
    application::ApplicationHandler,
    dpi::LogicalSize,
    error::OsError,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, EventLoop},
    platform::pump_events::{EventLoopExtPumpEvents, PumpStatus},
    window::{Window, WindowAttributes, WindowId},
};

const POLL_TIMEOUT: Duration = Duration::from_millis(16);

#[derive(Clone, Debug)]
pub struct WindowConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: String::from("Vulkan"),
            width: 800,
            height: 600,
        }
    }
}

struct Shell {
    attributes: WindowAttributes,
    window: Option<Window>,
    create_error: Option<OsError>,
    close_requested: bool,
}

impl ApplicationHandler for Shell {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        match event_loop.create_window(self.attributes.clone()) {
            Ok(window) => {
                let size = window.inner_size();
                info!("window open ({}x{})", size.width, size.height);
                self.window = Some(window);
            }
            Err(e) => {
                self.create_error = Some(e);
                event_loop.exit();
            }
        }
    }

    fn window_event(&mut self, _event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        if let WindowEvent::CloseRequested = event {
            info!("CloseRequested");
            self.close_requested = true;
        }
    }
}

/// A fixed-size, non-resizable native window driven by pumping winit's event
/// loop from the caller's own loop.
pub struct WinitWindow {
    event_loop: EventLoop<()>,
    shell: Shell,
}

impl WinitWindow {
    pub fn open(config: &WindowConfig) -> Result<Self> {
        let event_loop = EventLoop::new().context("creating event loop")?;
        let attributes = Window::default_attributes()
            .with_title(config.title.clone())
            .with_inner_size(LogicalSize::new(config.width, config.height))
            .with_resizable(false);

        let mut this = Self {
            event_loop,
            shell: Shell {
                attributes,
                window: None,
                create_error: None,
                close_requested: false,
            },
        };

        // The window can only be created once the loop reports it is resumed.
        loop {
            let status = this
                .event_loop
                .pump_app_events(Some(Duration::ZERO), &mut this.shell);
            if let Some(e) = this.shell.create_error.take() {
                return Err(anyhow!(e).context("creating window"));
            }
            if this.shell.window.is_some() {
                break;
            }
            if let PumpStatus::Exit(code) = status {
                bail!("event loop exited ({code}) before the window opened");
            }
        }

        Ok(this)
    }

    fn window(&self) -> Result<&Window> {
        self.shell.window.as_ref().context("window already closed")
    }
}

/// # Safety
/// Every pointer must be a valid NUL-terminated string.
unsafe fn extension_names(ptrs: &[*const c_char]) -> Vec<String> {
    ptrs.iter()
        .map(|&p| unsafe { CStr::from_ptr(p) }.to_string_lossy().into_owned())
        .collect()
}

impl WindowSystem for WinitWindow {
    fn required_instance_extensions(&self) -> Result<Vec<String>> {
        let display = self.window()?.display_handle()?.as_raw();
        let ptrs = ash_window::enumerate_required_extensions(display)
            .context("window system has no Vulkan support")?;
        // SAFETY: ash-window hands back pointers to static extension names.
        let names = unsafe { extension_names(ptrs) };
        debug!("window system wants {names:?}");
        Ok(names)
    }

    fn raw_handles(&self) -> Result<(RawDisplayHandle, RawWindowHandle)> {
        let window = self.window()?;
        Ok((
            window.display_handle()?.as_raw(),
            window.window_handle()?.as_raw(),
        ))
    }

    fn framebuffer_size(&self) -> FramebufferSize {
        let size = self
            .shell
            .window
            .as_ref()
            .map(Window::inner_size)
            .unwrap_or_default();
        FramebufferSize {
            width: size.width,
            height: size.height,
        }
    }

    fn should_close(&self) -> bool {
        self.shell.close_requested || self.shell.window.is_none()
    }

    fn poll_events(&mut self) {
        let status = self
            .event_loop
            .pump_app_events(Some(POLL_TIMEOUT), &mut self.shell);
        if let PumpStatus::Exit(code) = status {
            debug!("event loop exited ({code})");
            self.shell.close_requested = true;
        }
    }
}
