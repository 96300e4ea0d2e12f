// SPDX-License-Identifier: CEPL-1.0
use std::ffi::CString;
use std::path::Path;
use std::{fs, io};

use anyhow::{Context, Result};
use gengine_platform::WindowConfig;
use gengine_vk::{vk, AppInfo, EngineSettings, SwapchainPreferences};
use serde::Deserialize;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
#[value(rename_all = "snake_case")]
pub enum PresentModeCfg {
    #[default]
    Fifo,
    FifoRelaxed,
    Mailbox,
    Immediate,
}

impl PresentModeCfg {
    pub fn to_vk(self) -> vk::PresentModeKHR {
        match self {
            PresentModeCfg::Fifo => vk::PresentModeKHR::FIFO,
            PresentModeCfg::FifoRelaxed => vk::PresentModeKHR::FIFO_RELAXED,
            PresentModeCfg::Mailbox => vk::PresentModeKHR::MAILBOX,
            PresentModeCfg::Immediate => vk::PresentModeKHR::IMMEDIATE,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WindowCfg {
    pub width: u32,
    pub height: u32,
    pub title: String,
}

impl Default for WindowCfg {
    fn default() -> Self {
        let w = WindowConfig::default();
        WindowCfg {
            width: w.width,
            height: w.height,
            title: w.title,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApplicationCfg {
    pub name: String,
    pub engine: String,
}

impl Default for ApplicationCfg {
    fn default() -> Self {
        ApplicationCfg {
            name: "hello triangle".into(),
            engine: "No Engine".into(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(default)]
pub struct SwapchainCfg {
    pub present_mode: PresentModeCfg,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppCfg {
    pub window: WindowCfg,
    pub application: ApplicationCfg,
    pub swapchain: SwapchainCfg,
}

impl AppCfg {
    pub fn parse(s: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(s)
    }

    /// A missing file is normal; anything else wrong with it is reported and
    /// otherwise ignored.
    pub fn load(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(s) => Self::parse(&s).unwrap_or_else(|e| {
                warn!("ignoring {}: {e}", path.display());
                Self::default()
            }),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("no config at {}, using defaults", path.display());
                Self::default()
            }
            Err(e) => {
                warn!("could not read {}: {e}", path.display());
                Self::default()
            }
        }
    }

    pub fn apply_overrides(
        &mut self,
        width: Option<u32>,
        height: Option<u32>,
        present_mode: Option<PresentModeCfg>,
    ) {
        if let Some(w) = width {
            self.window.width = w;
        }
        if let Some(h) = height {
            self.window.height = h;
        }
        if let Some(m) = present_mode {
            self.swapchain.present_mode = m;
        }
    }

    pub fn window_config(&self) -> WindowConfig {
        WindowConfig {
            title: self.window.title.clone(),
            width: self.window.width,
            height: self.window.height,
        }
    }

    pub fn engine_settings(&self) -> Result<EngineSettings> {
        let app = AppInfo {
            name: CString::new(self.application.name.as_str())
                .context("application name contains a NUL byte")?,
            engine_name: CString::new(self.application.engine.as_str())
                .context("engine name contains a NUL byte")?,
            ..AppInfo::default()
        };
        let swapchain = SwapchainPreferences {
            present_mode: self.swapchain.present_mode.to_vk(),
            ..SwapchainPreferences::default()
        };
        Ok(EngineSettings { app, swapchain })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let cfg = AppCfg::parse("").unwrap();
        assert_eq!((cfg.window.width, cfg.window.height), (800, 600));
        assert_eq!(cfg.window.title, "Vulkan");
        assert_eq!(cfg.application.name, "hello triangle");
        assert_eq!(cfg.application.engine, "No Engine");
        assert_eq!(cfg.swapchain.present_mode, PresentModeCfg::Fifo);
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let cfg = AppCfg::parse(
            r#"
            [window]
            width = 1280

            [swapchain]
            present_mode = "fifo_relaxed"
            "#,
        )
        .unwrap();
        assert_eq!((cfg.window.width, cfg.window.height), (1280, 600));
        assert_eq!(cfg.swapchain.present_mode, PresentModeCfg::FifoRelaxed);
        assert_eq!(cfg.application.engine, "No Engine");
    }

    #[test]
    fn unknown_present_mode_is_a_parse_error() {
        assert!(AppCfg::parse("[swapchain]\npresent_mode = \"triple\"").is_err());
    }

    #[test]
    fn cli_and_file_spell_present_modes_alike() {
        use clap::ValueEnum;
        for (name, mode) in [
            ("fifo", PresentModeCfg::Fifo),
            ("fifo_relaxed", PresentModeCfg::FifoRelaxed),
            ("mailbox", PresentModeCfg::Mailbox),
            ("immediate", PresentModeCfg::Immediate),
        ] {
            assert_eq!(PresentModeCfg::from_str(name, false), Ok(mode));
            let cfg = AppCfg::parse(&format!("[swapchain]\npresent_mode = \"{name}\"")).unwrap();
            assert_eq!(cfg.swapchain.present_mode, mode);
        }
        assert!(PresentModeCfg::from_str("fifo-relaxed", false).is_err());
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let cfg = AppCfg::load(Path::new("definitely/not/here.toml"));
        assert_eq!(cfg.window.width, 800);
    }

    #[test]
    fn cli_overrides_win() {
        let mut cfg = AppCfg::parse("[window]\nwidth = 1024\nheight = 768").unwrap();
        cfg.apply_overrides(Some(640), None, Some(PresentModeCfg::Mailbox));
        assert_eq!((cfg.window.width, cfg.window.height), (640, 768));
        assert_eq!(cfg.swapchain.present_mode, PresentModeCfg::Mailbox);
    }

    #[test]
    fn settings_carry_names_and_present_mode() {
        let mut cfg = AppCfg::default();
        cfg.application.name = "demo".into();
        cfg.swapchain.present_mode = PresentModeCfg::Immediate;
        let settings = cfg.engine_settings().unwrap();

        assert_eq!(settings.app.name.as_c_str(), c"demo");
        assert_eq!(settings.app.engine_name.as_c_str(), c"No Engine");
        assert_eq!(settings.swapchain.present_mode, vk::PresentModeKHR::IMMEDIATE);
        assert_eq!(settings.swapchain.format, vk::Format::B8G8R8_SRGB);
    }

    #[test]
    fn nul_in_names_is_rejected() {
        let mut cfg = AppCfg::default();
        cfg.application.name = "bad\0name".into();
        assert!(cfg.engine_settings().is_err());
    }
}
