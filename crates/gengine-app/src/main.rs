// SPDX-License-Identifier: CEPL-1.0
#![deny(unsafe_op_in_unsafe_fn)]
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use gengine_core::{build_mode, init_tracing};
use gengine_platform::WinitWindow;
use gengine_vk::{AshDriver, BootstrapSummary, Engine};
use tracing::{error, info};

mod config;

use config::{AppCfg, PresentModeCfg};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the TOML config file
    #[arg(long, default_value = "gengine.toml")]
    config: PathBuf,

    /// Bring up instance and device only, without a window
    #[arg(long)]
    headless: bool,

    #[arg(long)]
    width: Option<u32>,

    #[arg(long)]
    height: Option<u32>,

    /// Preferred present mode; FIFO is used when it is unavailable
    #[arg(long, value_enum)]
    present_mode: Option<PresentModeCfg>,
}

fn run(args: Args) -> Result<BootstrapSummary> {
    let mut cfg = AppCfg::load(&args.config);
    cfg.apply_overrides(args.width, args.height, args.present_mode);

    let engine = Engine::new(cfg.engine_settings()?);
    info!(
        "validation layers {}",
        if engine.diagnostics().is_enabled() { "enabled" } else { "disabled" }
    );
    let driver = AshDriver::load()?;

    if args.headless {
        return Ok(engine.run_headless(&driver)?);
    }

    let mut window = WinitWindow::open(&cfg.window_config())?;
    Ok(engine.run(&driver, &mut window)?)
}

fn log_summary(summary: &BootstrapSummary) {
    info!(
        "device = {}, queue families = {:?}/{:?}, {} queue(s) created, aliased = {}",
        summary.device_name,
        summary.queue_families.graphics,
        summary.queue_families.present,
        summary.queue_create_count,
        summary.queues_alias,
    );
    if let Some(sc) = &summary.swapchain {
        info!(
            "swapchain = {}x{} {:?}, {:?}, {} images / {} views",
            sc.config.extent.width,
            sc.config.extent.height,
            sc.config.format,
            sc.config.present_mode,
            sc.image_count,
            sc.view_count,
        );
    }
}

fn main() -> ExitCode {
    init_tracing();
    info!("running in {}", build_mode());
    let args = Args::parse();

    match run(args) {
        Ok(summary) => {
            log_summary(&summary);
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}
