// SPDX-License-Identifier: CEPL-1.0
#![deny(unsafe_op_in_unsafe_fn)]

/// Installs the process-wide subscriber. `RUST_LOG` wins when set,
/// otherwise everything at `info` and above is shown.
pub fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .try_init();
}

/// Human-readable name of the build flavour this binary was compiled in.
pub fn build_mode() -> &'static str {
    if cfg!(debug_assertions) {
        "debug mode"
    } else {
        "release mode"
    }
}
