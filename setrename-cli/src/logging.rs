use std::env;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

/// Install the stderr logger. The filter comes from `SETRENAME_LOG`, default `error`.
///
/// Per-file warnings are already part of command output, so they are only
/// logged when asked for (`SETRENAME_LOG=warn` or `debug`).
pub fn init_logger(use_color: bool) {
    let default_filter = "error";
    let filter = env::var("SETRENAME_LOG").unwrap_or_else(|_| default_filter.to_string());
    let filter_layer = EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .without_time()
                .with_ansi(use_color),
        )
        .with(filter_layer)
        .init();
}
