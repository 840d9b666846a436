use log::LevelFilter;
use std::env;

/// Installs the global logger.
///
/// `RUST_LOG`, if set, takes priority over the default filters. Graphics backends are
/// noisy, so they're muted unless explicitly asked for.
pub fn init(verbose: bool) {
    let mut builder = pretty_env_logger::formatted_builder();
    builder
        .format_indent(None)
        .format_timestamp(None)
        .filter_level(if verbose {
            LevelFilter::Debug
        } else {
            LevelFilter::Info
        })
        .filter_module("wgpu_hal", LevelFilter::Off)
        .filter_module("wgpu_core", LevelFilter::Warn)
        .filter_module("naga", LevelFilter::Off);

    if let Ok(filters) = env::var("RUST_LOG") {
        builder.parse_filters(&filters);
    }

    // Tests and library callers may have installed a logger already
    let _ = builder.try_init();
}
