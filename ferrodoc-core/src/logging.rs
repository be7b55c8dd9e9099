//! Logging setup for ferrodoc.
//!
//! The crates only emit `tracing` events; nothing is printed unless a
//! subscriber is installed. [`init`] installs one, controlled by environment
//! variables:
//!
//! - `FERRODOC_DEBUG=true|1|yes` - enable debug logging
//! - `FERRODOC_LOG_LEVEL=trace|debug|info|warn|error` - set a specific level
//! - `FERRODOC_LOG_FORMAT=json|pretty|compact` - output format (default: json)
//!
//! Command dispatch logs each stage transition at `trace`, so
//! `FERRODOC_LOG_LEVEL=trace` shows every command moving through
//! bound, validated, dispatched and completed.
//!
//! ```rust,no_run
//! use ferrodoc_core::logging;
//!
//! // Call once at startup.
//! logging::init();
//! ```

use std::env;
use std::sync::Once;

static INIT: Once = Once::new();

/// Resolve the level from `FERRODOC_DEBUG` and `FERRODOC_LOG_LEVEL`.
///
/// `None` when neither is set; an unknown level falls back to `debug` or
/// `warn` depending on the debug flag.
fn resolve_level(debug: Option<&str>, level: Option<&str>) -> Option<&'static str> {
    let debug = debug.is_some_and(|v| matches!(v.to_lowercase().as_str(), "true" | "1" | "yes"));
    let fallback = if debug { "debug" } else { "warn" };
    match level.map(str::to_lowercase).as_deref() {
        Some("trace") => Some("trace"),
        Some("debug") => Some("debug"),
        Some("info") => Some("info"),
        Some("warn") => Some("warn"),
        Some("error") => Some("error"),
        Some(_) => Some(fallback),
        None => debug.then_some(fallback),
    }
}

#[cfg_attr(not(feature = "tracing-subscriber"), allow(dead_code))]
fn resolve_format(format: Option<&str>) -> &'static str {
    match format.map(str::to_lowercase).as_deref() {
        Some("pretty") => "pretty",
        Some("compact") => "compact",
        _ => "json",
    }
}

/// Initialize logging. Subsequent calls are no-ops.
///
/// Does nothing unless `FERRODOC_DEBUG` or `FERRODOC_LOG_LEVEL` is set, or
/// when built without the `tracing-subscriber` feature.
pub fn init() {
    INIT.call_once(|| {
        let debug = env::var("FERRODOC_DEBUG").ok();
        let level = env::var("FERRODOC_LOG_LEVEL").ok();
        let Some(level) = resolve_level(debug.as_deref(), level.as_deref()) else {
            return;
        };

        #[cfg(feature = "tracing-subscriber")]
        {
            use tracing_subscriber::{EnvFilter, fmt, prelude::*};

            let format = resolve_format(env::var("FERRODOC_LOG_FORMAT").ok().as_deref());
            let filter = EnvFilter::new(format!(
                "ferrodoc={level},ferrodoc_core={level},ferrodoc_mongodb={level}"
            ));

            match format {
                "json" => {
                    tracing_subscriber::registry()
                        .with(filter)
                        .with(fmt::layer().json())
                        .init();
                }
                "compact" => {
                    tracing_subscriber::registry()
                        .with(filter)
                        .with(fmt::layer().compact())
                        .init();
                }
                _ => {
                    tracing_subscriber::registry()
                        .with(filter)
                        .with(fmt::layer().pretty())
                        .init();
                }
            }

            tracing::info!(level, format, "ferrodoc logging initialized");
        }
        #[cfg(not(feature = "tracing-subscriber"))]
        let _ = level;
    });
}
