use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub use tracing::{debug, error, info, instrument, trace, warn, Level};

/// Initialize the tracing system
///
/// `RUST_LOG` takes precedence; otherwise the level is derived from the
/// number of `-v` flags given on the command line. Diagnostics go to stderr
/// so they never interleave with the build report on stdout.
pub fn init(verbosity: u8) -> Result<(), Box<dyn std::error::Error + Send + Sync + 'static>> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_directive(verbosity)))?;

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(is_tty())
        .compact()
        .with_target(false)
        .with_thread_ids(false)
        .with_level(true);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init()?;

    Ok(())
}

fn default_directive(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

fn is_tty() -> bool {
    std::io::IsTerminal::is_terminal(&std::io::stderr())
}

/// Emit a structured event for a cache lookup
pub fn cache_event(script: &str, hit: bool, operation: &str) {
    if hit {
        debug!(script = %script, operation = %operation, "cache_hit");
    } else {
        debug!(script = %script, operation = %operation, "cache_miss");
    }
}

/// Emit a structured event for a finished host invocation
pub fn script_completed(script: &str, duration_ms: u64, success: bool) {
    if success {
        info!(script = %script, duration_ms = %duration_ms, "script_completed");
    } else {
        error!(script = %script, duration_ms = %duration_ms, "script_failed");
    }
}
