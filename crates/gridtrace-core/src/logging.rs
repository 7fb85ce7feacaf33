//! Structured logging for the engine and the command line
//!
//! Every per-state run happens inside a [`state_span`], so JSON output can be
//! split by network state. Phase timings go to the `gridtrace_core::timing`
//! target at trace level.

use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::trace::NetworkState;

/// Crates the level flags apply to
const TARGETS: [&str; 2] = ["gridtrace", "gridtrace_core"];

/// Environment variable holding filter directives; wins over the CLI flags
pub const LOG_ENV: &str = "GRIDTRACE_LOG";

/// Log how long a processing phase took, with optional extra fields.
///
/// ```rust,ignore
/// let start = Instant::now();
/// let traced = /* ... */;
/// trace_time!(start, "set_direction", heads = traced);
/// ```
#[macro_export]
macro_rules! trace_time {
    ($start:expr, $phase:expr $(, $field:ident = $value:expr)*) => {
        tracing::trace!(
            target: "gridtrace_core::timing",
            phase = $phase,
            elapsed_us = ($start.elapsed().as_micros() as u64)
            $(, $field = $value)*
        );
    };
}

/// Span wrapping the direction and feeder passes for one network state
pub fn state_span(state: NetworkState) -> tracing::Span {
    tracing::info_span!("network_state", state = %state)
}

/// Filter directives for `level`, applied to every gridtrace crate.
///
/// Anything that already looks like a directive list is passed through.
fn directives(level: &str) -> String {
    if level.contains('=') || level.contains(',') {
        return level.to_string();
    }
    TARGETS
        .iter()
        .map(|target| format!("{target}={level}"))
        .collect::<Vec<_>>()
        .join(",")
}

/// Initialize structured logging on stderr.
///
/// `--log-level` beats `--verbose`; [`LOG_ENV`] and then `RUST_LOG` beat both.
pub fn init_tracing(
    verbose: bool,
    log_level: Option<&str>,
    log_json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let level = log_level.unwrap_or(if verbose { "debug" } else { "warn" });
    let filter = match EnvFilter::try_from_env(LOG_ENV) {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(directives(level)))?,
    };

    let registry = tracing_subscriber::registry().with(filter);
    if log_json {
        // Close events carry span timings, so each state reports its duration
        let layer = fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(true)
            .with_span_events(FmtSpan::CLOSE)
            .with_writer(std::io::stderr);
        registry.with(layer).try_init()?;
    } else {
        let layer = fmt::layer()
            .compact()
            .with_target(false)
            .with_ansi(false)
            .with_writer(std::io::stderr);
        registry.with(layer).try_init()?;
    }
    Ok(())
}
