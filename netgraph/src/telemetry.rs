//! Log output for the mapping libraries.
//!
//! Events from `netgraph` and the device profiles share one compact layer
//! with source locations and span close timings, so the instrumented build
//! phases report how long they took. Everything else (the host binary,
//! dependencies) goes through a plain layer. [`init`] installs both.

use std::io::{self, IsTerminal};

use tracing::Level;
use tracing_subscriber::filter::Directive;
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::time::FormatTime;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};
use tracing_subscriber::{EnvFilter, Layer, filter, fmt, layer::SubscriberExt};

/// Target prefixes treated as library output.
pub const LIBRARY_TARGETS: [&str; 2] = ["netgraph", "device_profiles"];

fn is_library_target(target: &str) -> bool {
    LIBRARY_TARGETS.iter().any(|prefix| target.starts_with(prefix))
}

/// `2025-09-12T10:20:30Z`
#[derive(Clone, Copy, Debug, Default)]
struct UtcSeconds;

impl FormatTime for UtcSeconds {
    fn format_time(&self, w: &mut Writer<'_>) -> std::fmt::Result {
        let stamp = chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true);
        w.write_str(&stamp)
    }
}

/// Layer for library events only.
pub fn library_layer<S>() -> impl Layer<S> + Send + Sync
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
{
    fmt::layer()
        .with_timer(UtcSeconds)
        .with_target(true)
        .with_ansi(io::stdout().is_terminal())
        .with_span_events(fmt::format::FmtSpan::CLOSE)
        .event_format(fmt::format().compact().with_source_location(true))
        .with_filter(filter::filter_fn(|meta| is_library_target(meta.target())))
}

/// Layer for everything the library layer does not take.
pub fn host_layer<S>() -> impl Layer<S> + Send + Sync
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
{
    fmt::layer()
        .with_timer(UtcSeconds)
        .with_target(false)
        .with_ansi(io::stdout().is_terminal())
        .with_filter(filter::filter_fn(|meta| !is_library_target(meta.target())))
}

/// One `target=level` directive per library crate.
pub fn library_directives(level: Level) -> Vec<Directive> {
    let level = level.as_str().to_lowercase();
    LIBRARY_TARGETS
        .iter()
        .filter_map(|target| format!("{target}={level}").parse().ok())
        .collect()
}

/// `RUST_LOG` when set, else `default`; the libraries log at `library_level`.
pub fn env_filter(default: &str, library_level: Level) -> EnvFilter {
    let base = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    library_directives(library_level)
        .into_iter()
        .fold(base, EnvFilter::add_directive)
}

/// Install the global subscriber. Fails when one is already set.
pub fn init(default: &str, library_level: Level) -> Result<(), TryInitError> {
    tracing_subscriber::registry()
        .with(env_filter(default, library_level))
        .with(library_layer())
        .with(host_layer())
        .try_init()
}
