//! Telemetry initialization.
//!
//! Controlled by two environment variables:
//! - `SEMCHECK_LOG` → `EnvFilter` directives (default `warn`, which shows
//!   every recorded failure)
//! - `SEMCHECK_LOG_FORMAT=json` → JSON events to stderr; anything else →
//!   compact human-readable lines
//!
//! Test binaries call [`init`] at the top of each test; only the first call
//! installs a subscriber.

use std::sync::Once;

use tracing_subscriber::EnvFilter;

/// Environment variable holding filter directives.
pub const LOG_ENV_VAR: &str = "SEMCHECK_LOG";

/// Environment variable selecting the output format.
pub const FORMAT_ENV_VAR: &str = "SEMCHECK_LOG_FORMAT";

static INIT: Once = Once::new();

/// Opaque guard returned by [`init`]. Hold it for as long as output is
/// wanted; dropping it flushes stderr.
pub struct TelemetryGuard {
    _private: (),
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        use std::io::Write as _;
        let _ = std::io::stderr().flush();
    }
}

/// Install the global subscriber, once per process.
#[must_use]
pub fn init() -> TelemetryGuard {
    INIT.call_once(|| {
        let json = std::env::var(FORMAT_ENV_VAR).is_ok_and(|f| f.eq_ignore_ascii_case("json"));
        if json {
            init_json();
        } else {
            init_compact();
        }
    });
    TelemetryGuard { _private: () }
}

fn filter() -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV_VAR).unwrap_or_else(|_| EnvFilter::new("warn"))
}

/// JSON events to stderr via tracing-subscriber's JSON formatter.
fn init_json() {
    use tracing_subscriber::layer::SubscriberExt as _;
    use tracing_subscriber::util::SubscriberInitExt as _;

    let _ = tracing_subscriber::registry()
        .with(filter())
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(std::io::stderr)
                .with_span_events(tracing_subscriber::fmt::format::FmtSpan::CLOSE),
        )
        .try_init();
}

fn init_compact() {
    use tracing_subscriber::layer::SubscriberExt as _;
    use tracing_subscriber::util::SubscriberInitExt as _;

    let _ = tracing_subscriber::registry()
        .with(filter())
        .with(
            tracing_subscriber::fmt::layer()
                .compact()
                .with_writer(std::io::stderr),
        )
        .try_init();
}
