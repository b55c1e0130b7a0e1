use once_cell::sync::OnceCell;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

static LOGGER_INIT: OnceCell<LogFormat> = OnceCell::new();

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogFormat {
    /// Multi-line human output for terminals.
    Pretty,
    /// One JSON object per event, for log shippers.
    Json,
}

impl LogFormat {
    /// `production` selects JSON; anything else is pretty.
    pub fn for_app_env(app_env: Option<&str>) -> Self {
        match app_env {
            Some(env) if env.eq_ignore_ascii_case("production") => LogFormat::Json,
            _ => LogFormat::Pretty,
        }
    }
}

/// Installs the global subscriber on first call and returns the format in
/// effect. Later calls keep the first format.
///
/// `RUST_LOG` overrides the default `info` filter. If some other subscriber
/// is already installed (a test harness, for instance) it is left alone.
pub fn init_tracing(service: &'static str, format: LogFormat) -> LogFormat {
    *LOGGER_INIT.get_or_init(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        let (json, pretty) = match format {
            LogFormat::Json => (
                Some(
                    fmt::layer()
                        .json()
                        .with_current_span(true)
                        .with_span_list(false),
                ),
                None,
            ),
            LogFormat::Pretty => (
                None,
                Some(
                    fmt::layer()
                        .pretty()
                        .with_thread_ids(true)
                        .with_span_events(fmt::format::FmtSpan::CLOSE),
                ),
            ),
        };

        let installed = tracing_subscriber::registry()
            .with(filter)
            .with(json)
            .with(pretty)
            .try_init()
            .is_ok();

        tracing::info!(service, ?format, installed, "logger initialized");
        format
    })
}
