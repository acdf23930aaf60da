use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_FILTER: &str = "sprout=info,sprout_core=info,warp=info";

/// Installs the global subscriber, `RUST_LOG` overrides the default filter
pub fn init() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER)))
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Per request span, shared by all transports
pub fn request_span(transport: &'static str, command: &str) -> tracing::Span {
    tracing::info_span!(
        "request",
        transport,
        command,
        request_id = %uuid::Uuid::new_v4()
    )
}
