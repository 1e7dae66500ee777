use {
    std::sync::Once,
    tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt},
};

/// Initializes the global tracing subscriber. Logs go to stderr so that
/// binaries can keep stdout for their own output.
///
/// Panics if a global subscriber is already installed. Use
/// [`initialize_reentrant`] when that can happen, e.g. in tests.
pub fn initialize(env_filter: &str, use_json: bool) {
    set_tracing_subscriber(env_filter, use_json);
    tracing::debug!(%env_filter, use_json, "initialized tracing");
}

/// Like [`initialize`] but can be called multiple times in a row. Later
/// calls are ignored.
pub fn initialize_reentrant(env_filter: &str) {
    static ONCE: Once = Once::new();
    ONCE.call_once(|| set_tracing_subscriber(env_filter, false));
}

fn set_tracing_subscriber(env_filter: &str, use_json: bool) {
    let filter = EnvFilter::try_new(env_filter).unwrap_or_else(|err| {
        eprintln!("invalid log filter {env_filter:?}: {err}, falling back to \"info\"");
        EnvFilter::new("info")
    });
    let registry = tracing_subscriber::registry().with(filter);

    if use_json {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}
