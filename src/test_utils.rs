#[cfg(test)]
pub mod test_utils {
    use crate::config::{build_app_state, AppConfig};
    use crate::router::create_router;
    use axum::Router;
    use dashboard::testing::fixture_store;
    use tracing::Level;
    use tracing_subscriber::FmtSubscriber;

    /// Configuration used by tests, independent of files and environment
    pub fn test_config() -> AppConfig {
        AppConfig {
            bind_address: "127.0.0.1:0".to_string(),
            data_dir: "data".into(),
            default_region: dashboard::DEFAULT_REGION,
            default_horizon: dashboard::DEFAULT_HORIZON,
            regions: None,
            cell_size: dashboard::store::DEFAULT_CELL_SIZE,
            keep_gaps: false,
            session_idle_secs: 300,
            max_sessions: 100,
            request_timeout_secs: 30,
        }
    }

    /// Initialize tracing for tests with output to STDERR.
    ///
    /// The log level is determined by the RUST_LOG environment variable,
    /// defaulting to WARN if not set.
    fn init_test_tracing() -> tracing::subscriber::DefaultGuard {
        let log_level = std::env::var("RUST_LOG")
            .ok()
            .and_then(|level| match level.to_uppercase().as_str() {
                "ERROR" => Some(Level::ERROR),
                "WARN" => Some(Level::WARN),
                "INFO" => Some(Level::INFO),
                "DEBUG" => Some(Level::DEBUG),
                "TRACE" => Some(Level::TRACE),
                _ => None,
            })
            .unwrap_or(Level::WARN);

        let subscriber = FmtSubscriber::builder()
            .with_max_level(log_level)
            .with_writer(std::io::stderr) // Output to stderr, which is captured by tests
            .finish();
        tracing::subscriber::set_default(subscriber)
    }

    /// Create axum app for testing
    pub fn setup_test_app() -> (Router, tracing::subscriber::DefaultGuard) {
        setup_test_app_with(test_config())
    }

    /// Create axum app over the fixture dataset with a custom configuration
    pub fn setup_test_app_with(config: AppConfig) -> (Router, tracing::subscriber::DefaultGuard) {
        let guard = init_test_tracing();
        let state = build_app_state(fixture_store(), &config)
            .expect("Failed to build test application state");
        (create_router(state), guard)
    }
}
