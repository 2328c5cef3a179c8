//! Startup helpers for the open-data agent server.

use std::process::ExitCode;

use crate::agent::AgentConfig;
use crate::server::{self, AppState};

/// Environment variable overriding the server port.
const PORT_ENV: &str = "OPENDATA_PORT";

/// Environment variable overriding the intent model name.
const MODEL_ENV: &str = "OPENDATA_MODEL";

/// Environment variable overriding the Ollama base URL.
const OLLAMA_URL_ENV: &str = "OPENDATA_OLLAMA_URL";

/// Environment variable overriding the CKAN portal base URL.
const CKAN_URL_ENV: &str = "OPENDATA_CKAN_URL";

/// Run the server.
///
/// # Returns
/// `ExitCode::SUCCESS` on graceful shutdown, `1` on failure.
#[must_use]
pub fn run() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    tracing::info!("Starting Open Data Agent v{}", env!("CARGO_PKG_VERSION"));

    let config = config_from_env();
    tracing::info!("CKAN portal: {}", config.gateway.ckan.base_url);
    tracing::info!("Intent model: {}", config.llm.model);

    let state = match AppState::new(config) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!("Failed to create state: {e}");
            return ExitCode::from(1);
        }
    };

    let port = get_port();

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            tracing::error!("Failed to create runtime: {e}");
            return ExitCode::from(1);
        }
    };

    if let Err(e) = rt.block_on(server::run_server(state, port)) {
        tracing::error!("Server error: {e}");
        return ExitCode::from(1);
    }

    ExitCode::SUCCESS
}

/// Build the agent config, applying environment overrides.
fn config_from_env() -> AgentConfig {
    let mut config = AgentConfig::default();

    if let Ok(model) = std::env::var(MODEL_ENV) {
        config.llm.model = model;
    }
    if let Ok(base_url) = std::env::var(OLLAMA_URL_ENV) {
        config.llm.base_url = Some(base_url);
    }
    if let Ok(base_url) = std::env::var(CKAN_URL_ENV) {
        config.gateway.ckan.base_url = base_url;
    }

    config
}

/// Read the server port from the environment, falling back to the default.
fn get_port() -> u16 {
    std::env::var(PORT_ENV)
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(server::DEFAULT_PORT)
}
