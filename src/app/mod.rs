pub mod config;
pub mod logging_system;

pub use config::{Config, ConfigError, LogLevel};
pub use logging_system::{
    InitializationError, LoggingSystem, setup_logging, setup_logging_with_capture,
};

use crate::domain::{AgentError, Event, ReportOptions};
use crate::sender::{DeliveryOutcome, DeliveryRequest, HttpTransport};
use tracing::{error, info, warn};

/// Logger tag of the probe event.
pub const PROBE_LOGGER: &str = "rask-monitor-agent";

/// Builds the probe event for `config`, normalized the same way a captured event would be.
pub fn probe_event(config: &Config) -> Result<Event, AgentError> {
    let options = ReportOptions {
        logger: Some(PROBE_LOGGER.to_string()),
        ..ReportOptions::default()
    };
    let mut event = Event::from_message(&config.message, &options);
    event.culprit = config.culprit.clone();

    config.path_normalizer()?.normalize(&mut event);
    Ok(event)
}

/// Sends one probe event through the HTTP transport and waits for its outcome.
pub async fn run(config: &Config) -> Result<DeliveryOutcome, AgentError> {
    let event = probe_event(config)?;
    let event_id = event.event_id.clone();
    let data = serde_json::to_value(&event)?;

    let transport = HttpTransport::new(config.client_config())?;
    let request =
        DeliveryRequest::new(config.endpoint.as_str(), data).with_auth_params(config.auth_params.clone());

    info!(
        "Sending probe event {} to {} (culprit: {:?})",
        event_id, config.endpoint, event.culprit
    );

    transport
        .dispatch(request)
        .await
        .map_err(|e| AgentError::Delivery(format!("Delivery task failed: {}", e)))
}

pub fn get_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

// Main entry point for the probe binary
pub async fn main() -> anyhow::Result<()> {
    let config = Config::from_args_and_env(std::env::args())?;

    if let Err(e) = setup_logging(config.log_level) {
        eprintln!("Continuing without structured logging: {e}");
    }

    info!("Starting rask-monitor-agent v{}", get_version());
    info!(
        "Configuration: endpoint={}, levels={:?}, origin={}, no_rethrow={}",
        config.endpoint, config.levels, config.origin, config.no_rethrow
    );

    match run(&config).await {
        Ok(DeliveryOutcome::Delivered) => {
            info!("Probe event delivered");
            Ok(())
        }
        Ok(DeliveryOutcome::Failed { status }) => {
            warn!("Probe event rejected (status {:?})", status);
            anyhow::bail!("probe delivery to {} failed (status {:?})", config.endpoint, status)
        }
        Err(e) => {
            error!("Probe failed: {}", e);
            Err(e.into())
        }
    }
}
