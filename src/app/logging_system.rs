use super::config::LogLevel;
use crate::collector::{CaptureLayer, Console};
use parking_lot::RwLock;
use std::sync::{Arc, Mutex, Once};
use thiserror::Error;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Error, Debug)]
pub enum InitializationError {
    #[error("Logging initialization failed: {details}")]
    LoggingInitFailed {
        details: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

/// Filter directives plus the subscriber they end up in.
pub struct LoggingSystem {
    directives: RwLock<Vec<(String, LogLevel)>>,
}

impl LoggingSystem {
    pub fn new() -> Self {
        Self {
            directives: RwLock::new(Vec::new()),
        }
    }

    pub fn add_directive(&self, target: &str, level: LogLevel) {
        self.directives.write().push((target.to_string(), level));
    }

    /// Quiets the HTTP stack, whose debug output would otherwise drown the agent's own.
    pub fn add_default_directives(&self) {
        for target in ["hyper", "hyper_util", "reqwest", "h2", "rustls"] {
            self.add_directive(target, LogLevel::Warn);
        }
    }

    pub fn build_filter_string(&self, default_level: LogLevel) -> String {
        let directives = self.directives.read();

        let mut filter_parts = Vec::with_capacity(directives.len() + 1);
        filter_parts.push(default_level.as_str().to_string());
        for (target, level) in directives.iter() {
            filter_parts.push(format!("{}={}", target, level.as_str()));
        }

        filter_parts.join(",")
    }

    pub fn directive_count(&self) -> usize {
        self.directives.read().len()
    }

    /// Installs the global subscriber. With `capture`, tracing events are also
    /// routed into that console (see [`CaptureLayer`]).
    pub fn initialize_tracing(
        &self,
        default_level: LogLevel,
        capture: Option<Arc<Console>>,
    ) -> Result<(), InitializationError> {
        let filter_string = self.build_filter_string(default_level);

        let env_filter =
            EnvFilter::try_new(&filter_string).map_err(|e| InitializationError::LoggingInitFailed {
                details: format!("Failed to create EnvFilter with '{}'", filter_string),
                source: Box::new(e),
            })?;

        let subscriber = tracing_subscriber::registry()
            .with(env_filter)
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_level(true)
                    .with_writer(std::io::stderr)
                    .compact(),
            )
            .with(capture.map(CaptureLayer::new));

        tracing::subscriber::set_global_default(subscriber).map_err(|e| {
            InitializationError::LoggingInitFailed {
                details: "Failed to set global tracing subscriber".to_string(),
                source: Box::new(e),
            }
        })?;

        Ok(())
    }
}

impl Default for LoggingSystem {
    fn default() -> Self {
        Self::new()
    }
}

/// One-time process-wide logging setup; later calls report the first outcome.
pub fn setup_logging(level: LogLevel) -> Result<(), InitializationError> {
    setup_logging_with_capture(level, None)
}

/// Like [`setup_logging`], additionally routing `tracing` events into `capture`.
pub fn setup_logging_with_capture(
    level: LogLevel,
    capture: Option<Arc<Console>>,
) -> Result<(), InitializationError> {
    static INIT: Once = Once::new();
    static INIT_SUCCESS: Mutex<bool> = Mutex::new(false);

    INIT.call_once(|| {
        let logging_system = LoggingSystem::new();
        logging_system.add_default_directives();

        match logging_system.initialize_tracing(level, capture) {
            Ok(()) => {
                if let Ok(mut success) = INIT_SUCCESS.lock() {
                    *success = true;
                }
            }
            Err(e) => eprintln!("Warning: {e}"),
        }
    });

    if INIT_SUCCESS.lock().map(|success| *success).unwrap_or(false) {
        Ok(())
    } else {
        Err(InitializationError::LoggingInitFailed {
            details: "Logging system initialization failed".to_string(),
            source: Box::new(std::io::Error::other("Logging initialization error")),
        })
    }
}
