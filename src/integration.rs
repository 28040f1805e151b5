//! Entry points that wire the agent into a host monitoring client.
//!
//! - [`install_console`]: reports every call made through the console facility
//! - [`install_mobile`]: HTTP delivery, path normalization and the uncaught-error chain

use crate::app::Config;
use crate::collector::{
    ChainOptions, Console, ConsoleInterceptor, ExceptionHandlerChain, HandlerSlot, MonitorHost,
    Reporter,
};
use crate::domain::{AgentError, Severity};
use crate::normalizer::PathNormalizer;
use crate::sender::{ClientConfig, HttpTransport};
use std::sync::Arc;
use tracing::info;

#[derive(Debug, Clone, Default)]
pub struct ConsoleOptions {
    /// Severities to intercept; `None` means all four.
    pub levels: Option<Vec<Severity>>,
}

/// Builds an interceptor over `console` and attaches it.
pub fn install_console(
    console: Arc<Console>,
    reporter: Arc<dyn Reporter>,
    options: ConsoleOptions,
) -> ConsoleInterceptor {
    let interceptor = ConsoleInterceptor::new(console, reporter, options.levels);
    let attached = interceptor.attach();
    info!("Console integration installed ({} severities)", attached);
    interceptor
}

#[derive(Debug, Clone, Default)]
pub struct MobileOptions {
    /// Replacement for the default bundle-prefix pattern.
    pub path_strip: Option<String>,
    pub no_rethrow: bool,
    pub client: ClientConfig,
}

/// Registers the HTTP transport and the path normalizer with `host`, then
/// chains the global handler in `slot`.
///
/// Nothing is registered when the pattern or the client configuration is invalid.
pub fn install_mobile<H>(
    host: Arc<H>,
    slot: Arc<dyn HandlerSlot>,
    options: MobileOptions,
) -> Result<ExceptionHandlerChain, AgentError>
where
    H: MonitorHost + 'static,
{
    let normalizer = match &options.path_strip {
        Some(pattern) => PathNormalizer::with_pattern(pattern)?,
        None => PathNormalizer::new(),
    };
    let transport = HttpTransport::new(options.client)?;

    host.set_transport(Arc::new(transport));
    host.set_data_callback(normalizer.into_callback());

    let reporter: Arc<dyn Reporter> = host;
    let chain = ExceptionHandlerChain::install(
        slot,
        reporter,
        ChainOptions {
            no_rethrow: options.no_rethrow,
        },
    );

    info!(
        "Mobile integration installed (no_rethrow: {})",
        options.no_rethrow
    );
    Ok(chain)
}

impl Config {
    pub fn console_options(&self) -> ConsoleOptions {
        ConsoleOptions {
            levels: Some(self.levels.clone()),
        }
    }

    pub fn mobile_options(&self) -> MobileOptions {
        MobileOptions {
            path_strip: self.path_strip.clone(),
            no_rethrow: self.no_rethrow,
            client: self.client_config(),
        }
    }
}
