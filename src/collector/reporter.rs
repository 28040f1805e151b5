use crate::domain::{CapturedError, Event, ReportOptions};
use crate::sender::Transport;
use std::sync::Arc;

#[cfg(test)]
use mockall::automock;

/// Event-capture API of the host monitoring client.
///
/// Turning a report into an envelope is the host's job; interceptors only
/// decide which of the two calls to make and with what options.
#[cfg_attr(test, automock)]
pub trait Reporter: Send + Sync {
    fn capture_exception(&self, error: &CapturedError, options: ReportOptions);
    fn capture_message(&self, message: &str, options: ReportOptions);
}

/// Pre-send hook, invoked with the outgoing event.
pub type DataCallback = Box<dyn Fn(&mut Event) + Send + Sync>;

/// Registration surface of the host client.
pub trait MonitorHost: Reporter {
    /// Replaces the host's default delivery mechanism.
    fn set_transport(&self, transport: Arc<dyn Transport>);
    fn set_data_callback(&self, callback: DataCallback);
}
