//! Domain layer for rask-monitor-agent.
//!
//! Contains the canonical types shared across all modules:
//! - `Severity`: Intercepted log severity (Debug/Info/Warn/Error)
//! - `LogArgument` / `CapturedError`: Arguments of a log call and the error-like values among them
//! - `Event`: The outgoing record handed to the normalizer and the transport
//! - `ReportOptions`: What the interceptors attach to a report
//! - `AgentError`: Top-level error type

pub mod argument;
pub mod error;
pub mod event;
pub mod report;
pub mod severity;

pub use argument::{CapturedError, LogArgument};
pub use error::AgentError;
pub use event::{Event, Exception, ExceptionValues, Frame, Stacktrace};
pub use report::{Extra, ReportOptions};
pub use severity::{ParseSeverityError, Severity};
