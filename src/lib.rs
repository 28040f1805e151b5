#![deny(warnings, rust_2024_compatibility)]
// Specific pedantic lints enforced (not blanket allow):
#![deny(
    clippy::explicit_iter_loop,
    clippy::manual_let_else,
    clippy::semicolon_if_nothing_returned,
    clippy::inconsistent_struct_constructor
)]
// Noisy pedantic lints suppressed with justification:
#![allow(
    clippy::missing_errors_doc,      // Internal API
    clippy::missing_panics_doc,      // Internal API
    clippy::module_name_repetitions, // e.g. NormalizerError in normalizer module
    clippy::must_use_candidate,      // Annotated selectively on critical APIs
    clippy::doc_markdown             // Internal API
)]

pub mod app;
pub mod collector;
pub mod domain;
pub mod integration;
pub mod normalizer;
pub mod sender;

// Re-export main types for easy access
pub use app::Config;
pub use collector::{
    Console, ConsoleInterceptor, ExceptionHandlerChain, GlobalHandlerSlot, MonitorHost, Reporter,
};
pub use domain::{AgentError, CapturedError, Event, LogArgument, Severity};
pub use integration::{ConsoleOptions, MobileOptions, install_console, install_mobile};
pub use normalizer::PathNormalizer;
pub use sender::{DeliveryRequest, HttpTransport, Transport};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
