//! Capture side of the agent: log-call interception and uncaught-failure chaining.

pub mod console;
pub mod handler;
pub mod layer;
pub mod panic;
pub mod reporter;

pub use console::{CONSOLE_LOGGER, Console, ConsoleInterceptor, LogFn};
pub use handler::{ChainOptions, ErrorHandler, ExceptionHandlerChain, GlobalHandlerSlot, HandlerSlot};
pub use layer::CaptureLayer;
pub use panic::PanicHookChain;
pub use reporter::{DataCallback, MonitorHost, Reporter};
