use super::reporter::Reporter;
use crate::domain::{CapturedError, ReportOptions};
use parking_lot::RwLock;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// A process-wide uncaught-error handler: `(error, is_fatal)`.
pub type ErrorHandler = Arc<dyn Fn(&CapturedError, bool) + Send + Sync>;

/// The host's single global handler slot.
pub trait HandlerSlot: Send + Sync {
    /// Accessor-style lookup, for hosts that expose one.
    fn global_handler(&self) -> Option<ErrorHandler> {
        None
    }

    /// The conventionally named internal slot.
    fn raw_handler(&self) -> Option<ErrorHandler>;

    fn set_global_handler(&self, handler: Option<ErrorHandler>);
}

/// Resolves the installed handler: accessor first, raw slot second.
pub fn resolve_handler(slot: &dyn HandlerSlot) -> Option<ErrorHandler> {
    slot.global_handler().or_else(|| slot.raw_handler())
}

/// In-process handler slot. Hosts raise uncaught errors through [`GlobalHandlerSlot::dispatch`].
#[derive(Default)]
pub struct GlobalHandlerSlot {
    handler: RwLock<Option<ErrorHandler>>,
}

impl GlobalHandlerSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_handler(handler: ErrorHandler) -> Self {
        Self {
            handler: RwLock::new(Some(handler)),
        }
    }

    /// Invokes the installed handler. Returns `false` when the slot is empty.
    pub fn dispatch(&self, error: &CapturedError, is_fatal: bool) -> bool {
        let handler = self.handler.read().clone();
        match handler {
            Some(handler) => {
                handler(error, is_fatal);
                true
            }
            None => false,
        }
    }
}

impl HandlerSlot for GlobalHandlerSlot {
    fn global_handler(&self) -> Option<ErrorHandler> {
        self.handler.read().clone()
    }

    fn raw_handler(&self) -> Option<ErrorHandler> {
        self.handler.read().clone()
    }

    fn set_global_handler(&self, handler: Option<ErrorHandler>) {
        *self.handler.write() = handler;
    }
}

impl fmt::Debug for GlobalHandlerSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GlobalHandlerSlot")
            .field("installed", &self.handler.read().is_some())
            .finish()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChainOptions {
    /// Skip delegation to the previously installed handler.
    pub no_rethrow: bool,
}

/// Chain link around the previously installed global handler.
///
/// The installed handler delegates to the previous one first (unless
/// `no_rethrow`) and reports afterwards, so the previous handler sees the
/// arguments unmodified. If it panics or exits, no report is made.
pub struct ExceptionHandlerChain {
    slot: Arc<dyn HandlerSlot>,
    previous: Option<ErrorHandler>,
    handler: ErrorHandler,
}

impl ExceptionHandlerChain {
    pub fn install(
        slot: Arc<dyn HandlerSlot>,
        reporter: Arc<dyn Reporter>,
        options: ChainOptions,
    ) -> Self {
        let previous = resolve_handler(slot.as_ref());
        if previous.is_none() {
            debug!("no previous global handler; delegation is a no-op");
        }

        let delegate = if options.no_rethrow {
            None
        } else {
            previous.clone()
        };

        let handler: ErrorHandler = Arc::new(move |error: &CapturedError, is_fatal: bool| {
            if let Some(previous) = &delegate {
                previous(error, is_fatal);
            }
            reporter.capture_exception(error, ReportOptions::default());
        });

        slot.set_global_handler(Some(Arc::clone(&handler)));
        debug!(no_rethrow = options.no_rethrow, "exception handler chain installed");

        Self {
            slot,
            previous,
            handler,
        }
    }

    pub fn previous(&self) -> Option<&ErrorHandler> {
        self.previous.as_ref()
    }

    /// Whether the slot still holds this chain's handler.
    pub fn is_active(&self) -> bool {
        resolve_handler(self.slot.as_ref()).is_some_and(|current| Arc::ptr_eq(&current, &self.handler))
    }

    /// Puts the previous handler back. Does nothing if another handler has
    /// replaced this one since `install`.
    pub fn restore(self) -> bool {
        if !self.is_active() {
            debug!("global handler replaced since install; not restoring");
            return false;
        }
        self.slot.set_global_handler(self.previous);
        true
    }
}

impl fmt::Debug for ExceptionHandlerChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExceptionHandlerChain")
            .field("has_previous", &self.previous.is_some())
            .field("active", &self.is_active())
            .finish()
    }
}
