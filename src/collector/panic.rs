use super::handler::ChainOptions;
use super::reporter::Reporter;
use crate::domain::{CapturedError, Frame, ReportOptions, Stacktrace};
use std::any::Any;
use std::panic::{self, PanicHookInfo};
use std::sync::{Arc, Weak};
use tracing::debug;

type PanicHook = Box<dyn Fn(&PanicHookInfo<'_>) + Send + Sync + 'static>;

/// Chain link around the process panic hook.
///
/// Same ordering as [`ExceptionHandlerChain`](super::ExceptionHandlerChain):
/// the previous hook runs first, then the panic is reported.
pub struct PanicHookChain {
    previous: Arc<PanicHook>,
    /// Heap address of the installed hook box.
    installed: usize,
    /// Dead once the installed hook has been dropped by a later `set_hook`.
    alive: Weak<()>,
}

impl PanicHookChain {
    pub fn install(reporter: Arc<dyn Reporter>, options: ChainOptions) -> Self {
        let previous: Arc<PanicHook> = Arc::new(panic::take_hook());
        let delegate = (!options.no_rethrow).then(|| Arc::clone(&previous));
        let marker = Arc::new(());
        let alive = Arc::downgrade(&marker);

        let hook: PanicHook = Box::new(move |info| {
            let _marker = &marker;
            if let Some(previous) = &delegate {
                previous(info);
            }
            reporter.capture_exception(&captured_panic(info), ReportOptions::default());
        });
        let installed = hook_address(&hook);
        panic::set_hook(hook);

        debug!(no_rethrow = options.no_rethrow, "panic hook chain installed");
        Self {
            previous,
            installed,
            alive,
        }
    }

    /// Whether the process hook is still this chain's hook.
    pub fn is_active(&self) -> bool {
        let current = panic::take_hook();
        let active = self.is_current(&current);
        panic::set_hook(current);
        active
    }

    /// Reinstates the hook that was active before `install`. Does nothing
    /// if another hook has been installed since.
    pub fn restore(self) -> bool {
        let current = panic::take_hook();
        if !self.is_current(&current) {
            panic::set_hook(current);
            debug!("panic hook replaced since install; not restoring");
            return false;
        }
        drop(current);

        let previous = self.previous;
        panic::set_hook(Box::new(move |info| previous(info)));
        debug!("panic hook restored");
        true
    }

    // A live allocation at the recorded address can only be the installed box.
    fn is_current(&self, hook: &PanicHook) -> bool {
        self.alive.strong_count() > 0 && hook_address(hook) == self.installed
    }
}

fn hook_address(hook: &PanicHook) -> usize {
    let hook: &(dyn Fn(&PanicHookInfo<'_>) + Send + Sync) = &**hook;
    std::ptr::from_ref(hook).cast::<()>() as usize
}

/// Payload of a panic as text, for `&str` and `String` payloads.
pub(crate) fn panic_message<'a>(payload: &'a (dyn Any + Send + 'static)) -> &'a str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("Box<dyn Any>")
}

/// Builds the report for a panic: payload as message, location as culprit and single frame.
pub fn captured_panic(info: &PanicHookInfo<'_>) -> CapturedError {
    let mut error = CapturedError::new("panic", panic_message(info.payload()));
    if let Some(location) = info.location() {
        error.culprit = Some(format!(
            "{}:{}:{}",
            location.file(),
            location.line(),
            location.column()
        ));
        error.stacktrace = Some(Stacktrace {
            frames: vec![Frame {
                filename: Some(location.file().to_string()),
                function: None,
                lineno: Some(location.line()),
                colno: Some(location.column()),
            }],
        });
    }
    error
}
