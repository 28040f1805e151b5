use super::panic::panic_message;
use super::reporter::Reporter;
use crate::domain::{CapturedError, Extra, LogArgument, ReportOptions, Severity};
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use tracing::{debug, warn};

/// Logger tag attached to every report produced by the interceptor.
pub const CONSOLE_LOGGER: &str = "console";

/// A bound logging function for one severity.
pub type LogFn = Arc<dyn Fn(&[LogArgument]) + Send + Sync>;

/// The logging facility: one optional binding per severity.
///
/// A missing binding is legal (headless hosts); logging through it is a no-op.
#[derive(Default)]
pub struct Console {
    bindings: RwLock<HashMap<Severity, LogFn>>,
}

impl Console {
    pub fn new() -> Self {
        Self::default()
    }

    /// A facility whose bindings write the joined message to standard error.
    pub fn stderr() -> Self {
        let console = Self::new();
        for severity in Severity::ALL {
            console.bind(
                severity,
                Arc::new(move |args: &[LogArgument]| {
                    eprintln!("[{severity}] {}", join_arguments(args));
                }),
            );
        }
        console
    }

    pub fn binding(&self, severity: Severity) -> Option<LogFn> {
        self.bindings.read().get(&severity).cloned()
    }

    /// Binds `function` to `severity`, returning the replaced binding.
    pub fn bind(&self, severity: Severity, function: LogFn) -> Option<LogFn> {
        self.bindings.write().insert(severity, function)
    }

    pub fn unbind(&self, severity: Severity) -> Option<LogFn> {
        self.bindings.write().remove(&severity)
    }

    pub fn log(&self, severity: Severity, args: &[LogArgument]) {
        // Cloned out so the lock is released before user code runs.
        if let Some(function) = self.binding(severity) {
            function(args);
        }
    }

    pub fn debug(&self, args: &[LogArgument]) {
        self.log(Severity::Debug, args);
    }

    pub fn info(&self, args: &[LogArgument]) {
        self.log(Severity::Info, args);
    }

    pub fn warn(&self, args: &[LogArgument]) {
        self.log(Severity::Warn, args);
    }

    pub fn error(&self, args: &[LogArgument]) {
        self.log(Severity::Error, args);
    }
}

impl fmt::Debug for Console {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut bound: Vec<Severity> = self.bindings.read().keys().copied().collect();
        bound.sort();
        f.debug_struct("Console").field("bound", &bound).finish()
    }
}

/// String forms of all arguments joined with a single space.
pub fn join_arguments(args: &[LogArgument]) -> String {
    args.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Returns the last error-like argument. The scan never stops early.
pub fn extract_error(args: &[LogArgument]) -> Option<CapturedError> {
    let mut error = None;
    for arg in args {
        if let Some(found) = arg.as_error() {
            error = Some(found);
        }
    }
    error
}

/// Turns one intercepted call into exactly one report.
pub fn report_log_call(reporter: &dyn Reporter, severity: Severity, args: &[LogArgument]) {
    let message = join_arguments(args);
    let mut options = ReportOptions {
        level: Some(severity.reported_level().to_string()),
        logger: Some(CONSOLE_LOGGER.to_string()),
        message: None,
        extra: Extra {
            arguments: args.to_vec(),
        },
    };

    match extract_error(args) {
        Some(error) => {
            options.message = Some(message);
            reporter.capture_exception(&error, options);
        }
        None => reporter.capture_message(&message, options),
    }
}

struct Installed {
    original: Option<LogFn>,
    wrapper: LogFn,
}

/// Registry of wrappers installed over a [`Console`].
///
/// `attach` is idempotent: a severity already bound to this interceptor's
/// wrapper is skipped. `detach` puts back whatever was bound before.
pub struct ConsoleInterceptor {
    console: Arc<Console>,
    reporter: Arc<dyn Reporter>,
    levels: Vec<Severity>,
    installed: Mutex<HashMap<Severity, Installed>>,
}

impl ConsoleInterceptor {
    pub fn new(
        console: Arc<Console>,
        reporter: Arc<dyn Reporter>,
        levels: Option<Vec<Severity>>,
    ) -> Self {
        Self {
            console,
            reporter,
            levels: levels.unwrap_or_else(Severity::default_levels),
            installed: Mutex::new(HashMap::new()),
        }
    }

    pub fn levels(&self) -> &[Severity] {
        &self.levels
    }

    pub fn console(&self) -> &Arc<Console> {
        &self.console
    }

    /// Wraps every configured severity. Returns how many wrappers were newly installed.
    pub fn attach(&self) -> usize {
        let mut installed = self.installed.lock();
        let mut attached = 0;

        for &severity in &self.levels {
            if let Some(existing) = installed.get(&severity)
                && self.is_bound_to(severity, &existing.wrapper)
            {
                continue;
            }

            let original = self.console.binding(severity);
            if original.is_none() {
                debug!(%severity, "no original binding; wrapper will only report");
            }
            let wrapper = self.wrap(severity, original.clone());
            self.console.bind(severity, Arc::clone(&wrapper));
            installed.insert(severity, Installed { original, wrapper });
            attached += 1;
        }

        debug!(attached, levels = ?self.levels, "console interceptor attached");
        attached
    }

    /// Restores the original bindings. Returns how many severities were restored.
    pub fn detach(&self) -> usize {
        let mut installed = self.installed.lock();
        let mut restored = 0;

        for (severity, entry) in installed.drain() {
            if !self.is_bound_to(severity, &entry.wrapper) {
                warn!(%severity, "console binding replaced after attach; leaving it in place");
                continue;
            }
            match entry.original {
                Some(original) => {
                    self.console.bind(severity, original);
                }
                None => {
                    self.console.unbind(severity);
                }
            }
            restored += 1;
        }

        debug!(restored, "console interceptor detached");
        restored
    }

    pub fn is_attached(&self, severity: Severity) -> bool {
        self.installed
            .lock()
            .get(&severity)
            .is_some_and(|entry| self.is_bound_to(severity, &entry.wrapper))
    }

    fn is_bound_to(&self, severity: Severity, wrapper: &LogFn) -> bool {
        self.console
            .binding(severity)
            .is_some_and(|current| Arc::ptr_eq(&current, wrapper))
    }

    fn wrap(&self, severity: Severity, original: Option<LogFn>) -> LogFn {
        let reporter = Arc::clone(&self.reporter);
        Arc::new(move |args: &[LogArgument]| {
            let reported = panic::catch_unwind(AssertUnwindSafe(|| {
                report_log_call(reporter.as_ref(), severity, args);
            }));
            if let Err(payload) = reported {
                warn!(%severity, "reporter panicked: {}", panic_message(payload.as_ref()));
            }
            if let Some(original) = &original {
                original(args);
            }
        })
    }
}

impl fmt::Debug for ConsoleInterceptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConsoleInterceptor")
            .field("levels", &self.levels)
            .field("console", &self.console)
            .finish()
    }
}
