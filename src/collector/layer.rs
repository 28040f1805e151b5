use super::console::Console;
use crate::domain::{CapturedError, LogArgument, Severity};
use serde_json::{Map, Value};
use std::cell::Cell;
use std::fmt;
use std::sync::Arc;
use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::{Context, Layer};

thread_local! {
    static IN_CAPTURE: Cell<bool> = const { Cell::new(false) };
}

/// Routes `tracing` events into a [`Console`], so an attached
/// [`ConsoleInterceptor`](super::ConsoleInterceptor) sees them like any other log call.
///
/// Events from this crate and from the HTTP stack are skipped, as are events
/// emitted while a captured event is being handled on the same thread.
pub struct CaptureLayer {
    console: Arc<Console>,
    ignored_targets: Vec<String>,
}

impl CaptureLayer {
    pub fn new(console: Arc<Console>) -> Self {
        Self {
            console,
            ignored_targets: [env!("CARGO_CRATE_NAME"), "reqwest", "hyper", "h2", "rustls"]
                .iter()
                .map(|target| (*target).to_string())
                .collect(),
        }
    }

    pub fn ignore_target(mut self, prefix: impl Into<String>) -> Self {
        self.ignored_targets.push(prefix.into());
        self
    }

    fn is_ignored(&self, target: &str) -> bool {
        self.ignored_targets
            .iter()
            .any(|prefix| target.starts_with(prefix.as_str()))
    }
}

impl<S: Subscriber> Layer<S> for CaptureLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();
        let Some(severity) = Severity::from_tracing(metadata.level()) else {
            return;
        };
        if self.is_ignored(metadata.target()) || IN_CAPTURE.with(Cell::get) {
            return;
        }

        let mut visitor = ArgumentVisitor::default();
        event.record(&mut visitor);

        let _guard = CaptureGuard::enter();
        self.console.log(severity, &visitor.into_arguments());
    }
}

/// Marks the current thread as capturing until dropped, unwinding included.
struct CaptureGuard;

impl CaptureGuard {
    fn enter() -> Self {
        IN_CAPTURE.with(|flag| flag.set(true));
        CaptureGuard
    }
}

impl Drop for CaptureGuard {
    fn drop(&mut self) {
        IN_CAPTURE.with(|flag| flag.set(false));
    }
}

#[derive(Default)]
struct ArgumentVisitor {
    message: Option<String>,
    fields: Map<String, Value>,
    error: Option<CapturedError>,
}

impl ArgumentVisitor {
    fn record_value(&mut self, field: &Field, value: Value) {
        match (field.name(), value) {
            ("message", Value::String(message)) => self.message = Some(message),
            (name, value) => {
                self.fields.insert(name.to_string(), value);
            }
        }
    }

    /// Message first, then structured fields, then the error (if any).
    fn into_arguments(self) -> Vec<LogArgument> {
        let mut arguments = Vec::with_capacity(3);
        if let Some(message) = self.message {
            arguments.push(LogArgument::Text(message));
        }
        if !self.fields.is_empty() {
            arguments.push(LogArgument::Value(Value::Object(self.fields)));
        }
        if let Some(error) = self.error {
            arguments.push(LogArgument::Error(error));
        }
        arguments
    }
}

impl Visit for ArgumentVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        self.record_value(field, Value::String(value.to_string()));
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.record_value(field, Value::from(value));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.record_value(field, Value::from(value));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.record_value(field, Value::Bool(value));
    }

    fn record_error(&mut self, field: &Field, value: &(dyn std::error::Error + 'static)) {
        self.record_value(field, Value::String(value.to_string()));
        self.error = Some(CapturedError::from_error(value));
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.record_value(field, Value::String(format!("{value:?}")));
    }
}
