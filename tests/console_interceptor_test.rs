mod common;

use common::{RecordingReporter, Report};
use parking_lot::Mutex;
use rask_monitor_agent::collector::{CONSOLE_LOGGER, Console, LogFn, Reporter};
use rask_monitor_agent::domain::{CapturedError, LogArgument, ReportOptions, Severity};
use rask_monitor_agent::integration::{ConsoleOptions, install_console};
use serde_json::json;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

fn console_with_output() -> (Arc<Console>, Arc<Mutex<Vec<(Severity, Vec<LogArgument>)>>>) {
    let console = Arc::new(Console::new());
    let output = Arc::new(Mutex::new(Vec::new()));
    for severity in Severity::ALL {
        let output = Arc::clone(&output);
        let binding: LogFn =
            Arc::new(move |args: &[LogArgument]| output.lock().push((severity, args.to_vec())));
        console.bind(severity, binding);
    }
    (console, output)
}

#[test]
fn test_error_argument_produces_one_exception_report_per_severity() {
    for severity in Severity::ALL {
        let (console, _output) = console_with_output();
        let reporter = RecordingReporter::new();
        let _interceptor = install_console(console.clone(), reporter.clone(), ConsoleOptions::default());

        let error = CapturedError::new("TypeError", "undefined is not a function");
        console.log(severity, &["render failed:".into(), error.clone().into()]);

        let reports = reporter.reports();
        assert_eq!(reports.len(), 1, "{severity}");
        match &reports[0] {
            Report::Exception(captured, options) => {
                assert_eq!(captured, &error);
                assert_eq!(
                    options.message.as_deref(),
                    Some("render failed: TypeError: undefined is not a function")
                );
                assert_eq!(options.level.as_deref(), Some(severity.reported_level()));
                assert_eq!(options.logger.as_deref(), Some(CONSOLE_LOGGER));
            }
            other => panic!("Expected exception report, got: {:?}", other),
        }
    }
}

#[test]
fn test_plain_arguments_produce_one_message_report_per_severity() {
    for severity in Severity::ALL {
        let (console, _output) = console_with_output();
        let reporter = RecordingReporter::new();
        let _interceptor = install_console(console.clone(), reporter.clone(), ConsoleOptions::default());

        console.log(
            severity,
            &["user".into(), json!(42).into(), json!({"cart": 3}).into()],
        );

        let reports = reporter.reports();
        assert_eq!(reports.len(), 1, "{severity}");
        match &reports[0] {
            Report::Message(message, options) => {
                assert_eq!(message, r#"user 42 {"cart":3}"#);
                assert!(options.message.is_none());
                assert_eq!(
                    options.extra.arguments,
                    vec![
                        LogArgument::from("user"),
                        LogArgument::from(json!(42)),
                        LogArgument::from(json!({"cart": 3})),
                    ]
                );
            }
            other => panic!("Expected message report, got: {:?}", other),
        }
    }
}

#[test]
fn test_warn_is_reported_as_warning() {
    let (console, _output) = console_with_output();
    let reporter = RecordingReporter::new();
    let _interceptor = install_console(console.clone(), reporter.clone(), ConsoleOptions::default());

    console.warn(&["low memory".into()]);
    console.debug(&["tick".into()]);

    let levels: Vec<_> = reporter
        .reports()
        .into_iter()
        .map(|report| match report {
            Report::Message(_, options) | Report::Exception(_, options) => options.level,
        })
        .collect();
    assert_eq!(
        levels,
        vec![Some("warning".to_string()), Some("debug".to_string())]
    );
}

#[test]
fn test_original_output_is_preserved() {
    let (console, output) = console_with_output();
    let reporter = RecordingReporter::new();
    let _interceptor = install_console(console.clone(), reporter.clone(), ConsoleOptions::default());

    let args: Vec<LogArgument> = vec!["saved".into(), json!({"id": 7}).into()];
    console.info(&args);

    assert_eq!(*output.lock(), vec![(Severity::Info, args)]);
}

#[test]
fn test_missing_original_binding_is_tolerated() {
    let console = Arc::new(Console::new());
    let reporter = RecordingReporter::new();
    let interceptor = install_console(
        console.clone(),
        reporter.clone(),
        ConsoleOptions {
            levels: Some(vec![Severity::Error]),
        },
    );

    console.error(&["headless".into()]);
    assert_eq!(reporter.reports().len(), 1);

    interceptor.detach();
    assert!(console.binding(Severity::Error).is_none());
}

#[test]
fn test_detach_stops_reporting_and_keeps_output() {
    let (console, output) = console_with_output();
    let reporter = RecordingReporter::new();
    let interceptor = install_console(console.clone(), reporter.clone(), ConsoleOptions::default());

    assert_eq!(interceptor.detach(), 4);
    console.error(&["after detach".into()]);

    assert!(reporter.reports().is_empty());
    assert_eq!(output.lock().len(), 1);

    // Attaching again works after a detach.
    assert_eq!(interceptor.attach(), 4);
    console.error(&["reattached".into()]);
    assert_eq!(reporter.reports().len(), 1);
    assert_eq!(output.lock().len(), 2);
}

#[test]
fn test_two_interceptors_stack() {
    let (console, output) = console_with_output();
    let first = RecordingReporter::new();
    let second = RecordingReporter::new();
    let options = ConsoleOptions {
        levels: Some(vec![Severity::Info]),
    };

    let _outer = install_console(console.clone(), first.clone(), options.clone());
    let _inner = install_console(console.clone(), second.clone(), options);

    console.info(&["stacked".into()]);

    assert_eq!(first.reports().len(), 1);
    assert_eq!(second.reports().len(), 1);
    assert_eq!(output.lock().len(), 1);
}

#[test]
fn test_concurrent_logging_reports_every_call() {
    let (console, output) = console_with_output();
    let reporter = RecordingReporter::new();
    let _interceptor = install_console(console.clone(), reporter.clone(), ConsoleOptions::default());

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let console = Arc::clone(&console);
            std::thread::spawn(move || {
                for j in 0..25 {
                    console.info(&[format!("thread {i} call {j}").into()]);
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(reporter.reports().len(), 200);
    assert_eq!(output.lock().len(), 200);
}

/// Panics on its first report, records the rest.
struct FlakyReporter {
    inner: Arc<RecordingReporter>,
    failed: std::sync::atomic::AtomicBool,
}

impl FlakyReporter {
    fn fail_once(&self) {
        if !self.failed.swap(true, std::sync::atomic::Ordering::SeqCst) {
            panic!("collector unavailable");
        }
    }
}

impl Reporter for FlakyReporter {
    fn capture_exception(&self, error: &CapturedError, options: ReportOptions) {
        self.fail_once();
        self.inner.capture_exception(error, options);
    }

    fn capture_message(&self, message: &str, options: ReportOptions) {
        self.fail_once();
        self.inner.capture_message(message, options);
    }
}

#[test]
fn test_reporter_panic_does_not_escape_log_call() {
    let (console, output) = console_with_output();
    let recorded = RecordingReporter::new();
    let reporter = Arc::new(FlakyReporter {
        inner: recorded.clone(),
        failed: std::sync::atomic::AtomicBool::new(false),
    });
    let _interceptor = install_console(console.clone(), reporter, ConsoleOptions::default());

    let result = std::panic::catch_unwind(AssertUnwindSafe(|| {
        console.info(&["first".into()]);
    }));
    assert!(result.is_ok());
    console.info(&["second".into()]);

    let output = output.lock();
    assert_eq!(output.len(), 2);
    assert_eq!(output[0], (Severity::Info, vec![LogArgument::from("first")]));
    assert_eq!(recorded.reports().len(), 1);
}
