#![allow(dead_code)]

use parking_lot::Mutex;
use rask_monitor_agent::collector::{DataCallback, MonitorHost, Reporter};
use rask_monitor_agent::domain::{CapturedError, Event, ReportOptions};
use rask_monitor_agent::sender::{DeliveryRequest, Transport};
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq)]
pub enum Report {
    Exception(CapturedError, ReportOptions),
    Message(String, ReportOptions),
}

/// Reporter that records every call, optionally into a shared order log.
#[derive(Default)]
pub struct RecordingReporter {
    pub reports: Mutex<Vec<Report>>,
    pub order: Option<Arc<Mutex<Vec<String>>>>,
}

impl RecordingReporter {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn with_order(order: Arc<Mutex<Vec<String>>>) -> Arc<Self> {
        Arc::new(Self {
            reports: Mutex::new(Vec::new()),
            order: Some(order),
        })
    }

    pub fn reports(&self) -> Vec<Report> {
        self.reports.lock().clone()
    }

    fn note(&self, entry: &str) {
        if let Some(order) = &self.order {
            order.lock().push(entry.to_string());
        }
    }
}

impl Reporter for RecordingReporter {
    fn capture_exception(&self, error: &CapturedError, options: ReportOptions) {
        self.note("report");
        self.reports
            .lock()
            .push(Report::Exception(error.clone(), options));
    }

    fn capture_message(&self, message: &str, options: ReportOptions) {
        self.note("report");
        self.reports
            .lock()
            .push(Report::Message(message.to_string(), options));
    }
}

/// Minimal host client: builds the event, runs the data callback, hands it to the transport.
pub struct TestHost {
    pub endpoint: String,
    pub transport: Mutex<Option<Arc<dyn Transport>>>,
    pub callback: Mutex<Option<Arc<DataCallback>>>,
    pub sent: Mutex<Vec<Event>>,
    pub delivered: tokio::sync::mpsc::UnboundedSender<bool>,
}

impl TestHost {
    pub fn new(
        endpoint: impl Into<String>,
    ) -> (Arc<Self>, tokio::sync::mpsc::UnboundedReceiver<bool>) {
        let (delivered, receiver) = tokio::sync::mpsc::unbounded_channel();
        let host = Arc::new(Self {
            endpoint: endpoint.into(),
            transport: Mutex::new(None),
            callback: Mutex::new(None),
            sent: Mutex::new(Vec::new()),
            delivered,
        });
        (host, receiver)
    }

    fn send(&self, mut event: Event) {
        let callback = self.callback.lock().clone();
        if let Some(callback) = callback {
            callback(&mut event);
        }
        self.sent.lock().push(event.clone());

        let transport = self.transport.lock().clone();
        let Some(transport) = transport else {
            return;
        };
        let Ok(data) = serde_json::to_value(&event) else {
            return;
        };
        let on_success = self.delivered.clone();
        let on_error = self.delivered.clone();
        transport.send(
            DeliveryRequest::new(self.endpoint.as_str(), data)
                .with_auth("sentry_key", "public")
                .on_success(move || {
                    let _ = on_success.send(true);
                })
                .on_error(move || {
                    let _ = on_error.send(false);
                }),
        );
    }
}

impl Reporter for TestHost {
    fn capture_exception(&self, error: &CapturedError, options: ReportOptions) {
        self.send(Event::from_error(error, &options));
    }

    fn capture_message(&self, message: &str, options: ReportOptions) {
        self.send(Event::from_message(message, &options));
    }
}

impl MonitorHost for TestHost {
    fn set_transport(&self, transport: Arc<dyn Transport>) {
        *self.transport.lock() = Some(transport);
    }

    fn set_data_callback(&self, callback: DataCallback) {
        *self.callback.lock() = Some(Arc::new(callback));
    }
}
