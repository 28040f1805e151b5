use super::client::{ClientConfig, ClientError, HttpClient};
use reqwest::StatusCode;
use reqwest::header::ORIGIN;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::time::Instant;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Auth parameters carried in the query string.
pub type AuthParams = BTreeMap<String, String>;

/// One-shot completion callback.
pub type DeliveryCallback = Box<dyn FnOnce() + Send + 'static>;

/// A single delivery attempt. Built per event and consumed by `send`.
pub struct DeliveryRequest {
    pub url: String,
    pub auth: AuthParams,
    pub data: Value,
    pub on_success: Option<DeliveryCallback>,
    pub on_error: Option<DeliveryCallback>,
}

impl DeliveryRequest {
    pub fn new(url: impl Into<String>, data: Value) -> Self {
        Self {
            url: url.into(),
            auth: AuthParams::new(),
            data,
            on_success: None,
            on_error: None,
        }
    }

    pub fn with_auth(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.auth.insert(key.into(), value.into());
        self
    }

    pub fn with_auth_params(mut self, auth: AuthParams) -> Self {
        self.auth.extend(auth);
        self
    }

    pub fn on_success(mut self, callback: impl FnOnce() + Send + 'static) -> Self {
        self.on_success = Some(Box::new(callback));
        self
    }

    pub fn on_error(mut self, callback: impl FnOnce() + Send + 'static) -> Self {
        self.on_error = Some(Box::new(callback));
        self
    }

    /// `url?query`, appended verbatim.
    pub fn target_url(&self) -> String {
        format!("{}?{}", self.url, encode_query(&self.auth))
    }
}

impl fmt::Debug for DeliveryRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeliveryRequest")
            .field("url", &self.url)
            .field("auth_keys", &self.auth.keys().collect::<Vec<_>>())
            .field("has_on_success", &self.on_success.is_some())
            .field("has_on_error", &self.on_error.is_some())
            .finish()
    }
}

/// Percent-encodes each pair and joins them with `&`, in map order.
pub fn encode_query(auth: &AuthParams) -> String {
    auth.iter()
        .map(|(key, value)| format!("{}={}", encode_component(key), encode_component(value)))
        .collect::<Vec<_>>()
        .join("&")
}

/// `urlencoding::encode` with `! ' ( ) *` left literal, as URI components allow them.
fn encode_component(input: &str) -> String {
    let encoded = urlencoding::encode(input);
    if !encoded.contains('%') {
        return encoded.into_owned();
    }
    [("%21", "!"), ("%27", "'"), ("%28", "("), ("%29", ")"), ("%2A", "*")]
        .iter()
        .fold(encoded.into_owned(), |acc, (escaped, literal)| {
            acc.replace(escaped, literal)
        })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryOutcome {
    Delivered,
    /// Non-200 response (`status` set) or transport failure (`status` empty).
    Failed { status: Option<u16> },
}

impl DeliveryOutcome {
    pub fn is_delivered(&self) -> bool {
        matches!(self, DeliveryOutcome::Delivered)
    }
}

/// Delivery mechanism registered with the host.
pub trait Transport: Send + Sync {
    /// Fire-and-forget: the outcome is reported only through the request's callbacks.
    fn send(&self, request: DeliveryRequest);
}

/// POSTs each request as JSON on its own task. No queue, no retry.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: HttpClient,
}

impl HttpTransport {
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        Ok(Self::from_client(HttpClient::new(config)?))
    }

    pub fn from_client(client: HttpClient) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &HttpClient {
        &self.client
    }

    /// Spawns the delivery; the handle resolves after the callback has run.
    pub fn dispatch(&self, request: DeliveryRequest) -> JoinHandle<DeliveryOutcome> {
        let client = self.client.clone();
        self.client.runtime.spawn(deliver(client, request))
    }
}

impl Transport for HttpTransport {
    fn send(&self, request: DeliveryRequest) {
        drop(self.dispatch(request));
    }
}

async fn deliver(client: HttpClient, request: DeliveryRequest) -> DeliveryOutcome {
    let start = Instant::now();
    let target = request.target_url();
    let DeliveryRequest {
        data,
        on_success,
        on_error,
        ..
    } = request;

    let result = client
        .client
        .post(&target)
        .header(ORIGIN, client.origin.clone())
        .json(&data)
        .send()
        .await;

    let outcome = match result {
        Ok(response) if response.status() == StatusCode::OK => DeliveryOutcome::Delivered,
        Ok(response) => DeliveryOutcome::Failed {
            status: Some(response.status().as_u16()),
        },
        Err(e) => {
            warn!("Delivery request failed: {}", e);
            DeliveryOutcome::Failed { status: None }
        }
    };
    let latency = start.elapsed();

    match outcome {
        DeliveryOutcome::Delivered => {
            debug!("Delivered event in {:?}", latency);
            if let Some(callback) = on_success {
                callback();
            }
        }
        DeliveryOutcome::Failed { status } => {
            warn!("Event delivery failed (status {:?}) after {:?}", status, latency);
            if let Some(callback) = on_error {
                callback();
            }
        }
    }

    outcome
}
