use super::event::{Exception, Stacktrace};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// An error-like value: what the reporter receives for exception reports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapturedError {
    #[serde(rename = "type")]
    pub ty: String,
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub culprit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stacktrace: Option<Stacktrace>,
}

impl CapturedError {
    pub fn new(ty: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            ty: ty.into(),
            value: value.into(),
            culprit: None,
            stacktrace: None,
        }
    }

    /// Captures a Rust error. The source chain is appended to the message.
    pub fn from_error<E: std::error::Error + ?Sized>(error: &E) -> Self {
        let mut parts = vec![error.to_string()];
        let mut source = error.source();
        while let Some(cause) = source {
            parts.push(cause.to_string());
            source = cause.source();
        }
        Self::new(short_type_name(std::any::type_name::<E>()), parts.join(": "))
    }

    /// Structural check: an object with a string `message` and a string `name` (or `type`).
    pub fn from_value(value: &Value) -> Option<Self> {
        let object = value.as_object()?;
        let message = object.get("message")?.as_str()?;
        let ty = object
            .get("name")
            .or_else(|| object.get("type"))
            .and_then(Value::as_str)?;

        let mut error = Self::new(ty, message);
        error.culprit = object
            .get("culprit")
            .and_then(Value::as_str)
            .map(str::to_string);
        error.stacktrace = object
            .get("stacktrace")
            .and_then(|stack| serde_json::from_value(stack.clone()).ok());
        Some(error)
    }

    pub fn with_culprit(mut self, culprit: impl Into<String>) -> Self {
        self.culprit = Some(culprit.into());
        self
    }

    pub fn with_stacktrace(mut self, stacktrace: Stacktrace) -> Self {
        self.stacktrace = Some(stacktrace);
        self
    }

    pub fn to_exception(&self) -> Exception {
        Exception {
            ty: self.ty.clone(),
            value: self.value.clone(),
            stacktrace: self.stacktrace.clone(),
        }
    }
}

impl fmt::Display for CapturedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.value.is_empty() {
            f.write_str(&self.ty)
        } else {
            write!(f, "{}: {}", self.ty, self.value)
        }
    }
}

fn short_type_name(full: &str) -> &str {
    let without_generics = full.split('<').next().unwrap_or(full);
    without_generics
        .rsplit("::")
        .next()
        .unwrap_or(without_generics)
        .trim_start_matches("dyn ")
}

/// One argument of an intercepted log call, kept verbatim for `extra.arguments`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum LogArgument {
    Text(String),
    Value(Value),
    Error(CapturedError),
}

impl LogArgument {
    pub fn as_error(&self) -> Option<CapturedError> {
        match self {
            LogArgument::Error(error) => Some(error.clone()),
            LogArgument::Value(value) => CapturedError::from_value(value),
            LogArgument::Text(_) => None,
        }
    }

    pub fn is_error(&self) -> bool {
        self.as_error().is_some()
    }
}

impl fmt::Display for LogArgument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogArgument::Text(text) => f.write_str(text),
            LogArgument::Value(Value::String(text)) => f.write_str(text),
            LogArgument::Value(Value::Null) => Ok(()),
            LogArgument::Value(value) => match CapturedError::from_value(value) {
                Some(error) => write!(f, "{error}"),
                None => write!(f, "{value}"),
            },
            LogArgument::Error(error) => write!(f, "{error}"),
        }
    }
}

impl From<&str> for LogArgument {
    fn from(text: &str) -> Self {
        LogArgument::Text(text.to_string())
    }
}

impl From<String> for LogArgument {
    fn from(text: String) -> Self {
        LogArgument::Text(text)
    }
}

impl From<Value> for LogArgument {
    fn from(value: Value) -> Self {
        LogArgument::Value(value)
    }
}

impl From<CapturedError> for LogArgument {
    fn from(error: CapturedError) -> Self {
        LogArgument::Error(error)
    }
}
