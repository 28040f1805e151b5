use super::argument::CapturedError;
use super::report::ReportOptions;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// One entry of a stack trace.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lineno: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub colno: Option<u32>,
}

impl Frame {
    pub fn with_filename(filename: impl Into<String>) -> Self {
        Self {
            filename: Some(filename.into()),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Stacktrace {
    #[serde(default)]
    pub frames: Vec<Frame>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exception {
    #[serde(rename = "type")]
    pub ty: String,
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stacktrace: Option<Stacktrace>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExceptionValues {
    #[serde(default)]
    pub values: Vec<Exception>,
}

/// The outgoing record, in the collector's JSON shape.
///
/// Every nested level of `exception` is optional; consumers check each one
/// instead of assuming a populated stack trace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub event_id: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logger: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub culprit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exception: Option<ExceptionValues>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub extra: Map<String, Value>,
}

impl Event {
    pub fn new() -> Self {
        Self {
            event_id: Uuid::new_v4().simple().to_string(),
            timestamp: Utc::now(),
            level: None,
            logger: None,
            message: None,
            culprit: None,
            exception: None,
            extra: Map::new(),
        }
    }

    pub fn from_message(message: &str, options: &ReportOptions) -> Self {
        let mut event = Self::new();
        event.apply_options(options);
        event.message = Some(message.to_string());
        if event.level.is_none() {
            event.level = Some("info".to_string());
        }
        event
    }

    pub fn from_error(error: &CapturedError, options: &ReportOptions) -> Self {
        let mut event = Self::new();
        event.apply_options(options);
        if event.level.is_none() {
            event.level = Some("error".to_string());
        }
        event.culprit = error.culprit.clone();
        event.exception = Some(ExceptionValues {
            values: vec![error.to_exception()],
        });
        event
    }

    fn apply_options(&mut self, options: &ReportOptions) {
        self.level = options.level.clone();
        self.logger = options.logger.clone();
        self.message = options.message.clone();
        if !options.extra.arguments.is_empty()
            && let Ok(arguments) = serde_json::to_value(&options.extra.arguments)
        {
            self.extra.insert("arguments".to_string(), arguments);
        }
    }

    /// Frames of the first exception value, when every level down to them is present.
    pub fn first_frames_mut(&mut self) -> Option<&mut Vec<Frame>> {
        self.exception
            .as_mut()?
            .values
            .first_mut()?
            .stacktrace
            .as_mut()
            .map(|stacktrace| &mut stacktrace.frames)
    }
}

impl Default for Event {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Extra, LogArgument};

    #[test]
    fn test_message_event_carries_options() {
        let options = ReportOptions {
            level: Some("warning".to_string()),
            logger: Some("console".to_string()),
            message: None,
            extra: Extra {
                arguments: vec![LogArgument::from("disk"), LogArgument::from("full")],
            },
        };
        let event = Event::from_message("disk full", &options);

        assert_eq!(event.message.as_deref(), Some("disk full"));
        assert_eq!(event.level.as_deref(), Some("warning"));
        assert_eq!(event.logger.as_deref(), Some("console"));
        assert_eq!(event.extra["arguments"], serde_json::json!(["disk", "full"]));
        assert!(event.exception.is_none());
    }

    #[test]
    fn test_error_event_defaults_to_error_level() {
        let error = CapturedError::new("TypeError", "boom").with_culprit("app.js");
        let event = Event::from_error(&error, &ReportOptions::default());

        assert_eq!(event.level.as_deref(), Some("error"));
        assert_eq!(event.culprit.as_deref(), Some("app.js"));
        let values = &event.exception.as_ref().unwrap().values;
        assert_eq!(values[0].ty, "TypeError");
        assert!(event.extra.is_empty());
    }

    #[test]
    fn test_first_frames_mut_checks_every_level() {
        let mut event = Event::new();
        assert!(event.first_frames_mut().is_none());

        event.exception = Some(ExceptionValues::default());
        assert!(event.first_frames_mut().is_none());

        let error = CapturedError::new("Error", "no stack");
        event.exception = Some(ExceptionValues {
            values: vec![error.to_exception()],
        });
        assert!(event.first_frames_mut().is_none());
    }

    #[test]
    fn test_serialized_shape() {
        let error = CapturedError::new("Error", "boom").with_stacktrace(Stacktrace {
            frames: vec![Frame::with_filename("index.js")],
        });
        let event = Event::from_error(&error, &ReportOptions::default());
        let json = serde_json::to_value(&event).unwrap();

        assert_eq!(json["exception"]["values"][0]["type"], "Error");
        assert_eq!(
            json["exception"]["values"][0]["stacktrace"]["frames"][0]["filename"],
            "index.js"
        );
        assert!(json.get("culprit").is_none());
        assert!(json.get("extra").is_none());
    }
}
