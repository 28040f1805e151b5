use super::argument::LogArgument;
use serde::Serialize;

/// Options attached to a report handed to the [`Reporter`](crate::collector::Reporter).
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ReportOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logger: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub extra: Extra,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Extra {
    /// The original call arguments, in call order.
    pub arguments: Vec<LogArgument>,
}
