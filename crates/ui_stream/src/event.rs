//! Downstream event vocabulary.
//!
//! Every event serializes as `{"type": "<kebab-case name>", "data": {...}}` with camelCase
//! payload keys. Tool events carry provider metadata under the `"claude-code"` key.

use claude_stream::UsageStats;
use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "kebab-case")]
pub enum OutputEvent {
    StreamStart(StreamStart),
    TextStart(PartRef),
    TextDelta(PartDelta),
    TextEnd(PartRef),
    ToolInputStart(ToolInputStart),
    ToolInputDelta(PartDelta),
    ToolInputEnd(PartRef),
    ToolCall(ToolCall),
    ToolResult(ToolResult),
    ToolError(ToolError),
    ReasoningStart(PartRef),
    ReasoningDelta(PartDelta),
    ReasoningEnd(PartRef),
    ResponseMetadata(ResponseMetadata),
    Finish(Finish),
    Error(ErrorPayload),
}

impl OutputEvent {
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::StreamStart(_) => "stream-start",
            Self::TextStart(_) => "text-start",
            Self::TextDelta(_) => "text-delta",
            Self::TextEnd(_) => "text-end",
            Self::ToolInputStart(_) => "tool-input-start",
            Self::ToolInputDelta(_) => "tool-input-delta",
            Self::ToolInputEnd(_) => "tool-input-end",
            Self::ToolCall(_) => "tool-call",
            Self::ToolResult(_) => "tool-result",
            Self::ToolError(_) => "tool-error",
            Self::ReasoningStart(_) => "reasoning-start",
            Self::ReasoningDelta(_) => "reasoning-delta",
            Self::ReasoningEnd(_) => "reasoning-end",
            Self::ResponseMetadata(_) => "response-metadata",
            Self::Finish(_) => "finish",
            Self::Error(_) => "error",
        }
    }

    /// Terminal error event for callers that abort a stream themselves.
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error(ErrorPayload {
            error: message.into(),
        })
    }

    /// Tool call id for tool lifecycle events, `None` for everything else.
    pub fn tool_call_id(&self) -> Option<&str> {
        match self {
            Self::ToolInputStart(start) => Some(start.id.as_str()),
            Self::ToolInputDelta(delta) => Some(delta.id.as_str()),
            Self::ToolInputEnd(part) => Some(part.id.as_str()),
            Self::ToolCall(call) => Some(call.tool_call_id.as_str()),
            Self::ToolResult(result) => Some(result.tool_call_id.as_str()),
            Self::ToolError(error) => Some(error.tool_call_id.as_str()),
            _ => None,
        }
    }

    /// Part id for text and reasoning events.
    pub fn part_id(&self) -> Option<&str> {
        match self {
            Self::TextStart(part)
            | Self::TextEnd(part)
            | Self::ReasoningStart(part)
            | Self::ReasoningEnd(part) => Some(part.id.as_str()),
            Self::TextDelta(delta) | Self::ReasoningDelta(delta) => Some(delta.id.as_str()),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StreamStart {
    pub warnings: Vec<Warning>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Warning {
    #[serde(rename = "type")]
    pub kind: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PartRef {
    pub id: String,
}

impl PartRef {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PartDelta {
    pub id: String,
    pub delta: String,
}

impl PartDelta {
    pub fn new(id: impl Into<String>, delta: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            delta: delta.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProviderMetadata {
    #[serde(rename = "claude-code")]
    pub claude_code: ToolMetadata,
}

/// Absent raw fields are omitted; `parentToolCallId` is always present and `null` for
/// top-level tools.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolMetadata {
    pub parent_tool_call_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_input: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_result: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_result_truncated: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_error: Option<String>,
}

impl ProviderMetadata {
    fn with_parent(parent_tool_call_id: Option<String>) -> Self {
        Self {
            claude_code: ToolMetadata {
                parent_tool_call_id,
                ..ToolMetadata::default()
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolInputStart {
    pub id: String,
    pub tool_name: String,
    pub provider_executed: bool,
    pub dynamic: bool,
    pub provider_metadata: ProviderMetadata,
}

impl ToolInputStart {
    pub fn new(
        id: impl Into<String>,
        tool_name: impl Into<String>,
        parent_tool_call_id: Option<String>,
    ) -> Self {
        Self {
            id: id.into(),
            tool_name: tool_name.into(),
            provider_executed: true,
            dynamic: true,
            provider_metadata: ProviderMetadata::with_parent(parent_tool_call_id),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolCall {
    pub tool_call_id: String,
    pub tool_name: String,
    pub input: String,
    pub provider_executed: bool,
    pub dynamic: bool,
    pub provider_metadata: ProviderMetadata,
}

impl ToolCall {
    pub fn new(
        tool_call_id: impl Into<String>,
        tool_name: impl Into<String>,
        input: impl Into<String>,
        parent_tool_call_id: Option<String>,
    ) -> Self {
        let input = input.into();
        let mut provider_metadata = ProviderMetadata::with_parent(parent_tool_call_id);
        provider_metadata.claude_code.raw_input = Some(input.clone());
        Self {
            tool_call_id: tool_call_id.into(),
            tool_name: tool_name.into(),
            input,
            provider_executed: true,
            dynamic: true,
            provider_metadata,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolResult {
    pub tool_call_id: String,
    pub tool_name: String,
    pub result: Value,
    pub is_error: bool,
    pub provider_executed: bool,
    pub dynamic: bool,
    pub provider_metadata: ProviderMetadata,
}

impl ToolResult {
    pub fn new(
        tool_call_id: impl Into<String>,
        tool_name: impl Into<String>,
        result: Value,
        is_error: bool,
        parent_tool_call_id: Option<String>,
    ) -> Self {
        Self {
            tool_call_id: tool_call_id.into(),
            tool_name: tool_name.into(),
            result,
            is_error,
            provider_executed: true,
            dynamic: true,
            provider_metadata: ProviderMetadata::with_parent(parent_tool_call_id),
        }
    }

    pub fn with_raw_result(mut self, raw_result: String, truncated: bool) -> Self {
        self.provider_metadata.claude_code.raw_result = Some(raw_result);
        self.provider_metadata.claude_code.raw_result_truncated = Some(truncated);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolError {
    pub tool_call_id: String,
    pub tool_name: String,
    pub error: String,
    pub provider_executed: bool,
    pub dynamic: bool,
    pub provider_metadata: ProviderMetadata,
}

impl ToolError {
    pub fn new(
        tool_call_id: impl Into<String>,
        tool_name: impl Into<String>,
        error: impl Into<String>,
        parent_tool_call_id: Option<String>,
    ) -> Self {
        let error = error.into();
        let mut provider_metadata = ProviderMetadata::with_parent(parent_tool_call_id);
        provider_metadata.claude_code.raw_error = Some(error.clone());
        Self {
            tool_call_id: tool_call_id.into(),
            tool_name: tool_name.into(),
            error,
            provider_executed: true,
            dynamic: true,
            provider_metadata,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cost_usd: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FinishReason {
    Stop,
    Length,
    Error,
}

impl FinishReason {
    /// Maps the `result` envelope subtype. Absent or unrecognized subtypes count as `stop`.
    pub fn from_subtype(subtype: Option<&str>) -> Self {
        match subtype {
            Some("error") => Self::Error,
            Some("max_tokens") => Self::Length,
            _ => Self::Stop,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FinishMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cost_usd: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Finish {
    pub finish_reason: FinishReason,
    pub usage: UsageStats,
    pub metadata: FinishMetadata,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorPayload {
    pub error: String,
}
