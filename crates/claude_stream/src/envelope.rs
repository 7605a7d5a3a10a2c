use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Outer discriminator of one stream-json line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnvelopeKind {
    StreamEvent,
    Assistant,
    User,
    Result,
    System,
    #[default]
    #[serde(other)]
    Unknown,
}

/// One decoded upstream line.
///
/// Every field besides `type` is optional; the CLI omits most of them depending on the
/// envelope kind.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct Envelope {
    #[serde(rename = "type", default)]
    pub kind: EnvelopeKind,
    #[serde(default)]
    pub subtype: Option<String>,
    #[serde(default)]
    pub message: Option<MessageContent>,
    #[serde(default)]
    pub event: Option<StreamEventDetails>,
    #[serde(default)]
    pub parent_tool_use_id: Option<String>,
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub usage: Option<RawUsage>,
    #[serde(default)]
    pub total_cost_usd: Option<f64>,
    #[serde(default)]
    pub duration_ms: Option<u64>,
    #[serde(default)]
    pub is_error: Option<bool>,
    #[serde(default)]
    pub result: Option<String>,
    #[serde(default)]
    pub structured_output: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct MessageContent {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub content: Vec<ContentBlock>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockKind {
    Text,
    ToolUse,
    ToolResult,
    ToolError,
    Thinking,
    #[default]
    #[serde(other)]
    Other,
}

/// A content block inside a message, or the block announced by `content_block_start`.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct ContentBlock {
    #[serde(rename = "type", default)]
    pub kind: BlockKind,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub input: Option<Value>,
    #[serde(default)]
    pub tool_use_id: Option<String>,
    #[serde(default)]
    pub content: Option<Value>,
    #[serde(default)]
    pub is_error: Option<bool>,
    #[serde(default)]
    pub error: Option<Value>,
    #[serde(default)]
    pub thinking: Option<String>,
    #[serde(default)]
    pub parent_tool_use_id: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreamEventKind {
    ContentBlockStart,
    ContentBlockDelta,
    ContentBlockStop,
    #[default]
    #[serde(other)]
    Other,
}

/// Payload of a `stream_event` envelope.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct StreamEventDetails {
    #[serde(rename = "type", default)]
    pub kind: StreamEventKind,
    #[serde(default)]
    pub index: Option<usize>,
    #[serde(default)]
    pub content_block: Option<ContentBlock>,
    #[serde(default)]
    pub delta: Option<ContentDelta>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeltaKind {
    TextDelta,
    InputJsonDelta,
    ThinkingDelta,
    #[default]
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct ContentDelta {
    #[serde(rename = "type", default)]
    pub kind: DeltaKind,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub partial_json: Option<String>,
    #[serde(default)]
    pub thinking: Option<String>,
}

/// Token counters as reported by the CLI. Unrecognized counters are kept in `extra` so the
/// raw record can be forwarded verbatim.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RawUsage {
    #[serde(default)]
    pub input_tokens: Option<u64>,
    #[serde(default)]
    pub output_tokens: Option<u64>,
    #[serde(default)]
    pub cache_creation_input_tokens: Option<u64>,
    #[serde(default)]
    pub cache_read_input_tokens: Option<u64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_discriminators_fall_back_instead_of_failing() {
        let envelope: Envelope = serde_json::from_str(
            r#"{"type":"rate_limit","event":{"type":"message_delta","delta":{"stop_reason":"end_turn"}}}"#,
        )
        .unwrap();
        assert_eq!(envelope.kind, EnvelopeKind::Unknown);
        let event = envelope.event.unwrap();
        assert_eq!(event.kind, StreamEventKind::Other);
        assert_eq!(event.delta.unwrap().kind, DeltaKind::Other);
    }

    #[test]
    fn null_content_decodes_as_empty() {
        let envelope: Envelope =
            serde_json::from_str(r#"{"type":"assistant","message":{"content":null}}"#).unwrap();
        assert!(envelope.message.unwrap().content.is_empty());
    }

    #[test]
    fn raw_usage_keeps_unrecognized_counters() {
        let usage: RawUsage = serde_json::from_str(
            r#"{"input_tokens":3,"output_tokens":4,"service_tier":"standard"}"#,
        )
        .unwrap();
        assert_eq!(usage.input_tokens, Some(3));
        assert_eq!(usage.cache_read_input_tokens, None);
        assert_eq!(
            usage.extra.get("service_tier"),
            Some(&Value::String("standard".into()))
        );
    }
}
