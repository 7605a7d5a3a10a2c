use serde_json::Value;
use tracing::debug;
use uuid::Uuid;

use crate::{BlockKind, ContentBlock};

/// Name reported for a tool whose block carries no usable name.
pub const UNKNOWN_TOOL_NAME: &str = "unknown_tool";

#[derive(Debug, Clone, PartialEq)]
pub struct ToolUse {
    pub id: String,
    pub name: String,
    pub input: Option<Value>,
    pub parent_tool_use_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ToolResult {
    pub tool_use_id: String,
    pub name: Option<String>,
    pub content: Option<Value>,
    pub is_error: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ToolError {
    pub tool_use_id: String,
    pub name: Option<String>,
    pub error: Option<Value>,
}

/// Fresh random identifier for parts and for tool blocks that arrive without one.
pub fn generate_id() -> String {
    Uuid::new_v4().to_string()
}

/// Treats an empty string the same as an absent one.
pub fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|value| !value.is_empty())
}

fn id_or_generated(value: Option<&str>, block: &'static str) -> String {
    match non_empty(value) {
        Some(id) => id.to_string(),
        None => {
            let id = generate_id();
            debug!(target: "claude_stream", block, generated_id = %id, "block carried no id");
            id
        }
    }
}

pub fn extract_tool_uses(content: &[ContentBlock]) -> Vec<ToolUse> {
    content
        .iter()
        .filter(|block| block.kind == BlockKind::ToolUse)
        .map(|block| ToolUse {
            id: id_or_generated(block.id.as_deref(), "tool_use"),
            name: non_empty(block.name.as_deref())
                .unwrap_or(UNKNOWN_TOOL_NAME)
                .to_string(),
            input: block.input.clone(),
            parent_tool_use_id: non_empty(block.parent_tool_use_id.as_deref())
                .map(str::to_string),
        })
        .collect()
}

pub fn extract_tool_results(content: &[ContentBlock]) -> Vec<ToolResult> {
    content
        .iter()
        .filter(|block| block.kind == BlockKind::ToolResult)
        .map(|block| ToolResult {
            tool_use_id: id_or_generated(block.tool_use_id.as_deref(), "tool_result"),
            name: non_empty(block.name.as_deref()).map(str::to_string),
            content: block.content.clone(),
            is_error: block.is_error.unwrap_or(false),
        })
        .collect()
}

pub fn extract_tool_errors(content: &[ContentBlock]) -> Vec<ToolError> {
    content
        .iter()
        .filter(|block| block.kind == BlockKind::ToolError)
        .map(|block| ToolError {
            tool_use_id: id_or_generated(block.tool_use_id.as_deref(), "tool_error"),
            name: non_empty(block.name.as_deref()).map(str::to_string),
            error: block.error.clone(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn blocks(value: Value) -> Vec<ContentBlock> {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn tool_uses_keep_order_and_skip_other_blocks() {
        let content = blocks(json!([
            {"type": "text", "text": "looking"},
            {"type": "tool_use", "id": "a", "name": "Read", "input": {"path": "x"}},
            {"type": "tool_use", "id": "b", "name": "Grep", "parent_tool_use_id": "task-1"},
        ]));
        let uses = extract_tool_uses(&content);
        assert_eq!(uses.len(), 2);
        assert_eq!(uses[0].id, "a");
        assert_eq!(uses[0].input, Some(json!({"path": "x"})));
        assert_eq!(uses[1].name, "Grep");
        assert_eq!(uses[1].input, None);
        assert_eq!(uses[1].parent_tool_use_id.as_deref(), Some("task-1"));
    }

    #[test]
    fn missing_ids_and_names_are_filled_in() {
        let content = blocks(json!([
            {"type": "tool_use", "id": "", "input": {}},
            {"type": "tool_use", "name": ""},
        ]));
        let uses = extract_tool_uses(&content);
        assert_eq!(uses.len(), 2);
        assert!(!uses[0].id.is_empty());
        assert!(!uses[1].id.is_empty());
        assert_ne!(uses[0].id, uses[1].id);
        assert!(uses.iter().all(|tool| tool.name == UNKNOWN_TOOL_NAME));
    }

    #[test]
    fn results_default_to_success_and_keep_absent_names() {
        let content = blocks(json!([
            {"type": "tool_result", "tool_use_id": "a", "content": "ok"},
            {"type": "tool_result", "tool_use_id": "b", "name": "Bash", "is_error": true},
        ]));
        let results = extract_tool_results(&content);
        assert_eq!(results[0].name, None);
        assert!(!results[0].is_error);
        assert_eq!(results[0].content, Some(json!("ok")));
        assert_eq!(results[1].name.as_deref(), Some("Bash"));
        assert!(results[1].is_error);
        assert_eq!(results[1].content, None);
    }

    #[test]
    fn errors_generate_ids_when_missing() {
        let content = blocks(json!([
            {"type": "tool_error", "error": {"message": "denied"}},
            {"type": "tool_result", "tool_use_id": "ignored"},
        ]));
        let errors = extract_tool_errors(&content);
        assert_eq!(errors.len(), 1);
        assert!(!errors[0].tool_use_id.is_empty());
        assert_eq!(errors[0].error, Some(json!({"message": "denied"})));
    }
}
