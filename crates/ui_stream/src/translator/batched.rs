//! Id-addressed `assistant` and `user` envelopes carrying complete content blocks.

use claude_stream::{
    extract_tool_errors, extract_tool_results, extract_tool_uses, generate_id, non_empty,
    BlockKind, Envelope, ToolUse, UNKNOWN_TOOL_NAME,
};
use serde_json::Value;

use super::{push_call, serialize_value, unseen_suffix, Translator};
use crate::event::{OutputEvent, PartDelta, PartRef, ToolError, ToolResult};
use crate::tracker::ToolInvocationState;

impl Translator {
    pub(super) fn handle_assistant(&mut self, envelope: &Envelope, out: &mut Vec<OutputEvent>) {
        let Some(message) = envelope.message.as_ref() else {
            return;
        };
        if message.content.is_empty() {
            return;
        }
        let message_parent = non_empty(envelope.parent_tool_use_id.as_deref());

        for block in &message.content {
            match block.kind {
                BlockKind::Text => {
                    if let Some(text) = block.text.as_deref() {
                        self.batched_text(text, out);
                    }
                }
                BlockKind::Thinking => {
                    if let Some(thinking) = block.thinking.as_deref() {
                        self.batched_reasoning(thinking, out);
                    }
                }
                _ => {}
            }
        }
        self.streamed_text.clear();
        self.streamed_reasoning.clear();

        let tools = extract_tool_uses(&message.content);
        if tools.is_empty() {
            return;
        }
        self.close_text_part(out);
        for tool in tools {
            self.batched_tool_use(tool, message_parent, out);
        }
    }

    fn batched_text(&mut self, text: &str, out: &mut Vec<OutputEvent>) {
        let unseen = unseen_suffix(&mut self.streamed_text, text);
        if unseen.is_empty() {
            return;
        }
        let unseen = unseen.to_string();
        let id = self.open_text_part(out);
        out.push(OutputEvent::TextDelta(PartDelta::new(id, unseen)));
    }

    fn batched_reasoning(&mut self, thinking: &str, out: &mut Vec<OutputEvent>) {
        let unseen = unseen_suffix(&mut self.streamed_reasoning, thinking);
        if unseen.is_empty() {
            return;
        }
        let unseen = unseen.to_string();
        self.close_text_part(out);
        let id = generate_id();
        out.push(OutputEvent::ReasoningStart(PartRef::new(id.clone())));
        out.push(OutputEvent::ReasoningDelta(PartDelta::new(id.clone(), unseen)));
        out.push(OutputEvent::ReasoningEnd(PartRef::new(id)));
    }

    fn batched_tool_use(
        &mut self,
        tool: ToolUse,
        message_parent: Option<&str>,
        out: &mut Vec<OutputEvent>,
    ) {
        let is_sub_agent = self.config.is_sub_agent(&tool.name);
        if let Some(state) = self.tracker.get_mut(&tool.id) {
            // A message-level parent arriving after the tool was first seen still applies
            // until the call has gone out.
            if !state.call_emitted && !is_sub_agent {
                if let Some(parent) = message_parent {
                    state.parent_tool_call_id = Some(parent.to_string());
                }
            }
        }
        self.start_tool(
            &tool.id,
            &tool.name,
            &[message_parent, tool.parent_tool_use_id.as_deref()],
            out,
        );

        let limit = self.config.max_incremental_input_len;
        let serialized = serialize_value(tool.input.as_ref());
        let Some(state) = self.tracker.get_mut(&tool.id) else {
            return;
        };
        if serialized.is_empty() {
            return;
        }
        if !state.input_closed {
            let delta = match state.last_serialized_input.as_deref() {
                None if serialized.len() <= limit => Some(serialized.as_str()),
                Some(previous) if serialized.len() <= limit && previous.len() <= limit => {
                    serialized.strip_prefix(previous).filter(|rest| !rest.is_empty())
                }
                _ => None,
            };
            if let Some(delta) = delta {
                out.push(OutputEvent::ToolInputDelta(PartDelta::new(
                    tool.id.clone(),
                    delta,
                )));
            }
        }
        state.last_serialized_input = Some(serialized);
    }

    pub(super) fn handle_user(&mut self, envelope: &Envelope, out: &mut Vec<OutputEvent>) {
        let Some(message) = envelope.message.as_ref() else {
            return;
        };
        let message_parent = non_empty(envelope.parent_tool_use_id.as_deref());

        for result in extract_tool_results(&message.content) {
            let (name, parent) =
                self.settle_tool_call(&result.tool_use_id, result.name.as_deref(), message_parent, out);
            let (raw_result, truncated) =
                self.bounded_raw_result(serialize_value(result.content.as_ref()));
            out.push(OutputEvent::ToolResult(
                ToolResult::new(
                    result.tool_use_id,
                    name,
                    result.content.unwrap_or(Value::Null),
                    result.is_error,
                    parent,
                )
                .with_raw_result(raw_result, truncated),
            ));
        }

        for error in extract_tool_errors(&message.content) {
            let (name, parent) =
                self.settle_tool_call(&error.tool_use_id, error.name.as_deref(), message_parent, out);
            out.push(OutputEvent::ToolError(ToolError::new(
                error.tool_use_id,
                name,
                serialize_value(error.error.as_ref()),
                parent,
            )));
        }
    }

    /// Makes sure the tool's `tool-call` has gone out before its outcome is reported.
    /// Returns the tool name and parent to report the outcome under.
    fn settle_tool_call(
        &mut self,
        id: &str,
        reported_name: Option<&str>,
        message_parent: Option<&str>,
        out: &mut Vec<OutputEvent>,
    ) -> (String, Option<String>) {
        let name = reported_name
            .map(str::to_string)
            .or_else(|| self.tracker.get(id).map(|state| state.name.clone()))
            .unwrap_or_else(|| UNKNOWN_TOOL_NAME.to_string());
        let is_sub_agent = self.config.is_sub_agent(&name);

        if !self.tracker.contains(id) {
            let parent = self.resolve_parent(is_sub_agent, &[message_parent]);
            let state = self
                .tracker
                .insert(id, ToolInvocationState::new(name.as_str(), parent));
            state.input_started = true;
            state.input_closed = true;
        }

        if let Some(call) = self.tracker.emit_call(id) {
            push_call(out, call, Some(&name));
        }
        if is_sub_agent {
            self.tracker.track_sub_agent(id, false);
        }

        let parent = self
            .tracker
            .get(id)
            .and_then(|state| state.parent_tool_call_id.clone());
        (name, parent)
    }

    fn bounded_raw_result(&self, raw: String) -> (String, bool) {
        match self.config.max_raw_result_chars {
            Some(max_chars) => match raw.char_indices().nth(max_chars) {
                Some((cut, _)) => (raw[..cut].to_string(), true),
                None => (raw, false),
            },
            None => (raw, false),
        }
    }
}
