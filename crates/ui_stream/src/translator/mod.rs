//! Sans-IO translation of upstream envelopes into downstream events.
//!
//! [`Translator::handle`] appends the events produced by one envelope to a caller-owned
//! buffer. The blocking and async drivers in [`crate::ingest`] share this core and differ
//! only in how they read lines and write frames.

use claude_stream::{
    generate_id, non_empty, normalize_usage, Envelope, EnvelopeKind, RawUsage,
};
use serde_json::Value;
use tracing::{debug, trace};

use crate::event::{
    Finish, FinishMetadata, FinishReason, OutputEvent, PartRef, ResponseMetadata, StreamStart,
    ToolCall, ToolInputStart,
};
use crate::tracker::{LifecycleTracker, PendingCall, ToolInvocationState};
use crate::TranslatorConfig;

mod batched;
mod fine_grained;

/// Token counts handed to the usage callback once a stream finishes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TokenUsage {
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub cache_read_tokens: u64,
}

impl TokenUsage {
    pub fn from_raw(raw: &RawUsage) -> Self {
        Self {
            input_tokens: raw.input_tokens.unwrap_or(0),
            output_tokens: raw.output_tokens.unwrap_or(0),
            cache_read_tokens: raw.cache_read_input_tokens.unwrap_or(0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Completion {
    pub finish_reason: FinishReason,
    /// `None` when the result envelope carried no usage record.
    pub token_usage: Option<TokenUsage>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Continue,
    Finished(Completion),
}

#[derive(Debug)]
pub struct Translator {
    config: TranslatorConfig,
    tracker: LifecycleTracker,
    text_part: Option<String>,
    reasoning_part: Option<String>,
    streamed_text: String,
    streamed_reasoning: String,
    metadata_sent: bool,
    finished: bool,
}

impl Translator {
    pub fn new(config: TranslatorConfig) -> Self {
        Self {
            config,
            tracker: LifecycleTracker::new(),
            text_part: None,
            reasoning_part: None,
            streamed_text: String::new(),
            streamed_reasoning: String::new(),
            metadata_sent: false,
            finished: false,
        }
    }

    /// The event that opens every stream.
    pub fn start(&self, out: &mut Vec<OutputEvent>) {
        out.push(OutputEvent::StreamStart(StreamStart::default()));
    }

    /// Translates one envelope. Envelopes arriving after the stream finished are ignored.
    pub fn handle(&mut self, envelope: &Envelope, out: &mut Vec<OutputEvent>) -> Step {
        if self.finished {
            debug!(target: "ui_stream::translator", kind = ?envelope.kind, "envelope after finish ignored");
            return Step::Continue;
        }

        let before = out.len();
        let step = match envelope.kind {
            EnvelopeKind::StreamEvent => {
                self.handle_stream_event(envelope, out);
                Step::Continue
            }
            EnvelopeKind::Assistant => {
                self.handle_assistant(envelope, out);
                Step::Continue
            }
            EnvelopeKind::User => {
                self.handle_user(envelope, out);
                Step::Continue
            }
            EnvelopeKind::System => {
                self.handle_system(envelope, out);
                Step::Continue
            }
            EnvelopeKind::Result => Step::Finished(self.handle_result(envelope, out)),
            EnvelopeKind::Unknown => Step::Continue,
        };
        trace!(
            target: "ui_stream::translator",
            kind = ?envelope.kind,
            events = out.len() - before,
            "envelope translated"
        );
        step
    }

    /// Closes open parts and flushes outstanding tool calls when the input ends without a
    /// `result` envelope. No `finish` event is produced.
    pub fn finish_without_result(&mut self, out: &mut Vec<OutputEvent>) {
        if self.finished {
            return;
        }
        self.close_text_part(out);
        self.close_reasoning_parts(out);
        self.flush_pending_calls(out);
        self.finished = true;
    }

    fn handle_system(&mut self, envelope: &Envelope, out: &mut Vec<OutputEvent>) {
        if !self.config.emit_response_metadata
            || self.metadata_sent
            || envelope.subtype.as_deref() != Some("init")
        {
            return;
        }
        let session_id = non_empty(envelope.session_id.as_deref()).map(str::to_string);
        let model_id = non_empty(envelope.model.as_deref()).map(str::to_string);
        if session_id.is_none() && model_id.is_none() {
            return;
        }
        self.metadata_sent = true;
        out.push(OutputEvent::ResponseMetadata(ResponseMetadata {
            session_id,
            model_id,
            cost_usd: None,
        }));
    }

    fn handle_result(&mut self, envelope: &Envelope, out: &mut Vec<OutputEvent>) -> Completion {
        self.close_text_part(out);
        self.close_reasoning_parts(out);
        self.flush_pending_calls(out);

        let finish_reason = FinishReason::from_subtype(envelope.subtype.as_deref());
        out.push(OutputEvent::Finish(Finish {
            finish_reason,
            usage: normalize_usage(envelope.usage.as_ref()),
            metadata: FinishMetadata {
                session_id: non_empty(envelope.session_id.as_deref()).map(str::to_string),
                cost_usd: envelope.total_cost_usd,
                duration_ms: envelope.duration_ms,
            },
        }));
        self.finished = true;

        Completion {
            finish_reason,
            token_usage: envelope.usage.as_ref().map(TokenUsage::from_raw),
        }
    }

    fn flush_pending_calls(&mut self, out: &mut Vec<OutputEvent>) {
        let pending = self.tracker.finalize();
        if !pending.is_empty() {
            debug!(target: "ui_stream::translator", count = pending.len(), "flushing tool calls without a result");
        }
        for call in pending {
            push_call(out, call, None);
        }
    }

    /// Parent for a newly seen tool: sub-agent tools are top-level, otherwise the first
    /// explicit parent wins and the single running sub-agent is the fallback.
    fn resolve_parent(&self, is_sub_agent: bool, explicit: &[Option<&str>]) -> Option<String> {
        if is_sub_agent {
            return None;
        }
        explicit
            .iter()
            .find_map(|parent| non_empty(*parent))
            .map(str::to_string)
            .or_else(|| self.tracker.fallback_parent())
    }

    /// Registers `id` if it is new and emits `tool-input-start` if its input has not
    /// started yet. Returns the parent recorded for the tool.
    fn start_tool(
        &mut self,
        id: &str,
        name: &str,
        explicit_parents: &[Option<&str>],
        out: &mut Vec<OutputEvent>,
    ) -> Option<String> {
        if !self.tracker.contains(id) {
            let is_sub_agent = self.config.is_sub_agent(name);
            let parent = self.resolve_parent(is_sub_agent, explicit_parents);
            self.tracker
                .insert(id, ToolInvocationState::new(name, parent));
            if is_sub_agent {
                self.tracker.track_sub_agent(id, true);
            }
        }

        let state = self.tracker.get_mut(id)?;
        if !state.input_started {
            state.input_started = true;
            out.push(OutputEvent::ToolInputStart(ToolInputStart::new(
                id,
                name,
                state.parent_tool_call_id.clone(),
            )));
        }
        state.parent_tool_call_id.clone()
    }

    fn open_text_part(&mut self, out: &mut Vec<OutputEvent>) -> String {
        if let Some(id) = &self.text_part {
            return id.clone();
        }
        let id = generate_id();
        out.push(OutputEvent::TextStart(PartRef::new(id.clone())));
        self.text_part = Some(id.clone());
        id
    }

    fn close_text_part(&mut self, out: &mut Vec<OutputEvent>) {
        if let Some(id) = self.text_part.take() {
            self.tracker.unbind_text_part(&id);
            out.push(OutputEvent::TextEnd(PartRef::new(id)));
        }
    }

    fn close_reasoning_parts(&mut self, out: &mut Vec<OutputEvent>) {
        let mut parts = self.tracker.drain_reasoning_parts();
        if let Some(current) = self.reasoning_part.take() {
            if !parts.contains(&current) {
                parts.push(current);
            }
        }
        for id in parts {
            out.push(OutputEvent::ReasoningEnd(PartRef::new(id)));
        }
    }
}

/// Emits `tool-input-end` when the call also closed the input, then the call itself.
fn push_call(out: &mut Vec<OutputEvent>, call: PendingCall, name_override: Option<&str>) {
    if call.closed_input {
        out.push(OutputEvent::ToolInputEnd(PartRef::new(call.id.clone())));
    }
    let name = name_override.map_or(call.name, str::to_string);
    out.push(OutputEvent::ToolCall(ToolCall::new(
        call.id,
        name,
        call.input,
        call.parent_tool_call_id,
    )));
}

/// Serialized form used for tool inputs, results and errors: absent is empty, strings are
/// passed through, anything else is compact JSON.
pub(crate) fn serialize_value(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(text)) => text.clone(),
        Some(other) => other.to_string(),
    }
}

/// Returns the part of `text` not already delivered through `streamed`, consuming the
/// matched prefix of `streamed`.
fn unseen_suffix<'a>(streamed: &mut String, text: &'a str) -> &'a str {
    if streamed.is_empty() {
        return text;
    }
    if streamed.starts_with(text) {
        streamed.drain(..text.len());
        return "";
    }
    if let Some(rest) = text.strip_prefix(streamed.as_str()) {
        streamed.clear();
        return rest;
    }
    streamed.clear();
    text
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn serialize_value_passes_strings_through() {
        assert_eq!(serialize_value(None), "");
        assert_eq!(serialize_value(Some(&Value::Null)), "");
        assert_eq!(serialize_value(Some(&json!("plain"))), "plain");
        assert_eq!(
            serialize_value(Some(&json!({"b": 1, "a": [true]}))),
            r#"{"a":[true],"b":1}"#
        );
    }

    #[test]
    fn unseen_suffix_consumes_streamed_prefix() {
        let mut streamed = String::from("Hello world");
        assert_eq!(unseen_suffix(&mut streamed, "Hello"), "");
        assert_eq!(streamed, " world");
        assert_eq!(unseen_suffix(&mut streamed, " world, again"), ", again");
        assert!(streamed.is_empty());
        assert_eq!(unseen_suffix(&mut streamed, "fresh"), "fresh");

        let mut streamed = String::from("abc");
        assert_eq!(unseen_suffix(&mut streamed, "xyz"), "xyz");
        assert!(streamed.is_empty());
    }

    #[test]
    fn token_usage_ignores_cache_creation() {
        let raw: RawUsage = serde_json::from_value(json!({
            "input_tokens": 100,
            "output_tokens": 50,
            "cache_creation_input_tokens": 7,
            "cache_read_input_tokens": 25,
        }))
        .unwrap();
        assert_eq!(
            TokenUsage::from_raw(&raw),
            TokenUsage {
                input_tokens: 100,
                output_tokens: 50,
                cache_read_tokens: 25,
            }
        );
    }
}
