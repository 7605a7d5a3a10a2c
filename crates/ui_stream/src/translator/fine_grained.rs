//! Index-addressed `stream_event` envelopes (`content_block_start/delta/stop`).

use claude_stream::{
    generate_id, non_empty, BlockKind, ContentBlock, ContentDelta, DeltaKind, Envelope,
    StreamEventKind, UNKNOWN_TOOL_NAME,
};
use tracing::debug;

use super::{push_call, Translator};
use crate::event::{OutputEvent, PartDelta, PartRef};

impl Translator {
    pub(super) fn handle_stream_event(&mut self, envelope: &Envelope, out: &mut Vec<OutputEvent>) {
        let Some(event) = envelope.event.as_ref() else {
            return;
        };
        let index = event.index.unwrap_or(0);
        match event.kind {
            StreamEventKind::ContentBlockStart => {
                if let Some(block) = event.content_block.as_ref() {
                    self.block_start(index, block, envelope.parent_tool_use_id.as_deref(), out);
                }
            }
            StreamEventKind::ContentBlockDelta => {
                if let Some(delta) = event.delta.as_ref() {
                    self.block_delta(index, delta, out);
                }
            }
            StreamEventKind::ContentBlockStop => self.block_stop(index, out),
            StreamEventKind::Other => {}
        }
    }

    fn block_start(
        &mut self,
        index: usize,
        block: &ContentBlock,
        envelope_parent: Option<&str>,
        out: &mut Vec<OutputEvent>,
    ) {
        match block.kind {
            BlockKind::ToolUse => {
                self.close_text_part(out);
                let id = non_empty(block.id.as_deref()).map_or_else(generate_id, str::to_string);
                let name = non_empty(block.name.as_deref()).unwrap_or(UNKNOWN_TOOL_NAME);
                self.start_tool(&id, name, &[envelope_parent], out);
                self.tracker.bind_tool_index(index, &id);
            }
            BlockKind::Text => {
                self.close_text_part(out);
                let id = self.open_text_part(out);
                self.tracker.bind_text_index(index, &id);
            }
            BlockKind::Thinking => {
                self.close_text_part(out);
                let id = generate_id();
                self.tracker.bind_reasoning_index(index, &id);
                self.reasoning_part = Some(id.clone());
                out.push(OutputEvent::ReasoningStart(PartRef::new(id)));
            }
            _ => {}
        }
    }

    fn block_delta(&mut self, index: usize, delta: &ContentDelta, out: &mut Vec<OutputEvent>) {
        match delta.kind {
            DeltaKind::TextDelta => {
                let (Some(text), Some(id)) = (delta.text.as_deref(), self.text_part.clone()) else {
                    return;
                };
                self.streamed_text.push_str(text);
                out.push(OutputEvent::TextDelta(PartDelta::new(id, text)));
            }
            DeltaKind::InputJsonDelta => {
                let Some(partial) = delta.partial_json.as_deref() else {
                    return;
                };
                let Some(id) = self.tracker.tool_at(index).map(str::to_string) else {
                    debug!(target: "ui_stream::translator", index, "input delta for unbound index dropped");
                    return;
                };
                if self.tracker.get(&id).is_some_and(|state| state.input_closed) {
                    return;
                }
                self.tracker.append_input(&id, partial);
                out.push(OutputEvent::ToolInputDelta(PartDelta::new(id, partial)));
            }
            DeltaKind::ThinkingDelta => {
                let Some(thinking) = delta.thinking.as_deref() else {
                    return;
                };
                let Some(id) = self
                    .tracker
                    .reasoning_at(index)
                    .map(str::to_string)
                    .or_else(|| self.reasoning_part.clone())
                else {
                    return;
                };
                self.streamed_reasoning.push_str(thinking);
                out.push(OutputEvent::ReasoningDelta(PartDelta::new(id, thinking)));
            }
            DeltaKind::Other => {}
        }
    }

    fn block_stop(&mut self, index: usize, out: &mut Vec<OutputEvent>) {
        if let Some(id) = self.tracker.unbind_tool_index(index) {
            let accumulated = self.tracker.take_accumulated_input(&id).unwrap_or_default();
            if let Some(state) = self.tracker.get_mut(&id) {
                state.last_serialized_input = Some(accumulated);
            }
            if self.tracker.close_input(&id) {
                out.push(OutputEvent::ToolInputEnd(PartRef::new(id.clone())));
            }
            if let Some(call) = self.tracker.emit_call(&id) {
                push_call(out, call, None);
            }
            return;
        }

        if let Some(id) = self.tracker.text_at(index).map(str::to_string) {
            self.tracker.unbind_text_part(&id);
            if self.text_part.as_deref() == Some(id.as_str()) {
                self.text_part = None;
            }
            out.push(OutputEvent::TextEnd(PartRef::new(id)));
            return;
        }

        if let Some(id) = self.tracker.reasoning_at(index).map(str::to_string) {
            self.tracker.unbind_reasoning_part(&id);
            if self.reasoning_part.as_deref() == Some(id.as_str()) {
                self.reasoning_part = None;
            }
            out.push(OutputEvent::ReasoningEnd(PartRef::new(id)));
        }
    }
}
