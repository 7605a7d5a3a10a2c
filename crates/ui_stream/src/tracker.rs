//! Per-stream bookkeeping for tool invocations and open content parts.
//!
//! Each tool moves through `input started -> input closed -> call emitted` at most once.
//! The tracker only records those transitions; the translator decides which events to emit
//! for them.

use std::collections::{BTreeSet, HashMap};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolInvocationState {
    pub name: String,
    pub last_serialized_input: Option<String>,
    pub input_started: bool,
    pub input_closed: bool,
    pub call_emitted: bool,
    pub parent_tool_call_id: Option<String>,
}

impl ToolInvocationState {
    pub fn new(name: impl Into<String>, parent_tool_call_id: Option<String>) -> Self {
        Self {
            name: name.into(),
            parent_tool_call_id,
            ..Self::default()
        }
    }
}

/// A tool whose `tool-call` is due. `closed_input` is set when the same transition also
/// closed its input, so a `tool-input-end` must precede the call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingCall {
    pub id: String,
    pub name: String,
    pub input: String,
    pub parent_tool_call_id: Option<String>,
    pub closed_input: bool,
}

#[derive(Debug, Default)]
pub struct LifecycleTracker {
    tools: HashMap<String, ToolInvocationState>,
    first_seen: Vec<String>,
    tool_blocks_by_index: HashMap<usize, String>,
    input_accumulators: HashMap<String, String>,
    text_blocks_by_index: HashMap<usize, String>,
    reasoning_blocks_by_index: HashMap<usize, String>,
    active_sub_agents: BTreeSet<String>,
}

impl LifecycleTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.tools.contains_key(id)
    }

    pub fn get(&self, id: &str) -> Option<&ToolInvocationState> {
        self.tools.get(id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut ToolInvocationState> {
        self.tools.get_mut(id)
    }

    /// Registers a tool unless it is already tracked. Returns the tracked state either way.
    pub fn insert(
        &mut self,
        id: impl Into<String>,
        state: ToolInvocationState,
    ) -> &mut ToolInvocationState {
        let id = id.into();
        if !self.tools.contains_key(&id) {
            self.first_seen.push(id.clone());
        }
        self.tools.entry(id).or_insert(state)
    }

    /// Marks a started tool's input closed. Returns `true` only on the transition.
    pub fn close_input(&mut self, id: &str) -> bool {
        match self.tools.get_mut(id) {
            Some(state) if state.input_started && !state.input_closed => {
                state.input_closed = true;
                true
            }
            _ => false,
        }
    }

    /// Marks a tool's call emitted, closing its input first when needed.
    ///
    /// Returns `None` for unknown tools and for tools whose call was already emitted.
    pub fn emit_call(&mut self, id: &str) -> Option<PendingCall> {
        let fallback_input = self.input_accumulators.get(id).cloned();
        let state = self.tools.get_mut(id)?;
        if state.call_emitted {
            return None;
        }
        let closed_input = state.input_started && !state.input_closed;
        state.input_closed = true;
        state.call_emitted = true;
        Some(PendingCall {
            id: id.to_string(),
            name: state.name.clone(),
            input: state
                .last_serialized_input
                .clone()
                .or(fallback_input)
                .unwrap_or_default(),
            parent_tool_call_id: state.parent_tool_call_id.clone(),
            closed_input,
        })
    }

    /// Emits every outstanding call in first-seen order and forgets all per-stream state.
    /// Calling it again yields nothing.
    pub fn finalize(&mut self) -> Vec<PendingCall> {
        let order = std::mem::take(&mut self.first_seen);
        let pending: Vec<_> = order
            .iter()
            .filter_map(|id| self.emit_call(id))
            .collect();
        self.tools.clear();
        self.tool_blocks_by_index.clear();
        self.input_accumulators.clear();
        self.text_blocks_by_index.clear();
        self.reasoning_blocks_by_index.clear();
        self.active_sub_agents.clear();
        pending
    }

    /// The single running sub-agent, if exactly one is running.
    pub fn fallback_parent(&self) -> Option<String> {
        if self.active_sub_agents.len() == 1 {
            self.active_sub_agents.iter().next().cloned()
        } else {
            None
        }
    }

    pub fn track_sub_agent(&mut self, id: &str, active: bool) {
        if active {
            self.active_sub_agents.insert(id.to_string());
        } else {
            self.active_sub_agents.remove(id);
        }
    }

    pub fn bind_tool_index(&mut self, index: usize, id: &str) {
        self.tool_blocks_by_index.insert(index, id.to_string());
        self.input_accumulators.entry(id.to_string()).or_default();
    }

    pub fn tool_at(&self, index: usize) -> Option<&str> {
        self.tool_blocks_by_index.get(&index).map(String::as_str)
    }

    pub fn unbind_tool_index(&mut self, index: usize) -> Option<String> {
        self.tool_blocks_by_index.remove(&index)
    }

    pub fn append_input(&mut self, id: &str, fragment: &str) {
        self.input_accumulators
            .entry(id.to_string())
            .or_default()
            .push_str(fragment);
    }

    pub fn take_accumulated_input(&mut self, id: &str) -> Option<String> {
        self.input_accumulators.remove(id)
    }

    pub fn bind_text_index(&mut self, index: usize, part_id: &str) {
        self.text_blocks_by_index.insert(index, part_id.to_string());
    }

    pub fn text_at(&self, index: usize) -> Option<&str> {
        self.text_blocks_by_index.get(&index).map(String::as_str)
    }

    /// Forgets every index mapped to `part_id`.
    pub fn unbind_text_part(&mut self, part_id: &str) {
        self.text_blocks_by_index.retain(|_, id| id != part_id);
    }

    pub fn bind_reasoning_index(&mut self, index: usize, part_id: &str) {
        self.reasoning_blocks_by_index
            .insert(index, part_id.to_string());
    }

    pub fn reasoning_at(&self, index: usize) -> Option<&str> {
        self.reasoning_blocks_by_index.get(&index).map(String::as_str)
    }

    pub fn unbind_reasoning_part(&mut self, part_id: &str) {
        self.reasoning_blocks_by_index.retain(|_, id| id != part_id);
    }

    /// Removes and returns every reasoning part still bound to an index, deduplicated and
    /// ordered by index.
    pub fn drain_reasoning_parts(&mut self) -> Vec<String> {
        let mut bound: Vec<_> = self.reasoning_blocks_by_index.drain().collect();
        bound.sort_by_key(|(index, _)| *index);
        let mut parts: Vec<String> = Vec::with_capacity(bound.len());
        for (_, part_id) in bound {
            if !parts.contains(&part_id) {
                parts.push(part_id);
            }
        }
        parts
    }

    /// True once nothing is tracked, as after [`Self::finalize`].
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
            && self.first_seen.is_empty()
            && self.tool_blocks_by_index.is_empty()
            && self.input_accumulators.is_empty()
            && self.text_blocks_by_index.is_empty()
            && self.reasoning_blocks_by_index.is_empty()
            && self.active_sub_agents.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn started(tracker: &mut LifecycleTracker, id: &str, name: &str) {
        tracker.insert(id, ToolInvocationState::new(name, None)).input_started = true;
    }

    #[test]
    fn close_input_transitions_once() {
        let mut tracker = LifecycleTracker::new();
        assert!(!tracker.close_input("missing"));

        tracker.insert("a", ToolInvocationState::new("Read", None));
        assert!(!tracker.close_input("a"), "input never started");

        started(&mut tracker, "b", "Read");
        assert!(tracker.close_input("b"));
        assert!(!tracker.close_input("b"));
    }

    #[test]
    fn emit_call_closes_input_and_transitions_once() {
        let mut tracker = LifecycleTracker::new();
        started(&mut tracker, "a", "Bash");
        tracker.get_mut("a").unwrap().last_serialized_input = Some("{}".into());

        let call = tracker.emit_call("a").unwrap();
        assert!(call.closed_input);
        assert_eq!(call.input, "{}");
        assert!(tracker.get("a").unwrap().input_closed);
        assert!(tracker.emit_call("a").is_none());
        assert!(tracker.emit_call("missing").is_none());
    }

    #[test]
    fn emit_call_after_close_does_not_close_again() {
        let mut tracker = LifecycleTracker::new();
        started(&mut tracker, "a", "Bash");
        assert!(tracker.close_input("a"));
        assert!(!tracker.emit_call("a").unwrap().closed_input);
    }

    #[test]
    fn insert_keeps_existing_state() {
        let mut tracker = LifecycleTracker::new();
        tracker.insert("a", ToolInvocationState::new("Read", Some("p".into())));
        let state = tracker.insert("a", ToolInvocationState::new("Other", None));
        assert_eq!(state.name, "Read");
        assert_eq!(state.parent_tool_call_id.as_deref(), Some("p"));
    }

    #[test]
    fn finalize_emits_stragglers_in_first_seen_order_and_clears() {
        let mut tracker = LifecycleTracker::new();
        started(&mut tracker, "z", "Bash");
        started(&mut tracker, "a", "Read");
        started(&mut tracker, "m", "Grep");
        tracker.emit_call("a");
        tracker.bind_tool_index(3, "m");
        tracker.append_input("m", "{\"pattern\":");
        tracker.track_sub_agent("task", true);
        tracker.bind_text_index(0, "text-part");

        let pending = tracker.finalize();
        let ids: Vec<_> = pending.iter().map(|call| call.id.as_str()).collect();
        assert_eq!(ids, ["z", "m"]);
        assert_eq!(pending[1].input, "{\"pattern\":");
        assert!(tracker.is_empty());
        assert!(tracker.finalize().is_empty());
    }

    #[test]
    fn fallback_parent_requires_exactly_one_sub_agent() {
        let mut tracker = LifecycleTracker::new();
        assert_eq!(tracker.fallback_parent(), None);
        tracker.track_sub_agent("t1", true);
        assert_eq!(tracker.fallback_parent().as_deref(), Some("t1"));
        tracker.track_sub_agent("t2", true);
        assert_eq!(tracker.fallback_parent(), None);
        tracker.track_sub_agent("t1", false);
        assert_eq!(tracker.fallback_parent().as_deref(), Some("t2"));
    }

    #[test]
    fn reasoning_parts_drain_once_per_part() {
        let mut tracker = LifecycleTracker::new();
        tracker.bind_reasoning_index(2, "r2");
        tracker.bind_reasoning_index(0, "r0");
        tracker.bind_reasoning_index(5, "r0");
        assert_eq!(tracker.drain_reasoning_parts(), ["r0", "r2"]);
        assert_eq!(tracker.reasoning_at(2), None);
    }
}
