//! The message transcript of a single run.
//!
//! Append-only. Tool results can only be appended for calls made by the
//! most recent assistant message, each at most once.

use std::collections::HashSet;

use adopilot_core::types::{Message, ToolCall};

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Conversation {
    messages: Vec<Message>,
}

impl Conversation {
    /// Start a conversation with the user's prompt.
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            messages: vec![Message::user(prompt)],
        }
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn into_messages(self) -> Vec<Message> {
        self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn push_assistant(&mut self, message: Message) {
        debug_assert!(matches!(message, Message::Assistant { .. }));
        self.messages.push(message);
    }

    /// Append the result of `call`.
    ///
    /// Returns `false` and appends nothing when `call` was not made by the
    /// latest assistant message or already has a result.
    pub fn push_tool_result(&mut self, call: &ToolCall, content: impl Into<String>) -> bool {
        if !self.pending_call_ids().contains(call.id.as_str()) {
            return false;
        }
        self.messages
            .push(Message::tool_result(&call.id, &call.function.name, content));
        true
    }

    /// Ids of the latest assistant message's calls that have no result yet.
    fn pending_call_ids(&self) -> HashSet<&str> {
        let Some(turn_start) = self
            .messages
            .iter()
            .rposition(|m| matches!(m, Message::Assistant { .. }))
        else {
            return HashSet::new();
        };

        let mut pending: HashSet<&str> = match &self.messages[turn_start] {
            Message::Assistant {
                tool_calls: Some(calls),
                ..
            } => calls.iter().map(|c| c.id.as_str()).collect(),
            _ => HashSet::new(),
        };

        for message in &self.messages[turn_start + 1..] {
            if let Message::Tool { tool_call_id, .. } = message {
                pending.remove(tool_call_id.as_str());
            }
        }
        pending
    }

    /// Whether every tool result answers a call of the assistant message
    /// that precedes its run of results.
    pub fn is_well_formed(&self) -> bool {
        let mut open: HashSet<&str> = HashSet::new();
        for message in &self.messages {
            match message {
                Message::Assistant { tool_calls, .. } => {
                    open = tool_calls
                        .iter()
                        .flatten()
                        .map(|c| c.id.as_str())
                        .collect();
                }
                Message::Tool { tool_call_id, .. } => {
                    if !open.remove(tool_call_id.as_str()) {
                        return false;
                    }
                }
                Message::User { .. } => open.clear(),
            }
        }
        true
    }
}
