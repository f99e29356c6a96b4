use autoquest_protocol::ContentItem;
use autoquest_protocol::ReasoningItemReasoningSummary;
use autoquest_protocol::ResponseItem;
use autoquest_protocol::TokenUsage;

use crate::command_tag;
use crate::memory::MemoryStore;
use crate::openai_tools;

/// Marks the single system note carrying the serialized memory map.
pub(crate) const MEMORY_NOTE_PREFIX: &str = "Memory: ";

/// The distilled decision from one model exchange.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TurnResult {
    /// `None` means no action this turn; `Some("")` means press Enter.
    pub command: Option<String>,
    /// Model narration with the command tag removed.
    pub message: String,
    /// Concatenated reasoning summaries, one line per fragment.
    pub reasoning: String,
    pub usage: TokenUsage,
}

/// The ordered, append-only record of the conversation with the model. The
/// record IS the next request body: items the model returns are appended
/// verbatim so the following request replays them unchanged.
#[derive(Debug)]
pub struct ConversationHistory {
    items: Vec<ResponseItem>,
}

impl ConversationHistory {
    /// A history is never empty; it starts from the system prompt and keeps
    /// a system entry at the front across resets.
    pub fn new(system_prompt: &str) -> Self {
        Self {
            items: vec![system_message(system_prompt)],
        }
    }

    pub fn record(&mut self, item: ResponseItem) {
        self.items.push(item);
    }

    /// Rebuilds the conversation tail for the next request: drops any stale
    /// memory note, appends a fresh snapshot, then the incoming game text
    /// (when non-empty). The mutation is the point: the live history and the
    /// request body are the same sequence.
    pub fn prepare_request_view(
        &mut self,
        memory: &MemoryStore,
        game_text: &str,
    ) -> &[ResponseItem] {
        self.remove_memory_entries();
        self.items.push(memory_note(memory));
        if !game_text.is_empty() {
            self.items.push(user_message(game_text));
        }
        &self.items
    }

    /// Folds one model response into the conversation and distills the turn
    /// decision out of it. Tool calls are dispatched against `memory` and
    /// their results recorded under the originating call id; the API rejects
    /// a follow-up request whose outputs do not pair up with calls.
    pub fn ingest_model_output(
        &mut self,
        output: Vec<ResponseItem>,
        memory: &mut MemoryStore,
        usage: Option<TokenUsage>,
    ) -> TurnResult {
        let mut command: Option<String> = None;
        let mut message = String::new();
        let mut reasoning = String::new();

        for item in output {
            match &item {
                ResponseItem::Message { content, .. } => {
                    for piece in content {
                        match piece {
                            ContentItem::OutputText { text } => {
                                let (found, stripped) = command_tag::extract_command(text);
                                // Only one action per turn: the first command
                                // wins, later tags are stripped but ignored.
                                if command.is_none() {
                                    command = found;
                                }
                                message.push_str(&stripped);
                            }
                            ContentItem::Refusal { refusal } => message.push_str(refusal),
                            ContentItem::InputText { .. } => {}
                        }
                    }
                    self.items.push(item);
                }
                ResponseItem::Reasoning { summary, .. } => {
                    for piece in summary {
                        let ReasoningItemReasoningSummary::SummaryText { text } = piece;
                        reasoning.push_str(text);
                        reasoning.push('\n');
                    }
                    self.items.push(item);
                }
                ResponseItem::FunctionCall {
                    name,
                    arguments,
                    call_id,
                    ..
                } => {
                    let output = openai_tools::dispatch_tool_call(memory, name, arguments);
                    let call_id = call_id.clone();
                    self.items.push(item);
                    self.items
                        .push(ResponseItem::FunctionCallOutput { call_id, output });
                }
                ResponseItem::FunctionCallOutput { .. } | ResponseItem::Other => {}
            }
        }

        TurnResult {
            command,
            message,
            reasoning,
            usage: usage.unwrap_or_default(),
        }
    }

    /// Removes every memory note, wherever it sits. Idempotent.
    pub fn remove_memory_entries(&mut self) {
        self.items.retain(|item| !is_memory_note(item));
    }

    /// Replaces the conversation wholesale. Used after summarization.
    pub fn reset(&mut self, seed: Vec<ResponseItem>) {
        self.items = seed;
    }

    pub fn contents(&self) -> Vec<ResponseItem> {
        self.items.clone()
    }
}

pub(crate) fn system_message(text: &str) -> ResponseItem {
    plain_message("system", text)
}

pub(crate) fn user_message(text: &str) -> ResponseItem {
    plain_message("user", text)
}

fn plain_message(role: &str, text: &str) -> ResponseItem {
    ResponseItem::Message {
        id: None,
        role: role.to_string(),
        content: vec![ContentItem::InputText {
            text: text.to_string(),
        }],
    }
}

pub(crate) fn memory_note(memory: &MemoryStore) -> ResponseItem {
    system_message(&format!("{MEMORY_NOTE_PREFIX}{}", memory.snapshot()))
}

pub(crate) fn is_memory_note(item: &ResponseItem) -> bool {
    match item {
        ResponseItem::Message { role, content, .. } if role == "system" => {
            content.iter().any(|piece| match piece {
                ContentItem::InputText { text } => text.starts_with(MEMORY_NOTE_PREFIX),
                ContentItem::OutputText { .. } | ContentItem::Refusal { .. } => false,
            })
        }
        _ => false,
    }
}
