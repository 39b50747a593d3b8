//! Prompt assembly for chat turns
//!
//! A chat prompt is always: the fixed system instruction, the rolling
//! summary (when one exists), the recent exchanges oldest first, and finally
//! the new user message.

use crate::config::BoardConfig;
use crate::error::Result;
use crate::providers::Message;
use crate::storage::{ChatMessage, SqliteStorage, Summary};

/// Prefix of the system message that embeds the rolling summary
pub const SUMMARY_PREFIX: &str = "Bisherige Gesprächszusammenfassung: ";

/// Build the ordered prompt from already-fetched parts
///
/// `recent` is expected newest first, the order the store returns it in.
pub fn assemble_context(
    system_prompt: &str,
    summary: Option<&Summary>,
    recent: &[ChatMessage],
    user_message: &str,
) -> Vec<Message> {
    let mut messages = Vec::with_capacity(3 + recent.len() * 2);
    messages.push(Message::system(system_prompt));

    if let Some(summary) = summary.filter(|s| !s.summary_text.trim().is_empty()) {
        messages.push(Message::system(format!(
            "{}{}",
            SUMMARY_PREFIX, summary.summary_text
        )));
    }

    for exchange in recent.iter().rev() {
        messages.push(Message::user(exchange.user_message.clone()));
        messages.push(Message::assistant(exchange.assistant_message.clone()));
    }

    messages.push(Message::user(user_message));
    messages
}

/// Fetches the recent window and summary and assembles the prompt
pub struct ContextBuilder<'a> {
    storage: &'a SqliteStorage,
    config: &'a BoardConfig,
}

impl<'a> ContextBuilder<'a> {
    /// Create a builder over the given store
    pub fn new(storage: &'a SqliteStorage, config: &'a BoardConfig) -> Self {
        Self { storage, config }
    }

    /// Build the prompt for a new user message
    ///
    /// # Errors
    ///
    /// Returns the store error unchanged if either read fails
    pub fn build(&self, conversation_id: &str, user_message: &str) -> Result<Vec<Message>> {
        let recent = self
            .storage
            .recent_messages(conversation_id, self.config.recent_window)?;
        let summary = self.storage.get_summary(conversation_id)?;

        tracing::debug!(
            "Building context for {}: {} prior exchanges, summary={}",
            conversation_id,
            recent.len(),
            summary.is_some()
        );

        Ok(assemble_context(
            &self.config.system_prompt,
            summary.as_ref(),
            &recent,
            user_message,
        ))
    }
}
