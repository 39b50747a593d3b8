//! Rolling conversation summaries
//!
//! The summary substitutes for full history once a conversation outgrows the
//! recent window. It is regenerated when none exists yet or when at least
//! `summary_interval` messages were added since it was last computed.

use crate::config::BoardConfig;
use crate::error::{CoboardError, Result};
use crate::providers::{CompletionOptions, Message, Provider};
use crate::storage::{ChatMessage, SqliteStorage, Summary};

/// Decide whether the stored summary is stale
///
/// # Examples
///
/// ```
/// use coboard::board::summarizer::needs_refresh;
///
/// assert!(needs_refresh(None, 1, 5));
/// ```
pub fn needs_refresh(stored: Option<&Summary>, current_count: usize, interval: usize) -> bool {
    match stored {
        None => true,
        Some(summary) => current_count.saturating_sub(summary.message_count) >= interval,
    }
}

/// Render exchanges as `User: …\nAssistant: …` blocks separated by a blank line
pub fn transcript(messages: &[ChatMessage]) -> String {
    messages
        .iter()
        .map(|m| format!("User: {}\nAssistant: {}", m.user_message, m.assistant_message))
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn summary_instruction(max_tokens: u32, transcript: &str) -> String {
    format!(
        "Erstelle eine kompakte Zusammenfassung (max. {} Tokens) des folgenden Gesprächs. \
         Fokussiere auf die wichtigsten Themen, Entscheidungen und offenen Punkte:\n\n{}",
        max_tokens, transcript
    )
}

/// Regenerates rolling summaries through the completion provider
pub struct Summarizer<'a> {
    storage: &'a SqliteStorage,
    provider: &'a dyn Provider,
    config: &'a BoardConfig,
}

impl<'a> Summarizer<'a> {
    /// Create a summarizer
    pub fn new(
        storage: &'a SqliteStorage,
        provider: &'a dyn Provider,
        config: &'a BoardConfig,
    ) -> Self {
        Self {
            storage,
            provider,
            config,
        }
    }

    /// Regenerate the summary if it is stale
    ///
    /// Returns the new summary, or `None` when the stored one is still fresh.
    pub async fn refresh_if_stale(&self, conversation_id: &str) -> Result<Option<Summary>> {
        let current = self.storage.count_messages(conversation_id)?;
        let stored = self.storage.get_summary(conversation_id)?;

        if !needs_refresh(stored.as_ref(), current, self.config.summary_interval) {
            tracing::debug!(
                "Summary for {} is fresh ({} of {} messages)",
                conversation_id,
                stored.map(|s| s.message_count).unwrap_or_default(),
                current
            );
            return Ok(None);
        }

        self.regenerate(conversation_id).await.map(Some)
    }

    /// Summarize the whole conversation and upsert the result
    ///
    /// Stores the number of messages the summary was computed from.
    pub async fn regenerate(&self, conversation_id: &str) -> Result<Summary> {
        let messages = self.storage.messages(conversation_id)?;
        let prompt = summary_instruction(self.config.summary_max_tokens, &transcript(&messages));

        let options = CompletionOptions::new(
            self.config.analysis_temperature,
            self.config.summary_max_tokens,
        );
        let response = self
            .provider
            .complete(&[Message::system(prompt)], &options)
            .await?;

        let text = response.content().trim();
        if text.is_empty() {
            return Err(CoboardError::Provider("Summary completion was empty".to_string()).into());
        }

        let summary = self
            .storage
            .upsert_summary(conversation_id, text, messages.len())?;
        tracing::info!(
            "Updated summary for {} at {} messages",
            conversation_id,
            summary.message_count
        );
        Ok(summary)
    }
}
