//! Board operations behind the HTTP and CLI surfaces

use std::sync::Arc;

use serde::Serialize;

use crate::config::Config;
use crate::error::{CoboardError, Result};
use crate::providers::{CompletionOptions, Provider};
use crate::storage::{ChatMessage, Conversation, MetaPoint, PointFilter, SqliteStorage};

use super::context::ContextBuilder;
use super::export::{export_analysis, AnalysisExport};
use super::locks::ConversationLocks;
use super::meta::{resolve_categories, AnalysisOutcome, MetaAnalyzer};
use super::summarizer::Summarizer;

/// Title given to conversations created without one
pub const DEFAULT_TITLE: &str = "Neue Unterhaltung";

/// Title for a new conversation; a blank title gets [`DEFAULT_TITLE`]
pub fn new_conversation_title(title: Option<&str>) -> &str {
    title
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .unwrap_or(DEFAULT_TITLE)
}

/// Trimmed title for a rename
///
/// # Errors
///
/// Returns a validation error for a blank title
pub fn renamed_title(title: &str) -> Result<&str> {
    let title = title.trim();
    if title.is_empty() {
        return Err(CoboardError::Validation("title is required".to_string()).into());
    }
    Ok(title)
}

/// Reply to a chat turn
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatReply {
    /// Assistant reply text
    pub message: String,
    /// The stored exchange
    pub exchange: ChatMessage,
}

/// Shared application service
///
/// Owns the configuration, the store handle and the completion provider.
/// One instance is shared across all requests.
pub struct BoardService {
    config: Config,
    storage: SqliteStorage,
    provider: Arc<dyn Provider>,
    locks: ConversationLocks,
}

impl BoardService {
    /// Create a service from its parts
    pub fn new(config: Config, storage: SqliteStorage, provider: Arc<dyn Provider>) -> Self {
        Self {
            config,
            storage,
            provider,
            locks: ConversationLocks::new(),
        }
    }

    /// Active configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Underlying store
    pub fn storage(&self) -> &SqliteStorage {
        &self.storage
    }

    // ── Chat ─────────────────────────────────────────────────────────

    /// Answer a user message and store the exchange
    ///
    /// The rolling summary is refreshed afterwards when stale. A failed
    /// refresh is logged and does not fail the reply.
    ///
    /// # Errors
    ///
    /// Returns a validation error for blank input, not-found for an unknown
    /// conversation, and the provider or store error otherwise
    pub async fn send_message(&self, conversation_id: &str, message: &str) -> Result<ChatReply> {
        if conversation_id.trim().is_empty() || message.trim().is_empty() {
            return Err(CoboardError::Validation(
                "Message and conversation_id are required".to_string(),
            )
            .into());
        }
        self.storage.require_conversation(conversation_id)?;

        let board = &self.config.board;
        let context = ContextBuilder::new(&self.storage, board).build(conversation_id, message)?;
        tracing::debug!(
            "Sending {} messages for {} to {}",
            context.len(),
            conversation_id,
            self.provider.model()
        );

        let options = CompletionOptions::new(board.chat_temperature, board.chat_max_tokens);
        let response = self
            .provider
            .complete(&context, &options)
            .await
            .map_err(|e| {
                tracing::error!("Chat completion failed for {}: {:#}", conversation_id, e);
                e
            })?;

        let reply = response.content().to_string();
        if reply.trim().is_empty() {
            return Err(
                CoboardError::Provider("Empty response from completion provider".to_string())
                    .into(),
            );
        }

        let exchange = self
            .storage
            .insert_message(conversation_id, message, &reply)?;

        self.refresh_summary(conversation_id).await;

        Ok(ChatReply {
            message: reply,
            exchange,
        })
    }

    async fn refresh_summary(&self, conversation_id: &str) {
        let _guard = self.locks.acquire(conversation_id).await;
        let summarizer = Summarizer::new(&self.storage, self.provider.as_ref(), &self.config.board);
        if let Err(e) = summarizer.refresh_if_stale(conversation_id).await {
            tracing::warn!(
                "Summary refresh failed for {}, keeping previous summary: {:#}",
                conversation_id,
                e
            );
        }
    }

    // ── Meta-analysis ────────────────────────────────────────────────

    /// Refresh the requested categories of a conversation's analysis
    ///
    /// `None` or an empty list refreshes all four categories.
    pub async fn analyze(
        &self,
        conversation_id: &str,
        categories: Option<&[String]>,
    ) -> Result<AnalysisOutcome> {
        if conversation_id.trim().is_empty() {
            return Err(CoboardError::Validation("conversation_id is required".to_string()).into());
        }
        self.storage.require_conversation(conversation_id)?;
        let categories = resolve_categories(categories)?;

        let _guard = self.locks.acquire(conversation_id).await;
        let outcome = MetaAnalyzer::new(&self.storage, self.provider.as_ref(), &self.config.board)
            .analyze(conversation_id, &categories)
            .await?;

        if outcome.degraded {
            tracing::warn!(
                "Meta-analysis reply for {} was not valid JSON, returned placeholders",
                conversation_id
            );
        } else if !outcome.replaced.is_empty() {
            tracing::info!(
                "Refreshed {:?} of {} from {} messages",
                outcome.replaced,
                conversation_id,
                outcome.message_count
            );
        }
        Ok(outcome)
    }

    /// Export the current analysis of a conversation
    pub fn export(&self, conversation_id: &str) -> Result<AnalysisExport> {
        export_analysis(&self.storage, conversation_id)
    }

    // ── Conversations ────────────────────────────────────────────────

    /// Create a conversation; a blank title gets the default
    pub fn create_conversation(&self, title: Option<&str>) -> Result<Conversation> {
        let conversation = self
            .storage
            .create_conversation(new_conversation_title(title))?;
        tracing::info!("Created conversation {}", conversation.id);
        Ok(conversation)
    }

    /// All conversations, newest first
    pub fn list_conversations(&self) -> Result<Vec<Conversation>> {
        self.storage.list_conversations()
    }

    /// Rename a conversation
    pub fn rename_conversation(&self, id: &str, title: &str) -> Result<Conversation> {
        self.storage.rename_conversation(id, renamed_title(title)?)
    }

    /// Delete a conversation and everything belonging to it
    pub fn delete_conversation(&self, id: &str) -> Result<Conversation> {
        let conversation = self.storage.delete_conversation(id)?;
        tracing::info!("Deleted conversation {}", id);
        Ok(conversation)
    }

    /// Chronological thread of a conversation
    pub fn messages(&self, conversation_id: &str) -> Result<Vec<ChatMessage>> {
        self.storage.require_conversation(conversation_id)?;
        self.storage.messages(conversation_id)
    }

    // ── Points ───────────────────────────────────────────────────────

    /// Points of a conversation, active or hidden
    pub fn points(&self, conversation_id: &str, hidden: bool) -> Result<Vec<MetaPoint>> {
        self.storage.require_conversation(conversation_id)?;
        let filter = if hidden {
            PointFilter::Hidden
        } else {
            PointFilter::Active
        };
        self.storage.list_points(conversation_id, filter)
    }

    /// Hide a point from the active view
    pub fn hide_point(&self, id: &str) -> Result<MetaPoint> {
        self.storage.set_point_hidden(id, true)
    }

    /// Return a hidden point to the active view
    pub fn restore_point(&self, id: &str) -> Result<MetaPoint> {
        self.storage.set_point_hidden(id, false)
    }

    /// Permanently delete a point
    pub fn delete_point(&self, id: &str) -> Result<MetaPoint> {
        self.storage.delete_point(id)
    }
}
