//! Provider module for Co-Pilot Board
//!
//! This module contains the completion provider abstraction and the
//! OpenAI-compatible implementation.

pub mod base;
pub mod openai;

pub use base::{CompletionOptions, CompletionResponse, Message, Provider, TokenUsage};
pub use openai::OpenAiProvider;

#[cfg(test)]
pub use base::MockProvider;

use crate::config::ProviderConfig;
use crate::error::Result;
use std::sync::Arc;

/// Create the configured completion provider
///
/// # Errors
///
/// Returns error if credentials are missing or the HTTP client cannot be
/// initialized
pub fn create_provider(config: &ProviderConfig) -> Result<Arc<dyn Provider>> {
    Ok(Arc::new(OpenAiProvider::new(config.clone())?))
}
