//! Server command handler
//!
//! Builds the store and provider from configuration and runs the HTTP
//! server until interrupted.

use std::sync::Arc;

use crate::board::BoardService;
use crate::config::Config;
use crate::error::Result;
use crate::providers::create_provider;
use crate::server;
use crate::storage::SqliteStorage;

/// Assemble the board service from configuration
///
/// # Errors
///
/// Returns error if the store cannot be opened or the provider lacks
/// credentials
pub fn build_service(config: Config) -> Result<BoardService> {
    let storage = SqliteStorage::from_config(&config.storage)?;
    let provider = create_provider(&config.provider)?;
    tracing::info!(
        "Using model {} at {}",
        provider.model(),
        config.provider.api_base
    );
    Ok(BoardService::new(config, storage, provider))
}

/// Run the HTTP server
pub async fn run_serve(config: Config) -> Result<()> {
    let service = Arc::new(build_service(config)?);
    tracing::info!("Database at {}", service.storage().db_path().display());
    server::serve(service).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_build_service_requires_api_key() {
        let dir = tempdir().unwrap();
        let mut config = Config::default();
        config.storage.db_path = Some(dir.path().join("board.db").to_string_lossy().to_string());
        config.provider.api_key = None;

        let err = build_service(config).err().unwrap();
        assert!(err.to_string().contains("Missing credentials"));
    }

    #[test]
    fn test_build_service_with_key() {
        let dir = tempdir().unwrap();
        let mut config = Config::default();
        config.storage.db_path = Some(dir.path().join("board.db").to_string_lossy().to_string());
        config.provider.api_key = Some("sk-test".to_string());

        let service = build_service(config).unwrap();
        assert!(service.storage().db_path().ends_with("board.db"));
    }
}
