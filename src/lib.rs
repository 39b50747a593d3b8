//! Co-Pilot Board - conversation backend library
//!
//! This library provides a chat backend that keeps long conversations within
//! a bounded prompt through a rolling summary, and maintains a structured
//! meta-analysis (core ideas, insights, open questions, to-dos) alongside.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//!
//! - `board`: Context assembly, summarization, meta-analysis and the service tying them together
//! - `providers`: Completion provider abstraction and the OpenAI-compatible client
//! - `storage`: SQLite conversation store
//! - `server`: Axum router and HTTP handlers
//! - `commands`: CLI command handlers
//! - `config`: Configuration management and validation
//! - `error`: Error types and result aliases
//! - `cli`: Command-line interface definition
//!
//! # Example
//!
//! ```no_run
//! use coboard::{BoardService, Config};
//! use coboard::providers::create_provider;
//! use coboard::storage::SqliteStorage;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("config/config.yaml", &Default::default())?;
//!     config.validate()?;
//!
//!     let storage = SqliteStorage::from_config(&config.storage)?;
//!     let provider = create_provider(&config.provider)?;
//!     let service = BoardService::new(config, storage, provider);
//!
//!     let conversation = service.create_conversation(Some("Planung"))?;
//!     let reply = service.send_message(&conversation.id, "Hallo").await?;
//!     println!("{}", reply.message);
//!     Ok(())
//! }
//! ```

pub mod board;
pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod providers;
pub mod server;
pub mod storage;

// Re-export commonly used types
pub use board::{AnalysisExport, BoardService, ChatReply};
pub use config::Config;
pub use error::{CoboardError, Result};
pub use storage::{Analysis, Category, SqliteStorage};
