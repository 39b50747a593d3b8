//! Command-line interface definition for Co-Pilot Board
//!
//! This module defines the CLI structure using clap's derive API,
//! providing commands for serving the board, managing conversations and
//! exporting analyses.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Co-Pilot Board - conversations with a rolling meta-analysis
#[derive(Parser, Debug, Clone)]
#[command(name = "coboard")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/config.yaml")]
    pub config: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Override the conversation database path
    #[arg(long)]
    pub storage_path: Option<String>,

    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands for Co-Pilot Board
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Run the HTTP server
    Serve {
        /// Address to bind, overriding `server.bind_addr`
        #[arg(short, long)]
        bind: Option<String>,
    },

    /// Manage conversations
    Conversations {
        /// Conversation subcommand
        #[command(subcommand)]
        command: ConversationCommand,
    },

    /// Export the stored meta-analysis of a conversation as JSON
    Export {
        /// Conversation identifier
        conversation_id: String,

        /// Output file (defaults to copilot-board-analysis-<date>.json)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

/// Conversation management subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum ConversationCommand {
    /// List conversations, newest first
    List,

    /// Create a new conversation
    Create {
        /// Conversation title
        title: String,
    },

    /// Rename a conversation
    Rename {
        /// Conversation identifier
        id: String,
        /// New title
        title: String,
    },

    /// Delete a conversation together with its messages and points
    Delete {
        /// Conversation identifier
        id: String,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

impl Default for Cli {
    fn default() -> Self {
        Self {
            config: Some("config/config.yaml".to_string()),
            verbose: false,
            storage_path: None,
            command: Commands::Serve { bind: None },
        }
    }
}
