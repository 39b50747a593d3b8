//! Chat context, rolling summaries and meta-analysis
//!
//! [`BoardService`] ties the components together and is what both the HTTP
//! server and the CLI commands call into.

pub mod context;
pub mod export;
pub mod locks;
pub mod meta;
pub mod service;
pub mod summarizer;

pub use context::{assemble_context, ContextBuilder};
pub use export::{default_file_name, export_analysis, AnalysisExport};
pub use locks::ConversationLocks;
pub use meta::{AnalysisOutcome, MetaAnalyzer};
pub use service::{
    new_conversation_title, renamed_title, BoardService, ChatReply, DEFAULT_TITLE,
};
pub use summarizer::Summarizer;
