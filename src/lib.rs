//! ragchat - retrieval-augmented chat over your own documents
//!
//! # Overview
//!
//! ragchat allows you to:
//! - Index local text and markdown files into a persistent vector index
//! - Ask questions answered from the most relevant passages
//! - Hold multi-turn conversations whose history is kept per user and session
//! - Expose the same operations over a small HTTP API
//!
//! # Architecture
//!
//! - `config` - Settings and prompt templates
//! - `chunking` - Document loading and recursive character chunking
//! - `embedding` - Embedding generation
//! - `vector_store` - Flat cosine index and its persistence
//! - `memory` - Chat log and conversational memory
//! - `session` - Session identity
//! - `rag` - Prompt assembly and generation
//! - `orchestrator` - Pipeline coordination
//!
//! # Example
//!
//! ```rust,no_run
//! use ragchat::config::Settings;
//! use ragchat::orchestrator::Orchestrator;
//! use ragchat::session::SessionContext;
//! use std::path::Path;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let orchestrator = Orchestrator::new(settings)?;
//!
//!     orchestrator.ingest_path(Path::new("docs/")).await?;
//!
//!     let session = SessionContext::new();
//!     let answer = orchestrator.answer("What is in the docs?", &session).await?;
//!     println!("{}", answer.answer);
//!
//!     Ok(())
//! }
//! ```

pub mod chunking;
pub mod cli;
pub mod config;
pub mod embedding;
pub mod error;
pub mod memory;
pub mod openai;
pub mod orchestrator;
pub mod rag;
pub mod session;
pub mod vector_store;

#[cfg(test)]
mod testing;

pub use error::{RagChatError, Result};
