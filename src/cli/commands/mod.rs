//! CLI command implementations.

mod ask;
mod chat;
mod clear;
mod config;
mod history;
mod ingest;
mod search;
mod serve;
mod status;

pub use ask::run_ask;
pub use chat::run_chat;
pub use clear::run_clear;
pub use config::run_config;
pub use history::run_history;
pub use ingest::run_ingest;
pub use search::run_search;
pub use serve::run_serve;
pub use status::run_status;
