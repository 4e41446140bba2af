//! Clear command implementation.

use crate::cli::Output;
use crate::config::Settings;
use crate::memory::ConversationMemory;
use crate::session::SessionContext;
use anyhow::Result;

/// Delete a session's history.
pub async fn run_clear(user: &str, session: &str, settings: Settings) -> Result<()> {
    let memory = ConversationMemory::from_settings(&settings)?;
    let session = SessionContext::from_ids(user, session);

    match memory.clear(&session).await {
        Some(0) => Output::info(&format!("No history for {}", session)),
        Some(removed) => Output::success(&format!("Cleared {} turns for {}", removed, session)),
        None => Output::warning(&format!("Could not clear history for {}", session)),
    }

    Ok(())
}
