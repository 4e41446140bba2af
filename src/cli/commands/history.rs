//! History command implementation.

use crate::cli::Output;
use crate::config::Settings;
use crate::memory::ConversationMemory;
use crate::session::SessionContext;
use anyhow::Result;

/// Print the most recent turns of a session, oldest first.
pub async fn run_history(user: &str, session: &str, limit: usize, settings: Settings) -> Result<()> {
    let memory = ConversationMemory::from_settings(&settings)?;
    let session = SessionContext::from_ids(user, session);

    let turns = memory.turns(&session, limit).await?;
    if turns.is_empty() {
        Output::warning(&format!("No history for {}", session));
        return Ok(());
    }

    Output::header(&format!("History for {} ({} turns)", session, turns.len()));
    for turn in &turns {
        Output::turn(turn);
    }
    println!();

    Ok(())
}
