//! Ask command implementation.

use crate::cli::output::content_preview;
use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use crate::session::SessionContext;
use anyhow::Result;

/// Run the ask command.
pub async fn run_ask(
    question: &str,
    user: Option<String>,
    session: Option<String>,
    show_sources: bool,
    settings: Settings,
) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Query, &settings) {
        Output::error(&e.to_string());
        return Err(e.into());
    }

    let orchestrator = Orchestrator::new(settings)?;
    let session = SessionContext::resolve(user, session);

    let spinner = Output::spinner("Searching knowledge base...");
    let result = orchestrator.answer(question, &session).await;
    spinner.finish_and_clear();

    match result {
        Ok(response) => {
            println!("\n{}\n", response.answer);

            if show_sources && !response.sources.is_empty() {
                Output::header("Sources");
                for hit in &response.sources {
                    Output::search_hit(hit, 100);
                }
                println!();
            } else if !response.sources.is_empty() {
                Output::kv("Sources", &content_preview(&response.source_paths().join(", "), 120));
            }

            Output::kv("Session", &format!("--user {} --session {}", session.user_id, session.session_id));
        }
        Err(e) => {
            Output::error(&format!("Failed to generate answer: {}", e));
            return Err(e.into());
        }
    }

    Ok(())
}
