//! Interactive chat command.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use crate::session::SessionContext;
use anyhow::Result;
use console::style;
use std::io::{self, BufRead, Write};

/// Run the interactive chat command.
pub async fn run_chat(user: Option<String>, session: Option<String>, settings: Settings) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Query, &settings) {
        Output::error(&e.to_string());
        return Err(e.into());
    }

    let orchestrator = Orchestrator::new(settings)?;
    let session = SessionContext::resolve(user, session);

    println!("\n{}", style("ragchat").bold().cyan());
    println!(
        "{}",
        style("Type your questions, or 'exit' to quit. Use 'clear' to reset conversation.").dim()
    );
    println!(
        "{}\n",
        style(format!("Session: --user {} --session {}", session.user_id, session.session_id)).dim()
    );

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("{} ", style("You:").green().bold());
        stdout.flush()?;

        let mut input = String::new();
        if stdin.lock().read_line(&mut input)? == 0 {
            // EOF
            println!();
            break;
        }

        let input = input.trim();

        if input.is_empty() {
            continue;
        }

        if input.eq_ignore_ascii_case("exit") || input.eq_ignore_ascii_case("quit") {
            Output::info("Goodbye!");
            break;
        }

        if input.eq_ignore_ascii_case("clear") {
            match orchestrator.clear_history(&session).await {
                Some(_) => Output::info("Conversation history cleared."),
                None => Output::warning("Could not clear conversation history."),
            }
            continue;
        }

        let spinner = Output::spinner("Thinking...");
        let result = orchestrator.answer(input, &session).await;
        spinner.finish_and_clear();

        match result {
            Ok(response) => {
                println!("\n{} {}\n", style("Assistant:").cyan().bold(), response.answer);
            }
            Err(e) => {
                Output::error(&format!("Error: {}", e));
            }
        }
    }

    Ok(())
}
