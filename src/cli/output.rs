//! CLI output formatting utilities.

use crate::memory::ChatTurn;
use crate::vector_store::SearchHit;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

/// Output helper for CLI formatting.
pub struct Output;

impl Output {
    /// Print an info message.
    pub fn info(msg: &str) {
        println!("{} {}", style(">>").cyan().bold(), msg);
    }

    /// Print a success message.
    pub fn success(msg: &str) {
        println!("{} {}", style(">>").green().bold(), msg);
    }

    /// Print a warning message.
    pub fn warning(msg: &str) {
        eprintln!("{} {}", style(">>").yellow().bold(), msg);
    }

    /// Print an error message.
    pub fn error(msg: &str) {
        eprintln!("{} {}", style(">>").red().bold(), msg);
    }

    /// Print a header.
    pub fn header(msg: &str) {
        println!("\n{}", style(msg).bold().underlined());
    }

    /// Print a key-value pair.
    pub fn kv(key: &str, value: &str) {
        println!("  {}: {}", style(key).dim(), value);
    }

    /// Print a list item.
    pub fn list_item(msg: &str) {
        println!("  {} {}", style("*").cyan(), msg);
    }

    /// Print a retrieved passage.
    pub fn search_hit(hit: &SearchHit, max_len: usize) {
        println!(
            "\n{} {} #{} (score: {:.2})",
            style(">>").green(),
            style(hit.source.as_deref().unwrap_or("(inline)")).bold(),
            hit.chunk_index,
            hit.score
        );
        println!("   {}", content_preview(&hit.text, max_len));
    }

    /// Print one stored turn.
    pub fn turn(turn: &ChatTurn) {
        println!(
            "\n{} {}",
            style(turn.timestamp.format("%Y-%m-%d %H:%M:%S").to_string()).dim(),
            style(format!("{}/{}", turn.user_id, turn.session_id)).dim()
        );
        println!("{} {}", style("You:").green().bold(), turn.query);
        println!("{} {}", style("Assistant:").cyan().bold(), turn.response);
    }

    /// Create a spinner.
    pub fn spinner(msg: &str) -> ProgressBar {
        let pb = ProgressBar::new_spinner();
        if let Ok(spinner_style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
            pb.set_style(spinner_style);
        }
        pb.set_message(msg.to_string());
        pb.enable_steady_tick(std::time::Duration::from_millis(100));
        pb
    }
}

/// Collapse newlines and truncate with ellipsis.
pub fn content_preview(content: &str, max_chars: usize) -> String {
    let content = content.replace('\n', " ");
    if content.chars().count() <= max_chars {
        content
    } else {
        let truncated: String = content.chars().take(max_chars).collect();
        format!("{}...", truncated)
    }
}
