//! Ingest command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use anyhow::Result;

/// Run the ingest command.
pub async fn run_ingest(
    path: &str,
    chunk_size: Option<usize>,
    chunk_overlap: Option<usize>,
    mut settings: Settings,
) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Ingest, &settings) {
        Output::error(&e.to_string());
        return Err(e.into());
    }

    if let Some(size) = chunk_size {
        settings.chunking.chunk_size = size;
    }
    if let Some(overlap) = chunk_overlap {
        settings.chunking.chunk_overlap = overlap;
    }

    let orchestrator = Orchestrator::new(settings)?;
    let path = Settings::expand_path(path);

    let spinner = Output::spinner(&format!("Indexing {}...", path.display()));
    let result = orchestrator.ingest_path(&path).await;
    spinner.finish_and_clear();

    let report = match result {
        Ok(report) => report,
        Err(e) => {
            Output::error(&format!("Ingestion failed: {}", e));
            return Err(e.into());
        }
    };

    for failure in &report.failures {
        Output::warning(&format!("Skipped {}: {}", failure.path.display(), failure.reason));
    }

    if report.chunks_indexed == 0 {
        Output::warning("Nothing to index.");
        return Ok(());
    }

    let verb = if report.created { "Created" } else { "Updated" };
    Output::success(&format!(
        "{} index at {}: {} chunks from {} documents ({} total)",
        verb,
        orchestrator.index_location(),
        report.chunks_indexed,
        report.documents,
        report.total_entries
    ));

    Ok(())
}
