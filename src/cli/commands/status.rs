//! Status command implementation.

use crate::cli::Output;
use crate::config::{ChatLogProvider, Settings};
use crate::vector_store::VectorIndex;
use anyhow::Result;

/// Show index and chat log status.
pub fn run_status(settings: &Settings) -> Result<()> {
    let index_dir = settings.index_dir();

    Output::header("Index");
    Output::kv("Location", &index_dir.display().to_string());

    if !VectorIndex::exists(&index_dir) {
        Output::warning("No index yet. Run `ragchat ingest <path>` first.");
    } else {
        match VectorIndex::load(&index_dir) {
            Ok(index) => {
                let manifest = index.manifest();
                Output::kv("Model", &manifest.model);
                Output::kv("Dimensions", &manifest.dimensions.to_string());
                Output::kv("Chunks", &index.len().to_string());
                Output::kv("Created", &manifest.created_at.format("%Y-%m-%d %H:%M:%S UTC").to_string());
                Output::kv("Updated", &manifest.updated_at.format("%Y-%m-%d %H:%M:%S UTC").to_string());

                if let Err(e) = index.ensure_model(&settings.embedding.model) {
                    Output::warning(&e.to_string());
                }

                Output::header("Sources");
                for (source, count) in index.sources() {
                    Output::list_item(&format!("{} ({} chunks)", source, count));
                }
            }
            Err(e) => Output::error(&e.to_string()),
        }
    }

    Output::header("Chat log");
    Output::kv("Provider", &settings.chat_log.provider.to_string());
    if settings.chat_log.provider == ChatLogProvider::Sqlite {
        let path = settings.chat_log_path();
        Output::kv("Location", &path.display().to_string());
        Output::kv("Exists", if path.exists() { "yes" } else { "no" });
    }

    Output::header("Provider");
    Output::kv("Embedding model", &settings.embedding.model);
    Output::kv("Generation model", &settings.rag.model);
    Output::kv(
        "API key",
        if settings.api_key().is_ok() { "configured" } else { "missing" },
    );
    println!();

    Ok(())
}
