//! Directory-backed index persistence.
//!
//! Layout:
//! - `index.json`: manifest, entry metadata and a checksum of the vectors.
//! - `index.bin`: little-endian `f32` vectors, one after another in entry order.
//! - `index.prev.json`: metadata of the previous save, kept until the next one.
//!
//! `index.bin` is written last and is the marker that an index exists. If a save
//! is interrupted after the metadata is replaced but before the vectors are, the
//! new metadata no longer matches `index.bin` and load falls back to
//! `index.prev.json`.

use super::index::{IndexEntry, IndexManifest, VectorIndex, FORMAT_VERSION};
use super::IndexStore;
use crate::error::{RagChatError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument, warn};

/// Marker file holding the vectors.
pub const INDEX_FILE: &str = "index.bin";
/// Metadata file.
pub const METADATA_FILE: &str = "index.json";
/// Metadata of the previous save.
pub const PREVIOUS_METADATA_FILE: &str = "index.prev.json";

#[derive(Serialize, Deserialize)]
struct StoredIndex {
    manifest: IndexManifest,
    entries: Vec<IndexEntry>,
    /// FNV-1a over the contents of `index.bin`.
    #[serde(default)]
    vector_checksum: Option<u64>,
}

impl VectorIndex {
    /// Whether `dir` holds a saved index.
    pub fn exists(dir: &Path) -> bool {
        dir.join(INDEX_FILE).is_file()
    }

    /// Persist the full index into `dir`, creating it if needed.
    #[instrument(skip(self), fields(entries = self.len()))]
    pub fn save(&self, dir: &Path) -> Result<()> {
        std::fs::create_dir_all(dir)?;

        let vectors: Vec<u8> = self
            .entries()
            .iter()
            .flat_map(|e| embedding_to_bytes(&e.embedding))
            .collect();

        let stored = StoredIndex {
            manifest: self.manifest().clone(),
            entries: self.entries().to_vec(),
            vector_checksum: Some(checksum(&vectors)),
        };
        let metadata = serde_json::to_vec_pretty(&stored)?;

        let current = dir.join(METADATA_FILE);
        if current.is_file() {
            std::fs::rename(&current, dir.join(PREVIOUS_METADATA_FILE))?;
        }
        write_atomic(dir, METADATA_FILE, &metadata)?;
        write_atomic(dir, INDEX_FILE, &vectors)?;

        info!("Saved {} index entries to {}", self.len(), dir.display());
        Ok(())
    }

    /// Restore an index saved with [`VectorIndex::save`].
    #[instrument]
    pub fn load(dir: &Path) -> Result<Self> {
        let marker = dir.join(INDEX_FILE);
        if !marker.is_file() {
            return Err(RagChatError::IndexMissing {
                path: dir.to_path_buf(),
            });
        }
        let bytes = std::fs::read(&marker)?;

        let err = match read_metadata(&dir.join(METADATA_FILE)).and_then(|s| attach_vectors(s, &bytes)) {
            Ok(index) => return Ok(index),
            Err(e) => e,
        };

        let previous = dir.join(PREVIOUS_METADATA_FILE);
        if previous.is_file() {
            if let Ok(index) = read_metadata(&previous).and_then(|s| attach_vectors(s, &bytes)) {
                warn!("{} does not match {} ({}), using {}", METADATA_FILE, INDEX_FILE, err, PREVIOUS_METADATA_FILE);
                return Ok(index);
            }
        }

        Err(err)
    }
}

fn read_metadata(path: &Path) -> Result<StoredIndex> {
    let metadata = std::fs::read(path)
        .map_err(|e| RagChatError::IndexCorrupt(format!("cannot read {}: {}", path.display(), e)))?;
    let stored: StoredIndex = serde_json::from_slice(&metadata)
        .map_err(|e| RagChatError::IndexCorrupt(format!("invalid {}: {}", path.display(), e)))?;

    if stored.manifest.version != FORMAT_VERSION {
        return Err(RagChatError::IndexCorrupt(format!(
            "unsupported index format version {}",
            stored.manifest.version
        )));
    }
    Ok(stored)
}

/// Check `bytes` against the metadata and fill in the entry vectors.
fn attach_vectors(stored: StoredIndex, bytes: &[u8]) -> Result<VectorIndex> {
    let dims = stored.manifest.dimensions;
    let expected = stored.entries.len() * dims * 4;
    if bytes.len() != expected {
        return Err(RagChatError::IndexCorrupt(format!(
            "{} is {} bytes, expected {} for {} entries of {} dimensions",
            INDEX_FILE,
            bytes.len(),
            expected,
            stored.entries.len(),
            dims
        )));
    }
    if let Some(sum) = stored.vector_checksum {
        if checksum(bytes) != sum {
            return Err(RagChatError::IndexCorrupt(format!("{} checksum mismatch", INDEX_FILE)));
        }
    }

    let mut entries = stored.entries;
    if dims > 0 {
        for (entry, raw) in entries.iter_mut().zip(bytes.chunks_exact(dims * 4)) {
            entry.embedding = bytes_to_embedding(raw);
        }
    }

    debug!("Loaded {} index entries", entries.len());
    Ok(VectorIndex::from_parts(stored.manifest, entries))
}

/// Index store rooted at a directory.
#[derive(Debug, Clone)]
pub struct DiskIndexStore {
    dir: PathBuf,
}

impl DiskIndexStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

#[async_trait]
impl IndexStore for DiskIndexStore {
    async fn exists(&self) -> Result<bool> {
        Ok(VectorIndex::exists(&self.dir))
    }

    async fn load(&self) -> Result<VectorIndex> {
        VectorIndex::load(&self.dir)
    }

    async fn save(&self, index: &VectorIndex) -> Result<()> {
        index.save(&self.dir)
    }

    fn location(&self) -> String {
        self.dir.display().to_string()
    }
}

/// Write through a temporary file in the same directory, then rename into place.
fn write_atomic(dir: &Path, name: &str, bytes: &[u8]) -> Result<()> {
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(dir.join(name)).map_err(|e| RagChatError::Io(e.error))?;
    Ok(())
}

fn checksum(bytes: &[u8]) -> u64 {
    bytes.iter().fold(0xcbf29ce484222325, |hash, b| {
        (hash ^ u64::from(*b)).wrapping_mul(0x100000001b3)
    })
}

/// Serialize embedding to bytes.
fn embedding_to_bytes(embedding: &[f32]) -> Vec<u8> {
    embedding.iter().flat_map(|f| f.to_le_bytes()).collect()
}

/// Deserialize embedding from bytes.
fn bytes_to_embedding(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(4)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunking::Chunk;

    fn sample() -> VectorIndex {
        VectorIndex::build(
            "test-model",
            vec![
                Chunk::new("The sky is blue.", Some("sky.txt".to_string()), 0),
                Chunk::new("Grass is green.", Some("grass.txt".to_string()), 0),
                Chunk::new("Snow is white.", None, 3),
            ],
            vec![
                vec![0.1, 0.9, 0.3],
                vec![0.8, 0.2, 0.1],
                vec![0.33333334, 0.5, -0.25],
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_missing_index_is_distinct_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = VectorIndex::load(&dir.path().join("vectorstore")).unwrap_err();
        assert!(err.is_index_missing());
        assert!(!VectorIndex::exists(dir.path()));
    }

    #[test]
    fn test_round_trip_preserves_search() {
        let dir = tempfile::tempdir().unwrap();
        let index = sample();
        index.save(dir.path()).unwrap();
        assert!(VectorIndex::exists(dir.path()));

        let loaded = VectorIndex::load(dir.path()).unwrap();
        assert_eq!(loaded, index);

        for query in [[1.0f32, 0.0, 0.0], [0.0, 1.0, 0.0], [0.2, -0.4, 0.9]] {
            assert_eq!(index.search(&query, 3).unwrap(), loaded.search(&query, 3).unwrap());
        }
    }

    #[test]
    fn test_add_save_load_matches_in_memory_state() {
        let dir = tempfile::tempdir().unwrap();
        sample().save(dir.path()).unwrap();

        let mut index = VectorIndex::load(dir.path()).unwrap();
        index
            .add(vec![Chunk::new("Night is dark.", None, 0)], vec![vec![-0.5, -0.5, 0.1]])
            .unwrap();
        index.save(dir.path()).unwrap();

        let reloaded = VectorIndex::load(dir.path()).unwrap();
        assert_eq!(reloaded.len(), 4);
        assert_eq!(
            index.search(&[-1.0, -1.0, 0.0], 10).unwrap(),
            reloaded.search(&[-1.0, -1.0, 0.0], 10).unwrap()
        );
    }

    #[test]
    fn test_truncated_vectors_are_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        sample().save(dir.path()).unwrap();

        let marker = dir.path().join(INDEX_FILE);
        let mut bytes = std::fs::read(&marker).unwrap();
        bytes.truncate(bytes.len() - 4);
        std::fs::write(&marker, bytes).unwrap();

        assert!(matches!(
            VectorIndex::load(dir.path()),
            Err(RagChatError::IndexCorrupt(_))
        ));
    }

    #[test]
    fn test_missing_metadata_is_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        sample().save(dir.path()).unwrap();
        std::fs::remove_file(dir.path().join(METADATA_FILE)).unwrap();

        assert!(matches!(
            VectorIndex::load(dir.path()),
            Err(RagChatError::IndexCorrupt(_))
        ));
    }

    #[test]
    fn test_interrupted_save_falls_back_to_previous_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let original = sample();
        original.save(dir.path()).unwrap();
        let old_vectors = std::fs::read(dir.path().join(INDEX_FILE)).unwrap();

        let mut extended = original.clone();
        extended
            .add(vec![Chunk::new("Night is dark.", None, 0)], vec![vec![-0.5, -0.5, 0.1]])
            .unwrap();
        extended.save(dir.path()).unwrap();
        assert!(dir.path().join(PREVIOUS_METADATA_FILE).is_file());

        // New metadata next to the old vectors, as if the final rename never happened.
        std::fs::write(dir.path().join(INDEX_FILE), old_vectors).unwrap();

        let loaded = VectorIndex::load(dir.path()).unwrap();
        assert_eq!(loaded, original);
    }

    #[test]
    fn test_changed_vectors_fail_checksum() {
        let dir = tempfile::tempdir().unwrap();
        sample().save(dir.path()).unwrap();

        let marker = dir.path().join(INDEX_FILE);
        let mut bytes = std::fs::read(&marker).unwrap();
        bytes[0] ^= 0xff;
        std::fs::write(&marker, bytes).unwrap();

        assert!(matches!(
            VectorIndex::load(dir.path()),
            Err(RagChatError::IndexCorrupt(_))
        ));
    }

    #[tokio::test]
    async fn test_disk_store() {
        let dir = tempfile::tempdir().unwrap();
        let store = DiskIndexStore::new(dir.path().join("vectorstore"));

        assert!(!store.exists().await.unwrap());
        assert!(store.load().await.unwrap_err().is_index_missing());

        store.save(&sample()).await.unwrap();
        assert!(store.exists().await.unwrap());
        assert_eq!(store.load().await.unwrap().len(), 3);
    }
}
