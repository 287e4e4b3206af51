//! Embeddings Store: flat inner-product index with metadata persistence
//!
//! Holds fixed-dimension vectors with a parallel metadata list and answers
//! top-k cosine-similarity queries by brute-force inner product. Vectors are
//! L2-normalized at insert time so the inner product of two stored/query
//! vectors equals their cosine similarity.
//!
//! ## Persistence layout
//!
//! `save` writes two sibling artifacts sharing a base path:
//! - `<base>.index`: bincode-encoded dimension + flat f32 vector buffer
//! - `<base>.meta.json`: JSON array of metadata objects, index-aligned
//!
//! The pair is the durable contract: `metadata[i]` describes the i-th vector
//! in the index buffer. `load` verifies the alignment explicitly rather than
//! trusting the files. Each artifact is written to a temp path and renamed
//! into place, so a reader never observes a half-written file.

use crate::types::SearchResult;
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Errors surfaced by the embeddings store.
///
/// All variants are recoverable, local conditions; callers decide whether to
/// retry, rebuild, or fall back. `InvalidDimension` (construction) is
/// deliberately distinct from `Corruption` (load): the former means "fix the
/// configuration", the latter "rebuild the index from source data".
#[derive(Debug, thiserror::Error)]
pub enum VectorStoreError {
    #[error("embedding dimension must be a positive integer")]
    InvalidDimension,

    #[error("vector dimension {provided} does not match store dimension {expected}")]
    DimensionMismatch { expected: usize, provided: usize },

    #[error("store artifact not found: {0}")]
    ArtifactNotFound(PathBuf),

    #[error("corrupt store: index holds {vectors} vectors but metadata holds {metadata_entries} entries")]
    Corruption {
        vectors: usize,
        metadata_entries: usize,
    },

    #[error("corrupt index artifact: {0}")]
    MalformedIndex(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("index serialization error: {0}")]
    IndexCodec(#[from] bincode::Error),

    #[error("metadata serialization error: {0}")]
    MetadataCodec(#[from] serde_json::Error),
}

/// On-disk shape of the `.index` artifact.
#[derive(Serialize, Deserialize)]
struct IndexArtifact {
    dim: u32,
    /// Row-major flat buffer: vector i occupies `[i*dim, (i+1)*dim)`
    vectors: Vec<f32>,
}

/// Flat embeddings store with cosine-similarity search.
///
/// Not safe for concurrent mutation: `add` appends to the vector buffer and
/// the metadata list in lock-step and callers must serialize writers
/// externally. Concurrent reads (`query`) with no writer in flight are fine.
#[derive(Debug)]
pub struct EmbeddingsStore {
    dim: usize,
    /// Row-major flat buffer of unit-normalized vectors
    vectors: Vec<f32>,
    /// Index-aligned with the vector buffer: metadata[i] <-> vector i
    metadatas: Vec<serde_json::Value>,
}

impl EmbeddingsStore {
    /// Create an empty store for vectors of length `dim`.
    ///
    /// Fails with `InvalidDimension` for `dim == 0`. Construction errors
    /// are explicit so callers can choose a fallback store instead.
    pub fn new(dim: usize) -> Result<Self, VectorStoreError> {
        if dim == 0 {
            return Err(VectorStoreError::InvalidDimension);
        }
        Ok(Self {
            dim,
            vectors: Vec::new(),
            metadatas: Vec::new(),
        })
    }

    /// Vector dimension fixed at construction.
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Number of stored vectors.
    pub fn len(&self) -> usize {
        self.metadatas.len()
    }

    /// True when no vectors have been added.
    pub fn is_empty(&self) -> bool {
        self.metadatas.is_empty()
    }

    /// Append a vector with optional metadata.
    ///
    /// The vector is normalized to unit L2 norm before insertion (a zero
    /// vector is stored as-is rather than divided by zero). Missing metadata
    /// is stored as an empty JSON object.
    pub fn add(
        &mut self,
        vector: &[f32],
        metadata: Option<serde_json::Value>,
    ) -> Result<(), VectorStoreError> {
        if vector.len() != self.dim {
            return Err(VectorStoreError::DimensionMismatch {
                expected: self.dim,
                provided: vector.len(),
            });
        }

        let normalized = normalize(vector);
        self.vectors.extend_from_slice(&normalized);
        self.metadatas
            .push(metadata.unwrap_or_else(|| serde_json::Value::Object(serde_json::Map::new())));

        Ok(())
    }

    /// Top-k cosine-similarity search.
    ///
    /// Returns `min(k, len)` results ordered by descending score; ties break
    /// by insertion order (earliest first) so rankings are reproducible. An
    /// empty store yields an empty result set, not an error.
    pub fn query(&self, vector: &[f32], k: usize) -> Result<Vec<SearchResult>, VectorStoreError> {
        if vector.len() != self.dim {
            return Err(VectorStoreError::DimensionMismatch {
                expected: self.dim,
                provided: vector.len(),
            });
        }

        let q = normalize(vector);

        let mut scored: Vec<(usize, f32)> = self
            .vectors
            .chunks_exact(self.dim)
            .map(|row| row.iter().zip(q.iter()).map(|(a, b)| a * b).sum::<f32>())
            .enumerate()
            .collect();

        // Descending score, then ascending insertion handle (deterministic).
        scored.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.0.cmp(&b.0))
        });

        Ok(scored
            .into_iter()
            .take(k)
            .map(|(idx, score)| SearchResult {
                score,
                metadata: self.metadatas[idx].clone(),
            })
            .collect())
    }

    /// Persist the store as `<base>.index` + `<base>.meta.json`.
    ///
    /// Creates the parent directory if needed. Both artifacts are written to
    /// temp paths and renamed atomically so a concurrent `load` of the same
    /// base never sees a partially written pair.
    pub fn save<P: AsRef<Path>>(&self, base_path: P) -> Result<(), VectorStoreError> {
        let base = base_path.as_ref();
        let (index_path, meta_path) = artifact_paths(base);

        if let Some(parent) = base.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let artifact = IndexArtifact {
            dim: self.dim as u32,
            vectors: self.vectors.clone(),
        };
        write_atomic(&index_path, &bincode::serialize(&artifact)?)?;
        write_atomic(&meta_path, &serde_json::to_vec_pretty(&self.metadatas)?)?;

        info!(vectors = self.len(), path = %base.display(), "Saved embeddings store");
        Ok(())
    }

    /// Reload a store saved by [`save`](Self::save).
    ///
    /// The dimension is reconstructed from the index artifact and the
    /// metadata array is restored verbatim. Fails with `ArtifactNotFound`
    /// when either file is missing and `Corruption` when the two artifacts
    /// disagree on entry count.
    pub fn load<P: AsRef<Path>>(base_path: P) -> Result<Self, VectorStoreError> {
        let base = base_path.as_ref();
        let (index_path, meta_path) = artifact_paths(base);

        for path in [&index_path, &meta_path] {
            if !path.exists() {
                return Err(VectorStoreError::ArtifactNotFound(path.clone()));
            }
        }

        let artifact: IndexArtifact = bincode::deserialize(&fs::read(&index_path)?)?;
        let dim = artifact.dim as usize;
        if dim == 0 {
            return Err(VectorStoreError::MalformedIndex(
                "index artifact declares dimension 0".to_string(),
            ));
        }
        if artifact.vectors.len() % dim != 0 {
            return Err(VectorStoreError::MalformedIndex(format!(
                "buffer length {} is not a multiple of dimension {}",
                artifact.vectors.len(),
                dim
            )));
        }
        let vector_count = artifact.vectors.len() / dim;

        let metadatas: Vec<serde_json::Value> = serde_json::from_slice(&fs::read(&meta_path)?)?;

        // Structural invariant: the artifacts must be index-aligned.
        if metadatas.len() != vector_count {
            return Err(VectorStoreError::Corruption {
                vectors: vector_count,
                metadata_entries: metadatas.len(),
            });
        }

        debug!(vectors = vector_count, dim, path = %base.display(), "Loaded embeddings store");
        Ok(Self {
            dim,
            vectors: artifact.vectors,
            metadatas,
        })
    }
}

/// Paths of the two sibling artifacts for a base path.
///
/// Suffixes are appended to the full file name (`store` -> `store.index`),
/// not substituted for an existing extension.
fn artifact_paths(base: &Path) -> (PathBuf, PathBuf) {
    let mut index: OsString = base.as_os_str().to_os_string();
    index.push(".index");
    let mut meta: OsString = base.as_os_str().to_os_string();
    meta.push(".meta.json");
    (PathBuf::from(index), PathBuf::from(meta))
}

/// Write bytes to `<path>.tmp` then rename into place.
fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), std::io::Error> {
    let mut tmp: OsString = path.as_os_str().to_os_string();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);
    fs::write(&tmp, bytes)?;
    fs::rename(&tmp, path)
}

/// L2-normalize a vector; a zero vector is returned unchanged.
fn normalize(vector: &[f32]) -> Vec<f32> {
    let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm == 0.0 {
        return vector.to_vec();
    }
    vector.iter().map(|v| v / norm).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn basis_store() -> EmbeddingsStore {
        let mut store = EmbeddingsStore::new(3).unwrap();
        store.add(&[1.0, 0.0, 0.0], Some(json!({"id": "v1"}))).unwrap();
        store.add(&[0.0, 1.0, 0.0], Some(json!({"id": "v2"}))).unwrap();
        store.add(&[0.0, 0.0, 1.0], Some(json!({"id": "v3"}))).unwrap();
        store
    }

    #[test]
    fn test_zero_dimension_rejected() {
        assert!(matches!(
            EmbeddingsStore::new(0),
            Err(VectorStoreError::InvalidDimension)
        ));
    }

    #[test]
    fn test_add_dimension_mismatch() {
        let mut store = EmbeddingsStore::new(3).unwrap();
        let err = store.add(&[1.0, 2.0], None).unwrap_err();
        match err {
            VectorStoreError::DimensionMismatch { expected, provided } => {
                assert_eq!(expected, 3);
                assert_eq!(provided, 2);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(store.is_empty());
    }

    #[test]
    fn test_query_dimension_mismatch() {
        let store = basis_store();
        assert!(matches!(
            store.query(&[1.0, 0.0], 1),
            Err(VectorStoreError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn test_empty_store_query_returns_empty() {
        let store = EmbeddingsStore::new(4).unwrap();
        let results = store.query(&[1.0, 0.0, 0.0, 0.0], 5).unwrap();
        assert!(results.is_empty());
    }

    #[test]
    fn test_orthogonal_basis_query() {
        let store = basis_store();

        let results = store.query(&[1.0, 0.0, 0.0], 2).unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].metadata["id"], "v1");
        assert!((results[0].score - 1.0).abs() < 1e-6);
        assert!(results[1].score.abs() < 1e-6);
        // Tie between v2 and v3 at score 0 breaks by insertion order.
        assert_eq!(results[1].metadata["id"], "v2");
    }

    #[test]
    fn test_self_retrieval_unnormalized_input() {
        let mut store = EmbeddingsStore::new(3).unwrap();
        store.add(&[2.0, 1.0, 0.5], Some(json!({"id": "a"}))).unwrap();
        store.add(&[0.1, 5.0, 0.0], Some(json!({"id": "b"}))).unwrap();

        // Querying with the pre-normalization vector finds itself at score 1.
        let results = store.query(&[2.0, 1.0, 0.5], 1).unwrap();
        assert_eq!(results[0].metadata["id"], "a");
        assert!((results[0].score - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_k_capped_at_store_size() {
        let store = basis_store();
        let results = store.query(&[1.0, 1.0, 1.0], 10).unwrap();
        assert_eq!(results.len(), 3);
    }

    #[test]
    fn test_zero_vector_accepted() {
        let mut store = EmbeddingsStore::new(2).unwrap();
        store.add(&[0.0, 0.0], Some(json!({"id": "zero"}))).unwrap();
        store.add(&[1.0, 0.0], Some(json!({"id": "unit"}))).unwrap();

        let results = store.query(&[1.0, 0.0], 2).unwrap();
        assert_eq!(results[0].metadata["id"], "unit");
        assert!(results[1].score.abs() < 1e-6);
    }

    #[test]
    fn test_missing_metadata_stored_as_empty_object() {
        let mut store = EmbeddingsStore::new(2).unwrap();
        store.add(&[1.0, 0.0], None).unwrap();
        let results = store.query(&[1.0, 0.0], 1).unwrap();
        assert_eq!(results[0].metadata, json!({}));
    }

    #[test]
    fn test_save_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("nested").join("store");

        let store = basis_store();
        store.save(&base).unwrap();

        let loaded = EmbeddingsStore::load(&base).unwrap();
        assert_eq!(loaded.dim(), 3);
        assert_eq!(loaded.len(), 3);

        // Top-1 metadata is preserved for every original vector.
        for (vec, id) in [
            ([1.0, 0.0, 0.0], "v1"),
            ([0.0, 1.0, 0.0], "v2"),
            ([0.0, 0.0, 1.0], "v3"),
        ] {
            let results = loaded.query(&vec, 1).unwrap();
            assert_eq!(results[0].metadata["id"], id);
            assert!((results[0].score - 1.0).abs() < 1e-6);
        }
    }

    #[test]
    fn test_save_load_empty_store() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("empty");

        EmbeddingsStore::new(8).unwrap().save(&base).unwrap();
        let loaded = EmbeddingsStore::load(&base).unwrap();
        assert_eq!(loaded.dim(), 8);
        assert!(loaded.is_empty());
        assert!(loaded.query(&[0.5; 8], 3).unwrap().is_empty());
    }

    #[test]
    fn test_load_missing_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("absent");
        assert!(matches!(
            EmbeddingsStore::load(&base),
            Err(VectorStoreError::ArtifactNotFound(_))
        ));

        // Index present but metadata missing is still NotFound.
        let store = EmbeddingsStore::new(2).unwrap();
        store.save(&base).unwrap();
        std::fs::remove_file(dir.path().join("absent.meta.json")).unwrap();
        assert!(matches!(
            EmbeddingsStore::load(&base),
            Err(VectorStoreError::ArtifactNotFound(_))
        ));
    }

    #[test]
    fn test_load_detects_length_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("skewed");

        let store = basis_store();
        store.save(&base).unwrap();

        // Drop one metadata entry behind the store's back.
        let meta_path = dir.path().join("skewed.meta.json");
        let mut metas: Vec<serde_json::Value> =
            serde_json::from_slice(&std::fs::read(&meta_path).unwrap()).unwrap();
        metas.pop();
        std::fs::write(&meta_path, serde_json::to_vec(&metas).unwrap()).unwrap();

        match EmbeddingsStore::load(&base).unwrap_err() {
            VectorStoreError::Corruption {
                vectors,
                metadata_entries,
            } => {
                assert_eq!(vectors, 3);
                assert_eq!(metadata_entries, 2);
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
