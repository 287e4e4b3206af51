//! Retrieval Facade: embedder trait + embeddings store composition
//!
//! Answers natural-language queries over indexed specification sections.
//! The embedding function is an injected trait object, never hardwired:
//! production deployments plug in a model-backed embedder, while
//! `HashEmbedder` provides a deterministic digest-chain fallback that needs
//! no model at all (useful for tests and air-gapped sites).

use crate::types::{SearchResult, SpecSection};
use crate::vector_store::{EmbeddingsStore, VectorStoreError};
use serde_json::json;
use tracing::info;

/// Maps text to a fixed-length float vector.
///
/// Implementations must be thread-safe (Send + Sync) so a retriever can be
/// shared across async handlers.
pub trait Embedder: Send + Sync {
    /// Output vector length; every call to `embed` returns exactly this many
    /// floats.
    fn dim(&self) -> usize;

    /// Embed one text into a vector of length `dim()`.
    fn embed(&self, text: &str) -> Vec<f32>;
}

/// Deterministic hash-based embedder.
///
/// Chains MD5 digests over `text + little-endian counter` until `dim` bytes
/// are produced, scaling each byte to [0, 1]. No semantic content, purely a
/// reproducible stand-in when a real embedding model is unavailable.
pub struct HashEmbedder {
    dim: usize,
}

impl HashEmbedder {
    /// Default embedding dimension.
    pub const DEFAULT_DIM: usize = 128;

    pub fn new(dim: usize) -> Self {
        Self { dim }
    }
}

impl Default for HashEmbedder {
    fn default() -> Self {
        Self::new(Self::DEFAULT_DIM)
    }
}

impl Embedder for HashEmbedder {
    fn dim(&self) -> usize {
        self.dim
    }

    fn embed(&self, text: &str) -> Vec<f32> {
        let mut vec = Vec::with_capacity(self.dim + 16);
        let mut counter: u16 = 0;
        while vec.len() < self.dim {
            let mut input = Vec::with_capacity(text.len() + 2);
            input.extend_from_slice(text.as_bytes());
            input.extend_from_slice(&counter.to_le_bytes());
            let digest = md5::compute(&input);
            vec.extend(digest.iter().map(|b| f32::from(*b) / 255.0));
            counter = counter.wrapping_add(1);
        }
        vec.truncate(self.dim);
        vec
    }
}

/// Thin adapter composing an embedder with an embeddings store.
pub struct Retriever {
    embedder: Box<dyn Embedder>,
    store: EmbeddingsStore,
}

impl Retriever {
    /// Compose an embedder with an existing (possibly pre-loaded) store.
    ///
    /// Fails when the embedder and store disagree on dimension; catching
    /// this at construction beats a `DimensionMismatch` on every query.
    pub fn new(
        embedder: Box<dyn Embedder>,
        store: EmbeddingsStore,
    ) -> Result<Self, VectorStoreError> {
        if embedder.dim() != store.dim() {
            return Err(VectorStoreError::DimensionMismatch {
                expected: store.dim(),
                provided: embedder.dim(),
            });
        }
        Ok(Self { embedder, store })
    }

    /// Create a retriever over a fresh empty store sized to the embedder.
    pub fn with_empty_store(embedder: Box<dyn Embedder>) -> Result<Self, VectorStoreError> {
        let store = EmbeddingsStore::new(embedder.dim())?;
        Ok(Self { embedder, store })
    }

    /// Embed and index every section with `{id, title, source}` metadata.
    ///
    /// Returns the number of sections indexed.
    pub fn index_sections(
        &mut self,
        sections: &[SpecSection],
        source: &str,
    ) -> Result<usize, VectorStoreError> {
        for section in sections {
            let vector = self.embedder.embed(&section.text);
            let metadata = json!({
                "id": section.id,
                "title": section.title,
                "source": source,
            });
            self.store.add(&vector, Some(metadata))?;
        }
        info!(sections = sections.len(), source, "Indexed spec sections");
        Ok(sections.len())
    }

    /// Embed the query text and return the top-k ranked results.
    pub fn search(&self, query: &str, k: usize) -> Result<Vec<SearchResult>, VectorStoreError> {
        let vector = self.embedder.embed(query);
        self.store.query(&vector, k)
    }

    /// Read access to the underlying store (e.g. for `save`).
    pub fn store(&self) -> &EmbeddingsStore {
        &self.store
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec_doc::split_sections;

    #[test]
    fn test_hash_embedder_deterministic() {
        let embedder = HashEmbedder::default();
        let a = embedder.embed("turbine imbalance");
        let b = embedder.embed("turbine imbalance");
        assert_eq!(a, b);
        assert_eq!(a.len(), HashEmbedder::DEFAULT_DIM);
    }

    #[test]
    fn test_hash_embedder_range_and_dim() {
        let embedder = HashEmbedder::new(50);
        let vec = embedder.embed("seal wear");
        assert_eq!(vec.len(), 50);
        assert!(vec.iter().all(|v| (0.0..=1.0).contains(v)));
    }

    #[test]
    fn test_hash_embedder_distinguishes_texts() {
        let embedder = HashEmbedder::default();
        assert_ne!(embedder.embed("bearing fatigue"), embedder.embed("rotor crack"));
    }

    #[test]
    fn test_dimension_mismatch_at_construction() {
        let store = EmbeddingsStore::new(64).unwrap();
        let result = Retriever::new(Box::new(HashEmbedder::new(128)), store);
        assert!(matches!(
            result,
            Err(VectorStoreError::DimensionMismatch { expected: 64, provided: 128 })
        ));
    }

    #[test]
    fn test_index_and_self_search() {
        let doc = "FM-01: Turbine Imbalance\nVibration rises with load.\nFM-02: Seal Wear\nPressure drop across the seal.";
        let sections = split_sections(doc);

        let mut retriever =
            Retriever::with_empty_store(Box::new(HashEmbedder::default())).unwrap();
        let indexed = retriever.index_sections(&sections, "engine_spec_data.doc").unwrap();
        assert_eq!(indexed, 2);

        // Searching with a section's own text returns that section first.
        let results = retriever.search(&sections[1].text, 2).unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].metadata["id"], "FM-02");
        assert!((results[0].score - 1.0).abs() < 1e-5);
        assert_eq!(results[0].metadata["source"], "engine_spec_data.doc");
    }
}
