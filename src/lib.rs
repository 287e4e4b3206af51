//! Engine KB: Industrial-Equipment Knowledge Pipeline
//!
//! Toolkit for turning raw equipment data into retrievable knowledge:
//!
//! - **Sliding-Window Aggregator**: sensor time series -> fixed-shape
//!   feature windows keyed by deterministic ids
//! - **Embeddings Store**: flat cosine-similarity index with two-file
//!   persistence (`.index` + `.meta.json`)
//! - **Spec Segmentation**: failure-mode document -> labeled sections
//! - **Retrieval Facade**: pluggable embedder + store behind one query call

pub mod agents;
pub mod api;
pub mod config;
pub mod ingest;
pub mod retrieval;
pub mod spec_doc;
pub mod tools;
pub mod types;
pub mod vector_store;
pub mod windows;

// Re-export configuration
pub use config::KbConfig;

// Re-export commonly used types
pub use types::{FeatureWindow, SearchResult, SensorReading, SpecSection};

// Re-export the core surfaces
pub use retrieval::{Embedder, HashEmbedder, Retriever};
pub use spec_doc::{load_spec_text, split_sections};
pub use vector_store::{EmbeddingsStore, VectorStoreError};
pub use windows::{compute_windows, WindowError};

// Re-export ingestion collaborator interfaces
pub use ingest::{read_sensor_csv, GraphSink, InMemoryGraphSink};
