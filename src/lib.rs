//! # rimeflow - rime table aggregation for flow and distribution charts
//!
//! rimeflow ingests flat tables of rime readings (one row per character,
//! with its Old Chinese and Middle Chinese rime groups) and derives the two
//! models the charts are drawn from: a weighted flow graph of category
//! transitions and a frequency distribution over one category column.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │ Table file  │────▶│   Source    │────▶│   Engine    │────▶│  Renderer   │
//! │ (any enc.)  │     │ (auto-enc)  │     │ (aggregate) │     │ (2 visuals) │
//! └─────────────┘     └─────────────┘     └─────────────┘     └─────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use rimeflow::{aggregate, FieldConfig};
//! use serde_json::json;
//!
//! let records = vec![
//!     json!({ "韵字": "魚", "上古韵部": "魚", "中古韵部": "模" }),
//!     json!({ "韵字": "普", "上古韵部": "魚", "中古韵部": "姥" }),
//! ];
//! let models = aggregate(&records, &FieldConfig::default());
//! assert_eq!(models.graph.total_weight(), 2);
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Hierarchical error types
//! - [`models`] - Domain models (FieldConfig, GraphModel, Distribution)
//! - [`source`] - Table loading and decoding with auto-detection
//! - [`engine`] - The aggregation engine
//! - [`render`] - Rendering boundary and provenance formatting
//! - [`viewer`] - Source selection and stale-load orchestration
//! - [`api`] - HTTP API server

// Core modules
pub mod error;
pub mod models;

// Record source
pub mod source;

// Aggregation
pub mod engine;

// Rendering boundary
pub mod render;

// Orchestration
pub mod viewer;

// HTTP API
pub mod api;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{ConfigError, ServerError, SourceError, ViewerError};

// =============================================================================
// Re-exports - Models
// =============================================================================

pub use models::{
    ChartModels, Distribution, DistributionEntry, FieldConfig, FlowEdge, GraphModel, Node,
};

// =============================================================================
// Re-exports - Engine
// =============================================================================

pub use engine::{aggregate, aggregate_distribution, aggregate_graph};

// =============================================================================
// Re-exports - Source
// =============================================================================

pub use source::{
    decode_content, detect_delimiter, detect_encoding, parse_table, parse_table_bytes,
    parse_table_file, AutoSource, RecordSource, TableData,
};

// =============================================================================
// Re-exports - Rendering
// =============================================================================

pub use render::{format_provenance, JsonRenderer, Renderer};

// =============================================================================
// Re-exports - Viewer
// =============================================================================

pub use viewer::{LoadTicket, SelectOutcome, SourceEntry, SourceRegistry, Viewer};

// =============================================================================
// Re-exports - API
// =============================================================================

pub use api::types::{error_response, ChartsResponse};

// Server
pub mod server {
    pub use crate::api::server::start_server;
}
