//! Domain models for the rimeflow aggregation engine.
//!
//! This module contains the core data structures:
//!
//! - [`FieldConfig`] - Validated field-name configuration for a run
//! - [`Node`] - A category value, disambiguated by its role suffix
//! - [`FlowEdge`] - A weighted, provenance-carrying transition
//! - [`GraphModel`] - Node set + edge set for the flow diagram
//! - [`Distribution`] - Per-category record counts for the proportion chart
//!
//! All model types are plain data: they are built fresh by each engine run,
//! handed to a renderer, and discarded. Nothing here is mutated after
//! construction.

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};

// =============================================================================
// Field Configuration
// =============================================================================

/// Field-name configuration for one aggregation run.
///
/// Field access in the original tables was by literal column name with a
/// silent fallback; here the names are an explicit configuration validated
/// up front, and the label fallback chain (primary column, then fallback
/// column, then placeholder) is a stated policy of this type.
///
/// Defaults match the rime evolution tables: Old Chinese rime group
/// (`上古韵部`) flowing into Middle Chinese rime group (`中古韵部`), with
/// the rime character column (`韵字`, fallback `代表字`) supplying edge
/// provenance.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FieldConfig {
    /// Column holding the edge-source category.
    pub source_field: String,
    /// Column holding the edge-target category.
    pub target_field: String,
    /// Column supplying the per-record provenance label.
    pub label_field: String,
    /// Column read when `label_field` is absent from a record.
    pub label_fallback: String,
    /// Column the distribution chart counts over.
    pub distribution_field: String,
    /// Suffix appended to source-side node labels.
    pub source_suffix: String,
    /// Suffix appended to target-side node labels.
    pub target_suffix: String,
}

impl Default for FieldConfig {
    fn default() -> Self {
        Self {
            source_field: "上古韵部".to_string(),
            target_field: "中古韵部".to_string(),
            label_field: "韵字".to_string(),
            label_fallback: "代表字".to_string(),
            distribution_field: "上古韵部".to_string(),
            source_suffix: "(上古)".to_string(),
            target_suffix: "(中古)".to_string(),
        }
    }
}

impl FieldConfig {
    /// Check the configuration before a run.
    ///
    /// The endpoint fields must be distinct non-empty names, and the two
    /// role suffixes must differ: identical suffixes would merge a value
    /// appearing on both sides of a transition into a single node.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.source_field.trim().is_empty() {
            return Err(ConfigError::EmptyFieldName("source"));
        }
        if self.target_field.trim().is_empty() {
            return Err(ConfigError::EmptyFieldName("target"));
        }
        if self.label_field.trim().is_empty() {
            return Err(ConfigError::EmptyFieldName("label"));
        }
        if self.distribution_field.trim().is_empty() {
            return Err(ConfigError::EmptyFieldName("distribution"));
        }
        if self.source_field == self.target_field {
            return Err(ConfigError::SameEndpointFields(self.source_field.clone()));
        }
        if self.source_suffix == self.target_suffix {
            return Err(ConfigError::SameSuffixes(self.source_suffix.clone()));
        }
        Ok(())
    }

    /// Display label for a source-side node.
    pub fn source_label(&self, value: &str) -> String {
        format!("{}{}", value, self.source_suffix)
    }

    /// Display label for a target-side node.
    pub fn target_label(&self, value: &str) -> String {
        format!("{}{}", value, self.target_suffix)
    }
}

// =============================================================================
// Graph Model
// =============================================================================

/// A node of the flow diagram.
///
/// Node identity is exactly its display label; the role suffix baked into
/// the label keeps source-side and target-side namespaces apart.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Node {
    /// Display label, role suffix included.
    pub name: String,
}

impl Node {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// A directed, aggregated transition between two nodes.
///
/// Parallel contributions are merged: there is at most one edge per
/// ordered `(source, target)` pair, carrying the combined weight and the
/// provenance labels of every contributing record in input order.
/// Duplicate labels are retained on purpose; they mark distinct records
/// that collapsed into this edge.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FlowEdge {
    /// Source node label.
    pub source: String,
    /// Target node label.
    pub target: String,
    /// Number of records merged into this edge.
    pub weight: u64,
    /// One label per contributing record, input order preserved.
    pub provenance: Vec<String>,
}

impl FlowEdge {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            weight: 0,
            provenance: Vec::new(),
        }
    }
}

/// Aggregated flow graph: deduplicated nodes plus merged, weighted edges.
///
/// Nodes are in first-seen order, which is stable for a fixed input and
/// keeps the rendered layout reproducible. Edges are likewise in
/// first-seen order, though consumers may not rely on more than that.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct GraphModel {
    pub nodes: Vec<Node>,
    pub edges: Vec<FlowEdge>,
}

impl GraphModel {
    /// Total weight across all edges.
    ///
    /// Equals the number of input records that had both endpoint fields.
    pub fn total_weight(&self) -> u64 {
        self.edges.iter().map(|e| e.weight).sum()
    }
}

// =============================================================================
// Distribution Model
// =============================================================================

/// One category value and the number of records exhibiting it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DistributionEntry {
    /// Observed category value, as it appeared in the table.
    pub name: String,
    /// Number of records with this value.
    pub count: u64,
}

/// Frequency distribution over one categorical column.
///
/// Entry order is unspecified; display ordering is the renderer's business.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Distribution {
    pub entries: Vec<DistributionEntry>,
}

impl Distribution {
    /// Total count across all entries.
    ///
    /// Equals the number of input records that had the distribution field.
    pub fn total_count(&self) -> u64 {
        self.entries.iter().map(|e| e.count).sum()
    }

    /// Count for one category value, if observed.
    pub fn count_of(&self, name: &str) -> Option<u64> {
        self.entries.iter().find(|e| e.name == name).map(|e| e.count)
    }
}

// =============================================================================
// Combined Output
// =============================================================================

/// The pair of models one engine run produces.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ChartModels {
    pub graph: GraphModel,
    pub distribution: Distribution,
}

// =============================================================================
// Tests
// =============================================================================
