//! Aggregation engine: turn an ordered record sequence into chart models.
//!
//! This is the core of the crate. One pass over the records produces the
//! flow graph (deduplicated nodes, merged weighted edges with provenance)
//! and a second pass produces the category distribution.
//!
//! # Architecture
//!
//! ```text
//! Table rows (flat records)        →  Flow graph (merged edges)
//! ┌──────────────────────────────┐    ┌──────────────────────────────┐
//! │ 韵字: 甲, 上古: 魚, 中古: 模 │    │ 魚(上古) → 模(中古)          │
//! │ 韵字: 乙, 上古: 魚, 中古: 模 │ →  │   weight 2, provenance 甲,乙 │
//! │ 韵字: 丙, 上古: 魚, 中古: 麻 │    │ 魚(上古) → 麻(中古)          │
//! └──────────────────────────────┘    │   weight 1, provenance 丙    │
//!                                     └──────────────────────────────┘
//! ```
//!
//! # Per-record policy
//!
//! A record missing either endpoint field contributes nothing, silently.
//! A record missing its label field falls back to the configured fallback
//! column, then to an empty placeholder; it is never skipped for that.
//!
//! Edge identity is the structural pair of endpoint labels. No string
//! concatenation is involved, so labels containing any would-be separator
//! cannot collide two distinct transitions into one edge.
//!
//! The engine holds no state: every call builds its maps locally and
//! returns fresh models, so switching data sources cannot leak a prior
//! run's aggregation.

use serde_json::Value;
use std::collections::{HashMap, HashSet};

use crate::models::{
    ChartModels, Distribution, DistributionEntry, FieldConfig, FlowEdge, GraphModel, Node,
};

/// Run both aggregations over one record sequence.
pub fn aggregate(records: &[Value], config: &FieldConfig) -> ChartModels {
    ChartModels {
        graph: aggregate_graph(records, config),
        distribution: aggregate_distribution(records, &config.distribution_field),
    }
}

/// Build the flow graph: node set plus merged, weighted, provenance-carrying
/// edges.
///
/// Nodes are registered in first-seen order; so are edges. Records whose
/// source or target field is absent or blank are skipped entirely.
pub fn aggregate_graph(records: &[Value], config: &FieldConfig) -> GraphModel {
    let mut nodes: Vec<Node> = Vec::new();
    let mut seen_nodes: HashSet<String> = HashSet::new();
    let mut edges: Vec<FlowEdge> = Vec::new();
    let mut edge_index: HashMap<(String, String), usize> = HashMap::new();

    for record in records {
        let Some(source_value) = field_value(record, &config.source_field) else {
            continue;
        };
        let Some(target_value) = field_value(record, &config.target_field) else {
            continue;
        };

        let label = field_value(record, &config.label_field)
            .or_else(|| field_value(record, &config.label_fallback))
            .unwrap_or_default();

        let source = config.source_label(&source_value);
        let target = config.target_label(&target_value);

        if seen_nodes.insert(source.clone()) {
            nodes.push(Node::new(source.clone()));
        }
        if seen_nodes.insert(target.clone()) {
            nodes.push(Node::new(target.clone()));
        }

        let key = (source.clone(), target.clone());
        let idx = *edge_index.entry(key).or_insert_with(|| {
            edges.push(FlowEdge::new(source, target));
            edges.len() - 1
        });

        edges[idx].weight += 1;
        edges[idx].provenance.push(label);
    }

    GraphModel { nodes, edges }
}

/// Count records per distinct value of one field.
///
/// Records where the field is absent or blank are excluded from both the
/// numerator and the denominator. Entries come out in first-seen order,
/// which keeps repeated runs identical; consumers impose their own display
/// ordering.
pub fn aggregate_distribution(records: &[Value], field: &str) -> Distribution {
    let mut entries: Vec<DistributionEntry> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for record in records {
        let Some(value) = field_value(record, field) else {
            continue;
        };

        match index.get(&value) {
            Some(&i) => entries[i].count += 1,
            None => {
                index.insert(value.clone(), entries.len());
                entries.push(DistributionEntry { name: value, count: 1 });
            }
        }
    }

    Distribution { entries }
}

/// Read a field as display text.
///
/// Strings come back as-is, numbers in their natural display form.
/// Absent fields, nulls, and blank strings all count as unusable and
/// yield `None`.
fn field_value(record: &Value, field: &str) -> Option<String> {
    match record.get(field)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
