//! REST API types for frontend integration.
//!
//! The response is shaped for the ECharts renderer directly: a sankey
//! `nodes`/`links` pair and a pie `data` array, no reshaping needed in the
//! frontend. Each link carries both its raw provenance list (`chars`) and
//! the preformatted tooltip text, so the edge tooltip can show exactly
//! which characters were merged into the link.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::models::ChartModels;
use crate::render::format_provenance;
use crate::source::TableData;
use crate::viewer::SourceEntry;

/// Response sent to the frontend for one data source selection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartsResponse {
    /// Which registered source this is.
    pub source: SourceInfo,

    /// Flow diagram data, ECharts sankey shape.
    pub sankey: SankeyData,

    /// Proportion chart data, ECharts pie shape.
    pub pie: PieData,

    /// Metadata about the decoded table.
    pub meta: TableMeta,
}

/// Identity of a registered data source.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceInfo {
    pub id: String,
    pub label: String,
}

/// Sankey series payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SankeyData {
    pub nodes: Vec<SankeyNode>,
    pub links: Vec<SankeyLink>,
}

/// One sankey node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SankeyNode {
    pub name: String,
}

/// One merged sankey link.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SankeyLink {
    pub source: String,
    pub target: String,
    /// Merged record count.
    pub value: u64,
    /// Provenance labels, record order, duplicates retained.
    pub chars: Vec<String>,
    /// Preformatted tooltip text (`chars` joined with a full-width comma).
    pub tooltip: String,
}

/// Pie series payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PieData {
    pub data: Vec<PieSlice>,
}

/// One pie slice.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PieSlice {
    pub name: String,
    pub value: u64,
}

/// Table decoding metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableMeta {
    pub encoding: String,
    pub delimiter: String,
    pub row_count: usize,
    /// Rows that contributed an edge (both endpoint fields present).
    pub edge_row_count: u64,
}

impl ChartsResponse {
    /// Shape one engine run for the frontend.
    pub fn build(entry: &SourceEntry, table: &TableData, models: ChartModels) -> Self {
        let edge_row_count = models.graph.total_weight();

        let nodes = models
            .graph
            .nodes
            .into_iter()
            .map(|n| SankeyNode { name: n.name })
            .collect();

        let links = models
            .graph
            .edges
            .into_iter()
            .map(|e| SankeyLink {
                tooltip: format_provenance(&e.provenance),
                source: e.source,
                target: e.target,
                value: e.weight,
                chars: e.provenance,
            })
            .collect();

        let data = models
            .distribution
            .entries
            .into_iter()
            .map(|e| PieSlice {
                name: e.name,
                value: e.count,
            })
            .collect();

        ChartsResponse {
            source: SourceInfo {
                id: entry.id.clone(),
                label: entry.label.clone(),
            },
            sankey: SankeyData { nodes, links },
            pie: PieData { data },
            meta: TableMeta {
                encoding: table.encoding.clone(),
                delimiter: table.delimiter.to_string(),
                row_count: table.records.len(),
                edge_row_count,
            },
        }
    }
}

/// Create an error response body.
pub fn error_response(error: &str) -> Value {
    json!({
        "status": "error",
        "error": error,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::aggregate;
    use crate::models::FieldConfig;
    use serde_json::json;

    fn sample() -> (SourceEntry, TableData, ChartModels) {
        let entry = SourceEntry {
            id: "unmerged".into(),
            label: "未合併源".into(),
            location: "data/未合併源.csv".into(),
        };
        let records = vec![
            json!({ "韵字": "甲", "上古韵部": "魚", "中古韵部": "模" }),
            json!({ "韵字": "乙", "上古韵部": "魚", "中古韵部": "模" }),
        ];
        let models = aggregate(&records, &FieldConfig::default());
        let table = TableData {
            records,
            headers: vec!["韵字".into(), "上古韵部".into(), "中古韵部".into()],
            encoding: "utf-8".into(),
            delimiter: ',',
        };
        (entry, table, models)
    }

    #[test]
    fn test_build_echarts_shape() {
        let (entry, table, models) = sample();
        let response = ChartsResponse::build(&entry, &table, models);

        assert_eq!(response.sankey.nodes.len(), 2);
        assert_eq!(response.sankey.links.len(), 1);

        let link = &response.sankey.links[0];
        assert_eq!(link.source, "魚(上古)");
        assert_eq!(link.target, "模(中古)");
        assert_eq!(link.value, 2);
        assert_eq!(link.chars, vec!["甲", "乙"]);
        assert_eq!(link.tooltip, "甲、乙");

        assert_eq!(response.pie.data.len(), 1);
        assert_eq!(response.pie.data[0].name, "魚");
        assert_eq!(response.pie.data[0].value, 2);

        assert_eq!(response.meta.row_count, 2);
        assert_eq!(response.meta.edge_row_count, 2);
    }

    #[test]
    fn test_serializes_camel_case() {
        let (entry, table, models) = sample();
        let response = ChartsResponse::build(&entry, &table, models);
        let json = serde_json::to_value(&response).unwrap();

        assert!(json["meta"].get("rowCount").is_some());
        assert!(json["meta"].get("edgeRowCount").is_some());
        assert_eq!(json["sankey"]["links"][0]["value"], 2);
    }

    #[test]
    fn test_error_response_shape() {
        let body = error_response("Load failed");
        assert_eq!(body["status"], "error");
        assert_eq!(body["error"], "Load failed");
    }
}
