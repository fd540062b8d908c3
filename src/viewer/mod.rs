//! Viewer orchestration: data source selection, loading, and rendering.
//!
//! The viewer owns the fixed registry of known data sources, one record
//! source, the field configuration, and two rendering sessions (one per
//! visual). Selecting a source runs exactly one load, one engine pass and
//! one pair of render calls.
//!
//! # Stale loads
//!
//! Loading is the only suspension point in the system. When the user
//! reselects while a load is still in flight, the superseded load's output
//! must never reach the engine. Each load gets a [`LoadTicket`] stamped
//! with the generation current at selection time; [`Viewer::apply`] drops
//! any ticket whose generation is no longer current. Callers driving loads
//! from spawned tasks use [`Viewer::begin_select`] / [`Viewer::apply`]
//! directly; [`Viewer::select`] wraps the two around an await for the
//! sequential case.
//!
//! # Failed reloads
//!
//! A failed load keeps the previously rendered models on screen: the error
//! propagates to the caller for display and the stored models are left
//! untouched. Reselecting is the retry mechanism.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::engine::aggregate;
use crate::error::{ViewerError, ViewerResult};
use crate::models::{ChartModels, FieldConfig};
use crate::render::Renderer;
use crate::source::RecordSource;

// =============================================================================
// Known Data Sources
// =============================================================================

/// One selectable data source.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SourceEntry {
    /// Stable identifier used by the selection surface.
    pub id: String,
    /// Human-readable label.
    pub label: String,
    /// Location handed to the record source.
    pub location: String,
}

/// The fixed, small set of selectable data sources.
///
/// Arbitrary user-supplied locations are out of scope; everything loadable
/// is registered here up front.
#[derive(Debug, Clone, Default)]
pub struct SourceRegistry {
    entries: Vec<SourceEntry>,
}

impl SourceRegistry {
    /// The standard two-source registry over a data directory:
    /// the unmerged and the merged rime tables.
    pub fn with_data_dir(data_dir: &str) -> Self {
        let dir = data_dir.trim_end_matches('/');
        Self {
            entries: vec![
                SourceEntry {
                    id: "unmerged".to_string(),
                    label: "未合併源".to_string(),
                    location: format!("{}/未合併源.csv", dir),
                },
                SourceEntry {
                    id: "merged".to_string(),
                    label: "已合併源".to_string(),
                    location: format!("{}/已合併源.csv", dir),
                },
            ],
        }
    }

    /// Registry over explicit entries.
    pub fn new(entries: Vec<SourceEntry>) -> Self {
        Self { entries }
    }

    /// All registered sources, in registration order.
    pub fn entries(&self) -> &[SourceEntry] {
        &self.entries
    }

    /// Resolve a source id to its location.
    pub fn resolve(&self, id: &str) -> Option<&SourceEntry> {
        self.entries.iter().find(|e| e.id == id)
    }
}

// =============================================================================
// Viewer
// =============================================================================

/// Proof that a load was started, stamped with its generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadTicket {
    generation: u64,
    /// Location the load should read from.
    pub location: String,
}

/// What happened to a finished load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectOutcome {
    /// The load was current; models were rebuilt and rendered.
    Applied,
    /// A newer selection superseded this load; its output was dropped.
    Stale,
}

/// Drives the select → load → aggregate → render cycle.
pub struct Viewer<S, G, D>
where
    S: RecordSource,
    G: Renderer,
    D: Renderer,
{
    source: S,
    registry: SourceRegistry,
    config: FieldConfig,
    graph_renderer: G,
    distribution_renderer: D,
    models: Option<ChartModels>,
    generation: u64,
}

impl<S, G, D> Viewer<S, G, D>
where
    S: RecordSource,
    G: Renderer,
    D: Renderer,
{
    pub fn new(
        source: S,
        registry: SourceRegistry,
        config: FieldConfig,
        graph_renderer: G,
        distribution_renderer: D,
    ) -> Self {
        Self {
            source,
            registry,
            config,
            graph_renderer,
            distribution_renderer,
            models: None,
            generation: 0,
        }
    }

    /// The models currently on screen, if any load has succeeded yet.
    pub fn models(&self) -> Option<&ChartModels> {
        self.models.as_ref()
    }

    /// The registered data sources.
    pub fn sources(&self) -> &[SourceEntry] {
        self.registry.entries()
    }

    /// Start a selection: resolve the source id and invalidate any load
    /// still in flight.
    pub fn begin_select(&mut self, id: &str) -> ViewerResult<LoadTicket> {
        let entry = self
            .registry
            .resolve(id)
            .ok_or_else(|| ViewerError::UnknownSource(id.to_string()))?;

        self.generation += 1;
        Ok(LoadTicket {
            generation: self.generation,
            location: entry.location.clone(),
        })
    }

    /// Apply a finished load, unless a newer selection superseded it.
    ///
    /// On application the models are rebuilt from scratch and both visuals
    /// re-rendered; nothing from a previous run survives.
    pub fn apply(&mut self, ticket: LoadTicket, records: &[Value]) -> SelectOutcome {
        if ticket.generation != self.generation {
            return SelectOutcome::Stale;
        }

        let models = aggregate(records, &self.config);
        self.graph_renderer.render_graph(&models.graph);
        self.distribution_renderer
            .render_distribution(&models.distribution);
        self.models = Some(models);
        SelectOutcome::Applied
    }

    /// Select a data source: load it, aggregate, render both visuals.
    ///
    /// On load failure the previous models stay rendered and the error is
    /// returned for display.
    pub async fn select(&mut self, id: &str) -> ViewerResult<SelectOutcome> {
        let ticket = self.begin_select(id)?;
        let table = self.source.load(&ticket.location).await?;
        Ok(self.apply(ticket, &table.records))
    }

    /// Viewport changed: refresh both layouts. Never re-aggregates.
    pub fn resize(&mut self) {
        self.graph_renderer.resize();
        self.distribution_renderer.resize();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{SourceError, SourceResult};
    use crate::source::TableData;
    use serde_json::json;
    use std::collections::HashMap;

    /// Canned in-memory source; unknown locations fail like missing files.
    struct FakeSource {
        tables: HashMap<String, Vec<Value>>,
    }

    impl FakeSource {
        fn new(tables: Vec<(&str, Vec<Value>)>) -> Self {
            Self {
                tables: tables
                    .into_iter()
                    .map(|(k, v)| (k.to_string(), v))
                    .collect(),
            }
        }
    }

    impl RecordSource for FakeSource {
        async fn load(&self, location: &str) -> SourceResult<TableData> {
            match self.tables.get(location) {
                Some(records) => Ok(TableData {
                    records: records.clone(),
                    headers: vec![],
                    encoding: "utf-8".to_string(),
                    delimiter: ',',
                }),
                None => Err(SourceError::Io(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    location.to_string(),
                ))),
            }
        }
    }

    /// Renderer that counts calls.
    #[derive(Default)]
    struct RecordingRenderer {
        renders: usize,
        resizes: usize,
    }

    impl Renderer for RecordingRenderer {
        fn render_graph(&mut self, _graph: &crate::models::GraphModel) {
            self.renders += 1;
        }
        fn render_distribution(&mut self, _distribution: &crate::models::Distribution) {
            self.renders += 1;
        }
        fn resize(&mut self) {
            self.resizes += 1;
        }
    }

    fn registry() -> SourceRegistry {
        SourceRegistry::new(vec![
            SourceEntry {
                id: "unmerged".into(),
                label: "未合併源".into(),
                location: "a.csv".into(),
            },
            SourceEntry {
                id: "merged".into(),
                label: "已合併源".into(),
                location: "b.csv".into(),
            },
        ])
    }

    fn table_a() -> Vec<Value> {
        vec![
            json!({ "韵字": "甲", "上古韵部": "魚", "中古韵部": "模" }),
            json!({ "韵字": "乙", "上古韵部": "魚", "中古韵部": "模" }),
        ]
    }

    fn table_b() -> Vec<Value> {
        vec![json!({ "韵字": "丙", "上古韵部": "侯", "中古韵部": "虞" })]
    }

    fn viewer(
        source: FakeSource,
    ) -> Viewer<FakeSource, RecordingRenderer, RecordingRenderer> {
        Viewer::new(
            source,
            registry(),
            FieldConfig::default(),
            RecordingRenderer::default(),
            RecordingRenderer::default(),
        )
    }

    #[tokio::test]
    async fn test_select_builds_and_renders_models() {
        let source = FakeSource::new(vec![("a.csv", table_a())]);
        let mut viewer = viewer(source);

        let outcome = viewer.select("unmerged").await.unwrap();
        assert_eq!(outcome, SelectOutcome::Applied);

        let models = viewer.models().unwrap();
        assert_eq!(models.graph.total_weight(), 2);
        assert_eq!(models.distribution.count_of("魚"), Some(2));
        assert_eq!(viewer.graph_renderer.renders, 1);
        assert_eq!(viewer.distribution_renderer.renders, 1);
    }

    #[tokio::test]
    async fn test_unknown_source_rejected() {
        let source = FakeSource::new(vec![]);
        let mut viewer = viewer(source);

        let result = viewer.select("mystery").await;
        assert!(matches!(result, Err(ViewerError::UnknownSource(_))));
    }

    #[tokio::test]
    async fn test_failed_load_keeps_previous_models() {
        // "merged" resolves to b.csv, which the source cannot read
        let source = FakeSource::new(vec![("a.csv", table_a())]);
        let mut viewer = viewer(source);

        viewer.select("unmerged").await.unwrap();
        let before = viewer.models().cloned();

        let result = viewer.select("merged").await;
        assert!(matches!(result, Err(ViewerError::Source(_))));
        assert_eq!(viewer.models().cloned(), before);
        // No extra render happened for the failed load
        assert_eq!(viewer.graph_renderer.renders, 1);
    }

    #[tokio::test]
    async fn test_superseded_load_is_dropped() {
        let source = FakeSource::new(vec![("a.csv", table_a()), ("b.csv", table_b())]);
        let mut viewer = viewer(source);

        // First load starts, then the user reselects before it finishes
        let first = viewer.begin_select("unmerged").unwrap();
        let second = viewer.begin_select("merged").unwrap();

        let first_table = viewer.source.load(&first.location).await.unwrap();
        let second_table = viewer.source.load(&second.location).await.unwrap();

        // The stale result arrives and must not be applied
        assert_eq!(viewer.apply(first, &first_table.records), SelectOutcome::Stale);
        assert!(viewer.models().is_none());

        assert_eq!(
            viewer.apply(second, &second_table.records),
            SelectOutcome::Applied
        );
        assert_eq!(viewer.models().unwrap().distribution.count_of("侯"), Some(1));
    }

    #[tokio::test]
    async fn test_reselection_is_idempotent() {
        let source = FakeSource::new(vec![("a.csv", table_a()), ("b.csv", table_b())]);
        let mut viewer = viewer(source);

        viewer.select("unmerged").await.unwrap();
        let fresh = viewer.models().cloned().unwrap();

        viewer.select("merged").await.unwrap();
        viewer.select("unmerged").await.unwrap();

        // A → B → A equals a fresh A: no cross-contamination
        assert_eq!(viewer.models().cloned().unwrap(), fresh);
    }

    #[tokio::test]
    async fn test_resize_refreshes_without_aggregating() {
        let source = FakeSource::new(vec![("a.csv", table_a())]);
        let mut viewer = viewer(source);

        viewer.select("unmerged").await.unwrap();
        let before = viewer.models().cloned();

        viewer.resize();
        viewer.resize();

        assert_eq!(viewer.graph_renderer.resizes, 2);
        assert_eq!(viewer.distribution_renderer.resizes, 2);
        // Same models, no re-render of data
        assert_eq!(viewer.models().cloned(), before);
        assert_eq!(viewer.graph_renderer.renders, 1);
    }

    #[test]
    fn test_registry_with_data_dir() {
        let registry = SourceRegistry::with_data_dir("data/");
        assert_eq!(registry.entries().len(), 2);
        let unmerged = registry.resolve("unmerged").unwrap();
        assert_eq!(unmerged.location, "data/未合併源.csv");
        assert!(registry.resolve("other").is_none());
    }
}
