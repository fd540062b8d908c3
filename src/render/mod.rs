//! Rendering boundary: the contract between the engine and whatever draws.
//!
//! The engine never draws. It hands data-only models to a [`Renderer`],
//! one session per visual, and the renderer does whatever it likes with
//! them (a browser chart, a JSON dump, a test recorder). Render calls are
//! fire-and-forget; nothing flows back into the engine.
//!
//! The one formatting concern the engine does own is the provenance
//! tooltip text: [`format_provenance`] is the single place that turns an
//! edge's label sequence into display text, so every consumer shows the
//! same thing.

use std::io::Write;

use crate::models::{Distribution, GraphModel};

/// A rendering session for one visual.
///
/// Implementations own their canvas and state; the engine only ever calls
/// in. `resize` is a layout-only refresh and must not trigger any
/// re-aggregation upstream.
pub trait Renderer {
    /// Draw (or redraw) the flow diagram.
    fn render_graph(&mut self, graph: &GraphModel);

    /// Draw (or redraw) the proportion chart.
    fn render_distribution(&mut self, distribution: &Distribution);

    /// Refresh layout after a viewport change. No data changes hands.
    fn resize(&mut self) {}
}

/// Join provenance labels into tooltip text.
///
/// Uses a full-width comma, order preserved, duplicates retained: a
/// repeated character means multiple records collapsed into the edge,
/// and the tooltip is where that shows.
pub fn format_provenance(labels: &[String]) -> String {
    labels.join("、")
}

/// Renderer that writes the models as pretty JSON.
///
/// This is what the CLI hands its output through.
pub struct JsonRenderer<W: Write> {
    out: W,
}

impl<W: Write> JsonRenderer<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    /// Consume the renderer and hand the writer back.
    pub fn into_inner(self) -> W {
        self.out
    }

    fn write_value(&mut self, value: &impl serde::Serialize) {
        // Fire-and-forget contract: a broken pipe is not the engine's
        // problem to report.
        if let Ok(json) = serde_json::to_string_pretty(value) {
            let _ = writeln!(self.out, "{}", json);
        }
    }
}

impl<W: Write> Renderer for JsonRenderer<W> {
    fn render_graph(&mut self, graph: &GraphModel) {
        self.write_value(graph);
    }

    fn render_distribution(&mut self, distribution: &Distribution) {
        self.write_value(distribution);
    }
}
