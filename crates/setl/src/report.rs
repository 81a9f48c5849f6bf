//! 📊 RunReport: what one run did, in a table comfy enough to read at 3am.

use comfy_table::{Cell, CellAlignment, ContentArrangement, Table, presets::UTF8_FULL};

use crate::loader::LoadOutcome;

/// 📦 One extractor's contribution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionCount {
    pub source_type: String,
    pub records: usize,
}

/// 📊 The receipt for one pipeline run.
///
/// `outcome` is `None` when the run stopped before the load step was even
/// considered (no extractors registered).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub extractions: Vec<ExtractionCount>,
    pub outcome: Option<LoadOutcome>,
}

impl RunReport {
    pub(crate) fn no_extractors() -> Self {
        Self {
            extractions: Vec::new(),
            outcome: None,
        }
    }

    pub fn total_records(&self) -> usize {
        self.extractions.iter().map(|e| e.records).sum()
    }

    /// 💀 True only when the load step ran and failed.
    pub fn load_failed(&self) -> bool {
        self.outcome.is_some_and(|outcome| outcome.is_failure())
    }

    fn outcome_label(&self) -> String {
        match self.outcome {
            None => "no extractors registered".to_string(),
            Some(LoadOutcome::Skipped) => "nothing to load".to_string(),
            Some(LoadOutcome::Failed) => "load failed".to_string(),
            Some(LoadOutcome::Loaded(stats)) if stats.collapsed > 0 => format!(
                "loaded: {} staged, {} projected, {} collapsed on shared ids",
                stats.staged, stats.projected, stats.collapsed
            ),
            Some(LoadOutcome::Loaded(stats)) => {
                format!("loaded: {} staged, {} projected", stats.staged, stats.projected)
            }
        }
    }

    /// 🎨 One row per extractor, a total, and the load outcome.
    pub fn render_table(&self) -> String {
        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic)
            .set_header(vec!["Source", "Records"]);

        for extraction in &self.extractions {
            table.add_row(vec![
                Cell::new(&extraction.source_type),
                Cell::new(extraction.records).set_alignment(CellAlignment::Right),
            ]);
        }
        table.add_row(vec![
            Cell::new("Total"),
            Cell::new(self.total_records()).set_alignment(CellAlignment::Right),
        ]);
        table.add_row(vec![Cell::new("Load"), Cell::new(self.outcome_label())]);
        table.to_string()
    }
}
