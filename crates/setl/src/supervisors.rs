//! 🎬 *[camera pans across a dimly lit server room]*
//! 🎬 "In a world where sources fail without warning..."
//! 🎬 "One supervisor asked them all anyway."
//! 🎬 *[record scratch]* 🦆
//!
//! 📦 The Supervisor drives one end-to-end run: every registered extractor,
//! concurrently, each one fenced off so a failure (or a panic) becomes an empty
//! contribution. The outputs are concatenated in registration order and handed
//! to the loader exactly once, unless there is nothing to hand over.

use std::panic::AssertUnwindSafe;

use futures::FutureExt;
use futures::future::join_all;
use tracing::{error, info, warn};

use crate::common::SaleRecord;
use crate::extractors::{Extractor, ExtractorBackend};
use crate::loader::{LoadOutcome, Loader};
use crate::report::{ExtractionCount, RunReport};

/// 📦 Holds the lineup and the loader. Knows nothing about concrete sources.
#[derive(Debug)]
pub(crate) struct Supervisor {
    extractors: Vec<ExtractorBackend>,
    loader: Loader,
}

impl Supervisor {
    pub(crate) fn new(extractors: Vec<ExtractorBackend>, loader: Loader) -> Self {
        Self { extractors, loader }
    }

    /// 🛡️ Run one extractor behind a panic fence.
    async fn extract_isolated(extractor: &ExtractorBackend) -> Vec<SaleRecord> {
        match AssertUnwindSafe(extractor.extract()).catch_unwind().await {
            Ok(records) => records,
            Err(_) => {
                error!(extractor = extractor.source_type(), "💀 extractor panicked, counting it as empty");
                Vec::new()
            }
        }
    }

    /// 🚀 One run: extract everything, load once. Always returns a report.
    pub(crate) async fn run(&self) -> RunReport {
        if self.extractors.is_empty() {
            error!("💀 no extractors registered, skipping this run");
            return RunReport::no_extractors();
        }

        info!(extractors = self.extractors.len(), "🚀 starting extraction");
        let contributions = join_all(self.extractors.iter().map(Self::extract_isolated)).await;

        let mut extractions = Vec::with_capacity(contributions.len());
        let mut aggregate = Vec::with_capacity(contributions.iter().map(Vec::len).sum());
        for (extractor, records) in self.extractors.iter().zip(contributions) {
            extractions.push(ExtractionCount {
                source_type: extractor.source_type().to_string(),
                records: records.len(),
            });
            aggregate.extend(records);
        }

        let outcome = if aggregate.is_empty() {
            warn!("🤷 every extractor came back empty, nothing to load");
            LoadOutcome::Skipped
        } else {
            info!(records = aggregate.len(), "🚚 handing the aggregate to the loader");
            self.loader.load(&aggregate).await
        };

        RunReport {
            extractions,
            outcome: Some(outcome),
        }
    }
}
