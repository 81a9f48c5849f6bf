//! 🚀 setl: a batch sales ETL.
//!
//! 🎬 Three sources, one canonical record, one staging table, one rollup.
//! `run` wires the configured store, extractors and loader together and drives
//! exactly one extract → enrich → load cycle.
//!
//! 🦆

pub mod app_config;
pub mod common;
mod extractors;
mod loader;
pub mod report;
mod rng;
mod stores;
mod supervisors;

use anyhow::{Context, Result};
use tracing::info;

use crate::app_config::AppConfig;
use crate::extractors::ExtractorBackend;
use crate::loader::Loader;
use crate::stores::StoreBackend;
use crate::supervisors::Supervisor;

pub use crate::loader::{LoadOutcome, LoadStats};
pub use crate::report::RunReport;
pub use crate::stores::PostgresStoreConfig;

/// 🚀 One pipeline run.
///
/// Only wiring can fail here (a store config that does not parse, an HTTP
/// client that will not build). Once the run starts, every failure is logged
/// where it happens and shows up in the returned [`RunReport`].
pub async fn run(app_config: AppConfig) -> Result<RunReport> {
    let store = StoreBackend::from_config(&app_config.store).context("💀 Could not set up the configured store")?;
    let extractors = ExtractorBackend::from_config(&app_config, &store).context("💀 Could not build the extractor lineup")?;
    let loader = Loader::new(store, app_config.etl.batch_size);

    info!(
        data_directory = %app_config.etl.data_directory.display(),
        batch_size = app_config.etl.batch_size,
        "🚀 pipeline run starting"
    );
    let report = Supervisor::new(extractors, loader).run().await;
    info!(records = report.total_records(), "🏁 pipeline run finished");
    Ok(report)
}
