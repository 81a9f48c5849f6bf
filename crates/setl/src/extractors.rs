//! 🔌 Extractors: where sales records come from.
//!
//! 🚰 Three taps: a directory of CSV files, the staging table itself, and a
//! remote provider that may be a real endpoint or a well-rehearsed understudy.
//! Each one pours [`SaleRecord`]s. None of them knows the others exist.
//!
//! 🎭 The supervisor holds a `Vec<ExtractorBackend>` and never a concrete type,
//! so a fourth tap is one variant and one match arm away.
//!
//! ⚠️ `extract` never fails from the caller's point of view. Each extractor does
//! its fallible work in a private `fetch`, and the trait impl turns any error
//! into an empty result plus one loud log line. Callers get counts, not stack traces.

use async_trait::async_trait;

use crate::app_config::{AppConfig, ExtractorKind};
use crate::common::SaleRecord;
use crate::stores::StoreBackend;

pub(crate) mod api;
pub(crate) mod csv;
pub(crate) mod database;

pub(crate) use api::ApiExtractor;
pub(crate) use csv::CsvExtractor;
pub(crate) use database::DatabaseExtractor;

/// 🚰 A source of canonical sale records.
///
/// # Contract 📜
/// - `extract` returns everything this source has for one run.
/// - A missing source is an empty result, never an error.
/// - A failing source is also an empty result, logged where it failed.
/// - No extractor mutates state another extractor can see.
#[async_trait]
pub(crate) trait Extractor: std::fmt::Debug + Send + Sync {
    /// 🏷️ Short provenance label, for logs and the run report.
    fn source_type(&self) -> &'static str;

    /// 📦 Pull this source's records. Total: errors come back as an empty Vec.
    async fn extract(&self) -> Vec<SaleRecord>;
}

/// 🎭 The many faces of an Extractor.
#[derive(Debug)]
pub(crate) enum ExtractorBackend {
    Csv(CsvExtractor),
    Database(DatabaseExtractor),
    Api(ApiExtractor),
    /// 🧨 Test-only: blows up mid-extract, for exercising the supervisor's panic fence.
    #[cfg(test)]
    Tripwire,
}

impl ExtractorBackend {
    /// 🏗️ Build one extractor per configured kind, in configured order.
    ///
    /// The database extractor gets a clone of the shared store handle; that
    /// clone is a pool (or an `Arc`), not an open connection.
    pub(crate) fn from_config(config: &AppConfig, store: &StoreBackend) -> anyhow::Result<Vec<Self>> {
        config
            .etl
            .extractors
            .iter()
            .map(|kind| {
                Ok(match kind {
                    ExtractorKind::Csv => ExtractorBackend::Csv(CsvExtractor::new(
                        config.etl.data_directory.clone(),
                        config.csv.clone(),
                    )),
                    ExtractorKind::Database => ExtractorBackend::Database(DatabaseExtractor::new(
                        store.clone(),
                        config.database.clone(),
                    )),
                    ExtractorKind::Api => ExtractorBackend::Api(ApiExtractor::new(config.api.clone())?),
                })
            })
            .collect()
    }
}

#[async_trait]
impl Extractor for ExtractorBackend {
    fn source_type(&self) -> &'static str {
        match self {
            ExtractorBackend::Csv(e) => e.source_type(),
            ExtractorBackend::Database(e) => e.source_type(),
            ExtractorBackend::Api(e) => e.source_type(),
            #[cfg(test)]
            ExtractorBackend::Tripwire => "Tripwire",
        }
    }

    async fn extract(&self) -> Vec<SaleRecord> {
        match self {
            ExtractorBackend::Csv(e) => e.extract().await,
            ExtractorBackend::Database(e) => e.extract().await,
            ExtractorBackend::Api(e) => e.extract().await,
            #[cfg(test)]
            ExtractorBackend::Tripwire => panic!("🧨 tripwire pulled"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stores::InMemoryStore;

    #[test]
    fn the_one_where_the_config_decides_the_lineup() -> anyhow::Result<()> {
        let mut config = AppConfig::default();
        config.etl.extractors = vec![ExtractorKind::Api, ExtractorKind::Csv];
        let store = StoreBackend::InMemory(InMemoryStore::default());

        let lineup = ExtractorBackend::from_config(&config, &store)?;
        let types: Vec<_> = lineup.iter().map(|e| e.source_type()).collect();
        assert_eq!(types, vec!["API", "CSV"]);
        Ok(())
    }

    #[test]
    fn the_one_where_nobody_is_invited() -> anyhow::Result<()> {
        let mut config = AppConfig::default();
        config.etl.extractors.clear();
        let store = StoreBackend::InMemory(InMemoryStore::default());
        assert!(ExtractorBackend::from_config(&config, &store)?.is_empty());
        Ok(())
    }
}
