//! # Previously, on setl...
//!
//! 🎬 The staging table was supposed to be Postgres. Then someone wanted to run
//! the tests on a plane. This module is what got built at 30,000 feet.
//!
//! `InMemoryStore` keeps both tables behind an `Arc<Mutex<...>>` so clones share
//! state: the loader writes, the database extractor reads, and the test peeks
//! at the end. Same semantics as the Postgres store, minus the network.
//!
//! 🦆
//!
//! ⚠️ Gone when the process exits. That is the feature.

use std::collections::BTreeMap;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use tracing::trace;

use crate::common::{AnalyticalSale, SaleRecord};
use crate::stores::{Store, last_write_wins};

/// 📦 The two tables, side by side. Staging is keyed by id, so ordering by id is free.
#[derive(Debug, Default)]
pub(crate) struct InMemoryTables {
    pub(crate) staging: BTreeMap<i64, SaleRecord>,
    pub(crate) analytical: Vec<AnalyticalSale>,
}

/// 🗄️ A store that never forgets, until the process does.
#[derive(Debug, Default, Clone)]
pub(crate) struct InMemoryStore {
    tables: Arc<Mutex<InMemoryTables>>,
}

impl InMemoryStore {
    /// 🔍 Snapshot of staging, ordered by id. For assertions and curiosity.
    #[cfg(test)]
    pub(crate) async fn staged(&self) -> Vec<SaleRecord> {
        self.tables.lock().await.staging.values().cloned().collect()
    }

    /// 🔍 Snapshot of the analytical rollup, in insertion order.
    #[cfg(test)]
    pub(crate) async fn analytical(&self) -> Vec<AnalyticalSale> {
        self.tables.lock().await.analytical.clone()
    }

    /// 🧪 Seed the rollup directly, as if a previous load had left it behind.
    #[cfg(test)]
    pub(crate) async fn seed_analytical(&self, rows: Vec<AnalyticalSale>) {
        self.tables.lock().await.analytical.extend(rows);
    }
}

#[async_trait]
impl Store for InMemoryStore {
    async fn upsert_staging(&self, records: &[SaleRecord], _batch_size: usize) -> Result<u64> {
        let deduped = last_write_wins(records);
        let mut tables = self.tables.lock().await;
        for record in &deduped {
            // 🔄 insert or overwrite, every field, no merge
            tables.staging.insert(record.id, (*record).clone());
        }
        trace!(rows = deduped.len(), "📥 staged in memory");
        Ok(deduped.len() as u64)
    }

    async fn rebuild_analytical(&self, preserve_source: &str) -> Result<u64> {
        let mut tables = self.tables.lock().await;
        tables.analytical.retain(|row| row.source == preserve_source);

        let regenerated: Vec<AnalyticalSale> = tables
            .staging
            .values()
            .filter(|record| record.has_resolved_keys())
            .map(AnalyticalSale::from_staged)
            .collect();
        let count = regenerated.len() as u64;
        tables.analytical.extend(regenerated);
        Ok(count)
    }

    async fn staging_since(&self, cutoff: DateTime<Utc>) -> Result<Vec<SaleRecord>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .staging
            .values()
            .filter(|record| record.created_date >= cutoff)
            .cloned()
            .collect())
    }
}
