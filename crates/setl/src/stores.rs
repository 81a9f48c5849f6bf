//! 🗄️ Stores: where the staging table and the analytical rollup live.
//!
//! 🚰 The loader writes here, the database extractor reads from here, and
//! neither of them knows (or cares) whether "here" is a Postgres cluster or a
//! `BTreeMap` behind a mutex.
//!
//! 🧠 Pattern, same as every backend family in this crate:
//! trait → concrete impls (`InMemoryStore`, `PostgresStore`) → `StoreBackend` enum.
//! Add a store, add a variant, add a match arm. The loader never changes.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::app_config::StoreConfig;
use crate::common::SaleRecord;

mod in_mem;
mod postgres;

pub(crate) use in_mem::InMemoryStore;
pub(crate) use postgres::PostgresStore;
pub use postgres::PostgresStoreConfig;

/// 📦 A durable home for canonical records and their rollup.
///
/// # Contract 📜
/// - `upsert_staging`: insert by `id`; on conflict, every column takes the
///   incoming value. Duplicate ids inside one call collapse to the last one.
/// - `rebuild_analytical`: drop every analytical row whose source is not
///   `preserve_source`, then regenerate from staging rows with both keys resolved.
/// - `staging_since`: staged rows created at or after `cutoff`, ordered by id.
///
/// Connections (where there are any) are acquired per call and released before returning.
#[async_trait]
pub(crate) trait Store: std::fmt::Debug {
    /// 📥 Returns the number of rows written.
    async fn upsert_staging(&self, records: &[SaleRecord], batch_size: usize) -> Result<u64>;
    /// 🔄 Returns the number of analytical rows regenerated.
    async fn rebuild_analytical(&self, preserve_source: &str) -> Result<u64>;
    async fn staging_since(&self, cutoff: DateTime<Utc>) -> Result<Vec<SaleRecord>>;
}

/// 🎭 The many faces of a Store.
///
/// Cheap to clone: both variants are handles onto shared state (an `Arc`'d
/// table set, or a connection pool), so the loader and the database extractor
/// can each hold one.
#[derive(Debug, Clone)]
pub(crate) enum StoreBackend {
    InMemory(InMemoryStore),
    Postgres(PostgresStore),
}

impl StoreBackend {
    /// 🏗️ Build the configured store. Postgres connects lazily, so this only
    /// fails on a connection string that does not parse.
    pub(crate) fn from_config(config: &StoreConfig) -> Result<Self> {
        match config {
            StoreConfig::InMemory => Ok(StoreBackend::InMemory(InMemoryStore::default())),
            StoreConfig::Postgres(pg) => Ok(StoreBackend::Postgres(PostgresStore::new(pg.clone())?)),
        }
    }
}

#[async_trait]
impl Store for StoreBackend {
    async fn upsert_staging(&self, records: &[SaleRecord], batch_size: usize) -> Result<u64> {
        match self {
            StoreBackend::InMemory(store) => store.upsert_staging(records, batch_size).await,
            StoreBackend::Postgres(store) => store.upsert_staging(records, batch_size).await,
        }
    }

    async fn rebuild_analytical(&self, preserve_source: &str) -> Result<u64> {
        match self {
            StoreBackend::InMemory(store) => store.rebuild_analytical(preserve_source).await,
            StoreBackend::Postgres(store) => store.rebuild_analytical(preserve_source).await,
        }
    }

    async fn staging_since(&self, cutoff: DateTime<Utc>) -> Result<Vec<SaleRecord>> {
        match self {
            StoreBackend::InMemory(store) => store.staging_since(cutoff).await,
            StoreBackend::Postgres(store) => store.staging_since(cutoff).await,
        }
    }
}

/// 🧹 Collapse duplicate ids to their last occurrence, keeping first-seen order.
///
/// Postgres refuses to touch the same row twice in one `INSERT .. ON CONFLICT`,
/// and last-write-wins has to hold inside a single load too.
pub(crate) fn last_write_wins(records: &[SaleRecord]) -> Vec<&SaleRecord> {
    let mut position_of_id = std::collections::HashMap::with_capacity(records.len());
    let mut deduped: Vec<&SaleRecord> = Vec::with_capacity(records.len());
    for record in records {
        match position_of_id.get(&record.id) {
            Some(&slot) => deduped[slot] = record,
            None => {
                position_of_id.insert(record.id, deduped.len());
                deduped.push(record);
            }
        }
    }
    deduped
}

/// 👯 Two records in one aggregate that claimed the same id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct IdCollision<'a> {
    pub(crate) id: i64,
    /// source of the record that wins (the later one)
    pub(crate) kept_source: &'a str,
    pub(crate) replaced_source: &'a str,
}

/// 🔍 Every id reused inside `records`, one entry per record that [`last_write_wins`]
/// will throw away, in input order.
pub(crate) fn id_collisions(records: &[SaleRecord]) -> Vec<IdCollision<'_>> {
    let mut latest_by_id: std::collections::HashMap<i64, &SaleRecord> =
        std::collections::HashMap::with_capacity(records.len());
    let mut collisions = Vec::new();
    for record in records {
        if let Some(previous) = latest_by_id.insert(record.id, record) {
            collisions.push(IdCollision {
                id: record.id,
                kept_source: record.source.as_str(),
                replaced_source: previous.source.as_str(),
            });
        }
    }
    collisions
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::API_SOURCE;

    #[test]
    fn the_one_where_two_sources_want_the_same_id() {
        let now = Utc::now();
        let records = vec![
            SaleRecord::new(1002, "Data/order_details.csv", now),
            SaleRecord::new(7, "Data/order_details.csv", now),
            SaleRecord::new(1002, API_SOURCE, now),
        ];

        let collisions = id_collisions(&records);
        assert_eq!(
            collisions,
            vec![IdCollision {
                id: 1002,
                kept_source: API_SOURCE,
                replaced_source: "Data/order_details.csv",
            }]
        );
        assert_eq!(last_write_wins(&records).len(), records.len() - collisions.len());
    }

    #[test]
    fn the_one_where_nobody_shares() {
        let now = Utc::now();
        let records = vec![SaleRecord::new(1, "a.csv", now), SaleRecord::new(2, "a.csv", now)];
        assert!(id_collisions(&records).is_empty());
    }

    #[test]
    fn the_one_where_the_last_duplicate_keeps_the_first_seat() {
        let now = Utc::now();
        let mut first = SaleRecord::new(1, "a.csv", now);
        first.quantity = 1;
        let other = SaleRecord::new(2, "a.csv", now);
        let mut second = SaleRecord::new(1, "API", now);
        second.quantity = 9;

        let records = vec![first, other, second];
        let deduped = last_write_wins(&records);

        assert_eq!(deduped.len(), 2);
        assert_eq!(deduped[0].id, 1);
        assert_eq!(deduped[0].quantity, 9);
        assert_eq!(deduped[0].source, "API");
        assert_eq!(deduped[1].id, 2);
    }

    #[test]
    fn the_one_where_in_memory_is_the_default_home() {
        let store = StoreBackend::from_config(&StoreConfig::default())
            .expect("💀 the in-memory store cannot fail to exist");
        assert!(matches!(store, StoreBackend::InMemory(_)));
    }
}
