//! 🚚 Loader: makes the aggregate durable, then rebuilds the rollup.
//!
//! Two steps, in order, against whatever [`StoreBackend`] it was handed:
//! 1. upsert every record into staging by `id` (last write wins, no merge)
//! 2. rebuild the analytical table, keeping the remote provider's rows
//!
//! `load` never returns an error. Whatever breaks is logged here, with its
//! whole context chain, and comes back as [`LoadOutcome::Failed`].

use anyhow::Result;
use tracing::{error, info, warn};

use crate::common::{API_SOURCE, SaleRecord};
use crate::stores::{Store, StoreBackend, id_collisions};

/// 📊 What a successful load touched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadStats {
    /// rows written to staging (inserted or overwritten)
    pub staged: u64,
    /// analytical rows regenerated from staging
    pub projected: u64,
    /// records dropped because a later record in the same aggregate reused their id
    pub collapsed: u64,
}

/// 🎯 The whole story of one load call, in one word (and sometimes two numbers).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    Loaded(LoadStats),
    /// 🤷 nothing to load, the loader was never called
    Skipped,
    /// 💀 see the logs
    Failed,
}

impl LoadOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, LoadOutcome::Failed)
    }
}

#[derive(Debug, Clone)]
pub(crate) struct Loader {
    store: StoreBackend,
    batch_size: usize,
}

impl Loader {
    pub(crate) fn new(store: StoreBackend, batch_size: usize) -> Self {
        Self { store, batch_size }
    }

    /// 👯 Ids reused across extractors (a CSV id landing on an API id, say) collapse
    /// to the last record. Each loser gets one warn line naming both sources.
    fn report_collisions(records: &[SaleRecord]) -> u64 {
        let collisions = id_collisions(records);
        for collision in &collisions {
            warn!(
                id = collision.id,
                kept_source = collision.kept_source,
                replaced_source = collision.replaced_source,
                "👯 two records share an id, the later one wins"
            );
        }
        collisions.len() as u64
    }

    async fn try_load(&self, records: &[SaleRecord]) -> Result<LoadStats> {
        let collapsed = Self::report_collisions(records);
        let staged = self.store.upsert_staging(records, self.batch_size).await?;
        let projected = self.store.rebuild_analytical(API_SOURCE).await?;
        Ok(LoadStats {
            staged,
            projected,
            collapsed,
        })
    }

    /// 🚚 Upsert, then rebuild. Total: failures come back as [`LoadOutcome::Failed`].
    pub(crate) async fn load(&self, records: &[SaleRecord]) -> LoadOutcome {
        if records.is_empty() {
            return LoadOutcome::Skipped;
        }
        match self.try_load(records).await {
            Ok(stats) => {
                info!(
                    staged = stats.staged,
                    projected = stats.projected,
                    collapsed = stats.collapsed,
                    "✅ load complete"
                );
                LoadOutcome::Loaded(stats)
            }
            Err(err) => {
                error!(records = records.len(), "💀 load failed: {:#}", err);
                LoadOutcome::Failed
            }
        }
    }
}
