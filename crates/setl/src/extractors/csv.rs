//! 📂 CsvExtractor: four files walk into a directory.
//!
//! 🎬 `customers.csv` and `products.csv` are the reference cast. `orders.csv`
//! shows up in one of two costumes (see [`entities::OrdersLayout`]).
//! `order_details.csv` is the lead: every one of its rows becomes exactly one
//! canonical record, enriched with whatever the reference cast can offer.
//!
//! ⚠️ Nothing here is fatal. A missing directory or a missing file is "nothing
//! to extract", a file that fails mid-read is treated as empty, and a cell that
//! is not a number is a zero. The one loud failure mode is an error log line.

use std::path::{Path, PathBuf};

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use tracing::{debug, error, info, warn};

use crate::app_config::CsvExtractorConfig;
use crate::common::SaleRecord;
use crate::extractors::Extractor;
use crate::rng::RunRng;

mod enrich;
mod entities;
mod table;

use enrich::{EnrichmentContext, IdAllocator, ReferenceData};
use entities::{Customer, Order, OrderDetail, OrdersLayout, Product};
use table::CsvTable;

pub(crate) const CUSTOMERS_FILE: &str = "customers.csv";
pub(crate) const PRODUCTS_FILE: &str = "products.csv";
pub(crate) const ORDERS_FILE: &str = "orders.csv";
pub(crate) const ORDER_DETAILS_FILE: &str = "order_details.csv";

/// 📂 Reads the four sales files from one directory and joins them.
#[derive(Debug, Clone)]
pub(crate) struct CsvExtractor {
    data_directory: PathBuf,
    config: CsvExtractorConfig,
}

impl CsvExtractor {
    pub(crate) fn new(data_directory: PathBuf, config: CsvExtractorConfig) -> Self {
        Self {
            data_directory,
            config,
        }
    }

    /// 📖 Read one file into a table. Absent, unreadable or broken all come back
    /// as `None`; only the log tells them apart.
    async fn load_table(&self, file_name: &str) -> Option<CsvTable> {
        let path = self.data_directory.join(file_name);
        match CsvTable::read(&path).await {
            Ok(table) => table,
            Err(err) => {
                error!(file = %path.display(), "💀 could not read CSV, treating it as empty: {:#}", err);
                None
            }
        }
    }

    async fn load_rows<T>(&self, file_name: &str, parse: fn(table::CsvRow<'_>) -> T) -> Vec<T> {
        self.load_table(file_name)
            .await
            .map(|table| table.rows().map(parse).collect())
            .unwrap_or_default()
    }

    async fn load_orders(&self) -> Vec<Order> {
        let Some(table) = self.load_table(ORDERS_FILE).await else {
            return Vec::new();
        };
        let layout = OrdersLayout::detect(&table);
        match layout {
            OrdersLayout::Detailed => debug!(rows = table.len(), "🧾 detailed orders layout"),
            OrdersLayout::Summary => {
                info!(rows = table.len(), "🧾 summary orders layout, rebuilding orders from order details instead")
            }
            OrdersLayout::Unrecognized => warn!("🤷 orders file has an unrecognized header, ignoring it"),
        }
        layout.parse(&table)
    }

    async fn fetch(&self) -> Result<Vec<SaleRecord>> {
        let exists = tokio::fs::try_exists(&self.data_directory).await.unwrap_or(false);
        if !exists {
            warn!(directory = %self.data_directory.display(), "📂 data directory not found, nothing to extract");
            return Ok(Vec::new());
        }

        let customers = self.load_rows(CUSTOMERS_FILE, Customer::from_row).await;
        let products = self.load_rows(PRODUCTS_FILE, Product::from_row).await;
        let orders = self.load_orders().await;
        let details = self.load_rows(ORDER_DETAILS_FILE, OrderDetail::from_row).await;
        info!(
            customers = customers.len(),
            products = products.len(),
            orders = orders.len(),
            order_details = details.len(),
            "📚 CSV inputs loaded"
        );

        let reference = ReferenceData::new(customers, products, &orders);
        let mut ctx = EnrichmentContext {
            rng: RunRng::new(self.config.seed),
            ids: IdAllocator::new(self.config.max_id_probes),
            extracted_at: Utc::now(),
            source: details_source(&self.data_directory),
        };
        Ok(enrich::enrich(&reference, &details, &mut ctx))
    }
}

fn details_source(data_directory: &Path) -> String {
    data_directory.join(ORDER_DETAILS_FILE).display().to_string()
}

#[async_trait]
impl Extractor for CsvExtractor {
    fn source_type(&self) -> &'static str {
        "CSV"
    }

    async fn extract(&self) -> Vec<SaleRecord> {
        match self.fetch().await {
            Ok(records) => {
                info!(extractor = self.source_type(), count = records.len(), "📦 extracted");
                records
            }
            Err(err) => {
                error!(extractor = self.source_type(), "💀 extraction failed: {:#}", err);
                Vec::new()
            }
        }
    }
}
