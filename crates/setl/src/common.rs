//! 📦 Common data structures: the shapes every extractor speaks in the end.
//!
//! 🎬 Four CSV files, one staging table, one remote provider that may or may
//! not exist. They all disagree on column names. They all agree on one thing:
//! by the time a row leaves its extractor, it is a [`SaleRecord`].
//!
//! 🦆
//!
//! The [`AnalyticalSale`] is the rollup row, derived from staging by the loader.
//! Nobody writes it directly. Nobody should.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// 🏷️ Source tag for records that came out of the staging table.
pub const DATABASE_SOURCE: &str = "Database";

/// 🏷️ Source tag for records from the remote sales provider.
/// Analytical rows carrying this tag survive a rebuild.
pub const API_SOURCE: &str = "API";

/// 📦 The canonical sale. One per order-detail line, one per staged row,
/// one per remote payload item.
///
/// Keys are plain `i32` and `0` means "unresolved". The denormalized reference
/// attributes stay `None` when their key did not resolve; a missing reference
/// is never an error, just a blank.
///
/// ⚠️ `total_price` is authoritative. It is not checked against
/// `price * quantity`, and nobody recomputes it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct SaleRecord {
    /// 🔑 Unique within one run. The staging table's primary key.
    pub id: i64,
    pub customer_id: i32,
    pub order_id: i32,
    pub product_id: i32,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub product_name: Option<String>,
    pub category: Option<String>,
    /// 💰 unit price
    pub price: Decimal,
    pub quantity: i32,
    pub total_price: Decimal,
    /// 📅 may be synthesized when the source has no date of its own
    pub order_date: Option<DateTime<Utc>>,
    /// ⏱️ extraction time
    pub created_date: DateTime<Utc>,
    /// 🏷️ provenance: a file path, [`DATABASE_SOURCE`] or [`API_SOURCE`]. Never empty.
    pub source: String,
}

impl SaleRecord {
    /// 🏗️ A bare record with every optional thing blank and every measure zero.
    /// Extractors fill in what they know.
    pub fn new(id: i64, source: impl Into<String>, created_date: DateTime<Utc>) -> Self {
        Self {
            id,
            customer_id: 0,
            order_id: 0,
            product_id: 0,
            first_name: None,
            last_name: None,
            email: None,
            product_name: None,
            category: None,
            price: Decimal::ZERO,
            quantity: 0,
            total_price: Decimal::ZERO,
            order_date: None,
            created_date,
            source: source.into(),
        }
    }

    /// 🔗 Both reference keys resolved. Only these rows reach the analytical table.
    pub fn has_resolved_keys(&self) -> bool {
        self.customer_id > 0 && self.product_id > 0
    }
}

/// 📊 One row of the analytical rollup. No primary key; the table never had one.
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct AnalyticalSale {
    pub customer_id: i32,
    pub customer_name: String,
    pub product_id: i32,
    pub product_name: Option<String>,
    pub category: Option<String>,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub total_price: Decimal,
    pub sale_date: DateTime<Utc>,
    pub source: String,
}

impl AnalyticalSale {
    /// 🔄 Project a staged record into its rollup shape.
    ///
    /// Display name is `first + " " + last` with missing parts as empty strings,
    /// which is exactly what SQL `CONCAT` does with NULLs. The sale date falls
    /// back to the extraction time.
    pub fn from_staged(record: &SaleRecord) -> Self {
        Self {
            customer_id: record.customer_id,
            customer_name: format!(
                "{} {}",
                record.first_name.as_deref().unwrap_or_default(),
                record.last_name.as_deref().unwrap_or_default()
            ),
            product_id: record.product_id,
            product_name: record.product_name.clone(),
            category: record.category.clone(),
            quantity: record.quantity,
            unit_price: record.price,
            total_price: record.total_price,
            sale_date: record.order_date.unwrap_or(record.created_date),
            source: record.source.clone(),
        }
    }
}
