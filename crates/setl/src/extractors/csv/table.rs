//! 🧾 A forgiving CSV table.
//!
//! Header row required, everything else negotiable: unknown columns are
//! ignored, missing columns read as zero or blank, short rows are fine, and a
//! number that is not a number is a zero. Headers match case-insensitively.
//!
//! 🧠 Reads the whole file into memory. Reference tables and order details are
//! small enough that streaming would only add ceremony.

use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;

use anyhow::{Context, Result};
use csv_async::{AsyncReaderBuilder, ErrorKind, StringRecord};
use futures::StreamExt;
use rust_decimal::Decimal;
use tokio::io::AsyncRead;
use tracing::{trace, warn};

/// 📋 Header index plus every row that decoded.
#[derive(Debug, Default)]
pub(crate) struct CsvTable {
    columns: HashMap<String, usize>,
    rows: Vec<StringRecord>,
}

impl CsvTable {
    /// 📂 Open and read `path`. `Ok(None)` when the file is simply not there.
    pub(crate) async fn read(path: &Path) -> Result<Option<Self>> {
        let exists = tokio::fs::try_exists(path)
            .await
            .with_context(|| format!("💀 Could not check whether '{}' exists", path.display()))?;
        if !exists {
            warn!(file = %path.display(), "📂 file not found, treating it as empty");
            return Ok(None);
        }

        let file = tokio::fs::File::open(path)
            .await
            .with_context(|| format!("💀 The door to '{}' would not budge", path.display()))?;
        let table = Self::from_reader(file)
            .await
            .with_context(|| format!("💀 Could not read CSV '{}'", path.display()))?;
        Ok(Some(table))
    }

    /// 🔄 Parse any async reader. Undecodable rows are skipped; an I/O error
    /// ends the read and keeps what came before it.
    pub(crate) async fn from_reader<R>(reader: R) -> Result<Self>
    where
        R: AsyncRead + Unpin + Send,
    {
        let mut rdr = AsyncReaderBuilder::new()
            .has_headers(true)
            .delimiter(b',')
            .flexible(true)
            .create_reader(reader);

        let headers = rdr.headers().await.context("💀 Could not read the header row")?;
        let columns = headers
            .iter()
            .enumerate()
            .map(|(idx, name)| (normalize(name), idx))
            .collect::<HashMap<_, _>>();

        let mut rows = Vec::new();
        let mut records = rdr.records();
        while let Some(next) = records.next().await {
            match next {
                Ok(record) => rows.push(record),
                Err(err) if matches!(err.kind(), ErrorKind::Io(_)) => {
                    warn!(error = %err, kept = rows.len(), "💀 I/O error mid-file, keeping the rows read so far");
                    break;
                }
                Err(err) => {
                    warn!(error = %err, "⚠️ skipping a row that would not decode");
                }
            }
        }

        Ok(Self { columns, rows })
    }

    pub(crate) fn has_column(&self, name: &str) -> bool {
        self.columns.contains_key(&normalize(name))
    }

    pub(crate) fn len(&self) -> usize {
        self.rows.len()
    }

    pub(crate) fn rows(&self) -> impl Iterator<Item = CsvRow<'_>> {
        self.rows.iter().map(move |record| CsvRow {
            table: self,
            record,
        })
    }
}

fn normalize(header: &str) -> String {
    header.trim().trim_start_matches('\u{feff}').to_ascii_lowercase()
}

/// 🎯 One row, read by column name with zero-value defaults.
#[derive(Debug, Clone, Copy)]
pub(crate) struct CsvRow<'a> {
    table: &'a CsvTable,
    record: &'a StringRecord,
}

impl<'a> CsvRow<'a> {
    fn raw(&self, column: &str) -> Option<&'a str> {
        let idx = *self.table.columns.get(&normalize(column))?;
        self.record.get(idx).map(str::trim).filter(|cell| !cell.is_empty())
    }

    /// 📝 `None` for a missing column or an empty cell.
    pub(crate) fn text(&self, column: &str) -> Option<String> {
        self.raw(column).map(str::to_owned)
    }

    /// 🔢 `0` for missing, empty or unparseable.
    pub(crate) fn int(&self, column: &str) -> i32 {
        self.raw(column)
            .and_then(|cell| {
                cell.parse::<i32>()
                    .inspect_err(|_| trace!(column, cell, "🔢 not an integer, defaulting to 0"))
                    .ok()
            })
            .unwrap_or_default()
    }

    /// 💰 `0` for missing, empty or unparseable. Accepts plain and scientific notation.
    pub(crate) fn decimal(&self, column: &str) -> Decimal {
        self.raw(column)
            .and_then(|cell| {
                Decimal::from_str(cell)
                    .or_else(|_| Decimal::from_scientific(cell))
                    .inspect_err(|_| trace!(column, cell, "💰 not a decimal, defaulting to 0"))
                    .ok()
            })
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn table(text: &str) -> CsvTable {
        CsvTable::from_reader(text.as_bytes())
            .await
            .expect("💀 in-memory CSV should always read")
    }

    #[tokio::test]
    async fn the_one_where_headers_do_not_care_about_case_or_spaces() {
        let t = table(" productid ,ProductName, PRICE\n7,Lamp,19.99\n").await;
        assert!(t.has_column("ProductID"));
        assert!(t.has_column("Price"));
        let row = t.rows().next().expect("one row");
        assert_eq!(row.int("ProductID"), 7);
        assert_eq!(row.text("ProductName").as_deref(), Some("Lamp"));
        assert_eq!(row.decimal("Price"), Decimal::new(1999, 2));
    }

    #[tokio::test]
    async fn the_one_where_garbage_cells_become_zeroes() {
        let t = table("OrderID,Quantity,TotalPrice,Extra\nabc,,n/a,whatever\n12\n").await;
        assert_eq!(t.len(), 2, "a short row is still a row");
        let rows: Vec<_> = t.rows().collect();
        assert_eq!(rows[0].int("OrderID"), 0);
        assert_eq!(rows[0].int("Quantity"), 0);
        assert_eq!(rows[0].decimal("TotalPrice"), Decimal::ZERO);
        assert_eq!(rows[1].int("OrderID"), 12);
        assert_eq!(rows[1].text("Extra"), None);
        assert_eq!(rows[1].int("NotAColumn"), 0);
    }

    #[tokio::test]
    async fn the_one_where_a_missing_file_is_just_none() -> Result<()> {
        let dir = tempfile::tempdir()?;
        assert!(CsvTable::read(&dir.path().join("nope.csv")).await?.is_none());
        Ok(())
    }
}
