//! 📦 The four tabular inputs, as typed rows.
//!
//! Customers and products are reference data: loaded once per run, never
//! mutated, only joined against. Orders and order details are transactional,
//! and order details drive everything (one canonical record per detail line).

use rust_decimal::Decimal;

use super::table::{CsvRow, CsvTable};

pub(crate) const CUSTOMER_ID: &str = "CustomerID";
pub(crate) const FIRST_NAME: &str = "FirstName";
pub(crate) const LAST_NAME: &str = "LastName";
pub(crate) const EMAIL: &str = "Email";
pub(crate) const PRODUCT_ID: &str = "ProductID";
pub(crate) const PRODUCT_NAME: &str = "ProductName";
pub(crate) const CATEGORY: &str = "Category";
pub(crate) const PRICE: &str = "Price";
pub(crate) const ORDER_ID: &str = "OrderID";
pub(crate) const QUANTITY: &str = "Quantity";
pub(crate) const TOTAL_PRICE: &str = "TotalPrice";
pub(crate) const ORDER_DATE: &str = "OrderDate";

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Customer {
    pub(crate) customer_id: i32,
    pub(crate) first_name: Option<String>,
    pub(crate) last_name: Option<String>,
    pub(crate) email: Option<String>,
}

impl Customer {
    pub(crate) fn from_row(row: CsvRow<'_>) -> Self {
        Self {
            customer_id: row.int(CUSTOMER_ID),
            first_name: row.text(FIRST_NAME),
            last_name: row.text(LAST_NAME),
            email: row.text(EMAIL),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Product {
    pub(crate) product_id: i32,
    pub(crate) product_name: Option<String>,
    pub(crate) category: Option<String>,
    pub(crate) price: Decimal,
}

impl Product {
    pub(crate) fn from_row(row: CsvRow<'_>) -> Self {
        Self {
            product_id: row.int(PRODUCT_ID),
            product_name: row.text(PRODUCT_NAME),
            category: row.text(CATEGORY),
            price: row.decimal(PRICE),
        }
    }
}

/// 🧾 A detailed-order row. `customer_id` is 0 unless the file happens to carry
/// a `CustomerID` column, in which case it is the direct order→customer link.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Order {
    pub(crate) order_id: i32,
    pub(crate) customer_id: i32,
    pub(crate) product_id: i32,
    pub(crate) quantity: i32,
    pub(crate) total_price: Decimal,
}

impl Order {
    pub(crate) fn from_row(row: CsvRow<'_>) -> Self {
        Self {
            order_id: row.int(ORDER_ID),
            customer_id: row.int(CUSTOMER_ID),
            product_id: row.int(PRODUCT_ID),
            quantity: row.int(QUANTITY),
            total_price: row.decimal(TOTAL_PRICE),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct OrderDetail {
    pub(crate) order_id: i32,
    pub(crate) product_id: i32,
    pub(crate) quantity: i32,
    pub(crate) total_price: Decimal,
}

impl OrderDetail {
    pub(crate) fn from_row(row: CsvRow<'_>) -> Self {
        Self {
            order_id: row.int(ORDER_ID),
            product_id: row.int(PRODUCT_ID),
            quantity: row.int(QUANTITY),
            total_price: row.decimal(TOTAL_PRICE),
        }
    }
}

/// 🔍 The two shapes `orders.csv` shows up in, plus "something else".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum OrdersLayout {
    /// `OrderID,ProductID,Quantity,TotalPrice`: parsed row by row.
    Detailed,
    /// `OrderID,CustomerID,OrderDate,Status`: skipped, order details tell the story instead.
    Summary,
    /// Neither. No orders, no error.
    Unrecognized,
}

impl OrdersLayout {
    /// 🎯 Product key + quantity wins over customer key + order date.
    pub(crate) fn detect(table: &CsvTable) -> Self {
        if table.has_column(PRODUCT_ID) && table.has_column(QUANTITY) {
            OrdersLayout::Detailed
        } else if table.has_column(CUSTOMER_ID) && table.has_column(ORDER_DATE) {
            OrdersLayout::Summary
        } else {
            OrdersLayout::Unrecognized
        }
    }

    /// 📦 Orders parsed under this layout. Only the detailed layout yields any.
    pub(crate) fn parse(self, table: &CsvTable) -> Vec<Order> {
        match self {
            OrdersLayout::Detailed => table.rows().map(Order::from_row).collect(),
            OrdersLayout::Summary | OrdersLayout::Unrecognized => Vec::new(),
        }
    }
}
