use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::DashboardError;

/// Column headers of the orders table, in file order.
pub const ORDER_COLUMNS: [&str; 8] = [
    "OrderID",
    "Warehouse",
    "Customer",
    "Status",
    "Priority",
    "InvoiceNo",
    "UpdatedBy",
    "UpdatedAt",
];

/// One row of `master_orders.csv`.
///
/// Every field is kept as the raw string from the file. The file is trusted
/// as-is, so a status outside [`OrderStatus::ALL`] is carried through
/// untouched rather than rejected.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    #[serde(rename = "OrderID", default)]
    pub order_id: String,
    #[serde(rename = "Warehouse", default)]
    pub warehouse: String,
    #[serde(rename = "Customer", default)]
    pub customer: String,
    #[serde(rename = "Status", default)]
    pub status: String,
    #[serde(rename = "Priority", default)]
    pub priority: String,
    #[serde(rename = "InvoiceNo", default)]
    pub invoice_no: String,
    #[serde(rename = "UpdatedBy", default)]
    pub updated_by: String,
    #[serde(rename = "UpdatedAt", default)]
    pub updated_at: String,
}

impl Order {
    /// Field values in [`ORDER_COLUMNS`] order, for the exports.
    pub fn fields(&self) -> [&str; 8] {
        [
            &self.order_id,
            &self.warehouse,
            &self.customer,
            &self.status,
            &self.priority,
            &self.invoice_no,
            &self.updated_by,
            &self.updated_at,
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderStatus {
    Open,
    Processing,
    Shipped,
    Invoiced,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 4] = [
        OrderStatus::Open,
        OrderStatus::Processing,
        OrderStatus::Shipped,
        OrderStatus::Invoiced,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Open => "Open",
            OrderStatus::Processing => "Processing",
            OrderStatus::Shipped => "Shipped",
            OrderStatus::Invoiced => "Invoiced",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = DashboardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OrderStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| DashboardError::InvalidInput(format!("unknown status '{}'", s)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl Priority {
    pub const ALL: [Priority; 3] = [Priority::Low, Priority::Medium, Priority::High];

    pub fn as_str(self) -> &'static str {
        match self {
            Priority::Low => "Low",
            Priority::Medium => "Medium",
            Priority::High => "High",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
