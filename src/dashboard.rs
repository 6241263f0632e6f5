use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeSet;

use crate::error::{DashboardError, Result};
use crate::order::{Order, OrderStatus};
use crate::timestamp::format_timestamp;
use crate::tokens::Role;

/// Distinct values present in the table, sorted, for the multi-select filters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FilterOptions {
    pub warehouses: Vec<String>,
    pub statuses: Vec<String>,
    pub priorities: Vec<String>,
}

impl FilterOptions {
    pub fn from_orders(orders: &[Order]) -> Self {
        fn distinct<'a>(values: impl Iterator<Item = &'a String>) -> Vec<String> {
            values.cloned().collect::<BTreeSet<_>>().into_iter().collect()
        }

        FilterOptions {
            warehouses: distinct(orders.iter().map(|o| &o.warehouse)),
            statuses: distinct(orders.iter().map(|o| &o.status)),
            priorities: distinct(orders.iter().map(|o| &o.priority)),
        }
    }
}

/// Active filters on the orders table.
///
/// A `None` column keeps its default selection of every value present, which
/// matches all rows. `Some(vec![])` selects nothing and therefore matches no
/// rows. All criteria are combined with AND.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderFilter {
    pub warehouses: Option<Vec<String>>,
    pub statuses: Option<Vec<String>>,
    pub priorities: Option<Vec<String>>,
    /// Case-sensitive substring of OrderID; ignored when empty.
    pub search: String,
}

impl OrderFilter {
    pub fn matches(&self, order: &Order) -> bool {
        fn selected(choice: &Option<Vec<String>>, value: &str) -> bool {
            match choice {
                None => true,
                Some(values) => values.iter().any(|v| v == value),
            }
        }

        selected(&self.warehouses, &order.warehouse)
            && selected(&self.statuses, &order.status)
            && selected(&self.priorities, &order.priority)
            && (self.search.is_empty() || order.order_id.contains(&self.search))
    }

    pub fn apply<'a>(&self, orders: &'a [Order]) -> Vec<&'a Order> {
        orders.iter().filter(|order| self.matches(order)).collect()
    }
}

/// Order counts per status over the full, unfiltered table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Kpis {
    pub open: usize,
    pub processing: usize,
    pub shipped: usize,
    pub invoiced: usize,
}

impl Kpis {
    pub fn compute(orders: &[Order]) -> Self {
        let mut kpis = Kpis::default();
        for order in orders {
            match order.status.parse::<OrderStatus>() {
                Ok(OrderStatus::Open) => kpis.open += 1,
                Ok(OrderStatus::Processing) => kpis.processing += 1,
                Ok(OrderStatus::Shipped) => kpis.shipped += 1,
                Ok(OrderStatus::Invoiced) => kpis.invoiced += 1,
                Err(_) => {}
            }
        }
        kpis
    }

    pub fn count(&self, status: OrderStatus) -> usize {
        match status {
            OrderStatus::Open => self.open,
            OrderStatus::Processing => self.processing,
            OrderStatus::Shipped => self.shipped,
            OrderStatus::Invoiced => self.invoiced,
        }
    }
}

/// Editor form submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderUpdate {
    pub order_id: String,
    pub status: OrderStatus,
    pub invoice_no: String,
}

/// Apply `update` to the first order whose OrderID matches exactly.
///
/// Sets Status, InvoiceNo, UpdatedBy (the editor's role) and UpdatedAt and
/// leaves every other row alone. Nothing changes when no order matches.
pub fn apply_update<'a>(
    orders: &'a mut [Order],
    update: &OrderUpdate,
    role: Role,
    now: DateTime<Utc>,
) -> Result<&'a Order> {
    let order = orders
        .iter_mut()
        .find(|order| order.order_id == update.order_id)
        .ok_or_else(|| DashboardError::OrderNotFound(update.order_id.clone()))?;

    order.status = update.status.to_string();
    order.invoice_no = update.invoice_no.clone();
    order.updated_by = role.to_string();
    order.updated_at = format_timestamp(now);
    Ok(order)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::seed_orders;
    use chrono::TimeZone;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn order(id: &str, warehouse: &str, status: &str, priority: &str) -> Order {
        Order {
            order_id: id.to_string(),
            warehouse: warehouse.to_string(),
            customer: "Customer-1".to_string(),
            status: status.to_string(),
            priority: priority.to_string(),
            updated_by: "seed".to_string(),
            ..Order::default()
        }
    }

    fn sample() -> Vec<Order> {
        vec![
            order("VIC-1000", "VIC", "Open", "High"),
            order("VIC-1001", "VIC", "Shipped", "Low"),
            order("NSW-1000", "NSW", "Open", "Medium"),
            order("NSW-1010", "NSW", "Invoiced", "High"),
            order("SA-1000", "SA", "Processing", "Medium"),
        ]
    }

    fn ids(rows: Vec<&Order>) -> Vec<&str> {
        rows.into_iter().map(|o| o.order_id.as_str()).collect()
    }

    fn strings(values: &[&str]) -> Option<Vec<String>> {
        Some(values.iter().map(|v| v.to_string()).collect())
    }

    #[test]
    fn options_are_sorted_and_distinct() {
        let options = FilterOptions::from_orders(&sample());
        assert_eq!(options.warehouses, vec!["NSW", "SA", "VIC"]);
        assert_eq!(
            options.statuses,
            vec!["Invoiced", "Open", "Processing", "Shipped"]
        );
        assert_eq!(options.priorities, vec!["High", "Low", "Medium"]);
    }

    #[test]
    fn default_filter_shows_everything() {
        let orders = sample();
        assert_eq!(OrderFilter::default().apply(&orders).len(), orders.len());
    }

    #[test]
    fn filters_combine_with_and() {
        let orders = sample();
        let filter = OrderFilter {
            warehouses: strings(&["VIC", "NSW"]),
            statuses: strings(&["Open", "Invoiced"]),
            priorities: strings(&["High"]),
            search: String::new(),
        };
        assert_eq!(ids(filter.apply(&orders)), vec!["VIC-1000", "NSW-1010"]);

        let filter = OrderFilter {
            search: "10".to_string(),
            ..filter
        };
        assert_eq!(ids(filter.apply(&orders)), vec!["VIC-1000", "NSW-1010"]);

        let filter = OrderFilter {
            search: "1010".to_string(),
            ..filter
        };
        assert_eq!(ids(filter.apply(&orders)), vec!["NSW-1010"]);
    }

    #[test]
    fn filter_matches_per_column_membership_on_seeded_table() {
        let orders = seed_orders(&mut StdRng::seed_from_u64(3), Utc::now());
        let filter = OrderFilter {
            warehouses: strings(&["SA"]),
            statuses: strings(&["Open", "Shipped"]),
            priorities: None,
            search: "-10".to_string(),
        };
        let expected: Vec<&Order> = orders
            .iter()
            .filter(|o| o.warehouse == "SA")
            .filter(|o| o.status == "Open" || o.status == "Shipped")
            .filter(|o| o.order_id.contains("-10"))
            .collect();
        assert_eq!(filter.apply(&orders), expected);
    }

    #[test]
    fn empty_selection_yields_nothing() {
        let orders = sample();
        for filter in [
            OrderFilter {
                warehouses: Some(vec![]),
                ..OrderFilter::default()
            },
            OrderFilter {
                statuses: Some(vec![]),
                ..OrderFilter::default()
            },
            OrderFilter {
                priorities: Some(vec![]),
                ..OrderFilter::default()
            },
        ] {
            assert!(filter.apply(&orders).is_empty());
        }
    }

    #[test]
    fn search_is_case_sensitive() {
        let orders = sample();
        let filter = OrderFilter {
            search: "vic".to_string(),
            ..OrderFilter::default()
        };
        assert!(filter.apply(&orders).is_empty());
    }

    #[test]
    fn kpis_ignore_filters_and_unknown_statuses() {
        let mut orders = sample();
        orders.push(order("QLD-1", "QLD", "Lost", "Low"));

        let kpis = Kpis::compute(&orders);
        assert_eq!(
            kpis,
            Kpis {
                open: 2,
                processing: 1,
                shipped: 1,
                invoiced: 1
            }
        );
        assert_eq!(kpis.count(OrderStatus::Open), 2);
    }

    #[test]
    fn update_changes_exactly_one_record() {
        let mut orders = sample();
        let before = orders.clone();
        let now = Utc.with_ymd_and_hms(2026, 10, 18, 9, 30, 0).unwrap();

        let update = OrderUpdate {
            order_id: "NSW-1000".to_string(),
            status: OrderStatus::Shipped,
            invoice_no: "INV-77".to_string(),
        };
        let updated = apply_update(&mut orders, &update, Role::Editor, now).unwrap();
        assert_eq!(updated.status, "Shipped");

        for (i, (old, new)) in before.iter().zip(&orders).enumerate() {
            if i == 2 {
                assert_eq!(new.status, "Shipped");
                assert_eq!(new.invoice_no, "INV-77");
                assert_eq!(new.updated_by, "editor");
                assert_eq!(new.updated_at, "2026-10-18T09:30:00Z");
                assert_eq!(new.customer, old.customer);
                assert_eq!(new.priority, old.priority);
            } else {
                assert_eq!(old, new);
            }
        }
    }

    #[test]
    fn update_of_missing_order_reports_not_found() {
        let mut orders = sample();
        let before = orders.clone();
        let update = OrderUpdate {
            order_id: "VIC-9999".to_string(),
            status: OrderStatus::Invoiced,
            invoice_no: "INV-1".to_string(),
        };

        let err = apply_update(&mut orders, &update, Role::Owner, Utc::now()).unwrap_err();
        assert!(matches!(err, DashboardError::OrderNotFound(id) if id == "VIC-9999"));
        assert_eq!(orders, before);
    }

    #[test]
    fn update_requires_exact_id() {
        let mut orders = sample();
        let update = OrderUpdate {
            order_id: "VIC-100".to_string(),
            status: OrderStatus::Invoiced,
            invoice_no: String::new(),
        };
        assert!(apply_update(&mut orders, &update, Role::Owner, Utc::now()).is_err());
    }
}
