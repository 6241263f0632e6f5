use chrono::{DateTime, Utc};
use rand::distributions::{Distribution, WeightedIndex};
use rand::Rng;
use std::fs::{create_dir_all, File};
use std::mem::take;
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::order::{Order, OrderStatus, Priority, ORDER_COLUMNS};
use crate::timestamp::format_timestamp;

/// Warehouse codes used when seeding a fresh orders file.
pub const SEED_WAREHOUSES: [&str; 3] = ["VIC", "NSW", "SA"];
pub const SEED_ROWS_PER_WAREHOUSE: usize = 50;

const STATUS_WEIGHTS: [u32; 4] = [4, 3, 2, 1];
const PRIORITY_WEIGHTS: [u32; 3] = [2, 6, 2];

/// Flat order table backed by a CSV file.
#[derive(Debug, Clone)]
pub struct RecordStore {
    path: PathBuf,
}

impl RecordStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        RecordStore { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the whole table. Missing trailing values come back as empty strings.
    pub fn load(&self) -> Result<Vec<Order>> {
        let rows = read_columns(&self.path, &ORDER_COLUMNS)?;
        Ok(rows
            .into_iter()
            .map(|mut row| Order {
                order_id: take(&mut row[0]),
                warehouse: take(&mut row[1]),
                customer: take(&mut row[2]),
                status: take(&mut row[3]),
                priority: take(&mut row[4]),
                invoice_no: take(&mut row[5]),
                updated_by: take(&mut row[6]),
                updated_at: take(&mut row[7]),
            })
            .collect())
    }

    /// Overwrite the file with `orders`.
    pub fn persist(&self, orders: &[Order]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                create_dir_all(parent)?;
            }
        }

        let file = File::create(&self.path)?;
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);

        writer.write_record(ORDER_COLUMNS)?;
        for order in orders {
            writer.serialize(order)?;
        }
        writer.flush()?;
        Ok(())
    }

    /// Write synthetic orders when the file does not exist yet.
    ///
    /// Returns the number of rows written, or `None` if an existing file was
    /// left alone.
    pub fn seed_if_missing(&self) -> Result<Option<usize>> {
        if self.path.exists() {
            return Ok(None);
        }
        let orders = seed_orders(&mut rand::thread_rng(), Utc::now());
        self.persist(&orders)?;
        log::info!(
            "Seeded {} orders into {}",
            orders.len(),
            self.path.display()
        );
        Ok(Some(orders.len()))
    }
}

/// Read the CSV file at `path`, returning each row's values in `columns` order.
///
/// Columns are matched by header name so reordered files still load. A column
/// the header lacks, or a short row, yields an empty string.
pub(crate) fn read_columns(path: &Path, columns: &[&str]) -> Result<Vec<Vec<String>>> {
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_path(path)?;

    let headers = reader.headers()?.clone();
    let positions: Vec<Option<usize>> = columns
        .iter()
        .map(|column| headers.iter().position(|h| h.trim() == *column))
        .collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(
            positions
                .iter()
                .map(|position| {
                    position
                        .and_then(|i| record.get(i))
                        .unwrap_or_default()
                        .to_string()
                })
                .collect(),
        );
    }
    Ok(rows)
}

/// Build the demo table: 50 orders for each of the seed warehouses.
///
/// Status is drawn Open 40% / Processing 30% / Shipped 20% / Invoiced 10%,
/// priority Low 20% / Medium 60% / High 20%.
pub fn seed_orders<R: Rng + ?Sized>(rng: &mut R, now: DateTime<Utc>) -> Vec<Order> {
    // Weights are fixed and non-zero.
    let status_dist = WeightedIndex::new(STATUS_WEIGHTS).unwrap();
    let priority_dist = WeightedIndex::new(PRIORITY_WEIGHTS).unwrap();
    let updated_at = format_timestamp(now);

    let mut orders = Vec::with_capacity(SEED_WAREHOUSES.len() * SEED_ROWS_PER_WAREHOUSE);
    for warehouse in SEED_WAREHOUSES {
        for i in 0..SEED_ROWS_PER_WAREHOUSE {
            orders.push(Order {
                order_id: format!("{}-{}", warehouse, 1000 + i),
                warehouse: warehouse.to_string(),
                customer: format!("Customer-{}", i + 1),
                status: OrderStatus::ALL[status_dist.sample(rng)].to_string(),
                priority: Priority::ALL[priority_dist.sample(rng)].to_string(),
                invoice_no: String::new(),
                updated_by: "seed".to_string(),
                updated_at: updated_at.clone(),
            });
        }
    }
    orders
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn seeds_150_orders_with_known_categories() {
        let dir = tempdir().unwrap();
        let store = RecordStore::new(dir.path().join("data").join("master_orders.csv"));

        assert_eq!(store.seed_if_missing().unwrap(), Some(150));
        let orders = store.load().unwrap();
        assert_eq!(orders.len(), 150);

        for warehouse in SEED_WAREHOUSES {
            let count = orders.iter().filter(|o| o.warehouse == warehouse).count();
            assert_eq!(count, SEED_ROWS_PER_WAREHOUSE);
        }

        let statuses: Vec<&str> = OrderStatus::ALL.iter().map(|s| s.as_str()).collect();
        let priorities: Vec<&str> = Priority::ALL.iter().map(|p| p.as_str()).collect();
        for order in &orders {
            assert!(statuses.contains(&order.status.as_str()));
            assert!(priorities.contains(&order.priority.as_str()));
            assert_eq!(order.updated_by, "seed");
            assert!(order.invoice_no.is_empty());
        }
        assert_eq!(orders[0].order_id, "VIC-1000");
        assert_eq!(orders[0].customer, "Customer-1");
        assert_eq!(orders[149].order_id, "SA-1049");
    }

    #[test]
    fn existing_file_is_not_reseeded() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("master_orders.csv");
        fs::write(
            &path,
            "OrderID,Warehouse,Customer,Status,Priority,InvoiceNo,UpdatedBy,UpdatedAt\n\
             X-1,QLD,Acme,Open,Low,,ops,2026-01-01T00:00:00Z\n",
        )
        .unwrap();

        let store = RecordStore::new(&path);
        assert_eq!(store.seed_if_missing().unwrap(), None);
        let orders = store.load().unwrap();
        assert_eq!(orders.len(), 1);
        assert_eq!(orders[0].warehouse, "QLD");
    }

    #[test]
    fn missing_values_load_as_empty_strings() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("master_orders.csv");
        fs::write(
            &path,
            "OrderID,Warehouse,Customer,Status,Priority,InvoiceNo,UpdatedBy,UpdatedAt\n\
             A-1,VIC,,Shipped,High,,,\n\
             A-2,NSW\n",
        )
        .unwrap();

        let orders = RecordStore::new(&path).load().unwrap();
        assert_eq!(orders.len(), 2);
        assert_eq!(orders[0].customer, "");
        assert_eq!(orders[0].invoice_no, "");
        assert_eq!(orders[1].warehouse, "NSW");
        assert_eq!(orders[1].status, "");
        assert_eq!(orders[1].updated_at, "");
    }

    #[test]
    fn persist_overwrites_whole_file() {
        let dir = tempdir().unwrap();
        let store = RecordStore::new(dir.path().join("master_orders.csv"));
        let mut orders = seed_orders(&mut StdRng::seed_from_u64(7), Utc::now());
        store.persist(&orders).unwrap();

        orders.truncate(2);
        orders[1].invoice_no = "INV-1, \"rush\"".to_string();
        store.persist(&orders).unwrap();

        let reloaded = store.load().unwrap();
        assert_eq!(reloaded, orders);
    }

    #[test]
    fn empty_table_still_writes_header() {
        let dir = tempdir().unwrap();
        let store = RecordStore::new(dir.path().join("master_orders.csv"));
        store.persist(&[]).unwrap();

        let contents = fs::read_to_string(store.path()).unwrap();
        assert_eq!(contents.trim_end(), ORDER_COLUMNS.join(","));
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn seeding_is_deterministic_for_a_fixed_rng() {
        let now = Utc::now();
        let a = seed_orders(&mut StdRng::seed_from_u64(42), now);
        let b = seed_orders(&mut StdRng::seed_from_u64(42), now);
        assert_eq!(a, b);
    }

    #[test]
    fn columns_are_read_by_header_name() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("table.csv");
        fs::write(&path, "b,extra,a\n2,x,1\n4\n").unwrap();

        let rows = read_columns(&path, &["a", "b", "c"]).unwrap();
        assert_eq!(
            rows,
            vec![
                vec!["1".to_string(), "2".to_string(), String::new()],
                vec![String::new(), "4".to_string(), String::new()],
            ]
        );
    }
}
