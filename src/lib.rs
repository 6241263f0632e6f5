/*!
# Warehouse Orders Dashboard

A small single-tenant dashboard for tracking warehouse orders, built in Rust.

## Overview

Orders live in a flat CSV file that is read in full, filtered in memory and
shown as a table with per-status counters. Access is gated by the query
string: an owner key grants full rights, a bearer token grants the role and
company recorded for it, and everyone else is a read-only guest. Editors can
change one order at a time; by default those edits stay in the server's
in-memory working copy.

## Architecture

### Storage
- **store**: the orders table (`master_orders.csv`), read-all/overwrite-all,
  seeded with 150 demo orders on first run
- **tokens**: the bearer token table (`tokens.csv`), issue and validate

### Request handling
- **access**: derives owner/client/guest access from `admin` and `token`
- **dashboard**: filter options, AND-combined filters, KPI counts and the
  single-order editor
- **downloader**: XLSX and PDF exports of the current table
- **app**: axum routes and handlebars pages (feature `web`)

### Support
- **config**: startup configuration from flags and environment
- **error**: the crate error type
- **order**, **timestamp**, **faq**: data model, timestamp format, FAQ text

## Routes

- `/` - Dashboard page
- `/faq` - FAQ page
- `/api/orders` - Filtered orders, options and KPIs as JSON
- `/orders/update` - Editor form (editor or owner)
- `/tokens` - Token issuance form (owner)
- `/export/xlsx`, `/export/pdf` - Downloads
*/

pub mod access;
#[cfg(feature = "web")]
pub mod app;
pub mod config;
pub mod dashboard;
pub mod downloader;
pub mod error;
pub mod faq;
pub mod order;
pub mod store;
pub mod timestamp;
pub mod tokens;

/// Re-export the types most callers need
pub use access::{Access, Mode};
pub use config::Config;
pub use dashboard::{apply_update, FilterOptions, Kpis, OrderFilter, OrderUpdate};
pub use error::{DashboardError, Result};
pub use order::{Order, OrderStatus, Priority};
pub use store::RecordStore;
pub use tokens::{Role, Token, TokenRegistry};
