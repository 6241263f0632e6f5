use thiserror::Error;

/// Errors raised by the order store, token registry, editor and exports.
///
/// Request-time access failures are not represented here: an unknown or
/// expired token simply resolves to guest access.
#[derive(Debug, Error)]
pub enum DashboardError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("spreadsheet export failed: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),

    #[error("PDF export failed: {0}")]
    Pdf(#[from] printpdf::Error),

    #[error("template error: {0}")]
    Template(String),

    #[error("Order not found: {0}")]
    OrderNotFound(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),
}

pub type Result<T> = std::result::Result<T, DashboardError>;
