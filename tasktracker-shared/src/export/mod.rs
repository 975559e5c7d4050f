/// Task and report export formats
///
/// Pure functions of their input; nothing here touches a store.

pub mod csv;
pub mod pdf;

pub use self::csv::{parse_csv, to_csv, ExportedTask};
pub use self::pdf::to_pdf_summary;

/// Errors produced while encoding or decoding an export
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("CSV error: {0}")]
    Csv(#[from] ::csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Input is valid CSV but not an export of ours
    #[error("Unrecognized export format: {0}")]
    Format(String),
}
