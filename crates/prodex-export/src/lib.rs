//! Turns an extracted [`prodex_core::Catalog`] into spreadsheet and CSV files.

mod error;
pub mod flatten;
pub mod text;
mod writer;

pub use error::ExportError;
pub use flatten::{flatten, Cell, GenericRow, Row, SpecializedRow, IMAGE_SLOTS};
pub use writer::{
    build_workbook, export_catalog, export_file_name, workbook_bytes, write_csv, write_workbook,
    ExportFormat, GENERIC_SHEET, SPECIALIZED_SHEET, XLSX_MAX_CELL_CHARS,
};
