use std::io;
use std::path::{Path, PathBuf};

use prodex_core::{Catalog, Platform};
use rust_xlsxwriter::{Format, Workbook, Worksheet};

use crate::error::ExportError;
use crate::flatten::{flatten, Cell, GenericRow, Row, SpecializedRow};

pub const GENERIC_SHEET: &str = "Productos";
pub const SPECIALIZED_SHEET: &str = "Formato Coppel";

/// Longest string a single XLSX cell accepts.
pub const XLSX_MAX_CELL_CHARS: usize = 32_767;

/// Which files an export run produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportFormat {
    #[default]
    Xlsx,
    Csv,
    Both,
}

impl ExportFormat {
    fn extensions(self) -> &'static [&'static str] {
        match self {
            ExportFormat::Xlsx => &["xlsx"],
            ExportFormat::Csv => &["csv"],
            ExportFormat::Both => &["xlsx", "csv"],
        }
    }
}

/// `<platform>-productos-<store-identifier>.<ext>`
///
/// Characters that are unsafe in a file name are replaced with `-`.
#[must_use]
pub fn export_file_name(platform: Platform, store_identifier: &str, extension: &str) -> String {
    let store: String = store_identifier
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '-'
            }
        })
        .collect();
    format!("{platform}-productos-{store}.{extension}")
}

/// Writes the generic rows as delimited text with a header line.
///
/// # Errors
///
/// Returns [`ExportError::Csv`] if a record cannot be written, or
/// [`ExportError::Io`] if the final flush fails.
pub fn write_csv<W: io::Write>(writer: W, rows: &[GenericRow]) -> Result<(), ExportError> {
    let mut out = csv::Writer::from_writer(writer);
    out.write_record(GenericRow::HEADERS)?;
    for row in rows {
        out.write_record(row.cells().iter().map(Cell::to_field))?;
    }
    out.flush()?;
    Ok(())
}

/// Builds the two-sheet workbook: the generic sheet first, then the business
/// layout.
///
/// # Errors
///
/// Returns [`ExportError::Xlsx`] if a sheet or cell cannot be written.
pub fn build_workbook(
    generic: &[GenericRow],
    specialized: &[SpecializedRow],
) -> Result<Workbook, ExportError> {
    let mut workbook = Workbook::new();
    let header = Format::new().set_bold();

    write_sheet(workbook.add_worksheet(), GENERIC_SHEET, generic, &header)?;
    write_sheet(workbook.add_worksheet(), SPECIALIZED_SHEET, specialized, &header)?;

    Ok(workbook)
}

/// Writes the workbook to `path`.
///
/// # Errors
///
/// Returns [`ExportError::Xlsx`] if building or saving the workbook fails.
pub fn write_workbook(
    path: &Path,
    generic: &[GenericRow],
    specialized: &[SpecializedRow],
) -> Result<(), ExportError> {
    build_workbook(generic, specialized)?.save(path)?;
    Ok(())
}

/// Serializes the workbook in memory.
///
/// # Errors
///
/// Returns [`ExportError::Xlsx`] if building or serializing the workbook fails.
pub fn workbook_bytes(
    generic: &[GenericRow],
    specialized: &[SpecializedRow],
) -> Result<Vec<u8>, ExportError> {
    Ok(build_workbook(generic, specialized)?.save_to_buffer()?)
}

fn write_sheet<R: Row>(
    sheet: &mut Worksheet,
    name: &str,
    rows: &[R],
    header: &Format,
) -> Result<(), ExportError> {
    sheet.set_name(name)?;

    for (col, title) in (0u16..).zip(R::HEADERS) {
        sheet.write_string_with_format(0, col, *title, header)?;
    }

    for (row_idx, row) in (1u32..).zip(rows) {
        for (col, cell) in (0u16..).zip(row.cells()) {
            match cell {
                Cell::Text(text) => {
                    sheet.write_string(row_idx, col, truncate_cell(&text))?;
                }
                Cell::Number(value) => {
                    sheet.write_number(row_idx, col, value)?;
                }
                Cell::Blank => {}
            }
        }
    }
    Ok(())
}

fn truncate_cell(text: &str) -> &str {
    match text.char_indices().nth(XLSX_MAX_CELL_CHARS) {
        Some((cut, _)) => &text[..cut],
        None => text,
    }
}

/// Flattens the catalog and writes the requested files into `out_dir`,
/// returning the paths written in order.
///
/// # Errors
///
/// Returns [`ExportError::EmptyCatalog`] when there is nothing to export,
/// or the first I/O, CSV, or spreadsheet error.
pub fn export_catalog(
    catalog: &Catalog,
    format: ExportFormat,
    out_dir: &Path,
) -> Result<Vec<PathBuf>, ExportError> {
    if catalog.products.is_empty() {
        return Err(ExportError::EmptyCatalog);
    }

    let (generic, specialized) = flatten(&catalog.products);
    std::fs::create_dir_all(out_dir)?;

    let mut written = Vec::new();
    for ext in format.extensions() {
        let path = out_dir.join(export_file_name(
            catalog.platform,
            &catalog.store_identifier,
            ext,
        ));
        if *ext == "csv" {
            write_csv(std::fs::File::create(&path)?, &generic)?;
        } else {
            write_workbook(&path, &generic, &specialized)?;
        }
        tracing::info!(
            platform = %catalog.platform,
            store = %catalog.store_identifier,
            rows = generic.len(),
            path = %path.display(),
            "export written"
        );
        written.push(path);
    }
    Ok(written)
}

#[cfg(test)]
#[path = "writer_test.rs"]
mod tests;
