//! Spreadsheet row reader.
//!
//! The first row of a sheet (absolute row 0) is the header; each header cell
//! names the data cell in the same column. Cells are coerced to text:
//!
//! | cell kind | text |
//! |-----------|------|
//! | string    | verbatim |
//! | float     | truncated integer (`42.0` becomes `"42"`) |
//! | integer   | decimal |
//! | boolean   | `"true"` / `"false"` |
//! | anything else (blank, error, date) | `""` |
//!
//! Workbooks are parsed with calamine, so `.xlsx`, `.xls` and `.ods` all work.

use calamine::{open_workbook_auto, Data, Range, Reader, Sheets};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::fixture::Row;
use crate::result::{ProbeError, ProbeResult};

/// Sheet read when none is configured
pub const DEFAULT_SHEET: &str = "Sheet1";

/// Coerce one cell to its fixture text
#[must_use]
pub fn coerce_cell(cell: &Data) -> String {
    match cell {
        Data::String(s) => s.clone(),
        Data::Float(f) => (f.trunc() as i64).to_string(),
        Data::Int(i) => i.to_string(),
        Data::Bool(b) => b.to_string(),
        _ => String::new(),
    }
}

/// Non-blank header cells as `(column, name)`
fn header_columns(range: &Range<Data>) -> Vec<(u32, String)> {
    let Some((_, last_col)) = range.end() else {
        return Vec::new();
    };
    (0..=last_col)
        .filter_map(|col| {
            let name = range.get_value((0, col)).map(coerce_cell)?;
            (!name.trim().is_empty()).then_some((col, name))
        })
        .collect()
}

/// Map data row `row` of `range` through its header row.
///
/// # Errors
///
/// Returns [`ProbeError::RowNotFound`] for the header row, a row outside the
/// used range, or a row whose mapped cells are all blank.
pub fn row_from_range(range: &Range<Data>, sheet: &str, row: usize) -> ProbeResult<Row> {
    let not_found = || ProbeError::RowNotFound {
        sheet: sheet.to_string(),
        row,
    };

    if row == 0 {
        return Err(not_found());
    }
    let last_row = range.end().map(|(r, _)| r as usize).ok_or_else(not_found)?;
    if row > last_row {
        return Err(not_found());
    }
    let abs_row = u32::try_from(row).map_err(|_| not_found())?;

    let mapped = Row::from_pairs(header_columns(range).into_iter().map(|(col, name)| {
        let value = range
            .get_value((abs_row, col))
            .map(coerce_cell)
            .unwrap_or_default();
        (name, value)
    }));

    if mapped.is_blank() {
        return Err(not_found());
    }
    Ok(mapped)
}

/// Every non-blank data row of `range`, in sheet order
#[must_use]
pub fn rows_from_range(range: &Range<Data>, sheet: &str) -> Vec<Row> {
    let last_row = range.end().map_or(0, |(r, _)| r as usize);
    (1..=last_row)
        .filter_map(|row| row_from_range(range, sheet, row).ok())
        .collect()
}

/// Reader over one workbook
///
/// The workbook handle is released when the reader is dropped.
pub struct SheetReader {
    path: PathBuf,
    workbook: Sheets<BufReader<File>>,
}

impl std::fmt::Debug for SheetReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SheetReader")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl SheetReader {
    /// Open a workbook
    ///
    /// # Errors
    ///
    /// Returns [`ProbeError::CellRead`] when the file is missing or not a
    /// readable workbook.
    pub fn open(path: impl AsRef<Path>) -> ProbeResult<Self> {
        let path = path.as_ref();
        let workbook = open_workbook_auto(path).map_err(|e| ProbeError::CellRead {
            message: format!("{}: {e}", path.display()),
        })?;
        info!(path = %path.display(), "opened fixture workbook");
        Ok(Self {
            path: path.to_path_buf(),
            workbook,
        })
    }

    /// Workbook path
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Sheet names in workbook order
    #[must_use]
    pub fn sheet_names(&self) -> Vec<String> {
        self.workbook.sheet_names()
    }

    /// `requested` when the workbook has it, else the first sheet.
    ///
    /// # Errors
    ///
    /// Returns [`ProbeError::SheetNotFound`] when the workbook has no sheets.
    pub fn resolve_sheet(&self, requested: &str) -> ProbeResult<String> {
        let names = self.sheet_names();
        if names.iter().any(|n| n == requested) {
            return Ok(requested.to_string());
        }
        match names.first() {
            Some(first) => {
                warn!(requested, fallback = %first, "sheet not found, using first sheet");
                Ok(first.clone())
            }
            None => Err(ProbeError::SheetNotFound {
                sheet: requested.to_string(),
                available: names,
            }),
        }
    }

    fn range(&mut self, sheet: &str) -> ProbeResult<Range<Data>> {
        let names = self.sheet_names();
        if !names.iter().any(|n| n == sheet) {
            return Err(ProbeError::SheetNotFound {
                sheet: sheet.to_string(),
                available: names,
            });
        }
        self.workbook
            .worksheet_range(sheet)
            .map_err(|e| ProbeError::CellRead {
                message: format!("sheet '{sheet}': {e}"),
            })
    }

    /// Read data row `row` (zero-based, row 0 is the header) of `sheet`
    ///
    /// # Errors
    ///
    /// `SheetNotFound`, `RowNotFound` or `CellRead`.
    pub fn read_row(&mut self, sheet: &str, row: usize) -> ProbeResult<Row> {
        let range = self.range(sheet)?;
        let mapped = row_from_range(&range, sheet, row)?;
        debug!(sheet, row, columns = mapped.len(), "read fixture row");
        Ok(mapped)
    }

    /// Every non-blank data row of `sheet`
    ///
    /// # Errors
    ///
    /// `SheetNotFound` or `CellRead`.
    pub fn read_all_rows(&mut self, sheet: &str) -> ProbeResult<Vec<Row>> {
        let range = self.range(sheet)?;
        Ok(rows_from_range(&range, sheet))
    }

    /// First data row that carries a username and a password
    ///
    /// # Errors
    ///
    /// `RowNotFound` (reported against row 1) when no row qualifies.
    pub fn first_row_with_credentials(&mut self, sheet: &str) -> ProbeResult<Row> {
        self.read_all_rows(sheet)?
            .into_iter()
            .find(Row::has_credentials)
            .ok_or_else(|| ProbeError::RowNotFound {
                sheet: sheet.to_string(),
                row: 1,
            })
    }

    /// Row `row` when given, else the first row with credentials
    ///
    /// # Errors
    ///
    /// Same as [`Self::read_row`] and [`Self::first_row_with_credentials`].
    pub fn login_row(&mut self, sheet: &str, row: Option<usize>) -> ProbeResult<Row> {
        match row {
            Some(row) => self.read_row(sheet, row),
            None => {
                let found = self.first_row_with_credentials(sheet)?;
                debug!(sheet, "using first row with credentials");
                Ok(found)
            }
        }
    }
}
