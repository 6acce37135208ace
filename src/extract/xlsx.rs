use calamine::{Data, Reader, open_workbook_auto};
use std::path::Path;
use tracing::debug;

use super::{DocumentFormat, ExtractionStrategy};
use crate::Result;

const CELL_SEPARATOR: &str = " | ";

/// Excel workbooks: sheet by sheet, one line per non-blank row
pub struct XlsxExtractor;

impl ExtractionStrategy for XlsxExtractor {
    #[inline]
    fn extract(&self, path: &Path) -> Result<String> {
        let mut workbook = open_workbook_auto(path).map_err(|e| DocumentFormat::Xlsx.failure(e))?;

        let mut text = String::new();
        for sheet_name in workbook.sheet_names() {
            let range = workbook
                .worksheet_range(&sheet_name)
                .map_err(|e| DocumentFormat::Xlsx.failure(e))?;

            debug!(
                "Reading sheet '{}' ({} rows)",
                sheet_name,
                range.get_size().0
            );

            text.push_str("\n--- Sheet: ");
            text.push_str(&sheet_name);
            text.push_str(" ---\n");

            // Ranges start at the first used column; rows still read from column A
            let leading_blanks = range.start().map_or(0, |(_, column)| column as usize);

            for row in range.rows() {
                if let Some(line) = row_text(leading_blanks, row) {
                    text.push_str(&line);
                    text.push('\n');
                }
            }
        }

        Ok(text)
    }
}

/// Render a row as separator-joined cell values, or `None` if every cell is blank.
///
/// `leading_blanks` empty cells are emitted first for the columns left of the
/// sheet's used range.
pub(super) fn row_text(leading_blanks: usize, row: &[Data]) -> Option<String> {
    let cells: Vec<String> = std::iter::repeat_n(String::new(), leading_blanks)
        .chain(row.iter().map(cell_text))
        .collect();

    if cells.iter().all(|cell| cell.trim().is_empty()) {
        return None;
    }

    Some(cells.join(CELL_SEPARATOR))
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::Bool(true) => "True".to_string(),
        Data::Bool(false) => "False".to_string(),
        other => other.to_string(),
    }
}
