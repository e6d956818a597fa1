use std::fs;
use std::path::Path;

use log::info;

use super::model::{VcgCollection, VcgTable};
use crate::config::ConvertConfig;
use crate::error::{Result, VcgError};

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Read every input named by `config`, in ascending index order.
///
/// Stops at the first failure: a missing file, a malformed or empty table, or
/// a table whose column count differs from the first one.
pub fn load_collection(config: &ConvertConfig) -> Result<VcgCollection> {
    let delimiter = config.delimiter_byte();
    let mut vcg = VcgCollection::with_capacity(config.count);

    for index in 1..=config.count {
        let path = config.input_path(index);
        let table = load_table(&path, delimiter)?;

        if let Some(expected) = vcg.columns() {
            if table.columns != expected {
                return Err(VcgError::ColumnMismatch {
                    path,
                    expected,
                    found: table.columns,
                });
            }
        }

        info!("{}: {:?}", path.display(), table.shape());
        vcg.push(table);
    }

    Ok(vcg)
}

/// Parse one delimited text file into a rectangular table.
///
/// Everything from a `#` to the end of its line is a comment, and lines left
/// blank are skipped; whitespace around fields is ignored. Every other field
/// must parse as `f64` and every row must have as many fields as the first.
pub fn load_table(path: &Path, delimiter: u8) -> Result<VcgTable> {
    let text = fs::read_to_string(path).map_err(|source| VcgError::opening(path, source))?;
    let stripped = strip_comments(&text);

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .quoting(false)
        .trim(csv::Trim::All)
        .from_reader(stripped.as_bytes());

    let mut values = Vec::new();
    let mut columns = 0usize;
    let mut rows = 0usize;

    for result in reader.records() {
        let record = result.map_err(|e| csv_error(path, e))?;
        let line = record.position().map_or(0, |p| p.line());

        // whitespace-only line
        if record.len() == 1 && record[0].is_empty() {
            continue;
        }

        if rows == 0 {
            columns = record.len();
        } else if record.len() != columns {
            return Err(VcgError::Malformed {
                path: path.to_path_buf(),
                line,
                reason: format!("{} fields, expected {columns}", record.len()),
            });
        }

        for (j, field) in record.iter().enumerate() {
            let v = field.parse::<f64>().map_err(|_| VcgError::Malformed {
                path: path.to_path_buf(),
                line,
                reason: format!("field {}: '{field}' is not a number", j + 1),
            })?;
            values.push(v);
        }
        rows += 1;
    }

    if rows == 0 {
        return Err(VcgError::EmptyTable {
            path: path.to_path_buf(),
        });
    }

    Ok(VcgTable::new(rows, columns, values))
}

// -- helpers --

/// Cut every line at its first `#`, keeping line numbers intact.
fn strip_comments(text: &str) -> String {
    text.lines()
        .map(|line| line.split_once('#').map_or(line, |(data, _)| data))
        .collect::<Vec<_>>()
        .join("\n")
}

fn csv_error(path: &Path, err: csv::Error) -> VcgError {
    let line = err.position().map_or(0, |p| p.line());
    match err.into_kind() {
        csv::ErrorKind::Io(source) => VcgError::Io {
            path: path.to_path_buf(),
            source,
        },
        other => VcgError::Malformed {
            path: path.to_path_buf(),
            line,
            reason: format!("{other:?}"),
        },
    }
}
