use std::fs::{self, File};
use std::io::{self, BufReader, Cursor};
use std::path::{Path, PathBuf};

use log::debug;
use npyz::{NpyFile, NpyWriter, WriteOptions, WriterBuilder};

use super::model::{VcgCollection, VcgTable};
use crate::config::Layout;
use crate::error::{Result, VcgError};

pub const LENGTHS_FILE: &str = "vcg_length.npy";
pub const VCG_FILE: &str = "vcg.npy";

/// Final locations of a committed pair of output files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPaths {
    pub lengths: PathBuf,
    pub vcg: PathBuf,
}

impl OutputPaths {
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            lengths: dir.join(LENGTHS_FILE),
            vcg: dir.join(VCG_FILE),
        }
    }
}

// ---------------------------------------------------------------------------
// Writing
// ---------------------------------------------------------------------------

/// Write `vcg_length.npy` and `vcg.npy` into `dir`, replacing existing files.
///
/// Both arrays are encoded and written under `.tmp` names first; the final
/// names only appear once both writes succeeded.
pub fn write_outputs(
    vcg: &VcgCollection,
    dir: &Path,
    layout: Layout,
    pad_value: f64,
) -> Result<OutputPaths> {
    let paths = OutputPaths::in_dir(dir);
    fs::create_dir_all(dir).map_err(|source| VcgError::Write {
        path: dir.to_path_buf(),
        source,
    })?;

    let lengths = encode_lengths(&vcg.lengths()).map_err(|source| VcgError::Write {
        path: paths.lengths.clone(),
        source,
    })?;
    let tables = encode_tables(vcg, layout, pad_value).map_err(|source| VcgError::Write {
        path: paths.vcg.clone(),
        source,
    })?;

    let staged = [(paths.lengths.clone(), lengths), (paths.vcg.clone(), tables)];
    let mut written: Vec<(PathBuf, PathBuf)> = Vec::with_capacity(staged.len());
    for (final_path, bytes) in staged {
        let tmp_path = tmp_path_for(&final_path);
        if let Err(source) = fs::write(&tmp_path, &bytes) {
            discard(&tmp_path);
            for (tmp, _) in &written {
                discard(tmp);
            }
            return Err(VcgError::Write {
                path: tmp_path,
                source,
            });
        }
        debug!("staged {} ({} bytes)", tmp_path.display(), bytes.len());
        written.push((tmp_path, final_path));
    }

    let mut pending = written.into_iter();
    while let Some((tmp_path, final_path)) = pending.next() {
        if let Err(source) = fs::rename(&tmp_path, &final_path) {
            discard(&tmp_path);
            for (tmp, _) in pending {
                discard(&tmp);
            }
            return Err(VcgError::Write {
                path: final_path,
                source,
            });
        }
        debug!("committed {}", final_path.display());
    }

    Ok(paths)
}

/// Encode row counts as a 1-D `<i8` array.
pub fn encode_lengths(lengths: &[i64]) -> io::Result<Vec<u8>> {
    let mut buf = Cursor::new(Vec::new());
    let mut writer: NpyWriter<i64, _> = WriteOptions::new()
        .default_dtype()
        .shape(&[lengths.len() as u64])
        .writer(&mut buf)
        .begin_nd()?;
    writer.extend(lengths.iter().copied())?;
    writer.finish()?;
    Ok(buf.into_inner())
}

/// Encode all tables as one `<f8` array in the requested layout.
pub fn encode_tables(vcg: &VcgCollection, layout: Layout, pad_value: f64) -> io::Result<Vec<u8>> {
    let columns = vcg.columns().unwrap_or(0) as u64;
    let mut buf = Cursor::new(Vec::new());

    match layout {
        Layout::Stacked => {
            let mut writer: NpyWriter<f64, _> = WriteOptions::new()
                .default_dtype()
                .shape(&[vcg.total_rows() as u64, columns])
                .writer(&mut buf)
                .begin_nd()?;
            for table in &vcg.tables {
                writer.extend(table.values.iter().copied())?;
            }
            writer.finish()?;
        }
        Layout::Padded => {
            let max_rows = vcg.max_rows();
            let mut writer: NpyWriter<f64, _> = WriteOptions::new()
                .default_dtype()
                .shape(&[vcg.len() as u64, max_rows as u64, columns])
                .writer(&mut buf)
                .begin_nd()?;
            for table in &vcg.tables {
                writer.extend(table.values.iter().copied())?;
                let fill = (max_rows - table.rows) * table.columns;
                writer.extend(std::iter::repeat(pad_value).take(fill))?;
            }
            writer.finish()?;
        }
    }

    Ok(buf.into_inner())
}

// ---------------------------------------------------------------------------
// Reading
// ---------------------------------------------------------------------------

/// Load both output files from `dir` and rebuild the collection.
///
/// For the padded layout the row counts are also recovered from the data
/// (trailing rows made only of `pad_value`) and must match the stored lengths.
/// The stacked layout only allows checking that the lengths cover every row.
pub fn read_outputs(dir: &Path, pad_value: f64) -> Result<(Vec<i64>, VcgCollection)> {
    let paths = OutputPaths::in_dir(dir);

    let (len_shape, lengths) = read_array::<i64>(&paths.lengths)?;
    if len_shape.len() != 1 {
        return Err(corrupt(
            &paths.lengths,
            format!("expected a 1-D array, got shape {len_shape:?}"),
        ));
    }

    let (shape, values) = read_array::<f64>(&paths.vcg)?;
    if shape.len() == 3 {
        let recounted =
            recount_padded(&shape, &values, pad_value).map_err(|r| corrupt(&paths.vcg, r))?;
        compare_lengths(&lengths, &recounted).map_err(|r| corrupt(&paths.lengths, r))?;
    }

    let vcg =
        decode_tables(&lengths, &shape, values).map_err(|reason| corrupt(&paths.vcg, reason))?;
    Ok((lengths, vcg))
}

/// Split a stacked (2-D) or padded (3-D) array back into tables.
pub fn decode_tables(
    lengths: &[i64],
    shape: &[u64],
    values: Vec<f64>,
) -> std::result::Result<VcgCollection, String> {
    let rows: Vec<usize> = lengths
        .iter()
        .map(|&n| usize::try_from(n).map_err(|_| format!("negative length {n}")))
        .collect::<std::result::Result<_, _>>()?;
    let mut vcg = VcgCollection::with_capacity(rows.len());

    match *shape {
        [total, columns] => {
            let (total, columns) = (dim(total)?, dim(columns)?);
            let sum = rows
                .iter()
                .try_fold(0usize, |acc, &n| acc.checked_add(n))
                .ok_or("lengths overflow")?;
            if sum != total {
                return Err(format!("lengths sum to {sum} but array has {total} rows"));
            }
            expect_values(&values, &[total, columns])?;
            let mut offset = 0;
            for &n in &rows {
                let end = offset + n * columns;
                vcg.push(VcgTable::new(n, columns, values[offset..end].to_vec()));
                offset = end;
            }
        }
        [count, max_rows, columns] => {
            let (count, max_rows, columns) = (dim(count)?, dim(max_rows)?, dim(columns)?);
            if count != rows.len() {
                return Err(format!("{} lengths but array holds {count} tables", rows.len()));
            }
            if let Some((i, n)) = rows.iter().enumerate().find(|&(_, &n)| n > max_rows) {
                return Err(format!("length {n} of table {i} exceeds padded size {max_rows}"));
            }
            expect_values(&values, &[count, max_rows, columns])?;
            let block = max_rows * columns;
            for (i, &n) in rows.iter().enumerate() {
                let start = i * block;
                let table = values[start..start + n * columns].to_vec();
                vcg.push(VcgTable::new(n, columns, table));
            }
        }
        _ => return Err(format!("expected a 2-D or 3-D array, got shape {shape:?}")),
    }

    Ok(vcg)
}

/// Row count of every table in a padded array: one past its last row that is
/// not entirely `pad_value`.
pub fn recount_padded(
    shape: &[u64],
    values: &[f64],
    pad_value: f64,
) -> std::result::Result<Vec<i64>, String> {
    let [count, max_rows, columns] = *shape else {
        return Err(format!("expected a 3-D array, got shape {shape:?}"));
    };
    let (count, max_rows, columns) = (dim(count)?, dim(max_rows)?, dim(columns)?);
    expect_values(values, &[count, max_rows, columns])?;

    if max_rows == 0 || columns == 0 {
        return Ok(vec![0; count]);
    }
    let is_pad = |v: f64| v == pad_value || (v.is_nan() && pad_value.is_nan());

    Ok(values
        .chunks(max_rows * columns)
        .map(|table| {
            table
                .chunks(columns)
                .rposition(|row| !row.iter().all(|&v| is_pad(v)))
                .map_or(0, |last| last as i64 + 1)
        })
        .collect())
}

// -- helpers --

fn read_array<T: npyz::Deserialize>(path: &Path) -> Result<(Vec<u64>, Vec<T>)> {
    let file = File::open(path).map_err(|source| VcgError::opening(path, source))?;
    let npy = NpyFile::new(BufReader::new(file)).map_err(|e| corrupt(path, e.to_string()))?;
    let shape = npy.shape().to_vec();
    let values = npy.into_vec::<T>().map_err(|e| corrupt(path, e.to_string()))?;
    Ok((shape, values))
}

fn compare_lengths(stored: &[i64], recounted: &[i64]) -> std::result::Result<(), String> {
    if stored.len() != recounted.len() {
        return Err(format!(
            "{} lengths but array holds {} tables",
            stored.len(),
            recounted.len()
        ));
    }
    match stored.iter().zip(recounted).position(|(a, b)| a != b) {
        Some(i) => Err(format!(
            "table {i}: stored length {} but data holds {} rows",
            stored[i], recounted[i]
        )),
        None => Ok(()),
    }
}

fn dim(d: u64) -> std::result::Result<usize, String> {
    usize::try_from(d).map_err(|_| format!("dimension {d} does not fit in memory"))
}

/// Element count implied by `dims` must match what was read.
fn expect_values(values: &[f64], dims: &[usize]) -> std::result::Result<(), String> {
    let expected = dims
        .iter()
        .try_fold(1usize, |acc, &d| acc.checked_mul(d))
        .ok_or_else(|| format!("shape {dims:?} overflows"))?;
    if values.len() != expected {
        return Err(format!(
            "shape {dims:?} needs {expected} values, found {}",
            values.len()
        ));
    }
    Ok(())
}

fn corrupt(path: &Path, reason: String) -> VcgError {
    VcgError::Corrupt {
        path: path.to_path_buf(),
        reason,
    }
}

fn tmp_path_for(path: &Path) -> PathBuf {
    path.with_extension("npy.tmp")
}

fn discard(path: &Path) {
    if let Err(e) = fs::remove_file(path) {
        if e.kind() != io::ErrorKind::NotFound {
            debug!("could not remove {}: {e}", path.display());
        }
    }
}
