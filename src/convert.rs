use std::path::Path;

use log::info;

use crate::config::ConvertConfig;
use crate::data::loader::load_collection;
use crate::data::npy::{self, OutputPaths};
use crate::error::Result;

// ---------------------------------------------------------------------------
// convert
// ---------------------------------------------------------------------------

/// What a successful conversion produced.
#[derive(Debug, Clone, PartialEq)]
pub struct ConvertSummary {
    pub recordings: usize,
    pub columns: usize,
    pub total_rows: usize,
    pub outputs: OutputPaths,
}

/// Read all inputs, then write both output arrays.
///
/// Nothing is written unless every input was read successfully.
pub fn convert(config: &ConvertConfig) -> Result<ConvertSummary> {
    config.validate()?;

    info!(
        "reading {} recordings from {}",
        config.count,
        config.input_dir.display()
    );
    let vcg = load_collection(config)?;

    let outputs = npy::write_outputs(&vcg, &config.output_dir, config.layout, config.pad_value)?;
    let summary = ConvertSummary {
        recordings: vcg.len(),
        columns: vcg.columns().unwrap_or(0),
        total_rows: vcg.total_rows(),
        outputs,
    };
    info!(
        "wrote {} and {} ({} recordings, {} samples, {:?} layout)",
        summary.outputs.lengths.display(),
        summary.outputs.vcg.display(),
        summary.recordings,
        summary.total_rows,
        config.layout
    );
    Ok(summary)
}

// ---------------------------------------------------------------------------
// inspect
// ---------------------------------------------------------------------------

/// Shape summary of a previously written pair of outputs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InspectReport {
    pub recordings: usize,
    pub columns: usize,
    pub total_rows: usize,
    pub min_rows: usize,
    pub max_rows: usize,
}

/// Read both outputs back and summarise them.
///
/// `pad_value` must be the fill used when writing a padded `vcg.npy`; row
/// counts recovered from the padding are checked against `vcg_length.npy`.
pub fn inspect(dir: &Path, pad_value: f64) -> Result<InspectReport> {
    let (_, vcg) = npy::read_outputs(dir, pad_value)?;

    Ok(InspectReport {
        recordings: vcg.len(),
        columns: vcg.columns().unwrap_or(0),
        total_rows: vcg.total_rows(),
        min_rows: vcg.min_rows(),
        max_rows: vcg.max_rows(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Layout;
    use crate::error::VcgError;
    use std::path::PathBuf;

    fn write_inputs(dir: &Path, tables: &[(usize, usize)]) {
        for (i, &(rows, cols)) in tables.iter().enumerate() {
            let mut body = String::new();
            for r in 0..rows {
                let line: Vec<String> = (0..cols)
                    .map(|c| format!("{:.3}", (i * 100 + r * cols + c) as f64 * 0.125))
                    .collect();
                body.push_str(&line.join("\t"));
                body.push('\n');
            }
            std::fs::write(dir.join(format!("version{:04}.txt", i + 1)), body).unwrap();
        }
    }

    fn config(input: &Path, output: PathBuf, count: usize) -> ConvertConfig {
        ConvertConfig {
            count,
            input_dir: input.to_path_buf(),
            output_dir: output,
            ..Default::default()
        }
    }

    fn outputs_exist(dir: &Path) -> bool {
        dir.join(npy::LENGTHS_FILE).exists() || dir.join(npy::VCG_FILE).exists()
    }

    #[test]
    fn two_recordings_give_expected_shapes() {
        let dir = tempfile::tempdir().unwrap();
        write_inputs(dir.path(), &[(3, 2), (5, 2)]);

        let summary = convert(&config(dir.path(), dir.path().to_path_buf(), 2)).unwrap();
        assert_eq!(summary.recordings, 2);
        assert_eq!(summary.columns, 2);
        assert_eq!(summary.total_rows, 8);

        let (lengths, vcg) = npy::read_outputs(dir.path(), f64::NAN).unwrap();
        assert_eq!(lengths, vec![3, 5]);
        assert_eq!(vcg.tables[0].shape(), (3, 2));
        assert_eq!(vcg.tables[1].shape(), (5, 2));
        assert_eq!(vcg.tables[1].row(0), &[12.5, 12.625]);
    }

    #[test]
    fn order_follows_file_index() {
        let dir = tempfile::tempdir().unwrap();
        let shapes: Vec<(usize, usize)> = (0..12).map(|i| (1 + (i * 7) % 5, 3)).collect();
        write_inputs(dir.path(), &shapes);

        convert(&config(dir.path(), dir.path().to_path_buf(), shapes.len())).unwrap();
        let (lengths, _) = npy::read_outputs(dir.path(), f64::NAN).unwrap();
        let expected: Vec<i64> = shapes.iter().map(|&(r, _)| r as i64).collect();
        assert_eq!(lengths, expected);
    }

    #[test]
    fn repeated_runs_are_byte_identical() {
        let dir = tempfile::tempdir().unwrap();
        write_inputs(dir.path(), &[(4, 3), (2, 3), (6, 3)]);
        let cfg = config(dir.path(), dir.path().join("out"), 3);

        convert(&cfg).unwrap();
        let first = (
            std::fs::read(dir.path().join("out").join(npy::LENGTHS_FILE)).unwrap(),
            std::fs::read(dir.path().join("out").join(npy::VCG_FILE)).unwrap(),
        );
        convert(&cfg).unwrap();
        let second = (
            std::fs::read(dir.path().join("out").join(npy::LENGTHS_FILE)).unwrap(),
            std::fs::read(dir.path().join("out").join(npy::VCG_FILE)).unwrap(),
        );
        assert_eq!(first, second);
    }

    #[test]
    fn missing_first_file_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        write_inputs(dir.path(), &[(3, 2), (5, 2)]);
        std::fs::remove_file(dir.path().join("version0001.txt")).unwrap();

        let err = convert(&config(dir.path(), dir.path().to_path_buf(), 2)).unwrap_err();
        assert!(matches!(err, VcgError::MissingFile { .. }));
        assert!(!outputs_exist(dir.path()));
    }

    #[test]
    fn late_failures_write_nothing() {
        let dir = tempfile::tempdir().unwrap();
        write_inputs(dir.path(), &[(3, 2), (5, 2), (2, 3)]);
        let err = convert(&config(dir.path(), dir.path().to_path_buf(), 3)).unwrap_err();
        assert!(matches!(err, VcgError::ColumnMismatch { .. }));
        assert!(!outputs_exist(dir.path()));

        std::fs::write(dir.path().join("version0003.txt"), "\n").unwrap();
        let err = convert(&config(dir.path(), dir.path().to_path_buf(), 3)).unwrap_err();
        assert!(matches!(err, VcgError::EmptyTable { .. }));
        assert!(!outputs_exist(dir.path()));
    }

    #[test]
    fn invalid_config_is_rejected_before_reading() {
        let dir = tempfile::tempdir().unwrap();
        let err = convert(&config(dir.path(), dir.path().to_path_buf(), 0)).unwrap_err();
        assert!(matches!(err, VcgError::Config(_)));
    }

    #[test]
    fn default_output_has_one_block_per_recording() {
        let dir = tempfile::tempdir().unwrap();
        write_inputs(dir.path(), &[(3, 2), (5, 2)]);
        convert(&config(dir.path(), dir.path().to_path_buf(), 2)).unwrap();

        let bytes = std::fs::read(dir.path().join(npy::VCG_FILE)).unwrap();
        let npy_file = npyz::NpyFile::new(&bytes[..]).unwrap();
        assert_eq!(npy_file.shape(), &[2, 5, 2]);
    }

    #[test]
    fn inspect_rejects_lengths_that_disagree_with_data() {
        let dir = tempfile::tempdir().unwrap();
        write_inputs(dir.path(), &[(5, 2), (5, 2)]);
        convert(&config(dir.path(), dir.path().to_path_buf(), 2)).unwrap();

        let tampered = npy::encode_lengths(&[1, 5]).unwrap();
        std::fs::write(dir.path().join(npy::LENGTHS_FILE), tampered).unwrap();
        assert!(matches!(
            inspect(dir.path(), f64::NAN),
            Err(VcgError::Corrupt { .. })
        ));
    }

    #[test]
    fn inspect_reports_both_layouts() {
        let dir = tempfile::tempdir().unwrap();
        write_inputs(dir.path(), &[(3, 2), (7, 2), (5, 2)]);

        for layout in [Layout::Stacked, Layout::Padded] {
            let cfg = ConvertConfig {
                layout,
                ..config(dir.path(), dir.path().to_path_buf(), 3)
            };
            convert(&cfg).unwrap();
            let report = inspect(dir.path(), f64::NAN).unwrap();
            assert_eq!(
                report,
                InspectReport {
                    recordings: 3,
                    columns: 2,
                    total_rows: 15,
                    min_rows: 3,
                    max_rows: 7,
                },
                "{layout:?}"
            );
        }
    }
}
