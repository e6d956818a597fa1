use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{Result, VcgError};

/// Placeholder in [`ConvertConfig::template`] replaced by the padded index.
pub const INDEX_PLACEHOLDER: &str = "{}";

/// How the ragged table collection is laid out inside `vcg.npy`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Layout {
    /// `(count, max(rows_i), columns)`: one block per recording, short
    /// recordings filled with `pad_value`.
    #[default]
    Padded,
    /// `(sum(rows_i), columns)`: tables concatenated along the sample axis.
    Stacked,
}

/// Settings for one conversion run.
///
/// Defaults reproduce the fixed behaviour of the original one-shot script:
/// 1817 files named `version0001.txt` .. `version1817.txt`, tab-delimited,
/// read from and written to the working directory.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConvertConfig {
    /// Number of input files, indexed from 1.
    pub count: usize,
    /// File name template containing one `{}` placeholder.
    pub template: String,
    /// Zero-padding width of the index.
    pub pad_width: usize,
    /// Field delimiter. Must be a single ASCII character.
    pub delimiter: char,
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub layout: Layout,
    /// Fill value for [`Layout::Padded`]. NaN keeps padding distinguishable
    /// from samples, so row counts can be recovered from `vcg.npy` alone.
    pub pad_value: f64,
}

impl Default for ConvertConfig {
    fn default() -> Self {
        Self {
            count: 1817,
            template: "version{}.txt".to_string(),
            pad_width: 4,
            delimiter: '\t',
            input_dir: PathBuf::from("."),
            output_dir: PathBuf::from("."),
            layout: Layout::Padded,
            pad_value: f64::NAN,
        }
    }
}

impl ConvertConfig {
    /// Read a JSON config file. Absent fields keep their defaults.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            VcgError::Config(format!("reading {}: {e}", path.display()))
        })?;
        serde_json::from_str(&text)
            .map_err(|e| VcgError::Config(format!("parsing {}: {e}", path.display())))
    }

    pub fn validate(&self) -> Result<()> {
        if self.count == 0 {
            return Err(VcgError::Config("count must be at least 1".into()));
        }
        if !self.template.contains(INDEX_PLACEHOLDER) {
            return Err(VcgError::Config(format!(
                "template '{}' has no '{INDEX_PLACEHOLDER}' placeholder",
                self.template
            )));
        }
        if !self.delimiter.is_ascii() || matches!(self.delimiter, '\n' | '\r' | '#') {
            return Err(VcgError::Config(format!(
                "delimiter {:?} must be a single ASCII character other than a newline or '#'",
                self.delimiter
            )));
        }
        Ok(())
    }

    /// Delimiter as the byte the CSV reader expects. Call after [`validate`](Self::validate).
    pub fn delimiter_byte(&self) -> u8 {
        self.delimiter as u8
    }

    /// File name for a 1-based index, e.g. `version0007.txt`.
    pub fn file_name(&self, index: usize) -> String {
        let padded = format!("{index:0width$}", width = self.pad_width);
        self.template.replacen(INDEX_PLACEHOLDER, &padded, 1)
    }

    pub fn input_path(&self, index: usize) -> PathBuf {
        self.input_dir.join(self.file_name(index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_original_naming() {
        let cfg = ConvertConfig::default();
        assert_eq!(cfg.count, 1817);
        assert_eq!(cfg.file_name(1), "version0001.txt");
        assert_eq!(cfg.file_name(1817), "version1817.txt");
        assert_eq!(cfg.delimiter_byte(), b'\t');
        assert_eq!(cfg.layout, Layout::Padded);
        assert!(cfg.pad_value.is_nan());
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn index_wider_than_pad_is_not_truncated() {
        let cfg = ConvertConfig {
            pad_width: 2,
            ..Default::default()
        };
        assert_eq!(cfg.file_name(123), "version123.txt");
    }

    #[test]
    fn rejects_bad_settings() {
        let zero = ConvertConfig {
            count: 0,
            ..Default::default()
        };
        assert!(matches!(zero.validate(), Err(VcgError::Config(_))));

        let no_placeholder = ConvertConfig {
            template: "version.txt".into(),
            ..Default::default()
        };
        assert!(matches!(no_placeholder.validate(), Err(VcgError::Config(_))));

        let wide = ConvertConfig {
            delimiter: 'é',
            ..Default::default()
        };
        assert!(matches!(wide.validate(), Err(VcgError::Config(_))));
    }

    #[test]
    fn json_file_overrides_only_given_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("convert.json");
        std::fs::write(
            &path,
            r#"{ "count": 12, "delimiter": ",", "layout": "stacked", "pad_value": -1.0 }"#,
        )
        .unwrap();

        let cfg = ConvertConfig::from_json_file(&path).unwrap();
        assert_eq!(cfg.count, 12);
        assert_eq!(cfg.delimiter, ',');
        assert_eq!(cfg.layout, Layout::Stacked);
        assert_eq!(cfg.pad_value, -1.0);
        assert_eq!(cfg.template, "version{}.txt");
        assert_eq!(cfg.pad_width, 4);
    }

    #[test]
    fn unknown_json_field_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("convert.json");
        std::fs::write(&path, r#"{ "cout": 12 }"#).unwrap();
        assert!(matches!(
            ConvertConfig::from_json_file(&path),
            Err(VcgError::Config(_))
        ));
    }
}
