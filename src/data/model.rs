// ---------------------------------------------------------------------------
// VcgTable – one recording
// ---------------------------------------------------------------------------

/// A single VCG recording: rows are time samples, columns are leads.
#[derive(Debug, Clone, PartialEq)]
pub struct VcgTable {
    pub rows: usize,
    pub columns: usize,
    /// Row-major samples, `rows * columns` long.
    pub values: Vec<f64>,
}

impl VcgTable {
    pub fn new(rows: usize, columns: usize, values: Vec<f64>) -> Self {
        debug_assert_eq!(values.len(), rows * columns);
        Self {
            rows,
            columns,
            values,
        }
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.columns)
    }

    /// Samples of row `i` across all leads.
    #[cfg(test)]
    pub fn row(&self, i: usize) -> &[f64] {
        &self.values[i * self.columns..(i + 1) * self.columns]
    }
}

// ---------------------------------------------------------------------------
// VcgCollection – all recordings in file order
// ---------------------------------------------------------------------------

/// Ragged, ordered collection of recordings. Row counts differ per table;
/// the column count is shared by every table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VcgCollection {
    pub tables: Vec<VcgTable>,
}

impl VcgCollection {
    pub fn with_capacity(n: usize) -> Self {
        Self {
            tables: Vec::with_capacity(n),
        }
    }

    pub fn push(&mut self, table: VcgTable) {
        debug_assert!(self.columns().map_or(true, |c| c == table.columns));
        self.tables.push(table);
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Column count shared by all tables, `None` when empty.
    pub fn columns(&self) -> Option<usize> {
        self.tables.first().map(|t| t.columns)
    }

    /// Row count of every table, in order. This is what `vcg_length.npy` stores.
    pub fn lengths(&self) -> Vec<i64> {
        self.tables.iter().map(|t| t.rows as i64).collect()
    }

    pub fn total_rows(&self) -> usize {
        self.tables.iter().map(|t| t.rows).sum()
    }

    pub fn max_rows(&self) -> usize {
        self.tables.iter().map(|t| t.rows).max().unwrap_or(0)
    }

    pub fn min_rows(&self) -> usize {
        self.tables.iter().map(|t| t.rows).min().unwrap_or(0)
    }
}
