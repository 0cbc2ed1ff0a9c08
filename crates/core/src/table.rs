use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// In-memory tabular result set.
///
/// Rows are stored as `Vec<Option<String>>` where `None` represents SQL NULL
/// (an empty field in the source CSV). Cell ordering in each row matches the
/// `columns` vector.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    /// Column names in result-set order.
    pub columns: Vec<String>,
    /// Row data. Each inner vector has the same length as `columns`.
    pub rows: Vec<Vec<Option<String>>>,
}

impl Table {
    /// Create an empty table with the given column names.
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Returns the number of data rows in the table.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Returns the number of columns in the table.
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Returns `true` if the table contains no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Finds the zero-based index of a column by name (case-sensitive).
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Retrieves the value at the given row index and column name.
    ///
    /// Returns `None` if the row index is out of bounds, the column name
    /// does not exist, or the cell value is NULL.
    pub fn get_value(&self, row: usize, col: &str) -> Option<&str> {
        let col_idx = self.column_index(col)?;
        let row_data = self.rows.get(row)?;
        row_data.get(col_idx)?.as_deref()
    }

    /// Append a row, checking that its width matches the column count.
    pub fn push_row(&mut self, row: Vec<Option<String>>) -> Result<(), CoreError> {
        if row.len() != self.columns.len() {
            return Err(CoreError::RowWidthMismatch {
                expected: self.columns.len(),
                got: row.len(),
            });
        }
        self.rows.push(row);
        Ok(())
    }

    /// Append all rows of `other`, which must have the same columns.
    pub fn append(&mut self, other: Table) -> Result<(), CoreError> {
        if self.columns != other.columns {
            return Err(CoreError::ColumnMismatch {
                left: self.columns.clone(),
                right: other.columns.clone(),
            });
        }
        self.rows.extend(other.rows);
        Ok(())
    }

    /// Concatenate tables in order into one.
    ///
    /// The first part defines the columns; every later part must match them.
    /// An empty iterator yields a table with no columns and no rows.
    pub fn concat<I>(parts: I) -> Result<Table, CoreError>
    where
        I: IntoIterator<Item = Table>,
    {
        let mut iter = parts.into_iter();
        let Some(mut combined) = iter.next() else {
            return Ok(Table::default());
        };
        for part in iter {
            combined.append(part)?;
        }
        Ok(combined)
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.columns.is_empty() {
            return write!(f, "(empty result set)");
        }

        // Compute column widths (minimum = header length).
        let mut widths: Vec<usize> = self.columns.iter().map(|c| c.len()).collect();
        for row in &self.rows {
            for (i, cell) in row.iter().enumerate() {
                if i < widths.len() {
                    let cell_len = cell.as_deref().unwrap_or("NULL").len();
                    if cell_len > widths[i] {
                        widths[i] = cell_len;
                    }
                }
            }
        }

        // Header row.
        for (i, col) in self.columns.iter().enumerate() {
            if i > 0 {
                write!(f, " | ")?;
            }
            write!(f, "{:<width$}", col, width = widths[i])?;
        }
        writeln!(f)?;

        // Separator.
        for (i, w) in widths.iter().enumerate() {
            if i > 0 {
                write!(f, "-+-")?;
            }
            write!(f, "{}", "-".repeat(*w))?;
        }
        writeln!(f)?;

        // Data rows. `rows` is public, so a row may be wider than the header.
        for row in &self.rows {
            for (i, cell) in row.iter().take(widths.len()).enumerate() {
                if i > 0 {
                    write!(f, " | ")?;
                }
                let value = cell.as_deref().unwrap_or("NULL");
                write!(f, "{:<width$}", value, width = widths[i])?;
            }
            writeln!(f)?;
        }

        writeln!(f)?;
        write!(f, "{} rows", self.rows.len())
    }
}
