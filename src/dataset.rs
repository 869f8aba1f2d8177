//! In-memory tabular dataset: ordered named columns over ordered rows.
//!
//! Cells are `Option<Value>`; `None` is the missing/unknown marker. Column
//! order follows the source header and row order follows the source file.

use anyhow::{Result, ensure};

use crate::data::{Value, display_cell};

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub cells: Vec<Option<Value>>,
}

impl Column {
    pub fn new(name: impl Into<String>, cells: Vec<Option<Value>>) -> Self {
        Self {
            name: name.into(),
            cells,
        }
    }

    pub fn has_missing(&self) -> bool {
        self.cells.iter().any(Option::is_none)
    }

    pub fn present(&self) -> impl Iterator<Item = &Value> {
        self.cells.iter().flatten()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TabularDataset {
    columns: Vec<Column>,
}

impl TabularDataset {
    /// Builds a dataset from columns that must all share the same length.
    pub fn new(columns: Vec<Column>) -> Result<Self> {
        if let Some(first) = columns.first() {
            let expected = first.cells.len();
            for column in &columns {
                ensure!(
                    column.cells.len() == expected,
                    "Column '{}' has {} cell(s) but '{}' has {}",
                    column.name,
                    column.cells.len(),
                    first.name,
                    expected
                );
            }
        }
        Ok(Self { columns })
    }

    /// Builds a dataset from a header and row-major cells; short rows are
    /// padded with missing cells.
    pub fn from_rows(headers: &[String], rows: Vec<Vec<Option<Value>>>) -> Self {
        let mut columns = headers
            .iter()
            .map(|name| Column::new(name.clone(), Vec::with_capacity(rows.len())))
            .collect::<Vec<_>>();
        for mut row in rows {
            row.resize(columns.len(), None);
            for (column, cell) in columns.iter_mut().zip(row) {
                column.cells.push(cell);
            }
        }
        Self { columns }
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn columns_mut(&mut self) -> &mut [Column] {
        &mut self.columns
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|column| column.name == name)
    }

    pub fn column_mut(&mut self, name: &str) -> Option<&mut Column> {
        self.columns.iter_mut().find(|column| column.name == name)
    }

    pub fn headers(&self) -> Vec<String> {
        self.columns.iter().map(|column| column.name.clone()).collect()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn row_count(&self) -> usize {
        self.columns.first().map_or(0, |column| column.cells.len())
    }

    pub fn row(&self, index: usize) -> Option<Vec<&Option<Value>>> {
        if index >= self.row_count() {
            return None;
        }
        Some(
            self.columns
                .iter()
                .map(|column| &column.cells[index])
                .collect(),
        )
    }

    pub fn rows(&self) -> impl Iterator<Item = Vec<&Option<Value>>> + '_ {
        (0..self.row_count()).filter_map(move |idx| self.row(idx))
    }

    /// Renders up to `limit` rows as display strings.
    pub fn render_rows(&self, limit: usize) -> Vec<Vec<String>> {
        self.rows()
            .take(limit)
            .map(|row| row.into_iter().map(display_cell).collect())
            .collect()
    }
}
