use std::slice;

use super::collection::encode_cell;
use super::raw::RawRow;
use super::statement::ColumnSpec;
use super::{DriverCode, DriverError, NativeResult, NativeValue, WireCollection};
use crate::types::ColumnType;

/// An in-process result set holding rows of encoded cells.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct WireResult {
    columns: Vec<ColumnSpec>,
    rows: Vec<Vec<Option<Vec<u8>>>>,
    has_more_pages: bool,
}

impl WireResult {
    pub fn new(columns: Vec<ColumnSpec>) -> Self {
        WireResult {
            columns,
            rows: Vec::new(),
            has_more_pages: false,
        }
    }

    pub fn with_more_pages(mut self, has_more_pages: bool) -> Self {
        self.has_more_pages = has_more_pages;
        self
    }

    pub fn columns(&self) -> &[ColumnSpec] {
        &self.columns
    }

    /// Append a row of values, checking each against its column's type.
    pub fn push_row(&mut self, row: Vec<NativeValue<WireCollection>>) -> Result<(), DriverError> {
        if row.len() != self.columns.len() {
            return Err(DriverError::new(
                DriverCode::InvalidItemCount,
                format!(
                    "row has {} values for {} columns",
                    row.len(),
                    self.columns.len()
                ),
            ));
        }
        for (value, column) in row.iter().zip(&self.columns) {
            let kind = value.kind();
            let conforms = match value {
                NativeValue::Collection(c) => c.conforms_to(&column.column_type),
                _ => column.column_type.accepts(kind),
            };
            if !conforms {
                return Err(DriverError::new(
                    DriverCode::InvalidValueType,
                    format!(
                        "cannot store a {} value in {} column `{}`",
                        kind, column.column_type, column.name
                    ),
                ));
            }
        }
        self.rows.push(row.into_iter().map(encode_cell).collect());
        Ok(())
    }

    /// Append a row of already encoded cells.
    pub fn push_raw_row(&mut self, row: Vec<Option<Vec<u8>>>) {
        self.rows.push(row);
    }
}

impl NativeResult for WireResult {
    type Rows<'a> = WireRows<'a>;

    fn row_count(&self) -> usize {
        self.rows.len()
    }

    fn column_count(&self) -> usize {
        self.columns.len()
    }

    fn column_name(&self, index: usize) -> Option<&str> {
        self.columns.get(index).map(|c| c.name.as_str())
    }

    fn column_type(&self, index: usize) -> Option<&ColumnType> {
        self.columns.get(index).map(|c| &c.column_type)
    }

    fn has_more_pages(&self) -> bool {
        self.has_more_pages
    }

    fn rows(&self) -> WireRows<'_> {
        WireRows {
            columns: &self.columns,
            rows: self.rows.iter(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct WireRows<'a> {
    columns: &'a [ColumnSpec],
    rows: slice::Iter<'a, Vec<Option<Vec<u8>>>>,
}

impl<'a> Iterator for WireRows<'a> {
    type Item = RawRow<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        self.rows.next().map(|cells| RawRow::new(self.columns, cells))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.rows.size_hint()
    }
}

impl ExactSizeIterator for WireRows<'_> {}
