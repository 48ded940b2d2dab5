use std::cell::OnceCell;
use std::fmt;

use rustc_hash::FxHashMap;
use smol_str::SmolStr;
use tracing::trace;

use crate::codec::read_value;
use crate::error::DecodeError;
use crate::native::NativeResult;
use crate::types::ColumnType;
use crate::value::HostValue;

/// Decodes the rows of a driver result into host values.
///
/// Column names are read from the driver once, the first time they are
/// needed, and kept for the lifetime of the reader.
#[derive(Debug)]
pub struct ResultReader<R> {
    native: R,
    names: OnceCell<Vec<SmolStr>>,
    index: OnceCell<FxHashMap<SmolStr, usize>>,
}

impl<R: NativeResult> ResultReader<R> {
    pub fn new(native: R) -> Self {
        ResultReader {
            native,
            names: OnceCell::new(),
            index: OnceCell::new(),
        }
    }

    pub fn column_count(&self) -> usize {
        self.native.column_count()
    }

    pub fn row_count(&self) -> usize {
        self.native.row_count()
    }

    pub fn has_more_pages(&self) -> bool {
        self.native.has_more_pages()
    }

    pub fn column_names(&self) -> &[SmolStr] {
        self.names.get_or_init(|| {
            trace!(columns = self.native.column_count(), "reading column names");
            (0..self.native.column_count())
                .map(|i| self.native.column_name(i).map(SmolStr::new).unwrap_or_default())
                .collect()
        })
    }

    /// The position of the column called `name`. With duplicate names the
    /// first column wins.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.index
            .get_or_init(|| {
                let names = self.column_names();
                names
                    .iter()
                    .enumerate()
                    .rev()
                    .map(|(i, n)| (n.clone(), i))
                    .collect()
            })
            .get(name)
            .copied()
    }

    pub fn column_type(&self, index: usize) -> Option<&ColumnType> {
        self.native.column_type(index)
    }

    /// Decode the rows from the start. Each call walks a fresh driver
    /// iterator.
    pub fn rows(&self) -> Rows<'_, R> {
        Rows {
            columns: self.native.column_count(),
            rows: self.native.rows(),
        }
    }

    /// Call `f` with every decoded row, stopping at the first decode error
    /// or the first error `f` returns.
    pub fn for_each_row<F, E>(&self, mut f: F) -> Result<(), E>
    where
        F: FnMut(Vec<HostValue>) -> Result<(), E>,
        E: From<DecodeError>,
    {
        for row in self.rows() {
            f(row?)?;
        }
        Ok(())
    }

    pub fn native(&self) -> &R {
        &self.native
    }

    pub fn into_native(self) -> R {
        self.native
    }
}

/// Decoded rows of a [`ResultReader`], each one value per column in column
/// order.
pub struct Rows<'a, R: NativeResult + 'a> {
    columns: usize,
    rows: R::Rows<'a>,
}

impl<'a, R: NativeResult + 'a> fmt::Debug for Rows<'a, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rows").field("columns", &self.columns).finish_non_exhaustive()
    }
}

impl<'a, R: NativeResult + 'a> Iterator for Rows<'a, R> {
    type Item = Result<Vec<HostValue>, DecodeError>;

    fn next(&mut self) -> Option<Self::Item> {
        let row = self.rows.next()?;
        Some(
            (0..self.columns)
                .map(|i| row.get(i).ok_or(DecodeError::MissingColumn(i)).and_then(read_value))
                .collect(),
        )
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.rows.size_hint()
    }
}
