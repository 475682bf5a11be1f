use crate::{Error, Row, Value, backend::Records};

/// Forward only, single pass iteration over the result set of a query.
///
/// Each call to [`Self::next_row`] overwrites the same record buffer, so memory consumption does
/// not depend on the size of the result set. The returned [`Row`] borrows that buffer and is
/// therefore invalidated by the next call.
///
/// # Example
///
/// ```
/// use mass_update::{Error, Records, RowCursor};
///
/// /// Sums up the first column of each row.
/// fn total(records: impl Records) -> Result<i64, Error> {
///     let mut cursor = RowCursor::new(records);
///     let mut sum = 0;
///     while let Some(row) = cursor.next_row()? {
///         sum += row.get_i64(1)?;
///     }
///     Ok(sum)
/// }
/// ```
pub struct RowCursor<R> {
    records: R,
    current: Vec<Value>,
    exhausted: bool,
}

impl<R> RowCursor<R>
where
    R: Records,
{
    pub fn new(records: R) -> Self {
        Self {
            records,
            current: Vec::new(),
            exhausted: false,
        }
    }

    /// Advances the cursor to the next row in the result set. `None` once the result set is
    /// exhausted. Subsequent calls keep returning `None` without touching the backend again.
    pub fn next_row(&mut self) -> Result<Option<Row<'_>>, Error> {
        if self.exhausted {
            return Ok(None);
        }
        self.current.clear();
        if self.records.fetch(&mut self.current)? {
            Ok(Some(Row::new(&self.current)))
        } else {
            self.exhausted = true;
            Ok(None)
        }
    }
}
