//! Traits a database driver implements in order to be migrated by [`crate::MassUpdate`]. Two
//! decisions are baked into these:
//! * Statements use `?` as positional placeholder. Parameter and column positions start at `1`.
//! * Results are streamed. A backend must not materialize the whole result set in memory.

#[cfg(feature = "odbc")]
mod odbc;
#[cfg(feature = "sqlite")]
mod sqlite;

#[cfg(feature = "odbc")]
pub use self::odbc::{OdbcConnection, OdbcRecords, OdbcSelect, OdbcUpdate};
#[cfg(feature = "sqlite")]
pub use self::sqlite::{SqliteRecords, SqliteSelect, SqliteUpdate};

use crate::{Error, Value};

/// A connection to a data source. All methods take `&self`, so statements prepared on the
/// connection can be alive at the same time, as long as they are used by a single thread.
pub trait Connection {
    type Select<'c>: SelectStatement
    where
        Self: 'c;
    type Update<'c>: UpdateStatement
    where
        Self: 'c;

    /// Prepares a query. Its result set is streamed by calling [`SelectStatement::query`].
    fn prepare_select(&self, sql: &str) -> Result<Self::Select<'_>, Error>;

    /// Prepares a statement which is executed once for each parameter set passed to it.
    fn prepare_update(&self, sql: &str) -> Result<Self::Update<'_>, Error>;

    /// Switches the connection into manual commit mode, opening a transaction which lasts until
    /// [`Self::commit`] or [`Self::rollback`] is called.
    fn begin(&self) -> Result<(), Error>;

    /// Commits the transaction opened by [`Self::begin`] and switches back to auto commit.
    fn commit(&self) -> Result<(), Error>;

    /// Rolls back the transaction opened by [`Self::begin`] and switches back to auto commit.
    fn rollback(&self) -> Result<(), Error>;
}

/// A prepared query.
pub trait SelectStatement {
    type Records<'s>: Records
    where
        Self: 's;

    /// Executes the query. The records are fetched lazily from the returned result set.
    fn query(&mut self) -> Result<Self::Records<'_>, Error>;
}

/// The result set of an executed query. Forward only, single pass.
pub trait Records {
    /// Advances to the next record and appends each of its fields to `record`, in projection
    /// order. `record` is empty then passed. Returns `false` once the result set is exhausted,
    /// leaving `record` untouched.
    fn fetch(&mut self, record: &mut Vec<Value>) -> Result<bool, Error>;
}

impl<R> Records for &mut R
where
    R: Records + ?Sized,
{
    fn fetch(&mut self, record: &mut Vec<Value>) -> Result<bool, Error> {
        (**self).fetch(record)
    }
}

/// A prepared statement with positional placeholders, usually `UPDATE` or `INSERT`.
pub trait UpdateStatement {
    /// Number of `?` placeholders in the statement text.
    fn parameter_count(&self) -> u16;

    /// Executes the statement once. `parameters` holds exactly [`Self::parameter_count`]
    /// elements. Returns the number of rows affected.
    fn execute(&mut self, parameters: &[Value]) -> Result<u64, Error>;

    /// Executes the statement once for each parameter set. Returns the total number of rows
    /// affected. Drivers with support for parameter arrays may override this to send the whole
    /// batch in one roundtrip.
    fn execute_batch(&mut self, batch: &[Vec<Value>]) -> Result<u64, Error> {
        let mut affected = 0;
        for parameters in batch {
            affected += self.execute(parameters)?;
        }
        Ok(affected)
    }
}
