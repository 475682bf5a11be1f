//! Versioned data changes. Each step lives in a module named after the version introducing it.
//! Deciding which steps to run and remembering which already ran is left to the application.

pub mod v56;

use crate::{
    BatchExecutor, Error, MassUpdate, Row, RowCursor,
    backend::{Connection, SelectStatement},
    batch::DEFAULT_BATCH_SIZE,
};

/// One versioned change to the data of a database. Executed exactly once per database by the
/// migration runner, in version order. Not re-entrant.
pub trait MigrationStep {
    fn execute(&mut self) -> Result<(), Error>;
}

/// Gives a migration step access to the database it is migrating.
pub struct Context<'c, C> {
    connection: &'c C,
}

impl<'c, C> Context<'c, C>
where
    C: Connection,
{
    pub fn new(connection: &'c C) -> Self {
        Self { connection }
    }

    /// See [`MassUpdate`].
    pub fn prepare_mass_update(
        &self,
        select: impl Into<String>,
        update: impl Into<String>,
    ) -> MassUpdate<'c, C> {
        MassUpdate::new(self.connection, select, update)
    }

    /// Executes `sql` and maps each row using `reader`. Materializes the result set, use
    /// [`Self::scroll`] or a [`MassUpdate`] for large tables.
    pub fn list<T>(
        &self,
        sql: &str,
        mut reader: impl FnMut(&Row<'_>) -> Result<T, Error>,
    ) -> Result<Vec<T>, Error> {
        let mut items = Vec::new();
        self.scroll(sql, |row| {
            items.push(reader(row)?);
            Ok(())
        })?;
        Ok(items)
    }

    /// Executes `sql` and maps the first row using `reader`. `None` if the query returned no
    /// rows. Any further rows are ignored.
    pub fn get<T>(
        &self,
        sql: &str,
        reader: impl FnOnce(&Row<'_>) -> Result<T, Error>,
    ) -> Result<Option<T>, Error> {
        let mut select = self.connection.prepare_select(sql)?;
        let mut cursor = RowCursor::new(select.query()?);
        let first = match cursor.next_row()? {
            Some(row) => Some(reader(&row)?),
            None => None,
        };
        Ok(first)
    }

    /// Executes `sql` and passes each row to `handler`. Returns the number of rows visited.
    pub fn scroll(
        &self,
        sql: &str,
        mut handler: impl FnMut(&Row<'_>) -> Result<(), Error>,
    ) -> Result<u64, Error> {
        let mut select = self.connection.prepare_select(sql)?;
        let mut cursor = RowCursor::new(select.query()?);
        let mut rows = 0;
        while let Some(row) = cursor.next_row()? {
            handler(&row)?;
            rows += 1;
        }
        Ok(rows)
    }

    /// Prepares `sql` for batched execution, e.g. to insert or update rows not selected by a
    /// query. Runs in whatever transaction mode the connection is in.
    pub fn prepare_upsert(&self, sql: &str) -> Result<BatchExecutor<C::Update<'c>>, Error> {
        let statement = self.connection.prepare_update(sql)?;
        Ok(BatchExecutor::new(statement, DEFAULT_BATCH_SIZE))
    }
}
