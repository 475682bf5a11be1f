use std::time::{Duration, Instant};

use log::{debug, warn};

use crate::{
    BatchExecutor, Error, ProgressLogger, Row, RowCursor, UpdateBinding,
    backend::{Connection, SelectStatement},
    batch::DEFAULT_BATCH_SIZE,
};

/// Decides for each row whether it needs to be updated.
pub trait Handler {
    /// Called once for each row returned by the select statement of a [`MassUpdate`].
    ///
    /// Return `false` to leave the row untouched, in which case `update` is discarded. Return
    /// `true` to have `update` executed. In that case every placeholder of the update statement
    /// must have been set, otherwise the whole mass update fails with
    /// [`Error::UnboundParameter`].
    fn handle(&mut self, row: &Row<'_>, update: &mut UpdateBinding) -> Result<bool, Error>;
}

impl<H> Handler for &mut H
where
    H: Handler + ?Sized,
{
    fn handle(&mut self, row: &Row<'_>, update: &mut UpdateBinding) -> Result<bool, Error> {
        (**self).handle(row, update)
    }
}

/// Handler which calls a closure. See [`from_fn`].
pub struct FromFn<F>(F);

impl<F> Handler for FromFn<F>
where
    F: FnMut(&Row<'_>, &mut UpdateBinding) -> Result<bool, Error>,
{
    fn handle(&mut self, row: &Row<'_>, update: &mut UpdateBinding) -> Result<bool, Error> {
        (self.0)(row, update)
    }
}

/// Creates a [`Handler`] from a closure.
///
/// ```no_run
/// use mass_update::{Connection, MassUpdate, from_fn};
///
/// fn lower_case_logins(connection: &impl Connection) -> Result<(), mass_update::Error> {
///     MassUpdate::new(
///         connection,
///         "SELECT id, login FROM users WHERE login <> LOWER(login)",
///         "UPDATE users SET login=? WHERE id=?",
///     )
///     .row_plural_name("users")
///     .execute(from_fn(|row, update| {
///         update
///             .set_text(1, row.get_text(2)?.to_lowercase())?
///             .set_i64(2, row.get_i64(1)?)?;
///         Ok(true)
///     }))?;
///     Ok(())
/// }
/// ```
pub fn from_fn<F>(f: F) -> FromFn<F>
where
    F: FnMut(&Row<'_>, &mut UpdateBinding) -> Result<bool, Error>,
{
    FromFn(f)
}

/// Tuning knobs of a [`MassUpdate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MassUpdateOptions {
    /// Maximum number of updates held in memory before they are sent to the database.
    pub batch_size: usize,
    /// Minimum time between two progress reports.
    pub progress_interval: Duration,
}

impl Default for MassUpdateOptions {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            progress_interval: Duration::from_secs(60),
        }
    }
}

/// Counters of one [`MassUpdate::execute`] call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MassUpdateStats {
    /// Rows returned by the select statement.
    pub rows_read: u64,
    /// Rows for which the handler returned `true`.
    pub rows_selected: u64,
    /// Updates successfully sent to the database.
    pub rows_written: u64,
    /// Sum of the affected row counts reported by the database for each update.
    pub rows_affected: u64,
    pub elapsed: Duration,
}

/// Streams the rows matched by a select statement through a [`Handler`] and applies the updates
/// it binds in batches.
///
/// Each call to [`Self::execute`] runs in a single transaction. Batches are sent to the database
/// as the result set is traversed, yet only become durable with the final commit. Any error rolls
/// back the whole pass, so a failed mass update leaves the table as it found it.
///
/// The select statement must be written so that rows which have already been migrated no longer
/// match. Running a mass update twice then is harmless.
pub struct MassUpdate<'c, C> {
    connection: &'c C,
    select: String,
    update: String,
    plural_name: String,
    options: MassUpdateOptions,
}

impl<'c, C> MassUpdate<'c, C>
where
    C: Connection,
{
    /// # Parameters
    ///
    /// * `select`: Defines which rows are migrated and the columns passed to the handler.
    /// * `update`: Executed for each row the handler decides to update. `?` marks positional
    ///   parameters bound by the handler.
    pub fn new(connection: &'c C, select: impl Into<String>, update: impl Into<String>) -> Self {
        Self {
            connection,
            select: select.into(),
            update: update.into(),
            plural_name: "rows".to_owned(),
            options: MassUpdateOptions::default(),
        }
    }

    /// Plural noun describing the rows in log messages, e.g. `users`.
    pub fn row_plural_name(mut self, plural_name: impl Into<String>) -> Self {
        self.plural_name = plural_name.into();
        self
    }

    pub fn options(mut self, options: MassUpdateOptions) -> Self {
        self.options = options;
        self
    }

    pub fn execute(&self, mut handler: impl Handler) -> Result<MassUpdateStats, Error> {
        let started = Instant::now();
        let mut progress = ProgressLogger::new(&self.plural_name, self.options.progress_interval);
        debug!("Migrating {} selected by '{}'", self.plural_name, self.select);

        self.connection.begin()?;
        let outcome = self
            .run(&mut handler, &mut progress)
            .and_then(|stats| self.connection.commit().map(|()| stats));

        match outcome {
            Ok(mut stats) => {
                stats.elapsed = started.elapsed();
                progress.finish(&stats);
                Ok(stats)
            }
            Err(error) => {
                if let Err(rollback_error) = self.connection.rollback() {
                    warn!(
                        "Rolling back the migration of {} failed: {}",
                        self.plural_name, rollback_error
                    );
                }
                Err(error)
            }
        }
    }

    fn run(
        &self,
        handler: &mut impl Handler,
        progress: &mut ProgressLogger,
    ) -> Result<MassUpdateStats, Error> {
        let mut stats = MassUpdateStats::default();
        let mut select = self.connection.prepare_select(&self.select)?;
        let update = self.connection.prepare_update(&self.update)?;
        let mut batch = BatchExecutor::new(update, self.options.batch_size);

        // The cursor must be released before the transaction is committed.
        {
            let mut cursor = RowCursor::new(select.query()?);
            while let Some(row) = cursor.next_row()? {
                stats.rows_read += 1;
                let mut binding = batch.new_binding();
                if handler.handle(&row, &mut binding)? {
                    batch.queue(binding)?;
                    stats.rows_selected += 1;
                    batch.flush_if_threshold_reached()?;
                    stats.rows_written = batch.rows_written();
                    stats.rows_affected = batch.rows_affected();
                }
                progress.tick(&stats);
            }
        }

        batch.flush_remaining()?;
        stats.rows_written = batch.rows_written();
        stats.rows_affected = batch.rows_affected();
        Ok(stats)
    }
}
