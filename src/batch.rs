use log::debug;

use crate::{Error, UpdateBinding, Value, backend::UpdateStatement};

/// Number of parameter sets held back before they are sent to the database.
pub const DEFAULT_BATCH_SIZE: usize = 250;

/// Groups executions of a prepared update statement, so peak memory and the amount of work sent
/// per roundtrip stay bounded, independent of how many rows are migrated.
///
/// Bindings are validated as they are queued and executed in the order they were queued.
/// Pending bindings are not flushed on drop. Call [`Self::flush_remaining`] once all bindings are
/// queued.
pub struct BatchExecutor<U> {
    statement: U,
    batch_size: usize,
    pending: Vec<Vec<Value>>,
    rows_written: u64,
    rows_affected: u64,
}

impl<U> BatchExecutor<U>
where
    U: UpdateStatement,
{
    /// `batch_size` of zero is treated as one.
    pub fn new(statement: U, batch_size: usize) -> Self {
        let batch_size = batch_size.max(1);
        Self {
            statement,
            batch_size,
            pending: Vec::with_capacity(batch_size.min(DEFAULT_BATCH_SIZE)),
            rows_written: 0,
            rows_affected: 0,
        }
    }

    /// An empty binding matching the placeholders of the underlying statement.
    pub fn new_binding(&self) -> UpdateBinding {
        UpdateBinding::new(self.statement.parameter_count())
    }

    /// Appends a binding to the current batch. Fails with [`Error::UnboundParameter`] if any
    /// placeholder has not been set, in which case nothing is queued.
    pub fn queue(&mut self, binding: UpdateBinding) -> Result<(), Error> {
        let parameters = binding.into_parameters()?;
        self.pending.push(parameters);
        Ok(())
    }

    /// Sends the current batch to the database, if it reached the batch size. Returns the number
    /// of bindings written.
    pub fn flush_if_threshold_reached(&mut self) -> Result<usize, Error> {
        if self.pending.len() >= self.batch_size {
            self.flush()
        } else {
            Ok(0)
        }
    }

    /// Sends all pending bindings to the database. Returns the number of bindings written.
    pub fn flush_remaining(&mut self) -> Result<usize, Error> {
        if self.pending.is_empty() {
            Ok(0)
        } else {
            self.flush()
        }
    }

    /// Number of queued bindings not yet sent to the database.
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Bindings executed successfully so far.
    pub fn rows_written(&self) -> u64 {
        self.rows_written
    }

    /// Sum of the rows affected as reported by the database.
    pub fn rows_affected(&self) -> u64 {
        self.rows_affected
    }

    fn flush(&mut self) -> Result<usize, Error> {
        let batch_len = self.pending.len();
        let affected = self.statement.execute_batch(&self.pending)?;
        self.pending.clear();
        self.rows_written += batch_len as u64;
        self.rows_affected += affected;
        debug!("Flushed batch of {batch_len} updates, {affected} rows affected.");
        Ok(batch_len)
    }
}
