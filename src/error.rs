use std::error::Error as StdError;

use thiserror::Error as ThisError;

/// Boxed error emitted by a database backend.
pub type BackendError = Box<dyn StdError + Send + Sync + 'static>;

#[derive(Debug, ThisError)]
/// Error type used by every fallible operation of this crate.
pub enum Error {
    /// Preparing, executing or fetching a statement failed. Also emitted if beginning, committing
    /// or rolling back a transaction fails, in which case `statement` names the transaction
    /// command.
    #[error("Database returned an error while executing '{statement}':\n{source}")]
    Database {
        /// Statement text which has been executed when the error occurred.
        statement: String,
        /// Error reported by the backend.
        #[source]
        source: BackendError,
    },
    /// A handler decided to update a row, yet did not bind every placeholder of the update
    /// statement. This is a bug in the handler, not a problem with the data.
    #[error(
        "Parameter {position} of the update statement has not been bound. A handler must set all \
        {parameter_count} parameters before returning `true`."
    )]
    UnboundParameter {
        /// 1-based position of the first unset placeholder.
        position: u16,
        parameter_count: u16,
    },
    /// A handler bound a parameter position the update statement does not have.
    #[error(
        "Tried to bind parameter {position}, but the update statement has {parameter_count} \
        placeholders. Parameter positions start at 1."
    )]
    ParameterOutOfRange { position: u16, parameter_count: u16 },
    /// A column was read at a position outside the projection of the select statement.
    #[error(
        "Tried to read column {position}, but the row has {column_count} columns. Column \
        positions start at 1."
    )]
    ColumnOutOfRange { position: u16, column_count: u16 },
    /// Returned by the strict getters of [`crate::Row`] if the database returned `NULL`. Use the
    /// `get_nullable_*` variants for columns which may be `NULL`.
    #[error("Column {position} is NULL, yet the application expected a value.")]
    UnexpectedNull { position: u16 },
    /// A typed getter of [`crate::Row`] found a value it can not convert, e.g. text read as an
    /// integer.
    #[error("Column {position} holds a value of type {actual}, which can not be read as {expected}.")]
    UnexpectedType {
        position: u16,
        /// Type requested by the getter, e.g. `i64`.
        expected: &'static str,
        /// Type of the value returned by the database, e.g. `TEXT`.
        actual: &'static str,
    },
}

impl Error {
    /// Wraps an error returned by a backend together with the statement which caused it.
    pub fn database(statement: &str, source: impl Into<BackendError>) -> Self {
        Error::Database {
            statement: statement.to_owned(),
            source: source.into(),
        }
    }
}
