//! # Mass update
//!
//! One-shot data migrations over tables of any size. A [`MassUpdate`] streams the rows matched by a
//! select statement through a [`Handler`], which decides for each row whether and how it is
//! updated. Updates are validated and sent to the database in batches, within a single
//! transaction.
//!
//! ```no_run
//! use mass_update::{Error, Handler, MassUpdate, Row, UpdateBinding};
//!
//! struct DefaultCountry;
//!
//! impl Handler for DefaultCountry {
//!     fn handle(&mut self, row: &Row<'_>, update: &mut UpdateBinding) -> Result<bool, Error> {
//!         update.set_text(1, "de")?.set_i64(2, row.get_i64(1)?)?;
//!         Ok(true)
//!     }
//! }
//!
//! let connection = mass_update::rusqlite::Connection::open("app.db")?;
//! let stats = MassUpdate::new(
//!     &connection,
//!     "SELECT id FROM customers WHERE country IS NULL",
//!     "UPDATE customers SET country=? WHERE id=?",
//! )
//! .row_plural_name("customers")
//! .execute(DefaultCountry)?;
//! println!("{} customers updated", stats.rows_written);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod batch;
mod binding;
mod clock;
mod cursor;
mod error;
mod mass_update;
mod progress;
mod row;
mod value;

pub mod backend;
pub mod migration;

pub use self::{
    backend::{Connection, Records, SelectStatement, UpdateStatement},
    batch::{BatchExecutor, DEFAULT_BATCH_SIZE},
    binding::UpdateBinding,
    clock::{Clock, SystemClock},
    cursor::RowCursor,
    error::{BackendError, Error},
    mass_update::{FromFn, Handler, MassUpdate, MassUpdateOptions, MassUpdateStats, from_fn},
    progress::ProgressLogger,
    row::Row,
    value::Value,
};

#[cfg(feature = "odbc")]
pub use self::backend::OdbcConnection;
// Reexports
/// Reexports `odbc-api` to enable applications to always use the same version as this crate.
#[cfg(feature = "odbc")]
pub use odbc_api;
/// Reexports `rusqlite` to enable applications to always use the same version as this crate.
#[cfg(feature = "sqlite")]
pub use rusqlite;
