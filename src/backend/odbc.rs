use odbc_api::{
    Bit, ConnectionOptions, Cursor, CursorImpl, DataType, Environment, Nullable, Prepared,
    ResultSetMetadata,
    handles::{StatementImpl, StatementRef},
    parameter::{InputParameter, VarBinaryBox, VarCharBox},
};

use crate::{Error, Value};

use super::{Connection, Records, SelectStatement, UpdateStatement};

/// Migrates any data source reachable through an ODBC driver.
///
/// # Example
///
/// ```no_run
/// use mass_update::{
///     OdbcConnection, SystemClock,
///     migration::{MigrationStep, v56},
/// };
/// use odbc_api::Environment;
///
/// let environment = Environment::new()?;
/// let connection = OdbcConnection::connect(
///     &environment,
///     "Driver={PostgreSQL UNICODE};Server=localhost;Database=sonar;Uid=sonar;Pwd=sonar;",
/// )?;
/// v56::UpdateUsersExternalIdentityWhenEmpty::new(&connection, SystemClock).execute()?;
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct OdbcConnection<'env> {
    connection: odbc_api::Connection<'env>,
}

impl<'env> OdbcConnection<'env> {
    pub fn new(connection: odbc_api::Connection<'env>) -> Self {
        Self { connection }
    }

    /// Opens a connection using a connection string, e.g.
    /// `Driver={SQLite3};Database=sonar.db`.
    pub fn connect(environment: &'env Environment, connection_string: &str) -> Result<Self, Error> {
        let connection = environment
            .connect_with_connection_string(connection_string, ConnectionOptions::default())
            .map_err(|e| Error::database("SQLDriverConnect", e))?;
        Ok(Self::new(connection))
    }

    /// Access the underlying ODBC connection, e.g. to create the schema in tests.
    pub fn as_odbc(&self) -> &odbc_api::Connection<'env> {
        &self.connection
    }
}

impl<'env> Connection for OdbcConnection<'env> {
    type Select<'c>
        = OdbcSelect<'c>
    where
        Self: 'c;
    type Update<'c>
        = OdbcUpdate<'c>
    where
        Self: 'c;

    fn prepare_select(&self, sql: &str) -> Result<OdbcSelect<'_>, Error> {
        let prepared = self
            .connection
            .prepare(sql)
            .map_err(|e| Error::database(sql, e))?;
        Ok(OdbcSelect {
            prepared,
            sql: sql.to_owned(),
        })
    }

    fn prepare_update(&self, sql: &str) -> Result<OdbcUpdate<'_>, Error> {
        let mut prepared = self
            .connection
            .prepare(sql)
            .map_err(|e| Error::database(sql, e))?;
        let parameter_count = prepared
            .num_params()
            .map_err(|e| Error::database(sql, e))?;
        Ok(OdbcUpdate {
            prepared,
            parameter_count,
            sql: sql.to_owned(),
        })
    }

    fn begin(&self) -> Result<(), Error> {
        self.connection
            .set_autocommit(false)
            .map_err(|e| Error::database("SQLSetConnectAttr(SQL_ATTR_AUTOCOMMIT, OFF)", e))
    }

    fn commit(&self) -> Result<(), Error> {
        self.connection
            .commit()
            .map_err(|e| Error::database("SQLEndTran(SQL_COMMIT)", e))?;
        self.connection
            .set_autocommit(true)
            .map_err(|e| Error::database("SQLSetConnectAttr(SQL_ATTR_AUTOCOMMIT, ON)", e))
    }

    fn rollback(&self) -> Result<(), Error> {
        self.connection
            .rollback()
            .map_err(|e| Error::database("SQLEndTran(SQL_ROLLBACK)", e))?;
        self.connection
            .set_autocommit(true)
            .map_err(|e| Error::database("SQLSetConnectAttr(SQL_ATTR_AUTOCOMMIT, ON)", e))
    }
}

/// Query prepared on an ODBC connection.
pub struct OdbcSelect<'c> {
    prepared: Prepared<StatementImpl<'c>>,
    sql: String,
}

impl SelectStatement for OdbcSelect<'_> {
    type Records<'s>
        = OdbcRecords<'s>
    where
        Self: 's;

    fn query(&mut self) -> Result<OdbcRecords<'_>, Error> {
        let sql = self.sql.as_str();
        let mut cursor = self
            .prepared
            .execute(())
            .map_err(|e| Error::database(sql, e))?;

        // Decide once per result set how each column is fetched.
        let mut kinds = Vec::new();
        if let Some(cursor) = cursor.as_mut() {
            let num_cols = cursor
                .num_result_cols()
                .map_err(|e| Error::database(sql, e))?;
            for column_number in 1..=num_cols.max(0) as u16 {
                let data_type = cursor
                    .col_data_type(column_number)
                    .map_err(|e| Error::database(sql, e))?;
                kinds.push(FetchAs::from(data_type));
            }
        }

        Ok(OdbcRecords {
            cursor,
            kinds,
            buffer: Vec::new(),
            sql,
        })
    }
}

/// How to fetch the values of a column using `SQLGetData`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FetchAs {
    Integer,
    Real,
    Text,
    Binary,
}

impl From<DataType> for FetchAs {
    fn from(data_type: DataType) -> Self {
        match data_type {
            DataType::TinyInt
            | DataType::SmallInt
            | DataType::Integer
            | DataType::BigInt
            | DataType::Bit => FetchAs::Integer,
            // Oracle reports integer columns as NUMBER without scale.
            DataType::Numeric {
                precision,
                scale: 0,
            }
            | DataType::Decimal {
                precision,
                scale: 0,
            } if precision <= 18 => FetchAs::Integer,
            DataType::Float { .. } | DataType::Real | DataType::Double => FetchAs::Real,
            DataType::Binary { .. } | DataType::Varbinary { .. } | DataType::LongVarbinary { .. } => {
                FetchAs::Binary
            }
            // Everything else, including decimals, dates and times, is passed on in its text
            // representation.
            _ => FetchAs::Text,
        }
    }
}

/// Result set of a query executed on an ODBC connection. Rows are fetched one at a time with
/// `SQLFetch` and `SQLGetData`, so nothing is buffered beyond the current row.
pub struct OdbcRecords<'s> {
    /// `None` if the statement did not create a result set.
    cursor: Option<CursorImpl<StatementRef<'s>>>,
    kinds: Vec<FetchAs>,
    /// Reused for variadic fields.
    buffer: Vec<u8>,
    sql: &'s str,
}

impl Records for OdbcRecords<'_> {
    fn fetch(&mut self, record: &mut Vec<Value>) -> Result<bool, Error> {
        let sql = self.sql;
        let Some(cursor) = self.cursor.as_mut() else {
            return Ok(false);
        };
        let mut row = match cursor.next_row().map_err(|e| Error::database(sql, e))? {
            Some(row) => row,
            None => return Ok(false),
        };
        for (index, kind) in self.kinds.iter().enumerate() {
            let column_number = (index + 1) as u16;
            let value = match kind {
                FetchAs::Integer => {
                    let mut field = Nullable::<i64>::null();
                    row.get_data(column_number, &mut field)
                        .map_err(|e| Error::database(sql, e))?;
                    field.into_opt().map_or(Value::Null, Value::Integer)
                }
                FetchAs::Real => {
                    let mut field = Nullable::<f64>::null();
                    row.get_data(column_number, &mut field)
                        .map_err(|e| Error::database(sql, e))?;
                    field.into_opt().map_or(Value::Null, Value::Real)
                }
                FetchAs::Text => {
                    let not_null = row
                        .get_text(column_number, &mut self.buffer)
                        .map_err(|e| Error::database(sql, e))?;
                    if not_null {
                        let text =
                            std::str::from_utf8(&self.buffer).map_err(|e| Error::database(sql, e))?;
                        Value::Text(text.to_owned())
                    } else {
                        Value::Null
                    }
                }
                FetchAs::Binary => {
                    let not_null = row
                        .get_binary(column_number, &mut self.buffer)
                        .map_err(|e| Error::database(sql, e))?;
                    if not_null {
                        Value::Blob(self.buffer.clone())
                    } else {
                        Value::Null
                    }
                }
            };
            record.push(value);
        }
        Ok(true)
    }
}

/// Statement prepared on an ODBC connection for repeated execution.
pub struct OdbcUpdate<'c> {
    prepared: Prepared<StatementImpl<'c>>,
    parameter_count: u16,
    sql: String,
}

impl UpdateStatement for OdbcUpdate<'_> {
    fn parameter_count(&self) -> u16 {
        self.parameter_count
    }

    fn execute(&mut self, parameters: &[Value]) -> Result<u64, Error> {
        let parameters: Vec<Box<dyn InputParameter>> =
            parameters.iter().map(input_parameter).collect();
        self.prepared
            .execute(parameters.as_slice())
            .map_err(|e| Error::database(&self.sql, e))?;
        // Drivers may not know the number of affected rows.
        let affected = self
            .prepared
            .row_count()
            .map_err(|e| Error::database(&self.sql, e))?
            .unwrap_or(0);
        Ok(affected as u64)
    }
}

fn input_parameter(value: &Value) -> Box<dyn InputParameter> {
    match value {
        Value::Null => Box::new(VarCharBox::null()),
        Value::Integer(i) => Box::new(*i),
        Value::Real(f) => Box::new(*f),
        Value::Boolean(b) => Box::new(Bit::from_bool(*b)),
        Value::Text(text) => Box::new(VarCharBox::from_string(text.clone())),
        Value::Blob(bytes) => Box::new(VarBinaryBox::from_vec(bytes.clone())),
    }
}
