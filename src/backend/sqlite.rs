use rusqlite::{
    Rows, Statement, params_from_iter,
    types::{ToSql, ToSqlOutput, ValueRef},
};

use crate::{Error, Value};

use super::{Connection, Records, SelectStatement, UpdateStatement};

impl Connection for rusqlite::Connection {
    type Select<'c> = SqliteSelect<'c>;
    type Update<'c> = SqliteUpdate<'c>;

    fn prepare_select(&self, sql: &str) -> Result<SqliteSelect<'_>, Error> {
        let statement = self.prepare(sql).map_err(|e| Error::database(sql, e))?;
        Ok(SqliteSelect {
            statement,
            sql: sql.to_owned(),
        })
    }

    fn prepare_update(&self, sql: &str) -> Result<SqliteUpdate<'_>, Error> {
        let statement = self.prepare(sql).map_err(|e| Error::database(sql, e))?;
        Ok(SqliteUpdate {
            statement,
            sql: sql.to_owned(),
        })
    }

    fn begin(&self) -> Result<(), Error> {
        execute_command(self, "BEGIN")
    }

    fn commit(&self) -> Result<(), Error> {
        execute_command(self, "COMMIT")
    }

    fn rollback(&self) -> Result<(), Error> {
        execute_command(self, "ROLLBACK")
    }
}

fn execute_command(connection: &rusqlite::Connection, command: &str) -> Result<(), Error> {
    connection
        .execute_batch(command)
        .map_err(|e| Error::database(command, e))
}

/// Query prepared on a SQLite connection.
pub struct SqliteSelect<'c> {
    statement: Statement<'c>,
    sql: String,
}

impl SelectStatement for SqliteSelect<'_> {
    type Records<'s>
        = SqliteRecords<'s>
    where
        Self: 's;

    fn query(&mut self) -> Result<SqliteRecords<'_>, Error> {
        let column_count = self.statement.column_count();
        let rows = self
            .statement
            .query([])
            .map_err(|e| Error::database(&self.sql, e))?;
        Ok(SqliteRecords {
            rows,
            column_count,
            sql: &self.sql,
        })
    }
}

/// Result set of a query executed on a SQLite connection. SQLite steps through the result set
/// one row at a time, so nothing is buffered beyond the current row.
pub struct SqliteRecords<'s> {
    rows: Rows<'s>,
    column_count: usize,
    sql: &'s str,
}

impl Records for SqliteRecords<'_> {
    fn fetch(&mut self, record: &mut Vec<Value>) -> Result<bool, Error> {
        let row = match self.rows.next().map_err(|e| Error::database(self.sql, e))? {
            Some(row) => row,
            None => return Ok(false),
        };
        for index in 0..self.column_count {
            let field = row.get_ref(index).map_err(|e| Error::database(self.sql, e))?;
            let value = match field {
                ValueRef::Null => Value::Null,
                ValueRef::Integer(i) => Value::Integer(i),
                ValueRef::Real(f) => Value::Real(f),
                ValueRef::Text(bytes) => {
                    let text = std::str::from_utf8(bytes).map_err(|e| Error::database(self.sql, e))?;
                    Value::Text(text.to_owned())
                }
                ValueRef::Blob(bytes) => Value::Blob(bytes.to_vec()),
            };
            record.push(value);
        }
        Ok(true)
    }
}

/// Statement prepared on a SQLite connection for repeated execution.
pub struct SqliteUpdate<'c> {
    statement: Statement<'c>,
    sql: String,
}

impl UpdateStatement for SqliteUpdate<'_> {
    fn parameter_count(&self) -> u16 {
        // SQLite limits the number of parameters to 32766.
        self.statement.parameter_count().try_into().unwrap_or(u16::MAX)
    }

    fn execute(&mut self, parameters: &[Value]) -> Result<u64, Error> {
        let affected = self
            .statement
            .execute(params_from_iter(parameters))
            .map_err(|e| Error::database(&self.sql, e))?;
        Ok(affected as u64)
    }
}

impl ToSql for Value {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        let borrowed = match self {
            Value::Null => ValueRef::Null,
            Value::Integer(i) => ValueRef::Integer(*i),
            Value::Real(f) => ValueRef::Real(*f),
            Value::Boolean(b) => ValueRef::Integer(i64::from(*b)),
            Value::Text(text) => ValueRef::Text(text.as_bytes()),
            Value::Blob(bytes) => ValueRef::Blob(bytes),
        };
        Ok(ToSqlOutput::Borrowed(borrowed))
    }
}
