use crate::{Error, Value};

/// The current record of a [`crate::RowCursor`]. Columns are addressed by their 1-based position
/// in the projection of the select statement.
///
/// A `Row` borrows the cursor it has been fetched from. Advancing the cursor requires a mutable
/// borrow, so a row can not be retained past the handler invocation it has been passed to.
///
/// Every typed getter comes in two flavours. `get_nullable_*` maps `NULL` to `None`. The strict
/// variant returns [`Error::UnexpectedNull`] instead.
#[derive(Debug, Clone, Copy)]
pub struct Row<'c> {
    values: &'c [Value],
}

impl<'c> Row<'c> {
    pub fn new(values: &'c [Value]) -> Self {
        Row { values }
    }

    /// Number of columns in the projection.
    pub fn column_count(&self) -> u16 {
        self.values.len().try_into().unwrap_or(u16::MAX)
    }

    /// Raw value of a column. Column index starts at `1`.
    pub fn value(&self, position: u16) -> Result<&'c Value, Error> {
        position
            .checked_sub(1)
            .and_then(|index| self.values.get(usize::from(index)))
            .ok_or(Error::ColumnOutOfRange {
                position,
                column_count: self.column_count(),
            })
    }

    pub fn is_null(&self, position: u16) -> Result<bool, Error> {
        Ok(self.value(position)?.is_null())
    }

    pub fn get_nullable_i64(&self, position: u16) -> Result<Option<i64>, Error> {
        match self.value(position)? {
            Value::Null => Ok(None),
            Value::Integer(i) => Ok(Some(*i)),
            Value::Boolean(b) => Ok(Some(i64::from(*b))),
            other => Err(unexpected_type(position, "i64", other)),
        }
    }

    pub fn get_i64(&self, position: u16) -> Result<i64, Error> {
        self.get_nullable_i64(position)?
            .ok_or(Error::UnexpectedNull { position })
    }

    pub fn get_nullable_i32(&self, position: u16) -> Result<Option<i32>, Error> {
        match self.get_nullable_i64(position)? {
            None => Ok(None),
            Some(wide) => i32::try_from(wide).map(Some).map_err(|_| Error::UnexpectedType {
                position,
                expected: "i32",
                actual: "INTEGER out of range",
            }),
        }
    }

    pub fn get_i32(&self, position: u16) -> Result<i32, Error> {
        self.get_nullable_i32(position)?
            .ok_or(Error::UnexpectedNull { position })
    }

    pub fn get_nullable_f64(&self, position: u16) -> Result<Option<f64>, Error> {
        match self.value(position)? {
            Value::Null => Ok(None),
            Value::Real(f) => Ok(Some(*f)),
            Value::Integer(i) => Ok(Some(*i as f64)),
            other => Err(unexpected_type(position, "f64", other)),
        }
    }

    pub fn get_f64(&self, position: u16) -> Result<f64, Error> {
        self.get_nullable_f64(position)?
            .ok_or(Error::UnexpectedNull { position })
    }

    /// Integers are accepted as long as they are either `0` or `1`. Some databases (e.g. SQLite)
    /// have no dedicated boolean type.
    pub fn get_nullable_bool(&self, position: u16) -> Result<Option<bool>, Error> {
        match self.value(position)? {
            Value::Null => Ok(None),
            Value::Boolean(b) => Ok(Some(*b)),
            Value::Integer(0) => Ok(Some(false)),
            Value::Integer(1) => Ok(Some(true)),
            other => Err(unexpected_type(position, "bool", other)),
        }
    }

    pub fn get_bool(&self, position: u16) -> Result<bool, Error> {
        self.get_nullable_bool(position)?
            .ok_or(Error::UnexpectedNull { position })
    }

    pub fn get_nullable_text(&self, position: u16) -> Result<Option<&'c str>, Error> {
        match self.value(position)? {
            Value::Null => Ok(None),
            Value::Text(text) => Ok(Some(text.as_str())),
            other => Err(unexpected_type(position, "text", other)),
        }
    }

    pub fn get_text(&self, position: u16) -> Result<&'c str, Error> {
        self.get_nullable_text(position)?
            .ok_or(Error::UnexpectedNull { position })
    }

    pub fn get_nullable_bytes(&self, position: u16) -> Result<Option<&'c [u8]>, Error> {
        match self.value(position)? {
            Value::Null => Ok(None),
            Value::Blob(bytes) => Ok(Some(bytes.as_slice())),
            Value::Text(text) => Ok(Some(text.as_bytes())),
            other => Err(unexpected_type(position, "bytes", other)),
        }
    }

    pub fn get_bytes(&self, position: u16) -> Result<&'c [u8], Error> {
        self.get_nullable_bytes(position)?
            .ok_or(Error::UnexpectedNull { position })
    }
}

fn unexpected_type(position: u16, expected: &'static str, actual: &Value) -> Error {
    Error::UnexpectedType {
        position,
        expected,
        actual: actual.type_name(),
    }
}
