//! Query descriptors: a SQL template plus its positional parameter values.

use rusqlite::types::{ToSql, ToSqlOutput, ValueRef};
use serde::ser::{Serialize, Serializer};
use std::fmt::Write as _;

use crate::error::{Error, Result};

/// Core value types for parameters and column values
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
    Boolean(bool),
}

impl Value {
    /// SQL literal form, used when rendering a statement for the log.
    pub fn to_sql_literal(&self) -> String {
        match self {
            Value::Null => "NULL".to_string(),
            Value::Integer(i) => i.to_string(),
            // SQLite stores NaN as NULL and has no infinity literal.
            Value::Real(f) if !f.is_finite() => "NULL".to_string(),
            Value::Real(f) => f.to_string(),
            Value::Text(s) => format!("'{}'", s.replace('\'', "''")),
            Value::Blob(bytes) => {
                let mut out = String::with_capacity(bytes.len() * 2 + 3);
                out.push_str("X'");
                for b in bytes {
                    let _ = write!(out, "{:02X}", b);
                }
                out.push('\'');
                out
            }
            Value::Boolean(b) => String::from(if *b { "1" } else { "0" }),
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Real(f) => Some(*f),
            Value::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

impl From<ValueRef<'_>> for Value {
    fn from(value: ValueRef<'_>) -> Self {
        match value {
            ValueRef::Null => Value::Null,
            ValueRef::Integer(i) => Value::Integer(i),
            ValueRef::Real(f) => Value::Real(f),
            ValueRef::Text(t) => Value::Text(String::from_utf8_lossy(t).into_owned()),
            ValueRef::Blob(b) => Value::Blob(b.to_vec()),
        }
    }
}

impl ToSql for Value {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            Value::Null => ToSqlOutput::Borrowed(ValueRef::Null),
            Value::Integer(i) => ToSqlOutput::Borrowed(ValueRef::Integer(*i)),
            Value::Real(f) => ToSqlOutput::Borrowed(ValueRef::Real(*f)),
            Value::Text(s) => ToSqlOutput::Borrowed(ValueRef::Text(s.as_bytes())),
            Value::Blob(b) => ToSqlOutput::Borrowed(ValueRef::Blob(b)),
            Value::Boolean(b) => ToSqlOutput::Borrowed(ValueRef::Integer(i64::from(*b))),
        })
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_none(),
            Value::Integer(i) => serializer.serialize_i64(*i),
            Value::Real(f) => serializer.serialize_f64(*f),
            Value::Text(s) => serializer.serialize_str(s),
            Value::Blob(b) => b.serialize(serializer),
            Value::Boolean(b) => serializer.serialize_bool(*b),
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Integer(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Integer(i64::from(v))
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Value::Integer(i64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Real(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Boolean(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Blob(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

/// Positional parameter bindings, matched to `?` placeholders left to right
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Params {
    pub values: Vec<Value>,
}

impl Params {
    /// Create a new Params object
    pub fn new() -> Self {
        Self::default()
    }

    /// Append the next positional value
    pub fn with_value(mut self, value: impl Into<Value>) -> Self {
        self.values.push(value.into());
        self
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<V: Into<Value>> FromIterator<V> for Params {
    fn from_iter<I: IntoIterator<Item = V>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().map(Into::into).collect(),
        }
    }
}

/// Build a [`Params`] list from heterogeneous values.
///
/// ```
/// use raw_queries::params;
/// let p = params!["Ann Duong", "dog"];
/// assert_eq!(p.len(), 2);
/// ```
#[macro_export]
macro_rules! params {
    () => {
        $crate::query::Params::new()
    };
    ($($value:expr),+ $(,)?) => {
        $crate::query::Params::new()$(.with_value($value))+
    };
}

/// SQL Query with typed positional parameters
#[derive(Debug, Clone, PartialEq)]
pub struct SqlQuery {
    pub statement: String,
    pub params: Params,
}

impl SqlQuery {
    pub fn new(statement: &str) -> Self {
        Self {
            statement: statement.to_string(),
            params: Params::new(),
        }
    }

    pub fn with_params(mut self, params: Params) -> Self {
        self.params = params;
        self
    }

    pub fn bind(mut self, value: impl Into<Value>) -> Self {
        self.params.values.push(value.into());
        self
    }

    /// Number of parameters the statement takes.
    ///
    /// Follows SQLite numbering: a bare `?` takes the next index after the
    /// largest seen so far, `?NNN` takes index `NNN`, and the count is the
    /// largest index. Placeholders inside literals, quoted identifiers and
    /// comments are ignored.
    pub fn placeholder_count(&self) -> usize {
        parameter_count(&placeholders(&self.statement))
    }

    /// Render the statement with every placeholder replaced by its value's
    /// SQL literal. Only for display; execution always binds.
    pub fn interpolate(&self) -> Result<String> {
        let found = placeholders(&self.statement);
        let expected = parameter_count(&found);
        if expected != self.params.len() {
            return Err(Error::BindingCount {
                expected,
                found: self.params.len(),
            });
        }

        let mut out = String::with_capacity(self.statement.len());
        let mut last = 0;
        for placeholder in &found {
            out.push_str(&self.statement[last..placeholder.start]);
            out.push_str(&self.params.values[placeholder.index - 1].to_sql_literal());
            last = placeholder.end;
        }
        out.push_str(&self.statement[last..]);
        Ok(out)
    }
}

/// A `?` or `?NNN` placeholder: its byte span and 1-based parameter index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Placeholder {
    start: usize,
    end: usize,
    index: usize,
}

fn parameter_count(placeholders: &[Placeholder]) -> usize {
    placeholders.iter().map(|p| p.index).max().unwrap_or(0)
}

fn placeholders(sql: &str) -> Vec<Placeholder> {
    enum State {
        Code,
        SingleQuoted,
        DoubleQuoted,
        LineComment,
        BlockComment,
    }

    let bytes = sql.as_bytes();
    let mut found = Vec::new();
    let mut highest = 0;
    let mut state = State::Code;
    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i];
        let next = bytes.get(i + 1).copied();
        match state {
            State::Code => match b {
                b'?' => {
                    let digits = bytes[i + 1..]
                        .iter()
                        .take_while(|d| d.is_ascii_digit())
                        .count();
                    let end = i + 1 + digits;
                    // `?0` is rejected by SQLite itself; render it as the next index.
                    let index = match sql[i + 1..end].parse::<usize>() {
                        Ok(n) if n > 0 => n,
                        _ => highest + 1,
                    };
                    highest = highest.max(index);
                    found.push(Placeholder { start: i, end, index });
                    i = end;
                    continue;
                }
                b'\'' => state = State::SingleQuoted,
                b'"' => state = State::DoubleQuoted,
                b'-' if next == Some(b'-') => {
                    state = State::LineComment;
                    i += 1;
                }
                b'/' if next == Some(b'*') => {
                    state = State::BlockComment;
                    i += 1;
                }
                _ => {}
            },
            // A doubled quote closes and reopens, which leaves us inside the literal.
            State::SingleQuoted if b == b'\'' => state = State::Code,
            State::DoubleQuoted if b == b'"' => state = State::Code,
            State::LineComment if b == b'\n' => state = State::Code,
            State::BlockComment if b == b'*' && next == Some(b'/') => {
                state = State::Code;
                i += 1;
            }
            _ => {}
        }
        i += 1;
    }
    found
}
