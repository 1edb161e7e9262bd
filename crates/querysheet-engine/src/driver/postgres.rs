//! PostgreSQL adapter backed by `tokio-postgres`.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use querysheet_common::SqlValue;
use tokio_postgres::types::{FromSql, Type};
use tokio_postgres::{NoTls, Row};
use tracing::warn;

use super::{Driver, block_on};
use crate::error::{BoxError, EngineError};
use crate::scan::{QueryResult, RowCursor, scan_rows};

pub struct PostgresDriver;

impl Driver for PostgresDriver {
    fn name(&self) -> &'static str {
        "postgres"
    }

    fn aliases(&self) -> &'static [&'static str] {
        &["postgresql", "pg"]
    }

    /// `connection` is a libpq key/value string or a `postgres://` URL.
    fn execute(&self, connection: &str, sql: &str) -> Result<QueryResult, EngineError> {
        block_on(async {
            let (client, conn) = tokio_postgres::connect(connection, NoTls)
                .await
                .map_err(EngineError::connection)?;
            tokio::spawn(async move {
                if let Err(err) = conn.await {
                    warn!(error = %err, "postgres connection error");
                }
            });

            let stmt = client.prepare(sql).await.map_err(EngineError::query)?;
            let columns = stmt
                .columns()
                .iter()
                .map(|c| c.name().to_string())
                .collect();
            let rows = client.query(&stmt, &[]).await.map_err(EngineError::query)?;
            let mut cursor = PgCursor {
                columns,
                rows: rows.into_iter(),
            };
            scan_rows(&mut cursor)
        })?
    }
}

struct PgCursor {
    columns: Vec<String>,
    rows: std::vec::IntoIter<Row>,
}

impl RowCursor for PgCursor {
    type Error = tokio_postgres::Error;

    fn column_names(&mut self) -> Result<Vec<String>, tokio_postgres::Error> {
        Ok(self.columns.clone())
    }

    fn next_row(&mut self, slots: &mut [SqlValue]) -> Result<bool, tokio_postgres::Error> {
        let Some(row) = self.rows.next() else {
            return Ok(false);
        };
        for (idx, slot) in slots.iter_mut().enumerate() {
            *slot = cell_value(&row, idx)?;
        }
        Ok(true)
    }
}

/// How a column's type is read off the wire.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PgKind {
    Bool,
    Int2,
    Int4,
    Int8,
    Oid,
    Float4,
    Float8,
    Numeric,
    Text,
    Bytes,
    Timestamp,
    TimestampTz,
    Date,
    Unsupported,
}

impl PgKind {
    pub fn of(ty: &Type) -> Self {
        match *ty {
            Type::BOOL => PgKind::Bool,
            Type::INT2 => PgKind::Int2,
            Type::INT4 => PgKind::Int4,
            Type::INT8 => PgKind::Int8,
            Type::OID => PgKind::Oid,
            Type::FLOAT4 => PgKind::Float4,
            Type::FLOAT8 => PgKind::Float8,
            Type::NUMERIC => PgKind::Numeric,
            Type::TEXT | Type::VARCHAR | Type::BPCHAR | Type::NAME | Type::CHAR => PgKind::Text,
            Type::BYTEA => PgKind::Bytes,
            Type::TIMESTAMP => PgKind::Timestamp,
            Type::TIMESTAMPTZ => PgKind::TimestampTz,
            Type::DATE => PgKind::Date,
            _ => PgKind::Unsupported,
        }
    }
}

fn cell_value(row: &Row, idx: usize) -> Result<SqlValue, tokio_postgres::Error> {
    let ty = row.columns()[idx].type_();
    let value = match PgKind::of(ty) {
        PgKind::Bool => row.try_get::<_, Option<bool>>(idx)?.map(SqlValue::Boolean),
        PgKind::Int2 => row
            .try_get::<_, Option<i16>>(idx)?
            .map(|v| SqlValue::Int(v.into())),
        PgKind::Int4 => row
            .try_get::<_, Option<i32>>(idx)?
            .map(|v| SqlValue::Int(v.into())),
        PgKind::Int8 => row.try_get::<_, Option<i64>>(idx)?.map(SqlValue::Int),
        PgKind::Oid => row
            .try_get::<_, Option<u32>>(idx)?
            .map(|v| SqlValue::Int(v.into())),
        PgKind::Float4 => row
            .try_get::<_, Option<f32>>(idx)?
            .map(|v| SqlValue::Float(v.into())),
        PgKind::Float8 => row.try_get::<_, Option<f64>>(idx)?.map(SqlValue::Float),
        PgKind::Numeric => row
            .try_get::<_, Option<PgNumeric>>(idx)?
            .map(PgNumeric::into_value),
        PgKind::Text => row.try_get::<_, Option<String>>(idx)?.map(SqlValue::Text),
        PgKind::Bytes => row.try_get::<_, Option<Vec<u8>>>(idx)?.map(SqlValue::Bytes),
        PgKind::Timestamp => row
            .try_get::<_, Option<NaiveDateTime>>(idx)?
            .map(SqlValue::Timestamp),
        PgKind::TimestampTz => row
            .try_get::<_, Option<DateTime<Utc>>>(idx)?
            .map(|v| SqlValue::Timestamp(v.naive_utc())),
        PgKind::Date => row
            .try_get::<_, Option<NaiveDate>>(idx)?
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(SqlValue::Timestamp),
        PgKind::Unsupported => row
            .try_get::<_, Presence>(idx)?
            .0
            .then(|| SqlValue::unsupported(ty.name())),
    };
    Ok(value.unwrap_or(SqlValue::Null))
}

/// A `numeric` value in its exact decimal text form.
#[derive(Debug, PartialEq, Eq)]
struct PgNumeric(String);

const NUMERIC_NEG: u16 = 0x4000;
const NUMERIC_NAN: u16 = 0xC000;
const NUMERIC_PINF: u16 = 0xD000;
const NUMERIC_NINF: u16 = 0xF000;

impl PgNumeric {
    /// Finite values become floats; `NaN` and the infinities stay text.
    fn into_value(self) -> SqlValue {
        match self.0.parse::<f64>() {
            Ok(v) if v.is_finite() => SqlValue::Float(v),
            _ => SqlValue::Text(self.0),
        }
    }
}

impl<'a> FromSql<'a> for PgNumeric {
    /// Binary layout: ndigits, weight, sign, dscale (all 16-bit), then
    /// `ndigits` base-10000 digits, most significant first.
    fn from_sql(_: &Type, raw: &'a [u8]) -> Result<Self, BoxError> {
        let word = |at: usize| -> Result<u16, BoxError> {
            raw.get(at..at + 2)
                .map(|b| u16::from_be_bytes([b[0], b[1]]))
                .ok_or_else(|| "numeric value is truncated".into())
        };
        let ndigits = word(0)? as i16;
        let weight = i32::from(word(2)? as i16);
        let sign = word(4)?;
        let dscale = usize::from(word(6)?);
        let digits = (0..ndigits.max(0) as usize)
            .map(|k| word(8 + 2 * k))
            .collect::<Result<Vec<_>, _>>()?;

        let text = match sign {
            NUMERIC_NAN => return Ok(PgNumeric("NaN".to_string())),
            NUMERIC_PINF => return Ok(PgNumeric("Infinity".to_string())),
            NUMERIC_NINF => return Ok(PgNumeric("-Infinity".to_string())),
            0 | NUMERIC_NEG => {
                let digit = |k: i32| {
                    usize::try_from(k)
                        .ok()
                        .and_then(|k| digits.get(k).copied())
                        .unwrap_or(0)
                };
                let mut text = String::new();
                if sign == NUMERIC_NEG {
                    text.push('-');
                }
                if weight < 0 {
                    text.push('0');
                } else {
                    text.push_str(&digit(0).to_string());
                    for k in 1..=weight {
                        text.push_str(&format!("{:04}", digit(k)));
                    }
                }
                if dscale > 0 {
                    let mut fraction = String::new();
                    let mut k = weight + 1;
                    while fraction.len() < dscale {
                        fraction.push_str(&format!("{:04}", digit(k)));
                        k += 1;
                    }
                    fraction.truncate(dscale);
                    text.push('.');
                    text.push_str(&fraction);
                }
                text
            }
            other => return Err(format!("invalid numeric sign {other:#06x}").into()),
        };
        Ok(PgNumeric(text))
    }

    fn accepts(ty: &Type) -> bool {
        *ty == Type::NUMERIC
    }
}

/// Accepts any type and records only whether the value is non-null.
struct Presence(bool);

impl<'a> FromSql<'a> for Presence {
    fn from_sql(_: &Type, _: &'a [u8]) -> Result<Self, BoxError> {
        Ok(Presence(true))
    }

    fn from_sql_null(_: &Type) -> Result<Self, BoxError> {
        Ok(Presence(false))
    }

    fn accepts(_: &Type) -> bool {
        true
    }
}
