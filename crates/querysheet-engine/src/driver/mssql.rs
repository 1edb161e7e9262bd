//! SQL Server adapter backed by `tiberius`.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use querysheet_common::SqlValue;
use tiberius::{Client, ColumnData, Config, Row};
use tokio::net::TcpStream;
use tokio_util::compat::TokioAsyncWriteCompatExt;

use super::{Driver, block_on};
use crate::error::EngineError;
use crate::scan::{QueryResult, RowCursor, scan_rows};

pub struct MssqlDriver;

impl Driver for MssqlDriver {
    fn name(&self) -> &'static str {
        "mssql"
    }

    fn aliases(&self) -> &'static [&'static str] {
        &["sqlserver"]
    }

    /// `connection` is an ADO.NET string, e.g.
    /// `server=tcp:localhost,1433;user=sa;password=...;TrustServerCertificate=true`.
    fn execute(&self, connection: &str, sql: &str) -> Result<QueryResult, EngineError> {
        let config = Config::from_ado_string(connection).map_err(EngineError::connection)?;
        block_on(async {
            let tcp = TcpStream::connect(config.get_addr())
                .await
                .map_err(|err| {
                    EngineError::Connection(format!(
                        "failed to reach {}: {err}",
                        config.get_addr()
                    ))
                })?;
            tcp.set_nodelay(true).map_err(EngineError::connection)?;
            let mut client = Client::connect(config, tcp.compat_write())
                .await
                .map_err(EngineError::connection)?;

            let mut stream = client.simple_query(sql).await.map_err(EngineError::query)?;
            let columns = stream
                .columns()
                .await
                .map_err(EngineError::query)?
                .map(|cols| cols.iter().map(|c| c.name().to_string()).collect())
                .unwrap_or_default();
            let rows = stream.into_first_result().await.map_err(EngineError::query)?;
            let mut cursor = MssqlCursor {
                columns,
                rows: rows.into_iter(),
            };
            scan_rows(&mut cursor)
        })?
    }
}

struct MssqlCursor {
    columns: Vec<String>,
    rows: std::vec::IntoIter<Row>,
}

impl RowCursor for MssqlCursor {
    type Error = tiberius::error::Error;

    fn column_names(&mut self) -> Result<Vec<String>, tiberius::error::Error> {
        Ok(self.columns.clone())
    }

    fn next_row(&mut self, slots: &mut [SqlValue]) -> Result<bool, tiberius::error::Error> {
        let Some(row) = self.rows.next() else {
            return Ok(false);
        };
        for ((idx, (_, data)), slot) in row.cells().enumerate().zip(slots.iter_mut()) {
            *slot = match column_value(data) {
                Some(value) => value,
                None => temporal_value(&row, idx, data)?,
            };
        }
        Ok(true)
    }
}

/// Values readable straight off [`ColumnData`]. `None` for date and time
/// types, which need a typed getter on the row.
pub fn column_value(data: &ColumnData<'_>) -> Option<SqlValue> {
    let value = match data {
        ColumnData::Bit(Some(b)) => SqlValue::Boolean(*b),
        ColumnData::U8(Some(v)) => SqlValue::Int((*v).into()),
        ColumnData::I16(Some(v)) => SqlValue::Int((*v).into()),
        ColumnData::I32(Some(v)) => SqlValue::Int((*v).into()),
        ColumnData::I64(Some(v)) => SqlValue::Int(*v),
        ColumnData::F32(Some(v)) => SqlValue::Float((*v).into()),
        ColumnData::F64(Some(v)) => SqlValue::Float(*v),
        ColumnData::Numeric(Some(n)) => {
            SqlValue::Float(n.value() as f64 / 10f64.powi(i32::from(n.scale())))
        }
        ColumnData::String(Some(s)) => SqlValue::Text(s.to_string()),
        ColumnData::Guid(Some(g)) => SqlValue::Text(g.to_string()),
        ColumnData::Binary(Some(b)) => SqlValue::Bytes(b.to_vec()),
        ColumnData::Xml(Some(xml)) => SqlValue::Text(xml.to_string()),
        ColumnData::Time(Some(_)) => SqlValue::unsupported("time"),
        ColumnData::DateTime(Some(_))
        | ColumnData::SmallDateTime(Some(_))
        | ColumnData::DateTime2(Some(_))
        | ColumnData::DateTimeOffset(Some(_))
        | ColumnData::Date(Some(_)) => return None,
        // every remaining variant carries None
        _ => SqlValue::Null,
    };
    Some(value)
}

fn temporal_value(
    row: &Row,
    idx: usize,
    data: &ColumnData<'_>,
) -> Result<SqlValue, tiberius::error::Error> {
    let value = match data {
        ColumnData::DateTimeOffset(_) => row
            .try_get::<DateTime<Utc>, _>(idx)?
            .map(|dt| SqlValue::Timestamp(dt.naive_utc())),
        ColumnData::Date(_) => row
            .try_get::<NaiveDate, _>(idx)?
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(SqlValue::Timestamp),
        _ => row
            .try_get::<NaiveDateTime, _>(idx)?
            .map(SqlValue::Timestamp),
    };
    Ok(value.unwrap_or(SqlValue::Null))
}
