use std::result::Result as DefaultResult;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::adapter::datastore::{AppDStoreRow, AppDStoreValue};
use crate::error::{AppError, AppErrorCode};

/// Typed access to the columns of a fetched row. Any missing column or
/// mismatched value is reported as data corruption of the table.
pub(crate) struct RowReader {
    table: &'static str,
    row: AppDStoreRow,
}

impl RowReader {
    pub(crate) fn new(table: &'static str, row: AppDStoreRow) -> Self {
        Self { table, row }
    }

    fn corrupted(&self, field: &str, reason: &str) -> AppError {
        let detail = format!("table:{}, field:{}, {}", self.table, field, reason);
        AppError::new(AppErrorCode::DataCorruption, detail)
    }

    fn take(&mut self, field: &str) -> AppDStoreValue {
        self.row.remove(field).unwrap_or(AppDStoreValue::Null)
    }

    pub(crate) fn opt_u64(&mut self, field: &str) -> DefaultResult<Option<u64>, AppError> {
        match self.take(field) {
            AppDStoreValue::Null => Ok(None),
            AppDStoreValue::UInt(v) => Ok(Some(v)),
            AppDStoreValue::Int(v) => u64::try_from(v)
                .map(Some)
                .map_err(|_e| self.corrupted(field, "negative")),
            _others => Err(self.corrupted(field, "not-integer")),
        }
    }

    pub(crate) fn u64(&mut self, field: &str) -> DefaultResult<u64, AppError> {
        self.opt_u64(field)?
            .ok_or_else(|| self.corrupted(field, "missing"))
    }

    pub(crate) fn opt_u32(&mut self, field: &str) -> DefaultResult<Option<u32>, AppError> {
        match self.opt_u64(field)? {
            Some(v) => u32::try_from(v)
                .map(Some)
                .map_err(|_e| self.corrupted(field, "overflow")),
            None => Ok(None),
        }
    }

    pub(crate) fn u32(&mut self, field: &str) -> DefaultResult<u32, AppError> {
        self.opt_u32(field)?
            .ok_or_else(|| self.corrupted(field, "missing"))
    }

    pub(crate) fn u8(&mut self, field: &str) -> DefaultResult<u8, AppError> {
        let v = self.u64(field)?;
        u8::try_from(v).map_err(|_e| self.corrupted(field, "overflow"))
    }

    pub(crate) fn opt_string(&mut self, field: &str) -> DefaultResult<Option<String>, AppError> {
        match self.take(field) {
            AppDStoreValue::Null => Ok(None),
            AppDStoreValue::Str(v) => Ok(Some(v)),
            _others => Err(self.corrupted(field, "not-text")),
        }
    }

    pub(crate) fn string(&mut self, field: &str) -> DefaultResult<String, AppError> {
        self.opt_string(field)?
            .ok_or_else(|| self.corrupted(field, "missing"))
    }

    pub(crate) fn parse<T: FromStr>(&mut self, field: &str) -> DefaultResult<T, AppError> {
        let raw = self.string(field)?;
        raw.parse::<T>()
            .map_err(|_e| self.corrupted(field, raw.as_str()))
    }

    pub(crate) fn decimal(&mut self, field: &str) -> DefaultResult<Decimal, AppError> {
        match self.take(field) {
            AppDStoreValue::Decimal(v) => Ok(v),
            AppDStoreValue::UInt(v) => Ok(Decimal::from(v)),
            AppDStoreValue::Int(v) => Ok(Decimal::from(v)),
            AppDStoreValue::Str(v) => Decimal::from_str(v.as_str())
                .map_err(|_e| self.corrupted(field, "not-decimal")),
            AppDStoreValue::Null => Err(self.corrupted(field, "missing")),
            _others => Err(self.corrupted(field, "not-decimal")),
        }
    }

    pub(crate) fn bool(&mut self, field: &str) -> DefaultResult<bool, AppError> {
        match self.take(field) {
            AppDStoreValue::Bool(v) => Ok(v),
            // tinyint columns of some database servers
            AppDStoreValue::UInt(v) => Ok(v != 0),
            AppDStoreValue::Int(v) => Ok(v != 0),
            AppDStoreValue::Null => Err(self.corrupted(field, "missing")),
            _others => Err(self.corrupted(field, "not-boolean")),
        }
    }

    pub(crate) fn datetime(&mut self, field: &str) -> DefaultResult<DateTime<Utc>, AppError> {
        match self.take(field) {
            AppDStoreValue::DateTime(v) => Ok(v),
            AppDStoreValue::Str(v) => DateTime::parse_from_rfc3339(v.as_str())
                .map(|t| t.with_timezone(&Utc))
                .map_err(|_e| self.corrupted(field, "not-datetime")),
            AppDStoreValue::Null => Err(self.corrupted(field, "missing")),
            _others => Err(self.corrupted(field, "not-datetime")),
        }
    }
} // end of impl RowReader

/// build a row from column-value pairs
pub(crate) fn new_row<const N: usize>(cols: [(&str, AppDStoreValue); N]) -> AppDStoreRow {
    cols.into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect()
}
