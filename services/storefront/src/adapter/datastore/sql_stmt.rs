use std::result::Result as DefaultResult;

use super::{AppDStoreFilter, AppDStorePage, AppDStoreRow, AppDStoreValue, ID_FIELD};
use crate::error::{AppError, AppErrorCode};

// parameterized statements for the relational database, table and column
// names cannot be bound as parameters, they are validated then quoted
// instead.

#[derive(Debug)]
pub(super) struct SqlStmt {
    pub sql: String,
    pub params: Vec<AppDStoreValue>,
}

fn quote_ident(name: &str) -> DefaultResult<String, AppError> {
    let valid = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_');
    if valid {
        Ok(format!("`{}`", name))
    } else {
        Err(AppError::new(
            AppErrorCode::InvalidInput,
            format!("sql-identifier:{}", name),
        ))
    }
}

fn where_clause(
    filter: &AppDStoreFilter,
    params: &mut Vec<AppDStoreValue>,
) -> DefaultResult<String, AppError> {
    let col = quote_ident(filter.field.as_str())?;
    let out = if matches!(filter.value, AppDStoreValue::Null) {
        format!(" WHERE {} IS NULL", col)
    } else {
        params.push(filter.value.clone());
        format!(" WHERE {} = ?", col)
    };
    Ok(out)
}

pub(super) fn select(
    table: &str,
    filter: Option<&AppDStoreFilter>,
    page: Option<&AppDStorePage>,
    lock_rows: bool,
) -> DefaultResult<SqlStmt, AppError> {
    let mut params = Vec::new();
    let mut sql = format!("SELECT * FROM {}", quote_ident(table)?);
    if let Some(f) = filter {
        sql += where_clause(f, &mut params)?.as_str();
    }
    sql += format!(" ORDER BY {} ASC", quote_ident(ID_FIELD)?).as_str();
    if let Some(p) = page {
        sql += " LIMIT ? OFFSET ?";
        params.push(AppDStoreValue::UInt(p.limit() as u64));
        params.push(AppDStoreValue::UInt(p.offset() as u64));
    }
    if lock_rows {
        sql += " FOR UPDATE";
    }
    Ok(SqlStmt { sql, params })
}

pub(super) fn select_by_id(table: &str, id_: u64) -> DefaultResult<SqlStmt, AppError> {
    let filter = AppDStoreFilter::by_id(id_);
    select(table, Some(&filter), None, false)
}

// columns are sorted, so identical rows always produce identical
// statements, the id column is assigned by the database.
pub(super) fn insert(table: &str, row: &AppDStoreRow) -> DefaultResult<SqlStmt, AppError> {
    let mut cols = row
        .iter()
        .filter(|(k, _v)| k.as_str() != ID_FIELD)
        .collect::<Vec<_>>();
    cols.sort_by(|a, b| a.0.cmp(b.0));
    if cols.is_empty() {
        return Err(AppError::new(
            AppErrorCode::EmptyInputData,
            format!("sql-insert-no-column:{}", table),
        ));
    }
    let mut names = Vec::with_capacity(cols.len());
    let mut params = Vec::with_capacity(cols.len());
    for (k, v) in cols {
        names.push(quote_ident(k)?);
        params.push(v.clone());
    }
    let placeholders = vec!["?"; names.len()].join(",");
    let sql = format!(
        "INSERT INTO {} ({}) VALUES ({})",
        quote_ident(table)?,
        names.join(","),
        placeholders
    );
    Ok(SqlStmt { sql, params })
}

pub(super) fn update(
    table: &str,
    id_: u64,
    row: &AppDStoreRow,
) -> DefaultResult<SqlStmt, AppError> {
    let mut cols = row
        .iter()
        .filter(|(k, _v)| k.as_str() != ID_FIELD)
        .collect::<Vec<_>>();
    cols.sort_by(|a, b| a.0.cmp(b.0));
    if cols.is_empty() {
        return Err(AppError::new(
            AppErrorCode::EmptyInputData,
            format!("sql-update-no-column:{}", table),
        ));
    }
    let mut assigns = Vec::with_capacity(cols.len());
    let mut params = Vec::with_capacity(cols.len() + 1);
    for (k, v) in cols {
        assigns.push(format!("{} = ?", quote_ident(k)?));
        params.push(v.clone());
    }
    params.push(AppDStoreValue::UInt(id_));
    let sql = format!(
        "UPDATE {} SET {} WHERE {} = ?",
        quote_ident(table)?,
        assigns.join(", "),
        quote_ident(ID_FIELD)?
    );
    Ok(SqlStmt { sql, params })
}

pub(super) fn delete(table: &str, filter: &AppDStoreFilter) -> DefaultResult<SqlStmt, AppError> {
    let mut params = Vec::new();
    let cond = where_clause(filter, &mut params)?;
    let sql = format!("DELETE FROM {}{}", quote_ident(table)?, cond);
    Ok(SqlStmt { sql, params })
}
