use std::boxed::Box;
use std::result::Result as DefaultResult;
use std::sync::Arc;

#[cfg(feature = "mariadb")]
use std::io::ErrorKind;
#[cfg(feature = "mariadb")]
use std::ops::DerefMut;
#[cfg(feature = "mariadb")]
use std::time::Duration;

#[cfg(feature = "mariadb")]
use async_trait::async_trait;
#[cfg(feature = "mariadb")]
use chrono::{DateTime, Utc};
#[cfg(feature = "mariadb")]
use futures_util::stream::{BoxStream, TryStreamExt};
#[cfg(feature = "mariadb")]
use rust_decimal::Decimal;
#[cfg(feature = "mariadb")]
use serde::Deserialize;
#[cfg(feature = "mariadb")]
use sqlx::error::Error;
#[cfg(feature = "mariadb")]
use sqlx::mysql::{MySqlArguments, MySqlConnectOptions, MySqlRow};
#[cfg(feature = "mariadb")]
use sqlx::pool::{PoolConnection, PoolOptions};
#[cfg(feature = "mariadb")]
use sqlx::{Arguments, Column, MySql, Pool, Row, Transaction, TypeInfo};

use ecommerce_common::confidentiality::AbstractConfidentiality;
use ecommerce_common::config::AppDbServerCfg;
#[cfg(feature = "mariadb")]
use ecommerce_common::config::AppDbServerType;

#[cfg(feature = "mariadb")]
use super::sql_stmt::{self, SqlStmt};
#[cfg(feature = "mariadb")]
use super::{
    AbstDataStore, AppDStoreFilter, AppDStorePage, AppDStoreRow, AppDStoreTxn, AppDStoreValue,
};
use crate::error::{AppError, AppErrorCode};

#[cfg(feature = "mariadb")]
impl From<Error> for AppError {
    fn from(value: Error) -> Self {
        let (code, detail) = match value {
            Error::Configuration(e) => (
                AppErrorCode::InvalidInput,
                e.to_string() + " invalid-db-config",
            ),
            Error::Io(e) => (
                AppErrorCode::IOerror(e.kind()),
                e.to_string() + " io-err-mariadb",
            ),
            Error::Database(e) => (AppErrorCode::RemoteDbServerFailure, e.to_string()),
            Error::Protocol(errmsg) => (AppErrorCode::IOerror(ErrorKind::InvalidData), errmsg),
            Error::Decode(e) => (AppErrorCode::DataCorruption, e.to_string()),
            Error::ColumnDecode { index, source } => (
                AppErrorCode::DataCorruption,
                source.to_string() + ", when decoding column at idx " + index.as_str(),
            ),
            Error::ColumnNotFound(col_name) => {
                (AppErrorCode::DataCorruption, col_name + " no-col")
            }
            Error::PoolTimedOut => (AppErrorCode::DatabaseServerBusy, "no-conn-avail".to_string()),
            Error::PoolClosed => (AppErrorCode::Unknown, "pool-closed".to_string()),
            others => (AppErrorCode::Unknown, others.to_string()),
        };
        Self {
            code,
            detail: Some(detail),
        }
    }
} // end of impl AppError

#[cfg(feature = "mariadb")]
#[allow(non_snake_case)]
#[derive(Deserialize)]
struct DbSecret {
    HOST: String,
    PORT: u16,
    USER: String,
    PASSWORD: String,
}

#[cfg(feature = "mariadb")]
pub struct AppMariaDbStore {
    pub alias: String,
    pool: Pool<MySql>,
}
#[cfg(not(feature = "mariadb"))]
pub struct AppMariaDbStore {}

#[cfg(feature = "mariadb")]
impl AppMariaDbStore {
    pub fn try_build(
        cfg: &AppDbServerCfg,
        confidential: Arc<Box<dyn AbstractConfidentiality>>,
    ) -> DefaultResult<Self, AppError> {
        if !matches!(cfg.srv_type, AppDbServerType::MariaDB) {
            let detail = format!("db-cfg-server-type: {:?}", cfg.srv_type);
            return Err(AppError::new(AppErrorCode::InvalidInput, detail));
        }
        let serial = confidential.try_get_payload(cfg.confidentiality_path.as_str())?;
        let conn_opts = match serde_json::from_str::<DbSecret>(serial.as_str()) {
            Ok(s) => MySqlConnectOptions::new()
                .host(s.HOST.as_str())
                .port(s.PORT)
                .username(s.USER.as_str())
                .password(s.PASSWORD.as_str())
                .database(cfg.db_name.as_str()),
            Err(e) => {
                let detail = e.to_string() + ", secret-parsing-error, source: AppMariaDbStore";
                return Err(AppError::new(AppErrorCode::InvalidJsonFormat, detail));
            }
        };
        let pol_opts = PoolOptions::<MySql>::new()
            .max_connections(cfg.max_conns)
            .idle_timeout(Some(Duration::new(cfg.idle_timeout_secs as u64, 0)))
            .acquire_timeout(Duration::new(cfg.acquire_timeout_secs as u64, 0))
            .min_connections(0);
        let pool = pol_opts.connect_lazy_with(conn_opts);
        Ok(Self {
            pool,
            alias: cfg.alias.clone(),
        })
    }

    async fn acquire(&self) -> DefaultResult<PoolConnection<MySql>, AppError> {
        let conn = self.pool.acquire().await?;
        Ok(conn)
    }

    fn mariadb_txn(txn: &mut AppDStoreTxn) -> DefaultResult<&mut Transaction<'static, MySql>, AppError> {
        match txn {
            AppDStoreTxn::MariaDb(t) => Ok(t),
            _others => Err(AppError::new(
                AppErrorCode::InvalidInput,
                "txn-not-from-mariadb-store",
            )),
        }
    }

    async fn run_fetch(
        &self,
        stmt: SqlStmt,
        txn: Option<&mut AppDStoreTxn>,
    ) -> DefaultResult<Vec<AppDStoreRow>, AppError> {
        let args = bind_params(stmt.params)?;
        let query = sqlx::query_with(stmt.sql.as_str(), args);
        if let Some(t) = txn {
            let tx = Self::mariadb_txn(t)?;
            collect_rows(query.fetch(tx.deref_mut())).await
        } else {
            let mut conn = self.acquire().await?;
            collect_rows(query.fetch(&mut *conn)).await
        }
    }

    // return number of affected rows and last inserted id
    async fn run_execute(
        &self,
        stmt: SqlStmt,
        txn: Option<&mut AppDStoreTxn>,
    ) -> DefaultResult<(u64, u64), AppError> {
        let args = bind_params(stmt.params)?;
        let query = sqlx::query_with(stmt.sql.as_str(), args);
        let resultset = if let Some(t) = txn {
            let tx = Self::mariadb_txn(t)?;
            query.execute(tx.deref_mut()).await?
        } else {
            let mut conn = self.acquire().await?;
            query.execute(&mut *conn).await?
        };
        Ok((resultset.rows_affected(), resultset.last_insert_id()))
    }
} // end of impl AppMariaDbStore

#[cfg(feature = "mariadb")]
fn bind_params(params: Vec<AppDStoreValue>) -> DefaultResult<MySqlArguments, AppError> {
    let mut args = MySqlArguments::default();
    for v in params {
        let result = match v {
            AppDStoreValue::Null => args.add(Option::<String>::None),
            AppDStoreValue::UInt(n) => args.add(n),
            AppDStoreValue::Int(n) => args.add(n),
            AppDStoreValue::Str(s) => args.add(s),
            AppDStoreValue::Decimal(d) => args.add(d),
            AppDStoreValue::Bool(b) => args.add(b),
            AppDStoreValue::DateTime(t) => args.add(t),
        };
        result.map_err(|e| AppError::new(AppErrorCode::InvalidInput, e.to_string()))?;
    }
    Ok(args)
}

#[cfg(feature = "mariadb")]
async fn collect_rows(
    mut stream: BoxStream<'_, DefaultResult<MySqlRow, Error>>,
) -> DefaultResult<Vec<AppDStoreRow>, AppError> {
    let mut out = Vec::new();
    while let Some(row) = stream.try_next().await? {
        out.push(decode_row(&row)?);
    }
    Ok(out)
}

// column values are decoded by the declared column type, so the schema
// in `migrations/` decides the value variant seen by repositories
#[cfg(feature = "mariadb")]
fn decode_row(row: &MySqlRow) -> DefaultResult<AppDStoreRow, AppError> {
    let mut out = AppDStoreRow::new();
    for col in row.columns() {
        let idx = col.ordinal();
        let tname = col.type_info().name();
        let value: AppDStoreValue = if tname.ends_with("UNSIGNED") {
            row.try_get::<Option<u64>, usize>(idx)?.into()
        } else if tname == "BOOLEAN" {
            row.try_get::<Option<bool>, usize>(idx)?.into()
        } else if tname.ends_with("INT") {
            row.try_get::<Option<i64>, usize>(idx)?.into()
        } else if tname == "DECIMAL" {
            row.try_get::<Option<Decimal>, usize>(idx)?.into()
        } else if tname == "DATETIME" || tname == "TIMESTAMP" {
            row.try_get::<Option<DateTime<Utc>>, usize>(idx)?.into()
        } else {
            row.try_get::<Option<String>, usize>(idx)?.into()
        };
        out.insert(col.name().to_string(), value);
    }
    Ok(out)
}

#[cfg(feature = "mariadb")]
#[async_trait]
impl AbstDataStore for AppMariaDbStore {
    async fn begin(&self) -> DefaultResult<AppDStoreTxn, AppError> {
        let tx = self.pool.begin().await?;
        Ok(AppDStoreTxn::MariaDb(tx))
    }

    async fn commit(&self, txn: AppDStoreTxn) -> DefaultResult<(), AppError> {
        match txn {
            AppDStoreTxn::MariaDb(tx) => Ok(tx.commit().await?),
            _others => Err(AppError::new(
                AppErrorCode::InvalidInput,
                "txn-not-from-mariadb-store",
            )),
        }
    }

    async fn rollback(&self, txn: AppDStoreTxn) -> DefaultResult<(), AppError> {
        match txn {
            AppDStoreTxn::MariaDb(tx) => Ok(tx.rollback().await?),
            _others => Err(AppError::new(
                AppErrorCode::InvalidInput,
                "txn-not-from-mariadb-store",
            )),
        }
    }

    async fn fetch_all(
        &self,
        table: &str,
        txn: Option<&mut AppDStoreTxn>,
    ) -> DefaultResult<Vec<AppDStoreRow>, AppError> {
        let stmt = sql_stmt::select(table, None, None, false)?;
        self.run_fetch(stmt, txn).await
    }

    async fn fetch_one(
        &self,
        table: &str,
        filter: AppDStoreFilter,
        txn: Option<&mut AppDStoreTxn>,
    ) -> DefaultResult<Option<AppDStoreRow>, AppError> {
        let page = AppDStorePage {
            page: 1,
            per_page: 1,
        };
        let lock_rows = txn.is_some();
        let stmt = sql_stmt::select(table, Some(&filter), Some(&page), lock_rows)?;
        let rows = self.run_fetch(stmt, txn).await?;
        Ok(rows.into_iter().next())
    }

    async fn fetch_some(
        &self,
        table: &str,
        filter: AppDStoreFilter,
        page: Option<AppDStorePage>,
        txn: Option<&mut AppDStoreTxn>,
    ) -> DefaultResult<Vec<AppDStoreRow>, AppError> {
        let lock_rows = txn.is_some();
        let stmt = sql_stmt::select(table, Some(&filter), page.as_ref(), lock_rows)?;
        self.run_fetch(stmt, txn).await
    }

    async fn insert(
        &self,
        table: &str,
        row: AppDStoreRow,
        mut txn: Option<&mut AppDStoreTxn>,
    ) -> DefaultResult<AppDStoreRow, AppError> {
        let stmt = sql_stmt::insert(table, &row)?;
        let (_num_affected, last_id) = self.run_execute(stmt, txn.as_deref_mut()).await?;
        let stmt = sql_stmt::select_by_id(table, last_id)?;
        let rows = self.run_fetch(stmt, txn).await?;
        rows.into_iter().next().ok_or_else(|| {
            let detail = format!("inserted-row-missing, table:{}, id:{}", table, last_id);
            AppError::new(AppErrorCode::DataCorruption, detail)
        })
    }

    async fn update(
        &self,
        table: &str,
        id_: u64,
        row: AppDStoreRow,
        mut txn: Option<&mut AppDStoreTxn>,
    ) -> DefaultResult<Option<AppDStoreRow>, AppError> {
        // number of affected rows is zero when the new values equal to
        // the saved ones, existence is checked by re-reading the row
        let stmt = sql_stmt::update(table, id_, &row)?;
        let _num_affected = self.run_execute(stmt, txn.as_deref_mut()).await?;
        let stmt = sql_stmt::select_by_id(table, id_)?;
        let rows = self.run_fetch(stmt, txn).await?;
        Ok(rows.into_iter().next())
    }

    async fn delete(
        &self,
        table: &str,
        filter: AppDStoreFilter,
        txn: Option<&mut AppDStoreTxn>,
    ) -> DefaultResult<usize, AppError> {
        let stmt = sql_stmt::delete(table, &filter)?;
        let (num_affected, _last_id) = self.run_execute(stmt, txn).await?;
        Ok(num_affected as usize)
    }
} // end of impl AbstDataStore for AppMariaDbStore

#[cfg(not(feature = "mariadb"))]
impl AppMariaDbStore {
    pub fn try_build(
        cfg: &AppDbServerCfg,
        _confidential: Arc<Box<dyn AbstractConfidentiality>>,
    ) -> DefaultResult<Self, AppError> {
        let detail = format!(
            "sql-db, type:{:?}, alias:{}",
            cfg.srv_type,
            cfg.alias.as_str()
        );
        Err(AppError::new(AppErrorCode::FeatureDisabled, detail))
    }
}
