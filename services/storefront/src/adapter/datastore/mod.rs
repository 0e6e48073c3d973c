mod in_mem;
mod sql_db;
#[cfg(any(feature = "mariadb", test))]
mod sql_stmt;

use std::boxed::Box;
use std::collections::HashMap;
use std::result::Result as DefaultResult;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use ecommerce_common::confidentiality::AbstractConfidentiality;
use ecommerce_common::config::{AppDataStoreCfg, AppInMemoryDbCfg};
use ecommerce_common::logging::{app_log_event, AppLogContext, AppLogLevel};

use crate::constant::tables;
use crate::error::{AppError, AppErrorCode};

pub use in_mem::{AppInMemTxn, AppInMemoryDStore};
pub use sql_db::AppMariaDbStore;

pub const ID_FIELD: &str = "id";

/// Column value of a row, the only loosely-typed shape in this crate,
/// it never leaves the repository layer
#[derive(Debug, Clone, PartialEq)]
pub enum AppDStoreValue {
    Null,
    UInt(u64),
    Int(i64),
    Str(String),
    Decimal(Decimal),
    Bool(bool),
    DateTime(DateTime<Utc>),
}

pub type AppDStoreRow = HashMap<String, AppDStoreValue>;

impl From<u64> for AppDStoreValue {
    fn from(value: u64) -> Self {
        Self::UInt(value)
    }
}
impl From<u32> for AppDStoreValue {
    fn from(value: u32) -> Self {
        Self::UInt(value as u64)
    }
}
impl From<u8> for AppDStoreValue {
    fn from(value: u8) -> Self {
        Self::UInt(value as u64)
    }
}
impl From<i64> for AppDStoreValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}
impl From<String> for AppDStoreValue {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}
impl From<&str> for AppDStoreValue {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}
impl From<Decimal> for AppDStoreValue {
    fn from(value: Decimal) -> Self {
        Self::Decimal(value)
    }
}
impl From<bool> for AppDStoreValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}
impl From<DateTime<Utc>> for AppDStoreValue {
    fn from(value: DateTime<Utc>) -> Self {
        Self::DateTime(value)
    }
}
impl<T: Into<AppDStoreValue>> From<Option<T>> for AppDStoreValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Self::Null)
    }
}

/// equality condition on single column
#[derive(Debug, Clone)]
pub struct AppDStoreFilter {
    pub field: String,
    pub value: AppDStoreValue,
}

impl AppDStoreFilter {
    pub fn new(field: &str, value: impl Into<AppDStoreValue>) -> Self {
        Self {
            field: field.to_string(),
            value: value.into(),
        }
    }
    pub fn by_id(id_: u64) -> Self {
        Self::new(ID_FIELD, id_)
    }
    pub(crate) fn matches(&self, row: &AppDStoreRow) -> bool {
        let actual = row.get(self.field.as_str()).unwrap_or(&AppDStoreValue::Null);
        actual == &self.value
    }
}

/// rows are ordered by id ascending, page number starts from 1
#[derive(Debug, Clone)]
pub struct AppDStorePage {
    pub page: u32,
    pub per_page: u32,
}

impl AppDStorePage {
    pub(crate) fn offset(&self) -> usize {
        (self.page.max(1) as usize - 1) * self.limit()
    }
    pub(crate) fn limit(&self) -> usize {
        self.per_page.max(1) as usize
    }
}

/// Handle of an open transaction, opaque to callers. It can only be
/// consumed by `commit` or `rollback` of the store which created it.
pub enum AppDStoreTxn {
    InMem(Box<AppInMemTxn>),
    #[cfg(feature = "mariadb")]
    MariaDb(sqlx::Transaction<'static, sqlx::MySql>),
}

// the store instance is shared across await points by concurrent
// requests, it is the reason to add `Send` and `Sync` as super-traits
#[async_trait]
pub trait AbstDataStore: Send + Sync {
    async fn begin(&self) -> DefaultResult<AppDStoreTxn, AppError>;
    async fn commit(&self, txn: AppDStoreTxn) -> DefaultResult<(), AppError>;
    async fn rollback(&self, txn: AppDStoreTxn) -> DefaultResult<(), AppError>;

    async fn fetch_all(
        &self,
        table: &str,
        txn: Option<&mut AppDStoreTxn>,
    ) -> DefaultResult<Vec<AppDStoreRow>, AppError>;

    // inside a transaction the fetched row is locked for update until
    // the transaction ends, where the store supports it
    async fn fetch_one(
        &self,
        table: &str,
        filter: AppDStoreFilter,
        txn: Option<&mut AppDStoreTxn>,
    ) -> DefaultResult<Option<AppDStoreRow>, AppError>;

    async fn fetch_some(
        &self,
        table: &str,
        filter: AppDStoreFilter,
        page: Option<AppDStorePage>,
        txn: Option<&mut AppDStoreTxn>,
    ) -> DefaultResult<Vec<AppDStoreRow>, AppError>;

    /// the store assigns the id, any id in the given row is ignored
    async fn insert(
        &self,
        table: &str,
        row: AppDStoreRow,
        txn: Option<&mut AppDStoreTxn>,
    ) -> DefaultResult<AppDStoreRow, AppError>;

    /// overwrite the given columns of the row, return `None` if the id
    /// does not exist
    async fn update(
        &self,
        table: &str,
        id_: u64,
        row: AppDStoreRow,
        txn: Option<&mut AppDStoreTxn>,
    ) -> DefaultResult<Option<AppDStoreRow>, AppError>;

    async fn delete(
        &self,
        table: &str,
        filter: AppDStoreFilter,
        txn: Option<&mut AppDStoreTxn>,
    ) -> DefaultResult<usize, AppError>;
}

/// in-memory store with all the tables the storefront needs
pub fn app_inmem_dstore(cfg: &AppInMemoryDbCfg) -> DefaultResult<AppInMemoryDStore, AppError> {
    let store = AppInMemoryDStore::new(cfg);
    for label in tables::ALL {
        store.create_table(label)?;
    }
    Ok(store)
}

pub(crate) fn build_context(
    logctx: Arc<AppLogContext>,
    cfg: &[AppDataStoreCfg],
    confidential: Arc<Box<dyn AbstractConfidentiality>>,
) -> DefaultResult<Box<dyn AbstDataStore>, AppError> {
    let mut inmem = None;
    for c in cfg {
        match c {
            AppDataStoreCfg::InMemory(d) => {
                if inmem.is_none() {
                    inmem = Some(app_inmem_dstore(d)?);
                }
            }
            AppDataStoreCfg::DbServer(d) => match AppMariaDbStore::try_build(d, confidential.clone()) {
                #[cfg(feature = "mariadb")]
                Ok(item) => {
                    app_log_event!(logctx, AppLogLevel::INFO, "sql-db-selected, alias:{}", item.alias);
                    return Ok(Box::new(item));
                }
                #[cfg(not(feature = "mariadb"))]
                Ok(_item) => {}
                Err(e) => {
                    app_log_event!(logctx, AppLogLevel::ERROR, "{}", e);
                }
            },
        }
    } // relational database server is preferred over in-memory store
    if let Some(m) = inmem {
        Ok(Box::new(m))
    } else {
        Err(AppError::new(AppErrorCode::MissingDataStore, "no-usable-dstore"))
    }
}
