use std::collections::{BTreeMap, HashMap};
use std::result::Result as DefaultResult;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};

use ecommerce_common::config::AppInMemoryDbCfg;

use super::{
    AbstDataStore, AppDStoreFilter, AppDStorePage, AppDStoreRow, AppDStoreTxn, AppDStoreValue,
    ID_FIELD,
};
use crate::error::{AppError, AppErrorCode};

// simple implementation of in-memory data storage, with single-writer
// transactions.
//
// A transaction holds the writer lock from `begin` until `commit` or
// `rollback`, and works on its own copy of all tables, so uncommitted
// writes are never visible to other readers. Writes without transaction
// also take the writer lock, a task which holds an open transaction MUST
// NOT write outside of it.

#[derive(Clone, Default)]
struct InnerTable {
    last_id: u64,
    rows: BTreeMap<u64, AppDStoreRow>,
}

type AllTable = HashMap<String, InnerTable>;

pub struct AppInMemTxn {
    _guard: OwnedMutexGuard<()>,
    staged: AllTable,
}

pub struct AppInMemoryDStore {
    max_items_per_table: u32,
    table_map: RwLock<AllTable>,
    writer: Arc<Mutex<()>>,
}

impl AppInMemoryDStore {
    pub fn new(cfg: &AppInMemoryDbCfg) -> Self {
        Self {
            max_items_per_table: cfg.max_items,
            table_map: RwLock::new(HashMap::new()),
            writer: Arc::new(Mutex::new(())),
        }
    }

    pub fn create_table(&self, label: &str) -> DefaultResult<(), AppError> {
        // only called at initialization, before the store is shared
        let mut guard = self.table_map.try_write().map_err(|e| AppError {
            detail: Some(e.to_string()),
            code: AppErrorCode::AcquireLockFailure,
        })?;
        guard.entry(label.to_string()).or_default();
        Ok(())
    }

    #[allow(unreachable_patterns)]
    fn staged_tables(txn: &mut AppDStoreTxn) -> DefaultResult<&mut AllTable, AppError> {
        match txn {
            AppDStoreTxn::InMem(t) => Ok(&mut t.staged),
            _others => Err(AppError {
                detail: Some("txn-not-from-inmem-store".to_string()),
                code: AppErrorCode::InvalidInput,
            }),
        }
    }

    #[allow(unreachable_patterns)]
    fn into_inmem_txn(txn: AppDStoreTxn) -> DefaultResult<Box<AppInMemTxn>, AppError> {
        match txn {
            AppDStoreTxn::InMem(t) => Ok(t),
            _others => Err(AppError {
                detail: Some("txn-not-from-inmem-store".to_string()),
                code: AppErrorCode::InvalidInput,
            }),
        }
    }

    fn get_table<'a>(map: &'a AllTable, label: &str) -> DefaultResult<&'a InnerTable, AppError> {
        map.get(label).ok_or_else(|| AppError {
            detail: Some(label.to_string()),
            code: AppErrorCode::DataTableNotExist,
        })
    }

    fn get_table_mut<'a>(
        map: &'a mut AllTable,
        label: &str,
    ) -> DefaultResult<&'a mut InnerTable, AppError> {
        map.get_mut(label).ok_or_else(|| AppError {
            detail: Some(label.to_string()),
            code: AppErrorCode::DataTableNotExist,
        })
    }

    fn _fetch_all(map: &AllTable, label: &str) -> DefaultResult<Vec<AppDStoreRow>, AppError> {
        let table = Self::get_table(map, label)?;
        Ok(table.rows.values().cloned().collect())
    }

    fn _fetch_some(
        map: &AllTable,
        label: &str,
        filter: &AppDStoreFilter,
        page: Option<&AppDStorePage>,
    ) -> DefaultResult<Vec<AppDStoreRow>, AppError> {
        let table = Self::get_table(map, label)?;
        let iter = table.rows.values().filter(|row| filter.matches(row));
        let out = if let Some(p) = page {
            iter.skip(p.offset()).take(p.limit()).cloned().collect()
        } else {
            iter.cloned().collect()
        };
        Ok(out)
    }

    fn _insert(
        &self,
        map: &mut AllTable,
        label: &str,
        mut row: AppDStoreRow,
    ) -> DefaultResult<AppDStoreRow, AppError> {
        let table = Self::get_table_mut(map, label)?;
        if self.max_items_per_table as usize <= table.rows.len() {
            let msg = format!("{}, {}, {}", module_path!(), line!(), label);
            return Err(AppError {
                detail: Some(msg),
                code: AppErrorCode::ExceedingMaxLimit,
            });
        }
        table.last_id += 1;
        let id_ = table.last_id;
        row.insert(ID_FIELD.to_string(), AppDStoreValue::UInt(id_));
        table.rows.insert(id_, row.clone());
        Ok(row)
    }

    fn _update(
        map: &mut AllTable,
        label: &str,
        id_: u64,
        mut row: AppDStoreRow,
    ) -> DefaultResult<Option<AppDStoreRow>, AppError> {
        let table = Self::get_table_mut(map, label)?;
        let out = table.rows.get_mut(&id_).map(|saved| {
            let _ = row.remove(ID_FIELD);
            saved.extend(row);
            saved.clone()
        });
        Ok(out)
    }

    fn _delete(
        map: &mut AllTable,
        label: &str,
        filter: &AppDStoreFilter,
    ) -> DefaultResult<usize, AppError> {
        let table = Self::get_table_mut(map, label)?;
        let num_before = table.rows.len();
        table.rows.retain(|_id, row| !filter.matches(row));
        Ok(num_before - table.rows.len())
    }
} // end of impl AppInMemoryDStore

#[async_trait]
impl AbstDataStore for AppInMemoryDStore {
    async fn begin(&self) -> DefaultResult<AppDStoreTxn, AppError> {
        let _guard = self.writer.clone().lock_owned().await;
        let staged = self.table_map.read().await.clone();
        let txn = AppInMemTxn { _guard, staged };
        Ok(AppDStoreTxn::InMem(Box::new(txn)))
    }

    async fn commit(&self, txn: AppDStoreTxn) -> DefaultResult<(), AppError> {
        let txn = Self::into_inmem_txn(txn)?;
        let AppInMemTxn { _guard, staged } = *txn;
        let mut map = self.table_map.write().await;
        *map = staged;
        Ok(())
    } // writer lock released at here

    async fn rollback(&self, txn: AppDStoreTxn) -> DefaultResult<(), AppError> {
        let _discarded = Self::into_inmem_txn(txn)?;
        Ok(())
    }

    async fn fetch_all(
        &self,
        table: &str,
        txn: Option<&mut AppDStoreTxn>,
    ) -> DefaultResult<Vec<AppDStoreRow>, AppError> {
        if let Some(t) = txn {
            Self::_fetch_all(Self::staged_tables(t)?, table)
        } else {
            let map = self.table_map.read().await;
            Self::_fetch_all(&map, table)
        }
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
        let rows = self.fetch_some(table, filter, Some(page), txn).await?;
        Ok(rows.into_iter().next())
    }

    async fn fetch_some(
        &self,
        table: &str,
        filter: AppDStoreFilter,
        page: Option<AppDStorePage>,
        txn: Option<&mut AppDStoreTxn>,
    ) -> DefaultResult<Vec<AppDStoreRow>, AppError> {
        if let Some(t) = txn {
            Self::_fetch_some(Self::staged_tables(t)?, table, &filter, page.as_ref())
        } else {
            let map = self.table_map.read().await;
            Self::_fetch_some(&map, table, &filter, page.as_ref())
        }
    }

    async fn insert(
        &self,
        table: &str,
        row: AppDStoreRow,
        txn: Option<&mut AppDStoreTxn>,
    ) -> DefaultResult<AppDStoreRow, AppError> {
        if let Some(t) = txn {
            self._insert(Self::staged_tables(t)?, table, row)
        } else {
            let _wguard = self.writer.lock().await;
            let mut map = self.table_map.write().await;
            self._insert(&mut map, table, row)
        }
    }

    async fn update(
        &self,
        table: &str,
        id_: u64,
        row: AppDStoreRow,
        txn: Option<&mut AppDStoreTxn>,
    ) -> DefaultResult<Option<AppDStoreRow>, AppError> {
        if let Some(t) = txn {
            Self::_update(Self::staged_tables(t)?, table, id_, row)
        } else {
            let _wguard = self.writer.lock().await;
            let mut map = self.table_map.write().await;
            Self::_update(&mut map, table, id_, row)
        }
    }

    async fn delete(
        &self,
        table: &str,
        filter: AppDStoreFilter,
        txn: Option<&mut AppDStoreTxn>,
    ) -> DefaultResult<usize, AppError> {
        if let Some(t) = txn {
            Self::_delete(Self::staged_tables(t)?, table, &filter)
        } else {
            let _wguard = self.writer.lock().await;
            let mut map = self.table_map.write().await;
            Self::_delete(&mut map, table, &filter)
        }
    }
} // end of impl AbstDataStore for AppInMemoryDStore
