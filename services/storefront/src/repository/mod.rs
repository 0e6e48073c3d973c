mod cart;
mod catalog;
mod coupon;
mod order;
mod row;
mod user;

use std::boxed::Box;
use std::marker::PhantomData;
use std::result::Result as DefaultResult;
use std::sync::Arc;

use crate::adapter::datastore::{
    AbstDataStore, AppDStoreFilter, AppDStorePage, AppDStoreRow, AppDStoreTxn, AppDStoreValue,
};
use crate::error::{AppError, AppErrorCode};

pub(crate) use row::{new_row, RowReader};

/// Typed record of a single table. Conversion to / from the loosely-typed
/// rows of the datastore only happens in this layer.
pub trait AppTableEntity: Sized + Send + Sync {
    const TABLE: &'static str;
    fn id(&self) -> u64;
    fn into_row(self) -> AppDStoreRow;
    fn try_from_row(row: AppDStoreRow) -> DefaultResult<Self, AppError>;
}

/// Generic CRUD over one table. Every operation optionally runs inside a
/// transaction opened by the caller from the same datastore.
pub struct AppTableRepo<T> {
    dstore: Arc<Box<dyn AbstDataStore>>,
    _entity: PhantomData<fn() -> T>,
}

impl<T> Clone for AppTableRepo<T> {
    fn clone(&self) -> Self {
        Self::new(self.dstore.clone())
    }
}

impl<T> AppTableRepo<T> {
    pub fn new(dstore: Arc<Box<dyn AbstDataStore>>) -> Self {
        Self {
            dstore,
            _entity: PhantomData,
        }
    }

    pub fn datastore(&self) -> Arc<Box<dyn AbstDataStore>> {
        self.dstore.clone()
    }
}

fn convert_rows<T: AppTableEntity>(rows: Vec<AppDStoreRow>) -> DefaultResult<Vec<T>, AppError> {
    rows.into_iter().map(T::try_from_row).collect()
}

impl<T: AppTableEntity> AppTableRepo<T> {
    pub async fn all(&self, txn: Option<&mut AppDStoreTxn>) -> DefaultResult<Vec<T>, AppError> {
        let rows = self.dstore.fetch_all(T::TABLE, txn).await?;
        convert_rows(rows)
    }

    pub async fn one(
        &self,
        id_: u64,
        txn: Option<&mut AppDStoreTxn>,
    ) -> DefaultResult<Option<T>, AppError> {
        let filter = AppDStoreFilter::by_id(id_);
        self.one_with(filter, txn).await
    }

    pub async fn one_by<V: Into<AppDStoreValue>>(
        &self,
        field: &str,
        value: V,
        txn: Option<&mut AppDStoreTxn>,
    ) -> DefaultResult<Option<T>, AppError> {
        let filter = AppDStoreFilter::new(field, value);
        self.one_with(filter, txn).await
    }

    async fn one_with(
        &self,
        filter: AppDStoreFilter,
        txn: Option<&mut AppDStoreTxn>,
    ) -> DefaultResult<Option<T>, AppError> {
        match self.dstore.fetch_one(T::TABLE, filter, txn).await? {
            Some(row) => T::try_from_row(row).map(Some),
            None => Ok(None),
        }
    }

    pub async fn some<V: Into<AppDStoreValue>>(
        &self,
        field: &str,
        value: V,
        page: Option<AppDStorePage>,
        txn: Option<&mut AppDStoreTxn>,
    ) -> DefaultResult<Vec<T>, AppError> {
        let filter = AppDStoreFilter::new(field, value);
        let rows = self.dstore.fetch_some(T::TABLE, filter, page, txn).await?;
        convert_rows(rows)
    }

    /// return the saved entity with the id assigned by the datastore
    pub async fn add(&self, entity: T, txn: Option<&mut AppDStoreTxn>) -> DefaultResult<T, AppError> {
        let row = entity.into_row();
        let saved = self.dstore.insert(T::TABLE, row, txn).await?;
        T::try_from_row(saved)
    }

    pub async fn edit(&self, entity: T, txn: Option<&mut AppDStoreTxn>) -> DefaultResult<T, AppError> {
        let id_ = entity.id();
        let row = entity.into_row();
        match self.dstore.update(T::TABLE, id_, row, txn).await? {
            Some(saved) => T::try_from_row(saved),
            None => {
                let detail = format!("table:{}, id:{}", T::TABLE, id_);
                Err(AppError::new(AppErrorCode::NotFound, detail))
            }
        }
    }

    pub async fn delete(
        &self,
        id_: u64,
        txn: Option<&mut AppDStoreTxn>,
    ) -> DefaultResult<usize, AppError> {
        let filter = AppDStoreFilter::by_id(id_);
        self.dstore.delete(T::TABLE, filter, txn).await
    }

    pub async fn delete_by<V: Into<AppDStoreValue>>(
        &self,
        field: &str,
        value: V,
        txn: Option<&mut AppDStoreTxn>,
    ) -> DefaultResult<usize, AppError> {
        let filter = AppDStoreFilter::new(field, value);
        self.dstore.delete(T::TABLE, filter, txn).await
    }
} // end of impl AppTableRepo
