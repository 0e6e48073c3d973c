use std::result::Result as DefaultResult;

use super::{new_row, AppTableEntity, RowReader};
use crate::adapter::datastore::AppDStoreRow;
use crate::constant::tables;
use crate::error::AppError;
use crate::model::UserModel;

impl AppTableEntity for UserModel {
    const TABLE: &'static str = tables::USERS;

    fn id(&self) -> u64 {
        self.id
    }

    fn into_row(self) -> AppDStoreRow {
        new_row([
            ("id", self.id.into()),
            ("username", self.username.into()),
            ("email", self.email.into()),
            ("role", self.role.label().into()),
        ])
    }

    fn try_from_row(row: AppDStoreRow) -> DefaultResult<Self, AppError> {
        let mut r = RowReader::new(Self::TABLE, row);
        Ok(Self {
            id: r.u64("id")?,
            username: r.string("username")?,
            email: r.string("email")?,
            role: r.parse("role")?,
        })
    }
}
