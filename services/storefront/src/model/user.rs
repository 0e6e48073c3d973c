use std::result::Result as DefaultResult;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppErrorCode};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum UserRole {
    Customer,
    Admin,
}

impl UserRole {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Customer => "customer",
            Self::Admin => "admin",
        }
    }
}

impl FromStr for UserRole {
    type Err = AppError;
    fn from_str(s: &str) -> DefaultResult<Self, Self::Err> {
        match s {
            "customer" => Ok(Self::Customer),
            "admin" => Ok(Self::Admin),
            _others => Err(AppError::new(
                AppErrorCode::InvalidInput,
                format!("user-role:{}", s),
            )),
        }
    }
}

// account data beyond identity and role is maintained by the
// authentication service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserModel {
    pub id: u64,
    pub username: String,
    pub email: String,
    pub role: UserRole,
}

impl UserModel {
    pub fn is_admin(&self) -> bool {
        matches!(self.role, UserRole::Admin)
    }
}
