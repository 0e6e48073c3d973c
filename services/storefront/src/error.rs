use std::fmt::{Debug, Display};

pub use ecommerce_common::error::AppErrorCode;
use ecommerce_common::error::{AppCfgError, AppConfidentialityError};

#[derive(Debug, Clone)]
pub struct AppError {
    pub code: AppErrorCode,
    pub detail: Option<String>,
}

impl Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let dp = self.detail.as_deref().unwrap_or("none");
        write!(f, "code:{:?}, detail:{}", self.code, dp)
    }
}

impl AppError {
    pub(crate) fn new(code: AppErrorCode, detail: impl Into<String>) -> Self {
        Self {
            code,
            detail: Some(detail.into()),
        }
    }

    /// message safe to show to end users, internal detail of server-side
    /// errors is never exposed
    pub fn public_reason(&self) -> String {
        if self.code.is_client_error() {
            self.detail.clone().unwrap_or_else(|| format!("{:?}", self.code))
        } else {
            "internal-error".to_string()
        }
    }
}

impl From<AppCfgError> for AppError {
    fn from(value: AppCfgError) -> Self {
        AppError {
            code: value.code,
            detail: value.detail,
        }
    }
}
impl From<AppConfidentialityError> for AppError {
    fn from(value: AppConfidentialityError) -> Self {
        AppError {
            code: value.code,
            detail: Some(value.detail),
        }
    }
}
impl From<(AppErrorCode, String)> for AppError {
    fn from(value: (AppErrorCode, String)) -> Self {
        AppError {
            code: value.0,
            detail: Some(value.1),
        }
    }
}
