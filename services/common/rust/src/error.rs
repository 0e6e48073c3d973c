use std::fmt::{Debug, Display};

#[derive(Debug, Clone, PartialEq)]
pub enum AppErrorCode {
    Unknown,
    NotImplemented,
    MissingSysBasePath,
    MissingAppBasePath,
    MissingSecretPath,
    MissingConfigPath,
    MissingDataStore,
    InvalidJsonFormat,
    MissingAliasLogHdlerCfg,
    MissingAliasLoggerCfg,
    NoLogHandlerCfg,
    NoLoggerCfg,
    FeatureDisabled,
    NoHandlerInLoggerCfg,
    InvalidHandlerLoggerCfg,
    InvalidCacheCfg,
    EmptyInputData, // for internal server error, do NOT dump detail to client
    InvalidInput,   // for client error
    NoConfidentialityCfg,
    NoDatabaseCfg,
    RemoteDbServerFailure,
    RemoteCacheFailure,
    ExceedingMaxLimit,
    AcquireLockFailure,
    DatabaseServerBusy,
    DataTableNotExist,
    DataCorruption,
    // business-rule outcomes of the storefront
    NotFound,
    InvalidState,
    InsufficientStock,
    PermissionDenied,
    TransactionFailure,
    CacheFailure,
    IOerror(std::io::ErrorKind),
} // end of AppErrorCode

impl AppErrorCode {
    /// errors caused by the caller's request, safe to describe to end users
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::NotFound
                | Self::InvalidState
                | Self::InsufficientStock
                | Self::PermissionDenied
                | Self::InvalidInput
        )
    }
}

pub struct AppCfgError {
    pub code: AppErrorCode,
    pub detail: Option<String>,
}

impl Debug for AppCfgError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let dp = self.detail.as_deref().unwrap_or("none");
        write!(f, "code:{:?}, detail:{}", self.code, dp)
    }
}

#[derive(Debug, Clone)]
pub struct AppConfidentialityError {
    pub code: AppErrorCode,
    pub detail: String,
}

impl Display for AppConfidentialityError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "code:{:?}, detail:{}", self.code, self.detail)
    }
}
