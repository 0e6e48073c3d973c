use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::BufReader;
use std::result::Result as DefaultResult;

use serde::de::{Error as DeserializeError, Expected};
use serde::Deserialize;

use crate::constant::{cache as const_cache, env_vars, logging as const_log};
use crate::error::{AppCfgError, AppErrorCode};
use crate::AppLogAlias;

#[derive(Deserialize)]
pub struct AppLogHandlerCfg {
    pub min_level: const_log::Level,
    pub destination: const_log::Destination,
    pub alias: AppLogAlias,
    pub path: Option<String>,
}

#[derive(Deserialize)]
pub struct AppLoggerCfg {
    pub alias: AppLogAlias,
    pub handlers: Vec<String>,
    pub level: Option<const_log::Level>,
}

#[derive(Deserialize)]
pub struct AppLoggingCfg {
    pub handlers: Vec<AppLogHandlerCfg>,
    pub loggers: Vec<AppLoggerCfg>,
}

#[derive(Deserialize)]
#[serde(tag = "source")]
pub enum AppConfidentialCfg {
    UserSpace {
        #[serde(deserialize_with = "jsn_deny_empty_string")]
        sys_path: String,
    },
}

#[derive(Deserialize, Debug, Clone)]
pub enum AppDbServerType {
    MariaDB,
    PostgreSQL,
}

#[derive(Deserialize, Debug)]
pub struct AppInMemoryDbCfg {
    #[serde(deserialize_with = "jsn_deny_empty_string")]
    pub alias: String,
    pub max_items: u32,
}

#[derive(Deserialize, Debug)]
pub struct AppDbServerCfg {
    #[serde(deserialize_with = "jsn_deny_empty_string")]
    pub alias: String,
    pub srv_type: AppDbServerType,
    pub max_conns: u32,
    pub acquire_timeout_secs: u16, // for acquiring connection from pool
    pub idle_timeout_secs: u16,
    pub confidentiality_path: String,
    pub db_name: String,
}

#[derive(Deserialize)]
#[serde(tag = "_type")]
pub enum AppDataStoreCfg {
    InMemory(AppInMemoryDbCfg),
    DbServer(AppDbServerCfg),
}

#[derive(Deserialize, Debug)]
pub struct AppInMemoryCacheCfg {
    pub max_items: u32,
}

#[derive(Deserialize, Debug)]
pub struct AppRedisCacheCfg {
    #[serde(deserialize_with = "jsn_deny_empty_string")]
    pub alias: String,
    // the secret payload at this path is the connection URL of the cache server
    #[serde(deserialize_with = "jsn_deny_empty_string")]
    pub confidentiality_path: String,
    pub timeout_ms: u32,
}

#[derive(Deserialize)]
#[serde(tag = "_type")]
pub enum AppCacheCfg {
    InMemory(AppInMemoryCacheCfg),
    Redis(AppRedisCacheCfg),
}

fn ttl_product_list() -> u32 {
    const_cache::TTL_PRODUCT_LIST
}
fn ttl_product_detail() -> u32 {
    const_cache::TTL_PRODUCT_DETAIL
}
fn ttl_category() -> u32 {
    const_cache::TTL_CATEGORY
}
fn ttl_category_finder() -> u32 {
    const_cache::TTL_CATEGORY_FINDER
}
fn ttl_coupon() -> u32 {
    const_cache::TTL_COUPON
}
fn ttl_promotion() -> u32 {
    const_cache::TTL_PROMOTION
}
fn ttl_review_rating() -> u32 {
    const_cache::TTL_REVIEW_RATING
}
fn ttl_review_list() -> u32 {
    const_cache::TTL_REVIEW_LIST
}
fn ttl_variant() -> u32 {
    const_cache::TTL_VARIANT
}
fn ttl_brand_list() -> u32 {
    const_cache::TTL_BRAND_LIST
}
fn ttl_brand_detail() -> u32 {
    const_cache::TTL_BRAND_DETAIL
}

/// Time-to-live in seconds for each cache domain, omitted fields fall
/// back to the defaults in [`crate::constant::cache`]
#[derive(Deserialize, Debug, Clone)]
pub struct AppCacheTtlCfg {
    #[serde(default = "ttl_product_list")]
    pub product_list: u32,
    #[serde(default = "ttl_product_detail")]
    pub product_detail: u32,
    #[serde(default = "ttl_category")]
    pub category: u32,
    #[serde(default = "ttl_category_finder")]
    pub category_finder: u32,
    #[serde(default = "ttl_coupon")]
    pub coupon: u32,
    #[serde(default = "ttl_promotion")]
    pub promotion: u32,
    #[serde(default = "ttl_review_rating")]
    pub review_rating: u32,
    #[serde(default = "ttl_review_list")]
    pub review_list: u32,
    #[serde(default = "ttl_variant")]
    pub variant: u32,
    #[serde(default = "ttl_brand_list")]
    pub brand_list: u32,
    #[serde(default = "ttl_brand_detail")]
    pub brand_detail: u32,
}

impl Default for AppCacheTtlCfg {
    fn default() -> Self {
        Self {
            product_list: ttl_product_list(),
            product_detail: ttl_product_detail(),
            category: ttl_category(),
            category_finder: ttl_category_finder(),
            coupon: ttl_coupon(),
            promotion: ttl_promotion(),
            review_rating: ttl_review_rating(),
            review_list: ttl_review_list(),
            variant: ttl_variant(),
            brand_list: ttl_brand_list(),
            brand_detail: ttl_brand_detail(),
        }
    }
}

impl AppCacheTtlCfg {
    fn as_labeled(&self) -> [(&'static str, u32); 11] {
        [
            ("product_list", self.product_list),
            ("product_detail", self.product_detail),
            ("category", self.category),
            ("category_finder", self.category_finder),
            ("coupon", self.coupon),
            ("promotion", self.promotion),
            ("review_rating", self.review_rating),
            ("review_list", self.review_list),
            ("variant", self.variant),
            ("brand_list", self.brand_list),
            ("brand_detail", self.brand_detail),
        ]
    }
}

/// What checkout does when the coupon supplied by the shopper is rejected
#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Default)]
pub enum CouponFailurePolicy {
    /// log the rejection, the order proceeds at full price without coupon
    #[default]
    Lenient,
    /// the rejection aborts the checkout
    Strict,
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct AppCheckoutCfg {
    #[serde(default)]
    pub coupon_failure_policy: CouponFailurePolicy,
}

#[derive(Deserialize)]
pub struct ApiServerCfg {
    pub logging: AppLoggingCfg,
    pub data_store: Vec<AppDataStoreCfg>,
    pub cache: AppCacheCfg,
    #[serde(default)]
    pub cache_ttl: AppCacheTtlCfg,
    #[serde(default)]
    pub checkout: AppCheckoutCfg,
    pub confidentiality: AppConfidentialCfg,
}

pub struct AppBasepathCfg {
    pub system: String,
    pub service: String,
}

pub struct AppConfig {
    pub basepath: AppBasepathCfg,
    pub api_server: ApiServerCfg,
}

pub struct AppCfgHardLimit {
    pub nitems_per_inmem_table: u32,
    pub nitems_inmem_cache: u32,
    pub num_db_conns: u32,
    pub seconds_db_idle: u16,
}
pub struct AppCfgInitArgs {
    pub env_var_map: HashMap<String, String>,
    pub limit: AppCfgHardLimit,
}

impl AppConfig {
    pub fn new(args: AppCfgInitArgs) -> DefaultResult<Self, AppCfgError> {
        let AppCfgInitArgs {
            mut env_var_map,
            limit,
        } = args;
        let mut take_dir = |label: &str, code: AppErrorCode| {
            env_var_map
                .remove(label)
                .map(|v| v + "/")
                .ok_or(AppCfgError { detail: None, code })
        };
        let system = take_dir(env_vars::SYS_BASEPATH, AppErrorCode::MissingSysBasePath)?;
        let service = take_dir(env_vars::SERVICE_BASEPATH, AppErrorCode::MissingAppBasePath)?;
        let cfg_relpath = env_var_map
            .remove(env_vars::CFG_FILEPATH)
            .ok_or(AppCfgError {
                detail: None,
                code: AppErrorCode::MissingConfigPath,
            })?;
        let api_server = Self::parse_from_file(format!("{service}{cfg_relpath}"), limit)?;
        Ok(Self {
            basepath: AppBasepathCfg { system, service },
            api_server,
        })
    } // end of new

    pub fn parse_from_file(
        filepath: String,
        limit: AppCfgHardLimit,
    ) -> DefaultResult<ApiServerCfg, AppCfgError> {
        let fileobj = File::open(filepath).map_err(|e| AppCfgError {
            detail: Some(e.to_string()),
            code: AppErrorCode::IOerror(e.kind()),
        })?;
        let cfg: ApiServerCfg =
            serde_json::from_reader(BufReader::new(fileobj)).map_err(|e| AppCfgError {
                detail: Some(e.to_string()),
                code: AppErrorCode::InvalidJsonFormat,
            })?;
        Self::_check_logging(&cfg.logging)?;
        Self::_check_datastore(&cfg.data_store, &limit)?;
        Self::_check_cache(&cfg.cache, &cfg.cache_ttl, &limit)?;
        Ok(cfg)
    }

    fn _check_logging(obj: &AppLoggingCfg) -> DefaultResult<(), AppCfgError> {
        let fail = |code: AppErrorCode, detail: Option<String>| Err(AppCfgError { detail, code });
        if obj.handlers.is_empty() {
            return fail(AppErrorCode::NoLogHandlerCfg, None);
        }
        if obj.loggers.is_empty() {
            return fail(AppErrorCode::NoLoggerCfg, None);
        }
        if let Some(lgr) = obj.loggers.iter().find(|l| l.handlers.is_empty()) {
            let msg = format!("the logger does not have handler: {}", lgr.alias);
            return fail(AppErrorCode::NoHandlerInLoggerCfg, Some(msg));
        }
        if obj.handlers.iter().any(|h| h.alias.is_empty()) {
            return fail(AppErrorCode::MissingAliasLogHdlerCfg, None);
        }
        if obj.loggers.iter().any(|l| l.alias.is_empty()) {
            return fail(AppErrorCode::MissingAliasLoggerCfg, None);
        }
        let pathless = obj.handlers.iter().find(|h| {
            matches!(h.destination, const_log::Destination::LOCALFS) && h.path.is_none()
        });
        if let Some(hdlr) = pathless {
            let msg = format!("file-type handler does not contain path: {}", hdlr.alias);
            return fail(AppErrorCode::InvalidHandlerLoggerCfg, Some(msg));
        }
        let known: HashSet<&str> = obj.handlers.iter().map(|h| h.alias.as_str()).collect();
        let dangling = obj
            .loggers
            .iter()
            .find(|l| l.handlers.iter().any(|a| !known.contains(a.as_str())));
        if let Some(lgr) = dangling {
            let msg = format!("the logger contains invalid handler alias: {}", lgr.alias);
            return fail(AppErrorCode::InvalidHandlerLoggerCfg, Some(msg));
        }
        Ok(())
    } // end of _check_logging

    fn _check_datastore(
        obj: &[AppDataStoreCfg],
        limit: &AppCfgHardLimit,
    ) -> DefaultResult<(), AppCfgError> {
        if obj.is_empty() {
            return Err(AppCfgError {
                detail: None,
                code: AppErrorCode::NoDatabaseCfg,
            });
        }
        let exceeded = obj.iter().find_map(|item| match item {
            AppDataStoreCfg::InMemory(c) if c.max_items > limit.nitems_per_inmem_table => {
                Some(format!("inmem-table-items:{}", limit.nitems_per_inmem_table))
            }
            AppDataStoreCfg::DbServer(c) if c.max_conns > limit.num_db_conns => {
                Some(format!("db-conns:{}", limit.num_db_conns))
            }
            AppDataStoreCfg::DbServer(c) if c.idle_timeout_secs > limit.seconds_db_idle => {
                Some(format!("db-idle-secs:{}", limit.seconds_db_idle))
            }
            _others => None,
        });
        match exceeded {
            Some(detail) => Err(AppCfgError {
                detail: Some(detail),
                code: AppErrorCode::ExceedingMaxLimit,
            }),
            None => Ok(()),
        }
    } // end of _check_datastore

    fn _check_cache(
        obj: &AppCacheCfg,
        ttl: &AppCacheTtlCfg,
        limit: &AppCfgHardLimit,
    ) -> DefaultResult<(), AppCfgError> {
        match obj {
            AppCacheCfg::InMemory(c) => {
                let lmt = limit.nitems_inmem_cache;
                if c.max_items == 0 || c.max_items > lmt {
                    return Err(AppCfgError {
                        detail: Some(format!("inmem-cache-items:{}", lmt)),
                        code: AppErrorCode::ExceedingMaxLimit,
                    });
                }
            }
            AppCacheCfg::Redis(c) => {
                if c.timeout_ms == 0 {
                    return Err(AppCfgError {
                        detail: Some(format!("redis-timeout, alias:{}", c.alias)),
                        code: AppErrorCode::InvalidCacheCfg,
                    });
                }
            }
        }
        let zero_ttl = ttl.as_labeled().into_iter().find(|(_, v)| *v == 0);
        if let Some((label, _)) = zero_ttl {
            Err(AppCfgError {
                detail: Some(format!("zero-ttl:{label}")),
                code: AppErrorCode::InvalidCacheCfg,
            })
        } else {
            Ok(())
        }
    } // end of _check_cache
} // end of impl AppConfig

struct NonEmptyText;

impl Expected for NonEmptyText {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.write_str("text with at least one character")
    }
}

fn jsn_deny_empty_string<'de, D>(raw: D) -> DefaultResult<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let text = String::deserialize(raw)?;
    if text.is_empty() {
        Err(DeserializeError::invalid_length(0, &NonEmptyText))
    } else {
        Ok(text)
    }
}
