pub mod env_vars {
    pub const SYS_BASEPATH: &str = "SYS_BASE_PATH";
    pub const SERVICE_BASEPATH: &str = "SERVICE_BASE_PATH";
    // relative path starting from app / service home folder
    pub const CFG_FILEPATH: &str = "CONFIG_FILE_PATH";
    pub const EXPECTED_LABELS: [&str; 3] = [SYS_BASEPATH, SERVICE_BASEPATH, CFG_FILEPATH];
}

pub mod logging {
    use serde::Deserialize;

    #[allow(clippy::upper_case_acronyms)]
    #[derive(Deserialize, Debug, Clone)]
    pub enum Level {
        TRACE,
        DEBUG,
        INFO,
        WARNING,
        ERROR,
        FATAL,
    }

    #[allow(clippy::upper_case_acronyms)]
    #[derive(Deserialize, Debug, Clone)]
    #[serde(rename_all = "lowercase")]
    pub enum Destination {
        CONSOLE,
        LOCALFS,
    }
}

pub mod cache {
    // default time-to-live of each cache domain, in seconds
    pub const TTL_PRODUCT_LIST: u32 = 120;
    pub const TTL_PRODUCT_DETAIL: u32 = 300;
    pub const TTL_CATEGORY: u32 = 300;
    pub const TTL_CATEGORY_FINDER: u32 = 600;
    pub const TTL_COUPON: u32 = 300;
    pub const TTL_PROMOTION: u32 = 300;
    pub const TTL_REVIEW_RATING: u32 = 300;
    pub const TTL_REVIEW_LIST: u32 = 180;
    pub const TTL_VARIANT: u32 = 300;
    pub const TTL_BRAND_LIST: u32 = 300;
    pub const TTL_BRAND_DETAIL: u32 = 600;
}
