use std::collections::HashMap;
use std::result::Result as DefaultResult;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use regex::Regex;

use ecommerce_common::config::AppInMemoryCacheCfg;

use super::AbstractCacheStore;
use crate::error::{AppError, AppErrorCode};

struct CachedEntry {
    value: String,
    expiry: Instant,
}

pub struct AppInMemoryCacheStore {
    max_items: usize,
    entries: Mutex<HashMap<String, CachedEntry>>,
}

impl AppInMemoryCacheStore {
    pub fn new(cfg: &AppInMemoryCacheCfg) -> Self {
        Self {
            max_items: cfg.max_items.max(1) as usize,
            entries: Mutex::new(HashMap::new()),
        }
    }

    fn lock_entries(
        &self,
    ) -> DefaultResult<std::sync::MutexGuard<'_, HashMap<String, CachedEntry>>, AppError> {
        self.entries
            .lock()
            .map_err(|e| AppError::new(AppErrorCode::AcquireLockFailure, e.to_string()))
    }

    // make room for a new entry, expired entries go first, then the
    // one closest to expiry
    fn evict(map: &mut HashMap<String, CachedEntry>, max_items: usize, now: Instant) {
        if map.len() < max_items {
            return;
        }
        map.retain(|_k, v| v.expiry > now);
        while map.len() >= max_items {
            let victim = map
                .iter()
                .min_by_key(|(_k, v)| v.expiry)
                .map(|(k, _v)| k.clone());
            match victim {
                Some(k) => {
                    let _ = map.remove(&k);
                }
                None => break,
            }
        }
    }
} // end of impl AppInMemoryCacheStore

/// convert glob pattern of cache keys, `*` matches any sequence and `?`
/// matches single character, all other characters are literal
pub(super) fn glob_to_regex(pattern: &str) -> DefaultResult<Regex, AppError> {
    let mut out = String::with_capacity(pattern.len() + 8);
    out.push('^');
    let mut buf = [0u8; 4];
    for c in pattern.chars() {
        match c {
            '*' => out.push_str(".*"),
            '?' => out.push('.'),
            _others => out.push_str(regex::escape(c.encode_utf8(&mut buf)).as_str()),
        }
    }
    out.push('$');
    Regex::new(out.as_str()).map_err(|e| AppError::new(AppErrorCode::InvalidInput, e.to_string()))
}

#[async_trait]
impl AbstractCacheStore for AppInMemoryCacheStore {
    async fn get(&self, key: &str) -> DefaultResult<Option<String>, AppError> {
        let now = Instant::now();
        let mut map = self.lock_entries()?;
        let expired = match map.get(key) {
            Some(entry) if entry.expiry > now => return Ok(Some(entry.value.clone())),
            Some(_entry) => true,
            None => false,
        };
        if expired {
            let _ = map.remove(key);
        }
        Ok(None)
    }

    async fn set(&self, key: &str, value: String, ttl_secs: u32) -> DefaultResult<(), AppError> {
        let now = Instant::now();
        let expiry = now + Duration::from_secs(ttl_secs as u64);
        let mut map = self.lock_entries()?;
        if !map.contains_key(key) {
            Self::evict(&mut map, self.max_items, now);
        }
        let _ = map.insert(key.to_string(), CachedEntry { value, expiry });
        Ok(())
    }

    async fn delete(&self, keys: Vec<String>) -> DefaultResult<usize, AppError> {
        let mut map = self.lock_entries()?;
        let num = keys.iter().filter_map(|k| map.remove(k)).count();
        Ok(num)
    }

    async fn delete_by_pattern(&self, pattern: &str) -> DefaultResult<usize, AppError> {
        let patt = glob_to_regex(pattern)?;
        let mut map = self.lock_entries()?;
        let num_before = map.len();
        map.retain(|k, _v| !patt.is_match(k));
        Ok(num_before - map.len())
    }
} // end of impl AppInMemoryCacheStore
