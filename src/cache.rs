//! Read-through profile cache with a fixed time-to-live.
//!
//! The cached entry is stored as `{ "data": <profile>, "timestamp": <ms> }`
//! under a single well-known key of a pluggable key/value store.

use std::collections::HashMap;
use std::future::Future;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{AppError, Result};

pub const CACHE_KEY: &str = "fdgym_user_profile_cache";

/// 30 minutes.
pub const CACHE_TTL_MS: i64 = 30 * 60 * 1000;

/// Minimal string key/value storage, the shape of browser local storage.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
}

#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, String>>> {
        self.entries
            .lock()
            .map_err(|_| AppError::Internal("memory store lock poisoned".to_string()))
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.lock()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.lock()?.remove(key);
        Ok(())
    }
}

/// All keys kept in one JSON object on disk. A missing file is an empty store.
pub struct FileStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    fn read_all(&self) -> Result<Map<String, Value>> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Map::new()),
            Err(e) => return Err(AppError::Internal(e.to_string())),
        };
        match serde_json::from_str(&raw) {
            Ok(map) => Ok(map),
            Err(e) => {
                tracing::warn!("Ignoring unreadable store file {:?}: {}", self.path, e);
                Ok(Map::new())
            }
        }
    }

    fn write_all(&self, map: &Map<String, Value>) -> Result<()> {
        let raw = serde_json::to_string_pretty(map)?;
        std::fs::write(&self.path, raw).map_err(|e| AppError::Internal(e.to_string()))
    }

    fn modify(&self, f: impl FnOnce(&mut Map<String, Value>)) -> Result<()> {
        let _guard = self
            .write_lock
            .lock()
            .map_err(|_| AppError::Internal("file store lock poisoned".to_string()))?;
        let mut map = self.read_all()?;
        f(&mut map);
        self.write_all(&map)
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.read_all()?.get(key).and_then(|v| match v {
            Value::String(s) => Some(s.clone()),
            _ => None,
        }))
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.modify(|map| {
            map.insert(key.to_string(), Value::String(value.to_string()));
        })
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.modify(|map| {
            map.remove(key);
        })
    }
}

impl<T: KeyValueStore + ?Sized> KeyValueStore for Arc<T> {
    fn get(&self, key: &str) -> Result<Option<String>> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> Result<()> {
        (**self).remove(key)
    }
}

/// Milliseconds since the Unix epoch.
pub trait Clock: Send + Sync {
    fn now_millis(&self) -> i64;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}

impl<T: Clock + ?Sized> Clock for Arc<T> {
    fn now_millis(&self) -> i64 {
        (**self).now_millis()
    }
}

/// Where a cache miss gets the profile from.
pub trait ProfileSource: Send + Sync {
    fn fetch_profile(&self, user_id: &str) -> impl Future<Output = Result<Value>> + Send;
}

#[derive(Debug, Serialize, Deserialize)]
struct CacheEntry {
    data: Value,
    timestamp: i64,
}

pub struct ProfileCache<S, F, C = SystemClock> {
    store: S,
    source: F,
    clock: C,
    current: Option<Value>,
}

impl<S, F> ProfileCache<S, F, SystemClock>
where
    S: KeyValueStore,
    F: ProfileSource,
{
    pub fn new(store: S, source: F) -> Self {
        Self::with_clock(store, source, SystemClock)
    }
}

impl<S, F, C> ProfileCache<S, F, C>
where
    S: KeyValueStore,
    F: ProfileSource,
    C: Clock,
{
    pub fn with_clock(store: S, source: F, clock: C) -> Self {
        Self {
            store,
            source,
            clock,
            current: None,
        }
    }

    /// Profile held in memory after the last load or update.
    pub fn current(&self) -> Option<&Value> {
        self.current.as_ref()
    }

    /// Return the cached profile when it is fresh and belongs to `user_id`,
    /// otherwise fetch it and cache the result.
    pub async fn load(&mut self, user_id: &str) -> Result<Value> {
        if let Some(data) = self.fresh_entry(user_id)? {
            tracing::debug!("Profile cache hit for {}", user_id);
            self.current = Some(data.clone());
            return Ok(data);
        }

        tracing::debug!("Profile cache miss for {}", user_id);
        let data = self.source.fetch_profile(user_id).await?;
        if let Err(e) = self.write_entry(&data) {
            tracing::warn!("Failed to cache profile for {}: {}", user_id, e);
        }
        self.current = Some(data.clone());
        Ok(data)
    }

    /// Shallow-merge `partial` into the current profile and rewrite the cache
    /// entry. Returns `None` when nothing has been loaded yet.
    pub fn update(&mut self, partial: Value) -> Result<Option<Value>> {
        let Some(Value::Object(current)) = self.current.as_mut() else {
            return Ok(None);
        };
        if let Value::Object(fields) = partial {
            current.extend(fields);
        }
        let updated = Value::Object(current.clone());
        self.write_entry(&updated)?;
        self.current = Some(updated.clone());
        Ok(Some(updated))
    }

    pub fn clear(&mut self) -> Result<()> {
        self.current = None;
        self.store.remove(CACHE_KEY)
    }

    /// Drop whatever is cached and fetch again.
    pub async fn refresh(&mut self, user_id: &str) -> Result<Value> {
        self.clear()?;
        self.load(user_id).await
    }

    fn fresh_entry(&self, user_id: &str) -> Result<Option<Value>> {
        let Some(raw) = self.store.get(CACHE_KEY)? else {
            return Ok(None);
        };
        let entry: CacheEntry = match serde_json::from_str(&raw) {
            Ok(entry) => entry,
            Err(e) => {
                tracing::debug!("Discarding corrupt profile cache entry: {}", e);
                return Ok(None);
            }
        };

        let age = self.clock.now_millis() - entry.timestamp;
        let same_user = entry.data.get("id").and_then(Value::as_str) == Some(user_id);
        if age < CACHE_TTL_MS && same_user {
            Ok(Some(entry.data))
        } else {
            Ok(None)
        }
    }

    fn write_entry(&self, data: &Value) -> Result<()> {
        let entry = CacheEntry {
            data: data.clone(),
            timestamp: self.clock.now_millis(),
        };
        self.store.set(CACHE_KEY, &serde_json::to_string(&entry)?)
    }
}
