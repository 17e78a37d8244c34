//! Per-session metadata cache with lazy TTL eviction.
//!
//! Properties are grouped by WebDriver session id. Every write refreshes the
//! session's access time; reads sweep out whole sessions whose last write is
//! at least one TTL old. Nothing runs in the background.

use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

use crate::{PercyError, Result};

/// How long a session's metadata survives without a write.
pub const CACHE_TIMEOUT: Duration = Duration::from_secs(5 * 60);

/// Cache key for the remote end's command executor URL.
pub const COMMAND_EXECUTOR_URL: &str = "command_executor_url";
/// Cache key for the negotiated capabilities.
pub const CAPABILITIES: &str = "capabilities";
/// Cache key for the capabilities requested at session creation.
pub const SESSION_CAPABILITIES: &str = "session_capabilities";

#[derive(Debug)]
struct CacheEntry {
    last_access_time: Instant,
    properties: HashMap<String, Value>,
}

#[derive(Debug)]
pub struct MetadataCache {
    ttl: Duration,
    sessions: Mutex<HashMap<String, CacheEntry>>,
}

impl Default for MetadataCache {
    fn default() -> Self {
        Self::with_ttl(CACHE_TIMEOUT)
    }
}

impl MetadataCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            ttl,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn set(&self, session_id: &str, property: &str, value: Value) {
        let mut sessions = self.lock();
        let entry = sessions
            .entry(session_id.to_string())
            .or_insert_with(|| CacheEntry {
                last_access_time: Instant::now(),
                properties: HashMap::new(),
            });
        entry.last_access_time = Instant::now();
        entry.properties.insert(property.to_string(), value);
    }

    /// Sweeps expired sessions, then looks the property up.
    pub fn get(&self, session_id: &str, property: &str) -> Option<Value> {
        self.sweep();
        self.lookup(session_id, property)
    }

    /// [`set`](Self::set) for keys that arrive as untyped JSON.
    pub fn set_json(&self, session_id: &Value, property: &Value, value: Value) -> Result<()> {
        let (session_id, property) = check_types(session_id, property)?;
        self.set(session_id, property, value);
        Ok(())
    }

    /// [`get`](Self::get) for keys that arrive as untyped JSON.
    pub fn get_json(&self, session_id: &Value, property: &Value) -> Result<Option<Value>> {
        self.sweep();
        let (session_id, property) = check_types(session_id, property)?;
        Ok(self.lookup(session_id, property))
    }

    /// Drops every session whose last write is at least one TTL old.
    pub fn sweep(&self) {
        let now = Instant::now();
        let ttl = self.ttl;
        self.lock()
            .retain(|_, entry| now.duration_since(entry.last_access_time) < ttl);
    }

    pub fn contains_session(&self, session_id: &str) -> bool {
        self.lock().contains_key(session_id)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lookup(&self, session_id: &str, property: &str) -> Option<Value> {
        self.lock()
            .get(session_id)
            .and_then(|entry| entry.properties.get(property))
            .cloned()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, CacheEntry>> {
        self.sessions
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn check_types<'a>(session_id: &'a Value, property: &'a Value) -> Result<(&'a str, &'a str)> {
    let session_id = session_id.as_str().ok_or(PercyError::CacheKeyType {
        argument: "session_id",
    })?;
    let property = property.as_str().ok_or(PercyError::CacheKeyType {
        argument: "property",
    })?;
    Ok((session_id, property))
}
