//! The persistence port: typed, namespaced, and infallible to callers.
//!
//! Backend failures stop here. A failed read yields the caller's default and
//! a failed write is logged and dropped, so game logic never has to handle
//! storage errors.

use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::error;

use crate::KvStore;

#[derive(Clone)]
pub struct Persistence {
    store: Arc<dyn KvStore>,
    namespace: String,
}

impl Persistence {
    /// Wrap a backend; every key is stored as `{namespace}:{key}`.
    pub fn new(store: Arc<dyn KvStore>, namespace: impl Into<String>) -> Self {
        Self {
            store,
            namespace: namespace.into(),
        }
    }

    fn qualified(&self, key: &str) -> String {
        format!("{}:{key}", self.namespace)
    }

    /// Read and decode a value, falling back to `default` when the key is
    /// absent, unreadable, or holds the wrong shape.
    pub fn get<T: DeserializeOwned>(&self, key: &str, default: T) -> T {
        let key = self.qualified(key);
        match self.store.get(&key) {
            Ok(Some(value)) => match serde_json::from_value(value) {
                Ok(v) => v,
                Err(e) => {
                    error!(key = %key, error = %e, "stored value has unexpected shape");
                    default
                }
            },
            Ok(None) => default,
            Err(e) => {
                error!(key = %key, error = %e, "persistence read failed");
                default
            }
        }
    }

    pub fn set<T: Serialize>(&self, key: &str, value: &T) {
        let key = self.qualified(key);
        let result = serde_json::to_value(value)
            .map_err(crate::StoreError::from)
            .and_then(|v| self.store.set(&key, v));
        if let Err(e) = result {
            error!(key = %key, error = %e, "persistence write failed");
        }
    }

    pub fn remove(&self, key: &str) {
        let key = self.qualified(key);
        if let Err(e) = self.store.remove(&key) {
            error!(key = %key, error = %e, "persistence remove failed");
        }
    }

    /// Remove every key in this namespace, leaving other namespaces alone.
    pub fn clear(&self) {
        let prefix = self.qualified("");
        let keys = match self.store.keys() {
            Ok(keys) => keys,
            Err(e) => {
                error!(namespace = %self.namespace, error = %e, "persistence clear failed");
                return;
            }
        };
        for key in keys.into_iter().filter(|k| k.starts_with(&prefix)) {
            if let Err(e) = self.store.remove(&key) {
                error!(key = %key, error = %e, "persistence remove failed");
            }
        }
    }
}
