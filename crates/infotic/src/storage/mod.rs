//! Key-value storage for infotic.
//!
//! The ledger and the session keep their state in a small synchronous
//! key-value area, the way a browser page uses local storage. This module
//! defines that capability as the [`KeyValueStore`] trait and provides two
//! backends:
//!
//! - [`MemoryStore`]: a process-local map, used in tests and for throwaway runs
//! - [`SqliteStore`]: a `SQLite` table that survives restarts
//!
//! Both backends can enforce a byte quota. A write that would exceed it fails
//! with [`Error::QuotaExceeded`] and leaves the store unchanged.

mod memory;
pub mod migrations;
pub mod schema;
mod sqlite;

use std::sync::Arc;

use crate::error::{Error, Result};

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

/// A synchronous string key-value store.
///
/// Implementations must make `set` all-or-nothing: on error the previous
/// value (or absence) of the key is preserved.
pub trait KeyValueStore {
    /// Read the value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Store `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns [`Error::QuotaExceeded`] if the write would push the store past
    /// its quota, or a backend error if the write fails.
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Remove `key`. Removing a missing key is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be written.
    fn remove(&self, key: &str) -> Result<()>;

    /// Total bytes held by the store, counting keys and values.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be read.
    fn used_bytes(&self) -> Result<usize>;
}

impl<T: KeyValueStore + ?Sized> KeyValueStore for &T {
    fn get(&self, key: &str) -> Result<Option<String>> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> Result<()> {
        (**self).remove(key)
    }

    fn used_bytes(&self) -> Result<usize> {
        (**self).used_bytes()
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

    fn used_bytes(&self) -> Result<usize> {
        (**self).used_bytes()
    }
}

/// Bytes an entry counts against the quota.
#[must_use]
pub fn entry_size(key: &str, value: &str) -> usize {
    key.len() + value.len()
}

/// Check that replacing `key` with `value` keeps the store within `quota`.
///
/// `used` is the current total and `previous` the size of the entry being
/// replaced, if the key already exists.
pub(crate) fn check_quota(
    quota: Option<usize>,
    used: usize,
    previous: Option<usize>,
    key: &str,
    value: &str,
) -> Result<()> {
    let Some(quota) = quota else {
        return Ok(());
    };

    let required = used.saturating_sub(previous.unwrap_or(0)) + entry_size(key, value);
    if required > quota {
        return Err(Error::QuotaExceeded {
            key: key.to_string(),
            required,
            quota,
        });
    }
    Ok(())
}
