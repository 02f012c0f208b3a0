//! Inspector session and release banner.
//!
//! Authentication is mocked: logging in only records the inspector's name in
//! the store. The version check remembers the last release that ran against
//! the store so the CLI can announce an update once.

use std::time::Duration;

use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::storage::KeyValueStore;

/// Store key holding the logged-in inspector.
pub const USER_KEY: &str = "infotic_user";

/// Store key holding the last release seen.
pub const VERSION_KEY: &str = "infotic_version";

/// The running release.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Outcome of comparing the running release with the stored one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionCheck {
    /// The store was last used by this release.
    Current,
    /// The release changed since the store was last used (or never used).
    Updated {
        /// The release previously recorded, if any.
        previous: Option<String>,
    },
}

impl VersionCheck {
    /// Check whether the update banner should be shown.
    #[must_use]
    pub fn is_updated(&self) -> bool {
        matches!(self, Self::Updated { .. })
    }
}

/// Session state kept in a key-value store.
#[derive(Debug)]
pub struct Session<S> {
    store: S,
}

impl<S: KeyValueStore> Session<S> {
    /// Create a session over `store`.
    #[must_use]
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Log an inspector in after a simulated verification delay.
    ///
    /// Any non-blank name is accepted.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInspector`] for a blank name, or a storage
    /// error if the name cannot be saved.
    pub async fn login(&self, inspector: &str, delay: Duration) -> Result<String> {
        let inspector = inspector.trim();
        if inspector.is_empty() {
            return Err(Error::invalid_inspector("name must not be empty"));
        }

        debug!("Verifying {}", inspector);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        self.store.set(USER_KEY, inspector)?;
        info!("Logged in as {}", inspector);
        Ok(inspector.to_string())
    }

    /// The inspector currently logged in, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    pub fn current_inspector(&self) -> Result<Option<String>> {
        self.store.get(USER_KEY)
    }

    /// Compare `current` with the stored release and record it.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read or written.
    pub fn check_version(&self, current: &str) -> Result<VersionCheck> {
        let previous = self.store.get(VERSION_KEY)?;
        if previous.as_deref() == Some(current) {
            return Ok(VersionCheck::Current);
        }

        self.store.set(VERSION_KEY, current)?;
        debug!(
            "Release changed from {} to {}",
            previous.as_deref().unwrap_or("none"),
            current
        );
        Ok(VersionCheck::Updated { previous })
    }
}
