use anyhow::{Context, Result};
use keyring::Entry;
use tracing::{debug, warn};

use super::storage::KeyValueStore;

const SERVICE_NAME: &str = "jobboard";

/// Session keys kept in the OS keychain, one entry per key.
pub struct KeyringStore {
    service: String,
}

impl KeyringStore {
    pub fn new() -> Self {
        Self::with_service(SERVICE_NAME)
    }

    /// Use a custom keychain service name (one per API environment, for instance)
    pub fn with_service(service: &str) -> Self {
        Self {
            service: service.to_string(),
        }
    }

    fn entry(&self, key: &str) -> Result<Entry> {
        Entry::new(&self.service, key).context("Failed to create keyring entry")
    }
}

impl Default for KeyringStore {
    fn default() -> Self {
        Self::new()
    }
}

/// A missing entry is the normal logged-out state; any other keychain
/// failure is reported but still reads as absent.
fn read_entry(entry: &Entry, key: &str) -> Option<String> {
    match entry.get_password() {
        Ok(value) => Some(value),
        Err(keyring::Error::NoEntry) => {
            debug!(key, "No keychain value");
            None
        }
        Err(e) => {
            warn!(key, error = %e, "Failed to read keychain value");
            None
        }
    }
}

impl KeyValueStore for KeyringStore {
    fn get(&self, key: &str) -> Option<String> {
        match self.entry(key) {
            Ok(entry) => read_entry(&entry, key),
            Err(e) => {
                warn!(key, error = %e, "Keychain unavailable");
                None
            }
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.entry(key)?
            .set_password(value)
            .context("Failed to store value in keychain")
    }

    fn remove(&self, key: &str) -> Result<()> {
        match self.entry(key)?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(e).context("Failed to delete keychain entry"),
        }
    }
}
