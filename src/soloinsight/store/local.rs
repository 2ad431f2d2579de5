use super::{DataStore, Slot};
use crate::error::Result;
use serde_json::Value;

/// Raw string key-value storage scoped to the device.
pub trait KvBackend {
    /// Read the raw string stored under `key`. `Ok(None)` when absent.
    fn read(&self, key: &str) -> Result<Option<String>>;

    /// Write `value` under `key`, replacing what was there.
    fn write(&mut self, key: &str, value: &str) -> Result<()>;

    /// Remove every slot key. Used by full data wipes.
    fn clear(&mut self) -> Result<()>;
}

/// Device-local [`DataStore`].
///
/// Local storage never fails observably: missing keys, unreadable files and
/// corrupt JSON all read as "absent", and failed writes are logged and
/// dropped.
pub struct LocalStore<B: KvBackend> {
    backend: B,
}

impl<B: KvBackend> LocalStore<B> {
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn into_backend(self) -> B {
        self.backend
    }

    pub fn wipe(&mut self) {
        if let Err(e) = self.backend.clear() {
            tracing::warn!("Failed to wipe local storage: {}", e);
        }
    }
}

impl<B: KvBackend> DataStore for LocalStore<B> {
    fn load(&self, slot: Slot) -> Result<Option<Value>> {
        let raw = match self.backend.read(slot.key()) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Ok(None),
            Err(e) => {
                tracing::warn!("Unreadable local slot {}: {}", slot.key(), e);
                return Ok(None);
            }
        };

        match serde_json::from_str(&raw) {
            Ok(value) => Ok(Some(value)),
            // Older builds stored the language as a bare string.
            Err(_) if slot == Slot::Language && !raw.trim().is_empty() => {
                Ok(Some(Value::String(raw.trim().to_string())))
            }
            Err(e) => {
                tracing::warn!("Corrupt local slot {} treated as empty: {}", slot.key(), e);
                Ok(None)
            }
        }
    }

    fn store(&mut self, slot: Slot, value: Value) -> Result<()> {
        let raw = match serde_json::to_string(&value) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!("Could not encode slot {}: {}", slot.key(), e);
                return Ok(());
            }
        };
        if let Err(e) = self.backend.write(slot.key(), &raw) {
            tracing::warn!("Failed to write local slot {}: {}", slot.key(), e);
        } else {
            tracing::debug!("Stored local slot {} ({} bytes)", slot.key(), raw.len());
        }
        Ok(())
    }
}
