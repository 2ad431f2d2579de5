use super::local::KvBackend;
use crate::error::{InsightError, Result};
use std::cell::Cell;
use std::collections::HashMap;

/// In-memory key-value backend for testing.
#[derive(Default)]
pub struct MemBackend {
    values: HashMap<String, String>,
    simulate_write_error: Cell<bool>,
}

impl MemBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable write error simulation for testing error handling.
    pub fn set_simulate_write_error(&self, simulate: bool) {
        self.simulate_write_error.set(simulate);
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl KvBackend for MemBackend {
    fn read(&self, key: &str) -> Result<Option<String>> {
        Ok(self.values.get(key).cloned())
    }

    fn write(&mut self, key: &str, value: &str) -> Result<()> {
        if self.simulate_write_error.get() {
            return Err(InsightError::Io(std::io::Error::other(
                "Simulated write error",
            )));
        }
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn clear(&mut self) -> Result<()> {
        self.values.clear();
        Ok(())
    }
}
