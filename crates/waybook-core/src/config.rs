//! Sheet engine configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Tunables for one sheet instance. Hosts typically deserialize this
/// from their own config file; `Default` matches production behavior.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SheetConfig {
    /// Quiet period before pending field writes are flushed, in
    /// milliseconds. The timer arms on the first queued write after a
    /// flush and is not reset by later writes, so flush latency stays
    /// bounded under continuous edits.
    pub debounce_ms: u64,
}

impl Default for SheetConfig {
    fn default() -> Self {
        SheetConfig { debounce_ms: 500 }
    }
}

impl SheetConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}
