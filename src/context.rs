//! Single-slot conversational context.
//!
//! Executing an intent can surface structured data (a depot record, a route
//! lookup) that the next generative answer should be grounded in. The bridge
//! holds the most recently captured such value — one slot, overwritten rather
//! than merged, last writer wins. One bridge per conversation session; it is
//! an owned instance, never module-level state.

use serde::Deserialize;
use serde_json::Value;
use std::sync::Mutex;

/// What an executed intent action hands back. Only `context` matters to the
/// bridge; anything else the action returned is carried opaquely.
#[derive(Debug, Default, Deserialize)]
pub struct ActionResult {
    #[serde(default)]
    pub context: Option<Value>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

/// Holds at most one captured context value for the session.
#[derive(Debug, Default)]
pub struct ContextBridge {
    last: Mutex<Option<Value>>,
}

impl ContextBridge {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store the result's context. A result without a context (or with an
    /// explicit JSON null) is a no-op — the previous context is retained.
    pub fn capture(&self, result: &ActionResult) {
        let Some(context) = &result.context else {
            return;
        };
        if context.is_null() {
            return;
        }
        *self.lock() = Some(context.clone());
    }

    /// The current stored context, if any.
    pub fn last(&self) -> Option<Value> {
        self.lock().clone()
    }

    /// Drop the stored context unconditionally.
    pub fn clear(&self) {
        *self.lock() = None;
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Option<Value>> {
        // Writes only happen from sequential user-triggered actions; a
        // poisoned lock still holds a usable value.
        self.last.lock().unwrap_or_else(|e| e.into_inner())
    }
}
