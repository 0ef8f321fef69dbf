//! Session-scoped key/value port used to remember the last viewed slide.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

pub const SLIDE_INDEX_KEY: &str = "slideIndex";

/// Browsing-session storage. Writes are fire-and-forget.
pub trait SessionStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str);
    fn remove(&self, key: &str);
}

/// In-process store. Clones share the same map, so a test can hand one clone
/// to the runtime and inspect another.
#[derive(Clone, Default, Debug)]
pub struct MemorySessionStore {
    inner: Arc<RwLock<HashMap<String, String>>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemorySessionStore {
    fn get(&self, key: &str) -> Option<String> {
        self.inner.read().ok()?.get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        if let Ok(mut guard) = self.inner.write() {
            guard.insert(key.to_string(), value.to_string());
        }
    }

    fn remove(&self, key: &str) {
        if let Ok(mut guard) = self.inner.write() {
            guard.remove(key);
        }
    }
}

/// Decode a persisted index. Anything absent, non-numeric or outside
/// `0..slide_count` means "no prior position".
pub fn parse_slide_index(raw: Option<&str>, slide_count: usize) -> usize {
    raw.and_then(|value| value.trim().parse::<usize>().ok())
        .filter(|index| *index < slide_count)
        .unwrap_or(0)
}

/// Typed view over the one key the engine owns.
#[derive(Clone)]
pub struct SlideIndexStore {
    store: Arc<dyn SessionStore>,
    key: String,
}

impl SlideIndexStore {
    pub fn new(store: Arc<dyn SessionStore>, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
        }
    }

    pub fn load(&self, slide_count: usize) -> usize {
        parse_slide_index(self.store.get(&self.key).as_deref(), slide_count)
    }

    pub fn save(&self, index: usize) {
        self.store.set(&self.key, &index.to_string());
    }

    pub fn clear(&self) {
        self.store.remove(&self.key);
    }
}
