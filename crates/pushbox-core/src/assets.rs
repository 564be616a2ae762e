//! Asset loading with a polled readiness model.
//!
//! Components request assets during `preloading` and report not-ready until
//! the cache has an answer. The cache never blocks the caller beyond a single
//! synchronous read; the polled shape exists so that loading can be gated per
//! frame and so tests can drive completion by hand.
//!
//! A failed load still counts as *ready*. Preloading must not wedge the game
//! on a missing file; the failure is logged and downstream consumers see an
//! asset with no content.

use std::collections::HashMap;
use std::path::PathBuf;

use tracing::{debug, warn};

// ---------------------------------------------------------------------------
// AssetState
// ---------------------------------------------------------------------------

#[derive(Debug)]
enum AssetState {
    Pending,
    Loaded(Vec<u8>),
    Failed,
}

// ---------------------------------------------------------------------------
// AssetCache
// ---------------------------------------------------------------------------

/// Where the cache gets its bytes from.
pub enum AssetBackend {
    /// Read files relative to a base directory.
    Disk {
        /// Directory asset names are resolved against.
        base: PathBuf,
    },
    /// No I/O; tests complete or fail requests explicitly.
    Manual,
}

/// Name-keyed cache of loaded assets.
pub struct AssetCache {
    backend: AssetBackend,
    entries: HashMap<String, AssetState>,
}

impl AssetCache {
    /// A cache backed by files under `base`.
    pub fn disk(base: impl Into<PathBuf>) -> Self {
        Self {
            backend: AssetBackend::Disk { base: base.into() },
            entries: HashMap::new(),
        }
    }

    /// A cache that only completes when told to. For tests.
    pub fn manual() -> Self {
        Self {
            backend: AssetBackend::Manual,
            entries: HashMap::new(),
        }
    }

    /// Ask for an asset by name. Idempotent; a second request for the same
    /// name is a no-op regardless of state.
    pub fn request(&mut self, name: &str) {
        if self.entries.contains_key(name) {
            return;
        }
        match &self.backend {
            AssetBackend::Disk { base } => {
                let path = base.join(name);
                let state = match std::fs::read(&path) {
                    Ok(bytes) => {
                        debug!(name, size = bytes.len(), "asset loaded");
                        AssetState::Loaded(bytes)
                    }
                    Err(err) => {
                        warn!(name, %err, "asset load failed");
                        AssetState::Failed
                    }
                };
                self.entries.insert(name.to_owned(), state);
            }
            AssetBackend::Manual => {
                self.entries.insert(name.to_owned(), AssetState::Pending);
            }
        }
    }

    /// Whether a requested asset has finished loading, successfully or not.
    /// An asset never requested is not ready.
    pub fn is_ready(&self, name: &str) -> bool {
        matches!(
            self.entries.get(name),
            Some(AssetState::Loaded(_) | AssetState::Failed)
        )
    }

    /// The raw bytes of a successfully loaded asset.
    pub fn bytes(&self, name: &str) -> Option<&[u8]> {
        match self.entries.get(name) {
            Some(AssetState::Loaded(bytes)) => Some(bytes),
            _ => None,
        }
    }

    /// The content of a successfully loaded asset as UTF-8 text.
    pub fn text(&self, name: &str) -> Option<&str> {
        self.bytes(name).and_then(|b| std::str::from_utf8(b).ok())
    }

    /// Complete a pending request with bytes. Manual backend only.
    pub fn complete(&mut self, name: &str, bytes: Vec<u8>) {
        self.entries
            .insert(name.to_owned(), AssetState::Loaded(bytes));
    }

    /// Complete a pending request with text. Manual backend only.
    pub fn complete_text(&mut self, name: &str, text: &str) {
        self.complete(name, text.as_bytes().to_vec());
    }

    /// Fail a pending request. Manual backend only.
    pub fn fail(&mut self, name: &str) {
        warn!(name, "asset marked failed");
        self.entries.insert(name.to_owned(), AssetState::Failed);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_request_is_pending_until_completed() {
        let mut cache = AssetCache::manual();
        cache.request("level.json");
        assert!(!cache.is_ready("level.json"));

        cache.complete_text("level.json", "{}");
        assert!(cache.is_ready("level.json"));
        assert_eq!(cache.text("level.json"), Some("{}"));
    }

    #[test]
    fn failed_asset_is_ready_but_empty() {
        let mut cache = AssetCache::manual();
        cache.request("missing.png");
        cache.fail("missing.png");

        assert!(cache.is_ready("missing.png"));
        assert_eq!(cache.bytes("missing.png"), None);
        assert_eq!(cache.text("missing.png"), None);
    }

    #[test]
    fn unrequested_asset_is_not_ready() {
        let cache = AssetCache::manual();
        assert!(!cache.is_ready("nobody-asked.png"));
    }

    #[test]
    fn request_is_idempotent() {
        let mut cache = AssetCache::manual();
        cache.request("sheet.png");
        cache.complete("sheet.png", vec![1, 2, 3]);
        // A later request must not reset the loaded entry.
        cache.request("sheet.png");
        assert_eq!(cache.bytes("sheet.png"), Some(&[1u8, 2, 3][..]));
    }

    #[test]
    fn disk_backend_reads_files() {
        let dir = std::env::temp_dir().join("pushbox-assets-test");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("hello.txt"), "hi").unwrap();

        let mut cache = AssetCache::disk(&dir);
        cache.request("hello.txt");
        assert!(cache.is_ready("hello.txt"));
        assert_eq!(cache.text("hello.txt"), Some("hi"));

        cache.request("absent.txt");
        assert!(cache.is_ready("absent.txt"));
        assert_eq!(cache.bytes("absent.txt"), None);
    }
}
