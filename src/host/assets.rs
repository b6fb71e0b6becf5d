//! Shared asset-loading progress

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use tracing::{debug, info};

use super::AssetProgress;

#[derive(Debug, Default)]
struct TrackerState {
    expected: HashSet<String>,
    loaded: HashSet<String>,
}

/// Tracks which asset keys have finished loading.
///
/// Written by the loader task, read by the session and renderer.
#[derive(Debug, Default)]
pub struct AssetTracker {
    state: RwLock<TrackerState>,
}

impl AssetTracker {
    pub fn new(keys: impl IntoIterator<Item = String>) -> Self {
        Self {
            state: RwLock::new(TrackerState {
                expected: keys.into_iter().collect(),
                loaded: HashSet::new(),
            }),
        }
    }

    /// Mark a key as loaded. Unknown keys are ignored.
    pub fn mark_loaded(&self, key: &str) -> bool {
        let mut state = self.state.write();
        if !state.expected.contains(key) {
            return false;
        }
        let fresh = state.loaded.insert(key.to_string());
        if fresh {
            debug!(key, loaded = state.loaded.len(), total = state.expected.len(), "Asset loaded");
        }
        fresh
    }

    pub fn total(&self) -> usize {
        self.state.read().expected.len()
    }

    /// Expected keys not loaded yet, sorted
    pub fn pending(&self) -> Vec<String> {
        let state = self.state.read();
        let mut pending: Vec<String> = state.expected.difference(&state.loaded).cloned().collect();
        pending.sort();
        pending
    }
}

impl AssetProgress for AssetTracker {
    fn loading_progress(&self) -> f32 {
        let state = self.state.read();
        if state.expected.is_empty() {
            return 1.0;
        }
        state.loaded.len() as f32 / state.expected.len() as f32
    }

    fn is_loaded(&self, key: &str) -> bool {
        self.state.read().loaded.contains(key)
    }
}

/// Headless stand-in for an asset loader: marks one pending key per step
pub async fn load_assets(tracker: Arc<AssetTracker>, per_asset: Duration) {
    let pending = tracker.pending();
    info!(assets = pending.len(), "Loading assets");
    for key in pending {
        tokio::time::sleep(per_asset).await;
        tracker.mark_loaded(&key);
    }
    info!("Assets loaded");
}
