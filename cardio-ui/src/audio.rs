//! Revocable playback URLs for uploaded heart-sound files
//!
//! The page plays the selected PCG file through `GET /audio/{id}`. Each id is
//! issued by [`AudioUrlRegistry::create`] as an [`AudioHandle`]; the handle
//! owns the URL and revokes it when released or dropped, so a replaced file
//! never stays reachable (or in memory) behind a stale URL.

use axum::body::Bytes;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;
use uuid::Uuid;

use crate::uploads::{UploadedFile, DEFAULT_PCG_CONTENT_TYPE};

/// Audio payload behind a live URL
#[derive(Debug, Clone)]
pub struct AudioBlob {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Bytes,
}

/// Registry counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AudioRegistryStats {
    pub live: usize,
    /// Highest number of simultaneously live URLs ever observed
    pub peak_live: usize,
    pub created: u64,
    pub revoked: u64,
}

#[derive(Default)]
struct RegistryInner {
    entries: HashMap<Uuid, AudioBlob>,
    stats: AudioRegistryStats,
}

/// Issues and serves audio URLs
#[derive(Default)]
pub struct AudioUrlRegistry {
    inner: Mutex<RegistryInner>,
}

impl AudioUrlRegistry {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn lock(&self) -> MutexGuard<'_, RegistryInner> {
        // Entries stay consistent even if a holder panicked mid-lookup
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Register `file` and return the handle owning its URL
    pub fn create(self: &Arc<Self>, file: &UploadedFile) -> AudioHandle {
        let id = Uuid::new_v4();
        let blob = AudioBlob {
            file_name: file.name.clone(),
            content_type: file.content_type_or(DEFAULT_PCG_CONTENT_TYPE).to_string(),
            bytes: file.bytes.clone(),
        };

        let mut inner = self.lock();
        inner.entries.insert(id, blob);
        inner.stats.created += 1;
        inner.stats.live = inner.entries.len();
        inner.stats.peak_live = inner.stats.peak_live.max(inner.stats.live);
        debug!(%id, file = %file.name, live = inner.stats.live, "Audio URL created");

        AudioHandle {
            id,
            registry: Arc::clone(self),
            released: false,
        }
    }

    /// Returns false if `id` was not live
    fn revoke(&self, id: Uuid) -> bool {
        let mut inner = self.lock();
        let removed = inner.entries.remove(&id).is_some();
        if removed {
            inner.stats.revoked += 1;
            inner.stats.live = inner.entries.len();
            debug!(%id, live = inner.stats.live, "Audio URL revoked");
        }
        removed
    }

    pub fn get(&self, id: Uuid) -> Option<AudioBlob> {
        self.lock().entries.get(&id).cloned()
    }

    pub fn is_live(&self, id: Uuid) -> bool {
        self.lock().entries.contains_key(&id)
    }

    pub fn stats(&self) -> AudioRegistryStats {
        self.lock().stats
    }
}

/// Owned audio URL; revoked on [`AudioHandle::release`] or drop
pub struct AudioHandle {
    id: Uuid,
    registry: Arc<AudioUrlRegistry>,
    released: bool,
}

impl AudioHandle {
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Path the page uses as the `<audio src>`
    pub fn url(&self) -> String {
        audio_url(self.id)
    }

    /// Revoke now rather than at drop
    pub fn release(mut self) {
        self.registry.revoke(self.id);
        self.released = true;
    }
}

impl Drop for AudioHandle {
    fn drop(&mut self) {
        if !self.released {
            self.registry.revoke(self.id);
        }
    }
}

impl std::fmt::Debug for AudioHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AudioHandle")
            .field("id", &self.id)
            .field("released", &self.released)
            .finish()
    }
}

pub fn audio_url(id: Uuid) -> String {
    format!("/audio/{}", id)
}
