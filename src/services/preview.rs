//! Short-lived preview links for attachment content.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use uuid::Uuid;

use crate::domain::attachment::AttachmentBlob;

/// How long a preview link stays valid.
pub const PREVIEW_TTL: Duration = Duration::from_secs(10);

#[derive(Clone, Debug)]
pub struct PreviewRegistry {
    entries: Arc<Mutex<HashMap<Uuid, AttachmentBlob>>>,
    ttl: Duration,
}

impl Default for PreviewRegistry {
    fn default() -> Self {
        Self::new(PREVIEW_TTL)
    }
}

impl PreviewRegistry {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Arc::new(Mutex::new(HashMap::new())),
            ttl,
        }
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<Uuid, AttachmentBlob>> {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Stores `blob` under a fresh token and schedules its release.
    ///
    /// Must be called from within a tokio runtime.
    pub fn register(&self, blob: AttachmentBlob) -> Uuid {
        let token = Uuid::new_v4();
        self.entries().insert(token, blob);

        let registry = self.clone();
        tokio::spawn(async move {
            tokio::time::sleep(registry.ttl).await;
            registry.release(token);
            log::debug!("Released preview {token}");
        });

        token
    }

    pub fn get(&self, token: Uuid) -> Option<AttachmentBlob> {
        self.entries().get(&token).cloned()
    }

    pub fn release(&self, token: Uuid) {
        self.entries().remove(&token);
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }
}
