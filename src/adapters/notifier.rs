use crate::domain::model::{Notification, NotificationKind};
use crate::domain::ports::Notifier;
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

/// In-memory toast board keyed by notification id. Every update is also logged.
#[derive(Debug, Default)]
pub struct ToastBoard {
    toasts: Mutex<BTreeMap<String, Notification>>,
}

impl ToastBoard {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<String, Notification>> {
        // 通知只是顯示用途，鎖中毒時沿用既有內容
        self.toasts.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn get(&self, key: &str) -> Option<Notification> {
        self.lock().get(key).cloned()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn snapshot(&self) -> Vec<Notification> {
        self.lock().values().cloned().collect()
    }
}

impl Notifier for ToastBoard {
    fn notify(&self, key: &str, kind: NotificationKind, message: &str) {
        match kind {
            NotificationKind::Loading => tracing::debug!("⏳ [{}] {}", key, message),
            NotificationKind::Success => tracing::info!("✅ [{}] {}", key, message),
            NotificationKind::Error => tracing::warn!("❌ [{}] {}", key, message),
        }

        self.lock().insert(
            key.to_string(),
            Notification {
                key: key.to_string(),
                kind,
                message: message.to_string(),
                updated_at: chrono::Utc::now(),
            },
        );
    }

    fn dismiss(&self, key: &str) {
        if self.lock().remove(key).is_some() {
            tracing::debug!("Dismissed notification [{}]", key);
        }
    }
}
