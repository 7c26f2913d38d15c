//! In-memory wizard sessions
//!
//! One draft per user, evicted after an idle period. Drafts never reach the
//! database, so a restart drops every wizard in progress.

use std::sync::Arc;
use std::time::Duration;

use invevent_core::TelegramId;
use invevent_core::wizard::Draft;
use moka::future::Cache;
use tokio::sync::{Mutex, OwnedMutexGuard};

#[derive(Clone)]
pub struct WizardSessions {
    drafts: Cache<TelegramId, Draft>,
    locks: Cache<TelegramId, Arc<Mutex<()>>>,
}

impl WizardSessions {
    pub fn new(idle_ttl: Duration) -> Self {
        Self {
            drafts: Cache::builder().time_to_idle(idle_ttl).build(),
            locks: Cache::builder().time_to_idle(idle_ttl).build(),
        }
    }

    /// Replace any existing draft with `draft`
    pub async fn start(&self, user: TelegramId, draft: Draft) {
        self.drafts.insert(user, draft).await;
    }

    pub async fn get(&self, user: TelegramId) -> Option<Draft> {
        self.drafts.get(&user).await
    }

    pub async fn save(&self, user: TelegramId, draft: Draft) {
        self.drafts.insert(user, draft).await;
    }

    /// Drop the user's draft; a no-op when there is none
    pub async fn reset(&self, user: TelegramId) {
        self.drafts.invalidate(&user).await;
    }

    /// Serialize read-transition-write sequences of one user
    pub async fn lock(&self, user: TelegramId) -> OwnedMutexGuard<()> {
        let lock = self
            .locks
            .get_with(user, async { Arc::new(Mutex::new(())) })
            .await;
        lock.lock_owned().await
    }
}
