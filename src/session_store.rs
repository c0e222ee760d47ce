//! # Session Store Module
//!
//! Intake sessions keyed by Telegram user id, kept in a teloxide dialogue
//! [`Storage`]. The default backend is [`InMemStorage`]: sessions live until
//! they are submitted, cancelled, or the process exits. Any other
//! `Storage<Session>` backend can be plugged in without touching the flow.
//!
//! The store also hands out a per-user lock. The flow controller holds it
//! for the whole read-modify-write of one event, so two events of the same
//! user never interleave, whichever chat they arrive from.

use std::fmt::Debug;
use std::sync::Arc;

use teloxide::dispatching::dialogue::{InMemStorage, Storage};
use teloxide::types::{ChatId, UserId};
use tokio::sync::{Mutex, MutexGuard};

use crate::errors::SessionStoreError;
use crate::session::Session;

/// Telegram user id
pub type UserKey = u64;

/// Number of lock stripes shared by all users
const LOCK_STRIPES: usize = 64;

/// Store backed by teloxide's in-memory dialogue storage
pub type InMemorySessionStore = SessionStore<InMemStorage<Session>>;

/// Sessions in a dialogue storage, with per-user locking
pub struct SessionStore<St> {
    storage: Arc<St>,
    locks: Vec<Mutex<()>>,
}

impl InMemorySessionStore {
    pub fn in_memory() -> Self {
        Self::new(InMemStorage::new())
    }
}

impl<St> SessionStore<St>
where
    St: Storage<Session> + Send + Sync + 'static,
    St::Error: Debug,
{
    pub fn new(storage: Arc<St>) -> Self {
        Self {
            storage,
            locks: (0..LOCK_STRIPES).map(|_| Mutex::new(())).collect(),
        }
    }

    /// Wait for exclusive access to a user's session
    ///
    /// Users that share a stripe also wait on each other.
    pub async fn lock(&self, user: UserKey) -> MutexGuard<'_, ()> {
        let stripe = (user % LOCK_STRIPES as u64) as usize;
        self.locks[stripe].lock().await
    }

    pub async fn get(&self, user: UserKey) -> Result<Option<Session>, SessionStoreError> {
        Arc::clone(&self.storage)
            .get_dialogue(dialogue_key(user))
            .await
            .map_err(backend_error)
    }

    pub async fn set(&self, user: UserKey, session: Session) -> Result<(), SessionStoreError> {
        Arc::clone(&self.storage)
            .update_dialogue(dialogue_key(user), session)
            .await
            .map_err(backend_error)
    }

    /// Remove and return the user's session
    pub async fn delete(&self, user: UserKey) -> Result<Option<Session>, SessionStoreError> {
        let existing = self.get(user).await?;
        if existing.is_some() {
            Arc::clone(&self.storage)
                .remove_dialogue(dialogue_key(user))
                .await
                .map_err(backend_error)?;
        }
        Ok(existing)
    }
}

/// Sessions are per user, so the user id doubles as the dialogue key
fn dialogue_key(user: UserKey) -> ChatId {
    ChatId::from(UserId(user))
}

fn backend_error<E: Debug>(err: E) -> SessionStoreError {
    SessionStoreError::Backend(format!("{err:?}"))
}
