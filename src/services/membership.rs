// src/services/membership.rs
use std::{fmt::Debug, sync::Arc};

use thiserror::Error;
use tokio::sync::RwLock;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MembershipError {
    #[error("nickname is required")]
    Empty,
    #[error("nickname {0:?} is already taken")]
    Taken(String),
}

/// Nicknames that have joined. Entries are never removed.
#[derive(Clone, Default)]
pub struct MembershipStore {
    inner: Arc<RwLock<Vec<String>>>,
}

impl Debug for MembershipStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MembershipStore").finish_non_exhaustive()
    }
}

impl MembershipStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new nickname. Fails if empty or already present.
    pub async fn join(&self, nickname: &str) -> Result<(), MembershipError> {
        if nickname.is_empty() {
            return Err(MembershipError::Empty);
        }
        let mut guard = self.inner.write().await;
        if guard.iter().any(|n| n == nickname) {
            return Err(MembershipError::Taken(nickname.to_string()));
        }
        guard.push(nickname.to_string());
        Ok(())
    }

    /// Add the nickname if it is not known yet. Returns `true` when it was added.
    pub async fn ensure(&self, nickname: &str) -> Result<bool, MembershipError> {
        if nickname.is_empty() {
            return Err(MembershipError::Empty);
        }
        {
            let guard = self.inner.read().await;
            if guard.iter().any(|n| n == nickname) {
                return Ok(false);
            }
        }
        let mut guard = self.inner.write().await;
        // Re-check: another writer may have won the race between the two locks.
        if guard.iter().any(|n| n == nickname) {
            return Ok(false);
        }
        guard.push(nickname.to_string());
        Ok(true)
    }

    /// Number of known nicknames.
    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }
}
