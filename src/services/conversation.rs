// src/services/conversation.rs
use std::{fmt::Debug, sync::Arc};

use tokio::sync::RwLock;

use crate::message::Message;

/// The single global conversation. Append-only apart from `clear`.
#[derive(Clone, Default)]
pub struct ConversationStore {
    inner: Arc<RwLock<Vec<Message>>>,
}

impl Debug for ConversationStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConversationStore").finish_non_exhaustive()
    }
}

impl ConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a message and return the new length.
    pub async fn append(&self, message: Message) -> usize {
        let mut guard = self.inner.write().await;
        guard.push(message);
        guard.len()
    }

    /// Copy of the whole conversation in insertion order.
    pub async fn list(&self) -> Vec<Message> {
        self.inner.read().await.clone()
    }

    /// Drop every message. Returns how many were removed.
    pub async fn clear(&self) -> usize {
        let mut guard = self.inner.write().await;
        let removed = guard.len();
        guard.clear();
        removed
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }
}
