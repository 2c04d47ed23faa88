// src/state.rs
use std::sync::Arc;

use crate::services::conversation::ConversationStore;
use crate::services::generator::TextGenerator;
use crate::services::membership::MembershipStore;

pub type SharedState = Arc<AppState>;

pub struct AppState {
    pub members: MembershipStore,
    pub conversation: ConversationStore,
    pub generator: Arc<dyn TextGenerator>,
}

impl AppState {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self {
            members: MembershipStore::new(),
            conversation: ConversationStore::new(),
            generator,
        }
    }
}
