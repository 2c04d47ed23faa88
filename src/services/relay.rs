// src/services/relay.rs
use thiserror::Error;
use tracing::{error, info, warn};

use super::conversation::ConversationStore;
use super::generator::{GenerateError, TextGenerator};
use super::membership::{MembershipError, MembershipStore};
use crate::message::Message;

#[derive(Debug, Error)]
pub enum RelayError {
    #[error("sender and text are required")]
    MissingField,
    #[error(transparent)]
    Upstream(#[from] GenerateError),
}

/// Append the user's message, ask the generator for a reply and append it too.
///
/// The user message is stored before the upstream call and is not rolled back
/// if that call fails.
pub async fn relay_message(
    conversation: &ConversationStore,
    generator: &dyn TextGenerator,
    sender: &str,
    text: &str,
) -> Result<Vec<Message>, RelayError> {
    if sender.is_empty() || text.is_empty() {
        return Err(RelayError::MissingField);
    }

    let len = conversation.append(Message::new(sender, text)).await;
    info!(sender, len, "relaying message");

    let reply = match generator.generate(text).await {
        Ok(reply) => reply,
        Err(err) => {
            error!(%err, sender, "generator failed");
            return Err(err.into());
        }
    };

    conversation.append(Message::bot(reply.trim())).await;
    Ok(conversation.list().await)
}

/// Register the nickname (if new) and wipe the shared conversation.
///
/// The wipe is global: every connected viewer loses the history, not only the
/// caller. Returns the number of messages removed.
pub async fn change_nickname(
    members: &MembershipStore,
    conversation: &ConversationStore,
    nickname: &str,
) -> Result<usize, MembershipError> {
    if nickname.is_empty() {
        return Err(MembershipError::Empty);
    }
    let removed = conversation.clear().await;
    let added = members.ensure(nickname).await?;
    let member_count = members.len().await;
    warn!(
        nickname,
        removed,
        added,
        members = member_count,
        "nickname change cleared the shared conversation"
    );
    Ok(removed)
}
