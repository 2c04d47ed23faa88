// src/client/poller.rs
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, error};

use super::{ChatClient, ClientError};
use crate::message::Message;

pub const POLL_INTERVAL: Duration = Duration::from_secs(1);

/// What a viewer currently shows. Replaced wholesale on every successful poll.
#[derive(Clone, Debug, Default)]
pub struct ConversationView {
    pub messages: Vec<Message>,
    /// Last failure, cleared by the next successful fetch.
    pub last_error: Option<String>,
    /// Number of successful refreshes so far.
    pub refreshes: u64,
}

impl ConversationView {
    fn replace(&mut self, messages: Vec<Message>) {
        self.messages = messages;
        self.last_error = None;
        self.refreshes += 1;
    }
}

/// How a freshly polled list relates to what a viewer already shows.
#[derive(Debug, PartialEq, Eq)]
pub enum ViewChange<'a> {
    /// `shown` is a prefix of the new list; these messages follow it.
    Appended(&'a [Message]),
    /// The list was cleared since `shown`; this is the whole new list.
    Reset(&'a [Message]),
}

/// Compare by content, not length: a clear followed by new messages can
/// leave the list exactly as long as before.
pub fn diff_view<'a>(shown: &[Message], current: &'a [Message]) -> ViewChange<'a> {
    if current.starts_with(shown) {
        ViewChange::Appended(&current[shown.len()..])
    } else {
        ViewChange::Reset(current)
    }
}

/// Background task that re-fetches the conversation on a fixed timer.
/// Dropping the poller cancels the task.
pub struct MessagePoller {
    handle: JoinHandle<()>,
    view: watch::Receiver<ConversationView>,
}

impl MessagePoller {
    pub fn spawn(client: ChatClient, interval: Duration) -> Self {
        let (tx, rx) = watch::channel(ConversationView::default());
        Self::spawn_with(client, interval, tx, rx)
    }

    fn spawn_with(
        client: ChatClient,
        interval: Duration,
        tx: watch::Sender<ConversationView>,
        rx: watch::Receiver<ConversationView>,
    ) -> Self {
        let handle = tokio::spawn(async move {
            let mut ticker = time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                // First tick completes immediately.
                ticker.tick().await;
                match client.fetch_messages().await {
                    Ok(messages) => {
                        debug!(count = messages.len(), "poll refreshed conversation");
                        tx.send_modify(|view| view.replace(messages));
                    }
                    Err(err) => {
                        error!(%err, "failed to fetch messages");
                        tx.send_modify(|view| view.last_error = Some(err.to_string()));
                    }
                }
                if tx.is_closed() {
                    break;
                }
            }
        });
        Self { handle, view: rx }
    }

    /// Snapshot of the current view.
    pub fn view(&self) -> ConversationView {
        self.view.borrow().clone()
    }

    /// A receiver that is notified on every refresh or failure.
    pub fn subscribe(&self) -> watch::Receiver<ConversationView> {
        self.view.clone()
    }

    pub fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }

    pub fn stop(&self) {
        self.handle.abort();
    }
}

impl Drop for MessagePoller {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// A chat view bound to one nickname: announces the nickname once, then polls.
pub struct ChatSession {
    client: ChatClient,
    nickname: String,
    poller: MessagePoller,
    local: watch::Sender<ConversationView>,
}

impl ChatSession {
    /// Announce `nickname` to the server and start polling.
    ///
    /// The server wipes the shared conversation on every nickname change, so
    /// opening a session clears the history for all connected viewers.
    pub async fn open(client: ChatClient, nickname: impl Into<String>) -> Self {
        Self::open_with_interval(client, nickname, POLL_INTERVAL).await
    }

    pub async fn open_with_interval(
        client: ChatClient,
        nickname: impl Into<String>,
        interval: Duration,
    ) -> Self {
        let nickname = nickname.into();
        let (tx, rx) = watch::channel(ConversationView::default());

        if let Err(err) = client.change_nickname(&nickname).await {
            error!(%err, nickname = %nickname, "failed to announce nickname");
            tx.send_modify(|view| view.last_error = Some(err.to_string()));
        }

        let poller = MessagePoller::spawn_with(client.clone(), interval, tx.clone(), rx);
        Self { client, nickname, poller, local: tx }
    }

    pub fn nickname(&self) -> &str {
        &self.nickname
    }

    pub fn is_own(&self, message: &Message) -> bool {
        message.sender == self.nickname
    }

    /// Send `text` as this session's user. Blank input is ignored.
    pub async fn send(&self, text: &str) -> Result<(), ClientError> {
        if text.trim().is_empty() {
            return Ok(());
        }
        match self.client.send_message(&self.nickname, text).await {
            Ok(messages) => {
                self.local.send_modify(|view| view.replace(messages));
                Ok(())
            }
            Err(err) => {
                error!(%err, "failed to send message");
                self.local.send_modify(|view| view.last_error = Some(err.to_string()));
                Err(err)
            }
        }
    }

    pub fn view(&self) -> ConversationView {
        self.poller.view()
    }

    pub fn subscribe(&self) -> watch::Receiver<ConversationView> {
        self.poller.subscribe()
    }

    pub fn poller(&self) -> &MessagePoller {
        &self.poller
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn msg(sender: &str, text: &str, secs: u32) -> Message {
        Message::at(sender, text, Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, secs).unwrap())
    }

    #[test]
    fn growing_list_is_appended() {
        let shown = vec![msg("alice", "hi", 0), msg("AI BOT", "hello", 1)];
        let mut current = shown.clone();
        current.push(msg("alice", "again", 2));
        assert_eq!(diff_view(&shown, &current), ViewChange::Appended(&current[2..]));
        assert_eq!(diff_view(&current, &current), ViewChange::Appended(&[]));
    }

    #[test]
    fn clear_then_same_length_is_reset() {
        let shown = vec![msg("alice", "hi", 0), msg("AI BOT", "hello", 1)];
        let current = vec![msg("bob", "yo", 5), msg("AI BOT", "hey bob", 6)];
        assert_eq!(diff_view(&shown, &current), ViewChange::Reset(&current[..]));
    }

    #[test]
    fn shorter_list_is_reset() {
        let shown = vec![msg("alice", "hi", 0), msg("AI BOT", "hello", 1)];
        assert_eq!(diff_view(&shown, &[]), ViewChange::Reset(&[]));
    }
}
