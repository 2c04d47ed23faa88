// src/client/mod.rs
pub mod poller;

use reqwest::{Client, Response};
use serde::Serialize;
use thiserror::Error;

use crate::message::{Message, NicknameRequest, SendMessageRequest, StatusResponse};

pub use poller::{ChatSession, ConversationView, MessagePoller, POLL_INTERVAL, ViewChange, diff_view};

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("server returned {status}: {message}")]
    Status { status: u16, message: String },
}

impl ClientError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Status { status, .. } => Some(*status),
            ClientError::Http(err) => err.status().map(|s| s.as_u16()),
        }
    }
}

/// Thin HTTP wrapper over the relay server API.
#[derive(Clone, Debug)]
pub struct ChatClient {
    http: Client,
    base_url: String,
}

impl ChatClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(Client::new(), base_url)
    }

    pub fn with_client(http: Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { http, base_url }
    }

    pub async fn join(&self, nickname: &str) -> Result<StatusResponse, ClientError> {
        let body = NicknameRequest { nickname: Some(nickname.to_string()) };
        let response = self.post("/join", &body).await?;
        Ok(response.json().await?)
    }

    pub async fn change_nickname(&self, nickname: &str) -> Result<StatusResponse, ClientError> {
        let body = NicknameRequest { nickname: Some(nickname.to_string()) };
        let response = self.post("/change-nickname", &body).await?;
        Ok(response.json().await?)
    }

    /// Post a message and get back the whole conversation, bot reply included.
    pub async fn send_message(&self, sender: &str, text: &str) -> Result<Vec<Message>, ClientError> {
        let body = SendMessageRequest {
            sender: Some(sender.to_string()),
            text: Some(text.to_string()),
        };
        let response = self.post("/send-message", &body).await?;
        Ok(response.json().await?)
    }

    pub async fn fetch_messages(&self) -> Result<Vec<Message>, ClientError> {
        let response = self.http.get(self.url("/messages")).send().await?;
        let response = check_status(response).await?;
        Ok(response.json().await?)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn post<B: Serialize>(&self, path: &str, body: &B) -> Result<Response, ClientError> {
        let response = self.http.post(self.url(path)).json(body).send().await?;
        check_status(response).await
    }
}

async fn check_status(response: Response) -> Result<Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let text = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<StatusResponse>(&text)
        .map(|r| r.message)
        .unwrap_or(text);
    Err(ClientError::Status { status: status.as_u16(), message })
}
