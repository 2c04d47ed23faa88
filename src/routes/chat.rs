use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};
use tracing::{debug, info};

use crate::{
    error::AppError,
    message::{Message, NicknameRequest, SendMessageRequest, StatusResponse},
    services::relay::{change_nickname, relay_message},
    state::SharedState,
};

// A body that is not valid JSON is handled like one with every field missing.
fn body_or_default<T: Default>(payload: Result<Json<T>, JsonRejection>) -> T {
    match payload {
        Ok(Json(body)) => body,
        Err(rejection) => {
            debug!(%rejection, "unreadable request body");
            T::default()
        }
    }
}

pub async fn join_handler(
    State(state): State<SharedState>,
    payload: Result<Json<NicknameRequest>, JsonRejection>,
) -> Result<Json<StatusResponse>, AppError> {
    let nickname = body_or_default(payload).nickname.unwrap_or_default();

    state.members.join(&nickname).await?;
    let members = state.members.len().await;
    info!(nickname = %nickname, members, "user joined");

    Ok(Json(StatusResponse::new("Joined successfully")))
}

pub async fn change_nickname_handler(
    State(state): State<SharedState>,
    payload: Result<Json<NicknameRequest>, JsonRejection>,
) -> Result<Json<StatusResponse>, AppError> {
    let nickname = body_or_default(payload).nickname.unwrap_or_default();

    change_nickname(&state.members, &state.conversation, &nickname).await?;

    Ok(Json(StatusResponse::new("Nickname changed successfully")))
}

pub async fn send_message_handler(
    State(state): State<SharedState>,
    payload: Result<Json<SendMessageRequest>, JsonRejection>,
) -> Result<Json<Vec<Message>>, AppError> {
    let body = body_or_default(payload);
    let sender = body.sender.unwrap_or_default();
    let text = body.text.unwrap_or_default();

    let conversation =
        relay_message(&state.conversation, state.generator.as_ref(), &sender, &text).await?;

    Ok(Json(conversation))
}

pub async fn get_messages_handler(State(state): State<SharedState>) -> Json<Vec<Message>> {
    Json(state.conversation.list().await)
}
