use axum::{
    extract::{Json, State},
    routing::post,
    Router,
};

use crate::{
    auth::AuthUser,
    errors::ServiceError,
    handlers::AppState,
    services::chatbot::{ChatbotReply, ChatbotRequest},
    ApiResponse,
};

/// Support chat: five-digit messages are order lookups, everything else
/// goes to the assistant
#[utoipa::path(
    post,
    path = "/api/chatbot",
    request_body = ChatbotRequest,
    responses(
        (status = 200, description = "Reply", body = crate::ApiResponse<ChatbotReply>),
        (status = 502, description = "Assistant unavailable", body = crate::errors::ErrorResponse)
    ),
    security(("session_cookie" = [])),
    tag = "Chatbot"
)]
pub async fn chat(
    State(state): State<AppState>,
    user: AuthUser,
    Json(request): Json<ChatbotRequest>,
) -> Result<Json<ApiResponse<ChatbotReply>>, ServiceError> {
    let reply = state
        .services
        .chatbot
        .reply(user.customer_id, request)
        .await?;
    Ok(Json(ApiResponse::success(reply)))
}

pub fn chatbot_routes() -> Router<AppState> {
    Router::new().route("/", post(chat))
}
