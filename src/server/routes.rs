//! HTTP route handlers for the agent API.

use std::sync::Arc;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use crate::agent::{AgentAction, ConversationState, Message};
use crate::ckan::DatasetDetails;
use crate::uischema::{dataset_detail_schema, RenderedView, Renderer, UiSchema};

use super::state::AppState;

/// Create the API router with all routes.
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/api/chat", post(chat_turn))
        .route("/api/render", post(render_dataset))
        .with_state(state)
}

/// Health check endpoint.
async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "opendata-agent",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Chat turn request.
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    /// The user's message.
    pub message: String,
    /// Prior thread history, if the client keeps one.
    #[serde(default)]
    pub history: Vec<Message>,
}

/// Chat turn response.
#[derive(Debug, Serialize)]
pub struct ChatResponse {
    /// The updated thread, including the new user and assistant messages.
    pub messages: Vec<Message>,
    /// Summary of the most recent result, when a tool ran.
    pub summary: Option<String>,
    /// Terminal error of the turn, if one occurred.
    pub error: Option<String>,
    /// The action the turn resolved to.
    pub action: AgentAction,
}

/// Run one agent turn.
async fn chat_turn(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ChatRequest>,
) -> Json<ChatResponse> {
    let conversation = ConversationState::resume(request.history, request.message);
    let conversation = state.agent.run_turn(conversation).await;

    Json(ChatResponse {
        messages: conversation.messages,
        summary: conversation.last_summary,
        error: conversation.error,
        action: conversation.next_action,
    })
}

/// Render request: a normalized dataset record.
#[derive(Debug, Deserialize)]
pub struct RenderRequest {
    /// The dataset to render.
    pub details: DatasetDetails,
}

/// Render response: the generated schema plus its formatted view tree.
#[derive(Debug, Serialize)]
pub struct RenderResponse {
    /// The generated schema (the stable presentation contract).
    pub schema: UiSchema,
    /// The formatted view tree for the default local state.
    pub view: RenderedView,
}

/// Map a dataset into a schema and render it.
async fn render_dataset(Json(request): Json<RenderRequest>) -> Json<RenderResponse> {
    let schema = dataset_detail_schema(&request.details);
    let renderer = Renderer::new(schema.clone());
    let view = renderer.render();

    Json(RenderResponse { schema, view })
}
