use std::sync::Arc;

use axum::extract::{Extension, Json, State};
use plancraft_core::{ChatTurn, StructuredSignal};
use serde::{Deserialize, Serialize};

use crate::{ApiResult, AppState, CurrentUser};

#[derive(Debug, Deserialize)]
pub struct ChatQuery {
    query: String,
    #[serde(default)]
    history: Vec<ChatTurn>,
}

#[derive(Debug, Serialize)]
pub struct ChatReply {
    response: String,
    tool_action: Option<StructuredSignal>,
}

pub async fn agent_query(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Json(body): Json<ChatQuery>,
) -> ApiResult<Json<ChatReply>> {
    let agent = state.agent()?;
    let answer = agent.answer(&body.query, user, &body.history).await?;
    Ok(Json(ChatReply {
        response: answer.output_text,
        tool_action: answer.tool_action,
    }))
}
