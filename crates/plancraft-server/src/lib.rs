//! # plancraft-server
//!
//! HTTP API for the planning backend. Provides:
//!
//! - CRUD for users, projects, milestones, features, tech stacks, task
//!   assignments, memberships and UML documents
//! - Prompt-chain endpoints (roadmap, milestones, tasks, plan, system design,
//!   feature analysis)
//! - The chat agent endpoint, `POST /chat/agent_query`

pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::{
    Router,
    extract::{Request, State},
    middleware::{self, Next},
    response::{Json, Response},
    routing::get,
};
use plancraft_agent::{ChainRunner, ChatAgent};
use plancraft_config::{MISSING_API_KEY_MESSAGE, PlanConfig};
use plancraft_core::{PlanError, UserId};
use plancraft_llm::LlmProvider;
use plancraft_store::Store;
use serde_json::{Value, json};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

pub use error::{ApiError, ApiResult};

/// Shared server state.
pub struct AppState {
    pub config: PlanConfig,
    pub store: Store,
    /// Absent when no model credential is configured.
    pub llm: Option<Arc<dyn LlmProvider>>,
}

/// The authenticated caller, resolved by the auth middleware.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurrentUser(pub UserId);

impl AppState {
    pub fn new(config: PlanConfig, store: Store, llm: Option<Arc<dyn LlmProvider>>) -> Self {
        Self { config, store, llm }
    }

    fn provider(&self) -> Result<Arc<dyn LlmProvider>, PlanError> {
        self.config.services.require_api_key()?;
        self.llm
            .clone()
            .ok_or_else(|| PlanError::MissingCredential(MISSING_API_KEY_MESSAGE.into()))
    }

    pub(crate) fn chains(&self) -> Result<ChainRunner, PlanError> {
        Ok(ChainRunner::new(self.provider()?, &self.config))
    }

    pub(crate) fn agent(&self) -> Result<ChatAgent, PlanError> {
        Ok(ChatAgent::from_config(
            &self.config,
            self.provider()?,
            Arc::new(self.store.clone()),
        ))
    }
}

/// Build the Axum router.
pub fn build_router(state: Arc<AppState>) -> Router {
    let api_routes = routes::api_routes().layer(middleware::from_fn_with_state(
        state.clone(),
        auth_middleware,
    ));

    let mut router = Router::new()
        .route("/", get(root_handler))
        .route("/health", get(health_handler))
        .merge(api_routes)
        .with_state(state.clone())
        .layer(TraceLayer::new_for_http());

    if state.config.server.cors {
        router = router.layer(CorsLayer::permissive());
    }

    router
}

/// Checks the optional bearer secret, then resolves the caller from the
/// configured user header.
async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let headers = request.headers();
    if let Some(ref expected_key) = state.config.server.api_key {
        let provided = headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "));
        if provided != Some(expected_key.as_str()) {
            warn!("unauthorized API request, invalid or missing API key");
            return Err(PlanError::Unauthorized("Invalid or missing API key".into()).into());
        }
    }

    let user = headers
        .get(state.config.server.user_header.as_str())
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<UserId>().ok())
        .filter(|id| *id > 0)
        .ok_or_else(|| PlanError::Unauthorized("Could not validate credentials".into()))?;

    request.extensions_mut().insert(CurrentUser(user));
    Ok(next.run(request).await)
}

async fn root_handler(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(json!({
        "service": "plancraft",
        "version": env!("CARGO_PKG_VERSION"),
        "model": state.config.model.model,
        "api_key_configured": state.config.services.require_api_key().is_ok(),
    }))
}

async fn health_handler() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// Start the HTTP server.
pub async fn start_server(state: Arc<AppState>) -> plancraft_core::Result<()> {
    let listen = state.config.server.listen.clone();
    let router = build_router(state);

    info!(listen = %listen, "starting HTTP server");

    let listener = tokio::net::TcpListener::bind(&listen)
        .await
        .map_err(|e| PlanError::Config(format!("failed to bind {listen}: {e}")))?;

    axum::serve(listener, router)
        .await
        .map_err(PlanError::Io)?;

    Ok(())
}
