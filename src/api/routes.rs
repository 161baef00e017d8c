//! API Routes
//!
//! HTTP endpoint definitions.

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::{MintRecord, MintStatus, ValidationError};
use crate::error::{ApiError, AppError, CREATE_FAILURE, READ_FAILURE};
use crate::handlers::{
    CreateMintCommand, CreateMintHandler, ListMintsHandler, ListMintsQuery, MintPage,
};
use crate::queue::SharedWorkQueue;
use crate::store::SharedMintStore;

/// Confirmation text returned by the creation endpoint
pub const MINT_ACCEPTED_MESSAGE: &str = "Mint request received and queued for processing";

/// Shared state of the HTTP handlers
#[derive(Clone)]
pub struct AppState {
    create: Arc<CreateMintHandler>,
    list: Arc<ListMintsHandler>,
}

impl AppState {
    pub fn new(store: SharedMintStore, queue: SharedWorkQueue) -> Self {
        Self {
            create: Arc::new(CreateMintHandler::new(store.clone(), queue)),
            list: Arc::new(ListMintsHandler::new(store)),
        }
    }
}

// =========================================================================
// Request/Response types
// =========================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateMintResponse {
    pub id: Uuid,
    pub status: MintStatus,
    pub message: String,
}

/// Raw query of `GET /mint`; validated by [`ListMintsQuery::from_params`]
#[derive(Debug, Default, Deserialize)]
pub struct ListMintsParams {
    #[serde(default)]
    pub limit: Option<String>,
    #[serde(default, rename = "nextToken")]
    pub next_token: Option<String>,
}

// =========================================================================
// API Router
// =========================================================================

/// Create the API router
pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/mint", get(list_mints).post(create_mint))
        .route("/mint/:mint_id", get(get_mint))
}

// =========================================================================
// POST /mint
// =========================================================================

/// Accept a mint request
async fn create_mint(
    State(state): State<AppState>,
    body: Result<Json<serde_json::Value>, JsonRejection>,
) -> Result<Json<CreateMintResponse>, ApiError> {
    let Json(body) = body.map_err(ApiError::from_json_rejection)?;

    let command = CreateMintCommand::from_json(&body).map_err(|e| {
        tracing::info!(error = %e.detail(), "Rejected mint request");
        AppError::from(e).during(CREATE_FAILURE)
    })?;

    let result = state
        .create
        .execute(command)
        .await
        .map_err(|e| e.during(CREATE_FAILURE))?;

    Ok(Json(CreateMintResponse {
        id: result.mint_id,
        status: result.status,
        message: MINT_ACCEPTED_MESSAGE.to_string(),
    }))
}

// =========================================================================
// GET /mint
// =========================================================================

/// List mints newest first
async fn list_mints(
    State(state): State<AppState>,
    params: Result<Query<ListMintsParams>, QueryRejection>,
) -> Result<Json<MintPage>, ApiError> {
    let Query(params) = params.map_err(ApiError::from_query_rejection)?;

    let query = ListMintsQuery::from_params(params.limit.as_deref(), params.next_token.as_deref())
        .map_err(|e| AppError::from(e).during(READ_FAILURE))?;

    let page = state
        .list
        .list(query)
        .await
        .map_err(|e| e.during(READ_FAILURE))?;

    Ok(Json(page))
}

// =========================================================================
// GET /mint/:mint_id
// =========================================================================

/// Get one mint
async fn get_mint(
    State(state): State<AppState>,
    Path(mint_id): Path<String>,
) -> Result<Json<MintRecord>, ApiError> {
    let mint_id = Uuid::parse_str(&mint_id)
        .map_err(|_| AppError::from(ValidationError::InvalidMintId(mint_id)).during(READ_FAILURE))?;

    let record = state
        .list
        .get(mint_id)
        .await
        .map_err(|e| e.during(READ_FAILURE))?;

    Ok(Json(record))
}
