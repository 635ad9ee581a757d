//! Axum route handlers for the review session.

use std::future::Future;

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::header,
    response::IntoResponse,
    Json,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::export::drafts_to_csv;
use crate::few_shot::{external_examples, parse_example_csv};
use crate::models::review::{Draft, ExamplePair, SourcePlatform};
use crate::session::{GenerationOutcome, SessionOverview};
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct LoadRequest {
    pub platform: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct GenerateRequest {
    pub count: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct ManualRequest {
    pub review: String,
    #[serde(default)]
    pub examples: Option<Vec<ExamplePair>>,
    /// CSV text with `review,response` headers, as uploaded.
    #[serde(default)]
    pub examples_csv: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct GenerateResponse {
    pub outcome: GenerationOutcome,
    pub session: SessionOverview,
}

/// Body of an action whose fields are all optional. An empty body means
/// defaults; anything else must be valid JSON for `T`.
fn optional_body<T: DeserializeOwned + Default>(body: &Bytes) -> Result<T, AppError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    serde_json::from_slice(body)
        .map_err(|e| AppError::Validation(format!("Invalid request body: {e}")))
}

/// Runs a session action on its own task. The action keeps running to the
/// end, holding the session lock, even if the client goes away.
async fn detached<T, F>(action: F) -> Result<T, AppError>
where
    F: Future<Output = Result<T, AppError>> + Send + 'static,
    T: Send + 'static,
{
    tokio::spawn(action)
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Session task failed: {e}")))?
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// GET /api/v1/session
pub async fn handle_get_session(State(state): State<AppState>) -> Json<SessionOverview> {
    Json(state.session.lock().await.overview())
}

/// POST /api/v1/reviews/load
///
/// Re-fetches reviews, optionally switching platform first. A missing table
/// and an empty table fail with different codes; either way the session
/// records the failure and stays on the selection screen.
pub async fn handle_load(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<SessionOverview>, AppError> {
    let request: LoadRequest = optional_body(&body)?;
    let mut session = state.session.lock().await;

    if let Some(platform) = request.platform {
        let platform: SourcePlatform = platform.parse().map_err(AppError::Validation)?;
        session.select_source(platform, state.config.table_for(platform))?;
    }

    session.load(state.source.as_ref()).await?;
    Ok(Json(session.overview()))
}

/// POST /api/v1/drafts/generate
pub async fn handle_generate(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<GenerateResponse>, AppError> {
    let request: GenerateRequest = optional_body(&body)?;
    let count = request.count.unwrap_or(state.config.default_batch_size);

    detached(async move {
        let mut session = state.session.lock().await;
        info!("Generating drafts for up to {count} reviews");
        let outcome = session.generate(state.llm.as_ref(), count).await?;

        Ok(Json(GenerateResponse {
            outcome,
            session: session.overview(),
        }))
    })
    .await
}

/// POST /api/v1/drafts/manual
///
/// One draft for a free-text review with caller-supplied examples.
pub async fn handle_manual(
    State(state): State<AppState>,
    Json(request): Json<ManualRequest>,
) -> Result<Json<GenerateResponse>, AppError> {
    let examples = match (request.examples, request.examples_csv) {
        (Some(_), Some(_)) => {
            return Err(AppError::Validation(
                "Provide either examples or examples_csv, not both".to_string(),
            ))
        }
        (Some(pairs), None) => external_examples(pairs)?,
        (None, Some(csv_text)) => parse_example_csv(&csv_text)?,
        (None, None) => Vec::new(),
    };

    let review = request.review;
    detached(async move {
        let mut session = state.session.lock().await;
        let outcome = session
            .generate_manual(state.llm.as_ref(), &review, examples)
            .await?;

        Ok(Json(GenerateResponse {
            outcome,
            session: session.overview(),
        }))
    })
    .await
}

/// POST /api/v1/drafts/regenerate
pub async fn handle_regenerate_all(
    State(state): State<AppState>,
) -> Result<Json<GenerateResponse>, AppError> {
    detached(async move {
        let mut session = state.session.lock().await;
        let outcome = session.regenerate_all(state.llm.as_ref()).await?;

        Ok(Json(GenerateResponse {
            outcome,
            session: session.overview(),
        }))
    })
    .await
}

/// POST /api/v1/drafts/:id/regenerate
pub async fn handle_regenerate(
    State(state): State<AppState>,
    Path(draft_id): Path<Uuid>,
) -> Result<Json<Draft>, AppError> {
    detached(async move {
        let mut session = state.session.lock().await;
        let draft = session.regenerate(state.llm.as_ref(), draft_id).await?;
        Ok(Json(draft.clone()))
    })
    .await
}

/// POST /api/v1/session/back
pub async fn handle_back(State(state): State<AppState>) -> Result<Json<SessionOverview>, AppError> {
    let mut session = state.session.lock().await;
    session.back()?;
    Ok(Json(session.overview()))
}

/// GET /api/v1/drafts/export
///
/// CSV download, one row per draft of the current batch.
pub async fn handle_export(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let session = state.session.lock().await;
    let body = drafts_to_csv(session.drafts())?;

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"review_responses.csv\"",
            ),
        ],
        body,
    ))
}
