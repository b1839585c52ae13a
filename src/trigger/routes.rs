//! HTTP routes for delta delivery and health checks.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use mockable::Clock;
use serde_json::json;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use super::delta::{ChangeSet, mentions_channel};
use crate::publication::services::{PublicationPipeline, TaskOutcome};

/// Builds the trigger router over a shared pipeline.
///
/// `POST /delta` answers:
/// - `200` when the delta does not concern the configured channel,
/// - `500` when discovery fails or every claim hits a store error,
/// - `204` when there is nothing to process,
/// - `202` once tasks are claimed; processing continues in the background.
#[must_use]
pub fn router<C>(pipeline: Arc<PublicationPipeline<C>>) -> Router
where
    C: Clock + Send + Sync + 'static,
{
    Router::new()
        .route("/delta", post(handle_delta::<C>))
        .route("/health", get(health))
        .with_state(pipeline)
}

async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

async fn handle_delta<C>(
    State(pipeline): State<Arc<PublicationPipeline<C>>>,
    Json(changes): Json<Vec<ChangeSet>>,
) -> Response
where
    C: Clock + Send + Sync + 'static,
{
    if !mentions_channel(&changes, &pipeline.config().channel) {
        debug!("delta does not concern the publication channel");
        return StatusCode::OK.into_response();
    }

    let report = match pipeline.discover_and_claim().await {
        Ok(report) => report,
        Err(err) => {
            error!(error = %err, "publication task discovery failed");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": err.to_string() })),
            )
                .into_response();
        }
    };

    if report.only_failures() {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "failed to claim publication tasks" })),
        )
            .into_response();
    }
    if !report.has_claims() {
        return StatusCode::NO_CONTENT.into_response();
    }

    let claimed = report.claimed;
    info!(count = claimed.len(), "accepted publication tasks");
    let worker = Arc::clone(&pipeline);
    let run = tokio::spawn(async move { worker.process_all(claimed).await });
    tokio::spawn(supervise(run));
    StatusCode::ACCEPTED.into_response()
}

/// Waits for a background run and logs how it ended.
///
/// Returns the number of failed tasks, or `None` when the run panicked or
/// was cancelled before reporting outcomes.
async fn supervise(run: JoinHandle<Vec<TaskOutcome>>) -> Option<usize> {
    match run.await {
        Ok(outcomes) => {
            let failed = outcomes.iter().filter(|outcome| !outcome.is_success()).count();
            info!(
                processed = outcomes.len(),
                failed, "finished processing publication tasks"
            );
            Some(failed)
        }
        Err(err) => {
            error!(
                error = %err,
                panicked = err.is_panic(),
                "publication processing aborted; claimed tasks stay ongoing"
            );
            None
        }
    }
}
