use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use serde_json::json;
use tracing::error;

use crate::cohort::{AdmissionCycle, InstitutionalSource, PeerCohortSource, SubmissionId};
use crate::engine::StudentProfile;
use crate::service::{ChancesRequest, ChancesService};

/// JSON body of `POST /api/v1/chances`: the student profile plus request options.
#[derive(Debug, Deserialize)]
pub struct ChancesRequestBody {
    #[serde(flatten)]
    pub profile: StudentProfile,
    #[serde(default)]
    pub cycle: Option<String>,
    #[serde(default)]
    pub submission_id: Option<SubmissionId>,
}

pub struct ChancesState<I, P> {
    service: Arc<ChancesService<I, P>>,
    deadline: Duration,
}

impl<I, P> Clone for ChancesState<I, P> {
    fn clone(&self) -> Self {
        Self {
            service: self.service.clone(),
            deadline: self.deadline,
        }
    }
}

/// Router exposing chances classification; each request must finish within `deadline`.
pub fn chances_router<I, P>(service: Arc<ChancesService<I, P>>, deadline: Duration) -> Router
where
    I: InstitutionalSource + 'static,
    P: PeerCohortSource + 'static,
{
    Router::new()
        .route("/api/v1/chances", post(chances_handler::<I, P>))
        .route(
            "/api/v1/chances/cache",
            get(cache_stats_handler::<I, P>).delete(invalidate_cache_handler::<I, P>),
        )
        .with_state(ChancesState { service, deadline })
}

pub(crate) async fn chances_handler<I, P>(
    State(state): State<ChancesState<I, P>>,
    axum::Json(body): axum::Json<ChancesRequestBody>,
) -> Response
where
    I: InstitutionalSource + 'static,
    P: PeerCohortSource + 'static,
{
    let cycle = match body.cycle.as_deref().map(str::parse::<AdmissionCycle>).transpose() {
        Ok(cycle) => cycle,
        Err(error) => {
            let payload = json!({ "error": error.to_string() });
            return (StatusCode::UNPROCESSABLE_ENTITY, axum::Json(payload)).into_response();
        }
    };

    let request = ChancesRequest {
        profile: body.profile,
        cycle,
        submission_id: body.submission_id,
    };
    let service = state.service.clone();
    let task = tokio::task::spawn_blocking(move || service.chances(&request));

    match tokio::time::timeout(state.deadline, task).await {
        Ok(Ok(Ok(report))) => (StatusCode::OK, axum::Json(report)).into_response(),
        Ok(Ok(Err(other))) => {
            let payload = json!({ "error": other.to_string() });
            (StatusCode::SERVICE_UNAVAILABLE, axum::Json(payload)).into_response()
        }
        Ok(Err(join_error)) => {
            error!(error = %join_error, "chances task failed");
            let payload = json!({ "error": "chances computation failed" });
            (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(payload)).into_response()
        }
        Err(_) => {
            let payload = json!({
                "error": format!(
                    "chances computation exceeded {} ms",
                    state.deadline.as_millis()
                ),
            });
            (StatusCode::GATEWAY_TIMEOUT, axum::Json(payload)).into_response()
        }
    }
}

pub(crate) async fn cache_stats_handler<I, P>(State(state): State<ChancesState<I, P>>) -> Response
where
    I: InstitutionalSource + 'static,
    P: PeerCohortSource + 'static,
{
    (StatusCode::OK, axum::Json(state.service.cache_stats())).into_response()
}

pub(crate) async fn invalidate_cache_handler<I, P>(
    State(state): State<ChancesState<I, P>>,
) -> StatusCode
where
    I: InstitutionalSource + 'static,
    P: PeerCohortSource + 'static,
{
    state.service.invalidate_caches();
    StatusCode::NO_CONTENT
}
