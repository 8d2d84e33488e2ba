use std::path::PathBuf;
use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post};
use axum::Router;
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};

use ripple_core::cancel::CancellationToken;
use ripple_fix::runner::{run_impacted_tests, RunError, RunnerError, TestRunOutcome};
use ripple_impact::engine::{BuildRequest, ImpactEngine, ImpactRequest};
use ripple_impact::types::{BuildError, BuildReport, EngineError, ImpactedTest};

pub type SharedEngine = Arc<ImpactEngine>;

/// Build the axum router with all ripple HTTP endpoints.
pub fn router(engine: SharedEngine) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/build", post(build))
        .route("/impact", post(impact))
        .route("/run", post(run))
        .layer(cors)
        .with_state(engine)
}

/// Start the HTTP server on the given port.
pub async fn serve(engine: SharedEngine, port: u16) -> Result<(), Box<dyn std::error::Error>> {
    let app = router(engine);
    let listener = tokio::net::TcpListener::bind(format!("127.0.0.1:{}", port)).await?;
    tracing::info!(port, "ripple server listening");
    axum::serve(listener, app).await?;
    Ok(())
}

// --- Request / Response types ---

#[derive(Deserialize)]
pub struct RunRequest {
    pub repo_path: PathBuf,
    pub test_ids: Vec<String>,
    #[serde(default)]
    pub timeout_s: Option<u64>,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

#[derive(Serialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub runner: Option<RunnerError>,
}

pub struct ApiError {
    status: StatusCode,
    body: ErrorBody,
}

impl ApiError {
    fn new(status: StatusCode, error: impl ToString) -> Self {
        Self {
            status,
            body: ErrorBody {
                error: error.to_string(),
                runner: None,
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

impl From<BuildError> for ApiError {
    fn from(e: BuildError) -> Self {
        let status = match e {
            BuildError::InvalidRepo { .. } | BuildError::Coverage(_) => StatusCode::BAD_REQUEST,
            BuildError::Cancelled | BuildError::Graph(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self::new(status, e)
    }
}

impl From<EngineError> for ApiError {
    fn from(e: EngineError) -> Self {
        match e {
            EngineError::Build(e) => e.into(),
            EngineError::Query(e) => Self::new(StatusCode::BAD_REQUEST, e),
        }
    }
}

impl From<RunError> for ApiError {
    fn from(e: RunError) -> Self {
        match e {
            RunError::Repo(e) => e.into(),
            RunError::Runner(e) => Self {
                status: StatusCode::BAD_GATEWAY,
                body: ErrorBody {
                    error: e.to_string(),
                    runner: Some(e),
                },
            },
        }
    }
}

/// Run blocking engine work off the async executor.
async fn blocking<T, E, F>(f: F) -> Result<T, ApiError>
where
    F: FnOnce() -> Result<T, E> + Send + 'static,
    T: Send + 'static,
    E: Into<ApiError> + Send + 'static,
{
    match tokio::task::spawn_blocking(f).await {
        Ok(result) => result.map_err(Into::into),
        Err(e) => {
            tracing::error!(error = %e, "request worker failed");
            Err(ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, e))
        }
    }
}

// --- Handlers ---

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

async fn build(
    State(engine): State<SharedEngine>,
    Json(req): Json<BuildRequest>,
) -> Result<Json<BuildReport>, ApiError> {
    let report = blocking(move || engine.build_graph(&req, &CancellationToken::new())).await?;
    Ok(Json(report))
}

async fn impact(
    State(engine): State<SharedEngine>,
    Json(req): Json<ImpactRequest>,
) -> Result<Json<Vec<ImpactedTest>>, ApiError> {
    let tests =
        blocking(move || engine.get_impacted_tests(&req, &CancellationToken::new())).await?;
    Ok(Json(tests))
}

async fn run(Json(req): Json<RunRequest>) -> Result<Json<TestRunOutcome>, ApiError> {
    let outcome =
        blocking(move || run_impacted_tests(&req.repo_path, &req.test_ids, req.timeout_s)).await?;
    Ok(Json(outcome))
}
