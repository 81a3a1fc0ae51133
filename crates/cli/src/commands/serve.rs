//! HTTP front end.
//!
//! `POST /ask` takes `{"question": "..."}` and returns `{"answer": "..."}`.
//! Errors use `{"error": {"code", "message"}}`.

use anyhow::Context;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use clap::Args;
use docqa_core::{config::AppConfig, AppError};
use docqa_knowledge::QaService;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use super::{non_blank, EMPTY_QUESTION_REPLY};

/// Serve the HTTP API
#[derive(Args, Debug)]
pub struct ServeCommand {
    /// Address to bind (default from config, 0.0.0.0:5000)
    #[arg(long)]
    pub bind: Option<String>,
}

impl ServeCommand {
    pub async fn execute(&self, config: &AppConfig, base: &str) -> anyhow::Result<()> {
        let bind_addr = self.bind.as_deref().unwrap_or(&config.server.bind);

        let service = QaService::start(config, base)
            .await
            .context("service failed to start")?;

        let app = router(Arc::new(service));

        let listener = tokio::net::TcpListener::bind(bind_addr)
            .await
            .with_context(|| format!("failed to bind {}", bind_addr))?;
        tracing::info!("Listening on http://{}", bind_addr);

        axum::serve(listener, app).await?;
        Ok(())
    }
}

#[derive(Clone)]
struct AppState {
    service: Arc<QaService>,
}

fn router(service: Arc<QaService>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/ask", post(handle_ask))
        .route("/health", get(handle_health))
        .layer(cors)
        .with_state(AppState { service })
}

// ============ Error response ============

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

struct ApiError {
    status: StatusCode,
    code: &'static str,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code.to_string(),
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        if err.is_generation_failure() {
            ApiError {
                status: StatusCode::BAD_GATEWAY,
                code: "generation_failed",
                message: err.to_string(),
            }
        } else {
            ApiError {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                code: "internal",
                message: err.to_string(),
            }
        }
    }
}

// ============ POST /ask ============

#[derive(Debug, Default, Deserialize)]
struct AskRequest {
    #[serde(default)]
    question: Option<String>,
}

#[derive(Debug, Serialize)]
struct AskResponse {
    answer: String,
}

async fn handle_ask(
    State(state): State<AppState>,
    body: Result<Json<AskRequest>, JsonRejection>,
) -> Result<Json<AskResponse>, ApiError> {
    let question = match body {
        Ok(Json(request)) => request.question.unwrap_or_default(),
        Err(rejection) => {
            tracing::debug!("Unreadable /ask body: {}", rejection);
            String::new()
        }
    };

    let Some(question) = non_blank(&question) else {
        return Ok(Json(AskResponse {
            answer: EMPTY_QUESTION_REPLY.to_string(),
        }));
    };

    let answer = state.service.answer_question(question).await?;
    Ok(Json(AskResponse { answer }))
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
    documents: usize,
}

async fn handle_health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        documents: state.service.retriever().document_count(),
    })
}
