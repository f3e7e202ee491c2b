//! HTTP and WebSocket surface.

pub mod routes;
pub mod ws;

use std::sync::Arc;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{Json, Router};
use serde_json::json;
use tower_http::cors::CorsLayer;
use tracing::error;

use crate::chat::ConversationRouter;
use crate::error::Error;
use crate::llm::Oracle;
use crate::personality::DriftReanalyzer;
use crate::recommend::Recommender;
use crate::store::Database;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<dyn Database>,
    pub router: Arc<ConversationRouter>,
    pub reanalyzer: Arc<DriftReanalyzer>,
}

impl AppState {
    pub fn new(
        db: Arc<dyn Database>,
        oracle: Arc<dyn Oracle>,
        recommender: Arc<Recommender>,
        reanalysis_days: u32,
    ) -> Self {
        Self {
            router: Arc::new(ConversationRouter::new(
                Arc::clone(&db),
                Arc::clone(&oracle),
                recommender,
            )),
            reanalyzer: Arc::new(DriftReanalyzer::new(Arc::clone(&db), oracle, reanalysis_days)),
            db,
        }
    }
}

/// The full application: REST routes, the chat WebSocket and permissive CORS.
pub fn app(state: AppState) -> Router {
    routes::api_routes()
        .merge(ws::ws_routes())
        .with_state(state)
        .layer(CorsLayer::permissive())
}

/// Error response wrapper mapping domain errors to status codes.
#[derive(Debug)]
pub struct ApiError(pub Error);

impl From<Error> for ApiError {
    fn from(e: Error) -> Self {
        Self(e)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            Error::Validation(_) => StatusCode::BAD_REQUEST,
            Error::NotFound { .. } => StatusCode::NOT_FOUND,
            Error::Conflict(_) => StatusCode::CONFLICT,
            Error::UpstreamFormat { .. } => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// `{"error": ..}` plus `"retryable": true` when the caller may retry.
    pub fn body(&self) -> serde_json::Value {
        let mut body = json!({ "error": self.0.to_string() });
        if self.0.is_retryable() {
            body["retryable"] = json!(true);
        }
        body
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(error = %self.0, "Request failed");
        }
        (status, Json(self.body())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{DatabaseError, LlmError};

    #[test]
    fn domain_errors_map_to_status_codes() {
        let cases = [
            (Error::Validation("x".into()), StatusCode::BAD_REQUEST),
            (Error::not_found("Program", "1"), StatusCode::NOT_FOUND),
            (Error::Conflict("dup".into()), StatusCode::CONFLICT),
            (
                Error::UpstreamFormat {
                    reason: "prose".into(),
                },
                StatusCode::BAD_GATEWAY,
            ),
            (
                Error::Database(DatabaseError::Query("boom".into())),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError(err).status(), status);
        }
    }

    #[test]
    fn retryable_flag_only_when_set() {
        let body = ApiError(Error::UpstreamFormat {
            reason: "prose".into(),
        })
        .body();
        assert_eq!(body["retryable"], true);

        let body = ApiError(Error::Llm(LlmError::RateLimited {
            provider: "openai".into(),
            retry_after: None,
        }))
        .body();
        assert_eq!(body["retryable"], true);

        let body = ApiError(Error::Conflict("dup".into())).body();
        assert!(body.get("retryable").is_none());
        assert_eq!(body["error"], "Conflict: dup");
    }
}
