use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(message: &str) -> Self {
        Self {
            error: message.to_string(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Cannot GET {0}")]
    NotFound(String),
    #[error("Request timed out")]
    Timeout,
    /// The message, context chain included, is returned to the caller as is.
    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Timeout => StatusCode::REQUEST_TIMEOUT,
            ApiError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            ApiError::NotFound(_) | ApiError::Timeout => self.to_string(),
            ApiError::Storage(e) => {
                let message = chain_message(e);
                log::error!("request failed: {}", message);
                message
            }
        };

        (status, Json(ErrorResponse::new(&message))).into_response()
    }
}

/// Context chain joined with ": ". A link whose text is already part of the
/// link before it is dropped; sqlx database errors repeat their source.
fn chain_message(error: &anyhow::Error) -> String {
    let mut message = String::new();
    let mut previous = String::new();
    for cause in error.chain() {
        let text = cause.to_string();
        if !previous.is_empty() && previous.contains(&text) {
            continue;
        }
        if !message.is_empty() {
            message.push_str(": ");
        }
        message.push_str(&text);
        previous = text;
    }
    message
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_error_keeps_context_chain() {
        let err = ApiError::from(
            anyhow::anyhow!("relation \"customers\" does not exist").context("Failed to list customers"),
        );
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[derive(Debug, thiserror::Error)]
    #[error("syntax error in tsquery: \"zzz qqq:*\"")]
    struct TsqueryError;

    #[derive(Debug, thiserror::Error)]
    #[error("error returned from database: {0}")]
    struct Returned(#[source] TsqueryError);

    #[test]
    fn test_repeated_database_message_appears_once() {
        let err = anyhow::Error::new(Returned(TsqueryError)).context("Failed to search products");
        assert_eq!(
            chain_message(&err),
            "Failed to search products: error returned from database: \
             syntax error in tsquery: \"zzz qqq:*\""
        );
    }

    #[test]
    fn test_distinct_causes_are_all_kept() {
        let err = anyhow::anyhow!("connection refused")
            .context("pool timed out")
            .context("Failed to list customers");
        assert_eq!(
            chain_message(&err),
            "Failed to list customers: pool timed out: connection refused"
        );
    }

    #[test]
    fn test_not_found_message() {
        let err = ApiError::NotFound("/nope".to_string());
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
        assert_eq!(err.to_string(), "Cannot GET /nope");
    }
}
