use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Rate limited")]
    RateLimited,

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Bad gateway: {0}")]
    BadGateway(String),

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match &self {
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "unauthorized", msg.clone()),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, "forbidden", msg.clone()),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg.clone()),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, "conflict", msg.clone()),
            ApiError::Validation(msg) => (StatusCode::BAD_REQUEST, "validation_error", msg.clone()),
            ApiError::RateLimited => (
                StatusCode::TOO_MANY_REQUESTS,
                "rate_limited",
                "Too many requests. Please try again later.".into(),
            ),
            ApiError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".into(),
                )
            }
            ApiError::BadGateway(msg) => {
                tracing::warn!("Upstream failure: {}", msg);
                (
                    StatusCode::BAD_GATEWAY,
                    "bad_gateway",
                    "Upstream service failed".into(),
                )
            }
            ApiError::ServiceUnavailable(msg) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "service_unavailable",
                msg.clone(),
            ),
        };

        let body = ErrorBody {
            error: error_code.into(),
            message,
        };

        (status, Json(body)).into_response()
    }
}

impl From<axum::extract::rejection::JsonRejection> for ApiError {
    fn from(rejection: axum::extract::rejection::JsonRejection) -> Self {
        use axum::extract::rejection::JsonRejection;
        match rejection {
            JsonRejection::MissingJsonContentType(_) => {
                ApiError::Validation("Expected a JSON request body".into())
            }
            JsonRejection::JsonSyntaxError(_) => {
                ApiError::Validation("Request body is not valid JSON".into())
            }
            // body_text reads "Failed to deserialize ...: <serde detail>".
            JsonRejection::JsonDataError(e) => {
                let text = e.body_text();
                let detail = text.split_once(": ").map(|(_, d)| d).unwrap_or(&text);
                ApiError::Validation(format!("Invalid request body: {detail}"))
            }
            other => ApiError::Validation(other.body_text()),
        }
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => ApiError::NotFound("Resource not found".into()),
            sqlx::Error::Database(db_err) => match db_err.code().as_deref() {
                Some("23505") => ApiError::Conflict("Resource already exists".into()),
                Some("23503") => ApiError::NotFound("Referenced resource not found".into()),
                Some("23514") => ApiError::Validation("Value violates a constraint".into()),
                _ => ApiError::Internal(format!("Database error: {}", db_err)),
            },
            _ => ApiError::Internal(format!("Database error: {}", err)),
        }
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut messages: Vec<String> = errors
            .errors()
            .iter()
            .flat_map(|(field, kind)| collect_messages(field, kind))
            .collect();
        messages.sort();

        let message = match messages.len() {
            0 => "Invalid request".to_string(),
            1 => messages.remove(0),
            _ => messages.join("; "),
        };

        ApiError::Validation(message)
    }
}

fn collect_messages(field: &str, kind: &validator::ValidationErrorsKind) -> Vec<String> {
    use validator::ValidationErrorsKind;

    match kind {
        ValidationErrorsKind::Field(errors) => errors
            .iter()
            .map(|e| match &e.message {
                Some(m) => m.to_string(),
                None => format!("{} is invalid", field),
            })
            .collect(),
        ValidationErrorsKind::Struct(nested) => nested
            .errors()
            .iter()
            .flat_map(|(f, k)| collect_messages(f, k))
            .collect(),
        ValidationErrorsKind::List(items) => items
            .values()
            .flat_map(|nested| {
                nested
                    .errors()
                    .iter()
                    .flat_map(|(f, k)| collect_messages(f, k))
                    .collect::<Vec<_>>()
            })
            .collect(),
    }
}

impl From<shared::jwt::JwtError> for ApiError {
    fn from(err: shared::jwt::JwtError) -> Self {
        use shared::jwt::JwtError;
        match err {
            JwtError::Expired => ApiError::Unauthorized("Token expired".into()),
            JwtError::Rejected => ApiError::Unauthorized("Not authorized, token failed".into()),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<shared::password::PasswordError> for ApiError {
    fn from(err: shared::password::PasswordError) -> Self {
        ApiError::Internal(err.to_string())
    }
}

impl From<domain::models::InventoryError> for ApiError {
    fn from(err: domain::models::InventoryError) -> Self {
        use domain::models::InventoryError;
        match err {
            InventoryError::ItemNotFound => ApiError::NotFound(err.to_string()),
            InventoryError::ReturnsDisabled => ApiError::Forbidden(err.to_string()),
            InventoryError::InvalidQuantity
            | InventoryError::InsufficientStock { .. }
            | InventoryError::ReturnExceedsOutstanding { .. }
            | InventoryError::StockInUse { .. } => ApiError::Validation(err.to_string()),
        }
    }
}

impl From<persistence::repositories::StockChangeError> for ApiError {
    fn from(err: persistence::repositories::StockChangeError) -> Self {
        use persistence::repositories::StockChangeError;
        match err {
            StockChangeError::Rule(rule) => rule.into(),
            StockChangeError::Database(db) => db.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use validator::Validate;

    async fn reject(body: &'static str, content_type: &str) -> ApiError {
        use axum::extract::FromRequest;
        let request = axum::http::Request::builder()
            .method("POST")
            .header("content-type", content_type)
            .body(axum::body::Body::from(body))
            .unwrap();
        match Json::<domain::models::user::LoginRequest>::from_request(request, &()).await {
            Ok(_) => panic!("body should have been rejected"),
            Err(rejection) => rejection.into(),
        }
    }

    #[tokio::test]
    async fn test_json_rejections_become_validation_errors() {
        match reject(r#"{"email":"a@b.c"}"#, "application/json").await {
            ApiError::Validation(msg) => {
                assert!(msg.starts_with("Invalid request body: missing field `password`"), "{msg}")
            }
            other => panic!("Expected Validation error, got {other:?}"),
        }

        assert!(matches!(
            reject("{not json", "application/json").await,
            ApiError::Validation(_)
        ));
        assert!(matches!(
            reject("email=a", "text/plain").await,
            ApiError::Validation(_)
        ));
    }

    #[test]
    fn test_api_error_statuses() {
        let cases = [
            (ApiError::Unauthorized("x".into()), StatusCode::UNAUTHORIZED),
            (ApiError::Forbidden("x".into()), StatusCode::FORBIDDEN),
            (ApiError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (ApiError::Conflict("x".into()), StatusCode::CONFLICT),
            (ApiError::Validation("x".into()), StatusCode::BAD_REQUEST),
            (ApiError::RateLimited, StatusCode::TOO_MANY_REQUESTS),
            (ApiError::Internal("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
            (ApiError::BadGateway("x".into()), StatusCode::BAD_GATEWAY),
            (
                ApiError::ServiceUnavailable("x".into()),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
        ];
        for (error, status) in cases {
            assert_eq!(error.into_response().status(), status);
        }
    }

    #[test]
    fn test_api_error_display() {
        assert_eq!(
            format!("{}", ApiError::Unauthorized("test".to_string())),
            "Unauthorized: test"
        );
        assert_eq!(
            format!("{}", ApiError::BadGateway("test".to_string())),
            "Bad gateway: test"
        );
        assert_eq!(format!("{}", ApiError::RateLimited), "Rate limited");
    }

    #[test]
    fn test_from_sqlx_row_not_found() {
        let error: ApiError = sqlx::Error::RowNotFound.into();
        match error {
            ApiError::NotFound(msg) => assert_eq!(msg, "Resource not found"),
            _ => panic!("Expected NotFound error"),
        }
    }

    #[test]
    fn test_from_inventory_errors() {
        use domain::models::InventoryError;

        let status = |e: InventoryError| ApiError::from(e).into_response().status();
        assert_eq!(status(InventoryError::ItemNotFound), StatusCode::NOT_FOUND);
        assert_eq!(status(InventoryError::ReturnsDisabled), StatusCode::FORBIDDEN);
        assert_eq!(
            status(InventoryError::InsufficientStock {
                requested: 10,
                available: 6
            }),
            StatusCode::BAD_REQUEST
        );

        match ApiError::from(InventoryError::InsufficientStock {
            requested: 10,
            available: 6,
        }) {
            ApiError::Validation(msg) => assert_eq!(msg, "Insufficient stock"),
            other => panic!("Expected Validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_from_jwt_expired() {
        let error: ApiError = shared::jwt::JwtError::Expired.into();
        assert!(matches!(error, ApiError::Unauthorized(_)));
    }

    #[test]
    fn test_from_validation_errors_uses_field_message() {
        let request = domain::models::user::LoginRequest {
            email: "not-an-email".into(),
            password: "secret1".into(),
        };
        let errors = request.validate().unwrap_err();
        match ApiError::from(errors) {
            ApiError::Validation(msg) => assert!(!msg.is_empty()),
            other => panic!("Expected Validation error, got {other:?}"),
        }
    }
}
