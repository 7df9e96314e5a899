//! Consistent error responses.
//!
//! Every failure renders as `{ "success": false, "message", "status" }`, with
//! an `errors` array for per-field validation failures.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use tracing::error;

use safeaid_auth::AuthzError;
use safeaid_core::{DomainError, FieldError};
use safeaid_infra::{ServiceError, StoreError};

#[derive(Debug)]
pub enum ApiError {
    BadRequest {
        message: String,
        errors: Vec<FieldError>,
    },
    Unauthenticated(String),
    Forbidden(String),
    NotFound(String),
    Conflict(String),
    TooManyRequests { retry_after_secs: u64 },
    Internal(String),
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest {
            message: message.into(),
            errors: Vec::new(),
        }
    }

    pub fn unauthenticated(message: impl Into<String>) -> Self {
        ApiError::Unauthenticated(message.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            ApiError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::TooManyRequests { .. } => StatusCode::TOO_MANY_REQUESTS,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

pub fn json_error(status: StatusCode, message: impl Into<String>, errors: &[FieldError]) -> Response {
    let mut body = json!({
        "success": false,
        "message": message.into(),
        "status": status.as_u16(),
    });
    if !errors.is_empty() {
        body["errors"] = json!(errors);
    }
    (status, Json(body)).into_response()
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        match self {
            ApiError::BadRequest { message, errors } => json_error(status, message, &errors),
            ApiError::TooManyRequests { retry_after_secs } => {
                let mut res = json_error(status, "Too many requests, please try again later", &[]);
                if let Ok(v) = HeaderValue::from_str(&retry_after_secs.to_string()) {
                    res.headers_mut().insert(header::RETRY_AFTER, v);
                }
                res
            }
            ApiError::Internal(message) => {
                error!(%message, "request failed");
                json_error(status, message, &[])
            }
            ApiError::Unauthenticated(message)
            | ApiError::Forbidden(message)
            | ApiError::NotFound(message)
            | ApiError::Conflict(message) => json_error(status, message, &[]),
        }
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::InvalidFields(errors) => ApiError::BadRequest {
                message: "Validation failed".to_string(),
                errors,
            },
            DomainError::Validation(msg) | DomainError::InvalidId(msg) => ApiError::bad_request(msg),
            DomainError::NotFound => ApiError::NotFound("Resource not found".to_string()),
            DomainError::Conflict(msg) => ApiError::Conflict(msg),
            DomainError::InvariantViolation(msg) => ApiError::Internal(msg),
        }
    }
}

impl From<AuthzError> for ApiError {
    fn from(err: AuthzError) -> Self {
        ApiError::Forbidden(err.to_string())
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Domain(e) => e.into(),
            ServiceError::MissingCredentials => ApiError::bad_request("Email and password are required"),
            ServiceError::InvalidCredentials => ApiError::unauthenticated("Invalid email or password"),
            ServiceError::Token(_) | ServiceError::InactiveAccount => ApiError::unauthenticated("Invalid token"),
            ServiceError::DuplicateCredential | ServiceError::Store(StoreError::Duplicate { .. }) => {
                ApiError::Conflict("Email already registered".to_string())
            }
            ServiceError::NotFound(what) => ApiError::NotFound(format!("{} not found", capitalize(what))),
            ServiceError::Conflict(msg) => ApiError::Conflict(msg),
            other @ (ServiceError::Store(_)
            | ServiceError::Cipher(_)
            | ServiceError::Password(_)
            | ServiceError::Join(_)) => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::bad_request(format!("Invalid request body: {}", rejection.body_text()))
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::bad_request(format!("Invalid query string: {}", rejection.body_text()))
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use safeaid_auth::Role;

    #[test]
    fn service_errors_map_to_conventional_codes() {
        let cases = [
            (ServiceError::InvalidCredentials, StatusCode::UNAUTHORIZED),
            (ServiceError::MissingCredentials, StatusCode::BAD_REQUEST),
            (ServiceError::DuplicateCredential, StatusCode::CONFLICT),
            (ServiceError::InactiveAccount, StatusCode::UNAUTHORIZED),
            (ServiceError::NotFound("user"), StatusCode::NOT_FOUND),
            (ServiceError::Conflict("self".to_string()), StatusCode::CONFLICT),
            (
                ServiceError::Cipher(safeaid_crypto::CipherError::DecryptionFailure),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status(), status);
        }
    }

    #[test]
    fn not_found_message_names_the_resource() {
        match ApiError::from(ServiceError::NotFound("beneficiary")) {
            ApiError::NotFound(msg) => assert_eq!(msg, "Beneficiary not found"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn forbidden_message_lists_roles() {
        let err = safeaid_auth::authorize(Role::Trainer, &[Role::Admin, Role::FieldAgent]).unwrap_err();
        match ApiError::from(err) {
            ApiError::Forbidden(msg) => assert_eq!(msg, "Access denied: requires one of [admin, field_agent]"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn field_errors_stay_structured() {
        let err = ApiError::from(DomainError::InvalidFields(vec![FieldError::new("age", "age is required")]));
        match err {
            ApiError::BadRequest { errors, .. } => assert_eq!(errors[0].field, "age"),
            other => panic!("unexpected {other:?}"),
        }
    }
}
