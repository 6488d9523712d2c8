use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("{0}")]
    Validation(String),
    #[error("nothing to update")]
    NoChange,
    #[error("post not found: {0}")]
    PostNotFound(i64),
    #[error("post deleted: {0}")]
    PostGone(i64),
    #[error("comment not found: {0}")]
    CommentNotFound(i64),
    #[error("version conflict on post {0}")]
    Conflict(i64),
    #[error("Username already exists")]
    UsernameTaken,
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("storage error: {0}")]
    Storage(String),
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<serde_json::Value>,
}

impl ResponseError for DomainError {
    fn status_code(&self) -> StatusCode {
        match self {
            DomainError::Validation(_)
            | DomainError::NoChange
            | DomainError::UsernameTaken
            | DomainError::InvalidCredentials => StatusCode::BAD_REQUEST,
            DomainError::PostNotFound(_) | DomainError::CommentNotFound(_) => {
                StatusCode::NOT_FOUND
            }
            DomainError::PostGone(_) => StatusCode::GONE,
            DomainError::Conflict(_) => StatusCode::CONFLICT,
            DomainError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let message = self.to_string();
        let details = match self {
            DomainError::PostNotFound(id) | DomainError::PostGone(id) => {
                Some(json!({ "post_id": id }))
            }
            DomainError::CommentNotFound(id) => Some(json!({ "comment_id": id })),
            DomainError::Conflict(id) => Some(json!({ "post_id": id })),
            _ => None,
        };
        let body = ErrorBody {
            error: message.as_str(),
            details,
        };
        HttpResponse::build(self.status_code()).json(body)
    }
}
