use actix_web::http::header;
use actix_web::{HttpResponse, ResponseError};
use thiserror::Error;

#[derive(Debug, Error, Clone)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),

    #[error("Method not allowed")]
    MethodNotAllowed,

    #[error("Server configuration error: {0}")]
    Configuration(String),

    #[error("Email delivery failed: {0}")]
    Transport(String),
}

impl ResponseError for ApiError {
    fn error_response(&self) -> HttpResponse {
        match self {
            ApiError::Validation(message) => {
                HttpResponse::BadRequest().json(serde_json::json!({
                    "success": false,
                    "error": message
                }))
            },
            ApiError::MethodNotAllowed => {
                HttpResponse::MethodNotAllowed()
                    .insert_header((header::ALLOW, "POST"))
                    .json(serde_json::json!({
                        "success": false,
                        "error": "Method not allowed"
                    }))
            },
            // Configuration and transport details are for the server log,
            // never for the client.
            ApiError::Configuration(_) => {
                HttpResponse::InternalServerError().json(serde_json::json!({
                    "success": false,
                    "error": "Server configuration error"
                }))
            },
            ApiError::Transport(_) => {
                HttpResponse::InternalServerError().json(serde_json::json!({
                    "success": false,
                    "error": "Email delivery failed"
                }))
            }
        }
    }
}

// ----------------------------- TESTS --------------------------------
