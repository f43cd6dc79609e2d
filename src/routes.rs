use actix_web::error::InternalError;
use actix_web::{web, HttpResponse, ResponseError};
use serde_json::json;

use crate::api::handlers::email_handlers::send_email;
use crate::api::handlers::subscription_handlers::send_welcome;
use crate::utils::errors::ApiError;

pub fn public_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/send-email")
            .app_data(send_email_body_config())
            .route(web::post().to(send_email))
            .default_service(web::route().to(method_not_allowed)),
    );

    cfg.service(
        web::resource("/send-welcome")
            .app_data(subscription_body_config())
            .route(web::post().to(send_welcome))
            .default_service(web::route().to(method_not_allowed)),
    );
}

async fn method_not_allowed() -> HttpResponse {
    ApiError::MethodNotAllowed.error_response()
}

/// Unreadable bodies get the `/send-email` envelope instead of the
/// default plain-text deserializer message.
fn send_email_body_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| {
        let response = HttpResponse::BadRequest().json(json!({
            "success": false,
            "error": "Invalid request body"
        }));
        InternalError::from_response(err, response).into()
    })
}

fn subscription_body_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| {
        let response = HttpResponse::BadRequest().json(json!({
            "ok": false,
            "error": "Invalid request body"
        }));
        InternalError::from_response(err, response).into()
    })
}
