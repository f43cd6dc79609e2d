use actix_web::{web, HttpResponse, Responder, ResponseError};
use serde_json::json;

use crate::{api::state::AppState, domain::email::model::SendEmailRequest};

/// `POST /send-email`: caller supplies recipient, subject and body; no
/// template involvement.
pub async fn send_email(
    state: web::Data<AppState>,
    request: web::Json<SendEmailRequest>,
) -> impl Responder {

    let email = match request.into_inner().into_outgoing() {
        Ok(email) => email,
        Err(e) => return e.error_response(),
    };

    match state.mailer.send(&email).await {
        Ok(receipt) => HttpResponse::Ok().json(json!({
            "success": true,
            "messageId": receipt.message_id,
            "accepted": receipt.accepted,
            "rejected": receipt.rejected,
            "envelope": {
                "from": receipt.envelope.from,
                "to": receipt.envelope.to
            }
        })),
        Err(e) => {
            log::error!("send-email to {} failed: {}", email.to, e);
            e.error_response()
        }
    }
}
