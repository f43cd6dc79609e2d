use actix_web::http::header;
use actix_web::{web, HttpRequest, HttpResponse, Responder};
use serde_json::json;

use crate::api::state::AppState;
use crate::domain::email::model::{EmailAddress, OutgoingEmail, SubscriptionRequest};
use crate::domain::email::templates::{self, WELCOME_SUBJECT};

/// `POST /send-welcome`: normalize and validate the address, send the
/// welcome template, then fire the best-effort admin notification.
pub async fn send_welcome(
    state: web::Data<AppState>,
    http_request: HttpRequest,
    request: web::Json<SubscriptionRequest>,
) -> impl Responder {

    let subscriber = match request.email.as_deref().map(EmailAddress::parse) {
        Some(Ok(address)) => address,
        _ => {
            return HttpResponse::BadRequest().json(json!({
                "ok": false,
                "error": "Invalid email"
            }))
        }
    };

    let rendered = templates::render_welcome(None);
    let email = OutgoingEmail {
        to: subscriber.clone(),
        subject: WELCOME_SUBJECT.to_string(),
        html_body: Some(rendered.html),
        text_body: Some(rendered.text),
        reply_to: None,
        from_name: None,
        from_address: None,
        category: "welcome".to_string(),
    };

    match state.mailer.send(&email).await {
        Ok(receipt) => {
            log::info!("welcome email sent to {} ({})", subscriber, receipt.message_id);

            let client = http_request
                .headers()
                .get(header::USER_AGENT)
                .and_then(|value| value.to_str().ok());
            state.notifier.notify(&subscriber, client).await;

            HttpResponse::Ok().json(json!({ "ok": true }))
        }
        Err(e) => {
            log::error!("welcome email to {} failed: {}", subscriber, e);
            HttpResponse::InternalServerError().json(json!({
                "ok": false,
                "error": "Email delivery failed"
            }))
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use actix_web::http::header;
    use actix_web::{test, web, App};
    use serde_json::{json, Value};

    use super::*;
    use crate::domain::email::notifier::AdminNotifier;
    use crate::domain::email::service::mock::MockEmailService;
    use crate::routes::public_routes;

    fn state_without_notifier(mock: &Arc<MockEmailService>) -> AppState {
        AppState {
            mailer: mock.clone(),
            notifier: Arc::new(AdminNotifier::new(mock.clone(), None)),
        }
    }

    fn state_with_notifier(mock: &Arc<MockEmailService>) -> AppState {
        let admin = EmailAddress::parse("admin@example.com").unwrap();
        AppState {
            mailer: mock.clone(),
            notifier: Arc::new(AdminNotifier::new(mock.clone(), Some(admin))),
        }
    }

    #[test]
    async fn test_malformed_emails_never_reach_the_transport() {
        let mock = Arc::new(MockEmailService::new());
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state_without_notifier(&mock)))
                .configure(public_routes),
        )
        .await;

        for body in [
            json!({ "email": "plainaddress" }),
            json!({ "email": "missing-domain@" }),
            json!({ "email": "no-dot@domain" }),
            json!({ "email": "white space@example.com" }),
            json!({ "email": "" }),
            json!({ "email": null }),
            json!({}),
        ] {
            let request = test::TestRequest::post()
                .uri("/send-welcome")
                .set_json(body.clone())
                .to_request();
            let response = test::call_service(&app, request).await;

            assert_eq!(response.status(), 400, "body {} should be rejected", body);
            let json: Value = test::read_body_json(response).await;
            assert_eq!(json["ok"], false);
            assert_eq!(json["error"], "Invalid email");
        }

        assert_eq!(mock.send_count(), 0);
    }

    #[test]
    async fn test_valid_subscription_sends_welcome_and_admin_notification() {
        let mock = Arc::new(MockEmailService::new());
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state_with_notifier(&mock)))
                .configure(public_routes),
        )
        .await;

        let request = test::TestRequest::post()
            .uri("/send-welcome")
            .insert_header((header::USER_AGENT, "Mozilla/5.0"))
            .set_json(json!({ "email": "user@example.com" }))
            .to_request();
        let response = test::call_service(&app, request).await;

        assert_eq!(response.status(), 200);
        let body: Value = test::read_body_json(response).await;
        assert_eq!(body, json!({ "ok": true }));

        let sent = mock.sent();
        assert_eq!(sent.len(), 2);

        assert_eq!(sent[0].to.as_str(), "user@example.com");
        assert_eq!(sent[0].category, "welcome");
        assert_eq!(sent[0].subject, WELCOME_SUBJECT);
        assert!(sent[0].html_body.as_ref().unwrap().contains("Developer"));
        assert!(sent[0].text_body.as_ref().unwrap().contains("Developer"));

        assert_eq!(sent[1].to.as_str(), "admin@example.com");
        assert_eq!(sent[1].category, "admin-notification");
        assert!(sent[1].html_body.as_ref().unwrap().contains("user@example.com"));
        assert!(sent[1].text_body.as_ref().unwrap().contains("Mozilla/5.0"));
    }

    #[test]
    async fn test_subscription_without_notifier_sends_exactly_one_email() {
        let mock = Arc::new(MockEmailService::new());
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state_without_notifier(&mock)))
                .configure(public_routes),
        )
        .await;

        let request = test::TestRequest::post()
            .uri("/send-welcome")
            .set_json(json!({ "email": "user@example.com" }))
            .to_request();
        let response = test::call_service(&app, request).await;

        assert_eq!(response.status(), 200);
        assert_eq!(mock.send_count(), 1);
    }

    #[test]
    async fn test_subscriber_address_is_normalized_before_send() {
        let mock = Arc::new(MockEmailService::new());
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state_without_notifier(&mock)))
                .configure(public_routes),
        )
        .await;

        let request = test::TestRequest::post()
            .uri("/send-welcome")
            .set_json(json!({ "email": "USER@Example.com " }))
            .to_request();
        let response = test::call_service(&app, request).await;

        assert_eq!(response.status(), 200);
        let body: Value = test::read_body_json(response).await;
        assert_eq!(body["ok"], true);
        assert_eq!(mock.sent()[0].to.as_str(), "user@example.com");
    }

    #[test]
    async fn test_admin_notification_failure_does_not_fail_the_request() {
        let mock = Arc::new(MockEmailService::new());
        mock.succeed_next(1);
        mock.fail_next(1);
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state_with_notifier(&mock)))
                .configure(public_routes),
        )
        .await;

        let request = test::TestRequest::post()
            .uri("/send-welcome")
            .set_json(json!({ "email": "user@example.com" }))
            .to_request();
        let response = test::call_service(&app, request).await;

        assert_eq!(response.status(), 200);
        let body: Value = test::read_body_json(response).await;
        assert_eq!(body, json!({ "ok": true }));
        assert_eq!(mock.send_count(), 2);
    }

    #[test]
    async fn test_welcome_transport_failure_yields_500_and_skips_notifier() {
        let mock = Arc::new(MockEmailService::new());
        mock.fail_next(1);
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state_with_notifier(&mock)))
                .configure(public_routes),
        )
        .await;

        let request = test::TestRequest::post()
            .uri("/send-welcome")
            .set_json(json!({ "email": "user@example.com" }))
            .to_request();
        let response = test::call_service(&app, request).await;

        assert_eq!(response.status(), 500);
        let body: Value = test::read_body_json(response).await;
        assert_eq!(body["ok"], false);
        assert_eq!(body["error"], "Email delivery failed");
        assert_eq!(mock.send_count(), 1);
    }

    #[test]
    async fn test_verification_failure_alone_is_non_fatal() {
        let mock = Arc::new(MockEmailService::new());
        mock.fail_verification();
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state_without_notifier(&mock)))
                .configure(public_routes),
        )
        .await;

        let request = test::TestRequest::post()
            .uri("/send-welcome")
            .set_json(json!({ "email": "user@example.com" }))
            .to_request();
        let response = test::call_service(&app, request).await;

        assert_eq!(response.status(), 200);
        assert_eq!(mock.send_count(), 1);
    }

    #[test]
    async fn test_two_identical_subscriptions_send_twice() {
        let mock = Arc::new(MockEmailService::new());
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state_without_notifier(&mock)))
                .configure(public_routes),
        )
        .await;

        for _ in 0..2 {
            let request = test::TestRequest::post()
                .uri("/send-welcome")
                .set_json(json!({ "email": "user@example.com" }))
                .to_request();
            let response = test::call_service(&app, request).await;
            assert_eq!(response.status(), 200);
        }

        assert_eq!(mock.send_count(), 2);
    }

    #[test]
    async fn test_send_welcome_non_post_yields_405_with_allow_header() {
        let mock = Arc::new(MockEmailService::new());
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state_without_notifier(&mock)))
                .configure(public_routes),
        )
        .await;

        let request = test::TestRequest::get().uri("/send-welcome").to_request();
        let response = test::call_service(&app, request).await;

        assert_eq!(response.status(), 405);
        assert_eq!(response.headers().get(header::ALLOW).unwrap(), "POST");
        assert_eq!(mock.send_count(), 0);
    }

    #[test]
    async fn test_send_welcome_malformed_json_yields_envelope_400() {
        let mock = Arc::new(MockEmailService::new());
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state_without_notifier(&mock)))
                .configure(public_routes),
        )
        .await;

        let request = test::TestRequest::post()
            .uri("/send-welcome")
            .insert_header((header::CONTENT_TYPE, "application/json"))
            .set_payload("{not json")
            .to_request();
        let response = test::call_service(&app, request).await;

        assert_eq!(response.status(), 400);
        let body: Value = test::read_body_json(response).await;
        assert_eq!(body["ok"], false);
        assert_eq!(body["error"], "Invalid request body");
        assert_eq!(mock.send_count(), 0);
    }
}
