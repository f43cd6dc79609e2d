use std::sync::Arc;

use mailer_service::{
    api::cors::{CorsMiddleware, CorsPolicy},
    api::state::AppState,
    domain::email::notifier::AdminNotifier,
    domain::email::service::EmailService,
    infrastructure::smtp::mailer::SmtpMailer,
    routes::public_routes,
    utils::config::AppConfig,
};
use actix_web::{get, web, App, HttpServer, Responder};
use tracing_subscriber::EnvFilter;

#[get("/")]
async fn entry_point() -> impl Responder {
    "This is the Mailer API. Use the /send-welcome and /send-email endpoints."
}

#[tokio::main]
async fn main() -> std::io::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            log::error!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    let mailer: Arc<dyn EmailService> = match SmtpMailer::new(&config) {
        Ok(mailer) => Arc::new(mailer),
        Err(e) => {
            log::error!("Failed to initialize the SMTP transport: {}", e);
            std::process::exit(1);
        }
    };

    if config.verify_connection {
        match mailer.verify().await {
            Ok(()) => println!("Connected to the SMTP server successfully."),
            Err(e) => log::warn!("SMTP verification failed, continuing anyway: {}", e),
        }
    }

    let notifier = match AdminNotifier::from_config(mailer.clone(), &config) {
        Ok(notifier) => Arc::new(notifier),
        Err(e) => {
            log::error!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    println!("🚀 Server running at http://{}", config.bind_address);

    let app_state = AppState { mailer, notifier };
    let cors_policy = CorsPolicy::new(config.allowed_origins.clone());

    HttpServer::new(move || {
        App::new()
            .wrap(CorsMiddleware::new(cors_policy.clone()))
            .app_data(web::Data::new(app_state.clone()))
            .configure(public_routes)
            .service(entry_point)
    })
    .bind(config.bind_address)?
    .run()
    .await
}
