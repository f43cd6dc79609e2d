use std::sync::Arc;

use crate::domain::email::{notifier::AdminNotifier, service::EmailService};

#[derive(Clone)]
pub struct AppState {
    pub mailer: Arc<dyn EmailService>,
    pub notifier: Arc<AdminNotifier>,
}
