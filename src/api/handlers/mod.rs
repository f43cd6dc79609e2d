pub mod email_handlers;
pub mod subscription_handlers;
