pub mod model;
pub mod notifier;
pub mod service;
pub mod templates;
