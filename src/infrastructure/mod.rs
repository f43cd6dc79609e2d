pub mod smtp;

pub use smtp::mailer;
