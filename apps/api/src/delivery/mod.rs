pub mod handlers;
pub mod mailer;
