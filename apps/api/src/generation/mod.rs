pub mod engine;
pub mod handlers;
pub mod templates;
pub mod variables;
