pub mod checks;
pub mod engine;
pub mod handlers;
pub mod provider;
pub mod reputation;
