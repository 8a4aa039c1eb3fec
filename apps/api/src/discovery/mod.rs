pub mod apollo;
pub mod engine;
pub mod fixtures;
pub mod handlers;
pub mod scoring;
pub mod source;
