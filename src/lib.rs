pub mod agent;
pub mod config;
pub mod create;
pub mod errors;
pub mod orchestrator;
pub mod plan;
pub mod session;
pub mod signals;
pub mod stream;
pub mod templates;
pub mod ui;
