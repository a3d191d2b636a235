//! Folio API server
//!
//! REST backend for the portfolio site: portfolio entries with comments,
//! projects, contact messages, JWT login and a chat proxy. Documents live in
//! an in-memory store; the binary is meant for a single serverless instance.

pub mod auth;
pub mod chat;
pub mod config;
pub mod constants;
pub mod error;
pub mod image;
pub mod routes;
pub mod server;
pub mod state;
pub mod store;

pub use config::Config;
pub use error::AppError;
pub use server::{create_router, start_server};
pub use state::AppState;
