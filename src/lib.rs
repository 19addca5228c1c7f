pub mod auth;
pub mod cli;
pub mod config;
pub mod db;
pub mod errors;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod pagination;
pub mod repositories;
pub mod response;
pub mod server;
pub mod services;
pub mod utils;

// Re-export commonly used items
pub use errors::*;
pub use models::*;
