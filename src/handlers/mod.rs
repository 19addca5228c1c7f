pub mod auth;
pub mod todos;

pub use auth::*;
pub use todos::*;
