pub mod auth;
pub mod todo;

pub use auth::{AuthService, AuthServiceImpl};
pub use todo::{TodoService, TodoServiceImpl};
