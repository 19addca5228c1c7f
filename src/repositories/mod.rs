pub mod todo;
pub mod user;

pub use todo::{PgTodoRepository, TodoRepository};
pub use user::{PgUserRepository, UserRepository};
