pub mod error;
pub mod logs;
pub mod server;

pub use error::{AppError, AppResult};
pub use logs::{load_file, parse_line};
pub use server::{create_router, AppState};
