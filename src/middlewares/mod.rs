pub mod auth;
pub mod cors;

pub use auth::{AuthMiddleware, current_principal};
pub use cors::create_cors;
