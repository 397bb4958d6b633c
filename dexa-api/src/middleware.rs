pub mod auth;

pub use auth::{auth_middleware, validate_token, AuthUser, Claims};
