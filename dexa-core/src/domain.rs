pub mod ids;
pub mod config;
pub mod dataset;
pub mod chat;
pub mod query;

pub use ids::*;
pub use config::*;
pub use dataset::*;
pub use chat::*;
pub use query::*;
