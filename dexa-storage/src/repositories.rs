pub mod chat;
pub mod dataset;
pub mod query;

pub use chat::*;
pub use dataset::*;
pub use query::*;
