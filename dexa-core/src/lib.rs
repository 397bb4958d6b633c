pub mod completion;
pub mod domain;
pub mod error;
pub mod ingest;
pub mod profile;
pub mod prompt;
pub mod response;
pub mod safety;
pub mod traits;

pub use domain::*;
pub use error::*;
pub use traits::*;
