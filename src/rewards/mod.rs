pub mod engine;
pub mod error;
pub mod repository;

pub use engine::*;
pub use error::*;
pub use repository::*;
