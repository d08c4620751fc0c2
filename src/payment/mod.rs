pub mod error;
pub mod gateway;
pub mod models;
pub mod signature;

pub use error::*;
pub use gateway::*;
pub use models::*;
pub use signature::*;
