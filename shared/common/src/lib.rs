pub mod types;
pub mod error;
pub mod config;
pub mod money;
pub mod gateway;

pub use types::*;
pub use error::*;
pub use config::*;
pub use money::*;
pub use gateway::*;
