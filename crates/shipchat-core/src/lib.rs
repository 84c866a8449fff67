pub mod config;
pub mod error;
pub mod types;

pub use config::ShipchatConfig;
pub use error::{Result, ShipchatError};
pub use types::*;
