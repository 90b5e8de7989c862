pub mod config;
pub mod types;

pub use config::HomegridConfig;
pub use types::*;
