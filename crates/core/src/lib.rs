pub mod classify;
pub mod config;
pub mod device;
pub mod error;
pub mod normalize;
pub mod types;

pub use config::AppConfig;
pub use error::CrawlError;
pub use types::*;
