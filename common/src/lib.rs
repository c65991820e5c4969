pub mod config;
pub mod terms;
pub mod types;

pub use config::BioslideConfig;
pub use terms::Terms;
pub use types::*;
