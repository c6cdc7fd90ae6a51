mod error;
pub mod loader;
mod overrides;
mod types;

pub use error::ConfigError;
pub use overrides::Overrides;
pub use types::*;
