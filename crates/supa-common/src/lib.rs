pub mod errors;

pub use errors::{ConfigError, SupaError};

pub type Result<T> = std::result::Result<T, SupaError>;
