pub mod errors;
pub mod id;

pub use errors::{ConfigError, IngestError, RelayError};
pub use id::ObserverId;

pub type Result<T> = std::result::Result<T, RelayError>;
