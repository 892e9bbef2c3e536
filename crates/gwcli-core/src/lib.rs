//! Shared building blocks for gwcli: the error taxonomy, tracing setup, the
//! configuration directory layout and the key/value settings store.

pub mod config_store;
pub mod error;
pub mod paths;
pub mod tracing;

pub use config_store::ConfigStore;
pub use error::{Error, ErrorKind, Result};
pub use paths::{ConfigDir, FileMode, restrict_to_owner, write_atomic};
pub use tracing::{TracingConfig, TracingError, TracingOutputFormat, init_tracing};
