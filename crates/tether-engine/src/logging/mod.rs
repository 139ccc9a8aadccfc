//! Logger initialization.
//!
//! The engine itself only uses the `log` facade; hosts pick the backend. This
//! module wires up `env_logger` for binaries and tests.

mod init;

pub use init::{LoggingConfig, init_logging, try_init_logging};
