//! Utility functions and types for the signal receiver.

pub mod error;
mod logging;

pub use error::Error;
#[cfg(test)]
pub(crate) use logging::init_test_logging;
pub use logging::{env_filter, init_logging, LOG_ENV};
