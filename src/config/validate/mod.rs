//! Configuration validation
//!
//! Validates reweighting specifications for correctness before execution.

mod error;
mod validator;

#[cfg(test)]
mod proptests;
#[cfg(test)]
mod tests;

pub use error::ValidationError;
pub use validator::{check_paths, validate_config};
