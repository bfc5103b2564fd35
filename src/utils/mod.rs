//! Shared utilities

pub mod error;

pub use error::{ErrorResponse, PreconditionViolation, StudioError, StudioResult};
