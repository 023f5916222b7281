//! Error taxonomy for arbor expression trees.
//!
//! Construction failures are [`BuildError`]s, grouped by [`ErrorCategory`];
//! reduction failures are [`ReduceError`]s. Both map to a stable
//! [`ErrorCode`].

mod error_code;
mod errors;

pub use error_code::ErrorCode;
pub use errors::{BuildError, ErrorCategory, ReduceError};

/// Result of a construction operation.
pub type BuildResult<T> = Result<T, BuildError>;

/// Result of a reduction operation.
pub type ReduceResult<T> = Result<T, ReduceError>;
