//! Removal of environment-specific path prefixes from outgoing events.

pub mod error;
pub mod path;

pub use error::NormalizerError;
pub use path::{DEFAULT_PATH_STRIP, FILE_SCHEME, PathNormalizer};
