//! Error types for service identifier parsing in blescan-types.

use thiserror::Error;

/// Errors that can occur when parsing a service identifier from text.
///
/// This error type is platform-agnostic and does not include
/// BLE stack errors (those belong in blescan-core).
///
/// This enum is marked `#[non_exhaustive]` to allow adding new error variants
/// in future versions without breaking downstream code.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum ParseError {
    /// The input was empty after trimming.
    #[error("Empty service identifier")]
    Empty,

    /// The input is neither a full UUID, a short hex form, nor a known name.
    #[error("Invalid service identifier '{0}': expected a UUID, a 16/32-bit hex value, or a known service name")]
    InvalidServiceId(String),
}

/// Result type alias using blescan-types' ParseError type.
pub type ParseResult<T> = std::result::Result<T, ParseError>;
