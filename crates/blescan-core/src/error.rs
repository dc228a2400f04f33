//! Error types for blescan-core.
//!
//! Two layers of errors live here:
//!
//! - [`Error`] is what host implementations (the btleplug backend, the mock)
//!   return from their async operations. It carries the underlying cause.
//! - [`ScanError`] is the taxonomy a [`crate::ScanSession`] reports to its
//!   observer. Every variant is terminal for the current scan attempt; the
//!   session never retries on its own.
//!
//! | Variant | Typical remedy |
//! |---------|----------------|
//! | [`ScanError::AdapterMissing`] | Plug in or enable a Bluetooth adapter |
//! | [`ScanError::AdapterDisabled`] | Turn Bluetooth on |
//! | [`ScanError::PermissionMissing`] | Grant the scan permission |
//! | [`ScanError::ScannerUnavailable`] | Retry once the stack is up |
//! | [`ScanError::ScanFailed`] | Depends on the code; usually wait and retry |
//! | [`ScanError::Unexpected`] | Report it |

use thiserror::Error;

use blescan_types::ScanFailureCode;

/// Errors returned by scan hosts.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new error variants
/// in future versions without breaking downstream code.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// Bluetooth Low Energy error.
    #[error("Bluetooth error: {0}")]
    Bluetooth(#[from] btleplug::Error),

    /// No Bluetooth adapter on this host.
    #[error("No Bluetooth adapter available")]
    NoAdapter,

    /// The platform refused the operation for lack of permission.
    #[error("Permission denied: {0}")]
    Security(String),

    /// A scan handle that the host does not know about.
    #[error("Scan handle {0} is not active")]
    UnknownHandle(u64),
}

impl Error {
    /// Create a security error.
    pub fn security(message: impl Into<String>) -> Self {
        Self::Security(message.into())
    }

    /// Whether this error means a permission was refused.
    pub fn is_permission_denied(&self) -> bool {
        matches!(
            self,
            Error::Security(_) | Error::Bluetooth(btleplug::Error::PermissionDenied)
        )
    }
}

/// Result type alias using blescan-core's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Why a scan attempt ended without scanning.
///
/// Reported to the observer as a non-scanning state plus the `Display` text,
/// and returned from the session's start methods.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum ScanError {
    /// No Bluetooth adapter on this host.
    #[error("Bluetooth adapter not available")]
    AdapterMissing,

    /// The adapter exists but is powered off.
    #[error("Bluetooth is turned off")]
    AdapterDisabled,

    /// The scan capability has not been granted.
    #[error("Missing Bluetooth scan permission")]
    PermissionMissing,

    /// The adapter could not hand out an LE scanner.
    #[error("Unable to obtain the BLE scanner")]
    ScannerUnavailable,

    /// The radio stack reported a failure for a running scan.
    #[error("Scan failed: {0}")]
    ScanFailed(ScanFailureCode),

    /// Anything else raised while talking to the stack.
    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

impl ScanError {
    /// A short hint the front end can show to get the user unstuck.
    pub fn remediation(&self) -> Option<&'static str> {
        match self {
            ScanError::AdapterMissing => Some("Connect a Bluetooth adapter and try again"),
            ScanError::AdapterDisabled => Some("Turn Bluetooth on and try again"),
            ScanError::PermissionMissing => Some("Grant Bluetooth permission and try again"),
            ScanError::ScanFailed(ScanFailureCode::ScanningTooFrequently) => {
                Some("Wait a few seconds before scanning again")
            }
            _ => None,
        }
    }
}

impl From<Error> for ScanError {
    fn from(err: Error) -> Self {
        if err.is_permission_denied() {
            return ScanError::PermissionMissing;
        }
        match err {
            Error::NoAdapter => ScanError::AdapterMissing,
            other => ScanError::Unexpected(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(
            Error::NoAdapter.to_string(),
            "No Bluetooth adapter available"
        );
        assert_eq!(
            Error::security("scan not allowed").to_string(),
            "Permission denied: scan not allowed"
        );
        assert!(Error::UnknownHandle(7).to_string().contains('7'));
    }

    #[test]
    fn test_btleplug_error_conversion() {
        fn _assert_from_impl<T: From<btleplug::Error>>() {}
        _assert_from_impl::<Error>();

        let err: Error = btleplug::Error::PermissionDenied.into();
        assert!(err.is_permission_denied());
    }

    #[test]
    fn test_scan_error_from_host_error() {
        assert_eq!(
            ScanError::from(Error::security("denied")),
            ScanError::PermissionMissing
        );
        assert_eq!(ScanError::from(Error::NoAdapter), ScanError::AdapterMissing);
        assert!(matches!(
            ScanError::from(Error::UnknownHandle(3)),
            ScanError::Unexpected(msg) if msg.contains("3")
        ));
    }

    #[test]
    fn test_scan_error_messages() {
        assert_eq!(
            ScanError::ScanFailed(ScanFailureCode::InternalError).to_string(),
            "Scan failed: internal error (code 3)"
        );
        assert_eq!(
            ScanError::AdapterDisabled.to_string(),
            "Bluetooth is turned off"
        );
    }

    #[test]
    fn test_remediation_hints() {
        assert!(ScanError::AdapterDisabled.remediation().is_some());
        assert!(ScanError::PermissionMissing.remediation().is_some());
        assert!(ScanError::Unexpected("x".into()).remediation().is_none());
        assert!(
            ScanError::ScanFailed(ScanFailureCode::ScanningTooFrequently)
                .remediation()
                .is_some()
        );
    }
}
