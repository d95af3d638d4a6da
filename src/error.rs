//! Codec error types
//!
//! This module defines a custom error type for wire codec operations,
//! providing better type safety and more informative error messages than
//! using `Box<dyn std::error::Error>`.
//!
//! Decode failures are deliberately coarse: primitive reads never error at
//! the point of occurrence (see [`crate::primitives::Reader`]), so the only
//! decode-time errors are the two terminal states a completed decode can end
//! in, plus the version check performed by the negotiation layer before a
//! version is applied to a message.

use thiserror::Error;

/// Errors that can occur during wire codec operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum KwireError {
    /// A read ran past the end of the input buffer.
    ///
    /// Surfaced only by the completion check at the end of a decode, never
    /// at the point the overrun happened.
    #[error("decode ran past the end of the input buffer")]
    TruncatedInput,

    /// A decode finished but unconsumed bytes remain.
    ///
    /// Message framing guarantees an exact body length, so trailing bytes
    /// always indicate a malformed or mis-framed message.
    #[error("decode finished with {0} unconsumed trailing bytes")]
    TrailingBytes(usize),

    /// A caller selected a version above a message type's maximum.
    ///
    /// Checked by the negotiation layer via [`crate::message::check_version`]
    /// before the version is applied; serialization itself never re-checks.
    #[error("version {version} is not supported for api key {key} (max {max})")]
    UnsupportedVersion { key: i16, version: i16, max: i16 },
}

/// Result type alias for codec operations
pub type Result<T> = std::result::Result<T, KwireError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncated_input_display() {
        let err = KwireError::TruncatedInput;
        let msg = format!("{}", err);
        assert!(msg.contains("past the end"));
    }

    #[test]
    fn test_trailing_bytes_display() {
        let err = KwireError::TrailingBytes(17);
        let msg = format!("{}", err);
        assert!(msg.contains("17 unconsumed"));
    }

    #[test]
    fn test_unsupported_version_display() {
        let err = KwireError::UnsupportedVersion {
            key: 19,
            version: 9,
            max: 5,
        };
        let msg = format!("{}", err);
        assert!(msg.contains("version 9"));
        assert!(msg.contains("api key 19"));
        assert!(msg.contains("max 5"));
    }
}
