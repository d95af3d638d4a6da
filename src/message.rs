//! Request/response message contract
//!
//! Every concrete protocol message type implements [`Request`] or
//! [`Response`]: identity (api key, version bounds), the flexible-mode
//! flag, body serialization, and a paired-type lookup so generic code can
//! construct the expected counterpart without a dispatch table.
//!
//! Routing and field capabilities are modeled as independent traits a type
//! implements in any combination, not as a hierarchy: whether a request is
//! controller-routed is orthogonal to whether it carries a timeout field.
//! Callers dispatch by capability query (e.g. downcasting or by knowing the
//! concrete type), never by a tag enum.

use bytes::BytesMut;

use crate::error::{KwireError, Result};

/// A message that can be issued to a broker.
///
/// `append_to` serializes only the body; header framing belongs to
/// [`crate::formatter::RequestFormatter`]. `read_from` must fully consume
/// its input and fail on underflow or trailing bytes.
pub trait Request: std::fmt::Debug {
    /// The protocol api key for this message kind.
    fn key(&self) -> i16;

    /// The maximum protocol version this type supports. Fixed per type.
    fn max_version(&self) -> i16;

    /// The version currently negotiated for this instance.
    fn version(&self) -> i16;

    /// Set the version to use for this request and its response.
    fn set_version(&mut self, version: i16);

    /// Whether the current version is flexible (KIP-482): the wire format
    /// gains compact encodings and a trailing tagged-field section. Always
    /// derived from the current version, never stored.
    fn is_flexible(&self) -> bool;

    /// Append the message body in wire form.
    fn append_to(&self, dst: &mut BytesMut);

    /// Parse the entire input into `self`.
    fn read_from(&mut self, src: &[u8]) -> Result<()>;

    /// An empty [`Response`] of the kind this request expects, at the same
    /// version.
    fn response_kind(&self) -> Box<dyn Response>;
}

/// A message a broker responds with. Mirror of [`Request`].
pub trait Response: std::fmt::Debug {
    /// The protocol api key for this message kind.
    fn key(&self) -> i16;

    /// The maximum protocol version this type supports. Fixed per type.
    fn max_version(&self) -> i16;

    /// The version currently negotiated for this instance.
    fn version(&self) -> i16;

    /// Set the version to use for this request and its response.
    fn set_version(&mut self, version: i16);

    /// Whether the current version is flexible (KIP-482).
    fn is_flexible(&self) -> bool;

    /// Append the message body in wire form.
    fn append_to(&self, dst: &mut BytesMut);

    /// Parse the entire input into `self`.
    fn read_from(&mut self, src: &[u8]) -> Result<()>;

    /// An empty [`Request`] of the kind that elicits this response, at the
    /// same version.
    fn request_kind(&self) -> Box<dyn Request>;
}

/// A request that must be issued to the cluster controller.
pub trait AdminRequest: Request {}

/// A request that must be issued to a group coordinator.
///
/// Distinct from [`TxnCoordinatorRequest`]; no type is ever both.
pub trait GroupCoordinatorRequest: Request {}

/// A request that must be issued to a transaction coordinator.
pub trait TxnCoordinatorRequest: Request {}

/// A response the broker may throttle.
pub trait ThrottleResponse: Response {
    /// The throttle millis value, and whether the broker applies the
    /// throttle after sending the response (true from the protocol version
    /// that moved throttling after delivery). The caller must honor the
    /// ordering; the codec only reports it.
    fn throttle(&self) -> (i32, bool);

    /// Set the response's throttle millis value.
    fn set_throttle(&mut self, millis: i32);
}

/// A request that carries a timeout-millis field.
pub trait TimeoutRequest: Request {
    /// The request's timeout millis value.
    fn timeout(&self) -> i32;

    /// Set the request's timeout millis value.
    fn set_timeout(&mut self, millis: i32);
}

/// A zero-copy decode entry point.
///
/// Implemented by borrowed view types whose string fields alias the input
/// buffer instead of copying: the `'a` lifetime ties every such field to
/// the buffer, so the borrow checker enforces what is a documented-only
/// obligation in garbage-collected codecs. Kept as a separate trait and
/// separate types so the aliasing path is syntactically distinct from the
/// owning one.
pub trait ReadFromBorrowed<'a>: Sized {
    /// Parse the entire input, borrowing string fields from it.
    fn read_from_borrowed(src: &'a [u8]) -> Result<Self>;
}

/// Validate a proposed version against a message type's maximum.
///
/// The negotiation layer calls this before applying a version with
/// `set_version`; serialization itself never re-checks.
pub fn check_version<R: Request + ?Sized>(r: &R, version: i16) -> Result<()> {
    if version < 0 || version > r.max_version() {
        return Err(KwireError::UnsupportedVersion {
            key: r.key(),
            version,
            max: r.max_version(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messages::HeartbeatRequest;

    #[test]
    fn test_check_version_in_range() {
        let req = HeartbeatRequest::default();
        assert!(check_version(&req, 0).is_ok());
        assert!(check_version(&req, req.max_version()).is_ok());
    }

    #[test]
    fn test_check_version_above_max() {
        let req = HeartbeatRequest::default();
        let above = req.max_version() + 1;
        assert_eq!(
            check_version(&req, above),
            Err(KwireError::UnsupportedVersion {
                key: req.key(),
                version: above,
                max: req.max_version(),
            })
        );
    }

    #[test]
    fn test_check_version_negative() {
        let req = HeartbeatRequest::default();
        assert!(check_version(&req, -1).is_err());
    }

    #[test]
    fn test_paired_kind_round_trip() {
        let mut req = HeartbeatRequest::default();
        req.set_version(2);
        let resp = req.response_kind();
        assert_eq!(resp.key(), req.key());
        assert_eq!(resp.version(), 2);
        let back = resp.request_kind();
        assert_eq!(back.key(), req.key());
        assert_eq!(back.version(), 2);
    }
}
