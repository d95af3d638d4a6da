//! Request framing
//!
//! Assembles the transmittable frame for a request:
//!
//! ```text
//! [i32 length] [i16 api_key] [i16 api_version] [i32 correlation_id]
//! [nullable_string client_id] {if flexible: [uvarint tag_count] [tags]}
//! [body...]
//! ```
//!
//! The length prefix counts every byte after itself and is backpatched
//! once the body has been appended.

use bytes::{BufMut, BytesMut};
use tracing::trace;

use crate::constants::API_KEY_CONTROLLED_SHUTDOWN;
use crate::message::Request;
use crate::primitives::{put_nullable_string, put_uvarint};

/// Frames requests for transmission.
///
/// The only configuration is the client id attached to each request.
/// `append_request` threads no mutable state between calls, so a single
/// formatter is safe to share across any number of in-flight requests.
#[derive(Debug, Clone, Default)]
pub struct RequestFormatter {
    client_id: Option<String>,
}

impl RequestFormatter {
    /// A formatter that sends no client id.
    pub fn new() -> Self {
        Self::default()
    }

    /// A formatter that attaches the given client id to every request,
    /// minus ControlledShutdown v0, which uses its own header format.
    pub fn with_client_id(id: impl Into<String>) -> Self {
        RequestFormatter {
            client_id: Some(id.into()),
        }
    }

    /// Append a full framed request to `dst`.
    ///
    /// The correlation id is chosen by the caller per in-flight request;
    /// the formatter only writes it.
    pub fn append_request(&self, dst: &mut BytesMut, req: &dyn Request, correlation_id: i32) {
        let key = req.key();
        let version = req.version();
        trace!(key, version, correlation_id, "framing request");

        let start = dst.len();
        dst.put_i32(0); // length, backpatched below
        dst.put_i16(key);
        dst.put_i16(version);
        dst.put_i32(correlation_id);

        // ControlledShutdown v0 predates the uniform header: it ends at the
        // correlation id, with no client id, tags, or body.
        if !(key == API_KEY_CONTROLLED_SHUTDOWN && version == 0) {
            // Even under flexible versions the client id stays in the
            // non-compact encoding: clients issue ApiVersions before
            // knowing the broker version, and old brokers cannot parse a
            // compact client id.
            put_nullable_string(dst, self.client_id.as_deref());

            // Flexible tags end the request header. Header-level tags are
            // never populated today; the zero count keeps the header
            // parseable by flexible brokers.
            if req.is_flexible() {
                put_uvarint(dst, 0);
            }

            req.append_to(dst);
        }

        let frame_len = (dst.len() - start - 4) as i32;
        dst[start..start + 4].copy_from_slice(&frame_len.to_be_bytes());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messages::{ApiVersionsRequest, ControlledShutdownRequest, HeartbeatRequest};
    use crate::primitives::Reader;

    fn frame_len(buf: &[u8]) -> i32 {
        i32::from_be_bytes([buf[0], buf[1], buf[2], buf[3]])
    }

    #[test]
    fn test_length_prefix_matches_frame() {
        let mut req = HeartbeatRequest::default();
        req.group_id = "g".to_string();
        req.member_id = "m".to_string();
        req.set_version(2);

        let fmt = RequestFormatter::with_client_id("test-client");
        let mut buf = BytesMut::new();
        fmt.append_request(&mut buf, &req, 42);

        assert_eq!(frame_len(&buf) as usize, buf.len() - 4);
    }

    #[test]
    fn test_header_layout_non_flexible() {
        let mut req = HeartbeatRequest::default();
        req.set_version(1);

        let fmt = RequestFormatter::with_client_id("cid");
        let mut buf = BytesMut::new();
        fmt.append_request(&mut buf, &req, 7);

        let mut r = Reader::new(&buf[4..]);
        assert_eq!(r.read_i16(), req.key());
        assert_eq!(r.read_i16(), 1);
        assert_eq!(r.read_i32(), 7);
        assert_eq!(r.read_nullable_string(), Some("cid".to_string()));
    }

    #[test]
    fn test_flexible_header_has_empty_tag_section() {
        let mut req = ApiVersionsRequest::default();
        req.set_version(3); // flexible
        assert!(req.is_flexible());

        let fmt = RequestFormatter::new();
        let mut buf = BytesMut::new();
        fmt.append_request(&mut buf, &req, 1);

        let mut r = Reader::new(&buf[4..]);
        r.read_i16();
        r.read_i16();
        r.read_i32();
        assert_eq!(r.read_nullable_string(), None);
        // Header tag count is always zero today.
        assert_eq!(r.read_uvarint(), 0);
    }

    #[test]
    fn test_missing_client_id_encodes_null() {
        let mut req = HeartbeatRequest::default();
        req.set_version(0);

        let fmt = RequestFormatter::new();
        let mut buf = BytesMut::new();
        fmt.append_request(&mut buf, &req, 0);

        let mut r = Reader::new(&buf[4..]);
        r.read_i16();
        r.read_i16();
        r.read_i32();
        assert_eq!(r.read_nullable_string(), None);
    }

    #[test]
    fn test_controlled_shutdown_v0_ends_at_correlation_id() {
        let mut req = ControlledShutdownRequest::default();
        req.broker_id = 3;
        req.set_version(0);

        let fmt = RequestFormatter::with_client_id("ignored");
        let mut buf = BytesMut::new();
        fmt.append_request(&mut buf, &req, 99);

        // length + key + version + correlation id, nothing else
        assert_eq!(buf.len(), 4 + 2 + 2 + 4);
        assert_eq!(frame_len(&buf), 8);
        let mut r = Reader::new(&buf[4..]);
        assert_eq!(r.read_i16(), API_KEY_CONTROLLED_SHUTDOWN);
        assert_eq!(r.read_i16(), 0);
        assert_eq!(r.read_i32(), 99);
        assert!(r.complete().is_ok());
    }

    #[test]
    fn test_controlled_shutdown_v1_uses_uniform_header() {
        let mut req = ControlledShutdownRequest::default();
        req.broker_id = 3;
        req.set_version(1);

        let fmt = RequestFormatter::with_client_id("cid");
        let mut buf = BytesMut::new();
        fmt.append_request(&mut buf, &req, 5);

        let mut r = Reader::new(&buf[4..]);
        r.read_i16();
        r.read_i16();
        r.read_i32();
        assert_eq!(r.read_nullable_string(), Some("cid".to_string()));
        assert_eq!(r.read_i32(), 3); // body: broker id
        assert!(r.complete().is_ok());
    }

    #[test]
    fn test_formatter_reuse_produces_identical_frames() {
        let mut req = HeartbeatRequest::default();
        req.group_id = "grp".to_string();
        req.set_version(3);

        let fmt = RequestFormatter::with_client_id("cid");
        let mut a = BytesMut::new();
        let mut b = BytesMut::new();
        fmt.append_request(&mut a, &req, 10);
        fmt.append_request(&mut b, &req, 10);
        assert_eq!(a, b);
    }
}
