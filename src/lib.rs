// Kafka wire protocol codec
//
// This crate handles the binary wire protocol format for a Kafka-style
// broker protocol:
// [4 bytes: Size (big-endian i32)] [RequestHeader] [RequestBody]
//
// The codec's job ends at "bytes in, typed structure out" and "typed
// structure in, bytes out". Transport, retries, broker discovery, and
// response interpretation belong to the layers around it. Every encode and
// decode operates on caller-supplied buffers and caller-owned instances,
// so the crate holds no shared mutable state and needs no locking.
//
// Module organization:
// - primitives: byte-level reads/writes with deferred-failure cursoring
// - tags: flexible-version tagged-field store and traversal
// - message: the request/response contract and capability traits
// - formatter: request framing (header + length backpatch)
// - sticky: dual-version sticky member metadata codec
// - messages: hand-maintained subset of concrete message types
// - constants: api keys
// - error: codec error types

pub mod constants;
pub mod error;
pub mod formatter;
pub mod message;
pub mod messages;
pub mod primitives;
pub mod sticky;
pub mod tags;

// Re-export commonly used types for convenience
pub use error::{KwireError, Result};
pub use formatter::RequestFormatter;
pub use message::{
    check_version, AdminRequest, GroupCoordinatorRequest, ReadFromBorrowed, Request, Response,
    ThrottleResponse, TimeoutRequest, TxnCoordinatorRequest,
};
pub use primitives::Reader;
pub use sticky::{StickyAssignment, StickyMemberMetadata, StickyMemberMetadataRef};
pub use tags::{read_tags, skip_tags, TagRead, Tags};
