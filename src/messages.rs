//! Concrete message types
//!
//! A hand-maintained subset of the protocol catalogue. The full catalogue
//! is declarative, generated data; this module keeps enough real types to
//! exercise every corner of the codec: flexible and non-flexible versions,
//! compact and classic encodings, tagged-field preservation, and each of
//! the routing/field capabilities.
//!
//! Field layouts follow the Kafka protocol definitions for the versions
//! listed per type, trimmed to the fields the codec surface needs.

use bytes::{BufMut, BytesMut};

use crate::constants::*;
use crate::error::Result;
use crate::message::{
    AdminRequest, GroupCoordinatorRequest, Request, Response, ThrottleResponse, TimeoutRequest,
    TxnCoordinatorRequest,
};
use crate::primitives::{
    put_array_len, put_compact_array_len, put_compact_nullable_string, put_compact_string,
    put_nullable_string, put_string, put_uvarint, Reader,
};
use crate::tags::{read_tags, Tags};

// Identity boilerplate shared by every request type: version bookkeeping,
// the derived flexible flag, and the paired-response lookup.
macro_rules! request_identity {
    ($resp:ident, key = $key:expr, max = $max:expr, flexible_from = $flex:expr) => {
        fn key(&self) -> i16 {
            $key
        }
        fn max_version(&self) -> i16 {
            $max
        }
        fn version(&self) -> i16 {
            self.version
        }
        fn set_version(&mut self, version: i16) {
            self.version = version;
        }
        fn is_flexible(&self) -> bool {
            self.version >= $flex
        }
        fn response_kind(&self) -> Box<dyn Response> {
            let mut resp = $resp::default();
            resp.version = self.version;
            Box::new(resp)
        }
    };
}

macro_rules! response_identity {
    ($req:ident, key = $key:expr, max = $max:expr, flexible_from = $flex:expr) => {
        fn key(&self) -> i16 {
            $key
        }
        fn max_version(&self) -> i16 {
            $max
        }
        fn version(&self) -> i16 {
            self.version
        }
        fn set_version(&mut self, version: i16) {
            self.version = version;
        }
        fn is_flexible(&self) -> bool {
            self.version >= $flex
        }
        fn request_kind(&self) -> Box<dyn Request> {
            let mut req = $req::default();
            req.version = self.version;
            Box::new(req)
        }
    };
}

fn put_tag_section(dst: &mut BytesMut, tags: &Tags) {
    put_uvarint(dst, tags.len() as u32);
    tags.append_each(dst);
}

// ===== ApiVersions (key 18) =====

/// ApiVersions request; versions 0-3, flexible from 3.
///
/// The body is empty before v3. From v3 the client reports its software
/// name and version.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApiVersionsRequest {
    version: i16,
    pub client_software_name: String,
    pub client_software_version: String,
    pub unknown_tags: Tags,
}

impl Request for ApiVersionsRequest {
    request_identity!(ApiVersionsResponse, key = API_KEY_API_VERSIONS, max = 3, flexible_from = 3);

    fn append_to(&self, dst: &mut BytesMut) {
        if self.version >= 3 {
            put_compact_string(dst, &self.client_software_name);
            put_compact_string(dst, &self.client_software_version);
            put_tag_section(dst, &self.unknown_tags);
        }
    }

    fn read_from(&mut self, src: &[u8]) -> Result<()> {
        let mut r = Reader::new(src);
        if self.version >= 3 {
            self.client_software_name = r.read_compact_string();
            self.client_software_version = r.read_compact_string();
            self.unknown_tags = read_tags(&mut r);
        } else {
            self.client_software_name = String::new();
            self.client_software_version = String::new();
            self.unknown_tags = Tags::default();
        }
        r.complete()
    }
}

/// One supported-version range in an ApiVersions response.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApiVersionsResponseKey {
    pub api_key: i16,
    pub min_version: i16,
    pub max_version: i16,
    pub unknown_tags: Tags,
}

/// ApiVersions response; versions 0-3, flexible from 3.
///
/// Unusually, the throttle field trails the api-key array.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApiVersionsResponse {
    version: i16,
    pub error_code: i16,
    pub api_keys: Vec<ApiVersionsResponseKey>,
    pub throttle_millis: i32,
    pub unknown_tags: Tags,
}

impl Response for ApiVersionsResponse {
    response_identity!(ApiVersionsRequest, key = API_KEY_API_VERSIONS, max = 3, flexible_from = 3);

    fn append_to(&self, dst: &mut BytesMut) {
        let flexible = self.is_flexible();
        dst.put_i16(self.error_code);
        if flexible {
            put_compact_array_len(dst, self.api_keys.len());
        } else {
            put_array_len(dst, self.api_keys.len());
        }
        for k in &self.api_keys {
            dst.put_i16(k.api_key);
            dst.put_i16(k.min_version);
            dst.put_i16(k.max_version);
            if flexible {
                put_tag_section(dst, &k.unknown_tags);
            }
        }
        if self.version >= 1 {
            dst.put_i32(self.throttle_millis);
        }
        if flexible {
            put_tag_section(dst, &self.unknown_tags);
        }
    }

    fn read_from(&mut self, src: &[u8]) -> Result<()> {
        let flexible = self.is_flexible();
        let mut r = Reader::new(src);
        self.error_code = r.read_i16();
        let mut num = if flexible {
            r.read_compact_array_len()
        } else {
            r.read_array_len()
        };
        if num < 0 {
            num = 0;
        }
        self.api_keys.clear();
        // Wire-claimed counts are untrusted; every element costs at least
        // one byte, so the input bounds how much is worth reserving.
        self.api_keys.reserve((num as usize).min(r.remaining()));
        for _ in 0..num {
            if r.is_failed() {
                break;
            }
            let mut k = ApiVersionsResponseKey {
                api_key: r.read_i16(),
                min_version: r.read_i16(),
                max_version: r.read_i16(),
                unknown_tags: Tags::default(),
            };
            if flexible {
                k.unknown_tags = read_tags(&mut r);
            }
            self.api_keys.push(k);
        }
        self.throttle_millis = if self.version >= 1 { r.read_i32() } else { 0 };
        self.unknown_tags = if flexible { read_tags(&mut r) } else { Tags::default() };
        r.complete()
    }
}

impl ThrottleResponse for ApiVersionsResponse {
    fn throttle(&self) -> (i32, bool) {
        (self.throttle_millis, self.version >= 2)
    }
    fn set_throttle(&mut self, millis: i32) {
        self.throttle_millis = millis;
    }
}

// ===== ControlledShutdown (key 7) =====

/// ControlledShutdown request; versions 0-3, flexible from 3.
///
/// Version 0 has a non-uniform request header (see
/// [`crate::formatter::RequestFormatter`]); the body layout here is
/// unaffected.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ControlledShutdownRequest {
    version: i16,
    pub broker_id: i32,
    /// Broker epoch, −1 before v2.
    pub broker_epoch: i64,
    pub unknown_tags: Tags,
}

impl Request for ControlledShutdownRequest {
    request_identity!(
        ControlledShutdownResponse,
        key = API_KEY_CONTROLLED_SHUTDOWN,
        max = 3,
        flexible_from = 3
    );

    fn append_to(&self, dst: &mut BytesMut) {
        dst.put_i32(self.broker_id);
        if self.version >= 2 {
            dst.put_i64(self.broker_epoch);
        }
        if self.is_flexible() {
            put_tag_section(dst, &self.unknown_tags);
        }
    }

    fn read_from(&mut self, src: &[u8]) -> Result<()> {
        let mut r = Reader::new(src);
        self.broker_id = r.read_i32();
        self.broker_epoch = if self.version >= 2 { r.read_i64() } else { -1 };
        self.unknown_tags = if self.is_flexible() {
            read_tags(&mut r)
        } else {
            Tags::default()
        };
        r.complete()
    }
}

/// A partition still led by a shutting-down broker.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemainingPartition {
    pub topic_name: String,
    pub partition_index: i32,
    pub unknown_tags: Tags,
}

/// ControlledShutdown response; versions 0-3, flexible from 3.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ControlledShutdownResponse {
    version: i16,
    pub error_code: i16,
    pub remaining_partitions: Vec<RemainingPartition>,
    pub unknown_tags: Tags,
}

impl Response for ControlledShutdownResponse {
    response_identity!(
        ControlledShutdownRequest,
        key = API_KEY_CONTROLLED_SHUTDOWN,
        max = 3,
        flexible_from = 3
    );

    fn append_to(&self, dst: &mut BytesMut) {
        let flexible = self.is_flexible();
        dst.put_i16(self.error_code);
        if flexible {
            put_compact_array_len(dst, self.remaining_partitions.len());
        } else {
            put_array_len(dst, self.remaining_partitions.len());
        }
        for p in &self.remaining_partitions {
            if flexible {
                put_compact_string(dst, &p.topic_name);
            } else {
                put_string(dst, &p.topic_name);
            }
            dst.put_i32(p.partition_index);
            if flexible {
                put_tag_section(dst, &p.unknown_tags);
            }
        }
        if flexible {
            put_tag_section(dst, &self.unknown_tags);
        }
    }

    fn read_from(&mut self, src: &[u8]) -> Result<()> {
        let flexible = self.is_flexible();
        let mut r = Reader::new(src);
        self.error_code = r.read_i16();
        let mut num = if flexible {
            r.read_compact_array_len()
        } else {
            r.read_array_len()
        };
        if num < 0 {
            num = 0;
        }
        self.remaining_partitions.clear();
        self.remaining_partitions
            .reserve((num as usize).min(r.remaining()));
        for _ in 0..num {
            if r.is_failed() {
                break;
            }
            let topic_name = if flexible {
                r.read_compact_string()
            } else {
                r.read_string()
            };
            let partition_index = r.read_i32();
            let unknown_tags = if flexible { read_tags(&mut r) } else { Tags::default() };
            self.remaining_partitions.push(RemainingPartition {
                topic_name,
                partition_index,
                unknown_tags,
            });
        }
        self.unknown_tags = if flexible { read_tags(&mut r) } else { Tags::default() };
        r.complete()
    }
}

// ===== Heartbeat (key 12) =====

/// Heartbeat request; versions 0-4, flexible from 4. Routed to the group
/// coordinator.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeartbeatRequest {
    version: i16,
    pub group_id: String,
    pub generation_id: i32,
    pub member_id: String,
    /// Static-membership instance id, v3+.
    pub group_instance_id: Option<String>,
    pub unknown_tags: Tags,
}

impl Request for HeartbeatRequest {
    request_identity!(HeartbeatResponse, key = API_KEY_HEARTBEAT, max = 4, flexible_from = 4);

    fn append_to(&self, dst: &mut BytesMut) {
        let flexible = self.is_flexible();
        if flexible {
            put_compact_string(dst, &self.group_id);
        } else {
            put_string(dst, &self.group_id);
        }
        dst.put_i32(self.generation_id);
        if flexible {
            put_compact_string(dst, &self.member_id);
        } else {
            put_string(dst, &self.member_id);
        }
        if self.version >= 3 {
            if flexible {
                put_compact_nullable_string(dst, self.group_instance_id.as_deref());
            } else {
                put_nullable_string(dst, self.group_instance_id.as_deref());
            }
        }
        if flexible {
            put_tag_section(dst, &self.unknown_tags);
        }
    }

    fn read_from(&mut self, src: &[u8]) -> Result<()> {
        let flexible = self.is_flexible();
        let mut r = Reader::new(src);
        self.group_id = if flexible {
            r.read_compact_string()
        } else {
            r.read_string()
        };
        self.generation_id = r.read_i32();
        self.member_id = if flexible {
            r.read_compact_string()
        } else {
            r.read_string()
        };
        self.group_instance_id = if self.version >= 3 {
            if flexible {
                r.read_compact_nullable_string()
            } else {
                r.read_nullable_string()
            }
        } else {
            None
        };
        self.unknown_tags = if flexible { read_tags(&mut r) } else { Tags::default() };
        r.complete()
    }
}

impl GroupCoordinatorRequest for HeartbeatRequest {}

/// Zero-copy view of a Heartbeat request; string fields alias the input
/// buffer for the lifetime `'a`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeartbeatRequestRef<'a> {
    pub version: i16,
    pub group_id: &'a str,
    pub generation_id: i32,
    pub member_id: &'a str,
    pub group_instance_id: Option<&'a str>,
    pub unknown_tags: Tags,
}

impl<'a> HeartbeatRequestRef<'a> {
    /// Borrowing decode at an explicit version (the version is negotiated
    /// out of band, exactly as for the owning type).
    pub fn read_at_version(version: i16, src: &'a [u8]) -> Result<Self> {
        let flexible = version >= 4;
        let mut r = Reader::new(src);
        let group_id = if flexible {
            r.read_compact_borrowed_str()
        } else {
            r.read_borrowed_str()
        };
        let generation_id = r.read_i32();
        let member_id = if flexible {
            r.read_compact_borrowed_str()
        } else {
            r.read_borrowed_str()
        };
        let group_instance_id = if version >= 3 {
            if flexible {
                r.read_compact_nullable_borrowed_str()
            } else {
                r.read_nullable_borrowed_str()
            }
        } else {
            None
        };
        let unknown_tags = if flexible { read_tags(&mut r) } else { Tags::default() };
        r.complete()?;
        Ok(HeartbeatRequestRef {
            version,
            group_id,
            generation_id,
            member_id,
            group_instance_id,
            unknown_tags,
        })
    }
}

/// Heartbeat response; versions 0-4, flexible from 4.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeartbeatResponse {
    version: i16,
    pub throttle_millis: i32,
    pub error_code: i16,
    pub unknown_tags: Tags,
}

impl Response for HeartbeatResponse {
    response_identity!(HeartbeatRequest, key = API_KEY_HEARTBEAT, max = 4, flexible_from = 4);

    fn append_to(&self, dst: &mut BytesMut) {
        if self.version >= 1 {
            dst.put_i32(self.throttle_millis);
        }
        dst.put_i16(self.error_code);
        if self.is_flexible() {
            put_tag_section(dst, &self.unknown_tags);
        }
    }

    fn read_from(&mut self, src: &[u8]) -> Result<()> {
        let mut r = Reader::new(src);
        self.throttle_millis = if self.version >= 1 { r.read_i32() } else { 0 };
        self.error_code = r.read_i16();
        self.unknown_tags = if self.is_flexible() {
            read_tags(&mut r)
        } else {
            Tags::default()
        };
        r.complete()
    }
}

impl ThrottleResponse for HeartbeatResponse {
    fn throttle(&self) -> (i32, bool) {
        (self.throttle_millis, self.version >= 2)
    }
    fn set_throttle(&mut self, millis: i32) {
        self.throttle_millis = millis;
    }
}

// ===== CreateTopics (key 19) =====

/// One topic to create.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatableTopic {
    pub name: String,
    /// −1 lets the broker pick its default.
    pub num_partitions: i32,
    /// −1 lets the broker pick its default.
    pub replication_factor: i16,
    pub unknown_tags: Tags,
}

impl Default for CreatableTopic {
    fn default() -> Self {
        CreatableTopic {
            name: String::new(),
            num_partitions: -1,
            replication_factor: -1,
            unknown_tags: Tags::default(),
        }
    }
}

/// CreateTopics request; versions 0-5, flexible from 5. Routed to the
/// cluster controller; carries a timeout field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreateTopicsRequest {
    version: i16,
    pub topics: Vec<CreatableTopic>,
    pub timeout_millis: i32,
    /// v1+: validate without creating.
    pub validate_only: bool,
    pub unknown_tags: Tags,
}

impl Request for CreateTopicsRequest {
    request_identity!(CreateTopicsResponse, key = API_KEY_CREATE_TOPICS, max = 5, flexible_from = 5);

    fn append_to(&self, dst: &mut BytesMut) {
        let flexible = self.is_flexible();
        if flexible {
            put_compact_array_len(dst, self.topics.len());
        } else {
            put_array_len(dst, self.topics.len());
        }
        for t in &self.topics {
            if flexible {
                put_compact_string(dst, &t.name);
            } else {
                put_string(dst, &t.name);
            }
            dst.put_i32(t.num_partitions);
            dst.put_i16(t.replication_factor);
            if flexible {
                put_tag_section(dst, &t.unknown_tags);
            }
        }
        dst.put_i32(self.timeout_millis);
        if self.version >= 1 {
            dst.put_i8(self.validate_only as i8);
        }
        if flexible {
            put_tag_section(dst, &self.unknown_tags);
        }
    }

    fn read_from(&mut self, src: &[u8]) -> Result<()> {
        let flexible = self.is_flexible();
        let mut r = Reader::new(src);
        let mut num = if flexible {
            r.read_compact_array_len()
        } else {
            r.read_array_len()
        };
        if num < 0 {
            num = 0;
        }
        self.topics.clear();
        self.topics.reserve((num as usize).min(r.remaining()));
        for _ in 0..num {
            if r.is_failed() {
                break;
            }
            let name = if flexible {
                r.read_compact_string()
            } else {
                r.read_string()
            };
            let num_partitions = r.read_i32();
            let replication_factor = r.read_i16();
            let unknown_tags = if flexible { read_tags(&mut r) } else { Tags::default() };
            self.topics.push(CreatableTopic {
                name,
                num_partitions,
                replication_factor,
                unknown_tags,
            });
        }
        self.timeout_millis = r.read_i32();
        self.validate_only = self.version >= 1 && r.read_bool();
        self.unknown_tags = if flexible { read_tags(&mut r) } else { Tags::default() };
        r.complete()
    }
}

impl AdminRequest for CreateTopicsRequest {}

impl TimeoutRequest for CreateTopicsRequest {
    fn timeout(&self) -> i32 {
        self.timeout_millis
    }
    fn set_timeout(&mut self, millis: i32) {
        self.timeout_millis = millis;
    }
}

/// Per-topic result of a CreateTopics request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreatableTopicResult {
    pub name: String,
    pub error_code: i16,
    /// v1+.
    pub error_message: Option<String>,
    pub unknown_tags: Tags,
}

/// CreateTopics response; versions 0-5, flexible from 5.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreateTopicsResponse {
    version: i16,
    /// v2+.
    pub throttle_millis: i32,
    pub topics: Vec<CreatableTopicResult>,
    pub unknown_tags: Tags,
}

impl Response for CreateTopicsResponse {
    response_identity!(CreateTopicsRequest, key = API_KEY_CREATE_TOPICS, max = 5, flexible_from = 5);

    fn append_to(&self, dst: &mut BytesMut) {
        let flexible = self.is_flexible();
        if self.version >= 2 {
            dst.put_i32(self.throttle_millis);
        }
        if flexible {
            put_compact_array_len(dst, self.topics.len());
        } else {
            put_array_len(dst, self.topics.len());
        }
        for t in &self.topics {
            if flexible {
                put_compact_string(dst, &t.name);
            } else {
                put_string(dst, &t.name);
            }
            dst.put_i16(t.error_code);
            if self.version >= 1 {
                if flexible {
                    put_compact_nullable_string(dst, t.error_message.as_deref());
                } else {
                    put_nullable_string(dst, t.error_message.as_deref());
                }
            }
            if flexible {
                put_tag_section(dst, &t.unknown_tags);
            }
        }
        if flexible {
            put_tag_section(dst, &self.unknown_tags);
        }
    }

    fn read_from(&mut self, src: &[u8]) -> Result<()> {
        let flexible = self.is_flexible();
        let mut r = Reader::new(src);
        self.throttle_millis = if self.version >= 2 { r.read_i32() } else { 0 };
        let mut num = if flexible {
            r.read_compact_array_len()
        } else {
            r.read_array_len()
        };
        if num < 0 {
            num = 0;
        }
        self.topics.clear();
        self.topics.reserve((num as usize).min(r.remaining()));
        for _ in 0..num {
            if r.is_failed() {
                break;
            }
            let name = if flexible {
                r.read_compact_string()
            } else {
                r.read_string()
            };
            let error_code = r.read_i16();
            let error_message = if self.version >= 1 {
                if flexible {
                    r.read_compact_nullable_string()
                } else {
                    r.read_nullable_string()
                }
            } else {
                None
            };
            let unknown_tags = if flexible { read_tags(&mut r) } else { Tags::default() };
            self.topics.push(CreatableTopicResult {
                name,
                error_code,
                error_message,
                unknown_tags,
            });
        }
        self.unknown_tags = if flexible { read_tags(&mut r) } else { Tags::default() };
        r.complete()
    }
}

impl ThrottleResponse for CreateTopicsResponse {
    fn throttle(&self) -> (i32, bool) {
        (self.throttle_millis, self.version >= 3)
    }
    fn set_throttle(&mut self, millis: i32) {
        self.throttle_millis = millis;
    }
}

// ===== EndTxn (key 26) =====

/// EndTxn request; versions 0-3, flexible from 3. Routed to the
/// transaction coordinator.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EndTxnRequest {
    version: i16,
    pub transactional_id: String,
    pub producer_id: i64,
    pub producer_epoch: i16,
    /// True to commit, false to abort.
    pub committed: bool,
    pub unknown_tags: Tags,
}

impl Request for EndTxnRequest {
    request_identity!(EndTxnResponse, key = API_KEY_END_TXN, max = 3, flexible_from = 3);

    fn append_to(&self, dst: &mut BytesMut) {
        let flexible = self.is_flexible();
        if flexible {
            put_compact_string(dst, &self.transactional_id);
        } else {
            put_string(dst, &self.transactional_id);
        }
        dst.put_i64(self.producer_id);
        dst.put_i16(self.producer_epoch);
        dst.put_i8(self.committed as i8);
        if flexible {
            put_tag_section(dst, &self.unknown_tags);
        }
    }

    fn read_from(&mut self, src: &[u8]) -> Result<()> {
        let flexible = self.is_flexible();
        let mut r = Reader::new(src);
        self.transactional_id = if flexible {
            r.read_compact_string()
        } else {
            r.read_string()
        };
        self.producer_id = r.read_i64();
        self.producer_epoch = r.read_i16();
        self.committed = r.read_bool();
        self.unknown_tags = if flexible { read_tags(&mut r) } else { Tags::default() };
        r.complete()
    }
}

impl TxnCoordinatorRequest for EndTxnRequest {}

/// EndTxn response; versions 0-3, flexible from 3.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EndTxnResponse {
    version: i16,
    pub throttle_millis: i32,
    pub error_code: i16,
    pub unknown_tags: Tags,
}

impl Response for EndTxnResponse {
    response_identity!(EndTxnRequest, key = API_KEY_END_TXN, max = 3, flexible_from = 3);

    fn append_to(&self, dst: &mut BytesMut) {
        dst.put_i32(self.throttle_millis);
        dst.put_i16(self.error_code);
        if self.is_flexible() {
            put_tag_section(dst, &self.unknown_tags);
        }
    }

    fn read_from(&mut self, src: &[u8]) -> Result<()> {
        let mut r = Reader::new(src);
        self.throttle_millis = r.read_i32();
        self.error_code = r.read_i16();
        self.unknown_tags = if self.is_flexible() {
            read_tags(&mut r)
        } else {
            Tags::default()
        };
        r.complete()
    }
}

impl ThrottleResponse for EndTxnResponse {
    fn throttle(&self) -> (i32, bool) {
        (self.throttle_millis, self.version >= 1)
    }
    fn set_throttle(&mut self, millis: i32) {
        self.throttle_millis = millis;
    }
}
