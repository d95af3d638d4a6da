//! Protocol constants
//!
//! Centralizes the magic numbers used by the codec and the shipped message
//! subset.
//!
//! # Terminology
//! - **API Key**: identifies which operation/request type (e.g., 18 = ApiVersions)
//! - **API Version**: identifies which version of that operation

// ===== API Keys =====
// See: https://kafka.apache.org/protocol.html#protocol_api_key

/// API key for ControlledShutdown requests
///
/// Version 0 of this API predates the uniform request header: its header
/// ends at the correlation id, with no client id field. The request
/// formatter special-cases it.
pub const API_KEY_CONTROLLED_SHUTDOWN: i16 = 7;

/// API key for Heartbeat requests
///
/// Used to maintain consumer group membership; routed to the group
/// coordinator.
pub const API_KEY_HEARTBEAT: i16 = 12;

/// API key for ApiVersions requests
///
/// Used to negotiate which API versions a broker supports
pub const API_KEY_API_VERSIONS: i16 = 18;

/// API key for CreateTopics requests
///
/// Used to create topics; routed to the cluster controller
pub const API_KEY_CREATE_TOPICS: i16 = 19;

/// API key for EndTxn requests
///
/// Used to commit or abort a transaction; routed to the transaction
/// coordinator.
pub const API_KEY_END_TXN: i16 = 26;
