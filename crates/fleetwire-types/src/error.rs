//! Shared error types for the fleetwire system.

use thiserror::Error;

/// Top-level error type for the fleetwire message layer.
#[derive(Error, Debug)]
pub enum FleetwireError {
    /// A message type outside the supported set was requested.
    #[error("Unknown message type '{0}'")]
    UnknownMessageType(String),

    /// direct_request mode was requested without any discovered hosts.
    #[error("Can only send direct_request messages with discovered hosts")]
    NoDiscoveredHosts,

    /// direct_request mode was requested but direct addressing is disabled.
    #[error("Direct addressing is not enabled in the configuration")]
    DirectAddressingDisabled,

    /// A reply target was set on a non-request message.
    #[error("Reply targets are only valid on request and direct_request messages")]
    InvalidReplyTarget,

    /// An expected msgid was set on a non-reply message.
    #[error("Can only store the expected msgid for reply messages")]
    NotAReply,

    /// Plain messages carry no wire encoding.
    #[error("Cannot encode a message of type 'message' for transmission")]
    NotEncodable,

    /// Decode was attempted on a message type outside the decodable set.
    #[error("Cannot decode message type '{0}'")]
    UnsupportedDecode(String),

    /// Validation was attempted on a non-request message.
    #[error("Can only validate request messages")]
    NotValidatable,

    /// The caller identity on a message failed verification.
    #[error("Caller id '{0}' is not valid, the message may be forged")]
    ForgedRequest(String),

    /// The message outlived its TTL admission window.
    #[error(
        "Message {requestid} from {sender} created at {msgtime} is {age} seconds old, \
         TTL is {ttl}; rejecting message for agent '{agent}' in collective '{collective}'"
    )]
    TtlExpired {
        /// Request id of the expired message.
        requestid: String,
        /// Target agent.
        agent: String,
        /// Target collective.
        collective: String,
        /// Sender identity (caller id if present, sender id otherwise).
        sender: String,
        /// Creation time of the message, epoch seconds.
        msgtime: i64,
        /// Computed age at validation time, seconds.
        age: i64,
        /// Configured TTL, seconds.
        ttl: i64,
    },

    /// The message filter does not match local admission criteria.
    #[error(
        "Message {requestid} from {sender} for agent '{agent}' in collective \
         '{collective}' does not pass filters, ignoring message"
    )]
    NotTargeted {
        /// Request id of the filtered message.
        requestid: String,
        /// Target agent.
        agent: String,
        /// Target collective.
        collective: String,
        /// Sender identity (caller id if present, sender id otherwise).
        sender: String,
    },

    /// A filter expression failed validation against a capability descriptor.
    #[error("{0}")]
    DdlValidation(String),

    /// The security provider failed to encode or decode a message.
    #[error("Security provider error: {0}")]
    Security(String),

    /// The connector failed to transmit a message.
    #[error("Transport error: {0}")]
    Transport(String),

    /// A payload slot could not be encoded or decoded.
    #[error("Codec error: {0}")]
    Codec(String),

    /// A configuration error occurred.
    #[error("Configuration error: {0}")]
    Config(String),

    /// An I/O error occurred.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Alias for Result with FleetwireError.
pub type FleetwireResult<T> = Result<T, FleetwireError>;
