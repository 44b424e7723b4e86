//! fleetwire message-envelope layer — typed requests and replies over a
//! publish/subscribe orchestration bus.
//!
//! ## Architecture
//!
//! - **MessageEnvelope**: one message's lifecycle — construction,
//!   targeting-mode transitions, encode/decode, admission, publication
//! - **SecurityProvider**: pluggable integrity/identity seam
//! - **Connector**: transport seam for encoded envelopes
//! - **PluginRegistry**: explicit bundle of process-wide collaborators
//! - **validator**: compound-filter checks against capability descriptors

pub mod connector;
pub mod message;
pub mod registry;
pub mod security;
pub mod stats;
pub mod validator;

pub use connector::Connector;
pub use message::{
    MessageEnvelope, MessageOptions, MessageType, REPLY_TO_HEADER, SENDER_HEADER,
};
pub use registry::PluginRegistry;
pub use security::{DecodedMessage, SecurityProvider};
pub use stats::ServerStats;
pub use validator::validate_compound_filter;
