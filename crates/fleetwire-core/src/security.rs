//! Security provider seam — pluggable message integrity and identity.
//!
//! The envelope never touches wire bytes or key material itself; it
//! delegates encode, decode, identity verification, and local filter
//! matching to an implementation of [`SecurityProvider`]. Providers are
//! free to sign, encrypt, or merely serialize — the envelope only cares
//! about the contract below.

use crate::message::MessageEnvelope;
use fleetwire_types::{Filter, FleetwireResult};
use serde::{Deserialize, Serialize};

/// The structure a provider yields when decoding an inbound message.
///
/// Every field is optional: the envelope copies what is present and
/// leaves its own fields unchanged for anything absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecodedMessage {
    /// Collective the message was addressed to.
    pub collective: Option<String>,
    /// Target agent.
    pub agent: Option<String>,
    /// Targeting filter carried on the wire.
    pub filter: Option<Filter>,
    /// Request correlation id.
    pub requestid: Option<String>,
    /// Admission window in seconds.
    pub ttl: Option<i64>,
    /// Creation time, epoch seconds.
    pub msgtime: Option<i64>,
    /// Verified caller identity; carried for request-class messages.
    pub callerid: Option<String>,
    /// Raw sender identity, used for diagnostics only.
    pub senderid: Option<String>,
    /// The decoded message body.
    pub body: Option<serde_json::Value>,
}

/// Pluggable cryptographic encode/decode and identity verification.
pub trait SecurityProvider: Send + Sync {
    /// Encode a reply to a previously received request into wire form.
    fn encode_reply(
        &self,
        agent: Option<&str>,
        payload: &serde_json::Value,
        requestid: &str,
        callerid: Option<&str>,
    ) -> FleetwireResult<String>;

    /// Encode an outbound request into wire form.
    #[allow(clippy::too_many_arguments)]
    fn encode_request(
        &self,
        identity: &str,
        payload: &serde_json::Value,
        requestid: &str,
        filter: &Filter,
        agent: Option<&str>,
        collective: Option<&str>,
        ttl: i64,
    ) -> FleetwireResult<String>;

    /// Decode an inbound envelope's wire content.
    ///
    /// Fails with a provider-specific [`FleetwireError::Security`] on
    /// malformed or undecryptable input.
    ///
    /// [`FleetwireError::Security`]: fleetwire_types::FleetwireError::Security
    fn decode_message(&self, envelope: &MessageEnvelope) -> FleetwireResult<DecodedMessage>;

    /// Verify a caller identity against the provider's trust rules.
    fn valid_callerid(&self, callerid: &str) -> bool;

    /// Evaluate a targeting filter against this node's capabilities.
    fn validate_filter(&self, filter: &Filter) -> bool;
}
