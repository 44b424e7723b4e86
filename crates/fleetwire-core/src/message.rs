//! The message envelope — lifecycle and protocol logic for requests and
//! replies on the orchestration bus.
//!
//! A [`MessageEnvelope`] wraps one logical message for its whole life:
//! construction, base64 intake normalization, targeting-mode state
//! transitions, security-provider encode/decode, TTL-gated admission,
//! and publication. Each envelope belongs to exactly one logical flow
//! and is never shared across concurrent operations.

use crate::registry::PluginRegistry;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chrono::Utc;
use fleetwire_types::{Filter, FleetwireError, FleetwireResult, DEFAULT_TTL};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use tracing::{debug, warn};
use uuid::Uuid;

/// Header key naming the destination for replies to a request.
pub const REPLY_TO_HEADER: &str = "mc_reply_to";

/// Header key naming the originating sender, consulted only for
/// diagnostics when a reply fails to decode.
pub const SENDER_HEADER: &str = "mc_sender";

/// The class of a message, governing nearly all envelope behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageType {
    /// Plain one-way message; never encoded for the request/reply flow.
    Message,
    /// Broadcast request, targeted by filter.
    Request,
    /// Request addressed at an explicit list of discovered hosts.
    DirectRequest,
    /// Reply correlated to an earlier request.
    Reply,
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageType::Message => write!(f, "message"),
            MessageType::Request => write!(f, "request"),
            MessageType::DirectRequest => write!(f, "direct_request"),
            MessageType::Reply => write!(f, "reply"),
        }
    }
}

impl FromStr for MessageType {
    type Err = FleetwireError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "message" => Ok(MessageType::Message),
            "request" => Ok(MessageType::Request),
            "direct_request" => Ok(MessageType::DirectRequest),
            "reply" => Ok(MessageType::Reply),
            other => Err(FleetwireError::UnknownMessageType(other.to_string())),
        }
    }
}

/// Recognized construction options for [`MessageEnvelope::new`].
#[derive(Debug, Clone, Default)]
pub struct MessageOptions {
    /// Payload arrives base64 encoded and must be normalized on intake.
    pub base64: bool,
    /// Target or originating agent name.
    pub agent: Option<String>,
    /// Initial wire headers.
    pub headers: HashMap<String, String>,
    /// Message class; ignored when `request` is given.
    pub msg_type: Option<MessageType>,
    /// Targeting filter; the empty filter when omitted.
    pub filter: Option<Filter>,
    /// Admission window override, seconds.
    pub ttl: Option<i64>,
    /// Named sub-network to address.
    pub collective: Option<String>,
    /// Originating request — makes this envelope a reply to it.
    pub request: Option<Box<MessageEnvelope>>,
}

/// A typed wrapper around one request or reply exchanged over the bus.
#[derive(Debug, Clone)]
pub struct MessageEnvelope {
    payload: Value,
    message: Value,
    request: Option<Box<MessageEnvelope>>,
    headers: HashMap<String, String>,
    agent: Option<String>,
    collective: Option<String>,
    msg_type: MessageType,
    filter: Filter,
    requestid: Option<String>,
    base64: bool,
    discovered_hosts: Option<Vec<String>>,
    ttl: i64,
    validated: bool,
    msgtime: i64,
    expected_msgid: Option<String>,
}

impl MessageEnvelope {
    /// Construct an envelope around a payload and a secondary content
    /// slot.
    ///
    /// When `options.request` is given the envelope becomes a reply to
    /// that request: agent and collective are copied from it and any
    /// explicit agent/collective/type options are ignored. A payload
    /// flagged base64 is normalized immediately, so a freshly built
    /// envelope never reports the transient flag after decoding.
    pub fn new(payload: Value, message: Value, options: MessageOptions) -> FleetwireResult<Self> {
        let mut envelope = Self {
            payload,
            message,
            request: None,
            headers: options.headers,
            agent: options.agent,
            collective: options.collective,
            msg_type: options.msg_type.unwrap_or(MessageType::Message),
            filter: options.filter.unwrap_or_else(Filter::empty),
            requestid: None,
            base64: options.base64,
            discovered_hosts: None,
            ttl: options.ttl.unwrap_or(DEFAULT_TTL),
            validated: false,
            msgtime: 0,
            expected_msgid: None,
        };

        // The originating request wins over any explicit options.
        if let Some(request) = options.request {
            envelope.agent = request.agent.clone();
            envelope.collective = request.collective.clone();
            envelope.msg_type = MessageType::Reply;
            envelope.request = Some(request);
        }

        envelope.normalize_intake()?;

        Ok(envelope)
    }

    /// Decode a base64-flagged payload in place.
    ///
    /// No-op when the transient flag is unset; the decoder is not
    /// invoked at all in that case.
    pub fn normalize_intake(&mut self) -> FleetwireResult<()> {
        if !self.base64 {
            return Ok(());
        }

        let encoded = self.payload.as_str().ok_or_else(|| {
            FleetwireError::Codec("base64-flagged payload is not a string".to_string())
        })?;
        let bytes = BASE64
            .decode(encoded)
            .map_err(|e| FleetwireError::Codec(format!("invalid base64 payload: {e}")))?;
        let text = String::from_utf8(bytes)
            .map_err(|e| FleetwireError::Codec(format!("decoded payload is not UTF-8: {e}")))?;

        self.payload = Value::String(text);
        self.base64 = false;
        Ok(())
    }

    /// Base64 encode the payload for transmission.
    ///
    /// Idempotent: a payload already marked encoded is left untouched.
    pub fn encode_for_wire(&mut self) -> FleetwireResult<()> {
        if self.base64 {
            return Ok(());
        }

        let text = match &self.payload {
            Value::String(s) => s.clone(),
            other => serde_json::to_string(other)
                .map_err(|e| FleetwireError::Codec(format!("unencodable payload: {e}")))?,
        };

        self.payload = Value::String(BASE64.encode(text));
        self.base64 = true;
        Ok(())
    }

    /// Set the destination replies to this message should be sent to.
    ///
    /// Only request-class messages carry a reply target.
    pub fn set_reply_to(&mut self, target: &str) -> FleetwireResult<()> {
        match self.msg_type {
            MessageType::Request | MessageType::DirectRequest => {
                self.headers
                    .insert(REPLY_TO_HEADER.to_string(), target.to_string());
                Ok(())
            }
            _ => Err(FleetwireError::InvalidReplyTarget),
        }
    }

    /// Record the msgid this reply is expected to correlate with.
    pub fn set_expected_msgid(&mut self, msgid: &str) -> FleetwireResult<()> {
        if self.msg_type != MessageType::Reply {
            return Err(FleetwireError::NotAReply);
        }
        self.expected_msgid = Some(msgid.to_string());
        Ok(())
    }

    /// Transition the message class.
    ///
    /// Moving to [`MessageType::DirectRequest`] requires a non-empty
    /// discovered-host list and direct addressing enabled in the
    /// configuration, and rewrites the filter to an empty filter with a
    /// single criterion for this envelope's agent. Type and filter
    /// commit together; no caller observes one without the other.
    pub fn set_type(
        &mut self,
        new_type: MessageType,
        registry: &PluginRegistry,
    ) -> FleetwireResult<()> {
        if new_type == MessageType::DirectRequest {
            if self
                .discovered_hosts
                .as_ref()
                .map_or(true, |hosts| hosts.is_empty())
            {
                return Err(FleetwireError::NoDiscoveredHosts);
            }
            if !registry.config().direct_addressing {
                return Err(FleetwireError::DirectAddressingDisabled);
            }

            self.filter = Filter::for_agent(self.agent.as_deref().unwrap_or_default());
        }

        self.msg_type = new_type;
        Ok(())
    }

    /// Encode this envelope for transmission via the security provider.
    ///
    /// Replies validate the originating caller identity and fail closed
    /// on a forgery; requests are assigned a request id exactly once,
    /// so repeated calls keep the same correlation id. The wire output
    /// lands in the secondary `message` slot.
    pub fn encode(&mut self, registry: &PluginRegistry) -> FleetwireResult<()> {
        match self.msg_type {
            MessageType::Reply => {
                let request = self.request.as_ref().ok_or_else(|| {
                    FleetwireError::Security(
                        "cannot encode a reply without the originating request".to_string(),
                    )
                })?;

                let callerid = request
                    .payload
                    .get("callerid")
                    .and_then(Value::as_str)
                    .map(str::to_string);
                // A stripped caller id is checked the same as an invalid one.
                let caller = callerid.clone().unwrap_or_default();
                if !registry.security().valid_callerid(&caller) {
                    return Err(FleetwireError::ForgedRequest(caller));
                }

                let requestid = request
                    .payload
                    .get("requestid")
                    .and_then(Value::as_str)
                    .map(str::to_string)
                    .or_else(|| request.requestid.clone())
                    .unwrap_or_default();

                let wire = registry.security().encode_reply(
                    self.agent.as_deref(),
                    &self.payload,
                    &requestid,
                    callerid.as_deref(),
                )?;
                self.requestid = Some(requestid);
                self.message = Value::String(wire);
                Ok(())
            }
            MessageType::Request | MessageType::DirectRequest => {
                if self.requestid.is_none() {
                    self.requestid = Some(Self::create_reqid());
                }
                let requestid = self.requestid.clone().unwrap_or_default();

                let wire = registry.security().encode_request(
                    &registry.config().identity,
                    &self.payload,
                    &requestid,
                    &self.filter,
                    self.agent.as_deref(),
                    self.collective.as_deref(),
                    self.ttl,
                )?;
                self.message = Value::String(wire);
                Ok(())
            }
            MessageType::Message => Err(FleetwireError::NotEncodable),
        }
    }

    /// Decode an inbound envelope via the security provider.
    ///
    /// Fields present in the decoded structure are copied into the
    /// envelope; absent fields stay as they were. Request-class caller
    /// identities are verified fail-closed. A provider failure on a
    /// reply is logged and swallowed — a broken reply must never take
    /// down the caller — while the same failure on a request
    /// propagates.
    pub fn decode(&mut self, registry: &PluginRegistry) -> FleetwireResult<()> {
        match self.msg_type {
            MessageType::Request | MessageType::DirectRequest | MessageType::Reply => {}
            other => return Err(FleetwireError::UnsupportedDecode(other.to_string())),
        }

        let decoded = match registry.security().decode_message(self) {
            Ok(decoded) => decoded,
            Err(e) if self.msg_type == MessageType::Reply => {
                let sender = self
                    .headers
                    .get(SENDER_HEADER)
                    .map(String::as_str)
                    .unwrap_or("unknown");
                warn!(sender = %sender, error = %e, "Failed to decode reply message, discarding");
                return Ok(());
            }
            Err(e) => return Err(e),
        };

        if self.msg_type != MessageType::Reply {
            let callerid = decoded.callerid.clone().unwrap_or_default();
            if !registry.security().valid_callerid(&callerid) {
                return Err(FleetwireError::ForgedRequest(callerid));
            }
        }

        if decoded.collective.is_some() {
            self.collective = decoded.collective.clone();
        }
        if decoded.agent.is_some() {
            self.agent = decoded.agent.clone();
        }
        if let Some(filter) = &decoded.filter {
            self.filter = filter.clone();
        }
        if decoded.requestid.is_some() {
            self.requestid = decoded.requestid.clone();
        }
        if let Some(ttl) = decoded.ttl {
            self.ttl = ttl;
        }
        if let Some(msgtime) = decoded.msgtime {
            self.msgtime = msgtime;
        }

        self.payload = serde_json::to_value(&decoded)
            .map_err(|e| FleetwireError::Codec(format!("decoded message not representable: {e}")))?;

        Ok(())
    }

    /// Admission control for request-class messages.
    ///
    /// Rejects messages older than their TTL (counting the expiry) and
    /// messages whose filter does not match this node, then marks the
    /// envelope validated. The flag transitions false to true exactly
    /// once and is never reset.
    pub fn validate(&mut self, registry: &PluginRegistry) -> FleetwireResult<()> {
        match self.msg_type {
            MessageType::Request | MessageType::DirectRequest => {}
            _ => return Err(FleetwireError::NotValidatable),
        }

        let now = Utc::now().timestamp();
        let age = now - self.msgtime;

        if age > self.ttl {
            registry.stats().increment_ttl_expired();
            return Err(FleetwireError::TtlExpired {
                requestid: self.requestid.clone().unwrap_or_else(|| "unknown".to_string()),
                agent: self.agent.clone().unwrap_or_else(|| "unknown".to_string()),
                collective: self
                    .collective
                    .clone()
                    .unwrap_or_else(|| "unknown".to_string()),
                sender: self.sender_id(),
                msgtime: self.msgtime,
                age,
                ttl: self.ttl,
            });
        }

        // The filter carried in the decoded payload is authoritative;
        // fall back to the envelope's own when the payload has none.
        let filter = match self.payload_filter()? {
            Some(filter) => filter,
            None => self.filter.clone(),
        };
        if !registry.security().validate_filter(&filter) {
            registry.stats().increment_filtered();
            return Err(FleetwireError::NotTargeted {
                requestid: self.requestid.clone().unwrap_or_else(|| "unknown".to_string()),
                agent: self.agent.clone().unwrap_or_else(|| "unknown".to_string()),
                collective: self
                    .collective
                    .clone()
                    .unwrap_or_else(|| "unknown".to_string()),
                sender: self.sender_id(),
            });
        }

        registry.stats().increment_passed();
        self.validated = true;
        Ok(())
    }

    /// Publish this envelope via the connector.
    ///
    /// A broadcast request is switched to a direct request (rewriting
    /// its filter) before it is handed to the transport when direct
    /// addressing is enabled and the discovered-host list is non-empty
    /// and within the configured threshold; every other message goes
    /// out unchanged.
    pub fn publish(&mut self, registry: &PluginRegistry) -> FleetwireResult<()> {
        let direct_count = self
            .discovered_hosts
            .as_ref()
            .map_or(0, |hosts| hosts.len());

        if self.msg_type == MessageType::Request
            && direct_count > 0
            && registry.config().direct_addressing
            && direct_count <= registry.config().direct_addressing_threshold
        {
            debug!(
                hosts = direct_count,
                agent = self.agent.as_deref().unwrap_or_default(),
                "Switching to direct addressing"
            );
            self.set_type(MessageType::DirectRequest, registry)?;
        }

        registry.connector().publish(self)
    }

    /// Generate a fresh request identifier.
    ///
    /// Pure generation: assignment to the envelope is the caller's
    /// responsibility.
    pub fn create_reqid() -> String {
        Uuid::new_v4().simple().to_string()
    }

    /// The sender identity used in diagnostics: the payload's caller id
    /// when present, its sender id otherwise.
    pub fn sender_id(&self) -> String {
        self.payload
            .get("callerid")
            .and_then(Value::as_str)
            .or_else(|| self.payload.get("senderid").and_then(Value::as_str))
            .unwrap_or("unknown")
            .to_string()
    }

    fn payload_filter(&self) -> FleetwireResult<Option<Filter>> {
        let value = match self.payload.get("filter") {
            Some(value) if !value.is_null() => value,
            _ => return Ok(None),
        };
        serde_json::from_value(value.clone()).map(Some).map_err(|e| {
            FleetwireError::Codec(format!("malformed filter in payload: {e}"))
        })
    }

    // -- accessors --

    /// The logical payload content.
    pub fn payload(&self) -> &Value {
        &self.payload
    }

    /// Replace the payload content.
    pub fn set_payload(&mut self, payload: Value) {
        self.payload = payload;
    }

    /// The secondary content slot; holds the wire form after `encode`.
    pub fn message(&self) -> &Value {
        &self.message
    }

    /// The originating request when this envelope is a reply.
    pub fn request(&self) -> Option<&MessageEnvelope> {
        self.request.as_deref()
    }

    /// Wire headers.
    pub fn headers(&self) -> &HashMap<String, String> {
        &self.headers
    }

    /// Insert a wire header.
    pub fn set_header(&mut self, key: &str, value: &str) {
        self.headers.insert(key.to_string(), value.to_string());
    }

    /// Target or originating agent name.
    pub fn agent(&self) -> Option<&str> {
        self.agent.as_deref()
    }

    /// Named sub-network this message addresses.
    pub fn collective(&self) -> Option<&str> {
        self.collective.as_deref()
    }

    /// The message class.
    pub fn msg_type(&self) -> MessageType {
        self.msg_type
    }

    /// The targeting filter.
    pub fn filter(&self) -> &Filter {
        &self.filter
    }

    /// Replace the targeting filter.
    pub fn set_filter(&mut self, filter: Filter) {
        self.filter = filter;
    }

    /// Request correlation id, assigned on first encode.
    pub fn requestid(&self) -> Option<&str> {
        self.requestid.as_deref()
    }

    /// Whether the payload currently carries base64 wire form.
    pub fn is_base64(&self) -> bool {
        self.base64
    }

    /// Hosts produced by discovery; presence enables direct addressing.
    pub fn discovered_hosts(&self) -> Option<&[String]> {
        self.discovered_hosts.as_deref()
    }

    /// Provide the discovered-host list for direct addressing.
    pub fn set_discovered_hosts(&mut self, hosts: Vec<String>) {
        self.discovered_hosts = Some(hosts);
    }

    /// Admission window in seconds.
    pub fn ttl(&self) -> i64 {
        self.ttl
    }

    /// Whether this message passed admission control.
    pub fn is_validated(&self) -> bool {
        self.validated
    }

    /// Creation time of the message, epoch seconds; set by decode.
    pub fn msgtime(&self) -> i64 {
        self.msgtime
    }

    /// The msgid a reply is expected to correlate with.
    pub fn expected_msgid(&self) -> Option<&str> {
        self.expected_msgid.as_deref()
    }

    /// The reply destination header, when set.
    pub fn reply_to(&self) -> Option<&str> {
        self.headers.get(REPLY_TO_HEADER).map(String::as_str)
    }
}
