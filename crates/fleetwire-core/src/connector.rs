//! Connector seam — transport for encoded envelopes.

use crate::message::MessageEnvelope;
use fleetwire_types::FleetwireResult;

/// Transports an encoded envelope over the middleware.
///
/// The envelope is the unit of transmission: connectors read its type,
/// collective, agent, and discovered hosts to pick the destination.
/// Retry and reconnect policy belongs to the connector, not the
/// envelope.
pub trait Connector: Send + Sync {
    /// Publish a message to the middleware.
    fn publish(&self, message: &MessageEnvelope) -> FleetwireResult<()>;
}
