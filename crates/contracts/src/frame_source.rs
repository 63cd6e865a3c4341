//! FrameSource trait - broker-facing frame input abstraction
//!
//! Decouples the collector from the concrete broker client. The production
//! MQTT client, the synthetic mock and the file replay source all implement
//! this trait, so the pipeline is exercised identically against each.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;

use crate::TelemetryError;

/// One message as delivered by the broker: provenance topic plus opaque payload
#[derive(Debug, Clone)]
pub struct BrokerMessage {
    pub topic: String,
    pub payload: Bytes,
}

/// Message callback type
///
/// When the source receives a message it hands over a `BrokerMessage`
/// through this callback. Uses `Arc` so the callback can be shared across
/// client-internal contexts.
pub type MessageCallback = Arc<dyn Fn(BrokerMessage) + Send + Sync>;

/// Frame input source trait
///
/// # Design Principles
///
/// 1. **Decoupling**: separates message delivery from message consumption
/// 2. **Unified interface**: mock, replay and real clients share one API
/// 3. **Callback pattern**: callbacks instead of channels, matching how
///    broker client libraries deliver messages natively
#[trait_variant::make(FrameSource: Send)]
pub trait LocalFrameSource {
    /// Source name (used for logging)
    fn name(&self) -> &str;

    /// Establish the connection
    ///
    /// Implementations bound the attempt by `timeout` and surface expiry as
    /// [`TelemetryError::BrokerConnectTimeout`].
    async fn connect(&mut self, timeout: Duration) -> Result<(), TelemetryError>;

    /// Register the message callback for a topic pattern
    ///
    /// Repeated calls replace the callback. Bounded by `timeout`
    /// ([`TelemetryError::BrokerSubscribeTimeout`] on expiry).
    async fn subscribe(
        &mut self,
        topic: &str,
        timeout: Duration,
        callback: MessageCallback,
    ) -> Result<(), TelemetryError>;

    /// Disconnect, allowing in-flight traffic `grace` to settle
    async fn disconnect(&mut self, grace: Duration);

    /// Whether the source is currently connected
    fn is_connected(&self) -> bool;
}
