//! postbox: origin-filtered publish/subscribe between execution contexts
//! of one host process.
//!
//! Every context gets a [`Hub`] bound to its origin. Hubs with listeners
//! live in a shared [`SubscriptionRegistry`]; publishing walks the registry
//! and notifies every hub whose origin matches the target, after checking
//! that the payload holds only transmissible values.

/// JSON-lines host bridge used by the `postbox` binary.
pub mod bridge;
/// Process configuration loading.
pub mod config;
/// Flexible logging (formatting, filters, sinks).
pub mod logging;
/// Pub/Sub core: Hub, SubscriptionRegistry, Listener, Origin.
pub mod pubsub;
/// Host-facing `PubSub` service surface.
pub mod service;
/// Values exchanged between the host and contexts.
pub mod value;

// -----------------------------------------------------------------------------
//  Frequently used public types
// -----------------------------------------------------------------------------

/// Configuration.
pub use config::Settings;
/// Errors and status codes.
pub use postbox_error::{
    DeliveryError, ErrorExt, OriginError, PublishError, ServiceError, StatusCode,
};
/// Pub/Sub API.
pub use pubsub::{
    is_safe_to_publish, Delivery, DispatchMode, Envelope, Hub, HubId, ListenerId, Origin,
    OriginFilter, PubSubConfig, Receiver, SubscriptionRegistry,
};
/// Service API.
pub use service::{describe, PubSubService, Transaction};
/// Value model.
pub use value::{CallbackId, Value, ValueKind};
