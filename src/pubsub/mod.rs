//! Origin-filtered publish/subscribe между контекстами исполнения.
//!
//! Каждый контекст получает свой [`Hub`]. Hub-ы со слушателями лежат в
//! общем [`SubscriptionRegistry`]; `publish` проходит по реестру и для
//! каждого hub-а, чей origin совпал с target, вызывает подходящих
//! слушателей.

mod config;
mod dispatch;
mod envelope;
mod hub;
mod listener;
mod origin;
mod registry;
pub mod safety;

pub use config::{DispatchMode, PubSubConfig};
pub use envelope::Envelope;
pub use hub::Hub;
pub use listener::{receiver_fn, Listener, ListenerId, Receiver};
pub use origin::{Origin, OriginFilter, WILDCARD};
pub use registry::{Delivery, HubId, SubscriptionRegistry};
pub use safety::{find_unsafe, is_safe_to_publish, UnsafeValue};
