//! Сервис `PubSub` в том виде, в каком его видит хост.
//!
//! Хост создаёт по одному [`PubSubService`] на контекст и вызывает методы
//! по имени с аргументами в виде [`Value::Map`]. Callback-и страницы
//! вызываются через [`Transaction`], зарегистрировавшую слушателя.

pub mod description;

use std::{fmt, sync::Arc};

use postbox_error::{DeliveryError, ServiceError};
use tracing::trace;

pub use description::{
    describe, ArgumentDescription, MethodDescription, ServiceDescription, ADD_LISTENER,
    POST_MESSAGE,
};

use crate::{
    pubsub::{Envelope, Hub, OriginFilter, Receiver, SubscriptionRegistry},
    value::{CallbackId, Value},
};

/// Механизм хоста для вызова callback-ов страницы.
///
/// Транзакция живёт, пока жив хотя бы один слушатель, созданный через неё.
pub trait Transaction: Send + Sync {
    fn invoke(
        &self,
        callback: CallbackId,
        value: &Value,
    ) -> Result<(), DeliveryError>;
}

/// Получатель, вызывающий callback страницы через транзакцию хоста.
struct BoundCallback {
    transaction: Arc<dyn Transaction>,
    callback: CallbackId,
}

impl Receiver for BoundCallback {
    fn receive(
        &self,
        envelope: &Envelope,
    ) -> Result<(), DeliveryError> {
        trace!("Invoking {} with message from {}", self.callback, envelope.origin());
        self.transaction.invoke(self.callback, &envelope.to_value())
    }
}

/// Экземпляр сервиса для одного контекста.
pub struct PubSubService {
    hub: Hub,
}

impl PubSubService {
    /// Создаёт сервис для контекста с URI `uri`.
    pub fn attach(
        registry: &Arc<SubscriptionRegistry>,
        uri: &str,
    ) -> Self {
        Self {
            hub: Hub::attach(registry, uri),
        }
    }

    pub fn hub(&self) -> &Hub {
        &self.hub
    }

    /// Вызов метода по имени.
    pub fn invoke(
        &self,
        method: &str,
        transaction: &Arc<dyn Transaction>,
        args: &Value,
    ) -> Result<Value, ServiceError> {
        match method {
            ADD_LISTENER => self.add_listener(Arc::clone(transaction), args),
            POST_MESSAGE => self.post_message(args),
            _ => Err(ServiceError::UnknownMethod {
                method: method.to_string(),
            }),
        }
    }

    /// `addListener{receiver, origin?}`.
    pub fn add_listener(
        &self,
        transaction: Arc<dyn Transaction>,
        args: &Value,
    ) -> Result<Value, ServiceError> {
        validate(ADD_LISTENER, args)?;

        let callback = args
            .get("receiver")
            .and_then(Value::as_callback)
            .ok_or(ServiceError::MissingArgument {
                method: ADD_LISTENER,
                name: "receiver",
            })?;
        let accept_origin = args
            .get("origin")
            .and_then(Value::as_str)
            .map(OriginFilter::parse)
            .unwrap_or_default();

        self.hub.subscribe(
            BoundCallback {
                transaction,
                callback,
            },
            accept_origin,
        );
        Ok(Value::Null)
    }

    /// `postMessage{data, targetOrigin}`. Возвращает `true`.
    pub fn post_message(
        &self,
        args: &Value,
    ) -> Result<Value, ServiceError> {
        validate(POST_MESSAGE, args)?;

        let missing = |name| ServiceError::MissingArgument {
            method: POST_MESSAGE,
            name,
        };
        let data = args.get("data").ok_or_else(|| missing("data"))?;
        let target = args
            .get("targetOrigin")
            .and_then(Value::as_str)
            .ok_or_else(|| missing("targetOrigin"))?;

        self.hub.publish(data, &OriginFilter::parse(target))?;
        Ok(Value::Bool(true))
    }
}

fn validate(
    method: &str,
    args: &Value,
) -> Result<(), ServiceError> {
    match describe().method(method) {
        Some(m) => m.validate(args),
        None => Err(ServiceError::UnknownMethod {
            method: method.to_string(),
        }),
    }
}

impl fmt::Debug for PubSubService {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.debug_struct("PubSubService").field("hub", &self.hub).finish()
    }
}
