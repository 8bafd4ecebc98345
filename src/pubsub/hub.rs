use std::{fmt, sync::Arc};

use postbox_error::{ErrorExt, PublishError};
use tracing::{debug, error, warn};

use super::{
    find_unsafe, is_safe_to_publish, registry::Endpoint, Delivery, HubId, Listener, ListenerId,
    Origin, OriginFilter, Receiver, SubscriptionRegistry,
};
use crate::value::Value;

/// Точка подключения одного контекста исполнения к pub/sub.
///
/// Hub знает свой origin, держит локальный список слушателей и участвует в
/// общем [`SubscriptionRegistry`], пока у него есть хотя бы один слушатель.
/// При уничтожении hub удаляется из реестра, его слушатели отбрасываются.
pub struct Hub {
    endpoint: Arc<Endpoint>,
    registry: Arc<SubscriptionRegistry>,
}

impl Hub {
    /// Создаёт hub для контекста с данным URI.
    ///
    /// Если URI не разбирается, ошибка пишется в лог, а hub получает пустой
    /// origin. Такой hub получает только сообщения с target `*`.
    pub fn attach(
        registry: &Arc<SubscriptionRegistry>,
        uri: &str,
    ) -> Self {
        let origin = match Origin::from_uri(uri) {
            Ok(origin) => origin,
            Err(e) => {
                error!("Failed to resolve origin: {} [{}]", e, e.render_tags());
                Origin::unresolved()
            }
        };
        Self::with_origin(registry, origin)
    }

    /// Создаёт hub с уже известным origin-ом.
    pub fn with_origin(
        registry: &Arc<SubscriptionRegistry>,
        origin: Origin,
    ) -> Self {
        let endpoint = registry.create_endpoint(origin);
        debug!("Attached {} with origin '{}'", endpoint.id(), endpoint.origin());
        Self {
            endpoint,
            registry: Arc::clone(registry),
        }
    }

    pub fn id(&self) -> HubId {
        self.endpoint.id()
    }

    pub fn origin(&self) -> &Origin {
        self.endpoint.origin()
    }

    pub fn registry(&self) -> &Arc<SubscriptionRegistry> {
        &self.registry
    }

    pub fn listener_count(&self) -> usize {
        self.endpoint.listener_count()
    }

    /// Находится ли hub сейчас в реестре.
    pub fn is_registered(&self) -> bool {
        self.registry.contains(self.id())
    }

    /// Регистрирует получателя с фильтром по origin отправителя.
    ///
    /// Первый слушатель добавляет hub в реестр. Ограничения на число
    /// слушателей нет.
    pub fn subscribe<R>(
        &self,
        receiver: R,
        accept_origin: OriginFilter,
    ) -> ListenerId
    where
        R: Receiver + 'static,
    {
        let receiver: Arc<dyn Receiver> = Arc::new(receiver);
        let (id, first) = self
            .endpoint
            .add_listener(|id| Listener::new(id, receiver, accept_origin));

        debug!("{}: subscribed {}", self.id(), id);
        if first {
            self.registry.sync_membership(&self.endpoint);
        }
        id
    }

    /// Удаляет слушателя. Hub без слушателей покидает реестр.
    ///
    /// Возвращает `false`, если такого слушателя нет.
    pub fn unsubscribe(
        &self,
        id: ListenerId,
    ) -> bool {
        let Some((removed, now_empty)) = self.endpoint.remove_listener(id) else {
            return false;
        };
        // Получатель освобождается вне локальной блокировки.
        drop(removed);

        debug!("{}: unsubscribed {}", self.id(), id);
        if now_empty {
            self.registry.sync_membership(&self.endpoint);
        }
        true
    }

    /// Публикует payload всем hub-ам, чей origin проходит `target_origin`.
    ///
    /// Payload проверяется до рассылки; каждый получатель видит
    /// `{data, origin}`, где `data` — копия payload, а `origin` — origin
    /// этого hub-а. Получатели вызываются синхронно в этом потоке.
    pub fn publish(
        &self,
        payload: &Value,
        target_origin: &OriginFilter,
    ) -> Result<Delivery, PublishError> {
        let config = self.registry.config();

        if config.max_payload_depth > 0 {
            let depth = payload.depth();
            if depth > config.max_payload_depth {
                warn!(
                    "{}: payload depth {} exceeds limit {}",
                    self.id(),
                    depth,
                    config.max_payload_depth
                );
                return Err(PublishError::PayloadTooDeep {
                    depth,
                    limit: config.max_payload_depth,
                });
            }
        }

        let rejected = if is_safe_to_publish(payload) {
            None
        } else {
            find_unsafe(payload).map(|found| {
                warn!("{}: payload is not transmissible: {}", self.id(), found);
                PublishError::DataTransfer {
                    path: found.path,
                    kind: found.kind.to_string(),
                }
            })
        };

        if let Some(err) = rejected.as_ref().filter(|_| config.reject_unsafe_payloads) {
            return Err(err.clone());
        }

        let envelope = super::Envelope::new(payload.clone(), self.origin().clone());
        let outcome = self.registry.fan_out(&envelope, target_origin);
        // отказ по содержимому важнее ошибки получателя
        if let Some(err) = rejected {
            return Err(err);
        }
        let delivery = outcome?;
        debug!(
            "{}: published to '{}', {} hubs, {} listeners",
            self.id(),
            target_origin,
            delivery.hubs,
            delivery.listeners
        );
        Ok(delivery)
    }
}

impl Drop for Hub {
    fn drop(&mut self) {
        let discarded = self.endpoint.detach();
        self.registry.sync_membership(&self.endpoint);
        debug!(
            "Detached {}, {} listeners discarded",
            self.endpoint.id(),
            discarded.len()
        );
    }
}

impl fmt::Debug for Hub {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.debug_struct("Hub")
            .field("id", &self.id())
            .field("origin", self.origin())
            .field("listeners", &self.listener_count())
            .finish_non_exhaustive()
    }
}
