use std::{
    cell::RefCell,
    fmt,
    sync::{
        atomic::{AtomicBool, AtomicU64, Ordering},
        Arc,
    },
};

use parking_lot::{Mutex, ReentrantMutex};
use postbox_error::{DeliveryError, PublishError};
use tracing::{debug, trace};

use super::{
    dispatch::{self, FanOutGuard},
    DispatchMode, Envelope, Listener, ListenerId, Origin, OriginFilter, PubSubConfig,
};

/// Идентификатор hub-а, уникальный в пределах реестра.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HubId(pub u64);

/// Итог одной публикации.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Delivery {
    /// Сколько hub-ов прошло target-фильтр.
    pub hubs: usize,
    /// Сколько получателей было вызвано.
    pub listeners: usize,
}

/// Общий для всех контекстов процесса набор hub-ов, у которых есть хотя бы
/// один слушатель.
///
/// Создаётся один раз при старте и передаётся каждому
/// [`Hub`](super::Hub). Все изменения и fan-out идут под одной блокировкой.
/// Блокировка реентерабельная: получатель, вызванный во время fan-out-а,
/// может читать реестр (`len`, `contains`) из того же потока, а изменения
/// членства в таком случае откладываются до конца fan-out-а.
pub struct SubscriptionRegistry {
    config: PubSubConfig,
    endpoints: ReentrantMutex<RefCell<Vec<Arc<Endpoint>>>>,
    next_hub_id: AtomicU64,
    closed: AtomicBool,
}

/// Часть hub-а, на которую ссылается реестр.
pub(crate) struct Endpoint {
    id: HubId,
    origin: Origin,
    listeners: Mutex<Vec<Listener>>,
    next_listener_id: AtomicU64,
    detached: AtomicBool,
}

////////////////////////////////////////////////////////////////////////////////
// Собственные методы
////////////////////////////////////////////////////////////////////////////////

impl SubscriptionRegistry {
    pub fn new(config: PubSubConfig) -> Arc<Self> {
        Arc::new(Self {
            config,
            endpoints: ReentrantMutex::new(RefCell::new(Vec::new())),
            next_hub_id: AtomicU64::new(1),
            closed: AtomicBool::new(false),
        })
    }

    pub fn config(&self) -> &PubSubConfig {
        &self.config
    }

    /// Число зарегистрированных hub-ов.
    pub fn len(&self) -> usize {
        self.endpoints.lock().borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(
        &self,
        id: HubId,
    ) -> bool {
        self.endpoints.lock().borrow().iter().any(|e| e.id == id)
    }

    /// Origin-ы зарегистрированных hub-ов в порядке регистрации.
    pub fn origins(&self) -> Vec<Origin> {
        self.endpoints
            .lock()
            .borrow()
            .iter()
            .map(|e| e.origin.clone())
            .collect()
    }

    /// `true` после [`shutdown`](Self::shutdown).
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Отсоединяет все hub-ы и очищает реестр.
    ///
    /// Hub-ы остаются живыми, но больше не получают сообщений и не
    /// регистрируются повторно. Hub-ы, созданные после закрытия, сразу
    /// отсоединены. Возвращает число удалённых hub-ов.
    pub fn shutdown(self: &Arc<Self>) -> usize {
        self.closed.store(true, Ordering::Release);
        let removed = {
            let guard = self.endpoints.lock();
            let endpoints = guard.borrow();
            for endpoint in endpoints.iter() {
                endpoint.detached.store(true, Ordering::Release);
            }
            endpoints.len()
        };

        let registry = Arc::clone(self);
        dispatch::run_or_defer(move || {
            registry.endpoints.lock().borrow_mut().clear();
        });
        debug!("Subscription registry shut down, {} hubs detached", removed);
        removed
    }

    pub(crate) fn create_endpoint(
        &self,
        origin: Origin,
    ) -> Arc<Endpoint> {
        let id = HubId(self.next_hub_id.fetch_add(1, Ordering::Relaxed));
        Arc::new(Endpoint {
            id,
            origin,
            listeners: Mutex::new(Vec::new()),
            next_listener_id: AtomicU64::new(1),
            detached: AtomicBool::new(self.is_closed()),
        })
    }

    /// Приводит членство hub-а в реестре к его текущему состоянию: hub со
    /// слушателями регистрируется, пустой или отсоединённый удаляется.
    ///
    /// Внутри fan-out-а текущего потока выполняется после его завершения.
    pub(crate) fn sync_membership(
        self: &Arc<Self>,
        endpoint: &Arc<Endpoint>,
    ) {
        let registry = Arc::clone(self);
        let endpoint = Arc::clone(endpoint);
        dispatch::run_or_defer(move || registry.sync_now(&endpoint));
    }

    fn sync_now(
        &self,
        endpoint: &Arc<Endpoint>,
    ) {
        let guard = self.endpoints.lock();
        let mut endpoints = guard.borrow_mut();

        // Порядок блокировок: реестр, затем локальная.
        let wanted = !endpoint.is_detached() && endpoint.listener_count() > 0;
        let position = endpoints.iter().position(|e| e.id == endpoint.id);

        match (position, wanted) {
            (None, true) => {
                endpoints.push(Arc::clone(endpoint));
                debug!(
                    "Registered {} ({}), registry size {}",
                    endpoint.id,
                    endpoint.origin,
                    endpoints.len()
                );
            }
            (Some(i), false) => {
                endpoints.remove(i);
                debug!(
                    "Removed {} ({}), registry size {}",
                    endpoint.id,
                    endpoint.origin,
                    endpoints.len()
                );
            }
            _ => {}
        }
    }

    /// Рассылает конверт всем hub-ам, чей origin проходит `target`.
    ///
    /// Первая ошибка получателя прерывает рассылку.
    pub(crate) fn fan_out(
        &self,
        envelope: &Envelope,
        target: &OriginFilter,
    ) -> Result<Delivery, PublishError> {
        match self.config.dispatch {
            DispatchMode::Locked => {
                // Guard объявлен раньше блокировки и снимается после неё.
                let _fan_out = FanOutGuard::enter().ok_or(PublishError::Reentrant)?;
                let guard = self.endpoints.lock();
                let endpoints = guard.borrow();
                Ok(deliver(endpoints.iter(), envelope, target)?)
            }
            DispatchMode::Snapshot => {
                let targets: Vec<Arc<Endpoint>> = {
                    let guard = self.endpoints.lock();
                    let endpoints = guard.borrow();
                    endpoints
                        .iter()
                        .filter(|e| target.matches(&e.origin))
                        .cloned()
                        .collect()
                };
                Ok(deliver(targets.iter(), envelope, target)?)
            }
        }
    }
}

fn deliver<'a>(
    endpoints: impl Iterator<Item = &'a Arc<Endpoint>>,
    envelope: &Envelope,
    target: &OriginFilter,
) -> Result<Delivery, DeliveryError> {
    let mut delivery = Delivery::default();
    for endpoint in endpoints {
        if endpoint.is_detached() || !target.matches(&endpoint.origin) {
            continue;
        }
        delivery.hubs += 1;
        let notified = endpoint.notify(envelope)?;
        delivery.listeners += notified;
        trace!(
            "Delivered message from {} to {} ({} listeners)",
            envelope.origin(),
            endpoint.id,
            notified
        );
    }
    Ok(delivery)
}

impl Endpoint {
    pub(crate) fn id(&self) -> HubId {
        self.id
    }

    pub(crate) fn origin(&self) -> &Origin {
        &self.origin
    }

    pub(crate) fn is_detached(&self) -> bool {
        self.detached.load(Ordering::Acquire)
    }

    pub(crate) fn listener_count(&self) -> usize {
        self.listeners.lock().len()
    }

    /// Добавляет слушателя. Возвращает `true`, если он первый.
    pub(crate) fn add_listener(
        &self,
        make: impl FnOnce(ListenerId) -> Listener,
    ) -> (ListenerId, bool) {
        let id = ListenerId(self.next_listener_id.fetch_add(1, Ordering::Relaxed));
        let listener = make(id);
        let mut listeners = self.listeners.lock();
        listeners.push(listener);
        (id, listeners.len() == 1)
    }

    /// Удаляет слушателя. Возвращает удалённого и признак того, что список
    /// опустел.
    pub(crate) fn remove_listener(
        &self,
        id: ListenerId,
    ) -> Option<(Listener, bool)> {
        let mut listeners = self.listeners.lock();
        let position = listeners.iter().position(|l| l.id() == id)?;
        let removed = listeners.remove(position);
        Some((removed, listeners.is_empty()))
    }

    /// Отсоединяет endpoint и возвращает его слушателей, чтобы вызывающий
    /// освободил их вне локальной блокировки.
    pub(crate) fn detach(&self) -> Vec<Listener> {
        self.detached.store(true, Ordering::Release);
        std::mem::take(&mut *self.listeners.lock())
    }

    /// Локальная рассылка: каждый слушатель проверяет свой accept-origin.
    ///
    /// Список копируется под локальной блокировкой, получатели вызываются
    /// без неё, поэтому получатель может подписываться на этом же hub-е.
    fn notify(
        &self,
        envelope: &Envelope,
    ) -> Result<usize, DeliveryError> {
        let listeners = self.listeners.lock().clone();
        let mut notified = 0;
        for listener in &listeners {
            if listener.notify(envelope)? {
                notified += 1;
            }
        }
        Ok(notified)
    }
}

////////////////////////////////////////////////////////////////////////////////
// Общие реализации трейтов
////////////////////////////////////////////////////////////////////////////////

impl fmt::Display for HubId {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "hub#{}", self.0)
    }
}

impl fmt::Debug for SubscriptionRegistry {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.debug_struct("SubscriptionRegistry")
            .field("config", &self.config)
            .field("len", &self.len())
            .field("closed", &self.is_closed())
            .finish()
    }
}
