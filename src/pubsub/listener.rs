use std::{fmt, sync::Arc};

use postbox_error::DeliveryError;

use super::{Envelope, OriginFilter};

/// Идентификатор слушателя внутри hub-а.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(pub u64);

/// Получатель сообщений — то, что вызывается при доставке.
///
/// Вызов синхронный и может уйти в произвольный код страницы. Ошибка
/// получателя не подавляется: она прерывает fan-out и возвращается
/// издателю.
pub trait Receiver: Send + Sync {
    fn receive(
        &self,
        envelope: &Envelope,
    ) -> Result<(), DeliveryError>;
}

impl<F> Receiver for F
where
    F: Fn(&Envelope) -> Result<(), DeliveryError> + Send + Sync,
{
    fn receive(
        &self,
        envelope: &Envelope,
    ) -> Result<(), DeliveryError> {
        self(envelope)
    }
}

/// Превращает замыкание в [`Receiver`], подсказывая компилятору сигнатуру.
///
/// ```
/// use postbox::pubsub::receiver_fn;
///
/// let r = receiver_fn(|envelope| {
///     println!("from {}", envelope.origin());
///     Ok(())
/// });
/// # let _ = r;
/// ```
pub fn receiver_fn<F>(f: F) -> F
where
    F: Fn(&Envelope) -> Result<(), DeliveryError> + Send + Sync,
{
    f
}

/// Зарегистрированный получатель и его фильтр по origin отправителя.
///
/// Неизменяем после создания. Клонирование дешёвое: получатель за `Arc`.
#[derive(Clone)]
pub struct Listener {
    id: ListenerId,
    receiver: Arc<dyn Receiver>,
    accept_origin: OriginFilter,
}

impl Listener {
    pub fn new(
        id: ListenerId,
        receiver: Arc<dyn Receiver>,
        accept_origin: OriginFilter,
    ) -> Self {
        Self {
            id,
            receiver,
            accept_origin,
        }
    }

    pub fn id(&self) -> ListenerId {
        self.id
    }

    pub fn accept_origin(&self) -> &OriginFilter {
        &self.accept_origin
    }

    /// Доставляет сообщение, если origin отправителя проходит фильтр.
    ///
    /// Фильтр проверяется здесь, даже если хост уже отфильтровал сообщения
    /// сам. Возвращает `true`, если получатель был вызван.
    pub fn notify(
        &self,
        envelope: &Envelope,
    ) -> Result<bool, DeliveryError> {
        if !self.accept_origin.matches(envelope.origin()) {
            return Ok(false);
        }
        self.receiver.receive(envelope)?;
        Ok(true)
    }
}

impl fmt::Debug for Listener {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.debug_struct("Listener")
            .field("id", &self.id)
            .field("accept_origin", &self.accept_origin)
            .finish_non_exhaustive()
    }
}

impl fmt::Display for ListenerId {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "listener#{}", self.0)
    }
}
