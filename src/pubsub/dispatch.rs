//! Учёт fan-out-а в текущем потоке.
//!
//! В режиме [`DispatchMode::Locked`](super::DispatchMode::Locked) поток,
//! выполняющий fan-out, держит блокировку реестра, пока вызываются
//! получатели. Получатель может оказаться в этом же потоке внутри
//! `subscribe`, `unsubscribe` или `Drop` hub-а. Изменения членства в реестре
//! из такого контекста откладываются и выполняются, когда внешний fan-out
//! отпустит блокировку. Вложенный `publish` отклоняется.

use std::{
    cell::{Cell, RefCell},
    marker::PhantomData,
};

type Deferred = Box<dyn FnOnce()>;

thread_local! {
    static IN_FAN_OUT: Cell<bool> = const { Cell::new(false) };
    static DEFERRED: RefCell<Vec<Deferred>> = const { RefCell::new(Vec::new()) };
}

/// Отмечает текущий поток как выполняющий fan-out.
///
/// Должен создаваться до захвата блокировки реестра и уничтожаться после
/// её освобождения: отложенные действия выполняются в `Drop`.
pub(crate) struct FanOutGuard {
    // привязан к потоку
    _not_send: PhantomData<*const ()>,
}

impl FanOutGuard {
    /// `None`, если поток уже внутри fan-out-а.
    pub(crate) fn enter() -> Option<Self> {
        IN_FAN_OUT.with(|flag| {
            if flag.get() {
                None
            } else {
                flag.set(true);
                Some(Self {
                    _not_send: PhantomData,
                })
            }
        })
    }
}

impl Drop for FanOutGuard {
    fn drop(&mut self) {
        IN_FAN_OUT.with(|flag| flag.set(false));
        // Действие может само попытаться отложить что-то ещё: флаг уже
        // снят, поэтому оно выполнится сразу.
        let pending = DEFERRED.with(|d| std::mem::take(&mut *d.borrow_mut()));
        for action in pending {
            action();
        }
    }
}

pub(crate) fn in_fan_out() -> bool {
    IN_FAN_OUT.with(Cell::get)
}

/// Выполняет `action` сразу или, если поток внутри fan-out-а, после него.
pub(crate) fn run_or_defer(action: impl FnOnce() + 'static) {
    if in_fan_out() {
        DEFERRED.with(|d| d.borrow_mut().push(Box::new(action)));
    } else {
        action();
    }
}
