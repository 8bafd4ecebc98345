pub mod origin;
pub mod pubsub;
pub mod service;

// Публичный экспорт всех типов ошибок из вложенных модулей, чтобы упростить
// доступ к ним из внешнего кода.
pub use origin::*;
pub use pubsub::*;
pub use service::*;
