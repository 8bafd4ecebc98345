//! Мост к хосту по JSON-lines.
//!
//! Каждая строка входа — команда:
//!
//! ```text
//! {"op":"attach","context":"a","uri":"http://example.com/page"}
//! {"op":"call","context":"a","method":"addListener","args":{"receiver":{"$callback":1}}}
//! {"op":"call","context":"a","method":"postMessage","args":{"data":5,"targetOrigin":"*"}}
//! {"op":"detach","context":"a"}
//! {"op":"describe"}
//! ```
//!
//! На выход пишутся события: `deliver` для каждого вызова callback-а,
//! `result` или `error` для каждой команды.

use std::{
    collections::BTreeMap,
    io::{self, BufRead, Write},
    sync::Arc,
};

use parking_lot::Mutex;
use postbox_error::{
    BoxedError, DeliveryError, ErrorExt, PostboxResult, ServiceError, StatusCode,
};
use serde::{Deserialize, Serialize};
use serde_json::Value as Json;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::{
    pubsub::SubscriptionRegistry,
    service::{describe, PubSubService, Transaction},
    value::{from_json, to_json, CallbackId, Value},
};

#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("bridge I/O failed: {0}")]
    Io(#[from] io::Error),
    #[error("failed to encode event: {0}")]
    Encode(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "op", rename_all = "lowercase")]
pub enum Command {
    Attach {
        context: String,
        uri: String,
    },
    Detach {
        context: String,
    },
    Call {
        context: String,
        method: String,
        #[serde(default)]
        args: Json,
    },
    Describe,
}

#[derive(Debug, Serialize)]
#[serde(tag = "event", rename_all = "lowercase")]
enum Event<'a> {
    Deliver {
        context: &'a str,
        callback: u64,
        message: Json,
    },
    Result {
        #[serde(skip_serializing_if = "Option::is_none")]
        context: Option<&'a str>,
        value: Json,
    },
    Error {
        #[serde(skip_serializing_if = "Option::is_none")]
        context: Option<&'a str>,
        kind: &'a str,
        code: StatusCode,
        message: String,
    },
}

/// Итог работы моста.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BridgeStats {
    pub commands: usize,
    pub errors: usize,
}

/// Ошибки уровня моста, не связанные с вызовом сервиса.
#[derive(Debug, Error)]
enum CommandError {
    #[error("malformed command: {0}")]
    Malformed(String),
    #[error("context '{0}' is not attached")]
    UnknownContext(String),
    #[error("context '{0}' is already attached")]
    ContextExists(String),
    #[error("result cannot be encoded: {0}")]
    Encode(String),
}

type SharedOut<W> = Arc<Mutex<W>>;

/// Транзакция контекста: вызов callback-а превращается в событие `deliver`.
struct ContextTransaction<W> {
    context: String,
    out: SharedOut<W>,
}

struct Context {
    service: PubSubService,
    transaction: Arc<dyn Transaction>,
}

pub struct Bridge<W: Write + Send + 'static> {
    registry: Arc<SubscriptionRegistry>,
    contexts: BTreeMap<String, Context>,
    out: SharedOut<W>,
}

////////////////////////////////////////////////////////////////////////////////
// Собственные методы
////////////////////////////////////////////////////////////////////////////////

impl<W: Write + Send + 'static> Bridge<W> {
    pub fn new(
        registry: Arc<SubscriptionRegistry>,
        out: W,
    ) -> Self {
        Self {
            registry,
            contexts: BTreeMap::new(),
            out: Arc::new(Mutex::new(out)),
        }
    }

    pub fn registry(&self) -> &Arc<SubscriptionRegistry> {
        &self.registry
    }

    pub fn context_count(&self) -> usize {
        self.contexts.len()
    }

    /// Читает команды до конца входа. Ошибка в команде не прерывает работу;
    /// ошибка ввода-вывода прерывает.
    pub fn run<R: BufRead>(
        &mut self,
        input: R,
    ) -> Result<BridgeStats, BridgeError> {
        let mut stats = BridgeStats::default();
        for line in input.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            stats.commands += 1;
            if !self.handle_line(&line)? {
                stats.errors += 1;
            }
        }
        self.out.lock().flush()?;
        info!(
            "Bridge finished: {} commands, {} errors",
            stats.commands, stats.errors
        );
        Ok(stats)
    }

    /// Обрабатывает одну строку. Возвращает `false`, если команда завершилась
    /// ошибкой (событие `error` уже записано).
    pub fn handle_line(
        &mut self,
        line: &str,
    ) -> Result<bool, BridgeError> {
        let command: Command = match serde_json::from_str(line) {
            Ok(command) => command,
            Err(e) => {
                self.report(None, &BoxedError::new(CommandError::Malformed(e.to_string())))?;
                return Ok(false);
            }
        };

        let context = match &command {
            Command::Attach { context, .. }
            | Command::Detach { context }
            | Command::Call { context, .. } => Some(context.clone()),
            Command::Describe => None,
        };

        match self.execute(command) {
            Ok(value) => {
                self.emit(&Event::Result {
                    context: context.as_deref(),
                    value,
                })?;
                Ok(true)
            }
            Err(err) => {
                self.report(context.as_deref(), &err)?;
                Ok(false)
            }
        }
    }

    fn report(
        &self,
        context: Option<&str>,
        err: &BoxedError,
    ) -> Result<(), BridgeError> {
        warn!(
            "Command failed for {:?}: {} [{}]",
            context,
            err.log_message(),
            err.render_tags()
        );
        self.emit(&Event::Error {
            context,
            kind: host_kind(err),
            code: err.status_code(),
            message: err.client_message(),
        })
    }

    fn execute(
        &mut self,
        command: Command,
    ) -> PostboxResult<Json> {
        match command {
            Command::Attach { context, uri } => {
                if self.contexts.contains_key(&context) {
                    return Err(BoxedError::new(CommandError::ContextExists(context)));
                }
                let service = PubSubService::attach(&self.registry, &uri);
                let origin = service.hub().origin().to_string();
                let transaction: Arc<dyn Transaction> = Arc::new(ContextTransaction {
                    context: context.clone(),
                    out: Arc::clone(&self.out),
                });
                debug!("Context '{}' attached as {}", context, service.hub().id());
                self.contexts.insert(
                    context,
                    Context {
                        service,
                        transaction,
                    },
                );
                Ok(serde_json::json!({ "origin": origin }))
            }
            Command::Detach { context } => match self.contexts.remove(&context) {
                Some(_) => Ok(Json::Bool(true)),
                None => Err(unknown_context(&context)),
            },
            Command::Call {
                context,
                method,
                args,
            } => {
                let ctx = self
                    .contexts
                    .get(&context)
                    .ok_or_else(|| unknown_context(&context))?;
                let result = ctx
                    .service
                    .invoke(&method, &ctx.transaction, &from_json(args))
                    .map_err(BoxedError::new)?;
                to_json(&result).map_err(|e| encode_error(e.to_string()))
            }
            Command::Describe => {
                serde_json::to_value(describe()).map_err(|e| encode_error(e.to_string()))
            }
        }
    }

    fn emit(
        &self,
        event: &Event<'_>,
    ) -> Result<(), BridgeError> {
        write_event(&self.out, event)
    }
}

fn unknown_context(context: &str) -> BoxedError {
    BoxedError::new(CommandError::UnknownContext(context.to_string()))
}

fn encode_error(reason: String) -> BoxedError {
    BoxedError::new(CommandError::Encode(reason))
}

/// Имя ошибки для хоста.
fn host_kind(err: &BoxedError) -> &'static str {
    if let Some(e) = err.downcast_ref::<ServiceError>() {
        return e.host_kind();
    }
    match err.downcast_ref::<CommandError>() {
        Some(CommandError::Malformed(_)) => "InvalidCommand",
        Some(CommandError::UnknownContext(_)) => "UnknownContext",
        Some(CommandError::ContextExists(_)) => "ContextExists",
        Some(CommandError::Encode(_)) | None => "InternalError",
    }
}

fn write_event<W: Write>(
    out: &Mutex<W>,
    event: &Event<'_>,
) -> Result<(), BridgeError> {
    let line = serde_json::to_string(event)?;
    let mut out = out.lock();
    out.write_all(line.as_bytes())?;
    out.write_all(b"\n")?;
    Ok(())
}

////////////////////////////////////////////////////////////////////////////////
// Общие реализации трейтов
////////////////////////////////////////////////////////////////////////////////

impl ErrorExt for CommandError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::Malformed(_) | Self::UnknownContext(_) | Self::ContextExists(_) => {
                StatusCode::InvalidArgs
            }
            Self::Encode(_) => StatusCode::Internal,
        }
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}

impl<W: Write + Send> Transaction for ContextTransaction<W> {
    fn invoke(
        &self,
        callback: CallbackId,
        value: &Value,
    ) -> Result<(), DeliveryError> {
        let message = to_json(value).map_err(|e| DeliveryError::Rejected {
            reason: e.to_string(),
        })?;
        write_event(
            &self.out,
            &Event::Deliver {
                context: &self.context,
                callback: callback.0,
                message,
            },
        )
        .map_err(|_| DeliveryError::Disconnected)
    }
}
