//! Статическое описание сервиса для хоста.

use postbox_error::ServiceError;
use serde::Serialize;

use crate::value::{Value, ValueKind};

pub const SERVICE_NAME: &str = "PubSub";
pub const SERVICE_VERSION: &str = "0.1.0";

pub const ADD_LISTENER: &str = "addListener";
pub const POST_MESSAGE: &str = "postMessage";

#[derive(Debug, Serialize)]
pub struct ServiceDescription {
    pub name: &'static str,
    pub version: &'static str,
    pub documentation: &'static str,
    pub methods: &'static [MethodDescription],
}

#[derive(Debug, Serialize)]
pub struct MethodDescription {
    pub name: &'static str,
    pub documentation: &'static str,
    pub arguments: &'static [ArgumentDescription],
}

#[derive(Debug, Serialize)]
pub struct ArgumentDescription {
    pub name: &'static str,
    #[serde(rename = "type")]
    pub kind: ValueKind,
    pub required: bool,
    pub documentation: &'static str,
}

static DESCRIPTION: ServiceDescription = ServiceDescription {
    name: SERVICE_NAME,
    version: SERVICE_VERSION,
    documentation: "A cross document message service that allows pages to send and \
                    receive messages between each other within one host process.",
    methods: &[
        MethodDescription {
            name: ADD_LISTENER,
            documentation: "Subscribe to the pubsub mechanism.",
            arguments: &[
                ArgumentDescription {
                    name: "receiver",
                    kind: ValueKind::CallBack,
                    required: true,
                    documentation: "Function that is notified of a message. The value passed \
                                    to the callback contains {data:(Any), origin:(String)}.",
                },
                ArgumentDescription {
                    name: "origin",
                    kind: ValueKind::String,
                    required: false,
                    documentation: "Origin (e.g. \"http://www.example.com\") to accept \
                                    messages from. Defaults to all (\"*\").",
                },
            ],
        },
        MethodDescription {
            name: POST_MESSAGE,
            documentation: "Post a message. The message is associated with the origin of \
                            the sender; receivers may filter messages by origin.",
            arguments: &[
                ArgumentDescription {
                    name: "data",
                    kind: ValueKind::Any,
                    required: true,
                    documentation: "The data (Map, List, String, Boolean, Integer, Double, \
                                    Null) posted to all interested subscribers.",
                },
                ArgumentDescription {
                    name: "targetOrigin",
                    kind: ValueKind::String,
                    required: true,
                    documentation: "Where to send the message: an origin like \
                                    \"http://www.example.org\" or \"*\" for all listeners.",
                },
            ],
        },
    ],
};

/// Описание сервиса `PubSub`.
pub fn describe() -> &'static ServiceDescription {
    &DESCRIPTION
}

impl ServiceDescription {
    pub fn method(
        &self,
        name: &str,
    ) -> Option<&MethodDescription> {
        self.methods.iter().find(|m| m.name == name)
    }
}

impl MethodDescription {
    /// Проверяет аргументы вызова: обязательные присутствуют, типы
    /// совпадают. `Null` у необязательного аргумента считается отсутствием.
    /// Лишние ключи игнорируются.
    pub fn validate(
        &self,
        args: &Value,
    ) -> Result<(), ServiceError> {
        let Value::Map(map) = args else {
            return Err(ServiceError::InvalidArgument {
                method: self.name,
                name: "arguments",
                expected: ValueKind::Map.as_str(),
                found: args.kind().as_str(),
            });
        };

        for arg in self.arguments {
            match map.get(arg.name) {
                None | Some(Value::Null) if !arg.required => {}
                None => {
                    return Err(ServiceError::MissingArgument {
                        method: self.name,
                        name: arg.name,
                    })
                }
                Some(value) if !arg.accepts(value) => {
                    return Err(ServiceError::InvalidArgument {
                        method: self.name,
                        name: arg.name,
                        expected: arg.kind.as_str(),
                        found: value.kind().as_str(),
                    })
                }
                Some(_) => {}
            }
        }
        Ok(())
    }
}

impl ArgumentDescription {
    pub fn accepts(
        &self,
        value: &Value,
    ) -> bool {
        self.kind == ValueKind::Any || self.kind == value.kind()
    }
}
