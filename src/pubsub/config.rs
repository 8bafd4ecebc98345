use serde::{Deserialize, Serialize};

/// Как fan-out обращается с блокировкой реестра.
#[derive(Debug, Default, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DispatchMode {
    /// Блокировка реестра удерживается на всё время fan-out-а, включая
    /// вызовы получателей. Реестр не меняется во время доставки; вложенный
    /// `publish` из получателя отклоняется.
    #[default]
    Locked,
    /// Под блокировкой копируется список подходящих hub-ов, получатели
    /// вызываются уже без неё. Вложенный `publish` разрешён, но hub,
    /// удалённый во время доставки, может получить это сообщение.
    Snapshot,
}

/// Настройки подсистемы pub/sub.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct PubSubConfig {
    #[serde(default)]
    pub dispatch: DispatchMode,

    /// Отклонять payload с непередаваемыми значениями до fan-out-а.
    ///
    /// `false` воспроизводит старое поведение: сообщение всё равно
    /// рассылается, а издатель получает `DataTransfer` после доставки.
    #[serde(default = "default_true")]
    pub reject_unsafe_payloads: bool,

    /// Максимальная глубина вложенности payload; `0` — без ограничения.
    #[serde(default = "default_max_payload_depth")]
    pub max_payload_depth: usize,
}

impl PubSubConfig {
    pub fn with_dispatch(
        mut self,
        dispatch: DispatchMode,
    ) -> Self {
        self.dispatch = dispatch;
        self
    }
}

impl Default for PubSubConfig {
    fn default() -> Self {
        Self {
            dispatch: DispatchMode::Locked,
            reject_unsafe_payloads: true,
            max_payload_depth: default_max_payload_depth(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_max_payload_depth() -> usize {
    1024
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = PubSubConfig::default();
        assert_eq!(cfg.dispatch, DispatchMode::Locked);
        assert!(cfg.reject_unsafe_payloads);
        assert_eq!(cfg.max_payload_depth, 1024);
    }

    /// Тест проверяет, что пропущенные поля заполняются значениями по
    /// умолчанию при десериализации.
    #[test]
    fn test_deserialize_partial() {
        let cfg: PubSubConfig = serde_json::from_str(r#"{"dispatch":"snapshot"}"#).unwrap();
        assert_eq!(cfg.dispatch, DispatchMode::Snapshot);
        assert!(cfg.reject_unsafe_payloads);
        assert_eq!(cfg.max_payload_depth, 1024);
    }
}
