use std::sync::Arc;

use parking_lot::Mutex;
use postbox::{
    service::{ADD_LISTENER, POST_MESSAGE},
    CallbackId, DeliveryError, PubSubConfig, PubSubService, ServiceError, SubscriptionRegistry,
    Transaction, Value,
};
use rstest::{fixture, rstest};

/// Транзакция хоста, запоминающая вызовы callback-ов.
#[derive(Default)]
struct MockTransaction {
    calls: Mutex<Vec<(CallbackId, Value)>>,
    fail_with: Option<DeliveryError>,
}

impl Transaction for MockTransaction {
    fn invoke(
        &self,
        callback: CallbackId,
        value: &Value,
    ) -> Result<(), DeliveryError> {
        if let Some(err) = &self.fail_with {
            return Err(err.clone());
        }
        self.calls.lock().push((callback, value.clone()));
        Ok(())
    }
}

#[fixture]
fn registry() -> Arc<SubscriptionRegistry> {
    SubscriptionRegistry::new(PubSubConfig::default())
}

fn listen_args(
    callback: u64,
    origin: Option<&str>,
) -> Value {
    let mut args = vec![("receiver", Value::Callback(CallbackId(callback)))];
    if let Some(origin) = origin {
        args.push(("origin", Value::from(origin)));
    }
    Value::map(args)
}

fn post_args(
    data: Value,
    target: &str,
) -> Value {
    Value::map([("data", data), ("targetOrigin", Value::from(target))])
}

/// Тест проверяет адресацию между сервисами разных контекстов в
/// зависимости от target-origin и accept-origin.
#[rstest]
#[case("*", None, true)]
#[case("http://www.b.com", None, true)]
#[case("http://www.c.com", None, false)]
#[case("*", Some("http://www.a.com"), true)]
#[case("*", Some("http://www.z.com"), false)]
fn test_delivery_matrix(
    registry: Arc<SubscriptionRegistry>,
    #[case] target: &str,
    #[case] accept: Option<&str>,
    #[case] delivered: bool,
) {
    let a = PubSubService::attach(&registry, "http://a.com/sender");
    let b = PubSubService::attach(&registry, "http://b.com/receiver");
    let mock = Arc::new(MockTransaction::default());
    let tran: Arc<dyn Transaction> = mock.clone();

    b.invoke(ADD_LISTENER, &tran, &listen_args(3, accept)).unwrap();
    let result = a.invoke(POST_MESSAGE, &tran, &post_args(Value::from("hello"), target));
    assert_eq!(result, Ok(Value::Bool(true)));

    let calls = mock.calls.lock();
    assert_eq!(calls.len(), usize::from(delivered));
    if delivered {
        assert_eq!(calls[0].0, CallbackId(3));
        assert_eq!(calls[0].1.get("origin"), Some(&Value::from("http://www.a.com")));
    }
}

#[rstest]
#[case(Value::Callback(CallbackId(1)))]
#[case(Value::NativePath("/etc/hosts".into()))]
#[case(Value::List(vec![Value::from(1), Value::Any]))]
fn test_unsafe_data_is_refused(
    registry: Arc<SubscriptionRegistry>,
    #[case] data: Value,
) {
    let svc = PubSubService::attach(&registry, "http://a.com");
    let mock = Arc::new(MockTransaction::default());
    let tran: Arc<dyn Transaction> = mock.clone();
    svc.invoke(ADD_LISTENER, &tran, &listen_args(1, None)).unwrap();

    let err = svc.invoke(POST_MESSAGE, &tran, &post_args(data, "*")).unwrap_err();
    assert_eq!(err.host_kind(), "DataTransferError");
    assert!(mock.calls.lock().is_empty());
}

/// Тест проверяет, что ошибка транзакции получателя возвращается
/// издателю как ошибка доставки.
#[rstest]
fn test_transaction_failure_surfaces(registry: Arc<SubscriptionRegistry>) {
    let svc = PubSubService::attach(&registry, "http://a.com");
    let broken: Arc<dyn Transaction> = Arc::new(MockTransaction {
        fail_with: Some(DeliveryError::Disconnected),
        ..Default::default()
    });
    svc.invoke(ADD_LISTENER, &broken, &listen_args(1, None)).unwrap();

    let err = svc
        .invoke(POST_MESSAGE, &broken, &post_args(Value::Null, "*"))
        .unwrap_err();
    assert_eq!(err.host_kind(), "DeliveryError");
    assert!(matches!(err, ServiceError::Publish(_)));
}

#[rstest]
fn test_argument_checks(registry: Arc<SubscriptionRegistry>) {
    let svc = PubSubService::attach(&registry, "http://a.com");
    let tran: Arc<dyn Transaction> = Arc::new(MockTransaction::default());

    let missing = svc.invoke(ADD_LISTENER, &tran, &Value::map([("origin", "*")]));
    assert!(matches!(missing, Err(ServiceError::MissingArgument { name: "receiver", .. })));

    let wrong = svc.invoke(
        ADD_LISTENER,
        &tran,
        &Value::map([("receiver", Value::from("not a callback"))]),
    );
    assert!(matches!(wrong, Err(ServiceError::InvalidArgument { name: "receiver", .. })));
    assert_eq!(svc.hub().listener_count(), 0);
    assert!(registry.is_empty());
}
