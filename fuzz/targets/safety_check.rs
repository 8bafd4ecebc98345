#![no_main]

use libfuzzer_sys::fuzz_target;
use postbox::{
    pubsub::{find_unsafe, is_safe_to_publish, receiver_fn},
    value::to_json,
    Hub, Origin, OriginFilter, PubSubConfig, PublishError, SubscriptionRegistry, Value,
};

fuzz_target!(|value: Value| {
    let safe = is_safe_to_publish(&value);

    // Обе проверки должны совпадать.
    assert_eq!(safe, find_unsafe(&value).is_none());

    // Непередаваемое значение не кодируется в JSON.
    if !safe {
        assert!(to_json(&value).is_err());
    }

    let registry = SubscriptionRegistry::new(PubSubConfig::default());
    let hub = Hub::with_origin(&registry, Origin::new("http://www.fuzz.com"));
    hub.subscribe(
        receiver_fn(|env| {
            assert!(is_safe_to_publish(env.data()));
            Ok(())
        }),
        OriginFilter::Any,
    );

    match hub.publish(&value, &OriginFilter::Any) {
        Ok(delivery) => assert!(safe && delivery.listeners == 1),
        Err(PublishError::DataTransfer { .. }) => assert!(!safe),
        Err(PublishError::PayloadTooDeep { .. }) => {}
        Err(e) => panic!("unexpected publish error: {e}"),
    }
});
