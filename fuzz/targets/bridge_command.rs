#![no_main]

use libfuzzer_sys::fuzz_target;
use postbox::{bridge::Bridge, PubSubConfig, SubscriptionRegistry};

fuzz_target!(|data: &[u8]| {
    // Мост не должен паниковать ни на каком входе.
    let registry = SubscriptionRegistry::new(PubSubConfig::default());
    let mut bridge = Bridge::new(registry, std::io::sink());
    let _ = bridge.run(data);
});
