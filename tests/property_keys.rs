#![cfg(unix)]

use std::collections::BTreeSet;
use std::time::Duration;

use proptest::prelude::*;
use multitask::engine::Orchestrator;
use multitask_test_utils::fast_options;

// Distinct keys; each command prints its own key so outputs can be checked
// against the key set.
fn key_set_strategy() -> impl Strategy<Value = BTreeSet<String>> {
    proptest::collection::btree_set("[a-z]{1,8}", 1..6)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(8))]

    #[test]
    fn every_key_comes_back_with_its_own_output(keys in key_set_strategy()) {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();

        let (outputs, errors) = runtime.block_on(async {
            let commands = keys
                .iter()
                .map(|k| (k.clone(), format!("printf '%s' {k}")));
            let mut orch = Orchestrator::new(commands, fast_options(Duration::from_secs(5)));
            let outputs = orch.run().await;
            (outputs, orch.errors())
        });

        let output_keys: BTreeSet<String> = outputs.keys().cloned().collect();
        let error_keys: BTreeSet<String> = errors.keys().cloned().collect();
        prop_assert_eq!(&output_keys, &keys);
        prop_assert_eq!(&error_keys, &keys);

        for (key, text) in &outputs {
            prop_assert_eq!(text, key);
        }
        prop_assert!(errors.values().all(String::is_empty));
    }
}
