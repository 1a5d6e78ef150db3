//! Property-based tests for the state store contract

use paneline::{MemoryStateStore, SledStateStore, StateStore};
use proptest::prelude::*;
use std::time::Duration;
use tempfile::TempDir;

fn key_part() -> impl Strategy<Value = String> {
    "[a-z$%./]{0,12}"
}

proptest! {
    #[test]
    fn test_memory_set_then_get_round_trips(
        loc in key_part(),
        inst in key_part(),
        op in key_part(),
        value in any::<String>(),
    ) {
        let store = MemoryStateStore::new();
        store.set(&loc.clone().into(), &inst.clone().into(), &op.clone().into(), &value).unwrap();
        prop_assert_eq!(store.get(&loc.into(), &inst.into(), &op.into()).unwrap(), value);
    }

    #[test]
    fn test_memory_unset_key_reads_empty(
        loc in key_part(),
        inst in key_part(),
        op in key_part(),
        other in key_part(),
    ) {
        prop_assume!(other != op);
        let store = MemoryStateStore::new();
        store.set(&loc.clone().into(), &inst.clone().into(), &other.into(), "x").unwrap();
        prop_assert_eq!(store.get(&loc.into(), &inst.into(), &op.into()).unwrap(), "");
    }

    #[test]
    fn test_last_write_wins(values in prop::collection::vec(any::<String>(), 1..8)) {
        let store = MemoryStateStore::new();
        for value in &values {
            store.set(&"pane".into(), &"1".into(), &"vim".into(), value).unwrap();
        }
        prop_assert_eq!(
            store.get(&"pane".into(), &"1".into(), &"vim".into()).unwrap(),
            values.last().cloned().unwrap_or_default()
        );
    }
}

/// Round-trip through sled with a single shared database to keep the case count cheap.
#[test]
fn test_sled_set_then_get_round_trips() {
    let dir = TempDir::new().unwrap();
    let store = SledStateStore::open(dir.path(), Duration::from_secs(2)).unwrap();
    let mut runner = proptest::test_runner::TestRunner::new(ProptestConfig::with_cases(64));

    runner
        .run(
            &(key_part(), key_part(), key_part(), any::<String>()),
            |(loc, inst, op, value)| {
                store
                    .set(&loc.clone().into(), &inst.clone().into(), &op.clone().into(), &value)
                    .unwrap();
                prop_assert_eq!(
                    store.get(&loc.into(), &inst.into(), &op.into()).unwrap(),
                    value
                );
                Ok(())
            },
        )
        .unwrap();
}
