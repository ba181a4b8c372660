use std::sync::Arc;
use std::thread;

use netdev_store::{DeviceInfo, FixedClock, LogStore};
use tempfile::{tempdir, TempDir};

const STAMP: &str = "2024-01-02 03:04:05";

fn store_in(dir: &TempDir) -> LogStore {
    LogStore::with_clock(
        dir.path().join("network_devices.log"),
        Arc::new(FixedClock(STAMP.to_string())),
    )
    .unwrap()
}

fn device(name: &str) -> DeviceInfo {
    DeviceInfo::new(name, "Router", "10.0.0.1", "Static")
}

fn lines(store: &LogStore) -> Vec<String> {
    String::from_utf8(store.read().unwrap())
        .unwrap()
        .lines()
        .map(str::to_string)
        .collect()
}

#[test]
fn append_one_writes_formatted_line() {
    let dir = tempdir().unwrap();
    let store = store_in(&dir);

    let record = store.append_one(device("R1")).unwrap();

    assert_eq!(record.timestamp, STAMP);
    assert_eq!(
        String::from_utf8(store.read().unwrap()).unwrap(),
        "[2024-01-02 03:04:05] Пристрій: R1, Тип: Router, IP: 10.0.0.1, Маршрутизація: Static\n"
    );
}

#[test]
fn append_many_keeps_prior_content_and_order() {
    let dir = tempdir().unwrap();
    let store = store_in(&dir);
    store.append_one(device("first")).unwrap();

    let count = store
        .append_many(vec![device("second"), device("third")])
        .unwrap();

    assert_eq!(count, 2);
    let lines = lines(&store);
    assert_eq!(lines.len(), 3);
    assert!(lines[0].contains("Пристрій: first,"));
    assert!(lines[1].contains("Пристрій: second,"));
    assert!(lines[2].contains("Пристрій: third,"));
}

#[test]
fn replace_all_leaves_exactly_the_new_records() {
    let dir = tempdir().unwrap();
    let store = store_in(&dir);
    store
        .append_many(vec![device("a"), device("b"), device("c")])
        .unwrap();

    let count = store.replace_all(vec![device("x"), device("y")]).unwrap();

    assert_eq!(count, 2);
    let lines = lines(&store);
    assert_eq!(lines.len(), 2);
    assert!(lines[0].contains("Пристрій: x,"));
    assert!(lines[1].contains("Пристрій: y,"));
}

#[test]
fn replace_all_with_no_records_empties_the_log() {
    let dir = tempdir().unwrap();
    let store = store_in(&dir);
    store.append_one(device("a")).unwrap();

    assert_eq!(store.replace_all(Vec::new()).unwrap(), 0);
    assert!(store.read().unwrap().is_empty());
}

#[test]
fn clear_is_idempotent() {
    let dir = tempdir().unwrap();
    let store = store_in(&dir);
    store.append_one(device("a")).unwrap();

    store.clear().unwrap();
    store.clear().unwrap();

    assert!(store.read().unwrap().is_empty());
}

#[test]
fn duplicates_are_kept() {
    let dir = tempdir().unwrap();
    let store = store_in(&dir);

    store.append_one(device("dup")).unwrap();
    store.append_one(device("dup")).unwrap();

    let lines = lines(&store);
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0], lines[1]);
}

#[test]
fn concurrent_appends_never_interleave() {
    let dir = tempdir().unwrap();
    let store = Arc::new(store_in(&dir));

    let handles: Vec<_> = (0..8)
        .map(|worker| {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                for seq in 0..25 {
                    store
                        .append_one(device(&format!("worker-{worker}-{seq}")))
                        .unwrap();
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    let lines = lines(&store);
    assert_eq!(lines.len(), 200);
    for line in &lines {
        assert!(line.starts_with("[2024-01-02 03:04:05] Пристрій: worker-"), "{line}");
        assert!(line.ends_with(", Тип: Router, IP: 10.0.0.1, Маршрутизація: Static"), "{line}");
    }
}
