// Integration tests for the file storage engine through the Storage trait
//
// Engines are only ever used as Arc<dyn Storage>, so these tests go through
// the trait object rather than the concrete type.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use tempfile::TempDir;

use caddy_storage::{FileStorage, Storage, StorageError};

fn engine(dir: &TempDir) -> Arc<dyn Storage> {
    Arc::new(
        FileStorage::new(dir.path().to_string_lossy().into_owned())
            .with_lock_poll_interval(Duration::from_millis(5))
            .with_lock_timeout(Duration::from_millis(200)),
    )
}

#[test]
fn test_values_persist_across_engine_instances() {
    let dir = TempDir::new().unwrap();
    engine(&dir).store("acme/account.json", br#"{"id":1}"#).unwrap();

    let reopened = engine(&dir);
    assert!(reopened.exists("acme/account.json"));
    assert_eq!(reopened.load("acme/account.json").unwrap(), br#"{"id":1}"#);
}

#[test]
fn test_lock_blocks_other_threads() {
    let dir = TempDir::new().unwrap();
    let storage = engine(&dir);
    storage.lock("issue_cert_example.com").unwrap();

    let contender = Arc::clone(&storage);
    let blocked = thread::spawn(move || contender.lock("issue_cert_example.com"))
        .join()
        .unwrap();
    assert!(matches!(blocked, Err(StorageError::LockTimeout { .. })));

    storage.unlock("issue_cert_example.com").unwrap();

    let contender = Arc::clone(&storage);
    let acquired = thread::spawn(move || contender.lock("issue_cert_example.com"))
        .join()
        .unwrap();
    assert!(acquired.is_ok());
    storage.unlock("issue_cert_example.com").unwrap();
}

#[test]
fn test_waiting_lock_acquires_after_release() {
    let dir = TempDir::new().unwrap();
    let holder = engine(&dir);
    holder.lock("renew").unwrap();

    let waiter: Arc<dyn Storage> = Arc::new(
        FileStorage::new(dir.path().to_string_lossy().into_owned())
            .with_lock_poll_interval(Duration::from_millis(5))
            .with_lock_timeout(Duration::from_secs(10)),
    );
    let handle = thread::spawn(move || waiter.lock("renew"));

    thread::sleep(Duration::from_millis(50));
    holder.unlock("renew").unwrap();

    assert!(handle.join().unwrap().is_ok());
}

#[test]
fn test_distinct_keys_lock_independently() {
    let dir = TempDir::new().unwrap();
    let storage = engine(&dir);

    storage.lock("a.example.com").unwrap();
    storage.lock("b.example.com").unwrap();
    storage.unlock("a.example.com").unwrap();
    storage.unlock("b.example.com").unwrap();
}

#[test]
fn test_stat_reports_size_and_kind() {
    let dir = TempDir::new().unwrap();
    let storage = engine(&dir);
    storage.store("certs/site.key", &[0u8; 32]).unwrap();

    let info = storage.stat("certs/site.key").unwrap();
    assert_eq!(info.size, 32);
    assert!(info.is_terminal);
    assert!(!storage.stat("certs").unwrap().is_terminal);
    assert!(storage.stat("certs/missing").unwrap_err().is_not_found());
}
