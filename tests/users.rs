//! End-to-end tests for the user paths over the in-memory store.

use std::collections::BTreeSet;
use std::time::Duration;

use async_trait::async_trait;

use serde_json::{json, Value};
use user_policy_store::store::InMemoryError;
use user_policy_store::{
    get_user, Backend, BackendError, InMemoryStorage, Operation, PolicyError, Request,
    RequestContext, Response, Storage, StorageEntry, UserLookup,
};

// ─────────────────────────────────────────────────────────────────────────────
// Test Helpers
// ─────────────────────────────────────────────────────────────────────────────

struct Harness {
    backend: Backend,
    storage: InMemoryStorage,
}

impl Harness {
    fn new() -> Self {
        Self {
            backend: Backend::new().unwrap(),
            storage: InMemoryStorage::new(),
        }
    }

    async fn send(&self, request: Request) -> Result<Option<Response>, BackendError> {
        self.backend
            .handle_request(&RequestContext::new(), &self.storage, &request)
            .await
    }

    async fn write(&self, name: &str, policies: &str) {
        let resp = self
            .send(Request::new(Operation::Update, format!("users/{}", name)).with_field("policies", policies))
            .await
            .unwrap();
        assert!(resp.is_none());
    }

    async fn read(&self, name: &str) -> Option<Response> {
        self.send(Request::new(Operation::Read, format!("users/{}", name)))
            .await
            .unwrap()
    }

    async fn list(&self) -> Vec<String> {
        self.send(Request::new(Operation::List, "users/"))
            .await
            .unwrap()
            .and_then(|resp| resp.keys())
            .unwrap()
    }
}

fn policies(resp: &Response) -> Vec<String> {
    resp.get("policies")
        .and_then(Value::as_array)
        .unwrap()
        .iter()
        .map(|v| v.as_str().unwrap().to_string())
        .collect()
}

// ─────────────────────────────────────────────────────────────────────────────
// Round trip and replacement
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_write_then_read_round_trip() {
    let h = Harness::new();
    h.write("alice", "dev,ops").await;

    let resp = h.read("alice").await.unwrap();
    assert_eq!(policies(&resp), vec!["dev", "ops"]);
}

#[tokio::test]
async fn test_second_write_replaces() {
    let h = Harness::new();
    h.write("alice", "dev,ops").await;
    h.write("alice", "audit").await;

    let resp = h.read("alice").await.unwrap();
    assert_eq!(policies(&resp), vec!["audit"]);
}

#[tokio::test]
async fn test_duplicates_are_removed() {
    let h = Harness::new();
    h.write("alice", "admin,readonly,admin").await;

    let resp = h.read("alice").await.unwrap();
    assert_eq!(policies(&resp), vec!["admin", "readonly"]);
}

#[tokio::test]
async fn test_policies_as_json_list() {
    let h = Harness::new();
    h.send(
        Request::new(Operation::Update, "users/alice")
            .with_field("policies", json!(["Ops", "dev", "ops"])),
    )
    .await
    .unwrap();

    let resp = h.read("alice").await.unwrap();
    assert_eq!(policies(&resp), vec!["dev", "ops"]);
}

// ─────────────────────────────────────────────────────────────────────────────
// Absent versus empty
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_read_unknown_user_is_none() {
    let h = Harness::new();
    assert!(h.read("nobody").await.is_none());
}

#[tokio::test]
async fn test_empty_record_is_distinct_from_absent() {
    let h = Harness::new();
    h.send(Request::new(Operation::Update, "users/empty"))
        .await
        .unwrap();

    let resp = h.read("empty").await.unwrap();
    assert!(policies(&resp).is_empty());

    let ctx = RequestContext::new();
    assert_eq!(get_user(&ctx, &h.storage, "empty").await.unwrap(), UserLookup::Empty);
    assert_eq!(get_user(&ctx, &h.storage, "nobody").await.unwrap(), UserLookup::NotFound);
}

// ─────────────────────────────────────────────────────────────────────────────
// Delete and list
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_delete_unknown_user_succeeds() {
    let h = Harness::new();
    let resp = h
        .send(Request::new(Operation::Delete, "users/ghost"))
        .await
        .unwrap();
    assert!(resp.is_none());
}

#[tokio::test]
async fn test_delete_removes_user() {
    let h = Harness::new();
    h.write("alice", "dev").await;
    h.send(Request::new(Operation::Delete, "users/alice"))
        .await
        .unwrap();

    assert!(h.read("alice").await.is_none());
    assert!(h.list().await.is_empty());
}

#[tokio::test]
async fn test_list_returns_written_names() {
    let h = Harness::new();
    h.write("bob", "dev").await;
    h.write("alice", "").await;

    let names: BTreeSet<String> = h.list().await.into_iter().collect();
    let expected: BTreeSet<String> = ["alice", "bob"].iter().map(|s| s.to_string()).collect();
    assert_eq!(names, expected);
}

#[tokio::test]
async fn test_list_is_sorted_and_ignores_other_prefixes() {
    let h = Harness::new();
    for name in ["carol", "alice", "bob"] {
        h.write(name, "dev").await;
    }
    h.storage
        .put(StorageEntry::new("config/default", b"{}".to_vec()))
        .await
        .unwrap();

    assert_eq!(h.list().await, vec!["alice", "bob", "carol"]);

    let resp = h.send(Request::new(Operation::List, "users")).await.unwrap().unwrap();
    assert_eq!(resp.keys().unwrap().len(), 3);
}

#[tokio::test]
async fn test_names_with_slashes() {
    let h = Harness::new();
    h.write("team/alice", "dev").await;

    assert_eq!(policies(&h.read("team/alice").await.unwrap()), vec!["dev"]);
    assert_eq!(h.list().await, vec!["team/alice"]);
}

// ─────────────────────────────────────────────────────────────────────────────
// Errors
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_reserved_policy_rejected_and_nothing_written() {
    let h = Harness::new();
    let err = h
        .send(Request::new(Operation::Update, "users/alice").with_field("policies", "dev,root"))
        .await
        .unwrap_err();

    assert!(matches!(err, BackendError::Policy(PolicyError::Reserved(_))));
    assert!(err.is_request_error());
    assert!(h.storage.is_empty());
}

#[tokio::test]
async fn test_invalid_policy_name_rejected() {
    let h = Harness::new();
    let err = h
        .send(Request::new(Operation::Update, "users/alice").with_field("policies", "dev;drop"))
        .await
        .unwrap_err();

    assert!(matches!(err, BackendError::Policy(PolicyError::InvalidCharacter { found: ';', .. })));
}

#[tokio::test]
async fn test_unknown_path() {
    let h = Harness::new();
    let err = h
        .send(Request::new(Operation::Read, "groups/admins"))
        .await
        .unwrap_err();
    assert!(matches!(err, BackendError::UnsupportedPath(p) if p == "groups/admins"));
}

#[tokio::test]
async fn test_unsupported_operation() {
    let h = Harness::new();

    let err = h.send(Request::new(Operation::List, "users/alice")).await.unwrap_err();
    assert!(matches!(
        err,
        BackendError::UnsupportedOperation { operation: Operation::List, .. }
    ));

    let err = h.send(Request::new(Operation::Read, "users/")).await.unwrap_err();
    assert!(matches!(err, BackendError::UnsupportedOperation { .. }));
}

#[tokio::test]
async fn test_storage_failure_propagates() {
    let h = Harness::new();
    h.write("alice", "dev").await;
    h.storage.set_unavailable(true);

    for request in [
        Request::new(Operation::List, "users/"),
        Request::new(Operation::Read, "users/alice"),
        Request::new(Operation::Update, "users/alice").with_field("policies", "ops"),
        Request::new(Operation::Delete, "users/alice"),
    ] {
        let err = h.send(request).await.unwrap_err();
        assert!(matches!(err, BackendError::Storage(_)));
        assert!(!err.is_request_error());
    }
}

#[tokio::test]
async fn test_cancelled_context_skips_storage() {
    let h = Harness::new();
    let ctx = RequestContext::new();
    ctx.cancel();

    let err = h
        .backend
        .handle_request(&ctx, &h.storage, &Request::new(Operation::Delete, "users/alice"))
        .await
        .unwrap_err();
    assert!(matches!(err, BackendError::Cancelled));
}

// ─────────────────────────────────────────────────────────────────────────────
// Cancellation during a storage call
// ─────────────────────────────────────────────────────────────────────────────

/// Storage that waits before delegating each call.
struct SlowStorage {
    inner: InMemoryStorage,
    delay: Duration,
}

#[async_trait]
impl Storage for SlowStorage {
    type Error = InMemoryError;

    async fn get(&self, key: &str) -> Result<Option<StorageEntry>, Self::Error> {
        tokio::time::sleep(self.delay).await;
        self.inner.get(key).await
    }

    async fn put(&self, entry: StorageEntry) -> Result<(), Self::Error> {
        tokio::time::sleep(self.delay).await;
        self.inner.put(entry).await
    }

    async fn delete(&self, key: &str) -> Result<(), Self::Error> {
        tokio::time::sleep(self.delay).await;
        self.inner.delete(key).await
    }

    async fn list(&self, prefix: &str) -> Result<Vec<String>, Self::Error> {
        tokio::time::sleep(self.delay).await;
        self.inner.list(prefix).await
    }
}

async fn send_cancelled_mid_call(
    storage: &SlowStorage,
    request: Request,
) -> Result<Option<Response>, BackendError> {
    let backend = Backend::new().unwrap();
    let ctx = RequestContext::new();
    let handle = ctx.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        handle.cancel();
    });
    backend.handle_request(&ctx, storage, &request).await
}

fn slow() -> SlowStorage {
    SlowStorage {
        inner: InMemoryStorage::new(),
        delay: Duration::from_millis(500),
    }
}

#[tokio::test]
async fn test_write_cancelled_mid_call_stores_nothing() {
    let storage = slow();
    let err = send_cancelled_mid_call(
        &storage,
        Request::new(Operation::Update, "users/alice").with_field("policies", "dev"),
    )
    .await
    .unwrap_err();

    assert!(matches!(err, BackendError::Cancelled));
    assert!(storage.inner.raw("user/alice").is_none());
}

#[tokio::test]
async fn test_delete_cancelled_mid_call_keeps_record() {
    let storage = slow();
    storage
        .inner
        .put(StorageEntry::new("user/alice", br#"{"Policies":["dev"]}"#.to_vec()))
        .await
        .unwrap();

    let err = send_cancelled_mid_call(&storage, Request::new(Operation::Delete, "users/alice"))
        .await
        .unwrap_err();

    assert!(matches!(err, BackendError::Cancelled));
    assert!(storage.inner.raw("user/alice").is_some());
}

#[tokio::test]
async fn test_read_and_list_cancelled_mid_call() {
    let storage = slow();

    for request in [
        Request::new(Operation::Read, "users/alice"),
        Request::new(Operation::List, "users/"),
    ] {
        let err = send_cancelled_mid_call(&storage, request).await.unwrap_err();
        assert!(matches!(err, BackendError::Cancelled));
    }
}

#[tokio::test]
async fn test_slow_storage_completes_without_cancel() {
    let storage = SlowStorage {
        inner: InMemoryStorage::new(),
        delay: Duration::from_millis(5),
    };
    let backend = Backend::new().unwrap();
    let ctx = RequestContext::new();

    let req = Request::new(Operation::Update, "users/alice").with_field("policies", "dev");
    assert!(backend.handle_request(&ctx, &storage, &req).await.unwrap().is_none());
    assert!(storage.inner.raw("user/alice").is_some());
}
