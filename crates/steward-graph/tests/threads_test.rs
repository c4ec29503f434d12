mod common;

use std::sync::Arc;

use common::{CannedCompletion, ScriptedProvider};
use steward_graph::{ExchangeError, ThreadStore};
use steward_llm::{Role, ThreadMessage};
use steward_persist::{InMemoryThreadRepository, ThreadRecord, ThreadRepository};

const TENANT: &str = "tenant-a";

fn message(role: Role, text: &str) -> ThreadMessage {
    ThreadMessage {
        role,
        text: text.to_string(),
        created_at: None,
    }
}

#[tokio::test]
async fn test_new_handle_is_one_past_the_largest_numeric_handle() {
    let repository = Arc::new(InMemoryThreadRepository::new());
    for handle in ["1", "2", "5", "abc"] {
        repository
            .insert(TENANT, ThreadRecord::new(handle, format!("thread_{}", handle)))
            .await;
    }
    let store = ThreadStore::new(repository.clone(), Arc::new(ScriptedProvider::default()));

    let (handle, record) = store.resolve_or_create(TENANT, None).await.unwrap();

    assert_eq!(handle, "6");
    assert_eq!(record.display_name, "Thread 6");
    assert_eq!(record.provider_thread_id, "thread_1");
    assert!(repository.get_thread(TENANT, "6").await.unwrap().is_some());
}

#[tokio::test]
async fn test_known_handle_returns_persisted_record_unchanged() {
    let repository = Arc::new(InMemoryThreadRepository::new());
    let existing = ThreadRecord::new("3", "thread_existing");
    repository.insert(TENANT, existing.clone()).await;
    let provider = Arc::new(ScriptedProvider::default());
    let store = ThreadStore::new(repository, provider.clone());

    let (handle, record) = store.resolve_or_create(TENANT, Some("3")).await.unwrap();

    assert_eq!(handle, "3");
    assert_eq!(record, existing);
    assert!(provider.calls().is_empty());
}

#[tokio::test]
async fn test_unknown_handle_allocates_a_fresh_one() {
    let repository = Arc::new(InMemoryThreadRepository::new());
    let store = ThreadStore::new(repository, Arc::new(ScriptedProvider::default()));

    let (handle, _) = store.resolve_or_create(TENANT, Some("missing")).await.unwrap();
    assert_eq!(handle, "1");
}

#[tokio::test]
async fn test_provider_failure_persists_nothing() {
    let repository = Arc::new(InMemoryThreadRepository::new());
    let store = ThreadStore::new(
        repository.clone(),
        Arc::new(ScriptedProvider::failing_thread_creation()),
    );

    let result = store.resolve_or_create(TENANT, None).await;

    assert!(matches!(result, Err(ExchangeError::Upstream(_))));
    assert!(repository.list_threads(TENANT).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_rename_of_unknown_handle_does_not_fail() {
    let repository = Arc::new(InMemoryThreadRepository::new());
    let store = ThreadStore::new(repository.clone(), Arc::new(ScriptedProvider::default()));

    store.rename(TENANT, "42", "Nope").await.unwrap();
    assert!(repository.list_threads(TENANT).await.unwrap().is_empty());

    let (handle, _) = store.resolve_or_create(TENANT, None).await.unwrap();
    store.rename(TENANT, &handle, "Groceries").await.unwrap();
    let all = store.list_all(TENANT).await.unwrap();
    assert_eq!(all[&handle].display_name, "Groceries");
}

#[tokio::test]
async fn test_tenants_do_not_share_threads() {
    let repository = Arc::new(InMemoryThreadRepository::new());
    let store = ThreadStore::new(repository, Arc::new(ScriptedProvider::default()));

    store.resolve_or_create("alice", None).await.unwrap();
    let (bob_handle, _) = store.resolve_or_create("bob", None).await.unwrap();

    assert_eq!(bob_handle, "1");
    assert_eq!(store.list_all("alice").await.unwrap().len(), 1);
    assert!(matches!(
        store.get("carol", "1").await,
        Err(ExchangeError::ThreadNotFound(_))
    ));
}

#[tokio::test]
async fn test_auto_name_uses_the_completion_model() {
    let provider = Arc::new(ScriptedProvider::default().with_messages(vec![
        message(Role::User, "Can you plan my trip to Lisbon next week?"),
        message(Role::Assistant, "Sure."),
    ]));
    let store = ThreadStore::new(Arc::new(InMemoryThreadRepository::new()), provider)
        .with_titler(Arc::new(CannedCompletion("\"Lisbon trip\"")), "gpt-4o-mini");

    let (handle, _) = store.resolve_or_create(TENANT, None).await.unwrap();
    let record = store.auto_name(TENANT, &handle).await.unwrap();

    assert_eq!(record.display_name, "Lisbon trip");
    assert_eq!(store.get(TENANT, &handle).await.unwrap().display_name, "Lisbon trip");
}

#[tokio::test]
async fn test_auto_name_without_messages_keeps_default_name() {
    let store = ThreadStore::new(
        Arc::new(InMemoryThreadRepository::new()),
        Arc::new(ScriptedProvider::default()),
    );

    let (handle, _) = store.resolve_or_create(TENANT, None).await.unwrap();
    let record = store.auto_name(TENANT, &handle).await.unwrap();
    assert_eq!(record.display_name, "Thread 1");
}

#[tokio::test]
async fn test_messages_of_unknown_thread_are_not_found() {
    let store = ThreadStore::new(
        Arc::new(InMemoryThreadRepository::new()),
        Arc::new(ScriptedProvider::default()),
    );

    assert!(matches!(
        store.list_messages(TENANT, "7").await,
        Err(ExchangeError::ThreadNotFound(_))
    ));
}
