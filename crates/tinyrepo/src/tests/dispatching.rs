//! Dynamic dispatch of fixed operations and usage errors.

use std::sync::Arc;

use serde_json::{Value, json};

use super::row;
use crate::error::Error;
use crate::memory::MemoryBackend;
use crate::repository::{Repository, RepositoryOptions};

fn empty_repository() -> (Repository, MemoryBackend) {
    let backend = MemoryBackend::new();
    (Repository::new(Arc::new(backend.clone())), backend)
}

#[tokio::test]
async fn unknown_method_is_not_implemented() {
    let (repo, _) = empty_repository();
    let error = repo.invoke("bogusMethod", vec![]).await.unwrap_err();
    assert_eq!(error.code(), "METHOD_NOT_IMPLEMENTED");
    match error {
        Error::MethodNotImplemented { name } => assert_eq!(name, "bogusMethod"),
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn finder_arity_is_validated() {
    let (repo, _) = empty_repository();
    let error = repo
        .invoke("findByEmailAndStatus", vec![json!("a@x.com")])
        .await
        .unwrap_err();
    match error {
        Error::ArgumentCountMismatch {
            expected, received, ..
        } => {
            assert_eq!(expected, 2);
            assert_eq!(received, 1);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn create_and_read_back() {
    let (repo, _) = empty_repository();
    let created = repo
        .invoke(
            "create",
            vec![json!({ "id": 1, "email": "a@x.com", "status": "active" })],
        )
        .await
        .unwrap();
    assert_eq!(created["email"], json!("a@x.com"));

    let all = repo.invoke("findAll", vec![]).await.unwrap();
    assert_eq!(all.as_array().map(Vec::len), Some(1));

    let by_id = repo.invoke("findById", vec![json!(1)]).await.unwrap();
    assert_eq!(by_id["email"], json!("a@x.com"));

    let missing = repo.invoke("findById", vec![json!(99)]).await.unwrap();
    assert_eq!(missing, Value::Null);
}

#[tokio::test]
async fn update_and_delete_by_id() {
    let (repo, _) = empty_repository();
    repo.invoke("create", vec![json!({ "id": 1, "status": "new" })])
        .await
        .unwrap();

    let updated = repo
        .invoke("update", vec![json!(1), json!({ "status": "active" })])
        .await
        .unwrap();
    assert_eq!(updated["status"], json!("active"));

    let gone = repo.invoke("delete", vec![json!(1)]).await.unwrap();
    assert_eq!(gone["id"], json!(1));
    assert_eq!(repo.invoke("findAll", vec![]).await.unwrap(), json!([]));
}

#[tokio::test]
async fn save_routes_on_primary_key_presence() {
    let (repo, _) = empty_repository();
    // No id: save creates.
    let created = repo
        .invoke("save", vec![json!({ "email": "a@x.com" })])
        .await
        .unwrap();
    assert_eq!(created["email"], json!("a@x.com"));

    repo.invoke("create", vec![json!({ "id": 7, "status": "new" })])
        .await
        .unwrap();
    // With id: save updates that row.
    let saved = repo
        .invoke("save", vec![json!({ "id": 7, "status": "active" })])
        .await
        .unwrap();
    assert_eq!(saved["status"], json!("active"));
}

#[tokio::test]
async fn criteria_operations_count_and_filter() {
    let (repo, _) = empty_repository();
    for i in 0..3 {
        let status = if i < 2 { "active" } else { "blocked" };
        repo.invoke("create", vec![json!({ "id": i, "status": status })])
            .await
            .unwrap();
    }

    let total = repo.invoke("count", vec![]).await.unwrap();
    assert_eq!(total, json!(3));

    let active = repo
        .invoke("count", vec![json!({ "status": "active" })])
        .await
        .unwrap();
    assert_eq!(active, json!(2));

    let exists = repo
        .invoke("exists", vec![json!({ "status": "blocked" })])
        .await
        .unwrap();
    assert_eq!(exists, json!(true));
    let exists = repo
        .invoke("exists", vec![json!({ "status": "archived" })])
        .await
        .unwrap();
    assert_eq!(exists, json!(false));

    let updated = repo
        .invoke(
            "updateMany",
            vec![json!({ "status": "active" }), json!({ "status": "paused" })],
        )
        .await
        .unwrap();
    assert_eq!(updated, json!({ "count": 2 }));

    let deleted = repo
        .invoke("deleteMany", vec![json!({ "status": "paused" })])
        .await
        .unwrap();
    assert_eq!(deleted, json!({ "count": 2 }));
    assert_eq!(repo.invoke("count", vec![]).await.unwrap(), json!(1));
}

#[tokio::test]
async fn query_cannot_travel_through_the_dynamic_surface() {
    let (repo, _) = empty_repository();
    let error = repo.invoke("query", vec![]).await.unwrap_err();
    assert_eq!(error.code(), "INVALID_ARGUMENT");
}

#[tokio::test]
async fn base_operations_validate_argument_counts() {
    let (repo, _) = empty_repository();
    let error = repo.invoke("findById", vec![]).await.unwrap_err();
    assert_eq!(error.code(), "ARGUMENT_COUNT_MISMATCH");

    let error = repo
        .invoke("findAll", vec![json!(1)])
        .await
        .unwrap_err();
    assert_eq!(error.code(), "ARGUMENT_COUNT_MISMATCH");
}

#[tokio::test]
async fn malformed_records_are_invalid_arguments() {
    let (repo, _) = empty_repository();
    let error = repo.invoke("create", vec![json!(42)]).await.unwrap_err();
    assert_eq!(error.code(), "INVALID_ARGUMENT");
}

#[test]
fn construction_validates_options() {
    let backend = Arc::new(MemoryBackend::new());
    let error = Repository::with_options(
        backend.clone(),
        RepositoryOptions {
            chunk_size: 0,
            ..RepositoryOptions::default()
        },
    )
    .unwrap_err();
    assert_eq!(error.code(), "INVALID_ARGUMENT");

    let error = Repository::with_options(
        backend,
        RepositoryOptions {
            primary_key: String::new(),
            ..RepositoryOptions::default()
        },
    )
    .unwrap_err();
    assert_eq!(error.code(), "INVALID_ARGUMENT");
}

#[tokio::test]
async fn custom_primary_key_column() {
    let backend = Arc::new(MemoryBackend::seeded(vec![row(&[
        ("user_id", json!("u-1")),
        ("email", json!("a@x.com")),
    ])]));
    let repo = Repository::with_options(
        backend,
        RepositoryOptions {
            primary_key: "user_id".to_string(),
            ..RepositoryOptions::default()
        },
    )
    .unwrap();
    let found = repo.invoke("findById", vec![json!("u-1")]).await.unwrap();
    assert_eq!(found["email"], json!("a@x.com"));
}

#[tokio::test]
async fn backend_errors_propagate_unmodified() {
    // The memory backend rejects the raw escape hatch; the error arrives
    // with the backend code and its own message, unwrapped.
    let backend = MemoryBackend::new();
    let error = crate::QueryBackend::raw(&backend, "SELECT * FROM users", Vec::new())
        .await
        .unwrap_err();
    assert_eq!(error.code(), "BACKEND");
    assert!(error.to_string().contains("raw statements"));
}
