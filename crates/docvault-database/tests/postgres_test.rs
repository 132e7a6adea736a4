//! PostgreSQL repository tests.
//!
//! These run against a real database and only when
//! `DOCVAULT_TEST_DATABASE_URL` is set; otherwise each test returns early.

use docvault_core::config::DatabaseConfig;
use docvault_core::error::ErrorKind;
use docvault_core::types::{DocumentId, UserId};
use docvault_database::migration::run_migrations;
use docvault_database::{
    DatabasePool, DocumentDirectory, PgDocumentRepository, PgVersionRepository,
    VersionRecordStore,
};
use docvault_entity::version::NewVersion;

async fn postgres_or_skip() -> Option<DatabasePool> {
    let Ok(url) = std::env::var("DOCVAULT_TEST_DATABASE_URL") else {
        eprintln!("Skipping PostgreSQL test: DOCVAULT_TEST_DATABASE_URL not set");
        return None;
    };
    let config = DatabaseConfig {
        url,
        max_connections: 4,
        min_connections: 1,
        ..DatabaseConfig::default()
    };
    let pool = DatabasePool::connect(&config)
        .await
        .expect("connect to test database");
    run_migrations(pool.pool()).await.expect("run migrations");
    Some(pool)
}

fn new_version(document_id: DocumentId, number: i32) -> NewVersion {
    NewVersion {
        document_id,
        version_number: number,
        storage_key: format!("doc_{document_id}_v{number}_{}", uuid_token()),
        file_name: "drawing.dwg".to_string(),
        file_size_bytes: 42,
        mime_type: Some("application/acad".to_string()),
        uploaded_by: UserId::new(),
    }
}

fn uuid_token() -> String {
    DocumentId::new().to_string().replace('-', "")
}

#[tokio::test]
async fn test_version_lifecycle() {
    let Some(db) = postgres_or_skip().await else {
        return;
    };
    let documents = PgDocumentRepository::new(db.pool().clone());
    let versions = PgVersionRepository::new(db.pool().clone());

    let doc = documents.create("Bracket assembly").await.unwrap();
    assert!(documents.exists(doc.id).await.unwrap());
    assert_eq!(versions.max_version_number(doc.id).await.unwrap(), None);

    let v1 = versions.create(&new_version(doc.id, 1)).await.unwrap();
    let v2 = versions.create(&new_version(doc.id, 2)).await.unwrap();

    let listed = versions.list_by_document(doc.id).await.unwrap();
    assert_eq!(
        listed.iter().map(|v| v.version_number).collect::<Vec<_>>(),
        vec![2, 1]
    );
    assert_eq!(versions.max_version_number(doc.id).await.unwrap(), Some(2));
    assert_eq!(versions.find_latest(doc.id).await.unwrap().unwrap().id, v2.id);
    assert_eq!(versions.find_by_id(v1.id).await.unwrap().unwrap(), v1);

    assert!(documents.delete(doc.id).await.unwrap());
    assert!(versions.find_by_id(v1.id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_duplicate_version_number_is_conflict() {
    let Some(db) = postgres_or_skip().await else {
        return;
    };
    let documents = PgDocumentRepository::new(db.pool().clone());
    let versions = PgVersionRepository::new(db.pool().clone());

    let doc = documents.create("Race").await.unwrap();
    versions.create(&new_version(doc.id, 1)).await.unwrap();
    let err = versions.create(&new_version(doc.id, 1)).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Conflict);

    assert_eq!(versions.delete_by_document(doc.id).await.unwrap().len(), 1);
    documents.delete(doc.id).await.unwrap();
}

#[tokio::test]
async fn test_insert_errors_match_memory_store() {
    let Some(db) = postgres_or_skip().await else {
        return;
    };
    let documents = PgDocumentRepository::new(db.pool().clone());
    let versions = PgVersionRepository::new(db.pool().clone());

    let err = versions
        .create(&new_version(DocumentId::new(), 1))
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::DocumentNotFound);

    let doc = documents.create("Shared key").await.unwrap();
    let first = new_version(doc.id, 1);
    let mut second = new_version(doc.id, 2);
    second.storage_key = first.storage_key.clone();
    versions.create(&first).await.unwrap();
    let err = versions.create(&second).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Conflict);

    let removed = versions.delete_by_document(doc.id).await.unwrap();
    assert_eq!(removed.len(), 1);
    assert_eq!(removed[0].storage_key, first.storage_key);
    documents.delete(doc.id).await.unwrap();
}
