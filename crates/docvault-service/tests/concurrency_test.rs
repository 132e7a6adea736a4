//! Concurrent uploads to one document never share a version number.

mod common;

use std::collections::HashSet;

use futures::future::join_all;

use common::Harness;
use docvault_core::config::VersioningConfig;
use docvault_core::types::DocumentId;
use docvault_entity::version::Version;
use docvault_service::UploadRequest;

async fn upload_concurrently(h: &Harness, doc: DocumentId, n: usize) -> Vec<Version> {
    let tasks = (0..n).map(|i| {
        let service = h.service.clone();
        let ctx = h.ctx.clone();
        tokio::spawn(async move {
            service
                .upload_version(
                    &ctx,
                    doc,
                    UploadRequest::from_bytes(format!("part{i}.bin"), None, vec![i as u8; 64]),
                )
                .await
        })
    });

    join_all(tasks)
        .await
        .into_iter()
        .map(|joined| joined.unwrap().unwrap())
        .collect()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_two_concurrent_uploads_after_three() {
    let h = Harness::new().await;
    let doc = h.document().await;
    for i in 0..3 {
        h.upload(doc, &format!("seed{i}.txt"), "seed").await.unwrap();
    }

    let versions = upload_concurrently(&h, doc, 2).await;
    let numbers: HashSet<i32> = versions.iter().map(|v| v.version_number).collect();
    assert_eq!(numbers, HashSet::from([4, 5]));
    assert_eq!(h.blob_files().len(), 5);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_n_concurrent_uploads_have_no_gaps_or_duplicates() {
    const N: usize = 8;
    let h = Harness::with_versioning(VersioningConfig {
        max_allocation_attempts: N as u32,
        retry_backoff_ms: 1,
    })
    .await;
    let doc = h.document().await;

    let versions = upload_concurrently(&h, doc, N).await;

    let mut numbers: Vec<i32> = versions.iter().map(|v| v.version_number).collect();
    numbers.sort_unstable();
    assert_eq!(numbers, (1..=N as i32).collect::<Vec<_>>());

    let keys: HashSet<&str> = versions.iter().map(|v| v.storage_key.as_str()).collect();
    assert_eq!(keys.len(), N);

    let on_disk = h.blob_files();
    assert_eq!(on_disk.len(), N);
    for version in &versions {
        assert!(on_disk.contains(&version.storage_key));
        assert!(
            version
                .storage_key
                .contains(&format!("_v{}_", version.version_number))
        );
    }

    let listed: Vec<i32> = h
        .service
        .list_versions(doc)
        .await
        .unwrap()
        .iter()
        .map(|v| v.version_number)
        .collect();
    assert_eq!(listed, (1..=N as i32).rev().collect::<Vec<_>>());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_uploads_to_different_documents_are_independent() {
    let h = Harness::new().await;
    let first = h.document().await;
    let second = h.document().await;

    let (a, b) = tokio::join!(
        upload_concurrently(&h, first, 3),
        upload_concurrently(&h, second, 3)
    );

    let mut a: Vec<i32> = a.iter().map(|v| v.version_number).collect();
    let mut b: Vec<i32> = b.iter().map(|v| v.version_number).collect();
    a.sort_unstable();
    b.sort_unstable();
    assert_eq!(a, vec![1, 2, 3]);
    assert_eq!(b, vec![1, 2, 3]);
    assert_eq!(h.blob_files().len(), 6);
}
