//! Integration tests for the sample store
//!
//! Tests cover:
//! - Random selection only draws unreviewed records
//! - Label updates write nested fields under dotted paths
//! - Obstruction bypasses labels and retires the record
//! - Updates never create records and apply at most once

use std::collections::HashSet;
use trafficnet_common::db::{init_database, LabelUpdate, ReviewStatus, SampleStore};

async fn setup_store() -> SampleStore {
    let pool = init_database("sqlite::memory:", "testingSamples")
        .await
        .expect("Should open in-memory database");
    SampleStore::new(pool, "testingSamples").expect("Valid collection name")
}

fn full_update(reviewer: &str) -> LabelUpdate {
    LabelUpdate {
        reviewer: reviewer.to_string(),
        fields: vec![
            ("labels.precipitation".to_string(), "rain".to_string()),
            ("labels.congestion.leftLane".to_string(), "congested".to_string()),
            ("labels.congestion.centerLane".to_string(), "unclear".to_string()),
            ("labels.congestion.rightLane".to_string(), "vacant".to_string()),
        ],
    }
}

#[tokio::test]
async fn test_random_unreviewed_on_empty_collection() {
    let store = setup_store().await;
    assert!(store.random_unreviewed().await.unwrap().is_none());
}

#[tokio::test]
async fn test_random_unreviewed_returns_inserted_sample() {
    let store = setup_store().await;
    store.insert_sample("abc123", Some("cam-01.jpg")).await.unwrap();

    let record = store.random_unreviewed().await.unwrap().expect("One eligible record");
    assert_eq!(record.blob_id, "abc123");
    assert_eq!(record.display_name.as_deref(), Some("cam-01.jpg"));
    assert!(record.review_status.is_none());
    assert!(!record.obstructed);
}

#[tokio::test]
async fn test_apply_labels_writes_nested_fields() {
    let store = setup_store().await;
    store.insert_sample("abc123", None).await.unwrap();

    let rows = store.apply_labels("abc123", &full_update("DCSL")).await.unwrap();
    assert_eq!(rows, 1);

    let record = store.find_by_blob_id("abc123").await.unwrap().unwrap();
    assert_eq!(record.review_status, Some(ReviewStatus::Labeled));
    assert_eq!(record.reviewer.as_deref(), Some("DCSL"));
    assert_eq!(record.label("labels.precipitation"), Some("rain"));
    assert_eq!(record.label("labels.congestion.leftLane"), Some("congested"));
    assert_eq!(record.label("labels.congestion.centerLane"), Some("unclear"));
    assert_eq!(record.label("labels.congestion.rightLane"), Some("vacant"));
    assert!(record.reviewed_at.is_some());
    assert!(!record.obstructed);
}

#[tokio::test]
async fn test_apply_labels_touches_only_matching_record() {
    let store = setup_store().await;
    store.insert_sample("a", None).await.unwrap();
    store.insert_sample("b", None).await.unwrap();

    store.apply_labels("a", &full_update("ALDOT")).await.unwrap();

    let other = store.find_by_blob_id("b").await.unwrap().unwrap();
    assert!(other.review_status.is_none());
    assert!(other.labels.is_none());
    assert!(other.reviewer.is_none());
}

#[tokio::test]
async fn test_apply_labels_does_not_upsert() {
    let store = setup_store().await;

    let rows = store.apply_labels("missing", &full_update("DCSL")).await.unwrap();
    assert_eq!(rows, 0);
    assert!(store.find_by_blob_id("missing").await.unwrap().is_none());
    assert_eq!(store.review_progress().await.unwrap().total, 0);
}

#[tokio::test]
async fn test_record_transitions_exactly_once() {
    let store = setup_store().await;
    store.insert_sample("abc123", None).await.unwrap();

    assert_eq!(store.apply_labels("abc123", &full_update("DCSL")).await.unwrap(), 1);

    let mut second = full_update("ALDOT");
    second.fields[0].1 = "snow".to_string();
    assert_eq!(store.apply_labels("abc123", &second).await.unwrap(), 0);
    assert_eq!(store.mark_obstructed("abc123", None).await.unwrap(), 0);

    let record = store.find_by_blob_id("abc123").await.unwrap().unwrap();
    assert_eq!(record.reviewer.as_deref(), Some("DCSL"));
    assert_eq!(record.label("labels.precipitation"), Some("rain"));
    assert!(!record.obstructed);
}

#[tokio::test]
async fn test_mark_obstructed_skips_labels() {
    let store = setup_store().await;
    store.insert_sample("abc123", None).await.unwrap();

    assert_eq!(store.mark_obstructed("abc123", None).await.unwrap(), 1);

    let record = store.find_by_blob_id("abc123").await.unwrap().unwrap();
    assert!(record.obstructed);
    assert_eq!(record.review_status, Some(ReviewStatus::Obstructed));
    assert!(record.labels.is_none());
    assert!(record.reviewer.is_none());
}

#[tokio::test]
async fn test_mark_obstructed_records_reviewer_when_given() {
    let store = setup_store().await;
    store.insert_sample("abc123", None).await.unwrap();

    store.mark_obstructed("abc123", Some("ALDOT")).await.unwrap();

    let record = store.find_by_blob_id("abc123").await.unwrap().unwrap();
    assert_eq!(record.reviewer.as_deref(), Some("ALDOT"));
}

#[tokio::test]
async fn test_reviewed_records_never_drawn_again() {
    let store = setup_store().await;
    for id in ["s1", "s2", "s3", "s4"] {
        store.insert_sample(id, None).await.unwrap();
    }
    store.apply_labels("s1", &full_update("DCSL")).await.unwrap();
    store.mark_obstructed("s3", None).await.unwrap();

    let mut drawn = HashSet::new();
    for _ in 0..50 {
        let record = store.random_unreviewed().await.unwrap().unwrap();
        drawn.insert(record.blob_id);
    }

    assert!(!drawn.contains("s1"));
    assert!(!drawn.contains("s3"));
    assert!(drawn.iter().all(|id| id == "s2" || id == "s4"));
}

#[tokio::test]
async fn test_pool_exhausts_after_all_reviewed() {
    let store = setup_store().await;
    store.insert_sample("s1", None).await.unwrap();
    store.insert_sample("s2", None).await.unwrap();

    while let Some(record) = store.random_unreviewed().await.unwrap() {
        store.apply_labels(&record.blob_id, &full_update("DCSL")).await.unwrap();
    }

    let progress = store.review_progress().await.unwrap();
    assert_eq!(progress.total, 2);
    assert_eq!(progress.labeled, 2);
    assert_eq!(progress.remaining(), 0);
}

#[tokio::test]
async fn test_review_progress_counts() {
    let store = setup_store().await;
    for id in ["s1", "s2", "s3"] {
        store.insert_sample(id, None).await.unwrap();
    }
    store.apply_labels("s1", &full_update("DCSL")).await.unwrap();
    store.mark_obstructed("s2", None).await.unwrap();

    let progress = store.review_progress().await.unwrap();
    assert_eq!(progress.total, 3);
    assert_eq!(progress.labeled, 1);
    assert_eq!(progress.obstructed, 1);
    assert_eq!(progress.remaining(), 1);
}

#[tokio::test]
async fn test_duplicate_blob_id_rejected() {
    let store = setup_store().await;
    store.insert_sample("abc123", None).await.unwrap();
    assert!(store.insert_sample("abc123", None).await.is_err());
}

#[tokio::test]
async fn test_apply_labels_rejects_paths_outside_labels() {
    let store = setup_store().await;
    store.insert_sample("abc123", None).await.unwrap();

    let update = LabelUpdate {
        reviewer: "DCSL".to_string(),
        fields: vec![("obstructed".to_string(), "1".to_string())],
    };
    assert!(store.apply_labels("abc123", &update).await.is_err());

    let record = store.find_by_blob_id("abc123").await.unwrap().unwrap();
    assert!(record.review_status.is_none());
}
