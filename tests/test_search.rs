mod common;

use common::{blue, green, red, setup, setup_with_store, FlakyStore};
use crossmodal::domain::error::DomainError;
use crossmodal::domain::ports::vector_store::ErrorKind;
use crossmodal::domain::values::limit::SearchLimit;
use crossmodal::domain::values::modality::Modality;
use crossmodal::CrossModal;
use std::sync::Arc;

async fn seeded() -> CrossModal {
    let cm = setup();
    cm.upload_texts(
        &["a cat on a mat".to_string(), "a dog in the park".to_string()],
        None,
    )
    .await
    .unwrap();
    cm.upload_image("cat.png".into(), red(), None).await.unwrap();
    cm.upload_image("dog.png".into(), green(), None).await.unwrap();
    cm
}

#[tokio::test]
async fn test_text_query_finds_matching_image() {
    let cm = seeded().await;

    let hits = cm.search_text("feline pet", 2).await.unwrap();

    assert_eq!(hits.len(), 2);
    assert_eq!(hits[0].payload, "cat.png");
    assert!(hits.iter().all(|h| h.modality == Modality::Image));
    assert!(hits[0].score > hits[1].score);
    assert!((hits[0].score - 1.0).abs() < 1e-6);
}

#[tokio::test]
async fn test_image_query_finds_matching_text() {
    let cm = seeded().await;

    let hits = cm.search_image(&red(), 5).await.unwrap();

    assert_eq!(hits.len(), 2);
    assert_eq!(hits[0].payload, "a cat on a mat");
    assert!(hits.iter().all(|h| h.modality == Modality::Text));
    assert!((hits[0].score - std::f64::consts::FRAC_1_SQRT_2).abs() < 1e-5);
}

#[tokio::test]
async fn test_same_modality_neighbours_via_repository() {
    let cm = seeded().await;
    let query = cm.search().search_by_text("kitten", SearchLimit::default()).await.unwrap();
    assert_eq!(query[0].payload, "cat.png");

    let embedded = {
        let hits = cm.repository().read_all().await.unwrap();
        hits.into_iter()
            .find(|r| r.payload == "a cat on a mat")
            .unwrap()
            .vector
    };
    let texts = cm.repository().nearest(Modality::Text, &embedded, 5).await.unwrap();
    assert_eq!(texts[0].record.payload, "a cat on a mat");
    assert!((texts[0].score - 1.0).abs() < 1e-6);
}

#[tokio::test]
async fn test_payload_only_helpers() {
    let cm = seeded().await;
    let one = SearchLimit::new(1).unwrap();

    let paths = cm.search().image_paths_for_text("puppy", one).await.unwrap();
    assert_eq!(paths, vec!["dog.png".to_string()]);

    let texts = cm.search().texts_for_image(&green(), one).await.unwrap();
    assert_eq!(texts, vec!["a dog in the park".to_string()]);
}

#[tokio::test]
async fn test_limit_bounds_results() {
    let cm = seeded().await;
    cm.upload_image("sky.png".into(), blue(), None).await.unwrap();

    let hits = cm.search_text("cat", 1).await.unwrap();
    assert_eq!(hits.len(), 1);

    let hits = cm.search_text("cat", 100).await.unwrap();
    assert_eq!(hits.len(), 3);
}

#[tokio::test]
async fn test_limit_out_of_range_is_invalid_input() {
    let cm = seeded().await;

    for limit in [0, 101] {
        let err = cm.search_text("cat", limit).await.unwrap_err();
        assert!(matches!(err, DomainError::InvalidInput(_)), "limit {limit}");
    }
}

#[tokio::test]
async fn test_empty_store_returns_no_hits() {
    let cm = setup();
    assert!(cm.search_text("cat", 5).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_degenerate_query_is_reported() {
    let cm = seeded().await;

    let err = cm.search_text("unrelated words", 5).await.unwrap_err();
    assert!(matches!(err, DomainError::DegenerateVector));

    let black = crossmodal::domain::values::rgb_image::RgbImage::filled(2, 2, [0, 0, 0]).unwrap();
    let err = cm.search_image(&black, 5).await.unwrap_err();
    assert!(matches!(err, DomainError::DegenerateVector));
}

#[tokio::test]
async fn test_unavailable_store_propagates() {
    let store = Arc::new(FlakyStore::new().failing_first(u32::MAX, ErrorKind::Transient));
    let cm = setup_with_store(store.clone());

    let err = cm.search_text("cat", 5).await.unwrap_err();

    assert!(matches!(err, DomainError::RepositoryUnavailable { attempts: 3, .. }));
    assert!(err.is_store_failure());
    assert_eq!(store.calls(), 3);
}
