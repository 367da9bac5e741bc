use crossmodal::config::{EncoderBackend, Settings, StoreBackend};
use crossmodal::domain::entities::record::derive_record_id;
use crossmodal::domain::error::DomainError;
use crossmodal::domain::values::modality::Modality;
use crossmodal::domain::values::rgb_image::RgbImage;
use crossmodal::CrossModal;
use tempfile::TempDir;

fn settings(dir: &TempDir, dimension: usize) -> Settings {
    Settings {
        store: StoreBackend::Sqlite {
            path: dir.path().join("e2e.db").to_string_lossy().into_owned(),
        },
        encoder: EncoderBackend::Hashing,
        dimension,
        ..Settings::default()
    }
}

#[tokio::test]
async fn test_upload_search_and_manage_records() {
    let dir = TempDir::new().unwrap();
    let cm = CrossModal::new(&settings(&dir, 64)).await.unwrap();

    let texts = vec!["a cat on a mat".to_string(), "a dog in the park".to_string()];
    assert_eq!(cm.upload_texts(&texts, None).await.unwrap(), 2);
    let red = RgbImage::filled(4, 4, [250, 10, 10]).unwrap();
    let teal = RgbImage::filled(4, 4, [10, 200, 200]).unwrap();
    cm.upload_image("red.png".into(), red.clone(), None).await.unwrap();
    cm.upload_image("teal.png".into(), teal, None).await.unwrap();

    let stats = cm.stats().await.unwrap();
    assert_eq!(stats.store, "sqlite");
    assert_eq!(stats.dimension, 64);
    assert_eq!((stats.total, stats.texts, stats.images), (4, 2, 2));

    let hits = cm.search_text("cat", 10).await.unwrap();
    assert_eq!(hits.len(), 2);
    assert!(hits.iter().all(|h| h.modality == Modality::Image));

    let hits = cm.search_image(&red, 1).await.unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].modality, Modality::Text);

    let id = derive_record_id(Modality::Text, "a dog in the park");
    assert_eq!(cm.get(&id).await.unwrap().payload, "a dog in the park");
    assert!(cm.delete(&id).await.unwrap());
    assert!(matches!(cm.get(&id).await, Err(DomainError::NotFound(_))));

    assert_eq!(cm.list(None).await.unwrap().len(), 3);
    assert_eq!(cm.list(Some(2)).await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_reopen_keeps_data_and_dimension() {
    let dir = TempDir::new().unwrap();
    {
        let cm = CrossModal::new(&settings(&dir, 32)).await.unwrap();
        cm.upload_texts(&["persisted".to_string()], None).await.unwrap();
    }

    let cm = CrossModal::new(&settings(&dir, 32)).await.unwrap();
    assert_eq!(cm.stats().await.unwrap().total, 1);

    let err = match CrossModal::new(&settings(&dir, 48)).await {
        Ok(_) => panic!("dimension change should be refused"),
        Err(e) => e,
    };
    assert!(matches!(err, DomainError::Store(_)));
}

#[tokio::test]
async fn test_weaviate_settings_reject_bad_class() {
    let settings = Settings {
        store: StoreBackend::Weaviate { url: None, collection: Some("not valid".into()) },
        ..Settings::default()
    };
    let err = match CrossModal::new(&settings).await {
        Ok(_) => panic!("bad class name should be refused"),
        Err(e) => e,
    };
    assert!(matches!(err, DomainError::Config(_)));
}
