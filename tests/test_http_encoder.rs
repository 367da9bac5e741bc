use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use crossmodal::domain::error::DomainError;
use crossmodal::domain::ports::encoder::Encoder;
use crossmodal::domain::values::rgb_image::RgbImage;
use crossmodal::infrastructure::encoders::http::HttpEncoder;
use serde_json::{json, Value};
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_embed_text_posts_text() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/vectorize/text"))
        .and(body_json(json!({ "text": "a cat on a mat" })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "vector": [0.5, 0.5, 0.0], "dim": 3 })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let encoder = HttpEncoder::new(Some(format!("{}/", server.uri())), 3);
    let v = encoder.embed_text("a cat on a mat").await.unwrap();

    assert_eq!(v, vec![0.5, 0.5, 0.0]);
    assert_eq!(encoder.dimension(), 3);
}

#[tokio::test]
async fn test_embed_image_sends_base64_png() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/vectorize/image"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "vector": [1.0, 0.0], "dim": 2 })))
        .mount(&server)
        .await;

    let image = RgbImage::filled(3, 2, [10, 20, 30]).unwrap();
    let encoder = HttpEncoder::new(Some(server.uri()), 2);
    encoder.embed_image(&image).await.unwrap();

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    let body: Value = serde_json::from_slice(&requests[0].body).unwrap();
    let decoded = STANDARD.decode(body["image"].as_str().unwrap()).unwrap();
    assert_eq!(RgbImage::decode(&decoded).unwrap(), image);
}

#[tokio::test]
async fn test_server_error_is_encoder_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_string("model not loaded"))
        .mount(&server)
        .await;

    let err = HttpEncoder::new(Some(server.uri()), 2)
        .embed_text("x")
        .await
        .unwrap_err();
    match err {
        DomainError::Encoder(msg) => assert!(msg.contains("model not loaded")),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_malformed_response_is_parse_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "embedding": [1.0] })))
        .mount(&server)
        .await;

    let err = HttpEncoder::new(Some(server.uri()), 1)
        .embed_text("x")
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::Parse(_)));
}
