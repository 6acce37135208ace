use super::*;
use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer, batch_size: u32) -> OllamaClient {
    let address = server.address();
    let config = OllamaConfig {
        protocol: "http".to_string(),
        host: address.ip().to_string(),
        port: address.port(),
        model: "nomic-embed-text".to_string(),
        batch_size,
        timeout_seconds: 5,
    };
    OllamaClient::new(&config)
        .expect("Failed to create client")
        .with_retry_backoff(Duration::from_millis(1))
}

fn texts(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| (*s).to_string()).collect()
}

#[test]
fn client_configuration() {
    let config = OllamaConfig {
        protocol: "http".to_string(),
        host: "test-host".to_string(),
        port: 1234,
        model: "test-model".to_string(),
        batch_size: 128,
        timeout_seconds: 30,
    };
    let client = OllamaClient::new(&config).expect("Failed to create client");

    assert_eq!(client.model, "test-model");
    assert_eq!(client.batch_size, 128);
    assert_eq!(client.base_url.host_str(), Some("test-host"));
    assert_eq!(client.base_url.port(), Some(1234));
    assert_eq!(client.retry, RetryPolicy::default());
}

#[test]
fn client_builder_methods() {
    let client = OllamaClient::new(&OllamaConfig::default())
        .expect("Failed to create client")
        .with_timeout(Duration::from_secs(60))
        .with_retry_attempts(5)
        .with_retry_backoff(Duration::from_millis(5));

    assert_eq!(client.retry.attempts, 5);
    assert_eq!(client.retry.backoff, Duration::from_millis(5));
    assert_eq!(client.model_name(), "nomic-embed-text");
}

#[tokio::test(flavor = "multi_thread")]
async fn batches_follow_batch_size() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/embed"))
        .and(body_partial_json(json!({"input": ["alpha", "beta"]})))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"embeddings": [[1.0, 0.0], [0.0, 1.0]]})),
        )
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/embed"))
        .and(body_partial_json(json!({"input": ["gamma"]})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"embeddings": [[0.5, 0.5]]})))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, 2);
    let vectors = client
        .embed(&texts(&["alpha", "beta", "gamma"]))
        .await
        .expect("should embed");

    assert_eq!(vectors, vec![vec![1.0, 0.0], vec![0.0, 1.0], vec![0.5, 0.5]]);
}

#[tokio::test(flavor = "multi_thread")]
async fn single_text_uses_input_field() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/embed"))
        .and(body_partial_json(
            json!({"model": "nomic-embed-text", "input": ["only one"]}),
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"embeddings": [[0.1, 0.2, 0.3]]})))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, 16);
    let vector = client.embed_one("only one").await.expect("should embed");

    assert_eq!(vector, vec![0.1, 0.2, 0.3]);
}

#[tokio::test(flavor = "multi_thread")]
async fn empty_input_makes_no_request() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    let client = client_for(&server, 16);
    let vectors = client.embed(&[]).await.expect("empty input is fine");
    assert!(vectors.is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn response_count_mismatch_fails() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/embed"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"embeddings": [[1.0]]})))
        .mount(&server)
        .await;

    let client = client_for(&server, 16);
    let err = client
        .embed(&texts(&["one", "two"]))
        .await
        .expect_err("count mismatch should fail");

    assert!(matches!(err, DocumindError::EmbeddingFailed(ref message) if message.contains("Mismatch")));
}

#[tokio::test(flavor = "multi_thread")]
async fn server_errors_are_retried() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/embed"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/embed"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"embeddings": [[2.0, 0.0]]})))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, 16);
    let vector = client.embed_one("retry me").await.expect("third attempt succeeds");
    assert_eq!(vector, vec![2.0, 0.0]);
}

#[tokio::test(flavor = "multi_thread")]
async fn client_errors_surface_as_embedding_failures() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/embed"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, 16);
    let err = client
        .embed_one("missing model")
        .await
        .expect_err("404 should fail");

    assert!(matches!(err, DocumindError::EmbeddingFailed(ref message) if message.contains("404")));
}

#[tokio::test(flavor = "multi_thread")]
async fn health_check_matches_latest_tag() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/tags"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "models": [
                {"name": "llama3:8b"},
                {"name": "nomic-embed-text:latest", "size": 274302450}
            ]
        })))
        .mount(&server)
        .await;

    let client = client_for(&server, 16);
    let models = client.list_models().expect("should list models");
    assert_eq!(models.len(), 2);
    assert_eq!(models[1].size, Some(274_302_450));

    client.health_check().expect("model should be found");
}

#[tokio::test(flavor = "multi_thread")]
async fn missing_model_fails_validation() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/tags"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"models": [{"name": "llama3:8b"}]})))
        .mount(&server)
        .await;

    let client = client_for(&server, 16);
    let err = client.validate_model().expect_err("model is not installed");
    assert!(err.to_string().contains("nomic-embed-text"));
}
