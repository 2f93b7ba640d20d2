use super::*;
use crate::config::{IndexConfig, OllamaConfig};
use std::path::PathBuf;

fn test_config(ollama: OllamaConfig) -> Config {
    Config {
        ollama,
        index: IndexConfig::default(),
        base_dir: PathBuf::new(),
    }
}

#[test]
fn client_configuration() {
    let config = test_config(OllamaConfig {
        protocol: "http".to_string(),
        host: "test-host".to_string(),
        port: 1234,
        model: "test-model".to_string(),
        batch_size: 128,
        embedding_dimension: 768,
    });
    let client = OllamaClient::new(&config).expect("Failed to create client");

    assert_eq!(client.model, "test-model");
    assert_eq!(client.batch_size, 128);
    assert_eq!(client.dimension, 768);
    assert_eq!(client.base_url.host_str(), Some("test-host"));
    assert_eq!(client.base_url.port(), Some(1234));
}

#[test]
fn client_builder_methods() {
    let config = test_config(OllamaConfig::default());
    let client = OllamaClient::new(&config)
        .expect("Failed to create client")
        .with_timeout(Duration::from_secs(60));

    assert_eq!(client.model, "all-minilm:latest");
    assert_eq!(client.dimension, DEFAULT_EMBEDDING_DIMENSION);
}

#[test]
fn embedder_dimension_matches_config() {
    let config = test_config(OllamaConfig::default());
    let client = OllamaClient::new(&config).expect("Failed to create client");

    let embedder: &dyn Embedder = &client;
    assert_eq!(embedder.dimension(), DEFAULT_EMBEDDING_DIMENSION);
}

#[test]
fn empty_input_short_circuits() {
    // Port 9 is the discard service; nothing answers there, so a request
    // attempt would fail rather than silently succeed.
    let config = test_config(OllamaConfig {
        port: 9,
        ..OllamaConfig::default()
    });
    let client = OllamaClient::new(&config).expect("Failed to create client");

    let embeddings = client
        .embed_texts(&[])
        .expect("empty input should not issue a request");
    assert!(embeddings.is_empty());
}
