use super::*;
use tempfile::TempDir;

#[test]
fn default_config() {
    let config = Config::load(TempDir::new().expect("should create temp dir").path())
        .expect("should load default config");
    assert_eq!(config.ollama.protocol, "http");
    assert_eq!(config.ollama.host, "localhost");
    assert_eq!(config.ollama.port, 11434);
    assert_eq!(config.ollama.model, "all-minilm:latest");
    assert_eq!(config.ollama.batch_size, 16);
    assert_eq!(config.ollama.embedding_dimension, 384);
    assert_eq!(config.index.base_url, "http://localhost:5081");
    assert_eq!(config.index.index_name, "text-similarity");
}

#[test]
fn config_validation() {
    let config = Config {
        ollama: OllamaConfig::default(),
        index: IndexConfig::default(),
        base_dir: PathBuf::new(),
    };
    assert!(config.validate().is_ok());

    let mut invalid_config = config.clone();
    invalid_config.ollama.protocol = "ftp".to_string();
    assert!(invalid_config.validate().is_err());

    let mut invalid_config = config.clone();
    invalid_config.ollama.port = 0;
    assert!(invalid_config.validate().is_err());

    let mut invalid_config = config.clone();
    invalid_config.ollama.model = String::new();
    assert!(invalid_config.validate().is_err());

    let mut invalid_config = config.clone();
    invalid_config.ollama.batch_size = 0;
    assert!(invalid_config.validate().is_err());

    let mut invalid_config = config.clone();
    invalid_config.index.base_url = "not a url".to_string();
    assert!(invalid_config.validate().is_err());

    let mut invalid_config = config;
    invalid_config.index.index_name = "  ".to_string();
    assert!(invalid_config.validate().is_err());
}

#[test]
fn ollama_url_generation() {
    let config = OllamaConfig::default();
    let url = config
        .ollama_url()
        .expect("should generate ollama_url successfully");
    assert_eq!(url.as_str(), "http://localhost:11434/");
}

#[test]
fn toml_serialization() {
    let config = Config {
        ollama: OllamaConfig::default(),
        index: IndexConfig::default(),
        base_dir: PathBuf::new(),
    };
    let toml_str = toml::to_string(&config).expect("should serialize toml correctly");
    let parsed_config: Config = toml::from_str(&toml_str).expect("should parse toml correctly");
    assert_eq!(config, parsed_config);
}

#[test]
fn setter_validation() {
    let mut config = OllamaConfig::default();

    assert!(config.set_protocol("https".to_string()).is_ok());
    assert!(config.set_host("example.com".to_string()).is_ok());
    assert!(config.set_port(8080).is_ok());
    assert!(config.set_model("new-model".to_string()).is_ok());
    assert!(config.set_batch_size(128).is_ok());
    assert!(config.set_embedding_dimension(768).is_ok());

    assert!(config.set_protocol("ftp".to_string()).is_err());
    assert!(config.set_port(0).is_err());
    assert!(config.set_model(String::new()).is_err());
    assert!(config.set_batch_size(0).is_err());
    assert!(config.set_batch_size(1001).is_err());
    assert!(config.set_embedding_dimension(32).is_err());
}

#[test]
fn index_setter_validation() {
    let mut config = IndexConfig::default();

    assert!(
        config
            .set_base_url("https://index.example.com".to_string())
            .is_ok()
    );
    assert!(config.set_index_name("notes".to_string()).is_ok());

    assert!(config.set_base_url("not a url".to_string()).is_err());
    assert!(config.set_index_name(String::new()).is_err());
}

#[test]
fn apply_setting_overrides() {
    let mut config = Config {
        ollama: OllamaConfig::default(),
        index: IndexConfig::default(),
        base_dir: PathBuf::new(),
    };

    config
        .apply_setting("ollama.model", "nomic-embed-text:latest")
        .expect("should apply model override");
    assert_eq!(config.ollama.model, "nomic-embed-text:latest");

    config
        .apply_setting("ollama.port", "11435")
        .expect("should apply port override");
    assert_eq!(config.ollama.port, 11435);

    config
        .apply_setting("index.api_key", "local-dev-key")
        .expect("should apply api key override");
    assert_eq!(config.index.api_key, "local-dev-key");

    assert!(config.apply_setting("ollama.port", "not-a-number").is_err());
    assert!(config.apply_setting("unknown.key", "value").is_err());
}

#[test]
fn load_missing_config() {
    let temp_dir = TempDir::new().expect("should create temp dir");

    let config = Config::load(temp_dir.path()).expect("should fall back to defaults");
    assert!(config.validate().is_ok());
    assert_eq!(config.base_dir, temp_dir.path());
    assert_eq!(config.ollama.protocol, "http");
    assert_eq!(config.ollama.host, "localhost");
    assert_eq!(config.ollama.port, 11434);
}

#[test]
fn save_and_reload_round_trip() {
    let temp_dir = TempDir::new().expect("should create temp dir");

    let mut config = Config::load(temp_dir.path()).expect("should load default config");
    config.ollama.model = "mxbai-embed-large:latest".to_string();
    config.index.api_key = "pclocal".to_string();
    config.save().expect("should save config");

    let reloaded = Config::load(temp_dir.path()).expect("should reload saved config");
    assert_eq!(reloaded.ollama.model, "mxbai-embed-large:latest");
    assert_eq!(reloaded.index.api_key, "pclocal");
}

#[test]
fn rejects_invalid_config_file() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    std::fs::write(
        temp_dir.path().join("config.toml"),
        "[ollama]\nprotocol = \"ftp\"\n",
    )
    .expect("should write config file");

    assert!(Config::load(temp_dir.path()).is_err());
}

#[test]
fn database_path_under_base_dir() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let config = Config::load(temp_dir.path()).expect("should load default config");

    let db_path = config.database_path().expect("should build database path");
    assert_eq!(db_path, temp_dir.path().join("registry.db"));
}
