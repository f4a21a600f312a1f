use accountdesk::config::Config;

#[test]
fn test_default_config() {
    let config = Config::default();
    assert_eq!(config.api.base_url, "http://localhost:8084");
    assert_eq!(config.api.timeout_secs, 10);
    assert_eq!(config.registration.code_length, 6);
    assert_eq!(config.registration.resend_cooldown_secs, 60);
    assert_eq!(config.registration.min_password_length, 8);
    assert!(!config.logging.enabled);
}

#[test]
fn test_config_validation() {
    let mut config = Config::default();

    // Valid config should pass
    assert!(config.validate().is_ok());

    config.api.base_url = "ftp://example.com".to_string();
    assert!(config.validate().is_err());

    config.api.base_url = "not a url".to_string();
    assert!(config.validate().is_err());

    // Reset and test the numeric ranges
    config = Config::default();
    config.api.timeout_secs = 0;
    assert!(config.validate().is_err());

    config = Config::default();
    config.registration.code_length = 3;
    assert!(config.validate().is_err());

    config = Config::default();
    config.registration.resend_cooldown_secs = 0;
    assert!(config.validate().is_err());

    config = Config::default();
    config.registration.min_password_length = 0;
    assert!(config.validate().is_err());
}

#[test]
fn test_config_serialization() {
    let config = Config::default();
    let toml_str = toml::to_string_pretty(&config).unwrap();
    assert!(toml_str.contains("base_url = \"http://localhost:8084\""));
    assert!(toml_str.contains("resend_cooldown_secs = 60"));
}

#[test]
fn test_partial_config_deserialization() {
    // Partial TOML configs merge with defaults
    let partial_toml = r#"
[api]
base_url = "https://accounts.example.com"

[logging]
enabled = true
"#;

    let config: Config = toml::from_str(partial_toml).unwrap();

    assert_eq!(config.api.base_url, "https://accounts.example.com");
    assert!(config.logging.enabled);

    assert_eq!(config.api.timeout_secs, 10);
    assert_eq!(config.registration.code_length, 6);
    assert_eq!(config.api.access_token_env, "ACCOUNTDESK_ACCESS_TOKEN");
}

#[test]
fn test_empty_config_deserialization() {
    let config: Config = toml::from_str("").unwrap();
    let default_config = Config::default();

    assert_eq!(config.api.base_url, default_config.api.base_url);
    assert_eq!(
        config.registration.resend_cooldown_secs,
        default_config.registration.resend_cooldown_secs
    );
    assert_eq!(config.logging.enabled, default_config.logging.enabled);
}

#[test]
fn test_access_token_comes_from_configured_variable() {
    let mut config = Config::default();
    config.api.access_token_env = "ACCOUNTDESK_TEST_TOKEN_VAR".to_string();

    std::env::remove_var("ACCOUNTDESK_TEST_TOKEN_VAR");
    assert_eq!(config.api.access_token(), None);

    std::env::set_var("ACCOUNTDESK_TEST_TOKEN_VAR", "   ");
    assert_eq!(config.api.access_token(), None);

    std::env::set_var("ACCOUNTDESK_TEST_TOKEN_VAR", " secret ");
    assert_eq!(config.api.access_token().as_deref(), Some("secret"));
    std::env::remove_var("ACCOUNTDESK_TEST_TOKEN_VAR");
}

#[test]
fn test_generate_config_creates_directory() {
    use std::fs;

    let temp_dir = std::env::temp_dir().join("accountdesk_test_config");
    let config_path = temp_dir.join("nested").join("config.toml");

    if temp_dir.exists() {
        let _ = fs::remove_dir_all(&temp_dir);
    }
    assert!(!temp_dir.exists());

    let result = Config::generate_default_config(&config_path);
    assert!(result.is_ok());
    assert!(config_path.exists());

    let content = fs::read_to_string(&config_path).unwrap();
    assert!(content.contains("# Accountdesk Configuration File"));
    assert!(content.contains("code_length = 6"));

    // The generated file loads back and validates
    let loaded = Config::load_from_file(&config_path).unwrap();
    assert_eq!(loaded.api.base_url, Config::default().api.base_url);

    let _ = fs::remove_dir_all(&temp_dir);
}

#[test]
fn test_invalid_file_is_rejected_on_load() {
    use std::fs;

    let path = std::env::temp_dir().join("accountdesk_invalid_config.toml");
    fs::write(&path, "[registration]\ncode_length = 42\n").unwrap();

    let err = Config::load_from_file(&path).unwrap_err();
    assert!(err.to_string().contains("code_length"));

    let _ = fs::remove_file(&path);
}
