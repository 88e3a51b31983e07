use field_config::FieldConfig;
use figment::Jail;

#[test]
fn external_overrides_fill_config_values() {
    Jail::expect_with(|_jail| {
        let overrides = vec![(
            "FIELDOPS_API__BASE_URL".to_string(),
            "https://override.example.com".to_string(),
        )];

        let config = FieldConfig::load_with_env_overrides(&overrides).expect("config loads");
        assert_eq!(config.api.base_url, "https://override.example.com");
        Ok(())
    });
}

#[test]
fn process_env_beats_external_overrides() {
    Jail::expect_with(|jail| {
        jail.set_env("FIELDOPS_API__BASE_URL", "https://env.example.com");
        let overrides = vec![(
            "FIELDOPS_API__BASE_URL".to_string(),
            "https://override.example.com".to_string(),
        )];

        let config = FieldConfig::load_with_env_overrides(&overrides).expect("config loads");
        assert_eq!(config.api.base_url, "https://env.example.com");
        Ok(())
    });
}

#[test]
fn numeric_overrides_are_parsed() {
    Jail::expect_with(|_jail| {
        let overrides = vec![
            ("FIELDOPS_API__READ_TIMEOUT_SECS".to_string(), "45".to_string()),
            ("UNRELATED_KEY".to_string(), "ignored".to_string()),
        ];

        let config = FieldConfig::load_with_env_overrides(&overrides).expect("config loads");
        assert_eq!(config.api.read_timeout_secs, 45);
        Ok(())
    });
}

#[test]
fn invalid_env_value_fails_validation() {
    Jail::expect_with(|jail| {
        jail.set_env("FIELDOPS_API__REQUEST_TIMEOUT_SECS", "0");
        let err = FieldConfig::load().expect_err("zero timeout rejected");
        assert!(err.to_string().contains("api.request_timeout_secs"));
        Ok(())
    });
}
