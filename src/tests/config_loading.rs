#[cfg(test)]
mod test {

    use std::io::Write;

    use chrono::Duration;
    use serial_test::serial;
    use tempfile::NamedTempFile;

    use crate::auth::OAuth2Auth;
    use crate::config::credentials::Credentials;
    use crate::config::loader::{expand_env_vars, file_to_config, parse_config};
    use crate::config::settings::LogFormat;
    use crate::error::ConfigError;

    fn write_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().expect("temp file");
        file.write_all(content.as_bytes()).expect("write config");
        file
    }

    #[tokio::test]
    #[serial]
    async fn loads_yaml_with_env_expansion() {
        std::env::set_var("TR_TEST_TOKEN_URL", "https://idp.test/oauth/token");
        std::env::set_var("TR_TEST_CLIENT_SECRET", "s3cret");

        let file = write_config(
            r#"
settings:
  logging:
    level: debug
    format: json
oauth2:
  token_url: ${TR_TEST_TOKEN_URL}
  client_id: ${TR_TEST_CLIENT_ID:orders-service}
  client_secret: ${TR_TEST_CLIENT_SECRET}
  scope: orders.read
  extra_params:
    audience: api://orders
  refresh_before_seconds: 120
"#,
        );

        let config = file_to_config(file.path()).await.unwrap();
        let logging = config.settings.logging.clone().unwrap();
        assert_eq!(logging.level, "debug");
        assert_eq!(logging.format, LogFormat::Json);

        let credentials = Credentials::try_from(&config.oauth2).unwrap();
        assert_eq!(credentials.token_url(), "https://idp.test/oauth/token");
        assert_eq!(credentials.client_id(), "orders-service");
        assert_eq!(credentials.client_secret(), "s3cret");
        assert_eq!(credentials.scope(), Some("orders.read"));
        assert_eq!(credentials.extra_params()["audience"], "api://orders");
        assert_eq!(credentials.refresh_lead(), Duration::seconds(120));

        std::env::remove_var("TR_TEST_TOKEN_URL");
        std::env::remove_var("TR_TEST_CLIENT_SECRET");
    }

    #[test]
    #[serial]
    fn unset_variable_without_default_expands_to_empty() {
        std::env::remove_var("TR_TEST_MISSING");
        assert_eq!(expand_env_vars("secret: '${TR_TEST_MISSING}'"), "secret: ''");
        assert_eq!(expand_env_vars("id: ${TR_TEST_MISSING:fallback}"), "id: fallback");
    }

    #[test]
    fn empty_client_secret_fails_construction() {
        let config = parse_config(
            r#"
oauth2:
  token_url: https://idp.test/oauth/token
  client_id: orders-service
  client_secret: ""
"#,
        )
        .unwrap();

        assert!(config.settings.logging.is_none());
        assert!(matches!(
            OAuth2Auth::from_config(&config.oauth2),
            Err(ConfigError::MissingClientSecret)
        ));
    }

    #[test]
    fn defaults_apply_when_optional_fields_absent() {
        let config = parse_config(
            r#"
oauth2:
  token_url: https://idp.test/oauth/token
  client_id: orders-service
  client_secret: s3cret
  scope: ""
"#,
        )
        .unwrap();

        let credentials = Credentials::try_from(&config.oauth2).unwrap();
        assert_eq!(credentials.scope(), None);
        assert!(credentials.extra_params().is_empty());
        assert_eq!(credentials.refresh_lead(), Duration::seconds(60));
    }

    #[tokio::test]
    async fn missing_file_is_a_read_error() {
        let err = file_to_config(std::path::Path::new("/nonexistent/token-refresher.yaml"))
            .await
            .unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn malformed_yaml_is_a_parse_error() {
        assert!(matches!(parse_config("oauth2: ["), Err(ConfigError::Parse(_))));
    }
}
