use dexa_core::domain::{DatasetId, UserId};
use dexa_core::ingest::blob_key;
use dexa_storage::s3::S3Config;

#[cfg(test)]
mod s3_config_tests {
    use super::*;

    #[test]
    fn test_s3_config_default() {
        let config = S3Config::default();

        assert_eq!(config.bucket, "dexa-datasets");
        assert_eq!(config.region, "us-east-1");
        assert!(config.endpoint.is_none());
        assert!(config.access_key.is_none());
        assert!(config.secret_key.is_none());
    }

    #[test]
    fn test_s3_config_partial_deserialization() {
        let config: S3Config =
            serde_json::from_str(r#"{"endpoint": "http://localhost:9000", "bucket": "uploads"}"#).unwrap();

        assert_eq!(config.endpoint.as_deref(), Some("http://localhost:9000"));
        assert_eq!(config.bucket, "uploads");
        assert_eq!(config.region, "us-east-1");
    }

    #[test]
    fn test_s3_config_roundtrip() {
        let config = S3Config {
            endpoint: None,
            bucket: "b".to_string(),
            region: "eu-west-1".to_string(),
            access_key: Some("key".to_string()),
            secret_key: Some("secret".to_string()),
        };

        let json = serde_json::to_string(&config).unwrap();
        let back: S3Config = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }
}

#[cfg(test)]
mod object_key_tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_key_is_scoped_to_user() {
        let user = UserId::new();
        let dataset = DatasetId::new();

        let key = blob_key(&user, &dataset, "titanic.csv");

        assert!(key.starts_with(&format!("{}/{}", user, dataset)));
        assert!(key.ends_with("-titanic.csv"));
        assert_eq!(key.matches('/').count(), 1);
    }

    #[rstest]
    #[case("../../other-user/data.csv", "-data.csv")]
    #[case("C:\\Users\\me\\sales q1.xlsx", "-sales_q1.xlsx")]
    #[case("nested/dir/report.json", "-report.json")]
    fn test_key_cannot_escape_prefix(#[case] file_name: &str, #[case] suffix: &str) {
        let user = UserId::new();
        let key = blob_key(&user, &DatasetId::new(), file_name);

        assert!(!key.contains(".."));
        assert_eq!(key.matches('/').count(), 1);
        assert!(key.ends_with(suffix), "{key} should end with {suffix}");
    }

    #[test]
    fn test_reupload_gets_distinct_key() {
        let user = UserId::new();
        let first = blob_key(&user, &DatasetId::new(), "a.csv");
        let second = blob_key(&user, &DatasetId::new(), "a.csv");
        assert_ne!(first, second);
    }
}
