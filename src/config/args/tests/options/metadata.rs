#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use crate::config::args::*;

    #[test]
    fn with_metadata() {
        init_dummy_tracing_subscriber();

        let args = vec![
            "s3upload",
            "--metadata",
            "key1=value1,key2=value2",
            "-",
            "s3://target-bucket/target_key",
        ];

        let config = build_config_from_args(args).unwrap();

        let expected = HashMap::from([
            ("key1".to_string(), "value1".to_string()),
            ("key2".to_string(), "value2".to_string()),
        ]);
        assert_eq!(config.metadata, Some(expected.clone()));
        assert_eq!(config.upload_metadata().metadata, Some(expected));
    }

    #[test]
    fn with_invalid_metadata() {
        init_dummy_tracing_subscriber();

        let args = vec![
            "s3upload",
            "--metadata",
            "key1=value1,key2",
            "-",
            "s3://target-bucket/target_key",
        ];

        assert!(parse_from_args(args).is_err());
    }

    #[test]
    fn with_invalid_tagging() {
        init_dummy_tracing_subscriber();

        let args = vec![
            "s3upload",
            "--tagging",
            "key1=value1&key1=value2",
            "-",
            "s3://target-bucket/target_key",
        ];

        assert!(parse_from_args(args).is_err());
    }

    fn init_dummy_tracing_subscriber() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter("dummy=trace")
            .try_init();
    }
}
