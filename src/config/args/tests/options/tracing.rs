#[cfg(test)]
mod tests {
    use crate::config::args::*;

    #[test]
    fn with_default_value() {
        init_dummy_tracing_subscriber();

        let args = vec!["s3upload", "-", "s3://target-bucket/target_key"];

        let config = build_config_from_args(args).unwrap();
        let tracing_config = config.tracing_config.unwrap();

        assert_eq!(tracing_config.tracing_level, log::Level::Warn);
        assert!(!tracing_config.json_tracing);
        assert!(!tracing_config.aws_sdk_tracing);
        assert!(!tracing_config.span_events_tracing);
        assert!(!tracing_config.disable_color_tracing);
    }

    #[test]
    fn with_custom_value() {
        init_dummy_tracing_subscriber();

        let args = vec![
            "s3upload",
            "-vv",
            "--json-tracing",
            "--aws-sdk-tracing",
            "--span-events-tracing",
            "--disable-color-tracing",
            "-",
            "s3://target-bucket/target_key",
        ];

        let config = build_config_from_args(args).unwrap();
        let tracing_config = config.tracing_config.unwrap();

        assert_eq!(tracing_config.tracing_level, log::Level::Debug);
        assert!(tracing_config.json_tracing);
        assert!(tracing_config.aws_sdk_tracing);
        assert!(tracing_config.span_events_tracing);
        assert!(tracing_config.disable_color_tracing);
    }

    #[test]
    fn with_quiet() {
        init_dummy_tracing_subscriber();

        let args = vec!["s3upload", "-qq", "-", "s3://target-bucket/target_key"];

        let config = build_config_from_args(args).unwrap();
        assert!(config.tracing_config.is_none());
    }

    fn init_dummy_tracing_subscriber() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter("dummy=trace")
            .try_init();
    }
}
