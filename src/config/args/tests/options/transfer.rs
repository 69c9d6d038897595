#[cfg(test)]
mod tests {
    use crate::config::args::*;

    #[test]
    fn with_default_value() {
        init_dummy_tracing_subscriber();

        let args = vec!["s3upload", "-", "s3://target-bucket/target_key"];

        let config = build_config_from_args(args).unwrap();
        let transfer_config = config.transfer_config;

        assert_eq!(transfer_config.multipart_chunksize, 8 * 1024 * 1024);
        assert!(transfer_config.content_md5_header);
        assert!(transfer_config.reuse_uploaded_parts);
        assert!(transfer_config.verify_e_tag);
        assert!(!transfer_config.abort_on_failure);
    }

    #[test]
    fn with_custom_value() {
        init_dummy_tracing_subscriber();

        let args = vec![
            "s3upload",
            "--multipart-chunksize",
            "5MiB",
            "--disable-content-md5-header",
            "--disable-part-reuse",
            "--disable-etag-verify",
            "--abort-on-failure",
            "-",
            "s3://target-bucket/target_key",
        ];

        let config = build_config_from_args(args).unwrap();
        let transfer_config = config.transfer_config;

        assert_eq!(transfer_config.multipart_chunksize, 5 * 1024 * 1024);
        assert!(!transfer_config.content_md5_header);
        assert!(!transfer_config.reuse_uploaded_parts);
        assert!(!transfer_config.verify_e_tag);
        assert!(transfer_config.abort_on_failure);
    }

    #[test]
    fn with_too_small_chunksize() {
        init_dummy_tracing_subscriber();

        let args = vec![
            "s3upload",
            "--multipart-chunksize",
            "4MiB",
            "-",
            "s3://target-bucket/target_key",
        ];

        assert!(parse_from_args(args).is_err());
    }

    #[test]
    fn with_too_large_chunksize() {
        init_dummy_tracing_subscriber();

        let args = vec![
            "s3upload",
            "--multipart-chunksize",
            "6GiB",
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
