#[cfg(test)]
mod tests {
    use crate::config::args::*;

    #[test]
    fn with_sse_kms() {
        init_dummy_tracing_subscriber();

        let args = vec![
            "s3upload",
            "--sse",
            "aws:kms",
            "--sse-kms-key-id",
            "my_kms_key_id",
            "-",
            "s3://target-bucket/target_key",
        ];

        let config = build_config_from_args(args).unwrap();

        assert_eq!(config.sse, Some(ServerSideEncryption::AwsKms));
        assert_eq!(config.sse_kms_key_id.id, Some("my_kms_key_id".to_string()));
    }

    #[test]
    fn with_sse_kms_dsse() {
        init_dummy_tracing_subscriber();

        let args = vec![
            "s3upload",
            "--sse",
            "aws:kms:dsse",
            "--sse-kms-key-id",
            "my_kms_key_id",
            "-",
            "s3://target-bucket/target_key",
        ];

        let config = build_config_from_args(args).unwrap();
        assert_eq!(config.sse, Some(ServerSideEncryption::AwsKmsDsse));
    }

    #[test]
    fn with_sse_aes256() {
        init_dummy_tracing_subscriber();

        let args = vec![
            "s3upload",
            "--sse",
            "AES256",
            "-",
            "s3://target-bucket/target_key",
        ];

        let config = build_config_from_args(args).unwrap();
        assert_eq!(config.sse, Some(ServerSideEncryption::Aes256));
        assert!(config.sse_kms_key_id.id.is_none());
    }

    #[test]
    fn sse_kms_key_id_without_sse() {
        init_dummy_tracing_subscriber();

        let args = vec![
            "s3upload",
            "--sse-kms-key-id",
            "my_kms_key_id",
            "-",
            "s3://target-bucket/target_key",
        ];

        let result = build_config_from_args(args);
        assert_eq!(
            result.unwrap_err(),
            SSE_KMS_KEY_ID_ARGUMENTS_CONFLICT.to_string()
        );
    }

    #[test]
    fn sse_kms_key_id_with_aes256() {
        init_dummy_tracing_subscriber();

        let args = vec![
            "s3upload",
            "--sse",
            "AES256",
            "--sse-kms-key-id",
            "my_kms_key_id",
            "-",
            "s3://target-bucket/target_key",
        ];

        let result = build_config_from_args(args);
        assert_eq!(
            result.unwrap_err(),
            SSE_KMS_KEY_ID_ARGUMENTS_CONFLICT.to_string()
        );
    }

    fn init_dummy_tracing_subscriber() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter("dummy=trace")
            .try_init();
    }
}
