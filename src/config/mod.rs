use aws_sdk_s3::primitives::DateTime as S3DateTime;
use aws_sdk_s3::types::{ObjectCannedAcl, ServerSideEncryption, StorageClass};
use aws_smithy_types::checksum_config::RequestChecksumCalculation;
use chrono::{DateTime, Utc};
use std::collections::HashMap;

use crate::types::{
    ClientConfigLocation, S3Credentials, SseKmsKeyId, UploadMetadata, UploadSource, UploadTarget,
};

pub mod args;

#[derive(Debug, Clone)]
pub struct Config {
    pub source: UploadSource,
    pub target: UploadTarget,
    pub target_client_config: ClientConfig,
    pub tracing_config: Option<TracingConfig>,
    pub transfer_config: TransferConfig,
    pub storage_class: Option<StorageClass>,
    pub sse: Option<ServerSideEncryption>,
    pub sse_kms_key_id: SseKmsKeyId,
    pub canned_acl: Option<ObjectCannedAcl>,
    pub cache_control: Option<String>,
    pub content_disposition: Option<String>,
    pub content_encoding: Option<String>,
    pub content_language: Option<String>,
    pub content_type: Option<String>,
    pub expires: Option<DateTime<Utc>>,
    pub metadata: Option<HashMap<String, String>>,
    pub tagging: Option<String>,
    pub no_guess_mime_type: bool,
    pub auto_complete_shell: Option<clap_complete::shells::Shell>,
}

impl Config {
    /// Headers and attributes the object is created with.
    pub fn upload_metadata(&self) -> UploadMetadata {
        UploadMetadata {
            acl: self.canned_acl.clone(),
            cache_control: self.cache_control.clone(),
            content_disposition: self.content_disposition.clone(),
            content_encoding: self.content_encoding.clone(),
            content_language: self.content_language.clone(),
            content_type: self.resolve_content_type(),
            expires: self
                .expires
                .map(|expires| S3DateTime::from_secs(expires.timestamp())),
            metadata: self.metadata.clone(),
            storage_class: self.storage_class.clone(),
            tagging: self.tagging.clone(),
            sse: self.sse.clone(),
            sse_kms_key_id: self.sse_kms_key_id.clone(),
        }
    }

    fn resolve_content_type(&self) -> Option<String> {
        if self.content_type.is_some() {
            return self.content_type.clone();
        }

        guess_content_type(&self.source, self.no_guess_mime_type)
    }
}

fn guess_content_type(source: &UploadSource, no_guess_mime_type: bool) -> Option<String> {
    if no_guess_mime_type {
        return None;
    }

    match source {
        UploadSource::Local(path) => Some(
            mime_guess::from_path(path)
                .first_or_octet_stream()
                .to_string(),
        ),
        UploadSource::Stdin => None,
    }
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub client_config_location: ClientConfigLocation,
    pub credential: S3Credentials,
    pub region: Option<String>,
    pub endpoint_url: Option<String>,
    pub force_path_style: bool,
    pub accelerate: bool,
    pub retry_config: RetryConfig,
    pub cli_timeout_config: CLITimeoutConfig,
    pub disable_stalled_stream_protection: bool,
    pub request_checksum_calculation: RequestChecksumCalculation,
}

#[derive(Debug, Clone)]
pub struct RetryConfig {
    pub aws_max_attempts: u32,
    pub initial_backoff_milliseconds: u64,
}

#[derive(Debug, Clone)]
pub struct CLITimeoutConfig {
    pub operation_timeout_milliseconds: Option<u64>,
    pub operation_attempt_timeout_milliseconds: Option<u64>,
    pub connect_timeout_milliseconds: Option<u64>,
    pub read_timeout_milliseconds: Option<u64>,
}

#[derive(Debug, Clone, Copy)]
pub struct TracingConfig {
    pub tracing_level: log::Level,
    pub json_tracing: bool,
    pub aws_sdk_tracing: bool,
    pub span_events_tracing: bool,
    pub disable_color_tracing: bool,
}

#[derive(Debug, Clone, Copy)]
pub struct TransferConfig {
    /// Size of every part but the last. The first chunk decides single-shot vs multipart.
    pub multipart_chunksize: u64,
    pub content_md5_header: bool,
    pub reuse_uploaded_parts: bool,
    pub verify_e_tag: bool,
    pub abort_on_failure: bool,
}

impl TransferConfig {
    pub fn is_multipart_upload_required(&self, content_length: u64) -> bool {
        self.multipart_chunksize <= content_length
    }
}

impl Default for TransferConfig {
    fn default() -> Self {
        TransferConfig {
            multipart_chunksize: 8 * 1024 * 1024,
            content_md5_header: true,
            reuse_uploaded_parts: true,
            verify_e_tag: true,
            abort_on_failure: false,
        }
    }
}
