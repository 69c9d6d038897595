use crate::Config;
use crate::config::args::value_parser::{
    canned_acl, human_bytes, metadata, sse, storage_class, tagging, upload_path, url,
};
use crate::config::{CLITimeoutConfig, ClientConfig, RetryConfig, TracingConfig, TransferConfig};
use crate::types::{AccessKeys, ClientConfigLocation, S3Credentials, SseKmsKeyId, UploadSource};
use aws_sdk_s3::types::{ObjectCannedAcl, ServerSideEncryption, StorageClass};
use aws_smithy_types::checksum_config::RequestChecksumCalculation;
use chrono::{DateTime, Utc};
use clap::Parser;
use clap::builder::{ArgPredicate, NonEmptyStringValueParser};
use clap_verbosity_flag::{Verbosity, WarnLevel};
#[cfg(feature = "version")]
use shadow_rs::shadow;
use std::ffi::OsString;
use std::path::PathBuf;
use std::str::FromStr;

mod tests;
mod value_parser;

const DEFAULT_AWS_MAX_ATTEMPTS: u32 = 10;
const DEFAULT_INITIAL_BACKOFF_MILLISECONDS: u64 = 100;
const DEFAULT_JSON_TRACING: bool = false;
const DEFAULT_AWS_SDK_TRACING: bool = false;
const DEFAULT_SPAN_EVENTS_TRACING: bool = false;
const DEFAULT_DISABLE_COLOR_TRACING: bool = false;
const DEFAULT_MULTIPART_CHUNKSIZE: &str = "8MiB";
const DEFAULT_FORCE_PATH_STYLE: bool = false;
const DEFAULT_ACCELERATE: bool = false;
const DEFAULT_NO_GUESS_MIME_TYPE: bool = false;
const DEFAULT_DISABLE_STALLED_STREAM_PROTECTION: bool = false;
const DEFAULT_DISABLE_CONTENT_MD5_HEADER: bool = false;
const DEFAULT_DISABLE_ETAG_VERIFY: bool = false;
const DEFAULT_DISABLE_PART_REUSE: bool = false;
const DEFAULT_ABORT_ON_FAILURE: bool = false;

const SOURCE_FILE_NOT_FOUND: &str = "source file not found\n";
const SOURCE_IS_NOT_A_FILE: &str = "source must be a regular file or '-'\n";
const SSE_KMS_KEY_ID_ARGUMENTS_CONFLICT: &str =
    "--sse-kms-key-id must be used with --sse aws:kms | aws:kms:dsse\n";
const STDIN_SOURCE_SPECIFIED_WITH_NO_GUESS_MIME_TYPE: &str =
    "with --no-guess-mime-type, source must be a local file\n";

#[cfg(feature = "version")]
shadow!(build);

#[derive(Parser, Clone, Debug)]
#[cfg_attr(feature = "version", command(version=format!("{} ({} {}), {}", build::PKG_VERSION, build::SHORT_COMMIT, build::BUILD_TARGET, build::RUST_VERSION)))]
pub struct CLIArgs {
    #[arg(env, help = "local file path, or '-' to read from stdin", value_parser = upload_path::check_source, default_value_if("auto_complete_shell", ArgPredicate::IsPresent, "-"), required = false)]
    source: String,

    #[arg(env, help = "s3://<BUCKET_NAME>/<KEY>", value_parser = upload_path::check_target, default_value_if("auto_complete_shell", ArgPredicate::IsPresent, "s3://ignored/ignored"), required = false)]
    target: String,

    /// location of the file that the AWS CLI uses to store configuration profiles
    #[arg(long, env, value_name = "FILE", help_heading = "AWS Configuration")]
    aws_config_file: Option<PathBuf>,

    /// location of the file that the AWS CLI uses to store access keys
    #[arg(long, env, value_name = "FILE", help_heading = "AWS Configuration")]
    aws_shared_credentials_file: Option<PathBuf>,

    /// target AWS CLI profile
    #[arg(long, env, conflicts_with_all = ["target_access_key", "target_secret_access_key", "target_session_token"], help_heading = "AWS Configuration")]
    target_profile: Option<String>,

    /// target access key
    #[arg(long, env, conflicts_with_all = ["target_profile"], requires = "target_secret_access_key", help_heading = "AWS Configuration")]
    target_access_key: Option<String>,

    /// target secret access key
    #[arg(long, env, conflicts_with_all = ["target_profile"], requires = "target_access_key", help_heading = "AWS Configuration")]
    target_secret_access_key: Option<String>,

    /// target session token
    #[arg(long, env, conflicts_with_all = ["target_profile"], requires = "target_access_key", help_heading = "AWS Configuration")]
    target_session_token: Option<String>,

    /// target region
    #[arg(long, env, value_parser = NonEmptyStringValueParser::new(), help_heading = "Target Options")]
    target_region: Option<String>,

    /// target endpoint url
    #[arg(long, env, value_parser = url::check_scheme, help_heading = "Target Options")]
    target_endpoint_url: Option<String>,

    /// use Amazon S3 Transfer Acceleration for the target bucket.
    #[arg(long, env, default_value_t = DEFAULT_ACCELERATE, help_heading = "Target Options")]
    target_accelerate: bool,

    /// force path-style addressing for target endpoint.
    #[arg(long, env, default_value_t = DEFAULT_FORCE_PATH_STYLE, help_heading = "Target Options")]
    target_force_path_style: bool,

    /// type of storage to use for the target object.
    /// valid choices: STANDARD | REDUCED_REDUNDANCY | STANDARD_IA | ONEZONE_IA | INTELLIGENT_TIERING | GLACIER | DEEP_ARCHIVE | GLACIER_IR
    #[arg(long, env, value_parser = storage_class::parse_storage_class, help_heading = "Target Options")]
    storage_class: Option<String>,

    /// size of every part but the last. the first chunk decides whether multipart upload is used.
    #[arg(long, env, default_value = DEFAULT_MULTIPART_CHUNKSIZE, value_parser = human_bytes::check_human_bytes, help_heading = "Multipart Settings")]
    multipart_chunksize: String,

    /// always upload every part, even if an incomplete multipart upload already holds a matching one.
    #[arg(long, env, default_value_t = DEFAULT_DISABLE_PART_REUSE, help_heading = "Multipart Settings")]
    disable_part_reuse: bool,

    /// abort the multipart upload when the upload fails. the uploaded parts are discarded and cannot be resumed.
    #[arg(long, env, default_value_t = DEFAULT_ABORT_ON_FAILURE, help_heading = "Multipart Settings")]
    abort_on_failure: bool,

    /// disable ETag verification after the upload.
    #[arg(long, env, default_value_t = DEFAULT_DISABLE_ETAG_VERIFY, help_heading = "Verification")]
    disable_etag_verify: bool,

    /// do not send the Content-MD5 header with each request.
    #[arg(long, env, default_value_t = DEFAULT_DISABLE_CONTENT_MD5_HEADER, help_heading = "Verification")]
    disable_content_md5_header: bool,

    /// Cache-Control HTTP header to set on the target object
    #[arg(long, env, help_heading = "Metadata/Headers")]
    cache_control: Option<String>,

    /// Content-Disposition HTTP header to set on the target object
    #[arg(long, env, help_heading = "Metadata/Headers")]
    content_disposition: Option<String>,

    /// Content-Encoding HTTP header to set on the target object
    #[arg(long, env, help_heading = "Metadata/Headers")]
    content_encoding: Option<String>,

    /// Content-Language HTTP header to set on the target object
    #[arg(long, env, help_heading = "Metadata/Headers")]
    content_language: Option<String>,

    /// Content-Type HTTP header to set on the target object. if not specified, it is guessed from the source file name.
    #[arg(long, env, help_heading = "Metadata/Headers")]
    content_type: Option<String>,

    /// Expires HTTP header to set on the target object(RFC3339 datetime such as 2023-02-19T12:00:00Z)
    #[arg(long, env, help_heading = "Metadata/Headers")]
    expires: Option<DateTime<Utc>>,

    /// metadata to set on the target object. e.g. --metadata "key1=value1,key2=value2".
    #[arg(long, env, value_parser = metadata::check_metadata, help_heading = "Metadata/Headers")]
    metadata: Option<String>,

    /// tagging to set on the target object. e.g. --tagging "key1=value1&key2=value2". must be encoded as UTF-8 then URLEncoded URL query parameters without tag name duplicates.
    #[arg(long, env, value_parser = tagging::parse_tagging, help_heading = "Tagging")]
    tagging: Option<String>,

    /// server-side encryption. valid choices: AES256 | aws:kms | aws:kms:dsse
    #[arg(long, env, value_parser = sse::parse_sse, help_heading = "Encryption")]
    sse: Option<String>,

    /// SSE KMS ID key
    #[arg(long, env, help_heading = "Encryption")]
    sse_kms_key_id: Option<String>,

    /// trace verbosity(-v: show info, -vv: show debug, -vvv show trace)
    #[clap(flatten)]
    verbosity: Verbosity<WarnLevel>,

    /// show trace as json format
    #[arg(long, env, default_value_t = DEFAULT_JSON_TRACING, help_heading = "Tracing/Logging")]
    json_tracing: bool,

    /// enable aws sdk tracing
    #[arg(long, env, default_value_t = DEFAULT_AWS_SDK_TRACING, help_heading = "Tracing/Logging")]
    aws_sdk_tracing: bool,

    /// show span event tracing
    #[arg(long, env, default_value_t = DEFAULT_SPAN_EVENTS_TRACING, help_heading = "Tracing/Logging")]
    span_events_tracing: bool,

    /// disable ANSI terminal colors
    #[arg(long, env, default_value_t = DEFAULT_DISABLE_COLOR_TRACING, help_heading = "Tracing/Logging")]
    disable_color_tracing: bool,

    /// maximum retry attempts that the AWS SDK retry handler uses
    #[arg(long, env, default_value_t = DEFAULT_AWS_MAX_ATTEMPTS, value_name = "max_attempts", help_heading = "Retry Options")]
    aws_max_attempts: u32,

    /// a multiplier value used when calculating backoff times as part of an exponential backoff with jitter strategy.
    #[arg(long, env, default_value_t = DEFAULT_INITIAL_BACKOFF_MILLISECONDS, value_name = "initial_backoff", help_heading = "Retry Options")]
    initial_backoff_milliseconds: u64,

    /// operation timeout (milliseconds). For details, see the AWS SDK for Rust TimeoutConfig documentation.
    /// The default has no timeout.
    #[arg(
        long,
        env,
        value_name = "operation_timeout",
        help_heading = "Timeout Options"
    )]
    operation_timeout_milliseconds: Option<u64>,

    /// operation attempt timeout (milliseconds). For details, see the AWS SDK for Rust TimeoutConfig documentation.
    /// The default has no timeout.
    #[arg(
        long,
        env,
        value_name = "operation_attempt_timeout",
        help_heading = "Timeout Options"
    )]
    operation_attempt_timeout_milliseconds: Option<u64>,

    /// connect timeout (milliseconds).
    /// The default has AWS SDK default timeout (Currently 3100 milliseconds).
    #[arg(
        long,
        env,
        value_name = "connect_timeout",
        help_heading = "Timeout Options"
    )]
    connect_timeout_milliseconds: Option<u64>,

    /// read timeout (milliseconds).
    /// The default has no timeout.
    #[arg(
        long,
        env,
        value_name = "read_timeout",
        help_heading = "Timeout Options"
    )]
    read_timeout_milliseconds: Option<u64>,

    /// canned ACL applied to the target object.
    /// valid choices: private | public-read | public-read-write | authenticated-read | aws-exec-read | bucket-owner-read | bucket-owner-full-control
    #[arg(long, env, value_parser = canned_acl::parse_canned_acl, help_heading = "Advanced")]
    acl: Option<String>,

    /// do not guess the MIME type from the source file name.
    #[arg(long, env, default_value_t = DEFAULT_NO_GUESS_MIME_TYPE, help_heading = "Advanced")]
    no_guess_mime_type: bool,

    /// generate a auto completions script. Valid choices: bash, fish, zsh, powershell, elvish.
    #[arg(long, env, value_name = "SHELL", value_parser = clap_complete::shells::Shell::from_str, help_heading = "Advanced")]
    auto_complete_shell: Option<clap_complete::shells::Shell>,

    /// disable stalled stream protection
    #[arg(long, env, default_value_t = DEFAULT_DISABLE_STALLED_STREAM_PROTECTION, help_heading = "Advanced")]
    disable_stalled_stream_protection: bool,
}

pub fn parse_from_args<I, T>(args: I) -> Result<CLIArgs, clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    CLIArgs::try_parse_from(args)
}

pub fn build_config_from_args<I, T>(args: I) -> Result<Config, String>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let config_args = CLIArgs::try_parse_from(args).map_err(|e| e.to_string())?;
    crate::Config::try_from(config_args)
}

impl CLIArgs {
    fn validate_upload_config(&self) -> Result<(), String> {
        self.check_source_file()?;
        self.check_sse_conflict()?;
        self.check_no_guess_mime_type_conflict()?;

        Ok(())
    }

    fn check_source_file(&self) -> Result<(), String> {
        // completion script generation does not need a source
        if self.auto_complete_shell.is_some() {
            return Ok(());
        }

        let UploadSource::Local(path) = upload_path::parse_source(&self.source) else {
            return Ok(());
        };

        if !path.exists() {
            return Err(SOURCE_FILE_NOT_FOUND.to_string());
        }
        if !path.is_file() {
            return Err(SOURCE_IS_NOT_A_FILE.to_string());
        }

        Ok(())
    }

    fn check_sse_conflict(&self) -> Result<(), String> {
        if self.sse_kms_key_id.is_none() {
            return Ok(());
        }

        let is_kms = self.sse.as_deref().is_some_and(|sse| {
            matches!(
                ServerSideEncryption::from(sse),
                ServerSideEncryption::AwsKms | ServerSideEncryption::AwsKmsDsse
            )
        });
        if !is_kms {
            return Err(SSE_KMS_KEY_ID_ARGUMENTS_CONFLICT.to_string());
        }

        Ok(())
    }

    fn check_no_guess_mime_type_conflict(&self) -> Result<(), String> {
        if self.no_guess_mime_type
            && upload_path::parse_source(&self.source) == UploadSource::Stdin
        {
            return Err(STDIN_SOURCE_SPECIFIED_WITH_NO_GUESS_MIME_TYPE.to_string());
        }

        Ok(())
    }

    fn build_client_config(&self) -> ClientConfig {
        let credential = if let Some(target_profile) = self.target_profile.clone() {
            S3Credentials::Profile(target_profile)
        } else if let (Some(access_key), Some(secret_access_key)) = (
            self.target_access_key.clone(),
            self.target_secret_access_key.clone(),
        ) {
            S3Credentials::Credentials {
                access_keys: AccessKeys {
                    access_key,
                    secret_access_key,
                    session_token: self.target_session_token.clone(),
                },
            }
        } else {
            S3Credentials::FromEnvironment
        };

        ClientConfig {
            client_config_location: ClientConfigLocation {
                aws_config_file: self.aws_config_file.clone(),
                aws_shared_credentials_file: self.aws_shared_credentials_file.clone(),
            },
            credential,
            region: self.target_region.clone(),
            endpoint_url: self.target_endpoint_url.clone(),
            force_path_style: self.target_force_path_style,
            accelerate: self.target_accelerate,
            retry_config: RetryConfig {
                aws_max_attempts: self.aws_max_attempts,
                initial_backoff_milliseconds: self.initial_backoff_milliseconds,
            },
            cli_timeout_config: CLITimeoutConfig {
                operation_timeout_milliseconds: self.operation_timeout_milliseconds,
                operation_attempt_timeout_milliseconds: self.operation_attempt_timeout_milliseconds,
                connect_timeout_milliseconds: self.connect_timeout_milliseconds,
                read_timeout_milliseconds: self.read_timeout_milliseconds,
            },
            disable_stalled_stream_protection: self.disable_stalled_stream_protection,
            // Content-MD5 is computed by this crate, so the SDK checksums stay opt-in.
            request_checksum_calculation: RequestChecksumCalculation::WhenRequired,
        }
    }
}

impl TryFrom<CLIArgs> for Config {
    type Error = String;

    fn try_from(value: CLIArgs) -> Result<Self, Self::Error> {
        value.validate_upload_config()?;

        let target_client_config = value.build_client_config();

        let tracing_config = value.verbosity.log_level().map(|log_level| TracingConfig {
            tracing_level: log_level,
            json_tracing: value.json_tracing,
            aws_sdk_tracing: value.aws_sdk_tracing,
            span_events_tracing: value.span_events_tracing,
            disable_color_tracing: value.disable_color_tracing,
        });

        let storage_class = value
            .storage_class
            .as_deref()
            .map(StorageClass::from);
        let sse = value.sse.as_deref().map(ServerSideEncryption::from);
        let canned_acl = value.acl.as_deref().map(ObjectCannedAcl::from);

        let metadata = value
            .metadata
            .as_deref()
            .map(metadata::parse_metadata)
            .transpose()?;

        Ok(Config {
            source: upload_path::parse_source(&value.source),
            target: upload_path::parse_target(&value.target)?,
            target_client_config,
            tracing_config,
            transfer_config: TransferConfig {
                multipart_chunksize: human_bytes::parse_human_bytes(&value.multipart_chunksize)?,
                content_md5_header: !value.disable_content_md5_header,
                reuse_uploaded_parts: !value.disable_part_reuse,
                verify_e_tag: !value.disable_etag_verify,
                abort_on_failure: value.abort_on_failure,
            },
            storage_class,
            sse,
            sse_kms_key_id: SseKmsKeyId {
                id: value.sse_kms_key_id.clone(),
            },
            canned_acl,
            cache_control: value.cache_control.clone(),
            content_disposition: value.content_disposition.clone(),
            content_encoding: value.content_encoding.clone(),
            content_language: value.content_language.clone(),
            content_type: value.content_type.clone(),
            expires: value.expires,
            metadata,
            tagging: value.tagging.clone(),
            no_guess_mime_type: value.no_guess_mime_type,
            auto_complete_shell: value.auto_complete_shell,
        })
    }
}
