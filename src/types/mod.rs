use std::collections::HashMap;
use std::fmt;
use std::fmt::{Debug, Formatter};
use std::path::PathBuf;

use aws_sdk_s3::primitives::DateTime;
use aws_sdk_s3::types::{ObjectCannedAcl, ServerSideEncryption, StorageClass};
use zeroize_derive::{Zeroize, ZeroizeOnDrop};

pub mod error;
pub mod token;

/// Lowest part number accepted by S3.
pub const MIN_PART_NUMBER: i32 = 1;
/// Highest part number accepted by S3.
pub const MAX_PART_NUMBER: i32 = 10_000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadSource {
    Local(PathBuf),
    Stdin,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadTarget {
    pub bucket: String,
    pub key: String,
}

/// Headers and attributes sent with `PutObject` or `CreateMultipartUpload`.
#[derive(Default, Debug, Clone)]
pub struct UploadMetadata {
    pub acl: Option<ObjectCannedAcl>,
    pub cache_control: Option<String>,
    pub content_disposition: Option<String>,
    pub content_encoding: Option<String>,
    pub content_language: Option<String>,
    pub content_type: Option<String>,
    pub expires: Option<DateTime>,
    pub metadata: Option<HashMap<String, String>>,
    pub storage_class: Option<StorageClass>,
    pub tagging: Option<String>,
    pub sse: Option<ServerSideEncryption>,
    pub sse_kms_key_id: SseKmsKeyId,
}

/// A part that is already stored on the server for an incomplete multipart upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartRecord {
    pub part_number: i32,
    pub digest: String,
}

/// A part known to be durably stored for the current upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedPart {
    pub part_number: i32,
    pub e_tag: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadResult {
    pub e_tag: String,
    pub version_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadStatistics {
    UploadBytes(u64),
    PartUploaded { key: String, part_number: i32 },
    PartSkipped { key: String, part_number: i32 },
    EtagVerified { key: String },
    UploadWarning { key: String },
    UploadComplete { key: String },
    UploadError { key: String },
}

#[derive(Debug, Clone)]
pub struct ClientConfigLocation {
    pub aws_config_file: Option<PathBuf>,
    pub aws_shared_credentials_file: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub enum S3Credentials {
    Profile(String),
    Credentials { access_keys: AccessKeys },
    FromEnvironment,
}

#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct AccessKeys {
    pub access_key: String,
    pub secret_access_key: String,
    pub session_token: Option<String>,
}

impl Debug for AccessKeys {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let session_token = self
            .session_token
            .as_ref()
            .map_or("None", |_| "** redacted **");
        f.debug_struct("AccessKeys")
            .field("access_key", &self.access_key)
            .field("secret_access_key", &"** redacted **")
            .field("session_token", &session_token)
            .finish()
    }
}

#[derive(Clone, Default, Zeroize, ZeroizeOnDrop)]
pub struct SseKmsKeyId {
    pub id: Option<String>,
}

impl Debug for SseKmsKeyId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let sse_kms_key_id = self.id.as_ref().map_or("None", |_| "** redacted **");
        f.debug_struct("SseKmsKeyId")
            .field("sse_kms_key_id", &sse_kms_key_id)
            .finish()
    }
}
