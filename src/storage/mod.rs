use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;

use crate::types::{PartRecord, UploadMetadata, UploadResult, UploadedPart};

pub mod s3;

pub type SharedUploadClient = Arc<dyn UploadClient + Send + Sync>;

/// Operations of the object store the upload orchestrator depends on.
///
/// Every method may fail with a transport error. Callers treat any failure as fatal for the
/// current upload and never retry.
#[async_trait]
pub trait UploadClient {
    /// Most recently initiated incomplete multipart upload whose key equals `key` exactly.
    async fn find_existing_session(&self, bucket: &str, key: &str) -> Result<Option<String>>;
    async fn create_session(
        &self,
        bucket: &str,
        key: &str,
        metadata: &UploadMetadata,
    ) -> Result<String>;
    async fn list_uploaded_parts(
        &self,
        bucket: &str,
        key: &str,
        upload_id: &str,
    ) -> Result<Vec<PartRecord>>;
    async fn upload_whole(
        &self,
        bucket: &str,
        key: &str,
        metadata: &UploadMetadata,
        body: Vec<u8>,
        content_md5: Option<String>,
    ) -> Result<UploadResult>;
    /// Returns the ETag of the stored part.
    #[allow(clippy::too_many_arguments)]
    async fn upload_part(
        &self,
        bucket: &str,
        key: &str,
        upload_id: &str,
        part_number: i32,
        body: Vec<u8>,
        content_md5: Option<String>,
    ) -> Result<String>;
    async fn complete_session(
        &self,
        bucket: &str,
        key: &str,
        upload_id: &str,
        parts: &[UploadedPart],
    ) -> Result<UploadResult>;
    async fn abort_session(&self, bucket: &str, key: &str, upload_id: &str) -> Result<()>;
}
