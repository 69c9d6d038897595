use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use aws_sdk_s3::Client;
use aws_sdk_s3::primitives::{ByteStream, DateTime};
use aws_sdk_s3::types::{CompletedMultipartUpload, CompletedPart, MultipartUpload};
use tracing::{debug, trace};

use crate::config::ClientConfig;
use crate::storage::{SharedUploadClient, UploadClient};
use crate::types::error::S3uploadError;
use crate::types::{PartRecord, UploadMetadata, UploadResult, UploadedPart};

mod client_builder;

/// `UploadClient` backed by the AWS SDK.
#[derive(Clone)]
pub struct S3UploadClient {
    client: Arc<Client>,
}

impl S3UploadClient {
    pub fn new(client: Arc<Client>) -> Self {
        S3UploadClient { client }
    }

    pub async fn create(client_config: &ClientConfig) -> SharedUploadClient {
        Arc::new(S3UploadClient::new(Arc::new(
            client_config.create_client().await,
        )))
    }
}

#[async_trait]
impl UploadClient for S3UploadClient {
    async fn find_existing_session(&self, bucket: &str, key: &str) -> Result<Option<String>> {
        let mut latest: Option<(DateTime, String)> = None;
        let mut key_marker = None;
        let mut upload_id_marker = None;
        loop {
            let list_multipart_uploads_output = self
                .client
                .list_multipart_uploads()
                .bucket(bucket)
                .prefix(key)
                .set_key_marker(key_marker)
                .set_upload_id_marker(upload_id_marker)
                .send()
                .await
                .context("aws_sdk_s3::client::Client list_multipart_uploads() failed.")?;

            if let Some(candidate) = find_latest_upload(list_multipart_uploads_output.uploads(), key)
            {
                if latest
                    .as_ref()
                    .is_none_or(|(initiated, _)| is_newer(&candidate.0, initiated))
                {
                    latest = Some(candidate);
                }
            }

            if !list_multipart_uploads_output.is_truncated().unwrap_or(false) {
                break;
            }

            key_marker = list_multipart_uploads_output
                .next_key_marker()
                .map(|marker| marker.to_string());
            upload_id_marker = list_multipart_uploads_output
                .next_upload_id_marker()
                .map(|marker| marker.to_string());
            if key_marker.is_none() && upload_id_marker.is_none() {
                break;
            }
        }

        trace!(key = key, "latest incomplete multipart upload: {latest:?}");

        Ok(latest.map(|(_, upload_id)| upload_id))
    }

    async fn create_session(
        &self,
        bucket: &str,
        key: &str,
        metadata: &UploadMetadata,
    ) -> Result<String> {
        let create_multipart_upload_output = self
            .client
            .create_multipart_upload()
            .bucket(bucket)
            .key(key)
            .set_storage_class(metadata.storage_class.clone())
            .set_metadata(metadata.metadata.clone())
            .set_tagging(metadata.tagging.clone())
            .set_content_type(metadata.content_type.clone())
            .set_content_encoding(metadata.content_encoding.clone())
            .set_cache_control(metadata.cache_control.clone())
            .set_content_disposition(metadata.content_disposition.clone())
            .set_content_language(metadata.content_language.clone())
            .set_expires(metadata.expires)
            .set_server_side_encryption(metadata.sse.clone())
            .set_ssekms_key_id(metadata.sse_kms_key_id.id.clone())
            .set_acl(metadata.acl.clone())
            .send()
            .await
            .context("aws_sdk_s3::client::Client create_multipart_upload() failed.")?;

        trace!(key = key, "{create_multipart_upload_output:?}");

        create_multipart_upload_output
            .upload_id()
            .map(|upload_id| upload_id.to_string())
            .ok_or_else(|| anyhow!(S3uploadError::MissingUploadId))
    }

    async fn list_uploaded_parts(
        &self,
        bucket: &str,
        key: &str,
        upload_id: &str,
    ) -> Result<Vec<PartRecord>> {
        let mut part_records = vec![];
        let mut part_number_marker = None;
        loop {
            let list_parts_output = self
                .client
                .list_parts()
                .bucket(bucket)
                .key(key)
                .upload_id(upload_id)
                .set_part_number_marker(part_number_marker)
                .send()
                .await
                .context("aws_sdk_s3::client::Client list_parts() failed.")?;

            for part in list_parts_output.parts() {
                if let (Some(part_number), Some(e_tag)) = (part.part_number(), part.e_tag()) {
                    part_records.push(PartRecord {
                        part_number,
                        digest: e_tag.to_string(),
                    });
                }
            }

            if !list_parts_output.is_truncated().unwrap_or(false) {
                break;
            }

            part_number_marker = list_parts_output
                .next_part_number_marker()
                .map(|marker| marker.to_string());
            if part_number_marker.is_none() {
                break;
            }
        }

        debug!(
            key = key,
            upload_id = upload_id,
            parts = part_records.len(),
            "uploaded parts listed."
        );

        Ok(part_records)
    }

    async fn upload_whole(
        &self,
        bucket: &str,
        key: &str,
        metadata: &UploadMetadata,
        body: Vec<u8>,
        content_md5: Option<String>,
    ) -> Result<UploadResult> {
        let content_length = body.len() as i64;

        // An SdkBody built from in-memory data is retryable.
        let put_object_output = self
            .client
            .put_object()
            .bucket(bucket)
            .key(key)
            .content_length(content_length)
            .body(ByteStream::from(body))
            .set_content_md5(content_md5)
            .set_storage_class(metadata.storage_class.clone())
            .set_metadata(metadata.metadata.clone())
            .set_tagging(metadata.tagging.clone())
            .set_content_type(metadata.content_type.clone())
            .set_content_encoding(metadata.content_encoding.clone())
            .set_cache_control(metadata.cache_control.clone())
            .set_content_disposition(metadata.content_disposition.clone())
            .set_content_language(metadata.content_language.clone())
            .set_expires(metadata.expires)
            .set_server_side_encryption(metadata.sse.clone())
            .set_ssekms_key_id(metadata.sse_kms_key_id.id.clone())
            .set_acl(metadata.acl.clone())
            .send()
            .await
            .context("aws_sdk_s3::client::Client put_object() failed.")?;

        trace!(key = key, "{put_object_output:?}");

        Ok(UploadResult {
            e_tag: put_object_output
                .e_tag()
                .map(|e_tag| e_tag.to_string())
                .ok_or_else(|| anyhow!(S3uploadError::MissingETag))?,
            version_id: put_object_output.version_id().map(|v| v.to_string()),
        })
    }

    async fn upload_part(
        &self,
        bucket: &str,
        key: &str,
        upload_id: &str,
        part_number: i32,
        body: Vec<u8>,
        content_md5: Option<String>,
    ) -> Result<String> {
        let content_length = body.len() as i64;

        let upload_part_output = self
            .client
            .upload_part()
            .bucket(bucket)
            .key(key)
            .upload_id(upload_id)
            .part_number(part_number)
            .content_length(content_length)
            .set_content_md5(content_md5)
            .body(ByteStream::from(body))
            .send()
            .await
            .context("aws_sdk_s3::client::Client upload_part() failed.")?;

        trace!(key = key, "{upload_part_output:?}");

        upload_part_output
            .e_tag()
            .map(|e_tag| e_tag.to_string())
            .ok_or_else(|| anyhow!(S3uploadError::MissingETag))
    }

    async fn complete_session(
        &self,
        bucket: &str,
        key: &str,
        upload_id: &str,
        parts: &[UploadedPart],
    ) -> Result<UploadResult> {
        let completed_parts = parts
            .iter()
            .map(|part| {
                CompletedPart::builder()
                    .e_tag(&part.e_tag)
                    .part_number(part.part_number)
                    .build()
            })
            .collect::<Vec<_>>();

        let completed_multipart_upload = CompletedMultipartUpload::builder()
            .set_parts(Some(completed_parts))
            .build();

        let complete_multipart_upload_output = self
            .client
            .complete_multipart_upload()
            .bucket(bucket)
            .key(key)
            .upload_id(upload_id)
            .multipart_upload(completed_multipart_upload)
            .send()
            .await
            .context("aws_sdk_s3::client::Client complete_multipart_upload() failed.")?;

        trace!(
            key = key,
            upload_id = upload_id,
            "{complete_multipart_upload_output:?}"
        );

        Ok(UploadResult {
            e_tag: complete_multipart_upload_output
                .e_tag()
                .map(|e_tag| e_tag.to_string())
                .ok_or_else(|| anyhow!(S3uploadError::MissingETag))?,
            version_id: complete_multipart_upload_output
                .version_id()
                .map(|v| v.to_string()),
        })
    }

    async fn abort_session(&self, bucket: &str, key: &str, upload_id: &str) -> Result<()> {
        self.client
            .abort_multipart_upload()
            .bucket(bucket)
            .key(key)
            .upload_id(upload_id)
            .send()
            .await
            .context("aws_sdk_s3::client::Client abort_multipart_upload() failed.")?;

        Ok(())
    }
}

/// `ListMultipartUploads` filters by prefix only, so other keys sharing the prefix are dropped.
fn find_latest_upload(uploads: &[MultipartUpload], key: &str) -> Option<(DateTime, String)> {
    uploads
        .iter()
        .filter(|upload| upload.key() == Some(key))
        .filter_map(|upload| {
            Some((
                *upload.initiated()?,
                upload.upload_id()?.to_string(),
            ))
        })
        .reduce(|latest, candidate| {
            if is_newer(&candidate.0, &latest.0) {
                candidate
            } else {
                latest
            }
        })
}

fn is_newer(candidate: &DateTime, current: &DateTime) -> bool {
    (candidate.secs(), candidate.subsec_nanos()) > (current.secs(), current.subsec_nanos())
}
