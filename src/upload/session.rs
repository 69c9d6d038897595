use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::storage::SharedUploadClient;
use crate::types::{UploadMetadata, UploadTarget};
use crate::upload::part_registry::PartRegistry;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionOrigin {
    Created,
    Resumed,
}

/// Identity of the multipart upload an orchestrator writes into. Assigned once, never replaced.
///
/// `metadata` is what the upload was created or adopted with. An adopted upload keeps the
/// attributes it was created with on the server.
#[derive(Debug, Clone)]
pub struct UploadSession {
    pub bucket: String,
    pub key: String,
    pub upload_id: String,
    pub origin: SessionOrigin,
    pub metadata: UploadMetadata,
}

impl UploadSession {
    /// Adopts the latest incomplete upload of the target object, or creates a new one.
    ///
    /// A registry of the already stored parts is returned only for an adopted upload.
    pub async fn resolve(
        client: &SharedUploadClient,
        target: &UploadTarget,
        metadata: &UploadMetadata,
    ) -> Result<(UploadSession, Option<PartRegistry>)> {
        let existing_upload_id = client
            .find_existing_session(&target.bucket, &target.key)
            .await
            .context("find_existing_session() failed.")?;

        if let Some(upload_id) = existing_upload_id {
            let parts = client
                .list_uploaded_parts(&target.bucket, &target.key, &upload_id)
                .await
                .context("list_uploaded_parts() failed.")?;
            let part_registry = PartRegistry::from_records(parts);

            info!(
                key = target.key,
                upload_id = upload_id,
                uploaded_parts = part_registry.len(),
                "resume incomplete multipart upload."
            );

            return Ok((
                UploadSession {
                    bucket: target.bucket.clone(),
                    key: target.key.clone(),
                    upload_id,
                    origin: SessionOrigin::Resumed,
                    metadata: metadata.clone(),
                },
                Some(part_registry),
            ));
        }

        let upload_id = client
            .create_session(&target.bucket, &target.key, metadata)
            .await
            .context("create_session() failed.")?;

        debug!(
            key = target.key,
            upload_id = upload_id,
            "multipart upload created."
        );

        Ok((
            UploadSession {
                bucket: target.bucket.clone(),
                key: target.key.clone(),
                upload_id,
                origin: SessionOrigin::Created,
                metadata: metadata.clone(),
            },
            None,
        ))
    }
}
