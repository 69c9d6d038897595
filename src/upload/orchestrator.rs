use anyhow::{Context, Result, anyhow};
use async_channel::Sender;
use tracing::{debug, trace, warn};

use crate::config::TransferConfig;
use crate::storage::SharedUploadClient;
use crate::types::error::S3uploadError;
use crate::types::{
    MAX_PART_NUMBER, MIN_PART_NUMBER, UploadMetadata, UploadResult, UploadStatistics,
    UploadTarget, UploadedPart,
};
use crate::upload::chunk::Chunk;
use crate::upload::completed_parts::CompletedParts;
use crate::upload::e_tag::{generate_e_tag_hash, normalize_e_tag, verify_e_tag};
use crate::upload::part_registry::PartRegistry;
use crate::upload::session::UploadSession;

#[derive(Debug)]
enum UploadState {
    Uninitialized,
    SingleShotCompleted(UploadResult),
    MultipartActive,
    Failed,
}

/// Consumes the chunks of one object in order and drives either a single `PutObject` or a
/// multipart upload to completion.
///
/// `process_chunk` must be awaited before the next chunk is passed in; that is the only
/// back-pressure the orchestrator needs, and it keeps at most one request in flight.
pub struct UploadOrchestrator {
    client: SharedUploadClient,
    transfer_config: TransferConfig,
    target: UploadTarget,
    metadata: UploadMetadata,
    stats_sender: Sender<UploadStatistics>,
    state: UploadState,
    session: Option<UploadSession>,
    part_registry: Option<PartRegistry>,
    next_part_number: i32,
    completed_parts: CompletedParts,
    concatenated_md5_hash: Vec<u8>,
}

impl UploadOrchestrator {
    pub fn new(
        client: SharedUploadClient,
        transfer_config: TransferConfig,
        target: UploadTarget,
        metadata: UploadMetadata,
        stats_sender: Sender<UploadStatistics>,
    ) -> Self {
        UploadOrchestrator {
            client,
            transfer_config,
            target,
            metadata,
            stats_sender,
            state: UploadState::Uninitialized,
            session: None,
            part_registry: None,
            next_part_number: MIN_PART_NUMBER,
            completed_parts: CompletedParts::default(),
            concatenated_md5_hash: vec![],
        }
    }

    pub async fn process_chunk(&mut self, chunk: Chunk) -> Result<()> {
        match self.state {
            UploadState::SingleShotCompleted(_) => {
                return Err(anyhow!(S3uploadError::AlreadyCompleted));
            }
            UploadState::Failed => {
                return Err(anyhow!(S3uploadError::AlreadyFailed));
            }
            UploadState::Uninitialized | UploadState::MultipartActive => {}
        }

        let result = self.resolve_chunk(chunk).await;
        if result.is_err() {
            self.fail().await;
        }

        result
    }

    /// Completes the object. Must be called once after the last chunk has been processed.
    pub async fn finalize(mut self) -> Result<UploadResult> {
        match std::mem::replace(&mut self.state, UploadState::Failed) {
            UploadState::SingleShotCompleted(upload_result) => Ok(upload_result),
            UploadState::Failed => Err(anyhow!(S3uploadError::AlreadyFailed)),
            UploadState::Uninitialized => {
                debug!(key = self.target.key, "no data. upload an empty object.");
                self.upload_single_shot(Chunk::new(vec![])).await
            }
            UploadState::MultipartActive => {
                let result = self.complete().await;
                if result.is_err() {
                    self.abort_if_required().await;
                }

                result
            }
        }
    }

    /// Stops the upload without completing it. No further chunk is accepted.
    pub async fn cancel(&mut self) {
        if matches!(self.state, UploadState::Failed) {
            return;
        }

        debug!(key = self.target.key, "upload cancelled.");
        self.fail().await;
    }

    pub fn session(&self) -> Option<&UploadSession> {
        self.session.as_ref()
    }

    pub fn completed_parts(&self) -> &[UploadedPart] {
        self.completed_parts.as_slice()
    }

    async fn resolve_chunk(&mut self, chunk: Chunk) -> Result<()> {
        if let UploadState::Uninitialized = self.state {
            if !self
                .transfer_config
                .is_multipart_upload_required(chunk.len() as u64)
            {
                let upload_result = self.upload_single_shot(chunk).await?;
                self.state = UploadState::SingleShotCompleted(upload_result);
                return Ok(());
            }

            self.ensure_session().await?;
            self.state = UploadState::MultipartActive;
        }

        self.resolve_part(chunk).await
    }

    async fn ensure_session(&mut self) -> Result<()> {
        if self.session.is_some() {
            return Ok(());
        }

        let (session, part_registry) =
            UploadSession::resolve(&self.client, &self.target, &self.metadata).await?;
        self.session = Some(session);
        self.part_registry = part_registry;

        Ok(())
    }

    async fn resolve_part(&mut self, chunk: Chunk) -> Result<()> {
        let part_number = self.next_part_number;
        if MAX_PART_NUMBER < part_number {
            return Err(anyhow!(S3uploadError::PartNumberOutOfRange(part_number)));
        }
        self.next_part_number += 1;

        if self.transfer_config.verify_e_tag {
            self.concatenated_md5_hash
                .extend_from_slice(chunk.md5_digest().as_slice());
        }

        if let Some(recorded_e_tag) = self.find_reusable_part(part_number, &chunk) {
            self.completed_parts.push(UploadedPart {
                part_number,
                e_tag: recorded_e_tag,
            })?;

            debug!(
                key = self.target.key,
                part_number = part_number,
                size = chunk.len(),
                "part already uploaded. skipped."
            );
            self.send_stats(UploadStatistics::PartSkipped {
                key: self.target.key.clone(),
                part_number,
            })
            .await;

            return Ok(());
        }

        let content_md5 = if self.transfer_config.content_md5_header {
            Some(chunk.content_md5())
        } else {
            None
        };
        let size = chunk.len() as u64;

        let upload_id = self.upload_id()?.to_string();
        let e_tag = self
            .client
            .upload_part(
                &self.target.bucket,
                &self.target.key,
                &upload_id,
                part_number,
                chunk.into_body(),
                content_md5,
            )
            .await
            .context("upload_part() failed.")?;

        trace!(
            key = self.target.key,
            upload_id = upload_id,
            part_number = part_number,
            size = size,
            e_tag = e_tag,
            "part uploaded."
        );

        self.completed_parts.push(UploadedPart {
            part_number,
            e_tag: normalize_e_tag(&e_tag),
        })?;

        self.send_stats(UploadStatistics::PartUploaded {
            key: self.target.key.clone(),
            part_number,
        })
        .await;
        self.send_stats(UploadStatistics::UploadBytes(size)).await;

        Ok(())
    }

    fn find_reusable_part(&self, part_number: i32, chunk: &Chunk) -> Option<String> {
        if !self.transfer_config.reuse_uploaded_parts {
            return None;
        }

        let part_registry = self.part_registry.as_ref()?;
        // no record, no need to hash
        part_registry.get(part_number)?;

        part_registry
            .find_matching(part_number, &chunk.hex_digest())
            .map(|record| record.digest.clone())
    }

    async fn upload_single_shot(&mut self, chunk: Chunk) -> Result<UploadResult> {
        let content_md5 = if self.transfer_config.content_md5_header {
            Some(chunk.content_md5())
        } else {
            None
        };
        let source_e_tag = if self.transfer_config.verify_e_tag {
            Some(generate_e_tag_hash(chunk.md5_digest().as_slice(), 0))
        } else {
            None
        };
        let size = chunk.len() as u64;

        let upload_result = self
            .client
            .upload_whole(
                &self.target.bucket,
                &self.target.key,
                &self.metadata,
                chunk.into_body(),
                content_md5,
            )
            .await
            .context("upload_whole() failed.")?;

        trace!(key = self.target.key, size = size, "{upload_result:?}");

        self.send_stats(UploadStatistics::UploadBytes(size)).await;

        if let Some(source_e_tag) = source_e_tag {
            self.verify_e_tag(&source_e_tag, &upload_result.e_tag).await;
        }

        Ok(upload_result)
    }

    async fn complete(&mut self) -> Result<UploadResult> {
        let upload_id = self.upload_id()?.to_string();

        let upload_result = self
            .client
            .complete_session(
                &self.target.bucket,
                &self.target.key,
                &upload_id,
                self.completed_parts.as_slice(),
            )
            .await
            .context("complete_session() failed.")?;

        trace!(
            key = self.target.key,
            upload_id = upload_id,
            parts = self.completed_parts.len(),
            "{upload_result:?}"
        );

        if self.transfer_config.verify_e_tag {
            let source_e_tag = generate_e_tag_hash(
                &self.concatenated_md5_hash,
                self.completed_parts.len() as i64,
            );
            self.verify_e_tag(&source_e_tag, &upload_result.e_tag).await;
        }

        Ok(upload_result)
    }

    async fn verify_e_tag(&self, source_e_tag: &str, target_e_tag: &str) {
        match verify_e_tag(&self.metadata.sse, source_e_tag, target_e_tag) {
            Some(true) => {
                self.send_stats(UploadStatistics::EtagVerified {
                    key: self.target.key.clone(),
                })
                .await;

                trace!(
                    key = self.target.key,
                    source_e_tag = source_e_tag,
                    target_e_tag = target_e_tag,
                    "e_tag verified."
                );
            }
            Some(false) => {
                self.send_stats(UploadStatistics::UploadWarning {
                    key: self.target.key.clone(),
                })
                .await;

                warn!(
                    key = self.target.key,
                    source_e_tag = source_e_tag,
                    target_e_tag = target_e_tag,
                    "e_tag mismatch. object in the target storage may be corrupted."
                );
            }
            None => {
                trace!(
                    key = self.target.key,
                    "e_tag verification is not supported with this encryption. skipped."
                );
            }
        }
    }

    async fn fail(&mut self) {
        self.state = UploadState::Failed;
        self.abort_if_required().await;
    }

    async fn abort_if_required(&self) {
        if !self.transfer_config.abort_on_failure {
            return;
        }

        let Some(session) = self.session.as_ref() else {
            return;
        };

        if let Err(e) = self
            .client
            .abort_session(&session.bucket, &session.key, &session.upload_id)
            .await
        {
            warn!(
                key = session.key,
                upload_id = session.upload_id,
                error = e.to_string(),
                "failed to abort multipart upload."
            );
            return;
        }

        debug!(
            key = session.key,
            upload_id = session.upload_id,
            "multipart upload aborted."
        );
    }

    fn upload_id(&self) -> Result<&str> {
        self.session
            .as_ref()
            .map(|session| session.upload_id.as_str())
            .ok_or_else(|| anyhow!(S3uploadError::MissingUploadId))
    }

    async fn send_stats(&self, stats: UploadStatistics) {
        let _ = self.stats_sender.send(stats).await;
    }
}
