#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use anyhow::{Result, anyhow};
use async_channel::{Receiver, Sender};
use async_trait::async_trait;

use s3upload::Config;
use s3upload::config::TransferConfig;
use s3upload::config::args::parse_from_args;
use s3upload::storage::{SharedUploadClient, UploadClient};
use s3upload::types::{
    PartRecord, UploadMetadata, UploadResult, UploadStatistics, UploadTarget, UploadedPart,
};
use s3upload::upload::orchestrator::UploadOrchestrator;

pub const TEST_BUCKET: &str = "test-bucket";
pub const TEST_KEY: &str = "dir/test_object";
pub const NEW_UPLOAD_ID: &str = "new-upload-id";
pub const EXISTING_UPLOAD_ID: &str = "existing-upload-id";

pub const MIB: usize = 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientCall {
    FindExistingSession,
    CreateSession,
    ListUploadedParts {
        upload_id: String,
    },
    UploadWhole {
        size: usize,
        content_md5: Option<String>,
    },
    UploadPart {
        upload_id: String,
        part_number: i32,
        size: usize,
        content_md5: Option<String>,
    },
    CompleteSession {
        upload_id: String,
        parts: Vec<UploadedPart>,
    },
    AbortSession {
        upload_id: String,
    },
}

/// In-memory `UploadClient` that records every request and answers the way S3 does.
#[derive(Default)]
pub struct MockUploadClient {
    calls: Mutex<Vec<ClientCall>>,
    existing_upload_id: Option<String>,
    existing_parts: Vec<PartRecord>,
    fail_find: bool,
    fail_create: bool,
    fail_list: bool,
    fail_part_number: Option<i32>,
    fail_complete: bool,
    corrupt_e_tag: bool,
}

impl MockUploadClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_existing_session(mut self, upload_id: &str, parts: Vec<PartRecord>) -> Self {
        self.existing_upload_id = Some(upload_id.to_string());
        self.existing_parts = parts;
        self
    }

    pub fn fail_on_find(mut self) -> Self {
        self.fail_find = true;
        self
    }

    pub fn fail_on_create(mut self) -> Self {
        self.fail_create = true;
        self
    }

    pub fn fail_on_list(mut self) -> Self {
        self.fail_list = true;
        self
    }

    pub fn fail_on_part(mut self, part_number: i32) -> Self {
        self.fail_part_number = Some(part_number);
        self
    }

    pub fn fail_on_complete(mut self) -> Self {
        self.fail_complete = true;
        self
    }

    /// The server answers with ETags that do not match the content.
    pub fn with_corrupt_e_tag(mut self) -> Self {
        self.corrupt_e_tag = true;
        self
    }

    pub fn calls(&self) -> Vec<ClientCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn uploaded_part_numbers(&self) -> Vec<i32> {
        self.calls()
            .iter()
            .filter_map(|call| match call {
                ClientCall::UploadPart { part_number, .. } => Some(*part_number),
                _ => None,
            })
            .collect()
    }

    pub fn completed_parts(&self) -> Option<Vec<UploadedPart>> {
        self.calls().into_iter().find_map(|call| match call {
            ClientCall::CompleteSession { parts, .. } => Some(parts),
            _ => None,
        })
    }

    pub fn count(&self, predicate: impl Fn(&ClientCall) -> bool) -> usize {
        self.calls().iter().filter(|call| predicate(call)).count()
    }

    fn record(&self, call: ClientCall) {
        self.calls.lock().unwrap().push(call);
    }

    fn e_tag_of(&self, e_tag: String) -> String {
        if self.corrupt_e_tag {
            return "\"00000000000000000000000000000000\"".to_string();
        }
        e_tag
    }
}

#[async_trait]
impl UploadClient for MockUploadClient {
    async fn find_existing_session(&self, _bucket: &str, _key: &str) -> Result<Option<String>> {
        self.record(ClientCall::FindExistingSession);

        if self.fail_find {
            return Err(anyhow!("injected find_existing_session failure."));
        }

        Ok(self.existing_upload_id.clone())
    }

    async fn create_session(
        &self,
        _bucket: &str,
        _key: &str,
        _metadata: &UploadMetadata,
    ) -> Result<String> {
        self.record(ClientCall::CreateSession);

        if self.fail_create {
            return Err(anyhow!("injected create_session failure."));
        }

        Ok(NEW_UPLOAD_ID.to_string())
    }

    async fn list_uploaded_parts(
        &self,
        _bucket: &str,
        _key: &str,
        upload_id: &str,
    ) -> Result<Vec<PartRecord>> {
        self.record(ClientCall::ListUploadedParts {
            upload_id: upload_id.to_string(),
        });

        if self.fail_list {
            return Err(anyhow!("injected list_uploaded_parts failure."));
        }

        Ok(self.existing_parts.clone())
    }

    async fn upload_whole(
        &self,
        _bucket: &str,
        _key: &str,
        _metadata: &UploadMetadata,
        body: Vec<u8>,
        content_md5: Option<String>,
    ) -> Result<UploadResult> {
        self.record(ClientCall::UploadWhole {
            size: body.len(),
            content_md5,
        });

        Ok(UploadResult {
            e_tag: self.e_tag_of(format!("\"{:x}\"", md5::compute(&body))),
            version_id: None,
        })
    }

    async fn upload_part(
        &self,
        _bucket: &str,
        _key: &str,
        upload_id: &str,
        part_number: i32,
        body: Vec<u8>,
        content_md5: Option<String>,
    ) -> Result<String> {
        self.record(ClientCall::UploadPart {
            upload_id: upload_id.to_string(),
            part_number,
            size: body.len(),
            content_md5,
        });

        if self.fail_part_number == Some(part_number) {
            return Err(anyhow!("injected upload_part failure."));
        }

        Ok(format!("\"{:x}\"", md5::compute(&body)))
    }

    async fn complete_session(
        &self,
        _bucket: &str,
        _key: &str,
        upload_id: &str,
        parts: &[UploadedPart],
    ) -> Result<UploadResult> {
        self.record(ClientCall::CompleteSession {
            upload_id: upload_id.to_string(),
            parts: parts.to_vec(),
        });

        if self.fail_complete {
            return Err(anyhow!("injected complete_session failure."));
        }

        let concatenated_md5_hash = parts
            .iter()
            .map(|part| hex::decode(part.e_tag.replace('"', "")))
            .collect::<Result<Vec<_>, _>>()?
            .concat();

        Ok(UploadResult {
            e_tag: self.e_tag_of(format!(
                "\"{:x}-{}\"",
                md5::compute(&concatenated_md5_hash),
                parts.len()
            )),
            version_id: Some("version-1".to_string()),
        })
    }

    async fn abort_session(&self, _bucket: &str, _key: &str, upload_id: &str) -> Result<()> {
        self.record(ClientCall::AbortSession {
            upload_id: upload_id.to_string(),
        });
        Ok(())
    }
}

pub fn shared(client: &Arc<MockUploadClient>) -> SharedUploadClient {
    client.clone()
}

pub fn test_target() -> UploadTarget {
    UploadTarget {
        bucket: TEST_BUCKET.to_string(),
        key: TEST_KEY.to_string(),
    }
}

pub fn transfer_config(multipart_chunksize: usize) -> TransferConfig {
    TransferConfig {
        multipart_chunksize: multipart_chunksize as u64,
        ..Default::default()
    }
}

pub fn create_orchestrator(
    client: &Arc<MockUploadClient>,
    transfer_config: TransferConfig,
) -> (UploadOrchestrator, Receiver<UploadStatistics>) {
    create_orchestrator_with_metadata(client, transfer_config, UploadMetadata::default())
}

pub fn create_orchestrator_with_metadata(
    client: &Arc<MockUploadClient>,
    transfer_config: TransferConfig,
    metadata: UploadMetadata,
) -> (UploadOrchestrator, Receiver<UploadStatistics>) {
    let (stats_sender, stats_receiver): (Sender<UploadStatistics>, _) =
        async_channel::unbounded();
    let orchestrator = UploadOrchestrator::new(
        shared(client),
        transfer_config,
        test_target(),
        metadata,
        stats_sender,
    );

    (orchestrator, stats_receiver)
}

pub fn collect_stats(stats_receiver: &Receiver<UploadStatistics>) -> Vec<UploadStatistics> {
    let mut stats = vec![];
    while let Ok(received) = stats_receiver.try_recv() {
        stats.push(received);
    }
    stats
}

/// Deterministic content that differs from chunk to chunk.
pub fn test_data(size: usize) -> Vec<u8> {
    (0..size).map(|i| (i % 251) as u8).collect()
}

pub fn hex_md5(data: &[u8]) -> String {
    format!("{:x}", md5::compute(data))
}

pub fn build_config(options: &[&str]) -> Config {
    let target = format!("s3://{TEST_BUCKET}/{TEST_KEY}");
    let mut args = vec!["s3upload"];
    args.extend_from_slice(options);
    args.push("-");
    args.push(&target);

    Config::try_from(parse_from_args(args).unwrap()).unwrap()
}

pub fn build_config_with_source(options: &[&str], source: &str) -> Config {
    let target = format!("s3://{TEST_BUCKET}/{TEST_KEY}");
    let mut args = vec!["s3upload"];
    args.extend_from_slice(options);
    args.push(source);
    args.push(&target);

    Config::try_from(parse_from_args(args).unwrap()).unwrap()
}

pub fn init_dummy_tracing_subscriber() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("dummy=trace")
        .try_init();
}
