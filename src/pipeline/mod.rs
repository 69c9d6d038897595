use anyhow::{Context, Result, anyhow};
use async_channel::{Receiver, Sender};
use tokio::io::AsyncRead;
use tokio::sync::oneshot;
use tracing::{error, info, trace};

use crate::Config;
use crate::pipeline::chunk_reader::ChunkReader;
use crate::storage::SharedUploadClient;
use crate::storage::s3::S3UploadClient;
use crate::types::error::{S3uploadError, is_cancelled_error};
use crate::types::token::UploadCancellationToken;
use crate::types::{UploadResult, UploadSource, UploadStatistics};
use crate::upload::orchestrator::UploadOrchestrator;

mod chunk_reader;

/// Reads the source chunk by chunk and feeds an `UploadOrchestrator`.
pub struct Pipeline {
    config: Config,
    client: SharedUploadClient,
    cancellation_token: UploadCancellationToken,
    stats_sender: Sender<UploadStatistics>,
    stats_receiver: Receiver<UploadStatistics>,
    ready: bool,
}

impl Pipeline {
    pub async fn new(config: Config, cancellation_token: UploadCancellationToken) -> Self {
        let client = S3UploadClient::create(&config.target_client_config).await;
        Self::with_client(config, client, cancellation_token)
    }

    /// Uses `client` instead of the AWS SDK, e.g. to upload into another store.
    pub fn with_client(
        config: Config,
        client: SharedUploadClient,
        cancellation_token: UploadCancellationToken,
    ) -> Self {
        let (stats_sender, stats_receiver) = async_channel::unbounded();

        Self {
            config,
            client,
            cancellation_token,
            stats_sender,
            stats_receiver,
            ready: true,
        }
    }

    /// Uploads the configured source.
    pub async fn run(&mut self) -> Result<UploadResult> {
        match self.config.source.clone() {
            UploadSource::Local(path) => {
                let file = tokio::fs::File::open(&path)
                    .await
                    .with_context(|| format!("tokio::fs::File::open() failed. path={path:?}"));
                match file {
                    Ok(file) => self.upload(file).await,
                    Err(e) => {
                        self.ready = false;
                        self.close_stats_sender();
                        error!(error = e.to_string(), "failed to open the source file.");
                        Err(e)
                    }
                }
            }
            UploadSource::Stdin => self.upload(tokio::io::stdin()).await,
        }
    }

    /// Uploads everything `reader` yields. Can be called only once per pipeline.
    pub async fn upload<R>(&mut self, reader: R) -> Result<UploadResult>
    where
        R: AsyncRead + Unpin + Send,
    {
        if !self.ready {
            panic!("it can be executed only once.")
        }
        self.ready = false;

        let key = self.config.target.key.clone();
        let result = self.upload_object(reader).await;
        self.close_stats_sender();

        match &result {
            Ok(upload_result) => {
                info!(
                    key = key,
                    e_tag = upload_result.e_tag,
                    version_id = upload_result.version_id,
                    "upload completed."
                );
            }
            Err(e) if is_cancelled_error(e) => {
                info!(key = key, "upload cancelled.");
            }
            Err(e) => {
                let error = e.to_string();
                let source = e.source();
                error!(key = key, error = error, source = source, "upload failed.");
            }
        }

        result
    }

    /// Runs the upload on a new task. The receiver yields exactly one outcome.
    pub fn spawn<R>(mut self, reader: R) -> oneshot::Receiver<Result<UploadResult>>
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        let (sender, receiver) = oneshot::channel();
        tokio::spawn(async move {
            let result = self.upload(reader).await;
            if sender.send(result).is_err() {
                trace!("completion receiver has been dropped.");
            }
        });

        receiver
    }

    async fn upload_object<R>(&self, reader: R) -> Result<UploadResult>
    where
        R: AsyncRead + Unpin + Send,
    {
        let key = self.config.target.key.clone();
        let mut orchestrator = UploadOrchestrator::new(
            self.client.clone(),
            self.config.transfer_config,
            self.config.target.clone(),
            self.config.upload_metadata(),
            self.stats_sender.clone(),
        );

        let result = match self.feed_chunks(&mut orchestrator, reader).await {
            Ok(()) => orchestrator.finalize().await,
            Err(e) => Err(e),
        };

        let stats = match &result {
            Ok(_) => UploadStatistics::UploadComplete { key },
            Err(_) => UploadStatistics::UploadError { key },
        };
        let _ = self.stats_sender.send(stats).await;

        result
    }

    async fn feed_chunks<R>(&self, orchestrator: &mut UploadOrchestrator, reader: R) -> Result<()>
    where
        R: AsyncRead + Unpin + Send,
    {
        let mut chunk_reader =
            ChunkReader::new(reader, self.config.transfer_config.multipart_chunksize);
        loop {
            // cancellation is observed between chunks only
            let next_chunk = tokio::select! {
                biased;
                _ = self.cancellation_token.cancelled() => None,
                next_chunk = chunk_reader.next_chunk() => Some(next_chunk),
            };

            let Some(next_chunk) = next_chunk else {
                orchestrator.cancel().await;
                return Err(anyhow!(S3uploadError::Cancelled));
            };

            match next_chunk {
                Ok(Some(chunk)) => orchestrator.process_chunk(chunk).await?,
                Ok(None) => return Ok(()),
                Err(e) => {
                    // a source that stops delivering chunks is fatal for the whole object
                    orchestrator.cancel().await;
                    return Err(e);
                }
            }
        }
    }

    pub fn get_stats_receiver(&self) -> Receiver<UploadStatistics> {
        self.stats_receiver.clone()
    }

    pub fn close_stats_sender(&self) {
        self.stats_sender.close();
    }
}
