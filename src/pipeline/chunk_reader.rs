use anyhow::{Context, Result};
use tokio::io::{AsyncRead, AsyncReadExt};

use crate::upload::chunk::Chunk;

/// Splits a byte stream into chunks of exactly `chunksize` bytes, except the last one.
pub struct ChunkReader<R> {
    reader: R,
    chunksize: u64,
    eof: bool,
}

impl<R: AsyncRead + Unpin> ChunkReader<R> {
    pub fn new(reader: R, chunksize: u64) -> Self {
        ChunkReader {
            reader,
            chunksize,
            eof: false,
        }
    }

    /// `None` once the stream is exhausted. An empty chunk is never returned.
    pub async fn next_chunk(&mut self) -> Result<Option<Chunk>> {
        if self.eof {
            return Ok(None);
        }

        let mut buffer = Vec::<u8>::with_capacity(self.chunksize as usize);
        (&mut self.reader)
            .take(self.chunksize)
            .read_to_end(&mut buffer)
            .await
            .context("async_read_ext::AsyncReadExt read_to_end() failed.")?;

        if (buffer.len() as u64) < self.chunksize {
            self.eof = true;
        }

        if buffer.is_empty() {
            return Ok(None);
        }

        Ok(Some(Chunk::new(buffer)))
    }
}
