/*!
# Overview
s3upload is a resumable streaming uploader for S3 and S3-compatible object storage.
It reads a local file or stdin chunk by chunk and writes one object.

## Features
- Single request or multipart
  The first chunk decides. A source shorter than `--multipart-chunksize` is uploaded with one
  `PutObject` request, anything else with a multipart upload.

- Resumable
  If the target key already has an incomplete multipart upload, s3upload adopts the latest one.
  A part whose MD5 digest matches the already stored part is not uploaded again.
  Parts are always numbered from 1 and listed in ascending order when the upload is completed.

- Streaming
  Only one chunk is held in memory. The source does not need to be seekable, so a pipe works.

- Verified
  Each request carries a Content-MD5 header, and the ETag of the completed object is compared with
  the ETag calculated from the source.

## As a library
s3upload CLI is a thin wrapper of the s3upload library.

```Toml
[dependencies]
s3upload = "0.1"
tokio = { version = "1", features = ["full"] }
```

```no_run
use s3upload::config::Config;
use s3upload::config::args::parse_from_args;
use s3upload::pipeline::Pipeline;
use s3upload::types::UploadStatistics;
use s3upload::types::token::create_upload_cancellation_token;

#[tokio::main]
async fn main() {
    let args = vec![
        "program_name",
        "--multipart-chunksize",
        "16MiB",
        "./data/archive.tar",
        "s3://test-bucket/backup/archive.tar",
    ];

    // s3upload library converts the arguments to Config.
    let config = Config::try_from(parse_from_args(args).unwrap()).unwrap();

    // Cancelling the token stops the upload between two chunks.
    let cancellation_token = create_upload_cancellation_token();
    let mut pipeline = Pipeline::new(config, cancellation_token).await;
    let stats_receiver = pipeline.get_stats_receiver();

    match pipeline.run().await {
        Ok(upload_result) => println!("uploaded. ETag: {}", upload_result.e_tag),
        Err(e) => println!("upload failed: {e:?}"),
    }

    let mut skipped_parts = 0;
    while let Ok(stats) = stats_receiver.try_recv() {
        if matches!(stats, UploadStatistics::PartSkipped { .. }) {
            skipped_parts += 1;
        }
    }
    println!("parts reused from the previous upload: {skipped_parts}");
}
```

`Pipeline::with_client` accepts any [`storage::UploadClient`], and
[`upload::orchestrator::UploadOrchestrator`] can be driven directly when the chunks come from
somewhere other than an `AsyncRead`.
*/

pub use config::Config;
pub use config::args::CLIArgs;

pub mod config;
pub mod pipeline;
pub mod storage;
pub mod types;
pub mod upload;
