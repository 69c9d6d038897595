mod common;

use std::io::Write;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use tokio::io::{AsyncRead, AsyncReadExt, ReadBuf};

use common::*;
use s3upload::pipeline::Pipeline;
use s3upload::types::UploadStatistics;
use s3upload::types::error::is_cancelled_error;
use s3upload::types::token::create_upload_cancellation_token;

#[tokio::test]
async fn upload_stream_in_five_mib_parts() {
    init_dummy_tracing_subscriber();

    let config = build_config(&["--multipart-chunksize", "5MiB"]);
    let client = Arc::new(MockUploadClient::new());
    let mut pipeline = Pipeline::with_client(
        config,
        shared(&client),
        create_upload_cancellation_token(),
    );
    let stats_receiver = pipeline.get_stats_receiver();

    let data = test_data(6 * MIB);
    let upload_result = pipeline.upload(&data[..]).await.unwrap();

    assert!(upload_result.e_tag.ends_with("-2\""));
    assert_eq!(client.uploaded_part_numbers(), vec![1, 2]);
    assert_eq!(client.completed_parts().unwrap().len(), 2);

    let stats = collect_stats(&stats_receiver);
    assert_eq!(
        stats.last(),
        Some(&UploadStatistics::UploadComplete {
            key: TEST_KEY.to_string()
        })
    );
    assert!(stats_receiver.is_closed());
}

#[tokio::test]
async fn upload_small_stream_single_shot() {
    init_dummy_tracing_subscriber();

    let config = build_config(&[]);
    let client = Arc::new(MockUploadClient::new());
    let mut pipeline = Pipeline::with_client(
        config,
        shared(&client),
        create_upload_cancellation_token(),
    );

    let data = test_data(1024);
    let upload_result = pipeline.upload(&data[..]).await.unwrap();

    assert_eq!(upload_result.e_tag, format!("\"{}\"", hex_md5(&data)));
    assert_eq!(
        client.count(|call| matches!(call, ClientCall::UploadWhole { size: 1024, .. })),
        1
    );
    assert_eq!(
        client.count(|call| matches!(call, ClientCall::FindExistingSession)),
        0
    );
}

#[tokio::test]
async fn upload_empty_stream() {
    init_dummy_tracing_subscriber();

    let config = build_config(&[]);
    let client = Arc::new(MockUploadClient::new());
    let mut pipeline = Pipeline::with_client(
        config,
        shared(&client),
        create_upload_cancellation_token(),
    );

    pipeline.upload(&b""[..]).await.unwrap();

    assert_eq!(
        client.calls(),
        vec![ClientCall::UploadWhole {
            size: 0,
            content_md5: Some("1B2M2Y8AsgTpgAmY5PhCfg==".to_string()),
        }]
    );
}

#[tokio::test]
async fn upload_local_file() {
    init_dummy_tracing_subscriber();

    let data = test_data(6 * MIB);
    let mut source = tempfile::NamedTempFile::new().unwrap();
    source.write_all(&data).unwrap();
    source.flush().unwrap();
    let source_path = source.path().to_string_lossy().to_string();

    let config = build_config_with_source(&["--multipart-chunksize", "5MiB"], &source_path);
    let client = Arc::new(MockUploadClient::new());
    let mut pipeline = Pipeline::with_client(
        config,
        shared(&client),
        create_upload_cancellation_token(),
    );

    pipeline.run().await.unwrap();

    let part_sizes = client
        .calls()
        .iter()
        .filter_map(|call| match call {
            ClientCall::UploadPart { size, .. } => Some(*size),
            _ => None,
        })
        .collect::<Vec<_>>();
    assert_eq!(part_sizes, vec![5 * MIB, MIB]);
}

#[tokio::test]
async fn upload_failure_is_reported() {
    init_dummy_tracing_subscriber();

    let config = build_config(&["--multipart-chunksize", "5MiB", "--abort-on-failure"]);
    let client = Arc::new(MockUploadClient::new().fail_on_part(2));
    let mut pipeline = Pipeline::with_client(
        config,
        shared(&client),
        create_upload_cancellation_token(),
    );
    let stats_receiver = pipeline.get_stats_receiver();

    let data = test_data(11 * MIB);
    let e = pipeline.upload(&data[..]).await.unwrap_err();
    assert!(!is_cancelled_error(&e));

    // the third chunk is never sent
    assert_eq!(client.uploaded_part_numbers(), vec![1, 2]);
    assert_eq!(
        client.count(|call| matches!(call, ClientCall::AbortSession { .. })),
        1
    );

    let stats = collect_stats(&stats_receiver);
    assert_eq!(
        stats.last(),
        Some(&UploadStatistics::UploadError {
            key: TEST_KEY.to_string()
        })
    );
}

/// Source whose every read fails, like a broken pipe.
struct BrokenSource;

impl AsyncRead for BrokenSource {
    fn poll_read(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        _buf: &mut ReadBuf<'_>,
    ) -> Poll<std::io::Result<()>> {
        Poll::Ready(Err(std::io::Error::other("broken source")))
    }
}

#[tokio::test]
async fn source_read_failure_aborts_when_configured() {
    init_dummy_tracing_subscriber();

    let config = build_config(&["--multipart-chunksize", "5MiB", "--abort-on-failure"]);
    let client = Arc::new(MockUploadClient::new());
    let mut pipeline = Pipeline::with_client(
        config,
        shared(&client),
        create_upload_cancellation_token(),
    );
    let stats_receiver = pipeline.get_stats_receiver();

    let data = test_data(5 * MIB);
    let source = std::io::Cursor::new(data).chain(BrokenSource);
    let e = pipeline.upload(source).await.unwrap_err();
    assert!(!is_cancelled_error(&e));

    assert_eq!(client.uploaded_part_numbers(), vec![1]);
    assert_eq!(
        client.calls().last(),
        Some(&ClientCall::AbortSession {
            upload_id: NEW_UPLOAD_ID.to_string()
        })
    );
    assert_eq!(
        client.count(|call| matches!(call, ClientCall::AbortSession { .. })),
        1
    );
    assert_eq!(
        client.count(|call| matches!(call, ClientCall::CompleteSession { .. })),
        0
    );

    let stats = collect_stats(&stats_receiver);
    assert_eq!(
        stats.last(),
        Some(&UploadStatistics::UploadError {
            key: TEST_KEY.to_string()
        })
    );
}

#[tokio::test]
async fn source_read_failure_keeps_session_by_default() {
    init_dummy_tracing_subscriber();

    let config = build_config(&["--multipart-chunksize", "5MiB"]);
    let client = Arc::new(MockUploadClient::new());
    let mut pipeline = Pipeline::with_client(
        config,
        shared(&client),
        create_upload_cancellation_token(),
    );

    let data = test_data(5 * MIB);
    let source = std::io::Cursor::new(data).chain(BrokenSource);
    pipeline.upload(source).await.unwrap_err();

    assert_eq!(client.uploaded_part_numbers(), vec![1]);
    assert_eq!(
        client.count(|call| matches!(
            call,
            ClientCall::AbortSession { .. } | ClientCall::CompleteSession { .. }
        )),
        0
    );
}

#[tokio::test]
async fn cancelled_before_first_chunk() {
    init_dummy_tracing_subscriber();

    let config = build_config(&[]);
    let client = Arc::new(MockUploadClient::new());
    let cancellation_token = create_upload_cancellation_token();
    let mut pipeline =
        Pipeline::with_client(config, shared(&client), cancellation_token.clone());

    cancellation_token.cancel();

    let data = test_data(1024);
    let e = pipeline.upload(&data[..]).await.unwrap_err();

    assert!(is_cancelled_error(&e));
    assert!(client.calls().is_empty());
}

#[tokio::test]
async fn spawned_upload_reports_once() {
    init_dummy_tracing_subscriber();

    let config = build_config(&["--multipart-chunksize", "5MiB"]);
    let client = Arc::new(MockUploadClient::new());
    let pipeline = Pipeline::with_client(
        config,
        shared(&client),
        create_upload_cancellation_token(),
    );

    let completion = pipeline.spawn(std::io::Cursor::new(test_data(5 * MIB)));
    let upload_result = completion.await.unwrap().unwrap();

    assert!(upload_result.e_tag.ends_with("-1\""));
    assert_eq!(client.uploaded_part_numbers(), vec![1]);
}

#[tokio::test]
#[should_panic]
async fn upload_twice_panics() {
    init_dummy_tracing_subscriber();

    let config = build_config(&[]);
    let client = Arc::new(MockUploadClient::new());
    let mut pipeline = Pipeline::with_client(
        config,
        shared(&client),
        create_upload_cancellation_token(),
    );

    let _ = pipeline.upload(&b"first"[..]).await;
    let _ = pipeline.upload(&b"second"[..]).await;
}
