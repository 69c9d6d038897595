use std::io;
use std::io::Write;

use async_channel::Receiver;
use indicatif::{HumanBytes, HumanDuration, ProgressBar, ProgressStyle};
use s3upload::types::UploadStatistics;
use simple_moving_average::{SMA, SumTreeSMA};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::info;

const MOVING_AVERAGE_PERIOD_SECS: usize = 10;
const REFRESH_INTERVAL: f32 = 1.0;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct UploadSummary {
    pub uploaded_bytes: u64,
    pub uploaded_parts: u64,
    pub skipped_parts: u64,
    pub e_tag_verified: bool,
    pub warning: u64,
    pub error: u64,
}

impl UploadSummary {
    fn add(&mut self, stats: UploadStatistics) {
        match stats {
            UploadStatistics::UploadBytes(size) => self.uploaded_bytes += size,
            UploadStatistics::PartUploaded { .. } => self.uploaded_parts += 1,
            UploadStatistics::PartSkipped { .. } => self.skipped_parts += 1,
            UploadStatistics::EtagVerified { .. } => self.e_tag_verified = true,
            UploadStatistics::UploadWarning { .. } => self.warning += 1,
            UploadStatistics::UploadError { .. } => self.error += 1,
            UploadStatistics::UploadComplete { .. } => {}
        }
    }
}

/// Drains `stats_receiver` until it is closed and returns the totals.
pub fn show_indicator(
    stats_receiver: Receiver<UploadStatistics>,
    show_progress: bool,
    show_result: bool,
    log_upload_summary: bool,
) -> JoinHandle<UploadSummary> {
    let progress_text = ProgressBar::new(0);
    if let Ok(progress_style) = ProgressStyle::with_template("{wide_msg}") {
        progress_text.set_style(progress_style);
    }

    tokio::spawn(async move {
        let start_time = Instant::now();

        let mut ma_uploaded_bytes = SumTreeSMA::<_, u64, MOVING_AVERAGE_PERIOD_SECS>::new();
        let mut summary = UploadSummary::default();

        loop {
            let mut uploaded_bytes: u64 = 0;

            let period = Instant::now();
            loop {
                while let Ok(stats) = stats_receiver.try_recv() {
                    if let UploadStatistics::UploadBytes(size) = stats {
                        uploaded_bytes += size;
                    }
                    summary.add(stats);
                }

                if REFRESH_INTERVAL < period.elapsed().as_secs_f32() {
                    break;
                }

                if stats_receiver.is_closed() {
                    let elapsed = start_time.elapsed();
                    let elapsed_secs_f64 = elapsed.as_secs_f64();

                    let bytes_per_sec = if elapsed_secs_f64 < REFRESH_INTERVAL as f64 {
                        summary.uploaded_bytes
                    } else {
                        (summary.uploaded_bytes as f64 / elapsed_secs_f64) as u64
                    };

                    if log_upload_summary {
                        info!(
                            message = "upload summary",
                            transferred_byte = summary.uploaded_bytes,
                            transferred_byte_per_sec = bytes_per_sec,
                            uploaded_parts = summary.uploaded_parts,
                            skipped_parts = summary.skipped_parts,
                            etag_verified = summary.e_tag_verified,
                            error = summary.error,
                            warning = summary.warning,
                            duration_sec = elapsed_secs_f64,
                        );
                    }

                    if show_result {
                        if let Ok(progress_style) = ProgressStyle::with_template("{msg}") {
                            progress_text.set_style(progress_style);
                        }

                        progress_text.finish_with_message(format!(
                            "{:>3} | {:>3}/sec,  uploaded {} parts,  reused {} parts,  etag verified {},  error {}, warning {},  duration {}",
                            HumanBytes(summary.uploaded_bytes),
                            HumanBytes(bytes_per_sec),
                            summary.uploaded_parts,
                            summary.skipped_parts,
                            summary.e_tag_verified,
                            summary.error,
                            summary.warning,
                            HumanDuration(elapsed),
                        ));

                        println!();
                        let _ = io::stdout().flush();
                    }

                    return summary;
                }

                tokio::time::sleep(std::time::Duration::from_secs_f32(0.05)).await;
            }
            ma_uploaded_bytes.add_sample(uploaded_bytes);

            if show_progress {
                progress_text.set_message(format!(
                    "{:>3} | {:>3}/sec,  uploaded {} parts,  reused {} parts",
                    HumanBytes(summary.uploaded_bytes),
                    HumanBytes(ma_uploaded_bytes.get_average()).to_string(),
                    summary.uploaded_parts,
                    summary.skipped_parts,
                ));
            }
        }
    })
}
