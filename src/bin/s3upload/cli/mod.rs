use anyhow::Result;
use tokio::time::Instant;
use tracing::{error, trace};

use s3upload::Config;
use s3upload::pipeline::Pipeline;
use s3upload::types::token::create_upload_cancellation_token;

mod ctrl_c_handler;
mod indicator;
mod ui_config;

const EXIT_CODE_WARNING: i32 = 3;

pub async fn run(config: Config) -> Result<()> {
    let cancellation_token = create_upload_cancellation_token();

    ctrl_c_handler::spawn_ctrl_c_handler(cancellation_token.clone());

    let start_time = Instant::now();
    trace!("upload pipeline start.");

    let mut pipeline = Pipeline::new(config.clone(), cancellation_token).await;
    let indicator_join_handle = indicator::show_indicator(
        pipeline.get_stats_receiver(),
        ui_config::is_progress_indicator_needed(&config),
        ui_config::is_show_result_needed(&config),
        true,
    );

    let result = pipeline.run().await;
    let summary = indicator_join_handle.await?;

    let duration_sec = format!("{:.3}", start_time.elapsed().as_secs_f32());
    if let Err(e) = result {
        error!(duration_sec = duration_sec, "s3upload failed.");
        return Err(e);
    }

    trace!(duration_sec = duration_sec, "s3upload has been completed.");

    if 0 < summary.warning {
        std::process::exit(EXIT_CODE_WARNING);
    }

    Ok(())
}
