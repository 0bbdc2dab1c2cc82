use anyhow::{ensure, Context, Result};
use clap::Parser;
use log::{info, warn};

use face_seg_rs::{
    input::{read_image_list, resolve_inputs},
    init_logging, Config, FaceSegmenter,
};

fn main() -> Result<()> {
    let config = Config::parse();
    init_logging(config.verbose)?;

    info!("Process started");

    // loaded once, before any input is looked at, so a bad model always fails the run
    let segmenter = FaceSegmenter::with_onnx_network(&config).with_context(|| {
        format!("Failed to load model: {}", config.model_path.display())
    })?;

    let image_paths = if config.list {
        read_image_list(&config.input)
            .with_context(|| format!("Failed to read image list: {}", config.input.display()))?
    } else {
        resolve_inputs(&config.input, config.if_missing)?
    };

    if image_paths.is_empty() {
        warn!("No images to process");
        info!("Process finished");
        return Ok(());
    }

    let summary = segmenter.process_all(&image_paths)?;

    info!(
        "Process finished: {} written, {} skipped, {} failed",
        summary.written, summary.skipped, summary.failed
    );
    ensure!(summary.failed == 0, "{} image(s) failed", summary.failed);

    Ok(())
}
