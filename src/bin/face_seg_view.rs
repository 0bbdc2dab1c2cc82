use anyhow::{Context, Result};
use clap::Parser;
use log::info;

use face_seg_rs::{
    init_logging, npy, preprocess::load_image, view::show_label_map, FaceSegmenter, LabelMap,
    OnnxNetwork, SinkOptions, ViewConfig,
};

fn main() -> Result<()> {
    let config = ViewConfig::parse();
    init_logging(config.verbose)?;

    let (labels, title) = match &config.labels {
        Some(path) => {
            let labels = npy::load_labels(path)
                .with_context(|| format!("Failed to read label map: {}", path.display()))?;
            let num_classes = labels
                .iter()
                .copied()
                .max()
                .map_or(1, |max| max.max(0) as usize + 1);
            (
                LabelMap::from_labels(labels, num_classes)?,
                path.display().to_string(),
            )
        }
        None => {
            let network = OnnxNetwork::new(&config.network_config()).with_context(|| {
                format!("Failed to load model: {}", config.model_path.display())
            })?;
            // nothing is written in this mode
            let segmenter = FaceSegmenter::new(network, SinkOptions::new("."));
            let image = load_image(&config.image)?;
            let labels = segmenter.segment(&image)?;
            info!(
                "Segmented {} into {} classes",
                config.image.display(),
                labels.num_classes()
            );
            (labels, config.image.display().to_string())
        }
    };

    show_label_map(&labels, &title)?;
    Ok(())
}
