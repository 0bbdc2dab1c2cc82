pub mod config;
pub mod errors;
pub mod input;
pub mod label_map;
pub mod model;
pub mod npy;
pub mod preprocess;
pub mod render;
pub mod sink;
pub mod traits;
#[cfg(feature = "view")]
pub mod view;

pub mod mocks;

use std::path::{Path, PathBuf};

use image::DynamicImage;
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, error, info, LevelFilter};

pub use config::{Config, ViewConfig};
pub use errors::{FaceSegError, Result};
pub use input::MissingInputPolicy;
pub use label_map::LabelMap;
pub use model::{NetworkConfig, OnnxNetwork};
pub use sink::{OutputFormat, SinkOptions};
pub use traits::*;

/// Initialise `env_logger`. `RUST_LOG` wins; otherwise `verbosity` picks the
/// level (0 info, 1 debug, 2+ trace). Fails if a logger is already installed.
pub fn init_logging(verbosity: u8) -> Result<()> {
    let default_filter = match verbosity {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(default_filter.as_str()),
    )
    .try_init()
    .map_err(|e| FaceSegError::Configuration {
        message: format!("logger initialisation failed: {e}"),
    })
}

/// What happened to one input image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Written(PathBuf),
    Skipped(PathBuf),
}

/// Counts for a whole run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Summary {
    pub written: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Preprocess, infer, reduce and write, one image at a time.
///
/// The segmenter owns the network for its whole lifetime; build it once and
/// feed it every image of the run.
pub struct FaceSegmenter<N: SegmentationNetwork> {
    network: N,
    options: SinkOptions,
}

impl<N: SegmentationNetwork> FaceSegmenter<N> {
    pub const fn new(network: N, options: SinkOptions) -> Self {
        Self { network, options }
    }

    pub fn options(&self) -> &SinkOptions {
        &self.options
    }

    /// Label map of an in-memory image, at the network resolution.
    pub fn segment(&self, image: &DynamicImage) -> Result<LabelMap> {
        let tensor = preprocess::preprocess(image);
        let scores = self.network.infer(tensor.view())?;
        LabelMap::from_scores(scores.view())
    }

    /// Decode `path` and segment it.
    pub fn segment_path(&self, path: &Path) -> Result<LabelMap> {
        let image = preprocess::load_image(path)?;
        self.segment(&image)
    }

    /// Segment one file and write its outputs.
    ///
    /// Nothing is written for an image unless inference succeeded.
    pub fn process_image(&self, path: &Path) -> Result<Outcome> {
        let SinkOptions {
            output_dir,
            format,
            skip_existing,
            render,
            ..
        } = &self.options;

        let output = sink::output_path(path, output_dir, *format)?;
        if *skip_existing && output.is_file() {
            info!("Skipping: {}", output.display());
            return Ok(Outcome::Skipped(output));
        }

        debug!("Face segmenting: {}", path.display());
        let image = preprocess::load_image(path)?;
        let labels = self.segment(&image)?;

        sink::write_label_map(&labels, &output, *format)?;
        if *render {
            let debug_path = sink::debug_render_path(path, output_dir)?;
            sink::write_debug_render(&image, &labels, &debug_path)?;
        }

        info!("Done! {}", output.display());
        Ok(Outcome::Written(output))
    }

    /// Process every path in order.
    ///
    /// The first failure aborts the run unless `keep_going` is set, in which
    /// case failures are logged (and recorded in the error log, if any) and
    /// counted in the summary.
    pub fn process_all(&self, paths: &[PathBuf]) -> Result<Summary> {
        sink::ensure_output_dir(&self.options.output_dir)?;

        let mut error_log = match (&self.options.error_log, self.options.keep_going) {
            (Some(path), true) => Some(sink::ErrorLog::create(path)?),
            _ => None,
        };

        let pb = ProgressBar::new(paths.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template(
                    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})",
                )
                .map_err(|e| FaceSegError::Configuration {
                    message: e.to_string(),
                })?
                .progress_chars("#>-"),
        );

        let mut summary = Summary::default();
        for path in paths {
            match self.process_image(path) {
                Ok(Outcome::Written(_)) => summary.written += 1,
                Ok(Outcome::Skipped(_)) => summary.skipped += 1,
                Err(err) if self.options.keep_going => {
                    error!("{}: {err}", path.display());
                    if let Some(log) = error_log.as_mut() {
                        log.record(path, &error_chain(&err))?;
                    }
                    summary.failed += 1;
                }
                Err(err) => {
                    pb.abandon();
                    return Err(err);
                }
            }
            pb.inc(1);
        }
        pb.finish();

        Ok(summary)
    }
}

fn error_chain(err: &FaceSegError) -> String {
    let mut message = err.to_string();
    let mut source = std::error::Error::source(err);
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

impl FaceSegmenter<OnnxNetwork> {
    /// Load the ONNX network described by `config`.
    pub fn with_onnx_network(config: &Config) -> Result<Self> {
        let network = OnnxNetwork::new(&config.network_config())?;
        Ok(Self::new(network, config.sink_options()))
    }
}
