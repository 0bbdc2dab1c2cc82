use clap::{ArgAction, Parser};
use std::path::PathBuf;

use crate::{
    input::MissingInputPolicy,
    model::{NetworkConfig, DEFAULT_INPUT_NAME, DEFAULT_MODEL_PATH, DEFAULT_OUTPUT_NAME},
    sink::{OutputFormat, SinkOptions},
};

/// Face segmentation: write a per-pixel class map for each input image.
#[derive(Parser, Clone, Debug)]
#[command(version, about, long_about = None)]
pub struct Config {
    /// Input image or directory (or, with --list, a file listing image paths)
    #[arg(short, long, default_value = "./input")]
    pub input: PathBuf,

    /// Output directory
    #[arg(short, long, default_value = "./output")]
    pub output: PathBuf,

    /// ONNX face segmentation model
    #[arg(short, long, default_value = DEFAULT_MODEL_PATH)]
    pub model_path: PathBuf,

    /// Name of the network's image input
    #[arg(long, default_value = DEFAULT_INPUT_NAME)]
    pub input_name: String,

    /// Name of the network's per-class score output
    #[arg(long, default_value = DEFAULT_OUTPUT_NAME)]
    pub output_name: String,

    #[arg(short, long, value_enum, default_value_t = OutputFormat::Npy)]
    pub format: OutputFormat,

    #[arg(short, long, default_value_t = 0)]
    pub device_id: i32,

    /// Run on the CPU only
    #[arg(long)]
    pub cpu: bool,

    /// Treat --input as a text file with one image path per line
    #[arg(long)]
    pub list: bool,

    /// Skip images whose output file already exists
    #[arg(long)]
    pub skip_existing: bool,

    /// Also write <stem>_debug.jpg with the segmentation blended over the image
    #[arg(long)]
    pub render: bool,

    /// Log failed images and continue with the rest
    #[arg(long)]
    pub keep_going: bool,

    /// CSV file collecting failed images (requires --keep-going)
    #[arg(long, requires = "keep_going")]
    pub error_log: Option<PathBuf>,

    /// What to do when --input does not exist
    #[arg(long, value_enum, default_value_t = MissingInputPolicy::Error)]
    pub if_missing: MissingInputPolicy,

    /// More log output (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

impl Config {
    pub fn network_config(&self) -> NetworkConfig {
        NetworkConfig {
            model_path: self.model_path.clone(),
            input_name: self.input_name.clone(),
            output_name: self.output_name.clone(),
            device_id: self.device_id,
            use_accelerator: !self.cpu,
        }
    }

    pub fn sink_options(&self) -> SinkOptions {
        SinkOptions {
            output_dir: self.output.clone(),
            format: self.format,
            skip_existing: self.skip_existing,
            render: self.render,
            keep_going: self.keep_going,
            error_log: self.error_log.clone(),
        }
    }
}

/// Segment one image and show the colour-mapped result until dismissed.
#[derive(Parser, Clone, Debug)]
#[command(version, about, long_about = None)]
pub struct ViewConfig {
    /// Image to segment
    #[arg(default_value = "data/images/Alison_Lohman_0001.jpg")]
    pub image: PathBuf,

    /// Show a saved .npy label map instead of running the network
    #[arg(long, conflicts_with = "image")]
    pub labels: Option<PathBuf>,

    #[arg(short, long, default_value = DEFAULT_MODEL_PATH)]
    pub model_path: PathBuf,

    #[arg(long, default_value = DEFAULT_INPUT_NAME)]
    pub input_name: String,

    #[arg(long, default_value = DEFAULT_OUTPUT_NAME)]
    pub output_name: String,

    #[arg(short, long, default_value_t = 0)]
    pub device_id: i32,

    /// Run on the CPU only
    #[arg(long)]
    pub cpu: bool,

    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

impl ViewConfig {
    pub fn network_config(&self) -> NetworkConfig {
        NetworkConfig {
            model_path: self.model_path.clone(),
            input_name: self.input_name.clone(),
            output_name: self.output_name.clone(),
            device_id: self.device_id,
            use_accelerator: !self.cpu,
        }
    }
}
