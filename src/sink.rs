use std::{
    fs::{self, File},
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};

use clap::ValueEnum;
use image::{DynamicImage, ImageFormat};
use log::debug;

use crate::{
    errors::{FaceSegError, Result},
    label_map::LabelMap,
    npy, render,
};

/// Serialization of the label map.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// NumPy array of `int64` class ids.
    #[default]
    Npy,
    /// 8-bit grayscale PNG holding the raw class ids at network resolution.
    ///
    /// Same content as `Npy`; ids are small, so the image looks almost black.
    Png,
}

impl OutputFormat {
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Npy => "npy",
            Self::Png => "png",
        }
    }
}

/// Where and how results are written.
#[derive(Debug, Clone)]
pub struct SinkOptions {
    pub output_dir: PathBuf,
    pub format: OutputFormat,
    /// Leave images alone when their output file already exists.
    pub skip_existing: bool,
    /// Also write `<stem>_debug.jpg` overlays.
    pub render: bool,
    /// Log per-image failures and carry on instead of aborting.
    pub keep_going: bool,
    /// CSV receiving one `<image>,Error: <message>` line per failure.
    pub error_log: Option<PathBuf>,
}

impl SinkOptions {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            format: OutputFormat::default(),
            skip_existing: false,
            render: false,
            keep_going: false,
            error_log: None,
        }
    }
}

fn file_stem(input: &Path) -> Result<&std::ffi::OsStr> {
    input.file_stem().ok_or_else(|| FaceSegError::Input {
        path: input.to_path_buf(),
        reason: "path has no file name".to_string(),
    })
}

/// `<output_dir>/<stem>.<ext>`, whatever the input's own extension was.
pub fn output_path(input: &Path, output_dir: &Path, format: OutputFormat) -> Result<PathBuf> {
    let mut name = file_stem(input)?.to_os_string();
    name.push(".");
    name.push(format.extension());
    Ok(output_dir.join(name))
}

/// `<output_dir>/<stem>_debug.jpg`
pub fn debug_render_path(input: &Path, output_dir: &Path) -> Result<PathBuf> {
    let mut name = file_stem(input)?.to_os_string();
    name.push("_debug.jpg");
    Ok(output_dir.join(name))
}

pub fn ensure_output_dir(output_dir: &Path) -> Result<()> {
    fs::create_dir_all(output_dir)
        .map_err(|e| FaceSegError::file_system(output_dir, "output directory creation", e))
}

pub fn write_label_map(labels: &LabelMap, path: &Path, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Npy => npy::save_labels(path, labels.labels()),
        OutputFormat::Png => labels
            .to_luma8()
            .save_with_format(path, ImageFormat::Png)
            .map_err(|e| FaceSegError::ImageProcessing {
                path: path.display().to_string(),
                operation: "label image save".to_string(),
                source: Box::new(e),
            }),
    }
}

pub fn write_debug_render(image: &DynamicImage, labels: &LabelMap, path: &Path) -> Result<()> {
    let overlay = render::render_overlay(image, labels)?;
    overlay
        .save_with_format(path, ImageFormat::Jpeg)
        .map_err(|e| FaceSegError::ImageProcessing {
            path: path.display().to_string(),
            operation: "debug render save".to_string(),
            source: Box::new(e),
        })?;
    debug!("Wrote debug render {}", path.display());
    Ok(())
}

/// Append-only CSV of per-image failures.
pub struct ErrorLog {
    path: PathBuf,
    writer: BufWriter<File>,
}

impl ErrorLog {
    pub fn create(path: &Path) -> Result<Self> {
        let file = File::create(path)
            .map_err(|e| FaceSegError::file_system(path, "error log creation", e))?;
        Ok(Self {
            path: path.to_path_buf(),
            writer: BufWriter::new(file),
        })
    }

    pub fn record(&mut self, image: &Path, message: &str) -> Result<()> {
        // one record per line
        let message = message.replace(['\n', '\r'], " ");
        writeln!(self.writer, "{},Error: {}", image.display(), message)
            .and_then(|()| self.writer.flush())
            .map_err(|e| FaceSegError::file_system(&self.path, "error log write", e))
    }
}
