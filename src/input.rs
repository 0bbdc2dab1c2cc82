//! Resolving the `--input` argument into the list of images to segment.

use std::{
    fs,
    path::{Path, PathBuf},
};

use clap::ValueEnum;
use log::{debug, warn};
use walkdir::WalkDir;

use crate::errors::{FaceSegError, Result};

/// What to do when the input path does not exist.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum MissingInputPolicy {
    /// Fail the run.
    #[default]
    Error,
    /// Log a warning and process nothing.
    Ignore,
}

/// Expand an input path into image paths.
///
/// A regular file is returned as is. A directory yields its immediate regular
/// files, sorted by name; sub-directories and other entries are skipped.
pub fn resolve_inputs(path: &Path, policy: MissingInputPolicy) -> Result<Vec<PathBuf>> {
    if path.is_file() {
        return Ok(vec![path.to_path_buf()]);
    }

    if path.is_dir() {
        return list_directory(path);
    }

    match policy {
        MissingInputPolicy::Error => Err(FaceSegError::Input {
            path: path.to_path_buf(),
            reason: "input is neither a file nor a directory".to_string(),
        }),
        MissingInputPolicy::Ignore => {
            warn!("Input {} does not exist; nothing to do", path.display());
            Ok(Vec::new())
        }
    }
}

fn list_directory(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut images = Vec::new();
    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
        .sort_by_file_name()
    {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                // dangling symlinks and unreadable entries are not regular files
                debug!("Skipping unreadable entry: {err}");
                continue;
            }
        };
        if entry.file_type().is_file() {
            images.push(entry.into_path());
        } else {
            debug!("Skipping non-file entry {}", entry.path().display());
        }
    }
    Ok(images)
}

/// Read a list of image paths, one per line. Reading stops at the first empty line.
pub fn read_image_list(list_file: &Path) -> Result<Vec<PathBuf>> {
    let contents = fs::read_to_string(list_file)
        .map_err(|e| FaceSegError::file_system(list_file, "image list read", e))?;
    Ok(parse_image_list(&contents))
}

fn parse_image_list(contents: &str) -> Vec<PathBuf> {
    contents
        .lines()
        .map(|line| line.trim_end_matches('\r'))
        .take_while(|line| !line.is_empty())
        .map(PathBuf::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_single_file_is_returned_unfiltered() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let file = temp_dir.path().join("portrait.weird_extension");
        fs::write(&file, b"")?;

        assert_eq!(resolve_inputs(&file, MissingInputPolicy::Error)?, vec![file]);
        Ok(())
    }

    #[test]
    fn test_directory_lists_only_immediate_files() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let root = temp_dir.path();
        fs::write(root.join("b.jpg"), b"")?;
        fs::write(root.join("a.png"), b"")?;
        fs::create_dir(root.join("nested"))?;
        fs::write(root.join("nested").join("c.jpg"), b"")?;

        let found = resolve_inputs(root, MissingInputPolicy::Error)?;
        assert_eq!(found, vec![root.join("a.png"), root.join("b.jpg")]);
        Ok(())
    }

    #[test]
    fn test_missing_input_policy() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let missing = temp_dir.path().join("missing");

        assert!(matches!(
            resolve_inputs(&missing, MissingInputPolicy::Error),
            Err(FaceSegError::Input { .. })
        ));
        assert!(resolve_inputs(&missing, MissingInputPolicy::Ignore)?.is_empty());
        Ok(())
    }

    #[test]
    fn test_image_list_stops_at_blank_line() {
        let list = "data/a.jpg\r\ndata/b.png\n\nignored.jpg\n";
        assert_eq!(
            parse_image_list(list),
            vec![PathBuf::from("data/a.jpg"), PathBuf::from("data/b.png")]
        );
        assert!(parse_image_list("").is_empty());
    }

    #[test]
    fn test_read_image_list_reports_missing_file() {
        let err = read_image_list(Path::new("no/such/list.txt")).unwrap_err();
        assert!(matches!(err, FaceSegError::FileSystem { .. }));
    }
}
