use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use face_seg_rs::{
    input::{read_image_list, resolve_inputs},
    mocks::{FailingNetwork, MockSegmentationNetwork},
    npy, FaceSegmenter, MissingInputPolicy, OutputFormat, Outcome, SegmentationNetwork,
    SinkOptions, Summary,
};
use image::{DynamicImage, Rgb, RgbImage};

fn write_image(path: &Path, width: u32, height: u32, blue: u8) {
    let image = DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, _| {
        Rgb([(x % 256) as u8, 40, blue])
    }));
    image.save(path).unwrap();
}

fn listed(dir: &Path) -> Vec<String> {
    let mut names: Vec<_> = fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

fn run<N: SegmentationNetwork>(
    network: N,
    input: &Path,
    options: SinkOptions,
) -> face_seg_rs::Result<Summary> {
    let paths = resolve_inputs(input, MissingInputPolicy::Error)?;
    FaceSegmenter::new(network, options).process_all(&paths)
}

#[test]
fn test_single_file_produces_one_npy_named_after_stem() {
    let temp_dir = TempDir::new().unwrap();
    let input = temp_dir.path().join("photo.jpg");
    let output_dir = temp_dir.path().join("output");
    write_image(&input, 120, 80, 200);

    let summary = run(
        MockSegmentationNetwork::new(3),
        &input,
        SinkOptions::new(&output_dir),
    )
    .unwrap();

    assert_eq!(summary.written, 1);
    assert_eq!(listed(&output_dir), vec!["photo.npy"]);

    let labels = npy::load_labels(&output_dir.join("photo.npy")).unwrap();
    assert_eq!(labels.dim(), (500, 500));
    assert!(labels.iter().all(|&l| (0..3).contains(&l)));
}

#[test]
fn test_directory_skips_non_file_entries() {
    let temp_dir = TempDir::new().unwrap();
    let input_dir = temp_dir.path().join("input");
    let output_dir = temp_dir.path().join("output");
    fs::create_dir_all(input_dir.join("nested")).unwrap();
    fs::create_dir_all(input_dir.join("empty")).unwrap();

    write_image(&input_dir.join("a.png"), 64, 64, 0);
    write_image(&input_dir.join("b.jpg"), 90, 30, 128);
    write_image(&input_dir.join("c.png"), 10, 300, 255);
    write_image(&input_dir.join("nested").join("d.png"), 16, 16, 10);

    let network = MockSegmentationNetwork::new(2);
    let summary = run(&network, &input_dir, SinkOptions::new(&output_dir)).unwrap();

    assert_eq!(summary.written, 3);
    assert_eq!(network.calls(), 3);
    assert_eq!(listed(&output_dir), vec!["a.npy", "b.npy", "c.npy"]);
}

#[test]
fn test_repeated_runs_are_byte_identical() {
    let temp_dir = TempDir::new().unwrap();
    let input = temp_dir.path().join("face.png");
    write_image(&input, 333, 211, 90);

    let first = temp_dir.path().join("first");
    let second = temp_dir.path().join("second");
    let network = MockSegmentationNetwork::new(4);
    run(&network, &input, SinkOptions::new(&first)).unwrap();
    run(&network, &input, SinkOptions::new(&second)).unwrap();

    assert_eq!(
        fs::read(first.join("face.npy")).unwrap(),
        fs::read(second.join("face.npy")).unwrap()
    );
}

#[test]
fn test_skip_existing_does_not_run_the_network() {
    let temp_dir = TempDir::new().unwrap();
    let input_dir = temp_dir.path().join("input");
    let output_dir = temp_dir.path().join("output");
    fs::create_dir_all(&input_dir).unwrap();
    fs::create_dir_all(&output_dir).unwrap();
    write_image(&input_dir.join("done.png"), 20, 20, 0);
    write_image(&input_dir.join("todo.png"), 20, 20, 0);
    fs::write(output_dir.join("done.npy"), b"previous result").unwrap();

    let network = MockSegmentationNetwork::new(2);
    let options = SinkOptions {
        skip_existing: true,
        ..SinkOptions::new(&output_dir)
    };
    let summary = run(&network, &input_dir, options).unwrap();

    assert_eq!(
        summary,
        Summary {
            written: 1,
            skipped: 1,
            failed: 0
        }
    );
    assert_eq!(network.calls(), 1);
    assert_eq!(
        fs::read(output_dir.join("done.npy")).unwrap(),
        b"previous result"
    );
}

#[test]
fn test_first_failure_aborts_by_default() {
    let temp_dir = TempDir::new().unwrap();
    let input_dir = temp_dir.path().join("input");
    let output_dir = temp_dir.path().join("output");
    fs::create_dir_all(&input_dir).unwrap();
    fs::write(input_dir.join("a_broken.jpg"), b"not an image").unwrap();
    write_image(&input_dir.join("b_fine.png"), 20, 20, 0);

    let network = MockSegmentationNetwork::new(2);
    assert!(run(&network, &input_dir, SinkOptions::new(&output_dir)).is_err());
    assert_eq!(network.calls(), 0);
    assert!(listed(&output_dir).is_empty());
}

#[test]
fn test_keep_going_records_failures() {
    let temp_dir = TempDir::new().unwrap();
    let input_dir = temp_dir.path().join("input");
    let output_dir = temp_dir.path().join("output");
    let error_log = temp_dir.path().join("errors.csv");
    fs::create_dir_all(&input_dir).unwrap();
    fs::write(input_dir.join("a_broken.jpg"), b"not an image").unwrap();
    write_image(&input_dir.join("b_fine.png"), 20, 20, 0);

    let options = SinkOptions {
        keep_going: true,
        error_log: Some(error_log.clone()),
        ..SinkOptions::new(&output_dir)
    };
    let summary = run(MockSegmentationNetwork::new(2), &input_dir, options).unwrap();

    assert_eq!(summary.written, 1);
    assert_eq!(summary.failed, 1);
    assert_eq!(listed(&output_dir), vec!["b_fine.npy"]);

    let log = fs::read_to_string(&error_log).unwrap();
    assert_eq!(log.lines().count(), 1);
    assert!(log.starts_with(&format!("{},Error: ", input_dir.join("a_broken.jpg").display())));
}

#[test]
fn test_network_failure_leaves_no_output() {
    let temp_dir = TempDir::new().unwrap();
    let input = temp_dir.path().join("face.png");
    let output_dir = temp_dir.path().join("output");
    write_image(&input, 20, 20, 0);

    assert!(run(FailingNetwork, &input, SinkOptions::new(&output_dir)).is_err());
    assert!(listed(&output_dir).is_empty());
}

#[test]
fn test_png_format_and_debug_render() {
    let temp_dir = TempDir::new().unwrap();
    let input = temp_dir.path().join("portrait.jpg");
    let output_dir = temp_dir.path().join("output");
    write_image(&input, 64, 48, 255);

    let options = SinkOptions {
        format: OutputFormat::Png,
        render: true,
        ..SinkOptions::new(&output_dir)
    };
    let segmenter = FaceSegmenter::new(MockSegmentationNetwork::new(2), options);
    let outcome = segmenter.process_image(&input).unwrap();

    assert_eq!(outcome, Outcome::Written(output_dir.join("portrait.png")));
    assert_eq!(
        listed(&output_dir),
        vec!["portrait.png", "portrait_debug.jpg"]
    );

    let labels = image::open(output_dir.join("portrait.png")).unwrap().into_luma8();
    assert_eq!(labels.dimensions(), (500, 500));
    assert!(labels.pixels().all(|p| p.0[0] == 1));

    let render = image::open(output_dir.join("portrait_debug.jpg")).unwrap();
    assert_eq!(render.width(), 64);
    assert_eq!(render.height(), 48);
}

#[test]
fn test_image_list_input() {
    let temp_dir = TempDir::new().unwrap();
    let first = temp_dir.path().join("first.png");
    let second = temp_dir.path().join("second.png");
    write_image(&first, 10, 10, 0);
    write_image(&second, 10, 10, 0);

    let list = temp_dir.path().join("images.txt");
    fs::write(
        &list,
        format!("{}\n{}\n", second.display(), first.display()),
    )
    .unwrap();

    let paths = read_image_list(&list).unwrap();
    assert_eq!(paths, vec![PathBuf::from(&second), PathBuf::from(&first)]);

    let output_dir = temp_dir.path().join("output");
    let summary = FaceSegmenter::new(
        MockSegmentationNetwork::new(2),
        SinkOptions::new(&output_dir),
    )
    .process_all(&paths)
    .unwrap();
    assert_eq!(summary.written, 2);
    assert_eq!(listed(&output_dir), vec!["first.npy", "second.npy"]);
}

#[test]
fn test_missing_input_can_be_ignored() {
    let temp_dir = TempDir::new().unwrap();
    let missing = temp_dir.path().join("nothing-here");

    assert!(resolve_inputs(&missing, MissingInputPolicy::Error).is_err());
    let paths = resolve_inputs(&missing, MissingInputPolicy::Ignore).unwrap();
    assert!(paths.is_empty());
}
