use std::fs;
use std::path::PathBuf;

use check_fuzzy_dups::clusters::ClashMap;
use check_fuzzy_dups::config::{FuzzyParams, HashMode};
use check_fuzzy_dups::scanner;
use tempfile::tempdir;

fn run(paths: &[PathBuf], mode: &HashMode) -> ClashMap {
    let files = scanner::collect_files(paths, 0).unwrap();
    let mut map = ClashMap::new(mode.tolerance());
    for file in scanner::hash_files(files, mode) {
        map.insert(file).unwrap();
    }
    map
}

fn fuzzy(tolerance: u32) -> HashMode {
    HashMode::Fuzzy(FuzzyParams {
        tolerance,
        bytes_per_row: 1,
        height: 8,
        bits_per_color: 0,
    })
}

#[test]
fn exact_mode_partitions_by_content() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a.txt"), b"same content").unwrap();
    fs::write(dir.path().join("b.txt"), b"same content").unwrap();
    fs::write(dir.path().join("c.txt"), b"different content").unwrap();

    let map = run(&[dir.path().to_path_buf()], &HashMode::Exact);

    assert_eq!(map.len(), 2);
    // Name-sorted discovery: a.txt opens the first bucket, b.txt joins it.
    let first = &map.buckets()[0];
    let names: Vec<_> = first
        .files
        .iter()
        .map(|f| f.path.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, ["a.txt", "b.txt"]);
    assert_eq!(map.buckets()[1].files.len(), 1);
}

#[test]
fn exact_mode_hashes_twice_identically() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("stable.bin");
    fs::write(&path, b"bytes under test").unwrap();

    let first = run(&[path.clone()], &HashMode::Exact);
    let second = run(&[path], &HashMode::Exact);
    assert_eq!(first.buckets()[0].hash, second.buckets()[0].hash);
}

#[test]
fn corrupt_image_is_skipped_in_fuzzy_mode() {
    let dir = tempdir().unwrap();
    let good = dir.path().join("good.png");
    image::RgbImage::from_fn(24, 24, |x, y| image::Rgb([(x * 10) as u8, (y * 10) as u8, 0]))
        .save(&good)
        .unwrap();
    fs::write(dir.path().join("broken.png"), b"truncated garbage").unwrap();

    let map = run(&[dir.path().to_path_buf()], &fuzzy(5));

    // The undecodable file is excluded and the batch still completes.
    assert_eq!(map.total_files(), 1);
    assert_eq!(
        map.buckets()[0].files[0].path.file_name().unwrap(),
        "good.png"
    );
}

#[test]
fn identical_images_share_a_fuzzy_bucket() {
    let dir = tempdir().unwrap();
    let img = image::RgbImage::from_fn(64, 64, |x, y| {
        image::Rgb([(x * 3) as u8, (y * 2) as u8, (x ^ y) as u8])
    });
    img.save(dir.path().join("one.png")).unwrap();
    img.save(dir.path().join("two.png")).unwrap();

    let map = run(&[dir.path().to_path_buf()], &fuzzy(5));

    assert_eq!(map.len(), 1);
    assert_eq!(map.buckets()[0].files.len(), 2);
    // The first-seen file's digest keys the bucket.
    assert_eq!(map.buckets()[0].hash, map.buckets()[0].files[0].hash);
}

#[test]
fn fuzzy_mode_never_reads_non_images_into_results() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("notes.txt"), b"same bytes").unwrap();
    fs::write(dir.path().join("notes2.txt"), b"same bytes").unwrap();

    let map = run(&[dir.path().to_path_buf()], &fuzzy(5));
    assert!(map.is_empty());
}
