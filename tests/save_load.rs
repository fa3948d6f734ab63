//! Tests `load_pointcloud` and `save_colored_ply` through actual files.

use std::fs;

use cgmath::Point3;
use tempfile::TempDir;

use pc_backend::{
    Error, Rgb, PointCloud,
    io::ply::Config,
};


fn points(n: usize) -> Vec<Point3<f32>> {
    (0..n)
        .map(|i| {
            let i = i as f32;
            Point3::new(i * 0.1, -i * 1.5, i * i * 1e-3)
        })
        .collect()
}

#[test]
fn round_trip() -> Result<(), Error> {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("cloud.ply");

    let positions = points(100);
    let labels: Vec<i32> = (0..100).map(|i| i % 5 - 1).collect();
    pc_backend::save_colored_ply(&path, &positions, &labels)?;

    assert_eq!(pc_backend::load_pointcloud(&path)?, positions);

    Ok(())
}

#[test]
fn round_trip_keeps_label_colors() -> Result<(), Error> {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("two.ply");

    let positions = vec![Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 1.0, 1.0)];
    pc_backend::save_colored_ply(&path, &positions, &[1, 2])?;

    let cloud = pc_backend::read_cloud(&path)?;
    assert_eq!(cloud.positions(), &positions[..]);
    assert_eq!(cloud.colors(), Some(&[Rgb::BLUE, Rgb::RED][..]));

    let content = fs::read_to_string(&path).unwrap();
    assert!(content.starts_with("ply\nformat ascii 1.0\n"));
    assert!(content.ends_with("end_header\n0 0 0 0 0 255\n1 1 1 255 0 0\n"));

    Ok(())
}

#[test]
fn binary_round_trip() -> Result<(), Error> {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("binary.ply");

    let positions = points(1000);
    let labels = vec![2; 1000];
    pc_backend::save_colored_ply_with(&path, &positions, &labels, Config::binary())?;

    let cloud = pc_backend::read_cloud(&path)?;
    assert_eq!(cloud.positions(), &positions[..]);
    assert!(cloud.colors().unwrap().iter().all(|&c| c == Rgb::RED));

    Ok(())
}

#[test]
fn empty_cloud() -> Result<(), Error> {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("empty.ply");

    pc_backend::save_colored_ply(&path, &[], &[])?;
    assert!(pc_backend::load_pointcloud(&path)?.is_empty());

    Ok(())
}

#[test]
fn load_nonexistent() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("does_not_exist.ply");

    match pc_backend::load_pointcloud(&path) {
        Err(Error::FileFormat { path: p, .. }) => assert!(p.ends_with("does_not_exist.ply")),
        other => panic!("unexpected result: {:?}", other),
    }
}

#[test]
fn load_garbage() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("garbage.ply");
    fs::write(&path, b"this is not a ply file\n").unwrap();

    assert!(matches!(pc_backend::load_pointcloud(&path), Err(Error::FileFormat { .. })));
}

#[test]
fn load_other_extension() -> Result<(), Error> {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("cloud.txt");
    pc_backend::save_colored_ply(&path, &points(3), &[0, 0, 0])?;

    assert_eq!(pc_backend::load_pointcloud(&path)?, points(3));

    Ok(())
}

#[test]
fn mismatched_labels_dont_touch_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("never.ply");

    match pc_backend::save_colored_ply(&path, &points(3), &[0, 1]) {
        Err(Error::InvalidArgument(_)) => {}
        other => panic!("unexpected result: {:?}", other),
    }
    assert!(!path.exists());

    // An existing file stays as it is.
    fs::write(&path, b"keep me").unwrap();
    assert!(pc_backend::save_colored_ply(&path, &points(1), &[0, 1]).is_err());
    assert_eq!(fs::read(&path).unwrap(), b"keep me");
}

#[test]
fn overwrite_truncates() -> Result<(), Error> {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("overwrite.ply");

    pc_backend::save_colored_ply(&path, &points(500), &vec![0; 500])?;
    pc_backend::save_colored_ply(&path, &points(2), &[1, 1])?;

    assert_eq!(pc_backend::load_pointcloud(&path)?, points(2));

    Ok(())
}

#[test]
fn save_into_missing_directory() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("no").join("such").join("dir.ply");

    match pc_backend::save_colored_ply(&path, &points(1), &[0]) {
        Err(Error::Io { .. }) => {}
        other => panic!("unexpected result: {:?}", other),
    }
}

#[test]
fn write_cloud_without_colors() -> Result<(), Error> {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("plain.ply");

    let cloud = PointCloud::from_flat(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0])?;
    pc_backend::write_cloud(&path, &cloud, Config::ascii().add_comment("plain"))?;

    let content = fs::read_to_string(&path).unwrap();
    assert!(content.contains("comment plain\n"));
    assert!(!content.contains("red"));
    assert_eq!(pc_backend::read_cloud(&path)?, cloud);

    Ok(())
}

#[cfg(target_os = "linux")]
#[test]
fn write_failure_is_io() {
    // Opening `/dev/full` works, but every write fails with ENOSPC.
    let path = std::path::Path::new("/dev/full");
    if !path.exists() {
        return;
    }

    match pc_backend::save_colored_ply(path, &points(10), &[0; 10]) {
        Err(e @ Error::Io { .. }) => assert!(e.to_string().starts_with("failed to write")),
        other => panic!("unexpected result: {:?}", other),
    }
}
