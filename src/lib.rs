//! Point cloud IO backend: loads PLY files into N×3 position arrays and saves
//! labeled point clouds as colored PLY files.
//!
//! The two main operations are [`load_pointcloud`] and [`save_colored_ply`].
//! Both are synchronous and don't keep any state between calls. With the
//! `python` feature, they are exported as the Python extension module
//! `pc_backend`.
//!
//! ```no_run
//! use cgmath::Point3;
//!
//! let points = pc_backend::load_pointcloud("scan.ply")?;
//! let labels: Vec<i32> = points.iter().map(|p| if p.z > 0.5 { 1 } else { 0 }).collect();
//! pc_backend::save_colored_ply("scan_labeled.ply", &points, &labels)?;
//! # let _ = Point3::new(0.0f32, 0.0, 0.0);
//! # Ok::<(), pc_backend::Error>(())
//! ```

use std::{
    fs::File,
    io::BufWriter,
    path::Path,
};

use cgmath::Point3;
use log::{debug, info, warn};


pub mod cloud;
pub mod color;
mod error;
pub mod io;

#[cfg(feature = "python")]
mod python;

pub use self::{
    cloud::PointCloud,
    color::{Label, Rgb, label_color},
    error::Error,
};

use crate::io::ply;


/// Loads the vertex positions of the PLY file at `path`.
///
/// All element groups other than `vertex` (e.g. faces of a mesh) are
/// ignored. Any failure, including a file that cannot be opened, results in
/// `Error::FileFormat`.
pub fn load_pointcloud(path: impl AsRef<Path>) -> Result<Vec<Point3<f32>>, Error> {
    read_cloud(path).map(PointCloud::into_positions)
}

/// Loads the vertex positions and, if present, the `uchar` vertex colors of
/// the PLY file at `path`.
pub fn read_cloud(path: impl AsRef<Path>) -> Result<PointCloud, Error> {
    let path = path.as_ref();
    if !io::is_ply_extension(path) {
        warn!("'{}' does not have a '.ply' extension, trying to load as PLY anyway", path.display());
    }

    let cloud = ply::Reader::open(path)
        .and_then(|reader| reader.read_cloud())
        .map_err(|e| Error::file_format(path, e))?;

    debug!(
        "loaded {} points ({}) from '{}'",
        cloud.len(),
        if cloud.colors().is_some() { "with colors" } else { "without colors" },
        path.display(),
    );

    Ok(cloud)
}

/// Saves the points as ASCII PLY file at `path`, each point colored according
/// to its label (see [`label_color`]). An existing file is overwritten.
///
/// `labels` must have exactly one entry per point, otherwise
/// `Error::InvalidArgument` is returned before the file is touched.
pub fn save_colored_ply(
    path: impl AsRef<Path>,
    positions: &[Point3<f32>],
    labels: &[i32],
) -> Result<(), Error> {
    save_colored_ply_with(path, positions, labels, ply::Config::ascii())
}

/// Like [`save_colored_ply`], but with the given PLY configuration (e.g. to
/// use binary encoding).
pub fn save_colored_ply_with(
    path: impl AsRef<Path>,
    positions: &[Point3<f32>],
    labels: &[i32],
    config: ply::Config,
) -> Result<(), Error> {
    let path = path.as_ref();

    // Validate before creating the file, so that nothing is truncated.
    let cloud = PointCloud::from_labels(positions.to_vec(), labels)?;
    write_cloud(path, &cloud, config)?;

    info!("saved colored PLY with {} points to '{}'", cloud.len(), path.display());
    Ok(())
}

/// Writes the given point cloud to `path` with the given PLY configuration.
pub fn write_cloud(
    path: impl AsRef<Path>,
    cloud: &PointCloud,
    config: ply::Config,
) -> Result<(), Error> {
    let path = path.as_ref();
    let file = File::create(path).map_err(|e| Error::io(path, e))?;

    config.into_writer(BufWriter::new(file))
        .write_cloud(cloud)
        .map_err(|e| Error::write(path, e))
}
