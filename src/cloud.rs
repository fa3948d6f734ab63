use cgmath::Point3;

use crate::{
    color::{self, Rgb},
    error::Error,
};


/// A list of points with optional per-point colors.
///
/// If colors are present, there is exactly one color per point.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PointCloud {
    positions: Vec<Point3<f32>>,
    colors: Option<Vec<Rgb>>,
}

impl PointCloud {
    /// Creates a point cloud without colors.
    pub fn new(positions: Vec<Point3<f32>>) -> Self {
        Self { positions, colors: None }
    }

    /// Creates a colored point cloud. Fails with `Error::InvalidArgument` if
    /// the number of colors differs from the number of points.
    pub fn with_colors(positions: Vec<Point3<f32>>, colors: Vec<Rgb>) -> Result<Self, Error> {
        if positions.len() != colors.len() {
            return Err(Error::invalid_argument(format!(
                "got {} colors for {} points",
                colors.len(),
                positions.len(),
            )));
        }

        Ok(Self { positions, colors: Some(colors) })
    }

    /// Creates a point cloud colored by the given per-point labels (see
    /// [`color::label_color`]). Fails with `Error::InvalidArgument` if the
    /// number of labels differs from the number of points.
    pub fn from_labels(positions: Vec<Point3<f32>>, labels: &[i32]) -> Result<Self, Error> {
        if positions.len() != labels.len() {
            return Err(Error::invalid_argument(format!(
                "got {} labels for {} points",
                labels.len(),
                positions.len(),
            )));
        }

        Ok(Self { positions, colors: Some(color::colorize(labels)) })
    }

    /// Creates a point cloud from a flat `[x0, y0, z0, x1, y1, z1, ...]`
    /// buffer. Fails if the length is not a multiple of 3.
    pub fn from_flat(xyz: &[f32]) -> Result<Self, Error> {
        if xyz.len() % 3 != 0 {
            return Err(Error::invalid_argument(format!(
                "flat position buffer has length {}, which is not a multiple of 3",
                xyz.len(),
            )));
        }

        let positions = xyz.chunks_exact(3)
            .map(|c| Point3::new(c[0], c[1], c[2]))
            .collect();

        Ok(Self::new(positions))
    }

    /// Assumes the caller made sure that `colors` has the same length as
    /// `positions`.
    pub(crate) fn from_parts(positions: Vec<Point3<f32>>, colors: Option<Vec<Rgb>>) -> Self {
        debug_assert!(colors.as_ref().map_or(true, |c| c.len() == positions.len()));
        Self { positions, colors }
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn positions(&self) -> &[Point3<f32>] {
        &self.positions
    }

    pub fn colors(&self) -> Option<&[Rgb]> {
        self.colors.as_deref()
    }

    pub fn into_positions(self) -> Vec<Point3<f32>> {
        self.positions
    }

    /// Returns all positions as flat `[x0, y0, z0, x1, ...]` buffer, i.e. a
    /// row-major N×3 matrix.
    pub fn to_flat(&self) -> Vec<f32> {
        let mut out = Vec::with_capacity(self.positions.len() * 3);
        for p in &self.positions {
            out.extend_from_slice(&[p.x, p.y, p.z]);
        }
        out
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flat_conversion() -> Result<(), Error> {
        let cloud = PointCloud::from_flat(&[0.0, 1.0, 2.0, 3.0, 4.0, 5.5])?;
        assert_eq!(cloud.positions(), &[Point3::new(0.0, 1.0, 2.0), Point3::new(3.0, 4.0, 5.5)]);
        assert_eq!(cloud.to_flat(), vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.5]);
        assert_eq!(cloud.colors(), None);

        Ok(())
    }

    #[test]
    fn flat_bad_length() {
        match PointCloud::from_flat(&[1.0, 2.0]) {
            Err(Error::InvalidArgument(_)) => {}
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn labels_are_colorized() -> Result<(), Error> {
        let positions = vec![Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 1.0, 1.0)];
        let cloud = PointCloud::from_labels(positions, &[1, 2])?;
        assert_eq!(cloud.colors(), Some(&[Rgb::BLUE, Rgb::RED][..]));

        Ok(())
    }

    #[test]
    fn label_count_mismatch() {
        let positions = vec![Point3::new(0.0, 0.0, 0.0); 3];
        match PointCloud::from_labels(positions, &[0, 1]) {
            Err(Error::InvalidArgument(msg)) => assert_eq!(msg, "got 2 labels for 3 points"),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn color_count_mismatch() {
        let positions = vec![Point3::new(0.0, 0.0, 0.0)];
        assert!(PointCloud::with_colors(positions, vec![]).is_err());
    }

    #[test]
    fn empty() {
        let cloud = PointCloud::new(vec![]);
        assert!(cloud.is_empty());
        assert!(cloud.to_flat().is_empty());
    }
}
