//! Python extension module `pc_backend`.
//!
//! Inputs are copied out of the numpy arrays while holding the GIL; the file
//! IO itself runs with the GIL released.

use std::convert::TryFrom;

use cgmath::Point3;
use numpy::{
    IntoPyArray, PyArray2, PyReadonlyArray1, PyReadonlyArray2,
    ndarray::{Array2, ArrayView1, ArrayView2},
};
use pyo3::{
    create_exception,
    exceptions::{PyException, PyOSError, PyValueError},
    prelude::*,
};

use crate::{
    Error,
    io::ply,
};


create_exception!(pc_backend, FileFormatError, PyException, "The file is not a loadable PLY file.");
create_exception!(pc_backend, InvalidArgument, PyValueError, "Inconsistent arguments.");

impl From<Error> for PyErr {
    fn from(e: Error) -> Self {
        let msg = e.to_string();
        match e {
            Error::FileFormat { .. } => FileFormatError::new_err(msg),
            Error::InvalidArgument(_) => InvalidArgument::new_err(msg),
            Error::Io { .. } => PyOSError::new_err(msg),
        }
    }
}

/// Loads the vertex positions of a PLY file as `float32` array of shape
/// `(N, 3)`.
#[pyfunction]
#[pyo3(name = "load_pointcloud")]
fn py_load_pointcloud<'py>(py: Python<'py>, path: String) -> PyResult<Bound<'py, PyArray2<f32>>> {
    let cloud = py.allow_threads(|| crate::read_cloud(&path))?;

    let n = cloud.len();
    let array = Array2::from_shape_vec((n, 3), cloud.to_flat())
        .map_err(|e| PyErr::new::<pyo3::exceptions::PyRuntimeError, _>(e.to_string()))?;

    Ok(array.into_pyarray_bound(py))
}

/// Saves the `(N, 3)` positions as PLY file, colored by the `N` labels.
#[pyfunction]
#[pyo3(name = "save_colored_ply", signature = (path, xyz, labels, binary = false))]
fn py_save_colored_ply(
    py: Python<'_>,
    path: String,
    xyz: &Bound<'_, PyAny>,
    labels: &Bound<'_, PyAny>,
    binary: bool,
) -> PyResult<()> {
    let positions = extract_positions(xyz)?;
    let labels = extract_labels(labels)?;
    let config = if binary { ply::Config::binary() } else { ply::Config::ascii() };

    py.allow_threads(|| crate::save_colored_ply_with(&path, &positions, &labels, config))?;
    Ok(())
}

/// Accepts 2D `float32` and `float64` arrays.
fn extract_positions(xyz: &Bound<'_, PyAny>) -> PyResult<Vec<Point3<f32>>> {
    if let Ok(array) = xyz.extract::<PyReadonlyArray2<'_, f32>>() {
        return Ok(positions_from_view(array.as_array(), |v| v)?);
    }

    let array = xyz.extract::<PyReadonlyArray2<'_, f64>>()
        .map_err(|_| InvalidArgument::new_err("positions must be a 2D float32 or float64 array"))?;

    Ok(positions_from_view(array.as_array(), |v| v as f32)?)
}

/// Accepts 1D `int32` and `int64` arrays.
fn extract_labels(labels: &Bound<'_, PyAny>) -> PyResult<Vec<i32>> {
    if let Ok(array) = labels.extract::<PyReadonlyArray1<'_, i32>>() {
        return Ok(array.as_array().to_vec());
    }

    let array = labels.extract::<PyReadonlyArray1<'_, i64>>()
        .map_err(|_| InvalidArgument::new_err("labels must be a 1D int32 or int64 array"))?;

    Ok(labels_from_i64(array.as_array()))
}

/// Converts the rows of an `(N, 3)` array (with arbitrary strides) to points.
fn positions_from_view<T: Copy>(
    xyz: ArrayView2<'_, T>,
    to_f32: impl Fn(T) -> f32,
) -> Result<Vec<Point3<f32>>, Error> {
    if xyz.ncols() != 3 {
        return Err(Error::invalid_argument(format!(
            "expected positions of shape (N, 3), got {:?}",
            xyz.shape(),
        )));
    }

    let positions = xyz.rows()
        .into_iter()
        .map(|row| Point3::new(to_f32(row[0]), to_f32(row[1]), to_f32(row[2])))
        .collect();

    Ok(positions)
}

/// Labels outside of the `i32` range are unknown labels anyway and are mapped
/// to `-1`.
fn labels_from_i64(labels: ArrayView1<'_, i64>) -> Vec<i32> {
    labels.iter().map(|&l| i32::try_from(l).unwrap_or(-1)).collect()
}

#[pymodule]
fn pc_backend(py: Python<'_>, m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(py_load_pointcloud, m)?)?;
    m.add_function(wrap_pyfunction!(py_save_colored_ply, m)?)?;
    m.add("FileFormatError", py.get_type_bound::<FileFormatError>())?;
    m.add("InvalidArgument", py.get_type_bound::<InvalidArgument>())?;
    Ok(())
}


#[cfg(test)]
mod tests {
    use std::{io, path::Path};

    use numpy::{
        PyArray1, PyArrayMethods, PyUntypedArrayMethods,
        ndarray::{arr1, arr2},
    };
    use tempfile::TempDir;

    use crate::color::{self, Rgb};
    use super::*;

    #[test]
    fn positions_f32() -> Result<(), Error> {
        let xyz = arr2(&[[0.0f32, 1.0, 2.0], [3.5, -4.0, 5.25]]);
        let positions = positions_from_view(xyz.view(), |v| v)?;
        assert_eq!(positions, vec![Point3::new(0.0, 1.0, 2.0), Point3::new(3.5, -4.0, 5.25)]);

        Ok(())
    }

    #[test]
    fn positions_f64_are_narrowed() -> Result<(), Error> {
        let xyz = arr2(&[[0.1f64, 1e300, -2.5]]);
        let positions = positions_from_view(xyz.view(), |v| v as f32)?;
        assert_eq!(positions, vec![Point3::new(0.1f32, std::f32::INFINITY, -2.5)]);

        Ok(())
    }

    #[test]
    fn positions_from_strided_view() -> Result<(), Error> {
        // Column-major view: the transposed array has the points as rows.
        let columns = arr2(&[[1.0f32, 4.0], [2.0, 5.0], [3.0, 6.0]]);
        let positions = positions_from_view(columns.t(), |v| v)?;
        assert_eq!(positions, vec![Point3::new(1.0, 2.0, 3.0), Point3::new(4.0, 5.0, 6.0)]);

        Ok(())
    }

    #[test]
    fn positions_wrong_shape() {
        let xyz = Array2::<f32>::zeros((2, 4));
        match positions_from_view(xyz.view(), |v| v) {
            Err(Error::InvalidArgument(msg)) => assert!(msg.contains("[2, 4]")),
            other => panic!("unexpected result: {:?}", other),
        }

        let empty = Array2::<f32>::zeros((0, 3));
        assert_eq!(positions_from_view(empty.view(), |v| v).ok(), Some(vec![]));
    }

    #[test]
    fn labels_out_of_range_are_unknown() {
        let labels = arr1(&[0i64, 1, 2, 3, 1 << 40, -(1 << 40), -1]);
        let labels = labels_from_i64(labels.view());
        assert_eq!(labels, vec![0, 1, 2, 3, -1, -1, -1]);
        assert_eq!(
            color::colorize(&labels),
            vec![Rgb::GRAY, Rgb::BLUE, Rgb::RED, Rgb::GREEN, Rgb::GREEN, Rgb::GREEN, Rgb::GREEN],
        );
    }

    #[test]
    fn error_mapping() {
        pyo3::prepare_freethreaded_python();
        Python::with_gil(|py| {
            let path = Path::new("cloud.ply");

            let e: PyErr = Error::file_format(path, ply::Error::MissingElement("vertex".into())).into();
            assert!(e.is_instance_of::<FileFormatError>(py));

            let e: PyErr = Error::invalid_argument("got 2 labels for 3 points").into();
            assert!(e.is_instance_of::<InvalidArgument>(py));
            assert!(e.is_instance_of::<PyValueError>(py));

            let e: PyErr = Error::io(path, io::Error::new(io::ErrorKind::Other, "disk full")).into();
            assert!(e.is_instance_of::<PyOSError>(py));
        });
    }

    #[test]
    fn save_and_load_through_numpy() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cloud.ply").to_string_lossy().into_owned();

        pyo3::prepare_freethreaded_python();
        Python::with_gil(|py| {
            let xyz = PyArray2::from_vec2_bound(py, &[vec![0.0f64, 0.0, 0.0], vec![1.0, 1.0, 1.0]])
                .unwrap();
            let labels = PyArray1::from_slice_bound(py, &[1i64, 2]);
            py_save_colored_ply(py, path.clone(), xyz.as_any(), labels.as_any(), false).unwrap();

            let loaded = py_load_pointcloud(py, path.clone()).unwrap();
            assert_eq!(loaded.shape(), &[2, 3]);
            assert_eq!(
                loaded.readonly().as_array(),
                arr2(&[[0.0f32, 0.0, 0.0], [1.0, 1.0, 1.0]]),
            );

            // Wrong label count.
            let short = PyArray1::from_slice_bound(py, &[1i32]);
            let e = py_save_colored_ply(py, path.clone(), xyz.as_any(), short.as_any(), true)
                .unwrap_err();
            assert!(e.is_instance_of::<InvalidArgument>(py));

            // Wrong dtype and shape.
            let float_labels = PyArray1::from_slice_bound(py, &[1.0f32, 2.0]);
            let e = py_save_colored_ply(py, path.clone(), xyz.as_any(), float_labels.as_any(), false)
                .unwrap_err();
            assert!(e.is_instance_of::<InvalidArgument>(py));

            let flat = PyArray1::from_slice_bound(py, &[0.0f32, 1.0, 2.0]);
            let e = py_save_colored_ply(py, path.clone(), flat.as_any(), labels.as_any(), false)
                .unwrap_err();
            assert!(e.is_instance_of::<InvalidArgument>(py));

            let e = py_load_pointcloud(py, format!("{}.missing", path)).unwrap_err();
            assert!(e.is_instance_of::<FileFormatError>(py));
        });
    }
}
