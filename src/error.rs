use std::{
    io,
    path::Path,
};

use failure::Fail;

use crate::io::ply;


/// Errors of the point cloud load and save operations.
///
/// Every error is terminal for the call that returned it. Nothing is retried
/// and no partial results are returned.
#[derive(Debug, Fail)]
pub enum Error {
    /// The file could not be loaded: it could not be opened or read, or it is
    /// not a PLY file containing vertex positions.
    #[fail(display = "failed to load point cloud from '{}': {}", path, cause)]
    FileFormat {
        path: String,
        #[cause]
        cause: ply::Error,
    },

    /// The arguments passed in are inconsistent, e.g. a different number of
    /// labels than points.
    #[fail(display = "invalid argument: {}", _0)]
    InvalidArgument(String),

    /// Creating or writing the output file failed.
    #[fail(display = "failed to write '{}': {}", path, cause)]
    Io {
        path: String,
        #[cause]
        cause: io::Error,
    },
}

impl Error {
    pub(crate) fn file_format(path: &Path, cause: ply::Error) -> Self {
        Error::FileFormat {
            path: path.display().to_string(),
            cause,
        }
    }

    pub(crate) fn invalid_argument(msg: impl Into<String>) -> Self {
        Error::InvalidArgument(msg.into())
    }

    /// Everything that goes wrong while writing a file is an IO error.
    pub(crate) fn write(path: &Path, cause: ply::Error) -> Self {
        let cause = match cause {
            ply::Error::Io(e) => e,
            other => io::Error::new(io::ErrorKind::Other, other.to_string()),
        };
        Self::io(path, cause)
    }

    pub(crate) fn io(path: &Path, cause: io::Error) -> Self {
        Error::Io {
            path: path.display().to_string(),
            cause,
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_errors_are_io() {
        let path = Path::new("out/cloud.ply");

        match Error::write(path, ply::Error::MissingElement("vertex".into())) {
            Error::Io { path, cause } => {
                assert_eq!(path, "out/cloud.ply");
                assert!(cause.to_string().contains("vertex"));
            }
            other => panic!("unexpected error: {:?}", other),
        }

        let disk_full = io::Error::new(io::ErrorKind::Other, "disk full");
        match Error::write(path, ply::Error::Io(disk_full)) {
            Error::Io { cause, .. } => assert_eq!(cause.to_string(), "disk full"),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn display_names_the_path() {
        let e = Error::file_format(Path::new("a.ply"), ply::Error::MissingElement("vertex".into()));
        assert!(e.to_string().starts_with("failed to load point cloud from 'a.ply'"));

        let e = Error::io(Path::new("b.ply"), io::Error::new(io::ErrorKind::Other, "nope"));
        assert_eq!(e.to_string(), "failed to write 'b.ply': nope");
    }
}
