//! Reading and writing files in PLY format.
//!
//! PLY files consist of an ASCII header which defines a number of *element
//! groups* (like `vertex` or `face`) with their *properties* (like `x` or
//! `red`), followed by the body holding the actual values. The body is
//! encoded either as ASCII or as binary with a fixed endianness.
//!
//! The main entry points are [`Reader`] to parse a file and [`Config`] to
//! create a [`Writer`]. The types in [`raw`] describe the header and are
//! only needed for the low level API.

use std::io;

use failure::Fail;

use super::parse;


pub mod raw;
mod read;
mod write;



pub use self::{
    read::{CloudSink, Reader},
    write::{Config, Writer},
};


/// The encoding of the body of a PLY file.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Encoding {
    Ascii,
    BinaryBigEndian,
    BinaryLittleEndian,
}

impl Encoding {
    /// Returns the binary encoding with the native endianness of the target
    /// platform.
    pub fn binary_native() -> Self {
        #[cfg(target_endian = "big")]
        { Encoding::BinaryBigEndian }

        #[cfg(target_endian = "little")]
        { Encoding::BinaryLittleEndian }
    }

    /// Returns the keyword used in the `format` line of the header.
    pub fn header_keyword(&self) -> &'static str {
        match self {
            Encoding::Ascii => "ascii",
            Encoding::BinaryBigEndian => "binary_big_endian",
            Encoding::BinaryLittleEndian => "binary_little_endian",
        }
    }
}

/// Everything that can go wrong while reading or writing a PLY file.
#[derive(Debug, Fail)]
pub enum Error {
    #[fail(display = "IO error: {}", _0)]
    Io(#[cause] io::Error),

    #[fail(display = "parse error: {}", _0)]
    Parse(#[cause] parse::Error),

    #[fail(display = "PLY file has no element group '{}'", _0)]
    MissingElement(String),

    #[fail(display = "element group '{}' has no property '{}'", element, property)]
    MissingProperty {
        element: String,
        property: String,
    },

    #[fail(display = "property '{}' cannot be used: {}", property, msg)]
    UnsupportedProperty {
        property: String,
        msg: String,
    },
}

impl From<io::Error> for Error {
    fn from(src: io::Error) -> Self {
        Error::Io(src)
    }
}

impl From<parse::Error> for Error {
    fn from(src: parse::Error) -> Self {
        match src {
            parse::Error::Io(e) => Error::Io(e),
            other => Error::Parse(other),
        }
    }
}
