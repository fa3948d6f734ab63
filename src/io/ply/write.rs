//! Everything related to writing a PLY file.
//!
//! # Random notes on the format
//!
//! Unfortunately, the PLY format is terribly underspecified (as are most
//! point cloud formats). Therefore, here are a few notes on missing
//! information or this particular implementation.
//!
//! - The format description says "The header is a series of carriage-return
//!   terminated lines", but its own example files and all files in the wild
//!   use `'\n'` as terminator and not `'\r'` (carriage-return).
//! - For ASCII encoding we simply use the `fmt::Display` impl of all types.
//!   For floats, this is the shortest representation that parses back to the
//!   exact same value, so positions survive a write/read cycle unchanged.

use std::io::{self, Write};

use byteorder::{BigEndian, LittleEndian};

use crate::cloud::PointCloud;
use super::{
    Encoding, Error,
    raw::{
        ElementDef, PlyScalar, PropVec, PropertyDef, PropertyType, RawSource,
        ScalarType, Serializer,
    },
};



// ===============================================================================================
// ===== PLY Config
// ===============================================================================================

/// Used to configure and create a [`Writer`].
///
/// This is used to configure basic settings for the file to be written. Most
/// importantly, this is the file encoding. Additionally, you can add comments
/// to the file header. With [`Config::into_writer`] you can create a
/// [`Writer`].
#[derive(Clone, Debug)]
pub struct Config {
    encoding: Encoding,
    comments: Vec<String>,
}

impl Config {
    /// Creates a new configuration with binary encoding (native endianness).
    pub fn binary() -> Self {
        Self::new(Encoding::binary_native())
    }

    /// Creates a new configuration with ASCII encoding.
    ///
    /// ASCII encoding is a lot less space efficient and a lot slower to read
    /// and write than binary encoding, but it is human readable and
    /// understood by every tool.
    pub fn ascii() -> Self {
        Self::new(Encoding::Ascii)
    }

    /// Creates a new configuration with the given encoding.
    pub fn new(encoding: Encoding) -> Self {
        Self {
            encoding,
            comments: vec![],
        }
    }

    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    /// Adds a `comment` line to the file header.
    ///
    /// The given string must not contain `'\n'` or else this method panics.
    /// Note that there are probably other characters that could invalidate the
    /// file header or at least confuse some parsers. You should thus take care
    /// what strings you pass in.
    pub fn add_comment(mut self, comment: impl Into<String>) -> Self {
        let comment = comment.into();

        assert!(!comment.contains('\n'), "PLY comments must not contain '\\n'!");

        self.comments.push(comment);
        self
    }

    /// Creates a writer with the given `io::Write` instance and `self` as
    /// configuration.
    pub fn into_writer<W: io::Write>(self, writer: W) -> Writer<W> {
        Writer::new(self, writer)
    }
}


// ===============================================================================================
// ===== PLY Writer
// ===============================================================================================

/// A writer able to write binary and ASCII PLY files.
///
/// There are two ways to write data: (a) using [`write_cloud`][
/// Writer::write_cloud] (you probably want to do that), or (b) using the low
/// level API via [`write_raw`][Writer::write_raw] (you only need to do that
/// in very special situations).
///
///
/// # Example
///
/// ```
/// use std::{fs::File, io::BufWriter};
/// use pc_backend::{
///     PointCloud,
///     io::ply::{Config, Error},
/// };
///
/// fn write_both_encodings(cloud: &PointCloud) -> Result<(), Error> {
///     // We use `BufWriter` here because unbuffered file access is usually a
///     // lot slower.
///     let file_a = File::create("cloud_ascii.ply")?;
///     Config::ascii().into_writer(BufWriter::new(file_a)).write_cloud(cloud)?;
///
///     let file_b = File::create("cloud_binary.ply")?;
///     Config::binary().into_writer(BufWriter::new(file_b)).write_cloud(cloud)?;
///
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct Writer<W: io::Write> {
    config: Config,
    writer: W,
}

impl<W: io::Write> Writer<W> {
    /// Creates a new PLY writer with the given PLY config which will write to
    /// the given `io::Write` instance.
    pub fn new(config: Config, writer: W) -> Self {
        Self { config, writer }
    }

    /// Writes the point cloud as a single `vertex` element group with the
    /// properties `x y z` (as `float`) and, if the cloud has colors,
    /// `red green blue` (as `uchar`).
    pub fn write_cloud(self, cloud: &PointCloud) -> Result<(), Error> {
        let float = PropertyType::Scalar(ScalarType::Float);
        let mut property_defs = PropVec::new();
        for &name in &["x", "y", "z"] {
            property_defs.push(PropertyDef { ty: float, name: name.into() });
        }

        // In theory, you can store float colors in PLY, but in practice
        // everyone expects `uchar` as color channel type.
        if cloud.colors().is_some() {
            let uchar = PropertyType::Scalar(ScalarType::UChar);
            for &name in &["red", "green", "blue"] {
                property_defs.push(PropertyDef { ty: uchar, name: name.into() });
            }
        }

        let vertex_def = ElementDef {
            name: "vertex".into(),
            count: cloud.len() as u64,
            property_defs,
        };

        struct CloudSource<'a>(&'a PointCloud);

        impl RawSource for CloudSource<'_> {
            fn serialize_into<S: Serializer>(self, mut ser: S) -> Result<(), Error> {
                let cloud = self.0;
                for (i, p) in cloud.positions().iter().enumerate() {
                    ser.add_slice(&[p.x, p.y, p.z])?;
                    if let Some(colors) = cloud.colors() {
                        let c = colors[i];
                        ser.add_slice(&[c.r, c.g, c.b])?;
                    }
                    ser.end_element()?;
                }

                Ok(())
            }
        }

        self.write_raw(&[vertex_def], CloudSource(cloud))
    }

    /// Low level function to write PLY files.
    ///
    /// You usually don't need to use this function directly. The `source`
    /// has to produce exactly the elements described by `header`, in order;
    /// this is not checked.
    pub fn write_raw(
        mut self,
        header: &[ElementDef],
        source: impl RawSource,
    ) -> Result<(), Error> {
        let w = &mut self.writer;

        // ===================================================================
        // ===== Write header (this part is always ASCII)
        // ===================================================================
        // Magic signature
        w.write_all(b"ply\n")?;

        // The line defining the format of the file
        writeln!(w, "format {} 1.0", self.config.encoding.header_keyword())?;

        // Add all comments
        for comment in &self.config.comments {
            writeln!(w, "comment {}", comment)?;
        }

        // Define all elements with their properties
        for element_def in header {
            writeln!(w, "element {} {}", element_def.name, element_def.count)?;
            for prop in element_def.property_defs.iter() {
                match prop.ty {
                    PropertyType::Scalar(ty) => {
                        writeln!(w, "property {} {}", ty.ply_type_name(), prop.name)?;
                    }
                    PropertyType::List { scalar_type, len_type } => {
                        writeln!(
                            w,
                            "property list {} {} {}",
                            len_type.to_scalar_type().ply_type_name(),
                            scalar_type.ply_type_name(),
                            prop.name,
                        )?;
                    }
                }
            }
        }

        w.write_all(b"end_header\n")?;


        // ===================================================================
        // ===== Write body
        // ===================================================================
        match self.config.encoding {
            Encoding::Ascii => source.serialize_into(AsciiSerializer::new(w))?,
            Encoding::BinaryBigEndian => source.serialize_into(BinaryBeSerializer::new(w))?,
            Encoding::BinaryLittleEndian => source.serialize_into(BinaryLeSerializer::new(w))?,
        }

        // Errors when flushing a `BufWriter` on drop would be lost.
        w.flush()?;
        Ok(())
    }
}


// ===============================================================================================
// ===== Definition of ASCII and binary serializers
// ===============================================================================================
// These serializers are just used to abstract over the encoding (and things
// like separators and line endings).

#[derive(Debug)]
struct AsciiSerializer<'a, W: Write> {
    writer: &'a mut W,
    at_start_of_line: bool,
}

impl<'a, W: Write> AsciiSerializer<'a, W> {
    fn new(w: &'a mut W) -> Self {
        Self {
            writer: w,
            at_start_of_line: true,
        }
    }

    fn write_separator(&mut self) -> Result<(), Error> {
        if self.at_start_of_line {
            self.at_start_of_line = false;
        } else {
            self.writer.write_all(b" ")?;
        }

        Ok(())
    }
}

impl<W: io::Write> Serializer for AsciiSerializer<'_, W> {
    fn add<P: PlyScalar>(&mut self, v: P) -> Result<(), Error> {
        self.write_separator()?;
        write!(self.writer, "{}", v)?;
        Ok(())
    }

    fn end_element(&mut self) -> Result<(), Error> {
        self.writer.write_all(b"\n")?;
        self.at_start_of_line = true;
        Ok(())
    }
}

macro_rules! gen_binary_block {
    ($name:ident, $endianness:ident) => {
        #[derive(Debug)]
        struct $name<'a, W: Write> {
            writer: &'a mut W,
        }

        impl<'a, W: Write> $name<'a, W> {
            fn new(w: &'a mut W) -> Self {
                Self {
                    writer: w,
                }
            }
        }

        impl<W: io::Write> Serializer for $name<'_, W> {
            fn add<P: PlyScalar>(&mut self, v: P) -> Result<(), Error> {
                v.write_binary::<$endianness, _>(self.writer)?;
                Ok(())
            }

            fn end_element(&mut self) -> Result<(), Error> {
                // NOOP
                Ok(())
            }
        }
    }
}

gen_binary_block!(BinaryBeSerializer, BigEndian);
gen_binary_block!(BinaryLeSerializer, LittleEndian);
