use std::{
    cmp::min,
    fs::File,
    io,
    path::Path,
};

use cgmath::Point3;
use log::debug;
use smallvec::SmallVec;

use crate::{
    cloud::PointCloud,
    color::Rgb,
    io::parse::{
        self, Input, Span, debug_fmt_bytes,
        buf::Buffer,
    },
};
use super::{
    Encoding, Error,
    raw::{
        ElementDef, ListLenType, PropVec, Property, PropertyDef, PropertyType,
        RawResult, RawSink, ScalarType,
    },
};



// ===========================================================================
// ===== Parsing functions
// ===========================================================================
macro_rules! parser {
    ($name:ident = |$buf:ident| -> $out:ty $body:block) => {
        fn $name($buf: &mut impl Input) -> Result<$out, parse::Error> {
            $body
        }
    };
    ($name:ident = |$buf:ident| $body:expr) => {
        parser!($name = |$buf| -> () { $body });
    };
}

/// Whitespace within a line. `'\r'` is included so that files with `\r\n`
/// line endings are accepted.
fn is_blank(b: u8) -> bool {
    b == b' ' || b == b'\t' || b == b'\r'
}

fn is_token_end(b: u8) -> bool {
    is_blank(b) || b == b'\n'
}

// Optionally skip whitespace
parser!(opt_whitespace = |buf| buf.skip_until(|b| !is_blank(b)));

// Requires at least one whitespace, skips all whitespace that follows it.
parser!(whitespace = |buf| {
    buf.saturating_prepare(1)?;
    if buf.is_empty() || !is_blank(buf[0]) {
        let len = min(buf.len(), 1);
        let sd = buf.spanned_data(len);
        let msg = format!("expected whitespace, found {}", debug_fmt_bytes(sd.data));
        return Err(sd.error(msg));
    }

    opt_whitespace(buf)
});

// Requires a '\n' linebreak with optional whitespace before it. The
// format description talks about "carriage-return terminated lines", but all
// files in the wild end their lines with '\n' (0x0A), sometimes preceded by
// '\r'. The very last line of a file may also end with EOF.
parser!(linebreak = |buf| {
    opt_whitespace(buf)?;
    if buf.is_eof()? {
        return Ok(());
    }
    buf.expect_tag(b"\n")?;
    Ok(())
});

/// Calls the passed parser and requires a linebreak at the end.
fn line<I, F, O>(buf: &mut I, func: F) -> Result<O, parse::Error>
where
    I: Input,
    F: FnOnce(&mut I) -> Result<O, parse::Error>,
{
    let out = func(buf)?;
    linebreak(buf)?;
    Ok(out)
}

// Parses a single word delimited by whitespace or newline.
parser!(parse_ident = |buf| -> String {
    buf.take_until(is_token_end, |s| {
        if s.data.is_empty() {
            return Err(s.error("expected identifier"));
        }
        s.assert_ascii().map(|s| s.to_string())
    })
});

// Parses a scalar type name delimited by whitespace.
parser!(parse_scalar_type = |buf| -> ScalarType {
    buf.take_until(is_token_end, |word| {
        word.assert_ascii()?
            .parse::<ScalarType>()
            .map_err(|e| word.error(e.to_string()))
    })
});


// ===========================================================================
// ===== Definition of `Reader`
// ===========================================================================

/// A reader able to read PLY files.
///
/// Creating a reader (with [`Reader::open`] or [`Reader::new`]) parses the
/// header. The body is read by one of the consuming methods:
/// [`read_cloud`][Reader::read_cloud] for vertex positions and colors, or
/// [`read_raw_into`][Reader::read_raw_into] for everything.
pub struct Reader<R: io::Read> {
    buf: Buffer<R>,
    comments: Vec<String>,
    encoding: Encoding,
    elements: Vec<ElementDef>,
}

impl Reader<File> {
    /// Tries to open the file specified by the given path and creates a new
    /// `Reader` from that file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, Error> {
        // We don't need a `BufReader` here, because we will use our internal
        // parse buffer anyway.
        Self::new(File::open(path)?)
    }
}

impl<R: io::Read> Reader<R> {
    /// Creates a new `Reader` from the given `io::Read` instance and parses
    /// the header of the given input.
    ///
    /// If you want to open a file, rather use [`Reader::open`].
    pub fn new(reader: R) -> Result<Self, Error> {
        /// Adds the rest of the current line to the list of comments. Assumes
        /// that `buf` is at the start of a line beginning with `keyword`.
        /// Consumes the whole line including linebreak.
        fn add_comment(
            buf: &mut impl Input,
            keyword: &[u8],
            comments: &mut Vec<String>,
        ) -> Result<(), parse::Error> {
            buf.consume(keyword.len());
            line(buf, |buf| {
                buf.take_until(b'\n', |line| {
                    comments.push(line.assert_ascii()?.trim().to_string());
                    Ok(())
                })
            })
        }

        // Wrap reader into parse buffer.
        let mut buf = Buffer::new(reader)?;

        let mut comments = Vec::new();


        // ===== Parse magic number and format line ===========================
        // PLY files always start with `ply\n`. This serves as magic number.
        line(&mut buf, |buf| buf.expect_tag(b"ply")).map_err(|e| {
            match e {
                parse::Error::Io(e) => parse::Error::Io(e),
                _ => parse::Error::Custom(
                    "not a valid PLY file (does not start with \"ply\\n\")".into(),
                    Span::new(0, 4),
                ),
            }
        })?;

        // Read any comment lines that might be here
        while buf.is_next(b"comment")? {
            add_comment(&mut buf, b"comment", &mut comments)?;
        }

        // Parse format line. This is required to be before everything else in
        // the header (except the magic number and potential comments).
        let encoding = line(&mut buf, |buf| {
            buf.expect_tag(b"format")?;
            whitespace(buf)?;

            let encoding = buf.take_until(is_token_end, |word| {
                match word.data {
                    b"ascii" => Ok(Encoding::Ascii),
                    b"binary_little_endian" => Ok(Encoding::BinaryLittleEndian),
                    b"binary_big_endian" => Ok(Encoding::BinaryBigEndian),
                    other => {
                        let len = min(other.len(), 50); // limit size of error string
                        let msg = format!(
                            "expected \"ascii\", \"binary_little_endian\" or \
                                \"binary_big_endian\", found {}",
                            debug_fmt_bytes(&other[..len]),
                        );
                        Err(word.error(msg))
                    }
                }
            })?;

            whitespace(buf)?;
            buf.expect_tag(b"1.0")?;

            Ok(encoding)
        })?;


        // ===== Parse elements and their properties =========================
        let mut elements: Vec<ElementDef> = Vec::new();
        let mut element_spans = Vec::new();

        // Line by line until we reach the end of the header
        while !buf.is_next(b"end_header")? {
            match () {
                () if buf.is_next(b"comment")? => {
                    add_comment(&mut buf, b"comment", &mut comments)?;
                }

                // Some exporters store information about the object in
                // `obj_info` lines. We treat them like comments.
                () if buf.is_next(b"obj_info")? => {
                    add_comment(&mut buf, b"obj_info", &mut comments)?;
                }

                // Element definition, e.g. `element vertex 8`
                () if buf.is_next(b"element")? => {
                    let line_start = buf.offset();
                    buf.consume(b"element".len());
                    whitespace(&mut buf)?;

                    let name = parse_ident(&mut buf)?;
                    whitespace(&mut buf)?;

                    let count = buf.take_until(is_token_end, |n| {
                        match n.assert_ascii()?.parse::<u64>() {
                            Ok(v) => Ok(v),
                            Err(e) => {
                                let msg = format!("invalid integer as element count ({})", e);
                                Err(n.error(msg))
                            }
                        }
                    })?;

                    elements.push(ElementDef {
                        name,
                        count,
                        property_defs: PropVec::new(),
                    });
                    element_spans.push(Span::new(line_start, buf.offset()));

                    linebreak(&mut buf)?;
                }

                // Property definition, e.g. `property float x` or
                // `property list uchar int vertex_index`
                () if buf.is_next(b"property")? => {
                    let line_start = buf.offset();

                    // Get last element or error if there wasn't a preceeding
                    // `element` line.
                    let elem = elements.last_mut().ok_or_else(|| {
                        buf.spanned_data(b"property".len())
                            .error("property definition without preceding element definition")
                    })?;

                    buf.consume(b"property".len());
                    whitespace(&mut buf)?;

                    if buf.is_next(b"list")? {
                        buf.consume(b"list".len());
                        whitespace(&mut buf)?;

                        let len_type = parse_scalar_type(&mut buf)?;
                        whitespace(&mut buf)?;
                        let scalar_type = parse_scalar_type(&mut buf)?;
                        whitespace(&mut buf)?;
                        let name = parse_ident(&mut buf)?;

                        let len_type = ListLenType::from_scalar_type(len_type).ok_or_else(|| {
                            parse::Error::Custom(
                                format!("only unsigned integers can be used to store list \
                                    lengths (property '{}')", name),
                                Span::new(line_start, buf.offset()),
                            )
                        })?;

                        let ty = PropertyType::List { len_type, scalar_type };
                        elem.property_defs.push(PropertyDef { name, ty });
                    } else {
                        let ty = PropertyType::Scalar(parse_scalar_type(&mut buf)?);
                        whitespace(&mut buf)?;
                        let name = parse_ident(&mut buf)?;

                        elem.property_defs.push(PropertyDef { name, ty });
                    }

                    linebreak(&mut buf)?;
                }

                // Empty lines are not really allowed, but harmless.
                () if buf.is_next(b"\n")? || buf.is_next(b"\r\n")? => {
                    linebreak(&mut buf)?;
                }

                // Something else...
                () => {
                    if buf.is_eof()? {
                        return Err(parse::Error::UnexpectedEof(buf.offset()).into());
                    }

                    let len = min(buf.len(), 10);
                    let start = buf.spanned_data(len);
                    let msg = format!(
                        "expected line starting with \"comment\", \"obj_info\", \"element\" \
                            or \"property\", found {}",
                        debug_fmt_bytes(start.data),
                    );

                    return Err(start.error(msg).into());
                }
            }
        }

        // An element without properties occupies no bytes in the body, so
        // its count could not be checked against the file size.
        for (def, &span) in elements.iter().zip(&element_spans) {
            if def.count > 0 && def.property_defs.is_empty() {
                let msg = format!(
                    "element '{}' has {} elements but no properties",
                    def.name,
                    def.count,
                );
                return Err(parse::Error::Custom(msg, span).into());
            }
        }

        // Consume the remaining header. We must not skip whitespace after the
        // linebreak, as binary data might start with whitespace bytes.
        line(&mut buf, |buf| buf.expect_tag(b"end_header"))?;

        debug!(
            "parsed PLY header: encoding {:?}, elements [{}]",
            encoding,
            elements.iter()
                .map(|e| format!("{} x{}", e.name, e.count))
                .collect::<Vec<_>>()
                .join(", "),
        );

        Ok(Self { buf, comments, encoding, elements })
    }

    /// The encoding of the body.
    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    /// All `comment` and `obj_info` lines of the header (without keyword).
    pub fn comments(&self) -> &[String] {
        &self.comments
    }

    /// Definitions of all element groups, in file order.
    pub fn element_defs(&self) -> &[ElementDef] {
        &self.elements
    }

    /// Reads the whole body and returns the vertex positions (and vertex
    /// colors, if present). All other element groups are skipped.
    pub fn read_cloud(self) -> Result<PointCloud, Error> {
        let mut sink = CloudSink::new();
        self.read_raw_into(&mut sink)?;
        sink.into_cloud()
    }

    /// Reads the whole file and stores everything in a [`RawResult`].
    pub fn into_raw_result(self) -> Result<RawResult, Error> {
        let mut out = RawResult::default();
        self.read_raw_into(&mut out)?;
        Ok(out)
    }

    /// Reads the whole file into the given raw sink.
    ///
    /// This is a low level building block that you usually don't want to use
    /// directly.
    pub fn read_raw_into(mut self, sink: &mut impl RawSink) -> Result<(), Error> {
        let buf = &mut self.buf;

        // Keep this vector on the outside to retain allocations
        let mut properties = Vec::new();

        // Iterate through each element group
        for element_def in &self.elements {
            sink.element_group_start(&element_def)?;

            // Just read as many elements as specified in the header. Every
            // element consumes at least one byte or fails at EOF (groups
            // without properties are rejected in `new`), so a faulty count
            // can't make this loop run longer than the file is.
            for _ in 0..element_def.count {
                properties.clear();

                match self.encoding {
                    Encoding::Ascii => {
                        parse_element::<AsciiEncoding, _>(buf, &element_def, &mut properties)?;
                    }
                    Encoding::BinaryBigEndian => {
                        parse_element::<BbeEncoding, _>(buf, &element_def, &mut properties)?;
                    }
                    Encoding::BinaryLittleEndian => {
                        parse_element::<BleEncoding, _>(buf, &element_def, &mut properties)?;
                    }
                }

                // Send read properties to the sink.
                sink.element(&properties)?;
            }
        }

        Ok(())
    }
}

// ===========================================================================
// ===== Helpers for body parsing
// ===========================================================================
/// Helper trait to abstract the three different encodings.
trait EncodingReader {
    fn read_i8(buf: &mut impl Input) -> Result<i8, parse::Error>;
    fn read_u8(buf: &mut impl Input) -> Result<u8, parse::Error>;
    fn read_i16(buf: &mut impl Input) -> Result<i16, parse::Error>;
    fn read_u16(buf: &mut impl Input) -> Result<u16, parse::Error>;
    fn read_i32(buf: &mut impl Input) -> Result<i32, parse::Error>;
    fn read_u32(buf: &mut impl Input) -> Result<u32, parse::Error>;
    fn read_f32(buf: &mut impl Input) -> Result<f32, parse::Error>;
    fn read_f64(buf: &mut impl Input) -> Result<f64, parse::Error>;

    /// Start reading one element. Only relevant for ASCII (where leading
    /// whitespace is skipped), therefore this empty implementation is
    /// provided.
    fn start_element(_buf: &mut impl Input) -> Result<(), parse::Error> {
        Ok(())
    }

    /// Skips a seperator between two values. Only relevant for ASCII
    /// (whitespace), therefore this empty implementation is provided.
    fn skip_separator(_buf: &mut impl Input) -> Result<(), parse::Error> {
        Ok(())
    }

    /// Finish reading one element. Only relevant for ASCII (where a linebreak
    /// needs to be skipped), therefore this empty implementation is provided.
    fn finish_element(_buf: &mut impl Input) -> Result<(), parse::Error> {
        Ok(())
    }
}

/// Binary big endian encoding.
enum BbeEncoding {}
impl EncodingReader for BbeEncoding {
    fn read_i8(buf: &mut impl Input) -> Result<i8, parse::Error> { parse::i8_we(buf) }
    fn read_u8(buf: &mut impl Input) -> Result<u8, parse::Error> { parse::u8_we(buf) }
    fn read_i16(buf: &mut impl Input) -> Result<i16, parse::Error> { parse::i16_be(buf) }
    fn read_u16(buf: &mut impl Input) -> Result<u16, parse::Error> { parse::u16_be(buf) }
    fn read_i32(buf: &mut impl Input) -> Result<i32, parse::Error> { parse::i32_be(buf) }
    fn read_u32(buf: &mut impl Input) -> Result<u32, parse::Error> { parse::u32_be(buf) }
    fn read_f32(buf: &mut impl Input) -> Result<f32, parse::Error> { parse::f32_be(buf) }
    fn read_f64(buf: &mut impl Input) -> Result<f64, parse::Error> { parse::f64_be(buf) }
}

/// Binary little endian encoding.
enum BleEncoding {}
impl EncodingReader for BleEncoding {
    fn read_i8(buf: &mut impl Input) -> Result<i8, parse::Error> { parse::i8_we(buf) }
    fn read_u8(buf: &mut impl Input) -> Result<u8, parse::Error> { parse::u8_we(buf) }
    fn read_i16(buf: &mut impl Input) -> Result<i16, parse::Error> { parse::i16_le(buf) }
    fn read_u16(buf: &mut impl Input) -> Result<u16, parse::Error> { parse::u16_le(buf) }
    fn read_i32(buf: &mut impl Input) -> Result<i32, parse::Error> { parse::i32_le(buf) }
    fn read_u32(buf: &mut impl Input) -> Result<u32, parse::Error> { parse::u32_le(buf) }
    fn read_f32(buf: &mut impl Input) -> Result<f32, parse::Error> { parse::f32_le(buf) }
    fn read_f64(buf: &mut impl Input) -> Result<f64, parse::Error> { parse::f64_le(buf) }
}

// Reads until the next whitespace or linebreak and tries to parse the string
// as `$ty`.
macro_rules! ascii_parser {
    ($buf:ident, $ty:ident) => {
        $buf.take_until(
            is_token_end,
            |sd| {
                sd.assert_ascii()?
                    .parse::<$ty>()
                    .map_err(|e| {
                        let msg = format!(
                            concat!("invalid '", stringify!($ty), "' literal {}: {}"),
                            debug_fmt_bytes(sd.data),
                            e,
                        );
                        sd.error(msg)
                    })
            }
        )
    }
}

/// ASCII encoding.
enum AsciiEncoding {}
impl EncodingReader for AsciiEncoding {
    fn read_i8(buf: &mut impl Input) -> Result<i8, parse::Error> {
        ascii_parser!(buf, i8)
    }
    fn read_u8(buf: &mut impl Input) -> Result<u8, parse::Error> {
        ascii_parser!(buf, u8)
    }
    fn read_i16(buf: &mut impl Input) -> Result<i16, parse::Error> {
        ascii_parser!(buf, i16)
    }
    fn read_u16(buf: &mut impl Input) -> Result<u16, parse::Error> {
        ascii_parser!(buf, u16)
    }
    fn read_i32(buf: &mut impl Input) -> Result<i32, parse::Error> {
        ascii_parser!(buf, i32)
    }
    fn read_u32(buf: &mut impl Input) -> Result<u32, parse::Error> {
        ascii_parser!(buf, u32)
    }
    fn read_f32(buf: &mut impl Input) -> Result<f32, parse::Error> {
        ascii_parser!(buf, f32)
    }
    fn read_f64(buf: &mut impl Input) -> Result<f64, parse::Error> {
        ascii_parser!(buf, f64)
    }

    fn start_element(buf: &mut impl Input) -> Result<(), parse::Error> {
        // Also skips empty lines.
        buf.skip_until(|b| !is_token_end(b))
    }
    fn skip_separator(buf: &mut impl Input) -> Result<(), parse::Error> {
        whitespace(buf)
    }
    fn finish_element(buf: &mut impl Input) -> Result<(), parse::Error> {
        linebreak(buf)
    }
}

/// Parses one element with all its properties as described by `def`.
/// Properties are written into `out`. The type parameter `E` is used to
/// actually read values.
fn parse_element<E: EncodingReader, I: Input>(
    buf: &mut I,
    def: &ElementDef,
    out: &mut Vec<Property>,
) -> Result<(), Error> {
    /// Reads a single value of type `ty` and returns it as `Property`. The
    /// returned `Property` is one of the scalar variants, i.e. not one of the
    /// `*List` variants!
    fn read_scalar<E: EncodingReader, I: Input>(
        buf: &mut I,
        ty: ScalarType,
    ) -> Result<Property, parse::Error> {
        let p = match ty {
            ScalarType::Char => Property::Char(E::read_i8(buf)?),
            ScalarType::UChar => Property::UChar(E::read_u8(buf)?),
            ScalarType::Short => Property::Short(E::read_i16(buf)?),
            ScalarType::UShort => Property::UShort(E::read_u16(buf)?),
            ScalarType::Int => Property::Int(E::read_i32(buf)?),
            ScalarType::UInt => Property::UInt(E::read_u32(buf)?),
            ScalarType::Float => Property::Float(E::read_f32(buf)?),
            ScalarType::Double => Property::Double(E::read_f64(buf)?),
        };

        Ok(p)
    }

    fn read_len<E: EncodingReader, I: Input>(
        buf: &mut I,
        ty: ListLenType,
    ) -> Result<u32, parse::Error> {
        let len: u32 = match ty {
            ListLenType::UChar => E::read_u8(buf)?.into(),
            ListLenType::UShort => E::read_u16(buf)?.into(),
            ListLenType::UInt => E::read_u32(buf)?,
        };

        Ok(len)
    }

    E::start_element(buf)?;

    for (i, prop_def) in def.property_defs.iter().enumerate() {
        if i > 0 {
            E::skip_separator(buf)?;
        }

        let property = match prop_def.ty {
            PropertyType::Scalar(ty) => read_scalar::<E, _>(buf, ty)?,
            PropertyType::List { len_type, scalar_type } => {
                let len = read_len::<E, _>(buf, len_type)?;

                macro_rules! read_list {
                    ($variant:ident, $read_fun:ident) => {{
                        let mut list = SmallVec::new();
                        for _ in 0..len {
                            E::skip_separator(buf)?;
                            list.push(E::$read_fun(buf)?);
                        }

                        Property::$variant(list)
                    }}
                }

                match scalar_type {
                    ScalarType::Char => read_list!(CharList, read_i8),
                    ScalarType::UChar => read_list!(UCharList, read_u8),
                    ScalarType::Short => read_list!(ShortList, read_i16),
                    ScalarType::UShort => read_list!(UShortList, read_u16),
                    ScalarType::Int => read_list!(IntList, read_i32),
                    ScalarType::UInt => read_list!(UIntList, read_u32),
                    ScalarType::Float => read_list!(FloatList, read_f32),
                    ScalarType::Double => read_list!(DoubleList, read_f64),
                }
            }
        };
        out.push(property);
    }

    E::finish_element(buf)?;

    Ok(())
}


// ===========================================================================
// ===== CloudSink
// ===========================================================================

/// Where to find the interesting properties in a `vertex` element.
#[derive(Debug, Clone, Copy)]
struct VertexLayout {
    position: [usize; 3],
    color: Option<[usize; 3]>,
}

/// A [`RawSink`] that collects vertex positions and, if present, `uchar`
/// vertex colors. All element groups other than `vertex` are ignored.
#[derive(Debug, Default)]
pub struct CloudSink {
    positions: Vec<Point3<f32>>,
    colors: Vec<Rgb>,
    has_colors: bool,
    layout: Option<VertexLayout>,
    seen_vertex_group: bool,
}

/// Upper bound for preallocating memory based on the (untrusted) element
/// count of the header.
const MAX_PREALLOC: u64 = 1 << 20;

impl CloudSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the collected point cloud, or `Error::MissingElement` if the
    /// file had no `vertex` element group.
    pub fn into_cloud(self) -> Result<PointCloud, Error> {
        if !self.seen_vertex_group {
            return Err(Error::MissingElement("vertex".into()));
        }

        // Colors are only kept if every vertex has one.
        let colors = if self.has_colors && self.colors.len() == self.positions.len() {
            Some(self.colors)
        } else {
            None
        };

        Ok(PointCloud::from_parts(self.positions, colors))
    }

    fn vertex_layout(def: &ElementDef) -> Result<VertexLayout, Error> {
        let scalar_prop = |name: &str| -> Result<Option<(usize, ScalarType)>, Error> {
            let idx = match def.prop_pos(name) {
                Some(idx) => idx,
                None => return Ok(None),
            };

            match def.property_defs[idx].ty {
                PropertyType::Scalar(ty) => Ok(Some((idx, ty))),
                PropertyType::List { .. } => Err(Error::UnsupportedProperty {
                    property: name.into(),
                    msg: "expected a scalar type, found a list".into(),
                }),
            }
        };

        let mut position = [0; 3];
        for (slot, &name) in position.iter_mut().zip(&["x", "y", "z"]) {
            *slot = scalar_prop(name)?
                .ok_or_else(|| Error::MissingProperty {
                    element: def.name.clone(),
                    property: name.to_string(),
                })?
                .0;
        }

        // In theory, you can store colors with any type in PLY, but in
        // practice everyone uses `uchar`. Other color types are ignored.
        let mut color = [0; 3];
        let mut has_color = true;
        for (slot, &name) in color.iter_mut().zip(&["red", "green", "blue"]) {
            match scalar_prop(name) {
                Ok(Some((idx, ScalarType::UChar))) => *slot = idx,
                Ok(Some((_, ty))) => {
                    debug!("ignoring vertex colors: '{}' has type {:?}", name, ty);
                    has_color = false;
                }
                Ok(None) | Err(_) => has_color = false,
            }
        }

        Ok(VertexLayout {
            position,
            color: if has_color { Some(color) } else { None },
        })
    }
}

impl RawSink for CloudSink {
    fn element_group_start(&mut self, def: &ElementDef) -> Result<(), Error> {
        if def.name != "vertex" {
            self.layout = None;
            return Ok(());
        }

        let layout = Self::vertex_layout(def)?;
        let count = min(def.count, MAX_PREALLOC) as usize;
        self.positions.reserve(count);
        if layout.color.is_some() {
            self.colors.reserve(count);
        }

        self.has_colors = layout.color.is_some()
            && (!self.seen_vertex_group || self.has_colors);

        self.layout = Some(layout);
        self.seen_vertex_group = true;
        Ok(())
    }

    fn element(&mut self, properties: &[Property]) -> Result<(), Error> {
        let layout = match self.layout {
            Some(layout) => layout,
            None => return Ok(()),
        };

        let coord = |idx: usize| {
            properties[idx].to_f32().ok_or_else(|| Error::UnsupportedProperty {
                property: format!("#{}", idx),
                msg: "expected a scalar value".into(),
            })
        };
        let [xi, yi, zi] = layout.position;
        self.positions.push(Point3::new(coord(xi)?, coord(yi)?, coord(zi)?));

        if let Some([ri, gi, bi]) = layout.color {
            let channels = (properties[ri].as_u8(), properties[gi].as_u8(), properties[bi].as_u8());
            if let (Some(r), Some(g), Some(b)) = channels {
                self.colors.push(Rgb::new(r, g, b));
            }
        }

        Ok(())
    }
}
