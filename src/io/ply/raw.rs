//! Types and traits for the raw PLY API. You probably don't need this.
//!
//! These are low level building blocks for reading and writing PLY files.
//! The PLY format supports arbitrary elements with arbitrary properties, and
//! every property can have one of several types. The point cloud API of
//! [`Reader`][super::Reader] and [`Writer`][super::Writer] is built on top of
//! these types.
//!
//! For reading files, the entry point is [`Reader::read_raw_into`][
//! super::Reader::read_raw_into]. For writing files, it is
//! [`Writer::write_raw`][super::Writer::write_raw].

use std::{
    fmt,
    io::{self, Write},
    ops,
    str::FromStr,
};

use byteorder::{ByteOrder, WriteBytesExt};
use derive_more::From;
use smallvec::SmallVec;

use super::Error;


// ===========================================================================
// ===== Header definitions
// ===========================================================================

/// A list of property definitions (or values), in the order of the header.
///
/// This is simply a wrapper around a `Vec` to use strong typing.
#[derive(Debug, Clone, Default, From)]
pub struct PropVec<T>(Vec<T>);

impl<T> PropVec<T> {
    pub fn new() -> Self {
        PropVec(Vec::new())
    }
}

impl<T> ops::Deref for PropVec<T> {
    type Target = Vec<T>;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<T> ops::DerefMut for PropVec<T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

/// The header definition of one element group.
#[derive(Debug, Clone)]
pub struct ElementDef {
    pub name: String,

    /// Number of elements in this group.
    pub count: u64,

    /// Definitions for all properties of elements in this group.
    pub property_defs: PropVec<PropertyDef>,
}

impl ElementDef {
    /// Returns the index of the property with the given name.
    pub fn prop_pos(&self, prop_name: &str) -> Option<usize> {
        self.property_defs.iter().position(|p| p.name == prop_name)
    }
}

/// The header definition of one property of an element.
#[derive(Debug, Clone)]
pub struct PropertyDef {
    pub ty: PropertyType,
    pub name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyType {
    Scalar(ScalarType),
    List {
        len_type: ListLenType,
        scalar_type: ScalarType,
    }
}

/// The types that can be used to store the length of a list. Signed and
/// floating point types don't make a lot of sense here, so we don't allow
/// them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListLenType {
    UChar,
    UShort,
    UInt,
}

impl ListLenType {
    pub fn from_scalar_type(ty: ScalarType) -> Option<Self> {
        match ty {
            ScalarType::UChar => Some(ListLenType::UChar),
            ScalarType::UShort => Some(ListLenType::UShort),
            ScalarType::UInt => Some(ListLenType::UInt),
            _ => None,
        }
    }

    pub fn to_scalar_type(self) -> ScalarType {
        match self {
            ListLenType::UChar => ScalarType::UChar,
            ListLenType::UShort => ScalarType::UShort,
            ListLenType::UInt => ScalarType::UInt,
        }
    }
}

/// A primitive PLY type. There are 8 in total: 2 floating point types, 3
/// signed and 3 unsigned integers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarType {
    Char,
    Short,
    Int,
    UChar,
    UShort,
    UInt,
    Float,
    Double,
}

impl ScalarType {
    /// Returns the type name used in the header (e.g. `short` for `i16`).
    pub fn ply_type_name(&self) -> &'static str {
        match self {
            ScalarType::Char => "char",
            ScalarType::Short => "short",
            ScalarType::Int => "int",
            ScalarType::UChar => "uchar",
            ScalarType::UShort => "ushort",
            ScalarType::UInt => "uint",
            ScalarType::Float => "float",
            ScalarType::Double => "double",
        }
    }
}

impl fmt::Display for ScalarTypeParseError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "\"{}\" is not a valid PLY scalar type", self.0)
    }
}

impl fmt::Debug for ScalarTypeParseError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

/// The error emitted when the `FromStr` implementation for `ScalarType` cannot
/// parse the given string.
pub struct ScalarTypeParseError(String);

impl FromStr for ScalarType {
    type Err = ScalarTypeParseError;

    /// Accepts the classic type names as well as the sized aliases (e.g.
    /// `int32` or `float64`) that some exporters use.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "char" | "int8" => Ok(ScalarType::Char),
            "short" | "int16" => Ok(ScalarType::Short),
            "int" | "int32" => Ok(ScalarType::Int),
            "uchar" | "uint8" => Ok(ScalarType::UChar),
            "ushort" | "uint16" => Ok(ScalarType::UShort),
            "uint" | "uint32" => Ok(ScalarType::UInt),
            "float" | "float32" => Ok(ScalarType::Float),
            "double" | "float64" => Ok(ScalarType::Double),
            other => Err(ScalarTypeParseError(other.to_string())),
        }
    }
}


// ===========================================================================
// ===== Property values
// ===========================================================================

/// One property value of some PLY type.
///
/// The sizes of the smallvecs are choosen so that the inline variant won't
/// inflict a size overhead (on x64). This still means that the most common
/// form of list, the three-tuple `vertex_indices`, will fit inline.
#[derive(Debug, Clone, PartialEq)]
pub enum Property {
    Char(i8),
    Short(i16),
    Int(i32),
    UChar(u8),
    UShort(u16),
    UInt(u32),
    Float(f32),
    Double(f64),
    CharList(SmallVec<[i8; 16]>),
    ShortList(SmallVec<[i16; 8]>),
    IntList(SmallVec<[i32; 4]>),
    UCharList(SmallVec<[u8; 16]>),
    UShortList(SmallVec<[u16; 8]>),
    UIntList(SmallVec<[u32; 4]>),
    FloatList(SmallVec<[f32; 4]>),
    DoubleList(SmallVec<[f64; 2]>),
}

impl Property {
    /// Returns the value as `u8` if the property has type `uchar`.
    pub fn as_u8(&self) -> Option<u8> {
        match *self {
            Property::UChar(v) => Some(v),
            _ => None,
        }
    }

    /// Returns any scalar value converted to `f32` (which might lose
    /// precision), or `None` for list properties.
    pub fn to_f32(&self) -> Option<f32> {
        match *self {
            Property::Char(v) => Some(v.into()),
            Property::Short(v) => Some(v.into()),
            Property::Int(v) => Some(v as f32),
            Property::UChar(v) => Some(v.into()),
            Property::UShort(v) => Some(v.into()),
            Property::UInt(v) => Some(v as f32),
            Property::Float(v) => Some(v),
            Property::Double(v) => Some(v as f32),
            _ => None,
        }
    }
}


// ===========================================================================
// ===== RawSink
// ===========================================================================

/// A type that can accept raw data from a PLY file. This is mainly used for
/// [`Reader::read_raw_into`][super::Reader::read_raw_into].
pub trait RawSink {
    /// Is called when a new element group begins. `def` describes the layout
    /// of all elements in this group. This method is *always* called before
    /// `element` is called.
    fn element_group_start(&mut self, def: &ElementDef) -> Result<(), Error>;

    /// Is called for each element that is read. When called, the element
    /// belongs to the last element group (the last `element_group_start`
    /// call). `properties` are in the order of the definition.
    fn element(&mut self, properties: &[Property]) -> Result<(), Error>;
}

/// A sink that simply stores everything.
#[derive(Debug, Clone, Default)]
pub struct RawResult {
    pub element_groups: Vec<RawElementGroup>,
}

#[derive(Debug, Clone)]
pub struct RawElementGroup {
    pub def: ElementDef,
    pub elements: Vec<PropVec<Property>>,
}

impl RawSink for RawResult {
    fn element_group_start(&mut self, def: &ElementDef) -> Result<(), Error> {
        self.element_groups.push(RawElementGroup {
            def: def.clone(),
            elements: vec![],
        });
        Ok(())
    }

    fn element(&mut self, properties: &[Property]) -> Result<(), Error> {
        // `element_group_start` is always called first, so there is a group.
        if let Some(group) = self.element_groups.last_mut() {
            group.elements.push(properties.to_vec().into());
        }
        Ok(())
    }
}


// ===========================================================================
// ===== RawSource and serializers
// ===========================================================================

/// A source of raw element data, the counterpart to [`RawSink`]. Has to
/// produce elements exactly as described by the header passed to
/// [`Writer::write_raw`][super::Writer::write_raw].
pub trait RawSource {
    fn serialize_into<S: Serializer>(self, ser: S) -> Result<(), Error>;
}

/// Abstracts over the body encodings. Values are added one after another and
/// each element is finished with `end_element`.
pub trait Serializer {
    fn add<P: PlyScalar>(&mut self, v: P) -> Result<(), Error>;

    fn add_slice<P: PlyScalar>(&mut self, s: &[P]) -> Result<(), Error> {
        for &v in s {
            self.add(v)?;
        }
        Ok(())
    }

    fn end_element(&mut self) -> Result<(), Error>;
}

mod internal {
    pub trait DoNotImplement {}
}

/// Abstracts over the Rust types that correspond to a PLY [`ScalarType`].
///
/// This trait is exactly implemented for `i8`, `i16`, `i32`, `u8`, `u16`,
/// `u32`, `f32` and `f64`. You are not supposed to implement it for your own
/// types, which is why it has a crate-private supertrait.
pub trait PlyScalar: Copy + fmt::Display + internal::DoNotImplement {
    /// Writes `self` in binary with the byte order `B`.
    fn write_binary<B: ByteOrder, W: Write>(self, w: &mut W) -> io::Result<()>;
}

macro_rules! impl_ply_scalar {
    ($ty:ident, $method:ident) => {
        impl internal::DoNotImplement for $ty {}
        impl PlyScalar for $ty {
            fn write_binary<B: ByteOrder, W: Write>(self, w: &mut W) -> io::Result<()> {
                w.$method::<B>(self)
            }
        }
    };
    ($ty:ident, $method:ident, single_byte) => {
        impl internal::DoNotImplement for $ty {}
        impl PlyScalar for $ty {
            fn write_binary<B: ByteOrder, W: Write>(self, w: &mut W) -> io::Result<()> {
                w.$method(self)
            }
        }
    };
}

impl_ply_scalar!(i8, write_i8, single_byte);
impl_ply_scalar!(u8, write_u8, single_byte);
impl_ply_scalar!(i16, write_i16);
impl_ply_scalar!(u16, write_u16);
impl_ply_scalar!(i32, write_i32);
impl_ply_scalar!(u32, write_u32);
impl_ply_scalar!(f32, write_f32);
impl_ply_scalar!(f64, write_f64);
