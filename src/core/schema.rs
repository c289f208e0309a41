//! # Wire Schema
//!
//! Type descriptors, length annotations and the classifier that decides how a
//! type travels on the wire.
//!
//! Every type falls into one of three categories:
//! - **Direct**: fixed-width scalars (`bool`, [`Char16`], 8/16/32/64-bit
//!   integers, `f32`, `f64`), written big-endian.
//! - **Field-only**: `String` and `Vec<T>`. Their width comes from the
//!   `[length = N]` annotation of the field that holds them, so they can never
//!   be a top-level serialization target.
//! - **Complex**: records declared with [`wire_record!`]. Fields are laid out
//!   strictly in declaration order with no tags and no padding.
//!
//! ## Declaring a record
//! ```rust
//! use matchmaker_protocol::core::schema::wire_record;
//!
//! wire_record! {
//!     #[derive(Debug, Clone, PartialEq)]
//!     pub struct PlayerName {
//!         pub name: String [length = 24],
//!         pub tag: u16,
//!     }
//! }
//!
//! assert_eq!(matchmaker_protocol::size_of::<PlayerName>().unwrap(), 26);
//! ```

use std::any::TypeId;
use std::fmt;

use crate::core::reader::Reader;
use crate::core::writer::Writer;
use crate::error::{constants, ProtocolError, Result};

/// Fixed-width scalar kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarKind {
    Bool,
    Char16,
    U8,
    I8,
    U16,
    I16,
    U32,
    I32,
    U64,
    I64,
    F32,
    F64,
}

impl ScalarKind {
    /// Width in bytes on the wire
    pub const fn width(self) -> usize {
        match self {
            ScalarKind::Bool | ScalarKind::U8 | ScalarKind::I8 => 1,
            ScalarKind::Char16 | ScalarKind::U16 | ScalarKind::I16 => 2,
            ScalarKind::U32 | ScalarKind::I32 | ScalarKind::F32 => 4,
            ScalarKind::U64 | ScalarKind::I64 | ScalarKind::F64 => 8,
        }
    }

    /// Rust type name for diagnostics
    pub const fn name(self) -> &'static str {
        match self {
            ScalarKind::Bool => "bool",
            ScalarKind::Char16 => "Char16",
            ScalarKind::U8 => "u8",
            ScalarKind::I8 => "i8",
            ScalarKind::U16 => "u16",
            ScalarKind::I16 => "i16",
            ScalarKind::U32 => "u32",
            ScalarKind::I32 => "i32",
            ScalarKind::U64 => "u64",
            ScalarKind::I64 => "i64",
            ScalarKind::F32 => "f32",
            ScalarKind::F64 => "f64",
        }
    }
}

/// Schema-level identity of a type.
///
/// Nested types are referenced through `fn` pointers so descriptors can live
/// in `static` items.
#[derive(Clone, Copy)]
pub enum TypeDescriptor {
    Scalar(ScalarKind),
    /// Fixed-slot UTF-8 text
    Text,
    /// Fixed-count homogeneous sequence of the element type
    Sequence(fn() -> TypeDescriptor),
    Record(&'static RecordDescriptor),
}

impl TypeDescriptor {
    pub fn name(&self) -> &'static str {
        match self {
            TypeDescriptor::Scalar(kind) => kind.name(),
            TypeDescriptor::Text => "String",
            TypeDescriptor::Sequence(_) => "Vec",
            TypeDescriptor::Record(record) => record.name,
        }
    }
}

impl fmt::Debug for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeDescriptor::Scalar(kind) => write!(f, "Scalar({})", kind.name()),
            TypeDescriptor::Text => f.write_str("Text"),
            TypeDescriptor::Sequence(element) => write!(f, "Sequence({:?})", element()),
            TypeDescriptor::Record(record) => write!(f, "Record({})", record.name),
        }
    }
}

/// Memory layout declared for a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    /// Fields occupy wire positions strictly in declaration order
    Sequential,
    /// No ordering guarantee; never serializable
    Unspecified,
}

/// Composite descriptor: named fields in declaration order.
#[derive(Debug)]
pub struct RecordDescriptor {
    pub name: &'static str,
    pub type_id: fn() -> TypeId,
    pub layout: Layout,
    pub fields: &'static [FieldDescriptor],
}

impl RecordDescriptor {
    /// Iterate fields in wire order, failing if a hand-written impl asks for
    /// more fields than were declared.
    pub fn field_cursor(&'static self) -> FieldCursor {
        FieldCursor {
            record: self,
            next: 0,
        }
    }
}

pub struct FieldCursor {
    record: &'static RecordDescriptor,
    next: usize,
}

impl FieldCursor {
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> Result<&'static FieldDescriptor> {
        let field = self
            .record
            .fields
            .get(self.next)
            .ok_or(ProtocolError::UnsupportedType {
                type_name: self.record.name,
                reason: constants::ERR_FIELD_ORDER,
            })?;
        self.next += 1;
        Ok(field)
    }
}

/// One field of a record plus its optional length annotation.
#[derive(Debug)]
pub struct FieldDescriptor {
    pub record: &'static str,
    pub name: &'static str,
    pub ty: fn() -> TypeDescriptor,
    /// Slot width in bytes for text, element count for sequences
    pub length: Option<usize>,
}

impl FieldDescriptor {
    pub fn descriptor(&self) -> TypeDescriptor {
        (self.ty)()
    }

    /// The length annotation, required on every text or sequence field.
    pub fn required_length(&self) -> Result<usize> {
        self.length.ok_or(ProtocolError::MissingAnnotation {
            record: self.record,
            field: self.name,
        })
    }
}

/// Result of classifying a type descriptor.
#[derive(Debug, Clone, Copy)]
pub enum Classification {
    Direct(ScalarKind),
    FieldOnly,
    Complex(&'static RecordDescriptor),
    Invalid(&'static str),
}

/// Decide which category a type belongs to. Pure function of the descriptor.
pub fn classify(ty: &TypeDescriptor) -> Classification {
    match ty {
        TypeDescriptor::Scalar(kind) => Classification::Direct(*kind),
        TypeDescriptor::Text | TypeDescriptor::Sequence(_) => Classification::FieldOnly,
        TypeDescriptor::Record(record) => {
            if record.fields.is_empty() {
                Classification::Invalid("records must declare at least one field")
            } else if record.layout != Layout::Sequential {
                Classification::Invalid("record layout is not sequential")
            } else {
                Classification::Complex(record)
            }
        }
    }
}

/// Classify a type that is about to be serialized on its own, outside any field.
pub fn classify_top_level(ty: &TypeDescriptor) -> Result<Classification> {
    match classify(ty) {
        Classification::FieldOnly => Err(ProtocolError::TopLevelFieldOnly {
            type_name: ty.name(),
        }),
        Classification::Invalid(reason) => Err(ProtocolError::UnsupportedType {
            type_name: ty.name(),
            reason,
        }),
        other => Ok(other),
    }
}

/// A type that can be written to and read from the fixed-layout wire format.
///
/// `field` is the context the value appears in: `None` for a top-level value or
/// a sequence element, `Some` for a field of a record.
pub trait WireType: Sized + 'static {
    fn descriptor() -> TypeDescriptor;

    fn encode(&self, writer: &mut Writer<'_>, field: Option<&FieldDescriptor>) -> Result<()>;

    fn decode(reader: &mut Reader<'_>, field: Option<&FieldDescriptor>) -> Result<Self>;
}

/// A single UTF-16 code unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Char16(pub u16);

impl Char16 {
    /// `None` for lone surrogates.
    pub fn to_char(self) -> Option<char> {
        char::from_u32(u32::from(self.0))
    }
}

impl From<u16> for Char16 {
    fn from(unit: u16) -> Self {
        Char16(unit)
    }
}

impl TryFrom<char> for Char16 {
    type Error = char;

    /// Fails for characters outside the Basic Multilingual Plane.
    fn try_from(c: char) -> std::result::Result<Self, char> {
        let mut units = [0u16; 2];
        match c.encode_utf16(&mut units) {
            [unit] => Ok(Char16(*unit)),
            _ => Err(c),
        }
    }
}

// Big-endian regardless of host order
macro_rules! impl_scalar {
    ($ty:ty, $kind:ident) => {
        impl WireType for $ty {
            fn descriptor() -> TypeDescriptor {
                TypeDescriptor::Scalar(ScalarKind::$kind)
            }

            fn encode(&self, writer: &mut Writer<'_>, _field: Option<&FieldDescriptor>) -> Result<()> {
                writer.put(&self.to_be_bytes())
            }

            fn decode(reader: &mut Reader<'_>, _field: Option<&FieldDescriptor>) -> Result<Self> {
                Ok(<$ty>::from_be_bytes(reader.take_array()?))
            }
        }
    };
}

impl_scalar!(u8, U8);
impl_scalar!(i8, I8);
impl_scalar!(u16, U16);
impl_scalar!(i16, I16);
impl_scalar!(u32, U32);
impl_scalar!(i32, I32);
impl_scalar!(u64, U64);
impl_scalar!(i64, I64);
impl_scalar!(f32, F32);
impl_scalar!(f64, F64);

impl WireType for bool {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::Scalar(ScalarKind::Bool)
    }

    fn encode(&self, writer: &mut Writer<'_>, _field: Option<&FieldDescriptor>) -> Result<()> {
        writer.put(&[u8::from(*self)])
    }

    fn decode(reader: &mut Reader<'_>, _field: Option<&FieldDescriptor>) -> Result<Self> {
        let [byte] = reader.take_array::<1>()?;
        Ok(byte != 0)
    }
}

impl WireType for Char16 {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::Scalar(ScalarKind::Char16)
    }

    fn encode(&self, writer: &mut Writer<'_>, _field: Option<&FieldDescriptor>) -> Result<()> {
        writer.put(&self.0.to_be_bytes())
    }

    fn decode(reader: &mut Reader<'_>, _field: Option<&FieldDescriptor>) -> Result<Self> {
        Ok(Char16(u16::from_be_bytes(reader.take_array()?)))
    }
}

impl WireType for String {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::Text
    }

    fn encode(&self, writer: &mut Writer<'_>, field: Option<&FieldDescriptor>) -> Result<()> {
        let field = field.ok_or(ProtocolError::TopLevelFieldOnly { type_name: "String" })?;
        writer.put_text(self, field)
    }

    fn decode(reader: &mut Reader<'_>, field: Option<&FieldDescriptor>) -> Result<Self> {
        let field = field.ok_or(ProtocolError::TopLevelFieldOnly { type_name: "String" })?;
        reader.take_text(field)
    }
}

impl<T: WireType> WireType for Vec<T> {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::Sequence(T::descriptor)
    }

    fn encode(&self, writer: &mut Writer<'_>, field: Option<&FieldDescriptor>) -> Result<()> {
        let field = field.ok_or(ProtocolError::TopLevelFieldOnly { type_name: "Vec" })?;
        writer.put_sequence(self, field)
    }

    fn decode(reader: &mut Reader<'_>, field: Option<&FieldDescriptor>) -> Result<Self> {
        let field = field.ok_or(ProtocolError::TopLevelFieldOnly { type_name: "Vec" })?;
        reader.take_sequence(field)
    }
}

/// Declare a Complex wire record.
///
/// Emits the struct, a static [`RecordDescriptor`] reachable through
/// `Type::schema()`, and the [`WireType`] impl. Text and sequence fields take a
/// `[length = N]` annotation after their type. Field order is the wire order
/// and must never change once peers depend on it.
#[macro_export]
macro_rules! wire_record {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            $(
                $(#[$fmeta:meta])*
                $fvis:vis $fname:ident : $fty:ty $([length = $len:expr])?
            ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        $vis struct $name {
            $(
                $(#[$fmeta])*
                $fvis $fname: $fty,
            )+
        }

        impl $name {
            /// Wire schema: fields in declaration order with their annotations.
            pub fn schema() -> &'static $crate::core::schema::RecordDescriptor {
                static SCHEMA: $crate::core::schema::RecordDescriptor =
                    $crate::core::schema::RecordDescriptor {
                        name: stringify!($name),
                        type_id: ::std::any::TypeId::of::<$name>,
                        layout: $crate::core::schema::Layout::Sequential,
                        fields: &[
                            $(
                                $crate::core::schema::FieldDescriptor {
                                    record: stringify!($name),
                                    name: stringify!($fname),
                                    ty: <$fty as $crate::core::schema::WireType>::descriptor,
                                    length: $crate::__wire_length!($($len)?),
                                },
                            )+
                        ],
                    };
                &SCHEMA
            }
        }

        impl $crate::core::schema::WireType for $name {
            fn descriptor() -> $crate::core::schema::TypeDescriptor {
                $crate::core::schema::TypeDescriptor::Record(Self::schema())
            }

            fn encode(
                &self,
                writer: &mut $crate::core::writer::Writer<'_>,
                _field: Option<&$crate::core::schema::FieldDescriptor>,
            ) -> $crate::error::Result<()> {
                let mut fields = Self::schema().field_cursor();
                $(
                    writer.write(&self.$fname, Some(fields.next()?))?;
                )+
                Ok(())
            }

            fn decode(
                reader: &mut $crate::core::reader::Reader<'_>,
                _field: Option<&$crate::core::schema::FieldDescriptor>,
            ) -> $crate::error::Result<Self> {
                let mut fields = Self::schema().field_cursor();
                $(
                    let $fname = reader.read::<$fty>(Some(fields.next()?))?;
                )+
                Ok(Self { $($fname),+ })
            }
        }
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __wire_length {
    () => {
        None
    };
    ($len:expr) => {
        Some($len)
    };
}

pub use crate::wire_record;
