//! # Writer
//!
//! Serializes a value tree into a caller-sized buffer at a running cursor.
//!
//! Fields are visited in declaration order. Scalars are written big-endian,
//! text fields fill their whole slot (content then null padding) and sequence
//! fields write exactly the annotated number of elements with no length prefix.
//!
//! A failed write leaves the destination partially written; callers must
//! discard it.

use crate::core::schema::{classify, Classification, FieldDescriptor, WireType};
use crate::core::size::size_of;
use crate::error::{ProtocolError, Result};

/// Cursor over a destination buffer.
pub struct Writer<'a> {
    buf: &'a mut [u8],
    pos: usize,
}

impl<'a> Writer<'a> {
    pub fn new(buf: &'a mut [u8]) -> Self {
        Self::at(buf, 0)
    }

    /// Start writing at `pos` instead of the beginning of the buffer.
    pub fn at(buf: &'a mut [u8], pos: usize) -> Self {
        Self { buf, pos }
    }

    /// Current cursor offset
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Write one value using the rule matching its classification.
    pub fn write<T: WireType>(&mut self, value: &T, field: Option<&FieldDescriptor>) -> Result<()> {
        let ty = T::descriptor();
        match classify(&ty) {
            Classification::Direct(_) | Classification::Complex(_) => value.encode(self, field),
            Classification::FieldOnly if field.is_some() => value.encode(self, field),
            Classification::FieldOnly => Err(ProtocolError::TopLevelFieldOnly {
                type_name: ty.name(),
            }),
            Classification::Invalid(reason) => Err(ProtocolError::UnsupportedType {
                type_name: ty.name(),
                reason,
            }),
        }
    }

    /// Copy raw bytes at the cursor and advance past them.
    pub fn put(&mut self, bytes: &[u8]) -> Result<()> {
        self.slot(bytes.len())?.copy_from_slice(bytes);
        Ok(())
    }

    /// Write UTF-8 text into a null-padded slot of the field's annotated width.
    ///
    /// The content must leave room for a terminator, so at most `width - 1`
    /// bytes fit. A zero-width slot only accepts the empty string. Text holding
    /// a NUL byte is refused since the reader would stop there.
    pub fn put_text(&mut self, text: &str, field: &FieldDescriptor) -> Result<()> {
        let width = field.required_length()?;
        let encoded = text.as_bytes();
        if encoded.contains(&0) {
            return Err(ProtocolError::MalformedText { field: field.name });
        }
        if !encoded.is_empty() && encoded.len() >= width {
            return Err(ProtocolError::LengthViolation {
                field: field.name,
                actual: encoded.len(),
                limit: width.saturating_sub(1),
            });
        }

        let slot = self.slot(width)?;
        let (content, padding) = slot.split_at_mut(encoded.len());
        content.copy_from_slice(encoded);
        padding.fill(0);
        Ok(())
    }

    /// Write each element in index order; the count must equal the annotation.
    pub fn put_sequence<T: WireType>(&mut self, items: &[T], field: &FieldDescriptor) -> Result<()> {
        let count = field.required_length()?;
        if items.len() != count {
            return Err(ProtocolError::LengthViolation {
                field: field.name,
                actual: items.len(),
                limit: count,
            });
        }

        for item in items {
            self.write(item, None)?;
        }
        Ok(())
    }

    fn slot(&mut self, len: usize) -> Result<&mut [u8]> {
        let start = self.pos;
        let end = start
            .checked_add(len)
            .filter(|end| *end <= self.buf.len())
            .ok_or(ProtocolError::BufferOverrun {
                offset: start,
                needed: len,
                available: self.buf.len(),
            })?;
        self.pos = end;
        Ok(&mut self.buf[start..end])
    }
}

/// Serialize `value` into a new buffer of exactly `size_of::<T>()` bytes.
pub fn serialize<T: WireType>(value: &T) -> Result<Vec<u8>> {
    let size = size_of::<T>()?;
    let mut buf = vec![0u8; size];
    let written = serialize_into(value, &mut buf, 0)?;
    if written != size {
        return Err(ProtocolError::SizeMismatch {
            type_name: T::descriptor().name(),
            expected: size,
            actual: written,
        });
    }
    Ok(buf)
}

/// Serialize `value` into `destination` starting at `cursor`.
///
/// Returns the cursor just past the written bytes.
pub fn serialize_into<T: WireType>(value: &T, destination: &mut [u8], cursor: usize) -> Result<usize> {
    let mut writer = Writer::at(destination, cursor);
    writer.write(value, None)?;
    Ok(writer.position())
}
