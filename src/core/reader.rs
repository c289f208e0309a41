//! # Reader
//!
//! Rebuilds values from a source buffer, walking fields in the same order the
//! writer produced them.

use crate::core::schema::{classify, Classification, FieldDescriptor, WireType};
use crate::core::size::size_of;
use crate::error::{ProtocolError, Result};

/// Cursor over a source buffer.
pub struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self::at(buf, 0)
    }

    pub fn at(buf: &'a [u8], pos: usize) -> Self {
        Self { buf, pos }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    /// Bytes left after the cursor
    pub fn remaining(&self) -> usize {
        self.buf.len().saturating_sub(self.pos)
    }

    /// Read one value of type `T` using the rule matching its classification.
    pub fn read<T: WireType>(&mut self, field: Option<&FieldDescriptor>) -> Result<T> {
        let ty = T::descriptor();
        match classify(&ty) {
            Classification::Direct(_) | Classification::Complex(_) => T::decode(self, field),
            Classification::FieldOnly if field.is_some() => T::decode(self, field),
            Classification::FieldOnly => Err(ProtocolError::TopLevelFieldOnly {
                type_name: ty.name(),
            }),
            Classification::Invalid(reason) => Err(ProtocolError::UnsupportedType {
                type_name: ty.name(),
                reason,
            }),
        }
    }

    /// Consume `len` raw bytes.
    pub fn take(&mut self, len: usize) -> Result<&'a [u8]> {
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
        Ok(&self.buf[start..end])
    }

    pub fn take_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    /// Read a text slot of the field's annotated width.
    ///
    /// Content ends at the first null byte; a slot with no null byte is all
    /// content. The cursor always moves by the full width.
    pub fn take_text(&mut self, field: &FieldDescriptor) -> Result<String> {
        let width = field.required_length()?;
        let slot = self.take(width)?;
        let end = slot.iter().position(|&b| b == 0).unwrap_or(width);
        std::str::from_utf8(&slot[..end])
            .map(str::to_owned)
            .map_err(|_| ProtocolError::MalformedText { field: field.name })
    }

    /// Read exactly the annotated number of elements.
    pub fn take_sequence<T: WireType>(&mut self, field: &FieldDescriptor) -> Result<Vec<T>> {
        let count = field.required_length()?;
        let mut items = Vec::with_capacity(count);
        for _ in 0..count {
            items.push(self.read::<T>(None)?);
        }
        Ok(items)
    }
}

/// Deserialize a `T` from a buffer holding exactly `size_of::<T>()` bytes.
///
/// The length is checked before any byte is interpreted.
pub fn deserialize<T: WireType>(source: &[u8]) -> Result<T> {
    let size = size_of::<T>()?;
    if source.len() != size {
        return Err(ProtocolError::SizeMismatch {
            type_name: T::descriptor().name(),
            expected: size,
            actual: source.len(),
        });
    }

    let (value, end) = deserialize_from::<T>(source, 0)?;
    if end != size {
        return Err(ProtocolError::SizeMismatch {
            type_name: T::descriptor().name(),
            expected: size,
            actual: end,
        });
    }
    Ok(value)
}

/// Deserialize a `T` starting at `cursor`, returning the value and the cursor
/// just past it.
pub fn deserialize_from<T: WireType>(source: &[u8], cursor: usize) -> Result<(T, usize)> {
    let mut reader = Reader::at(source, cursor);
    let value = reader.read::<T>(None)?;
    Ok((value, reader.position()))
}
