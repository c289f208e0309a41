//! # Size Calculator
//!
//! Exact serialized length of a type, memoized per type in a process-wide cache.
//!
//! The cache is read-mostly: lookups take a shared lock, and a miss computes
//! the size without holding any lock before inserting it. Two threads racing
//! on the same type both compute the same value, so last-writer-wins is fine.
//!
//! Text and sequence sizes are only defined in field context and are never
//! cached: the same element type can appear with different annotated counts
//! at different fields.

use std::any::TypeId;
use std::collections::HashMap;
use std::sync::{OnceLock, RwLock};
use tracing::debug;

use crate::core::schema::{
    classify, Classification, FieldDescriptor, RecordDescriptor, ScalarKind, TypeDescriptor,
    WireType,
};
use crate::error::{constants, ProtocolError, Result};

/// Cache key: scalars by kind, records by Rust type identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheKey {
    Scalar(ScalarKind),
    Record(TypeId),
}

/// Write-once-per-key map from type to serialized size.
#[derive(Debug, Default)]
pub struct SizeCache {
    sizes: RwLock<HashMap<CacheKey, usize>>,
}

impl SizeCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &CacheKey) -> Result<Option<usize>> {
        let sizes = self
            .sizes
            .read()
            .map_err(|_| ProtocolError::Custom(constants::ERR_SIZE_CACHE_LOCK.to_string()))?;
        Ok(sizes.get(key).copied())
    }

    /// Return the cached size, or compute and store it.
    ///
    /// `compute` runs without the lock held so it may recurse into the cache.
    pub fn get_or_compute<F>(&self, key: CacheKey, compute: F) -> Result<usize>
    where
        F: FnOnce() -> Result<usize>,
    {
        if let Some(size) = self.get(&key)? {
            return Ok(size);
        }

        let size = compute()?;
        let mut sizes = self
            .sizes
            .write()
            .map_err(|_| ProtocolError::Custom(constants::ERR_SIZE_CACHE_LOCK.to_string()))?;
        if sizes.insert(key, size).is_none() {
            debug!(?key, size, "Cached serialized size");
        }
        Ok(size)
    }

    /// Number of cached entries
    pub fn len(&self) -> Result<usize> {
        let sizes = self
            .sizes
            .read()
            .map_err(|_| ProtocolError::Custom(constants::ERR_SIZE_CACHE_LOCK.to_string()))?;
        Ok(sizes.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Compute the size of a type against this cache.
    pub fn size_of_descriptor(&self, ty: &TypeDescriptor) -> Result<usize> {
        match classify(ty) {
            Classification::Direct(kind) => {
                self.get_or_compute(CacheKey::Scalar(kind), || Ok(kind.width()))
            }
            Classification::FieldOnly => Err(ProtocolError::TopLevelFieldOnly {
                type_name: ty.name(),
            }),
            Classification::Complex(record) => {
                let key = CacheKey::Record((record.type_id)());
                self.get_or_compute(key, || self.record_size(record))
            }
            Classification::Invalid(reason) => Err(ProtocolError::UnsupportedType {
                type_name: ty.name(),
                reason,
            }),
        }
    }

    /// Size a field contributes to its record.
    pub fn field_size(&self, field: &FieldDescriptor) -> Result<usize> {
        match field.descriptor() {
            TypeDescriptor::Text => field.required_length(),
            TypeDescriptor::Sequence(element) => {
                let count = field.required_length()?;
                let element_size = self.size_of_descriptor(&element())?;
                element_size
                    .checked_mul(count)
                    .ok_or(ProtocolError::UnsupportedType {
                        type_name: field.record,
                        reason: constants::ERR_SIZE_OVERFLOW,
                    })
            }
            ty => self.size_of_descriptor(&ty),
        }
    }

    fn record_size(&self, record: &RecordDescriptor) -> Result<usize> {
        record.fields.iter().try_fold(0usize, |total, field| {
            total
                .checked_add(self.field_size(field)?)
                .ok_or(ProtocolError::UnsupportedType {
                    type_name: record.name,
                    reason: constants::ERR_SIZE_OVERFLOW,
                })
        })
    }
}

static SIZE_CACHE: OnceLock<SizeCache> = OnceLock::new();

/// The process-wide size cache, created on first use.
pub fn global_size_cache() -> &'static SizeCache {
    SIZE_CACHE.get_or_init(SizeCache::new)
}

/// Serialized size of `T` in bytes.
pub fn size_of<T: WireType>() -> Result<usize> {
    size_of_descriptor(&T::descriptor())
}

/// Serialized size of the type behind a descriptor.
pub fn size_of_descriptor(ty: &TypeDescriptor) -> Result<usize> {
    global_size_cache().size_of_descriptor(ty)
}

/// Precompute sizes at startup so the hot path only ever takes read locks.
///
/// Returns the total number of cache entries afterwards.
pub fn warm_size_cache(types: &[TypeDescriptor]) -> Result<usize> {
    for ty in types {
        size_of_descriptor(ty)?;
    }
    global_size_cache().len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::schema::Layout;
    use crate::wire_record;

    wire_record! {
        #[allow(dead_code)]
        struct Point {
            x: i32,
            y: i32,
        }
    }

    wire_record! {
        #[allow(dead_code)]
        struct Path {
            label: String [length = 10],
            short: Vec<Point> [length = 2],
            long: Vec<Point> [length = 5],
            closed: bool,
        }
    }

    wire_record! {
        #[allow(dead_code)]
        struct Nothing {
            empty: String [length = 0],
            none: Vec<u64> [length = 0],
        }
    }

    wire_record! {
        #[allow(dead_code)]
        struct Huge {
            items: Vec<u64> [length = usize::MAX],
        }
    }

    wire_record! {
        #[allow(dead_code)]
        struct HugeSum {
            head: String [length = usize::MAX],
            tail: String [length = 1],
        }
    }

    fn unit_type_id() -> TypeId {
        TypeId::of::<()>()
    }

    static UNANNOTATED: RecordDescriptor = RecordDescriptor {
        name: "Unannotated",
        type_id: unit_type_id,
        layout: Layout::Sequential,
        fields: &[FieldDescriptor {
            record: "Unannotated",
            name: "items",
            ty: <Vec<u8> as WireType>::descriptor,
            length: None,
        }],
    };

    #[test]
    fn test_scalar_widths() {
        assert_eq!(size_of::<bool>().unwrap(), 1);
        assert_eq!(size_of::<u16>().unwrap(), 2);
        assert_eq!(size_of::<f32>().unwrap(), 4);
        assert_eq!(size_of::<i64>().unwrap(), 8);
    }

    #[test]
    fn test_same_element_type_different_counts() {
        // 10 + 2*8 + 5*8 + 1
        assert_eq!(size_of::<Path>().unwrap(), 67);
        assert_eq!(size_of::<Point>().unwrap(), 8);
    }

    #[test]
    fn test_size_is_idempotent_and_cached() {
        let cache = SizeCache::new();
        let first = cache.size_of_descriptor(&Path::descriptor()).unwrap();
        let second = cache.size_of_descriptor(&Path::descriptor()).unwrap();
        assert_eq!(first, second);
        assert_eq!(
            cache
                .get(&CacheKey::Record(TypeId::of::<Path>()))
                .unwrap(),
            Some(67)
        );
        assert_eq!(
            cache.get(&CacheKey::Record(TypeId::of::<Point>())).unwrap(),
            Some(8)
        );
    }

    #[test]
    fn test_zero_length_annotations_are_legal() {
        assert_eq!(size_of::<Nothing>().unwrap(), 0);
    }

    #[test]
    fn test_missing_annotation() {
        let cache = SizeCache::new();
        let result = cache.size_of_descriptor(&TypeDescriptor::Record(&UNANNOTATED));
        assert!(matches!(
            result,
            Err(ProtocolError::MissingAnnotation {
                record: "Unannotated",
                field: "items",
            })
        ));
        assert!(cache.get(&CacheKey::Record(unit_type_id())).unwrap().is_none());
    }

    #[test]
    fn test_field_only_types_have_no_standalone_size() {
        assert!(matches!(
            size_of::<String>(),
            Err(ProtocolError::TopLevelFieldOnly { .. })
        ));
        assert!(matches!(
            size_of::<Vec<u32>>(),
            Err(ProtocolError::TopLevelFieldOnly { .. })
        ));
    }

    #[test]
    fn test_size_overflow_is_an_error() {
        let cache = SizeCache::new();
        assert!(cache.is_empty().unwrap());
        assert!(matches!(
            cache.size_of_descriptor(&Huge::descriptor()),
            Err(ProtocolError::UnsupportedType {
                reason: constants::ERR_SIZE_OVERFLOW,
                ..
            })
        ));
        assert!(matches!(
            cache.size_of_descriptor(&HugeSum::descriptor()),
            Err(ProtocolError::UnsupportedType {
                type_name: "HugeSum",
                reason: constants::ERR_SIZE_OVERFLOW,
            })
        ));
        assert!(cache
            .get(&CacheKey::Record(TypeId::of::<Huge>()))
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_warm_size_cache() {
        let entries = warm_size_cache(&[Path::descriptor(), u8::descriptor()]).unwrap();
        assert!(entries >= 4);
    }
}
