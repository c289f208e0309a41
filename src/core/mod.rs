//! # Core Codec Components
//!
//! Fixed-layout binary serialization and message framing.
//!
//! ## Components
//! - **Schema**: type descriptors, length annotations, classification
//! - **Size**: exact serialized sizes with a process-wide cache
//! - **Writer / Reader**: serialize and deserialize against exact-length buffers
//! - **Codec**: Tokio codec for framing messages over byte streams
//!
//! ## Wire Format
//! - Multi-byte scalars are big-endian
//! - Text occupies a fixed, null-padded slot of its annotated width
//! - Sequences hold exactly their annotated element count, no length prefix
//! - Records are their fields back to back in declaration order

pub mod codec;
pub mod reader;
pub mod schema;
pub mod size;
pub mod writer;
