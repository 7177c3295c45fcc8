//! A declarative mapping between remote I/O device configurations and their fixed-size, bit-packed, big-endian wire frames.

//! ## Traits
//!
//! The library defines
//!
//! - [`core::WireLayout`] for fixed-size packed frames, encoded to and decoded from raw bytes,
//! - [`core::FieldPaths`] to list the leaf fields of a domain type, and
//! - [`core::WireMapped`] to convert a domain type into a frame (and back) through its [`registry::Registry`].
//!
//! ## Registry
//!
//! A [`registry::Registry`] is the single table saying which domain field goes to which wire field,
//! and how its value is converted. It is built once with [`registry::RegistryBuilder`], which fails with
//! [`error::RegistrationError`] when a wire field or a domain field is left unmapped, mapped twice, or misspelled.
//! The [`executor`] walks the table in declaration order in both directions.
//!
//! ```
//! use rio_mapping::core::WireMapped;
//! use rio_mapping::device::{Em510Frame, EyEm510};
//!
//! let mut config = EyEm510::default();
//! config.triac_03.polarity = true;
//! config.ai_23 = true;
//!
//! let bytes = WireMapped::<Em510Frame>::to_bytes(&config).unwrap();
//! assert_eq!(bytes, [0, 0, 0, 0, 0, 0, 0b0010_0000, 0b0001_0000, 0, 0, 0, 0]);
//!
//! let decoded: EyEm510 = WireMapped::<Em510Frame>::from_bytes(&bytes).unwrap();
//! assert_eq!(decoded, config);
//! ```
//!
//! ## Derive macros
//!
//! For convenience it provides derive macros to implement the traits. They depend on the `wire` attribute.
//!
//! The `WireLayout` derive lays the fields out back to back in declaration order; every field type must implement
//! [`codec::Encode`] and [`codec::Decode`]. The `wire` field attribute is optional and **can only** contain:
//! - `offset` - expected byte offset of the field, checked at compile time,
//! - `unit` - measurement unit, used for documentation only.
//!
//! The struct `wire` attribute **can** contain `size`, the expected frame size in bytes, checked at compile time.
//!
//! The `BitPacked` derive packs flags and small unsigned integers into one big-endian value. Each field
//! **must** have a `wire` attribute with either
//! - `bit` - bit position of a `bool` flag, `7` being the most significant bit of a single byte, or
//! - `bits` - inclusive `"hi..=lo"` range of an unsigned integer field.
//!
//! The struct `wire` attribute **can** contain `bytes`, the record width (default `1`). Bits claimed by no field
//! are reserved: written as zero and ignored when read.
//!
//! The `FieldPaths` derive lists the leaf fields of a domain struct, recursing into nested structs.
//!
//! The `wire_doc` attribute is to create documentation (by adding doc attribute) from `wire` field attributes information.

// Lets the derive macros refer to `rio_mapping::...` from inside this crate.
extern crate self as rio_mapping;

/// Utilities for encoding to and decoding from big-endian wire bytes
pub mod codec;
/// Core traits for wire frames and mapped domain types
pub mod core;
/// Remote I/O device models and their wire frames
pub mod device;
pub mod error;
pub mod executor;
/// Field mapping registry
pub mod registry;
/// Write frames to, and read them from, byte sinks
pub mod sink;

pub mod derive {
    /// Re-export.
    pub use rio_mapping_derive::{wire_doc, BitPacked, FieldPaths, WireLayout};
}

pub use error::{Error, FrameSizeError, RangeError, RegistrationError};
