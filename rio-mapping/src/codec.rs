use std::fmt::Debug;

use thiserror::Error;

/// Single byte of a wire frame.
pub type Byte = u8;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("frame size mismatch: expected {expected} bytes, got {actual}")]
pub struct FrameSizeError {
    pub expected: usize,
    pub actual: usize,
}

/// Encode a value into its big-endian wire bytes.
///
/// `encode_be` is handed a slice of exactly `SIZE` bytes.
pub trait Encode {
    const SIZE: usize;

    fn encode_be(&self, bytes: &mut [Byte]);

    /// Leaf names of the sub-fields packed into this value, empty for plain integers.
    fn sub_fields() -> Vec<&'static str> {
        Vec::new()
    }
}

/// Decode a value from its big-endian wire bytes.
///
/// `decode_be` is handed a slice of exactly [`Encode::SIZE`] bytes.
pub trait Decode: Encode + Sized {
    fn decode_be(bytes: &[Byte]) -> Self;
}

macro_rules! impl_codec {
    ($num_type:ty) => {
        impl Encode for $num_type {
            const SIZE: usize = std::mem::size_of::<$num_type>();

            fn encode_be(&self, bytes: &mut [Byte]) {
                bytes.copy_from_slice(&self.to_be_bytes());
            }
        }

        impl Decode for $num_type {
            fn decode_be(bytes: &[Byte]) -> Self {
                let mut array = [0; std::mem::size_of::<$num_type>()];
                array.copy_from_slice(bytes);
                <$num_type>::from_be_bytes(array)
            }
        }
    };
}

impl_codec!(u8);
impl_codec!(u16);
impl_codec!(u32);
impl_codec!(u64);
impl_codec!(i8);
impl_codec!(i16);
impl_codec!(i32);
impl_codec!(i64);

/// Unsigned integer that can back a wire field.
///
/// Used by transforms to check and fit domain values into the wire width.
pub trait WireInt: Copy + Debug + Send + Sync + 'static {
    const MAX: u64;

    /// Keep the low-order bits that fit.
    fn truncate(value: u64) -> Self;

    fn widen(self) -> u64;
}

macro_rules! impl_wire_int {
    ($num_type:ty) => {
        impl WireInt for $num_type {
            const MAX: u64 = <$num_type>::MAX as u64;

            fn truncate(value: u64) -> Self {
                value as $num_type
            }

            fn widen(self) -> u64 {
                self as u64
            }
        }
    };
}

impl_wire_int!(u8);
impl_wire_int!(u16);
impl_wire_int!(u32);

/// Check `bytes` holds exactly one frame of `expected` bytes.
pub fn check_frame_size(bytes: &[Byte], expected: usize) -> Result<(), FrameSizeError> {
    if bytes.len() == expected {
        Ok(())
    } else {
        Err(FrameSizeError {
            expected,
            actual: bytes.len(),
        })
    }
}
