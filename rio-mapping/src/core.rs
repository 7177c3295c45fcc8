use std::fmt::Debug;
use std::time::Duration;

use crate::codec::{Byte, FrameSizeError};
use crate::error::RangeError;
use crate::executor;
use crate::registry::Registry;

/// Fixed-size packed wire frame.
///
/// Usually implemented with the `WireLayout` derive macro, which lays the fields out
/// back to back in declaration order.
pub trait WireLayout
where
    Self: Sized + Default,
{
    /// Encoded frame, a `[u8; SIZE]` array.
    type Bytes: AsRef<[Byte]> + AsMut<[Byte]> + Copy + Debug;

    const SIZE: usize;

    fn encode(&self) -> Self::Bytes;

    /// Fails only when `bytes` is not exactly `SIZE` long. Reserved bits are ignored.
    fn decode(bytes: &[Byte]) -> Result<Self, FrameSizeError>;

    /// Dotted paths of every leaf wire field, in layout order.
    fn field_paths() -> Vec<String>;
}

/// Leaf field paths of a domain type.
///
/// The default implementation marks the type as a leaf value.
/// Structs derive it with the `FieldPaths` derive macro.
pub trait FieldPaths {
    fn field_paths() -> Vec<String> {
        Vec::new()
    }
}

macro_rules! impl_leaf {
    ($($leaf_type:ty),*) => {
        $(impl FieldPaths for $leaf_type {})*
    };
}

impl_leaf!(bool, u8, u16, u32, u64, i8, i16, i32, i64, Duration);

/// Define mapping between the Self domain type and the `W` wire frame
/// to create the frame from the type instance, or create and update the instance from a frame.
pub trait WireMapped<W>
where
    Self: Sized + Default + 'static,
    W: WireLayout + 'static,
{
    /// Process-wide registry of field mappings between `Self` and `W`.
    fn registry() -> &'static Registry<Self, W>;

    fn to_wire(&self) -> Result<W, RangeError> {
        executor::to_wire(Self::registry(), self)
    }

    /// Overwrite the mapped fields from `frame`, leaving unmapped ones untouched.
    fn update_from_wire(&mut self, frame: &W) {
        executor::update_from_wire(Self::registry(), frame, self)
    }

    fn from_wire(frame: &W) -> Self {
        let mut new = Self::default();
        new.update_from_wire(frame);

        new
    }

    fn to_bytes(&self) -> Result<W::Bytes, RangeError> {
        Ok(self.to_wire()?.encode())
    }

    fn update_from_bytes(&mut self, bytes: &[Byte]) -> Result<(), FrameSizeError> {
        let frame = W::decode(bytes)?;
        self.update_from_wire(&frame);

        Ok(())
    }

    fn from_bytes(bytes: &[Byte]) -> Result<Self, FrameSizeError> {
        let mut new = Self::default();
        new.update_from_bytes(bytes)?;

        Ok(new)
    }
}
