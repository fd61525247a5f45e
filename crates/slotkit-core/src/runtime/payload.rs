//! Native payload storage.
//!
//! Every instance carries a fixed-size byte region declared by its type.
//! Native slots lay out their own fields at byte offsets inside it and use
//! the typed accessors here to read and write them. All accesses are
//! bounds-checked; nothing here hands out raw pointers.

use std::fmt;

use crate::NativeError;

/// A scalar that can be stored in a payload at a byte offset.
pub trait PayloadScalar: Copy {
    /// Stored size in bytes.
    const SIZE: usize;

    /// Decode from exactly `SIZE` bytes.
    fn read_bytes(bytes: &[u8]) -> Self;

    /// Encode into exactly `SIZE` bytes.
    fn write_bytes(self, bytes: &mut [u8]);
}

macro_rules! impl_payload_scalar {
    ($($ty:ty),*) => {
        $(
            impl PayloadScalar for $ty {
                const SIZE: usize = std::mem::size_of::<$ty>();

                fn read_bytes(bytes: &[u8]) -> Self {
                    let mut buf = [0u8; std::mem::size_of::<$ty>()];
                    buf.copy_from_slice(bytes);
                    <$ty>::from_ne_bytes(buf)
                }

                fn write_bytes(self, bytes: &mut [u8]) {
                    bytes.copy_from_slice(&self.to_ne_bytes());
                }
            }
        )*
    };
}

impl_payload_scalar!(i8, i16, i32, i64, u8, u16, u32, u64, f32, f64);

impl PayloadScalar for bool {
    const SIZE: usize = 1;

    fn read_bytes(bytes: &[u8]) -> Self {
        bytes[0] != 0
    }

    fn write_bytes(self, bytes: &mut [u8]) {
        bytes[0] = self as u8;
    }
}

/// Per-instance native memory.
///
/// Owned exclusively by its instance from allocation until the `destroy`
/// slot returns.
#[derive(Clone, PartialEq, Eq)]
pub struct Payload {
    bytes: Box<[u8]>,
}

impl Payload {
    /// Create a zero-filled payload of `size` bytes.
    pub fn zeroed(size: usize) -> Self {
        Self {
            bytes: vec![0u8; size].into_boxed_slice(),
        }
    }

    /// Payload length in bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Check if the payload has no bytes.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Read a scalar at `offset`.
    pub fn read<T: PayloadScalar>(&self, offset: usize) -> Result<T, NativeError> {
        let range = self.range(offset, T::SIZE)?;
        Ok(T::read_bytes(&self.bytes[range]))
    }

    /// Write a scalar at `offset`.
    pub fn write<T: PayloadScalar>(&mut self, offset: usize, value: T) -> Result<(), NativeError> {
        let range = self.range(offset, T::SIZE)?;
        value.write_bytes(&mut self.bytes[range]);
        Ok(())
    }

    /// Raw view of the payload bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Mutable raw view of the payload bytes.
    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        &mut self.bytes
    }

    fn range(&self, offset: usize, size: usize) -> Result<std::ops::Range<usize>, NativeError> {
        match offset.checked_add(size) {
            Some(end) if end <= self.bytes.len() => Ok(offset..end),
            _ => Err(NativeError::PayloadBounds {
                offset,
                size,
                len: self.bytes.len(),
            }),
        }
    }
}

impl fmt::Debug for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Payload").field("len", &self.len()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zeroed_reads_zero() {
        let payload = Payload::zeroed(16);
        assert_eq!(payload.len(), 16);
        assert_eq!(payload.read::<i64>(0).unwrap(), 0);
        assert_eq!(payload.read::<i64>(8).unwrap(), 0);
        assert!(!payload.read::<bool>(3).unwrap());
    }

    #[test]
    fn write_then_read_fields() {
        let mut payload = Payload::zeroed(16);
        payload.write::<i64>(0, 1).unwrap();
        payload.write::<i64>(8, -2).unwrap();
        assert_eq!(payload.read::<i64>(0).unwrap(), 1);
        assert_eq!(payload.read::<i64>(8).unwrap(), -2);

        payload.write::<f32>(4, 1.5).unwrap();
        assert_eq!(payload.read::<f32>(4).unwrap(), 1.5);
    }

    #[test]
    fn out_of_bounds_is_an_error() {
        let mut payload = Payload::zeroed(8);
        assert_eq!(
            payload.read::<i64>(4),
            Err(NativeError::PayloadBounds {
                offset: 4,
                size: 8,
                len: 8
            })
        );
        assert!(payload.write::<u8>(8, 1).is_err());
        assert!(payload.read::<u8>(usize::MAX).is_err());
    }

    #[test]
    fn empty_payload() {
        let payload = Payload::zeroed(0);
        assert!(payload.is_empty());
        assert!(payload.read::<u8>(0).is_err());
    }
}
