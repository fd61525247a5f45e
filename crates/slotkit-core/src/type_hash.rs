//! Deterministic hash-based type identity.
//!
//! [`TypeHash`] is a 64-bit hash of a qualified name. The same name always
//! produces the same hash, so native modules can refer to a type before it
//! is registered and the namespace needs a single map lookup per dispatch.
//!
//! Types and functions use different domain constants so a function and a
//! type with the same dotted name never collide.
//!
//! # Examples
//!
//! ```
//! use slotkit_core::TypeHash;
//!
//! let a = TypeHash::from_name("mytest.Point");
//! let b = TypeHash::from_name("mytest.Point");
//! assert_eq!(a, b);
//! assert_ne!(a, TypeHash::from_function("mytest.Point"));
//! ```

use std::fmt;
use xxhash_rust::xxh64::xxh64;

/// Domain-specific mixing constants for hash computation.
pub mod hash_constants {
    /// Domain marker for type hashes
    pub const TYPE: u64 = 0x2fac10b63a6cc57c;

    /// Domain marker for module function hashes
    pub const FUNCTION: u64 = 0x5ea77ffbcdf5f302;
}

/// A deterministic 64-bit hash identifying a type or function.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct TypeHash(pub u64);

impl TypeHash {
    /// Empty/invalid hash constant.
    pub const EMPTY: TypeHash = TypeHash(0);

    /// Create a type hash from a qualified type name.
    #[inline]
    pub fn from_name(name: &str) -> Self {
        TypeHash(hash_constants::TYPE ^ xxh64(name.as_bytes(), 0))
    }

    /// Create a function hash from a qualified function name.
    #[inline]
    pub fn from_function(name: &str) -> Self {
        TypeHash(hash_constants::FUNCTION ^ xxh64(name.as_bytes(), 0))
    }

    /// Check if this is an empty/invalid hash.
    #[inline]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Get the underlying u64 value.
    #[inline]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Debug for TypeHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeHash({:#018x})", self.0)
    }
}

impl fmt::Display for TypeHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#018x}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deterministic() {
        assert_eq!(TypeHash::from_name("a.B"), TypeHash::from_name("a.B"));
        assert_ne!(TypeHash::from_name("a.B"), TypeHash::from_name("a.C"));
    }

    #[test]
    fn domains_differ() {
        assert_ne!(TypeHash::from_name("a.b"), TypeHash::from_function("a.b"));
    }

    #[test]
    fn empty() {
        assert!(TypeHash::EMPTY.is_empty());
        assert!(!TypeHash::from_name("x").is_empty());
    }

    #[test]
    fn formatting() {
        let hash = TypeHash(0xff);
        assert_eq!(format!("{hash}"), "0x00000000000000ff");
        assert_eq!(format!("{hash:?}"), "TypeHash(0x00000000000000ff)");
    }
}
