//! Type registration for slotkit.
//!
//! - [`TypeSpec`]: fluent, validated declaration of a native type
//! - [`TypeNamespace`]: registered types and module functions by qualified name

pub mod builder;
pub mod namespace;

pub use builder::TypeSpec;
pub use namespace::TypeNamespace;
