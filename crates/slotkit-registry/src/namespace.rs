//! TypeNamespace - registered types and module functions by qualified name.
//!
//! Types and functions share one name space: a dotted name refers to at
//! most one of them. Both are also indexed by [`TypeHash`] for lookups that
//! start from a hash.
//!
//! Registration is all-or-nothing: a rejected entry leaves the namespace
//! exactly as it was.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use slotkit_core::QualifiedName;
//! use slotkit_registry::{TypeNamespace, TypeSpec};
//!
//! let mut ns = TypeNamespace::new();
//! let ty = TypeSpec::new("mytest.Empty").build().unwrap();
//! ns.register_type(Arc::new(ty)).unwrap();
//!
//! assert!(ns.lookup("mytest.Empty").is_some());
//! assert_eq!(ns.types_in_module("mytest").count(), 1);
//! ```

use std::sync::Arc;

use log::debug;
use rustc_hash::FxHashMap;

use slotkit_core::{FunctionDef, QualifiedName, RegistrationError, TypeDescriptor, TypeHash};

/// Registered types and functions.
#[derive(Debug, Default)]
pub struct TypeNamespace {
    /// Types by qualified name (primary storage).
    types: FxHashMap<QualifiedName, Arc<TypeDescriptor>>,

    /// Reverse index: hash -> name.
    type_hash_to_name: FxHashMap<TypeHash, QualifiedName>,

    /// Module functions by qualified name.
    functions: FxHashMap<QualifiedName, Arc<FunctionDef>>,

    /// Types indexed by module: module -> (simple name -> qualified name).
    types_by_module: FxHashMap<String, FxHashMap<String, QualifiedName>>,
}

impl TypeNamespace {
    /// Create an empty namespace.
    pub fn new() -> Self {
        Self::default()
    }

    // ==========================================================================
    // Registration
    // ==========================================================================

    /// Register a built type.
    pub fn register_type(&mut self, ty: Arc<TypeDescriptor>) -> Result<(), RegistrationError> {
        let qname = ty.qualified_name().clone();
        if self.is_taken(&qname) {
            return Err(RegistrationError::DuplicateType(qname.to_string()));
        }

        self.type_hash_to_name.insert(ty.type_hash(), qname.clone());
        self.types_by_module
            .entry(qname.module_string())
            .or_default()
            .insert(qname.simple_name().to_string(), qname.clone());

        debug!(
            "registered type {} ({:?}, {} payload bytes, slots {:?})",
            qname,
            ty.type_hash(),
            ty.payload_size(),
            ty.slots().iter().map(|s| s.kind).collect::<Vec<_>>()
        );
        self.types.insert(qname, ty);
        Ok(())
    }

    /// Register a module function.
    pub fn register_function(&mut self, func: FunctionDef) -> Result<(), RegistrationError> {
        let qname = func.name.clone();
        if self.is_taken(&qname) {
            return Err(RegistrationError::DuplicateType(qname.to_string()));
        }
        debug!("registered function {qname}");
        self.functions.insert(qname, Arc::new(func));
        Ok(())
    }

    fn is_taken(&self, name: &QualifiedName) -> bool {
        self.types.contains_key(name) || self.functions.contains_key(name)
    }

    // ==========================================================================
    // Lookup
    // ==========================================================================

    /// Look up a type by dotted name. Malformed names find nothing.
    pub fn lookup(&self, name: &str) -> Option<&Arc<TypeDescriptor>> {
        let qname = QualifiedName::parse(name).ok()?;
        self.types.get(&qname)
    }

    /// Look up a type by qualified name.
    pub fn get_type(&self, name: &QualifiedName) -> Option<&Arc<TypeDescriptor>> {
        self.types.get(name)
    }

    /// Look up a type by hash.
    pub fn get_type_by_hash(&self, hash: TypeHash) -> Option<&Arc<TypeDescriptor>> {
        self.type_hash_to_name
            .get(&hash)
            .and_then(|name| self.types.get(name))
    }

    /// Check if a type is registered under `name`.
    pub fn contains_type(&self, name: &QualifiedName) -> bool {
        self.types.contains_key(name)
    }

    /// Look up a module function by dotted name.
    pub fn lookup_function(&self, name: &str) -> Option<&Arc<FunctionDef>> {
        let qname = QualifiedName::parse(name).ok()?;
        self.functions.get(&qname)
    }

    /// Types registered directly in `module`.
    pub fn types_in_module<'a>(
        &'a self,
        module: &str,
    ) -> impl Iterator<Item = &'a Arc<TypeDescriptor>> + 'a {
        self.types_by_module
            .get(module)
            .into_iter()
            .flat_map(|names| names.values())
            .filter_map(|qname| self.types.get(qname))
    }

    /// Number of registered types.
    pub fn type_count(&self) -> usize {
        self.types.len()
    }

    /// Number of registered functions.
    pub fn function_count(&self) -> usize {
        self.functions.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TypeSpec;
    use slotkit_core::{CallContext, NativeError, ParsedArgs, Value};

    fn answer(_: &mut CallContext<'_>, _: &ParsedArgs) -> Result<Value, NativeError> {
        Ok(Value::Int(42))
    }

    fn ty(name: &str) -> Arc<TypeDescriptor> {
        Arc::new(TypeSpec::new(name).build().unwrap())
    }

    #[test]
    fn register_and_lookup() {
        let mut ns = TypeNamespace::new();
        ns.register_type(ty("mytest.Point")).unwrap();

        let found = ns.lookup("mytest.Point").unwrap();
        assert_eq!(found.name(), "mytest.Point");
        assert!(ns.lookup("mytest.Missing").is_none());
        assert!(ns.lookup("not a name").is_none());
        assert!(
            ns.get_type_by_hash(TypeHash::from_name("mytest.Point"))
                .is_some()
        );
    }

    #[test]
    fn duplicate_type_leaves_namespace_unchanged() {
        let mut ns = TypeNamespace::new();
        let first = ty("mytest.Point");
        ns.register_type(Arc::clone(&first)).unwrap();

        let err = ns.register_type(ty("mytest.Point")).unwrap_err();
        assert_eq!(err, RegistrationError::DuplicateType("mytest.Point".into()));
        assert_eq!(ns.type_count(), 1);
        assert!(Arc::ptr_eq(ns.lookup("mytest.Point").unwrap(), &first));
    }

    #[test]
    fn functions_share_the_name_space() {
        let mut ns = TypeNamespace::new();
        ns.register_type(ty("mytest.Point")).unwrap();
        ns.register_function(FunctionDef::new("mytest.answer", answer).unwrap())
            .unwrap();

        assert!(ns.lookup_function("mytest.answer").is_some());
        assert!(
            ns.register_function(FunctionDef::new("mytest.Point", answer).unwrap())
                .is_err()
        );
        assert!(ns.register_type(ty("mytest.answer")).is_err());
        assert_eq!(ns.function_count(), 1);
    }

    #[test]
    fn module_index() {
        let mut ns = TypeNamespace::new();
        ns.register_type(ty("a.X")).unwrap();
        ns.register_type(ty("a.Y")).unwrap();
        ns.register_type(ty("b.X")).unwrap();
        ns.register_type(ty("Top")).unwrap();

        assert_eq!(ns.types_in_module("a").count(), 2);
        assert_eq!(ns.types_in_module("b").count(), 1);
        assert_eq!(ns.types_in_module("").count(), 1);
        assert_eq!(ns.types_in_module("c").count(), 0);
    }
}
