use std::fmt;

use crate::{RegistrationError, TypeHash};

/// Dotted name identifying a type or function in the namespace.
///
/// The last segment is the simple name, everything before it is the
/// module path. `mytest.Point` has name `Point` in module `mytest`.
///
/// # Examples
///
/// ```
/// use slotkit_core::QualifiedName;
///
/// let point = QualifiedName::parse("mytest.Point").unwrap();
/// assert_eq!(point.simple_name(), "Point");
/// assert_eq!(point.module_string(), "mytest");
/// assert_eq!(point.to_string(), "mytest.Point");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QualifiedName {
    /// Simple name (e.g., "Point")
    pub name: String,
    /// Module path (e.g., ["mytest"]); empty for top-level names
    pub module: Vec<String>,
}

impl QualifiedName {
    /// Create a qualified name from its parts without validation.
    pub fn new(name: impl Into<String>, module: Vec<String>) -> Self {
        Self {
            name: name.into(),
            module,
        }
    }

    /// Create a top-level name without validation.
    pub fn top_level(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            module: Vec::new(),
        }
    }

    /// Parse and validate a dotted name.
    ///
    /// Every segment must be a non-empty identifier
    /// (`[A-Za-z_][A-Za-z0-9_]*`).
    pub fn parse(s: &str) -> Result<Self, RegistrationError> {
        if s.is_empty() {
            return Err(invalid(s, "name is empty"));
        }

        let mut parts: Vec<String> = Vec::new();
        for segment in s.split('.') {
            if segment.is_empty() {
                return Err(invalid(s, "empty segment"));
            }
            if !is_identifier(segment) {
                return Err(invalid(s, "segment is not an identifier"));
            }
            parts.push(segment.to_string());
        }

        // split always yields at least one segment
        let name = parts.pop().unwrap_or_default();
        Ok(Self {
            name,
            module: parts,
        })
    }

    /// Check if this name has no module path.
    pub fn is_top_level(&self) -> bool {
        self.module.is_empty()
    }

    /// Get the simple (unqualified) name.
    pub fn simple_name(&self) -> &str {
        &self.name
    }

    /// Get the module path.
    pub fn module_path(&self) -> &[String] {
        &self.module
    }

    /// Get the module path as a dotted string.
    pub fn module_string(&self) -> String {
        self.module.join(".")
    }

    /// Compute the TypeHash of this name.
    pub fn to_type_hash(&self) -> TypeHash {
        TypeHash::from_name(&self.to_string())
    }
}

fn invalid(name: &str, reason: &'static str) -> RegistrationError {
    RegistrationError::InvalidName {
        name: name.to_string(),
        reason,
    }
}

fn is_identifier(segment: &str) -> bool {
    let mut chars = segment.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

impl fmt::Display for QualifiedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.module.is_empty() {
            write!(f, "{}", self.name)
        } else {
            write!(f, "{}.{}", self.module.join("."), self.name)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_top_level() {
        let name = QualifiedName::parse("Point").unwrap();
        assert!(name.is_top_level());
        assert_eq!(name.simple_name(), "Point");
        assert_eq!(name.to_string(), "Point");
    }

    #[test]
    fn parse_nested_module() {
        let name = QualifiedName::parse("pkg.geometry.Point").unwrap();
        assert_eq!(name.module_path(), &["pkg".to_string(), "geometry".to_string()]);
        assert_eq!(name.module_string(), "pkg.geometry");
        assert_eq!(name.to_string(), "pkg.geometry.Point");
    }

    #[test]
    fn parse_rejects_empty() {
        assert!(matches!(
            QualifiedName::parse(""),
            Err(RegistrationError::InvalidName { reason: "name is empty", .. })
        ));
    }

    #[test]
    fn parse_rejects_empty_segments() {
        for bad in [".Point", "mytest.", "a..b"] {
            assert!(
                matches!(
                    QualifiedName::parse(bad),
                    Err(RegistrationError::InvalidName { reason: "empty segment", .. })
                ),
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn parse_rejects_non_identifiers() {
        for bad in ["1Point", "my-test.Point", "mytest.Po int"] {
            assert!(QualifiedName::parse(bad).is_err(), "{bad} should be rejected");
        }
        assert!(QualifiedName::parse("_private.Point_2").is_ok());
    }

    #[test]
    fn hash_follows_display() {
        let a = QualifiedName::parse("mytest.Point").unwrap();
        let b = QualifiedName::new("Point", vec!["mytest".into()]);
        assert_eq!(a, b);
        assert_eq!(a.to_type_hash(), TypeHash::from_name("mytest.Point"));
    }
}
