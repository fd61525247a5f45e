//! Argument bundles and eager argument extraction.
//!
//! Callers hand the host a raw [`Args`] bundle (positional values plus
//! keyword pairs). A slot that wants typed arguments declares an
//! [`ArgSpec`]; the trampoline runs [`ArgSpec::parse`] before invoking the
//! slot, so a missing or mistyped argument is rejected without any native
//! code running. The slot then reads from the validated [`ParsedArgs`].
//!
//! An `ArgSpec` can be written out parameter by parameter or built from a
//! compact format string:
//!
//! | code | kind              | accepts               |
//! |------|-------------------|-----------------------|
//! | `i`  | [`ArgKind::Int`]  | int fitting in i32    |
//! | `l`  | [`ArgKind::Long`] | int                   |
//! | `d`  | [`ArgKind::Double`] | float or int        |
//! | `p`  | [`ArgKind::Bool`] | bool or int           |
//! | `s`  | [`ArgKind::Str`]  | str                   |
//! | `O`  | [`ArgKind::Object`] | anything            |
//! | `\|` | marks the rest optional |                 |
//!
//! ```
//! use slotkit_core::{ArgSpec, Args, Value};
//!
//! let spec = ArgSpec::with_keywords("l|l", &["x", "y"]).unwrap();
//! let parsed = spec
//!     .parse(&Args::positional([Value::Int(1)]).keyword("y", Value::Int(2)))
//!     .unwrap();
//! assert_eq!(parsed.get::<i64>(0).unwrap(), 1);
//! assert_eq!(parsed.get::<i64>(1).unwrap(), 2);
//! ```

use crate::convert::FromValue;
use crate::error::{ArgumentError, NativeError, RegistrationError};
use crate::runtime::Value;

/// A raw argument bundle: positional values then keyword pairs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Args {
    positional: Vec<Value>,
    keywords: Vec<(String, Value)>,
}

impl Args {
    /// An empty bundle.
    pub fn new() -> Self {
        Self::default()
    }

    /// A bundle of positional values.
    pub fn positional(values: impl IntoIterator<Item = Value>) -> Self {
        Self {
            positional: values.into_iter().collect(),
            keywords: Vec::new(),
        }
    }

    /// Add a keyword argument.
    pub fn keyword(mut self, name: impl Into<String>, value: Value) -> Self {
        self.keywords.push((name.into(), value));
        self
    }

    /// Positional values.
    pub fn positional_values(&self) -> &[Value] {
        &self.positional
    }

    /// Keyword pairs in call order.
    pub fn keywords(&self) -> &[(String, Value)] {
        &self.keywords
    }

    /// Total number of arguments.
    pub fn len(&self) -> usize {
        self.positional.len() + self.keywords.len()
    }

    /// Check if no arguments were given.
    pub fn is_empty(&self) -> bool {
        self.positional.is_empty() && self.keywords.is_empty()
    }
}

/// Kind of value a parameter accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArgKind {
    /// Integer fitting in i32 (`i`)
    Int,
    /// Integer (`l`)
    Long,
    /// Float, ints are widened (`d`)
    Double,
    /// Bool, ints are read as truthiness (`p`)
    Bool,
    /// String (`s`)
    Str,
    /// Any value (`O`)
    Object,
}

impl ArgKind {
    /// Map a format code to a kind.
    pub fn from_code(code: char) -> Option<Self> {
        match code {
            'i' => Some(ArgKind::Int),
            'l' => Some(ArgKind::Long),
            'd' => Some(ArgKind::Double),
            'p' => Some(ArgKind::Bool),
            's' => Some(ArgKind::Str),
            'O' => Some(ArgKind::Object),
            _ => None,
        }
    }

    /// Human-readable name used in error messages.
    pub fn name(self) -> &'static str {
        match self {
            ArgKind::Int | ArgKind::Long => "int",
            ArgKind::Double => "float",
            ArgKind::Bool => "bool",
            ArgKind::Str => "str",
            ArgKind::Object => "object",
        }
    }

    /// Check and normalise a value for this kind.
    fn accept(self, name: &str, value: &Value) -> Result<Value, ArgumentError> {
        let mismatch = || ArgumentError::TypeMismatch {
            name: name.to_string(),
            expected: self.name(),
            actual: value.type_name(),
        };
        match (self, value) {
            (ArgKind::Object, v) => Ok(v.clone()),
            (ArgKind::Long, Value::Int(v)) => Ok(Value::Int(*v)),
            (ArgKind::Int, Value::Int(v)) => {
                if i32::try_from(*v).is_ok() {
                    Ok(Value::Int(*v))
                } else {
                    Err(ArgumentError::Overflow {
                        name: name.to_string(),
                        value: *v,
                        target: "i32",
                    })
                }
            }
            (ArgKind::Double, Value::Float(v)) => Ok(Value::Float(*v)),
            (ArgKind::Double, Value::Int(v)) => Ok(Value::Float(*v as f64)),
            (ArgKind::Bool, Value::Bool(v)) => Ok(Value::Bool(*v)),
            (ArgKind::Bool, Value::Int(v)) => Ok(Value::Bool(*v != 0)),
            (ArgKind::Str, Value::Str(s)) => Ok(Value::Str(s.clone())),
            _ => Err(mismatch()),
        }
    }
}

/// One declared parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArgParam {
    /// Keyword name; positional-only when `None`.
    pub name: Option<String>,
    /// Accepted kind.
    pub kind: ArgKind,
    /// Whether the parameter may be omitted.
    pub optional: bool,
}

impl ArgParam {
    fn display_name(&self, position: usize) -> String {
        match &self.name {
            Some(name) => name.clone(),
            None => format!("#{position}"),
        }
    }
}

/// Declared argument contract of a slot, method or function.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArgSpec {
    params: Vec<ArgParam>,
}

impl ArgSpec {
    /// A spec that accepts no arguments at all.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a required keyword-capable parameter.
    pub fn required(mut self, name: impl Into<String>, kind: ArgKind) -> Self {
        self.params.push(ArgParam {
            name: Some(name.into()),
            kind,
            optional: false,
        });
        self
    }

    /// Append an optional keyword-capable parameter.
    pub fn optional(mut self, name: impl Into<String>, kind: ArgKind) -> Self {
        self.params.push(ArgParam {
            name: Some(name.into()),
            kind,
            optional: true,
        });
        self
    }

    /// Build a positional-only spec from a format string such as `"ll"`.
    pub fn from_format(format: &str) -> Result<Self, RegistrationError> {
        Self::build(format, None)
    }

    /// Build a spec from a format string with one keyword name per parameter.
    pub fn with_keywords(format: &str, names: &[&str]) -> Result<Self, RegistrationError> {
        Self::build(format, Some(names))
    }

    fn build(format: &str, names: Option<&[&str]>) -> Result<Self, RegistrationError> {
        let bad = |reason: String| RegistrationError::InvalidArgSpec {
            format: format.to_string(),
            reason,
        };

        let mut params = Vec::new();
        let mut optional = false;
        for code in format.chars() {
            if code == '|' {
                if optional {
                    return Err(bad("'|' given twice".into()));
                }
                optional = true;
                continue;
            }
            let kind = ArgKind::from_code(code)
                .ok_or_else(|| bad(format!("unknown format code '{code}'")))?;
            params.push(ArgParam {
                name: None,
                kind,
                optional,
            });
        }

        if let Some(names) = names {
            if names.len() != params.len() {
                return Err(bad(format!(
                    "{} keyword names for {} parameters",
                    names.len(),
                    params.len()
                )));
            }
            for (param, name) in params.iter_mut().zip(names) {
                if !name.is_empty() {
                    param.name = Some((*name).to_string());
                }
            }
        }

        Ok(Self { params })
    }

    /// The declared parameters.
    pub fn params(&self) -> &[ArgParam] {
        &self.params
    }

    /// Number of declared parameters.
    pub fn len(&self) -> usize {
        self.params.len()
    }

    /// Check if no parameters are declared.
    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Extract typed values from a raw bundle, by position then by name.
    pub fn parse(&self, args: &Args) -> Result<ParsedArgs, ArgumentError> {
        let given = args.positional.len();
        if given > self.params.len() {
            return Err(ArgumentError::TooMany {
                max: self.params.len(),
                given,
            });
        }

        let mut values: Vec<Option<Value>> = vec![None; self.params.len()];
        for (position, value) in args.positional.iter().enumerate() {
            let param = &self.params[position];
            values[position] = Some(param.kind.accept(&param.display_name(position), value)?);
        }

        for (keyword, value) in &args.keywords {
            let position = self
                .params
                .iter()
                .position(|p| p.name.as_deref() == Some(keyword.as_str()))
                .ok_or_else(|| ArgumentError::UnknownKeyword(keyword.clone()))?;
            if values[position].is_some() {
                return Err(ArgumentError::Duplicate(keyword.clone()));
            }
            values[position] = Some(self.params[position].kind.accept(keyword, value)?);
        }

        for (position, (param, value)) in self.params.iter().zip(&values).enumerate() {
            if value.is_none() && !param.optional {
                return Err(ArgumentError::Missing {
                    name: param.display_name(position),
                    position,
                });
            }
        }

        let names = self.params.iter().map(|p| p.name.clone()).collect();
        Ok(ParsedArgs { values, names })
    }
}

/// Arguments after extraction, indexed by parameter position.
///
/// Optional parameters that were not supplied read back as absent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedArgs {
    values: Vec<Option<Value>>,
    names: Vec<Option<String>>,
}

impl ParsedArgs {
    /// Pass a raw bundle through unvalidated: positional values first, then
    /// keyword values addressable by name.
    pub fn unchecked(args: &Args) -> Self {
        let mut values: Vec<Option<Value>> = args.positional.iter().cloned().map(Some).collect();
        let mut names: Vec<Option<String>> = vec![None; values.len()];
        for (name, value) in &args.keywords {
            values.push(Some(value.clone()));
            names.push(Some(name.clone()));
        }
        Self { values, names }
    }

    /// Number of parameter positions.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check if there are no parameter positions.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Check if the parameter at `index` was supplied.
    pub fn is_present(&self, index: usize) -> bool {
        matches!(self.values.get(index), Some(Some(_)))
    }

    /// Raw value at `index`, if supplied.
    pub fn value(&self, index: usize) -> Option<&Value> {
        self.values.get(index).and_then(Option::as_ref)
    }

    /// Typed value at `index`.
    pub fn get<T: FromValue>(&self, index: usize) -> Result<T, NativeError> {
        let value = self
            .value(index)
            .ok_or_else(|| NativeError::type_error(format!("argument {index} was not supplied")))?;
        Ok(T::from_value(value)?)
    }

    /// Typed value at `index`, or `None` if it was omitted.
    pub fn get_opt<T: FromValue>(&self, index: usize) -> Result<Option<T>, NativeError> {
        match self.value(index) {
            Some(value) => Ok(Some(T::from_value(value)?)),
            None => Ok(None),
        }
    }

    /// Typed value of the parameter called `name`.
    pub fn named<T: FromValue>(&self, name: &str) -> Result<T, NativeError> {
        let index = self
            .names
            .iter()
            .position(|n| n.as_deref() == Some(name))
            .ok_or_else(|| NativeError::type_error(format!("no argument named '{name}'")))?;
        self.get(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ints(values: &[i64]) -> Args {
        Args::positional(values.iter().map(|v| Value::Int(*v)))
    }

    #[test]
    fn format_two_longs() {
        let spec = ArgSpec::from_format("ll").unwrap();
        assert_eq!(spec.len(), 2);
        let parsed = spec.parse(&ints(&[1, 2])).unwrap();
        assert_eq!(parsed.get::<i64>(0).unwrap(), 1);
        assert_eq!(parsed.get::<i64>(1).unwrap(), 2);
    }

    #[test]
    fn format_rejects_unknown_code() {
        assert!(matches!(
            ArgSpec::from_format("lq"),
            Err(RegistrationError::InvalidArgSpec { .. })
        ));
        assert!(ArgSpec::from_format("l||l").is_err());
        assert!(ArgSpec::with_keywords("ll", &["x"]).is_err());
    }

    #[test]
    fn missing_required() {
        let spec = ArgSpec::from_format("ll").unwrap();
        assert_eq!(
            spec.parse(&ints(&[1])),
            Err(ArgumentError::Missing {
                name: "#1".into(),
                position: 1
            })
        );
    }

    #[test]
    fn type_mismatch() {
        let spec = ArgSpec::from_format("ll").unwrap();
        let args = Args::positional([Value::Int(1), Value::Str("2".into())]);
        assert_eq!(
            spec.parse(&args),
            Err(ArgumentError::TypeMismatch {
                name: "#1".into(),
                expected: "int",
                actual: "str"
            })
        );
        // floats are not silently truncated into longs
        let args = Args::positional([Value::Float(1.5), Value::Int(2)]);
        assert!(spec.parse(&args).is_err());
    }

    #[test]
    fn too_many_positional() {
        let spec = ArgSpec::from_format("l").unwrap();
        assert_eq!(
            spec.parse(&ints(&[1, 2])),
            Err(ArgumentError::TooMany { max: 1, given: 2 })
        );
        assert_eq!(
            ArgSpec::new().parse(&ints(&[1])),
            Err(ArgumentError::TooMany { max: 0, given: 1 })
        );
    }

    #[test]
    fn keywords_by_name() {
        let spec = ArgSpec::with_keywords("ll", &["x", "y"]).unwrap();
        let args = Args::new().keyword("y", Value::Int(4)).keyword("x", Value::Int(3));
        let parsed = spec.parse(&args).unwrap();
        assert_eq!(parsed.named::<i64>("x").unwrap(), 3);
        assert_eq!(parsed.named::<i64>("y").unwrap(), 4);
    }

    #[test]
    fn keyword_errors() {
        let spec = ArgSpec::with_keywords("ll", &["x", "y"]).unwrap();
        let args = ints(&[1]).keyword("x", Value::Int(2));
        assert_eq!(spec.parse(&args), Err(ArgumentError::Duplicate("x".into())));

        let args = ints(&[1, 2]).keyword("z", Value::Int(3));
        assert_eq!(spec.parse(&args), Err(ArgumentError::UnknownKeyword("z".into())));

        // positional-only parameters cannot be addressed by name
        let spec = ArgSpec::from_format("l").unwrap();
        let args = Args::new().keyword("x", Value::Int(1));
        assert!(matches!(spec.parse(&args), Err(ArgumentError::UnknownKeyword(_))));
    }

    #[test]
    fn optional_parameters() {
        let spec = ArgSpec::new()
            .required("x", ArgKind::Long)
            .optional("scale", ArgKind::Double);
        let parsed = spec.parse(&ints(&[5])).unwrap();
        assert!(parsed.is_present(0));
        assert!(!parsed.is_present(1));
        assert_eq!(parsed.get_opt::<f64>(1).unwrap(), None);

        let parsed = spec.parse(&ints(&[5, 2])).unwrap();
        assert_eq!(parsed.get_opt::<f64>(1).unwrap(), Some(2.0));
    }

    #[test]
    fn int_code_checks_range() {
        let spec = ArgSpec::from_format("i").unwrap();
        assert!(matches!(
            spec.parse(&ints(&[i64::from(i32::MAX) + 1])),
            Err(ArgumentError::Overflow { target: "i32", .. })
        ));
        assert!(spec.parse(&ints(&[-5])).is_ok());
    }

    #[test]
    fn bool_and_object_codes() {
        let spec = ArgSpec::from_format("pO").unwrap();
        let parsed = spec
            .parse(&Args::positional([Value::Int(0), Value::Str("any".into())]))
            .unwrap();
        assert!(!parsed.get::<bool>(0).unwrap());
        assert_eq!(parsed.value(1), Some(&Value::Str("any".into())));
    }

    #[test]
    fn unchecked_keeps_keywords_addressable() {
        let args = ints(&[1]).keyword("flag", Value::Bool(true));
        let parsed = ParsedArgs::unchecked(&args);
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed.get::<i64>(0).unwrap(), 1);
        assert!(parsed.named::<bool>("flag").unwrap());
    }
}
