//! Value types for concept fields.
//!
//! Values are the data stored in a concept's fields. Concord supports
//! primitive values (String, Int, Bool) and references to other concepts.
//! A reference is either a stub carrying only the referenced concept's key
//! values (as produced by a parser) or a canonical handle into the store.

use crate::ConceptId;
use std::collections::BTreeMap;
use std::fmt;

/// A value that can be stored in a concept field.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Value {
    /// Unset value.
    Null,
    /// Boolean value.
    Bool(bool),
    /// 64-bit signed integer.
    Int(i64),
    /// UTF-8 string.
    String(String),
    /// Reference to another concept.
    Ref(Reference),
}

/// A reference-typed field value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Reference {
    /// Only the key values of the referenced concept are known.
    Stub(Stub),
    /// The one authoritative instance for the referenced key.
    Canonical(ConceptId),
}

/// A partially populated reference: the referenced type plus its key values.
///
/// Key values are listed in the key-field declaration order of the
/// referenced type. A key value may itself be a nested reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Stub {
    /// Declared (or concrete, for polymorphic fields) type of the referenced concept.
    pub type_name: String,
    /// Key field values of the referenced concept.
    pub key: Vec<Value>,
}

impl Stub {
    pub fn new(type_name: impl Into<String>, key: Vec<Value>) -> Self {
        Self {
            type_name: type_name.into(),
            key,
        }
    }
}

impl Reference {
    /// Returns true if this reference still waits for resolution.
    pub fn is_stub(&self) -> bool {
        matches!(self, Reference::Stub(_))
    }

    /// Get the canonical handle if this reference is resolved.
    pub fn as_canonical(&self) -> Option<ConceptId> {
        match self {
            Reference::Canonical(id) => Some(*id),
            Reference::Stub(_) => None,
        }
    }

    /// Get the stub if this reference is not resolved yet.
    pub fn as_stub(&self) -> Option<&Stub> {
        match self {
            Reference::Stub(stub) => Some(stub),
            Reference::Canonical(_) => None,
        }
    }
}

impl Value {
    /// Returns true if this is a null value.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Returns true if this is a reference value.
    pub fn is_ref(&self) -> bool {
        matches!(self, Value::Ref(_))
    }

    /// Get as boolean if this is a Bool value.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Get as integer if this is an Int value.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Get as string reference if this is a String value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Get as reference if this is a Ref value.
    pub fn as_reference(&self) -> Option<&Reference> {
        match self {
            Value::Ref(r) => Some(r),
            _ => None,
        }
    }

    /// Get the canonical handle if this is a resolved reference.
    pub fn as_concept(&self) -> Option<ConceptId> {
        self.as_reference().and_then(Reference::as_canonical)
    }

    /// Returns the type name of this value.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "Null",
            Value::Bool(_) => "Bool",
            Value::Int(_) => "Int",
            Value::String(_) => "String",
            Value::Ref(_) => "Ref",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "<null>"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::String(s) => write!(f, "{}", s),
            Value::Ref(Reference::Canonical(id)) => write!(f, "#{}", id),
            Value::Ref(Reference::Stub(stub)) => {
                write!(f, "{}(", stub.type_name)?;
                for (i, item) in stub.key.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, ")")
            }
        }
    }
}

// Convenient From implementations
impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i as i64)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<Stub> for Value {
    fn from(stub: Stub) -> Self {
        Value::Ref(Reference::Stub(stub))
    }
}

impl From<ConceptId> for Value {
    fn from(id: ConceptId) -> Self {
        Value::Ref(Reference::Canonical(id))
    }
}

impl From<Reference> for Value {
    fn from(r: Reference) -> Self {
        Value::Ref(r)
    }
}

impl From<Stub> for Reference {
    fn from(stub: Stub) -> Self {
        Reference::Stub(stub)
    }
}

impl From<ConceptId> for Reference {
    fn from(id: ConceptId) -> Self {
        Reference::Canonical(id)
    }
}

/// Type alias for field storage. Ordered so iteration is deterministic.
pub type Fields = BTreeMap<String, Value>;

/// Helper macro to create field maps.
#[macro_export]
macro_rules! fields {
    () => {
        $crate::Fields::new()
    };
    ($($key:expr => $value:expr),+ $(,)?) => {
        {
            let mut map = $crate::Fields::new();
            $(
                map.insert($key.to_string(), $crate::Value::from($value));
            )+
            map
        }
    };
}

/// Helper macro to create a stub reference value.
#[macro_export]
macro_rules! stub {
    ($type_name:expr $(, $key:expr)* $(,)?) => {
        $crate::Value::from($crate::Stub::new($type_name, vec![$($crate::Value::from($key)),*]))
    };
}
