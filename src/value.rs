use std::fmt;

use crate::primitives::Builtin;

/// Unique identifier for an interned symbol.
/// Interning guarantees that equal names share one id.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SymbolId(pub u32);

/// Index into the object heap. This is the GC handle.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjId(pub u32);

impl ObjId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// The fundamental Skeem value.
/// Copy semantics: immediates are stored inline, everything else is a handle
/// into the heap and owns nothing.
#[derive(Clone, Copy, PartialEq)]
pub enum Value {
    /// The empty list `()`.
    Nil,
    Integer(i64),
    Float(f64),
    Char(char),
    Boolean(bool),
    Symbol(SymbolId),
    Primitive(Builtin),
    String(ObjId),
    Pair(ObjId),
    /// A user procedure with its captured frame. The procedure itself is a
    /// heap object reachable only through its closure.
    Closure(ObjId),
    Environment(ObjId),
}

impl Value {
    pub const TRUE: Value = Value::Boolean(true);
    pub const FALSE: Value = Value::Boolean(false);

    pub fn from_bool(b: bool) -> Value {
        Value::Boolean(b)
    }

    pub fn is_nil(self) -> bool {
        matches!(self, Value::Nil)
    }

    /// `#f` is the only false value.
    pub fn is_truthy(self) -> bool {
        !matches!(self, Value::Boolean(false))
    }

    pub fn is_number(self) -> bool {
        matches!(self, Value::Integer(_) | Value::Float(_))
    }

    pub fn is_callable(self) -> bool {
        matches!(self, Value::Primitive(_) | Value::Closure(_))
    }

    pub fn as_symbol(self) -> Option<SymbolId> {
        match self {
            Value::Symbol(id) => Some(id),
            _ => None,
        }
    }

    /// The heap object this value refers to, if any.
    pub fn heap_ref(self) -> Option<ObjId> {
        match self {
            Value::String(id)
            | Value::Pair(id)
            | Value::Closure(id)
            | Value::Environment(id) => Some(id),
            _ => None,
        }
    }

    /// Type name used in diagnostics.
    pub fn type_name(self) -> &'static str {
        match self {
            Value::Nil => "list",
            Value::Integer(_) => "integer",
            Value::Float(_) => "float",
            Value::Char(_) => "char",
            Value::Boolean(_) => "boolean",
            Value::Symbol(_) => "symbol",
            Value::Primitive(_) => "primitive",
            Value::String(_) => "string",
            Value::Pair(_) => "list",
            Value::Closure(_) => "closure",
            Value::Environment(_) => "environment",
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => write!(f, "Nil"),
            Value::Integer(n) => write!(f, "Int({})", n),
            Value::Float(x) => write!(f, "Float({:?})", x),
            Value::Char(c) => write!(f, "Char({:?})", c),
            Value::Boolean(b) => write!(f, "Bool({})", b),
            Value::Symbol(id) => write!(f, "Sym({})", id.0),
            Value::Primitive(b) => write!(f, "Prim({})", b.name()),
            Value::String(id) => write!(f, "Str({})", id.0),
            Value::Pair(id) => write!(f, "Pair({})", id.0),
            Value::Closure(id) => write!(f, "Clo({})", id.0),
            Value::Environment(id) => write!(f, "Env({})", id.0),
        }
    }
}

impl fmt::Debug for SymbolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SymbolId({})", self.0)
    }
}

impl fmt::Debug for ObjId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjId({})", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_false_is_falsy() {
        assert!(!Value::FALSE.is_truthy());
        assert!(Value::TRUE.is_truthy());
        assert!(Value::Nil.is_truthy());
        assert!(Value::Integer(0).is_truthy());
    }

    #[test]
    fn heap_refs() {
        assert_eq!(Value::Pair(ObjId(3)).heap_ref(), Some(ObjId(3)));
        assert_eq!(Value::String(ObjId(1)).heap_ref(), Some(ObjId(1)));
        assert_eq!(Value::Integer(3).heap_ref(), None);
        assert_eq!(Value::Symbol(SymbolId(0)).heap_ref(), None);
    }
}
