//! Runtime type identity for opaque pointer values.

use std::any::Any;
use std::fmt;
use std::rc::Rc;

use crate::scope::ScopeId;

/// Minimal runtime type information contract for objects referenced from
/// pointer-typed datums.
pub trait Rtti: Any + fmt::Debug {
    /// Stable name of the concrete type.
    fn type_name(&self) -> &'static str;

    /// Value equality against another object of any type.
    fn equals(&self, other: &dyn Rtti) -> bool;

    /// Human-readable rendering used in textual dumps.
    fn describe(&self) -> String {
        format!("{}({:?})", self.type_name(), self)
    }

    fn as_any(&self) -> &dyn Any;
}

impl dyn Rtti {
    /// Check whether the object is of concrete type `T`.
    pub fn is<T: Rtti>(&self) -> bool {
        self.as_any().is::<T>()
    }

    /// Downcast to a concrete type.
    pub fn downcast_ref<T: Rtti>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }
}

/// Element of a pointer-typed datum.
#[derive(Debug, Clone, Default)]
pub enum Pointer {
    /// Null reference.
    #[default]
    Null,
    /// Non-owning reference to a scope in the same arena.
    Scope(ScopeId),
    /// Shared reference to an arbitrary object.
    Object(Rc<dyn Rtti>),
}

impl Pointer {
    /// Wrap an object.
    pub fn object<T: Rtti>(value: T) -> Self {
        Pointer::Object(Rc::new(value))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Pointer::Null)
    }

    /// Referenced scope, if this points at one.
    pub fn as_scope(&self) -> Option<ScopeId> {
        match self {
            Pointer::Scope(id) => Some(*id),
            _ => None,
        }
    }

    /// Referenced object, if this points at one.
    pub fn as_object(&self) -> Option<&dyn Rtti> {
        match self {
            Pointer::Object(obj) => Some(obj.as_ref()),
            _ => None,
        }
    }
}

impl PartialEq for Pointer {
    /// Scopes compare by identity, objects by their own `equals`.
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Pointer::Null, Pointer::Null) => true,
            (Pointer::Scope(a), Pointer::Scope(b)) => a == b,
            (Pointer::Object(a), Pointer::Object(b)) => Rc::ptr_eq(a, b) || a.equals(b.as_ref()),
            _ => false,
        }
    }
}

impl fmt::Display for Pointer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Pointer::Null => write!(f, "null"),
            Pointer::Scope(id) => write!(f, "scope:{id}"),
            Pointer::Object(obj) => write!(f, "{}", obj.describe()),
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Small object used as a pointee in tests across the crate.
    #[derive(Debug, PartialEq)]
    pub(crate) struct Token(pub i32);

    impl Rtti for Token {
        fn type_name(&self) -> &'static str {
            "Token"
        }

        fn equals(&self, other: &dyn Rtti) -> bool {
            other.downcast_ref::<Token>().is_some_and(|t| t == self)
        }

        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    #[test]
    fn test_pointer_equality_delegates_to_pointee() {
        let a = Pointer::object(Token(3));
        let b = Pointer::object(Token(3));
        let c = Pointer::object(Token(4));

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_ne!(a, Pointer::Null);
        assert_eq!(Pointer::Null, Pointer::default());
    }

    #[test]
    fn test_pointer_downcast() {
        let p = Pointer::object(Token(9));
        let token = p.as_object().and_then(|o| o.downcast_ref::<Token>());
        assert_eq!(token, Some(&Token(9)));
        assert!(p.as_object().is_some_and(|o| o.is::<Token>()));
        assert!(p.as_scope().is_none());
    }

    #[test]
    fn test_pointer_display() {
        assert_eq!(Pointer::Null.to_string(), "null");
        assert_eq!(Pointer::object(Token(1)).to_string(), "Token(Token(1))");
    }
}
