//! Typed element storage behind a datum.

use std::fmt;

use tracing::trace;

use super::DatumType;
use crate::config::GrowthPolicy;
use crate::error::{Error, Result};
use crate::math::{Mat4, Vec4};
use crate::rtti::Pointer;
use crate::scope::ScopeId;

// Expand `$body` once per typed variant of `$enum`.
macro_rules! dispatch {
    ($value:expr, $enum:ident, |$s:ident| $body:expr, unknown => $unknown:expr) => {
        match $value {
            $enum::Unknown => $unknown,
            $enum::Integer($s) => $body,
            $enum::Float($s) => $body,
            $enum::String($s) => $body,
            $enum::Vector($s) => $body,
            $enum::Matrix($s) => $body,
            $enum::Pointer($s) => $body,
            $enum::InternalTable($s) => $body,
            $enum::ExternalTable($s) => $body,
        }
    };
}

// Map every variant of `$from` onto the same-named variant of `$to`.
macro_rules! convert {
    ($value:expr, $from:ident => $to:ident, |$s:ident| $body:expr) => {
        match $value {
            $from::Unknown => $to::Unknown,
            $from::Integer($s) => $to::Integer($body),
            $from::Float($s) => $to::Float($body),
            $from::String($s) => $to::String($body),
            $from::Vector($s) => $to::Vector($body),
            $from::Matrix($s) => $to::Matrix($body),
            $from::Pointer($s) => $to::Pointer($body),
            $from::InternalTable($s) => $to::InternalTable($body),
            $from::ExternalTable($s) => $to::ExternalTable($body),
        }
    };
}

/// Owned elements, one vector per concrete type.
#[derive(Debug, Clone, Default)]
pub enum Elements {
    #[default]
    Unknown,
    Integer(Vec<i32>),
    Float(Vec<f32>),
    String(Vec<String>),
    Vector(Vec<Vec4>),
    Matrix(Vec<Mat4>),
    Pointer(Vec<Pointer>),
    InternalTable(Vec<ScopeId>),
    ExternalTable(Vec<ScopeId>),
}

impl Elements {
    pub(crate) fn empty(datum_type: DatumType) -> Self {
        match datum_type.concrete() {
            DatumType::Unknown | DatumType::Table => Elements::Unknown,
            DatumType::Integer => Elements::Integer(Vec::new()),
            DatumType::Float => Elements::Float(Vec::new()),
            DatumType::String => Elements::String(Vec::new()),
            DatumType::Vector => Elements::Vector(Vec::new()),
            DatumType::Matrix => Elements::Matrix(Vec::new()),
            DatumType::Pointer => Elements::Pointer(Vec::new()),
            DatumType::InternalTable => Elements::InternalTable(Vec::new()),
            DatumType::ExternalTable => Elements::ExternalTable(Vec::new()),
        }
    }

    /// Clone borrowed elements into owned storage.
    pub(crate) fn from_ref(buffer: BufferRef<'_>) -> Self {
        convert!(buffer, BufferRef => Elements, |s| s.to_vec())
    }

    pub(crate) fn datum_type(&self) -> DatumType {
        self.as_ref().datum_type()
    }

    pub(crate) fn len(&self) -> usize {
        dispatch!(self, Elements, |v| v.len(), unknown => 0)
    }

    pub(crate) fn as_ref(&self) -> BufferRef<'_> {
        convert!(self, Elements => BufferRef, |v| v.as_slice())
    }

    pub(crate) fn as_mut(&mut self) -> BufferMut<'_> {
        convert!(self, Elements => BufferMut, |v| v.as_mut_slice())
    }

    fn resize(&mut self, size: usize) -> Result<()> {
        match self {
            Elements::Unknown => return Err(Error::UnknownType { operation: "resize" }),
            Elements::Integer(v) => v.resize(size, 0),
            Elements::Float(v) => v.resize(size, 0.0),
            Elements::String(v) => v.resize(size, String::new()),
            Elements::Vector(v) => v.resize(size, Vec4::ZERO),
            Elements::Matrix(v) => v.resize(size, Mat4::default()),
            Elements::Pointer(v) => v.resize(size, Pointer::Null),
            Elements::InternalTable(_) => return Err(Error::TableStorage { operation: "resize" }),
            Elements::ExternalTable(v) => v.resize(size, ScopeId::NULL),
        }
        Ok(())
    }

    fn reserve_exact(&mut self, additional: usize) {
        dispatch!(self, Elements, |v| v.reserve_exact(additional), unknown => ())
    }

    fn shrink_to(&mut self, capacity: usize) {
        dispatch!(self, Elements, |v| v.shrink_to(capacity), unknown => ())
    }

    fn clear(&mut self) {
        dispatch!(self, Elements, |v| v.clear(), unknown => ())
    }

    fn pop(&mut self) {
        dispatch!(self, Elements, |v| drop(v.pop()), unknown => ())
    }
}

/// Borrowed read-only view of a datum's elements.
#[derive(Debug, Clone, Copy)]
pub enum BufferRef<'a> {
    Unknown,
    Integer(&'a [i32]),
    Float(&'a [f32]),
    String(&'a [String]),
    Vector(&'a [Vec4]),
    Matrix(&'a [Mat4]),
    Pointer(&'a [Pointer]),
    InternalTable(&'a [ScopeId]),
    ExternalTable(&'a [ScopeId]),
}

impl<'a> BufferRef<'a> {
    pub fn datum_type(&self) -> DatumType {
        match self {
            BufferRef::Unknown => DatumType::Unknown,
            BufferRef::Integer(_) => DatumType::Integer,
            BufferRef::Float(_) => DatumType::Float,
            BufferRef::String(_) => DatumType::String,
            BufferRef::Vector(_) => DatumType::Vector,
            BufferRef::Matrix(_) => DatumType::Matrix,
            BufferRef::Pointer(_) => DatumType::Pointer,
            BufferRef::InternalTable(_) => DatumType::InternalTable,
            BufferRef::ExternalTable(_) => DatumType::ExternalTable,
        }
    }

    pub fn len(&self) -> usize {
        dispatch!(self, BufferRef, |s| s.len(), unknown => 0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Scope ids held by a table of either ownership.
    pub fn scope_ids(&self) -> Option<&'a [ScopeId]> {
        match *self {
            BufferRef::InternalTable(ids) | BufferRef::ExternalTable(ids) => Some(ids),
            _ => None,
        }
    }

    /// Element-wise equality; the two table ownerships compare alike.
    pub(crate) fn elements_eq(&self, other: &BufferRef<'_>) -> bool {
        match (self, other) {
            (BufferRef::Unknown, BufferRef::Unknown) => true,
            (BufferRef::Integer(a), BufferRef::Integer(b)) => a == b,
            (BufferRef::Float(a), BufferRef::Float(b)) => a == b,
            (BufferRef::String(a), BufferRef::String(b)) => a == b,
            (BufferRef::Vector(a), BufferRef::Vector(b)) => a == b,
            (BufferRef::Matrix(a), BufferRef::Matrix(b)) => a == b,
            (BufferRef::Pointer(a), BufferRef::Pointer(b)) => a == b,
            (
                BufferRef::InternalTable(a) | BufferRef::ExternalTable(a),
                BufferRef::InternalTable(b) | BufferRef::ExternalTable(b),
            ) => a == b,
            _ => false,
        }
    }
}

/// Borrowed mutable view of a datum's elements. Never resized.
#[derive(Debug)]
pub enum BufferMut<'a> {
    Unknown,
    Integer(&'a mut [i32]),
    Float(&'a mut [f32]),
    String(&'a mut [String]),
    Vector(&'a mut [Vec4]),
    Matrix(&'a mut [Mat4]),
    Pointer(&'a mut [Pointer]),
    InternalTable(&'a mut [ScopeId]),
    ExternalTable(&'a mut [ScopeId]),
}

impl<'a> BufferMut<'a> {
    pub fn datum_type(&self) -> DatumType {
        self.as_ref().datum_type()
    }

    pub fn len(&self) -> usize {
        dispatch!(self, BufferMut, |s| s.len(), unknown => 0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn as_ref(&self) -> BufferRef<'_> {
        convert!(self, BufferMut => BufferRef, |s| &**s)
    }

    pub fn reborrow(&mut self) -> BufferMut<'_> {
        convert!(self, BufferMut => BufferMut, |s| &mut **s)
    }
}

/// Owned, growable storage of one datum.
///
/// Capacity is tracked here rather than read back from the vectors so that
/// it follows the growth policy exactly.
#[derive(Debug, Clone, Default)]
pub struct Buffer {
    pub(crate) elements: Elements,
    pub(crate) capacity: usize,
    pub(crate) policy: GrowthPolicy,
}

impl Buffer {
    pub(crate) fn new(policy: GrowthPolicy) -> Self {
        Self {
            elements: Elements::Unknown,
            capacity: 0,
            policy,
        }
    }

    pub(crate) fn typed(datum_type: DatumType, policy: GrowthPolicy) -> Self {
        Self {
            elements: Elements::empty(datum_type),
            capacity: 0,
            policy,
        }
    }

    pub(crate) fn from_elements(elements: Elements, policy: GrowthPolicy) -> Self {
        let capacity = elements.len();
        Self {
            elements,
            capacity,
            policy,
        }
    }

    pub(crate) fn datum_type(&self) -> DatumType {
        self.elements.datum_type()
    }

    pub(crate) fn len(&self) -> usize {
        self.elements.len()
    }

    pub(crate) fn reserve(&mut self, capacity: usize) -> Result<()> {
        if self.datum_type() == DatumType::Unknown {
            return Err(Error::UnknownType { operation: "reserve" });
        }
        if capacity > self.capacity {
            self.elements.reserve_exact(capacity - self.len());
            self.capacity = capacity;
        }
        Ok(())
    }

    pub(crate) fn resize(&mut self, size: usize) -> Result<()> {
        self.elements.resize(size)?;
        self.elements.shrink_to(size);
        self.capacity = size;
        Ok(())
    }

    pub(crate) fn shrink_to_fit(&mut self) {
        let size = self.len();
        self.elements.shrink_to(size);
        self.capacity = size;
    }

    pub(crate) fn clear(&mut self) {
        self.elements.clear();
    }

    pub(crate) fn pop(&mut self) {
        self.elements.pop();
    }

    // Grow per the policy when the next push would not fit.
    fn make_room(&mut self) -> Result<()> {
        let size = self.len();
        if size >= self.capacity {
            let required = size
                .checked_add(1)
                .ok_or(Error::CapacityOverflow { requested: size })?;
            let next = self.policy.next_capacity(self.capacity, required)?;
            trace!(from = self.capacity, to = next, "growing datum buffer");
            self.elements.reserve_exact(next - size);
            self.capacity = next;
        }
        Ok(())
    }

    /// Append one element, growing per the policy when full.
    pub(crate) fn push<E: Element>(&mut self, value: E) -> Result<()> {
        let actual = self.datum_type();
        if E::vec_mut(&mut self.elements).is_none() {
            return Err(Error::TypeMismatch {
                expected: E::TYPE,
                actual,
            });
        }

        self.make_room()?;
        if let Some(values) = E::vec_mut(&mut self.elements) {
            values.push(value);
        }
        Ok(())
    }

    /// Child scopes owned through this buffer; empty unless it is an owned table.
    pub(crate) fn owned_scopes(&self) -> &[ScopeId] {
        match &self.elements {
            Elements::InternalTable(ids) => ids,
            _ => &[],
        }
    }

    pub(crate) fn owned_scopes_mut(&mut self) -> &mut [ScopeId] {
        match &mut self.elements {
            Elements::InternalTable(ids) => ids,
            _ => &mut [],
        }
    }

    pub(crate) fn push_owned_scope(&mut self, child: ScopeId) -> Result<()> {
        let actual = self.datum_type();
        if actual != DatumType::InternalTable {
            return Err(Error::TypeMismatch {
                expected: DatumType::InternalTable,
                actual,
            });
        }

        self.make_room()?;
        if let Elements::InternalTable(ids) = &mut self.elements {
            ids.push(child);
        }
        Ok(())
    }

    pub(crate) fn remove_owned_scope(&mut self, child: ScopeId) -> bool {
        let Elements::InternalTable(ids) = &mut self.elements else {
            return false;
        };
        match ids.iter().position(|id| *id == child) {
            Some(position) => {
                ids.remove(position);
                true
            }
            None => false,
        }
    }
}

mod sealed {
    use super::Elements;

    pub trait Sealed: Sized {
        fn vec_mut(elements: &mut Elements) -> Option<&mut Vec<Self>>;
        fn into_elements(values: Vec<Self>) -> Elements;
    }
}

/// A value type that can be stored in a datum.
pub trait Element: sealed::Sealed + Clone + fmt::Debug + 'static {
    /// Type tag of datums holding this element.
    const TYPE: DatumType;

    fn slice<'a>(buffer: BufferRef<'a>) -> Option<&'a [Self]>;
    fn slice_mut<'a>(buffer: BufferMut<'a>) -> Option<&'a mut [Self]>;
    fn wrap(slice: &[Self]) -> BufferRef<'_>;
    fn wrap_mut(slice: &mut [Self]) -> BufferMut<'_>;
}

macro_rules! impl_element {
    ($ty:ty, $variant:ident) => {
        impl sealed::Sealed for $ty {
            fn vec_mut(elements: &mut Elements) -> Option<&mut Vec<Self>> {
                match elements {
                    Elements::$variant(values) => Some(values),
                    _ => None,
                }
            }

            fn into_elements(values: Vec<Self>) -> Elements {
                Elements::$variant(values)
            }
        }

        impl Element for $ty {
            const TYPE: DatumType = DatumType::$variant;

            fn slice<'a>(buffer: BufferRef<'a>) -> Option<&'a [Self]> {
                match buffer {
                    BufferRef::$variant(values) => Some(values),
                    _ => None,
                }
            }

            fn slice_mut<'a>(buffer: BufferMut<'a>) -> Option<&'a mut [Self]> {
                match buffer {
                    BufferMut::$variant(values) => Some(values),
                    _ => None,
                }
            }

            fn wrap(slice: &[Self]) -> BufferRef<'_> {
                BufferRef::$variant(slice)
            }

            fn wrap_mut(slice: &mut [Self]) -> BufferMut<'_> {
                BufferMut::$variant(slice)
            }
        }
    };
}

impl_element!(i32, Integer);
impl_element!(f32, Float);
impl_element!(String, String);
impl_element!(Vec4, Vector);
impl_element!(Mat4, Matrix);
impl_element!(Pointer, Pointer);

// Scope ids are readable from either table ownership, but only references
// may be written or pushed; owned children go through the arena.
impl sealed::Sealed for ScopeId {
    fn vec_mut(elements: &mut Elements) -> Option<&mut Vec<Self>> {
        match elements {
            Elements::ExternalTable(ids) => Some(ids),
            _ => None,
        }
    }

    fn into_elements(values: Vec<Self>) -> Elements {
        Elements::ExternalTable(values)
    }
}

impl Element for ScopeId {
    const TYPE: DatumType = DatumType::ExternalTable;

    fn slice<'a>(buffer: BufferRef<'a>) -> Option<&'a [Self]> {
        buffer.scope_ids()
    }

    fn slice_mut<'a>(buffer: BufferMut<'a>) -> Option<&'a mut [Self]> {
        match buffer {
            BufferMut::ExternalTable(ids) => Some(ids),
            _ => None,
        }
    }

    fn wrap(slice: &[Self]) -> BufferRef<'_> {
        BufferRef::ExternalTable(slice)
    }

    fn wrap_mut(slice: &mut [Self]) -> BufferMut<'_> {
        BufferMut::ExternalTable(slice)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_follows_growth_policy() {
        let mut buffer = Buffer::typed(DatumType::Integer, GrowthPolicy::default());
        buffer.push(1).unwrap();
        assert_eq!(buffer.capacity, 4);
        for i in 0..4 {
            buffer.push(i).unwrap();
        }
        assert_eq!(buffer.len(), 5);
        assert_eq!(buffer.capacity, 8);
    }

    #[test]
    fn test_push_wrong_type_leaves_buffer_untouched() {
        let mut buffer = Buffer::typed(DatumType::Float, GrowthPolicy::default());
        let err = buffer.push(3).unwrap_err();
        assert!(matches!(err, Error::TypeMismatch { .. }));
        assert_eq!(buffer.capacity, 0);
        assert_eq!(buffer.len(), 0);
    }

    #[test]
    fn test_resize_sets_capacity_to_size() {
        let mut buffer = Buffer::typed(DatumType::String, GrowthPolicy::default());
        buffer.reserve(10).unwrap();
        buffer.resize(3).unwrap();
        assert_eq!(buffer.len(), 3);
        assert_eq!(buffer.capacity, 3);
    }

    #[test]
    fn test_table_ownerships_compare_alike() {
        let ids: Vec<ScopeId> = Vec::new();
        let owned = BufferRef::InternalTable(&ids);
        let referenced = BufferRef::ExternalTable(&ids);
        assert!(owned.elements_eq(&referenced));
        assert!(!owned.elements_eq(&BufferRef::Integer(&[])));
    }

    #[test]
    fn test_scope_ids_only_writable_in_reference_tables() {
        let mut owned = Elements::empty(DatumType::Table);
        assert!(<ScopeId as sealed::Sealed>::vec_mut(&mut owned).is_none());

        let mut referenced = Elements::empty(DatumType::ExternalTable);
        assert!(<ScopeId as sealed::Sealed>::vec_mut(&mut referenced).is_some());
    }
}
