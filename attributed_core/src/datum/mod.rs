//! Datum - a single named slot's value storage.
//!
//! A datum is a runtime-typed array of one element type. It either owns a
//! growable buffer or borrows memory it must never resize:
//!
//! - **Owned**: standalone datum, grows per its [`GrowthPolicy`]
//! - **Internal view**: growable view of an entry owned by a scope
//! - **External**: borrowed slice, optionally read-only
//!
//! The borrowed forms carry the lifetime of the memory they alias, so a
//! datum cannot outlive the member it is bound to.

mod buffer;
mod text;
mod types;

pub(crate) use buffer::Buffer;
pub use buffer::{BufferMut, BufferRef, Element};
pub use text::{format_matrix, format_vector, parse_float, parse_integer, parse_matrix, parse_vector};
pub use types::{DatumType, Ownership};

use std::fmt;

use buffer::Elements;

use crate::config::GrowthPolicy;
use crate::error::{Error, Result};
use crate::math::{Mat4, Vec4};
use crate::rtti::Pointer;
use crate::scope::ScopeId;

#[derive(Debug)]
enum Storage<'a> {
    Owned(Buffer),
    Internal(&'a mut Buffer),
    InternalView(&'a Buffer),
    External(BufferMut<'a>),
    ExternalConst(BufferRef<'a>),
}

/// Runtime-typed value slot.
#[derive(Debug)]
pub struct Datum<'a> {
    storage: Storage<'a>,
}

impl Default for Datum<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> Datum<'a> {
    /// Create an empty datum of unknown type.
    pub fn new() -> Self {
        Self::with_policy(GrowthPolicy::default())
    }

    /// Create an empty datum of the given type.
    pub fn with_type(datum_type: DatumType) -> Self {
        Self::from_buffer(Buffer::typed(datum_type, GrowthPolicy::default()))
    }

    /// Create an empty datum that grows according to `policy`.
    pub fn with_policy(policy: GrowthPolicy) -> Self {
        Self::from_buffer(Buffer::new(policy))
    }

    /// Create an owned datum holding `values`.
    pub fn from_values<E: Element>(values: Vec<E>) -> Self {
        Self::from_buffer(Buffer::from_elements(
            E::into_elements(values),
            GrowthPolicy::default(),
        ))
    }

    pub(crate) fn from_buffer(buffer: Buffer) -> Self {
        Self {
            storage: Storage::Owned(buffer),
        }
    }

    pub(crate) fn internal(buffer: &'a mut Buffer) -> Self {
        Self {
            storage: Storage::Internal(buffer),
        }
    }

    pub(crate) fn internal_view(buffer: &'a Buffer) -> Self {
        Self {
            storage: Storage::InternalView(buffer),
        }
    }

    /// Bind to borrowed mutable memory.
    pub fn external(buffer: BufferMut<'a>) -> Self {
        Self {
            storage: Storage::External(buffer),
        }
    }

    /// Bind to borrowed read-only memory.
    pub fn external_const(buffer: BufferRef<'a>) -> Self {
        Self {
            storage: Storage::ExternalConst(buffer),
        }
    }

    /// Read-only view of the elements, whatever the storage.
    pub fn elements(&self) -> BufferRef<'_> {
        match &self.storage {
            Storage::Owned(buffer) => buffer.elements.as_ref(),
            Storage::Internal(buffer) => buffer.elements.as_ref(),
            Storage::InternalView(buffer) => buffer.elements.as_ref(),
            Storage::External(buffer) => buffer.as_ref(),
            Storage::ExternalConst(buffer) => *buffer,
        }
    }

    fn elements_mut(&mut self, operation: &'static str) -> Result<BufferMut<'_>> {
        match &mut self.storage {
            Storage::Owned(buffer) => Ok(buffer.elements.as_mut()),
            Storage::Internal(buffer) => Ok(buffer.elements.as_mut()),
            Storage::External(buffer) => Ok(buffer.reborrow()),
            Storage::InternalView(_) | Storage::ExternalConst(_) => {
                Err(Error::ConstStorage { operation })
            }
        }
    }

    fn owned_buffer(&mut self, operation: &'static str) -> Result<&mut Buffer> {
        match &mut self.storage {
            Storage::Owned(buffer) => Ok(buffer),
            Storage::Internal(buffer) => Ok(&mut **buffer),
            Storage::InternalView(_) => Err(Error::ConstStorage { operation }),
            Storage::External(_) | Storage::ExternalConst(_) => {
                Err(Error::ExternalStorage { operation })
            }
        }
    }

    // Owned buffer that is allowed to drop or reorder elements.
    fn resizable_buffer(&mut self, operation: &'static str) -> Result<&mut Buffer> {
        let buffer = self.owned_buffer(operation)?;
        if buffer.datum_type() == DatumType::InternalTable {
            return Err(Error::TableStorage { operation });
        }
        Ok(buffer)
    }

    /// Current type; `Unknown` until set or first pushed to.
    pub fn datum_type(&self) -> DatumType {
        self.elements().datum_type()
    }

    /// Set the type of an unset datum.
    ///
    /// Setting the type it already has is a no-op; any other change fails.
    pub fn set_type(&mut self, datum_type: DatumType) -> Result<()> {
        let current = self.datum_type();
        if current != DatumType::Unknown {
            if current == datum_type || (datum_type == DatumType::Table && current.is_table()) {
                return Ok(());
            }
            return Err(Error::TypeAlreadySet {
                current,
                requested: datum_type,
            });
        }
        if datum_type == DatumType::Unknown {
            return Ok(());
        }
        let buffer = self.owned_buffer("set the type of")?;
        buffer.elements = Elements::empty(datum_type);
        Ok(())
    }

    /// Number of elements.
    pub fn size(&self) -> usize {
        self.elements().len()
    }

    /// Whether the datum holds no elements.
    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    /// Allocated element slots; borrowed memory reports its length.
    pub fn capacity(&self) -> usize {
        match &self.storage {
            Storage::Owned(buffer) => buffer.capacity,
            Storage::Internal(buffer) => buffer.capacity,
            Storage::InternalView(buffer) => buffer.capacity,
            Storage::External(buffer) => buffer.len(),
            Storage::ExternalConst(buffer) => buffer.len(),
        }
    }

    /// Who owns the memory behind the elements.
    pub fn ownership(&self) -> Ownership {
        match &self.storage {
            Storage::Owned(_) | Storage::Internal(_) | Storage::InternalView(_) => {
                Ownership::Internal
            }
            Storage::External(_) => Ownership::External,
            Storage::ExternalConst(_) => Ownership::ExternalConst,
        }
    }

    /// Whether the elements are borrowed and therefore fixed in size.
    pub fn is_external(&self) -> bool {
        self.ownership() != Ownership::Internal
    }

    /// Whether mutation through this datum is forbidden.
    pub fn is_const(&self) -> bool {
        matches!(
            self.storage,
            Storage::InternalView(_) | Storage::ExternalConst(_)
        )
    }

    /// Growth policy of owned storage; borrowed storage never grows.
    pub fn policy(&self) -> Option<GrowthPolicy> {
        match &self.storage {
            Storage::Owned(buffer) => Some(buffer.policy),
            Storage::Internal(buffer) => Some(buffer.policy),
            Storage::InternalView(buffer) => Some(buffer.policy),
            Storage::External(_) | Storage::ExternalConst(_) => None,
        }
    }

    /// Ensure room for at least `capacity` elements.
    pub fn reserve(&mut self, capacity: usize) -> Result<()> {
        self.owned_buffer("reserve")?.reserve(capacity)
    }

    /// Resize to exactly `size` elements; capacity becomes `size` as well.
    pub fn resize(&mut self, size: usize) -> Result<()> {
        self.resizable_buffer("resize")?.resize(size)
    }

    /// Drop unused capacity so that it equals the size.
    pub fn shrink_to_fit(&mut self) -> Result<()> {
        self.owned_buffer("shrink")?.shrink_to_fit();
        Ok(())
    }

    /// Remove all elements, keeping type and capacity.
    pub fn clear(&mut self) -> Result<()> {
        let buffer = self.owned_buffer("clear")?;
        if buffer.datum_type() == DatumType::InternalTable && buffer.len() > 0 {
            return Err(Error::TableStorage { operation: "clear" });
        }
        buffer.clear();
        Ok(())
    }

    /// Remove the last element, if any.
    pub fn pop_back(&mut self) -> Result<()> {
        self.resizable_buffer("pop from")?.pop();
        Ok(())
    }

    /// Append an element, setting the type first if it is unknown.
    pub fn push_back<E: Element>(&mut self, value: E) -> Result<()> {
        let buffer = self.owned_buffer("push to")?;
        let actual = buffer.datum_type();
        if actual == DatumType::Unknown {
            buffer.elements = Elements::empty(E::TYPE);
        } else if actual == DatumType::InternalTable && E::TYPE.is_table() {
            return Err(Error::TableStorage { operation: "push to" });
        }
        buffer.push(value)
    }

    /// Rebind to caller-supplied memory, discarding owned data.
    ///
    /// The datum never resizes or frees `data` afterwards.
    pub fn set_storage<E: Element>(&mut self, data: &'a mut [E]) -> Result<()> {
        self.check_rebind(E::TYPE)?;
        self.storage = Storage::External(E::wrap_mut(data));
        Ok(())
    }

    /// Rebind to caller-supplied read-only memory, discarding owned data.
    pub fn set_storage_const<E: Element>(&mut self, data: &'a [E]) -> Result<()> {
        self.check_rebind(E::TYPE)?;
        self.storage = Storage::ExternalConst(E::wrap(data));
        Ok(())
    }

    fn check_rebind(&self, datum_type: DatumType) -> Result<()> {
        if matches!(
            self.storage,
            Storage::Internal(_) | Storage::InternalView(_)
        ) {
            return Err(Error::EntryView { operation: "rebind" });
        }
        let current = self.datum_type();
        if current != DatumType::Unknown && current.apparent() != datum_type.apparent() {
            return Err(Error::TypeMismatch {
                expected: datum_type,
                actual: current,
            });
        }
        Ok(())
    }

    /// All elements as a typed slice.
    pub fn as_slice<E: Element>(&self) -> Result<&[E]> {
        let actual = self.datum_type();
        E::slice(self.elements()).ok_or(Error::TypeMismatch {
            expected: E::TYPE,
            actual,
        })
    }

    /// Element at `index`.
    pub fn get<E: Element>(&self, index: usize) -> Result<&E> {
        let values = self.as_slice::<E>()?;
        values.get(index).ok_or(Error::IndexOutOfRange {
            index,
            size: values.len(),
        })
    }

    /// Mutable element at `index`; fails on read-only storage.
    pub fn get_mut<E: Element>(&mut self, index: usize) -> Result<&mut E> {
        let actual = self.datum_type();
        let buffer = self.elements_mut("modify")?;
        let values = E::slice_mut(buffer).ok_or(if actual == DatumType::InternalTable && E::TYPE.is_table() {
            Error::TableStorage { operation: "modify" }
        } else {
            Error::TypeMismatch {
                expected: E::TYPE,
                actual,
            }
        })?;
        let size = values.len();
        values
            .get_mut(index)
            .ok_or(Error::IndexOutOfRange { index, size })
    }

    /// Overwrite the element at `index`.
    pub fn set<E: Element>(&mut self, index: usize, value: E) -> Result<()> {
        *self.get_mut(index)? = value;
        Ok(())
    }

    /// First element.
    pub fn front<E: Element>(&self) -> Result<&E> {
        self.get(0)
    }

    /// Last element.
    pub fn back<E: Element>(&self) -> Result<&E> {
        let size = self.as_slice::<E>()?.len();
        self.get(size.checked_sub(1).ok_or(Error::IndexOutOfRange { index: 0, size })?)
    }

    /// Mutable first element.
    pub fn front_mut<E: Element>(&mut self) -> Result<&mut E> {
        self.get_mut(0)
    }

    /// Mutable last element.
    pub fn back_mut<E: Element>(&mut self) -> Result<&mut E> {
        let size = self.as_slice::<E>()?.len();
        self.get_mut(size.checked_sub(1).ok_or(Error::IndexOutOfRange { index: 0, size })?)
    }

    fn check_index(&self, index: usize) -> Result<()> {
        let size = self.size();
        if index >= size {
            return Err(Error::IndexOutOfRange { index, size });
        }
        Ok(())
    }

    /// Truthiness of the element at `index`.
    ///
    /// Numbers are true when nonzero (floats beyond epsilon), strings when
    /// non-empty and not `"false"`, pointers and references when non-null.
    /// Vectors, matrices and owned tables are always true.
    pub fn is_true(&self, index: usize) -> Result<bool> {
        let elements = self.elements();
        if elements.datum_type() == DatumType::Unknown {
            return Err(Error::UnknownType { operation: "test" });
        }
        self.check_index(index)?;
        let truth = match elements {
            BufferRef::Integer(values) => values[index] != 0,
            BufferRef::Float(values) => values[index].abs() > f32::EPSILON,
            BufferRef::String(values) => !values[index].is_empty() && values[index] != "false",
            BufferRef::Pointer(values) => !values[index].is_null(),
            BufferRef::ExternalTable(ids) => !ids[index].is_null(),
            _ => true,
        };
        Ok(truth)
    }

    /// Render the element at `index` in its textual format.
    pub fn to_string_at(&self, index: usize) -> Result<String> {
        if self.datum_type() == DatumType::Unknown {
            return Err(Error::UnknownType { operation: "format" });
        }
        self.check_index(index)?;
        text::format_element(self.elements(), index).ok_or(Error::IndexOutOfRange {
            index,
            size: self.size(),
        })
    }

    /// Parse `input` per the datum's type and store it at `index`.
    pub fn set_from_string(&mut self, index: usize, input: &str) -> Result<()> {
        match self.datum_type() {
            DatumType::Integer => self.set(index, text::parse_integer(input)?),
            DatumType::Float => self.set(index, text::parse_float(input)?),
            DatumType::String => self.set(index, input.to_string()),
            DatumType::Vector => self.set(index, text::parse_vector(input)?),
            DatumType::Matrix => self.set(index, text::parse_matrix(input)?),
            DatumType::Unknown => Err(Error::UnknownType { operation: "parse into" }),
            other => Err(Error::Parse {
                input: input.to_string(),
                expected: other,
            }),
        }
    }

    /// Parse `input` per the datum's type and append it.
    pub fn push_back_from_string(&mut self, input: &str) -> Result<()> {
        match self.datum_type() {
            DatumType::Integer => self.push_back(text::parse_integer(input)?),
            DatumType::Float => self.push_back(text::parse_float(input)?),
            DatumType::String => self.push_back(input.to_string()),
            DatumType::Vector => self.push_back(text::parse_vector(input)?),
            DatumType::Matrix => self.push_back(text::parse_matrix(input)?),
            DatumType::Unknown => Err(Error::UnknownType { operation: "parse into" }),
            other => Err(Error::Parse {
                input: input.to_string(),
                expected: other,
            }),
        }
    }

    /// Parse one element of `datum_type` into a new owned datum.
    pub fn parse(datum_type: DatumType, input: &str) -> Result<Self> {
        let mut datum = Self::with_type(datum_type);
        datum.push_back_from_string(input)?;
        Ok(datum)
    }

    /// Deep copy into an owned datum.
    ///
    /// Owned tables copy as references; the copy does not own the scopes.
    pub fn to_owned_datum(&self) -> Datum<'static> {
        let elements = match self.elements() {
            BufferRef::InternalTable(ids) => Elements::ExternalTable(ids.to_vec()),
            other => Elements::from_ref(other),
        };
        Datum::from_buffer(Buffer::from_elements(
            elements,
            self.policy().unwrap_or_default(),
        ))
    }
}

impl<'a, 'b> PartialEq<Datum<'b>> for Datum<'a> {
    /// Equal apparent type, equal size, equal elements.
    fn eq(&self, other: &Datum<'b>) -> bool {
        self.datum_type().apparent() == other.datum_type().apparent()
            && self.size() == other.size()
            && self.elements().elements_eq(&other.elements())
    }
}

impl fmt::Display for Datum<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let elements = self.elements();
        if elements.datum_type() == DatumType::Unknown {
            return write!(f, "<unknown>");
        }
        let rendered: Vec<String> = (0..elements.len())
            .filter_map(|i| text::format_element(elements, i))
            .collect();
        match rendered.as_slice() {
            [single] => write!(f, "{single}"),
            _ => write!(f, "[{}]", rendered.join(", ")),
        }
    }
}

macro_rules! impl_from_element {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Datum<'_> {
                fn from(value: $ty) -> Self {
                    Datum::from_values(vec![value])
                }
            }

            impl From<Vec<$ty>> for Datum<'_> {
                fn from(values: Vec<$ty>) -> Self {
                    Datum::from_values(values)
                }
            }
        )*
    };
}

impl_from_element!(i32, f32, String, Vec4, Mat4, Pointer, ScopeId);

impl From<&str> for Datum<'_> {
    fn from(value: &str) -> Self {
        Datum::from(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rtti::tests::Token;

    #[test]
    fn test_new_datum_is_unknown() {
        let datum = Datum::new();
        assert_eq!(datum.datum_type(), DatumType::Unknown);
        assert_eq!(datum.size(), 0);
        assert_eq!(datum.capacity(), 0);
        assert!(!datum.is_external());
    }

    #[test]
    fn test_set_type_once() {
        let mut datum = Datum::new();
        datum.set_type(DatumType::Integer).unwrap();
        datum.set_type(DatumType::Integer).unwrap();
        assert_eq!(datum.datum_type(), DatumType::Integer);

        let err = datum.set_type(DatumType::Float).unwrap_err();
        assert!(matches!(err, Error::TypeAlreadySet { .. }));
        assert_eq!(datum.datum_type(), DatumType::Integer);
    }

    #[test]
    fn test_set_table_type_is_internal() {
        let mut datum = Datum::new();
        datum.set_type(DatumType::Table).unwrap();
        assert_eq!(datum.datum_type(), DatumType::InternalTable);
        datum.set_type(DatumType::Table).unwrap();
        assert!(datum.set_type(DatumType::ExternalTable).is_err());
    }

    #[test]
    fn test_push_back_sets_type_and_grows() {
        let mut datum = Datum::new();
        datum.push_back(10).unwrap();
        datum.push_back(20).unwrap();
        assert_eq!(datum.datum_type(), DatumType::Integer);
        assert_eq!(datum.size(), 2);
        assert_eq!(datum.capacity(), 4);
        assert_eq!(*datum.front::<i32>().unwrap(), 10);
        assert_eq!(*datum.back::<i32>().unwrap(), 20);

        let err = datum.push_back(1.5f32).unwrap_err();
        assert!(matches!(err, Error::TypeMismatch { .. }));
        assert_eq!(datum.size(), 2);
    }

    #[test]
    fn test_resize_matches_capacity() {
        for size in [0, 1, 7, 100] {
            let mut datum = Datum::with_type(DatumType::Float);
            datum.push_back(1.0f32).unwrap();
            datum.resize(size).unwrap();
            assert_eq!(datum.size(), size);
            assert_eq!(datum.capacity(), datum.size());
        }
    }

    #[test]
    fn test_reference_table_resize_fills_null() {
        let target = ScopeId::new(0, 0);
        let mut datum = Datum::from(vec![target]);
        datum.resize(3).unwrap();
        assert_eq!(datum.size(), 3);
        assert_eq!(datum.capacity(), 3);
        assert!(datum.get::<ScopeId>(2).unwrap().is_null());
        assert!(datum.is_true(0).unwrap());
        assert!(!datum.is_true(1).unwrap());
        assert_eq!(datum.to_string_at(1).unwrap(), "scope:null");

        datum.resize(1).unwrap();
        assert_eq!(datum.get::<ScopeId>(0).unwrap(), &target);
    }

    #[test]
    fn test_resize_unknown_fails() {
        let mut datum = Datum::new();
        assert!(matches!(
            datum.resize(3),
            Err(Error::UnknownType { .. })
        ));
    }

    #[test]
    fn test_reserve_and_shrink() {
        let mut datum = Datum::with_type(DatumType::String);
        datum.reserve(16).unwrap();
        assert_eq!(datum.capacity(), 16);
        datum.reserve(2).unwrap();
        assert_eq!(datum.capacity(), 16);

        datum.push_back("a".to_string()).unwrap();
        datum.shrink_to_fit().unwrap();
        assert_eq!(datum.capacity(), 1);
    }

    #[test]
    fn test_clear_and_pop() {
        let mut datum = Datum::from(vec![1, 2, 3]);
        datum.pop_back().unwrap();
        assert_eq!(datum.as_slice::<i32>().unwrap(), &[1, 2]);

        let capacity = datum.capacity();
        datum.clear().unwrap();
        assert!(datum.is_empty());
        assert_eq!(datum.capacity(), capacity);

        datum.pop_back().unwrap();
        assert!(datum.is_empty());
    }

    #[test]
    fn test_external_storage_cannot_resize() {
        let mut members = [1, 2, 3];
        let mut datum = Datum::new();
        datum.set_storage(&mut members[..]).unwrap();
        assert!(datum.is_external());
        assert_eq!(datum.ownership(), Ownership::External);

        assert!(matches!(datum.clear(), Err(Error::ExternalStorage { .. })));
        assert!(matches!(datum.push_back(4), Err(Error::ExternalStorage { .. })));
        assert!(matches!(datum.pop_back(), Err(Error::ExternalStorage { .. })));
        assert!(matches!(datum.resize(1), Err(Error::ExternalStorage { .. })));
        assert!(matches!(datum.reserve(10), Err(Error::ExternalStorage { .. })));
        assert_eq!(datum.size(), 3);
        assert_eq!(datum.capacity(), 3);

        datum.set(1, 20).unwrap();
        drop(datum);
        assert_eq!(members, [1, 20, 3]);
    }

    #[test]
    fn test_external_const_is_read_only() {
        let members = [Vec4::new(1.0, 2.0, 3.0, 4.0)];
        let mut datum = Datum::new();
        datum.set_storage_const(&members[..]).unwrap();
        assert!(datum.is_const());
        assert_eq!(*datum.get::<Vec4>(0).unwrap(), members[0]);
        assert!(matches!(
            datum.set(0, Vec4::ZERO),
            Err(Error::ConstStorage { .. })
        ));
    }

    #[test]
    fn test_set_storage_discards_owned_data() {
        let mut members = [7, 8];
        let mut datum = Datum::from(vec![1, 2, 3, 4, 5]);
        datum.set_storage(&mut members[..]).unwrap();
        assert_eq!(datum.as_slice::<i32>().unwrap(), &[7, 8]);
    }

    #[test]
    fn test_set_storage_type_mismatch() {
        let mut members = [1.0f32];
        let mut datum = Datum::with_type(DatumType::Integer);
        let err = datum.set_storage(&mut members[..]).unwrap_err();
        assert!(matches!(err, Error::TypeMismatch { .. }));
    }

    #[test]
    fn test_type_and_range_errors_are_distinct() {
        let datum = Datum::from(vec![1, 2]);
        let wrong_type = datum.get::<String>(0).unwrap_err();
        let wrong_index = datum.get::<i32>(2).unwrap_err();
        assert!(matches!(wrong_type, Error::TypeMismatch { .. }));
        assert!(matches!(wrong_index, Error::IndexOutOfRange { index: 2, size: 2 }));
    }

    #[test]
    fn test_front_back_on_empty() {
        let datum = Datum::with_type(DatumType::Integer);
        assert!(matches!(
            datum.back::<i32>(),
            Err(Error::IndexOutOfRange { .. })
        ));
        assert!(matches!(
            datum.front::<i32>(),
            Err(Error::IndexOutOfRange { .. })
        ));
    }

    #[test]
    fn test_string_round_trip() {
        let vector = Vec4::new(1.5, -2.0, 0.25, 8.0);
        let mut datum = Datum::from(vector);
        let text = datum.to_string_at(0).unwrap();
        datum.set(0, Vec4::ZERO).unwrap();
        datum.set_from_string(0, &text).unwrap();
        assert_eq!(*datum.get::<Vec4>(0).unwrap(), vector);

        let matrix = Mat4::from_translation(1.0, 2.0, 3.0);
        let mut datum = Datum::from(matrix);
        let text = datum.to_string_at(0).unwrap();
        datum.set(0, Mat4::ZERO).unwrap();
        datum.set_from_string(0, &text).unwrap();
        assert_eq!(*datum.get::<Mat4>(0).unwrap(), matrix);

        let mut datum = Datum::from(3.75f32);
        let text = datum.to_string_at(0).unwrap();
        datum.set_from_string(0, &text).unwrap();
        assert_eq!(*datum.get::<f32>(0).unwrap(), 3.75);
    }

    #[test]
    fn test_parse_failure_keeps_value() {
        let mut datum = Datum::from(5);
        let err = datum.set_from_string(0, "five").unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::InvalidArgument);
        assert_eq!(*datum.get::<i32>(0).unwrap(), 5);
    }

    #[test]
    fn test_push_back_from_string() {
        let mut datum = Datum::with_type(DatumType::Vector);
        datum.push_back_from_string("vector<1|2|3|4>").unwrap();
        assert_eq!(*datum.get::<Vec4>(0).unwrap(), Vec4::new(1.0, 2.0, 3.0, 4.0));

        let mut pointers = Datum::with_type(DatumType::Pointer);
        assert!(pointers.push_back_from_string("null").is_err());
    }

    #[test]
    fn test_parse_new_datum() {
        let datum = Datum::parse(DatumType::Integer, "-17").unwrap();
        assert_eq!(datum.get::<i32>(0).unwrap(), &-17);
        assert_eq!(datum.size(), 1);

        let err = Datum::parse(DatumType::Float, "fast").unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::InvalidArgument);
    }

    #[test]
    fn test_truthiness() {
        let ints = Datum::from(vec![0, 3]);
        assert!(!ints.is_true(0).unwrap());
        assert!(ints.is_true(1).unwrap());

        let floats = Datum::from(vec![0.0f32, f32::EPSILON / 2.0, 0.5]);
        assert!(!floats.is_true(0).unwrap());
        assert!(!floats.is_true(1).unwrap());
        assert!(floats.is_true(2).unwrap());

        let strings = Datum::from(vec![String::new(), "false".into(), "yes".into()]);
        assert!(!strings.is_true(0).unwrap());
        assert!(!strings.is_true(1).unwrap());
        assert!(strings.is_true(2).unwrap());

        let pointers = Datum::from(vec![Pointer::Null, Pointer::object(Token(1))]);
        assert!(!pointers.is_true(0).unwrap());
        assert!(pointers.is_true(1).unwrap());

        assert!(Datum::from(Vec4::ZERO).is_true(0).unwrap());
        assert!(Datum::from(Mat4::ZERO).is_true(0).unwrap());
        assert!(matches!(ints.is_true(5), Err(Error::IndexOutOfRange { .. })));
    }

    #[test]
    fn test_equality() {
        assert_eq!(Datum::from(vec![1, 2]), Datum::from(vec![1, 2]));
        assert_ne!(Datum::from(vec![1, 2]), Datum::from(vec![1]));
        assert_ne!(Datum::from(1), Datum::from(1.0f32));
        assert_eq!(Datum::new(), Datum::new());

        let mut members = [1, 2];
        let mut external = Datum::new();
        external.set_storage(&mut members[..]).unwrap();
        assert_eq!(external, Datum::from(vec![1, 2]));

        let a = Datum::from(Pointer::object(Token(4)));
        let b = Datum::from(Pointer::object(Token(4)));
        assert_eq!(a, b);
    }

    #[test]
    fn test_to_owned_datum_copies_external() {
        let mut members = [String::from("x")];
        let mut external = Datum::new();
        external.set_storage(&mut members[..]).unwrap();

        let mut copy = external.to_owned_datum();
        assert!(!copy.is_external());
        copy.push_back("y".to_string()).unwrap();
        assert_eq!(copy.size(), 2);
        assert_eq!(external.size(), 1);
    }

    #[test]
    fn test_display() {
        assert_eq!(Datum::from(5).to_string(), "5");
        assert_eq!(Datum::from(vec![1, 2]).to_string(), "[1, 2]");
        assert_eq!(Datum::new().to_string(), "<unknown>");
        assert_eq!(Datum::from("hi").to_string(), "hi");
    }

    #[test]
    fn test_custom_growth_policy() {
        let mut datum = Datum::with_policy(GrowthPolicy::Exact);
        for i in 0..3 {
            datum.push_back(i).unwrap();
        }
        assert_eq!(datum.capacity(), 3);
    }
}
