//! Attribute signatures and the traits native types implement to be reflected.

use std::any::Any;
use std::fmt;
use std::rc::Rc;

use crate::datum::{BufferMut, BufferRef, DatumType, Element};
use crate::math::{Mat4, Vec4};
use crate::rtti::Pointer;
use crate::scope::ScopeId;

/// Key of the reserved self-pointer attribute every attributed scope carries.
pub const THIS_KEY: &str = "this";

type Getter = Rc<dyn for<'x> Fn(&'x dyn Any) -> Option<BufferRef<'x>>>;
type Setter = Rc<dyn for<'x> Fn(&'x mut dyn Any) -> Option<BufferMut<'x>>>;

// Pin the higher-ranked signature so closures infer it.
fn getter<G>(get: G) -> G
where
    G: for<'x> Fn(&'x dyn Any) -> Option<BufferRef<'x>>,
{
    get
}

fn setter<S>(set: S) -> S
where
    S: for<'x> Fn(&'x mut dyn Any) -> Option<BufferMut<'x>>,
{
    set
}

#[derive(Clone)]
pub(crate) enum Binding {
    /// The node's own id.
    This,
    /// A member of the native object, reached through typed accessors.
    Field { get: Getter, set: Setter },
}

/// Declaration of one prescribed attribute of a reflected type.
#[derive(Clone)]
pub struct Signature {
    name: String,
    datum_type: DatumType,
    is_fixed_size: bool,
    count: usize,
    binding: Binding,
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signature")
            .field("name", &self.name)
            .field("datum_type", &self.datum_type)
            .field("is_fixed_size", &self.is_fixed_size)
            .field("count", &self.count)
            .finish_non_exhaustive()
    }
}

impl Signature {
    /// Bind attribute `name` to a member of `T`.
    ///
    /// Scalars and arrays are fixed-size; a `Vec` member is variable and
    /// its signature count is zero.
    pub fn field<T, F, G, S>(name: impl Into<String>, get: G, set: S) -> Self
    where
        T: Reflect,
        F: Field,
        G: Fn(&T) -> &F + 'static,
        S: Fn(&mut T) -> &mut F + 'static,
    {
        let read: Getter = Rc::new(getter(move |object| {
            object
                .downcast_ref::<T>()
                .map(|native| <F::Element as Element>::wrap(get(native).elements()))
        }));
        let write: Setter = Rc::new(setter(move |object| {
            object
                .downcast_mut::<T>()
                .map(|native| <F::Element as Element>::wrap_mut(set(native).elements_mut()))
        }));

        Self {
            name: name.into(),
            datum_type: <F::Element as Element>::TYPE,
            is_fixed_size: F::fixed_len().is_some(),
            count: F::fixed_len().unwrap_or(0),
            binding: Binding::Field {
                get: read,
                set: write,
            },
        }
    }

    pub(crate) fn this() -> Self {
        Self {
            name: THIS_KEY.to_string(),
            datum_type: DatumType::Pointer,
            is_fixed_size: true,
            count: 1,
            binding: Binding::This,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn datum_type(&self) -> DatumType {
        self.datum_type
    }

    pub fn is_fixed_size(&self) -> bool {
        self.is_fixed_size
    }

    /// Declared element count; zero for variable-length members.
    pub fn count(&self) -> usize {
        self.count
    }

    pub fn is_this(&self) -> bool {
        matches!(self.binding, Binding::This)
    }

    /// Elements of the bound member of `native`.
    pub(crate) fn read<'x>(&self, native: &'x dyn Any) -> Option<BufferRef<'x>> {
        match &self.binding {
            Binding::This => None,
            Binding::Field { get, .. } => get(native),
        }
    }

    pub(crate) fn write<'x>(&self, native: &'x mut dyn Any) -> Option<BufferMut<'x>> {
        match &self.binding {
            Binding::This => None,
            Binding::Field { set, .. } => set(native),
        }
    }

    /// Re-express a signature of `B` as one of `D`, reaching the member
    /// through `D`'s base.
    pub(crate) fn lift<D, B>(&self) -> Self
    where
        D: Inherits<B>,
        B: Reflect,
    {
        let binding = match &self.binding {
            Binding::This => Binding::This,
            Binding::Field { get, set } => {
                let (get, set) = (Rc::clone(get), Rc::clone(set));
                let read: Getter = Rc::new(getter(move |object| {
                    let derived = object.downcast_ref::<D>()?;
                    get(derived.base() as &dyn Any)
                }));
                let write: Setter = Rc::new(setter(move |object| {
                    let derived = object.downcast_mut::<D>()?;
                    set(derived.base_mut() as &mut dyn Any)
                }));
                Binding::Field {
                    get: read,
                    set: write,
                }
            }
        };
        Self {
            binding,
            ..self.clone()
        }
    }
}

/// A native type whose members are exposed as prescribed attributes.
pub trait Reflect: Any + Clone + Default + fmt::Debug {
    /// Name used in diagnostics and dumps.
    const TYPE_NAME: &'static str;

    /// Signatures declared by this type itself, excluding inherited ones
    /// and the self pointer.
    fn signatures() -> Vec<Signature>;
}

/// A reflected type that embeds a reflected base type.
pub trait Inherits<B: Reflect>: Reflect {
    fn base(&self) -> &B;
    fn base_mut(&mut self) -> &mut B;
}

/// A native member that can back an attribute.
pub trait Field: 'static {
    type Element: Element;

    /// Element count for fixed-size members, `None` for growable ones.
    fn fixed_len() -> Option<usize>;
    fn elements(&self) -> &[Self::Element];
    fn elements_mut(&mut self) -> &mut [Self::Element];
}

macro_rules! impl_field {
    ($($ty:ty),*) => {
        $(
            impl Field for $ty {
                type Element = $ty;

                fn fixed_len() -> Option<usize> {
                    Some(1)
                }

                fn elements(&self) -> &[$ty] {
                    std::slice::from_ref(self)
                }

                fn elements_mut(&mut self) -> &mut [$ty] {
                    std::slice::from_mut(self)
                }
            }

            impl<const N: usize> Field for [$ty; N] {
                type Element = $ty;

                fn fixed_len() -> Option<usize> {
                    Some(N)
                }

                fn elements(&self) -> &[$ty] {
                    self
                }

                fn elements_mut(&mut self) -> &mut [$ty] {
                    self
                }
            }

            impl Field for Vec<$ty> {
                type Element = $ty;

                fn fixed_len() -> Option<usize> {
                    None
                }

                fn elements(&self) -> &[$ty] {
                    self
                }

                fn elements_mut(&mut self) -> &mut [$ty] {
                    self
                }
            }
        )*
    };
}

impl_field!(i32, f32, String, Vec4, Mat4, Pointer, ScopeId);

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Default)]
    struct Sample {
        hits: i32,
        corners: [Vec4; 2],
        tags: Vec<String>,
    }

    impl Reflect for Sample {
        const TYPE_NAME: &'static str = "Sample";

        fn signatures() -> Vec<Signature> {
            vec![
                Signature::field("Hits", |s: &Sample| &s.hits, |s: &mut Sample| &mut s.hits),
                Signature::field(
                    "Corners",
                    |s: &Sample| &s.corners,
                    |s: &mut Sample| &mut s.corners,
                ),
                Signature::field("Tags", |s: &Sample| &s.tags, |s: &mut Sample| &mut s.tags),
            ]
        }
    }

    #[test]
    fn test_field_shapes() {
        let signatures = Sample::signatures();
        assert_eq!(signatures[0].datum_type(), DatumType::Integer);
        assert_eq!(signatures[0].count(), 1);
        assert_eq!(signatures[1].datum_type(), DatumType::Vector);
        assert_eq!(signatures[1].count(), 2);
        assert!(signatures[1].is_fixed_size());
        assert!(!signatures[2].is_fixed_size());
        assert_eq!(signatures[2].count(), 0);
    }

    #[test]
    fn test_accessors_alias_the_member() {
        let signatures = Sample::signatures();
        let mut sample = Sample {
            hits: 3,
            ..Sample::default()
        };

        if let Some(BufferMut::Integer(hits)) = signatures[0].write(&mut sample) {
            hits[0] = 9;
        }
        assert_eq!(sample.hits, 9);

        let read = signatures[0].read(&sample).unwrap();
        assert_eq!(read.len(), 1);
        assert!(signatures[0].read(&5u8).is_none());
    }

    #[test]
    fn test_this_signature() {
        let this = Signature::this();
        assert!(this.is_this());
        assert_eq!(this.name(), THIS_KEY);
        assert_eq!(this.datum_type(), DatumType::Pointer);
    }
}
