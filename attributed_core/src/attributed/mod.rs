//! Attributed scopes - native objects whose members are also scope entries.
//!
//! An [`Attributed<T>`] node owns a native `T` and a [`Scope`]. Its first
//! entries are the prescribed attributes declared by `T`'s signatures; they
//! hold no storage of their own and resolve to `T`'s members on every
//! access, so writes through either side are seen by the other. Entries
//! appended later are auxiliary and behave like ordinary scope entries.

mod registry;
mod signature;

pub use registry::SignatureRegistry;
pub use signature::{Field, Inherits, Reflect, Signature, THIS_KEY};

use std::any::{Any, TypeId};
use std::rc::Rc;

use tracing::warn;

use crate::datum::{Datum, Element};
use crate::error::{Error, Result};
use crate::rtti::Pointer;
use crate::scope::{Scope, ScopeArena, ScopeId, ScopeObject, Slot};

/// Scope node reflecting a native `T`.
#[derive(Debug, Clone)]
pub struct Attributed<T: Reflect> {
    scope: Scope,
    native: T,
    this: [Pointer; 1],
    signatures: Rc<[Signature]>,
}

impl<T: Reflect> Attributed<T> {
    /// Wrap `native`, binding one entry per registered signature of `T`.
    pub fn new(registry: &SignatureRegistry, native: T) -> Result<Self> {
        let signatures = registry
            .shared_signatures(TypeId::of::<T>())
            .ok_or_else(|| {
                warn!(type_name = T::TYPE_NAME, "constructing an unregistered type");
                Error::UnregisteredType {
                    type_name: T::TYPE_NAME,
                }
            })?;

        for signature in signatures.iter().filter(|s| s.is_fixed_size()) {
            let Some(elements) = signature.read(&native) else {
                continue;
            };
            if elements.len() != signature.count() {
                return Err(Error::FieldLength {
                    name: signature.name().to_string(),
                    declared: signature.count(),
                    actual: elements.len(),
                });
            }
        }

        Ok(Self {
            scope: Self::prescribed_scope(&signatures),
            native,
            this: [Pointer::Null],
            signatures,
        })
    }

    fn prescribed_scope(signatures: &[Signature]) -> Scope {
        let mut scope = Scope::new();
        for (index, signature) in signatures.iter().enumerate() {
            scope.push_bound(signature.name(), index);
        }
        scope
    }

    /// Wrapped native object.
    pub fn native(&self) -> &T {
        &self.native
    }

    /// Mutable wrapped native object.
    pub fn native_mut(&mut self) -> &mut T {
        &mut self.native
    }

    /// Unwrap the native object.
    pub fn into_native(self) -> T {
        self.native
    }

    /// Full signature list, self pointer first.
    pub fn signatures(&self) -> &[Signature] {
        &self.signatures
    }

    /// Number of prescribed attributes, including the self pointer.
    pub fn prescribed_count(&self) -> usize {
        self.signatures.len()
    }

    fn bound_signature(&self, index: usize) -> Option<Option<&Signature>> {
        match self.scope.slot(index)? {
            Slot::Stored(_) => Some(None),
            Slot::Bound(signature) => Some(self.signatures.get(*signature)),
        }
    }
}

impl<T: Reflect> ScopeObject for Attributed<T> {
    fn scope(&self) -> &Scope {
        &self.scope
    }

    fn scope_mut(&mut self) -> &mut Scope {
        &mut self.scope
    }

    fn type_name(&self) -> &'static str {
        T::TYPE_NAME
    }

    fn datum(&self, index: usize) -> Option<Datum<'_>> {
        match self.bound_signature(index)? {
            None => self.scope.datum(index),
            Some(signature) if signature.is_this() => {
                Some(Datum::external_const(Pointer::wrap(&self.this)))
            }
            Some(signature) => signature.read(&self.native).map(Datum::external_const),
        }
    }

    fn datum_mut(&mut self, index: usize) -> Option<Datum<'_>> {
        let bound = match self.scope.slot(index)? {
            Slot::Stored(_) => None,
            Slot::Bound(signature) => Some(*signature),
        };
        let Some(bound) = bound else {
            return self.scope.datum_mut(index);
        };
        let signature = self.signatures.get(bound)?;
        if signature.is_this() {
            return Some(Datum::external_const(Pointer::wrap(&self.this)));
        }
        signature.write(&mut self.native).map(Datum::external)
    }

    fn clone_object(&self) -> Box<dyn ScopeObject> {
        Box::new(self.clone())
    }

    fn empty_like(&self) -> Box<dyn ScopeObject> {
        let mut scope = Self::prescribed_scope(&self.signatures);
        scope.set_policy(self.scope.policy());
        Box::new(Self {
            scope,
            native: T::default(),
            this: [Pointer::Null],
            signatures: Rc::clone(&self.signatures),
        })
    }

    fn payload_eq(&self, other: &dyn ScopeObject) -> bool {
        other.as_any().is::<Self>()
    }

    fn bind_id(&mut self, id: ScopeId) {
        self.this[0] = Pointer::Scope(id);
    }

    fn is_self_reference(&self, index: usize) -> bool {
        matches!(self.bound_signature(index), Some(Some(signature)) if signature.is_this())
    }

    fn signatures(&self) -> Option<&[Signature]> {
        Some(&self.signatures)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Which entries of an attributed scope a walk visits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Attributes {
    Prescribed,
    Auxiliary,
    All,
}

impl ScopeArena {
    /// Create a parentless attributed scope around `native`.
    pub fn create_attributed<T: Reflect>(
        &mut self,
        registry: &SignatureRegistry,
        native: T,
    ) -> Result<ScopeId> {
        let mut attributed = Attributed::new(registry, native)?;
        attributed.scope.set_policy(self.config().growth);
        Ok(self.insert(Box::new(attributed)))
    }

    /// Native object of the attributed scope at `id`.
    pub fn native<T: Reflect>(&self, id: ScopeId) -> Result<&T> {
        self.downcast_ref::<Attributed<T>>(id)
            .map(Attributed::native)
            .ok_or(Error::NotAttributed(id))
    }

    /// Mutable native object; writes are seen through the prescribed entries.
    pub fn native_mut<T: Reflect>(&mut self, id: ScopeId) -> Result<&mut T> {
        self.downcast_mut::<Attributed<T>>(id)
            .map(Attributed::native_mut)
            .ok_or(Error::NotAttributed(id))
    }

    /// Whether the node at `id` reflects a native object.
    pub fn is_attributed(&self, id: ScopeId) -> bool {
        self.object(id)
            .is_ok_and(|object| object.signatures().is_some())
    }

    // Signatures of an attributed node.
    fn attributed_signatures(&self, id: ScopeId) -> Result<&[Signature]> {
        self.object(id)?
            .signatures()
            .ok_or(Error::NotAttributed(id))
    }

    /// Whether `key` names a prescribed attribute of the scope's native type.
    pub fn is_prescribed_attribute(&self, id: ScopeId, key: &str) -> Result<bool> {
        Ok(self
            .attributed_signatures(id)?
            .iter()
            .any(|signature| signature.name() == key))
    }

    /// Whether `key` is present and not prescribed.
    pub fn is_auxiliary_attribute(&self, id: ScopeId, key: &str) -> Result<bool> {
        Ok(self.is_attribute(id, key)? && !self.is_prescribed_attribute(id, key)?)
    }

    /// Whether `key` is present at all.
    pub fn is_attribute(&self, id: ScopeId, key: &str) -> Result<bool> {
        self.attributed_signatures(id)?;
        Ok(self.index_of(id, key).is_some())
    }

    /// Number of prescribed attributes, including the self pointer.
    pub fn prescribed_attribute_count(&self, id: ScopeId) -> Result<usize> {
        Ok(self.attributed_signatures(id)?.len())
    }

    /// Number of entries appended after construction.
    pub fn auxiliary_attribute_count(&self, id: ScopeId) -> Result<usize> {
        let prescribed = self.prescribed_attribute_count(id)?;
        Ok(self.size(id)? - prescribed)
    }

    /// Keys of the prescribed attributes in declaration order.
    pub fn prescribed_keys(&self, id: ScopeId) -> Result<Vec<&str>> {
        let prescribed = self.prescribed_attribute_count(id)?;
        Ok(self.keys(id)?.into_iter().take(prescribed).collect())
    }

    /// Keys of the auxiliary attributes in insertion order.
    pub fn auxiliary_keys(&self, id: ScopeId) -> Result<Vec<&str>> {
        let prescribed = self.prescribed_attribute_count(id)?;
        Ok(self.keys(id)?.into_iter().skip(prescribed).collect())
    }

    fn check_auxiliary(&self, id: ScopeId, key: &str) -> Result<()> {
        if self.is_prescribed_attribute(id, key)? {
            warn!(scope = %id, key, "auxiliary attribute collides with a prescribed one");
            return Err(Error::PrescribedCollision {
                key: key.to_string(),
            });
        }
        Ok(())
    }

    /// Append an auxiliary attribute, or return the existing one.
    pub fn append_auxiliary_attribute(&mut self, id: ScopeId, key: &str) -> Result<Datum<'_>> {
        self.check_auxiliary(id, key)?;
        self.append(id, key)
    }

    /// Append a child scope under an auxiliary attribute.
    pub fn append_auxiliary_scope(&mut self, id: ScopeId, key: &str) -> Result<ScopeId> {
        self.check_auxiliary(id, key)?;
        self.append_scope(id, key)
    }

    fn attribute_range(&self, id: ScopeId, which: Attributes) -> Result<std::ops::Range<usize>> {
        let prescribed = self.prescribed_attribute_count(id)?;
        let size = self.size(id)?;
        Ok(match which {
            Attributes::Prescribed => 0..prescribed,
            Attributes::Auxiliary => prescribed..size,
            Attributes::All => 0..size,
        })
    }

    fn walk<F>(&self, id: ScopeId, which: Attributes, mut visit: F) -> Result<bool>
    where
        F: FnMut(&str, &Datum<'_>) -> bool,
    {
        let object = self.object(id)?;
        for index in self.attribute_range(id, which)? {
            let (Some(key), Some(datum)) = (object.scope().key_at(index), object.datum(index)) else {
                continue;
            };
            if !visit(key, &datum) {
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn walk_mut<F>(&mut self, id: ScopeId, which: Attributes, mut visit: F) -> Result<bool>
    where
        F: FnMut(&str, &mut Datum<'_>) -> bool,
    {
        let range = self.attribute_range(id, which)?;
        let object = self.object_mut(id)?;
        for index in range {
            let Some(key) = object.scope().key_at(index).map(str::to_string) else {
                continue;
            };
            let Some(mut datum) = object.datum_mut(index) else {
                continue;
            };
            if !visit(&key, &mut datum) {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Visit prescribed attributes in order until `visit` returns `false`.
    ///
    /// Returns whether every attribute was visited.
    pub fn for_each_prescribed<F>(&self, id: ScopeId, visit: F) -> Result<bool>
    where
        F: FnMut(&str, &Datum<'_>) -> bool,
    {
        self.walk(id, Attributes::Prescribed, visit)
    }

    pub fn for_each_prescribed_mut<F>(&mut self, id: ScopeId, visit: F) -> Result<bool>
    where
        F: FnMut(&str, &mut Datum<'_>) -> bool,
    {
        self.walk_mut(id, Attributes::Prescribed, visit)
    }

    /// Visit auxiliary attributes in order until `visit` returns `false`.
    pub fn for_each_auxiliary<F>(&self, id: ScopeId, visit: F) -> Result<bool>
    where
        F: FnMut(&str, &Datum<'_>) -> bool,
    {
        self.walk(id, Attributes::Auxiliary, visit)
    }

    pub fn for_each_auxiliary_mut<F>(&mut self, id: ScopeId, visit: F) -> Result<bool>
    where
        F: FnMut(&str, &mut Datum<'_>) -> bool,
    {
        self.walk_mut(id, Attributes::Auxiliary, visit)
    }

    /// Visit every attribute, prescribed first.
    pub fn for_each_attribute<F>(&self, id: ScopeId, visit: F) -> Result<bool>
    where
        F: FnMut(&str, &Datum<'_>) -> bool,
    {
        self.walk(id, Attributes::All, visit)
    }

    pub fn for_each_attribute_mut<F>(&mut self, id: ScopeId, visit: F) -> Result<bool>
    where
        F: FnMut(&str, &mut Datum<'_>) -> bool,
    {
        self.walk_mut(id, Attributes::All, visit)
    }
}
