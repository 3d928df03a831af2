//! Registry of reflected types and their merged signature lists.

use std::any::TypeId;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use tracing::{debug, warn};

use super::signature::{Inherits, Reflect, Signature};
use crate::error::{Error, Result};

#[derive(Debug, Clone)]
struct TypeEntry {
    name: &'static str,
    /// Base types, nearest first.
    ancestry: Vec<TypeId>,
    signatures: Rc<[Signature]>,
}

/// Maps each registered native type to its full signature list.
///
/// A type's list starts with the self pointer, continues with everything
/// inherited from its bases in declaration order, and ends with its own
/// signatures. Lists are computed once, at registration.
///
/// Derived entries keep the list they were registered with, so
/// unregistering a base leaves its derived types usable.
#[derive(Debug, Default)]
pub struct SignatureRegistry {
    entries: HashMap<TypeId, TypeEntry>,
}

impl SignatureRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a type with no reflected base.
    ///
    /// Returns `Ok(false)` if the type was already registered.
    pub fn register_signatures<T: Reflect>(&mut self) -> Result<bool> {
        if self.entries.contains_key(&TypeId::of::<T>()) {
            return Ok(false);
        }

        let mut signatures = vec![Signature::this()];
        signatures.extend(T::signatures());
        self.insert::<T>(Vec::new(), signatures)
    }

    /// Register `D`, inheriting the signatures of its already registered base `B`.
    pub fn register_derived_signatures<D, B>(&mut self) -> Result<bool>
    where
        D: Inherits<B>,
        B: Reflect,
    {
        if self.entries.contains_key(&TypeId::of::<D>()) {
            return Ok(false);
        }
        let Some(base) = self.entries.get(&TypeId::of::<B>()) else {
            warn!(derived = D::TYPE_NAME, base = B::TYPE_NAME, "base type is not registered");
            return Err(Error::BaseNotRegistered {
                derived: D::TYPE_NAME,
                base: B::TYPE_NAME,
            });
        };

        let mut ancestry = vec![TypeId::of::<B>()];
        ancestry.extend(base.ancestry.iter().copied());
        let mut signatures: Vec<Signature> = base
            .signatures
            .iter()
            .map(|signature| signature.lift::<D, B>())
            .collect();
        signatures.extend(D::signatures());
        self.insert::<D>(ancestry, signatures)
    }

    fn insert<T: Reflect>(&mut self, ancestry: Vec<TypeId>, signatures: Vec<Signature>) -> Result<bool> {
        let mut seen = HashSet::with_capacity(signatures.len());
        for signature in &signatures {
            if !seen.insert(signature.name()) {
                return Err(Error::DuplicateSignature {
                    type_name: T::TYPE_NAME,
                    name: signature.name().to_string(),
                });
            }
        }

        debug!(
            type_name = T::TYPE_NAME,
            attributes = signatures.len(),
            "registered signatures"
        );
        self.entries.insert(
            TypeId::of::<T>(),
            TypeEntry {
                name: T::TYPE_NAME,
                ancestry,
                signatures: signatures.into(),
            },
        );
        Ok(true)
    }

    /// Remove a type. Returns whether it was registered.
    pub fn unregister_signatures<T: Reflect>(&mut self) -> bool {
        let removed = self.entries.remove(&TypeId::of::<T>()).is_some();
        if removed {
            debug!(type_name = T::TYPE_NAME, "unregistered signatures");
        }
        removed
    }

    pub fn find_signatures(&self, type_id: TypeId) -> Option<&[Signature]> {
        self.entries.get(&type_id).map(|entry| &*entry.signatures)
    }

    pub fn signatures_of<T: Reflect>(&self) -> Option<&[Signature]> {
        self.find_signatures(TypeId::of::<T>())
    }

    pub(crate) fn shared_signatures(&self, type_id: TypeId) -> Option<Rc<[Signature]>> {
        self.entries
            .get(&type_id)
            .map(|entry| Rc::clone(&entry.signatures))
    }

    pub fn is_registered<T: Reflect>(&self) -> bool {
        self.entries.contains_key(&TypeId::of::<T>())
    }

    pub fn type_name(&self, type_id: TypeId) -> Option<&'static str> {
        self.entries.get(&type_id).map(|entry| entry.name)
    }

    /// Whether `derived` is `base` or was registered with `base` among its ancestors.
    pub fn is_a(&self, derived: TypeId, base: TypeId) -> bool {
        derived == base
            || self
                .entries
                .get(&derived)
                .is_some_and(|entry| entry.ancestry.contains(&base))
    }

    /// Number of registered types.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
