//! Scope - ordered, named, tree-structured property bags.
//!
//! Scopes live in a [`ScopeArena`] and refer to each other through
//! generational [`ScopeId`]s. A scope's entries keep insertion order and are
//! also indexed by key. Child scopes are owned through entries of type
//! `InternalTable`; references to scopes elsewhere in the tree are stored
//! as `ExternalTable` entries and own nothing.

mod arena;
mod dump;

pub use arena::ScopeArena;

use std::any::Any;
use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::attributed::Signature;
use crate::config::{CoreConfig, GrowthPolicy};
use crate::datum::{Buffer, Datum};

/// Handle of a node in a [`ScopeArena`].
///
/// The generation is bumped each time a slot is reused, so ids of destroyed
/// scopes never alias newer ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ScopeId {
    index: u32,
    generation: u32,
}

impl ScopeId {
    /// Reference naming no scope. Fills slots of grown reference tables and
    /// is never handed out by an arena.
    pub const NULL: Self = Self {
        index: u32::MAX,
        generation: u32::MAX,
    };

    pub(crate) fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    pub fn is_null(self) -> bool {
        self == Self::NULL
    }

    pub(crate) fn index(self) -> usize {
        self.index as usize
    }

    pub fn generation(self) -> u32 {
        self.generation
    }
}

impl fmt::Display for ScopeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_null() {
            return write!(f, "null");
        }
        write!(f, "{}v{}", self.index, self.generation)
    }
}

/// Where an entry's value lives.
#[derive(Debug, Clone)]
pub(crate) enum Slot {
    /// Datum owned by the scope.
    Stored(Buffer),
    /// Native member resolved through the signature at this index.
    Bound(usize),
}

#[derive(Debug, Clone)]
struct Entry {
    key: String,
    slot: Slot,
}

/// Entries of one scope, in insertion order.
#[derive(Debug, Clone, Default)]
pub struct Scope {
    entries: Vec<Entry>,
    index: HashMap<String, usize>,
    policy: GrowthPolicy,
}

impl Scope {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty scope sized and grown per `config`.
    pub fn with_config(config: &CoreConfig) -> Self {
        Self {
            entries: Vec::with_capacity(config.entry_capacity),
            index: HashMap::with_capacity(config.entry_capacity),
            policy: config.growth,
        }
    }

    pub(crate) fn policy(&self) -> GrowthPolicy {
        self.policy
    }

    pub(crate) fn set_policy(&mut self, policy: GrowthPolicy) {
        self.policy = policy;
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn key_at(&self, index: usize) -> Option<&str> {
        self.entries.get(index).map(|entry| entry.key.as_str())
    }

    /// Ordinal of `key`, if present.
    pub fn index_of(&self, key: &str) -> Option<usize> {
        self.index.get(key).copied()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    /// Keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> + '_ {
        self.entries.iter().map(|entry| entry.key.as_str())
    }

    pub(crate) fn slot(&self, index: usize) -> Option<&Slot> {
        self.entries.get(index).map(|entry| &entry.slot)
    }

    /// Ordinal of `key`, appending an untyped stored entry when absent.
    pub(crate) fn append_stored(&mut self, key: &str) -> usize {
        if let Some(index) = self.index_of(key) {
            return index;
        }
        self.push(key, Slot::Stored(Buffer::new(self.policy)))
    }

    pub(crate) fn push_bound(&mut self, key: &str, signature: usize) -> usize {
        self.push(key, Slot::Bound(signature))
    }

    fn push(&mut self, key: &str, slot: Slot) -> usize {
        let index = self.entries.len();
        self.entries.push(Entry {
            key: key.to_string(),
            slot,
        });
        self.index.insert(key.to_string(), index);
        index
    }

    pub(crate) fn stored(&self, index: usize) -> Option<&Buffer> {
        match self.slot(index)? {
            Slot::Stored(buffer) => Some(buffer),
            Slot::Bound(_) => None,
        }
    }

    pub(crate) fn stored_mut(&mut self, index: usize) -> Option<&mut Buffer> {
        match &mut self.entries.get_mut(index)?.slot {
            Slot::Stored(buffer) => Some(buffer),
            Slot::Bound(_) => None,
        }
    }

    /// Read-only view of a stored entry. Bound entries need their owner.
    pub fn datum(&self, index: usize) -> Option<Datum<'_>> {
        self.stored(index).map(Datum::internal_view)
    }

    /// Growable view of a stored entry.
    pub fn datum_mut(&mut self, index: usize) -> Option<Datum<'_>> {
        self.stored_mut(index).map(Datum::internal)
    }

    /// Owned child scopes across all entries, in entry order.
    pub(crate) fn owned_children(&self) -> Vec<ScopeId> {
        self.entries
            .iter()
            .filter_map(|entry| match &entry.slot {
                Slot::Stored(buffer) => Some(buffer.owned_scopes()),
                Slot::Bound(_) => None,
            })
            .flatten()
            .copied()
            .collect()
    }

    pub(crate) fn owned_children_mut(&mut self) -> impl Iterator<Item = &mut ScopeId> + '_ {
        self.entries
            .iter_mut()
            .filter_map(|entry| match &mut entry.slot {
                Slot::Stored(buffer) => Some(buffer.owned_scopes_mut()),
                Slot::Bound(_) => None,
            })
            .flatten()
    }

    /// Entry and element position of an owned child.
    pub(crate) fn locate_child(&self, child: ScopeId) -> Option<(usize, usize)> {
        self.entries.iter().enumerate().find_map(|(index, entry)| match &entry.slot {
            Slot::Stored(buffer) => buffer
                .owned_scopes()
                .iter()
                .position(|id| *id == child)
                .map(|position| (index, position)),
            Slot::Bound(_) => None,
        })
    }

    pub(crate) fn remove_child(&mut self, child: ScopeId) -> bool {
        self.entries.iter_mut().any(|entry| match &mut entry.slot {
            Slot::Stored(buffer) => buffer.remove_owned_scope(child),
            Slot::Bound(_) => false,
        })
    }

    /// Drop every stored entry, keeping bound ones in place.
    ///
    /// Returns the owned children that were held by the dropped entries.
    pub(crate) fn clear_stored(&mut self) -> Vec<ScopeId> {
        let orphans = self.owned_children();
        self.entries
            .retain(|entry| matches!(entry.slot, Slot::Bound(_)));
        self.index = self
            .entries
            .iter()
            .enumerate()
            .map(|(index, entry)| (entry.key.clone(), index))
            .collect();
        orphans
    }
}

/// A node stored in a [`ScopeArena`].
///
/// Plain [`Scope`]s and attributed scopes both implement this. Custom node
/// types embed a `Scope` and may override [`payload_eq`](Self::payload_eq)
/// to compare their own state.
pub trait ScopeObject: Any + fmt::Debug {
    fn scope(&self) -> &Scope;
    fn scope_mut(&mut self) -> &mut Scope;

    /// Name used in dumps and diagnostics.
    fn type_name(&self) -> &'static str {
        "Scope"
    }

    /// Read-only view of the entry at `index`.
    fn datum(&self, index: usize) -> Option<Datum<'_>> {
        self.scope().datum(index)
    }

    /// Mutable view of the entry at `index`.
    fn datum_mut(&mut self, index: usize) -> Option<Datum<'_>> {
        self.scope_mut().datum_mut(index)
    }

    /// Copy of this node. Owned child ids still name the source's children;
    /// the arena replaces them with copies.
    fn clone_object(&self) -> Box<dyn ScopeObject>;

    /// A node of the same kind with no entries of its own.
    fn empty_like(&self) -> Box<dyn ScopeObject>;

    /// Compare state that lives outside the entries.
    fn payload_eq(&self, other: &dyn ScopeObject) -> bool {
        self.type_name() == other.type_name()
    }

    /// Called by the arena once the node has an id.
    fn bind_id(&mut self, _id: ScopeId) {}

    /// Whether the entry at `index` refers to the node itself.
    fn is_self_reference(&self, _index: usize) -> bool {
        false
    }

    /// Signatures of the reflected native type, for attributed nodes.
    fn signatures(&self) -> Option<&[Signature]> {
        None
    }

    /// Remove the entries a clear is allowed to remove; returns the owned
    /// children they held.
    fn clear_entries(&mut self) -> Vec<ScopeId> {
        self.scope_mut().clear_stored()
    }

    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl ScopeObject for Scope {
    fn scope(&self) -> &Scope {
        self
    }

    fn scope_mut(&mut self) -> &mut Scope {
        self
    }

    fn clone_object(&self) -> Box<dyn ScopeObject> {
        Box::new(self.clone())
    }

    fn empty_like(&self) -> Box<dyn ScopeObject> {
        let mut empty = Scope::new();
        empty.set_policy(self.policy);
        Box::new(empty)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
