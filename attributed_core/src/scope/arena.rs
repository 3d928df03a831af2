//! Arena owning every scope node.

use tracing::{debug, warn};

use super::{Scope, ScopeId, ScopeObject};
use crate::config::CoreConfig;
use crate::datum::{BufferRef, Datum, DatumType};
use crate::error::{Error, Result};

#[derive(Debug)]
struct Node {
    object: Box<dyn ScopeObject>,
    parent: Option<ScopeId>,
}

#[derive(Debug)]
struct Cell {
    generation: u32,
    node: Option<Node>,
}

/// Owner of a forest of scopes.
///
/// Every scope is a node here; parents own their children through
/// `InternalTable` entries and each node records its single parent.
/// Destroying a node destroys everything it owns.
#[derive(Debug, Default)]
pub struct ScopeArena {
    cells: Vec<Cell>,
    free: Vec<u32>,
    live: usize,
    config: CoreConfig,
}

impl ScopeArena {
    /// Create an empty arena with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an arena whose scopes grow per `config`.
    pub fn with_config(config: CoreConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Settings applied to new scopes.
    pub fn config(&self) -> &CoreConfig {
        &self.config
    }

    /// Create a new, empty, parentless scope.
    pub fn create_scope(&mut self) -> ScopeId {
        let scope = Scope::with_config(&self.config);
        self.insert(Box::new(scope))
    }

    /// Take ownership of a node and give it an id.
    pub fn insert(&mut self, mut object: Box<dyn ScopeObject>) -> ScopeId {
        let id = match self.free.pop() {
            Some(index) => ScopeId::new(index, self.cells[index as usize].generation),
            None => {
                let index = self.cells.len() as u32;
                self.cells.push(Cell {
                    generation: 0,
                    node: None,
                });
                ScopeId::new(index, 0)
            }
        };

        object.bind_id(id);
        debug!(scope = %id, kind = object.type_name(), "created scope");
        self.cells[id.index()].node = Some(Node {
            object,
            parent: None,
        });
        self.live += 1;
        id
    }

    fn node(&self, id: ScopeId) -> Result<&Node> {
        self.cells
            .get(id.index())
            .filter(|cell| cell.generation == id.generation)
            .and_then(|cell| cell.node.as_ref())
            .ok_or(Error::StaleScope(id))
    }

    fn node_mut(&mut self, id: ScopeId) -> Result<&mut Node> {
        self.cells
            .get_mut(id.index())
            .filter(|cell| cell.generation == id.generation)
            .and_then(|cell| cell.node.as_mut())
            .ok_or(Error::StaleScope(id))
    }

    /// Whether `id` names a live scope.
    pub fn contains(&self, id: ScopeId) -> bool {
        self.node(id).is_ok()
    }

    /// Number of live scopes.
    pub fn len(&self) -> usize {
        self.live
    }

    /// Whether no scope is alive.
    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Node at `id`.
    pub fn object(&self, id: ScopeId) -> Result<&dyn ScopeObject> {
        Ok(self.node(id)?.object.as_ref())
    }

    /// Mutable node at `id`.
    pub fn object_mut(&mut self, id: ScopeId) -> Result<&mut dyn ScopeObject> {
        Ok(self.node_mut(id)?.object.as_mut())
    }

    /// Node at `id` as its concrete type.
    pub fn downcast_ref<T: ScopeObject>(&self, id: ScopeId) -> Option<&T> {
        self.object(id).ok()?.as_any().downcast_ref()
    }

    /// Mutable node at `id` as its concrete type.
    pub fn downcast_mut<T: ScopeObject>(&mut self, id: ScopeId) -> Option<&mut T> {
        self.object_mut(id).ok()?.as_any_mut().downcast_mut()
    }

    /// Owning scope of `id`; `None` for roots.
    pub fn parent(&self, id: ScopeId) -> Result<Option<ScopeId>> {
        Ok(self.node(id)?.parent)
    }

    /// Number of entries in the scope.
    pub fn size(&self, id: ScopeId) -> Result<usize> {
        Ok(self.object(id)?.scope().len())
    }

    /// Key of the entry at ordinal `index`.
    pub fn key_at(&self, id: ScopeId, index: usize) -> Option<&str> {
        self.object(id).ok()?.scope().key_at(index)
    }

    /// Ordinal of `key` in the scope.
    pub fn index_of(&self, id: ScopeId, key: &str) -> Option<usize> {
        self.object(id).ok()?.scope().index_of(key)
    }

    /// Keys of the scope in insertion order.
    pub fn keys(&self, id: ScopeId) -> Result<Vec<&str>> {
        Ok(self.object(id)?.scope().keys().collect())
    }

    /// Datum at `key`, appending an empty one first when the key is new.
    pub fn append(&mut self, id: ScopeId, key: &str) -> Result<Datum<'_>> {
        let object = self.object_mut(id)?;
        let index = match object.scope().index_of(key) {
            Some(index) => index,
            None => object.scope_mut().append_stored(key),
        };
        let size = object.scope().len();
        object
            .datum_mut(index)
            .ok_or(Error::IndexOutOfRange { index, size })
    }

    /// Create a child scope owned by the entry at `key`.
    ///
    /// The key must be absent, untyped, or already hold owned scopes.
    pub fn append_scope(&mut self, id: ScopeId, key: &str) -> Result<ScopeId> {
        let entry = self.table_entry(id, key)?;
        let child = self.create_scope();
        self.link(id, entry, child)?;
        Ok(child)
    }

    // Ordinal of a stored entry at `key` that can own children, created when absent.
    fn table_entry(&mut self, id: ScopeId, key: &str) -> Result<usize> {
        let object = self.object_mut(id)?;
        let index = match object.scope().index_of(key) {
            Some(index) => index,
            None => object.scope_mut().append_stored(key),
        };
        let actual = object
            .datum(index)
            .map(|datum| datum.datum_type())
            .unwrap_or_default();

        let Some(buffer) = object.scope_mut().stored_mut(index) else {
            return Err(Error::NotATable {
                key: key.to_string(),
                actual,
            });
        };
        match actual {
            DatumType::InternalTable => {}
            DatumType::Unknown => Datum::internal(buffer).set_type(DatumType::Table)?,
            other => {
                return Err(Error::NotATable {
                    key: key.to_string(),
                    actual: other,
                })
            }
        }
        Ok(index)
    }

    fn link(&mut self, parent: ScopeId, entry: usize, child: ScopeId) -> Result<()> {
        let scope = self.object_mut(parent)?.scope_mut();
        let size = scope.len();
        scope
            .stored_mut(entry)
            .ok_or(Error::IndexOutOfRange { index: entry, size })?
            .push_owned_scope(child)?;
        self.node_mut(child)?.parent = Some(parent);
        debug!(%parent, %child, "attached scope");
        Ok(())
    }

    /// Read-only datum at ordinal `index`.
    pub fn get(&self, id: ScopeId, index: usize) -> Result<Datum<'_>> {
        let object = self.object(id)?;
        object.datum(index).ok_or_else(|| Error::IndexOutOfRange {
            index,
            size: object.scope().len(),
        })
    }

    /// Mutable datum at ordinal `index`.
    pub fn get_mut(&mut self, id: ScopeId, index: usize) -> Result<Datum<'_>> {
        let object = self.object_mut(id)?;
        let size = object.scope().len();
        object
            .datum_mut(index)
            .ok_or(Error::IndexOutOfRange { index, size })
    }

    /// Datum at `key` in this scope only.
    pub fn find(&self, id: ScopeId, key: &str) -> Option<Datum<'_>> {
        self.at(id, key).ok()
    }

    /// Mutable datum at `key` in this scope only.
    pub fn find_mut(&mut self, id: ScopeId, key: &str) -> Option<Datum<'_>> {
        self.at_mut(id, key).ok()
    }

    /// Datum at `key`, failing with [`Error::KeyNotFound`] when absent.
    pub fn at(&self, id: ScopeId, key: &str) -> Result<Datum<'_>> {
        let object = self.object(id)?;
        object
            .scope()
            .index_of(key)
            .and_then(|index| object.datum(index))
            .ok_or_else(|| Error::KeyNotFound(key.to_string()))
    }

    /// Mutable datum at `key`, failing with [`Error::KeyNotFound`] when absent.
    pub fn at_mut(&mut self, id: ScopeId, key: &str) -> Result<Datum<'_>> {
        let object = self.object_mut(id)?;
        let index = object
            .scope()
            .index_of(key)
            .ok_or_else(|| Error::KeyNotFound(key.to_string()))?;
        object
            .datum_mut(index)
            .ok_or_else(|| Error::KeyNotFound(key.to_string()))
    }

    /// Nearest scope holding `key`, starting at `id` and walking up.
    pub fn search_owner(&self, id: ScopeId, key: &str) -> Option<ScopeId> {
        let mut current = Some(id);
        while let Some(scope) = current {
            let node = self.node(scope).ok()?;
            if node.object.scope().contains_key(key) {
                return Some(scope);
            }
            current = node.parent;
        }
        None
    }

    /// Datum at `key` in `id` or its nearest ancestor, with the scope that holds it.
    pub fn search(&self, id: ScopeId, key: &str) -> Option<(Datum<'_>, ScopeId)> {
        let owner = self.search_owner(id, key)?;
        Some((self.find(owner, key)?, owner))
    }

    /// Mutable form of [`search`](Self::search).
    pub fn search_mut(&mut self, id: ScopeId, key: &str) -> Option<(Datum<'_>, ScopeId)> {
        let owner = self.search_owner(id, key)?;
        let datum = self.find_mut(owner, key)?;
        Some((datum, owner))
    }

    /// Whether `ancestor` owns `descendant`, directly or through other scopes.
    pub fn is_ancestor_of(&self, ancestor: ScopeId, descendant: ScopeId) -> bool {
        let mut current = self.parent(descendant).ok().flatten();
        while let Some(scope) = current {
            if scope == ancestor {
                return true;
            }
            current = self.parent(scope).ok().flatten();
        }
        false
    }

    /// Inverse of [`is_ancestor_of`](Self::is_ancestor_of).
    pub fn is_descendant_of(&self, descendant: ScopeId, ancestor: ScopeId) -> bool {
        self.is_ancestor_of(ancestor, descendant)
    }

    /// Move `child` under `parent` at `key`, detaching it from its old parent.
    pub fn adopt(&mut self, parent: ScopeId, child: ScopeId, key: &str) -> Result<()> {
        self.node(parent)?;
        self.node(child)?;
        if parent == child || self.is_ancestor_of(child, parent) {
            warn!(%parent, %child, "rejected cyclic attach");
            return Err(Error::CyclicAttach { parent, child });
        }

        let entry = self.table_entry(parent, key)?;
        self.orphan(child)?;
        self.link(parent, entry, child)
    }

    /// Detach `child` from its parent. No-op for roots.
    pub fn orphan(&mut self, child: ScopeId) -> Result<()> {
        let Some(parent) = self.node(child)?.parent else {
            return Ok(());
        };
        if let Ok(object) = self.object_mut(parent) {
            object.scope_mut().remove_child(child);
        }
        self.node_mut(child)?.parent = None;
        debug!(%parent, %child, "detached scope");
        Ok(())
    }

    /// Key and element position at which `parent` owns `child`.
    pub fn find_contained_scope(&self, parent: ScopeId, child: ScopeId) -> Option<(&str, usize)> {
        let scope = self.object(parent).ok()?.scope();
        let (entry, position) = scope.locate_child(child)?;
        Some((scope.key_at(entry)?, position))
    }

    /// Copy `id` and everything it owns into a new parentless subtree.
    ///
    /// References to scopes outside the subtree are kept as they are.
    pub fn deep_copy(&mut self, id: ScopeId) -> Result<ScopeId> {
        let object = self.object(id)?.clone_object();
        let copy = self.insert(object);

        let originals = self.object(copy)?.scope().owned_children();
        let mut copies = Vec::with_capacity(originals.len());
        for original in originals {
            let child = self.deep_copy(original)?;
            self.node_mut(child)?.parent = Some(copy);
            copies.push(child);
        }
        for (slot, child) in self
            .object_mut(copy)?
            .scope_mut()
            .owned_children_mut()
            .zip(copies)
        {
            *slot = child;
        }

        debug!(source = %id, %copy, "copied scope");
        Ok(copy)
    }

    /// Move the contents of `id` into a new parentless node.
    ///
    /// The source keeps its place in the tree but is left empty; owned
    /// children move with the contents.
    pub fn take(&mut self, id: ScopeId) -> Result<ScopeId> {
        let node = self.node_mut(id)?;
        let mut empty = node.object.empty_like();
        empty.bind_id(id);
        let object = std::mem::replace(&mut node.object, empty);

        let moved = self.insert(object);
        let children = self.object(moved)?.scope().owned_children();
        for child in children {
            self.node_mut(child)?.parent = Some(moved);
        }
        debug!(source = %id, %moved, "moved scope");
        Ok(moved)
    }

    /// Remove the scope's entries and destroy the children they owned.
    ///
    /// The scope keeps its parent. Attributed scopes keep their prescribed
    /// entries.
    pub fn clear(&mut self, id: ScopeId) -> Result<()> {
        let orphans = self.object_mut(id)?.clear_entries();
        for child in orphans {
            self.release(child);
        }
        Ok(())
    }

    /// Detach and destroy `id` and everything it owns.
    pub fn destroy(&mut self, id: ScopeId) -> Result<()> {
        self.orphan(id)?;
        self.release(id);
        Ok(())
    }

    fn release(&mut self, id: ScopeId) {
        let mut pending = vec![id];
        while let Some(scope) = pending.pop() {
            let Some(cell) = self.cells.get_mut(scope.index()) else {
                continue;
            };
            if cell.generation != scope.generation {
                continue;
            }
            let Some(node) = cell.node.take() else {
                continue;
            };
            cell.generation = cell.generation.wrapping_add(1);
            self.free.push(scope.index);
            self.live -= 1;
            pending.extend(node.object.scope().owned_children());
            debug!(%scope, "destroyed scope");
        }
    }

    /// Structural equality of two scopes.
    ///
    /// Equal when the nodes agree on their own payload and hold the same
    /// keys in the same order with equal data. Self references are skipped.
    pub fn scope_eq(&self, a: ScopeId, b: ScopeId) -> bool {
        if a == b {
            return self.contains(a);
        }
        let (Ok(left), Ok(right)) = (self.object(a), self.object(b)) else {
            return false;
        };
        if !left.payload_eq(right) {
            return false;
        }

        let (left_scope, right_scope) = (left.scope(), right.scope());
        if left_scope.len() != right_scope.len() {
            return false;
        }
        (0..left_scope.len()).all(|index| {
            if left_scope.key_at(index) != right_scope.key_at(index) {
                return false;
            }
            if left.is_self_reference(index) && right.is_self_reference(index) {
                return true;
            }
            match (left.datum(index), right.datum(index)) {
                (Some(x), Some(y)) => self.datum_eq(&x, &y),
                (None, None) => true,
                _ => false,
            }
        })
    }

    /// Datum equality that compares owned children as scopes.
    ///
    /// References to scopes compare by id, like [`Pointer::Scope`](crate::Pointer).
    pub fn datum_eq(&self, a: &Datum<'_>, b: &Datum<'_>) -> bool {
        match (a.elements(), b.elements()) {
            (BufferRef::InternalTable(left), BufferRef::InternalTable(right)) => {
                left.len() == right.len()
                    && left.iter().zip(right).all(|(l, r)| self.scope_eq(*l, *r))
            }
            _ => a == b,
        }
    }
}
