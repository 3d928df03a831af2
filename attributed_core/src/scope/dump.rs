//! Human-readable dump of a scope subtree.

use serde_json::{json, Value};

use super::{ScopeArena, ScopeId};
use crate::datum::BufferRef;
use crate::error::Result;

impl ScopeArena {
    /// Render `id` and the scopes it owns as JSON.
    ///
    /// Entries are kept as an array to preserve their order. Owned child
    /// scopes are nested; everything else is rendered in its text form.
    pub fn to_json(&self, id: ScopeId) -> Result<Value> {
        let object = self.object(id)?;
        let scope = object.scope();

        let mut entries = Vec::with_capacity(scope.len());
        for (index, key) in scope.keys().enumerate() {
            let Some(datum) = object.datum(index) else {
                continue;
            };
            let values = match datum.elements() {
                BufferRef::InternalTable(children) => children
                    .iter()
                    .map(|child| self.to_json(*child))
                    .collect::<Result<Vec<_>>>()?,
                _ => (0..datum.size())
                    .filter_map(|i| datum.to_string_at(i).ok())
                    .map(Value::String)
                    .collect(),
            };
            entries.push(json!({
                "key": key,
                "type": datum.datum_type().name(),
                "values": values,
            }));
        }

        Ok(json!({
            "id": id.to_string(),
            "type": object.type_name(),
            "entries": entries,
        }))
    }

    /// Pretty-printed [`to_json`](Self::to_json).
    pub fn dump(&self, id: ScopeId) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.to_json(id)?)?)
    }
}
