//! Datum type tags and ownership flags.

use serde::{Deserialize, Serialize};

/// Runtime type tag of a datum.
///
/// `Table` is the apparent type callers ask for; storage is always one of
/// `InternalTable` (owned child scopes) or `ExternalTable` (references).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum DatumType {
    #[default]
    Unknown,
    Integer,
    Float,
    String,
    Vector,
    Matrix,
    Pointer,
    Table,
    InternalTable,
    ExternalTable,
}

impl DatumType {
    /// Fold the storage-specific table variants into `Table`.
    pub fn apparent(self) -> Self {
        match self {
            DatumType::InternalTable | DatumType::ExternalTable => DatumType::Table,
            other => other,
        }
    }

    /// Storage type used when a caller asks for this type.
    pub fn concrete(self) -> Self {
        match self {
            DatumType::Table => DatumType::InternalTable,
            other => other,
        }
    }

    pub fn is_table(self) -> bool {
        self.apparent() == DatumType::Table
    }

    /// Name used in messages and textual dumps.
    pub fn name(self) -> &'static str {
        match self {
            DatumType::Unknown => "unknown",
            DatumType::Integer => "integer",
            DatumType::Float => "float",
            DatumType::String => "string",
            DatumType::Vector => "vector",
            DatumType::Matrix => "matrix",
            DatumType::Pointer => "pointer",
            DatumType::Table => "table",
            DatumType::InternalTable => "internal table",
            DatumType::ExternalTable => "external table",
        }
    }
}

impl std::fmt::Display for DatumType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Who owns the memory behind a datum.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ownership {
    /// Owned, growable buffer.
    Internal,
    /// Borrowed mutable buffer of fixed length.
    External,
    /// Borrowed read-only buffer.
    ExternalConst,
}
