//! Error types shared by every component of the core.

use crate::datum::DatumType;
use crate::scope::ScopeId;

/// Result type used throughout the crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Caller-facing classification of an [`Error`].
///
/// Contract violations, bounds violations and parse failures are reported
/// distinctly so callers can tell "wrong shape" from "wrong index".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Usage or contract violation (programmer error).
    Logic,
    /// Index past the end, or a missing key.
    OutOfRange,
    /// Malformed input or a rejected argument.
    InvalidArgument,
}

/// Main error type for the attributed core.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The requested representation does not match the datum's type.
    #[error("type mismatch: expected {expected}, found {actual}")]
    TypeMismatch {
        /// Type the caller asked for.
        expected: DatumType,
        /// Type the datum actually holds.
        actual: DatumType,
    },

    /// A datum's type may only be set once.
    #[error("datum type is already {current}, cannot change it to {requested}")]
    TypeAlreadySet {
        /// Type the datum already holds.
        current: DatumType,
        /// Type the caller tried to set.
        requested: DatumType,
    },

    /// Resizing operation attempted on externally bound data.
    #[error("cannot {operation} externally bound data")]
    ExternalStorage {
        /// Name of the rejected operation.
        operation: &'static str,
    },

    /// Mutation attempted through a read-only binding.
    #[error("cannot {operation} read-only data")]
    ConstStorage {
        /// Name of the rejected operation.
        operation: &'static str,
    },

    /// Table entries are only added or removed through the scope arena.
    #[error("cannot {operation} table data directly; scopes are managed by the arena")]
    TableStorage {
        /// Name of the rejected operation.
        operation: &'static str,
    },

    /// Views of scope entries cannot be rebound to other storage.
    #[error("cannot {operation} a view of a scope entry")]
    EntryView {
        /// Name of the rejected operation.
        operation: &'static str,
    },

    /// Operation requires a concrete type but the datum is unset.
    #[error("cannot {operation} a datum of unknown type")]
    UnknownType {
        /// Name of the rejected operation.
        operation: &'static str,
    },

    /// Index past the end of the datum or scope.
    #[error("index {index} out of range for size {size}")]
    IndexOutOfRange {
        /// Requested index.
        index: usize,
        /// Current size.
        size: usize,
    },

    /// `at` on a key that is not present.
    #[error("key not found: {0}")]
    KeyNotFound(String),

    /// Growing a buffer would overflow the size type.
    #[error("capacity overflow while growing to hold {requested} elements")]
    CapacityOverflow {
        /// Number of elements that was requested.
        requested: usize,
    },

    /// String does not match the textual format for the type.
    #[error("cannot parse {input:?} as {expected}")]
    Parse {
        /// Offending input.
        input: String,
        /// Type the input was parsed as.
        expected: DatumType,
    },

    /// Scope id refers to a destroyed node.
    #[error("scope {0} does not exist")]
    StaleScope(ScopeId),

    /// Attaching would make a scope its own ancestor.
    #[error("attaching scope {child} under {parent} would create a cycle")]
    CyclicAttach {
        /// Prospective parent.
        parent: ScopeId,
        /// Scope being attached.
        child: ScopeId,
    },

    /// Key is occupied by something other than a table of owned scopes.
    #[error("key {key:?} holds {actual} data and cannot hold child scopes")]
    NotATable {
        /// Offending key.
        key: String,
        /// Type currently stored at the key.
        actual: DatumType,
    },

    /// Auxiliary attribute name collides with a prescribed one.
    #[error("{key:?} is a prescribed attribute and cannot be appended as auxiliary")]
    PrescribedCollision {
        /// Offending key.
        key: String,
    },

    /// Operation needs an attributed scope.
    #[error("scope {0} is not an attributed scope")]
    NotAttributed(ScopeId),

    /// Construction of a type whose signatures were never registered.
    #[error("signatures for {type_name} are not registered")]
    UnregisteredType {
        /// Name of the native type.
        type_name: &'static str,
    },

    /// Derived registration whose base is missing.
    #[error("cannot register {derived}: base {base} is not registered")]
    BaseNotRegistered {
        /// Derived native type.
        derived: &'static str,
        /// Missing base type.
        base: &'static str,
    },

    /// Two signatures in one hierarchy share a name.
    #[error("{type_name} declares attribute {name:?} more than once across its hierarchy")]
    DuplicateSignature {
        /// Native type being registered.
        type_name: &'static str,
        /// Duplicated attribute name.
        name: String,
    },

    /// Fixed-size signature bound to a member of a different length.
    #[error("attribute {name:?} declares {declared} elements but the member holds {actual}")]
    FieldLength {
        /// Attribute name.
        name: String,
        /// Count declared by the signature.
        declared: usize,
        /// Length found on the native member.
        actual: usize,
    },

    /// Configuration could not be parsed.
    #[error("invalid configuration: {0}")]
    Config(#[from] toml::de::Error),

    /// Scope dump could not be rendered.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Classify the error by caller recoverability.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::IndexOutOfRange { .. } | Error::KeyNotFound(_) => ErrorKind::OutOfRange,
            Error::Parse { .. }
            | Error::CyclicAttach { .. }
            | Error::PrescribedCollision { .. }
            | Error::Config(_) => ErrorKind::InvalidArgument,
            _ => ErrorKind::Logic,
        }
    }
}
