//! # Attributed Core
//!
//! A reflective object model layered over statically typed native objects.
//! A native type's members can be reached both through its own fields and
//! by name through a scope, and both views refer to the same memory.
//!
//! ## Core Components
//!
//! - **datum**: Runtime-typed value arrays that own or borrow their storage
//! - **scope**: Ordered, named, tree-structured property bags kept in an arena
//! - **attributed**: Scopes bound to native objects, plus the signature registry
//!
//! ## Ambient
//!
//! - **config**: Growth policy and arena sizing, loadable from TOML
//! - **error**: One error type with a caller-facing classification
//! - **rtti**: Opaque pointer values and their runtime type contract
//! - **math**: The 4-vector and 4x4 matrix element types

pub mod attributed;
pub mod config;
pub mod datum;
pub mod error;
pub mod math;
pub mod rtti;
pub mod scope;

pub use attributed::{Attributed, Field, Inherits, Reflect, Signature, SignatureRegistry, THIS_KEY};
pub use config::{CoreConfig, GrowthPolicy};
pub use datum::{Datum, DatumType, Ownership};
pub use error::{Error, ErrorKind, Result};
pub use math::{Mat4, Vec4};
pub use rtti::{Pointer, Rtti};
pub use scope::{Scope, ScopeArena, ScopeId, ScopeObject};
