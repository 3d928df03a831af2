//! # Game Entities
//!
//! Concrete native entity types reflected through the attributed core.
//! Every member listed in a type's signatures can be read and written by
//! name through an arena, and the same memory stays reachable through the
//! native struct.

pub mod entities;

pub use entities::*;
