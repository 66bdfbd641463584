//! rbcheck_core: Core utilities for the rbcheck type checker.
//!
//! Provides string interning, source location types, and collections
//! used throughout the front-end pipeline.

pub mod collections;
pub mod intern;
pub mod text;

// Re-export commonly used types
pub use collections::OrderedMap;
pub use intern::{NameRef, NameTable};
pub use text::{FileId, Loc, TextRange, TextSpan};
