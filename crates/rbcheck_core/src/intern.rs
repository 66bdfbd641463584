//! String interning for the checker.
//!
//! Every identifier, constant, and method name is interned so that name
//! comparison anywhere in the pipeline is an O(1) integer comparison.

use lasso::{Spur, ThreadedRodeo};
use std::fmt;
use std::sync::Arc;

/// An interned name. This is a lightweight handle (u32) that can be used
/// to look up the actual string content in the [`NameTable`] that minted it.
///
/// Comparing two `NameRef` values is an O(1) integer comparison.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct NameRef(Spur);

impl NameRef {
    /// Create from a raw lasso key.
    #[inline]
    pub fn from_spur(spur: Spur) -> Self {
        Self(spur)
    }

    /// Get the raw lasso key.
    #[inline]
    pub fn as_spur(self) -> Spur {
        self.0
    }
}

impl fmt::Debug for NameRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NameRef({:?})", self.0)
    }
}

/// Thread-safe name interner.
///
/// Stores one copy of each unique string and returns lightweight handles.
/// Interning takes `&self`, so the table can be shared across files being
/// named concurrently.
#[derive(Clone)]
pub struct NameTable {
    rodeo: Arc<ThreadedRodeo>,
}

impl NameTable {
    pub fn new() -> Self {
        Self {
            rodeo: Arc::new(ThreadedRodeo::new()),
        }
    }

    /// Intern a string, returning a handle to the interned value.
    /// If the string was already interned, returns the existing handle.
    #[inline]
    pub fn intern(&self, s: &str) -> NameRef {
        NameRef::from_spur(self.rodeo.get_or_intern(s))
    }

    /// Intern a static string. More efficient than `intern` for literals.
    #[inline]
    pub fn intern_static(&self, s: &'static str) -> NameRef {
        NameRef::from_spur(self.rodeo.get_or_intern_static(s))
    }

    /// Look up an already-interned string without interning it if absent.
    #[inline]
    pub fn get(&self, s: &str) -> Option<NameRef> {
        self.rodeo.get(s).map(NameRef::from_spur)
    }

    /// Resolve a name handle back to its string content.
    #[inline]
    pub fn resolve(&self, name: NameRef) -> &str {
        self.rodeo.resolve(&name.as_spur())
    }

    /// Returns the number of interned names.
    pub fn len(&self) -> usize {
        self.rodeo.len()
    }

    /// Returns true if no names have been interned.
    pub fn is_empty(&self) -> bool {
        self.rodeo.is_empty()
    }
}

impl Default for NameTable {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for NameTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NameTable").field("len", &self.len()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intern_and_resolve() {
        let names = NameTable::new();
        let a = names.intern("foo");
        let b = names.intern("foo");
        let c = names.intern("bar");

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(names.resolve(a), "foo");
        assert_eq!(names.resolve(c), "bar");
    }

    #[test]
    fn test_get() {
        let names = NameTable::new();
        assert!(names.get("initialize").is_none());
        let a = names.intern("initialize");
        assert_eq!(names.get("initialize"), Some(a));
    }

    #[test]
    fn test_intern_static() {
        let names = NameTable::new();
        let a = names.intern_static("include");
        let b = names.intern("include");
        assert_eq!(a, b);
    }
}
