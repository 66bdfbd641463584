//! Symbol records and their flags.

use rbcheck_core::collections::OrderedMap;
use rbcheck_core::intern::NameRef;
use rbcheck_core::text::Loc;

/// A lightweight handle to a symbol in the [`crate::SymbolTable`] arena.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct SymbolRef(pub u32);

impl SymbolRef {
    pub const NONE: SymbolRef = SymbolRef(u32::MAX);

    // Well-known symbols, entered by `SymbolTable::new` in this order.
    pub const ROOT: SymbolRef = SymbolRef(0);
    pub const TODO: SymbolRef = SymbolRef(1);
    pub const OBJECT: SymbolRef = SymbolRef(2);
    pub const BASIC_OBJECT: SymbolRef = SymbolRef(3);
    pub const MAGIC: SymbolRef = SymbolRef(4);

    #[inline]
    pub fn exists(self) -> bool {
        self != SymbolRef::NONE
    }

    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

bitflags::bitflags! {
    /// Flags describing what kind of entity a symbol is and the attributes
    /// later passes read off it.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct SymbolFlags: u32 {
        const NONE                  = 0;

        // Symbol kinds.
        const CLASS                 = 1 << 0;
        const METHOD                = 1 << 1;
        const FIELD                 = 1 << 2;
        const STATIC_FIELD          = 1 << 3;
        const TYPE_MEMBER           = 1 << 4;
        const METHOD_ARGUMENT       = 1 << 5;

        // Class attributes. `CLASS_MODULE` is only meaningful once
        // `CLASS_MODULE_SET` is on; class-vs-module kind is sticky after
        // the first definition.
        const CLASS_MODULE          = 1 << 8;
        const CLASS_MODULE_SET      = 1 << 9;
        const CLASS_ABSTRACT        = 1 << 10;
        const CLASS_INTERFACE       = 1 << 11;
        /// Method symbol synthesized to host a block body.
        const BLOCK_SYMBOL          = 1 << 12;

        // Method attributes.
        const METHOD_PRIVATE        = 1 << 16;
        const METHOD_PROTECTED      = 1 << 17;
        const METHOD_PUBLIC         = 1 << 18;
        const METHOD_ABSTRACT       = 1 << 19;
        const METHOD_INTERFACE      = 1 << 20;
        const DSL_SYNTHESIZED       = 1 << 21;

        // Method-argument attributes.
        const ARGUMENT_OPTIONAL     = 1 << 24;
        const ARGUMENT_KEYWORD      = 1 << 25;
        const ARGUMENT_REPEATED     = 1 << 26;
        const ARGUMENT_BLOCK        = 1 << 27;

        // Static-field / type-member attributes.
        const STATIC_TYPE_ALIAS     = 1 << 28;
        const FIXED                 = 1 << 29;

        const VISIBILITY = Self::METHOD_PRIVATE.bits()
            | Self::METHOD_PROTECTED.bits()
            | Self::METHOD_PUBLIC.bits();
    }
}

/// Variance of a type member.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Variance {
    Invariant,
    CoVariant,
    ContraVariant,
}

/// The small slice of the type language the namer writes: `untyped`
/// placeholders and aliases to other symbols. Everything richer belongs to
/// the resolver and inference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Type {
    Untyped,
    Alias(SymbolRef),
}

/// A local variable: a name plus the id of the scope that introduced it.
///
/// `unique_id == 0` means method-top-level; positive values identify nested
/// block scopes. Locals never enter the global symbol table; they live in
/// the rewritten AST and in the namer's scope stack.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct LocalVariable {
    pub name: NameRef,
    pub unique_id: u32,
}

impl LocalVariable {
    #[inline]
    pub fn new(name: NameRef, unique_id: u32) -> Self {
        Self { name, unique_id }
    }
}

/// A named program entity: class, module, method, method argument, field,
/// static field, or type member.
#[derive(Debug, Clone)]
pub struct Symbol {
    /// The enclosing symbol: class/module for classes and methods, the
    /// defining method for arguments.
    pub owner: SymbolRef,
    /// The symbol's name (possibly a mangled unique name).
    pub name: NameRef,
    pub flags: SymbolFlags,
    /// Definition sites. Open classes and re-opened methods accumulate one
    /// loc per file; within a file the latest definition wins.
    pub locs: Vec<Loc>,
    /// Named members, keyed by name, in insertion order.
    pub members: OrderedMap<NameRef, SymbolRef>,
    /// Ordered argument symbols (methods only).
    pub arguments: Vec<SymbolRef>,
    /// Ordered type-member symbols (classes only).
    pub type_members: Vec<SymbolRef>,
    /// Superclass, if known. `TODO` until the resolver fills it in.
    pub super_class: SymbolRef,
    /// The singleton class, once forced into existence.
    pub(crate) singleton: SymbolRef,
    /// Set by the namer only for aliases and `untyped` placeholders.
    pub result_type: Option<Type>,
    /// Variance (type members only).
    pub variance: Variance,
    /// Per-symbol monotonic counter used to mint fresh block-temp names.
    pub unique_counter: u32,
    /// Whether this symbol is a stub holding an intrinsic binding. Such
    /// stubs may be overwritten by a real definition from source.
    pub intrinsic: bool,
}

impl Symbol {
    pub fn new(owner: SymbolRef, name: NameRef, flags: SymbolFlags) -> Self {
        Self {
            owner,
            name,
            flags,
            locs: Vec::new(),
            members: OrderedMap::new(),
            arguments: Vec::new(),
            type_members: Vec::new(),
            super_class: SymbolRef::NONE,
            singleton: SymbolRef::NONE,
            result_type: None,
            variance: Variance::Invariant,
            unique_counter: 0,
            intrinsic: false,
        }
    }

    // -- Kind queries --

    #[inline]
    pub fn is_class(&self) -> bool {
        self.flags.contains(SymbolFlags::CLASS)
    }

    #[inline]
    pub fn is_method(&self) -> bool {
        self.flags.contains(SymbolFlags::METHOD)
    }

    #[inline]
    pub fn is_field(&self) -> bool {
        self.flags.contains(SymbolFlags::FIELD)
    }

    #[inline]
    pub fn is_static_field(&self) -> bool {
        self.flags.contains(SymbolFlags::STATIC_FIELD)
    }

    #[inline]
    pub fn is_type_member(&self) -> bool {
        self.flags.contains(SymbolFlags::TYPE_MEMBER)
    }

    #[inline]
    pub fn is_method_argument(&self) -> bool {
        self.flags.contains(SymbolFlags::METHOD_ARGUMENT)
    }

    #[inline]
    pub fn is_block_symbol(&self) -> bool {
        self.flags.contains(SymbolFlags::BLOCK_SYMBOL)
    }

    // -- Class attributes --

    #[inline]
    pub fn is_class_module(&self) -> bool {
        self.flags.contains(SymbolFlags::CLASS_MODULE)
    }

    #[inline]
    pub fn is_class_module_set(&self) -> bool {
        self.flags.contains(SymbolFlags::CLASS_MODULE_SET)
    }

    /// Record class-vs-module kind. Kind is sticky: callers check
    /// `is_class_module_set` before calling this a second time.
    pub fn set_is_module(&mut self, is_module: bool) {
        self.flags |= SymbolFlags::CLASS_MODULE_SET;
        if is_module {
            self.flags |= SymbolFlags::CLASS_MODULE;
        } else {
            self.flags.remove(SymbolFlags::CLASS_MODULE);
        }
    }

    pub fn set_class_abstract(&mut self) {
        self.flags |= SymbolFlags::CLASS_ABSTRACT;
    }

    pub fn set_class_interface(&mut self) {
        self.flags |= SymbolFlags::CLASS_INTERFACE;
    }

    // -- Method attributes. A method has exactly one visibility. --

    pub fn set_private(&mut self) {
        self.flags.remove(SymbolFlags::VISIBILITY);
        self.flags |= SymbolFlags::METHOD_PRIVATE;
    }

    pub fn set_protected(&mut self) {
        self.flags.remove(SymbolFlags::VISIBILITY);
        self.flags |= SymbolFlags::METHOD_PROTECTED;
    }

    pub fn set_public(&mut self) {
        self.flags.remove(SymbolFlags::VISIBILITY);
        self.flags |= SymbolFlags::METHOD_PUBLIC;
    }

    #[inline]
    pub fn is_private(&self) -> bool {
        self.flags.contains(SymbolFlags::METHOD_PRIVATE)
    }

    #[inline]
    pub fn is_protected(&self) -> bool {
        self.flags.contains(SymbolFlags::METHOD_PROTECTED)
    }

    #[inline]
    pub fn is_public(&self) -> bool {
        self.flags.contains(SymbolFlags::METHOD_PUBLIC)
    }

    pub fn set_dsl_synthesized(&mut self) {
        self.flags |= SymbolFlags::DSL_SYNTHESIZED;
    }

    // -- Argument attributes --

    pub fn set_optional(&mut self) {
        self.flags |= SymbolFlags::ARGUMENT_OPTIONAL;
    }

    pub fn set_keyword(&mut self) {
        self.flags |= SymbolFlags::ARGUMENT_KEYWORD;
    }

    pub fn set_repeated(&mut self) {
        self.flags |= SymbolFlags::ARGUMENT_REPEATED;
    }

    pub fn set_block_argument(&mut self) {
        self.flags |= SymbolFlags::ARGUMENT_BLOCK;
    }

    #[inline]
    pub fn is_keyword(&self) -> bool {
        self.flags.contains(SymbolFlags::ARGUMENT_KEYWORD)
    }

    #[inline]
    pub fn is_block_argument(&self) -> bool {
        self.flags.contains(SymbolFlags::ARGUMENT_BLOCK)
    }

    #[inline]
    pub fn is_repeated(&self) -> bool {
        self.flags.contains(SymbolFlags::ARGUMENT_REPEATED)
    }

    #[inline]
    pub fn is_optional(&self) -> bool {
        self.flags.contains(SymbolFlags::ARGUMENT_OPTIONAL)
    }

    // -- Static-field / type-member attributes --

    pub fn set_static_type_alias(&mut self) {
        self.flags |= SymbolFlags::STATIC_TYPE_ALIAS;
    }

    pub fn set_fixed(&mut self) {
        self.flags |= SymbolFlags::FIXED;
    }

    #[inline]
    pub fn is_fixed(&self) -> bool {
        self.flags.contains(SymbolFlags::FIXED)
    }

    // -- Locations --

    /// The most recent definition site, or a nonexistent loc for symbols
    /// that were never written in source.
    pub fn loc(&self) -> Loc {
        self.locs.last().copied().unwrap_or_else(Loc::none)
    }

    /// Record a definition site. A later definition in the same file
    /// replaces that file's entry; other files' entries are preserved.
    pub fn add_loc(&mut self, loc: Loc) {
        if !loc.exists() {
            return;
        }
        if let Some(existing) = self.locs.iter_mut().find(|l| l.file == loc.file) {
            *existing = loc;
        } else {
            self.locs.push(loc);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rbcheck_core::intern::NameTable;
    use rbcheck_core::text::{FileId, TextSpan};

    #[test]
    fn test_visibility_is_exclusive() {
        let names = NameTable::new();
        let mut sym = Symbol::new(SymbolRef::ROOT, names.intern("foo"), SymbolFlags::METHOD);
        sym.set_private();
        assert!(sym.is_private());
        sym.set_public();
        assert!(sym.is_public());
        assert!(!sym.is_private());
    }

    #[test]
    fn test_module_kind_is_recorded() {
        let names = NameTable::new();
        let mut sym = Symbol::new(SymbolRef::ROOT, names.intern("Foo"), SymbolFlags::CLASS);
        assert!(!sym.is_class_module_set());
        sym.set_is_module(true);
        assert!(sym.is_class_module_set());
        assert!(sym.is_class_module());
        sym.set_is_module(false);
        assert!(!sym.is_class_module());
    }

    #[test]
    fn test_add_loc_replaces_same_file() {
        let names = NameTable::new();
        let mut sym = Symbol::new(SymbolRef::ROOT, names.intern("Foo"), SymbolFlags::CLASS);
        let a = Loc::new(FileId(0), TextSpan::new(0, 5));
        let b = Loc::new(FileId(0), TextSpan::new(10, 5));
        let c = Loc::new(FileId(1), TextSpan::new(0, 5));
        sym.add_loc(a);
        sym.add_loc(c);
        sym.add_loc(b);
        assert_eq!(sym.locs.len(), 2);
        assert_eq!(sym.locs[0], b);
        assert_eq!(sym.locs[1], c);
    }
}
