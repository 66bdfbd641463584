//! The symbol table arena.
//!
//! One `SymbolTable` holds every symbol in the program. Passes run against a
//! mutable handle to it; multiple files accumulate into the same table. The
//! table also owns the name interner and the diagnostics sink, so a pass
//! needs exactly one handle to do its work.

use crate::names::Names;
use crate::symbol::{Symbol, SymbolFlags, SymbolRef, Type, Variance};
use rbcheck_core::intern::{NameRef, NameTable};
use rbcheck_core::text::{FileId, Loc};
use rbcheck_diagnostics::{Diagnostic, DiagnosticCollection};
use rustc_hash::FxHashMap;

/// What a fresh unique name is for. Determines how the minted name renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UniqueNameKind {
    /// Renames performed by the namer (mangled conflicting definitions,
    /// block temps).
    Namer,
    /// Synthesized names for positional method arguments.
    PositionalArg,
    /// Singleton class names.
    Singleton,
}

pub struct SymbolTable {
    interner: NameTable,
    /// Pre-interned well-known names.
    pub names: Names,
    symbols: Vec<Symbol>,
    /// Diagnostics accumulated by passes running against this table.
    pub diagnostics: DiagnosticCollection,
    /// Per-file `<static-init>` host methods, entered on demand.
    static_inits: FxHashMap<FileId, SymbolRef>,
    /// Discriminator for mangle-renames, monotonic across the table.
    mangles: u32,
}

impl SymbolTable {
    pub fn new() -> Self {
        let interner = NameTable::new();
        let names = Names::new(&interner);
        let mut table = Self {
            interner,
            names: names.clone(),
            symbols: Vec::new(),
            diagnostics: DiagnosticCollection::new(),
            static_inits: FxHashMap::default(),
            mangles: 0,
        };

        // Well-known symbols, in the order the SymbolRef constants expect.
        let root = table.alloc(Symbol::new(SymbolRef::ROOT, names.root, SymbolFlags::CLASS));
        debug_assert_eq!(root, SymbolRef::ROOT);
        let todo = table.alloc(Symbol::new(SymbolRef::ROOT, names.todo, SymbolFlags::CLASS));
        debug_assert_eq!(todo, SymbolRef::TODO);
        for (expected, name) in [
            (SymbolRef::OBJECT, names.object),
            (SymbolRef::BASIC_OBJECT, names.basic_object),
            (SymbolRef::MAGIC, names.magic),
        ] {
            let sym = table.alloc(Symbol::new(SymbolRef::ROOT, name, SymbolFlags::CLASS));
            debug_assert_eq!(sym, expected);
            table.symbols[SymbolRef::ROOT.index()].members.insert(name, sym);
            table.symbols[sym.index()].set_is_module(false);
        }
        table
    }

    // ------------------------------------------------------------------------
    // Names
    // ------------------------------------------------------------------------

    pub fn interner(&self) -> &NameTable {
        &self.interner
    }

    #[inline]
    pub fn intern(&self, s: &str) -> NameRef {
        self.interner.intern(s)
    }

    #[inline]
    pub fn resolve(&self, name: NameRef) -> &str {
        self.interner.resolve(name)
    }

    /// Mint a fresh name that cannot collide with anything written in source.
    pub fn fresh_name_unique(&self, kind: UniqueNameKind, base: NameRef, disc: u32) -> NameRef {
        let base = self.resolve(base);
        match kind {
            UniqueNameKind::Namer => self.intern(&format!("{}${}", base, disc)),
            UniqueNameKind::PositionalArg => self.intern(&format!("{}{}", base, disc)),
            UniqueNameKind::Singleton => self.intern(&format!("<Class:{}>", base)),
        }
    }

    // ------------------------------------------------------------------------
    // Symbol access
    // ------------------------------------------------------------------------

    #[inline]
    pub fn symbol(&self, sym: SymbolRef) -> &Symbol {
        &self.symbols[sym.index()]
    }

    #[inline]
    pub fn symbol_mut(&mut self, sym: SymbolRef) -> &mut Symbol {
        &mut self.symbols[sym.index()]
    }

    pub fn symbol_count(&self) -> usize {
        self.symbols.len()
    }

    fn alloc(&mut self, symbol: Symbol) -> SymbolRef {
        let id = SymbolRef(self.symbols.len() as u32);
        self.symbols.push(symbol);
        id
    }

    /// Render a symbol's fully-qualified name (`A::B::C`).
    pub fn show(&self, sym: SymbolRef) -> String {
        if !sym.exists() {
            return "<none>".to_string();
        }
        let mut parts = Vec::new();
        let mut cur = sym;
        while cur.exists() && cur != SymbolRef::ROOT {
            let data = self.symbol(cur);
            parts.push(self.resolve(data.name).to_string());
            if data.owner == cur {
                break;
            }
            cur = data.owner;
        }
        if parts.is_empty() {
            return self.resolve(self.symbol(sym).name).to_string();
        }
        parts.reverse();
        parts.join("::")
    }

    // ------------------------------------------------------------------------
    // Lookup
    // ------------------------------------------------------------------------

    /// Find a member of `owner` by name, following alias chains.
    pub fn find_member(&self, owner: SymbolRef, name: NameRef) -> SymbolRef {
        self.dealias(self.find_member_no_dealias(owner, name))
    }

    /// Find a member of `owner` by name without following aliases.
    pub fn find_member_no_dealias(&self, owner: SymbolRef, name: NameRef) -> SymbolRef {
        self.symbol(owner)
            .members
            .get(&name)
            .copied()
            .unwrap_or(SymbolRef::NONE)
    }

    /// Follow `Alias` result types to the symbol they name.
    pub fn dealias(&self, sym: SymbolRef) -> SymbolRef {
        let mut cur = sym;
        // Alias chains are short; the bound only guards against cycles.
        for _ in 0..64 {
            if !cur.exists() {
                return cur;
            }
            match self.symbol(cur).result_type {
                Some(Type::Alias(target)) => cur = target,
                _ => return cur,
            }
        }
        cur
    }

    // ------------------------------------------------------------------------
    // Entering symbols
    // ------------------------------------------------------------------------

    fn enter_symbol(
        &mut self,
        loc: Loc,
        owner: SymbolRef,
        name: NameRef,
        flags: SymbolFlags,
    ) -> SymbolRef {
        let kind = flags
            & (SymbolFlags::CLASS
                | SymbolFlags::METHOD
                | SymbolFlags::FIELD
                | SymbolFlags::STATIC_FIELD
                | SymbolFlags::TYPE_MEMBER
                | SymbolFlags::METHOD_ARGUMENT);
        if let Some(&existing) = self.symbol(owner).members.get(&name) {
            if self.symbol(existing).flags.intersects(kind) {
                self.symbol_mut(existing).add_loc(loc);
                return existing;
            }
        }
        let mut symbol = Symbol::new(owner, name, flags);
        symbol.add_loc(loc);
        let id = self.alloc(symbol);
        self.symbol_mut(owner).members.insert(name, id);
        id
    }

    pub fn enter_class_symbol(&mut self, loc: Loc, owner: SymbolRef, name: NameRef) -> SymbolRef {
        self.enter_symbol(loc, owner, name, SymbolFlags::CLASS)
    }

    pub fn enter_method_symbol(&mut self, loc: Loc, owner: SymbolRef, name: NameRef) -> SymbolRef {
        self.enter_symbol(loc, owner, name, SymbolFlags::METHOD)
    }

    pub fn enter_method_argument_symbol(
        &mut self,
        loc: Loc,
        owner: SymbolRef,
        name: NameRef,
    ) -> SymbolRef {
        self.enter_symbol(loc, owner, name, SymbolFlags::METHOD_ARGUMENT)
    }

    pub fn enter_static_field_symbol(
        &mut self,
        loc: Loc,
        owner: SymbolRef,
        name: NameRef,
    ) -> SymbolRef {
        self.enter_symbol(loc, owner, name, SymbolFlags::STATIC_FIELD)
    }

    pub fn enter_field_symbol(&mut self, loc: Loc, owner: SymbolRef, name: NameRef) -> SymbolRef {
        self.enter_symbol(loc, owner, name, SymbolFlags::FIELD)
    }

    /// Enter a type member on `owner` and append it to the owner's ordered
    /// type-member list. Uniqueness by name is the caller's contract.
    pub fn enter_type_member(
        &mut self,
        loc: Loc,
        owner: SymbolRef,
        name: NameRef,
        variance: Variance,
    ) -> SymbolRef {
        let sym = self.enter_symbol(loc, owner, name, SymbolFlags::TYPE_MEMBER);
        self.symbol_mut(sym).variance = variance;
        if !self.symbol(owner).type_members.contains(&sym) {
            self.symbol_mut(owner).type_members.push(sym);
        }
        sym
    }

    // ------------------------------------------------------------------------
    // Renaming
    // ------------------------------------------------------------------------

    /// Move `sym` out of the way: give it a fresh mangled name and re-key it
    /// in its owner's member table, freeing `name` for a new definition.
    pub fn mangle_rename_symbol(&mut self, sym: SymbolRef, name: NameRef) {
        self.mangles += 1;
        let fresh = self.fresh_name_unique(UniqueNameKind::Namer, name, self.mangles);
        let owner = self.symbol(sym).owner;
        if self.symbol(owner).members.get(&name) == Some(&sym) {
            self.symbol_mut(owner).members.remove(&name);
        }
        self.symbol_mut(sym).name = fresh;
        self.symbol_mut(owner).members.insert(fresh, sym);
    }

    // ------------------------------------------------------------------------
    // Singleton classes
    // ------------------------------------------------------------------------

    /// The singleton class of `sym`, created on first use. Every class named
    /// by the namer has its singleton forced into existence.
    pub fn singleton_class(&mut self, sym: SymbolRef) -> SymbolRef {
        let existing = self.symbol(sym).singleton;
        if existing.exists() {
            return existing;
        }
        let name = self.fresh_name_unique(UniqueNameKind::Singleton, self.symbol(sym).name, 1);
        let owner = self.symbol(sym).owner;
        let singleton = self.enter_symbol(Loc::none(), owner, name, SymbolFlags::CLASS);
        self.symbol_mut(singleton).set_is_module(false);
        self.symbol_mut(sym).singleton = singleton;
        singleton
    }

    // ------------------------------------------------------------------------
    // Owner chains
    // ------------------------------------------------------------------------

    /// The nearest enclosing class of `sym` (possibly `sym` itself).
    pub fn enclosing_class(&self, sym: SymbolRef) -> SymbolRef {
        let mut cur = sym;
        while cur.exists() {
            let data = self.symbol(cur);
            if data.is_class() {
                return cur;
            }
            if data.owner == cur {
                break;
            }
            cur = data.owner;
        }
        SymbolRef::ROOT
    }

    /// The nearest enclosing method of `sym` (possibly `sym` itself), or
    /// `NONE` when `sym` sits at class scope.
    pub fn enclosing_method(&self, sym: SymbolRef) -> SymbolRef {
        let mut cur = sym;
        while cur.exists() {
            let data = self.symbol(cur);
            if data.is_method() {
                return cur;
            }
            if data.owner == cur {
                break;
            }
            cur = data.owner;
        }
        SymbolRef::NONE
    }

    // ------------------------------------------------------------------------
    // Static init
    // ------------------------------------------------------------------------

    /// The per-file `<static-init>` method symbol hosting top-level blocks.
    pub fn static_init_for_file(&mut self, loc: Loc) -> SymbolRef {
        if let Some(&sym) = self.static_inits.get(&loc.file) {
            return sym;
        }
        let owner = self.singleton_class(SymbolRef::ROOT);
        let name = self.intern(&format!("<static-init>${}", loc.file.0));
        let sym = self.enter_method_symbol(loc, owner, name);
        self.static_inits.insert(loc.file, sym);
        sym
    }

    // ------------------------------------------------------------------------
    // Diagnostics
    // ------------------------------------------------------------------------

    pub fn error(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.add(diagnostic);
    }
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_well_known_symbols() {
        let table = SymbolTable::new();
        assert!(table.symbol(SymbolRef::ROOT).is_class());
        assert!(table.symbol(SymbolRef::OBJECT).is_class());
        let object = table.find_member(SymbolRef::ROOT, table.names.object);
        assert_eq!(object, SymbolRef::OBJECT);
    }

    #[test]
    fn test_enter_class_reuses_existing() {
        let mut table = SymbolTable::new();
        let name = table.intern("Foo");
        let a = table.enter_class_symbol(Loc::none(), SymbolRef::ROOT, name);
        let b = table.enter_class_symbol(Loc::none(), SymbolRef::ROOT, name);
        assert_eq!(a, b);
        assert_eq!(table.find_member(SymbolRef::ROOT, name), a);
    }

    #[test]
    fn test_mangle_rename_frees_the_name() {
        let mut table = SymbolTable::new();
        let name = table.intern("Foo");
        let a = table.enter_class_symbol(Loc::none(), SymbolRef::ROOT, name);
        table.mangle_rename_symbol(a, name);
        assert!(!table.find_member(SymbolRef::ROOT, name).exists());
        let b = table.enter_class_symbol(Loc::none(), SymbolRef::ROOT, name);
        assert_ne!(a, b);
        // The mangled symbol is still reachable under its new name.
        let mangled_name = table.symbol(a).name;
        assert_eq!(table.find_member_no_dealias(SymbolRef::ROOT, mangled_name), a);
    }

    #[test]
    fn test_singleton_class_created_once() {
        let mut table = SymbolTable::new();
        let name = table.intern("Foo");
        let foo = table.enter_class_symbol(Loc::none(), SymbolRef::ROOT, name);
        let s1 = table.singleton_class(foo);
        let s2 = table.singleton_class(foo);
        assert_eq!(s1, s2);
        assert!(table.symbol(s1).is_class());
        assert_eq!(table.resolve(table.symbol(s1).name), "<Class:Foo>");
    }

    #[test]
    fn test_dealias_follows_chain() {
        let mut table = SymbolTable::new();
        let target_name = table.intern("bar");
        let alias_name = table.intern("baz");
        let target = table.enter_method_symbol(Loc::none(), SymbolRef::OBJECT, target_name);
        let alias = table.enter_method_symbol(Loc::none(), SymbolRef::OBJECT, alias_name);
        table.symbol_mut(alias).result_type = Some(Type::Alias(target));
        assert_eq!(table.dealias(alias), target);
        assert_eq!(table.find_member(SymbolRef::OBJECT, alias_name), target);
        assert_eq!(table.find_member_no_dealias(SymbolRef::OBJECT, alias_name), alias);
    }

    #[test]
    fn test_static_init_is_per_file() {
        let mut table = SymbolTable::new();
        let loc_a = Loc::new(FileId(0), rbcheck_core::text::TextSpan::new(0, 1));
        let loc_b = Loc::new(FileId(1), rbcheck_core::text::TextSpan::new(0, 1));
        let a1 = table.static_init_for_file(loc_a);
        let a2 = table.static_init_for_file(loc_a);
        let b = table.static_init_for_file(loc_b);
        assert_eq!(a1, a2);
        assert_ne!(a1, b);
        assert!(table.symbol(a1).is_method());
    }

    #[test]
    fn test_enclosing_class_and_method() {
        let mut table = SymbolTable::new();
        let cls = table.enter_class_symbol(Loc::none(), SymbolRef::ROOT, table.intern("Foo"));
        let meth = table.enter_method_symbol(Loc::none(), cls, table.intern("bar"));
        assert_eq!(table.enclosing_class(meth), cls);
        assert_eq!(table.enclosing_class(cls), cls);
        assert_eq!(table.enclosing_method(meth), meth);
        assert_eq!(table.enclosing_method(cls), SymbolRef::NONE);
    }
}
