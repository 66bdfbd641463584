//! rbcheck_symbols: The shared symbol table.
//!
//! Every class, module, method, method argument, field, and type member in
//! the program is a [`Symbol`] stored in one process-wide [`SymbolTable`].
//! All cross-references between symbols (and from AST nodes to symbols) are
//! opaque [`SymbolRef`] ids into that arena; the table is the single owner
//! of symbol storage.

mod names;
mod symbol;
mod table;

pub use names::Names;
pub use symbol::{LocalVariable, Symbol, SymbolFlags, SymbolRef, Type, Variance};
pub use table::{SymbolTable, UniqueNameKind};
