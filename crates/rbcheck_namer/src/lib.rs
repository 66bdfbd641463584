//! rbcheck_namer: Symbol table population and tree rewriting.
//!
//! The namer walks a desugared tree and enters every class, module, method,
//! argument, constant, and type member into the shared symbol table, while
//! rewriting the tree to reference those symbols: constant-assignment
//! left-hand sides become `ConstantLit`s, identifiers become `Local`s and
//! `Field`s, `yield` becomes a call on the method's block parameter, and
//! declaration-shaped sends (`include`, `private`, `module_function`,
//! `type_member`, ...) are interpreted and consumed.
//!
//! It runs once per parsed file against a mutable table handle; files are
//! independent at this stage and accumulate into the same table.

mod namer;
mod scope;

pub use namer::Namer;
