//! rbcheck_ast: the desugared abstract syntax tree.
//!
//! The tree the namer consumes is already desugared: constant paths arrive
//! as nested `UnresolvedConstantLit`s, argument lists as reference wrappers
//! around `UnresolvedIdent`s, and every sugar form has been lowered to the
//! closed set of variants defined here.

pub mod mk;
pub mod node;
pub mod visitor;

pub use node::*;
pub use visitor::AstVisitor;
