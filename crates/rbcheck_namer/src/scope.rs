//! Scope frames for the namer.
//!
//! Two stacks drive local-variable resolution. The scope stack tracks the
//! lexical frame of the enclosing class, method, or block; the block-arg
//! stack is pushed around each method definition and records the block
//! parameter `yield` resolves to.

use rbcheck_core::intern::NameRef;
use rbcheck_core::text::Loc;
use rbcheck_symbols::LocalVariable;
use rustc_hash::FxHashMap;

/// One lexical frame on the scope stack.
#[derive(Debug)]
pub struct LocalFrame {
    /// Locals visible in this scope, by name.
    pub locals: FxHashMap<NameRef, LocalVariable>,
    /// The formal parameters of the enclosing method or block, in order.
    /// `super` without parens splices these back in.
    pub args: Vec<LocalVariable>,
    /// Set by a bare `module_function` at class scope; methods defined
    /// after it are aliased onto the singleton as they close.
    pub module_function_active: bool,
    /// The id locals declared in this scope carry, minted from a per-class
    /// counter. Method-top-level locals always use 0 instead.
    pub scope_id: u32,
}

impl LocalFrame {
    pub fn new(scope_id: u32) -> Self {
        Self {
            locals: FxHashMap::default(),
            args: Vec::new(),
            module_function_active: false,
            scope_id,
        }
    }
}

/// Block-parameter bookkeeping for one method definition.
///
/// When a method is entered, `declared` holds its explicit block parameter
/// if it has one. A `yield` in the body either uses `declared` or forces a
/// synthesized parameter into `discovered`; on exit the method grows a real
/// block argument if `discovered` is set.
#[derive(Debug)]
pub struct BlockArgFrame {
    pub declared: Option<LocalVariable>,
    pub discovered: Option<LocalVariable>,
    /// Where the first `yield` forced discovery.
    pub discovered_loc: Loc,
}

impl BlockArgFrame {
    pub fn new(declared: Option<LocalVariable>) -> Self {
        Self {
            declared,
            discovered: None,
            discovered_loc: Loc::none(),
        }
    }
}
