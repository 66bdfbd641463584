//! The namer implementation.
//!
//! Walks the desugared tree and inserts class, method, argument, constant,
//! and type-member symbols into the symbol table. Handles:
//! - Constant-path squashing (`A::B::C`, `class << self`)
//! - Open classes and method redefinition reconciliation
//! - Declaration-shaped sends (`include`, `extend`, visibility wrappers,
//!   `module_function`, `alias_method`, `abstract!`, `interface!`,
//!   `type_member`, `type_template`, `block_given?`)
//! - Block-argument discovery via `yield`
//! - Local and global identifier resolution

use crate::scope::{BlockArgFrame, LocalFrame};
use rbcheck_ast::mk;
use rbcheck_ast::node::*;
use rbcheck_core::intern::NameRef;
use rbcheck_core::text::Loc;
use rbcheck_diagnostics::{messages, Diagnostic};
use rbcheck_symbols::{
    LocalVariable, SymbolFlags, SymbolRef, SymbolTable, Type, UniqueNameKind, Variance,
};

/// The walk's context: the symbol the current node is owned by. Descending
/// into a class, method, or block produces a new context value; the old one
/// is restored on ascent by virtue of being a copy on the caller's stack.
#[derive(Debug, Copy, Clone)]
struct Ctx {
    owner: SymbolRef,
}

impl Ctx {
    fn with_owner(self, owner: SymbolRef) -> Ctx {
        Ctx { owner }
    }
}

/// One argument node decoded into a flat descriptor. The reference wrappers
/// compose (`KeywordArg(OptionalArg(ident))`), so parsing walks to the
/// `UnresolvedIdent` leaf collecting flags on the way.
struct ParsedArg {
    name: NameRef,
    loc: Loc,
    default: Option<Expr>,
    keyword: bool,
    block: bool,
    repeated: bool,
    shadow: bool,
}

/// Inserts symbols for all definitions in one file's tree and rewrites the
/// tree to reference them.
struct NameInserter<'gs> {
    gs: &'gs mut SymbolTable,
    scope_stack: Vec<LocalFrame>,
    /// Scope ids for block locals, reset at each class definition.
    scope_counter: u32,
    block_arg_stack: Vec<BlockArgFrame>,
}

impl<'gs> NameInserter<'gs> {
    fn new(gs: &'gs mut SymbolTable) -> Self {
        let mut inserter = Self {
            gs,
            scope_stack: Vec::new(),
            scope_counter: 0,
            block_arg_stack: Vec::new(),
        };
        inserter.enter_scope();
        inserter
    }

    // ========================================================================
    // Scope management
    // ========================================================================

    fn enter_scope(&mut self) -> &mut LocalFrame {
        self.scope_stack.push(LocalFrame::new(self.scope_counter));
        self.scope_counter += 1;
        self.scope_stack.last_mut().unwrap()
    }

    fn exit_scope(&mut self) {
        self.scope_stack.pop();
    }

    fn enter_local(&self, ctx: Ctx, name: NameRef) -> LocalVariable {
        if !self.gs.symbol(ctx.owner).is_block_symbol() {
            return LocalVariable::new(name, 0);
        }
        LocalVariable::new(name, self.scope_stack.last().unwrap().scope_id)
    }

    /// The block parameter `yield` and `block_given?` resolve to: the
    /// enclosing method's declared block argument, or a synthesized one
    /// recorded on the block-arg frame.
    fn find_or_create_block_parameter(&mut self, loc: Loc) -> LocalVariable {
        let blk_arg = self.gs.names.blk_arg;
        let frame = self
            .block_arg_stack
            .last_mut()
            .expect("find_or_create_block_parameter called outside a method");
        if let Some(declared) = frame.declared {
            return declared;
        }
        if let Some(discovered) = frame.discovered {
            return discovered;
        }
        // Found a yield and the method has no block argument; make one.
        //
        // Implicit block parameters are always declared as arguments to a
        // method, and method top-level locals always have unique_id 0, so
        // the local is synthesized directly rather than via `enter_local`
        // (which would enter it into the current scope, possibly a block).
        let discovered = LocalVariable::new(blk_arg, 0);
        frame.discovered = Some(discovered);
        frame.discovered_loc = loc;
        discovered
    }

    // ========================================================================
    // Constant-path squashing
    // ========================================================================

    /// Resolve a possibly-nested constant path under `owner`, entering any
    /// missing class symbols on the way, and rewrite the path into a
    /// resolved `ConstantLit`. Returns the symbol the whole path denotes.
    fn squash_names(&mut self, ctx: Ctx, owner: SymbolRef, node: &mut Expr) -> SymbolRef {
        match node {
            Expr::UnresolvedConstantLit(_) => {}
            Expr::ConstantLit(c) => return self.gs.dealias(c.symbol),
            Expr::UnresolvedIdent(id) => {
                // Emitted via `class << self` blocks.
                assert_eq!(id.kind, IdentKind::Class, "scope ident is not a class ident");
                assert_eq!(id.name, self.gs.names.singleton, "scope ident is not <singleton>");
                let loc = id.loc;
                *node = mk::empty_tree(loc);
                return owner;
            }
            Expr::EmptyTree(_) => return owner,
            other => panic!("scope is a {}", other.node_name()),
        }

        let loc = node.loc();
        let Expr::UnresolvedConstantLit(mut const_lit) =
            std::mem::replace(node, mk::empty_tree(loc))
        else {
            unreachable!();
        };
        let new_owner = self.squash_names(ctx, owner, &mut const_lit.scope);
        let mut existing = self.gs.find_member(new_owner, const_lit.cnst);
        if !existing.exists() {
            existing = self
                .gs
                .enter_class_symbol(const_lit.loc, new_owner, const_lit.cnst);
            self.gs.singleton_class(existing); // force singleton class into existence
        }

        *node = mk::resolved_constant(const_lit.loc, existing, const_lit);
        existing
    }

    // ========================================================================
    // Arguments
    // ========================================================================

    fn parse_arg(&mut self, arg: Expr) -> ParsedArg {
        match arg {
            Expr::UnresolvedIdent(nm) => ParsedArg {
                name: nm.name,
                loc: nm.loc,
                default: None,
                keyword: false,
                block: false,
                repeated: false,
                shadow: false,
            },
            Expr::RestArg(rest) => {
                let mut parsed = self.parse_arg(*rest.expr);
                parsed.repeated = true;
                parsed
            }
            Expr::KeywordArg(kw) => {
                let mut parsed = self.parse_arg(*kw.expr);
                parsed.keyword = true;
                parsed
            }
            Expr::OptionalArg(opt) => {
                let mut parsed = self.parse_arg(*opt.expr);
                parsed.default = Some(*opt.default);
                parsed
            }
            Expr::BlockArg(blk) => {
                let mut parsed = self.parse_arg(*blk.expr);
                parsed.block = true;
                parsed
            }
            Expr::ShadowArg(shadow) => {
                let mut parsed = self.parse_arg(*shadow.expr);
                parsed.shadow = true;
                parsed
            }
            other => panic!("argument node must be a reference, got {}", other.node_name()),
        }
    }

    /// Produce (or reuse) the argument symbol at position `pos` of the
    /// current owner, and the `Local` node that replaces the written arg.
    fn arg_to_symbol(&mut self, ctx: Ctx, pos: usize, parsed: ParsedArg) -> (SymbolRef, Expr) {
        if pos < self.gs.symbol(ctx.owner).arguments.len() {
            // Redefinition of an existing method; reuse the symbol. Flag
            // mismatches were caught by params_match before this path.
            let sym = self.gs.symbol(ctx.owner).arguments[pos];
            let local = self.enter_local(ctx, parsed.name);
            return (sym, mk::local(parsed.loc, local));
        }

        let name = if parsed.keyword {
            parsed.name
        } else if parsed.block {
            self.gs.names.blk_arg
        } else {
            let base = self.gs.names.arg;
            self.gs
                .fresh_name_unique(UniqueNameKind::PositionalArg, base, pos as u32 + 1)
        };
        let sym = self.gs.enter_method_argument_symbol(parsed.loc, ctx.owner, name);
        let local = self.enter_local(ctx, parsed.name);
        let mut local_expr = mk::local(parsed.loc, local);

        if let Some(default) = parsed.default {
            self.gs.symbol_mut(sym).set_optional();
            local_expr = mk::optional_arg(parsed.loc, local_expr, default);
        }
        if parsed.keyword {
            self.gs.symbol_mut(sym).set_keyword();
        }
        if parsed.block {
            self.gs.symbol_mut(sym).set_block_argument();
        }
        if parsed.repeated {
            self.gs.symbol_mut(sym).set_repeated();
        }
        (sym, local_expr)
    }

    /// Fill argument symbols into the owner (a method or block symbol) and
    /// produce the rewritten argument nodes. Also binds each argument as a
    /// local in the current frame and records it in the frame's `args` for
    /// `super` splicing.
    fn fill_in_args(&mut self, ctx: Ctx, parsed_args: Vec<ParsedArg>) -> Vec<Expr> {
        let mut args = Vec::with_capacity(parsed_args.len());
        let mut in_shadows = false;

        for (i, arg) in parsed_args.into_iter().enumerate() {
            let name = arg.name;
            let loc = arg.loc;
            let local_variable = self.enter_local(ctx, name);

            if arg.shadow {
                in_shadows = true;
                args.push(mk::local(loc, local_variable));
            } else {
                assert!(!in_shadows, "shadow argument followed by non-shadow argument");
                let (sym, local_expr) = self.arg_to_symbol(ctx, i, arg);
                args.push(local_expr);
                if i < self.gs.symbol(ctx.owner).arguments.len() {
                    assert_eq!(
                        self.gs.symbol(ctx.owner).arguments[i],
                        sym,
                        "argument symbol does not match its position"
                    );
                } else {
                    self.gs.symbol_mut(ctx.owner).arguments.push(sym);
                }
            }

            let frame = self.scope_stack.last_mut().unwrap();
            frame.locals.insert(name, local_variable);
            frame.args.push(local_variable);
        }

        args
    }

    // ========================================================================
    // Mixins and aliases
    // ========================================================================

    /// If `line` is an `include`/`extend` on `self`, move its arguments onto
    /// the class's ancestor lists and report the statement as consumed.
    ///
    /// The anchors mark where the mixin region begins (after the desugared
    /// superclass slot). Each mixin lands at the head of that region, so the
    /// final list is in reverse source order: later-included mixins come
    /// first in method lookup.
    fn add_ancestor(
        &mut self,
        _ctx: Ctx,
        klass: &mut ClassDef,
        line: &mut Expr,
        ancestors_anchor: usize,
        singleton_anchor: usize,
    ) -> bool {
        let names = self.gs.names.clone();
        let Expr::Send(send) = line else {
            return false;
        };

        let is_include = send.fun == names.include;
        let is_extend = send.fun == names.extend;
        if !is_include && !is_extend {
            return false;
        }
        if !send.recv.is_self() {
            // ignore `something.include`
            return false;
        }

        if send.args.is_empty() {
            let fun = self.gs.resolve(send.fun).to_string();
            self.gs.error(Diagnostic::with_location(
                send.loc,
                &messages::INCLUDE_REQUIRES_AT_LEAST_ONE_ARGUMENT,
                &[&fun],
            ));
            return false;
        }

        if send.block.is_some() {
            let fun = self.gs.resolve(send.fun).to_string();
            self.gs.error(Diagnostic::with_location(
                send.loc,
                &messages::INCLUDE_CANNOT_BE_PASSED_A_BLOCK,
                &[&fun],
            ));
            return false;
        }

        for arg in send.args.drain(..) {
            if arg.is_empty_tree() {
                continue;
            }
            assert!(
                matches!(arg, Expr::UnresolvedConstantLit(_)),
                "desugarer should only allow constant literals here, got {}",
                arg.node_name()
            );
            if is_include {
                klass.ancestors.insert(ancestors_anchor, arg);
            } else {
                klass.singleton_ancestors.insert(singleton_anchor, arg);
            }
        }

        true
    }

    fn alias_method(&mut self, owner: SymbolRef, new_name: NameRef, method: SymbolRef) {
        let loc = self.gs.symbol(method).loc();
        let alias = self.gs.enter_method_symbol(loc, owner, new_name);
        self.gs.symbol_mut(alias).result_type = Some(Type::Alias(method));
    }

    /// `module_function` semantics: copy the method onto its owner's
    /// singleton class under the same name.
    fn alias_module_function(&mut self, method: SymbolRef) {
        let owner = self.gs.symbol(method).owner;
        let name = self.gs.symbol(method).name;
        let singleton = self.gs.singleton_class(owner);
        self.alias_method(singleton, name, method);
    }

    /// The class a method defined here lands on. Methods at the top level
    /// go on Object.
    fn method_owner(&self, ctx: Ctx) -> SymbolRef {
        let owner = self.gs.enclosing_class(ctx.owner);
        if owner == SymbolRef::ROOT {
            return SymbolRef::OBJECT;
        }
        owner
    }

    // ========================================================================
    // Class definitions
    // ========================================================================

    fn pre_transform_class_def(&mut self, ctx: Ctx, klass: &mut ClassDef) {
        let singleton_name = self.gs.names.singleton;
        let is_singleton = match &*klass.name {
            Expr::UnresolvedIdent(id) if id.name == singleton_name => {
                assert_eq!(id.kind, IdentKind::Class, "<singleton> ident must be class-kind");
                true
            }
            _ => false,
        };

        if is_singleton {
            // `class << self`
            let context_class = self.gs.enclosing_class(ctx.owner);
            klass.symbol = self.gs.singleton_class(context_class);
        } else {
            if klass.symbol == SymbolRef::TODO {
                let enclosing = self.gs.enclosing_class(ctx.owner);
                klass.symbol = self.squash_names(ctx, enclosing, &mut klass.name);
            } else {
                // The desugarer populates a top-level root ClassDef; nothing
                // else should arrive already resolved.
                assert_eq!(klass.symbol, SymbolRef::ROOT, "unexpected pre-resolved class");
            }

            let is_module = klass.kind == ClassDefKind::Module;
            if !self.gs.symbol(klass.symbol).is_class() {
                let shown = self.gs.show(klass.symbol);
                let prev_loc = self.gs.symbol(klass.symbol).loc();
                self.gs.error(
                    Diagnostic::with_location(klass.loc, &messages::REDEFINING_CONSTANT, &[&shown])
                        .with_related(Diagnostic::with_location(
                            prev_loc,
                            &messages::PREVIOUS_DEFINITION,
                            &[],
                        )),
                );
                let orig_name = self.gs.symbol(klass.symbol).name;
                let owner = self.gs.symbol(klass.symbol).owner;
                self.gs.mangle_rename_symbol(klass.symbol, orig_name);
                klass.symbol = self.gs.enter_class_symbol(klass.decl_loc, owner, orig_name);
            } else if self.gs.symbol(klass.symbol).is_class_module_set()
                && is_module != self.gs.symbol(klass.symbol).is_class_module()
            {
                let shown = self.gs.show(klass.symbol);
                let prior = if self.gs.symbol(klass.symbol).is_class_module() {
                    "module"
                } else {
                    "class"
                };
                self.gs.error(Diagnostic::with_location(
                    klass.loc,
                    &messages::PREVIOUSLY_DEFINED_AS,
                    &[&shown, prior],
                ));
            } else {
                self.gs.symbol_mut(klass.symbol).set_is_module(is_module);
            }
        }
        self.scope_counter = 0;
        self.enter_scope();
    }

    /// Recognize and apply declaration-shaped statements in a class body.
    /// Returns true when the statement was consumed.
    fn handle_class_dsl(
        &mut self,
        ctx: Ctx,
        klass: &mut ClassDef,
        line: &mut Expr,
        ancestors_anchor: usize,
        singleton_anchor: usize,
    ) -> bool {
        if self.add_ancestor(ctx, klass, line, ancestors_anchor, singleton_anchor) {
            return true;
        }

        let names = self.gs.names.clone();
        let Expr::Send(send) = line else {
            return false;
        };
        if send.fun != names.declare_interface && send.fun != names.declare_abstract {
            return false;
        }

        self.gs.symbol_mut(klass.symbol).set_class_abstract();
        let singleton = self.gs.singleton_class(klass.symbol);
        self.gs.symbol_mut(singleton).set_class_abstract();

        if send.fun == names.declare_interface {
            self.gs.symbol_mut(klass.symbol).set_class_interface();

            if klass.kind == ClassDefKind::Class {
                self.gs.error(Diagnostic::with_location(
                    send.loc,
                    &messages::CLASSES_CANT_BE_INTERFACES,
                    &[],
                ));
            }
        }
        true
    }

    /// Whether an ancestor node should be kept around for IDE queries.
    fn should_leave_ancestor_for_ide(&self, anc: &Expr) -> bool {
        // EmptyTree/Self signal a class with no explicit superclass.
        match anc {
            Expr::EmptyTree(_) | Expr::SelfExpr(_) => false,
            Expr::ConstantLit(c) if c.symbol == SymbolRef::TODO => false,
            _ => true,
        }
    }

    fn post_transform_class_def(&mut self, ctx: Ctx, mut klass: ClassDef) -> Expr {
        self.exit_scope();
        if klass.kind == ClassDefKind::Class
            && !self.gs.symbol(klass.symbol).super_class.exists()
            && klass.symbol != SymbolRef::BASIC_OBJECT
        {
            self.gs.symbol_mut(klass.symbol).super_class = SymbolRef::TODO;
        }

        let decl_loc = klass.decl_loc;
        self.gs.symbol_mut(klass.symbol).add_loc(decl_loc);
        self.gs.singleton_class(klass.symbol); // force singleton class into existence

        let ancestors_anchor = klass.ancestors.len();
        let singleton_anchor = klass.singleton_ancestors.len();
        let rhs = std::mem::take(&mut klass.rhs);
        let mut kept = Vec::with_capacity(rhs.len());
        for mut line in rhs {
            if !self.handle_class_dsl(ctx, &mut klass, &mut line, ancestors_anchor, singleton_anchor)
            {
                kept.push(line);
            }
        }
        klass.rhs = kept;

        if !klass.ancestors.is_empty() {
            // The superclass binds in the enclosing scope; mixins bind in
            // the class body.
            for (i, anc) in klass.ancestors.iter().enumerate() {
                if self.should_leave_ancestor_for_ide(anc)
                    && (klass.kind == ClassDefKind::Module || i != 0)
                {
                    klass.rhs.push(mk::keep_for_ide(anc.clone()));
                }
            }
        }
        let mut ide_seqs = Vec::new();
        if matches!(&*klass.name, Expr::ConstantLit(_)) {
            ide_seqs.push(mk::keep_for_ide((*klass.name).clone()));
        }
        if klass.kind == ClassDefKind::Class
            && !klass.ancestors.is_empty()
            && self.should_leave_ancestor_for_ide(&klass.ancestors[0])
        {
            ide_seqs.push(mk::keep_for_ide(klass.ancestors[0].clone()));
        }
        mk::ins_seq(decl_loc, ide_seqs, Expr::ClassDef(klass))
    }

    // ========================================================================
    // Method definitions
    // ========================================================================

    /// Stub symbols created to hold intrinsics may be filled in with real
    /// definitions from source.
    fn is_intrinsic(&self, sym: SymbolRef) -> bool {
        let data = self.gs.symbol(sym);
        data.intrinsic && data.arguments.is_empty() && data.result_type.is_none()
    }

    /// Whether a redefinition's parameters match the existing symbol's.
    /// Emits RedefinitionOfMethod diagnostics on every mismatch.
    fn params_match(&mut self, sym: SymbolRef, loc: Loc, parsed_args: &[ParsedArg]) -> bool {
        let prev_loc = self.gs.symbol(sym).loc();
        let sym_arg_count = self.gs.symbol(sym).arguments.len();
        if sym_arg_count != parsed_args.len() {
            let shown = self.gs.show(sym);
            let expected = sym_arg_count.to_string();
            let got = parsed_args.len().to_string();
            self.gs.error(
                Diagnostic::with_location(
                    loc,
                    &messages::METHOD_REDEFINED_ARGUMENT_COUNT,
                    &[&shown, &expected, &got],
                )
                .with_related(Diagnostic::with_location(
                    prev_loc,
                    &messages::PREVIOUS_DEFINITION,
                    &[],
                )),
            );
            return false;
        }

        for (i, method_arg) in parsed_args.iter().enumerate() {
            let sym_arg_ref = self.gs.symbol(sym).arguments[i];
            let sym_arg = self.gs.symbol(sym_arg_ref);
            let (is_keyword, is_block, is_repeated, arg_name) = (
                sym_arg.is_keyword(),
                sym_arg.is_block_argument(),
                sym_arg.is_repeated(),
                sym_arg.name,
            );

            let mismatch = if is_keyword != method_arg.keyword {
                Some(("isKeyword", is_keyword, method_arg.keyword))
            } else if is_block != method_arg.block {
                Some(("isBlock", is_block, method_arg.block))
            } else if is_repeated != method_arg.repeated {
                Some(("isRepeated", is_repeated, method_arg.repeated))
            } else {
                None
            };
            if let Some((attribute, expected, got)) = mismatch {
                let shown = self.gs.show(sym);
                let expected = expected.to_string();
                let got = got.to_string();
                self.gs.error(
                    Diagnostic::with_location(
                        loc,
                        &messages::METHOD_REDEFINED_ARGUMENT_ATTRIBUTE,
                        &[&shown, attribute, &expected, &got],
                    )
                    .with_related(Diagnostic::with_location(
                        prev_loc,
                        &messages::PREVIOUS_DEFINITION,
                        &[],
                    )),
                );
                return false;
            }
            if is_keyword && arg_name != method_arg.name {
                let shown = self.gs.show(sym);
                let expected = self.gs.resolve(arg_name).to_string();
                let got = self.gs.resolve(method_arg.name).to_string();
                self.gs.error(
                    Diagnostic::with_location(
                        loc,
                        &messages::METHOD_REDEFINED_ARGUMENT_NAME,
                        &[&shown, &expected, &got],
                    )
                    .with_related(Diagnostic::with_location(
                        prev_loc,
                        &messages::PREVIOUS_DEFINITION,
                        &[],
                    )),
                );
                return false;
            }
        }

        true
    }

    fn push_block_arg(&mut self, parsed_args: &[ParsedArg]) {
        let declared = match parsed_args.last() {
            Some(parsed) if parsed.block => Some(LocalVariable::new(parsed.name, 0)),
            _ => None,
        };
        self.block_arg_stack.push(BlockArgFrame::new(declared));
    }

    fn pre_transform_method_def(&mut self, ctx: Ctx, method: &mut MethodDef) {
        self.enter_scope();

        let mut owner = self.method_owner(ctx);
        if method.is_self && self.gs.symbol(owner).is_class() {
            owner = self.gs.singleton_class(owner);
        }
        assert!(self.gs.symbol(owner).is_class(), "method owner must be a class");

        let mut parsed_args = Vec::with_capacity(method.args.len());
        for arg in method.args.drain(..) {
            parsed_args.push(self.parse_arg(arg));
        }

        let sym = self.gs.find_member(owner, method.name);
        if sym.exists() {
            if method.decl_loc == self.gs.symbol(sym).loc() {
                // Reparsing the same file: reuse the symbol and its argument
                // symbols as-is.
                method.symbol = sym;
                self.push_block_arg(&parsed_args);
                method.args = self.fill_in_args(ctx.with_owner(sym), parsed_args);
                return;
            }
            if self.is_intrinsic(sym) || self.params_match(sym, method.decl_loc, &parsed_args) {
                self.gs.symbol_mut(sym).add_loc(method.decl_loc);
            } else {
                self.gs.mangle_rename_symbol(sym, method.name);
            }
        }
        method.symbol = self.gs.enter_method_symbol(method.decl_loc, owner, method.name);
        self.push_block_arg(&parsed_args);
        method.args = self.fill_in_args(ctx.with_owner(method.symbol), parsed_args);
        self.gs.symbol_mut(method.symbol).add_loc(method.decl_loc);
        if method.is_dsl_synthesized {
            self.gs.symbol_mut(method.symbol).set_dsl_synthesized();
        }
    }

    fn post_transform_method_def(&mut self, _ctx: Ctx, method: &mut MethodDef) {
        let frame = self
            .block_arg_stack
            .pop()
            .expect("method close without a block-arg frame");
        if let Some(discovered) = frame.discovered {
            let blk = self
                .gs
                .enter_method_argument_symbol(Loc::none(), method.symbol, discovered.name);
            self.gs.symbol_mut(blk).set_block_argument();
            self.gs.symbol_mut(blk).result_type = Some(Type::Untyped);
            if !self.gs.symbol(method.symbol).arguments.contains(&blk) {
                self.gs.symbol_mut(method.symbol).arguments.push(blk);
            }
            method.args.push(mk::local(frame.discovered_loc, discovered));
        }

        assert_eq!(
            method.args.len(),
            self.gs.symbol(method.symbol).arguments.len(),
            "{}: AST argument count diverged from symbol argument count",
            self.gs.resolve(method.name)
        );
        self.exit_scope();
        if self
            .scope_stack
            .last()
            .map_or(false, |frame| frame.module_function_active)
        {
            self.alias_module_function(method.symbol);
        }
    }

    // ========================================================================
    // Blocks
    // ========================================================================

    fn pre_transform_block(&mut self, ctx: Ctx, blk: &mut Block) {
        let mut owner = ctx.owner;
        if owner == SymbolRef::NONE || owner == SymbolRef::ROOT {
            // Introduce an intermediate host for the block.
            assert!(blk.loc.exists(), "top-level block must have a location");
            owner = self.gs.static_init_for_file(blk.loc);
        } else if self.gs.symbol(owner).is_class() {
            // At class scope we are actually in the context of the
            // singleton class.
            owner = self.gs.singleton_class(owner);
        }

        let counter = {
            let data = self.gs.symbol_mut(owner);
            data.unique_counter += 1;
            data.unique_counter
        };
        let block_temp = self.gs.names.block_temp;
        let name = self
            .gs
            .fresh_name_unique(UniqueNameKind::Namer, block_temp, counter);
        blk.symbol = self.gs.enter_method_symbol(blk.loc, owner, name);
        self.gs.symbol_mut(blk.symbol).flags |= SymbolFlags::BLOCK_SYMBOL;

        let outer_args = self.scope_stack.last().unwrap().args.clone();
        let parent_locals = self.scope_stack.last().unwrap().locals.clone();
        let frame = self.enter_scope();
        frame.args = outer_args;
        // Block bodies see the enclosing scope's locals; arguments that
        // shadow them are overwritten by fill_in_args below.
        frame.locals = parent_locals;

        let mut parsed_args = Vec::with_capacity(blk.args.len());
        for arg in blk.args.drain(..) {
            parsed_args.push(self.parse_arg(arg));
        }
        blk.args = self.fill_in_args(ctx.with_owner(blk.symbol), parsed_args);
    }

    fn post_transform_block(&mut self) {
        // The block-arg stack is deliberately untouched: `yield` resolves
        // to the enclosing method's block parameter, not the block's.
        self.exit_scope();
    }

    // ========================================================================
    // Sends
    // ========================================================================

    fn post_transform_send(&mut self, ctx: Ctx, mut send: Send) -> Expr {
        let names = self.gs.names.clone();

        if send.args.len() == 1 && matches!(send.args[0], Expr::ZSuperArgs(_)) {
            send.args.clear();
            let method = self.gs.enclosing_method(ctx.owner);
            if method.exists() && self.gs.symbol(method).is_method() {
                let formals = self.scope_stack.last().unwrap().args.clone();
                for arg in formals {
                    send.args.push(mk::local(send.loc, arg));
                }
            } else {
                self.gs.error(Diagnostic::with_location(
                    send.loc,
                    &messages::SUPER_OUTSIDE_OF_METHOD,
                    &["super"],
                ));
            }
        }

        if send.args.len() == 1 && matches!(send.args[0], Expr::MethodDef(_)) {
            let visibility_wrapper = send.fun == names.private
                || send.fun == names.private_class_method
                || send.fun == names.protected
                || send.fun == names.public
                || send.fun == names.module_function;
            if visibility_wrapper {
                let Some(Expr::MethodDef(mdef)) = send.args.pop() else {
                    unreachable!();
                };
                if send.fun == names.private || send.fun == names.private_class_method {
                    self.gs.symbol_mut(mdef.symbol).set_private();
                } else if send.fun == names.protected {
                    self.gs.symbol_mut(mdef.symbol).set_protected();
                } else if send.fun == names.public {
                    self.gs.symbol_mut(mdef.symbol).set_public();
                } else {
                    self.alias_module_function(mdef.symbol);
                }
                return Expr::MethodDef(mdef);
            }
        }

        if send.recv.is_self() {
            if send.fun == names.module_function {
                if send.args.is_empty() {
                    self.scope_stack.last_mut().unwrap().module_function_active = true;
                } else {
                    for arg in &send.args {
                        let symbol_name = match arg {
                            Expr::Literal(lit) => lit.as_symbol(),
                            _ => None,
                        };
                        let Some(name) = symbol_name else {
                            let fun = self.gs.resolve(send.fun).to_string();
                            self.gs.error(Diagnostic::with_location(
                                arg.loc(),
                                &messages::ARGUMENTS_MUST_BE_SYMBOL_LITERALS,
                                &[&fun],
                            ));
                            continue;
                        };

                        let meth = self.gs.find_member(self.method_owner(ctx), name);
                        if !meth.exists() {
                            let fun = self.gs.resolve(send.fun).to_string();
                            let shown = self.gs.resolve(name).to_string();
                            self.gs.error(Diagnostic::with_location(
                                arg.loc(),
                                &messages::NO_SUCH_METHOD,
                                &[&fun, &shown],
                            ));
                            continue;
                        }
                        self.alias_module_function(meth);
                    }
                }
            } else if send.fun == names.alias_method {
                let mut symbol_args = Vec::with_capacity(send.args.len());
                for arg in &send.args {
                    let symbol_name = match arg {
                        Expr::Literal(lit) => lit.as_symbol(),
                        _ => None,
                    };
                    match symbol_name {
                        Some(name) => symbol_args.push(name),
                        None => {
                            let fun = self.gs.resolve(send.fun).to_string();
                            self.gs.error(Diagnostic::with_location(
                                arg.loc(),
                                &messages::ARGUMENTS_MUST_BE_SYMBOL_LITERALS,
                                &[&fun],
                            ));
                        }
                    }
                }
                if send.args.len() != 2 {
                    let fun = self.gs.resolve(send.fun).to_string();
                    let got = send.args.len().to_string();
                    self.gs.error(Diagnostic::with_location(
                        send.loc,
                        &messages::WRONG_NUMBER_OF_ARGUMENTS,
                        &[&fun, "2", &got],
                    ));
                } else if symbol_args.len() == 2 {
                    let owner = self.method_owner(ctx);
                    let meth = self.gs.find_member(owner, symbol_args[1]);
                    if !meth.exists() {
                        let fun = self.gs.resolve(send.fun).to_string();
                        let shown = self.gs.resolve(symbol_args[1]).to_string();
                        self.gs.error(Diagnostic::with_location(
                            send.args[1].loc(),
                            &messages::NO_SUCH_METHOD,
                            &[&fun, &shown],
                        ));
                    } else {
                        self.alias_method(owner, symbol_args[0], meth);
                    }
                }
            } else if send.fun == names.block_given && !self.block_arg_stack.is_empty() {
                // Rewrite `block_given?` into `blk ? block_given? : false`.
                // The conditional keeps the true|false type while letting
                // inference correlate the result with `blk`'s truthiness.
                let loc = send.loc;
                let block_arg = self.find_or_create_block_parameter(loc);
                return mk::if_(
                    loc,
                    mk::local(loc, block_arg),
                    Expr::Send(send),
                    mk::false_(loc),
                );
            }
        }

        Expr::Send(send)
    }

    // ========================================================================
    // Identifiers, self, assignments, yield
    // ========================================================================

    fn post_transform_unresolved_ident(&mut self, ctx: Ctx, nm: UnresolvedIdent) -> Expr {
        match nm.kind {
            IdentKind::Local => {
                let existing = self
                    .scope_stack
                    .last()
                    .unwrap()
                    .locals
                    .get(&nm.name)
                    .copied();
                let cur = match existing {
                    Some(local) => local,
                    None => {
                        let local = self.enter_local(ctx, nm.name);
                        self.scope_stack
                            .last_mut()
                            .unwrap()
                            .locals
                            .insert(nm.name, local);
                        local
                    }
                };
                mk::local(nm.loc, cur)
            }
            IdentKind::Global => {
                let mut sym = self.gs.find_member(SymbolRef::ROOT, nm.name);
                if !sym.exists() {
                    sym = self.gs.enter_field_symbol(nm.loc, SymbolRef::ROOT, nm.name);
                }
                mk::field(nm.loc, sym)
            }
            // Instance and class variables are handled by later passes.
            _ => Expr::UnresolvedIdent(nm),
        }
    }

    fn self_class(&mut self, ctx: Ctx) -> SymbolRef {
        let enclosing = self.gs.enclosing_class(ctx.owner);
        if ctx.owner == enclosing {
            // In a class body, `self` is the class object itself.
            return self.gs.singleton_class(enclosing);
        }
        enclosing
    }

    fn post_transform_self(&mut self, ctx: Ctx, mut node: SelfExpr) -> Expr {
        node.claz = self.self_class(ctx);
        Expr::SelfExpr(node)
    }

    /// Bind a constant assignment's LHS to a static-field symbol, squashing
    /// the path and renaming any conflicting non-static-field definition.
    fn fill_assign(&mut self, ctx: Ctx, mut asgn: Assign) -> Assign {
        let lhs_loc = asgn.lhs.loc();
        let Expr::UnresolvedConstantLit(mut lhs) =
            std::mem::replace(&mut *asgn.lhs, mk::empty_tree(lhs_loc))
        else {
            panic!("fill_assign requires an unresolved constant LHS");
        };

        let context_class = self.gs.enclosing_class(ctx.owner);
        let scope = self.squash_names(ctx, context_class, &mut lhs.scope);
        let sym = self.gs.find_member_no_dealias(scope, lhs.cnst);
        if sym.exists() && !self.gs.symbol(sym).is_static_field() {
            let shown = self.gs.resolve(lhs.cnst).to_string();
            let prev_loc = self.gs.symbol(sym).loc();
            self.gs.error(
                Diagnostic::with_location(asgn.loc, &messages::REDEFINING_CONSTANT, &[&shown])
                    .with_related(Diagnostic::with_location(
                        prev_loc,
                        &messages::PREVIOUS_DEFINITION,
                        &[],
                    )),
            );
            let name = self.gs.symbol(sym).name;
            self.gs.mangle_rename_symbol(sym, name);
        }
        let cnst = self.gs.enter_static_field_symbol(lhs.loc, scope, lhs.cnst);
        let loc = lhs.loc;
        *asgn.lhs = mk::resolved_constant(loc, cnst, lhs);
        asgn
    }

    /// `X = type_member(...)` / `X = type_template(...)` at class scope:
    /// declare a type parameter on the class (or its singleton).
    fn handle_type_member_definition(&mut self, ctx: Ctx, mut asgn: Assign) -> Expr {
        let names = self.gs.names.clone();
        let (cnst, type_name_loc) = {
            let Expr::UnresolvedConstantLit(type_name) = &*asgn.lhs else {
                unreachable!("caller checked the LHS shape");
            };
            (type_name.cnst, type_name.loc)
        };

        let mut variance = Variance::Invariant;
        let (send_loc, send_fun, send_arg_count) = {
            let Expr::Send(send) = &*asgn.rhs else {
                unreachable!("caller checked the RHS shape");
            };
            (send.loc, send.fun, send.args.len())
        };
        let is_type_template = send_fun == names.type_template;

        if !self.gs.symbol(ctx.owner).is_class() {
            self.gs.error(Diagnostic::with_location(
                send_loc,
                &messages::TYPES_MUST_BE_DEFINED_IN_CLASS_SCOPES,
                &[],
            ));
            return mk::empty_tree(asgn.loc);
        }

        let on_symbol = if is_type_template {
            self.gs.singleton_class(ctx.owner)
        } else {
            ctx.owner
        };

        if send_arg_count > 0 {
            if send_arg_count > 2 {
                self.gs.error(Diagnostic::with_location(
                    send_loc,
                    &messages::TOO_MANY_ARGS_IN_TYPE_DEFINITION,
                    &[],
                ));
                return mk::empty_tree(asgn.loc);
            }

            let first_symbol = {
                let Expr::Send(send) = &*asgn.rhs else { unreachable!() };
                match &send.args[0] {
                    Expr::Literal(lit) => lit.as_symbol().map(|name| (name, lit.loc)),
                    _ => None,
                }
            };
            match first_symbol {
                Some((name, lit_loc)) => {
                    if name == names.covariant || name == names.out_ {
                        variance = Variance::CoVariant;
                    } else if name == names.contravariant || name == names.in_ {
                        variance = Variance::ContraVariant;
                    } else if name == names.invariant {
                        variance = Variance::Invariant;
                    } else {
                        self.gs.error(Diagnostic::with_location(
                            lit_loc,
                            &messages::INVALID_VARIANCE_KIND,
                            &[":covariant", ":contravariant"],
                        ));
                    }
                }
                None => {
                    let first_is_hash = {
                        let Expr::Send(send) = &*asgn.rhs else { unreachable!() };
                        matches!(send.args[0], Expr::Hash(_))
                    };
                    if send_arg_count != 1 || !first_is_hash {
                        self.gs.error(Diagnostic::with_location(
                            send_loc,
                            &messages::INVALID_PARAM_MUST_BE_A_SYMBOL,
                            &[],
                        ));
                    }
                }
            }
        }

        let duplicate = self
            .gs
            .symbol(on_symbol)
            .type_members
            .iter()
            .any(|&member| self.gs.symbol(member).name == cnst);
        if duplicate {
            let shown = self.gs.resolve(cnst).to_string();
            self.gs.error(Diagnostic::with_location(
                type_name_loc,
                &messages::DUPLICATE_TYPE_MEMBER,
                &[&shown],
            ));
            return mk::empty_tree(asgn.loc);
        }

        let old_sym = self.gs.find_member_no_dealias(on_symbol, cnst);
        if old_sym.exists() {
            let shown = self.gs.show(old_sym);
            let prev_loc = self.gs.symbol(old_sym).loc();
            self.gs.error(
                Diagnostic::with_location(type_name_loc, &messages::REDEFINING_CONSTANT, &[&shown])
                    .with_related(Diagnostic::with_location(
                        prev_loc,
                        &messages::PREVIOUS_DEFINITION,
                        &[],
                    )),
            );
            let name = self.gs.symbol(old_sym).name;
            self.gs.mangle_rename_symbol(old_sym, name);
        }

        let sym = self.gs.enter_type_member(asgn.loc, on_symbol, cnst, variance);
        if is_type_template {
            // Make the name visible in the class body through a static-field
            // alias on the class itself.
            let enclosing = self.gs.enclosing_class(ctx.owner);
            let alias = self.gs.enter_static_field_symbol(asgn.loc, enclosing, cnst);
            self.gs.symbol_mut(alias).result_type = Some(Type::Alias(sym));
        }

        if send_arg_count > 0 {
            let fixed_present = {
                let Expr::Send(send) = &*asgn.rhs else { unreachable!() };
                match send.args.last() {
                    Some(Expr::Hash(hash)) => Some(hash.keys.iter().any(|key| {
                        matches!(key, Expr::Literal(lit) if lit.as_symbol() == Some(names.fixed))
                    })),
                    _ => None,
                }
            };
            if let Some(has_fixed) = fixed_present {
                if has_fixed {
                    // Leave the hash in the tree for the resolver to chew on.
                    self.gs.symbol_mut(sym).set_fixed();
                    self.gs.symbol_mut(sym).result_type = Some(Type::Untyped);

                    let lhs_loc = asgn.lhs.loc();
                    *asgn.lhs = mk::constant(lhs_loc, sym);
                    return Expr::Assign(asgn);
                }
                self.gs.error(Diagnostic::with_location(
                    send_loc,
                    &messages::MISSING_REQUIRED_PARAM_FIXED,
                    &[],
                ));
            }
        }
        mk::empty_tree(asgn.loc)
    }

    fn post_transform_assign(&mut self, ctx: Ctx, asgn: Assign) -> Expr {
        if !matches!(&*asgn.lhs, Expr::UnresolvedConstantLit(_)) {
            return Expr::Assign(asgn);
        }

        let names = self.gs.names.clone();
        let send_shape = match &*asgn.rhs {
            Expr::Send(send) => Some((send.recv.is_self(), send.fun)),
            _ => None,
        };

        match send_shape {
            None => Expr::Assign(self.fill_assign(ctx, asgn)),
            Some((true, fun)) if fun == names.type_template || fun == names.type_member => {
                self.handle_type_member_definition(ctx, asgn)
            }
            Some((true, _)) => Expr::Assign(self.fill_assign(ctx, asgn)),
            Some((false, fun)) => {
                let filled = self.fill_assign(ctx, asgn);
                if fun == names.type_alias {
                    if let Expr::ConstantLit(lhs) = &*filled.lhs {
                        let sym = lhs.symbol;
                        if sym.exists() && self.gs.symbol(sym).is_static_field() {
                            self.gs.symbol_mut(sym).set_static_type_alias();
                        }
                    }
                }
                Expr::Assign(filled)
            }
        }
    }

    fn post_transform_yield(&mut self, _ctx: Ctx, node: Yield) -> Expr {
        let call = self.gs.names.call;
        if !self.block_arg_stack.is_empty() {
            let block_arg = self.find_or_create_block_parameter(node.loc);
            let recv = mk::local(node.loc, block_arg);
            mk::send(node.loc, recv, call, node.args)
        } else {
            // `yield` outside any method: defer the failure to runtime
            // semantics by calling through an unsafe nil.
            let unsafe_fun = self.gs.names.unsafe_;
            let recv = mk::send(
                node.loc,
                mk::constant(node.loc, SymbolRef::MAGIC),
                unsafe_fun,
                vec![mk::nil(node.loc)],
            );
            mk::send(node.loc, recv, call, node.args)
        }
    }

    // ========================================================================
    // Tree walk
    // ========================================================================

    fn transform_all(&mut self, ctx: Ctx, nodes: Vec<Expr>) -> Vec<Expr> {
        let mut out = Vec::with_capacity(nodes.len());
        for node in nodes {
            out.push(self.transform_expr(ctx, node));
        }
        out
    }

    fn transform_block_literal(&mut self, ctx: Ctx, mut blk: Block) -> Block {
        self.pre_transform_block(ctx, &mut blk);
        let inner = ctx.with_owner(blk.symbol);
        let args = std::mem::take(&mut blk.args);
        blk.args = self.transform_all(inner, args);
        let body = std::mem::replace(&mut *blk.body, mk::empty_tree(blk.loc));
        *blk.body = self.transform_expr(inner, body);
        self.post_transform_block();
        blk
    }

    /// Pre-order then post-order visit; siblings in source order.
    fn transform_expr(&mut self, ctx: Ctx, expr: Expr) -> Expr {
        match expr {
            Expr::ClassDef(mut klass) => {
                self.pre_transform_class_def(ctx, &mut klass);
                let inner = ctx.with_owner(klass.symbol);
                let ancestors = std::mem::take(&mut klass.ancestors);
                klass.ancestors = self.transform_all(inner, ancestors);
                let singleton_ancestors = std::mem::take(&mut klass.singleton_ancestors);
                klass.singleton_ancestors = self.transform_all(inner, singleton_ancestors);
                let rhs = std::mem::take(&mut klass.rhs);
                klass.rhs = self.transform_all(inner, rhs);
                self.post_transform_class_def(inner, klass)
            }
            Expr::MethodDef(mut method) => {
                self.pre_transform_method_def(ctx, &mut method);
                let inner = ctx.with_owner(method.symbol);
                let args = std::mem::take(&mut method.args);
                method.args = self.transform_all(inner, args);
                let rhs = std::mem::replace(&mut *method.rhs, mk::empty_tree(method.loc));
                *method.rhs = self.transform_expr(inner, rhs);
                self.post_transform_method_def(inner, &mut method);
                Expr::MethodDef(method)
            }
            Expr::Send(mut send) => {
                let recv = std::mem::replace(&mut *send.recv, mk::empty_tree(send.loc));
                *send.recv = self.transform_expr(ctx, recv);
                let args = std::mem::take(&mut send.args);
                send.args = self.transform_all(ctx, args);
                if let Some(block) = send.block.take() {
                    let block = self.transform_block_literal(ctx, *block);
                    send.block = Some(Box::new(block));
                }
                self.post_transform_send(ctx, send)
            }
            Expr::Assign(mut asgn) => {
                let lhs = std::mem::replace(&mut *asgn.lhs, mk::empty_tree(asgn.loc));
                *asgn.lhs = self.transform_expr(ctx, lhs);
                let rhs = std::mem::replace(&mut *asgn.rhs, mk::empty_tree(asgn.loc));
                *asgn.rhs = self.transform_expr(ctx, rhs);
                self.post_transform_assign(ctx, asgn)
            }
            Expr::UnresolvedConstantLit(mut lit) => {
                let scope = std::mem::replace(&mut *lit.scope, mk::empty_tree(lit.loc));
                *lit.scope = self.transform_expr(ctx, scope);
                Expr::UnresolvedConstantLit(lit)
            }
            Expr::UnresolvedIdent(nm) => self.post_transform_unresolved_ident(ctx, nm),
            Expr::SelfExpr(node) => self.post_transform_self(ctx, node),
            Expr::Yield(mut node) => {
                let args = std::mem::take(&mut node.args);
                node.args = self.transform_all(ctx, args);
                self.post_transform_yield(ctx, node)
            }
            Expr::InsSeq(mut seq) => {
                let stats = std::mem::take(&mut seq.stats);
                seq.stats = self.transform_all(ctx, stats);
                let last = std::mem::replace(&mut *seq.expr, mk::empty_tree(seq.loc));
                *seq.expr = self.transform_expr(ctx, last);
                Expr::InsSeq(seq)
            }
            Expr::Hash(mut hash) => {
                let keys = std::mem::take(&mut hash.keys);
                hash.keys = self.transform_all(ctx, keys);
                let values = std::mem::take(&mut hash.values);
                hash.values = self.transform_all(ctx, values);
                Expr::Hash(hash)
            }
            Expr::If(mut node) => {
                let cond = std::mem::replace(&mut *node.cond, mk::empty_tree(node.loc));
                *node.cond = self.transform_expr(ctx, cond);
                let then_ = std::mem::replace(&mut *node.then_, mk::empty_tree(node.loc));
                *node.then_ = self.transform_expr(ctx, then_);
                let else_ = std::mem::replace(&mut *node.else_, mk::empty_tree(node.loc));
                *node.else_ = self.transform_expr(ctx, else_);
                Expr::If(node)
            }
            Expr::OptionalArg(mut opt) => {
                let inner = std::mem::replace(&mut *opt.expr, mk::empty_tree(opt.loc));
                *opt.expr = self.transform_expr(ctx, inner);
                let default = std::mem::replace(&mut *opt.default, mk::empty_tree(opt.loc));
                *opt.default = self.transform_expr(ctx, default);
                Expr::OptionalArg(opt)
            }
            // Leaves and already-resolved nodes pass through unchanged.
            node @ (Expr::ConstantLit(_)
            | Expr::Literal(_)
            | Expr::Local(_)
            | Expr::Field(_)
            | Expr::ZSuperArgs(_)
            | Expr::RestArg(_)
            | Expr::KeywordArg(_)
            | Expr::BlockArg(_)
            | Expr::ShadowArg(_)
            | Expr::EmptyTree(_)
            | Expr::KeepForIDE(_)) => node,
        }
    }
}

/// The namer pass.
pub struct Namer;

impl Namer {
    /// Name one parsed file against the shared table, returning the
    /// rewritten tree. Running twice over the same input is a reparse:
    /// existing symbols are reused rather than redefined.
    pub fn run(gs: &mut SymbolTable, file: ParsedFile) -> ParsedFile {
        let mut inserter = NameInserter::new(gs);
        let ctx = Ctx {
            owner: SymbolRef::ROOT,
        };
        let tree = inserter.transform_expr(ctx, file.tree);
        ParsedFile {
            tree,
            file: file.file,
        }
    }

    /// Name a batch of files sequentially against one table. Files are
    /// independent at this stage; results accumulate into the table.
    pub fn run_files(gs: &mut SymbolTable, files: Vec<ParsedFile>) -> Vec<ParsedFile> {
        let mut named = Vec::with_capacity(files.len());
        for file in files {
            named.push(Self::run(gs, file));
        }
        named
    }
}
