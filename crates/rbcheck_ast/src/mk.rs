//! Construction helpers for desugared trees.
//!
//! Thin constructors so that passes (and tests) can build nodes without
//! spelling out every field. Mirrors the shapes the desugarer emits.

use crate::node::*;
use rbcheck_core::intern::NameRef;
use rbcheck_core::text::Loc;
use rbcheck_symbols::{LocalVariable, SymbolRef};

pub fn empty_tree(loc: Loc) -> Expr {
    Expr::EmptyTree(EmptyTree { loc })
}

pub fn local(loc: Loc, local: LocalVariable) -> Expr {
    Expr::Local(Local { loc, local })
}

pub fn unresolved_ident(loc: Loc, kind: IdentKind, name: NameRef) -> Expr {
    Expr::UnresolvedIdent(UnresolvedIdent { loc, kind, name })
}

pub fn unresolved_constant(loc: Loc, scope: Expr, cnst: NameRef) -> Expr {
    Expr::UnresolvedConstantLit(UnresolvedConstantLit {
        loc,
        scope: Box::new(scope),
        cnst,
    })
}

/// A resolved constant with no written path (synthesized references).
pub fn constant(loc: Loc, symbol: SymbolRef) -> Expr {
    Expr::ConstantLit(ConstantLit {
        loc,
        symbol,
        original: None,
    })
}

/// A resolved constant that keeps the path the programmer wrote.
pub fn resolved_constant(loc: Loc, symbol: SymbolRef, original: UnresolvedConstantLit) -> Expr {
    Expr::ConstantLit(ConstantLit {
        loc,
        symbol,
        original: Some(Box::new(original)),
    })
}

pub fn field(loc: Loc, symbol: SymbolRef) -> Expr {
    Expr::Field(Field { loc, symbol })
}

pub fn self_(loc: Loc) -> Expr {
    Expr::SelfExpr(SelfExpr {
        loc,
        claz: SymbolRef::NONE,
    })
}

// -- Literals --

pub fn int(loc: Loc, value: i64) -> Expr {
    Expr::Literal(Literal {
        loc,
        value: LiteralValue::Integer(value),
    })
}

pub fn string(loc: Loc, value: NameRef) -> Expr {
    Expr::Literal(Literal {
        loc,
        value: LiteralValue::String(value),
    })
}

pub fn symbol(loc: Loc, name: NameRef) -> Expr {
    Expr::Literal(Literal {
        loc,
        value: LiteralValue::Symbol(name),
    })
}

pub fn true_(loc: Loc) -> Expr {
    Expr::Literal(Literal {
        loc,
        value: LiteralValue::True,
    })
}

pub fn false_(loc: Loc) -> Expr {
    Expr::Literal(Literal {
        loc,
        value: LiteralValue::False,
    })
}

pub fn nil(loc: Loc) -> Expr {
    Expr::Literal(Literal {
        loc,
        value: LiteralValue::Nil,
    })
}

// -- Calls --

pub fn send(loc: Loc, recv: Expr, fun: NameRef, args: Vec<Expr>) -> Expr {
    Expr::Send(Send {
        loc,
        recv: Box::new(recv),
        fun,
        args,
        block: None,
    })
}

pub fn send_with_block(loc: Loc, recv: Expr, fun: NameRef, args: Vec<Expr>, block: Block) -> Expr {
    Expr::Send(Send {
        loc,
        recv: Box::new(recv),
        fun,
        args,
        block: Some(Box::new(block)),
    })
}

pub fn block(loc: Loc, args: Vec<Expr>, body: Expr) -> Block {
    Block {
        loc,
        symbol: SymbolRef::TODO,
        args,
        body: Box::new(body),
    }
}

pub fn yield_(loc: Loc, args: Vec<Expr>) -> Expr {
    Expr::Yield(Yield { loc, args })
}

pub fn zsuper_args(loc: Loc) -> Expr {
    Expr::ZSuperArgs(ZSuperArgs { loc })
}

// -- Definitions --

pub fn class_def(loc: Loc, decl_loc: Loc, kind: ClassDefKind, name: Expr, rhs: Vec<Expr>) -> ClassDef {
    ClassDef {
        loc,
        decl_loc,
        kind,
        symbol: SymbolRef::TODO,
        name: Box::new(name),
        ancestors: Vec::new(),
        singleton_ancestors: Vec::new(),
        rhs,
    }
}

pub fn method_def(loc: Loc, decl_loc: Loc, name: NameRef, args: Vec<Expr>, rhs: Expr) -> MethodDef {
    MethodDef {
        loc,
        decl_loc,
        name,
        symbol: SymbolRef::TODO,
        args,
        rhs: Box::new(rhs),
        is_self: false,
        is_dsl_synthesized: false,
    }
}

pub fn assign(loc: Loc, lhs: Expr, rhs: Expr) -> Expr {
    Expr::Assign(Assign {
        loc,
        lhs: Box::new(lhs),
        rhs: Box::new(rhs),
    })
}

// -- Argument wrappers --

pub fn rest_arg(loc: Loc, expr: Expr) -> Expr {
    Expr::RestArg(RestArg {
        loc,
        expr: Box::new(expr),
    })
}

pub fn keyword_arg(loc: Loc, expr: Expr) -> Expr {
    Expr::KeywordArg(KeywordArg {
        loc,
        expr: Box::new(expr),
    })
}

pub fn optional_arg(loc: Loc, expr: Expr, default: Expr) -> Expr {
    Expr::OptionalArg(OptionalArg {
        loc,
        expr: Box::new(expr),
        default: Box::new(default),
    })
}

pub fn block_arg(loc: Loc, expr: Expr) -> Expr {
    Expr::BlockArg(BlockArg {
        loc,
        expr: Box::new(expr),
    })
}

pub fn shadow_arg(loc: Loc, expr: Expr) -> Expr {
    Expr::ShadowArg(ShadowArg {
        loc,
        expr: Box::new(expr),
    })
}

// -- Structure --

pub fn ins_seq(loc: Loc, stats: Vec<Expr>, expr: Expr) -> Expr {
    Expr::InsSeq(InsSeq {
        loc,
        stats,
        expr: Box::new(expr),
    })
}

pub fn hash(loc: Loc, keys: Vec<Expr>, values: Vec<Expr>) -> Expr {
    Expr::Hash(Hash { loc, keys, values })
}

pub fn if_(loc: Loc, cond: Expr, then_: Expr, else_: Expr) -> Expr {
    Expr::If(If {
        loc,
        cond: Box::new(cond),
        then_: Box::new(then_),
        else_: Box::new(else_),
    })
}

pub fn keep_for_ide(expr: Expr) -> Expr {
    let loc = expr.loc();
    Expr::KeepForIDE(KeepForIDE {
        loc,
        expr: Box::new(expr),
    })
}
