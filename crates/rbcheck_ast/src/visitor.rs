//! Read-only AST traversal.
//!
//! Override `visit_expr` to observe nodes and call `walk_expr` to continue
//! into children. Rewriting passes do not use this; they own their own
//! recursion so they can thread context and replace nodes.

use crate::node::*;

pub trait AstVisitor {
    fn visit_expr(&mut self, expr: &Expr) {
        self.walk_expr(expr);
    }

    fn visit_block(&mut self, block: &Block) {
        for arg in &block.args {
            self.visit_expr(arg);
        }
        self.visit_expr(&block.body);
    }

    fn walk_expr(&mut self, expr: &Expr) {
        match expr {
            Expr::ClassDef(n) => {
                self.visit_expr(&n.name);
                for anc in &n.ancestors {
                    self.visit_expr(anc);
                }
                for anc in &n.singleton_ancestors {
                    self.visit_expr(anc);
                }
                for stmt in &n.rhs {
                    self.visit_expr(stmt);
                }
            }
            Expr::MethodDef(n) => {
                for arg in &n.args {
                    self.visit_expr(arg);
                }
                self.visit_expr(&n.rhs);
            }
            Expr::Send(n) => {
                self.visit_expr(&n.recv);
                for arg in &n.args {
                    self.visit_expr(arg);
                }
                if let Some(block) = &n.block {
                    self.visit_block(block);
                }
            }
            Expr::Assign(n) => {
                self.visit_expr(&n.lhs);
                self.visit_expr(&n.rhs);
            }
            Expr::UnresolvedConstantLit(n) => self.visit_expr(&n.scope),
            Expr::ConstantLit(_) => {}
            Expr::Yield(n) => {
                for arg in &n.args {
                    self.visit_expr(arg);
                }
            }
            Expr::RestArg(n) => self.visit_expr(&n.expr),
            Expr::KeywordArg(n) => self.visit_expr(&n.expr),
            Expr::OptionalArg(n) => {
                self.visit_expr(&n.expr);
                self.visit_expr(&n.default);
            }
            Expr::BlockArg(n) => self.visit_expr(&n.expr),
            Expr::ShadowArg(n) => self.visit_expr(&n.expr),
            Expr::InsSeq(n) => {
                for stmt in &n.stats {
                    self.visit_expr(stmt);
                }
                self.visit_expr(&n.expr);
            }
            Expr::Hash(n) => {
                for key in &n.keys {
                    self.visit_expr(key);
                }
                for value in &n.values {
                    self.visit_expr(value);
                }
            }
            Expr::If(n) => {
                self.visit_expr(&n.cond);
                self.visit_expr(&n.then_);
                self.visit_expr(&n.else_);
            }
            Expr::KeepForIDE(n) => self.visit_expr(&n.expr),
            Expr::Literal(_)
            | Expr::UnresolvedIdent(_)
            | Expr::Local(_)
            | Expr::Field(_)
            | Expr::SelfExpr(_)
            | Expr::ZSuperArgs(_)
            | Expr::EmptyTree(_) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mk;
    use rbcheck_core::text::Loc;
    use rbcheck_symbols::SymbolTable;

    struct SendCounter {
        count: usize,
    }

    impl AstVisitor for SendCounter {
        fn visit_expr(&mut self, expr: &Expr) {
            if matches!(expr, Expr::Send(_)) {
                self.count += 1;
            }
            self.walk_expr(expr);
        }
    }

    #[test]
    fn test_visitor_reaches_nested_sends() {
        let gs = SymbolTable::new();
        let loc = Loc::none();
        let inner = mk::send(loc, mk::self_(loc), gs.intern("bar"), vec![]);
        let outer = mk::send(loc, inner, gs.intern("baz"), vec![mk::int(loc, 1)]);
        let tree = mk::ins_seq(loc, vec![outer], mk::empty_tree(loc));

        let mut counter = SendCounter { count: 0 };
        counter.visit_expr(&tree);
        assert_eq!(counter.count, 2);
    }
}
