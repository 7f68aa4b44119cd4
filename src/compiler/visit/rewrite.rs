use super::*;

impl Ast {
    /// Writes `children` back into the child slots of `id` in declaration
    /// order and returns `id`.
    pub fn relink(&mut self, id: ExprId, children: &[ExprId]) -> ExprId {
        let slots = self.kind_mut(id).children_mut();
        debug_assert_eq!(slots.len(), children.len(), "relinking {id} with the wrong arity");
        for (slot, child) in slots.into_iter().zip(children) {
            *slot = *child;
        }
        id
    }
}

/// Runs a rewriting visitor (one whose output is the replacement node) from
/// `root` and returns the new root.
pub fn rewrite<V, A>(v: &mut V, ast: &mut Ast, root: ExprId, arg: &A) -> OptimizeResult<ExprId>
where
    V: Visitor<A, Output = ExprId>,
{
    v.visit(ast, root, arg)
}

/// Rewriter that rebuilds every node unchanged.
pub struct Identity;

impl Visitor for Identity {
    type Output = ExprId;

    fn compose_default(&mut self, ast: &mut Ast, id: ExprId, _: &(), children: Vec<ExprId>) -> OptimizeResult<ExprId> {
        Ok(ast.relink(id, &children))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Swaps the operands of every addition.
    struct Commute;

    impl Visitor for Commute {
        type Output = ExprId;

        fn compose_default(&mut self, ast: &mut Ast, id: ExprId, _: &(), children: Vec<ExprId>) -> OptimizeResult<ExprId> {
            Ok(ast.relink(id, &children))
        }

        fn compose_arithmetic(
            &mut self,
            ast: &mut Ast,
            id: ExprId,
            _: &(),
            left: ExprId,
            right: ExprId,
        ) -> OptimizeResult<ExprId> {
            Ok(ast.relink(id, &[right, left]))
        }
    }

    /// Replaces every literal with a fresh `null` node.
    struct Nullify;

    impl Visitor for Nullify {
        type Output = ExprId;

        fn compose_default(&mut self, ast: &mut Ast, id: ExprId, _: &(), children: Vec<ExprId>) -> OptimizeResult<ExprId> {
            Ok(ast.relink(id, &children))
        }

        fn compose_literal(&mut self, ast: &mut Ast, _: ExprId, _: &()) -> OptimizeResult<ExprId> { Ok(ast.null()) }
    }

    fn sample(ast: &mut Ast) -> ExprId {
        let a = ast.literal(1);
        let b = ast.var("b");
        let sum = ast.add(a, b);
        let c = ast.literal("c");
        ast.list(vec![sum, c])
    }

    #[test]
    fn identity_keeps_tree() {
        let mut ast = Ast::new();
        let root = sample(&mut ast);
        let before = ast.display(root).to_string();
        let new = rewrite(&mut Identity, &mut ast, root, &()).unwrap();
        assert_eq!(new, root);
        assert_eq!(ast.display(new).to_string(), before);
    }

    #[test]
    fn relinks_in_place() {
        let mut ast = Ast::new();
        let root = sample(&mut ast);
        let new = rewrite(&mut Commute, &mut ast, root, &()).unwrap();
        assert_eq!(ast.display(new).to_string(), "list(($b + 1), 'c')");
    }

    #[test]
    fn replaced_nodes_are_substituted_into_parent() {
        let mut ast = Ast::new();
        let root = sample(&mut ast);
        let count = ast.node_count();
        let new = rewrite(&mut Nullify, &mut ast, root, &()).unwrap();
        assert_eq!(ast.display(new).to_string(), "list((null + $b), null)");
        assert_eq!(ast.node_count(), count + 2);
    }
}
