use super::*;
use rustc_hash::FxHashSet;
use tracing::{debug, debug_span, trace};

/// Hoists loop-invariant subexpressions out of the functions that do not
/// bind any variable they use. Variables must be resolved.
pub fn pull_out(ast: &mut Ast, root: ExprId) -> OptimizeResult<ExprId> {
    let _span = debug_span!("pull_out").entered();

    let mut pull_out = SubExpressionPullOut {
        scopes: Vec::new(),
        top_level: Vec::new(),
        used: FxHashSet::default(),
        hoisted: 0,
    };
    let root = rewrite(&mut pull_out, ast, root, &())?;
    debug_assert!(pull_out.scopes.is_empty());

    let top_level = std::mem::take(&mut pull_out.top_level);
    let root = wrap(ast, root, &top_level);

    debug!(hoisted = pull_out.hoisted, "pulled out subexpressions");
    Ok(root)
}

/// A binding waiting to be placed around the body of its scope.
struct Hoisted {
    /// Lambda binding the placeholder; its body is linked by [`wrap`].
    binder: ExprId,
    value: ExprId,
}

struct Scope {
    key: DefKey,
    hoisted: Vec<Hoisted>,
}

struct SubExpressionPullOut {
    /// Enclosing lambdas, innermost last.
    scopes: Vec<Scope>,
    top_level: Vec<Hoisted>,
    /// Definitions used by the node being composed.
    used: FxHashSet<DefKey>,
    hoisted: usize,
}

/// Binds `hoisted` around `body`, the first binding outermost.
fn wrap(ast: &mut Ast, mut body: ExprId, hoisted: &[Hoisted]) -> ExprId {
    for h in hoisted.iter().rev() {
        ast.relink(h.binder, &[body]);
        let span = ast.span(h.value);
        let call = ast.call(h.binder, h.value);
        body = ast.with_span(call, span);
    }
    body
}

impl SubExpressionPullOut {
    /// Composes `id` and moves it out of every enclosing scope whose
    /// variable it does not use.
    fn hoist(&mut self, ast: &mut Ast, id: ExprId, children: &[ExprId]) -> ExprId {
        let node = ast.relink(id, children);

        let mut target = self.scopes.len();
        while target > 0 && !self.used.contains(&self.scopes[target - 1].key) {
            target -= 1;
        }
        if target == self.scopes.len() {
            return node;
        }

        let name = ast.fresh_name();
        let binder = ast.lambda(name, node);
        let span = ast.span(node);
        let placeholder = ast.bound_var(DefKey::Param(binder));
        ast.with_span(placeholder, span);

        trace!(expr = %ast.display(node), depth = self.scopes.len(), target, "hoisting");
        self.hoisted += 1;

        let hoisted = Hoisted { binder, value: node };
        match target {
            0 => self.top_level.push(hoisted),
            _ => self.scopes[target - 1].hoisted.push(hoisted),
        }
        placeholder
    }
}

impl Visitor for SubExpressionPullOut {
    type Output = ExprId;

    fn compose_default(&mut self, ast: &mut Ast, id: ExprId, _: &(), children: Vec<ExprId>) -> OptimizeResult<ExprId> {
        Ok(ast.relink(id, &children))
    }

    fn visit(&mut self, ast: &mut Ast, id: ExprId, arg: &()) -> OptimizeResult<ExprId> {
        // every node starts with an empty set and reports its uses to the parent
        let outer = std::mem::take(&mut self.used);

        if matches!(ast.kind(id), Expr::Lambda { .. }) {
            self.scopes.push(Scope {
                key: DefKey::Param(id),
                hoisted: Vec::new(),
            });
        }
        let res = descend(self, ast, id, arg);

        let inner = std::mem::replace(&mut self.used, outer);
        self.used.extend(inner);
        res
    }

    fn compose_var(&mut self, ast: &mut Ast, id: ExprId, _: &()) -> OptimizeResult<ExprId> {
        match ast.kind(id) {
            Expr::Var { def: Some(key), .. } => {
                self.used.insert(*key);
                Ok(id)
            },
            Expr::Var { name, def: None } => Err(OptimizeError::UnresolvedVariable {
                name: name.clone(),
                span: ast.span(id),
            }),
            _ => unreachable!(),
        }
    }

    fn compose_lambda(&mut self, ast: &mut Ast, id: ExprId, _: &(), body: ExprId) -> OptimizeResult<ExprId> {
        let scope = self.scopes.pop().unwrap_or_else(|| unreachable!("unbalanced scopes"));
        debug_assert_eq!(scope.key, DefKey::Param(id));

        let body = wrap(ast, body, &scope.hoisted);
        self.used.remove(&scope.key);
        Ok(ast.relink(id, &[body]))
    }

    fn compose_all(&mut self, ast: &mut Ast, id: ExprId, _: &()) -> OptimizeResult<ExprId> { Ok(self.hoist(ast, id, &[])) }

    fn compose_access(&mut self, ast: &mut Ast, id: ExprId, _: &(), target: ExprId) -> OptimizeResult<ExprId> {
        Ok(self.hoist(ast, id, &[target]))
    }

    fn compose_navigation(&mut self, ast: &mut Ast, id: ExprId, _: &(), target: ExprId) -> OptimizeResult<ExprId> {
        Ok(self.hoist(ast, id, &[target]))
    }

    fn compose_flatten(&mut self, ast: &mut Ast, id: ExprId, _: &(), list: ExprId) -> OptimizeResult<ExprId> {
        Ok(self.hoist(ast, id, &[list]))
    }

    fn compose_filter(
        &mut self,
        ast: &mut Ast,
        id: ExprId,
        _: &(),
        base: ExprId,
        function: ExprId,
    ) -> OptimizeResult<ExprId> {
        Ok(self.hoist(ast, id, &[base, function]))
    }

    fn compose_foreach(
        &mut self,
        ast: &mut Ast,
        id: ExprId,
        _: &(),
        base: ExprId,
        function: ExprId,
    ) -> OptimizeResult<ExprId> {
        Ok(self.hoist(ast, id, &[base, function]))
    }
}
