use super::*;
use rustc_hash::FxHashMap;
use tracing::{debug, debug_span, trace};

/// Substitutes local bindings used at most once and drops unused parameters.
/// Variables must be resolved.
pub fn inline_locals(ast: &mut Ast, root: ExprId) -> OptimizeResult<ExprId> {
    let _span = debug_span!("inline_locals").entered();

    let mut counter = UsageCounter {
        uses: FxHashMap::default(),
    };
    counter.visit(ast, root, &())?;

    let mut inliner = Inliner {
        uses: counter.uses,
        env: FxHashMap::default(),
        inlined: 0,
        dropped: 0,
    };
    let root = rewrite(&mut inliner, ast, root, &())?;

    debug!(inlined = inliner.inlined, dropped = inliner.dropped, "inlined locals");
    Ok(root)
}

struct UsageCounter {
    uses: FxHashMap<DefKey, usize>,
}

impl Visitor for UsageCounter {
    type Output = ();

    fn compose_default(&mut self, _: &mut Ast, _: ExprId, _: &(), _: Vec<()>) -> OptimizeResult<()> { Ok(()) }

    fn compose_var(&mut self, ast: &mut Ast, id: ExprId, _: &()) -> OptimizeResult<()> {
        if let Some(key) = ast.def(id) {
            *self.uses.entry(key).or_default() += 1;
        }
        Ok(())
    }
}

struct Inliner {
    uses: FxHashMap<DefKey, usize>,
    /// Pending substitutions; `None` once the single use has taken its value.
    env: FxHashMap<DefKey, Option<ExprId>>,
    inlined: usize,
    dropped: usize,
}

impl Inliner {
    fn uses(&self, key: DefKey) -> usize { self.uses.get(&key).copied().unwrap_or(0) }

    /// The lambda called by `id` if that call can be replaced by its body.
    fn inlinable(&self, ast: &Ast, id: ExprId) -> Option<(ExprId, ExprId, ExprId)> {
        let Expr::Call { function, argument } = *ast.kind(id) else {
            return None;
        };
        let Expr::Lambda { body, .. } = *ast.kind(function) else {
            return None;
        };
        (self.uses(DefKey::Param(function)) <= 1).then_some((function, body, argument))
    }
}

impl Visitor for Inliner {
    type Output = ExprId;

    fn compose_default(&mut self, ast: &mut Ast, id: ExprId, _: &(), children: Vec<ExprId>) -> OptimizeResult<ExprId> {
        Ok(ast.relink(id, &children))
    }

    fn visit(&mut self, ast: &mut Ast, id: ExprId, arg: &()) -> OptimizeResult<ExprId> {
        if let Some((function, body, argument)) = self.inlinable(ast, id) {
            let key = DefKey::Param(function);
            trace!(call = %ast.display(id), uses = self.uses(key), "inlining");

            self.env.insert(key, Some(argument));
            let res = self.visit(ast, body, arg);
            self.env.remove(&key);

            self.inlined += 1;
            return res;
        }

        match *ast.kind(id) {
            Expr::Lambda { body, .. } if self.uses(DefKey::Param(id)) == 0 => {
                trace!(lambda = %ast.display(id), "dropping unused parameter");
                self.dropped += 1;
                self.visit(ast, body, arg)
            },
            Expr::Var { def: Some(key), .. } if self.env.contains_key(&key) => {
                match self.env.get_mut(&key).and_then(Option::take) {
                    Some(value) => self.visit(ast, value, arg),
                    None => unreachable!("inlined binding of {} consumed twice", ast.display(id)),
                }
            },
            _ => descend(self, ast, id, arg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(ast: &mut Ast, root: ExprId) -> String {
        resolve(ast, root).unwrap();
        let root = inline_locals(ast, root).unwrap();
        ast.display(root).to_string()
    }

    #[test]
    fn single_use_is_substituted() {
        let mut ast = Ast::new();
        let x = ast.var("x");
        let one = ast.literal(1);
        let body = ast.add(x, one);
        let value = ast.literal(41);
        let root = ast.call_let("x", value, body);

        assert_eq!(run(&mut ast, root), "(41 + 1)");
    }

    #[test]
    fn unused_binding_is_discarded() {
        let mut ast = Ast::new();
        let body = ast.literal(5);
        let value = ast.method("random", vec![]);
        let root = ast.call_let("x", value, body);

        assert_eq!(run(&mut ast, root), "5");
    }

    #[test]
    fn repeated_use_keeps_binding() {
        let mut ast = Ast::new();
        let x1 = ast.var("x");
        let x2 = ast.var("x");
        let body = ast.add(x1, x2);
        let value = ast.all("Person");
        let root = ast.call_let("x", value, body);

        assert_eq!(run(&mut ast, root), "call(($x -> ($x + $x)), all(`Person`))");
    }

    #[test]
    fn chained_bindings() {
        let mut ast = Ast::new();
        let y = ast.var("y");
        let x = ast.var("x");
        let inner = ast.call_let("y", x, y);
        let value = ast.literal("v");
        let root = ast.call_let("x", value, inner);

        assert_eq!(run(&mut ast, root), "'v'");
    }

    #[test]
    fn substituted_value_is_rewritten_too() {
        let mut ast = Ast::new();
        let z = ast.var("z");
        let two = ast.literal(2);
        let value = ast.call_let("z", two, z);
        let x = ast.var("x");
        let body = ast.size(x);
        let root = ast.call_let("x", value, body);

        assert_eq!(run(&mut ast, root), "size(2)");
    }

    #[test]
    fn unused_lambda_parameter_is_dropped() {
        let mut ast = Ast::new();
        let all = ast.all("Person");
        let t = ast.literal(true);
        let lambda = ast.lambda("p", t);
        let root = ast.filter(all, lambda);

        assert_eq!(run(&mut ast, root), "filter(all(`Person`), true)");
    }

    #[test]
    fn same_name_in_different_scopes() {
        let mut ast = Ast::new();
        let inner_x = ast.var("x");
        let inner = ast.lambda("x", inner_x);
        let all = ast.all("Person");
        let foreach = ast.foreach(all, inner);
        let outer_x = ast.var("x");
        let body = ast.list(vec![foreach, outer_x]);
        let value = ast.literal(7);
        let root = ast.call_let("x", value, body);

        assert_eq!(run(&mut ast, root), "list(foreach(all(`Person`), ($x -> $x)), 7)");
    }

    #[test]
    #[should_panic(expected = "consumed twice")]
    fn second_use_of_inlined_binding() {
        let mut ast = Ast::new();
        let x1 = ast.var("x");
        let x2 = ast.var("x");
        let body = ast.list(vec![x1, x2]);
        let value = ast.literal(1);
        let root = ast.call_let("x", value, body);
        resolve(&mut ast, root).unwrap();

        // usage counts deliberately left empty
        let mut inliner = Inliner {
            uses: FxHashMap::default(),
            env: FxHashMap::default(),
            inlined: 0,
            dropped: 0,
        };
        let _ = rewrite(&mut inliner, &mut ast, root, &());
    }
}
