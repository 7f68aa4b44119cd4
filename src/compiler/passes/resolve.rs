use super::*;
use rustc_hash::FxHashMap;
use tracing::{debug, debug_span, trace};

/// Binds every variable to its nearest enclosing definition of the same name.
pub fn resolve(ast: &mut Ast, root: ExprId) -> OptimizeResult<()> {
    let _span = debug_span!("resolve").entered();

    let mut resolver = DefResolver {
        scopes: FxHashMap::default(),
        resolved: 0,
    };
    resolver.visit(ast, root, &())?;

    debug!(variables = resolver.resolved, "resolved");
    Ok(())
}

struct DefResolver {
    /// Innermost definition last.
    scopes: FxHashMap<Name, Vec<DefKey>>,
    resolved: usize,
}

impl DefResolver {
    fn push(&mut self, name: Name, key: DefKey) { self.scopes.entry(name).or_default().push(key); }

    fn pop(&mut self, name: &Name) {
        if let Some(stack) = self.scopes.get_mut(name) {
            stack.pop();
        }
    }
}

impl Visitor for DefResolver {
    type Output = ();

    fn compose_default(&mut self, _: &mut Ast, _: ExprId, _: &(), _: Vec<()>) -> OptimizeResult<()> { Ok(()) }

    fn visit(&mut self, ast: &mut Ast, id: ExprId, arg: &()) -> OptimizeResult<()> {
        match ast.kind(id) {
            Expr::Lambda { param, body } => {
                let (param, body) = (param.clone(), *body);

                self.push(param.clone(), DefKey::Param(id));
                let res = self.visit(ast, body, arg);
                self.pop(&param);

                res?;
                self.compose_lambda(ast, id, arg, ())
            },
            Expr::Tuple { coords } => {
                let coords: Vec<(Name, ExprId)> = coords.iter().map(|c| (Name::User(c.name.clone()), c.value)).collect();

                // each coordinate sees only the scope outside the tuple
                let mut values = Vec::with_capacity(coords.len());
                for (_, value) in &coords {
                    values.push(self.visit(ast, *value, arg)?);
                }

                for (i, (name, _)) in coords.iter().enumerate() {
                    self.push(name.clone(), DefKey::Coord(id, i));
                }
                let res = self.compose_tuple(ast, id, arg, values);
                for (name, _) in coords.iter().rev() {
                    self.pop(name);
                }

                res
            },
            _ => descend(self, ast, id, arg),
        }
    }

    fn compose_var(&mut self, ast: &mut Ast, id: ExprId, _: &()) -> OptimizeResult<()> {
        let Expr::Var { name, .. } = ast.kind(id) else {
            unreachable!()
        };

        match self.scopes.get(name).and_then(|stack| stack.last()).copied() {
            Some(key) => {
                trace!(%name, ?key, "bound");
                ast.bind(id, key);
                self.resolved += 1;
                Ok(())
            },
            None => Err(OptimizeError::UnresolvedVariable {
                name: name.clone(),
                span: ast.span(id),
            }),
        }
    }
}
