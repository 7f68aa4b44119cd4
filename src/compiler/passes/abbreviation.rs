use super::*;
use tracing::{debug, debug_span, trace};

/// Expands `filter(base, `Type#part`)` and `foreach(base, `Type#part`)` into
/// functions accessing that part on each element.
pub fn expand_abbreviations(ast: &mut Ast, root: ExprId) -> OptimizeResult<ExprId> {
    let _span = debug_span!("expand_abbreviations").entered();

    let mut expander = AbbreviationExpander { expanded: 0 };
    let root = rewrite(&mut expander, ast, root, &())?;

    debug!(expanded = expander.expanded, "expanded abbreviations");
    Ok(root)
}

struct AbbreviationExpander {
    expanded: usize,
}

impl AbbreviationExpander {
    fn expand(&mut self, ast: &mut Ast, function: ExprId) -> OptimizeResult<ExprId> {
        let Some(Value::Part(part)) = ast.literal_value(function) else {
            return Ok(function);
        };
        let part = part.clone();
        let span = ast.span(function);

        let name = ast.fresh_name();
        let var = ast.var(name.clone());
        ast.with_span(var, span.clone());
        let access = ast.access(var, part);
        ast.with_span(access, span.clone());
        let lambda = ast.lambda(name, access);
        ast.with_span(lambda, span);
        ast.bind(var, DefKey::Param(lambda));

        trace!(function = %ast.display(lambda), "expanded");
        self.expanded += 1;
        self.visit(ast, lambda, &())
    }
}

impl Visitor for AbbreviationExpander {
    type Output = ExprId;

    fn compose_default(&mut self, ast: &mut Ast, id: ExprId, _: &(), children: Vec<ExprId>) -> OptimizeResult<ExprId> {
        Ok(ast.relink(id, &children))
    }

    fn compose_filter(
        &mut self,
        ast: &mut Ast,
        id: ExprId,
        _: &(),
        base: ExprId,
        function: ExprId,
    ) -> OptimizeResult<ExprId> {
        let function = self.expand(ast, function)?;
        Ok(ast.relink(id, &[base, function]))
    }

    fn compose_foreach(
        &mut self,
        ast: &mut Ast,
        id: ExprId,
        _: &(),
        base: ExprId,
        function: ExprId,
    ) -> OptimizeResult<ExprId> {
        let function = self.expand(ast, function)?;
        Ok(ast.relink(id, &[base, function]))
    }
}
