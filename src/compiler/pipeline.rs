use super::*;
use tracing::{debug, info_span};

/// Runs the optimization passes over a parsed tree in dependency order.
#[derive(Debug, Default)]
pub struct Optimizer {
    pub options: Options,
    pub builtins: Builtins,
}

impl Optimizer {
    pub fn new(options: Options, builtins: Builtins) -> Self { Self { options, builtins } }

    /// Returns the root of the optimized tree, which is fully resolved.
    /// Subtrees of the input may be reused or mutated in place.
    pub fn optimize(&self, ast: &mut Ast, root: ExprId) -> OptimizeResult<ExprId> {
        let _span = info_span!("optimize").entered();
        debug!(nodes = count_nodes(ast, root), "input");

        let mut root = expand_abbreviations(ast, root)?;
        resolve(ast, root)?;

        if !self.options.no_inline {
            root = inline_locals(ast, root)?;
            debug!(nodes = count_nodes(ast, root), "after inlining");
        }
        if !self.options.no_fold {
            root = fold_constants(ast, root, &self.builtins)?;
            debug!(nodes = count_nodes(ast, root), "after folding");
        }
        if !self.options.no_pull_out {
            root = pull_out(ast, root)?;
            debug!(nodes = count_nodes(ast, root), "after pull-out");
        }

        Ok(root)
    }

    /// [`Optimizer::optimize`] followed by type inference on the result.
    pub fn optimize_typed(
        &self,
        ast: &mut Ast,
        root: ExprId,
        model: &mut dyn TypeModel,
    ) -> OptimizeResult<(ExprId, TypeAnnotations)> {
        let root = self.optimize(ast, root)?;
        let types = resolve_types(ast, root, model, &self.builtins);
        Ok((root, types))
    }
}
