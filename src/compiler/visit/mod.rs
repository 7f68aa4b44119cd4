use super::*;

pub mod rewrite;
pub use rewrite::*;

/// Bottom-up traversal over an [`Ast`].
///
/// [`descend`] visits the children of a node in declaration order, all with the
/// same argument, then hands their results to the `compose_*` hook of the
/// node's kind. Every hook falls back to [`Visitor::compose_default`], so an
/// implementation only overrides the kinds it cares about. Overriding
/// [`Visitor::visit`] lets a pass act before and after the descent (scopes).
pub trait Visitor<A = ()> {
    type Output;

    fn compose_default(
        &mut self,
        ast: &mut Ast,
        id: ExprId,
        arg: &A,
        children: Vec<Self::Output>,
    ) -> OptimizeResult<Self::Output>;

    fn visit(&mut self, ast: &mut Ast, id: ExprId, arg: &A) -> OptimizeResult<Self::Output>
    where
        Self: Sized,
    {
        descend(self, ast, id, arg)
    }

    fn compose_literal(&mut self, ast: &mut Ast, id: ExprId, arg: &A) -> OptimizeResult<Self::Output> {
        self.compose_default(ast, id, arg, Vec::new())
    }

    fn compose_var(&mut self, ast: &mut Ast, id: ExprId, arg: &A) -> OptimizeResult<Self::Output> {
        self.compose_default(ast, id, arg, Vec::new())
    }

    fn compose_all(&mut self, ast: &mut Ast, id: ExprId, arg: &A) -> OptimizeResult<Self::Output> {
        self.compose_default(ast, id, arg, Vec::new())
    }

    fn compose_kb_query(&mut self, ast: &mut Ast, id: ExprId, arg: &A) -> OptimizeResult<Self::Output> {
        self.compose_default(ast, id, arg, Vec::new())
    }

    fn compose_lambda(
        &mut self,
        ast: &mut Ast,
        id: ExprId,
        arg: &A,
        body: Self::Output,
    ) -> OptimizeResult<Self::Output> {
        self.compose_default(ast, id, arg, vec![body])
    }

    fn compose_tuple(
        &mut self,
        ast: &mut Ast,
        id: ExprId,
        arg: &A,
        values: Vec<Self::Output>,
    ) -> OptimizeResult<Self::Output> {
        self.compose_default(ast, id, arg, values)
    }

    fn compose_call(
        &mut self,
        ast: &mut Ast,
        id: ExprId,
        arg: &A,
        function: Self::Output,
        argument: Self::Output,
    ) -> OptimizeResult<Self::Output> {
        self.compose_default(ast, id, arg, vec![function, argument])
    }

    fn compose_method(
        &mut self,
        ast: &mut Ast,
        id: ExprId,
        arg: &A,
        args: Vec<Self::Output>,
    ) -> OptimizeResult<Self::Output> {
        self.compose_default(ast, id, arg, args)
    }

    fn compose_filter(
        &mut self,
        ast: &mut Ast,
        id: ExprId,
        arg: &A,
        base: Self::Output,
        function: Self::Output,
    ) -> OptimizeResult<Self::Output> {
        self.compose_default(ast, id, arg, vec![base, function])
    }

    fn compose_foreach(
        &mut self,
        ast: &mut Ast,
        id: ExprId,
        arg: &A,
        base: Self::Output,
        function: Self::Output,
    ) -> OptimizeResult<Self::Output> {
        self.compose_default(ast, id, arg, vec![base, function])
    }

    fn compose_flatten(
        &mut self,
        ast: &mut Ast,
        id: ExprId,
        arg: &A,
        list: Self::Output,
    ) -> OptimizeResult<Self::Output> {
        self.compose_default(ast, id, arg, vec![list])
    }

    fn compose_sort(
        &mut self,
        ast: &mut Ast,
        id: ExprId,
        arg: &A,
        list: Self::Output,
        comparator: Self::Output,
    ) -> OptimizeResult<Self::Output> {
        self.compose_default(ast, id, arg, vec![list, comparator])
    }

    fn compose_union(
        &mut self,
        ast: &mut Ast,
        id: ExprId,
        arg: &A,
        left: Self::Output,
        right: Self::Output,
    ) -> OptimizeResult<Self::Output> {
        self.compose_default(ast, id, arg, vec![left, right])
    }

    fn compose_intersection(
        &mut self,
        ast: &mut Ast,
        id: ExprId,
        arg: &A,
        left: Self::Output,
        right: Self::Output,
    ) -> OptimizeResult<Self::Output> {
        self.compose_default(ast, id, arg, vec![left, right])
    }

    fn compose_singleton(
        &mut self,
        ast: &mut Ast,
        id: ExprId,
        arg: &A,
        value: Self::Output,
    ) -> OptimizeResult<Self::Output> {
        self.compose_default(ast, id, arg, vec![value])
    }

    fn compose_single_element(
        &mut self,
        ast: &mut Ast,
        id: ExprId,
        arg: &A,
        value: Self::Output,
    ) -> OptimizeResult<Self::Output> {
        self.compose_default(ast, id, arg, vec![value])
    }

    fn compose_size(
        &mut self,
        ast: &mut Ast,
        id: ExprId,
        arg: &A,
        value: Self::Output,
    ) -> OptimizeResult<Self::Output> {
        self.compose_default(ast, id, arg, vec![value])
    }

    fn compose_not(
        &mut self,
        ast: &mut Ast,
        id: ExprId,
        arg: &A,
        value: Self::Output,
    ) -> OptimizeResult<Self::Output> {
        self.compose_default(ast, id, arg, vec![value])
    }

    fn compose_is_empty(
        &mut self,
        ast: &mut Ast,
        id: ExprId,
        arg: &A,
        value: Self::Output,
    ) -> OptimizeResult<Self::Output> {
        self.compose_default(ast, id, arg, vec![value])
    }

    fn compose_arithmetic(
        &mut self,
        ast: &mut Ast,
        id: ExprId,
        arg: &A,
        left: Self::Output,
        right: Self::Output,
    ) -> OptimizeResult<Self::Output> {
        self.compose_default(ast, id, arg, vec![left, right])
    }

    fn compose_compare(
        &mut self,
        ast: &mut Ast,
        id: ExprId,
        arg: &A,
        left: Self::Output,
        right: Self::Output,
    ) -> OptimizeResult<Self::Output> {
        self.compose_default(ast, id, arg, vec![left, right])
    }

    fn compose_compare_op(
        &mut self,
        ast: &mut Ast,
        id: ExprId,
        arg: &A,
        left: Self::Output,
        right: Self::Output,
    ) -> OptimizeResult<Self::Output> {
        self.compose_default(ast, id, arg, vec![left, right])
    }

    fn compose_is_equal(
        &mut self,
        ast: &mut Ast,
        id: ExprId,
        arg: &A,
        left: Self::Output,
        right: Self::Output,
    ) -> OptimizeResult<Self::Output> {
        self.compose_default(ast, id, arg, vec![left, right])
    }

    fn compose_string_test(
        &mut self,
        ast: &mut Ast,
        id: ExprId,
        arg: &A,
        left: Self::Output,
        right: Self::Output,
    ) -> OptimizeResult<Self::Output> {
        self.compose_default(ast, id, arg, vec![left, right])
    }

    fn compose_and(
        &mut self,
        ast: &mut Ast,
        id: ExprId,
        arg: &A,
        left: Self::Output,
        right: Self::Output,
    ) -> OptimizeResult<Self::Output> {
        self.compose_default(ast, id, arg, vec![left, right])
    }

    fn compose_or(
        &mut self,
        ast: &mut Ast,
        id: ExprId,
        arg: &A,
        left: Self::Output,
        right: Self::Output,
    ) -> OptimizeResult<Self::Output> {
        self.compose_default(ast, id, arg, vec![left, right])
    }

    fn compose_if_else(
        &mut self,
        ast: &mut Ast,
        id: ExprId,
        arg: &A,
        condition: Self::Output,
        if_clause: Self::Output,
        else_clause: Self::Output,
    ) -> OptimizeResult<Self::Output> {
        self.compose_default(ast, id, arg, vec![condition, if_clause, else_clause])
    }

    fn compose_access(
        &mut self,
        ast: &mut Ast,
        id: ExprId,
        arg: &A,
        target: Self::Output,
    ) -> OptimizeResult<Self::Output> {
        self.compose_default(ast, id, arg, vec![target])
    }

    fn compose_navigation(
        &mut self,
        ast: &mut Ast,
        id: ExprId,
        arg: &A,
        target: Self::Output,
    ) -> OptimizeResult<Self::Output> {
        self.compose_default(ast, id, arg, vec![target])
    }

    fn compose_referers(
        &mut self,
        ast: &mut Ast,
        id: ExprId,
        arg: &A,
        target: Self::Output,
    ) -> OptimizeResult<Self::Output> {
        self.compose_default(ast, id, arg, vec![target])
    }

    fn compose_at(
        &mut self,
        ast: &mut Ast,
        id: ExprId,
        arg: &A,
        target: Self::Output,
        index: Self::Output,
    ) -> OptimizeResult<Self::Output> {
        self.compose_default(ast, id, arg, vec![target, index])
    }

    fn compose_block(
        &mut self,
        ast: &mut Ast,
        id: ExprId,
        arg: &A,
        contents: Vec<Self::Output>,
    ) -> OptimizeResult<Self::Output> {
        self.compose_default(ast, id, arg, contents)
    }

    fn compose_list(
        &mut self,
        ast: &mut Ast,
        id: ExprId,
        arg: &A,
        elements: Vec<Self::Output>,
    ) -> OptimizeResult<Self::Output> {
        self.compose_default(ast, id, arg, elements)
    }

    fn compose_update(
        &mut self,
        ast: &mut Ast,
        id: ExprId,
        arg: &A,
        target: Self::Output,
        value: Self::Output,
    ) -> OptimizeResult<Self::Output> {
        self.compose_default(ast, id, arg, vec![target, value])
    }

    #[allow(clippy::too_many_arguments)]
    fn compose_recursion(
        &mut self,
        ast: &mut Ast,
        id: ExprId,
        arg: &A,
        start: Self::Output,
        step: Self::Output,
        min_depth: Self::Output,
        max_depth: Self::Output,
    ) -> OptimizeResult<Self::Output> {
        self.compose_default(ast, id, arg, vec![start, step, min_depth, max_depth])
    }

    fn compose_html(
        &mut self,
        ast: &mut Ast,
        id: ExprId,
        arg: &A,
        contents: Vec<Self::Output>,
    ) -> OptimizeResult<Self::Output> {
        self.compose_default(ast, id, arg, contents)
    }

    fn compose_tag(
        &mut self,
        ast: &mut Ast,
        id: ExprId,
        arg: &A,
        attributes: Vec<Self::Output>,
    ) -> OptimizeResult<Self::Output> {
        self.compose_default(ast, id, arg, attributes)
    }

    fn compose_attribute(
        &mut self,
        ast: &mut Ast,
        id: ExprId,
        arg: &A,
        value: Self::Output,
    ) -> OptimizeResult<Self::Output> {
        self.compose_default(ast, id, arg, vec![value])
    }
}

fn split<T, const N: usize>(children: Vec<T>) -> [T; N] {
    match <[T; N]>::try_from(children) {
        Ok(parts) => parts,
        Err(v) => unreachable!("expected {N} children, got {}", v.len()),
    }
}

/// Visits every child of `id`, then composes the node from their results.
pub fn descend<V, A>(v: &mut V, ast: &mut Ast, id: ExprId, arg: &A) -> OptimizeResult<V::Output>
where
    V: Visitor<A>,
{
    let mut children = Vec::new();
    for child in ast.children(id) {
        children.push(v.visit(ast, child, arg)?);
    }

    compose(v, ast, id, arg, children)
}

/// Dispatches to the `compose_*` hook matching the kind of `id`.
pub fn compose<V, A>(v: &mut V, ast: &mut Ast, id: ExprId, arg: &A, children: Vec<V::Output>) -> OptimizeResult<V::Output>
where
    V: Visitor<A>,
{
    use Expr::*;
    match ast.kind(id) {
        Literal(_) => v.compose_literal(ast, id, arg),
        Var { .. } => v.compose_var(ast, id, arg),
        All { .. } => v.compose_all(ast, id, arg),
        KbQuery { .. } => v.compose_kb_query(ast, id, arg),
        Lambda { .. } => {
            let [body] = split(children);
            v.compose_lambda(ast, id, arg, body)
        },
        Tuple { .. } => v.compose_tuple(ast, id, arg, children),
        Call { .. } => {
            let [function, argument] = split(children);
            v.compose_call(ast, id, arg, function, argument)
        },
        Method { .. } => v.compose_method(ast, id, arg, children),
        Filter { .. } => {
            let [base, function] = split(children);
            v.compose_filter(ast, id, arg, base, function)
        },
        Foreach { .. } => {
            let [base, function] = split(children);
            v.compose_foreach(ast, id, arg, base, function)
        },
        Flatten { .. } => {
            let [list] = split(children);
            v.compose_flatten(ast, id, arg, list)
        },
        Sort { .. } => {
            let [list, comparator] = split(children);
            v.compose_sort(ast, id, arg, list, comparator)
        },
        Union { .. } => {
            let [left, right] = split(children);
            v.compose_union(ast, id, arg, left, right)
        },
        Intersection { .. } => {
            let [left, right] = split(children);
            v.compose_intersection(ast, id, arg, left, right)
        },
        Singleton { .. } => {
            let [value] = split(children);
            v.compose_singleton(ast, id, arg, value)
        },
        SingleElement { .. } => {
            let [value] = split(children);
            v.compose_single_element(ast, id, arg, value)
        },
        Size { .. } => {
            let [value] = split(children);
            v.compose_size(ast, id, arg, value)
        },
        Not { .. } => {
            let [value] = split(children);
            v.compose_not(ast, id, arg, value)
        },
        IsEmpty { .. } => {
            let [value] = split(children);
            v.compose_is_empty(ast, id, arg, value)
        },
        Arithmetic { .. } => {
            let [left, right] = split(children);
            v.compose_arithmetic(ast, id, arg, left, right)
        },
        Compare { .. } => {
            let [left, right] = split(children);
            v.compose_compare(ast, id, arg, left, right)
        },
        CompareOp { .. } => {
            let [left, right] = split(children);
            v.compose_compare_op(ast, id, arg, left, right)
        },
        IsEqual { .. } => {
            let [left, right] = split(children);
            v.compose_is_equal(ast, id, arg, left, right)
        },
        StringTest { .. } => {
            let [left, right] = split(children);
            v.compose_string_test(ast, id, arg, left, right)
        },
        And { .. } => {
            let [left, right] = split(children);
            v.compose_and(ast, id, arg, left, right)
        },
        Or { .. } => {
            let [left, right] = split(children);
            v.compose_or(ast, id, arg, left, right)
        },
        IfElse { .. } => {
            let [condition, if_clause, else_clause] = split(children);
            v.compose_if_else(ast, id, arg, condition, if_clause, else_clause)
        },
        Access { .. } => {
            let [target] = split(children);
            v.compose_access(ast, id, arg, target)
        },
        AssociationNavigation { .. } => {
            let [target] = split(children);
            v.compose_navigation(ast, id, arg, target)
        },
        Referers { .. } => {
            let [target] = split(children);
            v.compose_referers(ast, id, arg, target)
        },
        At { .. } => {
            let [target, index] = split(children);
            v.compose_at(ast, id, arg, target, index)
        },
        Block { .. } => v.compose_block(ast, id, arg, children),
        List { .. } => v.compose_list(ast, id, arg, children),
        Update { .. } => {
            let [target, value] = split(children);
            v.compose_update(ast, id, arg, target, value)
        },
        Recursion { .. } => {
            let [start, step, min_depth, max_depth] = split(children);
            v.compose_recursion(ast, id, arg, start, step, min_depth, max_depth)
        },
        Html { .. } => v.compose_html(ast, id, arg, children),
        Tag { .. } => v.compose_tag(ast, id, arg, children),
        Attribute { .. } => {
            let [value] = split(children);
            v.compose_attribute(ast, id, arg, value)
        },
    }
}

/// Counts the nodes reachable from a root.
pub struct NodeCounter;

impl Visitor for NodeCounter {
    type Output = usize;

    fn compose_default(&mut self, _: &mut Ast, _: ExprId, _: &(), children: Vec<usize>) -> OptimizeResult<usize> {
        Ok(1 + children.iter().sum::<usize>())
    }
}

pub fn count_nodes(ast: &mut Ast, root: ExprId) -> usize {
    match NodeCounter.visit(ast, root, &()) {
        Ok(n) => n,
        Err(_) => unreachable!("counting never fails"),
    }
}
