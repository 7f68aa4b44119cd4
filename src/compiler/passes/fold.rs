use super::*;
use std::cmp::Ordering;
use tracing::{debug, debug_span, trace};

/// Evaluates operators over literal operands at compile time.
pub fn fold_constants(ast: &mut Ast, root: ExprId, builtins: &Builtins) -> OptimizeResult<ExprId> {
    let _span = debug_span!("fold_constants").entered();

    let mut folder = ConstantFolding { builtins, folded: 0 };
    let root = rewrite(&mut folder, ast, root, &())?;

    debug!(folded = folder.folded, "folded constants");
    Ok(root)
}

struct ConstantFolding<'a> {
    builtins: &'a Builtins,
    folded: usize,
}

impl ConstantFolding<'_> {
    /// Replaces `id` with a literal, reusing the literal node `reuse` when given.
    fn fold(&mut self, ast: &mut Ast, id: ExprId, reuse: Option<ExprId>, value: Value) -> ExprId {
        trace!(node = %id, %value, "folded");
        self.folded += 1;

        let span = ast.span(id);
        let literal = match reuse.filter(|r| ast.literal_value(*r).is_some()) {
            Some(literal) => ast.set_literal_value(literal, value),
            None => ast.literal(value),
        };
        ast.with_span(literal, span)
    }

    /// Replaces `id` with one of its (already rewritten) children.
    fn select(&mut self, ast: &Ast, id: ExprId, child: ExprId) -> ExprId {
        trace!(node = %id, selected = %ast.display(child), "short-circuited");
        self.folded += 1;
        child
    }

    /// `operand` as a boolean-valued expression.
    fn coerce(&mut self, ast: &mut Ast, operand: ExprId) -> OptimizeResult<ExprId> {
        if produces_boolean(ast, operand) {
            return Ok(operand);
        }
        if !self.builtins.contains(TO_BOOLEAN) {
            return Err(OptimizeError::MissingBuiltin {
                name: TO_BOOLEAN.to_string(),
                span: ast.span(operand),
            });
        }

        let span = ast.span(operand);
        let call = ast.method(TO_BOOLEAN, vec![operand]);
        Ok(ast.with_span(call, span))
    }
}

fn produces_boolean(ast: &Ast, id: ExprId) -> bool {
    match ast.kind(id) {
        Expr::Literal(v) => v.is_boolean(),
        Expr::Method { name, .. } => name == TO_BOOLEAN,
        Expr::Not { .. }
        | Expr::IsEmpty { .. }
        | Expr::CompareOp { .. }
        | Expr::IsEqual { .. }
        | Expr::StringTest { .. }
        | Expr::And { .. } => true,
        _ => false,
    }
}

fn literal(ast: &Ast, id: ExprId) -> Option<Value> { ast.literal_value(id).cloned() }

fn arithmetic(op: ArithmeticOp, lhs: &Value, rhs: &Value) -> Option<Value> {
    match (lhs, rhs) {
        (Value::List(_), Value::List(_)) => None,
        (Value::List(l), scalar) => l.iter().map(|e| arithmetic(op, e, scalar)).collect::<Option<Vec<_>>>().map(Value::List),
        (scalar, Value::List(r)) => r.iter().map(|e| arithmetic(op, scalar, e)).collect::<Option<Vec<_>>>().map(Value::List),
        (Value::String(_), _) | (_, Value::String(_)) if op == ArithmeticOp::Add => {
            Some(Value::String(lhs.to_text() + &rhs.to_text()))
        },
        (Value::Null, _) | (_, Value::Null) => Some(Value::Null),
        // division by zero is reported by the evaluator
        (Value::Number(_), Value::Number(r)) if matches!(op, ArithmeticOp::Div | ArithmeticOp::Mod) && *r == 0.0 => None,
        (Value::Number(l), Value::Number(r)) => Some(Value::Number(op.apply(*l, *r))),
        _ => None,
    }
}

fn ordering(lhs: &Value, rhs: &Value) -> Option<Ordering> {
    match (lhs, rhs) {
        (Value::Number(l), Value::Number(r)) => l.partial_cmp(r),
        (Value::String(l), Value::String(r)) => Some(l.cmp(r)),
        (Value::Bool(l), Value::Bool(r)) => Some(l.cmp(r)),
        _ => None,
    }
}

fn string_test(op: StringOp, case_sensitive: bool, lhs: &Value, rhs: &Value) -> Option<bool> {
    let text = |v: &Value| match v {
        Value::Null | Value::String(_) if case_sensitive => Some(v.to_text()),
        Value::Null | Value::String(_) => Some(v.to_text().to_lowercase()),
        _ => None,
    };
    Some(op.test(&text(lhs)?, &text(rhs)?))
}

fn union(lhs: Value, rhs: Value) -> Value {
    let mut out: Vec<Value> = Vec::new();
    for v in lhs.into_collection().into_iter().chain(rhs.into_collection()) {
        if !out.iter().any(|o| o.tl_equals(&v)) {
            out.push(v);
        }
    }
    Value::List(out)
}

fn intersection(lhs: Value, rhs: &Value) -> Value {
    let rhs = rhs.as_collection();
    let mut out: Vec<Value> = Vec::new();
    for v in lhs.into_collection() {
        if rhs.iter().any(|r| r.tl_equals(&v)) && !out.iter().any(|o| o.tl_equals(&v)) {
            out.push(v);
        }
    }
    Value::List(out)
}

fn at(target: &Value, index: &Value) -> Option<Value> {
    let Value::Number(i) = index else {
        return None;
    };
    if i.fract() != 0.0 || *i < 0.0 {
        return None;
    }
    match target {
        Value::Null => Some(Value::Null),
        Value::List(l) => Some(l.get(*i as usize).cloned().unwrap_or(Value::Null)),
        _ => None,
    }
}

impl Visitor for ConstantFolding<'_> {
    type Output = ExprId;

    fn compose_default(&mut self, ast: &mut Ast, id: ExprId, _: &(), children: Vec<ExprId>) -> OptimizeResult<ExprId> {
        Ok(ast.relink(id, &children))
    }

    fn compose_not(&mut self, ast: &mut Ast, id: ExprId, _: &(), value: ExprId) -> OptimizeResult<ExprId> {
        Ok(match literal(ast, value) {
            Some(v) => self.fold(ast, id, Some(value), Value::Bool(!v.is_true())),
            None => ast.relink(id, &[value]),
        })
    }

    fn compose_is_empty(&mut self, ast: &mut Ast, id: ExprId, _: &(), value: ExprId) -> OptimizeResult<ExprId> {
        Ok(match literal(ast, value) {
            Some(v) => self.fold(ast, id, Some(value), Value::Bool(v.is_empty())),
            None => ast.relink(id, &[value]),
        })
    }

    fn compose_arithmetic(
        &mut self,
        ast: &mut Ast,
        id: ExprId,
        _: &(),
        left: ExprId,
        right: ExprId,
    ) -> OptimizeResult<ExprId> {
        let Expr::Arithmetic { op, .. } = *ast.kind(id) else {
            unreachable!()
        };
        let folded = match (literal(ast, left), literal(ast, right)) {
            (Some(l), Some(r)) => arithmetic(op, &l, &r),
            _ => None,
        };
        Ok(match folded {
            Some(v) => self.fold(ast, id, Some(left), v),
            None => ast.relink(id, &[left, right]),
        })
    }

    fn compose_compare(
        &mut self,
        ast: &mut Ast,
        id: ExprId,
        _: &(),
        left: ExprId,
        right: ExprId,
    ) -> OptimizeResult<ExprId> {
        let folded = match (literal(ast, left), literal(ast, right)) {
            (Some(l), Some(r)) => ordering(&l, &r),
            _ => None,
        };
        Ok(match folded {
            Some(o) => self.fold(ast, id, Some(left), Value::from(o as i32)),
            None => ast.relink(id, &[left, right]),
        })
    }

    fn compose_compare_op(
        &mut self,
        ast: &mut Ast,
        id: ExprId,
        _: &(),
        left: ExprId,
        right: ExprId,
    ) -> OptimizeResult<ExprId> {
        let Expr::CompareOp { op, .. } = *ast.kind(id) else {
            unreachable!()
        };
        let folded = match (literal(ast, left), literal(ast, right)) {
            (Some(l), Some(r)) => ordering(&l, &r),
            _ => None,
        };
        Ok(match folded {
            Some(o) => self.fold(ast, id, Some(left), Value::Bool(op.holds(o))),
            None => ast.relink(id, &[left, right]),
        })
    }

    fn compose_is_equal(
        &mut self,
        ast: &mut Ast,
        id: ExprId,
        _: &(),
        left: ExprId,
        right: ExprId,
    ) -> OptimizeResult<ExprId> {
        Ok(match (literal(ast, left), literal(ast, right)) {
            (Some(l), Some(r)) => self.fold(ast, id, Some(left), Value::Bool(l.tl_equals(&r))),
            _ => ast.relink(id, &[left, right]),
        })
    }

    fn compose_string_test(
        &mut self,
        ast: &mut Ast,
        id: ExprId,
        _: &(),
        left: ExprId,
        right: ExprId,
    ) -> OptimizeResult<ExprId> {
        let Expr::StringTest { op, case_sensitive, .. } = *ast.kind(id) else {
            unreachable!()
        };
        let folded = match (literal(ast, left), literal(ast, right)) {
            (Some(l), Some(r)) => string_test(op, case_sensitive, &l, &r),
            _ => None,
        };
        Ok(match folded {
            Some(b) => self.fold(ast, id, Some(left), Value::Bool(b)),
            None => ast.relink(id, &[left, right]),
        })
    }

    fn compose_and(&mut self, ast: &mut Ast, id: ExprId, _: &(), left: ExprId, right: ExprId) -> OptimizeResult<ExprId> {
        match (literal(ast, left), literal(ast, right)) {
            (Some(l), _) if !l.is_true() => Ok(self.fold(ast, id, Some(left), Value::Bool(false))),
            (Some(_), Some(r)) => Ok(self.fold(ast, id, Some(left), Value::Bool(r.is_true()))),
            (Some(_), None) => {
                let right = self.coerce(ast, right)?;
                Ok(self.select(ast, id, right))
            },
            (None, Some(r)) if r.is_true() => {
                let left = self.coerce(ast, left)?;
                Ok(self.select(ast, id, left))
            },
            _ => Ok(ast.relink(id, &[left, right])),
        }
    }

    fn compose_or(&mut self, ast: &mut Ast, id: ExprId, _: &(), left: ExprId, right: ExprId) -> OptimizeResult<ExprId> {
        Ok(match literal(ast, left) {
            Some(l) if l.is_true() => self.select(ast, id, left),
            Some(_) => self.select(ast, id, right),
            None => ast.relink(id, &[left, right]),
        })
    }

    fn compose_if_else(
        &mut self,
        ast: &mut Ast,
        id: ExprId,
        _: &(),
        condition: ExprId,
        if_clause: ExprId,
        else_clause: ExprId,
    ) -> OptimizeResult<ExprId> {
        Ok(match literal(ast, condition) {
            Some(c) if c.is_true() => self.select(ast, id, if_clause),
            Some(_) => self.select(ast, id, else_clause),
            None => ast.relink(id, &[condition, if_clause, else_clause]),
        })
    }

    fn compose_filter(
        &mut self,
        ast: &mut Ast,
        id: ExprId,
        _: &(),
        base: ExprId,
        function: ExprId,
    ) -> OptimizeResult<ExprId> {
        let predicate = match ast.kind(function) {
            Expr::Literal(v) => Some((v.is_true(), function)),
            Expr::Lambda { body, .. } => ast.literal_value(*body).map(|v| (v.is_true(), *body)),
            _ => None,
        };
        Ok(match predicate {
            Some((true, _)) => self.select(ast, id, base),
            Some((false, literal)) => self.fold(ast, id, Some(literal), Value::empty_list()),
            None => ast.relink(id, &[base, function]),
        })
    }

    fn compose_union(&mut self, ast: &mut Ast, id: ExprId, _: &(), left: ExprId, right: ExprId) -> OptimizeResult<ExprId> {
        Ok(match (literal(ast, left), literal(ast, right)) {
            (Some(l), Some(r)) => self.fold(ast, id, Some(left), union(l, r)),
            (Some(l), None) if l.is_empty() => self.select(ast, id, right),
            (None, Some(r)) if r.is_empty() => self.select(ast, id, left),
            _ => ast.relink(id, &[left, right]),
        })
    }

    fn compose_intersection(
        &mut self,
        ast: &mut Ast,
        id: ExprId,
        _: &(),
        left: ExprId,
        right: ExprId,
    ) -> OptimizeResult<ExprId> {
        Ok(match (literal(ast, left), literal(ast, right)) {
            (Some(l), Some(r)) => self.fold(ast, id, Some(left), intersection(l, &r)),
            (Some(l), None) if l.is_empty() => self.fold(ast, id, Some(left), Value::empty_list()),
            (None, Some(r)) if r.is_empty() => self.fold(ast, id, Some(right), Value::empty_list()),
            _ => ast.relink(id, &[left, right]),
        })
    }

    fn compose_method(&mut self, ast: &mut Ast, id: ExprId, _: &(), args: Vec<ExprId>) -> OptimizeResult<ExprId> {
        let Expr::Method { name, .. } = ast.kind(id) else {
            unreachable!()
        };
        let name = name.clone();

        let values: Option<Vec<Value>> = args.iter().map(|a| literal(ast, *a)).collect();
        let (Some(builtin), Some(values)) = (self.builtins.get(&name), values) else {
            return Ok(ast.relink(id, &args));
        };
        if !builtin.is_side_effect_free() || !builtin.can_evaluate(&values) {
            return Ok(ast.relink(id, &args));
        }

        match builtin.evaluate(&values) {
            Ok(v) => Ok(self.fold(ast, id, args.first().copied(), v)),
            Err(source) => Err(OptimizeError::Evaluation {
                name,
                source,
                span: ast.span(id),
            }),
        }
    }

    fn compose_list(&mut self, ast: &mut Ast, id: ExprId, _: &(), elements: Vec<ExprId>) -> OptimizeResult<ExprId> {
        let values: Option<Vec<Value>> = elements.iter().map(|e| literal(ast, *e)).collect();
        Ok(match values {
            Some(values) => self.fold(ast, id, None, Value::List(values)),
            None => ast.relink(id, &elements),
        })
    }

    fn compose_singleton(&mut self, ast: &mut Ast, id: ExprId, _: &(), value: ExprId) -> OptimizeResult<ExprId> {
        Ok(match literal(ast, value) {
            Some(Value::Null) => self.fold(ast, id, Some(value), Value::empty_list()),
            Some(v) => self.fold(ast, id, Some(value), Value::List(vec![v])),
            None => ast.relink(id, &[value]),
        })
    }

    fn compose_single_element(&mut self, ast: &mut Ast, id: ExprId, _: &(), value: ExprId) -> OptimizeResult<ExprId> {
        let Some(v) = literal(ast, value) else {
            return Ok(ast.relink(id, &[value]));
        };
        let mut elements = v.into_collection();
        match elements.len() {
            0 => Ok(self.fold(ast, id, Some(value), Value::Null)),
            1 => {
                let element = elements.pop().unwrap_or(Value::Null);
                Ok(self.fold(ast, id, Some(value), element))
            },
            found => Err(OptimizeError::MoreThanASingleElement {
                found,
                span: ast.span(id),
                collection: ast.span(value),
            }),
        }
    }

    fn compose_size(&mut self, ast: &mut Ast, id: ExprId, _: &(), value: ExprId) -> OptimizeResult<ExprId> {
        Ok(match literal(ast, value) {
            Some(v) => self.fold(ast, id, Some(value), Value::from(v.as_collection().len() as i64)),
            None => ast.relink(id, &[value]),
        })
    }

    fn compose_flatten(&mut self, ast: &mut Ast, id: ExprId, _: &(), list: ExprId) -> OptimizeResult<ExprId> {
        Ok(match literal(ast, list) {
            Some(v) => {
                let flat = v.into_collection().into_iter().flat_map(Value::into_collection).collect();
                self.fold(ast, id, Some(list), Value::List(flat))
            },
            None => ast.relink(id, &[list]),
        })
    }

    fn compose_at(&mut self, ast: &mut Ast, id: ExprId, _: &(), target: ExprId, index: ExprId) -> OptimizeResult<ExprId> {
        let folded = match (literal(ast, target), literal(ast, index)) {
            (Some(t), Some(i)) => at(&t, &i),
            _ => None,
        };
        Ok(match folded {
            Some(v) => self.fold(ast, id, Some(target), v),
            None => ast.relink(id, &[target, index]),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn folded(ast: &mut Ast, root: ExprId) -> String {
        let root = fold_constants(ast, root, &Builtins::standard()).unwrap();
        ast.display(root).to_string()
    }

    fn binary(op: ArithmeticOp, l: impl Into<Value>, r: impl Into<Value>) -> String {
        let mut ast = Ast::new();
        let l = ast.literal(l);
        let r = ast.literal(r);
        let root = ast.arithmetic(op, l, r);
        folded(&mut ast, root)
    }

    #[test]
    fn arithmetic_on_literals() {
        use ArithmeticOp::*;
        assert_eq!(binary(Add, 1, 2), "3");
        assert_eq!(binary(Sub, 1, 2.5), "-1.5");
        assert_eq!(binary(Mul, 3, 4), "12");
        assert_eq!(binary(Div, 7, 2), "3.5");
        assert_eq!(binary(Mod, 7, 4), "3");
        assert_eq!(binary(Div, 7, 0), "(7 / 0)");
        assert_eq!(binary(Add, "a", 1), "'a1'");
        assert_eq!(binary(Add, Value::Null, "b"), "'b'");
        assert_eq!(binary(Mul, Value::Null, 2), "null");
        assert_eq!(binary(Add, vec![Value::from(1), Value::from(2)], 10), "[11, 12]");
        assert_eq!(binary(Sub, true, 1), "(true - 1)");
    }

    #[test]
    fn folds_into_left_literal() {
        let mut ast = Ast::new();
        let l = ast.literal(2);
        let r = ast.literal(3);
        let root = ast.add(l, r);
        let root = ast.with_span(root, 0..5);

        let new = fold_constants(&mut ast, root, &Builtins::standard()).unwrap();
        assert_eq!(new, l);
        assert_eq!(ast.literal_value(new), Some(&Value::from(5)));
        assert_eq!(ast.span(new), 0..5);
    }

    #[test]
    fn nested_folding() {
        let mut ast = Ast::new();
        let one = ast.literal(1);
        let two = ast.literal(2);
        let three = ast.literal(3);
        let mul = ast.arithmetic(ArithmeticOp::Mul, two, three);
        let sum = ast.add(one, mul);
        let seven = ast.literal(7);
        let root = ast.compare_op(CompareKind::Ge, sum, seven);
        assert_eq!(folded(&mut ast, root), "true");
    }

    #[test]
    fn comparisons() {
        let mut ast = Ast::new();
        let a = ast.literal("a");
        let b = ast.literal("b");
        let root = ast.compare(a, b);
        assert_eq!(folded(&mut ast, root), "-1");

        let mut ast = Ast::new();
        let a = ast.literal("");
        let b = ast.null();
        let root = ast.is_equal(a, b);
        assert_eq!(folded(&mut ast, root), "true");

        let mut ast = Ast::new();
        let x = ast.literal(vec![Value::from("x")]);
        let y = ast.literal("x");
        let root = ast.is_equal(x, y);
        assert_eq!(folded(&mut ast, root), "true");

        let mut ast = Ast::new();
        let x = ast.literal(vec![Value::from("x")]);
        let y = ast.literal("y");
        let root = ast.is_equal(x, y);
        assert_eq!(folded(&mut ast, root), "false");

        let mut ast = Ast::new();
        let a = ast.literal("Hello World");
        let b = ast.literal("WORLD");
        let root = ast.string_test(StringOp::EndsWith, a, b, false);
        assert_eq!(folded(&mut ast, root), "true");

        let mut ast = Ast::new();
        let a = ast.literal("Hello World");
        let b = ast.literal("WORLD");
        let root = ast.string_test(StringOp::Contains, a, b, true);
        assert_eq!(folded(&mut ast, root), "false");
    }

    #[test]
    fn false_and_anything() {
        let mut ast = Ast::new();
        let f = ast.literal(false);
        let x = ast.all("Person");
        let side = ast.method("random", vec![]);
        let rhs = ast.list(vec![x, side]);
        let root = ast.and(f, rhs);
        assert_eq!(folded(&mut ast, root), "false");
    }

    #[test]
    fn and_coerces_remaining_operand() {
        let mut ast = Ast::new();
        let t = ast.literal(true);
        let x = ast.all("Person");
        let root = ast.and(t, x);
        assert_eq!(folded(&mut ast, root), "toBoolean(all(`Person`))");

        let mut ast = Ast::new();
        let x = ast.var("x");
        let n = ast.not(x);
        let t = ast.literal("yes");
        let root = ast.and(n, t);
        assert_eq!(folded(&mut ast, root), "!$x");

        let mut ast = Ast::new();
        let t = ast.literal(1);
        let f = ast.literal("");
        let root = ast.and(t, f);
        assert_eq!(folded(&mut ast, root), "false");
    }

    #[test]
    fn and_with_falsy_right_literal_is_kept() {
        let mut ast = Ast::new();
        let x = ast.var("x");
        let f = ast.literal(false);
        let root = ast.and(x, f);
        assert_eq!(folded(&mut ast, root), "($x and false)");
    }

    #[test]
    fn missing_coercion_is_reported_lazily() {
        let mut ast = Ast::new();
        let t = ast.literal(true);
        let x = ast.all("Person");
        let x = ast.with_span(x, 9..20);
        let root = ast.and(t, x);
        assert_eq!(
            fold_constants(&mut ast, root, &Builtins::empty()),
            Err(OptimizeError::MissingBuiltin {
                name: TO_BOOLEAN.to_string(),
                span: 9..20
            })
        );

        // no coercion needed, no error
        let mut ast = Ast::new();
        let f = ast.literal(false);
        let x = ast.all("Person");
        let root = ast.and(f, x);
        assert!(fold_constants(&mut ast, root, &Builtins::empty()).is_ok());
    }

    #[test]
    fn or_short_circuits() {
        let mut ast = Ast::new();
        let t = ast.literal(true);
        let side = ast.method("random", vec![]);
        let root = ast.or(t, side);
        assert_eq!(folded(&mut ast, root), "true");

        let mut ast = Ast::new();
        let f = ast.null();
        let x = ast.var("x");
        let root = ast.or(f, x);
        assert_eq!(folded(&mut ast, root), "$x");

        let mut ast = Ast::new();
        let a = ast.literal("");
        let b = ast.literal("b");
        let root = ast.or(a, b);
        assert_eq!(folded(&mut ast, root), "'b'");
    }

    #[test]
    fn if_else_drops_dead_branch() {
        let mut ast = Ast::new();
        let c = ast.literal(true);
        let a = ast.var("a");
        let b = ast.var("b");
        let root = ast.if_else(c, a, b);
        let root = fold_constants(&mut ast, root, &Builtins::standard()).unwrap();
        assert_eq!(root, a);

        let mut ast = Ast::new();
        let c = ast.literal(0);
        let one = ast.literal(1);
        let two = ast.literal(2);
        let a = ast.add(one, two);
        let b = ast.var("b");
        let root = ast.if_else(c, a, b);
        assert_eq!(folded(&mut ast, root), "3");
    }

    #[test]
    fn filters_with_constant_predicates() {
        let mut ast = Ast::new();
        let all = ast.all("Person");
        let t = ast.literal(true);
        let root = ast.filter(all, t);
        assert_eq!(folded(&mut ast, root), "all(`Person`)");

        let mut ast = Ast::new();
        let all = ast.all("Person");
        let f = ast.literal(false);
        let lambda = ast.lambda("p", f);
        let root = ast.filter(all, lambda);
        assert_eq!(folded(&mut ast, root), "[]");
    }

    #[test]
    fn set_operations() {
        let mut ast = Ast::new();
        let l = ast.literal(vec![Value::from(1), Value::from(2)]);
        let r = ast.literal(vec![Value::from(2), Value::from(3)]);
        let root = ast.union(l, r);
        assert_eq!(folded(&mut ast, root), "[1, 2, 3]");

        let mut ast = Ast::new();
        let l = ast.literal(vec![Value::from(1), Value::from(2)]);
        let r = ast.literal(vec![Value::from(2), Value::from(3)]);
        let root = ast.intersection(l, r);
        assert_eq!(folded(&mut ast, root), "[2]");

        let mut ast = Ast::new();
        let l = ast.literal(Value::empty_list());
        let r = ast.all("Person");
        let root = ast.union(l, r);
        assert_eq!(folded(&mut ast, root), "all(`Person`)");

        let mut ast = Ast::new();
        let l = ast.all("Person");
        let r = ast.null();
        let root = ast.intersection(l, r);
        assert_eq!(folded(&mut ast, root), "[]");
    }

    #[test]
    fn builtins() {
        let mut ast = Ast::new();
        let s = ast.literal("abc");
        let root = ast.method("toUpperCase", vec![s]);
        assert_eq!(folded(&mut ast, root), "'ABC'");

        let mut ast = Ast::new();
        let root = ast.method("random", vec![]);
        assert_eq!(folded(&mut ast, root), "random()");

        let mut ast = Ast::new();
        let root = ast.method("now", vec![]);
        assert_eq!(folded(&mut ast, root), "now()");

        let mut ast = Ast::new();
        let x = ast.var("x");
        let root = ast.method("toUpperCase", vec![x]);
        assert_eq!(folded(&mut ast, root), "toUpperCase($x)");

        let mut ast = Ast::new();
        let s = ast.literal("abc");
        let root = ast.method("unknownFunction", vec![s]);
        assert_eq!(folded(&mut ast, root), "unknownFunction('abc')");
    }

    #[test]
    fn builtin_failure_propagates() {
        let mut ast = Ast::new();
        let n = ast.literal(1);
        let root = ast.method("toUpperCase", vec![n]);
        let root = ast.with_span(root, 0..14);
        assert!(matches!(
            fold_constants(&mut ast, root, &Builtins::standard()),
            Err(OptimizeError::Evaluation { name, span, .. }) if name == "toUpperCase" && span == (0..14)
        ));
    }

    #[test]
    fn collections() {
        let mut ast = Ast::new();
        let a = ast.literal(1);
        let b = ast.literal("b");
        let list = ast.list(vec![a, b]);
        let size = ast.size(list);
        assert_eq!(folded(&mut ast, size), "2");

        let mut ast = Ast::new();
        let a = ast.literal(1);
        let x = ast.var("x");
        let root = ast.list(vec![a, x]);
        assert_eq!(folded(&mut ast, root), "list(1, $x)");

        let mut ast = Ast::new();
        let n = ast.null();
        let root = ast.singleton(n);
        assert_eq!(folded(&mut ast, root), "[]");

        let mut ast = Ast::new();
        let l = ast.literal(vec![Value::from("only")]);
        let root = ast.single_element(l);
        assert_eq!(folded(&mut ast, root), "'only'");

        let mut ast = Ast::new();
        let l = ast.literal(vec![Value::from("a"), Value::from("b")]);
        let l = ast.with_span(l, 0..14);
        let root = ast.single_element(l);
        let root = ast.with_span(root, 0..30);
        assert_eq!(
            fold_constants(&mut ast, root, &Builtins::standard()),
            Err(OptimizeError::MoreThanASingleElement {
                found: 2,
                span: 0..30,
                collection: 0..14
            })
        );

        let mut ast = Ast::new();
        let l = ast.literal(vec![Value::from(vec![Value::from(1)]), Value::from(2), Value::Null]);
        let root = ast.flatten(l);
        assert_eq!(folded(&mut ast, root), "[1, 2]");

        let mut ast = Ast::new();
        let l = ast.literal(vec![Value::from("a"), Value::from("b")]);
        let i = ast.literal(1);
        let root = ast.at(l, i);
        assert_eq!(folded(&mut ast, root), "'b'");
    }

    #[test]
    fn not_and_is_empty() {
        let mut ast = Ast::new();
        let e = ast.literal("");
        let root = ast.not(e);
        assert_eq!(folded(&mut ast, root), "true");

        let mut ast = Ast::new();
        let e = ast.literal(Value::empty_list());
        let root = ast.is_empty(e);
        assert_eq!(folded(&mut ast, root), "true");
    }

    #[test]
    fn second_run_is_a_fixed_point() {
        let mut ast = Ast::new();
        let t = ast.literal(true);
        let x = ast.all("Person");
        let and = ast.and(t, x);
        let one = ast.literal(1);
        let two = ast.literal(2);
        let sum = ast.add(one, two);
        let y = ast.var("y");
        let gt = ast.compare_op(CompareKind::Gt, y, sum);
        let root = ast.list(vec![and, gt]);

        let builtins = Builtins::standard();
        let root = fold_constants(&mut ast, root, &builtins).unwrap();
        let first = ast.display(root).to_string();
        assert_eq!(first, "list(toBoolean(all(`Person`)), ($y > 3))");

        let again = fold_constants(&mut ast, root, &builtins).unwrap();
        assert_eq!(again, root);
        assert_eq!(ast.display(again).to_string(), first);
    }
}
