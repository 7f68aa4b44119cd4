use super::*;
use rustc_hash::FxHashMap;
use tracing::{debug, debug_span, trace};

/// Inferred type of every node reachable from the root.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TypeAnnotations {
    types: FxHashMap<ExprId, Type>,
}

impl TypeAnnotations {
    pub fn get(&self, id: ExprId) -> Option<&Type> { self.types.get(&id) }

    pub fn len(&self) -> usize { self.types.len() }

    pub fn is_empty(&self) -> bool { self.types.is_empty() }

    pub fn iter(&self) -> impl Iterator<Item = (ExprId, &Type)> { self.types.iter().map(|(id, t)| (*id, t)) }
}

/// Computes the type of every node. Never fails: nodes whose type cannot be
/// determined get [`Type::Any`], nodes without a value type [`Type::Nothing`].
/// Variables must be resolved.
pub fn resolve_types(ast: &mut Ast, root: ExprId, model: &mut dyn TypeModel, builtins: &Builtins) -> TypeAnnotations {
    let _span = debug_span!("resolve_types").entered();

    let mut resolver = TypeResolver {
        model,
        builtins,
        params: FxHashMap::default(),
        defs: FxHashMap::default(),
        annotations: TypeAnnotations::default(),
    };
    if let Err(e) = resolver.visit(ast, root, &()) {
        unreachable!("type resolution is total: {e}");
    }

    debug!(annotated = resolver.annotations.len(), "resolved types");
    resolver.annotations
}

struct TypeResolver<'a> {
    model: &'a mut dyn TypeModel,
    builtins: &'a Builtins,
    /// Parameter types of lambdas not yet visited, from the collection they
    /// iterate or the argument they are called with.
    params: FxHashMap<ExprId, Type>,
    defs: FxHashMap<DefKey, Type>,
    annotations: TypeAnnotations,
}

impl TypeResolver<'_> {
    fn lookup(&self, ty: &TypeRef) -> Type { self.model.lookup(&ty.0).unwrap_or(Type::Any) }

    fn part(&self, target: &Type, part: &PartRef) -> Type {
        self.model
            .lookup(&part.target.0)
            .or_else(|| target.property(&part.name))
            .unwrap_or(Type::Any)
    }

    fn literal(&self, value: &Value) -> Type {
        match value {
            Value::Bool(_) => self.model.primitive(Primitive::Boolean),
            Value::Number(n) if n.fract() == 0.0 => self.model.primitive(Primitive::Integer),
            Value::Number(_) => self.model.primitive(Primitive::Float),
            Value::String(_) => self.model.primitive(Primitive::String),
            Value::List(l) => l
                .iter()
                .map(|v| self.literal(v))
                .reduce(|a, b| a.join(&b))
                .unwrap_or(Type::Any),
            Value::Null | Value::Part(_) | Value::Type(_) => Type::Any,
        }
    }

    /// Makes `ty` the parameter type of `function` if it is a lambda.
    fn bind_param(&mut self, ast: &Ast, function: ExprId, ty: Type) {
        if matches!(ast.kind(function), Expr::Lambda { .. }) {
            self.params.insert(function, ty);
        }
    }

    fn result(function: Type) -> Type {
        match function {
            Type::Function { result, .. } => *result,
            other => other,
        }
    }

    fn typed(&mut self, ast: &mut Ast, id: ExprId) -> OptimizeResult<Type> {
        match *ast.kind(id) {
            Expr::Filter { base, function } | Expr::Foreach { base, function } => {
                let base = self.visit(ast, base, &())?;
                self.bind_param(ast, function, base.clone());
                let function = self.visit(ast, function, &())?;
                compose(self, ast, id, &(), vec![base, function])
            },
            Expr::Sort { list, comparator } => {
                let list = self.visit(ast, list, &())?;
                // comparators take both elements curried
                if let Expr::Lambda { body, .. } = *ast.kind(comparator) {
                    self.bind_param(ast, body, list.clone());
                }
                self.bind_param(ast, comparator, list.clone());
                let comparator = self.visit(ast, comparator, &())?;
                compose(self, ast, id, &(), vec![list, comparator])
            },
            Expr::Recursion {
                start,
                step,
                min_depth,
                max_depth,
            } => {
                let start = self.visit(ast, start, &())?;
                self.bind_param(ast, step, start.clone());
                let step = self.visit(ast, step, &())?;
                let min_depth = self.visit(ast, min_depth, &())?;
                let max_depth = self.visit(ast, max_depth, &())?;
                compose(self, ast, id, &(), vec![start, step, min_depth, max_depth])
            },
            Expr::Call { function, argument } => {
                let argument = self.visit(ast, argument, &())?;
                self.bind_param(ast, function, argument.clone());
                let function = self.visit(ast, function, &())?;
                compose(self, ast, id, &(), vec![function, argument])
            },
            Expr::Lambda { .. } => {
                let param = self.params.remove(&id).unwrap_or(Type::Any);
                self.defs.insert(DefKey::Param(id), param);
                descend(self, ast, id, &())
            },
            _ => descend(self, ast, id, &()),
        }
    }
}

impl Visitor for TypeResolver<'_> {
    type Output = Type;

    fn compose_default(&mut self, _: &mut Ast, _: ExprId, _: &(), _: Vec<Type>) -> OptimizeResult<Type> { Ok(Type::Any) }

    fn visit(&mut self, ast: &mut Ast, id: ExprId, _: &()) -> OptimizeResult<Type> {
        let ty = self.typed(ast, id)?;
        trace!(node = %ast.display(id), %ty, "typed");
        self.annotations.types.insert(id, ty.clone());
        Ok(ty)
    }

    fn compose_literal(&mut self, ast: &mut Ast, id: ExprId, _: &()) -> OptimizeResult<Type> {
        Ok(ast.literal_value(id).map_or(Type::Any, |v| self.literal(v)))
    }

    fn compose_var(&mut self, ast: &mut Ast, id: ExprId, _: &()) -> OptimizeResult<Type> {
        Ok(ast.def(id).and_then(|key| self.defs.get(&key).cloned()).unwrap_or(Type::Any))
    }

    fn compose_all(&mut self, ast: &mut Ast, id: ExprId, _: &()) -> OptimizeResult<Type> {
        let Expr::All { ty } = ast.kind(id) else {
            unreachable!()
        };
        Ok(self.lookup(ty))
    }

    fn compose_lambda(&mut self, _: &mut Ast, id: ExprId, _: &(), body: Type) -> OptimizeResult<Type> {
        let param = self.defs.get(&DefKey::Param(id)).cloned().unwrap_or(Type::Any);
        Ok(Type::function(param, body))
    }

    fn compose_tuple(&mut self, ast: &mut Ast, id: ExprId, _: &(), values: Vec<Type>) -> OptimizeResult<Type> {
        let Expr::Tuple { coords } = ast.kind(id) else {
            unreachable!()
        };
        let names: Vec<String> = coords.iter().map(|c| c.name.clone()).collect();

        let mut properties = Vec::with_capacity(names.len());
        for (i, (name, ty)) in names.iter().zip(values).enumerate() {
            self.defs.insert(DefKey::Coord(id, i), ty.clone());
            properties.push(Property { name: name.clone(), ty });
        }
        Ok(self.model.record(format!("tuple({})", names.join(", ")), properties))
    }

    fn compose_call(&mut self, _: &mut Ast, _: ExprId, _: &(), function: Type, _: Type) -> OptimizeResult<Type> {
        Ok(Self::result(function))
    }

    fn compose_method(&mut self, ast: &mut Ast, id: ExprId, _: &(), args: Vec<Type>) -> OptimizeResult<Type> {
        let Expr::Method { name, .. } = ast.kind(id) else {
            unreachable!()
        };
        Ok(match self.builtins.get(name) {
            Some(builtin) => builtin.result_type(&*self.model, &args),
            None => Type::Any,
        })
    }

    fn compose_filter(&mut self, _: &mut Ast, _: ExprId, _: &(), base: Type, _: Type) -> OptimizeResult<Type> { Ok(base) }

    fn compose_foreach(&mut self, _: &mut Ast, _: ExprId, _: &(), _: Type, function: Type) -> OptimizeResult<Type> {
        Ok(Self::result(function))
    }

    fn compose_flatten(&mut self, _: &mut Ast, _: ExprId, _: &(), list: Type) -> OptimizeResult<Type> { Ok(list) }

    fn compose_sort(&mut self, _: &mut Ast, _: ExprId, _: &(), list: Type, _: Type) -> OptimizeResult<Type> { Ok(list) }

    fn compose_union(&mut self, _: &mut Ast, _: ExprId, _: &(), left: Type, right: Type) -> OptimizeResult<Type> {
        Ok(left.union(&right))
    }

    fn compose_intersection(&mut self, _: &mut Ast, _: ExprId, _: &(), left: Type, _: Type) -> OptimizeResult<Type> {
        Ok(left)
    }

    fn compose_singleton(&mut self, _: &mut Ast, _: ExprId, _: &(), value: Type) -> OptimizeResult<Type> { Ok(value) }

    fn compose_single_element(&mut self, _: &mut Ast, _: ExprId, _: &(), value: Type) -> OptimizeResult<Type> {
        Ok(value)
    }

    fn compose_size(&mut self, _: &mut Ast, _: ExprId, _: &(), _: Type) -> OptimizeResult<Type> {
        Ok(self.model.primitive(Primitive::Integer))
    }

    fn compose_not(&mut self, _: &mut Ast, _: ExprId, _: &(), _: Type) -> OptimizeResult<Type> {
        Ok(self.model.primitive(Primitive::Boolean))
    }

    fn compose_is_empty(&mut self, _: &mut Ast, _: ExprId, _: &(), _: Type) -> OptimizeResult<Type> {
        Ok(self.model.primitive(Primitive::Boolean))
    }

    fn compose_arithmetic(&mut self, _: &mut Ast, _: ExprId, _: &(), left: Type, _: Type) -> OptimizeResult<Type> {
        Ok(left)
    }

    fn compose_compare(&mut self, _: &mut Ast, _: ExprId, _: &(), _: Type, _: Type) -> OptimizeResult<Type> {
        Ok(self.model.primitive(Primitive::Integer))
    }

    fn compose_compare_op(&mut self, _: &mut Ast, _: ExprId, _: &(), _: Type, _: Type) -> OptimizeResult<Type> {
        Ok(self.model.primitive(Primitive::Boolean))
    }

    fn compose_is_equal(&mut self, _: &mut Ast, _: ExprId, _: &(), _: Type, _: Type) -> OptimizeResult<Type> {
        Ok(self.model.primitive(Primitive::Boolean))
    }

    fn compose_string_test(&mut self, _: &mut Ast, _: ExprId, _: &(), _: Type, _: Type) -> OptimizeResult<Type> {
        Ok(self.model.primitive(Primitive::Boolean))
    }

    fn compose_and(&mut self, _: &mut Ast, _: ExprId, _: &(), _: Type, _: Type) -> OptimizeResult<Type> {
        Ok(self.model.primitive(Primitive::Boolean))
    }

    fn compose_or(&mut self, _: &mut Ast, _: ExprId, _: &(), left: Type, right: Type) -> OptimizeResult<Type> {
        Ok(left.join(&right))
    }

    fn compose_if_else(
        &mut self,
        _: &mut Ast,
        _: ExprId,
        _: &(),
        _: Type,
        if_clause: Type,
        else_clause: Type,
    ) -> OptimizeResult<Type> {
        Ok(if_clause.join(&else_clause))
    }

    fn compose_access(&mut self, ast: &mut Ast, id: ExprId, _: &(), target: Type) -> OptimizeResult<Type> {
        let Expr::Access { part, .. } = ast.kind(id) else {
            unreachable!()
        };
        Ok(self.part(&target, part))
    }

    fn compose_navigation(&mut self, ast: &mut Ast, id: ExprId, _: &(), target: Type) -> OptimizeResult<Type> {
        let Expr::AssociationNavigation { end, .. } = ast.kind(id) else {
            unreachable!()
        };
        Ok(self.part(&target, end))
    }

    fn compose_referers(&mut self, ast: &mut Ast, id: ExprId, _: &(), _: Type) -> OptimizeResult<Type> {
        let Expr::Referers { reference, .. } = ast.kind(id) else {
            unreachable!()
        };
        Ok(self.lookup(&reference.owner))
    }

    fn compose_at(&mut self, _: &mut Ast, _: ExprId, _: &(), target: Type, _: Type) -> OptimizeResult<Type> { Ok(target) }

    fn compose_block(&mut self, _: &mut Ast, _: ExprId, _: &(), _: Vec<Type>) -> OptimizeResult<Type> { Ok(Type::Nothing) }

    fn compose_list(&mut self, _: &mut Ast, _: ExprId, _: &(), elements: Vec<Type>) -> OptimizeResult<Type> {
        Ok(elements.into_iter().reduce(|a, b| a.join(&b)).unwrap_or(Type::Any))
    }

    fn compose_update(&mut self, _: &mut Ast, _: ExprId, _: &(), _: Type, _: Type) -> OptimizeResult<Type> { Ok(Type::Nothing) }

    fn compose_recursion(
        &mut self,
        _: &mut Ast,
        _: ExprId,
        _: &(),
        start: Type,
        _: Type,
        _: Type,
        _: Type,
    ) -> OptimizeResult<Type> {
        Ok(start)
    }

    fn compose_html(&mut self, _: &mut Ast, _: ExprId, _: &(), _: Vec<Type>) -> OptimizeResult<Type> { Ok(Type::Nothing) }

    fn compose_tag(&mut self, _: &mut Ast, _: ExprId, _: &(), _: Vec<Type>) -> OptimizeResult<Type> { Ok(Type::Nothing) }

    fn compose_attribute(&mut self, _: &mut Ast, _: ExprId, _: &(), _: Type) -> OptimizeResult<Type> { Ok(Type::Nothing) }
}
