use super::*;

/// Builders used by a parser (and by the passes) to allocate nodes.
/// Every builder creates a node with an empty span; use [`Ast::with_span`]
/// to attach a source location.
impl Ast {
    pub fn with_span(&mut self, id: ExprId, span: Span) -> ExprId { self.set_span(id, span) }

    fn make(&mut self, kind: Expr) -> ExprId { self.push(kind, 0..0) }

    pub fn literal(&mut self, value: impl Into<Value>) -> ExprId { self.make(Expr::Literal(value.into())) }

    pub fn null(&mut self) -> ExprId { self.literal(Value::Null) }

    pub fn part(&mut self, part: PartRef) -> ExprId { self.literal(part) }

    pub fn var(&mut self, name: impl Into<Name>) -> ExprId {
        self.make(Expr::Var {
            name: name.into(),
            def: None,
        })
    }

    /// A variable already linked to its definition.
    pub fn bound_var(&mut self, key: DefKey) -> ExprId {
        let name = self.def_name(key).unwrap_or_else(|| unreachable!("dangling definition {key:?}"));
        self.make(Expr::Var { name, def: Some(key) })
    }

    pub fn all(&mut self, ty: &str) -> ExprId { self.make(Expr::All { ty: TypeRef::new(ty) }) }

    pub fn kb_query(&mut self, name: &str) -> ExprId { self.make(Expr::KbQuery { name: name.to_string() }) }

    pub fn lambda(&mut self, param: impl Into<Name>, body: ExprId) -> ExprId {
        self.make(Expr::Lambda {
            param: param.into(),
            body,
        })
    }

    pub fn tuple(&mut self, coords: Vec<(&str, ExprId)>) -> ExprId {
        let coords = coords
            .into_iter()
            .map(|(name, value)| Coord {
                name: name.to_string(),
                optional: false,
                value,
            })
            .collect();
        self.make(Expr::Tuple { coords })
    }

    pub fn tuple_coords(&mut self, coords: Vec<Coord>) -> ExprId { self.make(Expr::Tuple { coords }) }

    pub fn call(&mut self, function: ExprId, argument: ExprId) -> ExprId {
        self.make(Expr::Call { function, argument })
    }

    /// `call(name -> body, value)`, the usual local binding.
    pub fn call_let(&mut self, name: impl Into<Name>, value: ExprId, body: ExprId) -> ExprId {
        let function = self.lambda(name, body);
        self.call(function, value)
    }

    pub fn method(&mut self, name: &str, args: Vec<ExprId>) -> ExprId {
        self.make(Expr::Method {
            name: name.to_string(),
            args,
        })
    }

    pub fn filter(&mut self, base: ExprId, function: ExprId) -> ExprId { self.make(Expr::Filter { base, function }) }

    pub fn foreach(&mut self, base: ExprId, function: ExprId) -> ExprId { self.make(Expr::Foreach { base, function }) }

    pub fn flatten(&mut self, list: ExprId) -> ExprId { self.make(Expr::Flatten { list }) }

    pub fn sort(&mut self, list: ExprId, comparator: ExprId) -> ExprId { self.make(Expr::Sort { list, comparator }) }

    pub fn union(&mut self, left: ExprId, right: ExprId) -> ExprId { self.make(Expr::Union { left, right }) }

    pub fn intersection(&mut self, left: ExprId, right: ExprId) -> ExprId {
        self.make(Expr::Intersection { left, right })
    }

    pub fn singleton(&mut self, value: ExprId) -> ExprId { self.make(Expr::Singleton { value }) }

    pub fn single_element(&mut self, value: ExprId) -> ExprId { self.make(Expr::SingleElement { value }) }

    pub fn size(&mut self, value: ExprId) -> ExprId { self.make(Expr::Size { value }) }

    pub fn not(&mut self, value: ExprId) -> ExprId { self.make(Expr::Not { value }) }

    pub fn is_empty(&mut self, value: ExprId) -> ExprId { self.make(Expr::IsEmpty { value }) }

    pub fn arithmetic(&mut self, op: ArithmeticOp, left: ExprId, right: ExprId) -> ExprId {
        self.make(Expr::Arithmetic { op, left, right })
    }

    pub fn add(&mut self, left: ExprId, right: ExprId) -> ExprId { self.arithmetic(ArithmeticOp::Add, left, right) }

    pub fn compare(&mut self, left: ExprId, right: ExprId) -> ExprId { self.make(Expr::Compare { left, right }) }

    pub fn compare_op(&mut self, op: CompareKind, left: ExprId, right: ExprId) -> ExprId {
        self.make(Expr::CompareOp { op, left, right })
    }

    pub fn is_equal(&mut self, left: ExprId, right: ExprId) -> ExprId { self.make(Expr::IsEqual { left, right }) }

    pub fn string_test(&mut self, op: StringOp, left: ExprId, right: ExprId, case_sensitive: bool) -> ExprId {
        self.make(Expr::StringTest {
            op,
            left,
            right,
            case_sensitive,
        })
    }

    pub fn and(&mut self, left: ExprId, right: ExprId) -> ExprId { self.make(Expr::And { left, right }) }

    pub fn or(&mut self, left: ExprId, right: ExprId) -> ExprId { self.make(Expr::Or { left, right }) }

    pub fn if_else(&mut self, condition: ExprId, if_clause: ExprId, else_clause: ExprId) -> ExprId {
        self.make(Expr::IfElse {
            condition,
            if_clause,
            else_clause,
        })
    }

    pub fn access(&mut self, target: ExprId, part: PartRef) -> ExprId { self.make(Expr::Access { target, part }) }

    pub fn navigate(&mut self, target: ExprId, end: PartRef) -> ExprId {
        self.make(Expr::AssociationNavigation { target, end })
    }

    pub fn referers(&mut self, target: ExprId, reference: PartRef) -> ExprId {
        self.make(Expr::Referers { target, reference })
    }

    pub fn at(&mut self, target: ExprId, index: ExprId) -> ExprId { self.make(Expr::At { target, index }) }

    pub fn block(&mut self, contents: Vec<ExprId>) -> ExprId { self.make(Expr::Block { contents }) }

    pub fn list(&mut self, elements: Vec<ExprId>) -> ExprId { self.make(Expr::List { elements }) }

    pub fn update(&mut self, target: ExprId, part: PartRef, value: ExprId) -> ExprId {
        self.make(Expr::Update { target, part, value })
    }

    pub fn recursion(&mut self, start: ExprId, step: ExprId, min_depth: ExprId, max_depth: ExprId) -> ExprId {
        self.make(Expr::Recursion {
            start,
            step,
            min_depth,
            max_depth,
        })
    }

    pub fn html(&mut self, contents: Vec<ExprId>) -> ExprId { self.make(Expr::Html { contents }) }

    pub fn tag(&mut self, name: &str, empty: bool, attributes: Vec<ExprId>) -> ExprId {
        self.make(Expr::Tag {
            name: name.to_string(),
            empty,
            attributes,
        })
    }

    pub fn attribute(&mut self, name: &str, value: ExprId) -> ExprId {
        self.make(Expr::Attribute {
            name: name.to_string(),
            value,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn call_let_binds_lambda() {
        let mut ast = Ast::new();
        let one = ast.literal(1);
        let x = ast.var("x");
        let body = ast.add(x, one);
        let two = ast.literal(2);
        let root = ast.call_let("x", two, body);

        let Expr::Call { function, argument } = *ast.kind(root) else {
            panic!("expected a call");
        };
        assert_eq!(argument, two);
        assert!(matches!(ast.kind(function), Expr::Lambda { body: b, .. } if *b == body));
    }

    #[test]
    fn spans() {
        let mut ast = Ast::new();
        let a = ast.literal("a");
        assert_eq!(ast.span(a), 0..0);
        let a = ast.with_span(a, 3..6);
        assert_eq!(ast.span(a), 3..6);
    }

    #[test]
    fn fresh_names_are_unique() {
        let mut ast = Ast::new();
        let a = ast.fresh_name();
        let b = ast.fresh_name();
        assert_ne!(a, b);
        assert_eq!(a.to_string(), "#0");
    }

    #[test]
    fn bound_var_takes_definition_name() {
        let mut ast = Ast::new();
        let body = ast.null();
        let lambda = ast.lambda("p", body);
        let v = ast.bound_var(DefKey::Param(lambda));
        assert!(matches!(ast.kind(v), Expr::Var { name, def: Some(DefKey::Param(l)) } if name.to_string() == "p" && *l == lambda));

        let one = ast.literal(1);
        let tuple = ast.tuple(vec![("a", one)]);
        let v = ast.bound_var(DefKey::Coord(tuple, 0));
        assert_eq!(ast.def(v), Some(DefKey::Coord(tuple, 0)));
    }
}
