use super::*;
use std::fmt;

/// Renders a subtree in compact search-expression notation.
pub struct ExprFormatter<'a> {
    ast: &'a Ast,
    root: ExprId,
}

impl Ast {
    pub const fn display(&self, root: ExprId) -> ExprFormatter<'_> { ExprFormatter { ast: self, root } }
}

impl<'a> ExprFormatter<'a> {
    fn sub(&self, id: ExprId) -> Self { Self { ast: self.ast, root: id } }

    fn join(&self, f: &mut fmt::Formatter, ids: &[ExprId], sep: &str) -> fmt::Result {
        for (i, id) in ids.iter().enumerate() {
            if i > 0 {
                write!(f, "{sep}")?;
            }
            write!(f, "{}", self.sub(*id))?;
        }
        Ok(())
    }

    fn binary(&self, f: &mut fmt::Formatter, left: ExprId, op: &str, right: ExprId) -> fmt::Result {
        write!(f, "({} {op} {})", self.sub(left), self.sub(right))
    }

    fn apply(&self, f: &mut fmt::Formatter, name: &str, args: &[ExprId]) -> fmt::Result {
        write!(f, "{name}(")?;
        self.join(f, args, ", ")?;
        write!(f, ")")
    }
}

impl fmt::Display for ExprFormatter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use Expr::*;
        match self.ast.kind(self.root) {
            Literal(v) => write!(f, "{v}"),
            Var { name, .. } => write!(f, "${name}"),
            All { ty } => write!(f, "all(`{}`)", ty.0),
            KbQuery { name } => write!(f, "kb('{name}')"),
            Lambda { param, body } => write!(f, "(${param} -> {})", self.sub(*body)),
            Tuple { coords } => {
                write!(f, "tuple(")?;
                for (i, c) in coords.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    let opt = if c.optional { "?" } else { "" };
                    write!(f, "{}{opt}: {}", c.name, self.sub(c.value))?;
                }
                write!(f, ")")
            },
            Call { function, argument } => self.apply(f, "call", &[*function, *argument]),
            Method { name, args } => self.apply(f, name, args),
            Filter { base, function } => self.apply(f, "filter", &[*base, *function]),
            Foreach { base, function } => self.apply(f, "foreach", &[*base, *function]),
            Flatten { list } => self.apply(f, "flatten", &[*list]),
            Sort { list, comparator } => self.apply(f, "sort", &[*list, *comparator]),
            Union { left, right } => self.apply(f, "union", &[*left, *right]),
            Intersection { left, right } => self.apply(f, "intersection", &[*left, *right]),
            Singleton { value } => self.apply(f, "singleton", &[*value]),
            SingleElement { value } => self.apply(f, "singleElement", &[*value]),
            Size { value } => self.apply(f, "size", &[*value]),
            Not { value } => write!(f, "!{}", self.sub(*value)),
            IsEmpty { value } => self.apply(f, "isEmpty", &[*value]),
            Arithmetic { op, left, right } => self.binary(f, *left, op.symbol(), *right),
            Compare { left, right } => self.apply(f, "compare", &[*left, *right]),
            CompareOp { op, left, right } => self.binary(f, *left, op.symbol(), *right),
            IsEqual { left, right } => self.binary(f, *left, "==", *right),
            StringTest {
                op,
                left,
                right,
                case_sensitive,
            } => {
                let name = if *case_sensitive {
                    op.name().to_string()
                } else {
                    format!("{}IgnoreCase", op.name())
                };
                self.apply(f, &name, &[*left, *right])
            },
            And { left, right } => self.binary(f, *left, "and", *right),
            Or { left, right } => self.binary(f, *left, "or", *right),
            IfElse {
                condition,
                if_clause,
                else_clause,
            } => write!(
                f,
                "({} ? {} : {})",
                self.sub(*condition),
                self.sub(*if_clause),
                self.sub(*else_clause)
            ),
            Access { target, part } => write!(f, "{}.get(`{}#{}`)", self.sub(*target), part.owner.0, part.name),
            AssociationNavigation { target, end } => {
                write!(f, "{}.navigate(`{}#{}`)", self.sub(*target), end.owner.0, end.name)
            },
            Referers { target, reference } => write!(
                f,
                "{}.referers(`{}#{}`)",
                self.sub(*target),
                reference.owner.0,
                reference.name
            ),
            At { target, index } => write!(f, "{}[{}]", self.sub(*target), self.sub(*index)),
            Block { contents } => {
                write!(f, "{{")?;
                self.join(f, contents, "; ")?;
                write!(f, "}}")
            },
            List { elements } => self.apply(f, "list", elements),
            Update { target, part, value } => write!(
                f,
                "{}.set(`{}#{}`, {})",
                self.sub(*target),
                part.owner.0,
                part.name,
                self.sub(*value)
            ),
            Recursion {
                start,
                step,
                min_depth,
                max_depth,
            } => self.apply(f, "recursion", &[*start, *step, *min_depth, *max_depth]),
            Html { contents } => {
                write!(f, "{{{{{{")?;
                self.join(f, contents, "")?;
                write!(f, "}}}}}}")
            },
            Tag { name, empty, attributes } => {
                write!(f, "<{name}")?;
                for a in attributes {
                    write!(f, " {}", self.sub(*a))?;
                }
                if *empty {
                    write!(f, "/>")
                } else {
                    write!(f, ">")
                }
            },
            Attribute { name, value } => write!(f, "{name}=\"{{{}}}\"", self.sub(*value)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operators() {
        let mut ast = Ast::new();
        let a = ast.var("a");
        let b = ast.literal(2);
        let sum = ast.add(a, b);
        let t = ast.literal(true);
        let root = ast.and(sum, t);
        assert_eq!(ast.display(root).to_string(), "(($a + 2) and true)");
    }

    #[test]
    fn binders() {
        let mut ast = Ast::new();
        let all = ast.all("Person");
        let x = ast.var("x");
        let name = ast.access(x, PartRef::new("Person", "name", "string"));
        let lambda = ast.lambda("x", name);
        let root = ast.foreach(all, lambda);
        assert_eq!(
            ast.display(root).to_string(),
            "foreach(all(`Person`), ($x -> $x.get(`Person#name`)))"
        );
    }

    #[test]
    fn html() {
        let mut ast = Ast::new();
        let v = ast.literal("c");
        let class = ast.attribute("class", v);
        let div = ast.tag("div", true, vec![class]);
        let root = ast.html(vec![div]);
        assert_eq!(ast.display(root).to_string(), "{{{<div class=\"{'c'}\"/>}}}");
    }

    #[test]
    fn synthetic_names() {
        let mut ast = Ast::new();
        let n = ast.fresh_name();
        let v = ast.var(n.clone());
        let root = ast.lambda(n, v);
        assert_eq!(ast.display(root).to_string(), "($#0 -> $#0)");
    }
}
