use super::*;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ExprId(u32);

impl ExprId {
    pub const fn index(self) -> usize { self.0 as usize }
}

impl fmt::Display for ExprId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result { write!(f, "%{}", self.0) }
}

/// Identity of something that binds exactly one variable: the parameter of a
/// lambda, or one coordinate of a tuple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DefKey {
    Param(ExprId),
    Coord(ExprId, usize),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Name {
    User(String),
    Synthetic(u32),
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::User(name) => write!(f, "{name}"),
            Self::Synthetic(n) => write!(f, "#{n}"),
        }
    }
}

impl From<&str> for Name {
    fn from(name: &str) -> Self { Self::User(name.to_string()) }
}

impl From<String> for Name {
    fn from(name: String) -> Self { Self::User(name) }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Coord {
    pub name: String,
    pub optional: bool,
    pub value: ExprId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArithmeticOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
}

impl ArithmeticOp {
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::Mod => "%",
        }
    }

    pub fn apply(self, lhs: f64, rhs: f64) -> f64 {
        match self {
            Self::Add => lhs + rhs,
            Self::Sub => lhs - rhs,
            Self::Mul => lhs * rhs,
            Self::Div => lhs / rhs,
            Self::Mod => lhs % rhs,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompareKind {
    Lt,
    Le,
    Gt,
    Ge,
}

impl CompareKind {
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Ge => ">=",
        }
    }

    pub fn holds(self, ordering: std::cmp::Ordering) -> bool {
        use std::cmp::Ordering::*;
        match self {
            Self::Lt => ordering == Less,
            Self::Le => ordering != Greater,
            Self::Gt => ordering == Greater,
            Self::Ge => ordering != Less,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StringOp {
    Equals,
    Contains,
    StartsWith,
    EndsWith,
}

impl StringOp {
    pub const fn name(self) -> &'static str {
        match self {
            Self::Equals => "equalsText",
            Self::Contains => "contains",
            Self::StartsWith => "startsWith",
            Self::EndsWith => "endsWith",
        }
    }

    pub fn test(self, text: &str, pattern: &str) -> bool {
        match self {
            Self::Equals => text == pattern,
            Self::Contains => text.contains(pattern),
            Self::StartsWith => text.starts_with(pattern),
            Self::EndsWith => text.ends_with(pattern),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(Value),
    Var {
        name: Name,
        def: Option<DefKey>,
    },
    All {
        ty: TypeRef,
    },
    KbQuery {
        name: String,
    },

    Lambda {
        param: Name,
        body: ExprId,
    },
    Tuple {
        coords: Vec<Coord>,
    },

    Call {
        function: ExprId,
        argument: ExprId,
    },
    Method {
        name: String,
        args: Vec<ExprId>,
    },

    Filter {
        base: ExprId,
        function: ExprId,
    },
    Foreach {
        base: ExprId,
        function: ExprId,
    },
    Flatten {
        list: ExprId,
    },
    Sort {
        list: ExprId,
        comparator: ExprId,
    },
    Union {
        left: ExprId,
        right: ExprId,
    },
    Intersection {
        left: ExprId,
        right: ExprId,
    },
    Singleton {
        value: ExprId,
    },
    SingleElement {
        value: ExprId,
    },
    Size {
        value: ExprId,
    },

    Not {
        value: ExprId,
    },
    IsEmpty {
        value: ExprId,
    },
    Arithmetic {
        op: ArithmeticOp,
        left: ExprId,
        right: ExprId,
    },
    Compare {
        left: ExprId,
        right: ExprId,
    },
    CompareOp {
        op: CompareKind,
        left: ExprId,
        right: ExprId,
    },
    IsEqual {
        left: ExprId,
        right: ExprId,
    },
    StringTest {
        op: StringOp,
        left: ExprId,
        right: ExprId,
        case_sensitive: bool,
    },
    And {
        left: ExprId,
        right: ExprId,
    },
    Or {
        left: ExprId,
        right: ExprId,
    },
    IfElse {
        condition: ExprId,
        if_clause: ExprId,
        else_clause: ExprId,
    },

    Access {
        target: ExprId,
        part: PartRef,
    },
    AssociationNavigation {
        target: ExprId,
        end: PartRef,
    },
    Referers {
        target: ExprId,
        reference: PartRef,
    },
    At {
        target: ExprId,
        index: ExprId,
    },

    Block {
        contents: Vec<ExprId>,
    },
    List {
        elements: Vec<ExprId>,
    },
    Update {
        target: ExprId,
        part: PartRef,
        value: ExprId,
    },
    Recursion {
        start: ExprId,
        step: ExprId,
        min_depth: ExprId,
        max_depth: ExprId,
    },

    Html {
        contents: Vec<ExprId>,
    },
    Tag {
        name: String,
        empty: bool,
        attributes: Vec<ExprId>,
    },
    Attribute {
        name: String,
        value: ExprId,
    },
}

impl Expr {
    /// Child expressions in declaration order.
    pub fn children(&self) -> Vec<ExprId> {
        use Expr::*;
        match self {
            Literal(_) | Var { .. } | All { .. } | KbQuery { .. } => Vec::new(),
            Lambda { body, .. } => vec![*body],
            Tuple { coords } => coords.iter().map(|c| c.value).collect(),
            Call { function, argument } => vec![*function, *argument],
            Method { args, .. } => args.clone(),
            Filter { base, function } | Foreach { base, function } => vec![*base, *function],
            Sort { list, comparator } => vec![*list, *comparator],
            Flatten { list } => vec![*list],
            Singleton { value } | SingleElement { value } | Size { value } | Not { value } | IsEmpty { value } => {
                vec![*value]
            },
            Union { left, right }
            | Intersection { left, right }
            | Arithmetic { left, right, .. }
            | Compare { left, right }
            | CompareOp { left, right, .. }
            | IsEqual { left, right }
            | StringTest { left, right, .. }
            | And { left, right }
            | Or { left, right } => vec![*left, *right],
            IfElse {
                condition,
                if_clause,
                else_clause,
            } => vec![*condition, *if_clause, *else_clause],
            Access { target, .. } | AssociationNavigation { target, .. } | Referers { target, .. } => vec![*target],
            At { target, index } => vec![*target, *index],
            Block { contents } | Html { contents } => contents.clone(),
            List { elements } => elements.clone(),
            Update { target, value, .. } => vec![*target, *value],
            Recursion {
                start,
                step,
                min_depth,
                max_depth,
            } => vec![*start, *step, *min_depth, *max_depth],
            Tag { attributes, .. } => attributes.clone(),
            Attribute { value, .. } => vec![*value],
        }
    }

    /// Mutable child slots, in the same order as [`Expr::children`].
    pub fn children_mut(&mut self) -> Vec<&mut ExprId> {
        use Expr::*;
        match self {
            Literal(_) | Var { .. } | All { .. } | KbQuery { .. } => Vec::new(),
            Lambda { body, .. } => vec![body],
            Tuple { coords } => coords.iter_mut().map(|c| &mut c.value).collect(),
            Call { function, argument } => vec![function, argument],
            Method { args, .. } => args.iter_mut().collect(),
            Filter { base, function } | Foreach { base, function } => vec![base, function],
            Sort { list, comparator } => vec![list, comparator],
            Flatten { list } => vec![list],
            Singleton { value } | SingleElement { value } | Size { value } | Not { value } | IsEmpty { value } => {
                vec![value]
            },
            Union { left, right }
            | Intersection { left, right }
            | Arithmetic { left, right, .. }
            | Compare { left, right }
            | CompareOp { left, right, .. }
            | IsEqual { left, right }
            | StringTest { left, right, .. }
            | And { left, right }
            | Or { left, right } => vec![left, right],
            IfElse {
                condition,
                if_clause,
                else_clause,
            } => vec![condition, if_clause, else_clause],
            Access { target, .. } | AssociationNavigation { target, .. } | Referers { target, .. } => vec![target],
            At { target, index } => vec![target, index],
            Block { contents } | Html { contents } => contents.iter_mut().collect(),
            List { elements } => elements.iter_mut().collect(),
            Update { target, value, .. } => vec![target, value],
            Recursion {
                start,
                step,
                min_depth,
                max_depth,
            } => vec![start, step, min_depth, max_depth],
            Tag { attributes, .. } => attributes.iter_mut().collect(),
            Attribute { value, .. } => vec![value],
        }
    }
}

#[derive(Debug, Clone)]
pub struct Node {
    pub kind: Expr,
    pub span: Span,
}

/// Arena owning every node of one expression tree. Parents refer to their
/// children by [`ExprId`]; a node that is no longer referenced simply stays
/// behind until the arena is dropped.
#[derive(Debug, Clone, Default)]
pub struct Ast {
    nodes: Vec<Node>,
    synthetic: u32,
}

impl Ast {
    pub fn new() -> Self { Self::default() }

    pub fn push(&mut self, kind: Expr, span: Span) -> ExprId {
        let id = ExprId(self.nodes.len() as u32);
        self.nodes.push(Node { kind, span });
        id
    }

    pub fn node(&self, id: ExprId) -> &Node { &self.nodes[id.index()] }

    pub fn kind(&self, id: ExprId) -> &Expr { &self.nodes[id.index()].kind }

    pub fn kind_mut(&mut self, id: ExprId) -> &mut Expr { &mut self.nodes[id.index()].kind }

    pub fn span(&self, id: ExprId) -> Span { self.nodes[id.index()].span.clone() }

    pub fn set_span(&mut self, id: ExprId, span: Span) -> ExprId {
        self.nodes[id.index()].span = span;
        id
    }

    /// Number of nodes ever allocated, reachable or not.
    pub fn node_count(&self) -> usize { self.nodes.len() }

    pub fn children(&self, id: ExprId) -> Vec<ExprId> { self.kind(id).children() }

    /// A name no user-written variable can collide with.
    pub fn fresh_name(&mut self) -> Name {
        let n = self.synthetic;
        self.synthetic += 1;
        Name::Synthetic(n)
    }

    pub fn literal_value(&self, id: ExprId) -> Option<&Value> {
        match self.kind(id) {
            Expr::Literal(value) => Some(value),
            _ => None,
        }
    }

    /// Overwrites the value of a literal node in place.
    pub fn set_literal_value(&mut self, id: ExprId, value: Value) -> ExprId {
        match self.kind_mut(id) {
            Expr::Literal(old) => *old = value,
            other => unreachable!("not a literal: {other:?}"),
        }
        id
    }

    pub fn def(&self, id: ExprId) -> Option<DefKey> {
        match self.kind(id) {
            Expr::Var { def, .. } => *def,
            _ => None,
        }
    }

    pub fn bind(&mut self, var: ExprId, key: DefKey) {
        match self.kind_mut(var) {
            Expr::Var { def, .. } => *def = Some(key),
            other => unreachable!("not a variable: {other:?}"),
        }
    }

    /// Name bound by a definition, if `key` still denotes one.
    pub fn def_name(&self, key: DefKey) -> Option<Name> {
        match (key, self.kind(Self::def_node(key))) {
            (DefKey::Param(_), Expr::Lambda { param, .. }) => Some(param.clone()),
            (DefKey::Coord(_, n), Expr::Tuple { coords }) => coords.get(n).map(|c| Name::User(c.name.clone())),
            _ => None,
        }
    }

    pub const fn def_node(key: DefKey) -> ExprId {
        match key {
            DefKey::Param(id) | DefKey::Coord(id, _) => id,
        }
    }
}
