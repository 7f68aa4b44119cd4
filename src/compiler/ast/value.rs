use std::fmt;

/// Qualified name of a model type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeRef(pub String);

impl TypeRef {
    pub fn new(name: impl Into<String>) -> Self { Self(name.into()) }
}

/// A structural part (attribute or reference) of a model type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PartRef {
    pub owner: TypeRef,
    pub name: String,
    pub target: TypeRef,
    pub many: bool,
}

impl PartRef {
    pub fn new(owner: &str, name: &str, target: &str) -> Self {
        Self {
            owner: TypeRef::new(owner),
            name: name.to_string(),
            target: TypeRef::new(target),
            many: false,
        }
    }

    pub fn many(mut self) -> Self {
        self.many = true;
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    List(Vec<Value>),
    Part(PartRef),
    Type(TypeRef),
}

impl Value {
    pub const fn empty_list() -> Self { Self::List(Vec::new()) }

    /// Truthiness: null, false, the empty string and the empty list are false.
    pub fn is_true(&self) -> bool {
        match self {
            Self::Null => false,
            Self::Bool(b) => *b,
            Self::String(s) => !s.is_empty(),
            Self::List(l) => !l.is_empty(),
            Self::Number(_) | Self::Part(_) | Self::Type(_) => true,
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Self::Null => true,
            Self::String(s) => s.is_empty(),
            Self::List(l) => l.is_empty(),
            _ => false,
        }
    }

    /// A single value seen as a collection: null is empty, a scalar is a singleton.
    pub fn as_collection(&self) -> Vec<Self> {
        match self {
            Self::Null => Vec::new(),
            Self::List(l) => l.clone(),
            other => vec![other.clone()],
        }
    }

    pub fn into_collection(self) -> Vec<Self> {
        match self {
            Self::Null => Vec::new(),
            Self::List(l) => l,
            other => vec![other],
        }
    }

    pub const fn is_boolean(&self) -> bool { matches!(self, Self::Bool(_)) }

    /// Value equality with empty strings and empty lists equal to null, and a
    /// singleton list equal to its element.
    pub fn tl_equals(&self, other: &Self) -> bool {
        match (self, other) {
            (a, b) if a.is_empty() && b.is_empty() => true,
            (Self::Number(a), Self::Number(b)) => a == b,
            (Self::List(a), Self::List(b)) => a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.tl_equals(y)),
            // a single-element collection stands for its element
            (Self::List(l), scalar) | (scalar, Self::List(l)) => l.len() == 1 && l[0].tl_equals(scalar),
            (a, b) => a == b,
        }
    }

    /// Text rendering used by string concatenation; null is the empty string.
    pub fn to_text(&self) -> String {
        match self {
            Self::Null => String::new(),
            Self::Bool(b) => b.to_string(),
            Self::Number(n) => format_number(*n),
            Self::String(s) => s.clone(),
            Self::List(l) => l.iter().map(Self::to_text).collect::<Vec<_>>().join(", "),
            Self::Part(p) => p.name.clone(),
            Self::Type(t) => t.0.clone(),
        }
    }
}

fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.is_finite() && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{n}")
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Null => write!(f, "null"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Number(n) => write!(f, "{}", format_number(*n)),
            Self::String(s) => write!(f, "'{}'", s.replace('\'', "\\'")),
            Self::List(l) => {
                write!(f, "[")?;
                for (i, v) in l.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{v}")?;
                }
                write!(f, "]")
            },
            Self::Part(p) => write!(f, "`{}#{}`", p.owner.0, p.name),
            Self::Type(t) => write!(f, "`{}`", t.0),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self { Self::Bool(b) }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self { Self::Number(n) }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self { Self::Number(f64::from(n)) }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self { Self::Number(n as f64) }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self { Self::String(s.to_string()) }
}

impl From<String> for Value {
    fn from(s: String) -> Self { Self::String(s) }
}

impl From<PartRef> for Value {
    fn from(p: PartRef) -> Self { Self::Part(p) }
}

impl From<TypeRef> for Value {
    fn from(t: TypeRef) -> Self { Self::Type(t) }
}

impl From<Vec<Self>> for Value {
    fn from(l: Vec<Self>) -> Self { Self::List(l) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truthiness() {
        assert!(!Value::Null.is_true());
        assert!(!Value::from("").is_true());
        assert!(!Value::empty_list().is_true());
        assert!(!Value::from(false).is_true());
        assert!(Value::from(0).is_true());
        assert!(Value::from("a").is_true());
        assert!(Value::from(vec![Value::Null]).is_true());
    }

    #[test]
    fn empty_values_equal_null() {
        assert!(Value::from("").tl_equals(&Value::Null));
        assert!(Value::empty_list().tl_equals(&Value::from("")));
        assert!(!Value::from(0).tl_equals(&Value::Null));
        assert!(Value::from(vec![Value::from(1), Value::from("")]).tl_equals(&Value::from(vec![
            Value::from(1.0),
            Value::Null
        ])));
    }

    #[test]
    fn display() {
        assert_eq!(Value::from(3.0).to_string(), "3");
        assert_eq!(Value::from(2.5).to_string(), "2.5");
        assert_eq!(Value::from("it's").to_string(), "'it\\'s'");
        assert_eq!(
            Value::from(vec![Value::from(true), Value::Null]).to_string(),
            "[true, null]"
        );
        assert_eq!(Value::from(PartRef::new("Person", "name", "string")).to_string(), "`Person#name`");
    }
}
