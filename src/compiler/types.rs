use indexmap::IndexMap;
use std::{fmt, sync::Arc};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Primitive {
    Boolean,
    Integer,
    Float,
    String,
    Date,
}

impl Primitive {
    pub const fn name(self) -> &'static str {
        match self {
            Self::Boolean => "boolean",
            Self::Integer => "integer",
            Self::Float => "float",
            Self::String => "string",
            Self::Date => "date",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "boolean" => Self::Boolean,
            "integer" | "int" | "long" => Self::Integer,
            "float" | "double" => Self::Float,
            "string" => Self::String,
            "date" => Self::Date,
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    pub name: String,
    pub ty: Type,
}

/// A model class, or a record type synthesized for a tuple.
#[derive(Debug, Clone, PartialEq)]
pub struct Class {
    pub name: String,
    pub properties: Vec<Property>,
    pub record: bool,
}

impl Class {
    pub fn new(name: &str, properties: Vec<Property>) -> Self {
        Self {
            name: name.to_string(),
            properties,
            record: false,
        }
    }

    pub fn property(&self, name: &str) -> Option<&Type> {
        self.properties.iter().find(|p| p.name == name).map(|p| &p.ty)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Type {
    Primitive(Primitive),
    Class(Arc<Class>),
    Union(Vec<Arc<Class>>),
    Function { param: Box<Type>, result: Box<Type> },
    /// Some type is expected but could not be determined.
    Any,
    /// The expression has no value type at all.
    Nothing,
}

impl Type {
    pub const BOOLEAN: Self = Self::Primitive(Primitive::Boolean);
    pub const INTEGER: Self = Self::Primitive(Primitive::Integer);
    pub const FLOAT: Self = Self::Primitive(Primitive::Float);
    pub const STRING: Self = Self::Primitive(Primitive::String);

    pub fn class(class: Class) -> Self { Self::Class(Arc::new(class)) }

    pub fn function(param: Self, result: Self) -> Self {
        Self::Function {
            param: Box::new(param),
            result: Box::new(result),
        }
    }

    pub const fn is_class_like(&self) -> bool { matches!(self, Self::Class(_) | Self::Union(_)) }

    fn classes(&self) -> Vec<Arc<Class>> {
        match self {
            Self::Class(c) => vec![c.clone()],
            Self::Union(cs) => cs.clone(),
            _ => Vec::new(),
        }
    }

    /// Type of a union of two collections: a structural union when both sides
    /// are class-like, the single type when both agree, `Any` otherwise.
    pub fn union(&self, other: &Self) -> Self {
        if self == other {
            return self.clone();
        }
        if !(self.is_class_like() && other.is_class_like()) {
            return Self::Any;
        }

        let mut classes = self.classes();
        for c in other.classes() {
            if !classes.contains(&c) {
                classes.push(c);
            }
        }
        match classes.len() {
            1 => Self::Class(classes.remove(0)),
            _ => Self::Union(classes),
        }
    }

    /// Common type of alternative results (branches, list elements).
    pub fn join(&self, other: &Self) -> Self {
        match (self, other) {
            (a, b) if a == b => a.clone(),
            (Self::Nothing, t) | (t, Self::Nothing) => t.clone(),
            (Self::Primitive(Primitive::Integer), Self::Primitive(Primitive::Float))
            | (Self::Primitive(Primitive::Float), Self::Primitive(Primitive::Integer)) => Self::FLOAT,
            (a, b) if a.is_class_like() && b.is_class_like() => a.union(b),
            _ => Self::Any,
        }
    }

    /// Declared type of a property reachable on this type.
    pub fn property(&self, name: &str) -> Option<Self> {
        self.classes().iter().find_map(|c| c.property(name).cloned())
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Primitive(p) => write!(f, "{}", p.name()),
            Self::Class(c) => write!(f, "{}", c.name),
            Self::Union(cs) => {
                let names: Vec<&str> = cs.iter().map(|c| c.name.as_str()).collect();
                write!(f, "{}", names.join(" | "))
            },
            Self::Function { param, result } => write!(f, "({param} -> {result})"),
            Self::Any => write!(f, "any"),
            Self::Nothing => write!(f, "nothing"),
        }
    }
}

/// Type lookup service supplied by the host model.
pub trait TypeModel {
    fn primitive(&self, primitive: Primitive) -> Type { Type::Primitive(primitive) }

    /// Resolves a qualified type name.
    fn lookup(&self, name: &str) -> Option<Type>;

    /// Creates an on-the-fly record type.
    fn record(&mut self, name: String, properties: Vec<Property>) -> Type {
        Type::class(Class {
            name,
            properties,
            record: true,
        })
    }
}

/// In-memory [`TypeModel`].
#[derive(Debug, Clone, Default)]
pub struct MapModel {
    types: IndexMap<String, Type>,
    records: usize,
}

impl MapModel {
    pub fn new() -> Self { Self::default() }

    pub fn with_class(mut self, name: &str, properties: &[(&str, Type)]) -> Self {
        let properties = properties
            .iter()
            .map(|(name, ty)| Property {
                name: name.to_string(),
                ty: ty.clone(),
            })
            .collect();
        self.types.insert(name.to_string(), Type::class(Class::new(name, properties)));
        self
    }

    pub fn with_type(mut self, name: &str, ty: Type) -> Self {
        self.types.insert(name.to_string(), ty);
        self
    }

    /// Number of record types created so far.
    pub const fn records(&self) -> usize { self.records }
}

impl TypeModel for MapModel {
    fn primitive(&self, primitive: Primitive) -> Type {
        self.types
            .get(primitive.name())
            .cloned()
            .unwrap_or(Type::Primitive(primitive))
    }

    fn lookup(&self, name: &str) -> Option<Type> {
        self.types
            .get(name)
            .cloned()
            .or_else(|| Primitive::from_name(name).map(|p| self.primitive(p)))
    }

    fn record(&mut self, name: String, properties: Vec<Property>) -> Type {
        self.records += 1;
        Type::class(Class {
            name,
            properties,
            record: true,
        })
    }
}
