use super::*;
use indexmap::IndexMap;
use std::fmt;
use thiserror::Error;

/// Coercion the folder inserts when a non-boolean operand of `and` must be
/// turned into a boolean.
pub const TO_BOOLEAN: &str = "toBoolean";

#[derive(Debug, Clone, PartialEq, Error)]
pub enum BuiltinError {
    #[error("expected {expected} arguments, found {found}")]
    Arity { expected: usize, found: usize },

    #[error("expected {expected}, found {found}")]
    Argument { expected: &'static str, found: Value },

    #[error("can only be evaluated at runtime")]
    RuntimeOnly,
}

/// A function callable through [`Expr::Method`].
pub trait Builtin {
    fn name(&self) -> &str;

    fn is_side_effect_free(&self) -> bool { true }

    /// Whether evaluating with these literal arguments at compile time gives
    /// the same value as evaluating at runtime.
    fn can_evaluate(&self, _args: &[Value]) -> bool { self.is_side_effect_free() }

    fn evaluate(&self, args: &[Value]) -> Result<Value, BuiltinError>;

    fn result_type(&self, _model: &dyn TypeModel, _args: &[Type]) -> Type { Type::Any }
}

pub struct Builtins {
    functions: IndexMap<String, Box<dyn Builtin + Send + Sync>>,
}

impl Builtins {
    pub fn empty() -> Self {
        Self {
            functions: IndexMap::new(),
        }
    }

    pub fn standard() -> Self {
        let mut builtins = Self::empty();
        builtins.register(Pure::new(TO_BOOLEAN, 1, Primitive::Boolean, |a| Ok(Value::Bool(a[0].is_true()))));
        builtins.register(Pure::new("toString", 1, Primitive::String, |a| Ok(Value::String(a[0].to_text()))));
        builtins.register(Pure::new("toUpperCase", 1, Primitive::String, |a| {
            text(&a[0]).map(|s| s.map_or(Value::Null, |s| Value::String(s.to_uppercase())))
        }));
        builtins.register(Pure::new("toLowerCase", 1, Primitive::String, |a| {
            text(&a[0]).map(|s| s.map_or(Value::Null, |s| Value::String(s.to_lowercase())))
        }));
        builtins.register(Pure::new("floor", 1, Primitive::Integer, |a| number(&a[0], f64::floor)));
        builtins.register(Pure::new("ceil", 1, Primitive::Integer, |a| number(&a[0], f64::ceil)));
        builtins.register(Pure::new("round", 1, Primitive::Integer, |a| number(&a[0], f64::round)));
        builtins.register(Pure::new("abs", 1, Primitive::Float, |a| number(&a[0], f64::abs)));
        builtins.register(Pure::new("length", 1, Primitive::Integer, |a| {
            text(&a[0]).map(|s| Value::Number(s.map_or(0, |s| s.chars().count()) as f64))
        }));
        builtins.register(RuntimeOnly {
            name: "now",
            side_effect_free: true,
            result: Primitive::Date,
        });
        builtins.register(RuntimeOnly {
            name: "random",
            side_effect_free: false,
            result: Primitive::Float,
        });
        builtins
    }

    pub fn register(&mut self, builtin: impl Builtin + Send + Sync + 'static) {
        self.functions.insert(builtin.name().to_string(), Box::new(builtin));
    }

    pub fn get(&self, name: &str) -> Option<&(dyn Builtin + Send + Sync)> { self.functions.get(name).map(|b| &**b) }

    pub fn contains(&self, name: &str) -> bool { self.functions.contains_key(name) }

    pub fn names(&self) -> impl Iterator<Item = &str> { self.functions.keys().map(String::as_str) }
}

impl Default for Builtins {
    fn default() -> Self { Self::standard() }
}

impl fmt::Debug for Builtins {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result { f.debug_list().entries(self.names()).finish() }
}

fn text(v: &Value) -> Result<Option<&str>, BuiltinError> {
    match v {
        Value::Null => Ok(None),
        Value::String(s) => Ok(Some(s)),
        other => Err(BuiltinError::Argument {
            expected: "a string",
            found: other.clone(),
        }),
    }
}

fn number(v: &Value, f: fn(f64) -> f64) -> Result<Value, BuiltinError> {
    match v {
        Value::Null => Ok(Value::Null),
        Value::Number(n) => Ok(Value::Number(f(*n))),
        other => Err(BuiltinError::Argument {
            expected: "a number",
            found: other.clone(),
        }),
    }
}

/// Deterministic function of its arguments.
struct Pure {
    name: &'static str,
    arity: usize,
    result: Primitive,
    eval: fn(&[Value]) -> Result<Value, BuiltinError>,
}

impl Pure {
    fn new(
        name: &'static str,
        arity: usize,
        result: Primitive,
        eval: fn(&[Value]) -> Result<Value, BuiltinError>,
    ) -> Self {
        Self {
            name,
            arity,
            result,
            eval,
        }
    }
}

impl Builtin for Pure {
    fn name(&self) -> &str { self.name }

    fn can_evaluate(&self, args: &[Value]) -> bool { args.len() == self.arity }

    fn evaluate(&self, args: &[Value]) -> Result<Value, BuiltinError> {
        if args.len() != self.arity {
            return Err(BuiltinError::Arity {
                expected: self.arity,
                found: args.len(),
            });
        }
        (self.eval)(args)
    }

    fn result_type(&self, model: &dyn TypeModel, _: &[Type]) -> Type { model.primitive(self.result) }
}

/// Depends on the time or state of evaluation; never folded.
struct RuntimeOnly {
    name: &'static str,
    side_effect_free: bool,
    result: Primitive,
}

impl Builtin for RuntimeOnly {
    fn name(&self) -> &str { self.name }

    fn is_side_effect_free(&self) -> bool { self.side_effect_free }

    fn can_evaluate(&self, _: &[Value]) -> bool { false }

    fn evaluate(&self, _: &[Value]) -> Result<Value, BuiltinError> { Err(BuiltinError::RuntimeOnly) }

    fn result_type(&self, model: &dyn TypeModel, _: &[Type]) -> Type { model.primitive(self.result) }
}
