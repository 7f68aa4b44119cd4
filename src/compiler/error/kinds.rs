use super::*;
use thiserror::Error;

pub fn default_markers(span: Span) -> Vec<Marker> {
    vec![Marker {
        message: String::new(),
        span,
        style: MarkerStyle::Primary,
    }]
}

pub trait CompilerError {
    fn message(&self) -> String;
    fn consider(&self) -> Option<String>;
    fn severeness(&self) -> Severeness;

    fn markers(&self, span: Span) -> Vec<Marker> { default_markers(span) }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum OptimizeError {
    #[error("cannot find variable `${name}` in the current scope")]
    UnresolvedVariable { name: Name, span: Span },

    #[error("built-in `{name}` is required here but not registered")]
    MissingBuiltin { name: String, span: Span },

    #[error("expected at most a single element, found {found}")]
    MoreThanASingleElement { found: usize, span: Span, collection: Span },

    #[error("evaluating `{name}` at compile time failed: {source}")]
    Evaluation {
        name: String,
        source: BuiltinError,
        span: Span,
    },
}

pub type OptimizeResult<T> = Result<T, OptimizeError>;

impl OptimizeError {
    pub fn span(&self) -> Span {
        match self {
            Self::UnresolvedVariable { span, .. }
            | Self::MissingBuiltin { span, .. }
            | Self::MoreThanASingleElement { span, .. }
            | Self::Evaluation { span, .. } => span.clone(),
        }
    }

    /// Pairs the error with its span, ready for [`report`].
    pub fn annotated(self) -> AError<Self> {
        let span = self.span();
        (self, span)
    }
}

impl CompilerError for OptimizeError {
    fn message(&self) -> String { self.to_string() }

    fn consider(&self) -> Option<String> {
        match self {
            Self::UnresolvedVariable { .. } => Some("bind it with a function parameter or a tuple coordinate".to_string()),
            Self::MissingBuiltin { name, .. } => Some(format!("register `{name}` in the built-in registry")),
            Self::MoreThanASingleElement { .. } => Some("filter the collection down to one element first".to_string()),
            Self::Evaluation { .. } => None,
        }
    }

    fn severeness(&self) -> Severeness { Severeness::Error }

    fn markers(&self, span: Span) -> Vec<Marker> {
        match self {
            Self::Evaluation { source, .. } => vec![Marker {
                message: source.to_string(),
                span,
                style: MarkerStyle::Primary,
            }],
            Self::MoreThanASingleElement { found, collection, .. } => vec![
                Marker {
                    message: String::new(),
                    span,
                    style: MarkerStyle::Primary,
                },
                Marker {
                    message: format!("has {found} elements"),
                    span: collection.clone(),
                    style: MarkerStyle::Secondary,
                },
            ],
            _ => default_markers(span),
        }
    }
}
