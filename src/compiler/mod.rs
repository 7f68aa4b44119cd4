pub mod ast;
pub use ast::*;
pub mod visit;
pub use visit::*;
pub mod passes;
pub use passes::*;
pub mod error;
pub use error::*;
pub mod types;
pub use types::*;
pub mod builtins;
pub use builtins::*;
pub mod highlight;
pub use highlight::*;
pub mod pipeline;
pub use pipeline::*;

pub use crate::options::*;

#[cfg(test)]
mod tests;
