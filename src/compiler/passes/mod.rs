use super::*;

pub mod resolve;
pub use resolve::*;
pub mod abbreviation;
pub use abbreviation::*;
pub mod inline;
pub use inline::*;
pub mod fold;
pub use fold::*;
pub mod pull_out;
pub use pull_out::*;
pub mod typecheck;
pub use typecheck::*;
