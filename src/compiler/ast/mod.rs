use super::*;

pub mod node;
pub use node::*;
pub mod value;
pub use value::*;
pub mod factory;
pub use factory::*;
pub mod print;
pub use print::*;

pub type Span = std::ops::Range<usize>;
