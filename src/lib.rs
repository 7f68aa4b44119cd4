#![warn(
    clippy::complexity,
    clippy::correctness,
    clippy::perf,
    clippy::nursery,
    clippy::suspicious,
    clippy::style
)]
#![allow(
    clippy::semicolon_inside_block,
    clippy::module_name_repetitions,
    clippy::option_if_let_else,
    unknown_lints
)]

//! Whole-tree analyses and rewrites for search expressions: lexical
//! resolution, abbreviation expansion, inlining, constant folding,
//! loop-invariant hoisting and type inference.

pub mod compiler;
pub use compiler::*;
pub mod options;
pub use options::*;
