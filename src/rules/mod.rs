//! The rule language: boolean expressions over category names.
//!
//! Rules decide which conditional blocks of a template are active. They are
//! tokenized by [`lexer`], parsed by a precedence-climbing parser into a
//! [`ConditionNode`] tree, and evaluated against a
//! [`CategorySet`](crate::categories::CategorySet).
//!
//! ```text
//! a b c            matches if any of a, b, c
//! a || b || c      same
//! a || (b && !c)   matches if a, or b without c
//! ```

pub mod lexer;
mod node;
mod parser;

pub use node::ConditionNode;
pub use parser::Rule;
