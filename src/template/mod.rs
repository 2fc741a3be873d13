//! Line-oriented template rendering.
//!
//! Source files carry directive lines (see [`directive`]) that open and
//! close nested blocks. `if` blocks publish their lines only when a rule
//! over the active categories holds; `with` blocks bind `@@name@@`
//! placeholders for the lines they enclose.
//!
//! A render pass is driven by [`RenderConfig::renderer`], which yields one
//! [`Line`] per source line and builds a fresh [`BlockStack`] every time.
mod block;
mod commands;
pub mod directive;
mod renderer;

pub use block::{Block, BlockKind, BlockStack};
pub use commands::{Command, CommandTable, IfCommand, WithCommand};
pub use renderer::{Line, RenderConfig, RenderState, Renderer};
