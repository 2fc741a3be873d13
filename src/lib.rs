//! Category-driven configuration templating.
//!
//! A template source is an ordinary text file with directive lines that
//! select its content by category (`#@if web && !staging`) and substitute
//! bound values (`#@with port=8080`). Rendering a source for a set of
//! categories yields the file to install; edits made to that rendered file
//! can be folded back into the source without disturbing the parts that
//! were hidden.
//!
//! The public API is organised into layers:
//!
//! - **[`rules`]**: parse and evaluate rule expressions over a [`categories::CategorySet`]
//! - **[`template`]**: the line renderer and its command table
//! - **[`diff`]** and **[`backport`]**: line alignment and the edit merger
//! - **[`commands`]**: top-level subcommand orchestration (`build`, `back`, `diff`, …)
#![deny(clippy::or_fun_call)]
#![deny(clippy::bool_to_int_with_if)]

pub mod backport;
pub mod categories;
pub mod cli;
pub mod commands;
pub mod config;
pub mod diff;
pub mod error;
pub mod fs;
pub mod logging;
pub mod rules;
pub mod template;
