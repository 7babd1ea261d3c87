//! # Abstract syntax for the jex expression language
//!
//! Expressions move through a three-stage pipeline, and this module defines
//! the two intermediate shapes:
//!
//! - **[tokens]** - typed lexemes produced by [`crate::lexer::lex`]
//! - **[node]** - the tagged tree produced by [`crate::parser::parse`] and
//!   walked by [`crate::evaluator::eval`]
//!
//! ## Expression anatomy
//!
//! ```text
//! $sum(.items[].price) > 100 && .region == "us"
//! ```
//!
//! - `.items[].price` is a *path expression*: a [`node::NodeKind::Key`] node
//!   whose children are access steps (nested fields, `[expr]` subscripts,
//!   and the wildcard `[]` that fans one list out into many values).
//! - `$sum(...)` is a call into the function registry; a two-argument call
//!   `$pow(a, b)` keeps its comma as a separator child, so function nodes
//!   have 0, 1, or 3 children.
//! - Operators are folded into subtrees by precedence class. Note the
//!   binding order: comparisons bind *tightest*, then `*` `/`, then `+` `-`,
//!   then `&&` `||` — see the crate docs before mixing comparisons with
//!   arithmetic in one expression.
pub mod node;
pub mod tokens;

pub use node::{Node, NodeKind};
pub use tokens::{Token, TokenKind};
