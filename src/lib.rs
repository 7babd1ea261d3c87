//! # jex
//!
//! A small embedded expression language for querying and transforming
//! JSON-shaped messages. An expression is compiled once into a tree and then
//! evaluated any number of times against different messages:
//!
//! ```
//! use jex::{compile, eval, Value};
//!
//! let ast = compile("$sum(.items[].price) > 10").unwrap();
//! let msg = Value::from(serde_json::json!({
//!     "items": [{"price": 5.0}, {"price": 9.5}]
//! }));
//! assert_eq!(eval(&ast, &msg).unwrap(), Value::Bool(true));
//! ```
//!
//! Expressions support field access (`.user.name`), subscripts with
//! arbitrary sub-expressions (`.xs[.i]`), wildcard fan-out over lists
//! (`.items[].price`), arithmetic and comparisons, `&&`/`||`/`!`, and a set
//! of `$`-prefixed built-in functions that can be extended through
//! [`Registry`].
//!
//! ## Operator binding
//!
//! Binding is unusual and worth internalizing before writing compound
//! expressions: **comparisons bind tightest**, then `*` `/`, then `+` `-`,
//! with `&&` `||` loosest. The common filter shape works exactly as
//! expected — `.age >= 18 && .name != "bob"` groups as
//! `(.age >= 18) && (.name != "bob")` — but mixing arithmetic into a
//! comparison does not: `.a + 1 > 2` groups as `.a + (1 > 2)`. Parenthesize
//! arithmetic next to a comparison.
//!
//! ## Custom functions
//!
//! ```
//! use jex::{compile, eval_with, Registry, Value};
//!
//! let mut registry = Registry::default();
//! registry.add_unary("$half", |v| match v {
//!     Value::Number(n) => Ok(Value::Number(n / 2.0)),
//!     _ => Ok(Value::Null),
//! });
//!
//! let ast = compile("$half(.n)").unwrap();
//! let msg = Value::from(serde_json::json!({"n": 9.0}));
//! assert_eq!(eval_with(&registry, &ast, &msg).unwrap(), Value::Number(4.5));
//! ```
pub mod ast;
pub mod evaluator;
pub mod lexer;
pub mod output;
pub mod parser;
pub mod registry;
pub mod value;

pub use ast::{Node, NodeKind, Token, TokenKind};
pub use evaluator::{eval, eval_with, EvalError};
pub use lexer::{lex, LexError};
pub use output::{to_json, to_json_pretty};
pub use parser::{compile, parse, ParseError};
pub use registry::Registry;
pub use value::Value;
