use std::collections::VecDeque;
use std::mem;

use crate::ast::{Node, NodeKind, Token, TokenKind};
use crate::lexer::{lex, LexError};
use crate::value::Value;

/// Errors produced while parsing a token stream.
#[derive(Debug, Clone, PartialEq)]
pub enum ParseError {
    /// Lexer error (from [`compile`])
    Lex(LexError),
    /// A bare identifier other than `true`, `false` or `null`
    UnexpectedWord(String),
    /// A `[` outside a path expression
    UnexpectedBracket,
    /// Unbalanced `()` or `[]`
    Unbalanced,
    /// A numeric lexeme that is not a valid number, e.g. `1.2.3`
    InvalidNumber(String),
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParseError::Lex(e) => write!(f, "{}", e),
            ParseError::UnexpectedWord(word) => write!(f, "unexpected token: {}", word),
            ParseError::UnexpectedBracket => write!(f, "unexpected ["),
            ParseError::Unbalanced => write!(f, "unbalanced () or []"),
            ParseError::InvalidNumber(text) => write!(f, "invalid number: {}", text),
        }
    }
}

impl std::error::Error for ParseError {}

impl From<LexError> for ParseError {
    fn from(e: LexError) -> Self {
        ParseError::Lex(e)
    }
}

/// Parse a token stream into an expression tree.
///
/// Three stages run in sequence: a structural pass that builds the raw tree
/// (groups, calls, path chains), a pass that folds prefix `!` and `-` into
/// single-child operator nodes, and a precedence pass that folds binary
/// operators into subtrees. Classes folded earlier grab their operands first
/// and therefore bind tighter: comparisons bind tightest, then `*` `/`, then
/// `+` `-`, with `&&` `||` loosest.
pub fn parse(tokens: Vec<Token>) -> Result<Node, ParseError> {
    let mut root = build_tree(tokens)?;
    fold_prefix(&mut root, &|node, _prev| node.is_op("!"));
    fold_prefix(&mut root, &|node, prev| {
        // a minus is a subtraction only when something value-like precedes it
        node.is_op("-")
            && !matches!(
                prev,
                Some(NodeKind::Number)
                    | Some(NodeKind::Str)
                    | Some(NodeKind::Literal)
                    | Some(NodeKind::Key)
                    | Some(NodeKind::Group)
                    | Some(NodeKind::Func)
            )
    });
    fold_binary(&mut root, &["==", ">=", ">", "<", "<=", "!="]);
    fold_binary(&mut root, &["*", "/"]);
    fold_binary(&mut root, &["+", "-"]);
    fold_binary(&mut root, &["&&", "||"]);
    Ok(root)
}

/// Lex and parse in one step.
pub fn compile(source: &str) -> Result<Node, ParseError> {
    let tokens = lex(source)?;
    parse(tokens)
}

struct TreeBuilder {
    // stack of open nodes; index 0 is the anonymous root
    stack: Vec<Node>,
    in_key: bool,
    paren_depth: i64,
    bracket_depth: i64,
    prev: Option<TokenKind>,
}

impl TreeBuilder {
    fn new() -> Self {
        TreeBuilder {
            stack: vec![Node::new(NodeKind::Root, Value::Null)],
            in_key: false,
            paren_depth: 0,
            bracket_depth: 0,
            prev: None,
        }
    }

    fn top_kind(&self) -> NodeKind {
        self.stack.last().map(|n| n.kind).unwrap_or(NodeKind::Root)
    }

    fn append(&mut self, node: Node) {
        if let Some(top) = self.stack.last_mut() {
            top.children.push(node);
        }
    }

    fn pop_attach(&mut self) -> Result<(), ParseError> {
        if self.stack.len() < 2 {
            return Err(ParseError::Unbalanced);
        }
        if let Some(done) = self.stack.pop() {
            self.append(done);
        }
        Ok(())
    }

    // Climb back out of an open chain of path nodes so the next node lands
    // beside the path instead of inside it.
    fn climb_key_chain(&mut self, include_subscripts: bool) {
        while self.stack.len() > 1 {
            let kind = self.top_kind();
            let in_chain = kind == NodeKind::Key
                || (include_subscripts && kind == NodeKind::Subscript);
            if !in_chain {
                break;
            }
            if let Some(done) = self.stack.pop() {
                self.append(done);
            }
        }
    }
}

fn build_tree(tokens: Vec<Token>) -> Result<Node, ParseError> {
    let mut b = TreeBuilder::new();

    for token in tokens {
        let kind = token.kind;
        match kind {
            TokenKind::Func
            | TokenKind::Number
            | TokenKind::Word
            | TokenKind::DoubleQuoted
            | TokenKind::SingleQuoted
            | TokenKind::Comma
            | TokenKind::Op => {
                if b.in_key {
                    b.climb_key_chain(false);
                    b.in_key = false;
                }
                let node = leaf_node(token)?;
                b.append(node);
            }
            TokenKind::Key => {
                let name = token
                    .text
                    .strip_prefix('.')
                    .unwrap_or(&token.text)
                    .to_string();
                let node = Node::new(NodeKind::Key, Value::String(name));
                if b.in_key {
                    // a nested field is one more access step on the open path
                    b.append(node);
                } else {
                    b.stack.push(node);
                }
                b.in_key = true;
            }
            TokenKind::LParen => {
                b.paren_depth += 1;
                if b.prev == Some(TokenKind::Func) {
                    // this parenthesis opens the call's argument list
                    let call = b.stack.last_mut().and_then(|top| top.children.pop());
                    match call {
                        Some(func) => b.stack.push(func),
                        None => b.stack.push(Node::new(NodeKind::Group, Value::Null)),
                    }
                } else {
                    b.stack.push(Node::new(NodeKind::Group, Value::Null));
                }
            }
            TokenKind::LBracket => {
                let top = b.top_kind();
                if top != NodeKind::Key && top != NodeKind::Subscript {
                    return Err(ParseError::UnexpectedBracket);
                }
                b.bracket_depth += 1;
                b.stack.push(Node::new(NodeKind::Subscript, Value::Null));
            }
            TokenKind::RBracket => {
                b.bracket_depth -= 1;
                b.pop_attach()?;
                // the path continues after the subscript: .xs[0].name
                b.in_key = true;
            }
            TokenKind::RParen => {
                b.paren_depth -= 1;
                if b.in_key {
                    b.climb_key_chain(true);
                    b.in_key = false;
                }
                b.pop_attach()?;
            }
            TokenKind::Space | TokenKind::Escape | TokenKind::Invalid => {}
        }
        b.prev = Some(kind);
    }

    if b.paren_depth != 0 || b.bracket_depth != 0 {
        return Err(ParseError::Unbalanced);
    }

    while b.stack.len() > 1 {
        if let Some(done) = b.stack.pop() {
            if let Some(top) = b.stack.last_mut() {
                top.children.push(done);
            }
        }
    }
    b.stack.pop().ok_or(ParseError::Unbalanced)
}

// Literal normalization: numbers parsed, quotes stripped, reserved words
// resolved. Anything else bare is rejected here.
fn leaf_node(token: Token) -> Result<Node, ParseError> {
    match token.kind {
        TokenKind::Number => match token.text.parse::<f64>() {
            Ok(n) => Ok(Node::new(NodeKind::Number, Value::Number(n))),
            Err(_) => Err(ParseError::InvalidNumber(token.text)),
        },
        TokenKind::DoubleQuoted | TokenKind::SingleQuoted => {
            // the lexeme carries both quotes
            let inner = if token.text.len() >= 2 {
                token.text[1..token.text.len() - 1].to_string()
            } else {
                String::new()
            };
            Ok(Node::new(NodeKind::Str, Value::String(inner)))
        }
        TokenKind::Word => match token.text.as_str() {
            "true" => Ok(Node::new(NodeKind::Literal, Value::Bool(true))),
            "false" => Ok(Node::new(NodeKind::Literal, Value::Bool(false))),
            "null" => Ok(Node::new(NodeKind::Literal, Value::Null)),
            _ => Err(ParseError::UnexpectedWord(token.text)),
        },
        TokenKind::Func => Ok(Node::new(NodeKind::Func, Value::String(token.text))),
        TokenKind::Op => Ok(Node::new(NodeKind::Op, Value::String(token.text))),
        TokenKind::Comma => Ok(Node::new(NodeKind::ArgSep, Value::Null)),
        _ => Err(ParseError::UnexpectedWord(token.text)),
    }
}

// Fold prefix operators into single-child nodes. Runs of prefixes nest, so
// `- -x` parses as the negation of a negation.
fn fold_prefix<F>(node: &mut Node, is_prefix: &F)
where
    F: Fn(&Node, Option<NodeKind>) -> bool,
{
    let old = mem::take(&mut node.children);
    let mut out: Vec<Node> = Vec::new();
    let mut pending: Vec<Node> = Vec::new();
    let mut prev: Option<NodeKind> = None;

    for mut child in old {
        fold_prefix(&mut child, is_prefix);

        if child.kind == NodeKind::Op && child.children.is_empty() && is_prefix(&child, prev) {
            pending.push(child);
            continue;
        }

        let kind = child.kind;
        if let Some(mut op) = pending.pop() {
            op.children.push(child);
            while let Some(mut outer) = pending.pop() {
                outer.children.push(op);
                op = outer;
            }
            out.push(op);
        } else {
            out.push(child);
        }
        prev = Some(kind);
    }

    // a dangling prefix with nothing to bind is left bare for the evaluator
    // to reject
    out.append(&mut pending);
    node.children = out;
}

// One precedence class: a left-to-right sweep replacing each
// (operand, op, operand) triple with the op node, which then becomes the
// left operand of the next fold. Left-associative.
fn fold_binary(node: &mut Node, symbols: &[&str]) {
    for child in &mut node.children {
        fold_binary(child, symbols);
    }

    let mut rest: VecDeque<Node> = mem::take(&mut node.children).into();
    let mut out: Vec<Node> = Vec::new();

    while rest.len() > 2 {
        let folds = rest[1].kind == NodeKind::Op
            && rest[1].children.is_empty()
            && rest[1].op_symbol().map_or(false, |s| symbols.contains(&s));

        if folds {
            if let (Some(left), Some(mut op), Some(right)) =
                (rest.pop_front(), rest.pop_front(), rest.pop_front())
            {
                op.children.push(left);
                op.children.push(right);
                rest.push_front(op);
            }
        } else if let Some(first) = rest.pop_front() {
            out.push(first);
        }
    }

    out.extend(rest);
    node.children = out;
}
