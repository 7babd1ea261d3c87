/// Classification of a lexeme, assigned by the lexer.
///
/// The first group reaches the parser; `Space`, `Escape` and `Invalid` are
/// internal to the scan and never appear in its output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// Numeric literal
    ///
    /// # Examples
    /// ```text
    /// 42
    /// 1.5
    /// ```
    Number,

    /// Double-quoted string literal, quotes included in the lexeme
    DoubleQuoted,

    /// Single-quoted string literal, quotes included in the lexeme
    SingleQuoted,

    /// Bare identifier; only `true`, `false` and `null` survive parsing
    Word,

    /// Field access starting with `.`
    ///
    /// # Examples
    /// ```text
    /// .name
    /// .items
    /// .        (the whole message)
    /// ```
    Key,

    /// Function name starting with `$`
    ///
    /// # Examples
    /// ```text
    /// $sum
    /// $~bool
    /// ```
    Func,

    /// Operator, one or two characters drawn from `+ - * / ! = > < & |`
    Op,

    /// `(`
    LParen,

    /// `)`
    RParen,

    /// `[`
    LBracket,

    /// `]`
    RBracket,

    /// `,` separating the arguments of a two-argument call
    Comma,

    /// Whitespace; terminates the pending token, never emitted
    Space,

    /// `\` inside a string literal
    Escape,

    /// Anything the language has no use for
    Invalid,
}

/// A lexeme and its classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
}

impl Token {
    pub fn new(kind: TokenKind, text: impl Into<String>) -> Self {
        Token {
            kind,
            text: text.into(),
        }
    }
}
