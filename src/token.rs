//! Lexer for the subset of Go syntax the documentation pipeline needs.
//!
//! Comments are real tokens here, not trivia: doc blocks above declarations
//! carry the `@tag` annotations, and the trailing comment on a struct field
//! becomes that field's schema description. Newlines are also tokens because
//! Go separates import specs and struct fields by line.

use log::debug;
use logos::Logos;

#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\r]+")]
#[logos(skip r"/\*[^*]*\*+([^/*][^*]*\*+)*/")]
pub enum Token {
    /// A `//` comment, with the slashes still attached
    #[regex(r"//[^\n]*", |lex| lex.slice().to_owned())]
    LineComment(String),

    #[token("\n")]
    Newline,

    // Keywords the parser dispatches on
    #[token("package")]
    Package,
    #[token("import")]
    Import,
    #[token("type")]
    Type,
    #[token("struct")]
    Struct,
    #[token("interface")]
    Interface,
    #[token("map")]
    Map,
    #[token("func")]
    Func,
    #[token("chan")]
    Chan,
    #[token("const")]
    Const,
    #[token("var")]
    Var,

    #[regex(r"[A-Za-z_][A-Za-z0-9_]*", |lex| lex.slice().to_owned())]
    Ident(String),

    /// Interpreted string literal, quotes stripped
    #[regex(r#""([^"\\\n]|\\[^\n])*""#, |lex| strip_ends(lex.slice()))]
    Str(String),

    /// Raw string literal (backticks), used for struct tags
    #[regex(r"`[^`]*`", |lex| strip_ends(lex.slice()))]
    RawStr(String),

    /// Rune literal; only lexed so brace counting inside bodies stays honest
    #[regex(r"'([^'\\\n]|\\[^\n])*'")]
    Rune,

    #[regex(r"[0-9][0-9A-Za-z_.]*", |lex| lex.slice().to_owned())]
    Number(String),

    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token(".")]
    Dot,
    #[token(",")]
    Comma,
    #[token(";")]
    Semi,
    #[token("*")]
    Star,

    /// Any other operator character; skipped over inside declarations we
    /// do not model (function bodies, const expressions)
    #[regex(r"[-+/%!&|^<>=:~?@]", |lex| lex.slice().chars().next().unwrap())]
    Punct(char),
}

fn strip_ends(s: &str) -> String {
    s[1..s.len() - 1].to_owned()
}

/// Tokenize a Go source string. Byte sequences the lexer does not know are
/// skipped; they can only occur inside function bodies, which the parser
/// discards wholesale.
pub fn tokenize(src: &str) -> Vec<Token> {
    let mut toks = Vec::new();
    for result in Token::lexer(src) {
        match result {
            Ok(tok) => toks.push(tok),
            Err(()) => debug!("skipping unlexable input"),
        }
    }
    toks
}

impl Token {
    /// Short description used in syntax error messages
    pub fn describe(&self) -> String {
        match self {
            Token::LineComment(_) => "comment".to_string(),
            Token::Newline => "newline".to_string(),
            Token::Ident(name) => format!("`{}`", name),
            Token::Str(s) | Token::RawStr(s) => format!("\"{}\"", s),
            Token::Number(n) => format!("`{}`", n),
            Token::Punct(c) => format!("`{}`", c),
            other => format!("`{:?}`", other).to_lowercase(),
        }
    }
}
