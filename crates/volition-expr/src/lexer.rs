//! Token definitions for the expression grammar.

use std::fmt;

use logos::Logos;
use volition_core::Name;

fn name_literal(slice: &str) -> Name {
    Name::new(&slice[1..slice.len() - 1])
}

#[derive(Logos, Debug, Clone, Copy, PartialEq)]
#[logos(skip r"[ \t\r\n]+")]
pub(crate) enum Token {
    #[regex(r"[0-9]+(\.[0-9]*)?([eE][+-]?[0-9]+)?", |lex| lex.slice().parse::<f32>().ok())]
    #[regex(r"\.[0-9]+([eE][+-]?[0-9]+)?", |lex| lex.slice().parse::<f32>().ok())]
    Number(f32),

    #[regex(r"'[A-Za-z][A-Za-z0-9_]*'", |lex| name_literal(lex.slice()))]
    NameLiteral(Name),

    #[token("true")]
    True,
    #[token("false")]
    False,

    #[regex(r"[A-Za-z][A-Za-z0-9_]*", |lex| Name::new(lex.slice()))]
    Ident(Name),

    #[token("||")]
    OrOr,
    #[token("&&")]
    AndAnd,
    #[token("!")]
    Bang,

    #[token("==")]
    EqEq,
    #[token("!=")]
    BangEq,
    #[token("<")]
    Lt,
    #[token("<=")]
    LtEq,
    #[token(">")]
    Gt,
    #[token(">=")]
    GtEq,

    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,
    #[token("%")]
    Percent,

    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Number(value) => write!(f, "{value}"),
            Token::NameLiteral(name) => write!(f, "'{name}'"),
            Token::True => f.write_str("true"),
            Token::False => f.write_str("false"),
            Token::Ident(name) => write!(f, "{name}"),
            Token::OrOr => f.write_str("||"),
            Token::AndAnd => f.write_str("&&"),
            Token::Bang => f.write_str("!"),
            Token::EqEq => f.write_str("=="),
            Token::BangEq => f.write_str("!="),
            Token::Lt => f.write_str("<"),
            Token::LtEq => f.write_str("<="),
            Token::Gt => f.write_str(">"),
            Token::GtEq => f.write_str(">="),
            Token::Plus => f.write_str("+"),
            Token::Minus => f.write_str("-"),
            Token::Star => f.write_str("*"),
            Token::Slash => f.write_str("/"),
            Token::Percent => f.write_str("%"),
            Token::LParen => f.write_str("("),
            Token::RParen => f.write_str(")"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex(source: &str) -> Vec<Token> {
        Token::lexer(source).map(|t| t.unwrap()).collect()
    }

    #[test]
    fn numbers_and_idents() {
        assert_eq!(
            lex("NumA >= 1.5"),
            vec![
                Token::Ident(Name::new("NumA")),
                Token::GtEq,
                Token::Number(1.5),
            ]
        );
    }

    #[test]
    fn name_literals_are_interned_without_quotes() {
        assert_eq!(lex("'Guard'"), vec![Token::NameLiteral(Name::new("Guard"))]);
    }

    #[test]
    fn keywords_beat_identifiers() {
        assert_eq!(lex("true"), vec![Token::True]);
        assert_eq!(lex("truthy"), vec![Token::Ident(Name::new("truthy"))]);
    }

    #[test]
    fn unknown_characters_fail() {
        assert!(Token::lexer("a $ b").any(|t| t.is_err()));
    }
}
