//! Recursive-descent parser for the expression grammar.
//!
//! Precedence, loosest to tightest: `||`, `&&`, `!`, comparison
//! (non-associative), `+`/`-`, `*`/`/`/`%`, unary `-`. The parser returns a
//! single owned AST root; all further analysis happens in the compiler
//! passes.

use logos::Logos;
use volition_core::{Diagnostic, ErrorCategory, ErrorCode};

use crate::ast::{ArithOp, CompOp, Expr, LogicOp};
use crate::lexer::Token;

pub(crate) fn parse(source: &str) -> Result<Expr, Diagnostic> {
    let mut tokens = Vec::new();
    for token in Token::lexer(source) {
        match token {
            Ok(token) => tokens.push(token),
            Err(()) => return Err(syntax_error("Syntax error: unrecognised token")),
        }
    }

    let mut parser = Parser { tokens, pos: 0 };
    let expr = parser.or_expr()?;
    match parser.peek() {
        None => Ok(expr),
        Some(token) => Err(syntax_error(format!(
            "Syntax error: unexpected '{token}'"
        ))),
    }
}

fn syntax_error(message: impl Into<String>) -> Diagnostic {
    Diagnostic {
        category: ErrorCategory::Syntax,
        code: ErrorCode::SyntaxError,
        message: message.into(),
    }
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<Token> {
        self.tokens.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<Token> {
        let token = self.peek();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn eat(&mut self, expected: Token) -> bool {
        if self.peek() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn or_expr(&mut self) -> Result<Expr, Diagnostic> {
        let mut expr = self.and_expr()?;
        while self.eat(Token::OrOr) {
            let right = self.and_expr()?;
            expr = Expr::logic(LogicOp::Or, expr, right);
        }
        Ok(expr)
    }

    fn and_expr(&mut self) -> Result<Expr, Diagnostic> {
        let mut expr = self.not_expr()?;
        while self.eat(Token::AndAnd) {
            let right = self.not_expr()?;
            expr = Expr::logic(LogicOp::And, expr, right);
        }
        Ok(expr)
    }

    fn not_expr(&mut self) -> Result<Expr, Diagnostic> {
        if self.eat(Token::Bang) {
            let child = self.not_expr()?;
            Ok(Expr::not(child))
        } else {
            self.comparison()
        }
    }

    /// Comparisons do not chain: `a < b < c` is a syntax error, caught by the
    /// top-level trailing-token check.
    fn comparison(&mut self) -> Result<Expr, Diagnostic> {
        let expr = self.sum()?;
        let op = match self.peek() {
            Some(Token::EqEq) => CompOp::Eq,
            Some(Token::BangEq) => CompOp::Neq,
            Some(Token::Lt) => CompOp::Lt,
            Some(Token::LtEq) => CompOp::Lteq,
            Some(Token::Gt) => CompOp::Gt,
            Some(Token::GtEq) => CompOp::Gteq,
            _ => return Ok(expr),
        };
        self.pos += 1;
        let right = self.sum()?;
        Ok(Expr::comp(op, expr, right))
    }

    fn sum(&mut self) -> Result<Expr, Diagnostic> {
        let mut expr = self.product()?;
        loop {
            let op = match self.peek() {
                Some(Token::Plus) => ArithOp::Add,
                Some(Token::Minus) => ArithOp::Sub,
                _ => return Ok(expr),
            };
            self.pos += 1;
            let right = self.product()?;
            expr = Expr::arith(op, expr, right);
        }
    }

    fn product(&mut self) -> Result<Expr, Diagnostic> {
        let mut expr = self.unary()?;
        loop {
            let op = match self.peek() {
                Some(Token::Star) => ArithOp::Mul,
                Some(Token::Slash) => ArithOp::Div,
                Some(Token::Percent) => ArithOp::Mod,
                _ => return Ok(expr),
            };
            self.pos += 1;
            let right = self.unary()?;
            expr = Expr::arith(op, expr, right);
        }
    }

    fn unary(&mut self) -> Result<Expr, Diagnostic> {
        if self.eat(Token::Minus) {
            let operand = self.unary()?;
            // There is no negate instruction: fold a literal, lower the rest
            // to a subtraction from zero.
            return Ok(match operand {
                Expr::ConstNumber { value, const_slot } => Expr::ConstNumber {
                    value: -value,
                    const_slot,
                },
                other => Expr::arith(ArithOp::Sub, Expr::number(0.0), other),
            });
        }
        self.atom()
    }

    fn atom(&mut self) -> Result<Expr, Diagnostic> {
        match self.bump() {
            Some(Token::Number(value)) => Ok(Expr::number(value)),
            Some(Token::NameLiteral(name)) => Ok(Expr::name_literal(name)),
            Some(Token::True) => Ok(Expr::boolean(true)),
            Some(Token::False) => Ok(Expr::boolean(false)),
            Some(Token::Ident(name)) => Ok(Expr::ident(name)),
            Some(Token::LParen) => {
                let expr = self.or_expr()?;
                if self.eat(Token::RParen) {
                    Ok(expr)
                } else {
                    Err(syntax_error("Syntax error: expected ')'"))
                }
            }
            Some(token) => Err(syntax_error(format!(
                "Syntax error: unexpected '{token}'"
            ))),
            None => Err(syntax_error("Syntax error: unexpected end of expression")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn and_binds_tighter_than_or() {
        // a || b && c parses as a || (b && c).
        let expr = parse("true || false && false").unwrap();
        match expr {
            Expr::Logic {
                op: LogicOp::Or,
                right,
                ..
            } => assert!(matches!(
                *right,
                Expr::Logic {
                    op: LogicOp::And,
                    ..
                }
            )),
            other => panic!("expected top-level ||, got {other:?}"),
        }
    }

    #[test]
    fn comparisons_do_not_chain() {
        assert!(parse("1 < 2 < 3").is_err());
    }

    #[test]
    fn unary_minus_folds_literals() {
        assert!(matches!(
            parse("-10").unwrap(),
            Expr::ConstNumber { value, .. } if value == -10.0
        ));
    }

    #[test]
    fn unary_minus_lowers_to_subtraction() {
        let expr = parse("-x").unwrap();
        assert!(matches!(expr, Expr::Arith { op: ArithOp::Sub, .. }));
    }

    #[test]
    fn reports_trailing_input() {
        assert!(parse("1 + 2)").is_err());
        assert!(parse("1 +").is_err());
        assert!(parse("").is_err());
    }
}
