//! Recursive-descent parser for guard expressions.
//!
//! Precedence, loosest first: `||`, `&&`, equality, comparison, additive,
//! multiplicative, unary (`!`, `-`), postfix (`.name`, `[index]`, `(args)`).
//!
//! Every parenthesis, prefix operator, postfix access and chained binary
//! operator counts against [`MAX_DEPTH`], which bounds both the parser's
//! recursion and the height of the resulting tree.

use serde_json::Value;

use super::lexer::{tokenize, Spanned, Token};
use crate::builtins::number;
use crate::errors::ValisonError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Not,
    Neg,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Or,
    And,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Add,
    Sub,
    Mul,
    Div,
    Rem,
}

/// Parsed expression tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(Value),
    Ident(String),
    Member(Box<Expr>, String),
    Index(Box<Expr>, Box<Expr>),
    /// Calls are only allowed on a bare identifier naming a registered function.
    Call(String, Vec<Expr>),
    Unary(UnaryOp, Box<Expr>),
    Binary(BinaryOp, Box<Expr>, Box<Expr>),
}

impl Expr {
    /// Every function name called anywhere in the tree, in call order.
    pub fn called_functions(&self) -> Vec<&str> {
        let mut names = Vec::new();
        self.collect_calls(&mut names);
        names
    }

    fn collect_calls<'a>(&'a self, names: &mut Vec<&'a str>) {
        match self {
            Expr::Literal(_) | Expr::Ident(_) => {}
            Expr::Member(target, _) => target.collect_calls(names),
            Expr::Index(target, index) => {
                target.collect_calls(names);
                index.collect_calls(names);
            }
            Expr::Call(name, args) => {
                names.push(name);
                for arg in args {
                    arg.collect_calls(names);
                }
            }
            Expr::Unary(_, operand) => operand.collect_calls(names),
            Expr::Binary(_, left, right) => {
                left.collect_calls(names);
                right.collect_calls(names);
            }
        }
    }
}

/// Deepest tree a guard expression may produce.
pub const MAX_DEPTH: usize = 64;

struct Parser<'a> {
    source: &'a str,
    tokens: Vec<Spanned>,
    pos: usize,
    depth: usize,
}

/// Parses `source` into an [`Expr`].
pub fn parse(source: &str) -> Result<Expr, ValisonError> {
    let tokens = tokenize(source).map_err(|e| ValisonError::ExpressionSyntax {
        source_text: source.to_string(),
        position: e.offset,
        reason: e.reason,
    })?;
    let mut parser = Parser {
        source,
        tokens,
        pos: 0,
        depth: 0,
    };
    if parser.tokens.is_empty() {
        return Err(parser.error("empty expression"));
    }
    let expr = parser.or()?;
    if parser.peek().is_some() {
        return Err(parser.error("unexpected trailing input"));
    }
    Ok(expr)
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|s| &s.token)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).map(|s| s.token.clone());
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn eat(&mut self, expected: &Token) -> bool {
        if self.peek() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, expected: Token, what: &str) -> Result<(), ValisonError> {
        if self.eat(&expected) {
            Ok(())
        } else {
            Err(self.error(&format!("expected {}", what)))
        }
    }

    fn offset(&self) -> usize {
        self.tokens
            .get(self.pos)
            .map(|s| s.offset)
            .unwrap_or(self.source.len())
    }

    fn error(&self, reason: &str) -> ValisonError {
        ValisonError::ExpressionSyntax {
            source_text: self.source.to_string(),
            position: self.offset(),
            reason: reason.to_string(),
        }
    }

    fn descend(&mut self) -> Result<(), ValisonError> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(self.error(&format!("expression nests deeper than {} levels", MAX_DEPTH)));
        }
        Ok(())
    }

    fn binary_level(
        &mut self,
        ops: &[(Token, BinaryOp)],
        next: fn(&mut Self) -> Result<Expr, ValisonError>,
    ) -> Result<Expr, ValisonError> {
        let base = self.depth;
        let mut left = next(self)?;
        'outer: loop {
            for (token, op) in ops {
                if self.eat(token) {
                    self.descend()?;
                    let right = next(self)?;
                    left = Expr::Binary(*op, Box::new(left), Box::new(right));
                    continue 'outer;
                }
            }
            self.depth = base;
            return Ok(left);
        }
    }

    fn or(&mut self) -> Result<Expr, ValisonError> {
        self.binary_level(&[(Token::OrOr, BinaryOp::Or)], Self::and)
    }

    fn and(&mut self) -> Result<Expr, ValisonError> {
        self.binary_level(&[(Token::AndAnd, BinaryOp::And)], Self::equality)
    }

    fn equality(&mut self) -> Result<Expr, ValisonError> {
        self.binary_level(
            &[(Token::EqEq, BinaryOp::Eq), (Token::NotEq, BinaryOp::Ne)],
            Self::comparison,
        )
    }

    fn comparison(&mut self) -> Result<Expr, ValisonError> {
        self.binary_level(
            &[
                (Token::Le, BinaryOp::Le),
                (Token::Lt, BinaryOp::Lt),
                (Token::Ge, BinaryOp::Ge),
                (Token::Gt, BinaryOp::Gt),
            ],
            Self::additive,
        )
    }

    fn additive(&mut self) -> Result<Expr, ValisonError> {
        self.binary_level(
            &[(Token::Plus, BinaryOp::Add), (Token::Minus, BinaryOp::Sub)],
            Self::multiplicative,
        )
    }

    fn multiplicative(&mut self) -> Result<Expr, ValisonError> {
        self.binary_level(
            &[
                (Token::Star, BinaryOp::Mul),
                (Token::Slash, BinaryOp::Div),
                (Token::Percent, BinaryOp::Rem),
            ],
            Self::unary,
        )
    }

    fn unary(&mut self) -> Result<Expr, ValisonError> {
        let op = if self.eat(&Token::Bang) {
            UnaryOp::Not
        } else if self.eat(&Token::Minus) {
            UnaryOp::Neg
        } else {
            return self.postfix();
        };
        self.descend()?;
        let operand = self.unary()?;
        self.depth -= 1;
        Ok(Expr::Unary(op, Box::new(operand)))
    }

    fn postfix(&mut self) -> Result<Expr, ValisonError> {
        let base = self.depth;
        let mut expr = self.primary()?;
        loop {
            if matches!(self.peek(), Some(Token::Dot | Token::LBracket | Token::LParen)) {
                self.descend()?;
            }
            if self.eat(&Token::Dot) {
                match self.advance() {
                    Some(Token::Ident(name)) => expr = Expr::Member(Box::new(expr), name),
                    _ => {
                        self.pos = self.pos.saturating_sub(1);
                        return Err(self.error("expected property name after '.'"));
                    }
                }
            } else if self.eat(&Token::LBracket) {
                let index = self.or()?;
                self.expect(Token::RBracket, "']'")?;
                expr = Expr::Index(Box::new(expr), Box::new(index));
            } else if self.peek() == Some(&Token::LParen) {
                let Expr::Ident(name) = expr else {
                    return Err(self.error("only named functions can be called"));
                };
                self.pos += 1;
                let mut args = Vec::new();
                if !self.eat(&Token::RParen) {
                    loop {
                        args.push(self.or()?);
                        if self.eat(&Token::RParen) {
                            break;
                        }
                        self.expect(Token::Comma, "',' or ')'")?;
                    }
                }
                expr = Expr::Call(name, args);
            } else {
                self.depth = base;
                return Ok(expr);
            }
        }
    }

    fn primary(&mut self) -> Result<Expr, ValisonError> {
        match self.advance() {
            Some(Token::Number(n)) => Ok(Expr::Literal(number(n))),
            Some(Token::Str(s)) => Ok(Expr::Literal(Value::String(s))),
            Some(Token::Ident(name)) => Ok(match name.as_str() {
                "true" => Expr::Literal(Value::Bool(true)),
                "false" => Expr::Literal(Value::Bool(false)),
                "null" | "undefined" => Expr::Literal(Value::Null),
                _ => Expr::Ident(name),
            }),
            Some(Token::LParen) => {
                self.descend()?;
                let inner = self.or()?;
                self.expect(Token::RParen, "')'")?;
                self.depth -= 1;
                Ok(inner)
            }
            Some(_) => {
                self.pos -= 1;
                Err(self.error("unexpected token"))
            }
            None => Err(self.error("unexpected end of expression")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ident(name: &str) -> Box<Expr> {
        Box::new(Expr::Ident(name.to_string()))
    }

    #[test]
    fn respects_precedence() {
        let expr = parse("a || b && !c").unwrap();
        assert_eq!(
            expr,
            Expr::Binary(
                BinaryOp::Or,
                ident("a"),
                Box::new(Expr::Binary(
                    BinaryOp::And,
                    ident("b"),
                    Box::new(Expr::Unary(UnaryOp::Not, ident("c")))
                ))
            )
        );

        let expr = parse("1 + 2 * 3 > 6").unwrap();
        let Expr::Binary(BinaryOp::Gt, left, _) = expr else {
            panic!("expected comparison at the top");
        };
        assert!(matches!(*left, Expr::Binary(BinaryOp::Add, _, _)));
    }

    #[test]
    fn parses_member_index_and_calls() {
        let expr = parse("isLength(user.name, 2) && tags[0] == 'x'").unwrap();
        assert_eq!(expr.called_functions(), vec!["isLength"]);

        let expr = parse("(value)").unwrap();
        assert_eq!(expr, Expr::Ident("value".into()));
        assert_eq!(parse("null").unwrap(), Expr::Literal(json!(null)));
        assert_eq!(parse("-1.5").unwrap(), Expr::Unary(UnaryOp::Neg, Box::new(Expr::Literal(json!(1.5)))));
    }

    #[test]
    fn rejects_malformed_input() {
        for bad in ["", "a &&", "(a", "a b", "f(1,", "a.", "a.b(1)", "[1]"] {
            let err = parse(bad).unwrap_err();
            assert!(
                matches!(err, ValisonError::ExpressionSyntax { .. }),
                "{:?} should be a syntax error",
                bad
            );
        }
    }

    #[test]
    fn deep_nesting_is_a_syntax_error() {
        let open = "(".repeat(10_000);
        let chained_not = format!("{}true", "!".repeat(1000));
        let nested = format!("{}1{}", "(".repeat(200), ")".repeat(200));
        let long_chain = vec!["1"; 500].join(" + ");
        let members = format!("a{}", ".b".repeat(500));
        for source in [open.as_str(), chained_not.as_str(), nested.as_str(), long_chain.as_str(), members.as_str()] {
            let err = parse(source).unwrap_err();
            match err {
                ValisonError::ExpressionSyntax { reason, .. } => assert!(reason.contains("deeper")),
                other => panic!("unexpected error {:?}", other),
            }
        }
    }

    #[test]
    fn moderate_nesting_still_parses() {
        let nested = format!("{}value{}", "(".repeat(20), ")".repeat(20));
        assert_eq!(parse(&nested).unwrap(), Expr::Ident("value".into()));

        let chain = vec!["a"; 30].join(" && ");
        assert!(parse(&chain).is_ok());
        assert!(parse("!!!!value.a.b[0] + -(-(1)) > 0 || isLength(f(g(x)), 1)").is_ok());
    }

    #[test]
    fn syntax_errors_point_at_the_offending_token() {
        let err = parse("a && )").unwrap_err();
        match err {
            ValisonError::ExpressionSyntax { position, source_text, .. } => {
                assert_eq!(position, 5);
                assert_eq!(source_text, "a && )");
            }
            other => panic!("unexpected error {:?}", other),
        }
    }
}
