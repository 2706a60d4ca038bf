//! Tokenizer for guard expressions.

use std::iter::Peekable;
use std::str::CharIndices;

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Number(f64),
    Str(String),
    Ident(String),
    LParen,
    RParen,
    LBracket,
    RBracket,
    Comma,
    Dot,
    Bang,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    EqEq,
    NotEq,
    Lt,
    Le,
    Gt,
    Ge,
    AndAnd,
    OrOr,
}

/// A token and the byte offset it starts at.
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned {
    pub token: Token,
    pub offset: usize,
}

/// A lexing failure: offset and reason.
#[derive(Debug, Clone, PartialEq)]
pub struct LexError {
    pub offset: usize,
    pub reason: String,
}

struct Lexer<'a> {
    chars: Peekable<CharIndices<'a>>,
}

pub fn tokenize(input: &str) -> Result<Vec<Spanned>, LexError> {
    let mut lexer = Lexer {
        chars: input.char_indices().peekable(),
    };
    let mut tokens = Vec::new();
    while let Some(spanned) = lexer.next_token()? {
        tokens.push(spanned);
    }
    Ok(tokens)
}

impl<'a> Lexer<'a> {
    fn next_token(&mut self) -> Result<Option<Spanned>, LexError> {
        while let Some(&(_, c)) = self.chars.peek() {
            if !c.is_whitespace() {
                break;
            }
            self.chars.next();
        }

        let Some((offset, c)) = self.chars.next() else {
            return Ok(None);
        };

        let token = match c {
            '(' => Token::LParen,
            ')' => Token::RParen,
            '[' => Token::LBracket,
            ']' => Token::RBracket,
            ',' => Token::Comma,
            '.' => Token::Dot,
            '+' => Token::Plus,
            '-' => Token::Minus,
            '*' => Token::Star,
            '/' => Token::Slash,
            '%' => Token::Percent,
            '!' => {
                if self.eat('=') {
                    // `!==` is accepted as a spelling of `!=`.
                    self.eat('=');
                    Token::NotEq
                } else {
                    Token::Bang
                }
            }
            '=' => {
                if !self.eat('=') {
                    return Err(LexError {
                        offset,
                        reason: "assignment is not supported, use '=='".to_string(),
                    });
                }
                self.eat('=');
                Token::EqEq
            }
            '<' => {
                if self.eat('=') {
                    Token::Le
                } else {
                    Token::Lt
                }
            }
            '>' => {
                if self.eat('=') {
                    Token::Ge
                } else {
                    Token::Gt
                }
            }
            '&' => {
                if !self.eat('&') {
                    return Err(LexError {
                        offset,
                        reason: "expected '&&'".to_string(),
                    });
                }
                Token::AndAnd
            }
            '|' => {
                if !self.eat('|') {
                    return Err(LexError {
                        offset,
                        reason: "expected '||'".to_string(),
                    });
                }
                Token::OrOr
            }
            '"' | '\'' => Token::Str(self.string(offset, c)?),
            c if c.is_ascii_digit() => Token::Number(self.number(offset, c)?),
            c if c.is_alphabetic() || c == '_' || c == '$' => {
                let mut name = c.to_string();
                while let Some(&(_, nc)) = self.chars.peek() {
                    if nc.is_alphanumeric() || nc == '_' || nc == '$' {
                        name.push(nc);
                        self.chars.next();
                    } else {
                        break;
                    }
                }
                Token::Ident(name)
            }
            other => {
                return Err(LexError {
                    offset,
                    reason: format!("unexpected character '{}'", other),
                })
            }
        };

        Ok(Some(Spanned { token, offset }))
    }

    fn eat(&mut self, expected: char) -> bool {
        if let Some(&(_, c)) = self.chars.peek() {
            if c == expected {
                self.chars.next();
                return true;
            }
        }
        false
    }

    fn string(&mut self, offset: usize, quote: char) -> Result<String, LexError> {
        let mut s = String::new();
        while let Some((_, c)) = self.chars.next() {
            match c {
                '\\' => match self.chars.next() {
                    Some((_, 'n')) => s.push('\n'),
                    Some((_, 't')) => s.push('\t'),
                    Some((_, 'r')) => s.push('\r'),
                    Some((_, other)) => s.push(other),
                    None => break,
                },
                c if c == quote => return Ok(s),
                c => s.push(c),
            }
        }
        Err(LexError {
            offset,
            reason: "unterminated string".to_string(),
        })
    }

    fn number(&mut self, offset: usize, first: char) -> Result<f64, LexError> {
        let mut s = first.to_string();
        let mut seen_dot = false;
        let mut seen_exp = false;
        while let Some(&(_, c)) = self.chars.peek() {
            match c {
                '0'..='9' => s.push(c),
                '.' if !seen_dot && !seen_exp => {
                    // `1.foo` is a member access on 1, not a fraction.
                    let mut ahead = self.chars.clone();
                    ahead.next();
                    if !ahead.peek().is_some_and(|&(_, d)| d.is_ascii_digit()) {
                        break;
                    }
                    seen_dot = true;
                    s.push(c);
                }
                'e' | 'E' if !seen_exp => {
                    seen_exp = true;
                    s.push(c);
                    self.chars.next();
                    if let Some(&(_, sign)) = self.chars.peek() {
                        if sign == '+' || sign == '-' {
                            s.push(sign);
                            self.chars.next();
                        }
                    }
                    continue;
                }
                _ => break,
            }
            self.chars.next();
        }
        s.parse::<f64>().map_err(|_| LexError {
            offset,
            reason: format!("invalid number '{}'", s),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(input: &str) -> Vec<Token> {
        tokenize(input).unwrap().into_iter().map(|s| s.token).collect()
    }

    #[test]
    fn tokenizes_calls_and_operators() {
        assert_eq!(
            kinds("isLength(value, 1, 2.5) && !x"),
            vec![
                Token::Ident("isLength".into()),
                Token::LParen,
                Token::Ident("value".into()),
                Token::Comma,
                Token::Number(1.0),
                Token::Comma,
                Token::Number(2.5),
                Token::RParen,
                Token::AndAnd,
                Token::Bang,
                Token::Ident("x".into()),
            ]
        );
        assert_eq!(kinds("a === b"), vec![Token::Ident("a".into()), Token::EqEq, Token::Ident("b".into())]);
        assert_eq!(kinds("a !== 'b'"), vec![Token::Ident("a".into()), Token::NotEq, Token::Str("b".into())]);
        assert_eq!(kinds("1e3 <= 2"), vec![Token::Number(1000.0), Token::Le, Token::Number(2.0)]);
    }

    #[test]
    fn reports_offsets_of_bad_input() {
        let err = tokenize("a = b").unwrap_err();
        assert_eq!(err.offset, 2);
        let err = tokenize("'open").unwrap_err();
        assert_eq!(err.offset, 0);
        let err = tokenize("a # b").unwrap_err();
        assert_eq!(err.offset, 2);
    }
}
