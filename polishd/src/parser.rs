use std::{fmt, ops::Deref, ops::Range};

use log::trace;

use crate::{
    error::{Error, Result, Syntax},
    grammar::Grammar,
};

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum TokenKind {
    Number,
    Prefix,
    Binary,
    Postfix,
    Opening,
    Closing,
    Argument,
}

impl TokenKind {
    fn ends_operand(self) -> bool {
        matches!(self, TokenKind::Number | TokenKind::Argument)
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Token<'a> {
    kind: TokenKind,
    value: &'a str,
    start: usize,
}

impl<'a> Token<'a> {
    pub fn new(kind: TokenKind, value: &'a str, start: usize) -> Self {
        Token { kind, value, start }
    }

    pub fn kind(&self) -> TokenKind {
        self.kind
    }

    pub fn value(&self) -> &'a str {
        self.value
    }

    pub fn span(&self) -> Range<usize> {
        self.start..self.start + self.value.len()
    }
}

impl Deref for Token<'_> {
    type Target = TokenKind;

    fn deref(&self) -> &Self::Target {
        &self.kind
    }
}

impl fmt::Display for Token<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.value)
    }
}

pub struct Tokenizer<'a> {
    grammar: &'a Grammar,
    text: &'a str,
    pos: usize,
    expect_operand: bool,
}

impl<'a> Tokenizer<'a> {
    pub fn new(grammar: &'a Grammar, text: &'a str) -> Self {
        Tokenizer {
            grammar,
            text,
            pos: 0,
            expect_operand: true,
        }
    }

    fn skip_spaces(&mut self) {
        while self.text.as_bytes().get(self.pos) == Some(&b' ') {
            self.pos += 1;
        }
    }

    fn token(&self, kind: TokenKind, length: usize) -> Token<'a> {
        Token::new(kind, &self.text[self.pos..self.pos + length], self.pos)
    }

    fn is_char(&self, c: u8) -> usize {
        usize::from(self.text.as_bytes().get(self.pos) == Some(&c))
    }

    fn parse_operand(&self) -> Result<Token<'a>> {
        let (text, pos) = (self.text, self.pos);
        let (kind, length) = [
            (TokenKind::Number, Grammar::match_number(text, pos)),
            (TokenKind::Prefix, self.grammar.match_prefix(text, pos)),
            (TokenKind::Opening, self.is_char(b'(')),
            (TokenKind::Argument, Grammar::match_argument(text, pos)),
        ]
        .into_iter()
        .find(|(_, length)| *length > 0)
        .ok_or_else(|| Error::syntax(Syntax::ExpectedOperand, text, pos))?;
        Ok(self.token(kind, length))
    }

    fn parse_operator(&self) -> Result<Token<'a>> {
        let (text, pos) = (self.text, self.pos);
        let (kind, length) = [
            (TokenKind::Binary, self.grammar.match_binary(text, pos)),
            (TokenKind::Postfix, self.grammar.match_postfix(text, pos)),
            (TokenKind::Closing, self.is_char(b')')),
        ]
        .into_iter()
        .find(|(_, length)| *length > 0)
        .ok_or_else(|| Error::syntax(Syntax::ExpectedOperator, text, pos))?;
        Ok(self.token(kind, length))
    }

    pub fn tokenize(mut self) -> Result<Vec<Token<'a>>> {
        let mut tokens = Vec::new();
        self.skip_spaces();
        while self.pos < self.text.len() {
            let token = if self.expect_operand {
                self.parse_operand()?
            } else {
                self.parse_operator()?
            };
            trace!("token {:?} `{}` at {}", token.kind, token.value, token.start);
            if token.ends_operand() {
                self.expect_operand = false;
            } else if token.kind == TokenKind::Binary {
                self.expect_operand = true;
            }
            self.pos += token.value.len();
            tokens.push(token);
            self.skip_spaces();
        }
        if self.expect_operand && !tokens.is_empty() {
            return Err(Error::syntax(Syntax::UnexpectedEnd, self.text, self.pos));
        }
        Ok(tokens)
    }
}

/// Reorders infix tokens into postfix order.
///
/// Prefix operators bind tighter than any binary operator. A binary operator
/// only pops binaries of strictly higher precedence, so operators of equal
/// precedence group to the right: `1 - 2 - 3` reads as `1 - (2 - 3)`.
pub fn to_postfix<'a>(
    grammar: &Grammar,
    text: &str,
    infix: Vec<Token<'a>>,
) -> Result<Vec<Token<'a>>> {
    let mut output = Vec::with_capacity(infix.len());
    let mut stack: Vec<Token<'a>> = Vec::new();
    for token in infix {
        match token.kind {
            TokenKind::Prefix | TokenKind::Opening => stack.push(token),
            TokenKind::Number | TokenKind::Argument | TokenKind::Postfix => output.push(token),
            TokenKind::Binary => {
                let precedence = grammar.precedence_of(token.value);
                while let Some(top) = stack.last() {
                    let pops = match top.kind {
                        TokenKind::Prefix => true,
                        TokenKind::Binary => grammar.precedence_of(top.value) > precedence,
                        _ => false,
                    };
                    if !pops {
                        break;
                    }
                    output.extend(stack.pop());
                }
                stack.push(token);
            }
            TokenKind::Closing => loop {
                match stack.pop() {
                    Some(Token {
                        kind: TokenKind::Opening,
                        ..
                    }) => break,
                    Some(top) => output.push(top),
                    None => {
                        return Err(Error::syntax(Syntax::UnmatchedClosing, text, token.start))
                    }
                }
            },
        }
    }
    while let Some(top) = stack.pop() {
        if top.kind == TokenKind::Opening {
            return Err(Error::syntax(Syntax::UnclosedOpening, text, top.start));
        }
        output.push(top);
    }
    Ok(output)
}
