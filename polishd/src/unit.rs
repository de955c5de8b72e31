use std::{collections::HashMap, fmt};

use log::trace;

use crate::{
    error::{Defect, Error, Result, Syntax},
    grammar::{BinaryFn, Grammar, UnaryFn},
    parser::{Token, TokenKind},
};

#[derive(Clone)]
pub enum Unit {
    Number(f64),
    Argument(usize),
    Unary(UnaryFn),
    Binary(BinaryFn),
}

impl Unit {
    fn stack_effect(&self) -> (usize, usize) {
        match self {
            Unit::Number(_) | Unit::Argument(_) => (0, 1),
            Unit::Unary(_) => (1, 1),
            Unit::Binary(_) => (2, 1),
        }
    }
}

impl fmt::Debug for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Unit::Number(x) => f.debug_tuple("Number").field(x).finish(),
            Unit::Argument(index) => f.debug_tuple("Argument").field(index).finish(),
            Unit::Unary(_) => f.write_str("Unary"),
            Unit::Binary(_) => f.write_str("Binary"),
        }
    }
}

#[derive(Debug)]
pub struct Compiled {
    pub program: Vec<Unit>,
    pub arguments: Vec<String>,
    pub depth: usize,
}

pub struct UnitCompiler<'a> {
    grammar: &'a Grammar,
    text: &'a str,
    indices: HashMap<&'a str, usize>,
    arguments: Vec<String>,
}

impl<'a> UnitCompiler<'a> {
    pub fn new(grammar: &'a Grammar, text: &'a str) -> Self {
        UnitCompiler {
            grammar,
            text,
            indices: HashMap::new(),
            arguments: Vec::new(),
        }
    }

    fn unknown(token: &Token) -> Error {
        Defect::UnknownSignature {
            kind: token.kind(),
            signature: token.value().to_owned(),
        }
        .into()
    }

    fn number(&self, token: &Token) -> Result<Unit> {
        token
            .value()
            .parse()
            .map(Unit::Number)
            .map_err(|_| Error::syntax(Syntax::MalformedNumber, self.text, token.span().start))
    }

    /// Constants fold into numbers; anything else becomes an argument slot,
    /// numbered by first appearance.
    fn argument(&mut self, name: &'a str) -> Unit {
        if let Some(value) = self.grammar.constants().get(name) {
            return Unit::Number(*value);
        }
        let index = match self.indices.get(name) {
            Some(index) => *index,
            None => {
                let index = self.arguments.len();
                self.indices.insert(name, index);
                self.arguments.push(name.to_owned());
                index
            }
        };
        Unit::Argument(index)
    }

    fn unit(&mut self, token: &Token<'a>) -> Result<Unit> {
        let unit = match token.kind() {
            TokenKind::Number => self.number(token)?,
            TokenKind::Argument => self.argument(token.value()),
            TokenKind::Prefix => self
                .grammar
                .prefix()
                .get(token.value())
                .map(|unary| Unit::Unary(unary.clone()))
                .ok_or_else(|| Self::unknown(token))?,
            TokenKind::Postfix => self
                .grammar
                .postfix()
                .get(token.value())
                .map(|unary| Unit::Unary(unary.clone()))
                .ok_or_else(|| Self::unknown(token))?,
            TokenKind::Binary => self
                .grammar
                .binary()
                .get(token.value())
                .map(|binary| Unit::Binary(binary.function.clone()))
                .ok_or_else(|| Self::unknown(token))?,
            kind @ (TokenKind::Opening | TokenKind::Closing) => {
                return Err(Defect::StructuralToken(kind).into())
            }
        };
        trace!("unit {:?} from `{}`", unit, token);
        Ok(unit)
    }

    pub fn compile(mut self, postfix: &[Token<'a>]) -> Result<Compiled> {
        let mut program = Vec::with_capacity(postfix.len());
        let (mut height, mut depth) = (0usize, 0usize);
        for (i, token) in postfix.iter().enumerate() {
            let unit = self.unit(token)?;
            let (pops, pushes) = unit.stack_effect();
            height = height
                .checked_sub(pops)
                .ok_or(Defect::StackUnderflow { unit: i })?
                + pushes;
            depth = depth.max(height);
            program.push(unit);
        }
        if height != 1 {
            return Err(Defect::UnbalancedProgram { depth: height }.into());
        }
        Ok(Compiled {
            program,
            arguments: self.arguments,
            depth,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grammar() -> Grammar {
        let mut grammar = Grammar::new();
        grammar
            .add_constant("pi", std::f64::consts::PI)
            .add_prefix_operator("neg", |x| -x)
            .add_binary_operator("+", |a, b| a + b, 1)
            .add_postfix_operator("!", |x| x);
        grammar
    }

    fn tokens<'a>(items: &[(TokenKind, &'a str)]) -> Vec<Token<'a>> {
        items
            .iter()
            .map(|(kind, value)| Token::new(*kind, *value, 0))
            .collect()
    }

    #[test]
    fn constants_fold_and_arguments_are_numbered() {
        use TokenKind::*;
        let grammar = grammar();
        let postfix = tokens(&[
            (Argument, "y"),
            (Argument, "pi"),
            (Argument, "x"),
            (Binary, "+"),
            (Argument, "y"),
            (Binary, "+"),
            (Binary, "+"),
        ]);
        let compiled = UnitCompiler::new(&grammar, "").compile(&postfix).unwrap();
        assert_eq!(compiled.arguments, ["y", "x"]);
        assert_eq!(compiled.depth, 3);
        assert!(matches!(compiled.program[0], Unit::Argument(0)));
        assert!(matches!(compiled.program[1], Unit::Number(x) if x == std::f64::consts::PI));
        assert!(matches!(compiled.program[2], Unit::Argument(1)));
        assert!(matches!(compiled.program[4], Unit::Argument(0)));
    }

    #[test]
    fn unknown_signature_is_a_defect() {
        let grammar = grammar();
        let postfix = tokens(&[(TokenKind::Number, "1"), (TokenKind::Prefix, "sin")]);
        let err = UnitCompiler::new(&grammar, "").compile(&postfix).unwrap_err();
        assert_eq!(
            err,
            Error::Defect(Defect::UnknownSignature {
                kind: TokenKind::Prefix,
                signature: "sin".to_owned()
            })
        );
    }

    #[test]
    fn structural_tokens_are_rejected() {
        let grammar = grammar();
        let postfix = tokens(&[(TokenKind::Opening, "(")]);
        let err = UnitCompiler::new(&grammar, "").compile(&postfix).unwrap_err();
        assert_eq!(err, Error::Defect(Defect::StructuralToken(TokenKind::Opening)));
    }

    #[test]
    fn malformed_program_shape_is_a_defect() {
        let grammar = grammar();
        let compile = |items: &[(TokenKind, &'static str)]| {
            UnitCompiler::new(&grammar, "")
                .compile(&tokens(items))
                .err()
        };
        assert_eq!(
            compile(&[(TokenKind::Number, "1"), (TokenKind::Binary, "+")]),
            Some(Error::Defect(Defect::StackUnderflow { unit: 1 }))
        );
        assert_eq!(
            compile(&[(TokenKind::Number, "1"), (TokenKind::Number, "2")]),
            Some(Error::Defect(Defect::UnbalancedProgram { depth: 2 }))
        );
        assert_eq!(
            compile(&[]),
            Some(Error::Defect(Defect::UnbalancedProgram { depth: 0 }))
        );
    }

    #[test]
    fn malformed_number_is_a_syntax_error() {
        let grammar = grammar();
        let postfix = tokens(&[(TokenKind::Number, "1.2.3")]);
        let err = UnitCompiler::new(&grammar, "1.2.3").compile(&postfix).unwrap_err();
        assert_eq!(err.as_syntax(), Some(Syntax::MalformedNumber));
    }
}
