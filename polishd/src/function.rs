use std::{collections::HashMap, fmt::Display};

use itertools::Itertools;
use log::debug;
use rayon::prelude::*;

use crate::{
    error::{Defect, Error, Result, Syntax},
    grammar::Grammar,
    parser::{to_postfix, Tokenizer},
    unit::{Unit, UnitCompiler},
};

pub type Args = HashMap<String, f64>;

pub trait IntoArgs {
    fn args(self) -> Args;
}

impl<S: Into<String>> IntoArgs for (S, f64) {
    fn args(self) -> Args {
        let (name, value) = self;
        HashMap::from([(name.into(), value)])
    }
}

impl<S: Into<String> + Clone> IntoArgs for &[(S, f64)] {
    fn args(self) -> Args {
        self.iter()
            .map(|(name, value)| (name.clone().into(), *value))
            .collect()
    }
}

/// A compiled expression: a postfix program plus the names of the arguments
/// it reads, indexed in order of first appearance.
#[derive(Clone, Debug)]
pub struct Function {
    program: Vec<Unit>,
    arguments: Vec<String>,
    infix: String,
    postfix: String,
    depth: usize,
}

pub fn compile(grammar: &Grammar, infix: &str) -> Result<Function> {
    #[cfg(feature = "tracy")]
    profiling::scope!("compile");
    let tokens = Tokenizer::new(grammar, infix).tokenize()?;
    if tokens.is_empty() {
        return Err(Error::syntax(Syntax::Empty, infix, 0));
    }
    let postfix = to_postfix(grammar, infix, tokens)?;
    let compiled = UnitCompiler::new(grammar, infix).compile(&postfix)?;
    let function = Function {
        program: compiled.program,
        arguments: compiled.arguments,
        infix: infix.to_owned(),
        postfix: postfix.iter().join(" "),
        depth: compiled.depth,
    };
    debug!(
        "compiled `{}` into `{}` with arguments {:?}",
        function.infix, function.postfix, function.arguments
    );
    Ok(function)
}

impl Function {
    pub fn infix(&self) -> &str {
        &self.infix
    }

    pub fn postfix(&self) -> &str {
        &self.postfix
    }

    pub fn arguments(&self) -> &[String] {
        &self.arguments
    }

    pub fn program(&self) -> &[Unit] {
        &self.program
    }

    pub fn len(&self) -> usize {
        self.program.len()
    }

    pub fn is_empty(&self) -> bool {
        self.program.is_empty()
    }

    fn resolve(&self, args: &Args) -> Result<Vec<f64>> {
        self.arguments
            .iter()
            .map(|name| {
                args.get(name)
                    .copied()
                    .ok_or_else(|| Error::MissingArgument(name.clone()))
            })
            .collect()
    }

    /// Runs the program. Every argument is looked up before the first unit
    /// runs, so a missing one fails the whole call.
    pub fn evaluate(&self, args: &Args) -> Result<f64> {
        #[cfg(feature = "tracy")]
        profiling::scope!("Function::evaluate");
        let values = self.resolve(args)?;
        let mut stack = Vec::with_capacity(self.depth);
        for (i, unit) in self.program.iter().enumerate() {
            let underflow = || Defect::StackUnderflow { unit: i };
            let value = match unit {
                Unit::Number(x) => *x,
                Unit::Argument(index) => values[*index],
                Unit::Unary(unary) => unary(stack.pop().ok_or_else(underflow)?),
                Unit::Binary(binary) => {
                    let b = stack.pop().ok_or_else(underflow)?;
                    let a = stack.pop().ok_or_else(underflow)?;
                    binary(a, b)
                }
            };
            stack.push(value);
        }
        match stack[..] {
            [result] => Ok(result),
            _ => Err(Defect::UnbalancedProgram { depth: stack.len() }.into()),
        }
    }

    pub fn evaluate_no_args(&self) -> Result<f64> {
        self.evaluate(&Args::new())
    }

    pub fn evaluate_many(&self, args: &[Args]) -> Vec<Result<f64>> {
        #[cfg(feature = "tracy")]
        profiling::scope!("Function::evaluate_many");
        args.par_iter().map(|args| self.evaluate(args)).collect()
    }
}

impl Display for Function {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.infix)
    }
}
