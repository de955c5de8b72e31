use std::{
    collections::BTreeMap,
    io::{BufRead, Write},
};

use anyhow::{anyhow, Context, Result};
use log::{debug, info};
use polishd::{Function, Grammar};

use crate::{args, draw};

pub const HELP: &str = "\
Evaluates arithmetic expressions by compiling them to postfix notation.

Commands:
    eval EXPR ARGS...   evaluate the expression with the given arguments.
    save NAME EXPR      save the expression as function NAME.
    evals NAME ARGS...  evaluate the saved function NAME with the given arguments.
    show EXPR           show the expression in infix and postfix notation.
    shows NAME          show the saved function NAME in infix and postfix notation.
    list                show all saved functions.
    delete NAME         delete the saved function NAME.
    clear               delete all saved functions.
    draw NAME ARGS...   plot the saved function NAME over its one unbound argument.
    grammar             show all supported operators and constants.
    help                show this message.
    exit                stop the REPL and exit.

Expressions (EXPR):
    A regular arithmetic expression over the supported grammar (see `grammar`).
    Use parentheses for subexpressions like `2*(1+2)`.
    Prefix and postfix operators are unary and bind to the operand next to
    them, so `cos 0+1` is `(cos 0) + 1` while `cos(0+1)` applies to the sum.
    Operators of equal precedence group to the right: `1-2-3` is `1-(2-3)`.

Arguments (ARGS...):
    A sequence of `name=value` pairs separated by spaces, in any order.
    Names consist of english letters and `_`; values are numbers like `42` or `-0.3`.
    Arguments the expression does not use are ignored.
";

pub enum Flow {
    Continue,
    Exit,
}

fn word(tail: &str) -> (&str, &str) {
    let tail = tail.trim_start();
    tail.split_once(char::is_whitespace).unwrap_or((tail, ""))
}

fn show(function: &Function, out: &mut impl Write) -> Result<()> {
    writeln!(out, "Infix form: {}", function.infix())?;
    writeln!(out, "Postfix form: {}", function.postfix())?;
    Ok(())
}

pub struct Repl<'g> {
    grammar: &'g Grammar,
    functions: BTreeMap<String, Function>,
}

impl<'g> Repl<'g> {
    pub fn new(grammar: &'g Grammar) -> Self {
        Repl {
            grammar,
            functions: BTreeMap::new(),
        }
    }

    fn saved(&self, name: &str) -> Result<&Function> {
        self.functions
            .get(name)
            .ok_or_else(|| anyhow!("no function with name '{name}'"))
    }

    fn compile(&self, text: &str) -> Result<Function> {
        self.grammar
            .compile(text.trim())
            .with_context(|| format!("cannot compile `{}`", text.trim()))
    }

    /// Runs one command line.
    pub fn execute(&mut self, line: &str, out: &mut impl Write) -> Result<Flow> {
        let (command, tail) = word(line);
        debug!("command `{command}` with `{tail}`");
        match command {
            "" => {}
            "eval" => {
                let (expr, args) = args::split(tail)?;
                let value = self.compile(expr)?.evaluate(&args)?;
                writeln!(out, "= {value}")?;
            }
            "save" => {
                let (name, expr) = word(tail);
                if name.is_empty() {
                    return Err(anyhow!("missing function name"));
                }
                let function = self.compile(expr)?;
                info!("saved `{name}` as `{}`", function.postfix());
                self.functions.insert(name.to_owned(), function);
            }
            "evals" => {
                let (name, tail) = word(tail);
                let (_, args) = args::split(tail)?;
                let value = self.saved(name)?.evaluate(&args)?;
                writeln!(out, "= {value}")?;
            }
            "show" => show(&self.compile(tail)?, out)?,
            "shows" => show(self.saved(word(tail).0)?, out)?,
            "list" => {
                for (name, function) in &self.functions {
                    writeln!(out, "{name}: {function}")?;
                }
            }
            "delete" => {
                let name = word(tail).0;
                self.functions
                    .remove(name)
                    .ok_or_else(|| anyhow!("no function with name '{name}'"))?;
            }
            "clear" => self.functions.clear(),
            "draw" => {
                let (name, tail) = word(tail);
                let (_, args) = args::split(tail)?;
                draw::draw(self.saved(name)?, &args, out)?;
            }
            "grammar" => write!(out, "{}", self.grammar)?,
            "help" => write!(out, "{HELP}")?,
            "exit" | "quit" => return Ok(Flow::Exit),
            _ => writeln!(out, "Unknown command")?,
        }
        Ok(Flow::Continue)
    }

    /// Reads commands until `exit` or end of input. Errors are reported and
    /// the loop goes on.
    pub fn run(&mut self, input: impl BufRead, out: &mut impl Write) -> Result<()> {
        write!(out, "$ ")?;
        out.flush()?;
        for line in input.lines() {
            let line = line?;
            match self.execute(&line, out) {
                Ok(Flow::Exit) => break,
                Ok(Flow::Continue) => {}
                Err(err) => writeln!(out, "Error: {err:#}")?,
            }
            write!(out, "\n$ ")?;
            out.flush()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::demo;

    fn session(grammar: &Grammar, input: &str) -> String {
        let mut out = Vec::new();
        Repl::new(grammar)
            .run(input.as_bytes(), &mut out)
            .unwrap();
        String::from_utf8(out).unwrap()
    }

    fn execute(repl: &mut Repl, line: &str) -> Result<String> {
        let mut out = Vec::new();
        repl.execute(line, &mut out)?;
        Ok(String::from_utf8(out).unwrap())
    }

    #[test]
    fn eval_with_arguments() {
        let grammar = demo::grammar();
        let mut repl = Repl::new(&grammar);
        assert_eq!(execute(&mut repl, "eval 2*(1+2)").unwrap(), "= 6\n");
        assert_eq!(execute(&mut repl, "eval x ^ 2 + y x=3 y=-1").unwrap(), "= 8\n");
        assert_eq!(execute(&mut repl, "  eval cos 0 + 1").unwrap(), "= 2\n");
    }

    #[test]
    fn missing_argument_is_reported() {
        let grammar = demo::grammar();
        let mut repl = Repl::new(&grammar);
        let err = execute(&mut repl, "eval x + 1").unwrap_err();
        assert_eq!(err.to_string(), "missing argument: x");
    }

    #[test]
    fn saved_functions() {
        let grammar = demo::grammar();
        let mut repl = Repl::new(&grammar);
        execute(&mut repl, "save f x * 2 + 1").unwrap();
        execute(&mut repl, "save g 3!").unwrap();
        assert_eq!(execute(&mut repl, "evals f x=4").unwrap(), "= 9\n");
        assert_eq!(execute(&mut repl, "evals g").unwrap(), "= 6\n");
        assert_eq!(
            execute(&mut repl, "shows f").unwrap(),
            "Infix form: x * 2 + 1\nPostfix form: x 2 * 1 +\n"
        );
        assert_eq!(execute(&mut repl, "list").unwrap(), "f: x * 2 + 1\ng: 3!\n");

        execute(&mut repl, "save f x").unwrap();
        assert_eq!(execute(&mut repl, "evals f x=4").unwrap(), "= 4\n");

        execute(&mut repl, "delete f").unwrap();
        assert!(execute(&mut repl, "evals f x=4").is_err());
        assert!(execute(&mut repl, "delete f").is_err());
        execute(&mut repl, "clear").unwrap();
        assert_eq!(execute(&mut repl, "list").unwrap(), "");
    }

    #[test]
    fn show_expression() {
        let grammar = demo::grammar();
        let mut repl = Repl::new(&grammar);
        assert_eq!(
            execute(&mut repl, "show 1 - 2 - 3").unwrap(),
            "Infix form: 1 - 2 - 3\nPostfix form: 1 2 3 - -\n"
        );
    }

    #[test]
    fn bad_input() {
        let grammar = demo::grammar();
        let mut repl = Repl::new(&grammar);
        assert!(execute(&mut repl, "save").is_err());
        assert!(execute(&mut repl, "eval (1 + 2").is_err());
        assert!(execute(&mut repl, "shows nothing").is_err());
        assert_eq!(execute(&mut repl, "frobnicate").unwrap(), "Unknown command\n");
    }

    #[test]
    fn grammar_listing() {
        let grammar = demo::grammar();
        let mut repl = Repl::new(&grammar);
        let listing = execute(&mut repl, "grammar").unwrap();
        assert!(listing.contains("const pi = 3.14159"));
        assert!(listing.contains("binary ^ (precedence 3)"));
        assert!(listing.contains("postfix !"));
    }

    #[test]
    fn run_reports_errors_and_stops_at_exit() {
        let grammar = demo::grammar();
        let output = session(&grammar, "eval 1 +\neval 1 + 1\nexit\neval 5\n");
        assert_eq!(
            output,
            "$ Error: cannot compile `1 +`: invalid expression syntax: unexpected end of expression at position 3, near ``\n\
             \n$ = 2\n\
             \n$ "
        );
    }

    #[test]
    fn run_ends_with_input() {
        let grammar = demo::grammar();
        assert_eq!(session(&grammar, "help\n"), format!("$ {HELP}\n$ "));
    }
}
