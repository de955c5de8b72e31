use std::{collections::BTreeMap, fmt, fmt::Display, sync::Arc};

use log::{debug, warn};

use crate::{error::Result, function::Function};

pub type Precedence = u8;

pub type UnaryFn = Arc<dyn Fn(f64) -> f64 + Send + Sync>;
pub type BinaryFn = Arc<dyn Fn(f64, f64) -> f64 + Send + Sync>;

#[derive(Clone)]
pub struct BinaryOperator {
    pub function: BinaryFn,
    pub precedence: Precedence,
}

impl fmt::Debug for BinaryOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BinaryOperator")
            .field("precedence", &self.precedence)
            .finish_non_exhaustive()
    }
}

/// The vocabulary an expression is compiled against.
///
/// Build it completely before compiling. Compiled functions copy the operator
/// closures they use, so changing the grammar afterwards never affects them.
#[derive(Clone, Default)]
pub struct Grammar {
    constants: BTreeMap<String, f64>,
    prefix: BTreeMap<String, UnaryFn>,
    binary: BTreeMap<String, BinaryOperator>,
    postfix: BTreeMap<String, UnaryFn>,
}

fn insert<T>(registry: &mut BTreeMap<String, T>, what: &str, signature: String, entry: T) {
    if signature.is_empty() {
        warn!("ignoring {what} with an empty signature");
        return;
    }
    if registry.insert(signature, entry).is_some() {
        debug!("replaced existing {what}");
    }
}

fn longest_match<T>(registry: &BTreeMap<String, T>, s: &str, start: usize) -> usize {
    let Some(rest) = s.get(start..) else {
        return 0;
    };
    registry
        .keys()
        .filter(|signature| rest.starts_with(signature.as_str()))
        .map(String::len)
        .max()
        .unwrap_or(0)
}

impl Grammar {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn constants(&self) -> &BTreeMap<String, f64> {
        &self.constants
    }

    pub fn prefix(&self) -> &BTreeMap<String, UnaryFn> {
        &self.prefix
    }

    pub fn binary(&self) -> &BTreeMap<String, BinaryOperator> {
        &self.binary
    }

    pub fn postfix(&self) -> &BTreeMap<String, UnaryFn> {
        &self.postfix
    }

    pub fn add_constant(&mut self, name: impl Into<String>, value: f64) -> &mut Self {
        insert(&mut self.constants, "constant", name.into(), value);
        self
    }

    pub fn add_prefix_operator(
        &mut self,
        signature: impl Into<String>,
        prefix: impl Fn(f64) -> f64 + Send + Sync + 'static,
    ) -> &mut Self {
        insert(&mut self.prefix, "prefix operator", signature.into(), Arc::new(prefix));
        self
    }

    pub fn add_binary_operator(
        &mut self,
        signature: impl Into<String>,
        binary: impl Fn(f64, f64) -> f64 + Send + Sync + 'static,
        precedence: Precedence,
    ) -> &mut Self {
        let operator = BinaryOperator {
            function: Arc::new(binary),
            precedence,
        };
        insert(&mut self.binary, "binary operator", signature.into(), operator);
        self
    }

    pub fn add_postfix_operator(
        &mut self,
        signature: impl Into<String>,
        postfix: impl Fn(f64) -> f64 + Send + Sync + 'static,
    ) -> &mut Self {
        insert(&mut self.postfix, "postfix operator", signature.into(), Arc::new(postfix));
        self
    }

    /// Matches `[+-]?[0-9]*(\.[0-9]*)?` at `start`. A match without a single
    /// digit counts as no match.
    pub fn match_number(s: &str, start: usize) -> usize {
        let bytes = s.as_bytes();
        let at = |i: usize| bytes.get(start + i).copied();
        let mut length = 0;
        let mut digits = 0;
        if matches!(at(0), Some(b'+' | b'-')) {
            length += 1;
        }
        while at(length).map_or(false, |c| c.is_ascii_digit()) {
            length += 1;
            digits += 1;
        }
        if at(length) == Some(b'.') {
            length += 1;
            while at(length).map_or(false, |c| c.is_ascii_digit()) {
                length += 1;
                digits += 1;
            }
        }
        if digits == 0 {
            0
        } else {
            length
        }
    }

    pub fn match_argument(s: &str, start: usize) -> usize {
        s.as_bytes()
            .get(start..)
            .unwrap_or_default()
            .iter()
            .take_while(|c| c.is_ascii_alphabetic() || **c == b'_')
            .count()
    }

    pub fn match_prefix(&self, s: &str, start: usize) -> usize {
        longest_match(&self.prefix, s, start)
    }

    pub fn match_binary(&self, s: &str, start: usize) -> usize {
        longest_match(&self.binary, s, start)
    }

    pub fn match_postfix(&self, s: &str, start: usize) -> usize {
        longest_match(&self.postfix, s, start)
    }

    pub fn precedence_of(&self, signature: &str) -> Precedence {
        self.binary
            .get(signature)
            .map_or(0, |operator| operator.precedence)
    }

    pub fn compile(&self, infix: &str) -> Result<Function> {
        crate::compile(self, infix)
    }
}

impl fmt::Debug for Grammar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Grammar")
            .field("constants", &self.constants)
            .field("prefix", &self.prefix.keys().collect::<Vec<_>>())
            .field("binary", &self.binary)
            .field("postfix", &self.postfix.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl Display for Grammar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (name, value) in &self.constants {
            writeln!(f, "const {name} = {value}")?;
        }
        for signature in self.prefix.keys() {
            writeln!(f, "prefix {signature}")?;
        }
        for (signature, operator) in &self.binary {
            writeln!(f, "binary {signature} (precedence {})", operator.precedence)?;
        }
        for signature in self.postfix.keys() {
            writeln!(f, "postfix {signature}")?;
        }
        Ok(())
    }
}
