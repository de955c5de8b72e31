mod error;
mod function;
mod grammar;
pub mod parser;
mod unit;

pub use error::{Defect, Error, Result, Syntax};
pub use function::{compile, Args, Function, IntoArgs};
pub use grammar::{BinaryFn, BinaryOperator, Grammar, Precedence, UnaryFn};
pub use unit::Unit;
