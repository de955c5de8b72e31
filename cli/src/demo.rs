use std::f64::consts::{E, PI};

use polishd::Grammar;

fn factorial(x: f64) -> f64 {
    // 171! overflows f64
    if x >= 171.0 {
        return f64::INFINITY;
    }
    (2..=x as u64).fold(1.0, |acc, n| acc * n as f64)
}

/// The grammar the binary ships with.
pub fn grammar() -> Grammar {
    let mut grammar = Grammar::new();
    grammar.add_constant("pi", PI).add_constant("e", E);

    grammar
        .add_prefix_operator("-", |x| -x)
        .add_prefix_operator("exp", f64::exp)
        .add_prefix_operator("sin", f64::sin)
        .add_prefix_operator("cos", f64::cos)
        .add_prefix_operator("floor", f64::floor)
        .add_prefix_operator("ceil", f64::ceil)
        .add_prefix_operator("round", f64::round)
        .add_prefix_operator("abs", f64::abs);

    grammar
        .add_binary_operator("+", |a, b| a + b, 1)
        .add_binary_operator("-", |a, b| a - b, 1)
        .add_binary_operator("*", |a, b| a * b, 2)
        .add_binary_operator("/", |a, b| a / b, 2)
        .add_binary_operator("^", f64::powf, 3);

    grammar.add_postfix_operator("!", factorial);
    grammar
}

#[cfg(test)]
mod tests {
    use polishd::IntoArgs;

    use super::*;

    #[test]
    fn factorial_truncates() {
        assert_eq!(factorial(0.0), 1.0);
        assert_eq!(factorial(1.0), 1.0);
        assert_eq!(factorial(5.0), 120.0);
        assert_eq!(factorial(3.9), 6.0);
        assert_eq!(factorial(-2.0), 1.0);
        assert_eq!(factorial(170.0), (2..=170).fold(1.0, |acc, n| acc * n as f64));
        assert_eq!(factorial(171.0), f64::INFINITY);
        assert_eq!(factorial(1e12), f64::INFINITY);
        assert_eq!(factorial(f64::INFINITY), f64::INFINITY);
    }

    #[test]
    fn demo_expressions() {
        let grammar = grammar();
        let eval = |text: &str| grammar.compile(text).unwrap().evaluate_no_args().unwrap();
        assert_eq!(eval("2 * (1 + 2)"), 6.0);
        assert_eq!(eval("cos 0 + 1"), 2.0);
        assert_eq!(eval("1 + cos 0"), 2.0);
        assert_eq!(eval("sin(pi * 0.5)"), 1.0);
        assert_eq!(eval("floor 2.7 + ceil 0.2"), 3.0);
        assert_eq!(eval("abs -3"), 3.0);
        assert_eq!(eval("exp 0"), 1.0);
        assert_eq!(eval("4!"), 24.0);
        assert_eq!(eval("e"), E);

        let f = grammar.compile("round x ^ 2").unwrap();
        assert_eq!(f.evaluate(&("x", 2.6).args()).unwrap(), 9.0);
    }
}
