use std::io::Write;

use anyhow::{bail, Result};
use polishd::{Args, Function};

const WIDTH: usize = 100;
const HEIGHT: usize = 20;
const SAMPLE_WIDTH: f64 = 10.0;
const SAMPLES: usize = 10;

/// Picks the one argument of `function` that `bound` leaves free.
fn free_argument<'f>(function: &'f Function, bound: &Args) -> Result<&'f str> {
    let mut free = function
        .arguments()
        .iter()
        .filter(|name| !bound.contains_key(*name));
    match (free.next(), free.next()) {
        (Some(name), None) => Ok(name),
        (None, _) => bail!("`{}` has no free argument to plot", function),
        (Some(_), Some(_)) => bail!("`{}` has more than one free argument", function),
    }
}

/// Plots `function` over `[-5, 5]` as ASCII art.
pub fn draw(function: &Function, bound: &Args, out: &mut impl Write) -> Result<()> {
    let id = free_argument(function, bound)?;
    let xs: Vec<f64> = (0..WIDTH + 1)
        .flat_map(|i| {
            (0..SAMPLES).map(move |j| {
                SAMPLE_WIDTH * (i as f64 + (j as f64 / SAMPLES as f64)) / (WIDTH as f64 + 0.5)
                    - SAMPLE_WIDTH / 2.0
            })
        })
        .collect();
    let args: Vec<Args> = xs
        .iter()
        .map(|x| {
            let mut args = bound.clone();
            args.insert(id.to_owned(), *x);
            args
        })
        .collect();
    let samples = function
        .evaluate_many(&args)
        .into_iter()
        .collect::<Result<Vec<f64>, _>>()?;
    let values: Vec<(f64, f64)> = samples
        .chunks(SAMPLES)
        .map(|column| {
            column
                .iter()
                .fold((f64::INFINITY, f64::NEG_INFINITY), |(min, max), v| {
                    (min.min(*v), max.max(*v))
                })
        })
        .collect();

    let min = values.iter().fold(f64::INFINITY, |a, (b, _)| a.min(*b));
    let max = values.iter().fold(f64::NEG_INFINITY, |a, (_, b)| a.max(*b));

    for i in 0..HEIGHT {
        let row: String = values
            .windows(2)
            .map(|pair| {
                let (last, current) = (pair[0], pair[1]);
                let (s, e) = (last.0.min(current.0), last.1.max(current.1));
                let y_0 = max - (max - min) * (i + 1) as f64 / (HEIGHT - 1) as f64;
                let y_1 = max - (max - min) * i as f64 / (HEIGHT - 1) as f64;
                if s <= y_1 && e >= y_0 {
                    '#'
                } else {
                    ' '
                }
            })
            .collect();
        writeln!(out, "{row}")?;
    }
    writeln!(
        out,
        "[{:.2},{:.2}]x[{:.2},{:.2}]",
        -SAMPLE_WIDTH / 2.0,
        SAMPLE_WIDTH / 2.0,
        min,
        max
    )?;
    Ok(())
}
