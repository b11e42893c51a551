// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

extern crate clap;
extern crate crossbeam;
extern crate env_logger;
#[macro_use]
extern crate failure;
extern crate num;
extern crate num_cpus;
extern crate stripebrot;

use clap::{App, Arg, ArgMatches};
use num::Complex;
use std::str::FromStr;

use stripebrot::export::write_image;
use stripebrot::{ComplexNumber, Engine, Fractal, Viewport};

// Splits `s` at the first `separator` and parses both halves.
fn parse_pair<T: FromStr>(s: &str, separator: char) -> Option<(T, T)> {
    let mut halves = s.splitn(2, separator);
    let left = halves.next()?.parse().ok()?;
    let right = halves.next()?.parse().ok()?;
    Some((left, right))
}

fn parse_complex(s: &str) -> Option<Complex<f64>> {
    parse_pair(s.trim(), ',').map(|(re, im)| Complex::new(re, im))
}

fn validate_complex(s: &str, err: &str) -> Result<(), String> {
    parse_complex(s).map(|_| ()).ok_or_else(|| err.to_string())
}

fn validate_size(s: &str) -> Result<(), String> {
    match parse_pair::<u16>(s, 'x') {
        Some((w, h)) if w > 0 && h > 0 => Ok(()),
        Some(_) => Err("Image width and height must both be positive".to_string()),
        None => Err(format!(
            "Could not parse output image size; each side must be at most {}",
            u16::max_value()
        )),
    }
}

fn validate_range<T: FromStr + PartialOrd>(
    s: &str,
    low: T,
    high: T,
    unparsable: &str,
    out_of_range: &str,
) -> Result<(), String> {
    let value = T::from_str(s).map_err(|_| unparsable.to_string())?;
    if value < low || value > high {
        Err(out_of_range.to_string())
    } else {
        Ok(())
    }
}

const OUTPUT: &str = "output";
const SIZE: &str = "size";
const LEFTLOWER: &str = "leftlower";
const RIGHTUPPER: &str = "rightupper";
const ITERATIONS: &str = "iterations";
const FRACTAL: &str = "fractal";
const JULIA: &str = "julia";
const THREADS: &str = "threads";

const MAX_THREADS: usize = 256;

fn args<'a>() -> ArgMatches<'a> {
    App::new("stripebrot")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Striped escape-time fractal renderer")
        .arg(
            Arg::with_name(OUTPUT)
                .required(true)
                .long(OUTPUT)
                .short("o")
                .takes_value(true)
                .help("Output file; the extension picks the format"),
        )
        .arg(
            Arg::with_name(SIZE)
                .long(SIZE)
                .short("s")
                .takes_value(true)
                .default_value("800x600")
                .validator(|s| validate_size(&s))
                .help("Size of output image"),
        )
        .arg(
            Arg::with_name(LEFTLOWER)
                .long(LEFTLOWER)
                .short("l")
                .takes_value(true)
                .allow_hyphen_values(true)
                .default_value("-2,-1.6")
                .validator(|s| validate_complex(&s, "Could not parse left lower corner"))
                .help("Left lower corner of the complex plane"),
        )
        .arg(
            Arg::with_name(RIGHTUPPER)
                .long(RIGHTUPPER)
                .short("r")
                .takes_value(true)
                .allow_hyphen_values(true)
                .default_value("2,1.6")
                .validator(|s| validate_complex(&s, "Could not parse right upper corner"))
                .help("Right upper corner of the complex plane"),
        )
        .arg(
            Arg::with_name(ITERATIONS)
                .long(ITERATIONS)
                .short("i")
                .takes_value(true)
                .default_value("100")
                .validator(|s| {
                    validate_range(
                        &s,
                        1,
                        1_000_000,
                        "Could not parse iteration count",
                        "Iteration count must be between 1 and 1000000",
                    )
                })
                .help("Maximum number of iterations per pixel"),
        )
        .arg(
            Arg::with_name(FRACTAL)
                .long(FRACTAL)
                .short("f")
                .takes_value(true)
                .possible_values(&["mandelbrot", "burning-ship"])
                .default_value("mandelbrot")
                .help("Fractal family"),
        )
        .arg(
            Arg::with_name(JULIA)
                .long(JULIA)
                .short("j")
                .takes_value(true)
                .allow_hyphen_values(true)
                .validator(|s| validate_complex(&s, "Could not parse Julia seed"))
                .help("Draw the Julia set with this seed, e.g. -0.8,0.156"),
        )
        .arg(
            Arg::with_name(THREADS)
                .long(THREADS)
                .short("t")
                .takes_value(true)
                .validator(|s| {
                    validate_range(
                        &s,
                        1,
                        MAX_THREADS,
                        "Could not parse thread count",
                        &format!("Thread count must be between 1 and {}", MAX_THREADS),
                    )
                })
                .help("Number of workers (default: one per processor)"),
        )
        .get_matches()
}

fn complex_arg(matches: &ArgMatches, name: &str) -> Result<ComplexNumber, failure::Error> {
    let value = matches.value_of(name).unwrap_or_default();
    match parse_complex(value) {
        Some(c) => Ok(ComplexNumber::from(c)),
        None => {
            bail!("Could not parse {} '{}'", name, value);
        }
    }
}

fn run(matches: &ArgMatches) -> Result<(), failure::Error> {
    let (width, height) = match matches.value_of(SIZE).and_then(|s| parse_pair::<u16>(s, 'x')) {
        Some((w, h)) => (usize::from(w), usize::from(h)),
        None => {
            bail!("Could not parse output image size");
        }
    };
    let viewport = Viewport::from_corners(
        complex_arg(matches, LEFTLOWER)?,
        complex_arg(matches, RIGHTUPPER)?,
    );
    if !viewport.is_well_formed() {
        bail!("The left lower corner must be left of and below the right upper corner");
    }
    let iterations = u32::from_str(matches.value_of(ITERATIONS).unwrap_or_default())?;
    let fractal = Fractal::from_str(matches.value_of(FRACTAL).unwrap_or_default())
        .map_err(failure::err_msg)?;
    let seed = match matches.value_of(JULIA) {
        Some(_) => Some(complex_arg(matches, JULIA)?),
        None => None,
    };
    let threads = match matches.value_of(THREADS) {
        Some(t) => usize::from_str(t)?,
        None => num_cpus::get(),
    };

    let mut engine = Engine::with_workers(fractal, seed.is_some(), threads)?;
    engine.resize(width, height);
    engine.change_viewport(viewport.x_min, viewport.x_max, viewport.y_min, viewport.y_max);
    engine.set_iterations(iterations);
    if let Some(seed) = seed {
        engine.set_seed(seed);
    }

    let (sender, receiver) = crossbeam::channel::bounded(1);
    engine.add_finished_listener(move |framebuffer| {
        let _ = sender.send(framebuffer);
    });
    if !engine.start() {
        bail!(
            "A {}x{} image cannot be split between {} workers",
            width,
            height,
            engine.worker_count()
        );
    }
    let framebuffer = receiver.recv()?;
    write_image(matches.value_of(OUTPUT).unwrap_or_default(), &framebuffer)?;
    Ok(())
}

fn main() {
    env_logger::init();
    let matches = args();
    if let Err(e) = run(&matches) {
        eprintln!("Render failure: {}", e);
        std::process::exit(1);
    }
}
