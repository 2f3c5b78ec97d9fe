// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

extern crate clap;
extern crate env_logger;
extern crate failure;
extern crate fractals;
extern crate image;
extern crate num;
extern crate num_cpus;

use clap::{App, Arg, ArgMatches};
use failure::{format_err, Error};
use fractals::{
    EscapeBound, PaletteLaw, Precision, RenderOptions, Renderer, ViewRect, DEFAULT_LIMIT,
};
use image::png::PNGEncoder;
use image::ColorType;
use num::Complex;
use std::fs::File;
use std::path::Path;
use std::str::FromStr;
use std::time::Instant;

fn parse_pair<T>(s: &str, separator: char) -> Option<(T, T)>
where
    T: FromStr,
{
    match s.find(separator) {
        None => None,
        Some(index) => match (T::from_str(&s[..index]), T::from_str(&s[index + 1..])) {
            (Ok(l), Ok(r)) => Some((l, r)),
            _ => None,
        },
    }
}

fn parse_complex(s: &str) -> Option<Complex<f64>> {
    match parse_pair(s, ',') {
        Some((re, im)) => Some(Complex { re, im }),
        None => None,
    }
}

fn validate_pair<T: FromStr>(s: &str, separator: char, err: &str) -> Result<(), String> {
    match parse_pair::<T>(s, separator) {
        Some(_) => Ok(()),
        None => Err(err.to_string()),
    }
}

fn validate_range<T: FromStr + Ord>(
    s: &str,
    low: T,
    high: T,
    isnotanumber_err: &str,
    isnotinrange_err: &str,
) -> Result<(), String> {
    match T::from_str(s) {
        Ok(i) => {
            if i >= low && i <= high {
                Ok(())
            } else {
                Err(isnotinrange_err.to_string())
            }
        }
        Err(_) => Err(isnotanumber_err.to_string()),
    }
}

const OUTPUT: &str = "output";
const SIZE: &str = "size";
const LEFTUPPER: &str = "leftupper";
const RIGHTLOWER: &str = "rightlower";
const THREADS: &str = "threads";
const BAND: &str = "band";
const ITERATIONS: &str = "iterations";
const PRECISION: &str = "precision";
const LEGACY_BOUND: &str = "legacy-bound";

fn args<'a>() -> ArgMatches<'a> {
    let max_threads = num_cpus::get();

    App::new("fractals")
        .version("0.1.0")
        .about("Mandelbrot escape-time renderer")
        .arg(
            Arg::with_name(OUTPUT)
                .required(true)
                .long(OUTPUT)
                .short("o")
                .takes_value(true)
                .help("Output PNG file"),
        )
        .arg(
            Arg::with_name(SIZE)
                .required(false)
                .long(SIZE)
                .short("s")
                .takes_value(true)
                .default_value("800x600")
                .validator(|s| validate_pair::<u16>(&s, 'x', "Could not parse output image size"))
                .help("Size of output image, WIDTHxHEIGHT"),
        )
        .arg(
            Arg::with_name(LEFTUPPER)
                .required(false)
                .long(LEFTUPPER)
                .short("l")
                .takes_value(true)
                .allow_hyphen_values(true)
                .default_value("-2.2,-1.2")
                .validator(|s| validate_pair::<f64>(&s, ',', "Could not parse left upper corner"))
                .help("Left upper corner of the view, LEFT,TOP"),
        )
        .arg(
            Arg::with_name(RIGHTLOWER)
                .required(false)
                .long(RIGHTLOWER)
                .short("r")
                .takes_value(true)
                .allow_hyphen_values(true)
                .default_value("1.0,1.2")
                .validator(|s| validate_pair::<f64>(&s, ',', "Could not parse right lower corner"))
                .help("Right lower corner of the view, RIGHT,BOTTOM"),
        )
        .arg(
            Arg::with_name(ITERATIONS)
                .required(false)
                .long(ITERATIONS)
                .short("i")
                .takes_value(true)
                .validator(move |s| {
                    validate_range(
                        &s,
                        1,
                        10_000_000,
                        "Could not parse iteration count",
                        "Iteration count must be between 1 and 10000000",
                    )
                })
                .help("Maximum iterations per point [default: the library default limit]"),
        )
        .arg(
            Arg::with_name(THREADS)
                .required(false)
                .long(THREADS)
                .short("t")
                .takes_value(true)
                .validator(move |s| {
                    validate_range(
                        &s,
                        1,
                        max_threads,
                        "Could not parse thread count",
                        &format!("Thread count must be between 1 and {}", max_threads),
                    )
                })
                .help("Number of threads to use in renderer [default: all CPUs]"),
        )
        .arg(
            Arg::with_name(BAND)
                .required(false)
                .long(BAND)
                .short("b")
                .takes_value(true)
                .default_value("16")
                .validator(move |s| {
                    validate_range(
                        &s,
                        1,
                        65_535,
                        "Could not parse band height",
                        "Band height must be between 1 and 65535",
                    )
                })
                .help("Rows handed to a thread at a time"),
        )
        .arg(
            Arg::with_name(PRECISION)
                .required(false)
                .long(PRECISION)
                .short("p")
                .takes_value(true)
                .possible_values(&["float", "decimal"])
                .default_value("float")
                .help("Arithmetic used for the escape test; decimal is slow but exact to 19 places"),
        )
        .arg(
            Arg::with_name(LEGACY_BOUND)
                .long(LEGACY_BOUND)
                .help(
                    "Reproduce the historical renderer: escape when |z|² reaches 2 instead of 4, \
                     and use its hue ramp",
                ),
        )
        .get_matches()
}

fn write_image(outfile: &str, pixels: &[u8], bounds: (usize, usize)) -> Result<(), Error> {
    let output = File::create(Path::new(outfile))?;
    let encoder = PNGEncoder::new(output);
    encoder.encode(pixels, bounds.0 as u32, bounds.1 as u32, ColorType::RGBA(8))?;
    Ok(())
}

fn value<'a>(matches: &'a ArgMatches, name: &str) -> Result<&'a str, Error> {
    matches
        .value_of(name)
        .ok_or_else(|| format_err!("Missing value for {}", name))
}

fn run(matches: &ArgMatches) -> Result<(), Error> {
    let image_size: (usize, usize) = parse_pair(value(matches, SIZE)?, 'x')
        .ok_or_else(|| format_err!("Error parsing image dimensions"))?;
    let leftupper = parse_complex(value(matches, LEFTUPPER)?)
        .ok_or_else(|| format_err!("Error parsing left upper point"))?;
    let rightlower = parse_complex(value(matches, RIGHTLOWER)?)
        .ok_or_else(|| format_err!("Error parsing right lower point"))?;
    let limit = match matches.value_of(ITERATIONS) {
        Some(limit) => usize::from_str(limit)?,
        None => DEFAULT_LIMIT,
    };
    let legacy = matches.is_present(LEGACY_BOUND);
    let options = RenderOptions {
        threads: match matches.value_of(THREADS) {
            Some(threads) => usize::from_str(threads)?,
            None => num_cpus::get(),
        },
        band_rows: usize::from_str(value(matches, BAND)?)?,
        precision: match value(matches, PRECISION)? {
            "decimal" => Precision::Decimal,
            _ => Precision::Float,
        },
        bound: if legacy {
            EscapeBound::Legacy
        } else {
            EscapeBound::Canonical
        },
        palette: if legacy {
            PaletteLaw::Legacy
        } else {
            PaletteLaw::Continuous
        },
    };

    let rect = ViewRect::new(image_size.0, image_size.1, leftupper, rightlower);
    let start = Instant::now();
    let pixels = Renderer::new(rect, limit)?.with_options(options).render()?;
    let elapsed = start.elapsed();

    let output = value(matches, OUTPUT)?;
    write_image(output, &pixels, image_size)?;
    println!(
        "Wrote {} ({}x{}, {} iterations) in {}.{:03}s",
        output,
        image_size.0,
        image_size.1,
        limit,
        elapsed.as_secs(),
        elapsed.subsec_millis()
    );
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
