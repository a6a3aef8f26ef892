// main.rs      animgif command
//
// Copyright (c) 2019-2023  Douglas Lau
//
#![forbid(unsafe_code)]

use animgif::Encoder;
use clap::{App, AppSettings, Arg, ArgMatches};
use pix::rgb::SRgb8;
use std::error::Error;
use std::fs;
use std::io::Write;
use std::str::FromStr;
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

/// Crate version
const VERSION: &'static str = std::env!("CARGO_PKG_VERSION");

/// Main entry point
fn main() -> Result<(), Box<dyn Error>> {
    env_logger::builder().format_timestamp(None).init();
    let mut out = StandardStream::stderr(ColorChoice::Auto);
    let matches = create_app().get_matches();
    if let Err(e) = encode(&matches) {
        let mut red = ColorSpec::new();
        red.set_fg(Some(Color::Red)).set_intense(true);
        out.set_color(&red)?;
        writeln!(out, "error: {}", e)?;
        out.reset()?;
        std::process::exit(1);
    }
    Ok(())
}

/// Create clap App
fn create_app() -> App<'static, 'static> {
    App::new("animgif")
        .version(VERSION)
        .about("Encode raw indexed frames into an animated GIF")
        .setting(AppSettings::ArgRequiredElseHelp)
        .arg(
            Arg::with_name("width")
                .long("width")
                .takes_value(true)
                .required(true)
                .help("canvas width"),
        )
        .arg(
            Arg::with_name("height")
                .long("height")
                .takes_value(true)
                .required(true)
                .help("canvas height"),
        )
        .arg(
            Arg::with_name("depth")
                .long("depth")
                .short("d")
                .takes_value(true)
                .default_value("8")
                .help("color table depth (bits per pixel)"),
        )
        .arg(
            Arg::with_name("delay")
                .long("delay")
                .takes_value(true)
                .default_value("10")
                .help("frame delay (centiseconds)"),
        )
        .arg(
            Arg::with_name("loop")
                .long("loop")
                .takes_value(true)
                .help("loop count (0 = forever)"),
        )
        .arg(
            Arg::with_name("transparent")
                .long("transparent")
                .takes_value(true)
                .help("transparent color index"),
        )
        .arg(
            Arg::with_name("input")
                .required(true)
                .help("raw pixel file (one index per byte)"),
        )
        .arg(
            Arg::with_name("output")
                .required(true)
                .help("output GIF file"),
        )
}

/// Parse an optional argument value
fn value<T>(
    matches: &ArgMatches,
    name: &str,
) -> Result<Option<T>, Box<dyn Error>>
where
    T: FromStr,
    T::Err: Error + 'static,
{
    match matches.value_of(name) {
        Some(v) => Ok(Some(v.parse()?)),
        None => Ok(None),
    }
}

/// Gray ramp palette
fn gray_palette(depth: u8) -> Vec<SRgb8> {
    let n = 1usize << depth.min(8);
    (0..n)
        .map(|i| {
            let v = (i * 255 / (n - 1).max(1)) as u8;
            SRgb8::new(v, v, v)
        })
        .collect()
}

/// Encode all frames of the input file
fn encode(matches: &ArgMatches) -> Result<(), Box<dyn Error>> {
    let width: u32 = value(matches, "width")?.unwrap_or_default();
    let height: u32 = value(matches, "height")?.unwrap_or_default();
    let depth: u8 = value(matches, "depth")?.unwrap_or(8);
    let delay: u32 = value(matches, "delay")?.unwrap_or_default();
    let loop_count: Option<u16> = value(matches, "loop")?;
    let transparent: Option<u8> = value(matches, "transparent")?;
    let input = matches.value_of_os("input").ok_or("no input")?;
    let output = matches.value_of_os("output").ok_or("no output")?;
    let pixels = fs::read(input)?;
    let frame_sz = width as usize * height as usize;
    if frame_sz == 0 || pixels.len() % frame_sz != 0 {
        return Err(format!(
            "input length {} is not a multiple of {}x{}",
            pixels.len(),
            width,
            height
        )
        .into());
    }
    let mut session = Encoder::create(output, width, height)?
        .with_palette(&gray_palette(depth), depth)
        .with_transparent_color(transparent)
        .with_loop_count(loop_count)
        .into_session()?;
    for frame in pixels.chunks_exact(frame_sz) {
        session.frame_buf().copy_from_slice(frame);
        session.add_frame(delay)?;
    }
    session.close()?;
    Ok(())
}
