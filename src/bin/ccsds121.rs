//! CCSDS 121.0 Command Line Interface
//!
//! Usage:
//!   ccsds121 <input> -r <resolution> -b <block_size>   # compress
//!   ccsds121 -d <input.rice>                           # decompress

#![allow(clippy::cast_precision_loss)]

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use ccsds121::{
    read_stream, unpack_samples, CodecParams, Encoder, EncoderOptions,
    DEFAULT_REFERENCE_INTERVAL,
};
use clap::Parser;
use log::LevelFilter;

#[derive(Parser, Debug)]
#[command(name = "ccsds121", version)]
#[command(about = "CCSDS 121.0 adaptive Rice lossless compression", long_about = None)]
struct Args {
    /// Input file (packed samples, or an encoded stream with -d)
    input: PathBuf,

    /// Decompress (default is compress)
    #[arg(short, long)]
    decompress: bool,

    /// Sample resolution in bits (1-32)
    #[arg(short, long, default_value_t = 8)]
    resolution: u32,

    /// Block size in samples (8, 16, 32 or 64)
    #[arg(short, long, default_value_t = 16)]
    block_size: usize,

    /// Blocks between reference samples (1-4096)
    #[arg(long, default_value_t = DEFAULT_REFERENCE_INTERVAL)]
    reference_interval: u32,

    /// Never select the second-extension option
    #[arg(long)]
    no_second_extension: bool,

    /// Output file [default: <input>.rice, or <base>.unrice with -d]
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

/// Output filename for compression: `<input>.rice`.
fn compress_filename(input: &Path) -> PathBuf {
    let mut name = input.as_os_str().to_owned();
    name.push(".rice");
    PathBuf::from(name)
}

/// Output filename for decompression.
///
/// Removes a `.rice` extension if present, then appends `.unrice`.
fn decompress_filename(input: &Path) -> PathBuf {
    let base = match input.extension() {
        Some(ext) if ext.eq_ignore_ascii_case("rice") => input.with_extension(""),
        _ => input.to_path_buf(),
    };
    let mut name = base.into_os_string();
    name.push(".unrice");
    PathBuf::from(name)
}

fn do_compress(args: &Args, output_path: &Path) -> Result<()> {
    let input = fs::read(&args.input)
        .with_context(|| format!("cannot read input file {}", args.input.display()))?;
    if input.is_empty() {
        bail!("input file {} is empty", args.input.display());
    }

    let params = CodecParams::new(args.resolution, args.block_size)
        .and_then(|p| p.with_reference_interval(args.reference_interval))
        .context("invalid codec parameters")?;
    let options = EncoderOptions {
        second_extension: !args.no_second_extension,
    };

    let samples =
        unpack_samples(&input, args.resolution).context("cannot split input into samples")?;
    let mut encoder = Encoder::new(params)?.with_options(options);
    encoder.push_samples(&samples)?;
    let stream = encoder.finish().context("compression failed")?;

    let file = File::create(output_path)
        .with_context(|| format!("cannot create output file {}", output_path.display()))?;
    let mut writer = BufWriter::new(file);
    stream
        .write_to(&mut writer)
        .context("failed to write output file")?;
    writer.flush().context("failed to write output file")?;

    let input_size = input.len();
    let output_size = stream.encoded_len();
    let ratio = input_size as f64 / output_size as f64;
    println!(
        "Input:       {} ({input_size} bytes, {} samples)",
        args.input.display(),
        stream.sample_count()
    );
    println!("Output:      {} ({output_size} bytes)", output_path.display());
    println!("Ratio:       {ratio:.2}x");
    println!(
        "Parameters:  resolution={}, block_size={}, reference_interval={}",
        params.resolution(),
        params.block_size(),
        params.reference_interval()
    );

    Ok(())
}

fn do_decompress(args: &Args, output_path: &Path) -> Result<()> {
    let file = File::open(&args.input)
        .with_context(|| format!("cannot open input file {}", args.input.display()))?;
    let input_size = file.metadata().map(|m| m.len()).unwrap_or_default();

    let decoded = read_stream(file).context("decompression failed")?;
    let output = decoded.to_bytes();
    fs::write(output_path, &output)
        .with_context(|| format!("cannot write output file {}", output_path.display()))?;

    let output_size = output.len();
    let ratio = output_size as f64 / input_size as f64;
    let params = decoded.params();
    println!("Input:       {} ({input_size} bytes)", args.input.display());
    println!(
        "Output:      {} ({output_size} bytes, {} samples)",
        output_path.display(),
        decoded.sample_count()
    );
    println!("Expansion:   {ratio:.2}x");
    println!(
        "Parameters:  resolution={}, block_size={}, reference_interval={}",
        params.resolution(),
        params.block_size(),
        params.reference_interval()
    );

    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();

    let level = match args.verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();

    if args.decompress {
        let output = args
            .output
            .clone()
            .unwrap_or_else(|| decompress_filename(&args.input));
        do_decompress(&args, &output)
    } else {
        let output = args
            .output
            .clone()
            .unwrap_or_else(|| compress_filename(&args.input));
        do_compress(&args, &output)
    }
}
