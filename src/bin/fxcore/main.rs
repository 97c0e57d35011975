//! fxcore - inspect filters and waveshapers from the command line
//!
//! Run with:
//!   cargo run -- response lowpass 1000 0.707
//!   cargo run -- shape softclip 4 3.0

use std::env;

use color_eyre::eyre::{bail, eyre, Result, WrapErr};
use fxcore::dsp::{
    rbj::{FilterType, RbjFilter},
    shaper::ShapeKind,
    waveshaper::Waveshaper,
};
use fxcore::io::sample_fifo;

const SAMPLE_RATE: f32 = 48_000.0;
const BLOCK: usize = 256;

fn main() -> Result<()> {
    color_eyre::install()?;
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args: Vec<String> = env::args().skip(1).collect();
    match args.first().map(String::as_str) {
        Some("response") => response(&args[1..]),
        Some("shape") => shape(&args[1..]),
        _ => {
            eprintln!("usage: fxcore response <type> <cutoff_hz> [q] [gain_db] [sample_rate]");
            eprintln!("       fxcore shape <identity|hardclip|softclip|arctan> [ratio] [drive]");
            Ok(())
        }
    }
}

fn arg<T: std::str::FromStr>(args: &[String], index: usize, name: &str, default: T) -> Result<T> {
    match args.get(index) {
        Some(raw) => raw
            .parse()
            .map_err(|_| eyre!("could not parse {name} from '{raw}'")),
        None => Ok(default),
    }
}

/// Print coefficients and a magnitude table for one RBJ design.
fn response(args: &[String]) -> Result<()> {
    let Some(kind) = args.first() else {
        bail!("missing filter type");
    };
    let filter_type: FilterType = kind.parse()?;
    let cutoff: f32 = arg(args, 1, "cutoff", 1_000.0)?;
    let q: f32 = arg(args, 2, "q", 1.0)?;
    let gain_db: f32 = arg(args, 3, "gain_db", 0.0)?;
    let sample_rate: f32 = arg(args, 4, "sample_rate", SAMPLE_RATE)?;

    let filter = RbjFilter::new(filter_type, cutoff, sample_rate)?
        .with_q(q)?
        .with_shelf_gain(gain_db)
        .wrap_err("designing filter")?;

    let c = filter.coefficients();
    println!("{filter_type} @ {cutoff} Hz, Q {q}, gain {gain_db} dB, fs {sample_rate}");
    println!("b = [{:.8}, {:.8}, {:.8}]", c.b0, c.b1, c.b2);
    println!("a = [{:.8}, {:.8}, {:.8}]", c.a0, c.a1, c.a2);
    println!();
    println!("{:>10}  {:>9}", "freq (Hz)", "gain (dB)");

    let nyquist = sample_rate * 0.5;
    let mut freq = 20.0f32;
    while freq < nyquist {
        let magnitude = filter.magnitude_response(freq);
        println!("{freq:>10.1}  {:>9.2}", 20.0 * magnitude.max(1e-10).log10());
        freq *= 2.0f32.powf(1.0 / 3.0);
    }
    Ok(())
}

/// Stream a 1 kHz sine through a waveshaper and report the output level.
fn shape(args: &[String]) -> Result<()> {
    let kind: ShapeKind = match args.first() {
        Some(raw) => raw.parse()?,
        None => ShapeKind::SoftClip,
    };
    let ratio: usize = arg(args, 1, "ratio", 4)?;
    let drive: f32 = arg(args, 2, "drive", 2.0)?;

    let mut shaper = Waveshaper::new(kind, ratio)?;
    shaper.set_pre_gain(drive)?;

    let len = SAMPLE_RATE as usize / 4;
    let input: Vec<f32> = (0..len)
        .map(|i| (std::f32::consts::TAU * 1_000.0 * i as f32 / SAMPLE_RATE).sin())
        .collect();

    // Feed in uneven pieces, process in fixed blocks
    let (mut writer, mut reader) = sample_fifo(4 * BLOCK)?;
    let mut block = [0.0f32; BLOCK];
    let mut out_block = [0.0f32; BLOCK];
    let mut output = Vec::with_capacity(len);
    let mut pending = input.as_slice();

    while output.len() < len {
        let written = writer.write(&pending[..pending.len().min(300)]);
        pending = &pending[written..];

        while reader.available() >= BLOCK || (pending.is_empty() && reader.available() > 0) {
            let n = reader.read(&mut block);
            shaper.process(&mut out_block[..n], &block[..n]);
            output.extend_from_slice(&out_block[..n]);
        }
    }

    let settled = &output[shaper.latency() + 1_024..];
    let peak = settled.iter().fold(0.0f32, |acc, &x| acc.max(x.abs()));
    let rms = (settled.iter().map(|x| x * x).sum::<f32>() / settled.len() as f32).sqrt();

    println!("{kind} x{ratio}, drive {drive}");
    println!("latency  {} samples", shaper.latency());
    println!("peak     {peak:.4}");
    println!("rms      {rms:.4}");
    Ok(())
}
