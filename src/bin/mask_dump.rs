use anyhow::{Result, bail};
use clap::{Parser, ValueEnum};
use ki_player::config::LogLevel;
use ki_player::mask::{InvertMask, diamond_mask, evaluate_frame, static_mask};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Variant {
    /// Exhaustive lattice search.
    Static,
    /// Closed-form animated mask.
    Animated,
    /// Classic diamond grid (`--pitch` is the diamond width).
    Diamond,
}

/// Print invert masks as I/O grids, one row per line.
#[derive(Parser, Debug)]
#[command(name = "mask_dump", version)]
struct Args {
    #[arg(long, value_enum, default_value_t = Variant::Static)]
    variant: Variant,

    #[arg(long, default_value_t = 16)]
    width: usize,

    #[arg(long, default_value_t = 16)]
    height: usize,

    #[arg(long, default_value_t = 9)]
    pitch: u32,

    /// Clock value; the animated variant reduces it modulo pitch.
    #[arg(long, default_value_t = 0)]
    t: u64,

    /// Frame counter for the animated parity flip.
    #[arg(long, default_value_t = 0)]
    counter: u64,

    /// Dump this many consecutive frames (t and counter advance together).
    #[arg(long, default_value_t = 1)]
    frames: u64,

    #[arg(long, value_enum, default_value_t = LogLevel::Warn)]
    log_level: LogLevel,
}

fn render(args: &Args, step: u64) -> InvertMask {
    let t = args.t + step;
    match args.variant {
        Variant::Static => static_mask(args.width, args.height, t, args.pitch),
        Variant::Animated => {
            let pitch = u64::from(args.pitch.max(1));
            evaluate_frame(args.width, args.height, t % pitch, args.pitch, args.counter + step)
                .invert
        }
        Variant::Diamond => diamond_mask(args.width, args.height, args.pitch),
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    ki_player::logging::init_stderr(args.log_level);
    if args.width.saturating_mul(args.height) > 4096 * 4096 {
        bail!("refusing to dump a {}x{} mask", args.width, args.height);
    }

    for step in 0..args.frames.max(1) {
        let mask = render(&args, step);
        if args.frames > 1 {
            println!(
                "# {:?} t={} counter={} set={}",
                args.variant,
                args.t + step,
                args.counter + step,
                mask.count_set()
            );
        }
        println!("{}", mask.to_ascii());
        if args.frames > 1 {
            println!();
        }
    }
    Ok(())
}
