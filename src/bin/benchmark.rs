use std::time::Instant;

use anyhow::{Result, bail};
use ki_player::audio::AudioSnapshot;
use ki_player::engine::{EffectEngine, EffectKind};
use ki_player::frame::RgbFrame;
use ki_player::gradient::{ColorStop, GradientPreset};
use ki_player::mask::{AnimatedMasker, static_mask};
use ki_player::source::{FrameSource, PatternKind, TestPattern};

struct Args {
    frames: usize,
    static_frames: usize,
    w: usize,
    h: usize,
    static_w: usize,
    static_h: usize,
    pitch: u32,
    ci_smoke: bool,
    quick: bool,
    max_ms: f64,
}

fn parse_args() -> Args {
    let mut args = Args {
        frames: 240,
        static_frames: 8,
        w: 320,
        h: 180,
        static_w: 64,
        static_h: 36,
        pitch: 19,
        ci_smoke: false,
        quick: false,
        max_ms: 20.0,
    };

    let argv = std::env::args().skip(1).collect::<Vec<_>>();
    let mut i = 0usize;
    while i < argv.len() {
        let k = argv[i].as_str();
        let v = argv.get(i + 1).map(|s| s.as_str());
        match (k, v) {
            ("--frames", Some(x)) => {
                if let Ok(n) = x.parse::<usize>() {
                    args.frames = n.max(1);
                }
                i += 2;
            }
            ("--static-frames", Some(x)) => {
                if let Ok(n) = x.parse::<usize>() {
                    args.static_frames = n.max(1);
                }
                i += 2;
            }
            ("--w", Some(x)) => {
                if let Ok(n) = x.parse::<usize>() {
                    args.w = n.max(1);
                }
                i += 2;
            }
            ("--h", Some(x)) => {
                if let Ok(n) = x.parse::<usize>() {
                    args.h = n.max(1);
                }
                i += 2;
            }
            ("--pitch", Some(x)) => {
                if let Ok(n) = x.parse::<u32>() {
                    args.pitch = n.max(3);
                }
                i += 2;
            }
            ("--ci-smoke", Some(x)) if !x.starts_with("--") => {
                args.ci_smoke = parse_bool(x).unwrap_or(true);
                i += 2;
            }
            ("--ci-smoke", _) => {
                args.ci_smoke = true;
                i += 1;
            }
            ("--quick", Some(x)) if !x.starts_with("--") => {
                args.quick = parse_bool(x).unwrap_or(true);
                i += 2;
            }
            ("--quick", _) => {
                args.quick = true;
                i += 1;
            }
            ("--max-ms", Some(x)) => {
                if let Ok(v) = x.parse::<f64>() {
                    args.max_ms = v.max(0.1);
                }
                i += 2;
            }
            _ => {
                i += 1;
            }
        }
    }

    if args.quick {
        args.frames = args.frames.min(60);
        args.static_frames = args.static_frames.min(2);
    }

    args
}

fn parse_bool(s: &str) -> Option<bool> {
    let v = s.trim().to_ascii_lowercase();
    match v.as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn bench_presets() -> Vec<GradientPreset> {
    vec![GradientPreset {
        name: "bench".to_string(),
        stops: vec![
            ColorStop::new(0.0, [8, 0, 40, 255]),
            ColorStop::new(0.5, [220, 40, 120, 255]),
            ColorStop::new(1.0, [255, 240, 180, 255]),
        ],
    }]
}

fn report(label: &str, samples: &mut [f64]) -> (f64, f64) {
    samples.sort_by(|a, b| a.total_cmp(b));
    let avg = samples.iter().sum::<f64>() / samples.len().max(1) as f64;
    let p95_idx = ((samples.len() as f64 * 0.95) as usize).min(samples.len().saturating_sub(1));
    let p95 = samples.get(p95_idx).copied().unwrap_or(0.0);
    println!("{label:<24} avg {avg:>7.3} ms | p95 {p95:>7.3} ms | n={}", samples.len());
    (avg, p95)
}

fn bench_masks(args: &Args) -> f64 {
    let mut masker = AnimatedMasker::new();
    let mut samples = Vec::with_capacity(args.frames);
    for step in 0..args.frames {
        let counter = step as u64 + 1;
        let t = counter % u64::from(args.pitch);
        let start = Instant::now();
        let masks = masker.render(args.w, args.h, t, args.pitch, counter);
        samples.push(start.elapsed().as_secs_f64() * 1000.0);
        std::hint::black_box(masks.invert.count_set());
    }
    report("animated mask", &mut samples).0
}

fn bench_static(args: &Args) {
    let mut samples = Vec::with_capacity(args.static_frames);
    for step in 0..args.static_frames {
        let start = Instant::now();
        let mask = static_mask(args.static_w, args.static_h, step as u64, args.pitch);
        samples.push(start.elapsed().as_secs_f64() * 1000.0);
        std::hint::black_box(mask.count_set());
    }
    report(
        &format!("static mask {}x{}", args.static_w, args.static_h),
        &mut samples,
    );
}

fn bench_chain(args: &Args) -> f64 {
    let mut engine = EffectEngine::new(bench_presets());
    engine.select(Some(EffectKind::KiAlt));
    let mut source = TestPattern::new(PatternKind::Plasma, 1);
    let mut frame = RgbFrame::new(args.w, args.h);
    let audio = AudioSnapshot::default();
    let mut samples = Vec::with_capacity(args.frames);
    for _ in 0..args.frames {
        source.next_frame(&mut frame);
        let start = Instant::now();
        engine.process(&mut frame, &audio);
        samples.push(start.elapsed().as_secs_f64() * 1000.0);
    }
    report("KiAlt + gradient", &mut samples).1
}

fn main() -> Result<()> {
    let args = parse_args();
    println!(
        "ki_player benchmark: {}x{} pitch {} frames {}",
        args.w, args.h, args.pitch, args.frames
    );

    bench_masks(&args);
    bench_static(&args);
    let chain_p95 = bench_chain(&args);

    if args.ci_smoke && chain_p95 > args.max_ms {
        bail!(
            "ci smoke failed: KiAlt p95 {:.3} ms exceeds {:.3} ms",
            chain_p95,
            args.max_ms
        );
    }
    Ok(())
}
