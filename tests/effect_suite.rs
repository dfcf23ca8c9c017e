use ki_player::audio::AudioSnapshot;
use ki_player::effect::{
    ControlOp, Effect, Flippy, GradientOverlay, Ki, KiAlt, SeeSawOpacity, Stutter,
};
use ki_player::engine::{EffectEngine, EffectKind};
use ki_player::frame::RgbFrame;
use ki_player::gradient::{ColorStop, GradientPreset};
use ki_player::mask::evaluate_frame;

fn mono() -> GradientPreset {
    GradientPreset {
        name: "mono".into(),
        stops: vec![
            ColorStop::new(0.0, [0, 0, 0, 255]),
            ColorStop::new(1.0, [255, 255, 255, 255]),
        ],
    }
}

fn red() -> GradientPreset {
    GradientPreset {
        name: "red".into(),
        stops: vec![ColorStop::new(0.0, [255, 0, 0, 255])],
    }
}

fn silence() -> AudioSnapshot {
    AudioSnapshot::default()
}

#[test]
fn see_saw_wraps_past_both_ends() {
    let mut o = SeeSawOpacity::new(99);
    o.increment();
    assert_eq!(o.value(), 100);
    o.increment();
    assert_eq!(o.value(), -100);
    o.decrement();
    assert_eq!(o.value(), 100);

    let half = SeeSawOpacity::new(-30);
    assert_eq!(half.masked_percent(), 30);
    assert_eq!(half.unmasked_percent(), 70);
    assert_eq!(SeeSawOpacity::new(500).value(), 100);
}

#[test]
fn ki_alt_pitch_and_speed_limits() {
    let mut fx = KiAlt::new(Vec::new());
    assert_eq!(fx.pitch(), 19);
    fx.control(ControlOp::PitchUp);
    assert_eq!(fx.pitch(), 29);
    fx.set_pitch(1000);
    assert_eq!(fx.pitch(), 199);
    fx.set_pitch(0);
    assert_eq!(fx.pitch(), 9);
    fx.control(ControlOp::PitchDown);
    assert_eq!(fx.pitch(), 9);

    fx.control(ControlOp::SpeedDown);
    assert_eq!(fx.speed(), 1);
    fx.control(ControlOp::SpeedUp);
    fx.control(ControlOp::SpeedUp);
    assert_eq!(fx.speed(), 3);
}

#[test]
fn ki_alt_inverts_without_gradients() {
    let mut fx = KiAlt::new(Vec::new());
    let original = RgbFrame::solid(30, 20, [10, 20, 30]);
    let mut frame = original.clone();
    fx.process(&mut frame, &silence()).expect("process");
    assert_eq!(fx.frame_counter(), 1);

    let mask = &fx.last_masks().invert;
    assert_eq!(mask, &evaluate_frame(30, 20, 1, 19, 1).invert);
    assert!(mask.count_set() > 0);
    for y in 0..20 {
        for x in 0..30 {
            let want = if mask.get(x, y) { [245, 235, 225] } else { [10, 20, 30] };
            assert_eq!(frame.pixel(x, y), want, "({x},{y})");
        }
    }
}

#[test]
fn ki_alt_clock_scales_with_speed() {
    let mut fx = KiAlt::new(Vec::new());
    fx.control(ControlOp::SpeedUp);
    let mut frame = RgbFrame::solid(16, 16, [0, 0, 0]);
    for _ in 0..3 {
        fx.process(&mut frame, &silence()).expect("process");
    }
    assert_eq!(fx.frame_counter(), 3);
    assert_eq!(fx.clock(), 6);
    assert_eq!(fx.last_masks().invert, evaluate_frame(16, 16, 6, 19, 6).invert);

    fx.control(ControlOp::ResetClock);
    assert_eq!(fx.frame_counter(), 0);
}

#[test]
fn ki_alt_full_opacity_recolours_only_masked_pixels() {
    let mut fx = KiAlt::new(vec![red()]);
    assert_eq!(fx.opacity().value(), 100);
    let mut frame = RgbFrame::solid(24, 24, [40, 40, 40]);
    fx.process(&mut frame, &silence()).expect("process");
    let mask = fx.last_masks().invert.clone();
    for y in 0..24 {
        for x in 0..24 {
            let want = if mask.get(x, y) { [255, 0, 0] } else { [40, 40, 40] };
            assert_eq!(frame.pixel(x, y), want);
        }
    }
}

#[test]
fn ki_alt_status_reports_parameters() {
    let mut fx = KiAlt::new(vec![mono()]);
    fx.control(ControlOp::OpacityDown);
    let status = fx.status();
    assert!(status.contains("pitch 19"), "{status}");
    assert!(status.contains("gradient mono"), "{status}");
    assert!(status.contains("opacity 99% (I=99%, O=1%)"), "{status}");
}

#[test]
fn ki_alt_toggle_passes_frames_through() {
    let mut fx = KiAlt::new(Vec::new());
    fx.control(ControlOp::Toggle);
    let original = RgbFrame::solid(8, 8, [1, 2, 3]);
    let mut frame = original.clone();
    fx.process(&mut frame, &silence()).expect("process");
    assert_eq!(frame, original);
    assert_eq!(fx.frame_counter(), 0);
}

#[test]
fn ki_rebuilds_mask_on_resize_and_width_change() {
    let mut fx = Ki::new();
    let mut frame = RgbFrame::solid(20, 10, [0, 0, 0]);
    fx.process(&mut frame, &silence()).expect("process");
    assert_eq!(fx.cached_size(), Some((20, 10)));

    let mut bigger = RgbFrame::solid(32, 12, [0, 0, 0]);
    fx.process(&mut bigger, &silence()).expect("process");
    assert_eq!(fx.cached_size(), Some((32, 12)));

    fx.control(ControlOp::PitchDown);
    assert_eq!(fx.diamond_width(), 54);
    assert_eq!(fx.cached_size(), None);
    assert!(!fx.control(ControlOp::NextGradient));
}

#[test]
fn ki_inverts_diamond_pixels() {
    let mut fx = Ki::new();
    fx.set_diamond_width(9);
    let mut frame = RgbFrame::solid(12, 12, [0, 0, 0]);
    fx.process(&mut frame, &silence()).expect("process");
    // Row 0 of the width-9 grid has a single "I" at x=9.
    assert_eq!(frame.pixel(9, 0), [255, 255, 255]);
    assert_eq!(frame.pixel(0, 0), [0, 0, 0]);
    assert_eq!(frame.pixel(4, 4), [0, 0, 0]);
    assert_eq!(frame.pixel(0, 4), [255, 255, 255]);
}

#[test]
fn gradient_overlay_without_presets_is_identity() {
    let mut fx = GradientOverlay::new(Vec::new());
    let original = RgbFrame::solid(6, 6, [90, 10, 200]);
    let mut frame = original.clone();
    fx.process(&mut frame, &silence()).expect("process");
    assert_eq!(frame, original);
}

#[test]
fn gradient_overlay_opacity_steps() {
    let mut fx = GradientOverlay::new(vec![red()]);
    assert_eq!(fx.opacity(), 50);
    for _ in 0..20 {
        fx.control(ControlOp::OpacityUp);
    }
    assert_eq!(fx.opacity(), 100);
    let mut frame = RgbFrame::solid(4, 4, [0, 200, 0]);
    fx.process(&mut frame, &silence()).expect("process");
    assert_eq!(frame.pixel(2, 2), [255, 0, 0]);
}

#[test]
fn engine_fails_open_on_malformed_frame() {
    let mut engine = EffectEngine::new(Vec::new());
    engine.select(Some(EffectKind::KiAlt));
    let mut frame = RgbFrame::solid(8, 8, [5, 5, 5]);
    frame.pixels.truncate(20);
    let before = frame.clone();
    engine.process(&mut frame, &silence());
    assert_eq!(frame, before);
    assert_eq!(engine.faults(), 1);
}

#[test]
fn engine_mix_blends_with_input() {
    let mut engine = EffectEngine::new(vec![red()]).with_mix(0.5);
    engine.select(Some(EffectKind::GradientOverlay));
    for _ in 0..10 {
        engine.control(ControlOp::OpacityUp);
    }
    let mut frame = RgbFrame::solid(2, 2, [0, 0, 255]);
    engine.process(&mut frame, &silence());
    assert_eq!(frame.pixel(0, 0), [128, 0, 128]);
    assert_eq!(engine.faults(), 0);
}

#[test]
fn engine_selection_and_status() {
    let mut engine = EffectEngine::new(vec![mono()]);
    assert_eq!(engine.status(), "No effect (raw input)");
    assert!(!engine.control(ControlOp::Toggle));

    assert_eq!(engine.cycle_effect(), Some(EffectKind::Ki));
    assert_eq!(engine.names(), vec!["Ki"]);
    assert_eq!(engine.cycle_effect(), Some(EffectKind::KiAlt));
    assert!(engine.status().starts_with("KiAlt on"));
    assert_eq!(engine.cycle_effect(), Some(EffectKind::GradientOverlay));
    assert_eq!(engine.cycle_effect(), Some(EffectKind::Stutter));
    assert!(engine.status().starts_with("Stutter on"));
    assert_eq!(engine.cycle_effect(), Some(EffectKind::Flippy));
    assert_eq!(engine.names(), vec!["Flippy"]);
    assert_eq!(engine.cycle_effect(), None);
    assert!(engine.is_empty());

    engine.set_mix(f32::NAN);
    assert_eq!(engine.mix(), 1.0);
    engine.set_mix(3.0);
    assert_eq!(engine.mix(), 1.0);
}

#[test]
fn independent_instances_do_not_share_clocks() {
    let mut a = KiAlt::new(Vec::new());
    let b = KiAlt::new(Vec::new());
    let mut frame = RgbFrame::solid(4, 4, [0, 0, 0]);
    a.process(&mut frame, &silence()).expect("process");
    assert_eq!(a.frame_counter(), 1);
    assert_eq!(b.frame_counter(), 0);
}

fn flat(rgb: [u8; 4]) -> GradientPreset {
    GradientPreset {
        name: "flat".into(),
        stops: vec![ColorStop::new(0.0, rgb)],
    }
}

#[test]
fn see_saw_weights_are_complementary() {
    for v in -100..=100i16 {
        let w = SeeSawOpacity::new(v).weights();
        assert!((w.masked + w.unmasked - 1.0).abs() < 1e-6, "v={v}");
        assert!((w.masked - f32::from(v.abs()) / 100.0).abs() < 1e-6);
    }
}

#[test]
fn ki_alt_partial_opacity_blends_both_regions() {
    let mut fx = KiAlt::new(vec![flat([200, 0, 0, 255])]);
    for _ in 0..130 {
        fx.control(ControlOp::OpacityDown);
    }
    assert_eq!(fx.opacity().value(), -30);
    assert_eq!(fx.opacity().masked_percent(), 30);
    assert_eq!(fx.opacity().unmasked_percent(), 70);

    let mut frame = RgbFrame::solid(24, 24, [100, 100, 100]);
    fx.process(&mut frame, &silence()).expect("process");
    let mask = fx.last_masks().invert.clone();
    assert!(mask.count_set() > 0 && !mask.is_all(true));
    for y in 0..24 {
        for x in 0..24 {
            // 0.3 toward the gradient inside the mask, 0.7 outside.
            let want = if mask.get(x, y) { [130, 70, 70] } else { [170, 30, 30] };
            assert_eq!(frame.pixel(x, y), want, "({x},{y})");
        }
    }
}

#[test]
fn reset_restores_fresh_state_for_every_kind() {
    let mut alt = KiAlt::new(vec![mono(), red()]);
    let mut frame = RgbFrame::solid(8, 8, [40, 40, 40]);
    alt.control(ControlOp::PitchUp);
    alt.control(ControlOp::SpeedUp);
    alt.control(ControlOp::OpacityDown);
    alt.control(ControlOp::NextGradient);
    alt.process(&mut frame, &silence()).expect("process");
    alt.control(ControlOp::Toggle);
    alt.reset();
    let fresh = KiAlt::new(vec![mono(), red()]);
    assert!(alt.is_active());
    assert_eq!(alt.pitch(), fresh.pitch());
    assert_eq!(alt.speed(), 1);
    assert_eq!(alt.frame_counter(), 0);
    assert_eq!(alt.opacity(), fresh.opacity());
    assert_eq!(alt.gradients().index(), 0);
    assert_eq!(alt.gradients().len(), 2);

    let mut overlay = GradientOverlay::new(vec![mono(), red()]);
    overlay.control(ControlOp::OpacityUp);
    overlay.control(ControlOp::NextGradient);
    overlay.control(ControlOp::Toggle);
    overlay.reset();
    let fresh = GradientOverlay::new(vec![mono(), red()]);
    assert!(overlay.is_active());
    assert_eq!(overlay.opacity(), fresh.opacity());
    assert_eq!(overlay.gradients().index(), 0);

    let mut engine = EffectEngine::new(vec![mono(), red()]);
    assert!(!engine.reset_current());
    for kind in EffectKind::all() {
        engine.select(Some(kind));
        let before = engine.status();
        for op in ControlOp::all() {
            engine.control(op);
        }
        engine.process(&mut frame, &silence());
        assert!(engine.reset_current());
        assert_eq!(engine.status(), before, "{}", kind.label());
    }
}

#[test]
fn stutter_trails_earlier_frames() {
    let mut fx = Stutter::new();
    assert_eq!(fx.frames(), 3);
    assert_eq!(fx.decay(), 50);
    let mut out = Vec::new();
    for k in 0..9u8 {
        let mut frame = RgbFrame::solid(3, 2, [10 * k, 10 * k, 10 * k]);
        fx.process(&mut frame, &silence()).expect("process");
        out.push(frame.pixel(1, 1)[0]);
    }
    // Nothing to echo until four frames back exist.
    assert_eq!(&out[..4], &[0, 10, 20, 30]);
    // 40 over the frame four back (0) at one half.
    assert_eq!(out[4], 20);
    // 80 over 40 at one half, then the frame eight back (0) at one quarter.
    assert_eq!(out[8], 45);
}

#[test]
fn stutter_controls_clamp_and_clear() {
    let mut fx = Stutter::new();
    for _ in 0..20 {
        assert!(fx.control(ControlOp::SpeedUp));
        assert!(fx.control(ControlOp::OpacityUp));
    }
    assert_eq!(fx.frames(), 9);
    assert_eq!(fx.decay(), 90);
    for _ in 0..20 {
        fx.control(ControlOp::SpeedDown);
        fx.control(ControlOp::PitchDown);
    }
    assert_eq!(fx.frames(), 1);
    assert_eq!(fx.decay(), 0);
    assert!(!fx.control(ControlOp::NextGradient));

    // A single frame means no echoes: output equals input.
    let mut frame = RgbFrame::solid(2, 2, [77, 1, 2]);
    fx.process(&mut frame, &silence()).expect("process");
    assert_eq!(frame.pixel(0, 0), [77, 1, 2]);
    assert!(fx.control(ControlOp::ResetClock));
    assert_eq!(fx.history_len(), 0);
}

fn two_px() -> RgbFrame {
    let mut frame = RgbFrame::new(2, 1);
    frame.set_pixel(0, 0, [255, 0, 0]);
    frame.set_pixel(1, 0, [0, 0, 255]);
    frame
}

#[test]
fn flippy_mirrors_on_a_frame_timer() {
    let mut fx = Flippy::new();
    assert_eq!(fx.frames_per_flip(), 120);
    fx.set_frames_per_flip(2);
    let mut left = Vec::new();
    for _ in 0..5 {
        let mut frame = two_px();
        fx.process(&mut frame, &silence()).expect("process");
        left.push(frame.pixel(0, 0));
    }
    let (r, b) = ([255, 0, 0], [0, 0, 255]);
    assert_eq!(left, vec![r, b, b, r, r]);

    fx.set_frames_per_flip(0);
    assert_eq!(fx.frames_per_flip(), 1);
    assert!(fx.control(ControlOp::PitchDown));
    assert_eq!(fx.frames_per_flip(), 2);
    for _ in 0..200 {
        fx.control(ControlOp::PitchDown);
    }
    assert_eq!(fx.frames_per_flip(), 120);
}

#[test]
fn flippy_beat_sync_flips_once_per_onset() {
    let mut fx = Flippy::new();
    assert!(fx.control(ControlOp::ToggleSync));
    assert!(fx.beat_sync());
    let beat = AudioSnapshot {
        beat: true,
        ..AudioSnapshot::default()
    };
    let quiet = silence();
    let gates = [&quiet, &beat, &beat, &beat, &quiet, &beat];
    let mut flips = Vec::new();
    for audio in gates {
        let mut frame = two_px();
        fx.process(&mut frame, audio).expect("process");
        flips.push(fx.is_flipped());
    }
    assert_eq!(flips, vec![false, true, true, true, true, false]);

    // Without beats the picture never moves in sync mode.
    fx.control(ControlOp::ResetClock);
    for _ in 0..300 {
        let mut frame = two_px();
        fx.process(&mut frame, &silence()).expect("process");
    }
    assert!(!fx.is_flipped());
}
