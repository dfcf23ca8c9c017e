use crate::audio::{AtomicAudioSnapshot, AudioSnapshot, AudioSystem};
use crate::config::{AudioMode, Config};
use crate::effect::ControlOp;
use crate::engine::EffectEngine;
use crate::frame::RgbFrame;
use crate::gradient::load_presets_dir;
use crate::prefs::{PlayerPrefs, prefs_storage_path};
use crate::render::{Frame, HalfBlockRenderer, Renderer};
use crate::source::{FrameSource, TestPattern};
use crate::terminal::{TerminalGuard, pixel_grid};
use anyhow::Context;
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use std::io::BufWriter;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Toggles owned by the player loop rather than by an effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewState {
    pub show_hud: bool,
    pub show_help: bool,
    pub flip: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    Quit,
    CycleEffect,
    ResetEffect,
    Control(ControlOp),
    View,
    Ignored,
}

pub fn run(cfg: Config) -> anyhow::Result<()> {
    let presets = match load_presets_dir(&cfg.gradients) {
        Ok(p) => p,
        Err(err) => {
            tracing::warn!(dir = %cfg.gradients.display(), %err, "gradient presets unavailable");
            Vec::new()
        }
    };
    tracing::info!(count = presets.len(), "gradient presets loaded");

    let prefs_path: Option<PathBuf> = if cfg.no_prefs { None } else { prefs_storage_path() };
    let mut prefs = PlayerPrefs::load(prefs_path.as_deref()).unwrap_or_else(|err| {
        tracing::warn!(%err, "ignoring unreadable prefs");
        PlayerPrefs::default()
    });

    let mut engine = EffectEngine::new(presets).with_mix(cfg.mix);
    engine.select(cfg.effect.or(prefs.effect));

    let audio = match cfg.audio {
        AudioMode::Off => None,
        AudioMode::Mic => Some(
            AudioSystem::new_mic(cfg.device.as_deref()).context("start microphone capture")?,
        ),
    };
    let audio_snapshot: Option<Arc<AtomicAudioSnapshot>> = audio.as_ref().map(|a| a.snapshot());

    let mut source = TestPattern::new(cfg.source, cfg.seed);

    let _term = TerminalGuard::new()?;
    let mut out = BufWriter::new(TerminalGuard::stdout());
    let mut renderer = HalfBlockRenderer::new();

    let mut last_size = crossterm::terminal::size().context("get terminal size")?;
    if last_size.1 < 2 || last_size.0 < 4 {
        return Err(anyhow::anyhow!(
            "terminal too small (need at least 4x2, got {}x{})",
            last_size.0,
            last_size.1
        ));
    }

    let mut view = ViewState {
        show_hud: prefs.show_hud,
        show_help: false,
        flip: prefs.flip,
    };
    let mut frame = RgbFrame::new(0, 0);
    let mut fps = FpsCounter::new();
    let mut last_process_ms = 0.0f32;
    let fps_target = cfg.fps.max(1);

    tracing::info!(
        source = source.name(),
        effect = engine.selected().map(|k| k.label()).unwrap_or("none"),
        fps = fps_target,
        "player started"
    );

    'main: loop {
        let now = Instant::now();

        while event::poll(Duration::from_millis(0))? {
            match event::read()? {
                Event::Key(k) if k.kind != KeyEventKind::Release => {
                    match handle_key(k.code, k.modifiers, &mut view) {
                        KeyAction::Quit => break 'main,
                        KeyAction::CycleEffect => {
                            engine.cycle_effect();
                        }
                        KeyAction::ResetEffect => {
                            engine.reset_current();
                        }
                        KeyAction::Control(op) => {
                            if !engine.control(op) {
                                tracing::debug!(op = op.as_str(), "control ignored");
                            }
                        }
                        KeyAction::View | KeyAction::Ignored => {}
                    }
                }
                Event::Resize(c, r) => last_size = (c, r),
                _ => {}
            }
        }

        // Resize events are unreliable in some terminals.
        let sz = crossterm::terminal::size()?;
        if sz != last_size {
            last_size = sz;
        }
        let (term_cols, term_rows) = last_size;

        let hud = if view.show_hud {
            build_hud(&engine, source.name(), fps.fps(), last_process_ms, engine.faults())
        } else {
            String::new()
        };
        let hud_rows = hud_rows_for_text(term_rows, view.show_hud, &hud);
        let (w, h, visual_rows) = pixel_grid(term_cols, term_rows, hud_rows);
        if frame.size() != (w, h) {
            tracing::debug!(w, h, "frame resized");
            frame.resize(w, h);
        }

        source.next_frame(&mut frame);
        if view.flip {
            frame.flip_horizontal();
        }

        let snapshot = audio_snapshot
            .as_ref()
            .map(|s| s.load())
            .unwrap_or_else(AudioSnapshot::default);

        let process_start = Instant::now();
        engine.process(&mut frame, &snapshot);
        last_process_ms = process_start.elapsed().as_secs_f32() * 1000.0;

        let overlay = if view.show_help {
            Some(help_popup_text())
        } else {
            None
        };
        let render_frame = Frame {
            term_cols,
            term_rows,
            visual_rows,
            image: &frame,
            hud: &hud,
            hud_rows,
            overlay,
            sync_updates: cfg.sync_updates,
        };
        renderer.render(&render_frame, &mut out)?;
        fps.tick();

        let target = Duration::from_secs_f32(1.0 / fps_target as f32);
        let elapsed = now.elapsed();
        if elapsed < target {
            std::thread::sleep(target - elapsed);
        }
    }

    prefs.effect = engine.selected();
    prefs.show_hud = view.show_hud;
    prefs.flip = view.flip;
    if let Err(err) = prefs.save(prefs_path.as_deref()) {
        tracing::warn!(%err, "failed to save prefs");
    }
    tracing::info!(faults = engine.faults(), "player stopped");
    drop(audio);
    Ok(())
}

/// Map a key press to an action, applying view toggles in place.
pub fn handle_key(code: KeyCode, mods: KeyModifiers, view: &mut ViewState) -> KeyAction {
    if mods.contains(KeyModifiers::CONTROL) && matches!(code, KeyCode::Char('c')) {
        return KeyAction::Quit;
    }

    match code {
        KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('Q') => KeyAction::Quit,
        KeyCode::Char('v') | KeyCode::Char('V') | KeyCode::Tab => KeyAction::CycleEffect,
        KeyCode::Char('f') | KeyCode::Char('F') => {
            view.flip = !view.flip;
            KeyAction::View
        }
        KeyCode::Char('i') | KeyCode::Char('I') => {
            view.show_hud = !view.show_hud;
            KeyAction::View
        }
        KeyCode::Char('?') | KeyCode::Char('h') | KeyCode::Char('H') | KeyCode::F(1) => {
            view.show_help = !view.show_help;
            KeyAction::View
        }
        KeyCode::Char('s') | KeyCode::Char('S') | KeyCode::Char(' ') => {
            KeyAction::Control(ControlOp::Toggle)
        }
        KeyCode::Char('r') | KeyCode::Char('R') => KeyAction::Control(ControlOp::ResetClock),
        KeyCode::Backspace | KeyCode::Delete => KeyAction::ResetEffect,
        KeyCode::Char('a') | KeyCode::Char('A') => KeyAction::Control(ControlOp::ToggleSync),
        KeyCode::Up => KeyAction::Control(ControlOp::PitchUp),
        KeyCode::Down => KeyAction::Control(ControlOp::PitchDown),
        KeyCode::Right => KeyAction::Control(ControlOp::NextGradient),
        KeyCode::Left => KeyAction::Control(ControlOp::PrevGradient),
        KeyCode::Char('+') | KeyCode::Char('=') => KeyAction::Control(ControlOp::SpeedUp),
        KeyCode::Char('-') | KeyCode::Char('_') => KeyAction::Control(ControlOp::SpeedDown),
        KeyCode::Char(']') => KeyAction::Control(ControlOp::OpacityUp),
        KeyCode::Char('[') => KeyAction::Control(ControlOp::OpacityDown),
        _ => KeyAction::Ignored,
    }
}

fn build_hud(
    engine: &EffectEngine,
    source_label: &str,
    fps: f32,
    process_ms: f32,
    faults: u64,
) -> String {
    [
        engine.status(),
        format!(
            "Source: {} | Mix: {:.2} | FPS: {:>4.1} | fx {:>4.1}ms | faults: {}",
            source_label,
            engine.mix(),
            fps,
            process_ms,
            faults
        ),
        "Keys: v effect | s on/off | up/down pitch | left/right gradient | +/- speed | [/] opacity | a beat | bksp reset | f flip | h help | q quit".to_string(),
    ]
    .join("\n")
}

fn hud_rows_for_text(term_rows: u16, show_hud: bool, hud: &str) -> u16 {
    if !show_hud {
        return 0;
    }
    let max_rows = term_rows.saturating_sub(1);
    (hud.lines().count() as u16).min(max_rows)
}

fn help_popup_text() -> &'static str {
    "Ki Player Hotkeys\n\
v or tab  next effect (none -> Ki -> KiAlt -> Gradient -> Stutter -> Flippy -> none)\n\
s or space  effect on/off\n\
r  reset effect clock (Stutter: clear trail)\n\
backspace  restore effect defaults\n\
up/down  lattice pitch (Ki: diamond width, Gradient: opacity, Stutter: echo, Flippy: flip rate)\n\
left/right  previous/next gradient\n\
+ / -  animation speed (Stutter: trail frames)\n\
[ / ]  see-saw opacity down/up\n\
a  Flippy beat sync\n\
f  mirror input\n\
i  show/hide HUD\n\
? or h or F1  toggle this help\n\
q or esc  quit"
}

struct FpsCounter {
    last: Instant,
    frames: u32,
    fps: f32,
}

impl FpsCounter {
    fn new() -> Self {
        Self {
            last: Instant::now(),
            frames: 0,
            fps: 0.0,
        }
    }

    fn tick(&mut self) {
        self.frames += 1;
        let now = Instant::now();
        let dt = now.duration_since(self.last).as_secs_f32();
        if dt >= 0.5 {
            self.fps = (self.frames as f32) / dt;
            self.frames = 0;
            self.last = now;
        }
    }

    fn fps(&self) -> f32 {
        self.fps
    }
}
